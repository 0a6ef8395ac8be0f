use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub hour: String,
    pub temperature: f64,
}

/// Response of `GET /weather?city=<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub city: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub hourly_data: Vec<WeatherSample>,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_until: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureSummary {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl TemperatureSummary {
    /// Returns `None` for an empty series.
    pub fn from_samples(samples: &[WeatherSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for sample in samples {
            min = min.min(sample.temperature);
            max = max.max(sample.temperature);
            sum += sample.temperature;
        }

        Some(Self {
            min,
            avg: sum / samples.len() as f64,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(hour: &str, temperature: f64) -> WeatherSample {
        WeatherSample {
            hour: hour.to_string(),
            temperature,
        }
    }

    #[test]
    fn test_single_sample_summary() {
        let summary = TemperatureSummary::from_samples(&[sample("2024-01-01T00:00:00Z", 3.2)]).unwrap();
        assert_eq!(summary.min, 3.2);
        assert_eq!(summary.avg, 3.2);
        assert_eq!(summary.max, 3.2);
    }

    #[test]
    fn test_summary_over_series() {
        let samples = vec![
            sample("2024-01-01T00:00", -1.0),
            sample("2024-01-01T01:00", 2.0),
            sample("2024-01-01T02:00", 5.0),
        ];
        let summary = TemperatureSummary::from_samples(&samples).unwrap();
        assert_eq!(summary.min, -1.0);
        assert_eq!(summary.max, 5.0);
        assert!((summary.avg - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_series_has_no_summary() {
        assert!(TemperatureSummary::from_samples(&[]).is_none());
    }

    #[test]
    fn test_report_parses_camel_case() {
        let report: WeatherReport = serde_json::from_str(
            r#"{"city":"Berlin","coordinates":{"latitude":52.5,"longitude":13.4},
                "hourlyData":[{"hour":"2024-01-01T00:00:00Z","temperature":3.2}]}"#,
        )
        .unwrap();

        assert_eq!(report.city, "Berlin");
        assert_eq!(report.hourly_data.len(), 1);
        assert!(report.valid_from.is_none());
    }
}
