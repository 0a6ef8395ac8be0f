use super::{Pending, ViewState};
use crate::error::ViewError;
use crate::models::weather::{TemperatureSummary, WeatherReport};
use crate::services::api::Backend;
use crate::services::scheduler::{delay_until_next_hour, next_hour, Clock, RefreshScheduler};
use crate::utils::time::{format_hour_label, format_timestamp};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{info, warn};

pub const EMPTY_CITY: &str = "Please enter a city name";
pub const LOADING_MESSAGE: &str = "Loading data...";
pub const CHART_LABEL: &str = "Temperature (°C)";

/// Line-chart data: one labelled point per hourly sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    fn from_report(report: &WeatherReport) -> Self {
        Self {
            label: CHART_LABEL,
            labels: report
                .hourly_data
                .iter()
                .map(|s| format_hour_label(&s.hour))
                .collect(),
            values: report.hourly_data.iter().map(|s| s.temperature).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherPanel {
    pub city: String,
    pub coordinates: String,
    pub updated_at: DateTime<Local>,
    pub chart: ChartSeries,
    pub summary: Option<TemperatureSummary>,
    /// Server-side validity window of the forecast, when reported.
    pub valid_window: Option<String>,
    pub next_update: DateTime<Local>,
}

pub struct WeatherController {
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    refresh: RefreshScheduler,
    current_city: Option<String>,
    input_error: Option<String>,
    state: ViewState<WeatherPanel>,
}

impl WeatherController {
    pub fn new(backend: Arc<dyn Backend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            refresh: RefreshScheduler::new(),
            current_city: None,
            input_error: None,
            state: ViewState::Idle,
        }
    }

    /// Form submission. Blank input is rejected without a network call and
    /// leaves the current panel and refresh timer alone.
    pub async fn submit(&mut self, city: &str) -> Result<(), ViewError> {
        let city = city.trim();
        if city.is_empty() {
            self.input_error = Some(EMPTY_CITY.to_string());
            return Err(ViewError::Validation(EMPTY_CITY.to_string()));
        }

        self.refresh.cancel();
        self.current_city = Some(city.to_string());
        self.load(city).await
    }

    pub async fn load(&mut self, city: &str) -> Result<(), ViewError> {
        self.input_error = None;
        let pending = Pending::begin(&mut self.state, None);

        match self.backend.weather(city).await {
            Ok(report) => {
                let now = self.clock.now();
                let delay = delay_until_next_hour(&now);

                let panel = WeatherPanel {
                    city: report.city.clone(),
                    coordinates: format!(
                        "{:.4}, {:.4}",
                        report.coordinates.latitude, report.coordinates.longitude
                    ),
                    updated_at: now,
                    chart: ChartSeries::from_report(&report),
                    summary: TemperatureSummary::from_samples(&report.hourly_data),
                    valid_window: match (&report.valid_from, &report.valid_until) {
                        (Some(from), Some(until)) => Some(format!(
                            "{} - {}",
                            format_timestamp(from),
                            format_timestamp(until)
                        )),
                        _ => None,
                    },
                    next_update: next_hour(now),
                };

                info!("Weather for {} loaded ({} hourly points)", panel.city, panel.chart.len());
                pending.finish(ViewState::Success(panel));
                self.refresh.schedule(city, delay);
                Ok(())
            }
            Err(e) => {
                warn!("Weather for {} failed: {}", city, e);
                pending.finish(ViewState::Error(format!("Failed to load weather data: {}", e)));
                Err(e.into())
            }
        }
    }

    /// Waits for the hourly timer and reloads the last requested city.
    /// Returns `None` when no refresh is scheduled.
    pub async fn next_refresh(&mut self) -> Option<Result<(), ViewError>> {
        let city = self.refresh.tick().await?;
        info!("Refreshing weather for {}", city);
        Some(self.load(&city).await)
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh.is_pending()
    }

    pub fn current_city(&self) -> Option<&str> {
        self.current_city.as_deref()
    }

    pub fn state(&self) -> &ViewState<WeatherPanel> {
        &self.state
    }

    /// The chart/info panel; hidden after a failed load.
    pub fn panel(&self) -> Option<&WeatherPanel> {
        self.state.success()
    }

    /// Text of the message line, if any.
    pub fn message(&self) -> Option<&str> {
        if let Some(error) = &self.input_error {
            return Some(error.as_str());
        }
        match &self.state {
            ViewState::Loading => Some(LOADING_MESSAGE),
            ViewState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}
