use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses a server timestamp. Values without an offset are taken as local
/// time, the way a browser's `Date` reads them.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

/// `dd.mm.yyyy hh:mm` in local time, or the raw text when unparseable.
pub fn format_timestamp(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Chart axis label: `dd.mm hh:mm`.
pub fn format_hour_label(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%d.%m %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}
