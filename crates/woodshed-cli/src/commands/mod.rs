//! CLI command modules and shared argument parsing.

pub mod config;
pub mod piece;
pub mod plan;
pub mod project;
pub mod readiness;
pub mod spot;
pub mod stats;

use chrono::{DateTime, NaiveDate, Utc};
use woodshed_core::{ColorTag, PracticeResult, Priority};

/// Parse a date argument: either a full RFC3339 timestamp or a plain
/// `YYYY-MM-DD` (interpreted as midnight UTC).
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{s}': expected YYYY-MM-DD or RFC3339"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date '{s}'"))?;
    Ok(DateTime::from_naive_utc_and_offset(midnight, Utc))
}

/// Parse a practice result argument.
pub fn parse_result(s: &str) -> Result<PracticeResult, Box<dyn std::error::Error>> {
    match s {
        "failed" => Ok(PracticeResult::Failed),
        "struggled" => Ok(PracticeResult::Struggled),
        "good" => Ok(PracticeResult::Good),
        "excellent" => Ok(PracticeResult::Excellent),
        _ => Err(format!(
            "invalid result '{s}': expected failed, struggled, good or excellent"
        )
        .into()),
    }
}

/// Parse a priority argument.
pub fn parse_priority(s: &str) -> Result<Priority, Box<dyn std::error::Error>> {
    match s {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        _ => Err(format!("invalid priority '{s}': expected low, medium or high").into()),
    }
}

/// Parse a color tag argument.
pub fn parse_color(s: &str) -> Result<ColorTag, Box<dyn std::error::Error>> {
    match s {
        "red" => Ok(ColorTag::Red),
        "yellow" => Ok(ColorTag::Yellow),
        "green" => Ok(ColorTag::Green),
        _ => Err(format!("invalid color '{s}': expected red, yellow or green").into()),
    }
}
