//! Argument validation shared by the market-data tools.

use chrono::{Duration, Local, NaiveDate};

use crate::domains::tools::ToolError;

const SYMBOL_MIN_LEN: usize = 3;
const SYMBOL_MAX_LEN: usize = 12;

/// Days of history returned when no start date is given.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Bar intervals the provider understands.
pub const INTERVALS: [&str; 8] = ["1m", "5m", "15m", "30m", "1H", "1D", "1W", "1M"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalize a ticker symbol: trimmed, uppercase ASCII alphanumerics,
/// 3 to 12 characters.
pub fn validate_symbol(symbol: &str) -> Result<String, ToolError> {
    let symbol = symbol.trim().to_ascii_uppercase();
    let len = symbol.chars().count();
    if !(SYMBOL_MIN_LEN..=SYMBOL_MAX_LEN).contains(&len) {
        return Err(ToolError::invalid_arguments(format!(
            "symbol must be {SYMBOL_MIN_LEN} to {SYMBOL_MAX_LEN} characters, got '{symbol}'"
        )));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ToolError::invalid_arguments(format!(
            "symbol must contain only letters and digits, got '{symbol}'"
        )));
    }
    Ok(symbol)
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ToolError::invalid_arguments(format!("{field} must be a YYYY-MM-DD date, got '{value}'"))
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolve an optional date range.
///
/// `end` defaults to `today`, `start` to [`DEFAULT_LOOKBACK_DAYS`] before
/// `end`. A start after the end is rejected.
pub fn date_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ToolError> {
    let end = match end {
        Some(value) => parse_date("end_date", value)?,
        None => today,
    };
    let start = match start {
        Some(value) => parse_date("start_date", value)?,
        None => end - Duration::days(DEFAULT_LOOKBACK_DAYS),
    };
    if start > end {
        return Err(ToolError::invalid_arguments(format!(
            "start_date {} is after end_date {}",
            format_date(start),
            format_date(end)
        )));
    }
    Ok((start, end))
}

pub fn default_interval() -> String {
    "1D".to_string()
}

pub fn validate_interval(interval: &str) -> Result<&str, ToolError> {
    INTERVALS
        .iter()
        .find(|known| **known == interval)
        .copied()
        .ok_or_else(|| {
            ToolError::invalid_arguments(format!(
                "interval must be one of {}, got '{interval}'",
                INTERVALS.join(", ")
            ))
        })
}
