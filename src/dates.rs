//! Expansion of a `YYYYMMDD` start/end pair into the days to query.

use crate::error::{CountError, Result};
use chrono::{Days, NaiveDate};
use tracing::warn;

/// Day-string format used on the command line and by the search API.
pub const DAY_FORMAT: &str = "%Y%m%d";

/// Parse a single 8-digit day-string.
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    // chrono accepts a short year ("2024011" parses), so pin the width first.
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CountError::Format {
            value: value.to_string(),
            reason: "not 8 digits".to_string(),
        });
    }
    NaiveDate::parse_from_str(value, DAY_FORMAT).map_err(|e| CountError::Format {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Every calendar day from `start` to `end` inclusive, ascending.
///
/// A reversed range is not an error: it yields no days, and a warning is
/// logged so the empty run is not silent.
pub fn expand(start: &str, end: &str) -> Result<Vec<String>> {
    let first = parse_day(start)?;
    let last = parse_day(end)?;

    if first > last {
        warn!(start, end, "start date is after end date; nothing to collect");
        return Ok(Vec::new());
    }

    let mut days = Vec::new();
    let mut current = first;
    while current <= last {
        days.push(current.format(DAY_FORMAT).to_string());
        match current.checked_add_days(Days::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(days)
}
