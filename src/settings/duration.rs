//! Human-readable duration parsing for TTL options.
//!
//! Accepts one or more `<number> <unit>` pairs such as `5 minutes`,
//! `1h 30m` or `2 days`, and bare integers meaning seconds.

use crate::error::{SettingsError, SettingsResult};
use regex_lite::Regex;
use std::sync::LazyLock;

const PAIR_PATTERN: &str = r"^\s*(\d+(?:\.\d+)?)\s*([A-Za-z]*)\s*(?:and\s+|,\s*)?";

static PAIR: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(PAIR_PATTERN).ok());

/// 2^64 seconds, the first value `u64` cannot hold.
const MAX_SECONDS: f64 = 18_446_744_073_709_551_616.0;

fn unit_seconds(unit: &str) -> Option<f64> {
    let seconds = match unit.to_lowercase().as_str() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600.0,
        "d" | "day" | "days" => 86_400.0,
        "w" | "wk" | "wks" | "week" | "weeks" => 604_800.0,
        _ => return None,
    };
    Some(seconds)
}

/// Parse a duration string into whole seconds.
pub fn parse_duration(text: &str) -> SettingsResult<u64> {
    let invalid = || SettingsError::InvalidDuration(text.to_string());
    let re = PAIR.as_ref().ok_or_else(invalid)?;

    let mut rest = text.trim();
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total = 0.0;
    while !rest.is_empty() {
        let caps = re.captures(rest).ok_or_else(invalid)?;
        let amount: f64 = caps[1].parse().map_err(|_| invalid())?;
        let unit = unit_seconds(&caps[2]).ok_or_else(invalid)?;
        total += amount * unit;
        let consumed = caps.get(0).map_or(0, |m| m.end());
        if consumed == 0 {
            return Err(invalid());
        }
        rest = &rest[consumed..];
    }

    let seconds = total.round();
    if !seconds.is_finite() || seconds >= MAX_SECONDS {
        return Err(invalid());
    }
    Ok(seconds as u64)
}
