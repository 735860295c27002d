//! Display formatting for grid cells and formatted inputs.
//!
//! Formats are named by string (`currency`, `number`, `percent`, `date`,
//! `datetime`). Values that cannot be read under the requested format are
//! shown as-is; `null` always shows as an empty string.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::value::{display, parse_number};

/// Format `value` for display under the named `format`.
///
/// Unknown formats fall through to plain display.
pub fn format_value(value: &Value, format: &str) -> String {
    if value.is_null() {
        return String::new();
    }
    let formatted = match format {
        "currency" => parse_number(value).map(currency),
        "number" => parse_number(value).map(number),
        "percent" => parse_number(value).map(percent),
        "date" => parse_datetime(value).map(|dt| dt.format("%-m/%-d/%Y").to_string()),
        "datetime" => {
            parse_datetime(value).map(|dt| dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
        }
        _ => None,
    };
    formatted.unwrap_or_else(|| display(value))
}

/// `1234.5` → `$1,234.50`, `-3` → `-$3.00`.
pub fn currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${}", group_fixed(&fixed))
}

/// Grouped thousands with at most three fraction digits: `1234.56789` →
/// `1,234.568`.
pub fn number(amount: f64) -> String {
    let fixed = format!("{:.3}", amount.abs());
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    let sign = if amount < 0.0 && trimmed != "0" { "-" } else { "" };
    format!("{sign}{}", group_fixed(trimmed))
}

/// `0.125` → `12.50%`.
pub fn percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

fn group_fixed(fixed: &str) -> String {
    let (int, frac) = match fixed.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (fixed, None),
    };
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac {
        Some(frac) => format!("{grouped}.{frac}"),
        None => grouped,
    }
}

/// Read a timestamp: RFC 3339, ISO date-time without zone, ISO date, or
/// epoch milliseconds. Zoned inputs are shown in their own offset.
fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?).map(|dt| dt.naive_utc()),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_local())
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        _ => None,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
