//! Loose JSON value semantics: truthiness, display, equality, number parsing.
//!
//! Metadata documents are authored against loosely typed data, so conditions
//! and validation compare values the forgiving way: `"5"` equals `5`, an empty
//! string is falsy, and numbers display without a trailing `.0`.

use serde_json::Value;

/// Whether a value counts as "set" in a condition.
///
/// `null`, `false`, `0`, `NaN`, and `""` are falsy; arrays and objects are
/// always truthy, even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a value as text for interpolation and display.
///
/// Strings render without quotes, integral floats without a fractional part,
/// arrays as comma-joined elements, and objects as `[object Object]`.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => display_float(f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_owned(),
    }
}

fn display_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Parse a leading number the way a lenient form field would.
///
/// Numbers pass through; strings are trimmed and their longest numeric prefix
/// is parsed (`"12px"` → `12`). Anything else yields `None`.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_prefix(s),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_numeric_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, ch) in text.char_indices() {
        match ch {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + ch.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    text[..end].trim_end_matches('.').parse().ok()
}

/// Compare a looked-up value against a literal with loose equality.
///
/// Strings compare verbatim, numbers and booleans compare numerically against
/// the parsed literal, `null` never equals a literal.
pub fn loose_eq(left: &Value, literal: &str) -> bool {
    match left {
        Value::Null => false,
        Value::String(s) => s == literal,
        Value::Number(n) => match (n.as_f64(), literal.trim().parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => false,
        },
        Value::Bool(b) => literal
            .trim()
            .parse::<f64>()
            .is_ok_and(|n| n == if *b { 1.0 } else { 0.0 }),
        Value::Array(_) | Value::Object(_) => display(left) == literal,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── Truthiness ───────────────────────────────────────────────────

    #[test]
    fn falsy_values() {
        for v in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&v), "{v} should be falsy");
        }
    }

    #[test]
    fn truthy_values() {
        for v in [json!(true), json!(1), json!(-2.5), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(&v), "{v} should be truthy");
        }
    }

    // ── Display ──────────────────────────────────────────────────────

    #[test]
    fn display_scalars() {
        assert_eq!(display(&json!("Ann")), "Ann");
        assert_eq!(display(&json!(7)), "7");
        assert_eq!(display(&json!(3.0)), "3");
        assert_eq!(display(&json!(1.5)), "1.5");
        assert_eq!(display(&json!(true)), "true");
        assert_eq!(display(&json!(null)), "null");
    }

    #[test]
    fn display_compound() {
        assert_eq!(display(&json!([1, "a", null])), "1,a,");
        assert_eq!(display(&json!({"a": 1})), "[object Object]");
    }

    // ── Number parsing ───────────────────────────────────────────────

    #[test]
    fn parse_number_variants() {
        assert_eq!(parse_number(&json!(4)), Some(4.0));
        assert_eq!(parse_number(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(parse_number(&json!("12px")), Some(12.0));
        assert_eq!(parse_number(&json!("-3")), Some(-3.0));
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!(".")), None);
        assert_eq!(parse_number(&json!(true)), None);
    }

    // ── Loose equality ───────────────────────────────────────────────

    #[test]
    fn loose_eq_strings_and_numbers() {
        assert!(loose_eq(&json!("active"), "active"));
        assert!(!loose_eq(&json!("active"), "Active"));
        assert!(loose_eq(&json!(5), "5"));
        assert!(loose_eq(&json!(5.0), "5"));
        assert!(!loose_eq(&json!(5), "five"));
    }

    #[test]
    fn loose_eq_bool_and_null() {
        assert!(loose_eq(&json!(true), "1"));
        assert!(loose_eq(&json!(false), "0"));
        assert!(!loose_eq(&json!(true), "true"));
        assert!(!loose_eq(&json!(null), "null"));
    }
}
