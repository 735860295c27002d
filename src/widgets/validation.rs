//! Field validation: a fixed set of rules read from a `validation` list.
//!
//! Rule shape: `{type, value?, message?}`. Every rule except `required`
//! passes on an empty value, so an empty optional field never reports a
//! format error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::meta::Attributes;
use crate::value::{display, is_truthy, parse_number};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Whether `text` looks like an email address.
pub fn is_valid_email(text: &str) -> bool {
    EMAIL.is_match(text)
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    Required,
    Email,
    MinLength(f64),
    MaxLength(f64),
    Min(f64),
    Max(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    /// Author-supplied message, replacing the default.
    pub message: Option<String>,
    /// The rule's bound as written, for the default message.
    bound: String,
}

impl Rule {
    /// Parse one rule; unknown types and bounds that are not numbers yield
    /// `None`.
    pub fn parse(raw: &Value) -> Option<Self> {
        let map = raw.as_object()?;
        let bound_value = map.get("value");
        let bound = || bound_value.and_then(parse_number);
        let kind = match map.get("type").and_then(Value::as_str)? {
            "required" => RuleKind::Required,
            "email" => RuleKind::Email,
            "minLength" => RuleKind::MinLength(bound()?),
            "maxLength" => RuleKind::MaxLength(bound()?),
            "min" => RuleKind::Min(bound()?),
            "max" => RuleKind::Max(bound()?),
            other => {
                debug!(rule = other, "unknown validation rule");
                return None;
            }
        };
        Some(Self {
            kind,
            message: map.get("message").and_then(Value::as_str).map(str::to_owned),
            bound: bound_value.map(display).unwrap_or_default(),
        })
    }

    /// The failure message for `value`, or `None` when it passes.
    pub fn check(&self, value: &Value) -> Option<String> {
        let failed = match &self.kind {
            RuleKind::Required => is_blank(value),
            _ if !is_truthy(value) => false,
            RuleKind::Email => !is_valid_email(&display(value)),
            RuleKind::MinLength(n) => length(value).is_some_and(|len| len < *n),
            RuleKind::MaxLength(n) => length(value).is_some_and(|len| len > *n),
            RuleKind::Min(n) => parse_number(value).is_some_and(|v| v < *n),
            RuleKind::Max(n) => parse_number(value).is_some_and(|v| v > *n),
        };
        failed.then(|| self.message.clone().unwrap_or_else(|| self.default_message()))
    }

    fn default_message(&self) -> String {
        match self.kind {
            RuleKind::Required => "This field is required".to_owned(),
            RuleKind::Email => "Invalid email format".to_owned(),
            RuleKind::MinLength(_) => format!("Minimum length is {}", self.bound),
            RuleKind::MaxLength(_) => format!("Maximum length is {}", self.bound),
            RuleKind::Min(_) => format!("Minimum value is {}", self.bound),
            RuleKind::Max(_) => format!("Maximum value is {}", self.bound),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    !is_truthy(value) || display(value).trim().is_empty()
}

fn length(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        _ => None,
    }
}

/// The rules declared on one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validator {
    rules: Vec<Rule>,
}

impl Validator {
    /// Read the `validation` attribute.
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let rules = match attributes.get("validation") {
            Some(Value::Array(items)) => items.iter().filter_map(Rule::parse).collect(),
            Some(single @ Value::Object(_)) => Rule::parse(single).into_iter().collect(),
            _ => Vec::new(),
        };
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Every failure message for `value`, in rule order.
    pub fn validate(&self, value: &Value) -> Vec<String> {
        self.rules.iter().filter_map(|rule| rule.check(value)).collect()
    }
}
