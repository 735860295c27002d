//! Action descriptors: the declarative instructions attached to widget events.
//!
//! Descriptors are parsed leniently. A list may be a JSON array, a single
//! object, or absent; entries that are not objects are dropped. Required
//! fields stay optional here so the dispatcher can log and skip an incomplete
//! action instead of rejecting the whole list.

use serde_json::{Map, Value};

/// One parsed action plus its continuations.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    pub verb: Verb,
    /// Runs after the action succeeds.
    pub on_success: Vec<ActionDescriptor>,
    /// Runs after the action fails.
    pub on_error: Vec<ActionDescriptor>,
}

/// The fixed action vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum Verb {
    OpenModal { modal_id: Option<String> },
    CloseModal { modal_id: Option<String> },
    Submit(SubmitSpec),
    /// `get` and `update`.
    Fetch(FetchSpec),
    Broadcast {
        event: String,
        target: Option<String>,
        data: Value,
    },
    Navigate { url: Option<String> },
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitSpec {
    pub url: Option<String>,
    /// Global-scope paths copied into the outgoing payload.
    pub additional_post: Vec<String>,
    /// Whether a successful response is merged into global-scope data.
    pub update_global: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSpec {
    pub url: Option<String>,
    pub params: Map<String, Value>,
    /// Global-scope path receiving the payload; merged at the root when absent.
    pub target: Option<String>,
    /// Channel re-broadcasting the fetched payload.
    pub broadcast: Option<String>,
}

impl ActionDescriptor {
    /// Parse one descriptor. `None` for anything that is not an object.
    pub fn parse(raw: &Value) -> Option<Self> {
        let map = raw.as_object()?;
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_owned);

        let verb = match map.get("action").and_then(Value::as_str).unwrap_or("") {
            "openModal" => Verb::OpenModal {
                modal_id: text("modalId"),
            },
            "closeModal" => Verb::CloseModal {
                modal_id: text("modalId"),
            },
            "submit" => Verb::Submit(SubmitSpec {
                url: text("url"),
                additional_post: map
                    .get("additional_post")
                    .map(string_list)
                    .unwrap_or_default(),
                update_global: map
                    .get("updateAllData")
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
            }),
            "get" | "update" => Verb::Fetch(FetchSpec {
                url: text("url"),
                params: map
                    .get("params")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
                target: text("target"),
                broadcast: text("broadcast"),
            }),
            "broadcast" => Verb::Broadcast {
                event: text("event").unwrap_or_else(|| "update".to_owned()),
                target: text("target"),
                data: map.get("data").cloned().unwrap_or(Value::Null),
            },
            "navigate" => Verb::Navigate { url: text("url") },
            other => Verb::Unknown(other.to_owned()),
        };

        Some(Self {
            verb,
            on_success: map.get("onSuccess").map(Self::parse_list).unwrap_or_default(),
            on_error: map.get("onError").map(Self::parse_list).unwrap_or_default(),
        })
    }

    /// Parse an action list: an array, a single object, or nothing.
    pub fn parse_list(raw: &Value) -> Vec<Self> {
        match raw {
            Value::Array(items) => items.iter().filter_map(Self::parse).collect(),
            Value::Object(_) => Self::parse(raw).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// The verb's name as written in metadata.
    pub fn name(&self) -> &str {
        match &self.verb {
            Verb::OpenModal { .. } => "openModal",
            Verb::CloseModal { .. } => "closeModal",
            Verb::Submit(_) => "submit",
            Verb::Fetch(_) => "get",
            Verb::Broadcast { .. } => "broadcast",
            Verb::Navigate { .. } => "navigate",
            Verb::Unknown(name) => name,
        }
    }
}

fn string_list(raw: &Value) -> Vec<String> {
    match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        Value::String(single) => vec![single.clone()],
        _ => Vec::new(),
    }
}
