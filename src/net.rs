//! Collaborator interfaces: network transport and navigation.
//!
//! The interpreter never performs I/O itself. An embedding application
//! supplies a [`Network`] (HTTP or anything else that answers with
//! [`Envelope`]s) and a [`Navigator`]. Headless implementations for tests
//! live in [`crate::testing`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::EnvelopeSettings;
use crate::value::is_truthy;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The normalized shape of every response the core consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(rename = "return", default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// A successful envelope carrying `payload`.
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload,
            error: None,
        }
    }

    /// An application-level failure.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Value::Null,
            error: Some(error.into()),
        }
    }

    /// Coerce an arbitrary response body into an envelope.
    ///
    /// An object carrying the success key is read as an envelope, taking the
    /// payload from the return key and falling back to `data`. Anything else
    /// counts as success, with `data` (when set) or the whole body as
    /// payload.
    pub fn from_response(raw: Value, settings: &EnvelopeSettings) -> Self {
        let Value::Object(mut map) = raw else {
            return Self::ok(raw);
        };
        match map.get(&settings.success_key) {
            Some(flag) => {
                let success = is_truthy(flag);
                let payload = map
                    .remove(&settings.return_key)
                    .filter(|v| !v.is_null())
                    .or_else(|| map.remove("data"))
                    .unwrap_or(Value::Null);
                let error = map
                    .get("error")
                    .or_else(|| map.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                Self {
                    success,
                    payload,
                    error,
                }
            }
            None => match map.remove("data") {
                Some(data) if is_truthy(&data) => Self::ok(data),
                Some(data) => {
                    map.insert("data".into(), data);
                    Self::ok(Value::Object(map))
                }
                None => Self::ok(Value::Object(map)),
            },
        }
    }

    /// Human-readable failure reason.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("request failed")
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Transport-level failure reported by a [`Network`].
///
/// The core treats these exactly like an envelope with `success: false`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("could not decode response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// A file handed to [`Network::upload_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Request/response transport.
///
/// Futures are not required to be `Send`: the interpreter runs on a single
/// cooperative execution context.
#[async_trait(?Send)]
pub trait Network {
    async fn get(&self, endpoint: &str, params: &Map<String, Value>) -> Result<Envelope, NetworkError>;

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Envelope, NetworkError>;

    async fn put(&self, endpoint: &str, body: &Value) -> Result<Envelope, NetworkError>;

    async fn delete(&self, endpoint: &str) -> Result<Envelope, NetworkError>;

    async fn upload_file(
        &self,
        endpoint: &str,
        file: &Upload,
        extra: &Map<String, Value>,
    ) -> Result<Envelope, NetworkError>;
}

/// Fire-and-forget navigation.
pub trait Navigator {
    fn navigate(&self, destination: &str);
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn coerce(raw: Value) -> Envelope {
        Envelope::from_response(raw, &EnvelopeSettings::default())
    }

    #[test]
    fn envelope_passes_through() {
        let env = coerce(json!({"success": true, "return": {"id": 7}}));
        assert_eq!(env, Envelope::ok(json!({"id": 7})));
    }

    #[test]
    fn envelope_falls_back_to_data() {
        let env = coerce(json!({"success": true, "data": [1, 2]}));
        assert_eq!(env.payload, json!([1, 2]));
    }

    #[test]
    fn failure_keeps_error() {
        let env = coerce(json!({"success": false, "error": "nope", "return": null}));
        assert!(!env.success);
        assert_eq!(env.error_message(), "nope");
        assert_eq!(env.payload, Value::Null);
    }

    #[test]
    fn bare_bodies_are_successful() {
        assert_eq!(coerce(json!([1])), Envelope::ok(json!([1])));
        assert_eq!(coerce(json!({"data": {"a": 1}})), Envelope::ok(json!({"a": 1})));
        assert_eq!(coerce(json!({"a": 1})), Envelope::ok(json!({"a": 1})));
    }

    #[test]
    fn custom_keys() {
        let settings = EnvelopeSettings {
            return_key: "result".into(),
            success_key: "ok".into(),
        };
        let env = Envelope::from_response(json!({"ok": 1, "result": "x"}), &settings);
        assert_eq!(env, Envelope::ok(json!("x")));
    }

    #[test]
    fn envelope_serde_uses_return_key() {
        let env: Envelope = serde_json::from_value(json!({"success": true, "return": 5})).unwrap();
        assert_eq!(env.payload, json!(5));
        assert_eq!(
            serde_json::to_value(Envelope::failure("x")).unwrap(),
            json!({"success": false, "return": null, "error": "x"})
        );
    }

    #[test]
    fn network_error_messages() {
        let err = NetworkError::Status {
            endpoint: "/api".into(),
            status: 500,
        };
        assert_eq!(err.to_string(), "/api answered with status 500");
    }
}
