//! Engine configuration: envelope keys, widget defaults, limits.
//!
//! [`EngineConfig`] can be built in code with the builder methods or loaded
//! from a JSON defaults document with [`EngineConfig::from_json_str`]. Every
//! field is optional in JSON; missing fields take the built-in defaults.

use serde::Deserialize;
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// EnvelopeSettings
// ---------------------------------------------------------------------------

/// Field names used when coercing raw responses into an
/// [`Envelope`](crate::net::Envelope).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvelopeSettings {
    /// Key holding the response payload.
    pub return_key: String,
    /// Key holding the success flag.
    pub success_key: String,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            return_key: "return".into(),
            success_key: "success".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Configuration for the interpreter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Envelope field names.
    pub settings: EnvelopeSettings,
    /// Widget-type-keyed attribute defaults (raw tag or resolved type name →
    /// attribute map). Defaults only fill attributes a node leaves unset.
    pub widgets: Map<String, Value>,
    /// Maximum nesting depth accepted by the normalizer.
    pub max_depth: usize,
    /// Whether metadata documents fetched by URL are cached.
    pub cache_metadata: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settings: EnvelopeSettings::default(),
            widgets: default_widget_table(),
            max_depth: 256,
            cache_metadata: true,
        }
    }
}

impl EngineConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON defaults document.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Set the attribute defaults for one widget tag (builder).
    ///
    /// Replaces any defaults previously registered for `tag`.
    pub fn with_widget_defaults(mut self, tag: impl Into<String>, defaults: Map<String, Value>) -> Self {
        self.widgets.insert(tag.into().to_lowercase(), Value::Object(defaults));
        self
    }

    /// Set the envelope settings (builder).
    pub fn with_settings(mut self, settings: EnvelopeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the maximum nesting depth (builder).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable the metadata cache (builder).
    pub fn with_cache_metadata(mut self, cache: bool) -> Self {
        self.cache_metadata = cache;
        self
    }

    /// Attribute defaults registered for `tag`, if any.
    pub fn widget_defaults(&self, tag: &str) -> Option<&Map<String, Value>> {
        self.widgets.get(tag).and_then(Value::as_object)
    }
}

/// Built-in defaults for the input aliases.
fn default_widget_table() -> Map<String, Value> {
    let table = json!({
        "email": { "inputType": "email" },
        "password": { "inputType": "password" },
        "currency": { "inputType": "number", "format": "currency" },
    });
    match table {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.settings.return_key, "return");
        assert_eq!(config.settings.success_key, "success");
        assert_eq!(config.max_depth, 256);
        assert!(config.cache_metadata);
    }

    #[test]
    fn builtin_widget_defaults() {
        let config = EngineConfig::new();
        let currency = config.widget_defaults("currency").unwrap();
        assert_eq!(currency["format"], "currency");
        assert_eq!(currency["inputType"], "number");
        assert!(config.widget_defaults("button").is_none());
    }

    #[test]
    fn builder() {
        let mut defaults = Map::new();
        defaults.insert("variant".into(), json!("primary"));
        let config = EngineConfig::new()
            .with_widget_defaults("Button", defaults)
            .with_max_depth(8)
            .with_cache_metadata(false);
        assert_eq!(config.widget_defaults("button").unwrap()["variant"], "primary");
        assert_eq!(config.max_depth, 8);
        assert!(!config.cache_metadata);
    }

    #[test]
    fn from_json_partial() {
        let config = EngineConfig::from_json_str(
            r#"{ "settings": { "returnKey": "data" }, "maxDepth": 32 }"#,
        )
        .unwrap();
        assert_eq!(config.settings.return_key, "data");
        assert_eq!(config.settings.success_key, "success");
        assert_eq!(config.max_depth, 32);
        // Widget table falls back to the built-in defaults.
        assert!(config.widget_defaults("email").is_some());
    }

    #[test]
    fn from_json_replaces_widget_table() {
        let config = EngineConfig::from_json_str(
            r#"{ "widgets": { "phone": { "inputType": "tel" } } }"#,
        )
        .unwrap();
        assert_eq!(config.widget_defaults("phone").unwrap()["inputType"], "tel");
        assert!(config.widget_defaults("email").is_none());
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(EngineConfig::from_json_str("{ not json").is_err());
    }
}
