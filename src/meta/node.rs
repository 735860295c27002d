//! Node types: NodeId, WidgetType, Attributes, NodeData.

use std::fmt;

use serde_json::{Map, Value};
use slotmap::new_key_type;
use tracing::debug;

new_key_type! {
    /// Unique identifier for a widget node. Copy, lightweight (u64).
    pub struct NodeId;
}

// ---------------------------------------------------------------------------
// WidgetType
// ---------------------------------------------------------------------------

/// The closed widget vocabulary every raw tag resolves into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetType {
    Container,
    Form,
    Input,
    Button,
    Label,
    Select,
    Grid,
    Tabs,
    Tab,
    Card,
    Checkbox,
    Radio,
}

impl WidgetType {
    /// Resolve a raw tag through the alias table.
    ///
    /// Matching is case-insensitive. Unknown tags resolve to
    /// [`WidgetType::Container`].
    pub fn resolve(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "container" | "flexbox" => Self::Container,
            "form" => Self::Form,
            "input" | "string" | "email" | "password" | "phone" | "number" | "currency"
            | "date" | "time" | "datetime" => Self::Input,
            "button" => Self::Button,
            "label" | "header" => Self::Label,
            "select" => Self::Select,
            "grid" | "grid_agura" => Self::Grid,
            "tabs" => Self::Tabs,
            "tab" => Self::Tab,
            "card" => Self::Card,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            other => {
                debug!(tag = other, "unknown widget type, using container");
                Self::Container
            }
        }
    }

    /// Canonical lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Form => "form",
            Self::Input => "input",
            Self::Button => "button",
            Self::Label => "label",
            Self::Select => "select",
            Self::Grid => "grid",
            Self::Tabs => "tabs",
            Self::Tab => "tab",
            Self::Card => "card",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
        }
    }

    /// Whether this widget binds a value into the data store.
    pub fn is_field(self) -> bool {
        matches!(self, Self::Input | Self::Select | Self::Checkbox | Self::Radio)
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Presentation and behaviour properties of a node.
///
/// Lookups accept both the bare and the `pm::`-prefixed spelling of a name,
/// bare first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Value of `name` or `pm::name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .get(name)
            .or_else(|| self.0.get(&format!("pm::{name}")))
    }

    /// String value of `name` or `pm::name`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// First of `names` that is present.
    pub fn first(&self, names: &[&str]) -> Option<&Value> {
        names.iter().find_map(|name| self.get(name))
    }

    /// First of `names` that holds a string.
    pub fn first_str(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get_str(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or overwrite an attribute.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Insert only if neither spelling of `name` is set yet.
    ///
    /// Returns whether the value was inserted.
    pub fn insert_default(&mut self, name: &str, value: Value) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.insert(name.to_owned(), value);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// NodeData
// ---------------------------------------------------------------------------

/// Data associated with a single normalized widget node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Child id under the parent (the declaring key in the raw document).
    pub key: String,
    widget_type: WidgetType,
    /// Raw tag as written in the document, before aliasing.
    pub source_tag: Option<String>,
    pub attributes: Attributes,
}

impl NodeData {
    /// Create a node; the widget type is resolved from `tag` once, here.
    pub fn new(key: impl Into<String>, tag: Option<&str>) -> Self {
        Self {
            key: key.into(),
            widget_type: tag.map_or(WidgetType::Container, WidgetType::resolve),
            source_tag: tag.map(str::to_owned),
            attributes: Attributes::new(),
        }
    }

    /// Set the attributes (builder).
    pub fn with_attributes(mut self, attributes: impl Into<Attributes>) -> Self {
        self.attributes = attributes.into();
        self
    }

    pub fn widget_type(&self) -> WidgetType {
        self.widget_type
    }

    /// Lower-cased raw tag, or the canonical type name when the node had no
    /// tag.
    pub fn tag(&self) -> String {
        self.source_tag
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_else(|| self.widget_type.as_str().to_owned())
    }
}
