//! Input widget: field binding, value resolution, and the input kind.

use serde_json::Value;

use super::label::field_label;
use super::validation::{RuleKind, Validator};
use crate::format::format_value;
use crate::meta::{NodeData, NodeId, WidgetTree, WidgetType};
use crate::store::{DataStore, Scope};
use crate::value::{display, is_truthy};

// ---------------------------------------------------------------------------
// FieldBinding
// ---------------------------------------------------------------------------

/// Where a field reads and writes its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// Data key, from `name`, falling back to the node key.
    pub key: String,
    pub scope: Scope,
}

impl FieldBinding {
    /// Resolve the binding of node `id`.
    ///
    /// An explicit `scope` attribute wins. Otherwise a field nested in a form
    /// binds to form scope and any other field to global scope.
    pub fn resolve(tree: &WidgetTree, id: NodeId) -> Option<Self> {
        let node = tree.get(id)?;
        let key = node
            .attributes
            .get_str("name")
            .filter(|name| !name.is_empty())
            .unwrap_or(&node.key)
            .to_owned();
        let explicit = node.attributes.get_str("scope").and_then(Scope::parse);
        let scope = explicit.unwrap_or_else(|| {
            let in_form = tree
                .ancestors(id)
                .into_iter()
                .filter_map(|a| tree.get(a))
                .any(|a| a.widget_type() == WidgetType::Form);
            if in_form {
                Scope::Form
            } else {
                Scope::Global
            }
        });
        Some(Self { key, scope })
    }
}

/// The value a field shows: form scope, then global scope, then the node's
/// `default`, then its `value`, then the empty string.
pub fn field_value(store: &DataStore, binding: &FieldBinding, node: &NodeData) -> Value {
    store
        .get(Scope::Form, &binding.key)
        .or_else(|| store.get(Scope::Global, &binding.key))
        .or_else(|| initial_value(node))
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

/// The author-declared starting value: `default`, then `value`.
pub fn initial_value(node: &NodeData) -> Option<&Value> {
    node.attributes
        .get("default")
        .or_else(|| node.attributes.get("value"))
        .filter(|v| !v.is_null())
}

// ---------------------------------------------------------------------------
// InputKind
// ---------------------------------------------------------------------------

/// Keyboard/entry behaviour of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Email,
    Password,
    Tel,
    Number,
    Date,
    Time,
    DateTimeLocal,
    Checkbox,
    Radio,
}

impl InputKind {
    /// Map a type name (`email`, `phone`, `currency`, ...) to a kind.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "email" => Self::Email,
            "password" => Self::Password,
            "phone" | "tel" => Self::Tel,
            "number" | "currency" => Self::Number,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime" | "datetime-local" => Self::DateTimeLocal,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            _ => Self::Text,
        }
    }

    /// Kind of node: `inputType`, then `type`, then the raw tag.
    pub fn of(node: &NodeData) -> Self {
        match node.widget_type() {
            WidgetType::Checkbox => return Self::Checkbox,
            WidgetType::Radio => return Self::Radio,
            _ => {}
        }
        node.attributes
            .first_str(&["inputType", "type"])
            .map(str::to_owned)
            .or_else(|| node.source_tag.clone())
            .map_or(Self::Text, |name| Self::from_name(&name))
    }

    /// The HTML `type` attribute for this kind.
    pub fn as_html_type(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
            Self::Tel => "tel",
            Self::Number => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTimeLocal => "datetime-local",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
        }
    }
}

// ---------------------------------------------------------------------------
// InputView
// ---------------------------------------------------------------------------

/// A bound input, ready to show.
#[derive(Debug, Clone, PartialEq)]
pub struct InputView {
    pub binding: FieldBinding,
    pub kind: InputKind,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub value: Value,
    /// Display format (`currency`, `date`, ...), applied when shown.
    pub format: Option<String>,
    pub required: bool,
    pub validator: Validator,
}

impl InputView {
    pub fn bind(tree: &WidgetTree, id: NodeId, store: &DataStore) -> Option<Self> {
        let node = tree.get(id)?;
        let binding = FieldBinding::resolve(tree, id)?;
        let validator = Validator::from_attributes(&node.attributes);
        let required = node.attributes.get("required").is_some_and(is_truthy)
            || validator.rules().iter().any(|r| r.kind == RuleKind::Required);
        Some(Self {
            value: field_value(store, &binding, node),
            kind: InputKind::of(node),
            label: field_label(node, &store.context()),
            placeholder: node.attributes.get_str("placeholder").map(str::to_owned),
            format: node.attributes.get_str("format").map(str::to_owned),
            required,
            validator,
            binding,
        })
    }

    /// The value as shown, with the display format applied.
    pub fn display_value(&self) -> String {
        match (&self.format, &self.value) {
            (_, Value::Null) => String::new(),
            (Some(format), value) => format_value(value, format),
            (None, value) => display(value),
        }
    }
}
