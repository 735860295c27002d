//! Label widget: interpolated text and a heading level.

use serde_json::Value;

use crate::expr::{interpolate, Context};
use crate::meta::NodeData;
use crate::value::parse_number;

/// Caption of a field or container: `label`, interpolated.
pub fn field_label(node: &NodeData, context: &Context<'_>) -> Option<String> {
    node.attributes
        .first_str(&["label", "title"])
        .map(|text| interpolate(text, context))
}

/// Text of a label widget: `label`, then `text`, interpolated. Missing text
/// is empty.
pub fn label_text(node: &NodeData, context: &Context<'_>) -> String {
    node.attributes
        .first_str(&["label", "text"])
        .map(|text| interpolate(text, context))
        .unwrap_or_default()
}

/// Element a label renders as.
///
/// An explicit `element` wins. A `header` tag is an `h2`, and a `header`
/// attribute picks the heading level. Anything else is a `span`.
pub fn label_element(node: &NodeData) -> String {
    if let Some(element) = node.attributes.get_str("element") {
        return element.to_owned();
    }
    if node.tag() == "header" {
        return "h2".to_owned();
    }
    match node.attributes.get("header").and_then(heading_level) {
        Some(level) => format!("h{level}"),
        None => "span".to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelView {
    pub text: String,
    pub element: String,
}

impl LabelView {
    pub fn bind(node: &NodeData, context: &Context<'_>) -> Self {
        Self {
            text: label_text(node, context),
            element: label_element(node),
        }
    }

    /// Whether the label renders as a heading.
    pub fn is_heading(&self) -> bool {
        self.element.len() == 2 && self.element.starts_with('h')
    }
}

/// Heading level of a `header` attribute; `true` means `h2`.
fn heading_level(value: &Value) -> Option<u8> {
    match value {
        Value::Bool(true) => Some(2),
        Value::Bool(false) => None,
        other => parse_number(other)
            .filter(|n| (1.0..=6.0).contains(n))
            .map(|n| n as u8),
    }
}
