//! Button widget: a caption and the action list it dispatches on click.

use serde_json::Value;

use crate::action::ActionDescriptor;
use crate::expr::{interpolate, Context};
use crate::meta::NodeData;
use crate::value::is_truthy;

// ---------------------------------------------------------------------------
// Button
// ---------------------------------------------------------------------------

/// Caption shown when a button declares none.
pub const DEFAULT_CAPTION: &str = "Button";

/// Raw click actions: `onclick`, then `onClick`, then `pmeOnClick`.
pub fn click_actions(node: &NodeData) -> Option<&Value> {
    node.attributes.first(&["onclick", "onClick", "pmeOnClick"])
}

/// A bound button.
///
/// # Examples
///
/// ```ignore
/// let view = ButtonView::bind(node, &store.context());
/// dispatcher.dispatch(&view.actions, &DispatchContext::default()).await;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonView {
    caption: String,
    actions: Vec<ActionDescriptor>,
    disabled: bool,
}

impl ButtonView {
    /// Bind `node`: caption from `title`, then `label`, interpolated.
    pub fn bind(node: &NodeData, context: &Context<'_>) -> Self {
        let caption = node
            .attributes
            .first_str(&["title", "label"])
            .map_or_else(|| DEFAULT_CAPTION.to_owned(), |text| interpolate(text, context));
        Self {
            caption,
            actions: click_actions(node)
                .map(ActionDescriptor::parse_list)
                .unwrap_or_default(),
            disabled: node.attributes.get("disabled").is_some_and(is_truthy),
        }
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Parsed click actions, in order.
    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    /// Whether the button is disabled. A disabled button dispatches nothing.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Verb;
    use serde_json::json;

    fn node(attrs: Value) -> NodeData {
        NodeData::new("b", Some("button")).with_attributes(attrs.as_object().cloned().unwrap())
    }

    #[test]
    fn caption_precedence() {
        let cx = Context::new();
        assert_eq!(ButtonView::bind(&node(json!({})), &cx).caption(), "Button");
        assert_eq!(
            ButtonView::bind(&node(json!({"label": "L", "pm::title": "T"})), &cx).caption(),
            "T"
        );
        assert_eq!(ButtonView::bind(&node(json!({"pm::label": "Save"})), &cx).caption(), "Save");
    }

    #[test]
    fn actions_from_any_spelling() {
        let cx = Context::new();
        for key in ["onclick", "onClick", "pmeOnClick"] {
            let mut attrs = serde_json::Map::new();
            attrs.insert(key.into(), json!({"action": "navigate", "url": "/x"}));
            let view = ButtonView::bind(&NodeData::new("b", Some("button")).with_attributes(attrs), &cx);
            assert_eq!(view.actions().len(), 1, "{key}");
            assert!(matches!(view.actions()[0].verb, Verb::Navigate { .. }));
        }
    }

    #[test]
    fn disabled_flag() {
        let view = ButtonView::bind(&node(json!({"disabled": true})), &Context::new());
        assert!(view.is_disabled());
    }
}
