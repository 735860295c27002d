//! Built-in widgets: Input, Select, Label, Button, Grid, Form, and containers.
//!
//! Each widget type has a bind contract turning a node plus the current data
//! into a view. [`bind`] is the single dispatch point from
//! [`WidgetType`] to those contracts.

pub mod button;
pub mod form;
pub mod grid;
pub mod input;
pub mod label;
pub mod select;
pub mod validation;

pub use button::ButtonView;
pub use form::{FormView, RemoteSource};
pub use grid::{Column, GridSource, GridState, GridView};
pub use input::{FieldBinding, InputKind, InputView};
pub use label::LabelView;
pub use select::{OptionsMapping, OptionsSource, SelectOption, SelectView};
pub use validation::{Rule, RuleKind, Validator};

use std::collections::HashMap;

use crate::meta::{NodeId, WidgetTree, WidgetType};
use crate::store::DataStore;

/// Widget-local state that lives outside the data store: fetched grid rows,
/// fetched select options, and the last validation messages per field.
#[derive(Debug, Clone, Default)]
pub struct WidgetState {
    pub grids: HashMap<NodeId, GridState>,
    pub options: HashMap<NodeId, Vec<SelectOption>>,
    pub errors: HashMap<NodeId, Vec<String>>,
}

impl WidgetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self, id: NodeId) -> &[String] {
        self.errors.get(&id).map_or(&[], Vec::as_slice)
    }
}

/// A bound widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetView {
    /// Containers, tabs, and cards: layout only, with an optional caption.
    Container { kind: WidgetType, label: Option<String> },
    Form(FormView),
    Input(InputView),
    Select(SelectView),
    Label(LabelView),
    Button(ButtonView),
    Grid(GridView),
}

/// Bind node `id` against the store and widget state.
pub fn bind(tree: &WidgetTree, id: NodeId, store: &DataStore, state: &WidgetState) -> Option<WidgetView> {
    let node = tree.get(id)?;
    let context = store.context();
    let view = match node.widget_type() {
        WidgetType::Form => WidgetView::Form(FormView::bind(node, &context)),
        WidgetType::Input | WidgetType::Checkbox | WidgetType::Radio => {
            WidgetView::Input(InputView::bind(tree, id, store)?)
        }
        WidgetType::Select => WidgetView::Select(SelectView::bind(
            tree,
            id,
            store,
            state.options.get(&id).map(Vec::as_slice),
        )?),
        WidgetType::Label => WidgetView::Label(LabelView::bind(node, &context)),
        WidgetType::Button => WidgetView::Button(ButtonView::bind(node, &context)),
        WidgetType::Grid => WidgetView::Grid(GridView::bind(tree, id, store, state.grids.get(&id))?),
        kind @ (WidgetType::Container | WidgetType::Tabs | WidgetType::Tab | WidgetType::Card) => {
            WidgetView::Container {
                kind,
                label: label::field_label(node, &context),
            }
        }
    };
    Some(view)
}

/// Whether a widget's children are widgets. A grid's children declare its
/// columns.
pub fn renders_children(kind: WidgetType) -> bool {
    kind != WidgetType::Grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::NodeData;
    use serde_json::json;

    #[test]
    fn bind_dispatches_on_type() {
        let mut tree = WidgetTree::new();
        let root = tree.insert(NodeData::new("root", Some("card")));
        tree.set_root(root);
        let label = tree.insert_child(
            root,
            NodeData::new("hi", Some("header"))
                .with_attributes(json!({"label": "Hi {who}"}).as_object().cloned().unwrap()),
        );
        let field = tree.insert_child(root, NodeData::new("who", Some("string")));
        let store = DataStore::new().with_global(json!({"who": "Ada"}));
        let state = WidgetState::new();

        assert!(matches!(
            bind(&tree, root, &store, &state),
            Some(WidgetView::Container { kind: WidgetType::Card, label: None })
        ));
        let Some(WidgetView::Label(view)) = bind(&tree, label, &store, &state) else {
            panic!("expected a label");
        };
        assert_eq!(view.text, "Hi Ada");
        assert_eq!(view.element, "h2");
        let Some(WidgetView::Input(input)) = bind(&tree, field, &store, &state) else {
            panic!("expected an input");
        };
        assert_eq!(input.value, json!("Ada"));
    }

    #[test]
    fn errors_default_to_empty() {
        let mut tree = WidgetTree::new();
        let id = tree.insert(NodeData::new("x", None));
        let mut state = WidgetState::new();
        assert!(state.errors(id).is_empty());
        state.errors.insert(id, vec!["bad".into()]);
        assert_eq!(state.errors(id), ["bad".to_owned()]);
    }
}
