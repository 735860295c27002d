//! Form widget: owned fields, the remote initial-data source, and submit
//! actions.
//!
//! Activation runs in three steps, each only filling what the previous one
//! left unset or overriding it as noted:
//!
//! 1. form-scoped fields are seeded from global data under the same key;
//! 2. the remote source (`data-get`) is fetched and written, overriding
//!    seeded values;
//! 3. field defaults (`default`, then `value`) fill keys still unset.
//!
//! The network part lives on [`Page`](crate::page::Page); this module holds
//! the pure pieces.

use serde_json::{Map, Value};

use super::input::{initial_value, FieldBinding};
use super::label::field_label;
use crate::action::ActionDescriptor;
use crate::expr::Context;
use crate::meta::{NodeData, NodeId, WidgetTree, WidgetType};
use crate::path;
use crate::store::{DataStore, Scope};

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Field nodes owned by form `id`, in document order.
///
/// Nested forms own their own fields and are not descended into.
pub fn form_fields(tree: &WidgetTree, id: NodeId) -> Vec<NodeId> {
    let mut fields = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(id).iter().rev().copied().collect();
    while let Some(current) = stack.pop() {
        let Some(node) = tree.get(current) else { continue };
        match node.widget_type() {
            WidgetType::Form => continue,
            kind if kind.is_field() => fields.push(current),
            _ => {}
        }
        stack.extend(tree.children(current).iter().rev());
    }
    fields
}

/// Bindings of the fields owned by form `id`.
pub fn field_bindings(tree: &WidgetTree, id: NodeId) -> Vec<(NodeId, FieldBinding)> {
    form_fields(tree, id)
        .into_iter()
        .filter_map(|field| FieldBinding::resolve(tree, field).map(|b| (field, b)))
        .collect()
}

/// Step 1: copy global values into unset form-scoped keys.
pub fn seed_from_global(store: &mut DataStore, bindings: &[(NodeId, FieldBinding)]) -> usize {
    let mut seeded = 0;
    for (_, binding) in bindings.iter().filter(|(_, b)| b.scope == Scope::Form) {
        if store.is_defined(Scope::Form, &binding.key) {
            continue;
        }
        if let Some(value) = store.get(Scope::Global, &binding.key).cloned() {
            store.set(Scope::Form, &binding.key, value);
            seeded += 1;
        }
    }
    seeded
}

/// Step 3: write field defaults into keys still unset in their scope.
pub fn apply_defaults(
    tree: &WidgetTree,
    store: &mut DataStore,
    bindings: &[(NodeId, FieldBinding)],
) -> usize {
    let mut applied = 0;
    for (field, binding) in bindings {
        if store.is_defined(binding.scope, &binding.key) {
            continue;
        }
        let Some(initial) = tree.get(*field).and_then(initial_value).cloned() else {
            continue;
        };
        store.set(binding.scope, &binding.key, initial);
        applied += 1;
    }
    applied
}

// ---------------------------------------------------------------------------
// RemoteSource
// ---------------------------------------------------------------------------

/// A form's `data-get`: a URL, or `{url, params, mapping}`.
///
/// `mapping` maps form keys to dotted paths in the fetched payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSource {
    pub url: String,
    pub params: Map<String, Value>,
    pub mapping: Option<Vec<(String, String)>>,
}

impl RemoteSource {
    pub fn of(node: &NodeData) -> Option<Self> {
        match node.attributes.first(&["data-get", "dataGet"])? {
            Value::String(url) => Some(Self {
                url: url.clone(),
                params: Map::new(),
                mapping: None,
            }),
            Value::Object(spec) => {
                let url = spec.get("url").and_then(Value::as_str)?.to_owned();
                let mapping = spec.get("mapping").and_then(Value::as_object).map(|m| {
                    m.iter()
                        .filter_map(|(key, source)| {
                            source.as_str().map(|s| (key.clone(), s.to_owned()))
                        })
                        .collect()
                });
                Some(Self {
                    url,
                    params: spec
                        .get("params")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                    mapping,
                })
            }
            _ => None,
        }
    }

    /// The entries a fetched payload contributes to form data.
    ///
    /// Without a mapping an object payload is taken whole. With one, each
    /// form key takes the value at its source path; unresolved paths are
    /// left out.
    pub fn extract(&self, payload: &Value) -> Map<String, Value> {
        match &self.mapping {
            None => payload.as_object().cloned().unwrap_or_default(),
            Some(mapping) => mapping
                .iter()
                .filter_map(|(key, source)| {
                    path::get(payload, source).map(|v| (key.clone(), v.clone()))
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// FormView
// ---------------------------------------------------------------------------

/// Raw submit actions: `onSubmit`, then `onsubmit`.
pub fn submit_actions(node: &NodeData) -> Vec<ActionDescriptor> {
    node.attributes
        .first(&["onSubmit", "onsubmit"])
        .map(ActionDescriptor::parse_list)
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub label: Option<String>,
    pub name: Option<String>,
    /// Fallback endpoint for a `submit` action without a `url`.
    pub action: Option<String>,
    pub method: Option<String>,
}

impl FormView {
    pub fn bind(node: &NodeData, context: &Context<'_>) -> Self {
        let text = |name: &str| node.attributes.get_str(name).map(str::to_owned);
        Self {
            label: field_label(node, context),
            name: text("name"),
            action: text("action"),
            method: text("method"),
        }
    }
}
