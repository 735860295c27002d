//! Select widget: static or remotely fetched options.

use serde_json::{Map, Value};

use super::input::{field_value, FieldBinding};
use super::label::field_label;
use crate::meta::{NodeData, NodeId, WidgetTree};
use crate::path;
use crate::store::DataStore;
use crate::value::display;

/// One choice.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// Read one option as written in metadata.
    ///
    /// Objects use `label` (or `text`) and `value` (or `key`); scalars are
    /// both label and value.
    pub fn from_value(raw: &Value) -> Option<Self> {
        match raw {
            Value::Object(map) => {
                let value = map.get("value").or_else(|| map.get("key"))?.clone();
                let label = map
                    .get("label")
                    .or_else(|| map.get("text"))
                    .map_or_else(|| display(&value), display);
                Some(Self { label, value })
            }
            Value::Null => None,
            scalar => Some(Self::new(display(scalar), scalar.clone())),
        }
    }
}

/// Field names picked out of remote option records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsMapping {
    pub key: String,
    pub label: String,
    /// Falls back to `key`.
    pub value: Option<String>,
}

impl OptionsMapping {
    pub fn from_value(raw: &Value) -> Option<Self> {
        let map = raw.as_object()?;
        let field = |name: &str| map.get(name).and_then(Value::as_str).map(str::to_owned);
        Some(Self {
            key: field("key").unwrap_or_else(|| "id".to_owned()),
            label: field("label").unwrap_or_else(|| "label".to_owned()),
            value: field("value"),
        })
    }

    fn value_field(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.key)
    }
}

/// Where a select gets its options.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsSource {
    Static(Vec<SelectOption>),
    Remote {
        url: String,
        params: Map<String, Value>,
        mapping: Option<OptionsMapping>,
    },
    None,
}

impl OptionsSource {
    /// `options` wins over `optionsUrl` / `options-get`.
    pub fn of(node: &NodeData) -> Self {
        let attrs = &node.attributes;
        if let Some(Value::Array(items)) = attrs.get("options") {
            return Self::Static(static_options(items));
        }
        let (url, params) = match attrs.first(&["optionsUrl", "options-get"]) {
            Some(Value::String(url)) => (url.clone(), Map::new()),
            Some(Value::Object(spec)) => match spec.get("url").and_then(Value::as_str) {
                Some(url) => (
                    url.to_owned(),
                    spec.get("params").and_then(Value::as_object).cloned().unwrap_or_default(),
                ),
                None => return Self::None,
            },
            _ => return Self::None,
        };
        Self::Remote {
            url,
            params,
            mapping: attrs.get("optionsMapping").and_then(OptionsMapping::from_value),
        }
    }
}

pub fn static_options(items: &[Value]) -> Vec<SelectOption> {
    items.iter().filter_map(SelectOption::from_value).collect()
}

/// Turn a fetched payload into options. Anything but an array is empty.
pub fn map_options(payload: &Value, mapping: Option<&OptionsMapping>) -> Vec<SelectOption> {
    let Value::Array(records) = payload else {
        return Vec::new();
    };
    let Some(mapping) = mapping else {
        return static_options(records);
    };
    records
        .iter()
        .filter_map(|record| {
            let value = path::get(record, mapping.value_field())?.clone();
            let label = path::get(record, &mapping.label).map_or_else(|| display(&value), display);
            Some(SelectOption { label, value })
        })
        .collect()
}

/// A bound select.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectView {
    pub binding: FieldBinding,
    pub label: Option<String>,
    pub options: Vec<SelectOption>,
    pub value: Value,
}

impl SelectView {
    /// Bind node `id`; `loaded` holds remotely fetched options, if any.
    pub fn bind(
        tree: &WidgetTree,
        id: NodeId,
        store: &DataStore,
        loaded: Option<&[SelectOption]>,
    ) -> Option<Self> {
        let node = tree.get(id)?;
        let binding = FieldBinding::resolve(tree, id)?;
        let options = match OptionsSource::of(node) {
            OptionsSource::Static(options) => options,
            _ => loaded.map(<[SelectOption]>::to_vec).unwrap_or_default(),
        };
        Some(Self {
            value: field_value(store, &binding, node),
            label: field_label(node, &store.context()),
            options,
            binding,
        })
    }

    /// The option matching the current value, compared by display text.
    pub fn selected(&self) -> Option<&SelectOption> {
        let current = display(&self.value);
        self.options.iter().find(|o| display(&o.value) == current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(attrs: Value) -> NodeData {
        NodeData::new("country", Some("select")).with_attributes(attrs.as_object().cloned().unwrap())
    }

    #[test]
    fn static_options_win() {
        let n = node(json!({
            "options": [{"label": "Egypt", "value": "eg"}, "fr", {"key": 3}],
            "optionsUrl": "/ignored"
        }));
        let OptionsSource::Static(options) = OptionsSource::of(&n) else {
            panic!("expected static options");
        };
        assert_eq!(
            options,
            vec![
                SelectOption::new("Egypt", json!("eg")),
                SelectOption::new("fr", json!("fr")),
                SelectOption::new("3", json!(3)),
            ]
        );
    }

    #[test]
    fn remote_source_with_mapping() {
        let n = node(json!({
            "options-get": {"url": "/countries", "params": {"region": "eu"}},
            "optionsMapping": {"key": "code", "label": "name"}
        }));
        assert_eq!(
            OptionsSource::of(&n),
            OptionsSource::Remote {
                url: "/countries".into(),
                params: json!({"region": "eu"}).as_object().cloned().unwrap(),
                mapping: Some(OptionsMapping { key: "code".into(), label: "name".into(), value: None }),
            }
        );
        assert_eq!(OptionsSource::of(&node(json!({}))), OptionsSource::None);
    }

    #[test]
    fn mapping_falls_back_to_key() {
        let mapping = OptionsMapping { key: "code".into(), label: "name".into(), value: None };
        let payload = json!([{"code": "de", "name": "Germany"}, {"name": "no code"}]);
        assert_eq!(
            map_options(&payload, Some(&mapping)),
            vec![SelectOption::new("Germany", json!("de"))]
        );
        assert!(map_options(&json!({"not": "a list"}), Some(&mapping)).is_empty());
    }

    #[test]
    fn selected_option() {
        let mut tree = WidgetTree::new();
        let root = tree.insert(NodeData::new("root", None));
        tree.set_root(root);
        let id = tree.insert_child(root, node(json!({"options": [1, 2]})));
        let store = DataStore::new().with_global(json!({"country": "2"}));
        let view = SelectView::bind(&tree, id, &store, None).unwrap();
        assert_eq!(view.selected().map(|o| o.label.as_str()), Some("2"));
    }
}
