//! Metadata normalizer: raw JSON document → [`WidgetTree`] + modal definitions.
//!
//! Three node dialects are recognized, checked in this order:
//!
//! - **Namespaced**: `pm::Type` (or `@type`) names the widget, `pm::Meta`
//!   (or `@meta`) holds its attributes, and every other object-valued key that
//!   is not reserved is a child.
//! - **Inline**: `pm::type` (or legacy `type`) names the widget, attributes sit
//!   inline on the node, and children live under `childs` (or `children`).
//! - **Markerless**: no marker at all; the node is a container whose
//!   object-valued entries are children and whose other entries are
//!   attributes.
//!
//! Modal declarations (`pm::Modals` / `Modals`) are collected from every
//! object in the document regardless of depth, in pre-order, last id wins.

use serde_json::{Map, Value};
use tracing::debug;

use super::modal::ModalDefinition;
use super::node::{NodeData, NodeId};
use super::tree::WidgetTree;
use crate::config::EngineConfig;
use crate::value::parse_number;

type Object = Map<String, Value>;

/// Key given to the document's root node.
pub const ROOT_KEY: &str = "root";

const TYPE_MARKERS: [&str; 2] = ["pm::Type", "@type"];
const META_MARKERS: [&str; 2] = ["pm::Meta", "@meta"];
const INLINE_MARKERS: [&str; 2] = ["pm::type", "type"];
const MODAL_MARKERS: [&str; 2] = ["pm::Modals", "Modals"];
const CHILD_CONTAINERS: [&str; 2] = ["childs", "children"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structurally invalid metadata. Fatal for the document being normalized.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("malformed metadata: expected an object, got {0}")]
    NotAnObject(&'static str),
    #[error("malformed metadata: nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
    #[error("malformed metadata: {0}")]
    Json(#[from] serde_json::Error),
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One normalized metadata document.
#[derive(Debug)]
pub struct Document {
    pub tree: WidgetTree,
    pub root: NodeId,
    /// Extracted modals in first-declaration order, duplicates resolved.
    pub modals: Vec<ModalDefinition>,
}

impl Document {
    pub fn modal(&self, id: &str) -> Option<&ModalDefinition> {
        self.modals.iter().find(|modal| modal.id == id)
    }

    /// Structural snapshot of the main tree and every modal's content.
    pub fn to_value(&self) -> Value {
        let modals: Object = self
            .modals
            .iter()
            .map(|modal| (modal.id.clone(), self.tree.to_value(modal.content)))
            .collect();
        serde_json::json!({
            "root": self.tree.to_value(self.root),
            "modals": modals,
        })
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Turns raw metadata into a [`Document`].
pub struct Normalizer<'c> {
    config: &'c EngineConfig,
}

/// One raw node split into its parts.
struct Parts<'a> {
    tag: Option<&'a str>,
    attributes: Object,
    children: Vec<(&'a str, &'a Object)>,
}

impl<'c> Normalizer<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    /// Parse JSON text and normalize it.
    pub fn normalize_str(&self, input: &str) -> Result<Document, MetadataError> {
        let raw: Value = serde_json::from_str(input)?;
        self.normalize(&raw)
    }

    /// Normalize one raw document.
    ///
    /// A root carrying the configured return key is unwrapped first.
    pub fn normalize(&self, raw: &Value) -> Result<Document, MetadataError> {
        let Value::Object(outer) = raw else {
            return Err(MetadataError::NotAnObject(kind(raw)));
        };
        check_depth(raw, self.config.max_depth)?;

        let body = match outer.get(&self.config.settings.return_key) {
            Some(Value::Object(inner)) => inner,
            Some(other) => return Err(MetadataError::NotAnObject(kind(other))),
            None => outer,
        };

        let mut tree = WidgetTree::new();
        let root = self.build(&mut tree, None, ROOT_KEY, body);

        let mut entries = Vec::new();
        collect_modals(body, &mut entries);
        let modals: Vec<ModalDefinition> = entries
            .into_iter()
            .map(|(id, entry)| self.build_modal(&mut tree, id, entry))
            .collect();

        debug!(nodes = tree.len(), modals = modals.len(), "normalized metadata");
        Ok(Document { tree, root, modals })
    }

    fn build(&self, tree: &mut WidgetTree, parent: Option<NodeId>, key: &str, raw: &Object) -> NodeId {
        let parts = split(raw);
        let mut data = NodeData::new(key, parts.tag).with_attributes(parts.attributes);
        self.apply_defaults(&mut data);

        let id = match parent {
            Some(parent) => tree.insert_child(parent, data),
            None => tree.insert(data),
        };
        for (child_key, child) in parts.children {
            self.build(tree, Some(id), child_key, child);
        }
        id
    }

    fn build_modal(&self, tree: &mut WidgetTree, id: &str, entry: &Object) -> ModalDefinition {
        let content_raw = either(entry, "meta")
            .and_then(Value::as_object)
            .unwrap_or(entry);
        let content = self.build(tree, None, id, content_raw);
        ModalDefinition {
            id: id.to_owned(),
            title: either(entry, "title")
                .and_then(Value::as_str)
                .map(str::to_owned),
            width: either(entry, "width").and_then(parse_number),
            height: either(entry, "height").and_then(parse_number),
            content,
        }
    }

    /// Fill attribute gaps from the defaults registered for the raw tag, then
    /// for the resolved type.
    fn apply_defaults(&self, data: &mut NodeData) {
        let raw_tag = data.tag();
        let canonical = data.widget_type().as_str();
        let tags = std::iter::once(raw_tag.as_str()).chain((raw_tag != canonical).then_some(canonical));
        for tag in tags {
            if let Some(defaults) = self.config.widget_defaults(tag) {
                for (name, value) in defaults {
                    data.attributes.insert_default(name, value.clone());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Dialects
// ---------------------------------------------------------------------------

fn split(raw: &Object) -> Parts<'_> {
    let namespaced = TYPE_MARKERS
        .iter()
        .chain(META_MARKERS.iter())
        .any(|marker| raw.contains_key(*marker));
    if namespaced {
        let tag = TYPE_MARKERS
            .iter()
            .find_map(|marker| raw.get(*marker))
            .and_then(Value::as_str);
        let mut attributes = META_MARKERS
            .iter()
            .find_map(|marker| raw.get(*marker))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        // Scalars and arrays beside the type marker are attributes; the meta
        // object wins on conflict.
        for (key, value) in raw {
            if !is_reserved(key) && !value.is_object() && !attributes.contains_key(key) {
                attributes.insert(key.clone(), value.clone());
            }
        }
        let children = raw
            .iter()
            .filter(|(key, _)| !is_reserved(key))
            .filter_map(|(key, value)| Some((key.as_str(), value.as_object()?)))
            .collect();
        return Parts { tag, attributes, children };
    }

    let inline = INLINE_MARKERS
        .iter()
        .find_map(|marker| Some((*marker, raw.get(*marker)?.as_str()?)));
    if let Some((marker, tag)) = inline {
        let attributes = raw
            .iter()
            .filter(|(key, _)| {
                key.as_str() != marker
                    && !CHILD_CONTAINERS.contains(&key.as_str())
                    && !MODAL_MARKERS.contains(&key.as_str())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let children = CHILD_CONTAINERS
            .iter()
            .find_map(|container| raw.get(*container)?.as_object())
            .map(|container| {
                container
                    .iter()
                    .filter_map(|(key, value)| Some((key.as_str(), value.as_object()?)))
                    .collect()
            })
            .unwrap_or_default();
        return Parts { tag: Some(tag), attributes, children };
    }

    let mut attributes = Object::new();
    let mut children = Vec::new();
    for (key, value) in raw {
        if MODAL_MARKERS.contains(&key.as_str()) {
            continue;
        }
        match value {
            Value::Object(child) if !is_reserved(key) && is_widget(child) => {
                children.push((key.as_str(), child))
            }
            other => {
                attributes.insert(key.clone(), other.clone());
            }
        }
    }
    Parts { tag: None, attributes, children }
}

/// Keys that never name a child in the namespaced dialect.
fn is_reserved(key: &str) -> bool {
    key.starts_with("pm::")
        || key.starts_with('@')
        || matches!(key, "Type" | "Meta" | "Modals" | "Childs")
}

/// Whether an object found in a markerless node describes a widget: it
/// carries a dialect marker, or a widget is nested somewhere below it.
/// Plain maps such as `style` stay attributes.
fn is_widget(map: &Object) -> bool {
    let marked = TYPE_MARKERS
        .iter()
        .chain(META_MARKERS.iter())
        .any(|marker| map.contains_key(*marker))
        || INLINE_MARKERS
            .iter()
            .any(|marker| map.get(*marker).is_some_and(Value::is_string));
    marked
        || map
            .iter()
            .filter(|(key, _)| !MODAL_MARKERS.contains(&key.as_str()))
            .any(|(_, value)| value.as_object().is_some_and(is_widget))
}

/// `name` or `pm::name`.
fn either<'a>(map: &'a Object, name: &str) -> Option<&'a Value> {
    map.get(name).or_else(|| map.get(&format!("pm::{name}")))
}

// ---------------------------------------------------------------------------
// Walks
// ---------------------------------------------------------------------------

pub(crate) fn check_depth(root: &Value, limit: usize) -> Result<(), MetadataError> {
    let mut stack = vec![(root, 1usize)];
    while let Some((value, depth)) = stack.pop() {
        if depth > limit {
            return Err(MetadataError::TooDeep { limit });
        }
        let nested = match value {
            Value::Object(map) => map.values().collect::<Vec<_>>(),
            Value::Array(items) => items.iter().collect(),
            _ => continue,
        };
        stack.extend(
            nested
                .into_iter()
                .filter(|v| v.is_object() || v.is_array())
                .map(|v| (v, depth + 1)),
        );
    }
    Ok(())
}

/// Pre-order walk over every object and array, merging modal markers.
fn collect_modals<'a>(map: &'a Object, out: &mut Vec<(&'a str, &'a Object)>) {
    if let Some(Value::Object(modals)) = MODAL_MARKERS.iter().find_map(|marker| map.get(*marker)) {
        for (id, entry) in modals {
            let Some(entry) = entry.as_object() else {
                debug!(id = %id, "skipping non-object modal entry");
                continue;
            };
            match out.iter_mut().find(|(existing, _)| *existing == id.as_str()) {
                Some(slot) => slot.1 = entry,
                None => out.push((id.as_str(), entry)),
            }
        }
    }
    for value in map.values() {
        collect_modals_in(value, out);
    }
}

fn collect_modals_in<'a>(value: &'a Value, out: &mut Vec<(&'a str, &'a Object)>) {
    match value {
        Value::Object(map) => collect_modals(map, out),
        Value::Array(items) => {
            for item in items {
                collect_modals_in(item, out);
            }
        }
        _ => {}
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::node::WidgetType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn normalize(raw: Value) -> Document {
        let config = EngineConfig::new();
        Normalizer::new(&config).normalize(&raw).unwrap()
    }

    fn keys(doc: &Document, id: NodeId) -> Vec<String> {
        doc.tree
            .children(id)
            .iter()
            .map(|&c| doc.tree.get(c).unwrap().key.clone())
            .collect()
    }

    fn node<'a>(doc: &'a Document, path: &str) -> &'a NodeData {
        let id = doc.tree.find_by_path(doc.root, path).unwrap();
        doc.tree.get(id).unwrap()
    }

    // ── Dialects ─────────────────────────────────────────────────────

    #[test]
    fn namespaced_dialect() {
        let doc = normalize(json!({
            "pm::Type": "form",
            "pm::Meta": {"label": "Signup", "padding": "20px"},
            "pm::className": "ignored",
            "Childs": {"type": "label"},
            "name": {"pm::Type": "string", "pm::Meta": {"name": "name"}},
            "submit": {"@type": "button", "@meta": {"title": "Go"}},
            "note": "not a widget",
        }));
        let root = doc.tree.get(doc.root).unwrap();
        assert_eq!(root.widget_type(), WidgetType::Form);
        assert_eq!(root.attributes.get_str("label"), Some("Signup"));
        assert!(!root.attributes.contains("className"));
        assert_eq!(keys(&doc, doc.root), vec!["name", "submit"]);
        assert_eq!(node(&doc, "name").widget_type(), WidgetType::Input);
        assert_eq!(node(&doc, "submit").attributes.get_str("title"), Some("Go"));
    }

    #[test]
    fn inline_dialect() {
        let doc = normalize(json!({
            "pm::Type": "container",
            "title": {"pm::type": "header", "label": "Hi", "element": "h1"},
            "email": {"pm::type": "email", "name": "email", "type": "kept"},
        }));
        let title = node(&doc, "title");
        assert_eq!(title.widget_type(), WidgetType::Label);
        assert_eq!(title.attributes.get_str("element"), Some("h1"));
        assert!(!title.attributes.as_map().contains_key("pm::type"));
        let email = node(&doc, "email");
        assert_eq!(email.source_tag.as_deref(), Some("email"));
        assert_eq!(email.attributes.get_str("type"), Some("kept"));
    }

    #[test]
    fn legacy_dialect() {
        let doc = normalize(json!({
            "type": "form",
            "action": "/save",
            "childs": {
                "first": {"type": "input", "name": "first"},
                "skip": 5,
                "grid": {"type": "GRID_AGURA", "children": {"col": {"type": "text"}}},
            },
        }));
        let root = doc.tree.get(doc.root).unwrap();
        assert_eq!(root.widget_type(), WidgetType::Form);
        assert_eq!(root.attributes.get_str("action"), Some("/save"));
        assert!(!root.attributes.contains("childs"));
        assert!(!root.attributes.contains("type"));
        assert_eq!(keys(&doc, doc.root), vec!["first", "grid"]);
        assert_eq!(node(&doc, "grid").widget_type(), WidgetType::Grid);
        assert_eq!(keys(&doc, doc.tree.find_by_path(doc.root, "grid").unwrap()), vec!["col"]);
    }

    #[test]
    fn markerless_root_is_container() {
        let doc = normalize(json!({
            "title": "page",
            "main": {"pm::Type": "container", "pm::Meta": {}},
        }));
        let root = doc.tree.get(doc.root).unwrap();
        assert_eq!(root.widget_type(), WidgetType::Container);
        assert_eq!(root.key, ROOT_KEY);
        assert_eq!(root.attributes.get_str("title"), Some("page"));
        assert_eq!(keys(&doc, doc.root), vec!["main"]);
    }

    #[test]
    fn namespaced_scalars_become_attributes() {
        let doc = normalize(json!({
            "pm::Type": "button",
            "pm::Meta": {"title": "Open"},
            "onclick": [{"action": "openModal", "modalId": "m1"}],
            "title": "shadowed",
            "disabled": false,
        }));
        let root = doc.tree.get(doc.root).unwrap();
        assert_eq!(root.widget_type(), WidgetType::Button);
        assert_eq!(root.attributes.get_str("title"), Some("Open"));
        assert_eq!(
            root.attributes.get("onclick"),
            Some(&json!([{"action": "openModal", "modalId": "m1"}]))
        );
        assert_eq!(root.attributes.get("disabled"), Some(&json!(false)));
        assert!(keys(&doc, doc.root).is_empty());
    }

    #[test]
    fn markerless_plain_objects_stay_attributes() {
        let doc = normalize(json!({
            "style": {"color": "red", "font": {"size": 12}},
            "section": {"inner": {"pm::type": "label", "label": "Hi"}},
            "main": {"@type": "container"},
        }));
        let root = doc.tree.get(doc.root).unwrap();
        assert_eq!(
            root.attributes.get("style"),
            Some(&json!({"color": "red", "font": {"size": 12}}))
        );
        assert_eq!(keys(&doc, doc.root), vec!["section", "main"]);
        assert_eq!(node(&doc, "section.inner").widget_type(), WidgetType::Label);
    }

    #[test]
    fn unknown_type_falls_back_to_container() {
        let doc = normalize(json!({"pm::Type": "Sparkline"}));
        let root = doc.tree.get(doc.root).unwrap();
        assert_eq!(root.widget_type(), WidgetType::Container);
        assert_eq!(root.source_tag.as_deref(), Some("Sparkline"));
    }

    #[test]
    fn return_wrapper_is_unwrapped() {
        let doc = normalize(json!({
            "success": true,
            "return": {"pm::Type": "form", "pm::Meta": {}},
        }));
        assert_eq!(doc.tree.get(doc.root).unwrap().widget_type(), WidgetType::Form);
    }

    // ── Defaults ─────────────────────────────────────────────────────

    #[test]
    fn defaults_fill_gaps_only() {
        let doc = normalize(json!({
            "pm::Type": "form",
            "price": {"pm::type": "currency"},
            "secret": {"pm::type": "password", "inputType": "text"},
        }));
        let price = node(&doc, "price");
        assert_eq!(price.attributes.get_str("inputType"), Some("number"));
        assert_eq!(price.attributes.get_str("format"), Some("currency"));
        assert_eq!(node(&doc, "secret").attributes.get_str("inputType"), Some("text"));
    }

    #[test]
    fn defaults_for_resolved_type() {
        let mut config = EngineConfig::new();
        config = config.with_widget_defaults(
            "input",
            json!({"placeholder": "…"}).as_object().unwrap().clone(),
        );
        let doc = Normalizer::new(&config)
            .normalize(&json!({"type": "phone"}))
            .unwrap();
        let root = doc.tree.get(doc.root).unwrap();
        assert_eq!(root.attributes.get_str("placeholder"), Some("…"));
    }

    // ── Modals ───────────────────────────────────────────────────────

    #[test]
    fn modal_extraction_is_depth_independent() {
        let shallow = normalize(json!({
            "pm::Modals": {"x": {"pm::title": "X", "pm::meta": {"pm::Type": "form"}}},
        }));
        let deep = normalize(json!({
            "a": {"b": {"c": {
                "pm::Modals": {"x": {"pm::title": "X", "pm::meta": {"pm::Type": "form"}}},
            }}},
        }));
        assert_eq!(shallow.modals.len(), 1);
        assert_eq!(deep.modals.len(), 1);
        assert_eq!(shallow.to_value()["modals"], deep.to_value()["modals"]);
    }

    #[test]
    fn later_modal_declaration_wins() {
        let doc = normalize(json!({
            "pm::Modals": {"x": {"title": "outer"}, "y": {"title": "Y"}},
            "inner": {"pm::Type": "container", "Modals": {"x": {"title": "inner"}}},
        }));
        let ids: Vec<&str> = doc.modals.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
        assert_eq!(doc.modal("x").unwrap().title.as_deref(), Some("inner"));
    }

    #[test]
    fn modal_fields_and_content() {
        let doc = normalize(json!({
            "pm::Type": "container",
            "pm::Modals": {
                "edit": {
                    "pm::title": "Edit",
                    "pm::width": 500,
                    "pm::height": "400px",
                    "pm::meta": {"pm::Type": "form", "field": {"pm::type": "input"}},
                },
                "bare": {"pm::Type": "label", "pm::Meta": {"label": "Bare"}},
            },
        }));
        let edit = doc.modal("edit").unwrap();
        assert_eq!(edit.title.as_deref(), Some("Edit"));
        assert_eq!(edit.width, Some(500.0));
        assert_eq!(edit.height, Some(400.0));
        let content = doc.tree.get(edit.content).unwrap();
        assert_eq!(content.widget_type(), WidgetType::Form);
        assert_eq!(content.key, "edit");
        assert_eq!(doc.tree.parent(edit.content), None);
        assert_eq!(doc.tree.children(edit.content).len(), 1);

        let bare = doc.modal("bare").unwrap();
        assert_eq!(doc.tree.get(bare.content).unwrap().widget_type(), WidgetType::Label);

        // Modals are not children of the declaring node.
        assert!(doc.tree.children(doc.root).is_empty());
    }

    #[test]
    fn modals_nested_inside_modal_content() {
        let doc = normalize(json!({
            "pm::Modals": {
                "outer": {"meta": {"type": "form", "Modals": {"inner": {"title": "In"}}}},
            },
        }));
        assert!(doc.modal("outer").is_some());
        assert!(doc.modal("inner").is_some());
    }

    // ── Errors & determinism ────────────────────────────────────────

    #[test]
    fn rejects_non_object_root() {
        let config = EngineConfig::new();
        let normalizer = Normalizer::new(&config);
        assert!(matches!(
            normalizer.normalize(&json!([1, 2])),
            Err(MetadataError::NotAnObject("an array"))
        ));
        assert!(matches!(
            normalizer.normalize(&json!({"return": "nope"})),
            Err(MetadataError::NotAnObject("a string"))
        ));
        assert!(matches!(
            normalizer.normalize_str("{not json"),
            Err(MetadataError::Json(_))
        ));
    }

    #[test]
    fn rejects_runaway_nesting() {
        let config = EngineConfig::new().with_max_depth(8);
        let mut raw = json!({"leaf": true});
        for _ in 0..10 {
            raw = json!({"pm::Type": "container", "child": raw});
        }
        let err = Normalizer::new(&config).normalize(&raw).unwrap_err();
        assert!(matches!(err, MetadataError::TooDeep { limit: 8 }));
        assert_eq!(err.to_string(), "malformed metadata: nesting exceeds 8 levels");
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let raw = json!({
            "pm::Type": "container",
            "pm::Modals": {"m": {"pm::meta": {"pm::Type": "form"}}},
            "b": {"pm::type": "button", "onclick": [{"action": "openModal", "modalId": "m"}]},
            "a": {"type": "label", "label": "{x}"},
        });
        let first = normalize(raw.clone());
        let second = normalize(raw);
        assert_eq!(first.to_value(), second.to_value());
        assert_eq!(keys(&first, first.root), vec!["b", "a"]);
    }
}
