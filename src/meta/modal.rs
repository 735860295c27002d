//! Modal definitions and the active-modal set.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::node::NodeId;

/// A modal extracted from anywhere in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalDefinition {
    pub id: String,
    pub title: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Root of the modal's content subtree in the document's tree.
    pub content: NodeId,
}

/// Registered modals plus the ids currently shown, in opening order.
///
/// The last element of [`active`](Self::active) is the topmost modal.
#[derive(Debug, Clone, Default)]
pub struct ModalRegistry {
    definitions: HashMap<String, ModalDefinition>,
    active: Vec<String>,
}

impl ModalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of definitions. A later id overwrites an earlier one.
    pub fn register(&mut self, definitions: impl IntoIterator<Item = ModalDefinition>) {
        for definition in definitions {
            trace!(id = %definition.id, "registering modal");
            self.definitions.insert(definition.id.clone(), definition);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ModalDefinition> {
        self.definitions.get(id)
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Show `id`. No-op unless it is registered and not already shown.
    ///
    /// Returns whether the active set changed.
    pub fn open(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            debug!(id, "open ignored: modal not registered");
            return false;
        }
        if self.is_active(id) {
            return false;
        }
        self.active.push(id.to_owned());
        true
    }

    /// Hide `id`. No error if it is not shown.
    ///
    /// Returns whether the active set changed.
    pub fn close(&mut self, id: &str) -> bool {
        let before = self.active.len();
        self.active.retain(|active| active != id);
        before != self.active.len()
    }

    /// Hide the most recently opened modal, returning its id.
    pub fn close_topmost(&mut self) -> Option<String> {
        self.active.pop()
    }

    /// Ids currently shown, oldest first.
    pub fn active(&self) -> &[String] {
        &self.active
    }

    pub fn topmost(&self) -> Option<&str> {
        self.active.last().map(String::as_str)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.iter().any(|active| active == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn definitions(ids: &[&str]) -> Vec<ModalDefinition> {
        let mut arena: SlotMap<NodeId, ()> = SlotMap::with_key();
        ids.iter()
            .map(|id| ModalDefinition {
                id: (*id).to_owned(),
                title: None,
                width: None,
                height: None,
                content: arena.insert(()),
            })
            .collect()
    }

    fn registry(ids: &[&str]) -> ModalRegistry {
        let mut registry = ModalRegistry::new();
        registry.register(definitions(ids));
        registry
    }

    #[test]
    fn open_requires_registration() {
        let mut modals = registry(&["m1"]);
        assert!(!modals.open("nope"));
        assert!(modals.active().is_empty());
        assert!(modals.open("m1"));
        assert_eq!(modals.active(), &["m1".to_owned()]);
    }

    #[test]
    fn open_and_close_are_idempotent() {
        let mut modals = registry(&["m1"]);
        modals.open("m1");
        assert!(!modals.open("m1"));
        assert_eq!(modals.active().len(), 1);
        assert!(modals.close("m1"));
        assert!(!modals.close("m1"));
        assert!(!modals.close("never"));
        assert!(modals.active().is_empty());
    }

    #[test]
    fn close_topmost_removes_exactly_one() {
        let mut modals = registry(&["a", "b", "c"]);
        modals.open("a");
        modals.open("c");
        modals.open("b");
        assert_eq!(modals.topmost(), Some("b"));
        assert_eq!(modals.close_topmost().as_deref(), Some("b"));
        assert_eq!(modals.active(), &["a".to_owned(), "c".to_owned()]);
        assert_eq!(modals.close_topmost().as_deref(), Some("c"));
        assert_eq!(modals.close_topmost().as_deref(), Some("a"));
        assert_eq!(modals.close_topmost(), None);
    }

    #[test]
    fn register_last_write_wins() {
        let mut modals = ModalRegistry::new();
        let mut first = definitions(&["x"]);
        first[0].title = Some("first".into());
        let mut second = definitions(&["x"]);
        second[0].title = Some("second".into());
        modals.register(first);
        modals.register(second);
        assert_eq!(modals.len(), 1);
        assert_eq!(modals.get("x").unwrap().title.as_deref(), Some("second"));
    }
}
