//! The two-scope data store.

use serde_json::{Map, Value};
use tracing::{trace, warn};

use super::change::{ChangeEvent, Scope, Subscriber, Subscription};
use crate::expr::Context;
use crate::path;

/// Global-scope and form-scope data, each a JSON mapping addressed by dotted
/// path.
///
/// Every committed write produces a [`ChangeEvent`] for the exact path
/// written, returned to the caller and delivered to every subscription whose
/// prefix overlaps it. The two scopes are never merged implicitly.
#[derive(Debug)]
pub struct DataStore {
    global: Value,
    form: Value,
    subscribers: Vec<Subscriber>,
}

impl DataStore {
    /// Create a store with both scopes empty.
    pub fn new() -> Self {
        Self {
            global: Value::Object(Map::new()),
            form: Value::Object(Map::new()),
            subscribers: Vec::new(),
        }
    }

    /// Seed global-scope data (builder). Non-objects are ignored.
    pub fn with_global(mut self, data: Value) -> Self {
        if data.is_object() {
            self.global = data;
        }
        self
    }

    /// Seed form-scope data (builder). Non-objects are ignored.
    pub fn with_form(mut self, data: Value) -> Self {
        if data.is_object() {
            self.form = data;
        }
        self
    }

    fn root(&self, scope: Scope) -> &Value {
        match scope {
            Scope::Global => &self.global,
            Scope::Form => &self.form,
        }
    }

    fn root_mut(&mut self, scope: Scope) -> &mut Value {
        match scope {
            Scope::Global => &mut self.global,
            Scope::Form => &mut self.form,
        }
    }

    /// Read `path` in `scope`. `None` is undefined.
    pub fn get(&self, scope: Scope, path: &str) -> Option<&Value> {
        path::get(self.root(scope), path)
    }

    pub fn is_defined(&self, scope: Scope, path: &str) -> bool {
        self.get(scope, path).is_some()
    }

    /// The whole mapping of `scope`.
    pub fn data(&self, scope: Scope) -> &Value {
        self.root(scope)
    }

    /// An owned copy of `scope`'s mapping.
    pub fn snapshot(&self, scope: Scope) -> Map<String, Value> {
        self.root(scope).as_object().cloned().unwrap_or_default()
    }

    /// Write `value` at `path` in `scope`.
    ///
    /// An empty path replaces the whole scope and only accepts objects;
    /// anything else is rejected and `None` returned.
    pub fn set(&mut self, scope: Scope, path: &str, value: Value) -> Option<ChangeEvent> {
        if path.is_empty() && !value.is_object() {
            warn!(%scope, "refusing to replace scope root with a non-object");
            return None;
        }
        trace!(%scope, path, "store write");
        path::set(self.root_mut(scope), path, value.clone());
        let event = ChangeEvent {
            scope,
            path: path.to_owned(),
            value,
        };
        self.notify(&event);
        Some(event)
    }

    /// Shallow-merge `source` into the root of `scope`, one write per key.
    pub fn merge(&mut self, scope: Scope, source: Map<String, Value>) -> Vec<ChangeEvent> {
        source
            .into_iter()
            .filter(|(key, _)| !key.is_empty())
            .filter_map(|(key, value)| self.set(scope, &key, value))
            .collect()
    }

    /// Reset `scope` to an empty mapping.
    pub fn clear(&mut self, scope: Scope) -> Option<ChangeEvent> {
        self.set(scope, "", Value::Object(Map::new()))
    }

    /// Interpolation context: form scope first, then global.
    pub fn context(&self) -> Context<'_> {
        Context::scoped(&self.form, &self.global)
    }

    /// Subscribe to writes in `scope` that overlap `prefix` (`""` for all).
    pub fn subscribe(&mut self, scope: Scope, prefix: &str) -> Subscription {
        let (subscriber, subscription) = Subscriber::channel(scope, prefix);
        self.subscribers.push(subscriber);
        subscription
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn notify(&mut self, event: &ChangeEvent) {
        self.subscribers.retain(|subscriber| subscriber.notify(event));
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::interpolate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn scopes_are_independent() {
        let mut store = DataStore::new();
        store.set(Scope::Global, "name", json!("global"));
        store.set(Scope::Form, "name", json!("form"));
        assert_eq!(store.get(Scope::Global, "name"), Some(&json!("global")));
        assert_eq!(store.get(Scope::Form, "name"), Some(&json!("form")));
        assert!(!store.is_defined(Scope::Form, "other"));
    }

    #[test]
    fn set_returns_event_for_exact_path() {
        let mut store = DataStore::new();
        let event = store.set(Scope::Form, "user.address.city", json!("Oslo")).unwrap();
        assert_eq!(event.path, "user.address.city");
        assert_eq!(event.scope, Scope::Form);
        assert_eq!(
            store.data(Scope::Form),
            &json!({"user": {"address": {"city": "Oslo"}}})
        );
    }

    #[test]
    fn root_replacement_requires_object() {
        let mut store = DataStore::new().with_global(json!({"a": 1}));
        assert!(store.set(Scope::Global, "", json!(5)).is_none());
        assert_eq!(store.data(Scope::Global), &json!({"a": 1}));
        assert!(store.clear(Scope::Global).is_some());
        assert_eq!(store.data(Scope::Global), &json!({}));
    }

    #[test]
    fn merge_is_shallow_and_emits_per_key() {
        let mut store = DataStore::new().with_global(json!({"user": {"a": 1}, "keep": true}));
        let source = json!({"user": {"b": 2}, "id": 7});
        let events = store.merge(Scope::Global, source.as_object().unwrap().clone());
        assert_eq!(events.len(), 2);
        assert_eq!(
            store.data(Scope::Global),
            &json!({"user": {"b": 2}, "keep": true, "id": 7})
        );
    }

    #[test]
    fn subscriptions_match_prefixes() {
        let mut store = DataStore::new();
        let mut user = store.subscribe(Scope::Global, "user");
        let mut all_form = store.subscribe(Scope::Form, "");

        store.set(Scope::Global, "user.name", json!("Ann"));
        store.set(Scope::Global, "username", json!("ann"));
        store.set(Scope::Global, "", json!({"user": {}}));
        store.set(Scope::Form, "x", json!(1));

        let paths: Vec<String> = user.drain().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["user.name".to_owned(), String::new()]);
        assert_eq!(all_form.drain().len(), 1);
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let mut store = DataStore::new();
        let sub = store.subscribe(Scope::Global, "a");
        assert_eq!(store.subscriber_count(), 1);
        drop(sub);
        store.set(Scope::Global, "b", json!(1));
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn context_prefers_form_scope() {
        let mut store = DataStore::new();
        store.set(Scope::Global, "name", json!("Global"));
        assert_eq!(interpolate("Hi {name}", &store.context()), "Hi Global");
        store.set(Scope::Form, "name", json!("Ann"));
        assert_eq!(interpolate("Hi {name}", &store.context()), "Hi Ann");
    }

    #[tokio::test]
    async fn subscription_recv_awaits() {
        let mut store = DataStore::new();
        let mut sub = store.subscribe(Scope::Form, "email");
        store.set(Scope::Form, "email", json!("a@b.com"));
        let event = sub.recv().await.unwrap();
        assert_eq!(event.value, json!("a@b.com"));
    }
}
