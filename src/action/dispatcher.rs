//! Action dispatcher: a small interpreter over action lists.
//!
//! A list runs strictly in order; each action is awaited to completion,
//! including its continuation chain, before the next sibling starts. The
//! interpreter keeps an explicit work stack instead of recursing: when an
//! action finishes, its `onSuccess` or `onError` list is pushed on top of the
//! remaining siblings.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

use super::broadcast::{BroadcastBus, BroadcastMessage};
use super::descriptor::{ActionDescriptor, FetchSpec, SubmitSpec, Verb};
use crate::expr::interpolate;
use crate::meta::ModalRegistry;
use crate::net::{Envelope, Navigator, Network, NetworkError};
use crate::path;
use crate::store::{Scope, SharedStore};

/// Result of executing one action.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Run the `onSuccess` continuation.
    Succeeded,
    /// Run the `onError` continuation.
    Failed(String),
    /// Nothing happened; no continuation runs.
    Skipped,
    /// Stop the whole chain, remaining siblings included.
    Halted,
}

/// How a dispatched list ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEnd {
    Completed,
    /// A navigation ended the chain early.
    Halted,
}

/// Per-dispatch information supplied by the triggering widget.
#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    /// Endpoint for a `submit` that names none (a form's `action`).
    pub fallback_endpoint: Option<String>,
}

impl DispatchContext {
    pub fn with_fallback_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            fallback_endpoint: Some(endpoint.into()),
        }
    }
}

/// Executes action lists against the store, the modal registry, the
/// broadcast bus, and the external collaborators.
#[derive(Clone)]
pub struct ActionDispatcher {
    store: SharedStore,
    modals: Rc<RefCell<ModalRegistry>>,
    bus: BroadcastBus,
    network: Rc<dyn Network>,
    navigator: Rc<dyn Navigator>,
}

impl ActionDispatcher {
    pub fn new(
        store: SharedStore,
        modals: Rc<RefCell<ModalRegistry>>,
        bus: BroadcastBus,
        network: Rc<dyn Network>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            modals,
            bus,
            network,
            navigator,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn modals(&self) -> &Rc<RefCell<ModalRegistry>> {
        &self.modals
    }

    pub fn bus(&self) -> &BroadcastBus {
        &self.bus
    }

    /// Parse a raw action list and run it.
    pub async fn dispatch_value(&self, raw: &Value, cx: &DispatchContext) -> ChainEnd {
        let actions = ActionDescriptor::parse_list(raw);
        self.dispatch(&actions, cx).await
    }

    /// Run `actions` in order, following continuations depth-first.
    pub async fn dispatch(&self, actions: &[ActionDescriptor], cx: &DispatchContext) -> ChainEnd {
        let mut pending: Vec<&ActionDescriptor> = actions.iter().rev().collect();
        while let Some(action) = pending.pop() {
            match self.execute(action, cx).await {
                Outcome::Succeeded => pending.extend(action.on_success.iter().rev()),
                Outcome::Failed(reason) => {
                    if action.on_error.is_empty() {
                        warn!(action = action.name(), %reason, "action failed");
                    } else {
                        debug!(action = action.name(), %reason, "action failed, running onError");
                    }
                    pending.extend(action.on_error.iter().rev());
                }
                Outcome::Skipped => {}
                Outcome::Halted => {
                    debug!(dropped = pending.len(), "chain halted");
                    return ChainEnd::Halted;
                }
            }
        }
        ChainEnd::Completed
    }

    /// Execute one action, without its continuations.
    pub async fn execute(&self, action: &ActionDescriptor, cx: &DispatchContext) -> Outcome {
        match &action.verb {
            Verb::OpenModal { modal_id } => match modal_id {
                Some(id) => {
                    self.modals.borrow_mut().open(id);
                    Outcome::Succeeded
                }
                None => missing(action, "modalId"),
            },
            Verb::CloseModal { modal_id } => match modal_id {
                Some(id) => {
                    self.modals.borrow_mut().close(id);
                    Outcome::Succeeded
                }
                None => missing(action, "modalId"),
            },
            Verb::Submit(spec) => self.submit(spec, cx).await,
            Verb::Fetch(spec) => self.fetch(spec).await,
            Verb::Broadcast {
                event,
                target,
                data,
            } => {
                self.bus
                    .publish(BroadcastMessage::new(event.clone(), target.clone(), data.clone()));
                Outcome::Succeeded
            }
            Verb::Navigate { url } => match url {
                Some(url) => {
                    debug!(url = %url, "navigating");
                    self.navigator.navigate(url);
                    Outcome::Halted
                }
                None => missing(action, "url"),
            },
            Verb::Unknown(name) => {
                warn!(verb = %name, "unknown action verb, ignoring");
                Outcome::Skipped
            }
        }
    }

    /// The body a `submit` would post: form-scope data plus the named
    /// global-scope paths.
    pub fn submission_payload(&self, spec: &SubmitSpec) -> Value {
        let store = self.store.borrow();
        let mut payload = Value::Object(store.snapshot(Scope::Form));
        for key in &spec.additional_post {
            if let Some(value) = store.get(Scope::Global, key) {
                path::set(&mut payload, key, value.clone());
            }
        }
        payload
    }

    async fn submit(&self, spec: &SubmitSpec, cx: &DispatchContext) -> Outcome {
        let Some(endpoint) = spec.url.as_deref().or(cx.fallback_endpoint.as_deref()) else {
            warn!("submit without url, skipping");
            return Outcome::Skipped;
        };
        let endpoint = self.expand(endpoint);
        let payload = self.submission_payload(spec);

        debug!(endpoint = %endpoint, "submit");
        match settle(self.network.post(&endpoint, &payload).await) {
            Ok(payload) => {
                if spec.update_global {
                    if let Value::Object(map) = payload {
                        self.store.borrow_mut().merge(Scope::Global, map);
                    }
                }
                Outcome::Succeeded
            }
            Err(reason) => Outcome::Failed(reason),
        }
    }

    async fn fetch(&self, spec: &FetchSpec) -> Outcome {
        let Some(endpoint) = spec.url.as_deref() else {
            warn!("get without url, skipping");
            return Outcome::Skipped;
        };
        let endpoint = self.expand(endpoint);

        debug!(endpoint = %endpoint, "fetch");
        match settle(self.network.get(&endpoint, &spec.params).await) {
            Ok(payload) => {
                {
                    let mut store = self.store.borrow_mut();
                    match (&spec.target, &payload) {
                        (Some(target), _) => {
                            store.set(Scope::Global, target, payload.clone());
                        }
                        (None, Value::Object(map)) => {
                            store.merge(Scope::Global, map.clone());
                        }
                        (None, _) => debug!(endpoint = %endpoint, "non-object payload without target, not stored"),
                    }
                }
                if let Some(channel) = &spec.broadcast {
                    self.bus
                        .publish(BroadcastMessage::new("update", Some(channel.clone()), payload));
                }
                Outcome::Succeeded
            }
            Err(reason) => Outcome::Failed(reason),
        }
    }

    /// Interpolate `{...}` spans in an endpoint against current data.
    fn expand(&self, endpoint: &str) -> String {
        interpolate(endpoint, &self.store.borrow().context())
    }
}

/// Collapse a transport error and an application failure into one shape.
pub(crate) fn settle(result: Result<Envelope, NetworkError>) -> Result<Value, String> {
    match result {
        Ok(envelope) if envelope.success => Ok(envelope.payload),
        Ok(envelope) => Err(envelope.error_message().to_owned()),
        Err(error) => Err(error.to_string()),
    }
}

fn missing(action: &ActionDescriptor, field: &str) -> Outcome {
    warn!(action = action.name(), field, "action is missing a required field, skipping");
    Outcome::Skipped
}

// ===========================================================================
// Tests
// ===========================================================================
