//! Broadcast bus: fire-and-forget messages between widgets.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// One published message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastMessage {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub data: Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl BroadcastMessage {
    /// Stamp a message with the current time.
    pub fn new(action: impl Into<String>, target: Option<String>, data: Value) -> Self {
        Self {
            action: action.into(),
            target,
            data,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Whether a subscriber listening on `target` should act on this
    /// message. Untargeted messages concern everyone.
    pub fn is_for(&self, target: &str) -> bool {
        self.target.as_deref().is_none_or(|t| t == target)
    }
}

/// Publish/subscribe with one unbounded queue per subscriber.
///
/// Delivery goes to the receivers subscribed at publish time; a late
/// subscriber never sees earlier messages. Nothing is dropped for a
/// subscriber that is slow to drain. Clones share one subscriber list.
#[derive(Debug, Clone, Default)]
pub struct BroadcastBus {
    subscribers: Rc<RefCell<Vec<UnboundedSender<BroadcastMessage>>>>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a receiver for every message published from now on.
    /// Dropping it unsubscribes.
    pub fn subscribe(&self) -> UnboundedReceiver<BroadcastMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    /// Publish `message`, returning how many receivers it reached.
    pub fn publish(&self, message: BroadcastMessage) -> usize {
        trace!(action = %message.action, target = ?message.target, "broadcast");
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|tx| tx.send(message.clone()).is_ok());
        subscribers.len()
    }

    pub fn receiver_count(&self) -> usize {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}
