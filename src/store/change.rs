//! Change events and path-prefix subscriptions.

use std::fmt;

use serde_json::Value;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Which of the two data mappings a read or write addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Document-wide data.
    Global,
    /// Data local to form widgets.
    Form,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Form => "form",
        }
    }

    /// Parse a `scope` attribute value.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "global" => Some(Self::Global),
            "form" => Some(Self::Form),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One committed write: the exact path and the value now stored there.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub scope: Scope,
    pub path: String,
    pub value: Value,
}

/// Receives the change events matching one `(scope, prefix)` subscription.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: UnboundedReceiver<ChangeEvent>,
}

impl Subscription {
    /// Next queued event, if any, without waiting.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next event. `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

#[derive(Debug)]
pub(crate) struct Subscriber {
    scope: Scope,
    prefix: String,
    tx: UnboundedSender<ChangeEvent>,
}

impl Subscriber {
    pub(crate) fn channel(scope: Scope, prefix: &str) -> (Self, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber = Self {
            scope,
            prefix: prefix.to_owned(),
            tx,
        };
        (subscriber, Subscription { rx })
    }

    /// Deliver `event` if it concerns this subscriber.
    ///
    /// Returns `false` once the receiving side has been dropped.
    pub(crate) fn notify(&self, event: &ChangeEvent) -> bool {
        if event.scope == self.scope && overlaps(&self.prefix, &event.path) {
            self.tx.send(event.clone()).is_ok()
        } else {
            !self.tx.is_closed()
        }
    }
}

/// Whether a write at `path` can change anything under `prefix`: one path
/// must be a segment-aligned prefix of the other.
pub(crate) fn overlaps(prefix: &str, path: &str) -> bool {
    fn under(inner: &str, outer: &str) -> bool {
        outer.is_empty()
            || inner == outer
            || inner
                .strip_prefix(outer)
                .is_some_and(|rest| rest.starts_with('.'))
    }
    under(path, prefix) || under(prefix, path)
}
