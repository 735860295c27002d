//! RecordingNavigator: a [`Navigator`] that remembers where it was sent.

use std::cell::RefCell;

use crate::net::Navigator;

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    destinations: RefCell<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every destination, oldest first.
    pub fn destinations(&self) -> Vec<String> {
        self.destinations.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.destinations.borrow().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: &str) {
        self.destinations.borrow_mut().push(destination.to_owned());
    }
}
