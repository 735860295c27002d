//! Data store: global and form-scoped mappings with change notification.

pub mod change;
pub mod data;

pub use change::{ChangeEvent, Scope, Subscription};
pub use data::DataStore;

use std::cell::RefCell;
use std::rc::Rc;

/// A store shared between a page and its action chains.
///
/// Borrows are short-lived and never held across an `.await`.
pub type SharedStore = Rc<RefCell<DataStore>>;
