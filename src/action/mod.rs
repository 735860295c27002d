//! Actions: descriptors, the dispatcher, and the broadcast bus.

pub mod broadcast;
pub mod descriptor;
pub mod dispatcher;

pub use broadcast::{BroadcastBus, BroadcastMessage};
pub use descriptor::{ActionDescriptor, FetchSpec, SubmitSpec, Verb};
pub use dispatcher::{ActionDispatcher, ChainEnd, DispatchContext, Outcome};
