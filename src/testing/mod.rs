//! Headless testing framework: scripted collaborators, Pilot, snapshot helpers.
//!
//! [`ScriptedNetwork`] and [`RecordingNavigator`] stand in for the embedding
//! application's transport and router. The [`Pilot`] drives a
//! [`Page`](crate::page::Page) wired to both, addressing widgets by key path.
//! Use [`render_to_string`] to capture a page as an outline for snapshot-style
//! assertions.

pub mod navigator;
pub mod network;
pub mod pilot;
pub mod snapshot;

pub use navigator::RecordingNavigator;
pub use network::{Method, Request, ScriptedNetwork};
pub use pilot::Pilot;
pub use snapshot::{render_modal, render_to_string};
