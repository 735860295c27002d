//! Rendering boundary: the [`Renderer`] trait and a plain-text outline
//! renderer.
//!
//! A renderer receives a [`Frame`] (the normalized tree plus the data and
//! widget state it should show) and presents it however it likes. User events
//! flow back through [`Page`](crate::page::Page), never through the renderer.

pub mod outline;

pub use outline::{render_outline, OutlineRenderer};

use crate::meta::{ModalDefinition, NodeId, WidgetTree};
use crate::store::DataStore;
use crate::widgets::WidgetState;

/// Everything a renderer needs for one pass.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub tree: &'a WidgetTree,
    pub root: NodeId,
    pub store: &'a DataStore,
    pub widgets: &'a WidgetState,
    /// Active modals, bottom first.
    pub modals: &'a [&'a ModalDefinition],
}

/// A presentation backend.
pub trait Renderer {
    /// Present a fully loaded page.
    fn render(&mut self, frame: &Frame<'_>);

    /// Present the single document-level error state.
    fn render_error(&mut self, message: &str);

    /// Present a page whose document is still loading.
    fn render_loading(&mut self) {}
}
