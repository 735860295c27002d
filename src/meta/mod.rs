//! Metadata: the widget tree arena, the dialect-aware normalizer, modal
//! definitions, and document loading.

pub mod loader;
pub mod modal;
pub mod node;
pub mod normalize;
pub mod tree;

pub use loader::{LoadError, MetadataLoader};
pub use modal::{ModalDefinition, ModalRegistry};
pub use node::{Attributes, NodeData, NodeId, WidgetType};
pub use normalize::{Document, MetadataError, Normalizer};
pub use tree::WidgetTree;
