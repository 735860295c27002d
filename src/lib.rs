//! # pagemaker
//!
//! A metadata-driven UI interpreter. A declarative JSON document describes a
//! tree of widgets (containers, forms, inputs, buttons, grids, labels, modals);
//! pagemaker normalizes that document, keeps a two-scope data store in sync
//! with user input and server responses, and runs the declarative actions the
//! widgets carry.
//!
//! Visual presentation, HTTP transport, and navigation are collaborators the
//! embedding application supplies through the [`render::Renderer`],
//! [`net::Network`], and [`net::Navigator`] traits.
//!
//! ## Core Systems
//!
//! - **[`path`]** — Dotted-path get/set over nested JSON mappings
//! - **[`expr`]** — `{var}` interpolation and `{cond?'a':'b'}` ternaries
//! - **[`meta`]** — Dialect-aware normalizer, slotmap widget tree, modal registry, loader
//! - **[`store`]** — Global and form-scoped data with path-keyed change events
//! - **[`action`]** — Action descriptors, the dispatcher, and the broadcast bus
//! - **[`widgets`]** — Per-widget bind contracts: fields, validation, labels, grids, forms
//! - **[`page`]** — The session tying document, store, modals, and collaborators together
//! - **[`render`]** — Renderer trait and a plain-text outline renderer
//! - **[`testing`]** — Scripted network, recording navigator, and a Pilot for headless tests

// Foundation
pub mod config;
pub mod format;
pub mod path;
pub mod value;

// Core systems
pub mod expr;
pub mod meta;
pub mod store;

// Behaviour
pub mod action;
pub mod net;
pub mod widgets;

// Session
pub mod page;
pub mod render;
pub mod testing;
