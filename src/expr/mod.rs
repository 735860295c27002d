//! Expression evaluation: `{var}` interpolation and two-branch ternaries.
//!
//! - [`interpolate`]: replace every `{...}` span in a string.
//! - [`evaluate`]: evaluate the inside of one span.
//! - [`Context`]: layered lookup (form scope over global scope).

pub mod eval;
pub mod tokenizer;

pub use eval::{evaluate, interpolate, Context};
pub use tokenizer::{tokenize, Token};
