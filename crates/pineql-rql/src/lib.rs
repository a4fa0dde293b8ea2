//! Field-selection query language.
//!
//! Parses the compact selection syntax used by callers to describe which
//! fields of an object graph they want:
//!
//! ```text
//! author, title, comments{author, text}
//! ```
//!
//! The parser knows nothing about schemas. It produces a [`Selection`] tree
//! that the engine turns into its own query model.

mod ast;
mod parser;

pub use ast::{FieldSelection, Selection};
pub use parser::{parse_selection, RqlError};
