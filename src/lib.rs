//! PineQL - declarative graph population and projection.
//!
//! Given a schema of shapes and references, a root entity and a field
//! selection, the engine fetches every reference the selection reaches and
//! returns only the requested fields.
//!
//! ## Pipeline
//! ```text
//! query ──► resolve ──► [ReferenceDescriptor] ──► populate ──► filtrate ──► response
//!            (schema walk,     (batched per depth,         (selected and
//!             depth limit)      caller's accessors)         required fields)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pineql::{Context, FieldDef, Pine, Reference, Schema, Shape};
//!
//! let schema = Schema::builder()
//!     .shape(
//!         "post",
//!         Shape::builder()
//!             .field("id", FieldDef::scalar().required())
//!             .field("author", FieldDef::reference(Reference::one("user", users)))
//!             .build(),
//!     )
//!     .shape("user", Shape::builder().field("id", FieldDef::scalar()).build())
//!     .build();
//!
//! let pine = Pine::new(schema);
//! let post = pine.grow(&raw_post, "post", "author", &Context::new()).await?;
//! ```

pub mod alias;
pub mod config;
pub mod context;
pub mod error;
pub mod filtrate;
pub mod path;
pub mod pine;
pub mod populate;
pub mod query;
pub mod resolve;
pub mod schema;

#[cfg(test)]
mod fixtures;

pub use alias::{resolve_type, TypeRef};
pub use config::{PineConfig, DEFAULT_MAX_DEPTH, MAX_DEPTH_ENV};
pub use context::Context;
pub use error::{PineError, Result};
pub use filtrate::filtrate;
pub use pine::{Pine, PineContext, QueryInput};
pub use populate::populate;
pub use query::{Query, QueryTree};
pub use resolve::{resolve, ReferenceDescriptor};
pub use schema::{
    validate, Cardinality, Computed, FieldDef, RefAccessor, Reference, Schema, SchemaIssue,
    Shape, TypeDef, ValidationResult,
};
