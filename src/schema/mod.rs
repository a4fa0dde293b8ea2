//! Schema model.
//!
//! A [`Schema`] maps type names to normalized [`TypeDef`]s. It is built once,
//! never mutated afterwards, and shared read-only by resolution, population
//! and projection.
//!
//! ```text
//! Schema
//! ├── "post"    -> Shape { id, title, author: Reference(user), comments: Reference(comment) }
//! ├── "usePost" -> Alias("post")
//! └── "user"    -> Shape { id, username, friends: Reference(user) }
//! ```

mod accessor;
mod types;
mod validate;

pub use accessor::RefAccessor;
pub use types::{
    Cardinality, Computed, FieldDef, Reference, Shape, ShapeBuilder, TransformFn, TypeDef,
};
pub use validate::{validate, SchemaIssue, ValidationResult};

use indexmap::IndexMap;

/// Immutable set of named type definitions.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: IndexMap<String, TypeDef>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Declaration position of `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.types.get_index_of(name)
    }

    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    types: IndexMap<String, TypeDef>,
}

impl SchemaBuilder {
    pub fn shape(self, name: impl Into<String>, shape: Shape) -> Self {
        self.type_def(name, TypeDef::Shape(shape))
    }

    pub fn alias(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.type_def(name, TypeDef::Alias(target.into()))
    }

    pub fn type_def(mut self, name: impl Into<String>, def: TypeDef) -> Self {
        self.types.insert(name.into(), def);
        self
    }

    /// Finish the schema. Dangling names and alias cycles are not rejected
    /// here; run [`validate`] to report them up front, otherwise they surface
    /// as errors when a query touches them.
    pub fn build(self) -> Schema {
        Schema { types: self.types }
    }
}
