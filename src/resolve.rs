//! Reference resolution.
//!
//! Walks a type against a query and lists every reference that has to be
//! fetched, as `(path, reference)` pairs in pre-order:
//!
//! ```text
//! post { author, comments{author} }
//!   -> [author]            user
//!   -> [comments]          comment
//!   -> [comments, author]  user
//! ```
//!
//! Only queried fields are visited. Nesting deeper than the depth budget is
//! dropped without an error so self-referential schemas stay finite.

use tracing::debug;

use crate::alias::{resolve_type, TypeRef};
use crate::error::{PineError, Result};
use crate::query::Query;
use crate::schema::{Reference, Schema, TypeDef};

/// A reference to fetch and the tree path it belongs to.
#[derive(Debug, Clone)]
pub struct ReferenceDescriptor {
    /// Field names from the root entity. Its length is the resolution depth.
    pub path: Vec<String>,
    pub reference: Reference,
}

impl ReferenceDescriptor {
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Dotted form of the path, used as memo key.
    pub fn key(&self) -> String {
        self.path.join(".")
    }

    /// Path of the entities that own this reference.
    pub fn parent(&self) -> &[String] {
        &self.path[..self.path.len().saturating_sub(1)]
    }

    /// Field the fetched value is stored under.
    pub fn leaf(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }
}

/// List the references needed to satisfy `query` on `root`.
///
/// With `max_depth = 0` only references declared directly on `root` are
/// returned; each extra level admits one more path segment.
///
/// # Errors
/// - [`PineError::RootReference`] if `root` resolves to a reference
/// - [`PineError::UnknownType`] / [`PineError::Cycle`] from alias resolution
pub fn resolve<'a>(
    schema: &'a Schema,
    root: impl Into<TypeRef<'a>>,
    query: &Query,
    max_depth: usize,
) -> Result<Vec<ReferenceDescriptor>> {
    let root = root.into();
    let def = resolve_type(schema, root)?;

    if matches!(def, TypeDef::Reference(_)) {
        return Err(PineError::RootReference {
            name: root.display_name(),
        });
    }

    let budget = isize::try_from(max_depth)
        .unwrap_or(isize::MAX)
        .saturating_add(1);

    let mut resolver = Resolver {
        schema,
        path: Vec::new(),
        out: Vec::new(),
    };
    resolver.walk_shape(def, query, budget)?;

    debug!(
        root = %root.display_name(),
        max_depth,
        references = resolver.out.len(),
        "resolved references"
    );

    Ok(resolver.out)
}

struct Resolver<'a> {
    schema: &'a Schema,
    path: Vec<String>,
    out: Vec<ReferenceDescriptor>,
}

impl<'a> Resolver<'a> {
    fn walk(&mut self, def: &'a TypeDef, query: &Query, depth: isize) -> Result<()> {
        if depth < 0 {
            return Ok(());
        }

        match def {
            TypeDef::Reference(reference) => {
                self.out.push(ReferenceDescriptor {
                    path: self.path.clone(),
                    reference: reference.clone(),
                });
                let target = resolve_type(self.schema, TypeRef::Named(reference.target()))?;
                self.walk_shape(target, query, depth)
            }
            TypeDef::Alias(_) => {
                let target = resolve_type(self.schema, TypeRef::Def(def))?;
                self.walk(target, query, depth)
            }
            TypeDef::Shape(_) => self.walk_shape(def, query, depth),
            TypeDef::Scalar | TypeDef::Computed(_) => Ok(()),
        }
    }

    fn walk_shape(&mut self, def: &'a TypeDef, query: &Query, depth: isize) -> Result<()> {
        let TypeDef::Shape(shape) = def else {
            return Ok(());
        };

        for (name, field) in shape.fields() {
            if !query.selects(name) {
                continue;
            }
            let sub = query.child(name);

            self.path.push(name.clone());
            let walked = self.walk(&field.ty, &sub, depth - 1);
            self.path.pop();
            walked?;
        }

        Ok(())
    }
}
