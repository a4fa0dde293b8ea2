//! Up-front schema checks.
//!
//! Construction never fails, so a schema with a dangling name or an alias
//! loop only errors once a query reaches it. `validate` walks every type
//! (including inline shapes) and reports:
//! 1. Alias targets that are not declared
//! 2. Reference targets that are not declared
//! 3. Alias cycles

use thiserror::Error;

use super::{Schema, Shape, TypeDef};
use crate::alias::{resolve_type, TypeRef};
use crate::error::PineError;

/// Problems found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaIssue {
    #[error("Unknown alias target: {location} -> {target}")]
    UnknownAliasTarget { location: String, target: String },

    #[error("Unknown reference target: {location} -> {target}")]
    UnknownReferenceTarget { location: String, target: String },

    #[error("Alias cycle at {location}: {}", trail.join("->"))]
    AliasCycle { location: String, trail: Vec<String> },
}

impl SchemaIssue {
    /// Get an error code for this issue.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownAliasTarget { .. } => "UNKNOWN_ALIAS_TARGET",
            Self::UnknownReferenceTarget { .. } => "UNKNOWN_REFERENCE_TARGET",
            Self::AliasCycle { .. } => "ALIAS_CYCLE",
        }
    }
}

/// Result of validating a schema.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub issues: Vec<SchemaIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate every type in `schema`.
pub fn validate(schema: &Schema) -> ValidationResult {
    let mut result = ValidationResult::default();

    for (name, def) in schema.types() {
        check_def(schema, name, def, &mut result);
    }

    result
}

fn check_def(schema: &Schema, location: &str, def: &TypeDef, result: &mut ValidationResult) {
    match def {
        TypeDef::Alias(target) => {
            if !schema.contains(target) {
                result.issues.push(SchemaIssue::UnknownAliasTarget {
                    location: location.to_string(),
                    target: target.clone(),
                });
            } else if let Err(PineError::Cycle { trail }) = resolve_type(schema, TypeRef::Def(def)) {
                result.issues.push(SchemaIssue::AliasCycle {
                    location: location.to_string(),
                    trail,
                });
            }
        }
        TypeDef::Reference(reference) => {
            if !schema.contains(reference.target()) {
                result.issues.push(SchemaIssue::UnknownReferenceTarget {
                    location: location.to_string(),
                    target: reference.target().to_string(),
                });
            }
        }
        TypeDef::Shape(shape) => check_shape(schema, location, shape, result),
        TypeDef::Scalar | TypeDef::Computed(_) => {}
    }
}

fn check_shape(schema: &Schema, location: &str, shape: &Shape, result: &mut ValidationResult) {
    for (name, field) in shape.fields() {
        let field_location = format!("{}.{}", location, name);
        check_def(schema, &field_location, &field.ty, result);
    }
}
