//! Cycle-safe type alias resolution.

use crate::error::{PineError, Result};
use crate::schema::{Schema, TypeDef};

/// A type given either by name or as an anonymous definition.
#[derive(Debug, Clone, Copy)]
pub enum TypeRef<'a> {
    Named(&'a str),
    Def(&'a TypeDef),
}

impl<'a> TypeRef<'a> {
    /// Name used in error messages.
    pub fn display_name(&self) -> String {
        match self {
            Self::Named(name) => (*name).to_string(),
            Self::Def(TypeDef::Alias(target)) => format!("use({})", target),
            Self::Def(def) => format!("<anonymous {}>", def.kind()),
        }
    }
}

impl<'a> From<&'a str> for TypeRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Named(name)
    }
}

impl<'a> From<&'a String> for TypeRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Named(name.as_str())
    }
}

impl<'a> From<&'a TypeDef> for TypeRef<'a> {
    fn from(def: &'a TypeDef) -> Self {
        Self::Def(def)
    }
}

/// Follow alias links until a non-alias definition is reached.
///
/// A name seen twice is a [`PineError::Cycle`]. The cycle part of the trail
/// starts at its earliest-declared member, so looking up any alias of the
/// same loop reports the same `a->b->a` text.
pub fn resolve_type<'a>(schema: &'a Schema, ty: TypeRef<'a>) -> Result<&'a TypeDef> {
    let mut name = match ty {
        TypeRef::Named(name) => name,
        TypeRef::Def(TypeDef::Alias(target)) => target.as_str(),
        TypeRef::Def(def) => return Ok(def),
    };

    let mut trail: Vec<&str> = vec![name];

    loop {
        let def = schema.get(name).ok_or_else(|| PineError::UnknownType {
            name: name.to_string(),
        })?;

        match def {
            TypeDef::Alias(next) => {
                if let Some(start) = trail.iter().position(|seen| *seen == next.as_str()) {
                    return Err(PineError::Cycle {
                        trail: canonical_cycle(schema, &trail, start),
                    });
                }
                trail.push(next.as_str());
                name = next.as_str();
            }
            other => return Ok(other),
        }
    }
}

fn canonical_cycle(schema: &Schema, trail: &[&str], start: usize) -> Vec<String> {
    let (lead_in, cycle) = trail.split_at(start);

    let pivot = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, name)| schema.index_of(name).unwrap_or(usize::MAX))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut result: Vec<String> = lead_in.iter().map(|s| s.to_string()).collect();
    result.extend(
        cycle[pivot..]
            .iter()
            .chain(cycle[..pivot].iter())
            .map(|s| s.to_string()),
    );
    if let Some(first) = cycle.get(pivot) {
        result.push(first.to_string());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, Shape};

    fn schema() -> Schema {
        Schema::builder()
            .alias("a", "b")
            .alias("b", "a")
            .shape("post", Shape::builder().field("id", FieldDef::scalar()).build())
            .alias("usePost", "post")
            .alias("useUsePost", "usePost")
            .alias("self", "self")
            .alias("dangling", "missing")
            .alias("x", "a")
            .build()
    }

    #[test]
    fn test_resolve_named_shape() {
        let schema = schema();
        let def = resolve_type(&schema, "post".into()).unwrap();
        assert!(def.as_shape().is_some());
    }

    #[test]
    fn test_resolve_alias_chain() {
        let schema = schema();
        let def = resolve_type(&schema, "useUsePost".into()).unwrap();
        assert_eq!(def.as_shape().unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_anonymous_alias() {
        let schema = schema();
        let alias = TypeDef::Alias("usePost".into());
        let def = resolve_type(&schema, TypeRef::Def(&alias)).unwrap();
        assert!(def.as_shape().is_some());
    }

    #[test]
    fn test_anonymous_non_alias_is_returned_as_is() {
        let schema = schema();
        let def = TypeDef::Scalar;
        assert!(matches!(
            resolve_type(&schema, TypeRef::Def(&def)),
            Ok(TypeDef::Scalar)
        ));
    }

    #[test]
    fn test_cycle_reported_from_either_side() {
        let schema = schema();
        for start in ["a", "b"] {
            let err = resolve_type(&schema, start.into()).unwrap_err();
            assert!(matches!(err, PineError::Cycle { .. }));
            assert!(err.to_string().contains("a->b->a"), "{}", err);
        }
    }

    #[test]
    fn test_cycle_keeps_lead_in() {
        let schema = schema();
        let err = resolve_type(&schema, "x".into()).unwrap_err();
        assert!(err.to_string().contains("x->a->b->a"), "{}", err);
    }

    #[test]
    fn test_self_alias_is_cycle() {
        let schema = schema();
        let err = resolve_type(&schema, "self".into()).unwrap_err();
        assert!(err.to_string().contains("self->self"));
    }

    #[test]
    fn test_unknown_type() {
        let schema = schema();
        let err = resolve_type(&schema, "nope".into()).unwrap_err();
        assert!(matches!(err, PineError::UnknownType { ref name } if name == "nope"));

        let err = resolve_type(&schema, "dangling".into()).unwrap_err();
        assert!(matches!(err, PineError::UnknownType { ref name } if name == "missing"));
    }
}
