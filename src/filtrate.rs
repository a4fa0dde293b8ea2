//! Shape projection.
//!
//! Turns a populated entity into the response for a query: only selected or
//! required fields, in declaration order, with defaults and computed values
//! filled in and references projected through their target types.

use serde_json::{Map, Value};

use crate::alias::{resolve_type, TypeRef};
use crate::context::Context;
use crate::error::Result;
use crate::query::Query;
use crate::schema::{Cardinality, FieldDef, Schema, TypeDef};

/// Project `entity` as `ty` according to `query`.
///
/// `null` projects to `null`, as does any type that does not resolve to a
/// shape. Any other value under a shape is projected field by field, so a
/// non-object (an id left unfetched past the depth limit, for instance)
/// yields defaults and `null`s. Absent fields are emitted as explicit `null`.
pub fn filtrate<'a>(
    ctx: &Context,
    entity: &Value,
    schema: &'a Schema,
    ty: impl Into<TypeRef<'a>>,
    query: &Query,
) -> Result<Value> {
    let def = resolve_type(schema, ty.into())?;
    Projector { ctx, schema }.entity(entity, def, query)
}

struct Projector<'c, 's> {
    ctx: &'c Context,
    schema: &'s Schema,
}

impl<'s> Projector<'_, 's> {
    fn entity(&self, entity: &Value, def: &'s TypeDef, query: &Query) -> Result<Value> {
        if entity.is_null() {
            return Ok(Value::Null);
        }
        let Some(shape) = def.as_shape() else {
            return Ok(Value::Null);
        };
        let source = entity.as_object();

        let mut result = Map::new();

        for (name, field) in shape.fields() {
            if !field.required && !query.selects(name) {
                continue;
            }
            let sub = query.child(name);
            let raw = source.and_then(|map| map.get(name));

            let value = match &field.ty {
                TypeDef::Computed(computed) => {
                    computed.apply(self.ctx.clone(), entity, name, &result)
                }
                TypeDef::Reference(reference) => match raw {
                    Some(raw) if !raw.is_null() => {
                        let target =
                            resolve_type(self.schema, TypeRef::Named(reference.target()))?;
                        self.reference(raw, target, &sub, reference.cardinality())?
                    }
                    _ => Value::Null,
                },
                TypeDef::Alias(_) => match raw {
                    Some(raw) if !raw.is_null() => {
                        let target = resolve_type(self.schema, TypeRef::Def(&field.ty))?;
                        self.each(raw, target, &sub)?
                    }
                    _ => Value::Null,
                },
                TypeDef::Shape(_) => match raw {
                    Some(raw) if is_nested(&sub) => self.each(raw, &field.ty, &sub)?,
                    Some(raw) => raw.clone(),
                    None => fallback(field),
                },
                TypeDef::Scalar => match raw {
                    Some(raw) => raw.clone(),
                    None => fallback(field),
                },
            };

            result.insert(name.clone(), value);
        }

        Ok(Value::Object(result))
    }

    /// Arrays always project element-wise. A single value under a `Many`
    /// reference is wrapped.
    fn reference(
        &self,
        raw: &Value,
        target: &'s TypeDef,
        query: &Query,
        cardinality: Cardinality,
    ) -> Result<Value> {
        match (cardinality, raw) {
            (_, Value::Array(_)) => self.each(raw, target, query),
            (Cardinality::Many, single) => {
                Ok(Value::Array(vec![self.entity(single, target, query)?]))
            }
            (Cardinality::One, one) => self.entity(one, target, query),
        }
    }

    /// Project every element of an array, or the value itself.
    fn each(&self, raw: &Value, def: &'s TypeDef, query: &Query) -> Result<Value> {
        match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| self.entity(item, def, query))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            single => self.entity(single, def, query),
        }
    }
}

/// Declared default of a field absent from the source.
fn fallback(field: &FieldDef) -> Value {
    field.default.clone().unwrap_or(Value::Null)
}

fn is_nested(query: &Query) -> bool {
    matches!(query, Query::Fields(tree) if !tree.is_empty())
}
