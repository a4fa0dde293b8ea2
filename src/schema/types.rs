//! Normalized type and field definitions.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::accessor::RefAccessor;
use crate::context::Context;

/// How many entities a reference field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cardinality {
    /// A single entity (or `null`).
    #[default]
    One,
    /// A list of entities.
    Many,
}

/// A field whose value is fetched through a caller-supplied accessor
/// instead of being read from the source entity.
#[derive(Clone)]
pub struct Reference {
    target: String,
    cardinality: Cardinality,
    accessor: Arc<dyn RefAccessor>,
}

impl Reference {
    pub fn new(
        target: impl Into<String>,
        cardinality: Cardinality,
        accessor: impl RefAccessor + 'static,
    ) -> Self {
        Self {
            target: target.into(),
            cardinality,
            accessor: Arc::new(accessor),
        }
    }

    /// Single-valued reference to `target`.
    pub fn one(target: impl Into<String>, accessor: impl RefAccessor + 'static) -> Self {
        Self::new(target, Cardinality::One, accessor)
    }

    /// Multi-valued reference to `target`.
    pub fn many(target: impl Into<String>, accessor: impl RefAccessor + 'static) -> Self {
        Self::new(target, Cardinality::Many, accessor)
    }

    /// Share an accessor already held elsewhere.
    pub fn from_shared(
        target: impl Into<String>,
        cardinality: Cardinality,
        accessor: Arc<dyn RefAccessor>,
    ) -> Self {
        Self {
            target: target.into(),
            cardinality,
            accessor,
        }
    }

    /// Name of the referenced type.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn accessor(&self) -> &dyn RefAccessor {
        self.accessor.as_ref()
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({} {:?})", self.target, self.cardinality)
    }
}

/// Signature of a computed-field transform:
/// `(context copy, parent entity, field name, fields projected so far)`.
pub type TransformFn = dyn Fn(Context, &Value, &str, &Map<String, Value>) -> Value + Send + Sync;

/// A derived field. Never read from source data.
#[derive(Clone)]
pub struct Computed(Arc<TransformFn>);

impl Computed {
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(Context, &Value, &str, &Map<String, Value>) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(transform))
    }

    pub fn apply(
        &self,
        ctx: Context,
        entity: &Value,
        name: &str,
        partial: &Map<String, Value>,
    ) -> Value {
        (self.0)(ctx, entity, name, partial)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Computed(..)")
    }
}

/// Every kind a schema entry or a shape field can take.
#[derive(Debug, Clone)]
pub enum TypeDef {
    /// Plain value, copied as-is.
    Scalar,
    /// Named fields.
    Shape(Shape),
    /// Indirection to another named type ("use").
    Alias(String),
    /// Externally fetched entity or entities.
    Reference(Reference),
    /// Derived value.
    Computed(Computed),
}

impl TypeDef {
    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Self::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Short lowercase label for logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Shape(_) => "shape",
            Self::Alias(_) => "alias",
            Self::Reference(_) => "reference",
            Self::Computed(_) => "computed",
        }
    }
}

impl From<Shape> for TypeDef {
    fn from(shape: Shape) -> Self {
        Self::Shape(shape)
    }
}

impl From<Reference> for TypeDef {
    fn from(reference: Reference) -> Self {
        Self::Reference(reference)
    }
}

/// A field declaration inside a shape.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub ty: TypeDef,
    /// Projected even when the query does not ask for it.
    pub required: bool,
    /// Used when the source entity lacks the field.
    pub default: Option<Value>,
}

impl FieldDef {
    pub fn new(ty: TypeDef) -> Self {
        Self {
            ty,
            required: false,
            default: None,
        }
    }

    pub fn scalar() -> Self {
        Self::new(TypeDef::Scalar)
    }

    pub fn shape(shape: Shape) -> Self {
        Self::new(TypeDef::Shape(shape))
    }

    pub fn alias(target: impl Into<String>) -> Self {
        Self::new(TypeDef::Alias(target.into()))
    }

    pub fn reference(reference: Reference) -> Self {
        Self::new(TypeDef::Reference(reference))
    }

    pub fn computed<F>(transform: F) -> Self
    where
        F: Fn(Context, &Value, &str, &Map<String, Value>) -> Value + Send + Sync + 'static,
    {
        Self::new(TypeDef::Computed(Computed::new(transform)))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Ordered set of named fields. Declaration order is projection order.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    fields: IndexMap<String, FieldDef>,
}

impl Shape {
    pub fn builder() -> ShapeBuilder {
        ShapeBuilder::default()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldDef)> {
        self.fields.iter()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`Shape`].
#[derive(Debug, Default)]
pub struct ShapeBuilder {
    fields: IndexMap<String, FieldDef>,
}

impl ShapeBuilder {
    /// Declare a field. Redeclaring a name replaces it in place.
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    pub fn build(self) -> Shape {
        Shape {
            fields: self.fields,
        }
    }
}
