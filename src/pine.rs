//! Orchestrator: query normalization, then resolve, populate and filtrate.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::alias::TypeRef;
use crate::config::PineConfig;
use crate::context::Context;
use crate::error::Result;
use crate::query::Query;
use crate::resolve::ReferenceDescriptor;
use crate::schema::Schema;

/// Anything [`Pine::grow`] accepts as a query.
#[derive(Debug, Clone)]
pub enum QueryInput<'q> {
    /// An already built selection.
    Query(Cow<'q, Query>),
    /// Query-language text, e.g. `"author, comments{author}"`.
    Text(Cow<'q, str>),
    /// Structured JSON selection; a JSON string is parsed as text.
    Json(&'q Value),
    /// Required fields only.
    Empty,
}

impl QueryInput<'_> {
    pub fn into_query(self) -> Result<Query> {
        match self {
            Self::Query(query) => Ok(query.into_owned()),
            Self::Text(text) => parse_text(&text),
            Self::Json(Value::String(text)) => parse_text(text),
            Self::Json(Value::Null) => Ok(Query::empty()),
            Self::Json(value) => Query::from_json(value),
            Self::Empty => Ok(Query::empty()),
        }
    }
}

fn parse_text(text: &str) -> Result<Query> {
    if text.trim().is_empty() {
        Ok(Query::empty())
    } else {
        Query::parse(text)
    }
}

impl From<Query> for QueryInput<'_> {
    fn from(query: Query) -> Self {
        Self::Query(Cow::Owned(query))
    }
}

impl<'q> From<&'q Query> for QueryInput<'q> {
    fn from(query: &'q Query) -> Self {
        Self::Query(Cow::Borrowed(query))
    }
}

impl<'q> From<&'q str> for QueryInput<'q> {
    fn from(text: &'q str) -> Self {
        Self::Text(Cow::Borrowed(text))
    }
}

impl From<String> for QueryInput<'_> {
    fn from(text: String) -> Self {
        Self::Text(Cow::Owned(text))
    }
}

impl<'q> From<&'q Value> for QueryInput<'q> {
    fn from(value: &'q Value) -> Self {
        Self::Json(value)
    }
}

impl From<()> for QueryInput<'_> {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl<'q, T: Into<QueryInput<'q>>> From<Option<T>> for QueryInput<'q> {
    fn from(input: Option<T>) -> Self {
        input.map_or(Self::Empty, Into::into)
    }
}

/// A schema plus the settings used to grow entities from it.
///
/// ```rust,ignore
/// let pine = Pine::new(schema);
/// let post = pine.grow(&raw_post, "post", "author, comments{author}", &ctx).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Pine {
    schema: Arc<Schema>,
    config: PineConfig,
}

impl Pine {
    /// Use the default configuration (see [`PineConfig::default`]).
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self::with_config(schema, PineConfig::default())
    }

    pub fn with_config(schema: impl Into<Arc<Schema>>, config: PineConfig) -> Self {
        Self {
            schema: schema.into(),
            config,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &PineConfig {
        &self.config
    }

    /// Bind `ctx` for repeated [`PineContext::grow`] calls.
    pub fn context(&self, ctx: impl Into<Context>) -> PineContext<'_> {
        PineContext {
            pine: self,
            ctx: ctx.into(),
        }
    }

    /// Fetch the references `query` needs on `target` and project the result.
    ///
    /// `target` is never modified. Fails before any fetch on schema or query
    /// errors, and with [`PineError::Fetch`](crate::PineError::Fetch) if an
    /// accessor fails.
    #[instrument(skip_all)]
    pub async fn grow<'t, 'q>(
        &self,
        target: &Value,
        ty: impl Into<TypeRef<'t>>,
        query: impl Into<QueryInput<'q>>,
        ctx: &Context,
    ) -> Result<Value> {
        let ty = ty.into();
        let query = query.into().into_query()?;

        let refs = self.resolve(ty, &query)?;
        debug!(ty = %ty.display_name(), references = refs.len(), "growing entity");

        let populated = self.populate(ctx, target, &refs).await?;
        self.filtrate(ctx, &populated, ty, &query)
    }

    /// [`resolve`](crate::resolve::resolve) with the configured depth.
    pub fn resolve<'t>(
        &self,
        ty: impl Into<TypeRef<'t>>,
        query: &Query,
    ) -> Result<Vec<ReferenceDescriptor>> {
        crate::resolve::resolve(&self.schema, ty.into(), query, self.config.max_depth)
    }

    /// Populate a single root entity.
    pub async fn populate(
        &self,
        ctx: &Context,
        target: &Value,
        refs: &[ReferenceDescriptor],
    ) -> Result<Value> {
        let populated =
            crate::populate::populate(ctx, std::slice::from_ref(target), refs).await?;
        Ok(populated.into_iter().next().unwrap_or(Value::Null))
    }

    pub fn filtrate<'t>(
        &self,
        ctx: &Context,
        entity: &Value,
        ty: impl Into<TypeRef<'t>>,
        query: &Query,
    ) -> Result<Value> {
        crate::filtrate::filtrate(ctx, entity, &self.schema, ty.into(), query)
    }
}

/// A [`Pine`] with a fixed context.
#[derive(Debug, Clone)]
pub struct PineContext<'p> {
    pine: &'p Pine,
    ctx: Context,
}

impl PineContext<'_> {
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub async fn grow<'t, 'q>(
        &self,
        target: &Value,
        ty: impl Into<TypeRef<'t>>,
        query: impl Into<QueryInput<'q>>,
    ) -> Result<Value> {
        self.pine.grow(target, ty, query, &self.ctx).await
    }
}
