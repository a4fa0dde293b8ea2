//! Caller-supplied fetch/merge contract for reference fields.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::Context;

/// Fetches and merges the entities behind a reference field.
///
/// `get` receives every parent entity that needs the reference at once, so
/// an implementation can batch a whole depth level into one lookup. `set`
/// then receives the same parents together with everything `get` returned
/// and must hand back the parents with the reference filled in, in the same
/// order and with the same count.
#[async_trait]
pub trait RefAccessor: Send + Sync {
    /// Load the referenced entities for `parents`.
    async fn get(&self, ctx: &Context, parents: &[Value]) -> anyhow::Result<Vec<Value>>;

    /// Attach `fetched` to `parents`.
    fn set(&self, ctx: &Context, parents: Vec<Value>, fetched: &[Value]) -> Vec<Value>;
}
