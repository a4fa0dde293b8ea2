//! Batched population.
//!
//! Two phases over the resolved descriptors:
//!
//! ```text
//! get:  depth 1 ─► depth 2 ─► ... (each depth: all fetches concurrently)
//! set:  ... ─► depth 2 ─► depth 1 (deepest writes first)
//! ```
//!
//! A fetch at depth `n + 1` reads its parents from whatever the depth `n`
//! reference under it returned, so one `get` call serves every sibling at a
//! level. During set, a descriptor with a referenced ancestor writes into
//! that ancestor's fetched values; the ancestor's own `set` later carries
//! them into the working tree. The caller's collection is never touched.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, instrument, trace, warn};

use crate::context::Context;
use crate::error::{PineError, Result};
use crate::path::{collect_all, update_by_path};
use crate::resolve::ReferenceDescriptor;

/// Fetched entities keyed by dotted reference path.
type Memo = HashMap<String, Vec<Value>>;

/// Fetch every reference in `refs` and merge the results into a copy of `data`.
///
/// Fails on the first accessor error; nothing is returned partially.
#[instrument(skip_all, fields(roots = data.len(), references = refs.len()))]
pub async fn populate(
    ctx: &Context,
    data: &[Value],
    refs: &[ReferenceDescriptor],
) -> Result<Vec<Value>> {
    let fetched = populate_get(ctx, data, refs).await?;
    Ok(populate_set(ctx, data, fetched, refs))
}

// ============================================================================
// Phase get
// ============================================================================

async fn populate_get(
    ctx: &Context,
    data: &[Value],
    refs: &[ReferenceDescriptor],
) -> Result<Memo> {
    let mut groups: BTreeMap<usize, Vec<&ReferenceDescriptor>> = BTreeMap::new();
    for descriptor in refs {
        groups.entry(descriptor.depth()).or_default().push(descriptor);
    }

    let mut fetched = Memo::new();
    let mut selections = Selections::new(data);

    for (depth, group) in groups {
        let mut jobs = Vec::with_capacity(group.len());

        for descriptor in group {
            let key = descriptor.key();
            let parents = selections.select(descriptor.parent(), &fetched);

            if let Some(existing) = descriptor
                .leaf()
                .and_then(|leaf| prepopulated(&parents, leaf))
            {
                trace!(path = %key, "reference already embedded, skipping fetch");
                fetched.insert(key, existing);
                continue;
            }

            jobs.push(FetchJob {
                key,
                descriptor,
                parents,
            });
        }

        debug!(depth, fetches = jobs.len(), "fetching reference group");

        let results = try_join_all(jobs.iter().map(|job| job.run(ctx))).await?;
        for (job, values) in jobs.into_iter().zip(results) {
            fetched.insert(job.key, values);
        }
    }

    Ok(fetched)
}

struct FetchJob<'r> {
    key: String,
    descriptor: &'r ReferenceDescriptor,
    parents: Arc<Vec<Value>>,
}

impl FetchJob<'_> {
    async fn run(&self, ctx: &Context) -> Result<Vec<Value>> {
        let values = self
            .descriptor
            .reference
            .accessor()
            .get(ctx, &self.parents)
            .await
            .map_err(|source| PineError::Fetch {
                path: self.key.clone(),
                source,
            })?;

        trace!(
            path = %self.key,
            parents = self.parents.len(),
            fetched = values.len(),
            "fetched reference"
        );
        Ok(values)
    }
}

/// Parent selections, collected once per distinct parent path.
struct Selections<'d> {
    data: &'d [Value],
    cache: HashMap<String, Arc<Vec<Value>>>,
}

impl<'d> Selections<'d> {
    fn new(data: &'d [Value]) -> Self {
        Self {
            data,
            cache: HashMap::new(),
        }
    }

    fn select(&mut self, parent: &[String], fetched: &Memo) -> Arc<Vec<Value>> {
        let key = parent.join(".");
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(hit);
        }

        let collected = match nearest_fetched(parent, fetched) {
            Some((len, ancestor)) => {
                let values = fetched.get(&ancestor).map(Vec::as_slice).unwrap_or_default();
                collect_all(values, &parent[len..])
            }
            None => collect_all(self.data, parent),
        };

        let selection = Arc::new(collected);
        self.cache.insert(key, Arc::clone(&selection));
        selection
    }
}

/// An array at `leaf` that is empty or holds objects on every parent counts
/// as already populated. Legitimately empty references fall under this too.
fn prepopulated(parents: &[Value], leaf: &str) -> Option<Vec<Value>> {
    if parents.is_empty() {
        return None;
    }

    let mut existing = Vec::new();
    for parent in parents {
        match parent.get(leaf) {
            Some(Value::Array(items)) if items.first().map_or(true, Value::is_object) => {
                existing.extend(items.iter().cloned());
            }
            _ => return None,
        }
    }
    Some(existing)
}

/// Longest prefix of `path` (including `path` itself) with fetched values.
fn nearest_fetched(path: &[String], fetched: &Memo) -> Option<(usize, String)> {
    (1..=path.len())
        .rev()
        .map(|len| (len, path[..len].join(".")))
        .find(|(_, key)| fetched.contains_key(key))
}

// ============================================================================
// Phase set
// ============================================================================

fn populate_set(
    ctx: &Context,
    data: &[Value],
    mut fetched: Memo,
    refs: &[ReferenceDescriptor],
) -> Vec<Value> {
    let mut ordered: Vec<&ReferenceDescriptor> = refs.iter().collect();
    ordered.sort_by(|a, b| b.depth().cmp(&a.depth()));

    let mut tree = Value::Array(data.to_vec());

    for descriptor in ordered {
        let key = descriptor.key();
        let values = fetched.remove(&key).unwrap_or_default();
        let accessor = descriptor.reference.accessor();

        let mut attach = |targets: Vec<Value>| {
            let expected = targets.len();
            let merged = accessor.set(ctx, targets, &values);
            if merged.len() != expected {
                warn!(
                    path = %key,
                    expected,
                    returned = merged.len(),
                    "set returned a different number of entities"
                );
            }
            merged
        };

        let parent = descriptor.parent();
        match nearest_fetched(parent, &fetched) {
            Some((len, ancestor)) => {
                if let Some(slot) = fetched.get_mut(&ancestor) {
                    let current = Value::Array(std::mem::take(slot));
                    *slot = into_entities(update_by_path(current, &parent[len..], &mut attach));
                }
            }
            None => tree = update_by_path(tree, parent, &mut attach),
        }
    }

    into_entities(tree)
}

fn into_entities(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
