//! Field-selection query model.
//!
//! A query mirrors the schema's nesting. Each node is either [`Query::All`]
//! (the `true` sentinel: every declared field at that level) or a
//! [`QueryTree`] naming the wanted fields. A field written without braces in
//! the query language selects an empty tree below it, so references under it
//! stay unfetched and only required fields are projected.

use std::borrow::Cow;
use std::str::FromStr;

use indexmap::IndexMap;
use pineql_rql::{parse_selection, Selection};
use serde_json::Value;

use crate::error::{PineError, Result};

/// A selection node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every declared field.
    All,
    /// Only the named fields.
    Fields(QueryTree),
}

/// Ordered map of field name to nested selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTree(IndexMap<String, Query>);

impl QueryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, see [`QueryTree::insert`].
    pub fn with(mut self, name: impl Into<String>, query: Query) -> Self {
        self.insert(name, query);
        self
    }

    /// Add a field. Selecting the same field twice unions the selections.
    pub fn insert(&mut self, name: impl Into<String>, query: Query) {
        let name = name.into();
        match self.0.get_mut(&name) {
            Some(existing) => {
                *existing = match (std::mem::take(existing), query) {
                    (Query::All, _) | (_, Query::All) => Query::All,
                    (Query::Fields(mut current), Query::Fields(incoming)) => {
                        for (child, sub) in incoming.0 {
                            current.insert(child, sub);
                        }
                        Query::Fields(current)
                    }
                };
            }
            None => {
                self.0.insert(name, query);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Query> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Query)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::empty()
    }
}

impl Query {
    /// Select nothing beyond required fields.
    pub fn empty() -> Self {
        Self::Fields(QueryTree::default())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Fields(tree) if tree.is_empty())
    }

    /// Whether `name` is selected at this level.
    pub fn selects(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Fields(tree) => tree.contains(name),
        }
    }

    /// Selection below `name`. Fields under [`Query::All`] expand to an
    /// empty selection, so "all" never cascades past one level.
    pub fn child(&self, name: &str) -> Cow<'_, Query> {
        match self {
            Self::Fields(tree) => match tree.get(name) {
                Some(sub) => Cow::Borrowed(sub),
                None => Cow::Owned(Self::empty()),
            },
            Self::All => Cow::Owned(Self::empty()),
        }
    }

    /// Parse the query language, e.g. `"author, comments{author,text}"`.
    pub fn parse(input: &str) -> Result<Self> {
        let selection = parse_selection(input)?;
        Ok(Self::from_selection(&selection))
    }

    pub fn from_selection(selection: &Selection) -> Self {
        let mut tree = QueryTree::new();
        for field in &selection.fields {
            let sub = match &field.children {
                Some(children) => Self::from_selection(children),
                None => Self::empty(),
            };
            tree.insert(field.name.clone(), sub);
        }
        Self::Fields(tree)
    }

    /// Build from JSON: `true` selects everything at that level, objects
    /// nest, `false` and `null` entries are dropped.
    pub fn from_json(value: &Value) -> Result<Self> {
        from_json_at(value, "")
    }
}

fn from_json_at(value: &Value, path: &str) -> Result<Query> {
    match value {
        Value::Bool(true) => Ok(Query::All),
        Value::Object(map) => {
            let mut tree = QueryTree::new();
            for (name, sub) in map {
                if matches!(sub, Value::Null | Value::Bool(false)) {
                    continue;
                }
                let child_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", path, name)
                };
                tree.insert(name.clone(), from_json_at(sub, &child_path)?);
            }
            Ok(Query::Fields(tree))
        }
        other => Err(PineError::InvalidQuery {
            path: if path.is_empty() { "<root>".into() } else { path.to_string() },
            reason: format!("expected `true` or an object, found {}", json_kind(other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl FromStr for Query {
    type Err = PineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<QueryTree> for Query {
    fn from(tree: QueryTree) -> Self {
        Self::Fields(tree)
    }
}
