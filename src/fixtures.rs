//! Schema fixtures shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::Context;
use crate::schema::{FieldDef, RefAccessor, Reference, Schema, Shape};

/// Accessor that fetches nothing and leaves parents untouched.
pub(crate) struct Noop;

#[async_trait]
impl RefAccessor for Noop {
    async fn get(&self, _ctx: &Context, _parents: &[Value]) -> anyhow::Result<Vec<Value>> {
        Ok(vec![])
    }

    fn set(&self, _ctx: &Context, parents: Vec<Value>, _fetched: &[Value]) -> Vec<Value> {
        parents
    }
}

/// Accessor that counts its fetches and returns nothing.
pub(crate) struct Counting(pub Arc<AtomicUsize>);

#[async_trait]
impl RefAccessor for Counting {
    async fn get(&self, _ctx: &Context, _parents: &[Value]) -> anyhow::Result<Vec<Value>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(vec![])
    }

    fn set(&self, _ctx: &Context, parents: Vec<Value>, _fetched: &[Value]) -> Vec<Value> {
        parents
    }
}

fn type_tag(name: &str) -> FieldDef {
    FieldDef::scalar().default_value(name).required()
}

/// `post`, `user`, `comment` and the `usePost` alias, with inert accessors.
pub(crate) fn blog_schema() -> Schema {
    Schema::builder()
        .shape(
            "post",
            Shape::builder()
                .field("$type", type_tag("post"))
                .field("id", FieldDef::scalar().required())
                .field("title", FieldDef::scalar().required())
                .field("intro", FieldDef::scalar())
                .field("text", FieldDef::scalar())
                .field(
                    "isAuthor",
                    FieldDef::computed(|ctx, post, _, _| {
                        json!(post.get("author") == ctx.get("actor"))
                    }),
                )
                .field("author", FieldDef::reference(Reference::one("user", Noop)))
                .field("comments", FieldDef::reference(Reference::many("comment", Noop)))
                .field("lastComment", FieldDef::reference(Reference::one("comment", Noop)))
                .build(),
        )
        .alias("usePost", "post")
        .shape(
            "user",
            Shape::builder()
                .field("$type", type_tag("user"))
                .field("id", FieldDef::scalar().required())
                .field("username", FieldDef::scalar())
                .field("friends", FieldDef::reference(Reference::many("user", Noop)))
                .field("posts", FieldDef::reference(Reference::many("post", Noop)))
                .build(),
        )
        .shape(
            "comment",
            Shape::builder()
                .field("$type", type_tag("comment"))
                .field("id", FieldDef::scalar().required())
                .field("text", FieldDef::scalar())
                .field("author", FieldDef::reference(Reference::one("user", Noop)))
                .build(),
        )
        .build()
}
