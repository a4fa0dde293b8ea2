//! In-memory blog store and schema shared by the integration tests.
//!
//! Three users, two posts and three comments. Accessors join by id the way
//! a database-backed accessor would, and count every `get` so tests can
//! assert on batching.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::bail;
use async_trait::async_trait;
use pineql::{Context, FieldDef, RefAccessor, Reference, Schema, Shape, TypeDef};
use serde_json::{json, Value};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pineql=debug")
        .with_test_writer()
        .try_init();
}

/// Rows plus call bookkeeping.
#[derive(Default)]
pub struct BlogStore {
    pub users: Vec<Value>,
    pub posts: Vec<Value>,
    pub comments: Vec<Value>,
    offline: AtomicBool,
    fetches: AtomicUsize,
    calls: Mutex<Vec<(String, usize)>>,
}

impl BlogStore {
    pub fn seeded() -> Arc<Self> {
        Arc::new(Self {
            users: vec![
                json!({"id": 1, "username": "admin", "friends": []}),
                json!({"id": 2, "username": "jack", "friends": [3]}),
                json!({"id": 3, "username": "bob", "friends": [2]}),
            ],
            posts: vec![
                json!({
                    "id": 1,
                    "title": "Hello",
                    "intro": "Hello world",
                    "text": "Hello World\n This is simple post",
                    "author": 1,
                    "lastComment": 3
                }),
                json!({
                    "id": 2,
                    "title": "Post #2",
                    "intro": "Second post",
                    "text": "This is the second post",
                    "author": 2,
                    "lastComment": null
                }),
            ],
            comments: vec![
                json!({"id": 1, "post": 1, "text": "Wow", "author": 2}),
                json!({"id": 2, "post": 1, "text": "Foo", "author": 3}),
                json!({"id": 3, "post": 1, "text": "This is awesome!", "author": 1}),
            ],
            ..Self::default()
        })
    }

    pub fn post(&self, id: i64) -> Value {
        find(&self.posts, &json!(id))
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// `(accessor, parent count)` per `get`, in call order.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, accessor: &str, parents: usize) -> anyhow::Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            bail!("blog store is offline");
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((accessor.to_string(), parents));
        }
        Ok(())
    }
}

/// Id of a raw id or of an already embedded entity.
pub fn id_of(value: &Value) -> &Value {
    value.get("id").unwrap_or(value)
}

fn find(rows: &[Value], id: &Value) -> Value {
    rows.iter()
        .find(|row| id_of(row) == id_of(id))
        .cloned()
        .unwrap_or(Value::Null)
}

fn index(rows: &[Value]) -> HashMap<String, Value> {
    rows.iter()
        .map(|row| (id_of(row).to_string(), row.clone()))
        .collect()
}

/// Single or list field holding ids of `table` rows.
struct ById {
    name: &'static str,
    field: &'static str,
    table: fn(&BlogStore) -> &[Value],
    store: Arc<BlogStore>,
}

#[async_trait]
impl RefAccessor for ById {
    async fn get(&self, _ctx: &Context, parents: &[Value]) -> anyhow::Result<Vec<Value>> {
        self.store.record(self.name, parents.len())?;

        let mut ids: Vec<&Value> = Vec::new();
        for parent in parents {
            match parent.get(self.field) {
                Some(Value::Array(items)) => ids.extend(items.iter().map(id_of)),
                Some(Value::Null) | None => {}
                Some(id) => ids.push(id_of(id)),
            }
        }

        Ok((self.table)(self.store.as_ref())
            .iter()
            .filter(|row| ids.contains(&id_of(row)))
            .cloned()
            .collect())
    }

    fn set(&self, _ctx: &Context, parents: Vec<Value>, fetched: &[Value]) -> Vec<Value> {
        let index = index(fetched);
        let lookup = |id: &Value| index.get(&id_of(id).to_string()).cloned().unwrap_or(Value::Null);

        parents
            .into_iter()
            .map(|mut parent| {
                if let Some(slot) = parent.get_mut(self.field) {
                    *slot = match slot.take() {
                        Value::Array(ids) => Value::Array(ids.iter().map(&lookup).collect()),
                        Value::Null => Value::Null,
                        id => lookup(&id),
                    };
                }
                parent
            })
            .collect()
    }
}

/// Rows of `table` whose `fk` points back at the parent.
struct Owned {
    name: &'static str,
    field: &'static str,
    fk: &'static str,
    table: fn(&BlogStore) -> &[Value],
    store: Arc<BlogStore>,
}

#[async_trait]
impl RefAccessor for Owned {
    async fn get(&self, _ctx: &Context, parents: &[Value]) -> anyhow::Result<Vec<Value>> {
        self.store.record(self.name, parents.len())?;

        let ids: Vec<&Value> = parents.iter().map(id_of).collect();
        Ok((self.table)(self.store.as_ref())
            .iter()
            .filter(|row| row.get(self.fk).is_some_and(|fk| ids.contains(&id_of(fk))))
            .cloned()
            .collect())
    }

    fn set(&self, _ctx: &Context, parents: Vec<Value>, fetched: &[Value]) -> Vec<Value> {
        parents
            .into_iter()
            .map(|mut parent| {
                let owner = id_of(&parent).clone();
                let children: Vec<Value> = fetched
                    .iter()
                    .filter(|row| row.get(self.fk).is_some_and(|fk| id_of(fk) == &owner))
                    .cloned()
                    .collect();
                if let Value::Object(map) = &mut parent {
                    map.insert(self.field.to_string(), Value::Array(children));
                }
                parent
            })
            .collect()
    }
}

fn by_id(
    store: &Arc<BlogStore>,
    name: &'static str,
    field: &'static str,
    table: fn(&BlogStore) -> &[Value],
) -> ById {
    ById {
        name,
        field,
        table,
        store: Arc::clone(store),
    }
}

fn users(store: &BlogStore) -> &[Value] {
    &store.users
}

fn posts(store: &BlogStore) -> &[Value] {
    &store.posts
}

fn comments(store: &BlogStore) -> &[Value] {
    &store.comments
}

fn type_tag(name: &str) -> FieldDef {
    FieldDef::scalar().default_value(name).required()
}

fn is_author() -> FieldDef {
    FieldDef::computed(|ctx, entity, _, _| {
        let author = entity.get("author").map(id_of);
        json!(author.is_some() && author == ctx.get("actor"))
    })
}

pub fn blog_schema(store: &Arc<BlogStore>) -> Schema {
    Schema::builder()
        .shape(
            "post",
            Shape::builder()
                .field("$type", type_tag("post"))
                .field("id", FieldDef::scalar().required())
                .field("title", FieldDef::scalar().required())
                .field("intro", FieldDef::scalar())
                .field("text", FieldDef::scalar())
                .field("isAuthor", is_author())
                .field(
                    "author",
                    FieldDef::reference(Reference::one(
                        "user",
                        by_id(store, "post.author", "author", users),
                    )),
                )
                .field(
                    "comments",
                    FieldDef::reference(Reference::many(
                        "comment",
                        Owned {
                            name: "post.comments",
                            field: "comments",
                            fk: "post",
                            table: comments,
                            store: Arc::clone(store),
                        },
                    )),
                )
                .field(
                    "lastComment",
                    FieldDef::reference(Reference::one(
                        "comment",
                        by_id(store, "post.lastComment", "lastComment", comments),
                    )),
                )
                .build(),
        )
        .alias("usePost", "post")
        .shape(
            "user",
            Shape::builder()
                .field("$type", type_tag("user"))
                .field("id", FieldDef::scalar().required())
                .field("username", FieldDef::scalar())
                .field(
                    "friends",
                    FieldDef::reference(Reference::many(
                        "user",
                        by_id(store, "user.friends", "friends", users),
                    )),
                )
                .field(
                    "posts",
                    FieldDef::reference(Reference::many(
                        "post",
                        Owned {
                            name: "user.posts",
                            field: "posts",
                            fk: "author",
                            table: posts,
                            store: Arc::clone(store),
                        },
                    )),
                )
                .build(),
        )
        .shape(
            "comment",
            Shape::builder()
                .field("$type", type_tag("comment"))
                .field("id", FieldDef::scalar().required())
                .field("text", FieldDef::scalar())
                .field("isAuthor", is_author())
                .field(
                    "author",
                    FieldDef::reference(Reference::one(
                        "user",
                        by_id(store, "comment.author", "author", users),
                    )),
                )
                .build(),
        )
        .build()
}

/// `site { blogs { sections { posts: usePost } } }`
pub fn site_type() -> TypeDef {
    TypeDef::Shape(
        Shape::builder()
            .field(
                "blogs",
                FieldDef::shape(
                    Shape::builder()
                        .field("name", FieldDef::scalar())
                        .field(
                            "sections",
                            FieldDef::shape(
                                Shape::builder()
                                    .field("posts", FieldDef::alias("usePost"))
                                    .build(),
                            ),
                        )
                        .build(),
                ),
            )
            .build(),
    )
}
