//! Deep read and write over trees of objects and arrays.
//!
//! Arrays are transparent to both operations: a path segment applied to an
//! array applies to each element, which is how one-to-many links are walked.

use serde_json::Value;

/// Collect every value living at `path`, flattening arrays on the way.
///
/// Missing keys and `null`s contribute nothing. A non-array value at the end
/// of the path contributes itself, an array contributes its elements.
pub fn collect(target: &Value, path: &[String]) -> Vec<Value> {
    let mut out = Vec::new();
    collect_into(target, path, &mut out);
    out
}

/// [`collect`] over a whole collection.
pub fn collect_all(targets: &[Value], path: &[String]) -> Vec<Value> {
    let mut out = Vec::new();
    for target in targets {
        collect_into(target, path, &mut out);
    }
    out
}

fn collect_into(target: &Value, path: &[String], out: &mut Vec<Value>) {
    match target {
        Value::Array(items) => {
            for item in items {
                collect_into(item, path, out);
            }
        }
        Value::Null => {}
        Value::Object(map) => match path.split_first() {
            None => out.push(target.clone()),
            Some((key, rest)) => {
                if let Some(child) = map.get(key) {
                    collect_into(child, rest, out);
                }
            }
        },
        scalar => {
            if path.is_empty() {
                out.push(scalar.clone());
            }
        }
    }
}

/// Rebuild `target` with `update` applied to the entities at `path`.
///
/// `update` receives the entities found at the end of the path: a whole
/// array at once, or a single entity wrapped in a one-element vector, and
/// its return value replaces them. Paths through missing keys, `null`s or
/// scalars are left untouched.
pub fn update_by_path<F>(target: Value, path: &[String], update: &mut F) -> Value
where
    F: FnMut(Vec<Value>) -> Vec<Value>,
{
    match path.split_first() {
        Some((key, rest)) => match target {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| update_by_path(item, path, update))
                    .collect(),
            ),
            Value::Object(mut map) => {
                if let Some(child) = map.get_mut(key) {
                    let current = child.take();
                    *child = update_by_path(current, rest, update);
                }
                Value::Object(map)
            }
            other => other,
        },
        None => match target {
            Value::Array(items) => Value::Array(update(items)),
            Value::Null => Value::Null,
            single => update(vec![single])
                .into_iter()
                .next()
                .unwrap_or(Value::Null),
        },
    }
}
