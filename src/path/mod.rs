//! Path-addressed access to nested value graphs
//!
//! `get`, `set` and `unset` operate on plain `serde_json::Value` trees. The
//! observable counterparts live in [`crate::store`] and share the tokenizer in
//! [`segment`].

mod get;
mod mutate;
mod segment;

pub use get::{get, get_or, get_path};
pub use mutate::{set, set_path, unset, unset_path, unset_with, Prune, MAX_ARRAY_GAP};
pub(crate) use mutate::{get_path_mut, within_array_gap};
pub use segment::{Path, Seg};

use serde_json::Value;

/// Returns true for objects and arrays.
pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Returns true for `{}`.
pub fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

/// Returns true for an array with no slots, or only `null` slots.
pub fn is_empty_array(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.iter().all(Value::is_null))
}

/// An object without keys, or an array holding nothing but holes.
pub fn is_empty_container(value: &Value) -> bool {
    is_empty_object(value) || is_empty_array(value)
}

/// Boolean coercion used for mirror-tree presence checks.
///
/// `null`, `false`, `0` and `""` are falsy; containers are always truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A fresh empty container suited to hold `next`.
pub(crate) fn container_for(next: &Seg) -> Value {
    if next.is_index() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Default::default())
    }
}

/// Read one level down. Index segments address object keys too.
pub(crate) fn child<'a>(value: &'a Value, seg: &Seg) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(seg.as_key().as_ref()),
        Value::Array(items) => seg.as_index().and_then(|i| items.get(i)),
        _ => None,
    }
}

pub(crate) fn child_mut<'a>(value: &'a mut Value, seg: &Seg) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(seg.as_key().as_ref()),
        Value::Array(items) => seg.as_index().and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}
