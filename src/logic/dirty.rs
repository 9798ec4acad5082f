//! Dirty mirror computation

use crate::config::empty_object;
use serde_json::{Map, Value};

/// Diff `values` against `defaults` into a boolean mirror tree.
///
/// A path is present (and `true`) exactly when the value there differs from
/// the default. Equal subtrees are pruned; inside arrays an equal element
/// leaves a `null` hole so sibling indices line up with the value tree.
pub fn get_dirty_fields(defaults: &Value, values: &Value) -> Value {
    diff(Some(defaults), Some(values)).unwrap_or_else(empty_object)
}

fn diff(default: Option<&Value>, value: Option<&Value>) -> Option<Value> {
    if default == value {
        return None;
    }
    match (default, value) {
        (Some(Value::Object(default)), Some(Value::Object(value))) => {
            let mut dirty = Map::new();
            for key in default.keys().chain(value.keys()) {
                if dirty.contains_key(key) {
                    continue;
                }
                if let Some(entry) = diff(default.get(key), value.get(key)) {
                    dirty.insert(key.clone(), entry);
                }
            }
            (!dirty.is_empty()).then_some(Value::Object(dirty))
        }
        (Some(Value::Array(default)), Some(Value::Array(value))) => {
            let len = default.len().max(value.len());
            let slots: Vec<Value> = (0..len)
                .map(|i| diff(default.get(i), value.get(i)).unwrap_or(Value::Null))
                .collect();
            slots.iter().any(|slot| !slot.is_null()).then_some(Value::Array(slots))
        }
        (_, Some(value)) => Some(mark_all(value)),
        (Some(_), None) => Some(Value::Bool(true)),
        (None, None) => None,
    }
}

/// Mark every leaf of `value` dirty. Used when the default has a different
/// shape, so that each path below reads as dirty.
fn mark_all(value: &Value) -> Value {
    match value {
        Value::Object(map) if !map.is_empty() => Value::Object(
            map.iter()
                .map(|(key, entry)| (key.clone(), mark_all(entry)))
                .collect(),
        ),
        Value::Array(items) if !items.is_empty() => {
            Value::Array(items.iter().map(mark_all).collect())
        }
        _ => Value::Bool(true),
    }
}
