//! Path mutators over plain value graphs: `set` and `unset`

use super::{child, child_mut, container_for, is_container, is_empty_container, is_empty_object, Path, Seg};
use serde_json::Value;

/// Write `value` at `path`, synthesizing intermediate containers.
///
/// An intermediate that is missing or not a container is replaced with `[]`
/// when the following segment is an index and `{}` otherwise. Paths that
/// contain `__proto__`, `constructor` or `prototype` are refused without
/// touching the graph.
pub fn set<'a>(root: &'a mut Value, path: &str, value: Value) -> &'a mut Value {
    set_path(root, &Path::parse(path), value);
    root
}

/// [`set`] over a tokenized path. Returns false when the write was refused.
pub fn set_path(root: &mut Value, path: &Path, value: Value) -> bool {
    if path.contains_forbidden() {
        tracing::debug!(%path, "refusing write through a forbidden path segment");
        return false;
    }
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };
    if !within_array_gap(root, segments) {
        tracing::debug!(%path, "refusing write that would open too wide an array gap");
        return false;
    }

    if !is_container(root) {
        *root = container_for(&segments[0]);
    }

    let mut current = root;
    for (i, seg) in parents.iter().enumerate() {
        let slot = match slot_mut(current, seg) {
            Some(slot) => slot,
            None => return false,
        };
        if !is_container(slot) {
            *slot = container_for(&segments[i + 1]);
        }
        current = slot;
    }

    match slot_mut(current, last) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Most `null` holes a single write may open past the end of an array.
pub const MAX_ARRAY_GAP: usize = 10_000;

/// Returns false when writing along `segments` would pad some array with
/// more than [`MAX_ARRAY_GAP`] holes.
pub(crate) fn within_array_gap(root: &Value, segments: &[Seg]) -> bool {
    let mut current = Some(root);
    for seg in segments {
        if let Some(index) = seg.as_index() {
            let len = match current {
                Some(Value::Object(_)) => None,
                Some(Value::Array(items)) => Some(items.len()),
                _ => Some(0),
            };
            if len.is_some_and(|len| index.saturating_sub(len) > MAX_ARRAY_GAP) {
                return false;
            }
        }
        current = current.and_then(|value| child(value, seg));
    }
    true
}

/// How [`unset_with`] treats ancestors a removal leaves empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prune {
    /// Drop emptied objects, but stop at arrays: a `null` element may be
    /// data rather than a hole.
    #[default]
    Objects,
    /// Also drop arrays holding nothing but `null`. Suits mirror trees,
    /// where `null` only ever marks a removed slot.
    Holes,
}

impl Prune {
    /// Whether an ancestor left as `emptied` should go too.
    pub(crate) fn removes(self, emptied: Option<&Value>, held_by_array: bool) -> bool {
        let Some(emptied) = emptied else {
            return false;
        };
        match self {
            Prune::Holes => is_empty_container(emptied),
            Prune::Objects => is_empty_object(emptied) && !held_by_array,
        }
    }
}

/// Remove the value at `path` and prune emptied objects above it.
///
/// Object keys are deleted. Array slots are overwritten with `null` so that
/// sibling indices never move. The root itself is never removed.
pub fn unset<'a>(root: &'a mut Value, path: &str) -> &'a mut Value {
    unset_with(root, path, Prune::Objects)
}

/// [`unset`] with an explicit pruning mode.
pub fn unset_with<'a>(root: &'a mut Value, path: &str, prune: Prune) -> &'a mut Value {
    unset_path(root, &Path::parse(path), prune);
    root
}

/// [`unset_with`] over a tokenized path.
pub fn unset_path(root: &mut Value, path: &Path, prune: Prune) {
    if path.contains_forbidden() {
        tracing::debug!(%path, "refusing unset through a forbidden path segment");
        return;
    }
    let Some((last, parents)) = path.segments().split_last() else {
        return;
    };

    match get_path_mut(root, parents) {
        Some(parent) => remove_slot(parent, last),
        None => return,
    }

    let Some((_, above)) = parents.split_last() else {
        return;
    };
    let held_by_array = matches!(lookup(root, above), Some(Value::Array(_)));
    if prune.removes(lookup(root, parents), held_by_array) {
        unset_path(root, &Path::from_segments(parents.to_vec()), prune);
    }
}

/// Mutable slot for `seg`, created (as `null`) when missing. Arrays are padded
/// with holes up to the requested index.
fn slot_mut<'a>(container: &'a mut Value, seg: &Seg) -> Option<&'a mut Value> {
    match container {
        Value::Object(map) => Some(map.entry(seg.as_key().into_owned()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = seg.as_index()?;
            if index >= items.len() {
                if index - items.len() > MAX_ARRAY_GAP {
                    return None;
                }
                items.resize(index.checked_add(1)?, Value::Null);
            }
            items.get_mut(index)
        }
        _ => None,
    }
}

fn lookup<'a>(root: &'a Value, segments: &[Seg]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |value, seg| child(value, seg))
}

pub(crate) fn get_path_mut<'a>(root: &'a mut Value, segments: &[Seg]) -> Option<&'a mut Value> {
    let mut current = root;
    for seg in segments {
        current = child_mut(current, seg)?;
    }
    Some(current)
}

fn remove_slot(parent: &mut Value, seg: &Seg) {
    match parent {
        Value::Object(map) => {
            map.remove(seg.as_key().as_ref());
        }
        Value::Array(items) => {
            if let Some(slot) = seg.as_index().and_then(|i| items.get_mut(i)) {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::get;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    mod set_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_set_existing_nested_value() {
            let mut root = json!({"user": {"profile": {"name": "John", "age": 30}}});
            set(&mut root, "user.profile.name", json!("Doe"));
            assert_eq!(root, json!({"user": {"profile": {"name": "Doe", "age": 30}}}));
        }

        #[test]
        fn test_set_creates_objects_for_key_segments() {
            let mut root = json!({});
            set(&mut root, "a.b.c", json!(1));
            assert_eq!(root, json!({"a": {"b": {"c": 1}}}));
        }

        #[test]
        fn test_set_creates_arrays_for_index_segments() {
            let mut root = json!({});
            set(&mut root, "items[1].name", json!("second"));
            assert_eq!(root, json!({"items": [null, {"name": "second"}]}));
        }

        #[test]
        fn test_set_replaces_primitive_intermediate() {
            let mut root = json!({"a": "text"});
            set(&mut root, "a.b", json!(true));
            assert_eq!(root, json!({"a": {"b": true}}));
        }

        #[test]
        fn test_set_refuses_proto_pollution() {
            let mut root = json!({});
            set(&mut root, "__proto__.polluted", json!(true));
            assert_eq!(root, json!({}));
            set(&mut root, "a.constructor.prototype.x", json!(1));
            assert_eq!(root, json!({}));
        }

        #[test]
        fn test_set_then_get_round_trip() {
            let mut root = json!({"list": [1, 2, 3]});
            let values = [json!(7), json!([1, "two"]), json!({"deep": {"x": null}})];
            for value in values {
                set(&mut root, "list[2].inner", value.clone());
                assert_eq!(get(&root, "list[2].inner"), Some(&value));
            }
        }

        #[test]
        fn test_set_empty_path_is_noop() {
            let mut root = json!({"a": 1});
            assert!(!set_path(&mut root, &Path::parse(""), json!(2)));
            assert_eq!(root, json!({"a": 1}));
        }

        #[test]
        fn test_set_refuses_huge_index() {
            let mut root = json!({});
            assert!(!set_path(&mut root, &Path::parse("items[18446744073709551615]"), json!(1)));
            assert!(!set_path(&mut root, &Path::parse("items[4000000000].name"), json!(1)));
            assert_eq!(root, json!({}));
        }

        #[test]
        fn test_set_allows_gap_up_to_limit() {
            let mut root = json!({"items": [1]});
            let path = format!("items[{}]", 1 + MAX_ARRAY_GAP);
            assert!(set_path(&mut root, &Path::parse(&path), json!(2)));
            assert_eq!(root["items"].as_array().map(Vec::len), Some(MAX_ARRAY_GAP + 2));

            let path = format!("items[{}]", MAX_ARRAY_GAP * 3);
            assert!(!set_path(&mut root, &Path::parse(&path), json!(3)));
        }

        #[test]
        fn test_set_key_on_array_is_refused() {
            let mut root = json!({"list": [1]});
            assert!(!set_path(&mut root, &Path::parse("list.name"), json!(2)));
            assert_eq!(root, json!({"list": [1]}));
        }
    }

    mod unset_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_unset_array_leaves_holes() {
            let mut root = json!(["test", "test1", "test2"]);
            unset(&mut root, "[0]");
            assert_eq!(root, json!([null, "test1", "test2"]));
            unset(&mut root, "[1]");
            assert_eq!(root, json!([null, null, "test2"]));
            unset(&mut root, "[2]");
            assert_eq!(root, json!([null, null, null]));
        }

        #[test]
        fn test_unset_empty_path_returns_original() {
            let mut root = json!({"test": "test"});
            unset(&mut root, "");
            assert_eq!(root, json!({"test": "test"}));
        }

        #[test]
        fn test_unset_flat_key() {
            let mut root = json!({"test": "test"});
            unset(&mut root, "test");
            assert_eq!(root, json!({}));
        }

        #[test]
        fn test_unset_missing_path_is_noop() {
            let mut root = json!({"test": {"test1": "test"}});
            unset(&mut root, "testDummy.test1");
            assert_eq!(root, json!({"test": {"test1": "test"}}));
        }

        #[test]
        fn test_unset_prunes_empty_ancestors() {
            let mut root = json!({"test": {"bill": {"min": "test"}}});
            unset(&mut root, "test.bill.min");
            assert_eq!(root, json!({}));
        }

        #[test]
        fn test_unset_keeps_siblings() {
            let mut root = json!({
                "test": {
                    "bill": {"min": [{"deep": {"data": {"firstName": "test"}}}]},
                    "test": "ha"
                }
            });
            unset_with(&mut root, "test.bill.min[0].deep", Prune::Holes);
            assert_eq!(root, json!({"test": {"test": "ha"}}));
        }

        #[test]
        fn test_unset_object_in_array_prunes_array() {
            let mut root = json!({"test": [{"min": "required"}]});
            unset_with(&mut root, "test[0].min", Prune::Holes);
            assert_eq!(root, json!({}));
        }

        #[test]
        fn test_unset_keeps_null_elements() {
            let mut root = json!({"list": [null, "x"], "keep": 1});
            unset(&mut root, "list[1]");
            assert_eq!(root, json!({"list": [null, null], "keep": 1}));
        }

        #[test]
        fn test_unset_stops_pruning_at_arrays() {
            let mut root = json!({"rows": [{"cell": 1}], "other": true});
            unset(&mut root, "rows[0].cell");
            assert_eq!(root, json!({"rows": [{}], "other": true}));
        }

        #[test]
        fn test_unset_holes_mode_drops_null_only_arrays() {
            let mut root = json!({"list": [null, "x"], "keep": 1});
            unset_with(&mut root, "list[1]", Prune::Holes);
            assert_eq!(root, json!({"keep": 1}));
        }

        #[test]
        fn test_unset_array_element_keeps_length() {
            let mut root = json!({"list": [{"a": 1}, {"b": 2}, {"c": 3}]});
            unset(&mut root, "list[1]");
            assert_eq!(root, json!({"list": [{"a": 1}, null, {"c": 3}]}));
            assert_eq!(root["list"].as_array().map(Vec::len), Some(3));
        }

        #[test]
        fn test_unset_is_idempotent() {
            let mut once = json!({"a": {"b": 1, "c": 2}, "d": [1, 2]});
            unset(&mut once, "a.b");
            unset(&mut once, "d[0]");
            let mut twice = once.clone();
            unset(&mut twice, "a.b");
            unset(&mut twice, "d[0]");
            assert_eq!(once, twice);
        }

        #[test]
        fn test_unset_never_removes_root() {
            let mut root = json!({"only": 1});
            unset(&mut root, "only");
            assert_eq!(root, json!({}));
        }

        #[test]
        fn test_unset_refuses_forbidden_segments() {
            let mut root = json!({"constructor": 1});
            unset(&mut root, "constructor");
            assert_eq!(root, json!({"constructor": 1}));
        }
    }
}
