//! Path accessor and mutators over observable nodes
//!
//! Same tokenizer and rules as [`crate::path`], but every read goes through
//! [`Node::with`] and every write through the node's `set`/`delete`.

use super::Node;
use crate::path::{container_for, within_array_gap, Path, Prune, Seg};
use serde_json::Value;

/// Resolve `path` below `root` to a node view.
///
/// Returns `None` for an empty path. When nothing lives at the walked path
/// but `root` holds the literal path string as a key, that key's node is
/// returned instead.
pub fn get_observable(root: &Node, path: &str) -> Option<Node> {
    if path.is_empty() {
        return None;
    }
    let parsed = Path::parse(path);
    let literal = || root.child(Seg::Key(path.to_string()));
    if parsed.is_empty() {
        return Some(literal());
    }

    let walked = root.at(&parsed);
    if !walked.exists() && root.with(|value| has_literal_key(value, path)) {
        return Some(literal());
    }
    Some(walked)
}

fn has_literal_key(value: Option<&Value>, key: &str) -> bool {
    matches!(value, Some(Value::Object(map)) if map.contains_key(key))
}

/// Write `value` at `path` below `root`, creating intermediate containers.
/// All writes land in one notification wave.
///
/// Returns the leaf node, or `None` when the path is empty or goes through a
/// forbidden segment (in which case nothing is written).
pub fn set_observable(root: &Node, path: &str, value: Value) -> Option<Node> {
    set_observable_path(root, &Path::parse(path), value)
}

pub(crate) fn set_observable_path(root: &Node, path: &Path, value: Value) -> Option<Node> {
    if path.contains_forbidden() {
        tracing::debug!(%path, "refusing observable write through a forbidden path segment");
        return None;
    }
    let segments = path.segments();
    let (last, parents) = segments.split_last()?;
    if !root.with(|value| within_array_gap(value.unwrap_or(&Value::Null), segments)) {
        tracing::debug!(%path, "refusing observable write that would open too wide an array gap");
        return None;
    }

    root.store().batch(|| {
        let mut node = root.clone();
        for (i, seg) in parents.iter().enumerate() {
            let child = node.child(seg.clone());
            if !child.is_container() {
                child.set(container_for(&segments[i + 1]));
            }
            node = child;
        }

        let leaf = node.child(last.clone());
        leaf.set(value);
        Some(leaf)
    })
}

/// Remove the value at `path` below `root` and prune emptied objects above
/// it.
///
/// Array slots become `null` instead of being spliced out; objects lose the
/// key. Pruning stops at arrays and at the first non-empty ancestor, and
/// never removes `root` itself.
pub fn unset_observable<'a>(root: &'a Node, path: &str) -> &'a Node {
    unset_observable_with(root, path, Prune::Objects)
}

/// [`unset_observable`] with an explicit pruning mode.
pub fn unset_observable_with<'a>(root: &'a Node, path: &str, prune: Prune) -> &'a Node {
    unset_observable_path(root, &Path::parse(path), prune);
    root
}

pub(crate) fn unset_observable_path(root: &Node, path: &Path, prune: Prune) {
    root.store().batch(|| prune_path(root, path, prune));
}

fn prune_path(root: &Node, path: &Path, prune: Prune) {
    if path.contains_forbidden() {
        return;
    }
    let Some((last, parents)) = path.segments().split_last() else {
        return;
    };

    let parent = root.at(&Path::from_segments(parents.to_vec()));
    let target = parent.child(last.clone());
    let parent_kind = parent.with(|value| match value {
        Some(Value::Array(_)) => Some(true),
        Some(Value::Object(_)) => Some(false),
        _ => None,
    });
    match parent_kind {
        Some(true) if target.exists() => target.set(Value::Null),
        Some(false) if target.exists() => target.delete(),
        _ => {}
    }

    let Some((_, above)) = parents.split_last() else {
        return;
    };
    let held_by_array = root
        .at(&Path::from_segments(above.to_vec()))
        .with(|value| matches!(value, Some(Value::Array(_))));
    if parent.with(|value| prune.removes(value, held_by_array)) {
        prune_path(root, &Path::from_segments(parents.to_vec()), prune);
    }
}
