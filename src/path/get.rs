//! Path accessor over plain value graphs

use super::{child, is_container, Path};
use serde_json::Value;

/// Resolve a string path against `root`.
///
/// Returns `None` when the path is empty, when `root` is not a container, or
/// when nothing lives at the path. A `null` met while descending stops the
/// walk and is returned as-is. If the walk finds nothing, the literal path
/// string is tried as a single key on `root`, so flat objects whose keys
/// contain dots or brackets still resolve.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() || !is_container(root) {
        return None;
    }

    let parsed = Path::parse(path);
    let walked = if parsed.is_empty() {
        None
    } else {
        walk(root, &parsed)
    };

    match walked {
        Some(found) => Some(found),
        None => match root {
            Value::Object(map) => map.get(path),
            _ => None,
        },
    }
}

/// [`get`] with a fallback value.
pub fn get_or<'a>(root: &'a Value, path: &str, default: &'a Value) -> &'a Value {
    get(root, path).unwrap_or(default)
}

/// Resolve an already tokenized path strictly: no literal-key fallback and
/// no `null` short-circuit. The empty path resolves to `root`.
pub fn get_path<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = root;
    for seg in path.segments() {
        current = child(current, seg)?;
    }
    Some(current)
}

fn walk<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = root;
    for seg in path.segments() {
        if current.is_null() {
            return Some(current);
        }
        current = child(current, seg)?;
    }
    Some(current)
}
