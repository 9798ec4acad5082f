//! Path-addressed views into a [`Store`]

use super::{tracking, Store, Subscription};
use crate::path::{get_path, get_path_mut, is_container, set_path, Path, Seg};
use serde_json::Value;

/// A view of the value at one path of a store.
///
/// Nodes carry no state of their own: reading or writing through a node is
/// the same as addressing the store root with the node's path. A node for a
/// path that does not exist yet reads as `None` and creates the path on
/// [`Node::set`].
#[derive(Clone)]
pub struct Node {
    store: Store,
    path: Path,
}

impl Node {
    pub(crate) fn new(store: Store, path: Path) -> Self {
        Self { store, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Child node one segment down.
    pub fn child(&self, seg: impl Into<Seg>) -> Node {
        Node::new(self.store.clone(), self.path.child(seg))
    }

    /// Descendant node at a relative path.
    pub fn at(&self, relative: &Path) -> Node {
        Node::new(self.store.clone(), self.path.join(relative))
    }

    /// Read the current value, registering a dependency for a running
    /// observer.
    pub fn get(&self) -> Option<Value> {
        tracking::record(self.store.id, &self.path);
        self.peek()
    }

    /// Read the current value without registering a dependency.
    pub fn peek(&self) -> Option<Value> {
        self.with(|value| value.cloned())
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(Option<&Value>) -> R) -> R {
        self.store.read(|root| f(get_path(root, &self.path)))
    }

    pub fn exists(&self) -> bool {
        self.with(|value| value.is_some())
    }

    /// Replace the value. Writing an equal value is a no-op and notifies
    /// nobody.
    pub fn set(&self, value: Value) {
        let path = &self.path;
        self.store.write(path, |root| {
            if get_path(root, path) == Some(&value) {
                return false;
            }
            if path.is_empty() {
                *root = value;
                return true;
            }
            set_path(root, path, value)
        });
    }

    /// Remove the value from its parent. Object keys are deleted; array
    /// elements are spliced out. Deleting the root nulls it.
    pub fn delete(&self) {
        let (Some(parent), Some(last)) = (self.path.parent(), self.path.last().cloned()) else {
            self.set(Value::Null);
            return;
        };
        self.store.write(&parent, |root| {
            match get_path_mut(root, parent.segments()) {
                Some(Value::Object(map)) => map.remove(last.as_key().as_ref()).is_some(),
                Some(Value::Array(items)) => match last.as_index() {
                    Some(index) if index < items.len() => {
                        items.remove(index);
                        true
                    }
                    _ => false,
                },
                _ => false,
            }
        });
    }

    /// Edit the value in place. `f` sees `null` when the path does not exist.
    pub fn modify(&self, f: impl FnOnce(&mut Value)) {
        let mut value = self.peek().unwrap_or(Value::Null);
        f(&mut value);
        self.set(value);
    }

    /// Append `items` to the array at this path. A missing or non-array
    /// value is replaced by a new array first.
    pub fn push(&self, items: Vec<Value>) {
        self.insert(usize::MAX, items);
    }

    /// Insert `items` before `index`, clamped to the array length, in one
    /// write.
    pub fn insert(&self, index: usize, items: Vec<Value>) {
        if items.is_empty() {
            return;
        }
        let path = &self.path;
        self.store.write(path, |root| {
            let is_array = matches!(get_path(root, path), Some(Value::Array(_)));
            if !is_array && !set_path(root, path, Value::Array(Vec::new())) {
                return false;
            }
            match get_path_mut(root, path.segments()) {
                Some(Value::Array(array)) => {
                    let at = index.min(array.len());
                    array.splice(at..at, items);
                    true
                }
                _ => false,
            }
        });
    }

    /// Remove and return the element at `index`, shifting later elements
    /// down.
    pub fn remove_at(&self, index: usize) -> Option<Value> {
        let path = &self.path;
        let mut removed = None;
        self.store.write(path, |root| match get_path_mut(root, path.segments()) {
            Some(Value::Array(array)) if index < array.len() => {
                removed = Some(array.remove(index));
                true
            }
            _ => false,
        });
        removed
    }

    pub fn is_container(&self) -> bool {
        self.with(|value| value.is_some_and(is_container))
    }

    /// Number of slots when the value is an array, otherwise zero.
    pub fn array_len(&self) -> usize {
        self.with(|value| value.and_then(Value::as_array).map_or(0, Vec::len))
    }

    /// Invoke `callback` with the node's new value after every notification
    /// wave that touches this path, an ancestor, or a descendant.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<Value>) + Send + Sync + 'static,
    {
        let weak = self.store.downgrade();
        let path = self.path.clone();
        self.store
            .subscribe_paths(vec![self.path.clone()], move || {
                if let Some(store) = weak.upgrade() {
                    callback(Node::new(store, path.clone()).peek());
                }
            })
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("store", &self.store.id)
            .field("path", &self.path.to_string())
            .finish()
    }
}
