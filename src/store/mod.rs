//! Observable value store
//!
//! A [`Store`] owns one `serde_json::Value` root. Consumers address parts of
//! it through [`Node`] views, subscribe to sub-paths, and group writes with
//! [`Store::batch`] so that a logical operation produces a single
//! notification wave. Callbacks never run while the store lock is held, so a
//! callback may freely read from or write to the store.

mod node;
mod ops;
mod tracking;

pub use node::Node;
pub use ops::{get_observable, set_observable, unset_observable, unset_observable_with};
pub(crate) use ops::{set_observable_path, unset_observable_path};

use crate::path::Path;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

type Notify = Arc<dyn Fn() + Send + Sync>;

struct Listener {
    deps: Vec<Path>,
    notify: Notify,
}

struct StoreState {
    root: Value,
    batch_depth: usize,
    pending: Vec<Path>,
    listeners: BTreeMap<u64, Listener>,
    next_listener: u64,
    disposed: bool,
}

/// Shared handle to an observable value tree.
#[derive(Clone)]
pub struct Store {
    id: u64,
    state: Arc<Mutex<StoreState>>,
}

/// Non-owning store handle held by listeners, so that a listener never keeps
/// its own store alive.
#[derive(Clone)]
pub(crate) struct WeakStore {
    id: u64,
    state: Weak<Mutex<StoreState>>,
}

impl WeakStore {
    pub(crate) fn upgrade(&self) -> Option<Store> {
        self.state.upgrade().map(|state| Store { id: self.id, state })
    }
}

impl Store {
    /// Create a store from a plain snapshot.
    pub fn new(snapshot: Value) -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            state: Arc::new(Mutex::new(StoreState {
                root: snapshot,
                batch_depth: 0,
                pending: Vec::new(),
                listeners: BTreeMap::new(),
                next_listener: 0,
                disposed: false,
            })),
        }
    }

    /// The root node.
    pub fn root(&self) -> Node {
        Node::new(self.clone(), Path::root())
    }

    /// A node at `path` below the root.
    pub fn node(&self, path: impl Into<Path>) -> Node {
        Node::new(self.clone(), path.into())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn downgrade(&self) -> WeakStore {
        WeakStore {
            id: self.id,
            state: Arc::downgrade(&self.state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the current root without recording a dependency.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        let state = self.lock();
        f(&state.root)
    }

    /// Apply `f` to the root and record `changed` as written when `f` reports
    /// a change. Outside a batch the notification wave runs immediately.
    pub(crate) fn write(&self, changed: &Path, f: impl FnOnce(&mut Value) -> bool) {
        let flushed = {
            let mut state = self.lock();
            if state.disposed {
                tracing::debug!(store = self.id, path = %changed, "ignoring write to disposed store");
                return;
            }
            if !f(&mut state.root) {
                return;
            }
            state.pending.push(changed.clone());
            if state.batch_depth == 0 {
                std::mem::take(&mut state.pending)
            } else {
                Vec::new()
            }
        };
        self.flush(flushed);
    }

    /// Run `f` with notifications deferred until the outermost batch exits.
    ///
    /// Nested batches coalesce; every listener whose dependencies were
    /// touched is notified exactly once per wave.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = BatchGuard::enter(self);
        f()
    }

    /// Returns true while inside [`Store::batch`].
    pub fn is_batching(&self) -> bool {
        self.lock().batch_depth > 0
    }

    fn flush(&self, changed: Vec<Path>) {
        if changed.is_empty() {
            return;
        }
        let notifies: Vec<Notify> = {
            let state = self.lock();
            state
                .listeners
                .values()
                .filter(|listener| {
                    listener
                        .deps
                        .iter()
                        .any(|dep| changed.iter().any(|path| path.overlaps(dep)))
                })
                .map(|listener| Arc::clone(&listener.notify))
                .collect()
        };
        tracing::trace!(store = self.id, writes = changed.len(), listeners = notifies.len(), "notification wave");
        for notify in notifies {
            notify();
        }
    }

    fn next_listener_id(&self) -> u64 {
        let mut state = self.lock();
        state.next_listener += 1;
        state.next_listener
    }

    fn install(&self, id: u64, deps: Vec<Path>, notify: Notify) -> Subscription {
        let mut state = self.lock();
        if !state.disposed {
            state.listeners.insert(id, Listener { deps, notify });
        }
        Subscription {
            store: self.downgrade(),
            id,
        }
    }

    fn set_deps(&self, id: u64, deps: Vec<Path>) {
        if let Some(listener) = self.lock().listeners.get_mut(&id) {
            listener.deps = deps;
        }
    }

    /// Invoke `notify` whenever a write overlaps any of `deps`.
    pub fn subscribe_paths<F>(&self, deps: Vec<Path>, notify: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_listener_id();
        self.install(id, deps, Arc::new(notify))
    }

    /// Run `f` now and again whenever any node it read with [`Node::get`]
    /// changes. Dependencies are re-collected on every run.
    pub fn observe<F>(&self, f: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_listener_id();
        let weak = self.downgrade();
        let run: Notify = Arc::new(move || {
            let Some(store) = weak.upgrade() else {
                return;
            };
            let ((), deps) = tracking::tracked(store.id, || f());
            store.set_deps(id, deps);
        });
        let subscription = self.install(id, Vec::new(), Arc::clone(&run));
        run();
        subscription
    }

    /// Stop accepting writes and drop every listener. Later writes are
    /// silently ignored.
    pub fn dispose(&self) {
        let mut state = self.lock();
        state.disposed = true;
        state.listeners.clear();
        state.pending.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Clone of the whole root.
    pub fn snapshot(&self) -> Value {
        self.read(Value::clone)
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("id", &self.id).finish_non_exhaustive()
    }
}

struct BatchGuard<'a> {
    store: &'a Store,
}

impl<'a> BatchGuard<'a> {
    fn enter(store: &'a Store) -> Self {
        store.lock().batch_depth += 1;
        Self { store }
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        let flushed = {
            let mut state = self.store.lock();
            state.batch_depth = state.batch_depth.saturating_sub(1);
            if state.batch_depth == 0 {
                std::mem::take(&mut state.pending)
            } else {
                Vec::new()
            }
        };
        self.store.flush(flushed);
    }
}

/// Handle returned by subscribe/observe calls.
pub struct Subscription {
    store: WeakStore,
    id: u64,
}

impl Subscription {
    /// Stop receiving notifications.
    pub fn unsubscribe(self) {
        if let Some(store) = self.store.upgrade() {
            store.lock().listeners.remove(&self.id);
        }
    }

    /// Returns true while the listener is still installed.
    pub fn is_active(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.lock().listeners.contains_key(&self.id))
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
