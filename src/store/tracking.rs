//! Dependency tracking for [`super::Store::observe`]

use crate::path::Path;
use std::cell::RefCell;

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

struct Frame {
    store: u64,
    reads: Vec<Path>,
}

/// Record a tracked read, if an observer on `store` is currently running.
pub(super) fn record(store: u64, path: &Path) {
    FRAMES.with(|frames| {
        if let Some(frame) = frames.borrow_mut().last_mut() {
            if frame.store == store && !frame.reads.contains(path) {
                frame.reads.push(path.clone());
            }
        }
    });
}

/// Run `f`, returning its result and the paths it read on `store`.
pub(super) fn tracked<R>(store: u64, f: impl FnOnce() -> R) -> (R, Vec<Path>) {
    FRAMES.with(|frames| {
        frames.borrow_mut().push(Frame {
            store,
            reads: Vec::new(),
        })
    });
    let result = f();
    let reads = FRAMES
        .with(|frames| frames.borrow_mut().pop())
        .map(|frame| frame.reads)
        .unwrap_or_default();
    (result, reads)
}
