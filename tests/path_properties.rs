//! Behavioural checks for path access and the observable store.

use per_form::path::{get, set, unset};
use per_form::{set_observable, unset_observable, Store};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_set_then_get_returns_value() {
    for path in ["a", "a.b.c", "list[2].name", "matrix[0][1]", "x.0.y"] {
        let mut root = json!({});
        set(&mut root, path, json!("v"));
        assert_eq!(get(&root, path), Some(&json!("v")), "path {path}");
    }
}

#[test]
fn test_set_fills_array_holes_with_null() {
    let mut root = json!({});
    set(&mut root, "list[2]", json!(1));
    assert_eq!(root, json!({"list": [null, null, 1]}));
}

#[test]
fn test_unset_is_idempotent_and_prunes() {
    let mut root = json!({"a": {"b": {"c": 1}}, "keep": true});
    unset(&mut root, "a.b.c");
    let once = root.clone();
    unset(&mut root, "a.b.c");
    assert_eq!(root, once);
    assert_eq!(root, json!({"keep": true}));
}

#[test]
fn test_forbidden_segments_are_refused() {
    for path in ["__proto__.polluted", "a.constructor.x", "prototype"] {
        let mut root = json!({});
        set(&mut root, path, json!(true));
        assert_eq!(root, json!({}), "path {path}");
    }
}

#[test]
fn test_observable_set_and_unset_mirror_plain_paths() {
    let store = Store::new(json!({}));
    let root = store.root();
    let mut plain = json!({});

    for (path, value) in [("user.name", json!("John")), ("tags[1]", json!("b")), ("user.age", json!(30))] {
        set_observable(&root, path, value.clone());
        set(&mut plain, path, value);
    }
    assert_eq!(root.peek(), Some(plain.clone()));

    unset_observable(&root, "user.name");
    unset(&mut plain, "user.name");
    assert_eq!(root.peek(), Some(plain));
}

#[test]
fn test_batch_produces_one_wave() {
    let store = Store::new(json!({"a": 0, "b": 0}));
    let waves = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&waves);
    let _sub = store.root().subscribe(move |_: Option<Value>| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.batch(|| {
        store.root().child("a").set(json!(1));
        store.batch(|| store.root().child("b").set(json!(2)));
        set_observable(&store.root(), "c.d", json!(3));
    });

    assert_eq!(waves.load(Ordering::SeqCst), 1);
    assert_eq!(store.snapshot(), json!({"a": 1, "b": 2, "c": {"d": 3}}));
}

#[test]
fn test_unset_keeps_user_nulls_in_arrays() {
    let mut root = json!({"list": [null, "x"], "keep": 1});
    unset(&mut root, "list[1]");
    assert_eq!(root, json!({"list": [null, null], "keep": 1}));

    let store = Store::new(json!({"list": [null, "x"], "keep": 1}));
    unset_observable(&store.root(), "list[1]");
    assert_eq!(store.snapshot(), json!({"list": [null, null], "keep": 1}));
}

#[test]
fn test_oversized_array_index_is_refused() {
    let mut root = json!({});
    set(&mut root, "items[18446744073709551615]", json!(1));
    set(&mut root, "items[4000000000]", json!(1));
    assert_eq!(root, json!({}));

    let store = Store::new(json!({}));
    assert!(set_observable(&store.root(), "items[18446744073709551615]", json!(1)).is_none());
    assert_eq!(store.snapshot(), json!({}));
}
