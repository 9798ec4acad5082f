//! End-to-end flows through the public API.

use per_form::{
    resolver_fn, use_controller, ControllerProps, Form, FormError, FormOptions, ResolverResult, SetValueOptions,
    TriggerOptions, ValidationMode,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Requires a non-empty `name` and an `email` containing `@`.
fn profile_form(defaults: Value, mode: ValidationMode) -> Form {
    init_tracing();
    let resolver = resolver_fn(|values: Value| async move {
        let mut errors = Map::new();
        if values["name"].as_str().unwrap_or_default().is_empty() {
            errors.insert("name".into(), json!({"type": "required", "message": "name is required"}));
        }
        if !values["email"].as_str().unwrap_or_default().contains('@') {
            errors.insert("email".into(), json!({"type": "pattern", "message": "invalid email"}));
        }
        if errors.is_empty() {
            Ok(ResolverResult::valid(values))
        } else {
            Ok(ResolverResult::invalid(Value::Object(errors)))
        }
    });
    Form::builder(
        FormOptions::default()
            .mode(mode)
            .default_values(defaults)
            .revalidate_on_value_change(false),
    )
    .resolver(resolver)
    .build()
}

#[tokio::test]
async fn test_submit_with_default_values() {
    init_tracing();
    let form = Form::new(
        FormOptions::default()
            .default_values(json!({"name": "John", "age": 30}))
            .revalidate_on_value_change(false),
    );
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);

    form.handle_submit(move |values, _| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push(values);
            Ok(())
        }
    })
    .submit(None)
    .await
    .unwrap();

    assert_eq!(*received.lock().unwrap(), vec![json!({"name": "John", "age": 30})]);
    let state = form.form_state();
    assert!(state.is_submitted);
    assert!(state.is_submit_successful);
    assert_eq!(state.submit_count, 1);
}

#[tokio::test]
async fn test_field_scoped_validation_keeps_sibling_errors() {
    let form = profile_form(json!({"name": "", "email": "nope"}), ValidationMode::OnChange);

    assert!(!form.trigger(TriggerOptions::default()).await.unwrap());
    assert_eq!(
        form.form_state().errors,
        json!({
            "name": {"type": "required", "message": "name is required"},
            "email": {"type": "pattern", "message": "invalid email"}
        })
    );

    let name = form.register("name", Default::default());
    name.on_change("Jane").await.unwrap();

    assert_eq!(
        form.form_state().errors,
        json!({"email": {"type": "pattern", "message": "invalid email"}})
    );
    assert_eq!(form.get_value("name"), Some(json!("Jane")));
    assert!(form.get_field_state("email").invalid);
    assert!(!form.get_field_state("name").invalid);
}

#[tokio::test]
async fn test_on_submit_mode_defers_validation_until_submit() {
    let form = profile_form(json!({"name": "", "email": "a@b.c"}), ValidationMode::OnSubmit);
    let name = form.register("name", Default::default());

    name.on_change("").await.unwrap();
    name.on_blur().await.unwrap();
    assert_eq!(form.form_state().errors, json!({}));
    assert!(form.get_field_state("name").is_touched);

    let invalid_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invalid_calls);
    form.handle_submit(|_, _| async { Ok(()) })
        .on_invalid(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .submit(None)
        .await
        .unwrap();

    assert_eq!(invalid_calls.load(Ordering::SeqCst), 1);
    assert!(form.get_field_state("name").invalid);
    assert!(!form.form_state().is_submit_successful);
}

#[tokio::test]
async fn test_submit_failure_is_returned_after_bookkeeping() {
    let form = profile_form(json!({"name": "John", "email": "john@example.com"}), ValidationMode::OnSubmit);

    let err = form
        .handle_submit(|_, _| async { Err(anyhow::anyhow!("server rejected")) })
        .submit(None)
        .await
        .unwrap_err();

    assert!(matches!(err, FormError::Submit(_)));
    let state = form.form_state();
    assert!(state.is_submitted);
    assert!(!state.is_submitting);
    assert!(!state.is_submit_successful);
    assert!(!state.disabled);
    assert_eq!(state.submit_count, 1);
}

#[test]
fn test_controller_without_form_reports_not_provided() {
    let err = use_controller(ControllerProps::new("name")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Form is not provided, either pass the form in props or wrap you form inside FormProvider"
    );
}

#[test]
fn test_reset_restores_defaults_and_state() {
    let form = Form::new(FormOptions::default().default_values(json!({"name": "John"})));
    form.set_value(
        "name",
        json!("Jane"),
        SetValueOptions {
            should_dirty: true,
            should_touch: true,
            ..Default::default()
        },
    );
    assert!(form.form_state().is_dirty);

    form.reset(None, None);

    assert_eq!(form.get_values(), json!({"name": "John"}));
    let state = form.form_state();
    assert!(!state.is_dirty);
    assert_eq!(state.touched_fields, json!({}));
    assert_eq!(state.dirty_fields, json!({}));
}

#[test]
fn test_writes_after_teardown_are_ignored() {
    let form = Form::new(FormOptions::default().default_values(json!({"name": "John"})));
    form.teardown();
    form.set_value("name", json!("Jane"), SetValueOptions::default());
    assert_eq!(form.get_value("name"), Some(json!("John")));
}
