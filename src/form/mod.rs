//! The form state engine
//!
//! A [`Form`] owns one [`Store`] whose root holds two subtrees: `values` (the
//! value tree) and `formState` (scalar flags plus the `errors`,
//! `touchedFields`, `dirtyFields` and `validatingFields` mirrors). Every
//! synchronous operation runs inside one store batch, so subscribers only
//! ever observe post-operation state.

mod builder;
mod control;
mod field;
mod register;
mod state;
mod submit;
mod tracker;
mod validation;

pub use builder::FormBuilder;
pub use control::Control;
pub use field::{FieldRef, FieldRegistration, RegisterOptions, SetValueAs};
pub use register::{FieldProps, UnregisterOptions};
pub use state::{FieldError, FieldState, FormState, FormStatePatch};
pub use submit::{BoxFuture, SubmitEvent, SubmitHandler};
pub use validation::{should_validate_on_blur, should_validate_on_change, TriggerOptions};

#[cfg(test)]
pub use field::MockFieldRef;
#[cfg(test)]
pub use submit::MockSubmitEvent;

use crate::config::{empty_object, FormOptions, KeepStateOptions};
use crate::logic::{get_dirty_fields, get_field_value_as, InputKind};
use crate::path::{get_path, is_empty_object, is_truthy, set_path, Path, Prune};
use crate::resolver::{DefaultValuesProducer, Resolver};
use crate::store::{get_observable, Node, Store, Subscription};
use crate::store::{set_observable_path, unset_observable_path};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

const VALUES: &str = "values";
const FORM_STATE: &str = "formState";

/// Options for [`Form::set_value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SetValueOptions {
    pub should_validate: bool,
    pub should_dirty: bool,
    pub should_touch: bool,
}

/// Options for [`Form::reset_field`].
#[derive(Debug, Clone, Default)]
pub struct ResetFieldOptions {
    pub keep_touched: bool,
    pub keep_dirty: bool,
    pub keep_error: bool,
    /// New default for the field. Also replaces the stored default.
    pub default_value: Option<Value>,
}

/// Options for [`Form::set_error`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SetErrorOptions {
    pub should_focus: bool,
}

/// Handle to a form. Cloning is cheap and every clone addresses the same
/// form.
#[derive(Clone)]
pub struct Form {
    pub(crate) inner: Arc<FormInner>,
}

pub(crate) struct FormInner {
    id: Uuid,
    store: Store,
    values: Node,
    form_state: Node,
    /// Diff baseline and reset target.
    defaults: Mutex<Value>,
    options: Mutex<FormOptions>,
    resolver: Option<Arc<dyn Resolver>>,
    producer: Option<Arc<dyn DefaultValuesProducer>>,
    fields: Mutex<BTreeMap<String, FieldRegistration>>,
    /// Bumped for every resolver pass that writes back into the form.
    generation: AtomicU64,
    in_flight: AtomicUsize,
    values_watch: Mutex<Option<Subscription>>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Form {
    /// Create a form without collaborators.
    pub fn new(options: FormOptions) -> Self {
        Self::builder(options).build()
    }

    pub fn builder(options: FormOptions) -> FormBuilder {
        FormBuilder::new(options)
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Root node of the value tree.
    pub fn values_node(&self) -> &Node {
        &self.inner.values
    }

    /// Root node of the form state.
    pub fn form_state_node(&self) -> &Node {
        &self.inner.form_state
    }

    pub fn control(&self) -> Control {
        Control::new(self.clone())
    }

    pub fn options(&self) -> FormOptions {
        lock(&self.inner.options).clone()
    }

    pub(crate) fn set_options(&self, options: FormOptions) {
        *lock(&self.inner.options) = options;
    }

    /// Snapshot of the current default values.
    pub fn default_values(&self) -> Value {
        lock(&self.inner.defaults).clone()
    }

    pub(crate) fn has_resolver(&self) -> bool {
        self.inner.resolver.is_some()
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldRegistration> {
        lock(&self.inner.fields).get(name).cloned()
    }

    /// Names of all registered fields.
    pub fn field_names(&self) -> Vec<String> {
        lock(&self.inner.fields).keys().cloned().collect()
    }

    pub(crate) fn errors_node(&self) -> Node {
        self.inner.form_state.child("errors")
    }

    pub(crate) fn touched_node(&self) -> Node {
        self.inner.form_state.child("touchedFields")
    }

    pub(crate) fn dirty_node(&self) -> Node {
        self.inner.form_state.child("dirtyFields")
    }

    pub(crate) fn validating_node(&self) -> Node {
        self.inner.form_state.child("validatingFields")
    }

    /// Untracked read of a scalar flag.
    pub(crate) fn flag(&self, key: &str) -> bool {
        self.inner
            .form_state
            .child(key)
            .with(|value| value.and_then(Value::as_bool).unwrap_or(false))
    }

    pub(crate) fn set_flag(&self, key: &str, value: bool) {
        self.inner.form_state.child(key).set(Value::Bool(value));
    }

    // -- reads ---------------------------------------------------------

    /// The whole value tree. Tracked by observers.
    pub fn get_values(&self) -> Value {
        self.inner.values.get().unwrap_or_else(empty_object)
    }

    /// The value at `name`. Tracked by observers.
    pub fn get_value(&self, name: &str) -> Option<Value> {
        get_observable(&self.inner.values, name).and_then(|node| node.get())
    }

    /// One entry per requested name, in order.
    pub fn get_values_of(&self, names: &[&str]) -> Vec<Option<Value>> {
        names.iter().map(|name| self.get_value(name)).collect()
    }

    pub fn peek_values(&self) -> Value {
        self.inner.values.peek().unwrap_or_else(empty_object)
    }

    pub fn peek_value(&self, name: &str) -> Option<Value> {
        get_observable(&self.inner.values, name).and_then(|node| node.peek())
    }

    pub fn peek_values_of(&self, names: &[&str]) -> Vec<Option<Value>> {
        names.iter().map(|name| self.peek_value(name)).collect()
    }

    /// Node view of the value at `name`.
    pub fn get_observable(&self, name: &str) -> Option<Node> {
        get_observable(&self.inner.values, name)
    }

    /// Deserialize the value tree into `T`.
    pub fn values_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.peek_values())
    }

    pub fn get_field_state(&self, name: &str) -> FieldState {
        let read = |node: Node| get_observable(&node, name).and_then(|node| node.get());
        let error = read(self.errors_node());
        FieldState {
            invalid: error.as_ref().is_some_and(is_truthy),
            is_dirty: read(self.dirty_node()).as_ref().is_some_and(is_truthy),
            is_touched: read(self.touched_node()).as_ref().is_some_and(is_truthy),
            error,
        }
    }

    /// Snapshot of the form state. Tracked by observers.
    pub fn form_state(&self) -> FormState {
        FormState::from_value(self.inner.form_state.get())
    }

    /// Explicit getter paired with [`Form::set_form_state`].
    pub fn get_form_state(&self) -> FormState {
        FormState::from_value(self.inner.form_state.peek())
    }

    /// Apply `patch` to the form state in one batch.
    pub fn set_form_state(&self, patch: FormStatePatch) {
        let entries = patch.entries();
        self.inner.store.batch(|| {
            for (key, value) in entries {
                self.inner.form_state.child(key).set(value);
            }
        });
    }

    pub fn update_form_state(&self, patch: FormStatePatch) {
        self.set_form_state(patch);
    }

    // -- writes --------------------------------------------------------

    /// Write `value` at `name` and refresh dirty state in one batch. A
    /// disabled form keeps its dirty state untouched.
    ///
    /// The value is owned by the form from here on. A registered field's
    /// coercion applies unless the field is disabled. With
    /// `should_validate`, validation for `name` runs in the background.
    pub fn set_value(&self, name: &str, value: Value, options: SetValueOptions) {
        let path = Path::parse(name);
        if path.is_empty() || path.contains_forbidden() {
            tracing::debug!(form = %self.id(), name, "refusing set_value on invalid path");
            return;
        }

        self.inner.store.batch(|| {
            set_observable_path(&self.inner.values, &path, value.clone());
            self.set_field_value(name, &path, value, options);
            if !self.options().disabled {
                let is_dirty = self.get_dirty(None, None);
                self.set_flag("isDirty", is_dirty);
                let dirty = get_dirty_fields(&self.default_values(), &self.peek_values());
                self.dirty_node().set(dirty);
            }
        });

        if options.should_validate {
            let form = self.clone();
            let names = vec![name.to_string()];
            self.spawn_background("trigger", async move {
                if let Err(err) = form.trigger_fields(names, TriggerOptions::default()).await {
                    tracing::warn!(form = %form.id(), error = %err, "validation after set_value failed");
                }
            });
        }
    }

    /// Push a value into a registered field: coerce and store it, update the
    /// host input, and apply touch/dirty flags.
    pub(crate) fn set_field_value(&self, name: &str, path: &Path, value: Value, options: SetValueOptions) {
        if let Some(registration) = self.field(name) {
            if !registration.is_disabled() {
                if let Some(coerced) = get_field_value_as(Some(value.clone()), &registration.options) {
                    set_observable_path(&self.inner.values, path, coerced);
                }
            }
            if let Some(field_ref) = &registration.field_ref {
                match field_ref.kind() {
                    InputKind::File => field_ref.set_value(&Value::String(String::new())),
                    _ if value.is_null() => field_ref.set_value(&Value::String(String::new())),
                    _ => field_ref.set_value(&value),
                }
            }
        }

        if options.should_dirty || options.should_touch {
            self.update_touch_and_dirty(name, options.should_touch, options.should_dirty);
        }
    }

    /// Merge `error` onto the descriptor at `name`. Keys other than `type`
    /// and `message` on the existing descriptor survive.
    pub fn set_error(&self, name: &str, error: FieldError, options: SetErrorOptions) {
        let errors = self.errors_node();
        let mut merged = match get_observable(&errors, name).and_then(|node| node.peek()) {
            Some(Value::Object(existing)) => existing,
            _ => Default::default(),
        };
        merged.remove("type");
        merged.remove("message");
        merged.extend(error.into_map());
        set_observable_path(&errors, &Path::parse(name), Value::Object(merged));

        if options.should_focus {
            if let Some(registration) = self.field(name) {
                registration.focus(false);
            }
        }
    }

    /// Replace the whole error tree.
    pub fn set_errors(&self, errors: Value) {
        self.errors_node().set(errors);
    }

    /// Empty the error tree.
    pub fn clear_errors(&self) {
        self.errors_node().set(empty_object());
    }

    /// Remove the error entries at `names`. Missing entries are ignored.
    pub fn clear_errors_for<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let errors = self.errors_node();
        self.inner.store.batch(|| {
            for name in names {
                unset_observable_path(&errors, &Path::parse(name.as_ref()), Prune::Holes);
            }
        });
    }

    /// Reset values and state. `None` (or an empty object) restores the
    /// defaults; other values become the new defaults unless
    /// `keep_default_values` is set. `keep` defaults to the form's
    /// `reset_options`.
    pub fn reset(&self, values: Option<Value>, keep: Option<KeepStateOptions>) {
        let keep = keep.unwrap_or_else(|| self.options().reset_options);
        let next = match values {
            Some(values) if !values.is_null() && !is_empty_object(&values) => {
                if !keep.keep_default_values {
                    *lock(&self.inner.defaults) = values.clone();
                }
                values
            }
            _ => self.default_values(),
        };
        tracing::debug!(form = %self.id(), ?keep, "reset");

        let form_state = &self.inner.form_state;
        self.inner.store.batch(|| {
            self.set_flag("isSubmitting", false);
            if !keep.keep_errors {
                form_state.child("errors").set(empty_object());
            }
            if !keep.keep_touched {
                form_state.child("touchedFields").set(empty_object());
            }
            if !keep.keep_dirty_values {
                form_state.child("dirtyFields").set(empty_object());
            }
            if !keep.keep_dirty {
                self.set_flag("isDirty", false);
            }
            if !keep.keep_values {
                self.inner.values.set(next);
            }
            if !keep.keep_is_submitted {
                self.set_flag("isSubmitted", false);
            }
            if !keep.keep_is_submit_successful {
                self.set_flag("isSubmitSuccessful", false);
            }
        });
    }

    /// Reset one field to its default, or to `options.default_value` which
    /// then becomes the field's stored default.
    pub fn reset_field(&self, name: &str, options: ResetFieldOptions) {
        let path = Path::parse(name);
        if path.is_empty() || path.contains_forbidden() {
            return;
        }
        let was_valid = self.flag("isValid");

        self.inner.store.batch(|| {
            match options.default_value {
                Some(default) => {
                    set_path(&mut lock(&self.inner.defaults), &path, default.clone());
                    set_observable_path(&self.inner.values, &path, default);
                }
                None => match get_path(&self.default_values(), &path).cloned() {
                    Some(default) => {
                        set_observable_path(&self.inner.values, &path, default);
                    }
                    None => unset_observable_path(&self.inner.values, &path, Prune::Objects),
                },
            }
            if !options.keep_touched {
                unset_observable_path(&self.touched_node(), &path, Prune::Holes);
            }
            if !options.keep_dirty {
                unset_observable_path(&self.dirty_node(), &path, Prune::Holes);
                let is_dirty = self.get_dirty(None, None);
                self.set_flag("isDirty", is_dirty);
            }
            if !options.keep_error {
                unset_observable_path(&self.errors_node(), &path, Prune::Holes);
            }
        });

        if !options.keep_error && was_valid {
            self.spawn_update_valid(false);
        }
    }

    /// Call `callback` with the value at `name` (or the whole tree) after
    /// every change to it.
    pub fn watch<F>(&self, name: Option<&str>, callback: F) -> Option<Subscription>
    where
        F: Fn(Option<Value>) + Send + Sync + 'static,
    {
        let node = match name {
            Some(name) => get_observable(&self.inner.values, name)?,
            None => self.inner.values.clone(),
        };
        Some(node.subscribe(callback))
    }

    /// Stop background revalidation and freeze the store. Later writes,
    /// including late resolver results, are ignored.
    pub fn teardown(&self) {
        if let Some(subscription) = lock(&self.inner.values_watch).take() {
            subscription.unsubscribe();
        }
        self.inner.store.dispose();
        tracing::debug!(form = %self.id(), "form torn down");
    }

    /// Run `task` on the current tokio runtime, if there is one.
    pub(crate) fn spawn_background<F>(&self, task: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(future);
            }
            Err(_) => {
                tracing::warn!(form = %self.id(), task, "no tokio runtime, skipping background task");
            }
        }
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("id", &self.inner.id)
            .field("store", &self.inner.store)
            .finish_non_exhaustive()
    }
}
