//! Field registration and host bindings

use super::validation::{should_validate_on_blur, should_validate_on_change};
use super::{lock, FieldRef, FieldRegistration, Form, RegisterOptions, SetValueOptions};
use crate::error::FormResult;
use crate::logic::{get_event_value, get_field_value, get_rule_value, FieldInput};
use crate::path::{get_path, is_truthy, Path, Prune};
use crate::store::{set_observable_path, unset_observable_path};
use serde_json::Value;
use std::sync::Arc;

/// What survives [`Form::unregister`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnregisterOptions {
    pub keep_value: bool,
    pub keep_error: bool,
    pub keep_dirty: bool,
    pub keep_touched: bool,
}

/// Props handed to the host input for a registered field.
///
/// Rule attributes are only filled in for progressive forms.
#[derive(Debug, Clone)]
pub struct FieldProps {
    pub name: String,
    pub disabled: bool,
    pub required: Option<bool>,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    form: Form,
}

impl FieldProps {
    fn new(form: Form, name: &str, disabled: bool, options: &RegisterOptions, progressive: bool) -> Self {
        Self {
            name: name.to_string(),
            disabled,
            required: progressive.then(|| options.required.as_ref().is_some_and(is_truthy)),
            min: get_rule_value(options.min.as_ref()).filter(|_| progressive),
            max: get_rule_value(options.max.as_ref()).filter(|_| progressive),
            min_length: get_rule_value(options.min_length.as_ref()).filter(|_| progressive),
            max_length: get_rule_value(options.max_length.as_ref()).filter(|_| progressive),
            pattern: get_rule_value(options.pattern.as_ref()).filter(|_| progressive),
            form,
        }
    }

    /// Store the value carried by `input`, then validate if the change
    /// policy says so.
    pub async fn on_change(&self, input: impl Into<FieldInput>) -> FormResult<()> {
        self.form.change_field(&self.name, get_event_value(input)).await
    }

    /// Validate if the blur policy says so, then mark the field touched.
    pub async fn on_blur(&self) -> FormResult<()> {
        self.form.blur_field(&self.name).await
    }

    /// Attach the host input. Re-attaching the same reference is a no-op.
    pub fn attach_ref(&self, field_ref: Arc<dyn FieldRef>) {
        self.form.attach_ref(&self.name, field_ref);
    }

    pub fn form(&self) -> &Form {
        &self.form
    }
}

impl Form {
    /// Register `name` (or update its options) and return the props for its
    /// host input.
    pub fn register(&self, name: &str, options: RegisterOptions) -> FieldProps {
        let form_options = self.options();
        let disabled = options.disabled.unwrap_or(form_options.disabled);
        let seed = options.value.clone();
        {
            let mut fields = lock(&self.inner.fields);
            let registration = fields
                .entry(name.to_string())
                .or_insert_with(|| FieldRegistration::new(name));
            registration.mount = true;
            registration.options = options.clone();
        }
        tracing::trace!(form = %self.id(), name, disabled, "field registered");

        self.update_disabled_field(name, Some(disabled), seed);
        FieldProps::new(self.clone(), name, disabled, &options, form_options.progressive)
    }

    /// Shared change handler for registered fields and controllers.
    pub(crate) async fn change_field(&self, name: &str, value: Value) -> FormResult<()> {
        self.set_value(name, value, SetValueOptions::default());

        let validate = should_validate_on_change(&self.options(), self.flag("isSubmitted"), self.is_touched(name));
        if validate {
            let names = [name.to_string()];
            self.execute_schema_and_update_state(Some(&names)).await?;
        }
        Ok(())
    }

    /// Shared blur handler for registered fields and controllers.
    pub(crate) async fn blur_field(&self, name: &str) -> FormResult<()> {
        let already_touched = self.is_touched(name);
        if should_validate_on_blur(&self.options(), self.flag("isSubmitted"), already_touched) {
            let names = [name.to_string()];
            self.execute_schema_and_update_state(Some(&names)).await?;
        }
        self.mark_touched(name);
        Ok(())
    }

    /// Forget `name` and drop its state unless told to keep it.
    pub fn unregister(&self, name: &str, options: UnregisterOptions) {
        let removed = lock(&self.inner.fields).remove(name).is_some();
        let path = Path::parse(name);
        if path.is_empty() || path.contains_forbidden() {
            return;
        }

        self.inner.store.batch(|| {
            if !options.keep_value {
                unset_observable_path(&self.inner.values, &path, Prune::Objects);
            }
            if !options.keep_error {
                unset_observable_path(&self.errors_node(), &path, Prune::Holes);
            }
            if !options.keep_touched {
                unset_observable_path(&self.touched_node(), &path, Prune::Holes);
            }
            if !options.keep_dirty {
                unset_observable_path(&self.dirty_node(), &path, Prune::Holes);
                let is_dirty = self.get_dirty(None, None);
                self.set_flag("isDirty", is_dirty);
            }
        });
        tracing::trace!(form = %self.id(), name, removed, "field unregistered");
    }

    /// Focus the field's host input. Returns false when nothing is attached.
    pub fn set_focus(&self, name: &str, should_select: bool) -> bool {
        self.field(name).is_some_and(|field| field.focus(should_select))
    }

    /// Apply a field's disabled state. A disabled field loses its value;
    /// an enabled one takes `value`, else whatever its input holds. `None`
    /// leaves everything alone.
    pub fn update_disabled_field(&self, name: &str, disabled: Option<bool>, value: Option<Value>) {
        let Some(disabled) = disabled else {
            return;
        };
        let path = Path::parse(name);
        if path.is_empty() || path.contains_forbidden() {
            return;
        }

        self.inner.store.batch(|| {
            if disabled {
                unset_observable_path(&self.inner.values, &path, Prune::Objects);
            } else {
                let input = value.or_else(|| self.field(name).as_ref().and_then(get_field_value));
                if let Some(input) = input {
                    set_observable_path(&self.inner.values, &path, input);
                }
            }
            self.update_touch_and_dirty(name, false, false);
        });
    }

    pub(crate) fn attach_ref(&self, name: &str, field_ref: Arc<dyn FieldRef>) {
        {
            let mut fields = lock(&self.inner.fields);
            let registration = fields
                .entry(name.to_string())
                .or_insert_with(|| FieldRegistration::new(name));
            if let Some(existing) = &registration.field_ref {
                if std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(&field_ref)) {
                    return;
                }
            }
            registration.field_ref = Some(field_ref);
        }
        self.update_valid_and_value(name);
    }

    /// Sync a freshly attached input with the value tree: push the current
    /// value (or default) into it, else seed the tree from the input.
    fn update_valid_and_value(&self, name: &str) {
        let Some(registration) = self.field(name) else {
            return;
        };
        let path = Path::parse(name);
        let current = self
            .peek_value(name)
            .or_else(|| get_path(&self.default_values(), &path).cloned());

        self.inner.store.batch(|| match current {
            Some(value) => self.set_field_value(name, &path, value, SetValueOptions::default()),
            None => {
                if let Some(value) = get_field_value(&registration) {
                    set_observable_path(&self.inner.values, &path, value);
                }
            }
        });
        self.spawn_update_valid(false);
    }
}
