//! Low-level control handle for bindings

use super::{
    lock, FieldError, FieldRegistration, FieldState, Form, FormState, FormStatePatch, SetErrorOptions, SubmitEvent,
    SubmitHandler,
};
use crate::config::{FormOptions, KeepStateOptions};
use crate::error::FormResult;
use crate::resolver::ResolverResult;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

/// The engine internals that controllers, watchers and field arrays build
/// on. Every method forwards to the owning [`Form`].
#[derive(Clone, Debug)]
pub struct Control {
    form: Form,
}

impl Control {
    pub(crate) fn new(form: Form) -> Self {
        Self { form }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub async fn execute_schema_and_update_state(&self, names: Option<&[String]>) -> FormResult<Option<Value>> {
        self.form.execute_schema_and_update_state(names).await
    }

    pub fn get_dirty(&self, name: Option<&str>, value: Option<Value>) -> bool {
        self.form.get_dirty(name, value)
    }

    pub async fn update_valid(&self, force: bool) -> FormResult<()> {
        self.form.update_valid(force).await
    }

    pub fn set_errors(&self, errors: Value) {
        self.form.set_errors(errors);
    }

    pub fn set_error(&self, name: &str, error: FieldError, options: SetErrorOptions) {
        self.form.set_error(name, error, options);
    }

    pub async fn reset_default_values(&self) -> FormResult<bool> {
        self.form.reset_default_values().await
    }

    pub fn reset(&self, values: Option<Value>, keep: Option<KeepStateOptions>) {
        self.form.reset(values, keep);
    }

    pub fn update_form_state(&self, patch: FormStatePatch) {
        self.form.update_form_state(patch);
    }

    pub fn update_disabled_field(&self, name: &str, disabled: Option<bool>, value: Option<Value>) {
        self.form.update_disabled_field(name, disabled, value);
    }

    pub async fn resolve(&self, values: Value) -> FormResult<ResolverResult> {
        self.form.resolve(values, None).await
    }

    pub fn get_field_state(&self, name: &str) -> FieldState {
        self.form.get_field_state(name)
    }

    pub fn handle_submit<F, Fut>(&self, on_valid: F) -> SubmitHandler
    where
        F: Fn(Value, Option<Arc<dyn SubmitEvent>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.form.handle_submit(on_valid)
    }

    /// Current value tree, untracked.
    pub fn form_values(&self) -> Value {
        self.form.peek_values()
    }

    pub fn default_values(&self) -> Value {
        self.form.default_values()
    }

    pub fn form_state(&self) -> FormState {
        self.form.get_form_state()
    }

    /// Overwrite the whole form state.
    pub fn set_form_state(&self, state: FormState) {
        self.form.set_form_state(state.into());
    }

    pub fn fields(&self) -> BTreeMap<String, FieldRegistration> {
        lock(&self.form.inner.fields).clone()
    }

    pub fn options(&self) -> FormOptions {
        self.form.options()
    }

    /// Replace the options. Construction-time choices (initial values, the
    /// values observer) are not revisited.
    pub fn set_options(&self, options: FormOptions) {
        self.form.set_options(options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationMode;
    use crate::form::RegisterOptions;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn control() -> Control {
        Form::new(
            FormOptions::default()
                .default_values(json!({"name": "John"}))
                .revalidate_on_value_change(false),
        )
        .control()
    }

    #[test]
    fn test_getters_track_form() {
        let control = control();
        control.form().set_value("name", json!("Jane"), Default::default());
        assert_eq!(control.form_values(), json!({"name": "Jane"}));
        assert_eq!(control.default_values(), json!({"name": "John"}));
        assert!(control.form_state().is_dirty);
        assert!(control.get_dirty(None, None));
    }

    #[test]
    fn test_set_form_state_overwrites() {
        let control = control();
        let mut state = control.form_state();
        state.submit_count = 7;
        state.errors = json!({"name": {"type": "x"}});
        control.set_form_state(state);
        assert_eq!(control.form_state().submit_count, 7);
        assert!(control.get_field_state("name").invalid);
    }

    #[test]
    fn test_options_and_fields() {
        let control = control();
        control.set_options(control.options().mode(ValidationMode::OnBlur));
        assert_eq!(control.form().options().mode, ValidationMode::OnBlur);

        control.form().register("name", RegisterOptions::required());
        assert!(control.fields()["name"].mount);
    }

    #[tokio::test]
    async fn test_async_forwarding() {
        let control = control();
        let result = control.resolve(json!({"a": 1})).await.unwrap();
        assert!(!result.has_errors());
        assert!(!control.reset_default_values().await.unwrap());
        control.update_valid(true).await.unwrap();
        assert_eq!(control.execute_schema_and_update_state(None).await.unwrap(), Some(json!({})));
    }
}
