//! Controlled inputs

use super::resolve_form;
use crate::error::FormResult;
use crate::form::{FieldState, Form, FormState};
use crate::logic::{get_event_value, FieldInput};
use crate::path;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Transform applied to a controlled input's value before it is stored.
pub type FormatValue = Arc<dyn Fn(Value) -> Value + Send + Sync>;

#[derive(Clone, Default)]
pub struct ControllerProps {
    pub name: String,
    /// Falls back to the ambient form when absent.
    pub form: Option<Form>,
    pub format_value: Option<FormatValue>,
}

impl ControllerProps {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn form(mut self, form: &Form) -> Self {
        self.form = Some(form.clone());
        self
    }

    pub fn format_value<F>(mut self, format: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.format_value = Some(Arc::new(format));
        self
    }
}

impl fmt::Debug for ControllerProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerProps")
            .field("name", &self.name)
            .field("form", &self.form)
            .field("format_value", &self.format_value.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Bind a controlled input to `props.name`.
pub fn use_controller(props: ControllerProps) -> FormResult<Controller> {
    let form = resolve_form(props.form)?;
    Ok(Controller {
        field: ControllerField {
            name: props.name,
            form,
            format_value: props.format_value,
        },
    })
}

#[derive(Clone, Debug)]
pub struct Controller {
    pub field: ControllerField,
}

impl Controller {
    pub fn field_state(&self) -> FieldState {
        self.field.form.get_field_state(&self.field.name)
    }

    pub fn form_state(&self) -> FormState {
        self.field.form.get_form_state()
    }
}

/// Handlers and live value for one controlled input.
#[derive(Clone)]
pub struct ControllerField {
    pub name: String,
    form: Form,
    format_value: Option<FormatValue>,
}

impl ControllerField {
    pub async fn on_change(&self, input: impl Into<FieldInput>) -> FormResult<()> {
        let mut value = get_event_value(input);
        if let Some(format) = &self.format_value {
            value = format(value);
        }
        self.form.change_field(&self.name, value).await
    }

    pub async fn on_blur(&self) -> FormResult<()> {
        self.form.blur_field(&self.name).await
    }

    /// Current value, or the default when the field has none yet.
    pub fn value(&self) -> Option<Value> {
        self.form
            .get_value(&self.name)
            .or_else(|| path::get(&self.form.default_values(), &self.name).cloned())
    }

    pub fn disabled(&self) -> bool {
        self.form.get_form_state().disabled
    }
}

impl fmt::Debug for ControllerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerField")
            .field("name", &self.name)
            .field("form", &self.form.id())
            .finish_non_exhaustive()
    }
}
