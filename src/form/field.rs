//! Field registration types

use crate::logic::{InputKind, Rule};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Host input handle attached to a registered field.
#[cfg_attr(test, mockall::automock)]
pub trait FieldRef: Send + Sync {
    fn focus(&self);

    fn select(&self) {}

    fn kind(&self) -> InputKind {
        InputKind::Text
    }

    /// Current raw value, already reduced for grouped inputs (the checked
    /// radio's value, the selected options, the file list).
    fn value(&self) -> Option<Value> {
        None
    }

    /// Push a value written through the engine back into the input.
    fn set_value(&self, _value: &Value) {}

    fn is_disabled(&self) -> bool {
        false
    }
}

/// Transform applied to a field's raw value before it is stored.
pub type SetValueAs = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Options a field is registered with.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterOptions {
    /// Anything truthy marks the field required; a string doubles as the
    /// message.
    pub required: Option<Value>,
    pub min: Option<Rule<Value>>,
    pub max: Option<Rule<Value>>,
    pub min_length: Option<Rule<u64>>,
    pub max_length: Option<Rule<u64>>,
    /// Regular expression source.
    pub pattern: Option<Rule<String>>,
    pub value_as_number: bool,
    pub value_as_date: bool,
    #[serde(skip)]
    pub set_value_as: Option<SetValueAs>,
    pub disabled: Option<bool>,
    /// Value to seed the field with on registration.
    pub value: Option<Value>,
}

impl fmt::Debug for RegisterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterOptions")
            .field("required", &self.required)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern)
            .field("value_as_number", &self.value_as_number)
            .field("value_as_date", &self.value_as_date)
            .field("set_value_as", &self.set_value_as.as_ref().map(|_| "<fn>"))
            .field("disabled", &self.disabled)
            .field("value", &self.value)
            .finish()
    }
}

impl RegisterOptions {
    pub fn required() -> Self {
        Self {
            required: Some(Value::Bool(true)),
            ..Default::default()
        }
    }

    pub fn set_value_as<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.set_value_as = Some(Arc::new(f));
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }
}

/// A registered field: its options and, once attached, its host reference.
#[derive(Clone)]
pub struct FieldRegistration {
    pub name: String,
    pub mount: bool,
    pub options: RegisterOptions,
    pub field_ref: Option<Arc<dyn FieldRef>>,
}

impl FieldRegistration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mount: false,
            options: RegisterOptions::default(),
            field_ref: None,
        }
    }

    /// Registered-disabled fields are always treated as pristine.
    pub fn is_disabled(&self) -> bool {
        self.options.disabled.unwrap_or(false)
    }

    pub(crate) fn focus(&self, should_select: bool) -> bool {
        let Some(field_ref) = &self.field_ref else {
            return false;
        };
        field_ref.focus();
        if should_select {
            field_ref.select();
        }
        true
    }
}

impl fmt::Debug for FieldRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRegistration")
            .field("name", &self.name)
            .field("mount", &self.mount)
            .field("options", &self.options)
            .field("attached", &self.field_ref.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_options_deserialize() {
        let options: RegisterOptions = serde_json::from_value(json!({
            "required": "This is required",
            "minLength": {"value": 2, "message": "too short"},
            "pattern": "^[a-z]+$",
            "valueAsNumber": true
        }))
        .unwrap();
        assert_eq!(options.required, Some(json!("This is required")));
        assert_eq!(options.min_length.as_ref().map(Rule::value), Some(&2));
        assert_eq!(options.pattern, Some(Rule::Value("^[a-z]+$".to_string())));
        assert!(options.value_as_number);
        assert!(options.set_value_as.is_none());
    }

    #[test]
    fn test_register_options_debug_hides_closure() {
        let options = RegisterOptions::default().set_value_as(|value| value);
        let debug = format!("{:?}", options);
        assert!(debug.contains("<fn>"));
    }

    #[test]
    fn test_focus_without_ref_is_noop() {
        assert!(!FieldRegistration::new("name").focus(true));
    }

    #[test]
    fn test_focus_and_select() {
        let mut field_ref = MockFieldRef::new();
        field_ref.expect_focus().times(1).return_const(());
        field_ref.expect_select().times(1).return_const(());
        let mut registration = FieldRegistration::new("name");
        registration.field_ref = Some(Arc::new(field_ref));
        assert!(registration.focus(true));
    }

    #[test]
    fn test_disabled_defaults_to_false() {
        let mut registration = FieldRegistration::new("name");
        assert!(!registration.is_disabled());
        registration.options = RegisterOptions::default().disabled(true);
        assert!(registration.is_disabled());
    }
}
