//! Form state snapshots

use crate::config::empty_object;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flags and mirror trees describing a form.
///
/// This is a snapshot of the `formState` subtree of the form's store. The
/// mirror trees (`errors`, `touched_fields`, `dirty_fields`,
/// `validating_fields`) are shaped like the value tree; a path is present
/// exactly when the flag holds for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    pub errors: Value,
    pub touched_fields: Value,
    pub dirty_fields: Value,
    pub validating_fields: Value,
    pub is_dirty: bool,
    pub is_valid: bool,
    pub is_submitting: bool,
    pub is_submitted: bool,
    pub is_submit_successful: bool,
    pub is_loading: bool,
    pub is_validating: bool,
    pub disabled: bool,
    pub submit_count: u32,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            errors: empty_object(),
            touched_fields: empty_object(),
            dirty_fields: empty_object(),
            validating_fields: empty_object(),
            is_dirty: false,
            is_valid: false,
            is_submitting: false,
            is_submitted: false,
            is_submit_successful: false,
            is_loading: false,
            is_validating: false,
            disabled: false,
            submit_count: 0,
        }
    }
}

impl FormState {
    pub fn new(disabled: bool) -> Self {
        Self {
            disabled,
            ..Default::default()
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| empty_object())
    }

    /// Read a snapshot back from its stored JSON. Malformed parts fall back
    /// to their defaults.
    pub(crate) fn from_value(value: Option<Value>) -> Self {
        value
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    pub fn has_errors(&self) -> bool {
        crate::resolver::has_errors(&self.errors)
    }
}

/// A validation error descriptor.
///
/// Keys other than `type` and `message` (for example `types` or `ref`) are
/// kept in `extra` and survive merges.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: Some(message.into()),
            extra: Map::new(),
        }
    }

    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub(crate) fn into_map(self) -> Map<String, Value> {
        let mut map = self.extra;
        map.insert("type".to_string(), Value::String(self.kind));
        if let Some(message) = self.message {
            map.insert("message".to_string(), Value::String(message));
        }
        map
    }
}

/// Per-field view over the mirror trees.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldState {
    pub invalid: bool,
    pub is_dirty: bool,
    pub is_touched: bool,
    /// The error entry at the field, a descriptor or a nested error tree.
    pub error: Option<Value>,
}

impl FieldState {
    /// The error entry as a typed descriptor, when it is one.
    pub fn field_error(&self) -> Option<FieldError> {
        self.error
            .clone()
            .and_then(|error| serde_json::from_value(error).ok())
    }
}

/// A partial update of the scalar flags and mirror trees.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormStatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub touched_fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirty_fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validating_fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_dirty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_submitting: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_submitted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_submit_successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_loading: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_validating: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_count: Option<u32>,
}

impl FormStatePatch {
    /// The keys this patch sets, with their stored JSON values.
    pub(crate) fn entries(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl From<FormState> for FormStatePatch {
    fn from(state: FormState) -> Self {
        Self {
            errors: Some(state.errors),
            touched_fields: Some(state.touched_fields),
            dirty_fields: Some(state.dirty_fields),
            validating_fields: Some(state.validating_fields),
            is_dirty: Some(state.is_dirty),
            is_valid: Some(state.is_valid),
            is_submitting: Some(state.is_submitting),
            is_submitted: Some(state.is_submitted),
            is_submit_successful: Some(state.is_submit_successful),
            is_loading: Some(state.is_loading),
            is_validating: Some(state.is_validating),
            disabled: Some(state.disabled),
            submit_count: Some(state.submit_count),
        }
    }
}
