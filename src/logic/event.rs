//! Change events and input classification

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of host input a field is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    #[default]
    Text,
    Checkbox,
    Radio,
    File,
    SelectMultiple,
}

impl InputKind {
    /// Classify a host `type` attribute. Unknown types are text-like.
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "checkbox" => InputKind::Checkbox,
            "radio" => InputKind::Radio,
            "file" => InputKind::File,
            "select-multiple" => InputKind::SelectMultiple,
            _ => InputKind::Text,
        }
    }

    pub fn is_radio_or_checkbox(self) -> bool {
        matches!(self, InputKind::Radio | InputKind::Checkbox)
    }
}

/// The element a change event originated from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTarget {
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub name: String,
    pub value: Value,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub target: EventTarget,
}

impl ChangeEvent {
    pub fn text(name: &str, value: impl Into<Value>) -> Self {
        Self {
            target: EventTarget {
                kind: InputKind::Text,
                name: name.to_string(),
                value: value.into(),
                checked: false,
            },
        }
    }

    pub fn checkbox(name: &str, checked: bool) -> Self {
        Self {
            target: EventTarget {
                kind: InputKind::Checkbox,
                name: name.to_string(),
                value: Value::Null,
                checked,
            },
        }
    }
}

/// What a change handler receives: a structured event or a bare value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Event(ChangeEvent),
    Value(Value),
}

impl From<ChangeEvent> for FieldInput {
    fn from(event: ChangeEvent) -> Self {
        FieldInput::Event(event)
    }
}

impl From<Value> for FieldInput {
    fn from(value: Value) -> Self {
        FieldInput::Value(value)
    }
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        FieldInput::Value(Value::from(value))
    }
}

/// Extract the field value from a change handler argument.
///
/// Checkbox targets yield `checked`, other targets their `value`. A JSON
/// object with a `target` object is read as an event too; anything else
/// passes through unchanged.
pub fn get_event_value(input: impl Into<FieldInput>) -> Value {
    match input.into() {
        FieldInput::Event(event) => target_value(event.target),
        FieldInput::Value(Value::Object(mut map)) => match map.remove("target") {
            Some(Value::Object(target)) => {
                let kind = target.get("type").and_then(Value::as_str).map(InputKind::from_type);
                if kind == Some(InputKind::Checkbox) {
                    Value::Bool(target.get("checked").and_then(Value::as_bool).unwrap_or(false))
                } else {
                    target.get("value").cloned().unwrap_or(Value::Null)
                }
            }
            Some(other) => {
                map.insert("target".to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        FieldInput::Value(value) => value,
    }
}

fn target_value(target: EventTarget) -> Value {
    if target.kind == InputKind::Checkbox {
        Value::Bool(target.checked)
    } else {
        target.value
    }
}
