//! Validation rule descriptors

use serde::{Deserialize, Serialize};

/// A rule given either as a bare value or with a message attached.
///
/// The message form is tried first so that `Rule<Value>` still recognises
/// `{"value": .., "message": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rule<T> {
    WithMessage { value: T, message: String },
    Value(T),
}

impl<T> Rule<T> {
    pub fn value(&self) -> &T {
        match self {
            Rule::WithMessage { value, .. } | Rule::Value(value) => value,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Rule::WithMessage { message, .. } => Some(message),
            Rule::Value(_) => None,
        }
    }
}

impl<T> From<T> for Rule<T> {
    fn from(value: T) -> Self {
        Rule::Value(value)
    }
}

/// The attribute value of a rule, dropping any message. Patterns are kept as
/// their source string.
pub fn get_rule_value<T: Clone>(rule: Option<&Rule<T>>) -> Option<T> {
    rule.map(|rule| rule.value().clone())
}
