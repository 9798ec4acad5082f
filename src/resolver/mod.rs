//! External validation seam
//!
//! The engine never interprets validation rules. It hands the current value
//! snapshot to a [`Resolver`] and merges the returned error tree.

mod adapter;
mod traits;

pub use adapter::{defaults_fn, resolver_fn, FnDefaults, FnResolver};
pub use traits::{DefaultValuesProducer, Resolver};

#[cfg(test)]
pub use traits::{MockDefaultValuesProducer, MockResolver};

use crate::config::{empty_object, CriteriaMode};
use crate::path::{self, is_empty_object};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options forwarded to the resolver. The engine does not read them back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverOptions {
    pub criteria_mode: Option<CriteriaMode>,
    pub fields: Map<String, Value>,
    /// Field names the pass was started for, when it is field-scoped.
    pub names: Option<Vec<String>>,
    pub should_use_native_validation: Option<bool>,
}

/// What a resolver hands back: the (possibly transformed) values and a
/// path-keyed error tree, `{}` when everything passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverResult {
    pub values: Value,
    pub errors: Value,
}

impl Default for ResolverResult {
    fn default() -> Self {
        Self {
            values: empty_object(),
            errors: empty_object(),
        }
    }
}

impl ResolverResult {
    /// A passing result carrying `values`.
    pub fn valid(values: Value) -> Self {
        Self {
            values,
            errors: empty_object(),
        }
    }

    /// A failing result with the given error tree.
    pub fn invalid(errors: Value) -> Self {
        Self {
            values: empty_object(),
            errors,
        }
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.errors)
    }

    /// The error entry at `name`, if any.
    pub fn error_at(&self, name: &str) -> Option<&Value> {
        path::get(&self.errors, name)
    }
}

/// Returns true when an error tree holds at least one entry.
pub(crate) fn has_errors(errors: &Value) -> bool {
    !(errors.is_null() || is_empty_object(errors))
}
