//! Form configuration

use crate::error::FormResult;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// When validation runs for a field event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    OnBlur,
    OnChange,
    #[default]
    OnSubmit,
    /// First blur, then every change.
    OnTouched,
    /// Both change and blur.
    All,
}

/// When validation re-runs after the form has been submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevalidateMode {
    OnBlur,
    #[default]
    OnChange,
    OnSubmit,
}

/// Passed through to the resolver untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CriteriaMode {
    #[default]
    FirstError,
    All,
}

/// Which parts of form state survive a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeepStateOptions {
    pub keep_errors: bool,
    pub keep_dirty: bool,
    pub keep_dirty_values: bool,
    pub keep_values: bool,
    pub keep_default_values: bool,
    pub keep_is_submitted: bool,
    pub keep_is_submit_successful: bool,
    pub keep_touched: bool,
}

/// Options a form is created with.
///
/// Collaborators that cannot be serialized (the resolver, an async default
/// values producer) are attached through [`crate::FormBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormOptions {
    pub mode: ValidationMode,
    pub re_validate_mode: RevalidateMode,
    pub criteria_mode: Option<CriteriaMode>,
    /// A disabled form is never dirty and skips validity updates.
    pub disabled: bool,
    pub default_values: Option<Value>,
    /// Controlled values. Used as the initial value tree when present.
    pub values: Option<Value>,
    pub reset_options: KeepStateOptions,
    /// Emit rule attributes (`required`, `min`, ...) from `register`.
    pub progressive: bool,
    pub should_use_native_validation: Option<bool>,
    pub should_focus_error: bool,
    /// Re-run the resolver in the background on every value change.
    pub revalidate_on_value_change: bool,
    /// Drop resolver results that land after a newer pass has started.
    pub discard_stale_validation: bool,
    /// Handed to the resolver as its context argument.
    pub context: Option<Value>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            mode: ValidationMode::default(),
            re_validate_mode: RevalidateMode::default(),
            criteria_mode: None,
            disabled: false,
            default_values: None,
            values: None,
            reset_options: KeepStateOptions::default(),
            progressive: true,
            should_use_native_validation: None,
            should_focus_error: true,
            revalidate_on_value_change: true,
            discard_stale_validation: false,
            context: None,
        }
    }
}

impl FormOptions {
    /// Parse options from JSON text. Missing keys take their defaults.
    pub fn from_json(json: &str) -> FormResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file, or defaults when the file is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let options: FormOptions = serde_json::from_str(&content)?;
            return Ok(options);
        }
        Ok(Self::default())
    }

    /// Write options to a JSON file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn re_validate_mode(mut self, mode: RevalidateMode) -> Self {
        self.re_validate_mode = mode;
        self
    }

    pub fn default_values(mut self, values: Value) -> Self {
        self.default_values = Some(values);
        self
    }

    pub fn values(mut self, values: Value) -> Self {
        self.values = Some(values);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn reset_options(mut self, keep: KeepStateOptions) -> Self {
        self.reset_options = keep;
        self
    }

    pub fn revalidate_on_value_change(mut self, enabled: bool) -> Self {
        self.revalidate_on_value_change = enabled;
        self
    }

    pub fn discard_stale_validation(mut self, enabled: bool) -> Self {
        self.discard_stale_validation = enabled;
        self
    }

    pub fn context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// The diff baseline: defaults, else controlled values, else `{}`.
    pub(crate) fn baseline(&self) -> Value {
        self.default_values
            .clone()
            .or_else(|| self.values.clone())
            .unwrap_or_else(empty_object)
    }

    /// The starting value tree: controlled values, else defaults, else `{}`.
    pub(crate) fn initial_values(&self) -> Value {
        self.values
            .clone()
            .or_else(|| self.default_values.clone())
            .unwrap_or_else(empty_object)
    }
}

pub(crate) fn empty_object() -> Value {
    Value::Object(Default::default())
}
