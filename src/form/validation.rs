//! Resolver passes and validation triggers

use super::{lock, Form};
use crate::config::{empty_object, FormOptions, RevalidateMode, ValidationMode};
use crate::error::{FormError, FormResult};
use crate::path::{self, is_empty_object, is_truthy, Path, Prune};
use crate::resolver::{has_errors, ResolverOptions, ResolverResult};
use crate::store::{set_observable_path, unset_observable_path};
use serde_json::{Map, Value};
use std::sync::atomic::Ordering;

/// Options for [`Form::trigger`] and [`Form::trigger_fields`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerOptions {
    /// Focus the first failing field when validation fails.
    pub should_focus: bool,
}

/// Whether a change event validates its field.
pub fn should_validate_on_change(options: &FormOptions, is_submitted: bool, is_touched: bool) -> bool {
    if is_submitted {
        return options.re_validate_mode == RevalidateMode::OnChange;
    }
    match options.mode {
        ValidationMode::OnChange | ValidationMode::All => true,
        ValidationMode::OnTouched => is_touched,
        ValidationMode::OnBlur | ValidationMode::OnSubmit => false,
    }
}

/// Whether a blur event validates its field. `already_touched` is the
/// touched flag before this blur.
pub fn should_validate_on_blur(options: &FormOptions, is_submitted: bool, already_touched: bool) -> bool {
    if options.mode == ValidationMode::OnTouched && !already_touched {
        return true;
    }
    if is_submitted {
        return options.re_validate_mode == RevalidateMode::OnBlur;
    }
    matches!(options.mode, ValidationMode::OnBlur | ValidationMode::All)
}

impl Form {
    /// Run the resolver over `values` without touching form state. Without a
    /// resolver every snapshot is valid.
    pub async fn resolve(&self, values: Value, names: Option<Vec<String>>) -> FormResult<ResolverResult> {
        let Some(resolver) = self.inner.resolver.clone() else {
            return Ok(ResolverResult::valid(values));
        };
        let fields = self.resolver_fields();
        let (context, options) = {
            let form_options = lock(&self.inner.options);
            let options = ResolverOptions {
                criteria_mode: form_options.criteria_mode,
                fields,
                names,
                should_use_native_validation: form_options.should_use_native_validation,
            };
            (form_options.context.clone(), options)
        };

        resolver
            .resolve(values, context, options)
            .await
            .map_err(FormError::Resolver)
    }

    fn resolver_fields(&self) -> Map<String, Value> {
        lock(&self.inner.fields)
            .iter()
            .filter_map(|(name, field)| {
                serde_json::to_value(&field.options)
                    .ok()
                    .map(|options| (name.clone(), options))
            })
            .collect()
    }

    /// Resolve the current values and write the result into the error tree.
    ///
    /// With `names`, only those entries change: a missing or empty error
    /// unsets the entry, anything else replaces it. Without `names` the
    /// whole tree is replaced. Returns the resolver's full error tree, or
    /// `None` when `discard_stale_validation` dropped the result because a
    /// newer pass had started.
    pub async fn execute_schema_and_update_state(&self, names: Option<&[String]>) -> FormResult<Option<Value>> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.begin_validating(names);
        tracing::debug!(form = %self.id(), generation, ?names, "validation pass started");

        let result = self.resolve(self.peek_values(), names.map(<[String]>::to_vec)).await;
        let errors = match result {
            Ok(result) => result.errors,
            Err(err) => {
                self.end_validating(names);
                tracing::warn!(form = %self.id(), generation, error = %err, "validation pass failed");
                return Err(err);
            }
        };

        let stale = generation != self.inner.generation.load(Ordering::SeqCst);
        let discard = stale && self.options().discard_stale_validation;
        self.inner.store.batch(|| {
            if discard {
                tracing::debug!(form = %self.id(), generation, "dropping stale validation result");
            } else {
                self.merge_errors(names, &errors);
            }
            self.end_validating(names);
        });

        Ok((!discard).then_some(errors))
    }

    fn merge_errors(&self, names: Option<&[String]>, errors: &Value) {
        let Some(names) = names else {
            let tree = if errors.is_null() { empty_object() } else { errors.clone() };
            self.set_errors(tree);
            return;
        };
        let errors_node = self.errors_node();
        for name in names {
            let path = Path::parse(name);
            match path::get(errors, name) {
                Some(error) if is_truthy(error) && !is_empty_object(error) => {
                    set_observable_path(&errors_node, &path, error.clone());
                }
                _ => unset_observable_path(&errors_node, &path, Prune::Holes),
            }
        }
    }

    fn begin_validating(&self, names: Option<&[String]>) {
        let Some(names) = names else {
            return;
        };
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        let validating = self.validating_node();
        self.inner.store.batch(|| {
            for name in names {
                set_observable_path(&validating, &Path::parse(name), Value::Bool(true));
            }
            self.set_flag("isValidating", true);
        });
    }

    fn end_validating(&self, names: Option<&[String]>) {
        let Some(names) = names else {
            return;
        };
        let remaining = self.inner.in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        let validating = self.validating_node();
        self.inner.store.batch(|| {
            for name in names {
                unset_observable_path(&validating, &Path::parse(name), Prune::Holes);
            }
            if remaining == 0 {
                self.set_flag("isValidating", false);
            }
        });
    }

    /// Validate the whole form. Returns whether it is valid.
    pub async fn trigger(&self, options: TriggerOptions) -> FormResult<bool> {
        self.run_trigger(None, options).await
    }

    /// Validate `names`. Returns true when none of them has an error; the
    /// `isValid` flag still reflects the whole form.
    pub async fn trigger_fields<I, S>(&self, names: I, options: TriggerOptions) -> FormResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.run_trigger(Some(names), options).await
    }

    async fn run_trigger(&self, names: Option<Vec<String>>, options: TriggerOptions) -> FormResult<bool> {
        if !self.has_resolver() {
            self.set_flag("isValid", true);
            return Ok(true);
        }

        let Some(errors) = self.execute_schema_and_update_state(names.as_deref()).await? else {
            // A newer pass owns the error tree and `isValid`.
            let current = self.errors_node().peek().unwrap_or_else(empty_object);
            return Ok(fields_pass(names.as_deref(), &current));
        };
        let is_valid = !has_errors(&errors);
        let result = fields_pass(names.as_deref(), &errors);
        self.set_flag("isValid", is_valid);

        if options.should_focus && !result {
            self.focus_first_error(names.as_deref(), &errors);
        }
        Ok(result)
    }

    fn focus_first_error(&self, names: Option<&[String]>, errors: &Value) {
        let candidates = match names {
            Some(names) => names.to_vec(),
            None => self.field_names(),
        };
        let focused = candidates
            .iter()
            .filter(|name| path::get(errors, name).is_some_and(is_truthy))
            .filter_map(|name| self.field(name))
            .any(|field| field.focus(false));
        if !focused {
            tracing::debug!(form = %self.id(), "no attached field to focus");
        }
    }

    /// Recompute `isValid` from the current values. Runs only when the form
    /// is enabled, has a resolver, and is currently valid or `force` is set.
    /// The flag is written only when it changes.
    pub async fn update_valid(&self, force: bool) -> FormResult<()> {
        if self.options().disabled || !self.has_resolver() {
            return Ok(());
        }
        if !(force || self.flag("isValid")) {
            return Ok(());
        }

        let result = self.resolve(self.peek_values(), None).await?;
        let is_valid = !result.has_errors();
        if is_valid != self.flag("isValid") {
            self.set_flag("isValid", is_valid);
        }
        Ok(())
    }

    pub(crate) fn spawn_update_valid(&self, force: bool) {
        if !self.has_resolver() {
            return;
        }
        let form = self.clone();
        self.spawn_background("update_valid", async move {
            if let Err(err) = form.update_valid(force).await {
                tracing::warn!(form = %form.id(), error = %err, "validity update failed");
            }
        });
    }

    /// Values observer. Without a resolver the outcome is known and applied
    /// right away; otherwise the pass runs in the background.
    pub(crate) fn on_values_changed(&self, values: Value) {
        if !self.has_resolver() {
            self.apply_revalidation(empty_object());
            return;
        }
        let form = self.clone();
        self.spawn_background("revalidate", async move {
            match form.resolve(values, None).await {
                Ok(result) => form.apply_revalidation(result.errors),
                Err(err) => {
                    tracing::warn!(form = %form.id(), error = %err, "background revalidation failed");
                }
            }
        });
    }

    fn apply_revalidation(&self, errors: Value) {
        if !self.flag("isDirty") || self.options().disabled {
            return;
        }
        let is_valid = !has_errors(&errors);
        self.inner.store.batch(|| {
            if self.flag("isSubmitted") {
                self.set_errors(errors);
            }
            self.set_flag("isValid", is_valid);
        });
    }

    /// Load defaults from the attached producer and reset the form to them.
    /// Returns false when no producer is attached.
    pub async fn reset_default_values(&self) -> FormResult<bool> {
        let Some(producer) = self.inner.producer.clone() else {
            return Ok(false);
        };

        let values = match producer.produce().await {
            Ok(values) => values,
            Err(err) => {
                self.set_flag("isLoading", false);
                return Err(FormError::DefaultValues(err));
            }
        };

        let keep = self.options().reset_options;
        *lock(&self.inner.defaults) = values.clone();
        self.inner.store.batch(|| {
            self.reset(Some(values), Some(keep));
            self.set_flag("isLoading", false);
        });
        tracing::debug!(form = %self.id(), "default values loaded");
        Ok(true)
    }
}

/// True when none of `names` has an error, or the whole tree is clean.
fn fields_pass(names: Option<&[String]>, errors: &Value) -> bool {
    match names {
        Some(names) => !names
            .iter()
            .any(|name| path::get(errors, name).is_some_and(is_truthy)),
        None => !has_errors(errors),
    }
}
