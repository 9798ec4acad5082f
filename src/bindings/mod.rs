//! Host-facing bindings
//!
//! Helpers a UI layer builds on: an ambient form context, controlled inputs,
//! value watchers and array fields. Each accepts an explicit [`Form`] and
//! falls back to the ambient one installed by [`FormProvider`].

mod context;
mod controller;
mod field_array;
mod watch;

pub use context::{resolve_form, use_form_context, FormProvider};
pub use controller::{use_controller, Controller, ControllerField, ControllerProps, FormatValue};
pub use field_array::{convert_to_array_payload, use_field_array, FieldArray, UseFieldArrayProps};
pub use watch::{use_watch, UseWatchProps};

use crate::error::FormResult;
use crate::form::{Form, FormState};

/// Snapshot of the form state. Tracked by observers.
pub fn use_form_state(form: Option<Form>) -> FormResult<FormState> {
    Ok(resolve_form(form)?.form_state())
}
