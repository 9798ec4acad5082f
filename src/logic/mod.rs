//! Field value logic
//!
//! Pure helpers that sit between host inputs and the value tree: reading a
//! value out of a change event, coercing it per the field's registration,
//! reducing rule descriptors to their attribute value, and diffing values
//! against defaults into a dirty mirror.

mod dirty;
mod event;
mod rule;
mod value_as;

pub use dirty::get_dirty_fields;
pub use event::{get_event_value, ChangeEvent, EventTarget, FieldInput, InputKind};
pub use rule::{get_rule_value, Rule};
pub use value_as::{get_field_value, get_field_value_as};
