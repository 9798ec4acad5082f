//! Observable form state for host UI layers.
//!
//! A [`Form`] keeps a value tree and its derived state (errors, touched and
//! dirty mirrors, submit flags) in one observable [`Store`]. Validation is
//! delegated to a [`Resolver`]; the engine only merges the error tree it
//! returns.

pub mod bindings;
pub mod config;
pub mod error;
pub mod form;
pub mod logic;
pub mod path;
pub mod resolver;
pub mod store;

pub use bindings::{
    use_controller, use_field_array, use_form_context, use_form_state, use_watch, Controller, ControllerProps,
    FieldArray, FormProvider, UseFieldArrayProps, UseWatchProps,
};
pub use config::{CriteriaMode, FormOptions, KeepStateOptions, RevalidateMode, ValidationMode};
pub use error::{FormError, FormResult};
pub use form::{
    Control, FieldError, FieldProps, FieldRef, FieldState, Form, FormBuilder, FormState, RegisterOptions,
    ResetFieldOptions, SetErrorOptions, SetValueOptions, SubmitEvent, SubmitHandler, TriggerOptions,
    UnregisterOptions,
};
pub use logic::{get_event_value, ChangeEvent, FieldInput};
pub use resolver::{defaults_fn, resolver_fn, DefaultValuesProducer, Resolver, ResolverOptions, ResolverResult};
pub use store::{get_observable, set_observable, unset_observable, unset_observable_with, Node, Store, Subscription};
