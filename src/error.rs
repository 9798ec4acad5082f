//! Error types for the form engine

use thiserror::Error;

/// Failures that cross the engine boundary.
///
/// Validation failures are data in the error tree and never appear here.
#[derive(Debug, Error)]
pub enum FormError {
    /// No form handle was passed and no provider scope is active.
    #[error("Form is not provided, either pass the form in props or wrap you form inside FormProvider")]
    NotProvided,

    /// The resolver itself failed (as opposed to reporting field errors).
    #[error("resolver failed: {0:#}")]
    Resolver(anyhow::Error),

    /// The submit callback failed. Form bookkeeping has already settled.
    #[error("submit handler failed: {0:#}")]
    Submit(anyhow::Error),

    /// The async default values producer failed. The form stays as it was.
    #[error("default values producer failed: {0:#}")]
    DefaultValues(anyhow::Error),

    #[error("invalid form options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

pub type FormResult<T> = Result<T, FormError>;

impl FormError {
    /// The underlying callback error, for resolver, submit and producer
    /// failures.
    pub fn inner(&self) -> Option<&anyhow::Error> {
        match self {
            FormError::Resolver(err) | FormError::Submit(err) | FormError::DefaultValues(err) => Some(err),
            _ => None,
        }
    }
}
