//! Ambient form context

use crate::error::{FormError, FormResult};
use crate::form::Form;
use std::cell::RefCell;
use std::future::Future;

thread_local! {
    static SCOPES: RefCell<Vec<Form>> = const { RefCell::new(Vec::new()) };
}

tokio::task_local! {
    static TASK_FORM: Form;
}

/// Installs a form as the ambient context for nested bindings.
pub struct FormProvider;

impl FormProvider {
    /// Make `form` the ambient form on this thread while `f` runs. Scopes
    /// nest; the innermost wins.
    pub fn scope<R>(form: &Form, f: impl FnOnce() -> R) -> R {
        let _guard = ScopeGuard::enter(form.clone());
        f()
    }

    /// Make `form` the ambient form for `future`, across await points.
    pub async fn scope_async<F: Future>(form: &Form, future: F) -> F::Output {
        TASK_FORM.scope(form.clone(), future).await
    }
}

struct ScopeGuard;

impl ScopeGuard {
    fn enter(form: Form) -> Self {
        SCOPES.with(|scopes| scopes.borrow_mut().push(form));
        ScopeGuard
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPES.with(|scopes| {
            scopes.borrow_mut().pop();
        });
    }
}

/// The ambient form, if a provider scope is active.
pub fn use_form_context() -> Option<Form> {
    SCOPES
        .with(|scopes| scopes.borrow().last().cloned())
        .or_else(|| TASK_FORM.try_with(Form::clone).ok())
}

/// The explicit form, else the ambient one.
pub fn resolve_form(explicit: Option<Form>) -> FormResult<Form> {
    explicit.or_else(use_form_context).ok_or(FormError::NotProvided)
}
