//! Submit flow

use super::Form;
use crate::config::empty_object;
use crate::error::{FormError, FormResult};
use crate::resolver::{has_errors, ResolverResult};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The host event that started a submit, if any.
#[cfg_attr(test, mockall::automock)]
pub trait SubmitEvent: Send + Sync {
    fn prevent_default(&self) {}

    fn persist(&self) {}
}

type Callback = Arc<dyn Fn(Value, Option<Arc<dyn SubmitEvent>>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

fn boxed<F, Fut>(f: F) -> Callback
where
    F: Fn(Value, Option<Arc<dyn SubmitEvent>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(
        move |value: Value, event: Option<Arc<dyn SubmitEvent>>| -> BoxFuture<'static, anyhow::Result<()>> {
            Box::pin(f(value, event))
        },
    )
}

/// A prepared submit: callbacks bound to a form. Call [`SubmitHandler::submit`]
/// for every submit attempt.
#[derive(Clone)]
pub struct SubmitHandler {
    form: Form,
    on_valid: Callback,
    on_invalid: Option<Callback>,
}

impl Form {
    /// Bind `on_valid` to this form. It receives the resolver's values when
    /// validation passes.
    pub fn handle_submit<F, Fut>(&self, on_valid: F) -> SubmitHandler
    where
        F: Fn(Value, Option<Arc<dyn SubmitEvent>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        SubmitHandler {
            form: self.clone(),
            on_valid: boxed(on_valid),
            on_invalid: None,
        }
    }
}

impl SubmitHandler {
    /// Called with the error tree when validation fails.
    pub fn on_invalid<F, Fut>(mut self, on_invalid: F) -> Self
    where
        F: Fn(Value, Option<Arc<dyn SubmitEvent>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_invalid = Some(boxed(on_invalid));
        self
    }

    /// Validate and, when valid, run the submit callback.
    ///
    /// Bookkeeping (`isSubmitting`, `isSubmitted`, `submitCount`,
    /// `isLoading`) always settles before a callback failure is returned as
    /// [`FormError::Submit`]. A resolver failure is returned right away with
    /// `isLoading` cleared.
    pub async fn submit(&self, event: Option<Arc<dyn SubmitEvent>>) -> FormResult<()> {
        if let Some(event) = &event {
            event.prevent_default();
            event.persist();
        }
        let form = &self.form;
        form.set_flag("isLoading", true);
        tracing::debug!(form = %form.id(), "submit started");

        let ResolverResult { values, errors } = match form.resolve(form.peek_values(), None).await {
            Ok(result) => result,
            Err(err) => {
                form.set_flag("isLoading", false);
                return Err(err);
            }
        };
        let errors = if errors.is_null() { empty_object() } else { errors };
        let is_valid = !has_errors(&errors);

        form.store().batch(|| {
            form.set_errors(errors.clone());
            form.set_flag("isDirty", true);
            form.set_flag("isSubmitting", true);
            form.set_flag("disabled", true);
        });

        let mut failure = None;
        if is_valid {
            match (self.on_valid)(values, event.clone()).await {
                Ok(()) => form.set_flag("isSubmitSuccessful", true),
                Err(err) => failure = Some(err),
            }
        }

        let submit_count = form.form_state_node().child("submitCount");
        form.store().batch(|| {
            form.set_flag("isSubmitting", false);
            form.set_flag("disabled", false);
            form.set_flag("isSubmitted", true);
            let count = submit_count.peek().and_then(|count| count.as_u64()).unwrap_or(0);
            submit_count.set(Value::from(count + 1));
            form.set_flag("isLoading", false);
        });
        tracing::debug!(form = %form.id(), valid = is_valid, "submit settled");

        if !is_valid {
            if let Some(on_invalid) = &self.on_invalid {
                on_invalid(errors, event).await.map_err(FormError::Submit)?;
            }
        }

        match failure {
            Some(err) => {
                tracing::warn!(form = %form.id(), error = %err, "submit handler failed");
                Err(FormError::Submit(err))
            }
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for SubmitHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmitHandler")
            .field("form", &self.form)
            .field("on_invalid", &self.on_invalid.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormOptions;
    use crate::resolver::MockResolver;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn form_with(defaults: Value) -> Form {
        Form::new(
            FormOptions::default()
                .default_values(defaults)
                .revalidate_on_value_change(false),
        )
    }

    mod valid_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_valid_submit_calls_on_valid_once() {
            let form = form_with(json!({"name": "John", "age": 30}));
            let received = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&received);
            let handler = form.handle_submit(move |values, _| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(values);
                    Ok(())
                }
            });

            handler.submit(None).await.unwrap();

            assert_eq!(*received.lock().unwrap(), vec![json!({"name": "John", "age": 30})]);
            let state = form.form_state();
            assert!(state.is_submitted);
            assert!(state.is_submit_successful);
            assert!(!state.is_submitting);
            assert!(!state.is_loading);
            assert!(!state.disabled);
            assert_eq!(state.submit_count, 1);
        }

        #[tokio::test]
        async fn test_event_is_prevented_and_persisted() {
            let form = form_with(json!({}));
            let mut event = MockSubmitEvent::new();
            event.expect_prevent_default().times(1).return_const(());
            event.expect_persist().times(1).return_const(());

            form.handle_submit(|_, _| async { Ok(()) })
                .submit(Some(Arc::new(event)))
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_submit_count_accumulates() {
            let form = form_with(json!({}));
            let handler = form.handle_submit(|_, _| async { Ok(()) });
            handler.submit(None).await.unwrap();
            handler.clone().submit(None).await.unwrap();
            assert_eq!(form.form_state().submit_count, 2);
        }
    }

    mod invalid_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_invalid_submit_calls_on_invalid() {
            let mut resolver = MockResolver::new();
            resolver.expect_resolve().times(1).returning(|_, _, _| {
                Ok(ResolverResult::invalid(json!({"name": {"type": "required"}})))
            });
            let form = Form::builder(FormOptions::default().revalidate_on_value_change(false))
                .resolver(resolver)
                .build();
            let valid_calls = Arc::new(AtomicUsize::new(0));
            let invalid_calls = Arc::new(AtomicUsize::new(0));
            let valid = Arc::clone(&valid_calls);
            let invalid = Arc::clone(&invalid_calls);

            form.handle_submit(move |_, _| {
                valid.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .on_invalid(move |errors, _| {
                assert_eq!(errors, json!({"name": {"type": "required"}}));
                invalid.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .submit(None)
            .await
            .unwrap();

            assert_eq!(valid_calls.load(Ordering::SeqCst), 0);
            assert_eq!(invalid_calls.load(Ordering::SeqCst), 1);
            let state = form.form_state();
            assert!(state.is_submitted);
            assert!(!state.is_submit_successful);
            assert_eq!(state.errors, json!({"name": {"type": "required"}}));
        }

        #[tokio::test]
        async fn test_resolver_failure_clears_loading() {
            let mut resolver = MockResolver::new();
            resolver
                .expect_resolve()
                .returning(|_, _, _| Err(anyhow::anyhow!("schema crashed")));
            let form = Form::builder(FormOptions::default()).resolver(resolver).build();

            let err = form
                .handle_submit(|_, _| async { Ok(()) })
                .submit(None)
                .await
                .unwrap_err();

            assert!(matches!(err, FormError::Resolver(_)));
            let state = form.form_state();
            assert!(!state.is_loading);
            assert!(!state.is_submitted);
            assert_eq!(state.submit_count, 0);
        }
    }

    mod failure_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_callback_error_returned_after_bookkeeping() {
            let form = form_with(json!({"name": "John"}));
            let err = form
                .handle_submit(|_, _| async { Err(anyhow::anyhow!("network down")) })
                .submit(None)
                .await
                .unwrap_err();

            assert_eq!(err.to_string(), "submit handler failed: network down");
            let state = form.form_state();
            assert!(state.is_submitted);
            assert!(!state.is_submit_successful);
            assert!(!state.is_submitting);
            assert_eq!(state.submit_count, 1);
        }

        #[test]
        fn test_submit_with_block_on() {
            let form = form_with(json!({"a": 1}));
            let handler = form.handle_submit(|_, _| async { Ok(()) });
            tokio_test::block_on(handler.submit(None)).unwrap();
            assert!(form.form_state().is_submit_successful);
        }
    }
}
