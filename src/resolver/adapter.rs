//! Closure adapters for the resolver traits

use super::{DefaultValuesProducer, Resolver, ResolverOptions, ResolverResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;

/// A [`Resolver`] backed by an async closure over the value snapshot.
pub struct FnResolver<F>(F);

/// Wrap `f` as a resolver. Context and options are dropped.
///
/// ```
/// use per_form::{resolver_fn, ResolverResult};
/// use serde_json::json;
///
/// let resolver = resolver_fn(|values| async move {
///     if values["name"].as_str().unwrap_or_default().is_empty() {
///         return Ok(ResolverResult::invalid(json!({"name": {"type": "required"}})));
///     }
///     Ok(ResolverResult::valid(values))
/// });
/// # let _ = resolver;
/// ```
pub fn resolver_fn<F, Fut>(f: F) -> FnResolver<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ResolverResult>> + Send + 'static,
{
    FnResolver(f)
}

#[async_trait]
impl<F, Fut> Resolver for FnResolver<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ResolverResult>> + Send + 'static,
{
    async fn resolve(
        &self,
        values: Value,
        _context: Option<Value>,
        _options: ResolverOptions,
    ) -> Result<ResolverResult> {
        (self.0)(values).await
    }
}

/// A [`DefaultValuesProducer`] backed by an async closure.
pub struct FnDefaults<F>(F);

pub fn defaults_fn<F, Fut>(f: F) -> FnDefaults<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    FnDefaults(f)
}

#[async_trait]
impl<F, Fut> DefaultValuesProducer for FnDefaults<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn produce(&self) -> Result<Value> {
        (self.0)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolver_fn_passes_values_through() {
        let resolver = resolver_fn(|values| async move { Ok(ResolverResult::valid(values)) });
        let result = resolver
            .resolve(json!({"a": 1}), None, ResolverOptions::default())
            .await
            .unwrap();
        assert_eq!(result.values, json!({"a": 1}));
        assert!(!result.has_errors());
    }

    #[tokio::test]
    async fn test_resolver_fn_propagates_failure() {
        let resolver = resolver_fn(|_| async { Err(anyhow::anyhow!("schema unavailable")) });
        let err = resolver
            .resolve(json!({}), None, ResolverOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "schema unavailable");
    }

    #[test]
    fn test_defaults_fn_blocking() {
        let producer = defaults_fn(|| async { Ok(json!({"name": "loaded"})) });
        let value = tokio_test::block_on(producer.produce()).unwrap();
        assert_eq!(value, json!({"name": "loaded"}));
    }
}
