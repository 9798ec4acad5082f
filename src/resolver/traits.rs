//! Trait abstraction for validation collaborators, mockable in tests

use super::{ResolverOptions, ResolverResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Maps a value snapshot to a validation result.
///
/// An `Err` means the resolver itself failed; field errors belong in
/// [`ResolverResult::errors`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(
        &self,
        values: Value,
        context: Option<Value>,
        options: ResolverOptions,
    ) -> Result<ResolverResult>;
}

/// Lazily produces default values, e.g. from a remote source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DefaultValuesProducer: Send + Sync {
    async fn produce(&self) -> Result<Value>;
}
