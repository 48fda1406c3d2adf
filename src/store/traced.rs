//! Logging decorator for bucket stores.

use crate::context::OpContext;
use crate::error::StoreError;
use crate::key::{BucketKey, Tat};
use crate::store::BucketStore;
use async_trait::async_trait;

/// Wraps a [`BucketStore`] and emits a `tracing` event for every operation.
///
/// Results are returned unchanged. Successes are logged at `trace`, expected
/// outcomes (`NotFound`, caller cancellation) at `debug`, and backend
/// failures at `warn`.
#[derive(Debug, Clone)]
pub struct TracedStore<S> {
    inner: S,
    backend: &'static str,
}

impl<S> TracedStore<S> {
    /// Wrap `inner`, labelling events with `backend`.
    pub fn new(inner: S, backend: &'static str) -> Self {
        Self { inner, backend }
    }

    /// Borrow the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap the decorator.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn record<T>(&self, op: &'static str, key: &BucketKey, result: &Result<T, StoreError>) {
        let backend = self.backend;
        match result {
            Ok(_) => tracing::trace!(backend, op, key = %key, "bucket store ok"),
            Err(e) if e.is_not_found() => {
                tracing::debug!(backend, op, key = %key, "bucket not found")
            }
            Err(e) if e.is_cancellation() => {
                tracing::debug!(backend, op, key = %key, error = %e, "bucket store op cancelled")
            }
            Err(e) => tracing::warn!(backend, op, key = %key, error = %e, "bucket store failure"),
        }
    }
}

#[async_trait]
impl<S: BucketStore> BucketStore for TracedStore<S> {
    async fn set(&self, ctx: &OpContext, key: &BucketKey, tat: Tat) -> Result<(), StoreError> {
        let result = self.inner.set(ctx, key, tat).await;
        self.record("set", key, &result);
        result
    }

    async fn get(&self, ctx: &OpContext, key: &BucketKey) -> Result<Tat, StoreError> {
        let result = self.inner.get(ctx, key).await;
        self.record("get", key, &result);
        result
    }

    async fn delete(&self, ctx: &OpContext, key: &BucketKey) -> Result<(), StoreError> {
        let result = self.inner.delete(ctx, key).await;
        self.record("delete", key, &result);
        result
    }
}
