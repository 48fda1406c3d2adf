//! Bucket state storage.
//!
//! This module provides the storage seam of the rate limiter:
//! - [`BucketStore`]: the capability every backend implements (get/set/delete of a TAT).
//! - [`MemoryBucketStore`]: single-lock in-process reference implementation.
//! - [`ShardedMemoryBucketStore`]: in-process store with per-shard locks.
//! - [`TracedStore`]: decorator that logs outcomes via `tracing`.
//!
//! # Contract
//!
//! - A bucket does not exist until its first successful `set`.
//! - `get` on a missing bucket fails with [`StoreError::NotFound`]; it never
//!   returns a default timestamp.
//! - `set` overwrites unconditionally (last writer wins).
//! - `delete` succeeds whether or not the bucket exists.
//! - Each operation is atomic for its key.
//! - No backend retries internally or substitutes values on failure.
//!
//! Callers depend on the trait only, never on a concrete backend. There is no
//! iteration or bulk-read API; backends are not required to support one.

use crate::context::OpContext;
use crate::error::StoreError;
use crate::key::{BucketKey, Tat};
use async_trait::async_trait;
use std::sync::Arc;

pub mod memory;
pub mod sharded;
pub mod traced;

pub use memory::MemoryBucketStore;
pub use sharded::ShardedMemoryBucketStore;
pub use traced::TracedStore;

/// Abstract storage interface for rate limit bucket state.
///
/// Implementations must be safe to share between any number of concurrent
/// callers. Operations on the same key are linearizable; operations on
/// different keys carry no ordering guarantee.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Store `tat` as the current TAT for `key`, replacing any prior value.
    ///
    /// No relation between `tat` and the current time, or any prior value, is
    /// enforced.
    async fn set(&self, ctx: &OpContext, key: &BucketKey, tat: Tat) -> Result<(), StoreError>;

    /// Fetch the most recently stored TAT for `key`.
    ///
    /// Fails with [`StoreError::NotFound`] if no TAT is stored.
    async fn get(&self, ctx: &OpContext, key: &BucketKey) -> Result<Tat, StoreError>;

    /// Remove the stored TAT for `key`. Succeeds if the key is absent.
    async fn delete(&self, ctx: &OpContext, key: &BucketKey) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: BucketStore + ?Sized> BucketStore for &S {
    async fn set(&self, ctx: &OpContext, key: &BucketKey, tat: Tat) -> Result<(), StoreError> {
        (**self).set(ctx, key, tat).await
    }

    async fn get(&self, ctx: &OpContext, key: &BucketKey) -> Result<Tat, StoreError> {
        (**self).get(ctx, key).await
    }

    async fn delete(&self, ctx: &OpContext, key: &BucketKey) -> Result<(), StoreError> {
        (**self).delete(ctx, key).await
    }
}

#[async_trait]
impl<S: BucketStore + ?Sized> BucketStore for Arc<S> {
    async fn set(&self, ctx: &OpContext, key: &BucketKey, tat: Tat) -> Result<(), StoreError> {
        (**self).set(ctx, key, tat).await
    }

    async fn get(&self, ctx: &OpContext, key: &BucketKey) -> Result<Tat, StoreError> {
        (**self).get(ctx, key).await
    }

    async fn delete(&self, ctx: &OpContext, key: &BucketKey) -> Result<(), StoreError> {
        (**self).delete(ctx, key).await
    }
}

#[async_trait]
impl<S: BucketStore + ?Sized> BucketStore for Box<S> {
    async fn set(&self, ctx: &OpContext, key: &BucketKey, tat: Tat) -> Result<(), StoreError> {
        (**self).set(ctx, key, tat).await
    }

    async fn get(&self, ctx: &OpContext, key: &BucketKey) -> Result<Tat, StoreError> {
        (**self).get(ctx, key).await
    }

    async fn delete(&self, ctx: &OpContext, key: &BucketKey) -> Result<(), StoreError> {
        (**self).delete(ctx, key).await
    }
}

/// Convenience methods available on every [`BucketStore`].
#[async_trait]
pub trait BucketStoreExt: BucketStore {
    /// Like [`BucketStore::get`], but maps `NotFound` to `Ok(None)`.
    ///
    /// All other errors are passed through untouched.
    async fn try_get(&self, ctx: &OpContext, key: &BucketKey) -> Result<Option<Tat>, StoreError> {
        match self.get(ctx, key).await {
            Ok(tat) => Ok(Some(tat)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<S: BucketStore + ?Sized> BucketStoreExt for S {}
