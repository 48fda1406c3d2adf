//! In-memory bucket store with per-shard locking.
//!
//! Keys are partitioned across independently locked maps so a writer only
//! excludes readers and writers of keys hashed to the same shard.

use crate::config::StoreConfig;
use crate::context::OpContext;
use crate::error::{ConfigError, StoreError};
use crate::key::{BucketKey, Tat};
use crate::store::{BucketStore, MemoryBucketStore};
use async_trait::async_trait;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

#[cfg(feature = "ahash")]
use ahash::RandomState;
#[cfg(not(feature = "ahash"))]
use std::collections::hash_map::RandomState;

/// Sharded in-memory bucket store.
///
/// Each shard is a [`MemoryBucketStore`]; a key always maps to the same shard
/// for the lifetime of the store, so per-key linearizability is inherited
/// from the shard's lock. Clones share all shards.
#[derive(Clone)]
pub struct ShardedMemoryBucketStore {
    shards: Arc<[MemoryBucketStore]>,
    hasher: RandomState,
}

impl fmt::Debug for ShardedMemoryBucketStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedMemoryBucketStore").field("shards", &self.shards.len()).finish()
    }
}

impl ShardedMemoryBucketStore {
    /// Create a store with the default shard count (4 per available core).
    pub fn new() -> Self {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        Self::build(cores * 4)
    }

    /// Create a store with exactly `shards` shards.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidShardCount`] if `shards` is zero.
    pub fn with_shard_count(shards: usize) -> Result<Self, ConfigError> {
        if shards == 0 {
            return Err(ConfigError::InvalidShardCount { provided: shards });
        }
        Ok(Self::build(shards))
    }

    /// Create a store from validated configuration.
    pub fn from_config(config: &StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        match config.shards() {
            Some(n) => Self::with_shard_count(n),
            None => Ok(Self::new()),
        }
    }

    fn build(shards: usize) -> Self {
        Self {
            shards: (0..shards).map(|_| MemoryBucketStore::new()).collect(),
            hasher: RandomState::new(),
        }
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_index(&self, key: &BucketKey) -> usize {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    fn shard(&self, key: &BucketKey) -> &MemoryBucketStore {
        &self.shards[self.shard_index(key)]
    }
}

impl Default for ShardedMemoryBucketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BucketStore for ShardedMemoryBucketStore {
    async fn set(&self, ctx: &OpContext, key: &BucketKey, tat: Tat) -> Result<(), StoreError> {
        self.shard(key).set(ctx, key, tat).await
    }

    async fn get(&self, ctx: &OpContext, key: &BucketKey) -> Result<Tat, StoreError> {
        self.shard(key).get(ctx, key).await
    }

    async fn delete(&self, ctx: &OpContext, key: &BucketKey) -> Result<(), StoreError> {
        self.shard(key).delete(ctx, key).await
    }
}
