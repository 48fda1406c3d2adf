#![allow(dead_code)]

use async_trait::async_trait;
use bucketstore::{BucketKey, BucketStore, MemoryBucketStore, OpContext, StoreError, Tat};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Fixed reference time used as `T0` in scenarios.
pub fn t0() -> Tat {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

/// Store double that fails every operation with a backend error while `down` is set.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    inner: MemoryBucketStore,
    down: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn gate(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::backend(
                "flaky",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BucketStore for FlakyStore {
    async fn set(&self, ctx: &OpContext, key: &BucketKey, tat: Tat) -> Result<(), StoreError> {
        self.gate()?;
        self.inner.set(ctx, key, tat).await
    }

    async fn get(&self, ctx: &OpContext, key: &BucketKey) -> Result<Tat, StoreError> {
        self.gate()?;
        self.inner.get(ctx, key).await
    }

    async fn delete(&self, ctx: &OpContext, key: &BucketKey) -> Result<(), StoreError> {
        self.gate()?;
        self.inner.delete(ctx, key).await
    }
}

/// Store double that simulates a network round trip of `latency` per operation.
///
/// Work is driven through [`OpContext::run`], the way an I/O backend would.
#[derive(Debug, Clone)]
pub struct SlowStore {
    inner: MemoryBucketStore,
    latency: Duration,
}

impl SlowStore {
    pub fn new(latency: Duration) -> Self {
        Self { inner: MemoryBucketStore::new(), latency }
    }

    pub fn inner(&self) -> &MemoryBucketStore {
        &self.inner
    }
}

#[async_trait]
impl BucketStore for SlowStore {
    async fn set(&self, ctx: &OpContext, key: &BucketKey, tat: Tat) -> Result<(), StoreError> {
        ctx.run(async {
            tokio::time::sleep(self.latency).await;
            self.inner.set(&OpContext::background(), key, tat).await
        })
        .await
    }

    async fn get(&self, ctx: &OpContext, key: &BucketKey) -> Result<Tat, StoreError> {
        ctx.run(async {
            tokio::time::sleep(self.latency).await;
            self.inner.get(&OpContext::background(), key).await
        })
        .await
    }

    async fn delete(&self, ctx: &OpContext, key: &BucketKey) -> Result<(), StoreError> {
        ctx.run(async {
            tokio::time::sleep(self.latency).await;
            self.inner.delete(&OpContext::background(), key).await
        })
        .await
    }
}
