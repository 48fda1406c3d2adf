use crate::context::OpContext;
use crate::error::StoreError;
use crate::key::{BucketKey, Tat};
use crate::store::BucketStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Map = HashMap<BucketKey, Tat>;

/// Simple in-memory bucket store.
///
/// One map guarded by one reader/writer lock: `get` takes the read lock,
/// `set` and `delete` take the write lock, each only for the map access
/// itself. Clones share the same map. Entries live until deleted or until the
/// last clone is dropped; there is no eviction.
#[derive(Default, Clone, Debug)]
pub struct MemoryBucketStore {
    pub(super) data: Arc<RwLock<Map>>,
}

impl MemoryBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A writer can only be interrupted between whole inserts/removes, so a
    // poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Map> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Map> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BucketStore for MemoryBucketStore {
    async fn set(&self, ctx: &OpContext, key: &BucketKey, tat: Tat) -> Result<(), StoreError> {
        ctx.check()?;
        self.write().insert(key.clone(), tat);
        Ok(())
    }

    async fn get(&self, ctx: &OpContext, key: &BucketKey) -> Result<Tat, StoreError> {
        ctx.check()?;
        let tat = self.read().get(key).copied();
        tat.ok_or_else(|| StoreError::not_found(key))
    }

    async fn delete(&self, ctx: &OpContext, key: &BucketKey) -> Result<(), StoreError> {
        ctx.check()?;
        self.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::sync::mpsc;
    use std::time::{Duration, SystemTime};
    use tokio_util::sync::CancellationToken;

    fn at(secs: u64) -> Tat {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryBucketStore::new();
        let err = store.get(&OpContext::background(), &BucketKey::new("login", "x")).await;
        assert!(err.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = MemoryBucketStore::new();
        let ctx = OpContext::background();
        let key = BucketKey::new("login", "alice");
        store.set(&ctx, &key, at(10)).await.unwrap();
        store.set(&ctx, &key, at(5)).await.unwrap();
        assert_eq!(store.get(&ctx, &key).await.unwrap(), at(5));
    }

    #[tokio::test]
    async fn epoch_is_a_valid_tat() {
        let store = MemoryBucketStore::new();
        let ctx = OpContext::background();
        let key = BucketKey::from("zero");
        store.set(&ctx, &key, SystemTime::UNIX_EPOCH).await.unwrap();
        assert_eq!(store.get(&ctx, &key).await.unwrap(), SystemTime::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn delete_absent_is_ok() {
        let store = MemoryBucketStore::new();
        let ctx = OpContext::background();
        let key = BucketKey::from("never");
        store.delete(&ctx, &key).await.unwrap();
        store.delete(&ctx, &key).await.unwrap();
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store = MemoryBucketStore::new();
        let ctx = OpContext::background();
        let a = BucketKey::new("login", "a");
        let b = BucketKey::new("signup", "a");
        store.set(&ctx, &a, at(1)).await.unwrap();
        store.set(&ctx, &b, at(2)).await.unwrap();
        store.delete(&ctx, &a).await.unwrap();
        assert!(store.get(&ctx, &a).await.unwrap_err().is_not_found());
        assert_eq!(store.get(&ctx, &b).await.unwrap(), at(2));
    }

    #[tokio::test]
    async fn cancelled_context_leaves_state_untouched() {
        let store = MemoryBucketStore::new();
        let key = BucketKey::new("login", "alice");
        store.set(&OpContext::background(), &key, at(1)).await.unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let ctx = OpContext::with_cancellation(token);
        assert!(store.set(&ctx, &key, at(2)).await.unwrap_err().is_cancelled());
        assert!(store.delete(&ctx, &key).await.unwrap_err().is_cancelled());
        assert!(store.get(&ctx, &key).await.unwrap_err().is_cancelled());

        assert_eq!(store.get(&OpContext::background(), &key).await.unwrap(), at(1));
    }

    #[tokio::test]
    async fn survives_poisoned_lock() {
        let store = MemoryBucketStore::new();
        let ctx = OpContext::background();
        let key = BucketKey::from("k");
        store.set(&ctx, &key, at(3)).await.unwrap();

        let clone = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.data.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(store.data.is_poisoned());

        assert_eq!(store.get(&ctx, &key).await.unwrap(), at(3));
        store.set(&ctx, &key, at(4)).await.unwrap();
        assert_eq!(store.get(&ctx, &key).await.unwrap(), at(4));
    }

    #[test]
    fn readers_of_other_keys_proceed_while_a_read_is_held() {
        let store = MemoryBucketStore::new();
        let ctx = OpContext::background();
        let other = BucketKey::new("login", "bob");
        block_on(store.set(&ctx, &other, at(9))).unwrap();

        let held = store.data.read().unwrap();
        let (tx, rx) = mpsc::channel();
        let reader = store.clone();
        let handle = std::thread::spawn(move || {
            let _ = tx.send(block_on(reader.get(&OpContext::background(), &other)));
        });

        let got = rx.recv_timeout(Duration::from_secs(1)).expect("get blocked behind a reader");
        assert_eq!(got.unwrap(), at(9));
        drop(held);
        handle.join().unwrap();
    }
}
