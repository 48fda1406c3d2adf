//! Convenient re-exports for common bucketstore types.
pub use crate::{
    clock::{Clock, FakeClock, SystemClock},
    context::OpContext,
    error::{ConfigError, StoreError},
    key::{BucketKey, Tat},
    store::{BucketStore, BucketStoreExt, MemoryBucketStore, ShardedMemoryBucketStore, TracedStore},
    StoreConfig,
};
