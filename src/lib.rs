#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # bucketstore
//!
//! State stores for GCRA / leaky-bucket rate limiters. A store keeps exactly
//! one value per bucket: its theoretical arrival time (TAT). The rate limiter
//! reads it, computes a new one, and writes it back.
//!
//! ## Features
//!
//! - **[`BucketStore`]** capability with `get`/`set`/`delete`, object safe
//! - **`NotFound` as a distinct error**, never a zero timestamp
//! - **Cancellation and deadlines** on every operation via [`OpContext`]
//! - **In-memory stores**: single-lock reference and per-shard locking
//! - **[`TracedStore`]** decorator for `tracing` logs
//!
//! ## Quick Start
//!
//! ```rust
//! use bucketstore::{BucketKey, BucketStore, MemoryBucketStore, OpContext};
//! use std::time::{Duration, SystemTime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bucketstore::StoreError> {
//!     let store = MemoryBucketStore::new();
//!     let ctx = OpContext::with_timeout(Duration::from_millis(50));
//!     let key = BucketKey::new("login", "alice");
//!
//!     let tat = match store.get(&ctx, &key).await {
//!         Ok(tat) => tat,
//!         Err(e) if e.is_not_found() => SystemTime::now(),
//!         Err(e) => return Err(e),
//!     };
//!     store.set(&ctx, &key, tat + Duration::from_secs(60)).await?;
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod key;
pub mod prelude;
pub mod store;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::StoreConfig;
pub use context::OpContext;
pub use error::{BoxError, ConfigError, StoreError};
pub use key::{BucketKey, Tat};
pub use store::{
    BucketStore, BucketStoreExt, MemoryBucketStore, ShardedMemoryBucketStore, TracedStore,
};
pub use tokio_util::sync::CancellationToken;
