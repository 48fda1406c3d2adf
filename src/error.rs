//! Error types for bucket stores

use crate::key::BucketKey;
use std::time::Duration;

/// Boxed error produced by a store backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for all [`BucketStore`](crate::BucketStore) operations.
///
/// Only [`StoreError::NotFound`] is an expected outcome; callers use it to
/// compute a bucket's first TAT. Everything else should be escalated.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// No TAT is stored for the key (never set, or deleted).
    #[error("bucket not found: {key}")]
    NotFound { key: BucketKey },

    /// The backend failed (I/O, connectivity, internal error).
    #[error("{backend} backend failure: {source}")]
    Backend {
        /// Short name of the failing backend, e.g. `"redis"`.
        backend: &'static str,
        #[source]
        source: BoxError,
    },

    /// The caller cancelled the operation.
    #[error("operation cancelled by caller")]
    Cancelled,

    /// The caller's deadline passed before the operation completed.
    #[error("deadline exceeded ({deadline_elapsed:?} past deadline)")]
    DeadlineExceeded {
        /// How far past the deadline the operation was when it gave up.
        deadline_elapsed: Duration,
    },
}

impl StoreError {
    /// Construct a `NotFound` error for `key`.
    pub fn not_found(key: &BucketKey) -> Self {
        StoreError::NotFound { key: key.clone() }
    }

    /// Wrap a backend-specific failure.
    pub fn backend<E>(backend: &'static str, err: E) -> Self
    where
        E: Into<BoxError>,
    {
        StoreError::Backend { backend, source: err.into() }
    }

    /// Check if the key had no stored TAT.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a backend failure.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// Check if the caller cancelled the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if the caller's deadline passed.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }

    /// Check if the failure was caller-initiated (cancellation or deadline).
    ///
    /// Callers typically skip alerting on these.
    pub fn is_cancellation(&self) -> bool {
        self.is_cancelled() || self.is_deadline_exceeded()
    }

    /// The key carried by a `NotFound` error.
    pub fn not_found_key(&self) -> Option<&BucketKey> {
        match self {
            Self::NotFound { key } => Some(key),
            _ => None,
        }
    }

    /// Name of the failing backend, if this is a backend failure.
    pub fn backend_name(&self) -> Option<&'static str> {
        match self {
            Self::Backend { backend, .. } => Some(backend),
            _ => None,
        }
    }
}

/// Errors produced when validating store configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Shard count must be > 0.
    #[error("shards must be > 0 (got {provided})")]
    InvalidShardCount {
        /// Value provided by caller.
        provided: usize,
    },
    /// Per-operation timeout must be > 0 when set.
    #[error("op_timeout must be > 0 when set (got {0:?})")]
    InvalidTimeout(Duration),
}
