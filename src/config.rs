//! Store configuration.

use crate::context::OpContext;
use crate::error::ConfigError;
use std::time::Duration;

/// Validated configuration for in-process stores and the contexts used with them.
///
/// With the `serde` feature enabled this deserializes from e.g.
/// `{"shards": 16, "op_timeout_ms": 50}`; both fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct StoreConfig {
    shards: Option<usize>,
    #[cfg_attr(feature = "serde", serde(rename = "op_timeout_ms", with = "millis"))]
    op_timeout: Option<Duration>,
}

impl StoreConfig {
    /// Create a config with validation.
    pub fn new(shards: Option<usize>, op_timeout: Option<Duration>) -> Result<Self, ConfigError> {
        let cfg = Self { shards, op_timeout };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Set the shard count used by [`ShardedMemoryBucketStore`](crate::ShardedMemoryBucketStore).
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = Some(shards);
        self
    }

    /// Set the per-operation timeout applied by [`StoreConfig::context`].
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = Some(timeout);
        self
    }

    /// Configured shard count, `None` for the default.
    pub fn shards(&self) -> Option<usize> {
        self.shards
    }

    /// Configured per-operation timeout, `None` for no timeout.
    pub fn op_timeout(&self) -> Option<Duration> {
        self.op_timeout
    }

    /// Check invariants: shards > 0 and timeout > 0 when set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(0) = self.shards {
            return Err(ConfigError::InvalidShardCount { provided: 0 });
        }
        if let Some(t) = self.op_timeout {
            if t.is_zero() {
                return Err(ConfigError::InvalidTimeout(t));
            }
        }
        Ok(())
    }

    /// A fresh operation context honoring the configured timeout.
    ///
    /// The deadline starts counting when this is called.
    pub fn context(&self) -> OpContext {
        match self.op_timeout {
            Some(t) => OpContext::with_timeout(t),
            None => OpContext::background(),
        }
    }
}

#[cfg(feature = "serde")]
mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(d: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
