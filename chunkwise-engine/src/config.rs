//! Configuration for resilient processing

use crate::error::{EngineError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration constants
pub mod defaults {
    use std::time::Duration;

    /// Elements per batch
    pub const BATCH_SIZE: usize = 1024;

    /// Bound on the bytes buffered for one batch (1 MiB)
    pub const MAX_BUFFERED_BYTES: usize = 1024 * 1024;

    /// Retries per batch before the failure becomes terminal
    pub const RETRY_LIMIT: u32 = 3;

    /// Checkpoint files kept on disk
    pub const HISTORY_SIZE: usize = 2;

    /// Delay before the first retry
    pub const BACKOFF_BASE: Duration = Duration::from_millis(10);

    /// Upper bound on the retry delay
    pub const BACKOFF_MAX: Duration = Duration::from_secs(1);
}

/// Validated processor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceConfig {
    checkpoint_dir: PathBuf,
    max_buffered_bytes: usize,
    batch_size: usize,
    retry_limit: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    history_size: usize,
    strict_resume: bool,
}

impl ResilienceConfig {
    /// Configuration with the four required bounds and defaults elsewhere
    pub fn new(
        checkpoint_dir: impl Into<PathBuf>,
        max_buffered_bytes: usize,
        batch_size: usize,
        retry_limit: u32,
    ) -> Result<Self> {
        Self::builder()
            .checkpoint_dir(checkpoint_dir)
            .max_buffered_bytes(max_buffered_bytes)
            .batch_size(batch_size)
            .retry_limit(retry_limit)
            .build()
    }

    /// Create a configuration builder
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::new()
    }

    /// Directory owned by this processor
    pub fn checkpoint_dir(&self) -> &Path {
        &self.checkpoint_dir
    }

    /// Bound on bytes buffered for one batch
    pub fn max_buffered_bytes(&self) -> usize {
        self.max_buffered_bytes
    }

    /// Requested elements per batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Retries allowed per batch
    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Delay before the first retry
    pub fn backoff_base(&self) -> Duration {
        self.backoff_base
    }

    /// Upper bound on the retry delay
    pub fn backoff_max(&self) -> Duration {
        self.backoff_max
    }

    /// Checkpoint files kept on disk
    pub fn history_size(&self) -> usize {
        self.history_size
    }

    /// Whether an unusable checkpoint is an error instead of a fresh start
    pub fn strict_resume(&self) -> bool {
        self.strict_resume
    }

    /// Elements per batch for elements of `element_bytes` bytes: the batch
    /// size, reduced so one batch stays within the byte bound
    pub fn batch_elements(&self, element_bytes: usize) -> Result<usize> {
        let element_bytes = element_bytes.max(1);
        let fitting = self.max_buffered_bytes / element_bytes;
        if fitting == 0 {
            return Err(EngineError::ResourceLimit {
                required: element_bytes,
                limit: self.max_buffered_bytes,
            });
        }
        Ok(self.batch_size.min(fitting))
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`,
    /// capped at the maximum
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.backoff_base
            .checked_mul(1u32 << exponent)
            .map_or(self.backoff_max, |delay| delay.min(self.backoff_max))
    }
}

/// Fluent builder for [`ResilienceConfig`]
#[derive(Debug, Clone)]
pub struct ResilienceConfigBuilder {
    checkpoint_dir: Option<PathBuf>,
    max_buffered_bytes: usize,
    batch_size: usize,
    retry_limit: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    history_size: usize,
    strict_resume: bool,
}

impl Default for ResilienceConfigBuilder {
    fn default() -> Self {
        Self {
            checkpoint_dir: None,
            max_buffered_bytes: defaults::MAX_BUFFERED_BYTES,
            batch_size: defaults::BATCH_SIZE,
            retry_limit: defaults::RETRY_LIMIT,
            backoff_base: defaults::BACKOFF_BASE,
            backoff_max: defaults::BACKOFF_MAX,
            history_size: defaults::HISTORY_SIZE,
            strict_resume: false,
        }
    }
}

impl ResilienceConfigBuilder {
    /// Create a builder with default bounds and no checkpoint directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the checkpoint directory (required)
    pub fn checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    /// Set the buffered-bytes bound
    pub fn max_buffered_bytes(mut self, bytes: usize) -> Self {
        self.max_buffered_bytes = bytes;
        self
    }

    /// Set the batch size in elements
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the retry limit
    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    /// Set the first retry delay
    pub fn backoff_base(mut self, delay: Duration) -> Self {
        self.backoff_base = delay;
        self
    }

    /// Set the retry delay cap
    pub fn backoff_max(mut self, delay: Duration) -> Self {
        self.backoff_max = delay;
        self
    }

    /// Set the number of checkpoint files kept
    pub fn history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    /// Fail instead of starting fresh when the checkpoint is unusable
    pub fn strict_resume(mut self, strict: bool) -> Self {
        self.strict_resume = strict;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<ResilienceConfig> {
        let checkpoint_dir = self
            .checkpoint_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| EngineError::invalid_config("checkpoint_dir is required"))?;

        if self.max_buffered_bytes == 0 {
            return Err(EngineError::invalid_config(
                "max_buffered_bytes must be greater than 0",
            ));
        }
        if self.batch_size == 0 {
            return Err(EngineError::invalid_config("batch_size must be greater than 0"));
        }
        if self.retry_limit == 0 {
            return Err(EngineError::invalid_config("retry_limit must be greater than 0"));
        }
        if self.history_size == 0 {
            return Err(EngineError::invalid_config("history_size must be greater than 0"));
        }
        if self.backoff_base > self.backoff_max {
            return Err(EngineError::invalid_config(
                "backoff_base must not exceed backoff_max",
            ));
        }

        Ok(ResilienceConfig {
            checkpoint_dir,
            max_buffered_bytes: self.max_buffered_bytes,
            batch_size: self.batch_size,
            retry_limit: self.retry_limit,
            backoff_base: self.backoff_base,
            backoff_max: self.backoff_max,
            history_size: self.history_size,
            strict_resume: self.strict_resume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_bounds_validated() {
        assert!(ResilienceConfig::new("ckpt", 1024, 16, 3).is_ok());

        for (bytes, batch, retries) in [(0, 16, 3), (1024, 0, 3), (1024, 16, 0)] {
            let err = ResilienceConfig::new("ckpt", bytes, batch, retries).unwrap_err();
            assert!(matches!(err, EngineError::InvalidConfig { .. }));
        }

        let err = ResilienceConfig::builder().build().unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { .. }));
    }

    #[test]
    fn test_batch_elements_respects_byte_bound() {
        let config = ResilienceConfig::new("ckpt", 64, 100, 3).unwrap();
        assert_eq!(config.batch_elements(8).unwrap(), 8);
        assert_eq!(config.batch_elements(16).unwrap(), 4);

        let roomy = ResilienceConfig::new("ckpt", 1 << 20, 100, 3).unwrap();
        assert_eq!(roomy.batch_elements(8).unwrap(), 100);

        let tiny = ResilienceConfig::new("ckpt", 1, 100, 3).unwrap();
        assert!(matches!(
            tiny.batch_elements(8),
            Err(EngineError::ResourceLimit {
                required: 8,
                limit: 1
            })
        ));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = ResilienceConfig::builder()
            .checkpoint_dir("ckpt")
            .backoff_base(Duration::from_millis(10))
            .backoff_max(Duration::from_millis(50))
            .build()
            .unwrap();
        assert_eq!(config.backoff_delay(1), Duration::from_millis(10));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(20));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(40));
        assert_eq!(config.backoff_delay(4), Duration::from_millis(50));
        assert_eq!(config.backoff_delay(40), Duration::from_millis(50));
    }
}
