//! Configuration module
//!
//! The CLI reads an optional TOML file with `[detector]`, `[resilience]` and
//! `[output]` sections. Missing sections and fields take their defaults, and
//! command-line flags override what the file says.

use anyhow::{Context, Result};
use chunkwise_core::DetectorConfig;
use chunkwise_engine::config::defaults;
use chunkwise_engine::ResilienceConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CliError;

/// CLI configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct CliConfig {
    /// Boundary detector parameters
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Checkpointed processing bounds
    #[serde(default)]
    pub resilience: ResilienceSection,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

impl CliConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&source)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Load `path` if given, otherwise the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse TOML text
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| CliError::ConfigError(e.to_string()).into())
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

/// `[resilience]` section; durations are in milliseconds
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResilienceSection {
    /// Directory holding checkpoint files
    pub checkpoint_dir: PathBuf,
    /// Bound on bytes buffered for one batch
    pub max_buffered_bytes: usize,
    /// Elements per batch
    pub batch_size: usize,
    /// Retries per batch
    pub retry_limit: u32,
    /// Delay before the first retry
    pub backoff_base_ms: u64,
    /// Cap on the retry delay
    pub backoff_max_ms: u64,
    /// Checkpoint files kept
    pub history_size: usize,
    /// Fail instead of starting fresh on an unusable checkpoint
    pub strict_resume: bool,
}

impl Default for ResilienceSection {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from(".chunkwise/checkpoints"),
            max_buffered_bytes: defaults::MAX_BUFFERED_BYTES,
            batch_size: defaults::BATCH_SIZE,
            retry_limit: defaults::RETRY_LIMIT,
            backoff_base_ms: defaults::BACKOFF_BASE.as_millis() as u64,
            backoff_max_ms: defaults::BACKOFF_MAX.as_millis() as u64,
            history_size: defaults::HISTORY_SIZE,
            strict_resume: false,
        }
    }
}

impl ResilienceSection {
    /// Validated engine configuration
    pub fn to_resilience_config(&self) -> Result<ResilienceConfig> {
        ResilienceConfig::builder()
            .checkpoint_dir(&self.checkpoint_dir)
            .max_buffered_bytes(self.max_buffered_bytes)
            .batch_size(self.batch_size)
            .retry_limit(self.retry_limit)
            .backoff_base(Duration::from_millis(self.backoff_base_ms))
            .backoff_max(Duration::from_millis(self.backoff_max_ms))
            .history_size(self.history_size)
            .strict_resume(self.strict_resume)
            .build()
            .map_err(|e| CliError::ConfigError(e.to_string()).into())
    }
}

/// Output-related configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (`text`, `json` or `markdown`)
    pub default_format: String,

    /// Pretty print JSON output
    pub pretty_json: bool,

    /// Include chunk values in text and markdown output
    pub include_values: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "text".to_string(),
            pretty_json: true,
            include_values: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkwise_core::StrategyKind;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = CliConfig::from_toml_str(
            r#"
[detector]
strategy = "neural"
window_size = 6

[resilience]
batch_size = 256
"#,
        )
        .unwrap();

        assert_eq!(config.detector.strategy, StrategyKind::Neural);
        assert_eq!(config.detector.window_size, 6);
        assert_eq!(config.detector.threshold, 0.5);
        assert_eq!(config.resilience.batch_size, 256);
        assert_eq!(config.resilience.retry_limit, defaults::RETRY_LIMIT);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let rendered = CliConfig::default().to_toml_string().unwrap();
        assert!(rendered.contains("[detector]"));
        assert!(rendered.contains("[resilience]"));
        assert_eq!(CliConfig::from_toml_str(&rendered).unwrap(), CliConfig::default());
    }

    #[test]
    fn test_invalid_resilience_section_rejected() {
        let section = ResilienceSection {
            retry_limit: 0,
            ..ResilienceSection::default()
        };
        let err = section.to_resilience_config().unwrap_err();
        assert!(err.to_string().contains("retry_limit"));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let err = CliConfig::from_toml_str("[detector]\nstrategy = \"fourier\"\n").unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
