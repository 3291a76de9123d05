//! Layered error types
//!
//! [`EngineError`] wraps the core [`ChunkError`] and adds the failures of
//! resilient execution: transient batch failures, the terminal chunking
//! failure raised once retries are exhausted, and checkpoint problems.

use chunkwise_core::ChunkError;
use std::path::PathBuf;
use thiserror::Error;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Core chunking error that retrying cannot fix
    #[error("core chunking error: {0}")]
    Core(#[from] ChunkError),

    /// Processor construction received an unusable bound
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration
        reason: String,
    },

    /// Recoverable batch failure, retried by the processor
    #[error("transient processing failure at offset {offset}: {reason}")]
    TransientProcessing {
        /// Input offset of the failing element
        offset: usize,
        /// Underlying failure
        reason: String,
    },

    /// Terminal failure after the retry limit was exceeded
    #[error(
        "chunking failed at offset {offset} using {strategy} ({parameters}) after {attempts} attempts"
    )]
    Chunking {
        /// Input offset of the batch that failed
        offset: usize,
        /// Strategy name
        strategy: String,
        /// Strategy parameters
        parameters: String,
        /// Attempts made, including the first
        attempts: u32,
        /// Last underlying error
        #[source]
        source: Box<EngineError>,
    },

    /// A checkpoint file failed validation
    #[error("corrupt checkpoint {}: {reason}", path.display())]
    CorruptCheckpoint {
        /// Offending file
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// A valid checkpoint belongs to a different run
    #[error("checkpoint does not match this run: {reason}")]
    CheckpointMismatch {
        /// Which field disagreed
        reason: String,
    },

    /// A checkpoint was requested before any progress existed
    #[error("no progress to checkpoint: run process or restore_from_checkpoint first")]
    NoProgress,

    /// A single element does not fit the buffered-bytes bound
    #[error("resource limit exceeded: element needs {required} bytes, limit is {limit} bytes")]
    ResourceLimit {
        /// Bytes needed by one element
        required: usize,
        /// Configured bound
        limit: usize,
    },

    /// I/O failure on the checkpoint directory
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    /// Shorthand for [`EngineError::InvalidConfig`]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the processor retries this error
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::TransientProcessing { .. } => true,
            EngineError::Core(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Input offset carried by the error, if any
    pub fn offset(&self) -> Option<usize> {
        match self {
            EngineError::TransientProcessing { offset, .. }
            | EngineError::Chunking { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
