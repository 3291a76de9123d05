//! Error types for buffering, detection and chunking
//!
//! Every fallible operation in this crate returns [`ChunkError`]. The
//! variants follow the layered taxonomy used across the workspace: the
//! engine crate wraps these errors and adds its retry/checkpoint failures.

use crate::domain::buffer::Shape;
use thiserror::Error;

/// Errors raised by the core chunking primitives
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChunkError {
    /// Constructor or setter received an unusable parameter
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration
        reason: String,
    },

    /// Operation received an unusable argument
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument
        reason: String,
    },

    /// Operation requires at least one element
    #[error("Operation requires at least one element")]
    EmptyInput,

    /// Elements with different shapes were appended to one buffer
    #[error("Shape mismatch: buffer holds {expected} elements, got {found} elements")]
    ShapeMismatch {
        /// Shape already stored in the buffer
        expected: Shape,
        /// Shape of the rejected element
        found: Shape,
    },

    /// Window or index lies beyond the buffer
    #[error("Range {start}..{end} is out of bounds for length {len}")]
    OutOfRange {
        /// First requested index
        start: usize,
        /// Exclusive end of the requested range
        end: usize,
        /// Length of the buffer
        len: usize,
    },

    /// Optional serialization target is not compiled in
    #[error("{format} serialization is not available")]
    FormatUnavailable {
        /// Name of the requested format
        format: &'static str,
    },

    /// A detector met a value it cannot score (NaN or infinity)
    #[error("{strategy} detector met a non-finite value at index {index}")]
    MalformedWindow {
        /// Strategy that rejected the window
        strategy: &'static str,
        /// Buffer index of the offending element
        index: usize,
    },
}

impl ChunkError {
    /// Shorthand for [`ChunkError::InvalidConfig`]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        ChunkError::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ChunkError::InvalidArgument`]
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        ChunkError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// Only malformed windows count as transient; configuration and shape
    /// errors are raised where they are introduced and never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChunkError::MalformedWindow { .. })
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, ChunkError>;
