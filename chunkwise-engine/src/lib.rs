//! Resilient execution of chunkwise detectors over long sequences
//!
//! This crate wraps a boundary detector from `chunkwise-core` with bounded
//! batching, durable checkpoints and retry of transient failures.
//!
//! ```no_run
//! use chunkwise_core::{BoundaryDetector, FixedSizeDetector, SequenceBuffer};
//! use chunkwise_engine::{ResilienceConfig, ResilientProcessor};
//!
//! let config = ResilienceConfig::new("checkpoints", 1 << 20, 4096, 3)?;
//! let detector = FixedSizeDetector::new(128)?;
//! let mut processor = ResilientProcessor::new(config, BoundaryDetector::from(detector))?;
//!
//! let data = SequenceBuffer::from_scalars(&vec![0.0; 10_000]);
//! let chunks = processor.process(&data)?;
//! assert_eq!(chunks.len(), 10_000usize.div_ceil(128));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod processor;
pub mod state;

pub use checkpoint::{
    Checkpoint, CheckpointEnvelope, CheckpointStore, ConfigSnapshot, CHECKPOINT_SCHEMA_VERSION,
};
pub use config::{ResilienceConfig, ResilienceConfigBuilder};
pub use error::{EngineError, Result};
pub use processor::{BatchChunker, ResilientProcessor};
pub use state::{ProcessingAttempt, ProcessorState};

// Re-export from core for convenience
pub use chunkwise_core::{BoundaryDetector, Chunk, DetectorConfig, SequenceBuffer};
