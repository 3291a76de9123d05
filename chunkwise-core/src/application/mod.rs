//! Application layer: chunk materialization, scoring and configuration
//!
//! Orchestrates the domain detectors over a [`SequenceBuffer`] without
//! adding detection logic of its own.
//!
//! # Example
//!
//! ```rust
//! use chunkwise_core::application::{Chunker, QualityAnalyzer};
//!
//! let mut chunker = Chunker::new(2).unwrap();
//! chunker.add(vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
//!
//! let chunks = chunker.chunk_by_size(2).unwrap();
//! assert_eq!(chunks.len(), 3);
//!
//! let score = QualityAnalyzer::new().compute_quality_score(&chunks).unwrap();
//! assert!((0.0..=1.0).contains(&score));
//! ```
//!
//! [`SequenceBuffer`]: crate::domain::SequenceBuffer

pub mod chunker;
pub mod config;
pub mod quality;

pub use chunker::{materialize, Chunk, Chunker};
pub use config::{DetectorConfig, StrategyKind};
pub use quality::{QualityAnalyzer, SizeMetrics};
