//! Windowed boundary detection and chunking for numeric sequences
//!
//! This crate segments ordered 1D, 2D and 3D numeric sequences into
//! contiguous chunks. A [`SequenceBuffer`] holds the data, a
//! [`BoundaryDetector`] turns it into a [`CutPointSet`], and the
//! [`Chunker`] materializes the chunk payloads, which the
//! [`QualityAnalyzer`] can score.
//!
//! # Architecture
//!
//! - **Domain layer**: buffer storage, cut points and the detector family
//! - **Application layer**: chunk materialization, quality metrics and
//!   detector configuration
//! - **Serialization**: chunk set encodings
//!
//! # Example
//!
//! ```rust
//! use chunkwise_core::{BoundaryStrategy, Chunker, NeuralDetector};
//!
//! let mut chunker = Chunker::new(4).unwrap();
//! chunker.add(vec![0.0; 12]).unwrap();
//! chunker.add(vec![10.0; 12]).unwrap();
//!
//! let detector = NeuralDetector::new(4, 0.5).unwrap();
//! let chunks = chunker.chunk_with(&detector).unwrap();
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].start(), 12);
//! assert_eq!(detector.window_size(), 4);
//! ```

#![warn(missing_docs)]

pub mod application;
pub mod domain;
pub mod error;
pub mod serialization;

pub use application::{
    materialize, Chunk, Chunker, DetectorConfig, QualityAnalyzer, SizeMetrics, StrategyKind,
};
pub use domain::{
    dtw_distance, BoundaryDetector, BoundaryStrategy, CutPointSet, DtwDetector,
    Element, EntropyDetector, FixedSizeDetector, IntoElements, MutualInformationDetector,
    NeuralDetector, SequenceBuffer, Shape, ThresholdDetector, VarianceDetector,
    WaveletDetector, Window,
};
pub use error::{ChunkError, Result};
pub use serialization::{ChunkDocument, ChunkSerializer};
