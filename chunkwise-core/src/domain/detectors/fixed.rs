//! Fixed-size segmentation

use super::BoundaryStrategy;
use crate::domain::buffer::SequenceBuffer;
use crate::domain::cut_points::CutPointSet;
use crate::error::{ChunkError, Result};

/// Cuts every `chunk_size` elements; the remainder forms a shorter final chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSizeDetector {
    chunk_size: usize,
}

impl FixedSizeDetector {
    /// Create a detector; `chunk_size` must be positive
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ChunkError::invalid_config("chunk size must be greater than 0"));
        }
        Ok(Self { chunk_size })
    }

    /// Elements per chunk
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl BoundaryStrategy for FixedSizeDetector {
    fn name(&self) -> &'static str {
        "fixed_size"
    }

    fn window_size(&self) -> usize {
        self.chunk_size
    }

    fn threshold(&self) -> f64 {
        0.0
    }

    fn detect(&self, buffer: &SequenceBuffer) -> Result<CutPointSet> {
        let len = buffer.len();
        if len == 0 {
            return Err(ChunkError::EmptyInput);
        }
        let cuts = (self.chunk_size..len).step_by(self.chunk_size);
        CutPointSet::from_boundaries(cuts, len)
    }
}
