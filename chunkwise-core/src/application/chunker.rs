//! Chunk materialization
//!
//! The [`Chunker`] owns a [`SequenceBuffer`] and turns the cut points of a
//! detector into owned [`Chunk`] payloads.

use crate::domain::buffer::{IntoElements, SequenceBuffer, Shape};
use crate::domain::cut_points::CutPointSet;
use crate::domain::detectors::{BoundaryStrategy, FixedSizeDetector, ThresholdDetector};
use crate::error::{ChunkError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Contiguous copy of buffer elements between two cut points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    start: usize,
    len: usize,
    shape: Shape,
    values: Vec<f64>,
}

impl Chunk {
    /// Copy `range` out of `buffer`
    pub fn from_buffer(buffer: &SequenceBuffer, range: Range<usize>) -> Result<Self> {
        let start = range.start;
        let window = buffer.window(start, range.len())?;
        if window.is_empty() {
            return Err(ChunkError::EmptyInput);
        }
        Ok(Self {
            start,
            len: window.len(),
            shape: buffer.shape().cloned().unwrap_or_else(Shape::scalar),
            values: window.values().to_vec(),
        })
    }

    /// Index of the first element in the source sequence
    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end index in the source sequence
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Index range in the source sequence
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Chunks always hold at least one element
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Flat element components
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Elements as component slices
    pub fn elements(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.shape.width().max(1))
    }

    /// Per-element scalar feature (the value, or the mean of components)
    pub fn projection(&self) -> Vec<f64> {
        let width = self.shape.width().max(1);
        if width == 1 {
            return self.values.clone();
        }
        self.elements()
            .map(|element| element.iter().sum::<f64>() / width as f64)
            .collect()
    }

    /// Same payload positioned `offset` elements later in the source
    pub fn rebased(mut self, offset: usize) -> Self {
        self.start += offset;
        self
    }
}

/// Copy each cut point range of `buffer` into a chunk
pub fn materialize(buffer: &SequenceBuffer, cuts: &CutPointSet) -> Result<Vec<Chunk>> {
    if cuts.total_len() != buffer.len() {
        return Err(ChunkError::invalid_argument(format!(
            "cut points cover {} elements but the buffer holds {}",
            cuts.total_len(),
            buffer.len()
        )));
    }
    cuts.ranges()
        .map(|range| Chunk::from_buffer(buffer, range))
        .collect()
}

/// Owns a sequence and splits it into chunks
#[derive(Debug, Clone, PartialEq)]
pub struct Chunker {
    buffer: SequenceBuffer,
    chunk_size: usize,
}

impl Chunker {
    /// Create an empty chunker with a default chunk size; zero is rejected
    pub fn new(chunk_size: usize) -> Result<Self> {
        Self::with_buffer(chunk_size, SequenceBuffer::new())
    }

    /// Create a chunker over existing data
    pub fn with_buffer(chunk_size: usize, buffer: SequenceBuffer) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ChunkError::invalid_config("chunk size must be greater than 0"));
        }
        Ok(Self { buffer, chunk_size })
    }

    /// Append one element or a batch of elements
    pub fn add(&mut self, items: impl IntoElements) -> Result<()> {
        self.buffer.append(items)
    }

    /// Underlying sequence
    pub fn buffer(&self) -> &SequenceBuffer {
        &self.buffer
    }

    /// Chunk size given at construction
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of buffered elements
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been added yet
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Chunks of the construction size
    pub fn chunks(&self) -> Result<Vec<Chunk>> {
        self.chunk_by_size(self.chunk_size)
    }

    /// Number of chunks [`Chunker::chunks`] produces
    pub fn chunk_count(&self) -> usize {
        self.buffer.len().div_ceil(self.chunk_size)
    }

    /// Chunk `index` of [`Chunker::chunks`]
    pub fn chunk(&self, index: usize) -> Result<Chunk> {
        let start = index.saturating_mul(self.chunk_size);
        if start >= self.buffer.len() {
            return Err(ChunkError::OutOfRange {
                start: index,
                end: index.saturating_add(1),
                len: self.chunk_count(),
            });
        }
        let end = (start + self.chunk_size).min(self.buffer.len());
        Chunk::from_buffer(&self.buffer, start..end)
    }

    /// Chunks of `n` elements, the last possibly shorter
    pub fn chunk_by_size(&self, n: usize) -> Result<Vec<Chunk>> {
        if n == 0 {
            return Err(ChunkError::invalid_argument("chunk size must be greater than 0"));
        }
        let detector = FixedSizeDetector::new(n)?;
        self.chunk_with(&detector)
    }

    /// New chunk wherever consecutive elements differ by more than `threshold`
    pub fn chunk_by_threshold(&self, threshold: f64) -> Result<Vec<Chunk>> {
        let detector = ThresholdDetector::new(threshold)?;
        self.chunk_with(&detector)
    }

    /// New chunk before every element, other than the first, for which
    /// `predicate` holds
    pub fn chunk_by_predicate<P>(&self, predicate: P) -> Result<Vec<Chunk>>
    where
        P: Fn(&[f64]) -> bool,
    {
        self.require_elements()?;
        let cuts = self
            .buffer
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, element)| predicate(*element))
            .map(|(i, _)| i);
        self.materialize_boundaries(cuts)
    }

    /// Greedy chunks whose projected sum stays at or below `target`. An
    /// element that alone exceeds the target still forms its own chunk.
    pub fn chunk_by_sum(&self, target: f64) -> Result<Vec<Chunk>> {
        if !target.is_finite() {
            return Err(ChunkError::invalid_argument(format!(
                "target sum must be finite, got {target}"
            )));
        }
        self.require_elements()?;
        let mut cuts = Vec::new();
        let mut sum = 0.0;
        for (i, x) in self.buffer.projection().into_iter().enumerate() {
            if i > 0 && sum + x > target {
                cuts.push(i);
                sum = 0.0;
            }
            sum += x;
        }
        self.materialize_boundaries(cuts)
    }

    /// Runs of strictly increasing or non-increasing projected values.
    /// After a break the direction is re-read from the next pair.
    pub fn chunk_by_monotonicity(&self) -> Result<Vec<Chunk>> {
        self.require_elements()?;
        let x = self.buffer.projection();
        let mut cuts = Vec::new();
        if x.len() >= 2 {
            let mut increasing = x[1] > x[0];
            for i in 1..x.len() {
                if (x[i] > x[i - 1]) != increasing {
                    cuts.push(i);
                    if i + 1 < x.len() {
                        increasing = x[i + 1] > x[i];
                    }
                }
            }
        }
        self.materialize_boundaries(cuts)
    }

    /// New chunk where a projected value is more than `threshold` away from
    /// the mean of the open chunk
    pub fn chunk_by_similarity(&self, threshold: f64) -> Result<Vec<Chunk>> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ChunkError::invalid_argument(format!(
                "similarity threshold must be a finite non-negative number, got {threshold}"
            )));
        }
        self.require_elements()?;
        let mut cuts = Vec::new();
        let (mut sum, mut count) = (0.0, 0usize);
        for (i, x) in self.buffer.projection().into_iter().enumerate() {
            if count > 0 && (x - sum / count as f64).abs() > threshold {
                cuts.push(i);
                sum = 0.0;
                count = 0;
            }
            sum += x;
            count += 1;
        }
        self.materialize_boundaries(cuts)
    }

    /// Chunks from any boundary detector
    pub fn chunk_with<D: BoundaryStrategy + ?Sized>(&self, detector: &D) -> Result<Vec<Chunk>> {
        let cuts = detector.detect(&self.buffer)?;
        materialize(&self.buffer, &cuts)
    }

    /// Split into `n` balanced chunks; the first `len % n` are one longer.
    /// Asking for more chunks than elements yields one chunk per element.
    pub fn chunk_into_n(&self, n: usize) -> Result<Vec<Chunk>> {
        if n == 0 {
            return Err(ChunkError::invalid_argument(
                "number of chunks must be greater than 0",
            ));
        }
        let len = self.buffer.len();
        if len == 0 {
            return Err(ChunkError::EmptyInput);
        }
        let n = n.min(len);
        let (base, remainder) = (len / n, len % n);
        let mut cuts = Vec::with_capacity(n);
        let mut end = 0;
        for i in 0..n {
            end += base + usize::from(i < remainder);
            cuts.push(end);
        }
        materialize(&self.buffer, &CutPointSet::new(cuts)?)
    }

    fn require_elements(&self) -> Result<()> {
        if self.buffer.is_empty() {
            return Err(ChunkError::EmptyInput);
        }
        Ok(())
    }

    fn materialize_boundaries(&self, cuts: impl IntoIterator<Item = usize>) -> Result<Vec<Chunk>> {
        let cuts = CutPointSet::from_boundaries(cuts, self.buffer.len())?;
        materialize(&self.buffer, &cuts)
    }

    /// Overlapping windows of `size` elements advancing by `step`.
    /// Only full windows are returned, so the result does not partition
    /// the buffer.
    pub fn sliding_windows(&self, size: usize, step: usize) -> Result<Vec<Chunk>> {
        if size == 0 || step == 0 {
            return Err(ChunkError::invalid_argument(
                "window size and step must be greater than 0",
            ));
        }
        let len = self.buffer.len();
        if len < size {
            return Ok(Vec::new());
        }
        (0..=len - size)
            .step_by(step)
            .map(|start| Chunk::from_buffer(&self.buffer, start..start + size))
            .collect()
    }
}
