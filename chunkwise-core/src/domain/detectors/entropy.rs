//! Growing-chunk Shannon entropy segmentation

use super::{check_buffer, validate_threshold, BoundaryStrategy};
use crate::domain::buffer::SequenceBuffer;
use crate::domain::cut_points::CutPointSet;
use crate::error::Result;
use std::collections::HashMap;

/// Grows the current chunk one element at a time and closes it before the
/// element that would push the Shannon entropy (bits) of its distinct
/// element values strictly above the threshold.
///
/// Elements are compared by exact value; `-0.0` and `0.0` count as equal.
#[derive(Debug, Clone, PartialEq)]
pub struct EntropyDetector {
    threshold: f64,
}

impl EntropyDetector {
    /// Create a detector; the threshold must be finite and non-negative
    pub fn new(threshold: f64) -> Result<Self> {
        validate_threshold("entropy", threshold)?;
        Ok(Self { threshold })
    }

    /// Change the threshold
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold("entropy", threshold)?;
        self.threshold = threshold;
        Ok(())
    }
}

fn value_key(element: &[f64]) -> Vec<u64> {
    element
        .iter()
        .map(|&v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
        .collect()
}

fn plogp(count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        let c = count as f64;
        c * c.log2()
    }
}

/// Value histogram of the open chunk with `sum(c * log2 c)` kept current
#[derive(Default)]
struct RunningEntropy {
    counts: HashMap<Vec<u64>, usize>,
    total: usize,
    weighted: f64,
}

impl RunningEntropy {
    fn restart(&mut self, element: &[f64]) {
        self.counts.clear();
        self.total = 0;
        self.weighted = 0.0;
        self.push(element);
    }

    fn push(&mut self, element: &[f64]) {
        let count = self.counts.entry(value_key(element)).or_insert(0);
        self.weighted += plogp(*count + 1) - plogp(*count);
        *count += 1;
        self.total += 1;
    }

    fn entropy(&self) -> f64 {
        if self.counts.len() < 2 {
            return 0.0;
        }
        let n = self.total as f64;
        (n.log2() - self.weighted / n).max(0.0)
    }
}

impl BoundaryStrategy for EntropyDetector {
    fn name(&self) -> &'static str {
        "entropy"
    }

    fn window_size(&self) -> usize {
        1
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn detect(&self, buffer: &SequenceBuffer) -> Result<CutPointSet> {
        check_buffer(self.name(), buffer)?;
        let mut running = RunningEntropy::default();
        let mut cuts = Vec::new();

        for (i, element) in buffer.iter().enumerate() {
            running.push(element);
            if running.total > 1 && running.entropy() > self.threshold {
                cuts.push(i);
                running.restart(element);
            }
        }
        CutPointSet::from_boundaries(cuts, buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_symbols_per_chunk() {
        let buffer = SequenceBuffer::from_scalars(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
        let cuts = EntropyDetector::new(1.0).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[4, 8]);
    }

    #[test]
    fn test_constant_sequence_is_one_chunk() {
        let buffer = SequenceBuffer::from_scalars(&[7.0; 12]);
        let cuts = EntropyDetector::new(0.0).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[12]);
    }

    #[test]
    fn test_signed_zero_is_one_value() {
        let buffer = SequenceBuffer::from_scalars(&[0.0, -0.0, 0.0, 1.0]);
        let cuts = EntropyDetector::new(0.0).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[3, 4]);
    }

    #[test]
    fn test_running_entropy_matches_direct() {
        let mut running = RunningEntropy::default();
        for v in [1.0, 2.0, 2.0, 3.0] {
            running.push(&[v]);
        }
        // p = 1/4, 1/2, 1/4
        assert!((running.entropy() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert!(EntropyDetector::new(-0.5).is_err());
        assert!(EntropyDetector::new(f64::INFINITY).is_err());
    }
}
