//! Element-to-element difference segmentation

use super::{check_buffer, validate_threshold, BoundaryStrategy};
use crate::domain::buffer::{element_distance, SequenceBuffer};
use crate::domain::cut_points::CutPointSet;
use crate::error::Result;

/// Starts a new chunk at element `i` when the distance between elements
/// `i - 1` and `i` is strictly greater than the threshold.
///
/// Scalars compare by absolute difference, rows and matrices by euclidean
/// distance over their components.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdDetector {
    threshold: f64,
}

impl ThresholdDetector {
    /// Create a detector; the threshold must be finite and non-negative
    pub fn new(threshold: f64) -> Result<Self> {
        validate_threshold("threshold", threshold)?;
        Ok(Self { threshold })
    }

    /// Change the threshold
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold("threshold", threshold)?;
        self.threshold = threshold;
        Ok(())
    }
}

impl BoundaryStrategy for ThresholdDetector {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn window_size(&self) -> usize {
        1
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn detect(&self, buffer: &SequenceBuffer) -> Result<CutPointSet> {
        check_buffer(self.name(), buffer)?;
        let elements: Vec<&[f64]> = buffer.iter().collect();
        let cuts = elements
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| element_distance(pair[0], pair[1]) > self.threshold)
            .map(|(i, _)| i + 1);
        CutPointSet::from_boundaries(cuts, buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChunkError;

    #[test]
    fn test_jumps_start_new_chunks() {
        let buffer = SequenceBuffer::from_scalars(&[1.0, 1.1, 1.2, 5.0, 5.1, 9.0]);
        let cuts = ThresholdDetector::new(1.0).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[3, 5, 6]);
    }

    #[test]
    fn test_difference_equal_to_threshold_does_not_cut() {
        let buffer = SequenceBuffer::from_scalars(&[0.0, 1.0, 2.0]);
        let cuts = ThresholdDetector::new(1.0).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[3]);
    }

    #[test]
    fn test_zero_threshold_splits_every_distinct_element() {
        let buffer = SequenceBuffer::from_scalars(&[1.0, 2.0, 3.0, 3.0]);
        let cuts = ThresholdDetector::new(0.0).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[1, 2, 4]);
    }

    #[test]
    fn test_rows_use_euclidean_distance() {
        let buffer =
            SequenceBuffer::from_elements(vec![vec![0.0, 0.0], vec![3.0, 4.0], vec![3.0, 4.5]])
                .unwrap();
        let cuts = ThresholdDetector::new(4.9).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[1, 3]);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        assert!(matches!(
            ThresholdDetector::new(-0.1),
            Err(ChunkError::InvalidConfig { .. })
        ));
        assert!(ThresholdDetector::new(f64::NAN).is_err());
    }
}
