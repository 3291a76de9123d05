//! Windowed feature-difference segmentation
//!
//! No learned weights are involved. For a candidate position `p` the
//! detector compares the projected left window `[p - w, p)` with the right
//! window `[p, p + w)`:
//!
//! ```text
//! d          = |mean_right - mean_left| / (std_left + std_right + 1e-10)
//! activation = d / (1 + d)
//! ```
//!
//! The activation lies in `[0, 1)`, so thresholds are restricted to `[0, 1]`.

use super::{detect_adjacent_windows, mean, std_dev, validate_window, BoundaryStrategy, Crossing};
use crate::domain::buffer::SequenceBuffer;
use crate::domain::cut_points::CutPointSet;
use crate::error::{ChunkError, Result};

const EPSILON: f64 = 1e-10;

/// Emits a boundary where the mean-shift activation exceeds the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralDetector {
    window_size: usize,
    threshold: f64,
}

impl NeuralDetector {
    /// Create a detector; `window_size >= 2`, `0 <= threshold <= 1`
    pub fn new(window_size: usize, threshold: f64) -> Result<Self> {
        validate_window("neural", window_size)?;
        validate_activation(threshold)?;
        Ok(Self {
            window_size,
            threshold,
        })
    }

    /// Change the window size; the threshold is left untouched
    pub fn set_window_size(&mut self, window_size: usize) -> Result<()> {
        validate_window("neural", window_size)?;
        self.window_size = window_size;
        Ok(())
    }

    /// Change the threshold; the window size is left untouched
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_activation(threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    /// Activation at `position` over a projected sequence
    pub fn activation(&self, projection: &[f64], position: usize) -> Option<f64> {
        let w = self.window_size;
        let left = projection.get(position.checked_sub(w)?..position)?;
        let right = projection.get(position..position.checked_add(w)?)?;
        Some(activation(left, right))
    }
}

impl Default for NeuralDetector {
    fn default() -> Self {
        Self {
            window_size: 10,
            threshold: 0.5,
        }
    }
}

fn validate_activation(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ChunkError::invalid_config(format!(
            "neural threshold must be between 0 and 1, got {threshold}"
        )));
    }
    Ok(())
}

fn activation(left: &[f64], right: &[f64]) -> f64 {
    let mean_left = mean(left);
    let mean_right = mean(right);
    let spread = std_dev(left, mean_left) + std_dev(right, mean_right) + EPSILON;
    let d = (mean_right - mean_left).abs() / spread;
    d / (1.0 + d)
}

impl BoundaryStrategy for NeuralDetector {
    fn name(&self) -> &'static str {
        "neural"
    }

    fn window_size(&self) -> usize {
        self.window_size
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn detect(&self, buffer: &SequenceBuffer) -> Result<CutPointSet> {
        let projection = buffer.projection();
        let w = self.window_size;
        detect_adjacent_windows(
            self.name(),
            buffer,
            w,
            Crossing::Above(self.threshold),
            |p| activation(&projection[p - w..p], &projection[p..p + w]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_threshold_keeps_window_size() {
        let mut detector = NeuralDetector::new(6, 0.5).unwrap();
        detector.set_threshold(0.8).unwrap();
        assert_eq!(detector.window_size(), 6);
        assert_eq!(detector.threshold(), 0.8);
    }

    #[test]
    fn test_setters_are_independent() {
        let mut detector = NeuralDetector::new(6, 0.5).unwrap();
        detector.set_window_size(4).unwrap();
        detector.set_threshold(0.7).unwrap();
        assert_eq!(detector.window_size(), 4);
        assert_eq!(detector.threshold(), 0.7);

        assert!(detector.set_window_size(1).is_err());
        assert_eq!(detector.window_size(), 4);
    }

    #[test]
    fn test_threshold_outside_unit_interval_rejected() {
        assert!(NeuralDetector::new(4, 1.5).is_err());
        let mut detector = NeuralDetector::new(4, 0.5).unwrap();
        assert!(detector.set_threshold(-0.2).is_err());
        assert_eq!(detector.threshold(), 0.5);
    }

    #[test]
    fn test_small_window_rejected() {
        assert!(NeuralDetector::new(0, 0.5).is_err());
        assert!(NeuralDetector::new(1, 0.5).is_err());
    }

    #[test]
    fn test_detects_level_shift() {
        let mut values = vec![0.0; 12];
        values.extend(vec![10.0; 12]);
        let buffer = SequenceBuffer::from_scalars(&values);

        let cuts = NeuralDetector::new(4, 0.5).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[12, 24]);
    }

    #[test]
    fn test_constant_signal_is_one_chunk() {
        let buffer = SequenceBuffer::from_scalars(&[3.0; 20]);
        let cuts = NeuralDetector::new(4, 0.1).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[20]);
    }

    #[test]
    fn test_short_buffer_is_one_chunk() {
        let buffer = SequenceBuffer::from_scalars(&[1.0]);
        let cuts = NeuralDetector::new(4, 0.5).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[1]);
    }

    #[test]
    fn test_activation_accessor() {
        let detector = NeuralDetector::new(2, 0.5).unwrap();
        let projection = [0.0, 0.0, 4.0, 4.0];
        let value = detector.activation(&projection, 2).unwrap();
        assert!(value > 0.99);
        assert_eq!(detector.activation(&projection, 1), None);
    }
}
