//! Multi-resolution Haar segmentation
//!
//! At position `p` and scale `h` the normalized Haar detail coefficient is
//! `(sum[p, p + h) - sum[p - h, p)) / sqrt(2h)`, computed per component and
//! reduced to its euclidean norm. Scales run over `h = 1, 2, 4, ...` up to
//! half the window, and the position's coefficient is the largest detail
//! magnitude across scales.

use super::{
    check_buffer, score_positions, select_peaks, validate_threshold, validate_window,
    BoundaryStrategy, Crossing,
};
use crate::domain::buffer::SequenceBuffer;
use crate::domain::cut_points::CutPointSet;
use crate::error::Result;

/// Emits a boundary where the high-frequency coefficient exceeds the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct WaveletDetector {
    window_size: usize,
    threshold: f64,
}

impl WaveletDetector {
    /// Create a detector; `window_size >= 2`, non-negative threshold
    pub fn new(window_size: usize, threshold: f64) -> Result<Self> {
        validate_window("wavelet", window_size)?;
        validate_threshold("wavelet", threshold)?;
        Ok(Self {
            window_size,
            threshold,
        })
    }

    /// Change the analysis window
    pub fn set_window_size(&mut self, window_size: usize) -> Result<()> {
        validate_window("wavelet", window_size)?;
        self.window_size = window_size;
        Ok(())
    }

    /// Change the coefficient threshold
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold("wavelet", threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    /// Haar scales analysed for the current window
    pub fn scales(&self) -> Vec<usize> {
        let half = self.window_size / 2;
        std::iter::successors(Some(1usize), |h| h.checked_mul(2))
            .take_while(|&h| h <= half)
            .collect()
    }
}

impl Default for WaveletDetector {
    fn default() -> Self {
        Self {
            window_size: 8,
            threshold: 0.5,
        }
    }
}

/// Per-component prefix sums: `prefix[i * width + c]` is the sum of
/// component `c` over elements `0..i`
struct PrefixSums {
    sums: Vec<f64>,
    width: usize,
}

impl PrefixSums {
    fn new(buffer: &SequenceBuffer) -> Self {
        let width = buffer.width();
        let mut sums = vec![0.0; (buffer.len() + 1) * width];
        for (i, element) in buffer.iter().enumerate() {
            for (c, value) in element.iter().enumerate() {
                sums[(i + 1) * width + c] = sums[i * width + c] + value;
            }
        }
        Self { sums, width }
    }

    fn range_sum(&self, start: usize, end: usize, component: usize) -> f64 {
        self.sums[end * self.width + component] - self.sums[start * self.width + component]
    }

    fn detail(&self, position: usize, scale: usize) -> f64 {
        let norm = ((2 * scale) as f64).sqrt();
        (0..self.width)
            .map(|c| {
                let right = self.range_sum(position, position + scale, c);
                let left = self.range_sum(position - scale, position, c);
                let d = (right - left) / norm;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}

impl BoundaryStrategy for WaveletDetector {
    fn name(&self) -> &'static str {
        "wavelet"
    }

    fn window_size(&self) -> usize {
        self.window_size
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn detect(&self, buffer: &SequenceBuffer) -> Result<CutPointSet> {
        check_buffer(self.name(), buffer)?;
        let len = buffer.len();
        let half = self.window_size / 2;
        if len < self.window_size {
            return CutPointSet::whole(len);
        }

        let prefix = PrefixSums::new(buffer);
        let scales = self.scales();
        let scores = score_positions(half..=len - half, |p| {
            scales
                .iter()
                .map(|&h| prefix.detail(p, h))
                .fold(0.0, f64::max)
        });
        CutPointSet::from_boundaries(select_peaks(&scores, Crossing::Above(self.threshold)), len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_visible_through_accessors() {
        let mut detector = WaveletDetector::new(4, 0.5).unwrap();
        detector.set_window_size(16).unwrap();
        detector.set_threshold(2.5).unwrap();
        assert_eq!(detector.window_size(), 16);
        assert_eq!(detector.threshold(), 2.5);

        assert!(detector.set_window_size(1).is_err());
        assert_eq!(detector.window_size(), 16);
    }

    #[test]
    fn test_scales() {
        assert_eq!(WaveletDetector::new(2, 0.5).unwrap().scales(), vec![1]);
        assert_eq!(WaveletDetector::new(9, 0.5).unwrap().scales(), vec![1, 2, 4]);
    }

    #[test]
    fn test_step_detected() {
        let mut values = vec![1.0; 10];
        values.extend(vec![5.0; 10]);
        let buffer = SequenceBuffer::from_scalars(&values);

        let cuts = WaveletDetector::new(8, 2.0).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[10, 20]);
    }

    #[test]
    fn test_smooth_signal_has_no_boundary() {
        let values: Vec<f64> = (0..32).map(|i| i as f64 * 0.01).collect();
        let buffer = SequenceBuffer::from_scalars(&values);
        let cuts = WaveletDetector::new(8, 1.0).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[32]);
    }

    #[test]
    fn test_short_buffer_is_one_chunk() {
        let buffer = SequenceBuffer::from_scalars(&[1.0, 9.0, 1.0]);
        let cuts = WaveletDetector::new(8, 0.1).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[3]);
    }
}
