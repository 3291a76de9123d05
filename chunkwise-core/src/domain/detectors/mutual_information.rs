//! Mutual-information segmentation
//!
//! The projected values of the left window `[p - w, p)` and the right window
//! `[p, p + w)` are binned together into `bins` equal-width bins over their
//! joint range. With `X` the bin of a value and `Y` the window it came
//! from, `I(X; Y)` (in bits, within `[0, 1]`) measures how well the value
//! distribution tells the windows apart. The detector reports the
//! dependency `1 - I(X; Y)`: close to 1 when both windows come from the same
//! regime, close to 0 when they are statistically unrelated. A boundary is
//! emitted where the dependency drops below the threshold.

use super::{
    detect_adjacent_windows, validate_threshold, validate_window, BoundaryStrategy, Crossing,
};
use crate::domain::buffer::SequenceBuffer;
use crate::domain::cut_points::CutPointSet;
use crate::error::{ChunkError, Result};

/// Smallest accepted histogram resolution
pub const MIN_BINS: usize = 2;

/// Emits a boundary where adjacent windows become statistically independent
#[derive(Debug, Clone, PartialEq)]
pub struct MutualInformationDetector {
    window_size: usize,
    threshold: f64,
    bins: usize,
}

impl MutualInformationDetector {
    /// Create a detector with the default bin count
    pub fn new(window_size: usize, threshold: f64) -> Result<Self> {
        Self::with_bins(window_size, threshold, crate::application::config::defaults::BINS)
    }

    /// Create a detector with an explicit bin count (`bins >= 2`)
    pub fn with_bins(window_size: usize, threshold: f64, bins: usize) -> Result<Self> {
        validate_window("mutual_information", window_size)?;
        validate_threshold("mutual_information", threshold)?;
        validate_bins(bins)?;
        Ok(Self {
            window_size,
            threshold,
            bins,
        })
    }

    /// Histogram resolution
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Change the window size
    pub fn set_window_size(&mut self, window_size: usize) -> Result<()> {
        validate_window("mutual_information", window_size)?;
        self.window_size = window_size;
        Ok(())
    }

    /// Change the dependency threshold
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold("mutual_information", threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    /// Change the histogram resolution
    pub fn set_bins(&mut self, bins: usize) -> Result<()> {
        validate_bins(bins)?;
        self.bins = bins;
        Ok(())
    }

    /// Dependency `1 - I(X; Y)` between two windows of projected values
    pub fn dependency(&self, left: &[f64], right: &[f64]) -> f64 {
        1.0 - mutual_information(left, right, self.bins)
    }
}

impl Default for MutualInformationDetector {
    fn default() -> Self {
        Self {
            window_size: 5,
            threshold: 0.3,
            bins: crate::application::config::defaults::BINS,
        }
    }
}

fn validate_bins(bins: usize) -> Result<()> {
    if bins < MIN_BINS {
        return Err(ChunkError::invalid_config(format!(
            "mutual_information bins must be at least {MIN_BINS}, got {bins}"
        )));
    }
    Ok(())
}

/// `I(X; Y)` in bits where `Y` labels the window a value came from
fn mutual_information(left: &[f64], right: &[f64], bins: usize) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let (min, max) = left
        .iter()
        .chain(right)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    if span <= 0.0 {
        return 0.0;
    }

    let bin_of = |v: f64| (((v - min) / span * bins as f64) as usize).min(bins - 1);
    let mut counts = vec![[0usize; 2]; bins];
    for &v in left {
        counts[bin_of(v)][0] += 1;
    }
    for &v in right {
        counts[bin_of(v)][1] += 1;
    }

    let n = (left.len() + right.len()) as f64;
    let p_window = [left.len() as f64 / n, right.len() as f64 / n];
    let mut information = 0.0;
    for bin in &counts {
        let p_bin = (bin[0] + bin[1]) as f64 / n;
        for (label, &count) in bin.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let p_joint = count as f64 / n;
            information += p_joint * (p_joint / (p_bin * p_window[label])).log2();
        }
    }
    information.clamp(0.0, 1.0)
}

impl BoundaryStrategy for MutualInformationDetector {
    fn name(&self) -> &'static str {
        "mutual_information"
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
            Crossing::Below(self.threshold),
            |p| self.dependency(&projection[p - w..p], &projection[p..p + w]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_windows_fully_dependent() {
        let detector = MutualInformationDetector::new(4, 0.3).unwrap();
        let window = [1.0, 2.0, 3.0, 4.0];
        assert!((detector.dependency(&window, &window) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_windows_independent() {
        let detector = MutualInformationDetector::new(4, 0.3).unwrap();
        let dependency = detector.dependency(&[0.0, 0.1, 0.2, 0.1], &[9.0, 9.1, 9.2, 9.1]);
        assert!(dependency.abs() < 1e-12);
    }

    #[test]
    fn test_constant_windows_are_dependent() {
        let detector = MutualInformationDetector::new(3, 0.3).unwrap();
        assert_eq!(detector.dependency(&[2.0; 3], &[2.0; 3]), 1.0);
    }

    #[test]
    fn test_regime_change_detected() {
        let mut values: Vec<f64> = (0..15).map(|i| (i % 3) as f64 * 0.1).collect();
        values.extend((0..15).map(|i| 10.0 + (i % 3) as f64 * 0.1));
        let buffer = SequenceBuffer::from_scalars(&values);

        let cuts = MutualInformationDetector::new(5, 0.3)
            .unwrap()
            .detect(&buffer)
            .unwrap();
        assert_eq!(cuts.as_slice(), &[15, 30]);
    }

    #[test]
    fn test_short_buffer_is_one_chunk() {
        let buffer = SequenceBuffer::from_scalars(&[1.0, 2.0, 3.0]);
        let cuts = MutualInformationDetector::default().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[3]);
    }

    #[test]
    fn test_bins_validated() {
        assert!(MutualInformationDetector::with_bins(4, 0.3, 1).is_err());
        let mut detector = MutualInformationDetector::with_bins(4, 0.3, 4).unwrap();
        assert_eq!(detector.bins(), 4);
        detector.set_bins(16).unwrap();
        assert_eq!(detector.bins(), 16);
    }
}
