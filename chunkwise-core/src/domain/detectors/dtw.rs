//! Dynamic time warping segmentation

use super::{
    detect_adjacent_windows, validate_threshold, validate_window, BoundaryStrategy, Crossing,
};
use crate::domain::buffer::{element_distance, SequenceBuffer, Window};
use crate::domain::cut_points::CutPointSet;
use crate::error::Result;

/// Emits a boundary where the warped distance between the reference window
/// `[p - w, p)` and the following window `[p, p + w)` exceeds the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct DtwDetector {
    window_size: usize,
    threshold: f64,
    warp_band: Option<usize>,
}

impl DtwDetector {
    /// Create a detector without a warping band
    pub fn new(window_size: usize, threshold: f64) -> Result<Self> {
        validate_window("dtw", window_size)?;
        validate_threshold("dtw", threshold)?;
        Ok(Self {
            window_size,
            threshold,
            warp_band: None,
        })
    }

    /// Restrict the warping path to a Sakoe-Chiba band of `band` steps
    pub fn with_warp_band(mut self, band: usize) -> Self {
        self.warp_band = Some(band);
        self
    }

    /// Warping band, if any
    pub fn warp_band(&self) -> Option<usize> {
        self.warp_band
    }

    /// Change the window size
    pub fn set_window_size(&mut self, window_size: usize) -> Result<()> {
        validate_window("dtw", window_size)?;
        self.window_size = window_size;
        Ok(())
    }

    /// Change the distance threshold
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold("dtw", threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    /// Change or clear the warping band
    pub fn set_warp_band(&mut self, band: Option<usize>) {
        self.warp_band = band;
    }
}

impl Default for DtwDetector {
    fn default() -> Self {
        Self {
            window_size: 10,
            threshold: 1.0,
            warp_band: None,
        }
    }
}

/// Minimal cumulative alignment cost between two windows.
///
/// Standard O(n·m) recurrence with a monotonic, contiguous warping path:
/// `D[i][j] = d(a_i, b_j) + min(D[i-1][j], D[i][j-1], D[i-1][j-1])` where
/// `d` is the euclidean element distance. A band, when given, is widened to
/// the length difference so the end cell stays reachable. Empty windows
/// have cost 0 against each other and infinite cost otherwise.
pub fn dtw_distance(a: &Window<'_>, b: &Window<'_>, band: Option<usize>) -> f64 {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return if n == m { 0.0 } else { f64::INFINITY };
    }
    let band = band.map(|w| w.max(n.abs_diff(m)));

    let mut previous = vec![f64::INFINITY; m + 1];
    let mut current = vec![f64::INFINITY; m + 1];
    previous[0] = 0.0;

    for i in 1..=n {
        current.fill(f64::INFINITY);
        let (lo, hi) = match band {
            Some(w) => (i.saturating_sub(w).max(1), i.saturating_add(w).min(m)),
            None => (1, m),
        };
        let Some(a_i) = a.element(i - 1) else {
            break;
        };
        for j in lo..=hi {
            let Some(b_j) = b.element(j - 1) else {
                break;
            };
            let best = previous[j].min(current[j - 1]).min(previous[j - 1]);
            current[j] = element_distance(a_i, b_j) + best;
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[m]
}

impl BoundaryStrategy for DtwDetector {
    fn name(&self) -> &'static str {
        "dtw"
    }

    fn window_size(&self) -> usize {
        self.window_size
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn detect(&self, buffer: &SequenceBuffer) -> Result<CutPointSet> {
        let whole = buffer.as_window();
        let w = self.window_size;
        detect_adjacent_windows(
            self.name(),
            buffer,
            w,
            Crossing::Above(self.threshold),
            |p| match (whole.subwindow(p - w..p), whole.subwindow(p..p + w)) {
                (Some(left), Some(right)) => dtw_distance(&left, &right, self.warp_band),
                _ => 0.0,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(a: &[f64], b: &[f64], band: Option<usize>) -> f64 {
        let a = SequenceBuffer::from_scalars(a);
        let b = SequenceBuffer::from_scalars(b);
        dtw_distance(&a.as_window(), &b.as_window(), band)
    }

    #[test]
    fn test_identical_sequences_cost_nothing() {
        assert_eq!(distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], None), 0.0);
    }

    #[test]
    fn test_warping_absorbs_stretch() {
        assert_eq!(distance(&[1.0, 2.0, 3.0], &[1.0, 1.0, 2.0, 3.0], None), 0.0);
    }

    #[test]
    fn test_known_cost() {
        // Best path matches 0->1, 1->1, 2->1: |0-1| + |1-1| + |2-1|
        assert_eq!(distance(&[0.0, 1.0, 2.0], &[1.0], None), 2.0);
        assert_eq!(distance(&[0.0, 0.0], &[3.0, 3.0], None), 6.0);
    }

    #[test]
    fn test_band_limits_warping() {
        let a = [0.0, 0.0, 0.0, 5.0];
        let b = [0.0, 5.0, 5.0, 5.0];
        let free = distance(&a, &b, None);
        let banded = distance(&a, &b, Some(0));
        assert_eq!(free, 0.0);
        assert_eq!(banded, 10.0);
    }

    #[test]
    fn test_unbounded_band_matches_free_warping() {
        let a = [0.0, 1.0, 2.0, 5.0];
        let b = [0.0, 5.0, 5.0];
        assert_eq!(distance(&a, &b, Some(usize::MAX)), distance(&a, &b, None));

        let mut values = vec![0.0; 10];
        values.extend(vec![4.0; 10]);
        let buffer = SequenceBuffer::from_scalars(&values);
        let banded = DtwDetector::new(3, 5.0)
            .unwrap()
            .with_warp_band(usize::MAX)
            .detect(&buffer)
            .unwrap();
        assert_eq!(banded.as_slice(), &[10, 20]);
    }

    #[test]
    fn test_empty_windows() {
        assert_eq!(distance(&[], &[], None), 0.0);
        assert!(distance(&[1.0], &[], None).is_infinite());
    }

    #[test]
    fn test_setters() {
        let mut detector = DtwDetector::new(4, 1.0).unwrap().with_warp_band(2);
        detector.set_window_size(6).unwrap();
        detector.set_threshold(3.0).unwrap();
        detector.set_warp_band(None);
        assert_eq!(detector.window_size(), 6);
        assert_eq!(detector.threshold(), 3.0);
        assert_eq!(detector.warp_band(), None);
        assert!(detector.set_window_size(0).is_err());
    }

    #[test]
    fn test_detects_shape_change() {
        let mut values = vec![0.0; 10];
        values.extend(vec![4.0; 10]);
        let buffer = SequenceBuffer::from_scalars(&values);
        let cuts = DtwDetector::new(3, 5.0).unwrap().detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[10, 20]);
    }
}
