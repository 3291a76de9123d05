//! Growing-chunk variance segmentation

use super::{check_buffer, validate_threshold, BoundaryStrategy};
use crate::domain::buffer::SequenceBuffer;
use crate::domain::cut_points::CutPointSet;
use crate::error::Result;

/// Grows the current chunk one element at a time and closes it before the
/// element that would push its variance strictly above the threshold.
///
/// The variance of a chunk of rows or matrices is the mean squared
/// euclidean distance to the chunk centroid, which reduces to the
/// population variance for scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceDetector {
    threshold: f64,
}

impl VarianceDetector {
    /// Create a detector; the threshold must be finite and non-negative
    pub fn new(threshold: f64) -> Result<Self> {
        validate_threshold("variance", threshold)?;
        Ok(Self { threshold })
    }

    /// Change the threshold
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold("variance", threshold)?;
        self.threshold = threshold;
        Ok(())
    }
}

/// Welford accumulator over every component of the chunk elements
struct RunningVariance {
    count: usize,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl RunningVariance {
    fn new(width: usize) -> Self {
        Self {
            count: 0,
            mean: vec![0.0; width],
            m2: vec![0.0; width],
        }
    }

    fn restart(&mut self, element: &[f64]) {
        self.count = 0;
        self.mean.fill(0.0);
        self.m2.fill(0.0);
        self.push(element);
    }

    fn push(&mut self, element: &[f64]) {
        self.count += 1;
        let n = self.count as f64;
        for ((mean, m2), &x) in self.mean.iter_mut().zip(&mut self.m2).zip(element) {
            let delta = x - *mean;
            *mean += delta / n;
            *m2 += delta * (x - *mean);
        }
    }

    fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        self.m2.iter().sum::<f64>() / self.count as f64
    }
}

impl BoundaryStrategy for VarianceDetector {
    fn name(&self) -> &'static str {
        "variance"
    }

    fn window_size(&self) -> usize {
        1
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn detect(&self, buffer: &SequenceBuffer) -> Result<CutPointSet> {
        check_buffer(self.name(), buffer)?;
        let mut running = RunningVariance::new(buffer.width().max(1));
        let mut cuts = Vec::new();

        for (i, element) in buffer.iter().enumerate() {
            running.push(element);
            if running.count > 1 && running.variance() > self.threshold {
                cuts.push(i);
                running.restart(element);
            }
        }
        CutPointSet::from_boundaries(cuts, buffer.len())
    }
}
