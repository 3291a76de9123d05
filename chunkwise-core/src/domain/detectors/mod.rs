//! Boundary detection strategies
//!
//! Every strategy turns a [`SequenceBuffer`] into a [`CutPointSet`]. The
//! windowed strategies (Neural, Wavelet, MutualInformation, DTW) score each
//! candidate position `p` from the elements around it and emit one cut per
//! run of positions whose score crosses the threshold, at the strongest
//! position of the run. Scores exactly equal to the threshold never cut.
//! Variance and Entropy instead grow a chunk until its statistic would
//! exceed the threshold.
//!
//! Shared contracts:
//! - construction rejects a window size below the strategy minimum
//!   ([`ChunkError::InvalidConfig`])
//! - `detect` on an empty buffer fails with [`ChunkError::EmptyInput`]
//! - a buffer too short for one comparison yields a single chunk
//! - NaN or infinite values fail with [`ChunkError::MalformedWindow`]

mod dtw;
mod entropy;
mod fixed;
mod mutual_information;
mod neural;
mod threshold;
mod variance;
mod wavelet;

pub use dtw::{dtw_distance, DtwDetector};
pub use entropy::EntropyDetector;
pub use fixed::FixedSizeDetector;
pub use mutual_information::MutualInformationDetector;
pub use neural::NeuralDetector;
pub use threshold::ThresholdDetector;
pub use variance::VarianceDetector;
pub use wavelet::WaveletDetector;

use crate::domain::buffer::SequenceBuffer;
use crate::domain::cut_points::CutPointSet;
use crate::error::{ChunkError, Result};
use std::ops::RangeInclusive;

/// Smallest window accepted by the windowed strategies
pub const MIN_WINDOW_SIZE: usize = 2;

/// Below this many candidate positions scoring stays on the calling thread
#[cfg(feature = "parallel")]
const PARALLEL_MIN_POSITIONS: usize = 512;

/// Common capability of every boundary detection strategy
pub trait BoundaryStrategy: Send + Sync {
    /// Strategy name for logs, errors and reports
    fn name(&self) -> &'static str;

    /// Window size the strategy compares (1 for the element-wise strategies)
    fn window_size(&self) -> usize;

    /// Decision threshold (0 for FixedSize, which has none)
    fn threshold(&self) -> f64;

    /// Segment the buffer into chunks
    fn detect(&self, buffer: &SequenceBuffer) -> Result<CutPointSet>;
}

/// Closed set of detection strategies selected at construction time
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryDetector {
    /// Cut every `n` elements
    FixedSize(FixedSizeDetector),
    /// Cut where consecutive elements differ by more than a threshold
    Threshold(ThresholdDetector),
    /// Windowed mean-difference activation
    Neural(NeuralDetector),
    /// Multi-scale Haar detail coefficients
    Wavelet(WaveletDetector),
    /// Mutual information between adjacent windows
    MutualInformation(MutualInformationDetector),
    /// Dynamic time warping cost between adjacent windows
    Dtw(DtwDetector),
    /// Chunks grown until their variance exceeds a threshold
    Variance(VarianceDetector),
    /// Chunks grown until their value entropy exceeds a threshold
    Entropy(EntropyDetector),
}

/// Forward a call to the selected strategy without dynamic dispatch
macro_rules! dispatch {
    ($detector:expr, $inner:ident => $call:expr) => {
        match $detector {
            BoundaryDetector::FixedSize($inner) => $call,
            BoundaryDetector::Threshold($inner) => $call,
            BoundaryDetector::Neural($inner) => $call,
            BoundaryDetector::Wavelet($inner) => $call,
            BoundaryDetector::MutualInformation($inner) => $call,
            BoundaryDetector::Dtw($inner) => $call,
            BoundaryDetector::Variance($inner) => $call,
            BoundaryDetector::Entropy($inner) => $call,
        }
    };
}

impl BoundaryDetector {

    /// Human readable parameter summary, attached to terminal errors
    pub fn parameters(&self) -> String {
        match self {
            BoundaryDetector::FixedSize(d) => format!("chunk_size={}", d.chunk_size()),
            BoundaryDetector::Threshold(d) => format!("threshold={}", d.threshold()),
            BoundaryDetector::Variance(d) => format!("threshold={}", d.threshold()),
            BoundaryDetector::Entropy(d) => format!("threshold={}", d.threshold()),
            BoundaryDetector::MutualInformation(d) => format!(
                "window_size={}, threshold={}, bins={}",
                d.window_size(),
                d.threshold(),
                d.bins()
            ),
            BoundaryDetector::Dtw(d) => match d.warp_band() {
                Some(band) => format!(
                    "window_size={}, threshold={}, warp_band={band}",
                    d.window_size(),
                    d.threshold()
                ),
                None => format!("window_size={}, threshold={}", d.window_size(), d.threshold()),
            },
            other => format!(
                "window_size={}, threshold={}",
                other.window_size(),
                other.threshold()
            ),
        }
    }
}

impl BoundaryStrategy for BoundaryDetector {
    fn name(&self) -> &'static str {
        dispatch!(self, d => d.name())
    }

    fn window_size(&self) -> usize {
        dispatch!(self, d => d.window_size())
    }

    fn threshold(&self) -> f64 {
        dispatch!(self, d => d.threshold())
    }

    fn detect(&self, buffer: &SequenceBuffer) -> Result<CutPointSet> {
        dispatch!(self, d => d.detect(buffer))
    }
}

macro_rules! impl_from_detector {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for BoundaryDetector {
                fn from(detector: $ty) -> Self {
                    BoundaryDetector::$variant(detector)
                }
            }
        )*
    };
}

impl_from_detector! {
    FixedSize => FixedSizeDetector,
    Threshold => ThresholdDetector,
    Neural => NeuralDetector,
    Wavelet => WaveletDetector,
    MutualInformation => MutualInformationDetector,
    Dtw => DtwDetector,
    Variance => VarianceDetector,
    Entropy => EntropyDetector,
}

pub(crate) fn validate_window(strategy: &str, window_size: usize) -> Result<()> {
    if window_size < MIN_WINDOW_SIZE {
        return Err(ChunkError::invalid_config(format!(
            "{strategy} window_size must be at least {MIN_WINDOW_SIZE}, got {window_size}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_threshold(strategy: &str, threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ChunkError::invalid_config(format!(
            "{strategy} threshold must be a finite non-negative number, got {threshold}"
        )));
    }
    Ok(())
}

/// Reject empty and non-finite buffers before any scoring
pub(crate) fn check_buffer(strategy: &'static str, buffer: &SequenceBuffer) -> Result<()> {
    if buffer.is_empty() {
        return Err(ChunkError::EmptyInput);
    }
    if let Some(index) = buffer.first_non_finite() {
        return Err(ChunkError::MalformedWindow { strategy, index });
    }
    Ok(())
}

/// Which side of the threshold marks a boundary
#[derive(Debug, Clone, Copy)]
pub(crate) enum Crossing {
    /// Score strictly greater than the threshold; strongest = largest
    Above(f64),
    /// Score strictly less than the threshold; strongest = smallest
    Below(f64),
}

impl Crossing {
    fn qualifies(self, score: f64) -> bool {
        match self {
            Crossing::Above(t) => score > t,
            Crossing::Below(t) => score < t,
        }
    }

    fn stronger(self, candidate: f64, current: f64) -> bool {
        match self {
            Crossing::Above(_) => candidate > current,
            Crossing::Below(_) => candidate < current,
        }
    }
}

/// Score every candidate position, in parallel for long buffers when the
/// `parallel` feature is enabled. Output order follows `positions`.
pub(crate) fn score_positions<F>(positions: RangeInclusive<usize>, score: F) -> Vec<(usize, f64)>
where
    F: Fn(usize) -> f64 + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        if positions.end().saturating_sub(*positions.start()) >= PARALLEL_MIN_POSITIONS {
            use rayon::prelude::*;
            return positions.into_par_iter().map(|p| (p, score(p))).collect();
        }
    }
    positions.map(|p| (p, score(p))).collect()
}

/// Collapse each run of consecutive qualifying positions into one cut at
/// its strongest score (first position on ties)
pub(crate) fn select_peaks(scores: &[(usize, f64)], crossing: Crossing) -> Vec<usize> {
    let mut cuts = Vec::new();
    let mut run: Option<(usize, f64)> = None;

    for &(position, score) in scores {
        if crossing.qualifies(score) {
            run = match run {
                Some((_, best)) if crossing.stronger(score, best) => Some((position, score)),
                Some(current) => Some(current),
                None => Some((position, score)),
            };
        } else if let Some((best_position, _)) = run.take() {
            cuts.push(best_position);
        }
    }
    if let Some((best_position, _)) = run {
        cuts.push(best_position);
    }
    cuts
}

/// Shared driver for strategies that compare a left window `[p - w, p)`
/// against a right window `[p, p + w)`
pub(crate) fn detect_adjacent_windows<F>(
    strategy: &'static str,
    buffer: &SequenceBuffer,
    window_size: usize,
    crossing: Crossing,
    score: F,
) -> Result<CutPointSet>
where
    F: Fn(usize) -> f64 + Sync + Send,
{
    check_buffer(strategy, buffer)?;
    let len = buffer.len();
    // left and right windows must both fit
    if len / 2 < window_size {
        return CutPointSet::whole(len);
    }

    let scores = score_positions(window_size..=len - window_size, score);
    CutPointSet::from_boundaries(select_peaks(&scores, crossing), len)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub(crate) fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
