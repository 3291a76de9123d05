//! Detector configuration
//!
//! A [`DetectorConfig`] is the serializable description of one
//! [`BoundaryDetector`]. It is what configuration files hold, what the CLI
//! builds from flags and what checkpoints record so a resumed run can tell
//! whether it is still segmenting with the same parameters.

use crate::domain::detectors::{
    BoundaryDetector, BoundaryStrategy, DtwDetector, EntropyDetector, FixedSizeDetector,
    MutualInformationDetector, NeuralDetector, ThresholdDetector, VarianceDetector,
    WaveletDetector,
};
use crate::error::{ChunkError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default configuration constants
pub mod defaults {
    /// Window size for windowed strategies, chunk size for fixed-size
    pub const WINDOW_SIZE: usize = 8;

    /// Decision threshold
    pub const THRESHOLD: f64 = 0.5;

    /// Histogram bins for mutual information
    pub const BINS: usize = 8;
}

/// Names of the available strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// [`FixedSizeDetector`]
    FixedSize,
    /// [`ThresholdDetector`]
    #[default]
    Threshold,
    /// [`NeuralDetector`]
    Neural,
    /// [`WaveletDetector`]
    Wavelet,
    /// [`MutualInformationDetector`]
    MutualInformation,
    /// [`DtwDetector`]
    Dtw,
    /// [`VarianceDetector`]
    Variance,
    /// [`EntropyDetector`]
    Entropy,
}

impl StrategyKind {
    /// Every strategy, in registration order
    pub const ALL: [StrategyKind; 8] = [
        StrategyKind::FixedSize,
        StrategyKind::Threshold,
        StrategyKind::Neural,
        StrategyKind::Wavelet,
        StrategyKind::MutualInformation,
        StrategyKind::Dtw,
        StrategyKind::Variance,
        StrategyKind::Entropy,
    ];

    /// Canonical name, identical to [`BoundaryStrategy::name`]
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::FixedSize => "fixed_size",
            StrategyKind::Threshold => "threshold",
            StrategyKind::Neural => "neural",
            StrategyKind::Wavelet => "wavelet",
            StrategyKind::MutualInformation => "mutual_information",
            StrategyKind::Dtw => "dtw",
            StrategyKind::Variance => "variance",
            StrategyKind::Entropy => "entropy",
        }
    }

    /// One-line description for listings
    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::FixedSize => "cut every window_size elements",
            StrategyKind::Threshold => "cut where consecutive elements differ by more than threshold",
            StrategyKind::Neural => "cut where the windowed mean-shift activation exceeds threshold",
            StrategyKind::Wavelet => "cut where the Haar detail coefficient exceeds threshold",
            StrategyKind::MutualInformation => {
                "cut where adjacent windows' dependency drops below threshold"
            }
            StrategyKind::Dtw => "cut where the DTW cost between adjacent windows exceeds threshold",
            StrategyKind::Variance => "grow chunks until their variance would exceed threshold",
            StrategyKind::Entropy => "grow chunks until their value entropy would exceed threshold",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "fixed_size" | "fixed" | "size" => Ok(StrategyKind::FixedSize),
            "threshold" => Ok(StrategyKind::Threshold),
            "neural" => Ok(StrategyKind::Neural),
            "wavelet" => Ok(StrategyKind::Wavelet),
            "mutual_information" | "mi" => Ok(StrategyKind::MutualInformation),
            "dtw" => Ok(StrategyKind::Dtw),
            "variance" | "var" => Ok(StrategyKind::Variance),
            "entropy" => Ok(StrategyKind::Entropy),
            _ => Err(ChunkError::invalid_config(format!("unknown strategy '{s}'"))),
        }
    }
}

/// Serializable parameters of one detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Strategy to build
    pub strategy: StrategyKind,
    /// Window size (chunk size for fixed-size, unused by the growing
    /// strategies and threshold)
    pub window_size: usize,
    /// Decision threshold (unused by fixed-size)
    pub threshold: f64,
    /// Histogram bins (mutual information only)
    pub bins: usize,
    /// Sakoe-Chiba band (DTW only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warp_band: Option<usize>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            window_size: defaults::WINDOW_SIZE,
            threshold: defaults::THRESHOLD,
            bins: defaults::BINS,
            warp_band: None,
        }
    }
}

impl DetectorConfig {
    /// Default parameters for `strategy`
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Set the window size
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the mutual information bin count
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Set the DTW warping band
    pub fn with_warp_band(mut self, band: usize) -> Self {
        self.warp_band = Some(band);
        self
    }

    /// Parse a TOML document holding the fields at top level
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| ChunkError::invalid_config(e.to_string()))
    }

    /// Build the detector, validating every parameter it uses
    pub fn build(&self) -> Result<BoundaryDetector> {
        let detector = match self.strategy {
            StrategyKind::FixedSize => FixedSizeDetector::new(self.window_size)?.into(),
            StrategyKind::Threshold => ThresholdDetector::new(self.threshold)?.into(),
            StrategyKind::Neural => NeuralDetector::new(self.window_size, self.threshold)?.into(),
            StrategyKind::Wavelet => WaveletDetector::new(self.window_size, self.threshold)?.into(),
            StrategyKind::MutualInformation => {
                MutualInformationDetector::with_bins(self.window_size, self.threshold, self.bins)?
                    .into()
            }
            StrategyKind::Dtw => {
                let detector = DtwDetector::new(self.window_size, self.threshold)?;
                match self.warp_band {
                    Some(band) => detector.with_warp_band(band).into(),
                    None => detector.into(),
                }
            }
            StrategyKind::Variance => VarianceDetector::new(self.threshold)?.into(),
            StrategyKind::Entropy => EntropyDetector::new(self.threshold)?.into(),
        };
        Ok(detector)
    }
}

impl BoundaryDetector {
    /// Build a detector from its configuration
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        config.build()
    }

    /// Strategy of this detector
    pub fn kind(&self) -> StrategyKind {
        match self {
            BoundaryDetector::FixedSize(_) => StrategyKind::FixedSize,
            BoundaryDetector::Threshold(_) => StrategyKind::Threshold,
            BoundaryDetector::Neural(_) => StrategyKind::Neural,
            BoundaryDetector::Wavelet(_) => StrategyKind::Wavelet,
            BoundaryDetector::MutualInformation(_) => StrategyKind::MutualInformation,
            BoundaryDetector::Dtw(_) => StrategyKind::Dtw,
            BoundaryDetector::Variance(_) => StrategyKind::Variance,
            BoundaryDetector::Entropy(_) => StrategyKind::Entropy,
        }
    }

    /// Configuration that rebuilds this detector
    pub fn config(&self) -> DetectorConfig {
        let mut config = DetectorConfig::new(self.kind())
            .with_window_size(self.window_size())
            .with_threshold(self.threshold());
        match self {
            BoundaryDetector::FixedSize(_) => config.threshold = 0.0,
            BoundaryDetector::Threshold(_)
            | BoundaryDetector::Variance(_)
            | BoundaryDetector::Entropy(_) => config.window_size = 1,
            BoundaryDetector::MutualInformation(d) => config.bins = d.bins(),
            BoundaryDetector::Dtw(d) => config.warp_band = d.warp_band(),
            _ => {}
        }
        config
    }
}
