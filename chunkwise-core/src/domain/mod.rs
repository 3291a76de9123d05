//! Domain layer: sequence storage, cut points and boundary detection
//!
//! Everything here is pure computation over in-memory buffers. The
//! application layer turns cut points into chunk payloads and scores them.

pub mod buffer;
pub mod cut_points;
pub mod detectors;

pub use buffer::{element_distance, Element, IntoElements, SequenceBuffer, Shape, Window};
pub use cut_points::CutPointSet;
pub use detectors::{
    dtw_distance, BoundaryDetector, BoundaryStrategy, DtwDetector, EntropyDetector,
    FixedSizeDetector, MutualInformationDetector, NeuralDetector, ThresholdDetector,
    VarianceDetector, WaveletDetector,
};
