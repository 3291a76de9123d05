//! Integration tests for the detector family and the chunker

use chunkwise_core::{
    BoundaryDetector, BoundaryStrategy, ChunkError, Chunker, DetectorConfig, DtwDetector,
    EntropyDetector, FixedSizeDetector, MutualInformationDetector, NeuralDetector,
    QualityAnalyzer, SequenceBuffer, StrategyKind, ThresholdDetector, VarianceDetector,
    WaveletDetector,
};

/// Three flat regimes of 20 elements each
fn regimes() -> Vec<f64> {
    let mut values = vec![0.0; 20];
    values.extend(vec![8.0; 20]);
    values.extend(vec![-4.0; 20]);
    values
}

fn all_detectors() -> Vec<BoundaryDetector> {
    vec![
        FixedSizeDetector::new(20).unwrap().into(),
        ThresholdDetector::new(1.0).unwrap().into(),
        NeuralDetector::new(5, 0.5).unwrap().into(),
        WaveletDetector::new(8, 2.0).unwrap().into(),
        MutualInformationDetector::new(5, 0.3).unwrap().into(),
        DtwDetector::new(5, 10.0).unwrap().into(),
        VarianceDetector::new(1.0).unwrap().into(),
        EntropyDetector::new(0.0).unwrap().into(),
    ]
}

#[test]
fn test_every_strategy_finds_regime_changes() {
    let buffer = SequenceBuffer::from_scalars(&regimes());
    for detector in all_detectors() {
        let cuts = detector.detect(&buffer).unwrap();
        assert_eq!(
            cuts.as_slice(),
            &[20, 40, 60],
            "strategy {} produced {:?}",
            detector.name(),
            cuts.as_slice()
        );
    }
}

#[test]
fn test_every_strategy_rejects_empty_buffer() {
    let buffer = SequenceBuffer::new();
    for detector in all_detectors() {
        assert_eq!(detector.detect(&buffer), Err(ChunkError::EmptyInput));
    }
}

#[test]
fn test_single_element_buffer_is_one_chunk() {
    let buffer = SequenceBuffer::from_scalars(&[3.5]);
    for detector in all_detectors() {
        let cuts = detector.detect(&buffer).unwrap();
        assert_eq!(cuts.as_slice(), &[1], "strategy {}", detector.name());
    }
}

#[test]
fn test_zero_window_rejected_everywhere() {
    for kind in StrategyKind::ALL {
        // these strategies take no window
        if matches!(
            kind,
            StrategyKind::Threshold | StrategyKind::Variance | StrategyKind::Entropy
        ) {
            continue;
        }
        let err = DetectorConfig::new(kind)
            .with_window_size(0)
            .build()
            .unwrap_err();
        assert!(
            matches!(err, ChunkError::InvalidConfig { .. }),
            "strategy {kind} accepted window 0"
        );
    }
}

#[test]
fn test_detection_is_deterministic() {
    let values: Vec<f64> = (0..200).map(|i| ((i * 37) % 11) as f64).collect();
    let buffer = SequenceBuffer::from_scalars(&values);
    for detector in all_detectors() {
        assert_eq!(detector.detect(&buffer), detector.detect(&buffer));
    }
}

#[test]
fn test_matrix_sequences_segment() {
    let low = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
    let high = vec![vec![5.0, 5.0], vec![5.0, 5.0]];
    let mut elements = vec![low; 10];
    elements.extend(vec![high; 10]);

    let buffer = SequenceBuffer::from_elements(elements).unwrap();
    let detector = DtwDetector::new(3, 1.0).unwrap();
    assert_eq!(detector.detect(&buffer).unwrap().as_slice(), &[10, 20]);
}

#[test]
fn test_chunk_by_size_example() {
    let mut chunker = Chunker::new(2).unwrap();
    chunker.add(vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    let values: Vec<Vec<f64>> = chunker
        .chunk_by_size(2)
        .unwrap()
        .iter()
        .map(|c| c.values().to_vec())
        .collect();
    assert_eq!(values, vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0]]);
}

#[test]
fn test_detected_chunks_score_better_than_fixed() {
    let mut values = vec![1.0; 15];
    values.extend(vec![6.0; 9]);
    values.extend(vec![2.0; 12]);
    let chunker = Chunker::with_buffer(10, SequenceBuffer::from_scalars(&values)).unwrap();
    let analyzer = QualityAnalyzer::new();

    let detected = chunker.chunk_by_threshold(1.0).unwrap();
    let fixed = chunker.chunks().unwrap();

    let detected_score = analyzer.compute_quality_score(&detected).unwrap();
    let fixed_score = analyzer.compute_quality_score(&fixed).unwrap();
    assert_eq!(detected.len(), 3);
    assert!(detected_score > fixed_score);
}

#[test]
fn test_neural_threshold_change_keeps_window() {
    let mut detector = NeuralDetector::new(7, 0.4).unwrap();
    for threshold in [0.0, 0.25, 0.9, 1.0] {
        detector.set_threshold(threshold).unwrap();
        assert_eq!(detector.window_size(), 7);
        assert_eq!(detector.threshold(), threshold);
    }
}

#[test]
fn test_neural_window_change_takes_effect() {
    let mut values = vec![0.0; 12];
    values.extend(vec![10.0; 12]);
    let buffer = SequenceBuffer::from_scalars(&values);

    let mut detector = NeuralDetector::new(20, 0.5).unwrap();
    assert_eq!(detector.detect(&buffer).unwrap().as_slice(), &[24]);

    detector.set_window_size(4).unwrap();
    assert_eq!(detector.window_size(), 4);
    assert_eq!(detector.detect(&buffer).unwrap().as_slice(), &[12, 24]);
}
