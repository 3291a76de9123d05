//! Property tests: every strategy partitions every non-empty input

use chunkwise_core::{
    BoundaryDetector, BoundaryStrategy, Chunker, DetectorConfig, SequenceBuffer, StrategyKind,
};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

fn strategy_kind() -> impl Strategy<Value = StrategyKind> {
    prop::sample::select(StrategyKind::ALL.to_vec())
}

fn detector_for(kind: StrategyKind, window_size: usize, threshold: f64) -> BoundaryDetector {
    let threshold = match kind {
        StrategyKind::Neural => threshold.min(1.0),
        _ => threshold,
    };
    DetectorConfig::new(kind)
        .with_window_size(window_size)
        .with_threshold(threshold)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn test_cut_points_partition_buffer(
        values in prop::collection::vec(-100.0f64..100.0, 1..160),
        kind in strategy_kind(),
        window_size in 2usize..12,
        threshold in 0.0f64..5.0,
    ) {
        let buffer = SequenceBuffer::from_scalars(&values);
        let detector = detector_for(kind, window_size, threshold);
        let cuts = detector.detect(&buffer).unwrap();

        let ranges: Vec<_> = cuts.ranges().collect();
        prop_assert_eq!(ranges.first().map(|r| r.start), Some(0));
        prop_assert_eq!(ranges.last().map(|r| r.end), Some(values.len()));
        for pair in ranges.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        prop_assert!(ranges.iter().all(|r| !r.is_empty()));
    }

    #[test]
    fn test_chunks_reassemble_input(
        rows in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 3), 1..80),
        kind in strategy_kind(),
        window_size in 2usize..8,
    ) {
        let buffer = SequenceBuffer::from_elements(rows.clone()).unwrap();
        let chunker = Chunker::with_buffer(4, buffer).unwrap();
        let detector = detector_for(kind, window_size, 1.0);
        let chunks = chunker.chunk_with(&detector).unwrap();

        let flat: Vec<f64> = chunks.iter().flat_map(|c| c.values().to_vec()).collect();
        let expected: Vec<f64> = rows.into_iter().flatten().collect();
        prop_assert_eq!(flat, expected);
    }

    #[test]
    fn test_chunk_by_size_count(
        values in prop::collection::vec(-1.0f64..1.0, 1..200),
        n in 1usize..32,
    ) {
        let chunker = Chunker::with_buffer(n, SequenceBuffer::from_scalars(&values)).unwrap();
        let chunks = chunker.chunk_by_size(n).unwrap();

        prop_assert_eq!(chunks.len(), values.len().div_ceil(n));
        prop_assert_eq!(chunks.len(), chunker.chunk_count());
        let (last, rest) = chunks.split_last().unwrap();
        prop_assert!(rest.iter().all(|c| c.len() == n));
        prop_assert!(last.len() >= 1 && last.len() <= n);
    }

    #[test]
    fn test_dtw_cost_symmetric_under_reversal(
        a in prop::collection::vec(-20.0f64..20.0, 1..24),
        b in prop::collection::vec(-20.0f64..20.0, 1..24),
    ) {
        let forward_a = SequenceBuffer::from_scalars(&a);
        let forward_b = SequenceBuffer::from_scalars(&b);
        let reversed_a: Vec<f64> = a.iter().rev().copied().collect();
        let reversed_b: Vec<f64> = b.iter().rev().copied().collect();
        let reversed_a = SequenceBuffer::from_scalars(&reversed_a);
        let reversed_b = SequenceBuffer::from_scalars(&reversed_b);

        let forward = chunkwise_core::dtw_distance(&forward_a.as_window(), &forward_b.as_window(), None);
        let backward = chunkwise_core::dtw_distance(&reversed_a.as_window(), &reversed_b.as_window(), None);
        prop_assert!((forward - backward).abs() <= 1e-9 * (1.0 + forward.abs()));
    }
}
