//! Integration tests for checkpointed, retrying processing

use chunkwise_core::{ChunkError, CutPointSet, ThresholdDetector};
use chunkwise_engine::*;
use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::time::Duration;

fn regimes() -> SequenceBuffer {
    let values: Vec<f64> = (0..64)
        .map(|i| match i {
            0..=19 => 0.0,
            20..=39 => 8.0,
            _ => -4.0,
        })
        .collect();
    SequenceBuffer::from_scalars(&values)
}

fn config(dir: &Path, strict: bool) -> ResilienceConfig {
    ResilienceConfig::builder()
        .checkpoint_dir(dir)
        .batch_size(16)
        .retry_limit(3)
        .backoff_base(Duration::ZERO)
        .backoff_max(Duration::ZERO)
        .strict_resume(strict)
        .build()
        .unwrap()
}

fn detector(threshold: f64) -> BoundaryDetector {
    ThresholdDetector::new(threshold).unwrap().into()
}

/// Fails without retry when asked for the batch at `crash_offset`
struct CrashAt {
    inner: BoundaryDetector,
    crash_offset: usize,
}

impl BatchChunker for CrashAt {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn parameters(&self) -> String {
        self.inner.parameters()
    }

    fn config(&self) -> DetectorConfig {
        self.inner.config()
    }

    fn chunk_batch(&self, offset: usize, batch: &SequenceBuffer) -> Result<CutPointSet> {
        if offset == self.crash_offset {
            return Err(ChunkError::invalid_argument("simulated crash").into());
        }
        self.inner.chunk_batch(offset, batch)
    }
}

/// Fails transiently `failures` times on the batch at `flaky_offset`
struct Flaky {
    inner: BoundaryDetector,
    flaky_offset: usize,
    failures: Cell<u32>,
}

impl BatchChunker for Flaky {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn parameters(&self) -> String {
        self.inner.parameters()
    }

    fn config(&self) -> DetectorConfig {
        self.inner.config()
    }

    fn chunk_batch(&self, offset: usize, batch: &SequenceBuffer) -> Result<CutPointSet> {
        if offset == self.flaky_offset && self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(EngineError::TransientProcessing {
                offset: offset + 3,
                reason: "sensor glitch".to_string(),
            });
        }
        self.inner.chunk_batch(offset, batch)
    }
}

fn uninterrupted(threshold: f64) -> Vec<Chunk> {
    let dir = tempfile::tempdir().unwrap();
    let mut processor = ResilientProcessor::new(config(dir.path(), false), detector(threshold)).unwrap();
    processor.process(&regimes()).unwrap()
}

fn crash(dir: &Path, crash_offset: usize) {
    let chunker = CrashAt {
        inner: detector(1.0),
        crash_offset,
    };
    let mut processor = ResilientProcessor::new(config(dir, false), chunker).unwrap();
    let err = processor.process(&regimes()).unwrap_err();
    assert!(matches!(err, EngineError::Core(_)));
    assert_eq!(processor.state(), ProcessorState::Failed);
    assert_eq!(processor.resume_offset(), crash_offset);
}

#[test]
fn test_uninterrupted_run_partitions_input() {
    let chunks = uninterrupted(1.0);
    let ranges: Vec<_> = chunks.iter().map(Chunk::range).collect();
    assert_eq!(ranges, vec![0..16, 16..20, 20..32, 32..40, 40..48, 48..64]);
}

#[test]
fn test_resume_after_crash_matches_uninterrupted_run() {
    let dir = tempfile::tempdir().unwrap();
    crash(dir.path(), 32);

    let mut resumed = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    let chunks = resumed.process(&regimes()).unwrap();
    assert_eq!(chunks, uninterrupted(1.0));
    assert_eq!(resumed.state(), ProcessorState::Completed);
}

#[test]
fn test_checkpoint_history_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let mut processor = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    processor.process(&regimes()).unwrap();

    let files = processor.store().list().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files.last().map(|(sequence, _)| *sequence), Some(4));

    let leftovers = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn test_transient_failures_within_limit_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let chunker = Flaky {
        inner: detector(1.0),
        flaky_offset: 16,
        failures: Cell::new(3),
    };
    let mut processor = ResilientProcessor::new(config(dir.path(), false), chunker).unwrap();

    let chunks = processor.process(&regimes()).unwrap();
    assert_eq!(chunks, uninterrupted(1.0));
    assert_eq!(processor.chunker().failures.get(), 0);
}

#[test]
fn test_retry_exhaustion_reports_context() {
    let dir = tempfile::tempdir().unwrap();
    let chunker = Flaky {
        inner: detector(1.0),
        flaky_offset: 16,
        failures: Cell::new(10),
    };
    let mut processor = ResilientProcessor::new(config(dir.path(), false), chunker).unwrap();

    let err = processor.process(&regimes()).unwrap_err();
    match &err {
        EngineError::Chunking {
            offset,
            strategy,
            parameters,
            attempts,
            source,
        } => {
            assert_eq!(*offset, 16);
            assert_eq!(strategy, "threshold");
            assert_eq!(parameters, "threshold=1");
            assert_eq!(*attempts, 4);
            assert_eq!(source.offset(), Some(19));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("offset 16"));
    assert_eq!(processor.state(), ProcessorState::Failed);
    assert_eq!(processor.last_attempt().map(|a| a.failures), Some(4));
    assert_eq!(processor.resume_offset(), 16);
}

#[test]
fn test_save_checkpoint_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut processor = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    processor.process(&regimes()).unwrap();

    let first = processor.save_checkpoint().unwrap();
    let second = processor.save_checkpoint().unwrap();
    assert_eq!(first, second);

    let files = processor.store().list().unwrap();
    assert_eq!(files.last().map(|(sequence, _)| *sequence), Some(first));
}

#[test]
fn test_save_on_new_processor_keeps_crash_progress() {
    let dir = tempfile::tempdir().unwrap();
    crash(dir.path(), 48);
    let before = CheckpointStore::open(dir.path(), 2).unwrap().list().unwrap();

    let mut idle = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    assert!(matches!(idle.save_checkpoint(), Err(EngineError::NoProgress)));
    assert_eq!(idle.store().list().unwrap(), before);

    let mut resumed = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    let checkpoint = resumed.restore_from_checkpoint().unwrap().unwrap();
    assert_eq!(checkpoint.offset, 48);
    assert_eq!(resumed.process(&regimes()).unwrap(), uninterrupted(1.0));
}

#[test]
fn test_completed_run_is_not_repeated() {
    let dir = tempfile::tempdir().unwrap();
    let mut processor = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    let first = processor.process(&regimes()).unwrap();
    let before = processor.store().list().unwrap();

    let mut again = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    let second = again.process(&regimes()).unwrap();
    assert_eq!(first, second);
    assert_eq!(again.store().list().unwrap(), before);
}

#[test]
fn test_corrupt_newest_checkpoint_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    crash(dir.path(), 48);

    let store = CheckpointStore::open(dir.path(), 2).unwrap();
    let files = store.list().unwrap();
    let (_, newest) = files.last().unwrap();
    fs::write(newest, b"{ not a checkpoint").unwrap();

    let mut resumed = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    assert_eq!(resumed.process(&regimes()).unwrap(), uninterrupted(1.0));
}

#[test]
fn test_strict_resume_rejects_corrupt_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    crash(dir.path(), 48);

    let store = CheckpointStore::open(dir.path(), 2).unwrap();
    for (_, path) in store.list().unwrap() {
        fs::write(&path, b"garbage").unwrap();
    }

    let mut strict = ResilientProcessor::new(config(dir.path(), true), detector(1.0)).unwrap();
    let err = strict.process(&regimes()).unwrap_err();
    assert!(matches!(err, EngineError::CorruptCheckpoint { .. }));

    let mut lenient = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    assert_eq!(lenient.process(&regimes()).unwrap(), uninterrupted(1.0));
}

#[test]
fn test_changed_configuration_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    crash(dir.path(), 32);

    let mut strict = ResilientProcessor::new(config(dir.path(), true), detector(5.0)).unwrap();
    let err = strict.process(&regimes()).unwrap_err();
    assert!(matches!(err, EngineError::CheckpointMismatch { .. }));

    let mut changed = ResilientProcessor::new(config(dir.path(), false), detector(5.0)).unwrap();
    assert_eq!(changed.process(&regimes()).unwrap(), uninterrupted(5.0));
}

#[test]
fn test_changed_input_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    crash(dir.path(), 32);

    let other = SequenceBuffer::from_scalars(&[3.0; 64]);
    let mut processor = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    let chunks = processor.process(&other).unwrap();
    let ranges: Vec<_> = chunks.iter().map(Chunk::range).collect();
    assert_eq!(ranges, vec![0..16, 16..32, 32..48, 48..64]);
}

#[test]
fn test_restore_from_checkpoint_reports_progress() {
    let dir = tempfile::tempdir().unwrap();
    crash(dir.path(), 32);

    let mut processor = ResilientProcessor::new(config(dir.path(), false), detector(1.0)).unwrap();
    let checkpoint = processor.restore_from_checkpoint().unwrap().unwrap();
    assert_eq!(checkpoint.offset, 32);
    assert!(!checkpoint.completed);
    assert_eq!(processor.resume_offset(), 32);
    assert!(processor.results().iter().all(|chunk| chunk.end() <= 32));
}

#[test]
fn test_byte_bound_limits_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = ResilienceConfig::new(dir.path(), 8 * 10, 1000, 2).unwrap();
    let mut processor = ResilientProcessor::new(config, detector(100.0)).unwrap();

    let chunks = processor.process(&SequenceBuffer::from_scalars(&[1.0; 25])).unwrap();
    let ranges: Vec<_> = chunks.iter().map(Chunk::range).collect();
    assert_eq!(ranges, vec![0..10, 10..20, 20..25]);

    let dir = tempfile::tempdir().unwrap();
    let tiny = ResilienceConfig::new(dir.path(), 4, 1000, 2).unwrap();
    let mut processor = ResilientProcessor::new(tiny, detector(1.0)).unwrap();
    let err = processor.process(&SequenceBuffer::from_scalars(&[1.0; 4])).unwrap_err();
    assert!(matches!(err, EngineError::ResourceLimit { required: 8, limit: 4 }));
}
