//! Resilient execution of a chunking strategy over long sequences
//!
//! The processor splits the input into bounded batches, chunks each batch,
//! checkpoints after every successful batch and retries transient
//! failures with exponential backoff. A later `process` call over the same
//! input and settings resumes from the newest valid checkpoint and yields
//! exactly the chunks an uninterrupted run would.

use crate::checkpoint::{Checkpoint, CheckpointStore, ConfigSnapshot};
use crate::config::ResilienceConfig;
use crate::error::{EngineError, Result};
use crate::state::{ProcessingAttempt, ProcessorState};
use chunkwise_core::{
    materialize, BoundaryDetector, BoundaryStrategy, Chunk, ChunkError, CutPointSet,
    DetectorConfig, SequenceBuffer,
};

/// Strategy seam used by [`ResilientProcessor`]
pub trait BatchChunker {
    /// Strategy name for error context
    fn name(&self) -> &'static str;

    /// Parameter summary for error context
    fn parameters(&self) -> String;

    /// Configuration recorded in checkpoints
    fn config(&self) -> DetectorConfig;

    /// Cut points for the batch starting at input offset `offset`.
    ///
    /// Transient failures are reported as
    /// [`EngineError::TransientProcessing`] with an absolute input offset.
    fn chunk_batch(&self, offset: usize, batch: &SequenceBuffer) -> Result<CutPointSet>;
}

impl BatchChunker for BoundaryDetector {
    fn name(&self) -> &'static str {
        BoundaryStrategy::name(self)
    }

    fn parameters(&self) -> String {
        BoundaryDetector::parameters(self)
    }

    fn config(&self) -> DetectorConfig {
        BoundaryDetector::config(self)
    }

    fn chunk_batch(&self, offset: usize, batch: &SequenceBuffer) -> Result<CutPointSet> {
        self.detect(batch).map_err(|err| match err {
            ChunkError::MalformedWindow { index, .. } => EngineError::TransientProcessing {
                offset: offset + index,
                reason: err.to_string(),
            },
            other => EngineError::Core(other),
        })
    }
}

#[derive(Debug, Clone, Default)]
struct Progress {
    offset: usize,
    chunks: Vec<Chunk>,
    input_len: usize,
    input_fingerprint: u32,
    batch_elements: usize,
    completed: bool,
}

/// Bounded, checkpointed, retrying chunk processor.
///
/// One processor owns its checkpoint directory; concurrent processors must
/// use distinct directories.
#[derive(Debug)]
pub struct ResilientProcessor<C = BoundaryDetector> {
    config: ResilienceConfig,
    chunker: C,
    store: CheckpointStore,
    state: ProcessorState,
    progress: Progress,
    // set once a run or restore has bound progress to an input
    progress_loaded: bool,
    last_attempt: Option<ProcessingAttempt>,
}

impl<C: BatchChunker> ResilientProcessor<C> {
    /// Create a processor, creating the checkpoint directory if needed
    pub fn new(config: ResilienceConfig, chunker: C) -> Result<Self> {
        let store = CheckpointStore::open(config.checkpoint_dir(), config.history_size())?;
        Ok(Self {
            config,
            chunker,
            store,
            state: ProcessorState::Idle,
            progress: Progress::default(),
            progress_loaded: false,
            last_attempt: None,
        })
    }

    /// Current state
    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// Attempt record of the most recent batch
    pub fn last_attempt(&self) -> Option<&ProcessingAttempt> {
        self.last_attempt.as_ref()
    }

    /// Chunks accumulated so far (all chunks once completed)
    pub fn results(&self) -> &[Chunk] {
        &self.progress.chunks
    }

    /// Offset the next run continues from
    pub fn resume_offset(&self) -> usize {
        self.progress.offset
    }

    /// Processor configuration
    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    /// Wrapped chunker
    pub fn chunker(&self) -> &C {
        &self.chunker
    }

    /// Checkpoint store
    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Chunk the whole input, resuming from a matching checkpoint if present
    pub fn process(&mut self, data: &SequenceBuffer) -> Result<Vec<Chunk>> {
        self.transition(ProcessorState::Running);
        self.last_attempt = None;

        if data.is_empty() {
            self.transition(ProcessorState::Failed);
            return Err(ChunkError::EmptyInput.into());
        }
        let batch_elements = match self.config.batch_elements(data.element_bytes()) {
            Ok(size) => size,
            Err(err) => {
                self.transition(ProcessorState::Failed);
                return Err(err);
            }
        };

        let snapshot = ConfigSnapshot {
            detector: self.chunker.config(),
            batch_elements,
        };
        let fingerprint = data.fingerprint();
        if let Err(err) = self.resume(&snapshot, data.len(), fingerprint) {
            self.transition(ProcessorState::Failed);
            return Err(err);
        }

        if self.progress.completed {
            log::info!("Input already fully processed according to checkpoint");
            self.transition(ProcessorState::Completed);
            return Ok(self.progress.chunks.clone());
        }

        while self.progress.offset < data.len() {
            let offset = self.progress.offset;
            let end = (offset + batch_elements).min(data.len());
            let chunks = match self.run_batch(data, offset, end) {
                Ok(chunks) => chunks,
                Err(err) => {
                    self.transition(ProcessorState::Failed);
                    return Err(err);
                }
            };

            self.progress.chunks.extend(chunks);
            self.progress.offset = end;
            self.progress.completed = end == data.len();

            self.transition(ProcessorState::Checkpointing);
            if let Err(err) = self.save_checkpoint() {
                self.transition(ProcessorState::Failed);
                return Err(err);
            }
            if !self.progress.completed {
                self.transition(ProcessorState::Running);
            }
        }

        log::info!(
            "Processed {} elements into {} chunks",
            data.len(),
            self.progress.chunks.len()
        );
        self.transition(ProcessorState::Completed);
        Ok(self.progress.chunks.clone())
    }

    /// Persist the current progress; returns the checkpoint sequence number.
    ///
    /// Saving twice without intervening processing leaves the stored
    /// checkpoint unchanged. Fails with [`EngineError::NoProgress`] before
    /// `process` or `restore_from_checkpoint` has run, so a fresh processor
    /// never shadows an existing checkpoint.
    pub fn save_checkpoint(&mut self) -> Result<u64> {
        if !self.progress_loaded {
            return Err(EngineError::NoProgress);
        }
        let checkpoint = self.current_checkpoint();
        self.store.write(&checkpoint)
    }

    /// Load the newest valid checkpoint into memory without validating it
    /// against an input; `process` performs that check
    pub fn restore_from_checkpoint(&mut self) -> Result<Option<Checkpoint>> {
        let Some((sequence, checkpoint)) = self.store.load_latest(self.config.strict_resume())?
        else {
            return Ok(None);
        };
        log::info!(
            "Restored checkpoint {sequence} at offset {}",
            checkpoint.offset
        );
        self.progress = Progress {
            offset: checkpoint.offset,
            chunks: checkpoint.chunks.clone(),
            input_len: checkpoint.input_len,
            input_fingerprint: checkpoint.input_fingerprint,
            batch_elements: checkpoint.config.batch_elements,
            completed: checkpoint.completed,
        };
        self.progress_loaded = true;
        Ok(Some(checkpoint))
    }

    fn current_checkpoint(&self) -> Checkpoint {
        Checkpoint {
            offset: self.progress.offset,
            chunks: self.progress.chunks.clone(),
            config: ConfigSnapshot {
                detector: self.chunker.config(),
                batch_elements: self.progress.batch_elements,
            },
            input_len: self.progress.input_len,
            input_fingerprint: self.progress.input_fingerprint,
            completed: self.progress.completed,
        }
    }

    /// Set progress from a matching checkpoint, or start fresh
    fn resume(&mut self, snapshot: &ConfigSnapshot, input_len: usize, fingerprint: u32) -> Result<()> {
        let fresh = Progress {
            input_len,
            input_fingerprint: fingerprint,
            batch_elements: snapshot.batch_elements,
            ..Progress::default()
        };

        let strict = self.config.strict_resume();
        let found = match self.store.load_latest(strict) {
            Ok(found) => found,
            Err(err @ EngineError::Io { .. }) if !strict => {
                log::warn!("Cannot read checkpoints, starting fresh: {err}");
                None
            }
            Err(err) => return Err(err),
        };

        self.progress = match found {
            None => fresh,
            Some((sequence, checkpoint)) => {
                match checkpoint.mismatch(snapshot, input_len, fingerprint) {
                    None => {
                        log::info!(
                            "Resuming from checkpoint {sequence} at offset {}",
                            checkpoint.offset
                        );
                        Progress {
                            offset: checkpoint.offset,
                            chunks: checkpoint.chunks,
                            completed: checkpoint.completed,
                            ..fresh
                        }
                    }
                    Some(reason) if strict => {
                        return Err(EngineError::CheckpointMismatch { reason });
                    }
                    Some(reason) => {
                        log::warn!("Ignoring checkpoint {sequence}: {reason}");
                        fresh
                    }
                }
            }
        };
        self.progress_loaded = true;
        Ok(())
    }

    /// Chunk `start..end`, retrying transient failures
    fn run_batch(&mut self, data: &SequenceBuffer, start: usize, end: usize) -> Result<Vec<Chunk>> {
        let batch = data.slice(start..end)?;
        let mut attempt = ProcessingAttempt::new(start);
        log::debug!("Chunking batch {start}..{end}");

        loop {
            let outcome = self
                .chunker
                .chunk_batch(start, &batch)
                .and_then(|cuts| Ok(materialize(&batch, &cuts)?));

            match outcome {
                Ok(chunks) => {
                    if attempt.failures > 0 {
                        self.transition(ProcessorState::Running);
                    }
                    self.last_attempt = Some(attempt);
                    return Ok(chunks.into_iter().map(|c| c.rebased(start)).collect());
                }
                Err(err) if err.is_transient() => {
                    let retry = attempt.record_failure(&err);
                    if attempt.exhausted(self.config.retry_limit()) {
                        log::error!(
                            "Batch at offset {start} failed after {} attempts: {err}",
                            attempt.failures
                        );
                        let terminal = EngineError::Chunking {
                            offset: start,
                            strategy: self.chunker.name().to_string(),
                            parameters: self.chunker.parameters(),
                            attempts: attempt.failures,
                            source: Box::new(err),
                        };
                        self.last_attempt = Some(attempt);
                        return Err(terminal);
                    }

                    let delay = self.config.backoff_delay(retry);
                    log::warn!(
                        "Transient failure at offset {start} (retry {retry}/{}, waiting {delay:?}): {err}",
                        self.config.retry_limit()
                    );
                    self.transition(ProcessorState::Retrying);
                    self.last_attempt = Some(attempt.clone());
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(err) => {
                    attempt.record_failure(&err);
                    self.last_attempt = Some(attempt);
                    return Err(err);
                }
            }
        }
    }

    fn transition(&mut self, next: ProcessorState) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition_to(next) {
            log::debug!("Unexpected state transition {} -> {next}", self.state);
        }
        log::trace!("State {} -> {next}", self.state);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkwise_core::FixedSizeDetector;

    fn processor(dir: &std::path::Path, batch: usize) -> ResilientProcessor {
        let config = ResilienceConfig::builder()
            .checkpoint_dir(dir)
            .batch_size(batch)
            .backoff_base(std::time::Duration::ZERO)
            .backoff_max(std::time::Duration::ZERO)
            .build()
            .unwrap();
        ResilientProcessor::new(config, FixedSizeDetector::new(3).unwrap().into()).unwrap()
    }

    #[test]
    fn test_batches_are_rebased() {
        let dir = tempfile::tempdir().unwrap();
        let mut processor = processor(dir.path(), 4);
        let data = SequenceBuffer::from_scalars(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);

        let chunks = processor.process(&data).unwrap();
        let ranges: Vec<_> = chunks.iter().map(Chunk::range).collect();
        assert_eq!(ranges, vec![0..3, 3..4, 4..7, 7..8, 8..9]);
        assert_eq!(processor.state(), ProcessorState::Completed);
        assert_eq!(processor.resume_offset(), 9);
    }

    #[test]
    fn test_save_before_any_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut processor = processor(dir.path(), 4);
        assert!(matches!(processor.save_checkpoint(), Err(EngineError::NoProgress)));
        assert!(processor.store().list().unwrap().is_empty());

        // an empty input fails before progress is bound
        assert!(processor.process(&SequenceBuffer::new()).is_err());
        assert!(matches!(processor.save_checkpoint(), Err(EngineError::NoProgress)));
    }

    #[test]
    fn test_empty_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut processor = processor(dir.path(), 4);
        let err = processor.process(&SequenceBuffer::new()).unwrap_err();
        assert!(matches!(err, EngineError::Core(ChunkError::EmptyInput)));
        assert_eq!(processor.state(), ProcessorState::Failed);
    }

    #[test]
    fn test_element_larger_than_byte_bound() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResilienceConfig::new(dir.path(), 1, 16, 3).unwrap();
        let mut processor =
            ResilientProcessor::new(config, BoundaryDetector::from(FixedSizeDetector::new(2).unwrap()))
                .unwrap();
        let err = processor
            .process(&SequenceBuffer::from_scalars(&[1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, EngineError::ResourceLimit { .. }));
    }

    #[test]
    fn test_malformed_window_maps_to_transient_offset() {
        let detector: BoundaryDetector = FixedSizeDetector::new(2).unwrap().into();
        let neural: BoundaryDetector = chunkwise_core::NeuralDetector::new(2, 0.5).unwrap().into();
        let batch = SequenceBuffer::from_scalars(&[1.0, f64::NAN, 3.0]);

        assert!(detector.chunk_batch(10, &batch).is_ok());
        let err = neural.chunk_batch(10, &batch).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.offset(), Some(11));
    }
}
