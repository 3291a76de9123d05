//! Crash-consistent checkpoint persistence
//!
//! A checkpoint file holds a JSON [`CheckpointEnvelope`]: schema version,
//! monotonically increasing sequence number, CRC32 of the payload text and
//! the payload itself (a JSON-encoded [`Checkpoint`]). Files are written to a
//! temporary sibling, synced and renamed into place, so a reader sees either
//! the old file or the complete new one. The store keeps the newest
//! `history_size` files; restore walks them newest first and returns the
//! first one that validates.

use crate::error::{EngineError, Result};
use chunkwise_core::{Chunk, DetectorConfig};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

/// Envelope schema written by this version
pub const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

const FILE_PREFIX: &str = "checkpoint-";
const FILE_SUFFIX: &str = ".json";

/// Processor settings that determine the produced chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Detector that produced the chunks
    pub detector: DetectorConfig,
    /// Elements per batch
    pub batch_elements: usize,
}

/// Resumable progress of one processing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// First input offset not yet processed
    pub offset: usize,
    /// Chunks produced for `0..offset`
    pub chunks: Vec<Chunk>,
    /// Settings of the run
    pub config: ConfigSnapshot,
    /// Length of the input
    pub input_len: usize,
    /// [`SequenceBuffer::fingerprint`](chunkwise_core::SequenceBuffer::fingerprint) of the input
    pub input_fingerprint: u32,
    /// Whether the whole input was consumed
    pub completed: bool,
}

impl Checkpoint {
    /// Reason this checkpoint cannot resume a run with the given settings
    /// and input, or `None` when it can
    pub fn mismatch(
        &self,
        config: &ConfigSnapshot,
        input_len: usize,
        input_fingerprint: u32,
    ) -> Option<String> {
        if self.config != *config {
            return Some(format!(
                "configuration changed ({:?} vs {:?})",
                self.config, config
            ));
        }
        if self.input_len != input_len || self.input_fingerprint != input_fingerprint {
            return Some(format!(
                "input changed (len {} crc {:08x} vs len {} crc {:08x})",
                self.input_len, self.input_fingerprint, input_len, input_fingerprint
            ));
        }
        if self.offset > input_len {
            return Some(format!(
                "offset {} lies beyond input length {input_len}",
                self.offset
            ));
        }
        None
    }
}

/// On-disk wrapper around a [`Checkpoint`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointEnvelope {
    /// Envelope schema
    pub schema_version: u32,
    /// Position in the checkpoint history
    pub sequence: u64,
    /// CRC32 of the payload bytes
    pub payload_crc32: u32,
    /// JSON-encoded [`Checkpoint`]
    pub payload: String,
}

impl CheckpointEnvelope {
    /// Wrap a checkpoint
    pub fn seal(sequence: u64, checkpoint: &Checkpoint) -> Result<Self> {
        let payload = serde_json::to_string(checkpoint)
            .map_err(|e| EngineError::invalid_config(format!("checkpoint encoding failed: {e}")))?;
        Ok(Self {
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            sequence,
            payload_crc32: crc32fast::hash(payload.as_bytes()),
            payload,
        })
    }

    /// Validate and decode the payload
    pub fn open(&self) -> std::result::Result<Checkpoint, String> {
        if self.schema_version != CHECKPOINT_SCHEMA_VERSION {
            return Err(format!(
                "unsupported schema_version {} (expected {CHECKPOINT_SCHEMA_VERSION})",
                self.schema_version
            ));
        }
        let observed = crc32fast::hash(self.payload.as_bytes());
        if observed != self.payload_crc32 {
            return Err(format!(
                "payload crc32 mismatch: expected=0x{:08x}, observed=0x{observed:08x}",
                self.payload_crc32
            ));
        }
        let checkpoint: Checkpoint = serde_json::from_str(&self.payload)
            .map_err(|e| format!("payload decoding failed: {e}"))?;
        if let Some(chunk) = checkpoint
            .chunks
            .iter()
            .find(|chunk| chunk.end() > checkpoint.offset)
        {
            return Err(format!(
                "chunk {:?} extends past offset {}",
                chunk.range(),
                checkpoint.offset
            ));
        }
        Ok(checkpoint)
    }
}

/// Checkpoint directory owned by one processor
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
    history_size: usize,
}

impl CheckpointStore {
    /// Open (and create) the directory
    pub fn open(dir: impl Into<PathBuf>, history_size: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| EngineError::io(&dir, e))?;
        Ok(Self {
            dir,
            history_size: history_size.max(1),
        })
    }

    /// Directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the checkpoint with sequence `sequence`
    pub fn path_for(&self, sequence: u64) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{sequence:020}{FILE_SUFFIX}"))
    }

    /// Checkpoint files, oldest first
    pub fn list(&self) -> Result<Vec<(u64, PathBuf)>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| EngineError::io(&self.dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::io(&self.dir, e))?;
            let name = entry.file_name();
            let Some(sequence) = name
                .to_str()
                .and_then(|n| n.strip_prefix(FILE_PREFIX))
                .and_then(|n| n.strip_suffix(FILE_SUFFIX))
                .and_then(|n| n.parse::<u64>().ok())
            else {
                continue;
            };
            files.push((sequence, entry.path()));
        }
        files.sort_by_key(|(sequence, _)| *sequence);
        Ok(files)
    }

    /// Read and validate one checkpoint file
    pub fn read(&self, path: &Path) -> Result<(u64, Checkpoint)> {
        let corrupt = |reason: String| EngineError::CorruptCheckpoint {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = fs::read(path).map_err(|e| EngineError::io(path, e))?;
        let envelope: CheckpointEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| corrupt(format!("envelope parse failed: {e}")))?;
        let checkpoint = envelope.open().map_err(corrupt)?;
        Ok((envelope.sequence, checkpoint))
    }

    /// Newest checkpoint that validates, skipping corrupt files.
    ///
    /// With `strict` set, a corrupt newest file is returned as an error
    /// instead of being skipped.
    pub fn load_latest(&self, strict: bool) -> Result<Option<(u64, Checkpoint)>> {
        for (_, path) in self.list()?.into_iter().rev() {
            match self.read(&path) {
                Ok(found) => return Ok(Some(found)),
                Err(err) if strict => return Err(err),
                Err(err) => log::warn!("Skipping unusable checkpoint: {err}"),
            }
        }
        Ok(None)
    }

    /// Persist `checkpoint` as the next sequence number and prune old files.
    ///
    /// Writing a payload identical to the newest valid checkpoint is a no-op
    /// that returns the existing sequence number.
    pub fn write(&self, checkpoint: &Checkpoint) -> Result<u64> {
        let files = self.list()?;
        let latest_sequence = files.last().map(|(sequence, _)| *sequence);

        if let Some((sequence, path)) = files.last() {
            if let Ok((_, existing)) = self.read(path) {
                if existing == *checkpoint {
                    log::debug!("Checkpoint {sequence} already holds this state");
                    return Ok(*sequence);
                }
            }
        }

        let sequence = latest_sequence.map_or(1, |s| s + 1);
        let envelope = CheckpointEnvelope::seal(sequence, checkpoint)?;
        let encoded = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| EngineError::invalid_config(format!("envelope encoding failed: {e}")))?;
        let path = self.path_for(sequence);
        write_file_atomic(&path, &encoded)?;
        log::debug!(
            "Wrote checkpoint {sequence} at offset {} ({} chunks)",
            checkpoint.offset,
            checkpoint.chunks.len()
        );

        self.prune()?;
        Ok(sequence)
    }

    /// Remove every checkpoint file
    pub fn clear(&self) -> Result<()> {
        for (_, path) in self.list()? {
            fs::remove_file(&path).map_err(|e| EngineError::io(&path, e))?;
        }
        Ok(())
    }

    fn prune(&self) -> Result<()> {
        let files = self.list()?;
        let excess = files.len().saturating_sub(self.history_size);
        for (sequence, path) in files.into_iter().take(excess) {
            fs::remove_file(&path).map_err(|e| EngineError::io(&path, e))?;
            log::debug!("Pruned checkpoint {sequence}");
        }
        Ok(())
    }
}

fn write_file_atomic(path: &Path, encoded: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| EngineError::invalid_config("checkpoint path must include a file name"))?;

    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let temp_path = parent.join(format!("{file_name}.tmp-{}-{suffix}", process::id()));

    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&temp_path)
        .map_err(|e| EngineError::io(&temp_path, e))?;

    let written = file
        .write_all(encoded)
        .and_then(|()| file.sync_all())
        .and_then(|()| fs::rename(&temp_path, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(EngineError::io(path, err));
    }
    Ok(())
}
