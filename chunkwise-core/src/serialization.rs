//! Chunk set encodings
//!
//! JSON is available with the `json` feature. Protocol Buffers and
//! MessagePack are not compiled into this crate and always report
//! [`ChunkError::FormatUnavailable`], which callers treat as skippable.

use crate::application::chunker::Chunk;
use crate::error::{ChunkError, Result};
use serde::{Deserialize, Serialize};

/// Serialized form of a chunk set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkDocument {
    /// Number of chunks
    pub chunk_count: usize,
    /// Chunks in order
    pub chunks: Vec<Chunk>,
}

impl ChunkDocument {
    /// Wrap a chunk set
    pub fn new(chunks: &[Chunk]) -> Self {
        Self {
            chunk_count: chunks.len(),
            chunks: chunks.to_vec(),
        }
    }
}

/// Encoder for chunk sets
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkSerializer {
    pretty: bool,
}

impl ChunkSerializer {
    /// Compact output
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented JSON output
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Encode as JSON
    #[cfg(feature = "json")]
    pub fn to_json(&self, chunks: &[Chunk]) -> Result<String> {
        let document = ChunkDocument::new(chunks);
        let encoded = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        encoded.map_err(|e| ChunkError::invalid_argument(format!("JSON encoding failed: {e}")))
    }

    /// Encode as JSON
    #[cfg(not(feature = "json"))]
    pub fn to_json(&self, _chunks: &[Chunk]) -> Result<String> {
        Err(ChunkError::FormatUnavailable { format: "JSON" })
    }

    /// Decode a JSON chunk document
    #[cfg(feature = "json")]
    pub fn from_json(&self, source: &str) -> Result<Vec<Chunk>> {
        let document: ChunkDocument = serde_json::from_str(source)
            .map_err(|e| ChunkError::invalid_argument(format!("JSON decoding failed: {e}")))?;
        Ok(document.chunks)
    }

    /// Decode a JSON chunk document
    #[cfg(not(feature = "json"))]
    pub fn from_json(&self, _source: &str) -> Result<Vec<Chunk>> {
        Err(ChunkError::FormatUnavailable { format: "JSON" })
    }

    /// Encode as Protocol Buffers
    pub fn to_protobuf(&self, _chunks: &[Chunk]) -> Result<Vec<u8>> {
        Err(ChunkError::FormatUnavailable {
            format: "Protocol Buffers",
        })
    }

    /// Encode as MessagePack
    pub fn to_msgpack(&self, _chunks: &[Chunk]) -> Result<Vec<u8>> {
        Err(ChunkError::FormatUnavailable {
            format: "MessagePack",
        })
    }

    /// Formats this build can encode
    pub fn available_formats() -> Vec<&'static str> {
        let mut formats = Vec::new();
        if cfg!(feature = "json") {
            formats.push("json");
        }
        formats
    }
}
