//! JSON output formatter

use super::OutputFormatter;
use anyhow::Result;
use chunkwise_core::{Chunk, ChunkDocument};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// JSON formatter - outputs one chunk document per source as a JSON array
pub struct JsonFormatter<W: Write> {
    writer: W,
    pretty: bool,
    documents: Vec<SourceDocument>,
}

/// Chunk document tagged with its input source
#[derive(Debug, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Input file the chunks came from
    pub source: String,
    /// Chunk set
    #[serde(flatten)]
    pub document: ChunkDocument,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W, pretty: bool) -> Self {
        Self {
            writer,
            pretty,
            documents: Vec::new(),
        }
    }
}

impl<W: Write> OutputFormatter for JsonFormatter<W> {
    fn format_chunks(&mut self, source: &str, chunks: &[Chunk]) -> Result<()> {
        self.documents.push(SourceDocument {
            source: source.to_string(),
            document: ChunkDocument::new(chunks),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &self.documents)?;
        } else {
            serde_json::to_writer(&mut self.writer, &self.documents)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
