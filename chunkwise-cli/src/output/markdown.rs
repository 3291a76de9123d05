//! Markdown output formatter

use super::{chunk_mean, format_values, OutputFormatter};
use anyhow::Result;
use chunkwise_core::Chunk;
use std::io::Write;

/// Markdown formatter - outputs a table of chunks per source
pub struct MarkdownFormatter<W: Write> {
    writer: W,
    include_values: bool,
    chunk_count: usize,
}

impl<W: Write> MarkdownFormatter<W> {
    /// Create a new markdown formatter
    pub fn new(writer: W, include_values: bool) -> Self {
        Self {
            writer,
            include_values,
            chunk_count: 0,
        }
    }
}

impl<W: Write> OutputFormatter for MarkdownFormatter<W> {
    fn format_chunks(&mut self, source: &str, chunks: &[Chunk]) -> Result<()> {
        writeln!(self.writer, "## {source}")?;
        writeln!(self.writer)?;
        if self.include_values {
            writeln!(self.writer, "| # | start | end | len | mean | values |")?;
            writeln!(self.writer, "|---|-------|-----|-----|------|--------|")?;
        } else {
            writeln!(self.writer, "| # | start | end | len | mean |")?;
            writeln!(self.writer, "|---|-------|-----|-----|------|")?;
        }
        for (index, chunk) in chunks.iter().enumerate() {
            write!(
                self.writer,
                "| {} | {} | {} | {} | {:.4} |",
                index + 1,
                chunk.start(),
                chunk.end(),
                chunk.len(),
                chunk_mean(chunk)
            )?;
            if self.include_values {
                write!(self.writer, " `{}` |", format_values(chunk.values()))?;
            }
            writeln!(self.writer)?;
        }
        writeln!(self.writer)?;
        self.chunk_count += chunks.len();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.writer, "---")?;
        writeln!(self.writer, "*Total chunks: {}*", self.chunk_count)?;
        self.writer.flush()?;
        Ok(())
    }
}
