//! Plain text output formatter

use super::{chunk_mean, format_values, OutputFormatter};
use anyhow::Result;
use chunkwise_core::Chunk;
use std::io::{self, Write};

/// Plain text formatter - one line per chunk: range, length and mean
pub struct TextFormatter<W: Write> {
    writer: W,
    include_values: bool,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W, include_values: bool) -> Self {
        Self {
            writer,
            include_values,
        }
    }
}

impl TextFormatter<io::Stdout> {
    /// Create a formatter that writes to stdout
    pub fn stdout(include_values: bool) -> Self {
        Self::new(io::stdout(), include_values)
    }
}

impl<W: Write> OutputFormatter for TextFormatter<W> {
    fn format_chunks(&mut self, source: &str, chunks: &[Chunk]) -> Result<()> {
        writeln!(self.writer, "# {source} ({} chunks)", chunks.len())?;
        for chunk in chunks {
            write!(
                self.writer,
                "{}..{}\t{}\t{:.6}",
                chunk.start(),
                chunk.end(),
                chunk.len(),
                chunk_mean(chunk)
            )?;
            if self.include_values {
                write!(self.writer, "\t{}", format_values(chunk.values()))?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkwise_core::{Chunker, SequenceBuffer};

    #[test]
    fn test_text_lines() {
        let chunker = Chunker::with_buffer(2, SequenceBuffer::from_scalars(&[1.0, 3.0, 5.0])).unwrap();
        let chunks = chunker.chunks().unwrap();

        let mut out = Vec::new();
        let mut formatter = TextFormatter::new(&mut out, true);
        formatter.format_chunks("signal.txt", &chunks).unwrap();
        formatter.finish().unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "# signal.txt (2 chunks)\n0..2\t2\t2.000000\t[1, 3]\n2..3\t1\t5.000000\t[5]\n"
        );
    }
}
