//! Plot and graph artifacts for a chunked sequence
//!
//! Every method writes its files into the output directory, replacing files
//! of the same name from earlier calls:
//!
//! * `plot_chunk_sizes` writes `chunk_sizes.dat` and the gnuplot script
//!   `plot_chunks.gnu`
//! * `visualize_boundaries` writes `boundaries.dat` (element index, value
//!   projection, chunk index, boundary flag)
//! * `export_to_graphviz` writes a DOT graph, `chunks.dot` by default

use anyhow::{Context, Result};
use chunkwise_core::{Chunk, SequenceBuffer};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::format_values;

/// Values shown per node label before truncating
const LABEL_VALUES: usize = 8;

/// Default graph file name
pub const DEFAULT_GRAPH_FILE: &str = "chunks.dot";

/// Writes descriptive artifacts for a chunk set
pub struct ChunkVisualizer<'a> {
    sequence: &'a SequenceBuffer,
    chunks: &'a [Chunk],
    output_dir: PathBuf,
}

impl<'a> ChunkVisualizer<'a> {
    /// Create a visualizer, creating `output_dir` if absent
    pub fn new(
        sequence: &'a SequenceBuffer,
        chunks: &'a [Chunk],
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;
        Ok(Self {
            sequence,
            chunks,
            output_dir,
        })
    }

    /// Directory receiving the artifacts
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `chunk_sizes.dat` and `plot_chunks.gnu`
    pub fn plot_chunk_sizes(&self) -> Result<Vec<PathBuf>> {
        let mut data = String::from("# chunk_index size\n");
        for (index, chunk) in self.chunks.iter().enumerate() {
            let _ = writeln!(data, "{index} {}", chunk.len());
        }

        let script = "\
set terminal png
set output 'chunk_sizes.png'
set title 'Chunk Size Distribution'
set xlabel 'Chunk Index'
set ylabel 'Size'
plot 'chunk_sizes.dat' using 1:2 with linespoints title 'Chunk Sizes'
";

        Ok(vec![
            self.write("chunk_sizes.dat", &data)?,
            self.write("plot_chunks.gnu", script)?,
        ])
    }

    /// Write `boundaries.dat`
    pub fn visualize_boundaries(&self) -> Result<PathBuf> {
        let projection = self.sequence.projection();
        let mut data = String::from("# index value chunk boundary\n");
        for (chunk_index, chunk) in self.chunks.iter().enumerate() {
            for index in chunk.range() {
                let value = projection.get(index).copied().unwrap_or(f64::NAN);
                let boundary = u8::from(index == chunk.start() && index > 0);
                let _ = writeln!(data, "{index} {value} {chunk_index} {boundary}");
            }
        }
        let covered: usize = self.chunks.iter().map(Chunk::len).sum();
        let _ = writeln!(
            data,
            "# total {covered} elements in {} chunks",
            self.chunks.len()
        );

        self.write("boundaries.dat", &data)
    }

    /// Write a DOT graph chaining the chunks; `filename` defaults to
    /// [`DEFAULT_GRAPH_FILE`] and is resolved inside the output directory
    pub fn export_to_graphviz(&self, filename: Option<&str>) -> Result<PathBuf> {
        let mut dot = String::from("digraph chunks {\n  rankdir=LR;\n  node [shape=box];\n");
        for (index, chunk) in self.chunks.iter().enumerate() {
            let values = chunk.values();
            let mut shown = format_values(&values[..values.len().min(LABEL_VALUES)]);
            if values.len() > LABEL_VALUES {
                shown.insert_str(shown.len() - 1, ", ...");
            }
            let _ = writeln!(
                dot,
                "  chunk{index} [label=\"Chunk {index}\\n{}..{}\\nValues: {shown}\"];",
                chunk.start(),
                chunk.end()
            );
        }
        for index in 1..self.chunks.len() {
            let _ = writeln!(dot, "  chunk{} -> chunk{index};", index - 1);
        }
        dot.push_str("}\n");

        self.write(filename.unwrap_or(DEFAULT_GRAPH_FILE), &dot)
    }

    /// Write every artifact
    pub fn render_all(&self, graph_file: Option<&str>) -> Result<Vec<PathBuf>> {
        let mut written = self.plot_chunk_sizes()?;
        written.push(self.visualize_boundaries()?);
        written.push(self.export_to_graphviz(graph_file)?);
        log::info!(
            "Wrote {} visualization files to {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(written)
    }

    fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(name);
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }
}
