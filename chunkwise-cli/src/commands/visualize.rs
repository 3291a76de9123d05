//! Visualize command implementation

use anyhow::{Context, Result};
use chunkwise_core::{materialize, BoundaryStrategy};
use clap::Args;
use std::path::PathBuf;

use super::{CommonArgs, DetectorArgs};
use crate::input::FileReader;
use crate::visualize::ChunkVisualizer;

/// Arguments for the visualize command
#[derive(Debug, Args)]
pub struct VisualizeArgs {
    /// Input sequence file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Directory receiving the artifacts
    #[arg(short, long, value_name = "DIR", default_value = "viz")]
    pub output_dir: PathBuf,

    /// Graph file name inside the output directory
    #[arg(long, value_name = "NAME")]
    pub graph: Option<String>,

    #[command(flatten)]
    pub detector: DetectorArgs,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl VisualizeArgs {
    /// Execute the visualize command
    pub fn execute(&self) -> Result<()> {
        let config = self.common.setup()?;
        let detector = self
            .detector
            .resolve(&config.detector)
            .build()
            .context("Invalid detector configuration")?;

        let data = FileReader::read_sequence(&self.input)?;
        let cuts = detector
            .detect(&data)
            .with_context(|| format!("Failed to chunk {}", self.input.display()))?;
        let chunks = materialize(&data, &cuts)?;

        let visualizer = ChunkVisualizer::new(&data, &chunks, &self.output_dir)?;
        let written = visualizer.render_all(self.graph.as_deref())?;
        if !self.common.quiet {
            println!(
                "Wrote {} files for {} chunks to {}",
                written.len(),
                chunks.len(),
                self.output_dir.display()
            );
            for path in written {
                println!("  {}", path.display());
            }
        }
        Ok(())
    }
}
