//! Chunk command implementation

use anyhow::{Context, Result};
use chunkwise_core::{BoundaryDetector, BoundaryStrategy, Chunk, Chunker};
use clap::Args;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use super::{open_output, report_metrics, resolve_format, CommonArgs, DetectorArgs};
use crate::input::{resolve_patterns, FileReader};
use crate::output::{create_formatter, OutputFormat};
use crate::progress::ProgressReporter;

/// Arguments for the chunk command
#[derive(Debug, Args)]
pub struct ChunkArgs {
    /// Input files or patterns (supports glob)
    #[arg(short, long, value_name = "FILE/PATTERN", required = true)]
    pub input: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (default: from config, else text)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(flatten)]
    pub detector: DetectorArgs,

    /// Split each input into N balanced chunks instead of detecting boundaries
    #[arg(long, value_name = "N", conflicts_with = "strategy")]
    pub into: Option<usize>,

    /// Include chunk values in text and markdown output
    #[arg(long)]
    pub values: bool,

    /// Print quality metrics for each input to stderr
    #[arg(long)]
    pub metrics: bool,

    /// Worker threads for multiple inputs (default: number of CPUs)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ChunkArgs {
    /// Execute the chunk command
    pub fn execute(&self) -> Result<()> {
        let mut config = self.common.setup()?;
        if self.values {
            config.output.include_values = true;
        }
        let format = resolve_format(self.format, &config)?;
        let detector_config = self.detector.resolve(&config.detector);
        let detector = detector_config
            .build()
            .context("Invalid detector configuration")?;
        log::info!("Chunking with {} ({})", detector.name(), detector.parameters());

        let files = resolve_patterns(&self.input)?;
        let mut progress = ProgressReporter::new(self.common.quiet || files.len() < 2);
        progress.init_files(files.len() as u64);

        let threads = self.threads.unwrap_or_else(num_cpus::get).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("Failed to build worker pool")?;
        let chunked: Vec<Result<Vec<Chunk>>> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let result = chunk_file(path, &detector, self.into);
                    progress.file_completed(&path.display().to_string());
                    result
                })
                .collect()
        });
        progress.finish();

        let writer = open_output(self.output.as_deref())?;
        let mut formatter = create_formatter(format, writer, &config.output);
        for (path, chunks) in files.iter().zip(chunked) {
            let source = path.display().to_string();
            let chunks = chunks?;
            if self.metrics {
                report_metrics(&source, &chunks)?;
            }
            formatter.format_chunks(&source, &chunks)?;
        }
        formatter.finish()?;

        Ok(())
    }
}

/// Chunk one file with `detector`, or into `into` balanced pieces
pub fn chunk_file(
    path: &Path,
    detector: &BoundaryDetector,
    into: Option<usize>,
) -> Result<Vec<Chunk>> {
    let buffer = FileReader::read_sequence(path)?;
    let chunker = Chunker::with_buffer(detector.window_size().max(1), buffer)?;
    let chunks = match into {
        Some(n) => chunker.chunk_into_n(n),
        None => chunker.chunk_with(detector),
    };
    chunks.with_context(|| format!("Failed to chunk {}", path.display()))
}
