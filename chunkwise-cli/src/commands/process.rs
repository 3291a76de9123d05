//! Process command implementation

use anyhow::{Context, Result};
use chunkwise_core::BoundaryStrategy;
use chunkwise_engine::{CheckpointStore, ResilientProcessor};
use clap::Args;
use std::path::PathBuf;

use super::{open_output, report_metrics, resolve_format, CommonArgs, DetectorArgs};
use crate::input::FileReader;
use crate::output::{create_formatter, OutputFormat};
use crate::progress::ProgressReporter;

/// Arguments for the process command
#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input sequence file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (default: from config, else text)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(flatten)]
    pub detector: DetectorArgs,

    /// Checkpoint directory (one per input stream)
    #[arg(long, value_name = "DIR")]
    pub checkpoint_dir: Option<PathBuf>,

    /// Elements per batch
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Bound on bytes buffered for one batch
    #[arg(long, value_name = "BYTES")]
    pub max_buffered_bytes: Option<usize>,

    /// Retries per batch on transient failures
    #[arg(long, value_name = "N")]
    pub retry_limit: Option<u32>,

    /// Fail instead of starting fresh when the checkpoint is unusable
    #[arg(long)]
    pub strict_resume: bool,

    /// Discard existing checkpoints before processing
    #[arg(long)]
    pub fresh: bool,

    /// Include chunk values in text and markdown output
    #[arg(long)]
    pub values: bool,

    /// Print quality metrics to stderr
    #[arg(long)]
    pub metrics: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ProcessArgs {
    /// Execute the process command
    pub fn execute(&self) -> Result<()> {
        let mut config = self.common.setup()?;
        if self.values {
            config.output.include_values = true;
        }
        let format = resolve_format(self.format, &config)?;

        let mut resilience = config.resilience.clone();
        if let Some(dir) = &self.checkpoint_dir {
            resilience.checkpoint_dir = dir.clone();
        }
        if let Some(batch_size) = self.batch_size {
            resilience.batch_size = batch_size;
        }
        if let Some(bytes) = self.max_buffered_bytes {
            resilience.max_buffered_bytes = bytes;
        }
        if let Some(limit) = self.retry_limit {
            resilience.retry_limit = limit;
        }
        resilience.strict_resume |= self.strict_resume;
        let resilience = resilience.to_resilience_config()?;

        let detector = self
            .detector
            .resolve(&config.detector)
            .build()
            .context("Invalid detector configuration")?;

        if self.fresh {
            CheckpointStore::open(resilience.checkpoint_dir(), resilience.history_size())?
                .clear()?;
            log::info!(
                "Cleared checkpoints in {}",
                resilience.checkpoint_dir().display()
            );
        }

        let data = FileReader::read_sequence(&self.input)?;
        log::info!(
            "Processing {} elements with {} ({}), checkpoints in {}",
            data.len(),
            detector.name(),
            detector.parameters(),
            resilience.checkpoint_dir().display()
        );

        let mut progress = ProgressReporter::new(self.common.quiet);
        progress.init_spinner(format!("Processing {}", self.input.display()));
        let mut processor = ResilientProcessor::new(resilience, detector)?;
        let outcome = processor.process(&data);
        progress.finish();
        let chunks = outcome
            .with_context(|| format!("Failed to process {}", self.input.display()))?;

        let source = self.input.display().to_string();
        if self.metrics {
            report_metrics(&source, &chunks)?;
        }
        let writer = open_output(self.output.as_deref())?;
        let mut formatter = create_formatter(format, writer, &config.output);
        formatter.format_chunks(&source, &chunks)?;
        formatter.finish()?;

        Ok(())
    }
}
