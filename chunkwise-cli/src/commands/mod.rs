//! CLI command implementations

use anyhow::{Context, Result};
use chunkwise_core::{Chunk, ChunkSerializer, DetectorConfig, QualityAnalyzer, StrategyKind};
use clap::{Args, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::CliConfig;
use crate::output::OutputFormat;

pub mod bench;
pub mod chunk;
pub mod generate_config;
pub mod process;
pub mod visualize;

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Chunk sequence files with a boundary detector
    Chunk(chunk::ChunkArgs),

    /// Chunk one long sequence with checkpointing and retry
    Process(process::ProcessArgs),

    /// Write plot and graph files describing the chunks of a sequence
    Visualize(visualize::VisualizeArgs),

    /// Compare strategies on a sequence
    Bench(bench::BenchArgs),

    /// List available components
    List {
        #[command(subcommand)]
        subcommand: ListCommands,
    },

    /// Write a configuration file with every default spelled out
    GenerateConfig(generate_config::GenerateConfigArgs),
}

impl Commands {
    /// Run the selected command
    pub fn execute(&self) -> Result<()> {
        match self {
            Commands::Chunk(args) => args.execute(),
            Commands::Process(args) => args.execute(),
            Commands::Visualize(args) => args.execute(),
            Commands::Bench(args) => args.execute(),
            Commands::List { subcommand } => {
                subcommand.execute();
                Ok(())
            }
            Commands::GenerateConfig(args) => args.execute(),
        }
    }
}

/// List subcommands
#[derive(Debug, Subcommand)]
pub enum ListCommands {
    /// List boundary detection strategies
    Strategies,

    /// List output and serialization formats
    Formats,
}

impl ListCommands {
    /// Print the listing to stdout
    pub fn execute(&self) {
        match self {
            ListCommands::Strategies => {
                println!("Available strategies:");
                for kind in StrategyKind::ALL {
                    println!("  {:<20} {}", kind.as_str(), kind.description());
                }
            }
            ListCommands::Formats => {
                println!("Output formats:");
                for format in OutputFormat::ALL {
                    println!("  {}", format.as_str());
                }
                println!("Serialization formats compiled in:");
                for format in ChunkSerializer::available_formats() {
                    println!("  {format}");
                }
            }
        }
    }
}

/// Options shared by every command that reads a configuration
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Configuration file
    #[arg(short, long, value_name = "FILE", env = "CHUNKWISE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CommonArgs {
    /// Initialize logging and load the configuration file
    pub fn setup(&self) -> Result<CliConfig> {
        self.init_logging();
        let config = CliConfig::load_or_default(self.config.as_deref())?;
        log::debug!("Configuration: {config:?}");
        Ok(config)
    }

    /// Initialize logging based on verbosity level
    fn init_logging(&self) {
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        if !self.quiet {
            // already initialised when commands run in-process
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(log_level),
            )
            .try_init();
        }
    }
}

/// Detector flags overriding the `[detector]` configuration section
#[derive(Debug, Clone, Default, Args)]
pub struct DetectorArgs {
    /// Boundary detection strategy
    #[arg(short, long, value_name = "NAME")]
    pub strategy: Option<StrategyKind>,

    /// Window size (chunk size for fixed_size)
    #[arg(short, long, value_name = "N")]
    pub window_size: Option<usize>,

    /// Decision threshold
    #[arg(short, long, value_name = "T")]
    pub threshold: Option<f64>,

    /// Histogram bins for mutual_information
    #[arg(long, value_name = "N")]
    pub bins: Option<usize>,

    /// Sakoe-Chiba band for dtw
    #[arg(long, value_name = "K")]
    pub warp_band: Option<usize>,
}

impl DetectorArgs {
    /// Apply the flags that were given on top of `base`
    pub fn resolve(&self, base: &DetectorConfig) -> DetectorConfig {
        let mut config = base.clone();
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(window_size) = self.window_size {
            config.window_size = window_size;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(bins) = self.bins {
            config.bins = bins;
        }
        if let Some(band) = self.warp_band {
            config.warp_band = Some(band);
        }
        config
    }
}

/// Output format from the flag, else from the configuration
pub(crate) fn resolve_format(flag: Option<OutputFormat>, config: &CliConfig) -> Result<OutputFormat> {
    match flag {
        Some(format) => Ok(format),
        None => Ok(config.output.default_format.parse()?),
    }
}

/// Buffered writer for `path`, or stdout
pub(crate) fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Print quality and size metrics of a chunk set to stderr
pub(crate) fn report_metrics(source: &str, chunks: &[Chunk]) -> Result<()> {
    let analyzer = QualityAnalyzer::new();
    let quality = analyzer.compute_quality_score(chunks)?;
    let sizes = analyzer.size_metrics(chunks)?;
    eprintln!(
        "{source}: chunks={} quality={quality:.4} silhouette={:.4} separation={:.4}",
        chunks.len(),
        analyzer.silhouette_score(chunks),
        analyzer.separation(chunks)
    );
    eprintln!(
        "{source}: size mean={:.2} variance={:.2} min={} max={} entropy={:.4}",
        sizes.mean, sizes.variance, sizes.min, sizes.max, sizes.entropy
    );
    Ok(())
}
