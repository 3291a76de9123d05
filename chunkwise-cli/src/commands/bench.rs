//! Bench command implementation

use anyhow::{Context, Result};
use chunkwise_core::StrategyKind;
use clap::Args;
use std::path::PathBuf;

use super::{CommonArgs, DetectorArgs};
use crate::benchmark::{ChunkBenchmark, DEFAULT_ITERATIONS};
use crate::input::FileReader;

/// Arguments for the bench command
#[derive(Debug, Args)]
pub struct BenchArgs {
    /// Input sequence file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Directory receiving the results
    #[arg(short, long, value_name = "DIR", default_value = "benchmark")]
    pub output_dir: PathBuf,

    /// Timed runs per strategy
    #[arg(short = 'n', long, value_name = "N", default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Strategies to compare, configured from the `[detector]` section and
    /// detector flags (default: every strategy with default parameters)
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    pub strategies: Vec<StrategyKind>,

    #[command(flatten)]
    pub detector: DetectorArgs,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl BenchArgs {
    /// Execute the bench command
    pub fn execute(&self) -> Result<()> {
        let config = self.common.setup()?;
        let data = FileReader::read_sequence(&self.input)?;

        let mut bench =
            ChunkBenchmark::new(&data, &self.output_dir)?.iterations(self.iterations);
        if self.strategies.is_empty() {
            bench = bench.with_default_strategies()?;
        } else {
            let base = self.detector.resolve(&config.detector);
            for kind in &self.strategies {
                let mut detector_config = base.clone();
                detector_config.strategy = *kind;
                let detector = detector_config
                    .build()
                    .with_context(|| format!("Invalid configuration for {kind}"))?;
                bench.add_strategy(detector);
            }
        }

        bench.run_benchmark()?;
        let written = bench.save_results()?;
        let report = bench.report();

        if !self.common.quiet {
            println!(
                "{:<20} {:>14} {:>10} {:>8} {:>10}",
                "strategy", "elements/s", "ms/run", "chunks", "quality"
            );
            for result in &report.results {
                println!(
                    "{:<20} {:>14.0} {:>10.3} {:>8} {:>10.4}",
                    result.strategy,
                    result.throughput,
                    result.mean_time_ms,
                    result.chunk_count,
                    result.quality_score
                );
            }
            if let Some(best) = &report.best_quality {
                println!("Best quality: {best}");
            }
            for path in written {
                println!("Saved {}", path.display());
            }
        }
        Ok(())
    }
}
