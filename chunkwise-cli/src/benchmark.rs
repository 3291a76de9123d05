//! Strategy comparison harness
//!
//! [`ChunkBenchmark`] times every registered detector over one sequence:
//! one warm-up run, then `iterations` timed runs. It records the mean run
//! time, throughput, chunk statistics and quality score, and
//! [`ChunkBenchmark::save_results`] writes them as `benchmark_results.json`
//! and `benchmark_summary.txt`.

use anyhow::{Context, Result};
use chunkwise_core::{
    materialize, BoundaryDetector, BoundaryStrategy, DetectorConfig, QualityAnalyzer,
    SequenceBuffer, StrategyKind,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Timed runs per strategy by default
pub const DEFAULT_ITERATIONS: usize = 10;

/// Measurements for one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    /// Strategy name
    pub strategy: String,
    /// Parameter summary
    pub parameters: String,
    /// Mean time of one run, in milliseconds
    pub mean_time_ms: f64,
    /// Elements per second
    pub throughput: f64,
    /// Chunks produced
    pub chunk_count: usize,
    /// Mean chunk length
    pub avg_chunk_size: f64,
    /// Between/total variance ratio of the chunks
    pub quality_score: f64,
}

/// Persisted benchmark report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Sequence length
    pub elements: usize,
    /// Timed runs per strategy
    pub iterations: usize,
    /// One entry per strategy that completed
    pub results: Vec<StrategyResult>,
    /// Strategy with the highest throughput
    pub best_throughput: Option<String>,
    /// Strategy with the highest quality score
    pub best_quality: Option<String>,
}

/// Times detectors over a sequence
pub struct ChunkBenchmark<'a> {
    sequence: &'a SequenceBuffer,
    output_dir: PathBuf,
    strategies: Vec<BoundaryDetector>,
    iterations: usize,
    results: Vec<StrategyResult>,
}

impl<'a> ChunkBenchmark<'a> {
    /// Create a benchmark writing into `output_dir`, created if absent
    pub fn new(sequence: &'a SequenceBuffer, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;
        Ok(Self {
            sequence,
            output_dir,
            strategies: Vec::new(),
            iterations: DEFAULT_ITERATIONS,
            results: Vec::new(),
        })
    }

    /// Set the number of timed runs (at least one)
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Register a detector
    pub fn add_strategy(&mut self, detector: impl Into<BoundaryDetector>) {
        self.strategies.push(detector.into());
    }

    /// Register every strategy with default parameters
    pub fn with_default_strategies(mut self) -> Result<Self> {
        for kind in StrategyKind::ALL {
            let mut config = DetectorConfig::new(kind);
            if kind == StrategyKind::FixedSize {
                config = config.with_window_size((self.sequence.len() / 10).max(1));
            }
            self.add_strategy(config.build()?);
        }
        Ok(self)
    }

    /// Registered detectors
    pub fn strategies(&self) -> &[BoundaryDetector] {
        &self.strategies
    }

    /// Results of the last run
    pub fn results(&self) -> &[StrategyResult] {
        &self.results
    }

    /// Time every registered strategy. A strategy that fails is logged and
    /// left out of the results.
    pub fn run_benchmark(&mut self) -> Result<&[StrategyResult]> {
        let analyzer = QualityAnalyzer::new();
        self.results.clear();

        for detector in &self.strategies {
            log::info!("Benchmarking {} ({})", detector.name(), detector.parameters());
            match measure(detector, self.sequence, self.iterations, &analyzer) {
                Ok(result) => self.results.push(result),
                Err(err) => log::warn!("Skipping {}: {err}", detector.name()),
            }
        }
        Ok(&self.results)
    }

    /// Report built from the last run
    pub fn report(&self) -> BenchmarkReport {
        BenchmarkReport {
            elements: self.sequence.len(),
            iterations: self.iterations,
            results: self.results.clone(),
            best_throughput: best_by(&self.results, |r| r.throughput),
            best_quality: best_by(&self.results, |r| r.quality_score),
        }
    }

    /// Write `benchmark_results.json` and `benchmark_summary.txt`
    pub fn save_results(&self) -> Result<Vec<PathBuf>> {
        let report = self.report();

        let json_path = self.output_dir.join("benchmark_results.json");
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(&json_path, json)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;

        let summary_path = self.output_dir.join("benchmark_summary.txt");
        fs::write(&summary_path, render_summary(&report))
            .with_context(|| format!("Failed to write {}", summary_path.display()))?;

        Ok(vec![json_path, summary_path])
    }

    /// Directory receiving the results
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

fn best_by(results: &[StrategyResult], key: impl Fn(&StrategyResult) -> f64) -> Option<String> {
    results
        .iter()
        .max_by(|a, b| key(a).total_cmp(&key(b)))
        .map(|r| r.strategy.clone())
}

fn measure(
    detector: &BoundaryDetector,
    sequence: &SequenceBuffer,
    iterations: usize,
    analyzer: &QualityAnalyzer,
) -> Result<StrategyResult> {
    // warm-up, also the run whose chunks are scored
    let cuts = detector.detect(sequence)?;
    let chunks = materialize(sequence, &cuts)?;

    let start = Instant::now();
    for _ in 0..iterations {
        detector.detect(sequence)?;
    }
    let mean = start.elapsed() / iterations as u32;
    let seconds = mean.max(Duration::from_nanos(1)).as_secs_f64();

    Ok(StrategyResult {
        strategy: detector.name().to_string(),
        parameters: detector.parameters(),
        mean_time_ms: mean.as_secs_f64() * 1e3,
        throughput: sequence.len() as f64 / seconds,
        chunk_count: chunks.len(),
        avg_chunk_size: sequence.len() as f64 / chunks.len() as f64,
        quality_score: analyzer.compute_quality_score(&chunks)?,
    })
}

fn render_summary(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Benchmark Summary Report");
    let _ = writeln!(out, "========================\n");
    let _ = writeln!(
        out,
        "Elements: {}, iterations per strategy: {}\n",
        report.elements, report.iterations
    );

    let _ = writeln!(out, "Throughput Results:");
    let _ = writeln!(out, "-------------------");
    for result in &report.results {
        let _ = writeln!(
            out,
            "{}: {:.2} elements/second ({:.3} ms per run)",
            result.strategy, result.throughput, result.mean_time_ms
        );
    }

    let _ = writeln!(out, "\nChunk Statistics:");
    let _ = writeln!(out, "-----------------");
    for result in &report.results {
        let _ = writeln!(out, "{} ({}):", result.strategy, result.parameters);
        let _ = writeln!(out, "  - Chunk count: {}", result.chunk_count);
        let _ = writeln!(out, "  - Average chunk size: {:.2}", result.avg_chunk_size);
        let _ = writeln!(out, "  - Quality score: {:.4}", result.quality_score);
    }

    let _ = writeln!(out, "\nBest Performers:");
    let _ = writeln!(out, "----------------");
    let none = "n/a".to_string();
    let _ = writeln!(
        out,
        "Best throughput: {}",
        report.best_throughput.as_ref().unwrap_or(&none)
    );
    let _ = writeln!(
        out,
        "Best quality: {}",
        report.best_quality.as_ref().unwrap_or(&none)
    );
    out
}
