//! Output formatting module

use anyhow::Result;
use chunkwise_core::Chunk;
use std::io::Write;
use std::str::FromStr;

use crate::config::OutputConfig;
use crate::error::CliError;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per chunk: range, length and mean
    Text,
    /// JSON array of chunk documents
    Json,
    /// Markdown table per input
    Markdown,
}

impl OutputFormat {
    /// Every format, for listings
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown];

    /// Name accepted on the command line and in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(CliError::ConfigError(format!("unknown output format '{other}'"))),
        }
    }
}

/// Build the formatter for `format` writing to `writer`
pub fn create_formatter<'a>(
    format: OutputFormat,
    writer: Box<dyn Write + 'a>,
    config: &OutputConfig,
) -> Box<dyn OutputFormatter + 'a> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(writer, config.include_values)),
        OutputFormat::Json => Box::new(JsonFormatter::new(writer, config.pretty_json)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter::new(writer, config.include_values)),
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format the chunks produced for one input source
    fn format_chunks(&mut self, source: &str, chunks: &[Chunk]) -> Result<()>;

    /// Finalize output (e.g., write the collected JSON document)
    fn finish(&mut self) -> Result<()>;
}

/// Mean of every value in a chunk
pub(crate) fn chunk_mean(chunk: &Chunk) -> f64 {
    let values = chunk.values();
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn format_values(values: &[f64]) -> String {
    let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

pub mod json;
pub mod markdown;
pub mod text;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use text::TextFormatter;
