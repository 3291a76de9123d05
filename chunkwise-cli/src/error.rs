//! Error handling for the CLI application

use std::fmt;

/// Custom error type for CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// File not found or inaccessible
    FileNotFound(String),
    /// Invalid file pattern
    InvalidPattern(String),
    /// Configuration error
    ConfigError(String),
    /// Input file could not be parsed as a sequence
    ParseError {
        /// File being parsed
        source: String,
        /// 1-based line number (0 when not line oriented)
        line: usize,
        /// What was wrong
        reason: String,
    },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::FileNotFound(path) => write!(f, "File not found: {path}"),
            CliError::InvalidPattern(pattern) => write!(f, "Invalid file pattern: {pattern}"),
            CliError::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            CliError::ParseError {
                source,
                line: 0,
                reason,
            } => write!(f, "Parse error in {source}: {reason}"),
            CliError::ParseError {
                source,
                line,
                reason,
            } => write!(f, "Parse error in {source} at line {line}: {reason}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, anyhow::Error>;
