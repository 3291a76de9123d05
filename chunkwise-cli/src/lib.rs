//! chunkwise CLI library
//!
//! This library provides the command-line interface for the chunkwise
//! sequence segmentation system: input readers, output formatters, the
//! visualizer and the strategy benchmark.

pub mod benchmark;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod progress;
pub mod visualize;

pub use error::{CliError, CliResult};
