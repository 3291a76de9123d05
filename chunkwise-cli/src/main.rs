//! chunkwise command-line entry point

use chunkwise_cli::commands::Commands;
use clap::Parser;

/// Segment numeric sequences into chunks
#[derive(Debug, Parser)]
#[command(name = "chunkwise", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.command.execute()
}
