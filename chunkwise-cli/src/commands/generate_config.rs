//! Generate config command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::CliConfig;
use crate::error::CliError;

/// Arguments for the generate-config command
#[derive(Debug, Args)]
pub struct GenerateConfigArgs {
    /// Output file path
    #[arg(short, long, value_name = "FILE", default_value = "chunkwise.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl GenerateConfigArgs {
    /// Execute the generate-config command
    pub fn execute(&self) -> Result<()> {
        if self.output.exists() && !self.force {
            return Err(CliError::ConfigError(format!(
                "{} already exists (use --force to overwrite)",
                self.output.display()
            ))
            .into());
        }

        let template = self.generate_template()?;
        std::fs::write(&self.output, template)
            .with_context(|| format!("Failed to write to {}", self.output.display()))?;

        println!("Configuration written to {}", self.output.display());
        println!();
        println!("Use it with:");
        println!("   chunkwise chunk -i input.txt --config {}", self.output.display());

        Ok(())
    }

    /// Default configuration with a short header
    fn generate_template(&self) -> Result<String> {
        let body = CliConfig::default().to_toml_string()?;
        Ok(format!(
            "# chunkwise configuration\n\
             #\n\
             # [detector]   strategy: fixed_size | threshold | neural | wavelet | mutual_information | dtw\n\
             #              warp_band (dtw only) is unset by default\n\
             # [resilience] used by `chunkwise process`; durations in milliseconds\n\
             # [output]     default_format: text | json | markdown\n\n\
             {body}"
        ))
    }
}
