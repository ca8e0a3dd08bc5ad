pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "market-merge")]
#[command(about = "Merges two companies' sales feeds into one consolidated CSV")]
pub struct CliConfig {
    /// Company A sales feed (JSON)
    #[arg(long, default_value = "data/company_a_sales.json")]
    pub source_a: String,

    /// Company B sales feed (CSV)
    #[arg(long, default_value = "data/company_b_sales.csv")]
    pub source_b: String,

    /// Consolidated output file
    #[arg(long, default_value = "output/merged_sales.csv")]
    pub output: String,

    /// Optional TOML pipeline configuration
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn source_a_path(&self) -> &str {
        &self.source_a
    }

    fn source_b_path(&self) -> &str {
        &self.source_b
    }

    fn output_path(&self) -> &str {
        &self.output
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("source_a", &self.source_a)?;
        validation::validate_path("source_b", &self.source_b)?;
        validation::validate_path("output", &self.output)?;

        validation::validate_file_extension("source_a", &self.source_a, &["json", "csv"])?;
        validation::validate_file_extension("source_b", &self.source_b, &["json", "csv"])?;
        validation::validate_file_extension("output", &self.output, &["csv"])?;

        Ok(())
    }
}
