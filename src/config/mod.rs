pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_path, validate_quarter_labels, validate_registry_source, validate_url, Validate,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_BASE_URL: &str =
    "https://dadosabertos.ans.gov.br/FTP/PDA/demonstracoes_contabeis";
pub const DEFAULT_REGISTRY_URL: &str =
    "https://dadosabertos.ans.gov.br/FTP/PDA/operadoras_de_plano_de_saude_ativas/Relatorio_cadop.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "ans-etl"))]
#[cfg_attr(
    feature = "cli",
    command(about = "ETL for ANS health-plan operator financial disclosures")
)]
pub struct CliConfig {
    /// Base URL of the accounting-statements open data portal.
    #[cfg_attr(feature = "cli", arg(long, default_value = DEFAULT_BASE_URL))]
    pub base_url: String,

    /// Quarter labels to process, most recent first.
    #[cfg_attr(
        feature = "cli",
        arg(long, value_delimiter = ',', default_value = "2024/3T,2024/2T,2024/1T")
    )]
    pub quarters: Vec<String>,

    /// Local batch CSV files; when given, downloads are skipped.
    #[cfg_attr(feature = "cli", arg(long, value_delimiter = ','))]
    pub batch_files: Vec<String>,

    /// Operator registry: URL or local path.
    #[cfg_attr(feature = "cli", arg(long, default_value = DEFAULT_REGISTRY_URL))]
    pub registry: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = "./output"))]
    pub output_path: String,

    /// Load configuration from a TOML file instead of CLI flags.
    #[cfg_attr(feature = "cli", arg(long))]
    pub config: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Enable system monitoring"))]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn quarters(&self) -> &[String] {
        &self.quarters
    }

    fn batch_files(&self) -> &[String] {
        &self.batch_files
    }

    fn registry_source(&self) -> &str {
        &self.registry
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.batch_files.is_empty() {
            validate_url("base_url", &self.base_url)?;
            validate_quarter_labels("quarters", &self.quarters)?;
        } else {
            for file in &self.batch_files {
                validate_path("batch_files", file)?;
            }
        }
        validate_registry_source("registry", &self.registry)?;
        validate_path("output_path", &self.output_path)?;
        Ok(())
    }
}
