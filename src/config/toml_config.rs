use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_path, validate_quarter_labels, validate_registry_source, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File-based pipeline configuration, an alternative to CLI flags for
/// scheduled runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineMeta,
    pub source: SourceConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineMeta {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub quarters: Vec<String>,
    pub batch_files: Option<Vec<String>>,
    pub registry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        Ok(config)
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.source.base_url
    }

    fn quarters(&self) -> &[String] {
        &self.source.quarters
    }

    fn batch_files(&self) -> &[String] {
        self.source.batch_files.as_deref().unwrap_or(&[])
    }

    fn registry_source(&self) -> &str {
        &self.source.registry
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if self.batch_files().is_empty() {
            validate_url("source.base_url", &self.source.base_url)?;
            validate_quarter_labels("source.quarters", &self.source.quarters)?;
        } else {
            for file in self.batch_files() {
                validate_path("source.batch_files", file)?;
            }
        }
        validate_registry_source("source.registry", &self.source.registry)?;
        validate_path("load.output_path", &self.load.output_path)?;
        Ok(())
    }
}
