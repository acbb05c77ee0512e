//! Locate configuration.
//!
//! Layered lowest to highest: built-in defaults, `GEOPIXEL_*` environment
//! variables, an optional YAML file, then command-line flags.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Effective configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocateConfig {
    /// CRS of the query coordinates
    pub source_crs: String,

    /// Native CRS override; derived from the header when unset
    pub native_crs: Option<String>,

    pub format: OutputFormat,

    pub log_level: String,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            source_crs: "EPSG:4326".to_string(),
            native_crs: None,
            format: OutputFormat::Text,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// The YAML file layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    source_crs: Option<String>,
    native_crs: Option<String>,
    format: Option<OutputFormat>,
    log_level: Option<String>,
    log_json: Option<bool>,
}

impl LocateConfig {
    /// Defaults overlaid with the environment, then with `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::from_env()?;
        match path {
            Some(path) => config.with_yaml(path),
            None => Ok(config),
        }
    }

    /// Defaults overlaid with `GEOPIXEL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_vars(|key| env::var(key).ok())
    }

    fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("GEOPIXEL_SOURCE_CRS") {
            self.source_crs = v;
        }
        if let Some(v) = lookup("GEOPIXEL_NATIVE_CRS") {
            self.native_crs = Some(v);
        }
        if let Some(v) = lookup("GEOPIXEL_FORMAT") {
            match v.to_lowercase().as_str() {
                "text" => self.format = OutputFormat::Text,
                "json" => self.format = OutputFormat::Json,
                other => bail!("GEOPIXEL_FORMAT must be 'text' or 'json', got '{}'", other),
            }
        }
        if let Some(v) = lookup("GEOPIXEL_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("GEOPIXEL_LOG_JSON") {
            self.log_json = v == "true" || v == "1";
        }
        Ok(self)
    }

    /// Overlay the keys present in a YAML file.
    pub fn with_yaml(self, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        self.with_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn with_yaml_str(mut self, content: &str) -> Result<Self> {
        let file: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(content)?
        };

        if let Some(v) = file.source_crs {
            self.source_crs = v;
        }
        if file.native_crs.is_some() {
            self.native_crs = file.native_crs;
        }
        if let Some(v) = file.format {
            self.format = v;
        }
        if let Some(v) = file.log_level {
            self.log_level = v;
        }
        if let Some(v) = file.log_json {
            self.log_json = v;
        }
        Ok(self)
    }
}
