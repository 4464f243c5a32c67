use crate::checks::CheckRunSelection;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub check: CheckConfig,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LintConfig {
    #[serde(default = "default_command")]
    pub command: String,
    /// Must keep flake8 from failing on findings
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct CheckConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub selection: CheckRunSelection,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            selection: CheckRunSelection::default(),
        }
    }
}

fn default_command() -> String {
    "flake8".to_string()
}

fn default_args() -> Vec<String> {
    vec!["--exit-zero".to_string()]
}

fn default_title() -> String {
    "flake8 failure".to_string()
}

impl Config {
    /// Load config from `path`; a missing file yields the defaults
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if !Path::new(path).exists() {
            debug!("Config file {} not found, using defaults", path);
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        let config = toml::from_str(&content).with_context(|| format!("Invalid config {}", path))?;
        Ok(config)
    }
}
