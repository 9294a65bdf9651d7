use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::ConfigError;

#[cfg(test)]
#[path = "./config.tests.rs"]
mod config_tests;

pub const APP_NAME: &str = "crmex";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8686;

/// Logging configuration.
#[derive(Serialize, Deserialize, Clone, Default, Debug, PartialEq)]
pub struct Logs {
    /// Directory for the daily rolling log files, logs go to stdout if not set.
    pub dir: Option<PathBuf>,
}

/// Custom resource type to export metrics for.
#[derive(Serialize, Deserialize, Clone, Default, Debug, PartialEq)]
pub struct ResourceConfig {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Display for ResourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.kind, self.version)
        } else {
            write!(f, "{}.{}/{}", self.kind, self.group, self.version)
        }
    }
}

/// Application configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,

    #[serde(default)]
    pub resources: Vec<ResourceConfig>,

    #[serde(default)]
    pub logs: Logs,
}

fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            namespaces: None,
            resources: Vec::new(),
            logs: Logs::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a YAML file.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut file = File::open(path).await?;

        let mut config_str = String::new();
        file.read_to_string(&mut config_str).await?;

        Self::from_yaml(&config_str)
    }

    /// Loads the configuration from `path` or returns the default one if `path` is `None`.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let config = Self::load(path).await?;
                tracing::info!("Configuration loaded from {}", path.display());
                Ok(config)
            },
            None => Ok(Self::default()),
        }
    }

    /// Parses and validates the configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config = serde_yaml::from_str::<Config>(yaml)?;
        config.validate()?;

        Ok(config)
    }

    /// Checks if every configured resource has its kind and version.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(resource) = self
            .resources
            .iter()
            .find(|r| r.kind.trim().is_empty() || r.version.trim().is_empty())
        {
            return Err(ConfigError::IncompleteResource(resource.to_string()));
        }

        Ok(())
    }
}
