use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::render::DEFAULT_MAX_DESCRIPTION;

/// Login whose merged PRs are collected when neither the CLI flag nor the
/// config file names one.
pub const DEFAULT_USERNAME: &str = "AndreaBozzo";

const CONFIG_FILE: &str = ".contrib-tracker.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .contrib-tracker.toml.
/// Every field is optional; the tool runs with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// API token. If None, falls back to the GITHUB_TOKEN env var.
    pub token: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Character budget for table descriptions.
    #[serde(default = "default_max_description")]
    pub max_description: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_description: default_max_description(),
        }
    }
}

fn default_max_description() -> usize {
    DEFAULT_MAX_DESCRIPTION
}

impl Config {
    /// Load configuration from .contrib-tracker.toml in the current
    /// directory. Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the API token: config file value takes precedence, falls
    /// back to the GITHUB_TOKEN env var. Absence is not an error; requests
    /// go out unauthenticated.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    /// Resolve the login to collect PRs for: CLI flag, then config file,
    /// then the built-in default.
    pub fn username(&self, cli_user: Option<&str>) -> String {
        cli_user
            .map(String::from)
            .or_else(|| self.github.username.clone())
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
    }
}
