//! Explorer configuration
//!
//! Loaded from a TOML file (`model-explorer.toml` by default):
//!
//! ```toml
//! [server]
//! url = "https://erp.example.com"
//! database = "prod"
//! username = "admin"
//! timeout_seconds = 30
//!
//! [cache]
//! dir = "/var/cache/odoo_explorer"
//!
//! [export]
//! depth = 2
//! timezone_handling = true
//! framework = "flutter"
//! ```
//!
//! Every section and key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{CacheResult, default_cache_dir};
use crate::export::{Framework, PromptOptions, SchemaExportOptions};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "model-explorer.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),
    #[error("Invalid config file {0}: {1}")]
    ParseError(PathBuf, String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Connection settings for the REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Bearer token; takes precedence over username and password
    pub token: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            database: None,
            username: None,
            password: None,
            token: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory; `~/.odoo_explorer` when unset
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    pub fn resolve_dir(&self) -> CacheResult<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => default_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default)]
    pub exclude_timezone: bool,
    #[serde(default)]
    pub timezone_handling: bool,
    #[serde(default = "default_framework")]
    pub framework: String,
    pub app_description: Option<String>,
}

fn default_depth() -> u32 {
    1
}

fn default_framework() -> String {
    Framework::ReactNative.as_str().to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            exclude_timezone: false,
            timezone_handling: false,
            framework: default_framework(),
            app_description: None,
        }
    }
}

impl ExportConfig {
    pub fn schema_options(&self) -> SchemaExportOptions {
        SchemaExportOptions::default()
            .with_depth(self.depth)
            .with_exclude_timezone(self.exclude_timezone)
            .with_timezone_handling(self.timezone_handling)
    }

    pub fn prompt_options(&self) -> PromptOptions {
        let framework = self
            .framework
            .parse::<Framework>()
            .unwrap_or_default();
        PromptOptions::default()
            .with_app_description(self.app_description.clone().unwrap_or_default())
            .with_exclude_timezone(self.exclude_timezone)
            .with_timezone_handling(self.timezone_handling)
            .with_framework(framework)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl ExplorerConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<inline>"), e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, else [`DEFAULT_CONFIG_FILE`] if present, else defaults
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server.url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(format!(
                "server.url must start with http:// or https://, got {}",
                url
            )));
        }
        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "server.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
