//! QQL Studio configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main QQL Studio configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QqlConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// External CLI configuration
    #[serde(default)]
    pub cli: CliConfig,

    /// Artifact storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: Vec::new(),
        }
    }
}

/// External `qql-cli` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Path to the qql-cli executable
    pub path: PathBuf,

    /// Working directory for CLI runs (defaults to the server's cwd)
    pub working_dir: Option<PathBuf>,

    /// Timeout for `--version` / `--help` probes, in milliseconds
    pub status_timeout_ms: u64,

    /// Timeout for a render, in milliseconds
    pub generate_timeout_ms: u64,

    /// Width used when a generate request omits it
    pub default_width: u32,
}

impl Default for CliConfig {
    fn default() -> Self {
        let binary = if cfg!(windows) { "qql-cli.exe" } else { "qql-cli" };
        Self {
            path: PathBuf::from("target").join("release").join(binary),
            working_dir: None,
            status_timeout_ms: 10_000,
            generate_timeout_ms: 300_000,
            default_width: 800,
        }
    }
}

impl CliConfig {
    /// Probe timeout as a `Duration`
    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    /// Render timeout as a `Duration`
    pub fn generate_timeout(&self) -> Duration {
        Duration::from_millis(self.generate_timeout_ms)
    }
}

/// Artifact storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory the CLI renders into
    pub output_dir: PathBuf,

    /// Directory holding the web UI, served for non-API paths
    pub static_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            static_dir: Some(PathBuf::from("web")),
        }
    }
}

impl QqlConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Default config file location (`<config dir>/qql-studio/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join("qql-studio").join("config.toml"))
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.cli.path.as_os_str().is_empty() {
            return Err(Error::Config("cli.path must not be empty".to_string()));
        }
        if self.cli.status_timeout_ms == 0 || self.cli.generate_timeout_ms == 0 {
            return Err(Error::Config("cli timeouts must be positive".to_string()));
        }
        if self.cli.default_width == 0 {
            return Err(Error::Config("cli.default_width must be positive".to_string()));
        }
        if self.storage.output_dir.as_os_str().is_empty() {
            return Err(Error::Config(
                "storage.output_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Make every relative path absolute against `base`
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let absolutize = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        self.cli.path = absolutize(&self.cli.path);
        self.cli.working_dir = Some(
            self.cli
                .working_dir
                .as_ref()
                .map(absolutize)
                .unwrap_or_else(|| base.to_path_buf()),
        );
        self.storage.output_dir = absolutize(&self.storage.output_dir);
        self.storage.static_dir = self.storage.static_dir.as_ref().map(absolutize);
        self
    }
}
