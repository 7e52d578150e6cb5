//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::ToolSpec;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub analysis: AnalysisConfig,
    pub sandbox: SandboxConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Use ["*"] to allow any. Empty vector -> no external origins.
    pub allowed_origins: Vec<String>,
    /// Upper bound on request bodies, uploads included
    pub max_upload_bytes: usize,
    /// Grace period for in-flight requests after a shutdown signal
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec!["*".to_string()],
            max_upload_bytes: 100 * 1024 * 1024,
            shutdown_timeout_seconds: 5,
        }
    }
}

impl ServerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

/// Job store engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Storage configuration: job records, uploads and result bundles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub upload_dir: PathBuf,
    pub results_dir: PathBuf,
    /// SQLite database file (ignored by the memory backend)
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            upload_dir: PathBuf::from("./uploads"),
            results_dir: PathBuf::from("./results"),
            database_url: "./db/analyzer.db".to_string(),
        }
    }
}

/// Analysis pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Default timeout per tool invocation
    pub tool_timeout_seconds: u64,
    /// Maximum number of analysis jobs executing at once
    pub max_concurrent_jobs: usize,
    /// Capacity of the pending job queue
    pub queue_capacity: usize,
    /// Inspection tools, run in this order
    pub tools: Vec<ToolSpec>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tool_timeout_seconds: 60,
            max_concurrent_jobs: 4,
            queue_capacity: 64,
            tools: ToolSpec::default_set(),
        }
    }
}

impl AnalysisConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_seconds)
    }
}

/// Sandbox limits applied to every tool subprocess
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Apply resource limits to tool subprocesses (Linux only)
    pub enabled: bool,
    /// Address space limit per tool process
    pub max_memory_bytes: u64,
    /// Open file descriptor limit per tool process
    pub max_open_files: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_memory_bytes: 2 * 1024 * 1024 * 1024,
            max_open_files: 256,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "json" or "pretty"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.storage.validate()?;
        self.analysis.validate()?;
        self.sandbox.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Prefix of configuration environment variables (`TRIAGE__SERVER__PORT`)
pub const ENV_PREFIX: &str = "TRIAGE";

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        // Local config and environment variables last (highest priority)
        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from an explicit file, or fall back to [`Config::load`]
    /// when `path` is `None`. Environment variables still take precedence.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let Some(path) = path else {
            return Self::load();
        };

        let config: Config = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        config.validate()?;

        Ok(config)
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}
