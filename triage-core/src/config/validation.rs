//! Configuration validation module

use std::collections::HashSet;

use crate::config::{AnalysisConfig, LoggingConfig, SandboxConfig, ServerConfig, StorageConfig};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Server configuration error: {message}")]
    Server { message: String },

    #[error("Storage configuration error: {message}")]
    Storage { message: String },

    #[error("Analysis configuration error: {message}")]
    Analysis { message: String },

    #[error("Sandbox configuration error: {message}")]
    Sandbox { message: String },

    #[error("Logging configuration error: {message}")]
    Logging { message: String },
}

impl ValidationError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    pub fn sandbox(message: impl Into<String>) -> Self {
        Self::Sandbox {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // u16 cannot exceed 65535, so only 0 is out of range
        if self.port == 0 {
            return Err(ValidationError::server(format!(
                "Port must be in range 1-65535, got {}",
                self.port
            )));
        }

        if self.host.is_empty() {
            return Err(ValidationError::server("Host cannot be empty"));
        }

        if self.max_upload_bytes == 0 {
            return Err(ValidationError::server(
                "max_upload_bytes must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.upload_dir.as_os_str().is_empty() {
            return Err(ValidationError::storage("upload_dir cannot be empty"));
        }

        if self.results_dir.as_os_str().is_empty() {
            return Err(ValidationError::storage("results_dir cannot be empty"));
        }

        if self.database_url.trim().is_empty() {
            return Err(ValidationError::storage("database_url cannot be empty"));
        }

        Ok(())
    }
}

impl Validate for AnalysisConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.tool_timeout_seconds == 0 {
            return Err(ValidationError::analysis(
                "tool_timeout_seconds must be greater than 0",
            ));
        }

        if self.max_concurrent_jobs == 0 {
            return Err(ValidationError::analysis(
                "max_concurrent_jobs must be greater than 0",
            ));
        }

        if self.queue_capacity == 0 {
            return Err(ValidationError::analysis(
                "queue_capacity must be greater than 0",
            ));
        }

        let mut seen = HashSet::new();
        for tool in &self.tools {
            if tool.name.trim().is_empty() {
                return Err(ValidationError::analysis("Tool name cannot be empty"));
            }
            if tool.program.trim().is_empty() {
                return Err(ValidationError::analysis(format!(
                    "Tool '{}' has an empty program",
                    tool.name
                )));
            }
            if tool.timeout_seconds == Some(0) {
                return Err(ValidationError::analysis(format!(
                    "Tool '{}' timeout_seconds must be greater than 0",
                    tool.name
                )));
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(ValidationError::analysis(format!(
                    "Duplicate tool name '{}'",
                    tool.name
                )));
            }
        }

        Ok(())
    }
}

impl Validate for SandboxConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.max_memory_bytes == 0 {
            return Err(ValidationError::sandbox(
                "max_memory_bytes must be greater than 0 when the sandbox is enabled",
            ));
        }

        if self.enabled && self.max_open_files == 0 {
            return Err(ValidationError::sandbox(
                "max_open_files must be greater than 0 when the sandbox is enabled",
            ));
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.format.as_str() {
            "json" | "pretty" => Ok(()),
            other => Err(ValidationError::logging(format!(
                "Unknown log format '{}', expected 'json' or 'pretty'",
                other
            ))),
        }
    }
}
