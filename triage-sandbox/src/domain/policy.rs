//! Sandbox policy value objects

use serde::{Deserialize, Serialize};
use std::time::Duration;

use triage_core::config::SandboxConfig;

/// Limits applied to a single tool invocation
///
/// The timeout always applies. Resource limits are only enforced when
/// `enabled` is set and the platform supports them (Linux).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxPolicy {
    pub enabled: bool,
    /// Maximum wall-clock time before the tool is killed
    pub timeout: Duration,
    /// Address space limit in bytes
    pub max_memory_bytes: u64,
    /// Open file descriptor limit
    pub max_open_files: u64,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(60),
            max_memory_bytes: 2 * 1024 * 1024 * 1024, // 2GB
            max_open_files: 256,
        }
    }
}

impl SandboxPolicy {
    /// Build a policy from the sandbox section and the analysis-wide timeout
    pub fn from_config(config: &SandboxConfig, timeout: Duration) -> Self {
        Self {
            enabled: config.enabled,
            timeout,
            max_memory_bytes: config.max_memory_bytes,
            max_open_files: config.max_open_files,
        }
    }

    /// Policy with the timeout only; no resource limits
    pub fn unrestricted(timeout: Duration) -> Self {
        Self {
            enabled: false,
            timeout,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timeout_secs(self, secs: u64) -> Self {
        self.with_timeout(Duration::from_secs(secs))
    }
}
