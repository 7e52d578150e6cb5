//! Tool runner trait and error types

use async_trait::async_trait;
use thiserror::Error;

use triage_core::domain::ToolOutcome;

use super::command::ToolCommand;
use super::policy::SandboxPolicy;

/// Result type for sandbox operations
pub type SandboxResult<T> = Result<T, SandboxError>;

/// Errors raised while preparing or launching a tool process
///
/// These never escape a [`ToolRunner`]; they are folded into the
/// [`ToolOutcome`] as a soft failure.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The program could not be started
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child or reading its output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Executes one inspection command
///
/// Implementations must not fail: every fault, including a timeout, is
/// reported through the returned [`ToolOutcome`].
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Runner name recorded in execution metadata
    fn name(&self) -> &'static str;

    async fn run(&self, command: &ToolCommand, policy: &SandboxPolicy) -> ToolOutcome;
}
