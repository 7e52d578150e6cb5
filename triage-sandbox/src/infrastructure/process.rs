//! Subprocess tool runner
//!
//! Spawns each tool with `tokio::process`, waits under the policy timeout
//! and, on Linux, applies resource limits in the child before exec.

use std::process::{ExitStatus, Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use triage_core::domain::{SOFT_FAILURE_EXIT_CODE, ToolOutcome};

use crate::domain::command::ToolCommand;
use crate::domain::policy::SandboxPolicy;
use crate::domain::traits::{SandboxError, SandboxResult, ToolRunner};

/// Runs tools as child processes of the service
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessToolRunner;

impl ProcessToolRunner {
    pub fn new() -> Self {
        Self
    }

    /// Spawn and wait. `Ok(None)` means the timeout elapsed and the child
    /// was killed.
    async fn execute(
        &self,
        command: &ToolCommand,
        policy: &SandboxPolicy,
    ) -> SandboxResult<Option<Output>> {
        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(target_os = "linux")]
        if policy.enabled {
            limits::install(&mut process, policy);
        }

        let child = process.spawn().map_err(|source| SandboxError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it
        match tokio::time::timeout(policy.timeout, child.wait_with_output()).await {
            Ok(output) => Ok(Some(output?)),
            Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl ToolRunner for ProcessToolRunner {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn run(&self, command: &ToolCommand, policy: &SandboxPolicy) -> ToolOutcome {
        debug!(command = %command, timeout_secs = policy.timeout.as_secs(), "Running tool");

        match self.execute(command, policy).await {
            Ok(Some(output)) => outcome_from_output(output),
            Ok(None) => {
                warn!(program = %command.program, "Tool timed out after {:?}", policy.timeout);
                ToolOutcome::timed_out(policy.timeout.as_secs())
            }
            Err(e) => {
                warn!(program = %command.program, error = %e, "Tool could not be executed");
                ToolOutcome::soft_failure(e.to_string())
            }
        }
    }
}

fn outcome_from_output(output: Output) -> ToolOutcome {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    let exit_code = match output.status.code() {
        Some(code) => code,
        None => {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&termination_note(&output.status));
            SOFT_FAILURE_EXIT_CODE
        }
    };

    ToolOutcome {
        stdout,
        stderr,
        exit_code,
    }
}

#[cfg(unix)]
fn termination_note(status: &ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(signal) => format!("Terminated by signal {}", signal),
        None => format!("Terminated abnormally: {}", status),
    }
}

#[cfg(not(unix))]
fn termination_note(status: &ExitStatus) -> String {
    format!("Terminated abnormally: {}", status)
}

#[cfg(target_os = "linux")]
mod limits {
    use nix::sys::resource::{Resource, setrlimit};
    use tokio::process::Command;

    use crate::domain::policy::SandboxPolicy;

    /// Register the rlimit hook on `command`. A failing hook makes the spawn
    /// itself fail, so an unconfined tool never runs.
    pub(super) fn install(command: &mut Command, policy: &SandboxPolicy) {
        let max_memory = policy.max_memory_bytes;
        let max_files = policy.max_open_files;

        // SAFETY: the hook only issues setrlimit syscalls and builds
        // io::Error values from errno, both async-signal-safe.
        unsafe {
            command.pre_exec(move || apply_resource_limits(max_memory, max_files));
        }
    }

    fn apply_resource_limits(max_memory: u64, max_files: u64) -> std::io::Result<()> {
        setrlimit(Resource::RLIMIT_AS, max_memory, max_memory)?;
        // Disable core dumps
        setrlimit(Resource::RLIMIT_CORE, 0, 0)?;
        setrlimit(Resource::RLIMIT_NOFILE, max_files, max_files)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn sh(script: &str) -> ToolCommand {
        ToolCommand::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    fn policy() -> SandboxPolicy {
        SandboxPolicy::unrestricted(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let runner = ProcessToolRunner::new();
        let outcome = runner.run(&sh("echo hello; echo oops >&2"), &policy()).await;
        assert_eq!(outcome.stdout, "hello\n");
        assert_eq!(outcome.stderr, "oops\n");
        assert_eq!(outcome.exit_code, 0);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let runner = ProcessToolRunner::new();
        let outcome = runner.run(&sh("exit 3"), &policy()).await;
        assert_eq!(outcome.exit_code, 3);
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_missing_binary_is_soft_failure() {
        let runner = ProcessToolRunner::new();
        let command = ToolCommand::new("definitely-not-a-real-tool-xyz", vec![]);
        let outcome = runner.run(&command, &policy()).await;
        assert_eq!(outcome.exit_code, -1);
        assert_eq!(outcome.stdout, "");
        assert!(outcome.stderr.contains("definitely-not-a-real-tool-xyz"));
    }

    #[tokio::test]
    async fn test_timeout_kills_the_tool() {
        let runner = ProcessToolRunner::new();
        let command = ToolCommand::new("sleep", vec!["30".to_string()]);
        let started = Instant::now();

        let outcome = runner
            .run(&command, &SandboxPolicy::unrestricted(Duration::from_secs(1)))
            .await;

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(outcome.stdout, "");
        assert_eq!(outcome.exit_code, -1);
        assert!(outcome.stderr.contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_termination_is_reported() {
        let runner = ProcessToolRunner::new();
        let outcome = runner.run(&sh("kill -9 $$"), &policy()).await;
        assert_eq!(outcome.exit_code, -1);
        assert!(outcome.stderr.contains("signal 9"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_runs_with_resource_limits() {
        let runner = ProcessToolRunner::new();
        let policy = SandboxPolicy::default().with_timeout_secs(10);
        let outcome = runner.run(&sh("echo limited"), &policy).await;
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout, "limited\n");
    }

    #[test]
    fn test_runner_name() {
        assert_eq!(ProcessToolRunner::new().name(), "process");
    }
}
