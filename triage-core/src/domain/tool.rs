//! Inspection tool descriptions and their captured outcomes

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the path of the file under analysis.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Exit code reported when a tool could not produce a real exit status
/// (timeout, spawn failure, termination by signal).
pub const SOFT_FAILURE_EXIT_CODE: i32 = -1;

/// One configured inspection tool.
///
/// `args` may contain [`FILE_PLACEHOLDER`]; when it does not, the target
/// path is appended as the last argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Key under which the outcome is stored in the result bundle
    pub name: String,
    /// Program to execute (resolved through `PATH`)
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Per-tool override of the analysis-wide timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout_seconds: None,
        }
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Default tool set used by the service: file-type identification,
    /// printable-string extraction and embedded-signature scan.
    pub fn default_set() -> Vec<ToolSpec> {
        vec![
            ToolSpec::new("file", "file", &[FILE_PLACEHOLDER]),
            ToolSpec::new("strings", "strings", &[FILE_PLACEHOLDER]),
            ToolSpec::new("binwalk", "binwalk", &["-B", FILE_PLACEHOLDER]),
        ]
    }

    /// Tool set used by the standalone analyzer: the service set plus a
    /// basic radare2 disassembly of `main`.
    pub fn standalone_set() -> Vec<ToolSpec> {
        let mut tools = Self::default_set();
        tools.push(ToolSpec::new(
            "radare2",
            "r2",
            &["-q", "-c", "aaa;pdf@main;quit", FILE_PLACEHOLDER],
        ));
        tools
    }
}

/// Uniform record of one tool invocation.
///
/// Failures of the tool itself are encoded here rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub stdout: String,
    pub stderr: String,
    /// `returncode` is accepted for bundles written by the legacy scripts
    #[serde(alias = "returncode")]
    pub exit_code: i32,
}

impl ToolOutcome {
    /// Soft failure: no output, a diagnostic on stderr, sentinel exit code.
    pub fn soft_failure(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            exit_code: SOFT_FAILURE_EXIT_CODE,
        }
    }

    pub fn timed_out(timeout_secs: u64) -> Self {
        Self::soft_failure(format!("Command timed out after {} seconds", timeout_secs))
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}
