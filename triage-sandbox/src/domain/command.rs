//! Concrete tool invocations

use std::fmt;
use std::path::Path;

use triage_core::domain::{FILE_PLACEHOLDER, ToolSpec};

/// Program and fully resolved arguments for one tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Resolve `spec` against `target`.
    ///
    /// Every `{file}` occurrence is replaced with the target path; when no
    /// argument mentions it, the path is appended.
    pub fn for_target(spec: &ToolSpec, target: &Path) -> Self {
        let target = target.to_string_lossy();
        let mut substituted = false;

        let mut args: Vec<String> = spec
            .args
            .iter()
            .map(|arg| {
                if arg.contains(FILE_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(FILE_PLACEHOLDER, &target)
                } else {
                    arg.clone()
                }
            })
            .collect();

        if !substituted {
            args.push(target.into_owned());
        }

        Self::new(spec.program.clone(), args)
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
