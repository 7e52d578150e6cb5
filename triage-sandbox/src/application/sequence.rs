//! Ordered tool execution against a single file

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use triage_core::domain::{ToolOutcome, ToolSpec};

use crate::domain::command::ToolCommand;
use crate::domain::policy::SandboxPolicy;
use crate::domain::traits::ToolRunner;

/// The configured tools, run one after another
///
/// Every tool runs regardless of how the previous ones ended.
#[derive(Clone)]
pub struct ToolSequence {
    tools: Vec<ToolSpec>,
    runner: Arc<dyn ToolRunner>,
    policy: SandboxPolicy,
}

impl ToolSequence {
    pub fn new(tools: Vec<ToolSpec>, runner: Arc<dyn ToolRunner>, policy: SandboxPolicy) -> Self {
        Self {
            tools,
            runner,
            policy,
        }
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    pub fn runner_name(&self) -> &'static str {
        self.runner.name()
    }

    /// Timeout applied to tools without their own override
    pub fn default_timeout(&self) -> Duration {
        self.policy.timeout
    }

    fn policy_for(&self, tool: &ToolSpec) -> SandboxPolicy {
        match tool.timeout_seconds {
            Some(secs) => self.policy.clone().with_timeout_secs(secs),
            None => self.policy.clone(),
        }
    }

    /// Run every tool against `target`, keyed by tool name.
    pub async fn run_all(&self, target: &Path) -> BTreeMap<String, ToolOutcome> {
        let mut outcomes = BTreeMap::new();

        for tool in &self.tools {
            let command = ToolCommand::for_target(tool, target);
            let outcome = self.runner.run(&command, &self.policy_for(tool)).await;
            debug!(tool = %tool.name, exit_code = outcome.exit_code, "Tool finished");
            outcomes.insert(tool.name.clone(), outcome);
        }

        info!(
            target = %target.display(),
            tools = outcomes.len(),
            failed = outcomes.values().filter(|o| !o.is_success()).count(),
            "Tool sequence completed"
        );

        outcomes
    }
}

impl std::fmt::Debug for ToolSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSequence")
            .field("tools", &self.tool_names())
            .field("runner", &self.runner.name())
            .field("policy", &self.policy)
            .finish()
    }
}
