//! Orchestrator application layer

pub mod executor;
pub mod orchestrator;
pub mod resolver;
pub mod workflow;

pub use executor::{AnalysisExecutor, ExecutionError};
pub use orchestrator::{JobOrchestrator, OrchestratorError, RecoveryReport, SessionInfo};
pub use resolver::{ResolveError, ResultResolver, ResultsLookup};
pub use workflow::{JobWorkflow, WorkflowError};
