//! Triage - binary triage service
//!
//! Wires the orchestrator, the sandboxed tool runner and the HTTP API into
//! one application. The standalone analyzer lives in `triage-cli`.

mod app;

pub use app::{AppHandle, create_app};
pub use triage_core::{Config, init_tracing};
pub use triage_orchestrator::presentation::OrchestratorState;

pub use triage_core;
pub use triage_orchestrator;
pub use triage_sandbox;
