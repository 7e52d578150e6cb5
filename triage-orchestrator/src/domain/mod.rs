//! Orchestrator domain layer

pub mod entities;
pub mod value_objects;

pub use entities::{AnalysisJob, INTERACTIVE_SESSION_NAME};
pub use value_objects::{AnalysisKind, JobStatus, JobTransitionError};
