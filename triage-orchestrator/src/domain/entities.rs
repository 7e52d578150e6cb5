//! Orchestrator domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::value_objects::{AnalysisKind, JobStatus, JobTransitionError};

/// Display name of placeholder interactive jobs
pub const INTERACTIVE_SESSION_NAME: &str = "Interactive session (simplified)";

/// One tracked submission
///
/// `completion_time` is set iff the status is terminal. `file_hash` is the
/// sha256 of the submitted bytes once the current run has fingerprinted them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisJob {
    pub id: Uuid,
    #[schema(example = "evil.bin")]
    pub filename: String,
    pub status: JobStatus,
    pub upload_time: DateTime<Utc>,
    pub completion_time: Option<DateTime<Utc>>,
    pub analysis_kind: AnalysisKind,
    #[schema(example = "2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae")]
    pub file_hash: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub execution_info: Option<serde_json::Value>,
}

impl AnalysisJob {
    /// New `pending` file analysis
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            status: JobStatus::Pending,
            upload_time: Utc::now(),
            completion_time: None,
            analysis_kind: AnalysisKind::File,
            file_hash: None,
            execution_info: None,
        }
    }

    /// New `pending` interactive placeholder
    pub fn interactive() -> Self {
        Self {
            analysis_kind: AnalysisKind::Interactive,
            ..Self::new(INTERACTIVE_SESSION_NAME)
        }
    }

    /// Apply a status change, maintaining the timestamp and hash invariants.
    pub fn transition(&mut self, to: JobStatus) -> Result<(), JobTransitionError> {
        if !self.status.can_transition_to(&to) {
            return Err(JobTransitionError {
                from: self.status,
                to,
            });
        }

        match to {
            JobStatus::Completed | JobStatus::Failed => {
                self.completion_time = Some(Utc::now());
            }
            JobStatus::Pending => {
                self.completion_time = None;
                self.file_hash = None;
            }
            JobStatus::Running => {}
        }

        self.status = to;
        Ok(())
    }

    /// A run is queued or executing
    pub fn is_busy(&self) -> bool {
        matches!(self.status, JobStatus::Pending | JobStatus::Running)
    }
}
