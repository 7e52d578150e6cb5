//! Result bundle model
//!
//! The bundle is the on-disk JSON contract shared by the service and the
//! standalone analyzer. `tools` is an ordered map so identical inputs
//! always serialize identically.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::tool::ToolOutcome;

/// Content fingerprints of an analyzed file, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprints {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
}

/// File-level metadata recorded alongside the tool outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub filename: String,
    pub filesize: u64,
    pub hashes: Fingerprints,
    pub analysis_timestamp: String,
}

/// Persisted output of running every configured tool against one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBundle {
    pub metadata: BundleMetadata,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolOutcome>,
}

impl ResultBundle {
    pub fn new(
        filename: impl Into<String>,
        filesize: u64,
        hashes: Fingerprints,
        analyzed_at: DateTime<Utc>,
        tools: BTreeMap<String, ToolOutcome>,
    ) -> Self {
        Self {
            metadata: BundleMetadata {
                filename: filename.into(),
                filesize,
                hashes,
                analysis_timestamp: analyzed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            },
            tools,
        }
    }

    /// Bundle file name: derived from content, not from the job.
    pub fn file_name(&self) -> String {
        bundle_file_name(&self.metadata.hashes.sha256)
    }
}

pub fn bundle_file_name(sha256: &str) -> String {
    format!("{}.json", sha256)
}
