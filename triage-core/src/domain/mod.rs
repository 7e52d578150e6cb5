//! Shared analysis domain

pub mod analysis;
pub mod tool;

pub use analysis::{BundleMetadata, Fingerprints, ResultBundle, bundle_file_name};
pub use tool::{FILE_PLACEHOLDER, SOFT_FAILURE_EXIT_CODE, ToolOutcome, ToolSpec};
