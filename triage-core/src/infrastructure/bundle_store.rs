//! Filesystem store for result bundles and completion markers
//!
//! A results directory holds `<sha256>.json` bundles and a `completed`
//! marker naming the authoritative one. Bundle first, marker second; both
//! go through a temporary sibling and a rename so the final names only
//! ever point at fully written files.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::ResultBundle;

/// Name of the completion marker file inside a results directory.
pub const COMPLETION_MARKER: &str = "completed";

#[derive(Debug, thiserror::Error)]
pub enum BundleStoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bundle serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Completion marker in {0} is empty")]
    EmptyMarker(PathBuf),
}

impl BundleStoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True when the underlying cause is a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Write `bundle` into `dir` under its content-derived name.
///
/// Returns the bundle file name (not the full path), which is what the
/// completion marker records.
pub async fn write_bundle(dir: &Path, bundle: &ResultBundle) -> Result<String, BundleStoreError> {
    let file_name = bundle.file_name();
    let json = serde_json::to_vec_pretty(bundle)?;

    write_atomically(&dir.join(&file_name), &json).await?;
    debug!(dir = %dir.display(), bundle = %file_name, "Result bundle written");

    Ok(file_name)
}

/// Record `bundle_file_name` as the authoritative bundle of `dir`.
pub async fn write_completion_marker(
    dir: &Path,
    bundle_file_name: &str,
) -> Result<(), BundleStoreError> {
    write_atomically(&dir.join(COMPLETION_MARKER), bundle_file_name.as_bytes()).await
}

/// Read the completion marker. `Ok(None)` when no marker exists.
pub async fn read_completion_marker(dir: &Path) -> Result<Option<String>, BundleStoreError> {
    let path = dir.join(COMPLETION_MARKER);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => {
            let name = content.trim();
            if name.is_empty() {
                return Err(BundleStoreError::EmptyMarker(dir.to_path_buf()));
            }
            Ok(Some(name.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BundleStoreError::io(&path, e)),
    }
}

/// Load and parse a bundle file from `dir`.
pub async fn load_bundle(dir: &Path, bundle_file_name: &str) -> Result<ResultBundle, BundleStoreError> {
    let path = dir.join(bundle_file_name);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| BundleStoreError::io(&path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), BundleStoreError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    tokio::fs::write(&tmp, contents)
        .await
        .map_err(|e| BundleStoreError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| BundleStoreError::io(path, e))
}
