//! On-disk layout of uploads, working copies and results
//!
//! ```text
//! <upload_dir>/<id>/source/<filename>   canonical upload
//! <upload_dir>/<id>/work/<filename>     executor working copy
//! <results_dir>/<id>/                   result bundles + completion marker
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use triage_core::config::StorageConfig;

/// Reduce a client-supplied name to its final path component.
///
/// Returns `None` for names that cannot be stored safely.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return None;
    }
    Some(name.to_string())
}

#[derive(Debug, Clone)]
pub struct Storage {
    upload_dir: PathBuf,
    results_dir: PathBuf,
}

impl Storage {
    pub fn new(upload_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            results_dir: results_dir.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.upload_dir, &config.results_dir)
    }

    /// Create the top-level directories.
    pub async fn bootstrap(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::create_dir_all(&self.results_dir).await?;
        debug!(
            upload_dir = %self.upload_dir.display(),
            results_dir = %self.results_dir.display(),
            "Storage directories ready"
        );
        Ok(())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn source_path(&self, id: Uuid, filename: &str) -> PathBuf {
        self.upload_dir
            .join(id.to_string())
            .join("source")
            .join(filename)
    }

    pub fn work_dir(&self, id: Uuid) -> PathBuf {
        self.upload_dir.join(id.to_string()).join("work")
    }

    pub fn work_path(&self, id: Uuid, filename: &str) -> PathBuf {
        self.work_dir(id).join(filename)
    }

    pub fn results_dir_for(&self, id: Uuid) -> PathBuf {
        self.results_dir.join(id.to_string())
    }

    /// Persist submitted bytes at the canonical upload location.
    pub async fn store_upload(
        &self,
        id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> std::io::Result<PathBuf> {
        let path = self.source_path(id, filename);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Locate the original bytes: canonical upload first, then the working copy.
    pub async fn locate_source(&self, id: Uuid, filename: &str) -> Option<PathBuf> {
        for candidate in [self.source_path(id, filename), self.work_path(id, filename)] {
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }
        None
    }

    /// Create the per-job working and results directories and copy `source`
    /// into the working directory. Returns `(working_copy, results_dir)`.
    pub async fn prepare_run(
        &self,
        id: Uuid,
        filename: &str,
        source: &Path,
    ) -> std::io::Result<(PathBuf, PathBuf)> {
        let work_path = self.work_path(id, filename);
        let results_dir = self.results_dir_for(id);

        tokio::fs::create_dir_all(self.work_dir(id)).await?;
        tokio::fs::create_dir_all(&results_dir).await?;

        // A restart may run straight from the working copy
        if source != work_path {
            tokio::fs::copy(source, &work_path).await?;
        } else if !tokio::fs::try_exists(&work_path).await? {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source file {} is missing", work_path.display()),
            ));
        }

        Ok((work_path, results_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("evil.bin").as_deref(), Some("evil.bin"));
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\x\\a.exe").as_deref(),
            Some("a.exe")
        );
        assert_eq!(sanitize_filename("  spaced.bin ").as_deref(), Some("spaced.bin"));
        assert!(sanitize_filename("").is_none());
        assert!(sanitize_filename("dir/").is_none());
        assert!(sanitize_filename("..").is_none());
        assert!(sanitize_filename("a\0b").is_none());
    }

    #[tokio::test]
    async fn test_upload_and_run_layout() {
        let root = tempfile::tempdir().unwrap();
        let storage = Storage::new(root.path().join("uploads"), root.path().join("results"));
        storage.bootstrap().await.unwrap();
        let id = Uuid::new_v4();

        let source = storage.store_upload(id, "a.bin", b"abc").await.unwrap();
        assert_eq!(source, storage.source_path(id, "a.bin"));
        assert_eq!(storage.locate_source(id, "a.bin").await, Some(source.clone()));

        let (work, results) = storage.prepare_run(id, "a.bin", &source).await.unwrap();
        assert_eq!(std::fs::read(&work).unwrap(), b"abc");
        assert!(results.is_dir());
    }

    #[tokio::test]
    async fn test_locate_source_falls_back_to_working_copy() {
        let root = tempfile::tempdir().unwrap();
        let storage = Storage::new(root.path().join("uploads"), root.path().join("results"));
        let id = Uuid::new_v4();

        let source = storage.store_upload(id, "a.bin", b"abc").await.unwrap();
        storage.prepare_run(id, "a.bin", &source).await.unwrap();
        std::fs::remove_file(&source).unwrap();

        let located = storage.locate_source(id, "a.bin").await.unwrap();
        assert_eq!(located, storage.work_path(id, "a.bin"));

        // Running from the working copy must not truncate it
        let (work, _) = storage.prepare_run(id, "a.bin", &located).await.unwrap();
        assert_eq!(std::fs::read(work).unwrap(), b"abc");

        std::fs::remove_file(storage.work_path(id, "a.bin")).unwrap();
        assert!(storage.locate_source(id, "a.bin").await.is_none());
    }
}
