use std::path::Path;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::domain::Fingerprints;

impl Fingerprints {
    /// Fingerprint raw bytes.
    ///
    /// Depends only on content; md5 and sha1 are kept for lookups in
    /// external tool ecosystems, sha256 is the identity used everywhere else.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            md5: hex::encode(Md5::digest(bytes)),
            sha1: hex::encode(Sha1::digest(bytes)),
            sha256: hex::encode(Sha256::digest(bytes)),
        }
    }
}

/// Read a file and fingerprint its content. Returns the fingerprints and
/// the size in bytes.
///
/// Hashing runs on the blocking pool so large uploads do not stall the
/// async workers.
pub async fn fingerprint_file(path: &Path) -> std::io::Result<(Fingerprints, u64)> {
    let bytes = tokio::fs::read(path).await?;
    let size = bytes.len() as u64;

    let fingerprints = tokio::task::spawn_blocking(move || Fingerprints::from_bytes(&bytes))
        .await
        .map_err(std::io::Error::other)?;

    Ok((fingerprints, size))
}
