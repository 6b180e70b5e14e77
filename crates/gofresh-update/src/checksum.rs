//! Integrity checking for downloaded artifacts
//!
//! The digest is recomputed from the bytes on disk and compared, as
//! lowercase hex, against the registry entry for the exact filename. A
//! missing registry entry and a mismatched digest are distinct failures.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use gofresh_core::{Error, ReleaseManifest, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Read buffer for digest computation (1 MiB).
const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Digests involved in a successful verification, for operator display.
#[derive(Debug, Clone)]
pub struct ChecksumReport {
    pub artifact: String,
    pub expected: String,
    pub computed: String,
}

/// Verify the artifact at `path` against the manifest entry for `artifact`.
pub fn verify(path: &Path, artifact: &str, manifest: &ReleaseManifest) -> Result<ChecksumReport> {
    let expected = manifest.expected_checksum(artifact)?;
    let computed = sha256_file(path)?;

    debug!(artifact, expected, computed, "comparing sha256 digests");

    if computed != expected {
        return Err(Error::ChecksumMismatch {
            artifact: artifact.to_string(),
            expected,
            computed,
        });
    }

    Ok(ChecksumReport {
        artifact: artifact.to_string(),
        expected,
        computed,
    })
}

/// Streamed SHA-256 of a file, as lowercase hex.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
