//! Error types for gofresh-core

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using gofresh-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the update pipeline.
///
/// The variants follow the stages of the workflow: preconditions, the
/// version gate, transport, integrity checking, and installation. The
/// installation variants are deliberately distinct so callers can tell a
/// rolled-back failure from an indeterminate one, and a cleanup failure
/// from a failed upgrade.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller is not running with root privileges
    #[error("root privileges are required to modify the installation directory")]
    NotPrivileged,

    /// Host platform has no published release artifact
    #[error("unsupported host platform: {os}/{arch}")]
    UnsupportedHost { os: String, arch: String },

    /// Invoking the installed binary to read its version failed
    #[error("failed to probe installed toolchain version: {reason}")]
    VersionProbe { reason: String },

    /// A version string did not parse as major.minor.patch
    #[error("unrecognized version string '{input}': {reason}")]
    VersionParse { input: String, reason: String },

    /// Network, HTTP-status, or disk-write failure while downloading
    #[error("failed to download {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Artifact has no entry in the checksum registry
    #[error("no known checksum for artifact '{artifact}'; refusing to trust it")]
    UnknownArtifact { artifact: String },

    /// Computed digest differs from the registered one
    #[error("checksum mismatch for '{artifact}': expected {expected}, computed {computed}")]
    ChecksumMismatch {
        artifact: String,
        expected: String,
        computed: String,
    },

    /// Renaming the installation directory aside failed; nothing was changed
    #[error("failed to back up {from} as {to}")]
    BackupFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Extraction failed and the previous installation was restored.
    ///
    /// Still an error: the update did not happen, even though the system
    /// is back in its prior working state.
    #[error("update failed during extraction ({reason}); the previous installation was restored")]
    ExtractionRolledBack { reason: String },

    /// Extraction failed and rollback also failed.
    ///
    /// The most severe outcome: the toolchain may now be missing or
    /// half-installed.
    #[error(
        "rollback after a failed extraction did not complete ({reason}); \
         the toolchain may be missing or partially installed"
    )]
    RollbackFailed { reason: String },

    /// The upgrade succeeded but deleting the backup or artifact failed
    #[error("upgrade succeeded but cleanup failed for {path}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Release manifest unreadable or unparsable
    #[error("invalid release manifest {path}: {reason}")]
    Manifest { path: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a version-parse error
    pub fn version_parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::VersionParse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a version-probe error
    pub fn version_probe(reason: impl Into<String>) -> Self {
        Self::VersionProbe {
            reason: reason.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a manifest error
    pub fn manifest(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error left the system in an indeterminate state
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }
}
