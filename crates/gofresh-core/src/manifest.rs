//! Release manifest: target version and checksum registry
//!
//! The manifest is plain TOML data. A copy for the current release ships
//! embedded in the binary; operators can substitute a newer one with
//! `--manifest <path>` without rebuilding.

use std::collections::BTreeMap;
use std::path::Path;

use semver::Version;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded manifest for the release this build targets.
const EMBEDDED_MANIFEST: &str = include_str!("../resources/release.toml");

/// Target version plus the artifact-to-digest registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseManifest {
    /// Toolchain version this manifest describes
    version: String,

    /// Expected SHA-256 digests, keyed by exact artifact filename
    checksums: BTreeMap<String, String>,
}

impl ReleaseManifest {
    /// Load the manifest embedded at build time.
    pub fn embedded() -> Result<Self> {
        Self::parse(EMBEDDED_MANIFEST, "<embedded>")
    }

    /// Load a manifest from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::manifest(path.display().to_string(), e.to_string()))?;
        Self::parse(&raw, &path.display().to_string())
    }

    fn parse(raw: &str, origin: &str) -> Result<Self> {
        let manifest: Self =
            toml::from_str(raw).map_err(|e| Error::manifest(origin, e.to_string()))?;
        if manifest.checksums.is_empty() {
            return Err(Error::manifest(origin, "empty checksum table"));
        }
        Ok(manifest)
    }

    /// The version this manifest updates to.
    pub fn target_version(&self) -> Result<Version> {
        Version::parse(&self.version)
            .map_err(|e| Error::version_parse(&self.version, e.to_string()))
    }

    /// Expected digest for an artifact, lowercased for comparison.
    ///
    /// A missing entry is a hard error: an artifact without a known-good
    /// checksum must not be trusted.
    pub fn expected_checksum(&self, artifact: &str) -> Result<String> {
        self.checksums
            .get(artifact)
            .map(|digest| digest.to_ascii_lowercase())
            .ok_or_else(|| Error::UnknownArtifact {
                artifact: artifact.to_string(),
            })
    }
}
