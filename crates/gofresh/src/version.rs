//! Version information for the CLI itself

use serde::Serialize;

/// Version information reported by `gofresh version`.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    /// CLI semantic version
    pub version: String,

    /// Toolchain version the embedded release manifest targets, when the
    /// manifest parses
    pub toolchain: Option<String>,
}

impl VersionInfo {
    /// Version info for the current build.
    pub fn current() -> Self {
        let toolchain = gofresh_core::ReleaseManifest::embedded()
            .ok()
            .and_then(|manifest| manifest.target_version().ok())
            .map(|version| version.to_string());

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            toolchain,
        }
    }

    /// Format as display string
    pub fn display(&self) -> String {
        match &self.toolchain {
            Some(toolchain) => format!("gofresh {} (go {})", self.version, toolchain),
            None => format!("gofresh {}", self.version),
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
