//! On-disk installation layout
//!
//! The layout ties together the three paths the pipeline touches: the live
//! installation directory, its sibling backup, and the parent directory the
//! release tarball unpacks into. At most one of {primary, backup} is in
//! motion at any time; a finished run leaves exactly one of them as the
//! live installation.

use std::path::{Path, PathBuf};

/// Default installation directory for the toolchain.
pub const DEFAULT_INSTALL_ROOT: &str = "/usr/local/go";

/// Suffix appended to the primary path to form the backup path.
const BACKUP_SUFFIX: &str = ".backup";

/// The primary installation directory and its derived sibling paths.
#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The live installation directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sibling directory the previous installation is parked in during an
    /// update attempt.
    pub fn backup_path(&self) -> PathBuf {
        // Appended, not with_extension: the root directory name may itself
        // contain dots.
        let mut name = self
            .root
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(BACKUP_SUFFIX);
        self.root.with_file_name(name)
    }

    /// Directory the archive unpacks into; the archive's top-level entry
    /// recreates the installation root beneath it.
    pub fn staging_parent(&self) -> Option<&Path> {
        self.root.parent()
    }

    /// Path of the installed toolchain binary used for version probing.
    pub fn binary_path(&self) -> PathBuf {
        self.root.join("bin").join("go")
    }
}

impl Default for InstallLayout {
    fn default() -> Self {
        Self::new(DEFAULT_INSTALL_ROOT)
    }
}
