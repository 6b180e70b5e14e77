//! Update orchestration
//!
//! Ties the stages together: preconditions, version gate, download,
//! integrity check, installation. One artifact is fully downloaded,
//! verified, and installed (or the error propagated) before `run` returns.

use std::path::PathBuf;

use gofresh_core::layout::DEFAULT_INSTALL_ROOT;
use gofresh_core::{Error, InstallLayout, ReleaseManifest, ReleaseTarget, Result, DEFAULT_DOWNLOAD_BASE};
use semver::Version;
use tracing::info;

use crate::checksum;
use crate::download::{Fetcher, ProgressObserver};
use crate::gate::{self, UpdateDecision};
use crate::installer::Installer;

/// Injected configuration for one update run.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Live installation directory
    pub install_root: PathBuf,

    /// Base URL the artifact filename is appended to
    pub download_base: String,

    /// Directory the artifact is downloaded into
    pub download_dir: PathBuf,

    /// Bypass the version gate
    pub force: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            install_root: PathBuf::from(DEFAULT_INSTALL_ROOT),
            download_base: DEFAULT_DOWNLOAD_BASE.to_string(),
            download_dir: PathBuf::from("."),
            force: false,
        }
    }
}

/// Outcome of an update run.
#[derive(Debug)]
pub enum UpdateResult {
    /// Installed version is equal to or newer than the target; nothing done
    UpToDate { current: Version, target: Version },

    /// Toolchain installed or replaced
    Updated {
        /// Version that was installed before, if one was probed
        previous: Option<Version>,

        /// Version now installed
        installed: Version,

        /// False for a fresh install
        replaced_existing: bool,

        /// Verified SHA-256 of the artifact
        digest: String,
    },
}

/// Runs the version-gated update-and-swap workflow.
pub struct ToolchainUpdater {
    config: UpdateConfig,
    manifest: ReleaseManifest,
    fetcher: Fetcher,
}

impl ToolchainUpdater {
    pub fn new(config: UpdateConfig, manifest: ReleaseManifest) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new()?,
            config,
            manifest,
        })
    }

    /// Version this updater installs.
    pub fn target_version(&self) -> Result<Version> {
        self.manifest.target_version()
    }

    /// Run the full workflow.
    ///
    /// `elevated` is the caller-reported privilege status; it is checked
    /// before any side effect, as is host platform support.
    pub async fn run(
        &self,
        elevated: bool,
        observer: &mut dyn ProgressObserver,
    ) -> Result<UpdateResult> {
        if !elevated {
            return Err(Error::NotPrivileged);
        }

        let target_version = self.manifest.target_version()?;
        let target = ReleaseTarget::for_host(target_version.clone())?;
        let layout = InstallLayout::new(&self.config.install_root);

        let previous = match gate::evaluate(&layout, &target_version, self.config.force)? {
            UpdateDecision::Skip { current } => {
                info!(current = %current, target = %target_version, "already up to date");
                return Ok(UpdateResult::UpToDate {
                    current,
                    target: target_version,
                });
            }
            UpdateDecision::Proceed { current } => current,
        };

        let artifact_name = target.artifact_name();
        let url = target.download_url(&self.config.download_base);
        let artifact_path = self.config.download_dir.join(&artifact_name);

        self.fetcher.fetch(&url, &artifact_path, observer).await?;

        let report = checksum::verify(&artifact_path, &artifact_name, &self.manifest)?;
        info!(
            expected = %report.expected,
            computed = %report.computed,
            "artifact checksum verified"
        );

        let install = Installer::new(&layout).install(&artifact_path)?;

        info!(version = %target_version, root = %layout.root().display(), "toolchain installed");
        Ok(UpdateResult::Updated {
            previous,
            installed: target_version,
            replaced_existing: install.replaced_existing,
            digest: report.computed,
        })
    }
}
