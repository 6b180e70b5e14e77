//! Update command

use std::path::PathBuf;

use anyhow::Result;
use gofresh_core::ReleaseManifest;
use gofresh_update::{ProgressObserver, ToolchainUpdater, UpdateConfig, UpdateResult};
use indicatif::ProgressBar;

use crate::cli::UpdateArgs;
use crate::output;

pub async fn run(args: UpdateArgs) -> Result<()> {
    let manifest = match &args.manifest {
        Some(path) => ReleaseManifest::from_path(path)?,
        None => ReleaseManifest::embedded()?,
    };

    let config = UpdateConfig {
        install_root: args.install_root.clone(),
        download_base: args.download_base.clone(),
        download_dir: PathBuf::from("."),
        force: args.force,
    };

    let updater = ToolchainUpdater::new(config, manifest)?;
    let target = updater.target_version()?;

    output::info(&format!("target toolchain version: go {target}"));
    output::kv("install root", &args.install_root.display().to_string());
    if args.force {
        output::warning("--force given, the installed version will not be checked");
    }

    let elevated = is_elevated();
    tracing::debug!(elevated, "privilege check");

    let mut progress = TerminalProgress::new();
    let result = updater.run(elevated, &mut progress).await?;

    match result {
        UpdateResult::UpToDate { current, target } => {
            output::success(&format!(
                "installed toolchain go {current} is already up to date (target go {target})"
            ));
        }
        UpdateResult::Updated {
            previous,
            installed,
            replaced_existing,
            digest,
        } => {
            output::kv("sha256", &digest);
            match (replaced_existing, previous) {
                (true, Some(previous)) => output::success(&format!(
                    "updated toolchain from go {previous} to go {installed}"
                )),
                (true, None) => {
                    output::success(&format!("reinstalled toolchain go {installed}"))
                }
                (false, _) => output::success(&format!("installed toolchain go {installed}")),
            }
        }
    }

    Ok(())
}

/// Whether this process runs with root-equivalent privileges.
fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Indicatif-backed download progress.
///
/// A bar with percentage when the server declared a length, a plain byte
/// counter when it did not.
struct TerminalProgress {
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    fn new() -> Self {
        Self { bar: None }
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_chunk(&mut self, bytes_so_far: u64, total: Option<u64>) {
        let bar = self.bar.get_or_insert_with(|| match total {
            Some(len) => output::download_bar(len),
            None => output::download_spinner(),
        });
        bar.set_position(bytes_so_far);
    }

    fn on_complete(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
