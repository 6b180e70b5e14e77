//! Update pipeline for the gofresh CLI
//!
//! Provides:
//! - Version gate: probe the installed toolchain and decide skip/proceed
//! - Streaming release download with decoupled progress reporting
//! - SHA-256 integrity checking against the release manifest
//! - Backup/extract/rollback installer for the installation directory
//! - `ToolchainUpdater`, the orchestration tying the stages together

pub mod checksum;
pub mod download;
pub mod gate;
pub mod installer;
pub mod updater;

pub use checksum::ChecksumReport;
pub use download::{Fetcher, NoopProgress, ProgressObserver};
pub use gate::UpdateDecision;
pub use installer::{InstallReport, Installer};
pub use updater::{ToolchainUpdater, UpdateConfig, UpdateResult};
