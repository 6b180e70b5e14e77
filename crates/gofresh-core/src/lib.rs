//! Core types for the gofresh toolchain updater
//!
//! Provides:
//! - The error taxonomy shared by the update pipeline and the CLI
//! - Host/release target modelling (artifact names and download URLs)
//! - The release manifest: target version plus the checksum registry,
//!   supplied as data rather than compiled-in constants

pub mod error;
pub mod layout;
pub mod manifest;
pub mod target;

pub use error::{Error, Result};
pub use layout::InstallLayout;
pub use manifest::ReleaseManifest;
pub use target::{GoArch, GoOs, ReleaseTarget, DEFAULT_DOWNLOAD_BASE};
