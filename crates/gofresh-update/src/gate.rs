//! Version gate: decide whether an update is necessary
//!
//! The installed version is read by invoking the toolchain binary itself
//! (`go version`), never from a metadata file. The output format is parsed
//! narrowly; anything unexpected is a parse error, not a silent guess.

use std::path::Path;
use std::process::Command;

use gofresh_core::{Error, InstallLayout, Result};
use semver::Version;
use tracing::{debug, info};

/// Outcome of the version gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Installed version is equal to or newer than the target
    Skip { current: Version },

    /// Update (or fresh install) should proceed
    Proceed { current: Option<Version> },
}

/// Evaluate the gate for `layout` against `target`.
///
/// - Force flag bypasses the gate entirely, without probing.
/// - A missing installed binary always proceeds (fresh install).
/// - Otherwise the installed binary's self-reported version decides:
///   skip when current >= target.
pub fn evaluate(layout: &InstallLayout, target: &Version, force: bool) -> Result<UpdateDecision> {
    if force {
        info!("--force given, bypassing version gate");
        return Ok(UpdateDecision::Proceed { current: None });
    }

    let binary = layout.binary_path();
    if !binary.is_file() {
        debug!(path = %binary.display(), "no installed toolchain found, proceeding with fresh install");
        return Ok(UpdateDecision::Proceed { current: None });
    }

    let current = probe_installed_version(&binary)?;
    info!(current = %current, target = %target, "comparing installed version against target");

    if current >= *target {
        Ok(UpdateDecision::Skip { current })
    } else {
        Ok(UpdateDecision::Proceed {
            current: Some(current),
        })
    }
}

/// Run the installed binary and parse its self-reported version.
pub fn probe_installed_version(binary: &Path) -> Result<Version> {
    let output = Command::new(binary)
        .arg("version")
        .output()
        .map_err(|e| Error::version_probe(format!("failed to run {}: {}", binary.display(), e)))?;

    if !output.status.success() {
        return Err(Error::version_probe(format!(
            "{} exited with {}",
            binary.display(),
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .next()
        .ok_or_else(|| Error::version_probe("empty version output"))?;

    parse_version_line(line)
}

/// Parse one line of `go version` output.
///
/// Expected shape: `go version go1.20.1 linux/amd64` — the third
/// whitespace-delimited token, stripped of its `go` prefix. Patch-less
/// releases report `go1.20`; the missing component is treated as zero.
pub fn parse_version_line(line: &str) -> Result<Version> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 || tokens[0] != "go" || tokens[1] != "version" {
        return Err(Error::version_parse(
            line,
            "expected 'go version go<semver> <platform>'",
        ));
    }

    let raw = tokens[2]
        .strip_prefix("go")
        .ok_or_else(|| Error::version_parse(tokens[2], "missing 'go' prefix"))?;

    parse_release_version(raw)
}

/// Parse a release version string as major.minor[.patch].
fn parse_release_version(raw: &str) -> Result<Version> {
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(Error::version_parse(
            raw,
            "expected major.minor or major.minor.patch",
        ));
    }

    let component = |name: &str, value: &str| -> Result<u64> {
        value
            .parse::<u64>()
            .map_err(|_| Error::version_parse(raw, format!("non-numeric {name} component")))
    };

    let major = component("major", parts[0])?;
    let minor = component("minor", parts[1])?;
    let patch = match parts.get(2) {
        Some(value) => component("patch", value)?,
        None => 0,
    };

    Ok(Version::new(major, minor, patch))
}
