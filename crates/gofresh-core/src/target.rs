//! Release target modelling
//!
//! A release target pins down exactly one published artifact: the desired
//! toolchain version plus the host operating system and CPU architecture,
//! expressed in the naming scheme the Go download site uses.

use semver::Version;

use crate::error::{Error, Result};

/// Base URL of the official Go distribution site.
pub const DEFAULT_DOWNLOAD_BASE: &str = "https://go.dev/dl";

/// Operating systems with published Go release tarballs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoOs {
    Linux,
    Darwin,
    Freebsd,
}

impl GoOs {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Freebsd => "freebsd",
        }
    }
}

/// CPU architectures with published Go release tarballs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoArch {
    Amd64,
    Arm64,
    I386,
    Armv6l,
    Ppc64le,
    S390x,
}

impl GoArch {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::I386 => "386",
            Self::Armv6l => "armv6l",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
        }
    }
}

/// The tuple identifying exactly one release artifact.
#[derive(Debug, Clone)]
pub struct ReleaseTarget {
    /// Desired toolchain version
    pub version: Version,

    /// Target operating system
    pub os: GoOs,

    /// Target CPU architecture
    pub arch: GoArch,
}

impl ReleaseTarget {
    /// Create a target for an explicit platform.
    pub fn new(version: Version, os: GoOs, arch: GoArch) -> Self {
        Self { version, os, arch }
    }

    /// Create a target for the host this process is running on.
    ///
    /// Windows and any platform without a published tarball are rejected
    /// before the pipeline performs any side effect.
    pub fn for_host(version: Version) -> Result<Self> {
        let (os, arch) = host_platform(std::env::consts::OS, std::env::consts::ARCH)?;
        Ok(Self { version, os, arch })
    }

    /// Canonical artifact filename, e.g. `go1.20.1.linux-amd64.tar.gz`.
    pub fn artifact_name(&self) -> String {
        format!(
            "go{}.{}-{}.tar.gz",
            self.version,
            self.os.as_str(),
            self.arch.as_str()
        )
    }

    /// Full download URL for this artifact under `base`.
    pub fn download_url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.artifact_name())
    }
}

/// Map Rust's platform constants to Go's release naming.
fn host_platform(os: &str, arch: &str) -> Result<(GoOs, GoArch)> {
    let go_os = match os {
        "linux" => GoOs::Linux,
        "macos" => GoOs::Darwin,
        "freebsd" => GoOs::Freebsd,
        _ => {
            return Err(Error::UnsupportedHost {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };

    let go_arch = match arch {
        "x86_64" => GoArch::Amd64,
        "aarch64" => GoArch::Arm64,
        "x86" => GoArch::I386,
        "arm" => GoArch::Armv6l,
        "powerpc64le" => GoArch::Ppc64le,
        "s390x" => GoArch::S390x,
        _ => {
            return Err(Error::UnsupportedHost {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };

    Ok((go_os, go_arch))
}
