//! Installer: backup, extraction, rollback, cleanup
//!
//! The success path walks Idle -> Backed-Up -> Extracted -> Cleaned. An
//! extraction failure takes the single rollback edge back to the previous
//! installation; a rollback failure is its own, more severe outcome because
//! the toolchain may then be neither old nor new.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use gofresh_core::{Error, InstallLayout, Result};
use tar::{Archive, EntryType};
use tracing::{debug, info, warn};

/// What a successful installation did.
#[derive(Debug, Clone, Copy)]
pub struct InstallReport {
    /// True when a previous installation was backed up and replaced;
    /// false for a fresh install.
    pub replaced_existing: bool,
}

/// Performs the backup/extract/cleanup sequence for one artifact.
pub struct Installer<'a> {
    layout: &'a InstallLayout,
}

impl<'a> Installer<'a> {
    pub fn new(layout: &'a InstallLayout) -> Self {
        Self { layout }
    }

    /// Install the archive at `artifact` over the layout's root.
    ///
    /// On success the backup directory and the artifact file are gone. On
    /// extraction failure the previous installation is restored and the
    /// artifact is left in place for inspection.
    pub fn install(&self, artifact: &Path) -> Result<InstallReport> {
        let backed_up = self.back_up()?;

        if let Err(cause) = self.extract(artifact) {
            return Err(self.roll_back(backed_up, cause));
        }

        self.clean_up(backed_up, artifact)?;
        Ok(InstallReport {
            replaced_existing: backed_up,
        })
    }

    /// Idle -> Backed-Up. Missing primary is a no-op (fresh install).
    fn back_up(&self) -> Result<bool> {
        let root = self.layout.root();
        if !root.is_dir() {
            debug!(root = %root.display(), "no existing installation to back up");
            return Ok(false);
        }

        let backup = self.layout.backup_path();
        info!(from = %root.display(), to = %backup.display(), "backing up current installation");
        fs::rename(root, &backup).map_err(|source| Error::BackupFailed {
            from: root.to_path_buf(),
            to: backup.clone(),
            source,
        })?;
        Ok(true)
    }

    /// Backed-Up -> Extracted. Streams the archive entry by entry into the
    /// staging parent; any error aborts immediately, leaving a partial tree
    /// for the rollback edge to clear.
    fn extract(&self, artifact: &Path) -> io::Result<()> {
        let staging = self.layout.staging_parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "installation root has no parent directory",
            )
        })?;

        info!(artifact = %artifact.display(), into = %staging.display(), "extracting release archive");

        let file = File::open(artifact)?;
        let mut archive = Archive::new(GzDecoder::new(file));

        for entry in archive.entries()? {
            let mut entry = entry?;
            let rel = entry.path()?.into_owned();

            if !is_clean_relative(&rel) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("archive entry escapes extraction root: {}", rel.display()),
                ));
            }

            let dest = staging.join(&rel);
            match entry.header().entry_type() {
                EntryType::Directory => {
                    fs::create_dir_all(&dest)?;
                }
                EntryType::Regular => {
                    let mode = entry.header().mode()?;
                    write_file_entry(&mut entry, &dest, mode)?;
                }
                other => {
                    debug!(kind = ?other, path = %rel.display(), "skipping archive entry type");
                }
            }
        }

        Ok(())
    }

    /// Rollback edge. Removes the partial tree, restores the backup, and
    /// reports the result as an error either way: `ExtractionRolledBack`
    /// when the previous installation is back in place, `RollbackFailed`
    /// when even that could not be done.
    fn roll_back(&self, backed_up: bool, cause: io::Error) -> Error {
        let root = self.layout.root();
        let backup = self.layout.backup_path();
        warn!(error = %cause, "extraction failed, restoring previous installation");

        if root.exists() {
            if let Err(e) = fs::remove_dir_all(root) {
                return Error::RollbackFailed {
                    reason: format!(
                        "extraction failed ({cause}); removing partial tree {} failed: {e}",
                        root.display()
                    ),
                };
            }
        }

        if backed_up {
            if let Err(e) = fs::rename(&backup, root) {
                return Error::RollbackFailed {
                    reason: format!(
                        "extraction failed ({cause}); restoring {} from {} failed: {e}",
                        root.display(),
                        backup.display()
                    ),
                };
            }
        }

        Error::ExtractionRolledBack {
            reason: cause.to_string(),
        }
    }

    /// Extracted -> Cleaned. Failure here is fatal even though the upgrade
    /// itself already succeeded; it surfaces as the distinct
    /// `CleanupFailed` variant.
    fn clean_up(&self, backed_up: bool, artifact: &Path) -> Result<()> {
        if backed_up {
            let backup = self.layout.backup_path();
            info!(path = %backup.display(), "deleting backup");
            fs::remove_dir_all(&backup).map_err(|source| Error::CleanupFailed {
                path: backup.clone(),
                source,
            })?;
        }

        info!(path = %artifact.display(), "deleting downloaded artifact");
        fs::remove_file(artifact).map_err(|source| Error::CleanupFailed {
            path: artifact.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}

/// Write one regular-file entry with the mode declared in the archive.
fn write_file_entry(reader: &mut impl Read, dest: &Path, mode: u32) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(dest)?;
    io::copy(reader, &mut file)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dest, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}

/// Relative path with no `..`, root, or prefix components.
fn is_clean_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::path::PathBuf;
    use tar::{Builder, Header};

    enum Entry<'a> {
        Dir(&'a str),
        File(&'a str, u32, &'a [u8]),
    }

    /// Build a gzipped tarball containing the given entries, in order.
    fn build_tarball(dest: &Path, entries: &[Entry<'_>]) {
        let file = File::create(dest).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = Builder::new(encoder);

        for entry in entries {
            match entry {
                Entry::Dir(path) => {
                    let mut header = Header::new_gnu();
                    header.set_entry_type(EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    header.set_cksum();
                    builder.append_data(&mut header, *path, io::empty()).unwrap();
                }
                Entry::File(path, mode, data) => {
                    let mut header = Header::new_gnu();
                    header.set_entry_type(EntryType::Regular);
                    header.set_size(data.len() as u64);
                    header.set_mode(*mode);
                    header.set_cksum();
                    builder.append_data(&mut header, *path, *data).unwrap();
                }
            }
        }

        builder.into_inner().unwrap().finish().unwrap();
    }

    fn read_tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        fn walk(dir: &Path, base: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
            let mut entries: Vec<_> = fs::read_dir(dir).unwrap().map(|e| e.unwrap()).collect();
            entries.sort_by_key(|e| e.path());
            for entry in entries {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, base, out);
                } else {
                    let rel = path.strip_prefix(base).unwrap().to_path_buf();
                    out.push((rel, fs::read(&path).unwrap()));
                }
            }
        }
        let mut out = Vec::new();
        walk(root, root, &mut out);
        out
    }

    #[test]
    fn fresh_install_leaves_exactly_the_archive_tree() {
        let prefix = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(prefix.path().join("go"));

        let artifact = downloads.path().join("go1.20.1.linux-amd64.tar.gz");
        build_tarball(
            &artifact,
            &[
                Entry::Dir("go/"),
                Entry::File("go/VERSION", 0o644, b"go1.20.1"),
                Entry::Dir("go/bin/"),
                Entry::File("go/bin/go", 0o755, b"#!/bin/sh\n"),
            ],
        );

        let report = Installer::new(&layout).install(&artifact).unwrap();
        assert!(!report.replaced_existing);

        assert_eq!(
            fs::read(layout.root().join("VERSION")).unwrap(),
            b"go1.20.1"
        );
        assert_eq!(
            fs::read(layout.root().join("bin/go")).unwrap(),
            b"#!/bin/sh\n"
        );
        assert!(!layout.backup_path().exists());
        assert!(!artifact.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(layout.root().join("bin/go"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
            let mode = fs::metadata(layout.root().join("VERSION"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }

    #[test]
    fn update_replaces_existing_installation() {
        let prefix = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(prefix.path().join("go"));

        fs::create_dir_all(layout.root()).unwrap();
        fs::write(layout.root().join("VERSION"), b"go1.19.9").unwrap();
        fs::write(layout.root().join("stale-file"), b"old").unwrap();

        let artifact = downloads.path().join("go1.20.1.linux-amd64.tar.gz");
        build_tarball(
            &artifact,
            &[
                Entry::Dir("go/"),
                Entry::File("go/VERSION", 0o644, b"go1.20.1"),
            ],
        );

        let report = Installer::new(&layout).install(&artifact).unwrap();
        assert!(report.replaced_existing);

        assert_eq!(
            fs::read(layout.root().join("VERSION")).unwrap(),
            b"go1.20.1"
        );
        // The old tree was swapped out wholesale, not merged.
        assert!(!layout.root().join("stale-file").exists());
        assert!(!layout.backup_path().exists());
        assert!(!artifact.exists());
    }

    #[test]
    fn failed_extraction_restores_previous_installation_byte_for_byte() {
        let prefix = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(prefix.path().join("go"));

        fs::create_dir_all(layout.root().join("bin")).unwrap();
        fs::write(layout.root().join("VERSION"), b"go1.19.9").unwrap();
        fs::write(layout.root().join("bin/go"), b"old binary").unwrap();
        let before = read_tree(layout.root());

        // Not a gzip stream at all: extraction fails before writing anything.
        let artifact = downloads.path().join("go1.20.1.linux-amd64.tar.gz");
        fs::write(&artifact, b"definitely not gzip").unwrap();

        let err = Installer::new(&layout).install(&artifact).unwrap_err();
        assert!(matches!(err, Error::ExtractionRolledBack { .. }));

        assert_eq!(read_tree(layout.root()), before);
        assert!(!layout.backup_path().exists());
        // The artifact is left behind on failure; cleanup never ran.
        assert!(artifact.exists());
    }

    #[test]
    fn truncated_archive_rolls_back_a_partially_extracted_tree() {
        let prefix = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(prefix.path().join("go"));

        fs::create_dir_all(layout.root()).unwrap();
        fs::write(layout.root().join("VERSION"), b"go1.19.9").unwrap();
        let before = read_tree(layout.root());

        // Incompressible payload so the truncated gzip stream still decodes
        // the early entries, then fails mid-file.
        let mut payload = Vec::with_capacity(1 << 20);
        let mut state: u32 = 0x12345678;
        for _ in 0..(1 << 20) {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            payload.push((state >> 24) as u8);
        }

        let artifact = downloads.path().join("go1.20.1.linux-amd64.tar.gz");
        build_tarball(
            &artifact,
            &[
                Entry::Dir("go/"),
                Entry::File("go/VERSION", 0o644, b"go1.20.1"),
                Entry::File("go/big.bin", 0o644, &payload),
            ],
        );
        let bytes = fs::read(&artifact).unwrap();
        fs::write(&artifact, &bytes[..bytes.len() / 2]).unwrap();

        let err = Installer::new(&layout).install(&artifact).unwrap_err();
        assert!(matches!(err, Error::ExtractionRolledBack { .. }));

        assert_eq!(read_tree(layout.root()), before);
        assert!(!layout.backup_path().exists());
    }

    #[test]
    fn backup_rename_failure_leaves_primary_untouched() {
        let prefix = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(prefix.path().join("go"));

        fs::create_dir_all(layout.root()).unwrap();
        fs::write(layout.root().join("VERSION"), b"go1.19.9").unwrap();

        // A non-empty directory at the backup path makes the rename fail.
        fs::create_dir_all(layout.backup_path().join("occupied")).unwrap();

        let artifact = downloads.path().join("go1.20.1.linux-amd64.tar.gz");
        build_tarball(&artifact, &[Entry::Dir("go/")]);

        let err = Installer::new(&layout).install(&artifact).unwrap_err();
        assert!(matches!(err, Error::BackupFailed { .. }));

        assert_eq!(
            fs::read(layout.root().join("VERSION")).unwrap(),
            b"go1.19.9"
        );
    }

    #[test]
    fn entries_escaping_the_staging_root_abort_extraction() {
        let prefix = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(prefix.path().join("go"));

        // tar::Builder refuses `..` in paths, so write the name field raw.
        let artifact = downloads.path().join("go1.20.1.linux-amd64.tar.gz");
        let file = File::create(&artifact).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = Builder::new(encoder);

        let data = b"nope";
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        let name = b"../escape";
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_cksum();
        builder.append(&header, &data[..]).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let err = Installer::new(&layout).install(&artifact).unwrap_err();
        assert!(matches!(err, Error::ExtractionRolledBack { .. }));
        assert!(!prefix.path().join("../escape").exists());
    }

    #[test]
    fn non_regular_entries_are_skipped() {
        let prefix = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(prefix.path().join("go"));

        let artifact = downloads.path().join("go1.20.1.linux-amd64.tar.gz");
        let file = File::create(&artifact).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = Builder::new(encoder);

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, "go/", io::empty()).unwrap();

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        header.set_link_name("VERSION").unwrap();
        header.set_cksum();
        builder
            .append_data(&mut header, "go/version-link", io::empty())
            .unwrap();

        builder.into_inner().unwrap().finish().unwrap();

        Installer::new(&layout).install(&artifact).unwrap();
        assert!(layout.root().is_dir());
        assert!(!layout.root().join("version-link").exists());
    }
}
