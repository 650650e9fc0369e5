//! Release archive assembly.
//!
//! An [`Archiver`] turns an ordered list of files, directories and symlinks
//! into a single container. The output extension picks the format:
//!
//! | Extension | Format | Implementation |
//! |-----------|--------|----------------|
//! | `.tgz` | gzip-compressed tar | staged with `mkdir`/`cp`, packed by `tar` |
//! | anything else | zip | written directly |
//!
//! Every entry name is `prefix/path`. Directories are expanded recursively,
//! symlinks are stored as links (never followed) and an archive either ends
//! up complete at its final path or not at all.
//!
//! macOS application bundles go through [`Archiver::archive_bundle`] instead,
//! which delegates to the external disk-image builder.

mod dmg;
mod tgz;
mod zip_writer;

pub use dmg::{DmgLayout, render_eula};

use crate::bail;
use crate::error::Result;
use crate::process::ProcessRunner;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Container format selected from the output file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Zip container written in-process
    Zip,
    /// gzip-compressed tarball produced by the host `tar`
    TarGz,
}

impl ArchiveFormat {
    /// `.tgz` selects [`ArchiveFormat::TarGz`]; anything else is zip.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("tgz") => ArchiveFormat::TarGz,
            _ => ArchiveFormat::Zip,
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Zip => write!(f, "zip"),
            ArchiveFormat::TarGz => write!(f, "tgz"),
        }
    }
}

/// Builds release archives from paths relative to a root directory.
#[derive(Debug)]
pub struct Archiver<'a> {
    runner: &'a ProcessRunner,
    root: PathBuf,
}

impl<'a> Archiver<'a> {
    /// Create an archiver resolving relative outputs and entries against `root`.
    ///
    /// The runner supplies the dry-run flag, the reporter, and executes the
    /// external tools used for tarballs and disk images.
    pub fn new(runner: &'a ProcessRunner, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }

    /// Write `entries` into a new archive at `output`.
    ///
    /// # Arguments
    ///
    /// * `output` - Archive path; `.tgz` selects a tarball, anything else zip
    /// * `prefix` - Leading directory for every entry name (may be empty)
    /// * `entries` - Files, directories or symlinks, in archive order
    ///
    /// Entries may overlap (`bin` and `bin/app`); each name is written once.
    ///
    /// # Errors
    ///
    /// Any unreadable entry, unwritable destination, entry path containing
    /// `..`, or failing external tool.
    pub fn create_archive<P: AsRef<Path>>(
        &self,
        output: impl AsRef<Path>,
        prefix: &str,
        entries: &[P],
    ) -> Result<()> {
        let output = self.root.join(output.as_ref());
        let format = ArchiveFormat::from_path(&output);
        let prefix = prefix.trim_matches('/');

        if self.runner.is_dry_run() {
            let listed: Vec<_> = entries
                .iter()
                .map(|e| e.as_ref().display().to_string())
                .collect();
            self.runner.reporter().info(&format!(
                "Would create {format} file {} with [{}]",
                output.display(),
                listed.join(" ")
            ));
            return Ok(());
        }

        self.runner
            .reporter()
            .info(&format!("generating {format} file {}", output.display()));

        match format {
            ArchiveFormat::Zip => zip_writer::write_zip(&output, prefix, &self.root, entries),
            ArchiveFormat::TarGz => {
                tgz::write_tgz(self.runner, &output, prefix, &self.root, entries)
            }
        }
    }
}

/// Directory that will hold `output`, created if missing.
fn output_parent(output: &Path) -> Result<PathBuf> {
    use crate::error::ErrorExt;

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).fs_context("creating output directory", &parent)?;
    Ok(parent)
}

/// Relative in-archive path for an entry as given by the caller.
///
/// Root and drive prefixes are dropped so absolute entries nest under the
/// archive prefix; `.` components vanish and `..` is rejected.
pub(crate) fn entry_path(entry: &Path) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in entry.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                bail!("archive entry {} escapes the archive root", entry.display())
            }
            Component::Normal(part) => relative.push(part),
        }
    }
    Ok(relative)
}

/// `prefix/relative` with forward slashes, as stored in the archive.
pub(crate) fn entry_name(prefix: &str, relative: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !prefix.is_empty() {
        parts.push(prefix.to_string());
    }
    parts.extend(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Symlink body as stored in the archive: slash-separated and, for relative
/// targets, placed under the same prefix as the entries.
pub(crate) fn link_target(prefix: &str, target: &Path) -> String {
    let text = target.to_string_lossy();
    let text = if cfg!(windows) {
        text.replace('\\', "/")
    } else {
        text.into_owned()
    };
    if prefix.is_empty() || target.has_root() {
        text
    } else {
        format!("{prefix}/{text}")
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ArchiveFormat::from_path(Path::new("yass.tgz")), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::from_path(Path::new("yass.zip")), ArchiveFormat::Zip);
        assert_eq!(ArchiveFormat::from_path(Path::new("yass.tar.gz")), ArchiveFormat::Zip);
        assert_eq!(ArchiveFormat::from_path(Path::new("yass")), ArchiveFormat::Zip);
    }

    #[test]
    fn entry_names_carry_prefix() {
        assert_eq!(entry_name("app-1.0", Path::new("bin/app/app.exe")), "app-1.0/bin/app/app.exe");
        assert_eq!(entry_name("", Path::new("LICENSE")), "LICENSE");
    }

    #[test]
    fn entry_path_strips_root_and_dots() {
        assert_eq!(entry_path(Path::new("./bin/./app")).unwrap(), PathBuf::from("bin/app"));
        #[cfg(unix)]
        assert_eq!(entry_path(Path::new("/opt/yass")).unwrap(), PathBuf::from("opt/yass"));
    }

    #[test]
    fn entry_path_rejects_parent_components() {
        let err = entry_path(Path::new("../LICENSE")).unwrap_err();
        assert!(err.to_string().contains("escapes the archive root"));
    }

    #[test]
    fn relative_link_targets_are_prefixed() {
        assert_eq!(link_target("app-1.0", Path::new("libyass.so.1")), "app-1.0/libyass.so.1");
        assert_eq!(link_target("", Path::new("libyass.so.1")), "libyass.so.1");
        #[cfg(unix)]
        assert_eq!(link_target("app-1.0", Path::new("/usr/lib/x")), "/usr/lib/x");
    }
}
