//! Direct zip writer.
//!
//! Output goes to a temporary file beside the destination and is renamed over
//! it only after the central directory has been written. Neither that file
//! nor the destination is ever archived, and a name already written is
//! skipped, so overlapping entries such as `bin` and `bin/app` are accepted.

use super::{entry_name, entry_path, link_target, output_parent};
use crate::error::{BuildError, ErrorExt, Result};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::{CompressionMethod, DateTime, ZipWriter, write::SimpleFileOptions};

pub(super) fn write_zip<P: AsRef<Path>>(
    output: &Path,
    prefix: &str,
    root: &Path,
    entries: &[P],
) -> Result<()> {
    let parent = output_parent(output)?;
    let partial = tempfile::Builder::new()
        .prefix(".yass-archive")
        .suffix(".partial")
        .tempfile_in(&parent)
        .fs_context("creating temporary archive in", &parent)?;
    let excluded = Excluded::new(partial.path(), output);

    let mut writer = ZipWriter::new(partial);
    let mut written = BTreeSet::new();
    for entry in entries {
        let entry = entry.as_ref();
        let relative = entry_path(entry)?;
        let source = root.join(entry);
        let metadata =
            fs::symlink_metadata(&source).fs_context("reading archive entry", &source)?;

        if !metadata.is_dir() {
            let name = entry_name(prefix, &relative);
            if written.insert(name.clone()) {
                add_path(&mut writer, &source, metadata.file_type().is_symlink(), &name, prefix)?;
            }
            continue;
        }

        for item in WalkDir::new(&source).follow_links(false).sort_by_file_name() {
            let item = item?;
            if item.file_type().is_dir()
                || (item.file_type().is_file() && excluded.contains(item.path()))
            {
                continue;
            }
            let name = entry_name(prefix, &relative.join(item.path().strip_prefix(&source)?));
            if !written.insert(name.clone()) {
                log::debug!("skipping {name}, already archived");
                continue;
            }
            add_path(&mut writer, item.path(), item.file_type().is_symlink(), &name, prefix)?;
        }
    }

    let partial = writer.finish()?;
    partial.persist(output).map_err(|e| BuildError::Persist {
        path: output.to_path_buf(),
        error: e.error,
    })?;
    Ok(())
}

/// Files a directory walk must not pick up: the archive being written and
/// the one it replaces, both of which may sit inside an entry directory.
struct Excluded {
    paths: Vec<PathBuf>,
}

impl Excluded {
    fn new(partial: &Path, output: &Path) -> Self {
        let paths = [partial, output]
            .into_iter()
            .filter_map(|path| fs::canonicalize(path).ok())
            .collect();
        Self { paths }
    }

    fn contains(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        self.paths
            .iter()
            .any(|excluded| excluded.file_name() == Some(name))
            && fs::canonicalize(path).is_ok_and(|path| self.paths.contains(&path))
    }
}

fn base_options() -> SimpleFileOptions {
    // Fixed timestamp keeps repeated builds byte-identical.
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

fn add_path<W: Write + Seek>(
    writer: &mut ZipWriter<W>,
    path: &Path,
    is_symlink: bool,
    name: &str,
    prefix: &str,
) -> Result<()> {
    log::debug!("adding {} as {name}", path.display());
    if is_symlink {
        // Stored as a link entry: S_IFLNK mode bits, body is the target text.
        let target = fs::read_link(path).fs_context("reading symlink", path)?;
        // zip forces CompressionMethod::Stored for symlink entries.
        writer.add_symlink(name, link_target(prefix, &target), base_options())?;
        return Ok(());
    }

    let mut file = File::open(path).fs_context("opening file", path)?;
    writer.start_file(name, file_options(&file, path)?)?;
    io::copy(&mut file, writer).fs_context("compressing file", path)?;
    Ok(())
}

#[cfg(unix)]
fn file_options(file: &File, path: &Path) -> Result<SimpleFileOptions> {
    use std::os::unix::fs::PermissionsExt;

    let mode = file
        .metadata()
        .fs_context("reading file metadata", path)?
        .permissions()
        .mode();
    Ok(base_options().unix_permissions(mode))
}

#[cfg(not(unix))]
fn file_options(_file: &File, _path: &Path) -> Result<SimpleFileOptions> {
    Ok(base_options())
}
