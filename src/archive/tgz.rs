//! Tarballs via the host `tar`.
//!
//! Entries are copied (symlinks preserved) into `<stage>/<prefix>/<path>`
//! inside a staging directory next to the output, then packed with
//! `tar -czf`. The tarball is renamed into place once `tar` succeeds.
//! An entry already staged by an earlier, enclosing entry is skipped.

use super::{entry_path, output_parent, path_arg};
use crate::bail;
use crate::error::{BuildError, ErrorExt, Result};
use crate::process::{FailurePolicy, Invocation, ProcessRunner};
use std::collections::BTreeSet;
use std::path::{Component, Path};

pub(super) fn write_tgz<P: AsRef<Path>>(
    runner: &ProcessRunner,
    output: &Path,
    prefix: &str,
    root: &Path,
    entries: &[P],
) -> Result<()> {
    let parent = output_parent(output)?;
    let staging = tempfile::Builder::new()
        .prefix(".yass-stage")
        .tempdir_in(&parent)
        .fs_context("creating staging directory in", &parent)?;
    let stage_root = if prefix.is_empty() {
        staging.path().to_path_buf()
    } else {
        staging.path().join(prefix)
    };
    if !prefix.is_empty() {
        runner.run(
            &Invocation::new(["mkdir", "-p"]).arg(path_arg(&stage_root)),
            FailurePolicy::Fatal,
        )?;
    }

    let mut members = BTreeSet::new();
    for entry in entries {
        let entry = entry.as_ref();
        let relative = entry_path(entry)?;
        let Some(Component::Normal(top)) = relative.components().next() else {
            bail!("archive entry {} has no file name", entry.display());
        };
        members.insert(top.to_string_lossy().into_owned());

        let source = root.join(entry);
        if std::fs::symlink_metadata(&source).is_err() {
            bail!("archive entry {} does not exist", source.display());
        }
        let dest = stage_root.join(&relative);
        if std::fs::symlink_metadata(&dest).is_ok() {
            log::debug!("skipping {}, already staged", entry.display());
            continue;
        }
        if let Some(dest_parent) = dest.parent() {
            runner.run(
                &Invocation::new(["mkdir", "-p"]).arg(path_arg(dest_parent)),
                FailurePolicy::Fatal,
            )?;
        }
        runner.run(
            &Invocation::new(["cp", "-R", "-P", "-p"])
                .arg(path_arg(&source))
                .arg(path_arg(&dest)),
            FailurePolicy::Fatal,
        )?;
    }

    let members: Vec<String> = if prefix.is_empty() {
        members.into_iter().collect()
    } else {
        vec![prefix.to_string()]
    };

    let partial = tempfile::Builder::new()
        .prefix(".yass-archive")
        .suffix(".partial")
        .tempfile_in(&parent)
        .fs_context("creating temporary archive in", &parent)?;

    runner.run(
        &Invocation::new(["tar", "-czf"])
            .arg(path_arg(partial.path()))
            .arg("-C")
            .arg(path_arg(staging.path()))
            .args(members),
        FailurePolicy::Fatal,
    )?;

    partial.persist(output).map_err(|e| BuildError::Persist {
        path: output.to_path_buf(),
        error: e.error,
    })?;
    Ok(())
}
