//! Build-and-package pipeline.
//!
//! Stages run strictly in order and the first fatal error stops the run:
//!
//! 1. Find source directory
//! 2. Prepare build directory
//! 3. Generate build script (cmake)
//! 4. Execute build script (ninja)
//! 5. Strip binaries
//! 6. Code sign
//! 7. Check universal build
//! 8. Archive
//! 9. Inspect archives
//!
//! Stages 5 through 9 are skipped when packaging is disabled.

mod build;
pub mod cmake;
mod package;
mod postbuild;

pub use package::{ArchiveManifest, ArchiveNaming, LICENSE_FILES, file_sha256};
pub use postbuild::is_universal_binary;

use crate::config::BuildConfig;
use crate::error::Result;
use crate::platform::APP_NAME;
use crate::process::{Invocation, ProcessRunner};
use crate::report::Reporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Drives one build of the application from source tree to release archives.
#[derive(Debug)]
pub struct Pipeline<'a> {
    config: &'a BuildConfig,
    runner: ProcessRunner,
    build_dir: PathBuf,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline for `config`, reporting progress to `reporter`.
    pub fn new(config: &'a BuildConfig, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            config,
            runner: ProcessRunner::new(config.dry_run, reporter),
            build_dir: config.build_dir(),
        }
    }

    /// Directory all build products land in
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Run every stage and return the archives that were produced.
    ///
    /// The manifest is empty when packaging is disabled.
    pub fn run(&self) -> Result<ArchiveManifest> {
        self.reporter().info(&format!(
            "Building {APP_NAME} ({}) for {}-{}",
            self.config.build_type, self.config.system, self.config.arch
        ));

        self.find_source_directory()?;
        self.prepare_build_directory()?;
        self.generate_build_script()?;
        self.execute_build_script()?;

        if self.config.no_packaging {
            self.reporter().info("Packaging disabled, stopping after build");
            return Ok(ArchiveManifest::new());
        }

        self.strip_binaries()?;
        self.code_sign()?;
        self.check_universal_build()?;
        let manifest = self.create_archives()?;
        self.inspect_archives(&manifest)?;
        Ok(manifest)
    }

    fn reporter(&self) -> &dyn Reporter {
        self.runner.reporter()
    }

    fn stage(&self, title: &str) {
        self.reporter().section(title);
    }

    /// Invocation running inside the build directory.
    fn command<I, S>(&self, argv: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::new(argv).current_dir(&self.build_dir)
    }
}
