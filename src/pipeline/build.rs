//! Stages 1-4: locate the source tree, prepare the build directory,
//! configure with cmake and build with ninja.

use super::Pipeline;
use super::cmake::{CmakeArguments, NATIVE_TOOLCHAIN_FILE};
use crate::error::{ConfigError, ErrorExt, Result};
use crate::platform::{APP_NAME, TargetSystem};
use crate::process::FailurePolicy;

impl Pipeline<'_> {
    pub(super) fn find_source_directory(&self) -> Result<()> {
        self.stage("Find source directory");
        let source_dir = &self.config.source_dir;
        if !source_dir.join("CMakeLists.txt").is_file() {
            return Err(ConfigError::SourceTreeNotFound {
                path: source_dir.clone(),
            }
            .into());
        }
        self.reporter()
            .info(&format!("Using source directory {}", source_dir.display()));
        Ok(())
    }

    pub(super) fn prepare_build_directory(&self) -> Result<()> {
        self.stage("Prepare build directory");
        let build_dir = &self.build_dir;

        if self.runner.is_dry_run() {
            self.reporter().info(&format!(
                "Would prepare build directory {}{}",
                build_dir.display(),
                if self.config.pre_clean { " (clean)" } else { "" }
            ));
            return Ok(());
        }

        if self.config.pre_clean && build_dir.exists() {
            self.reporter()
                .info(&format!("Removing previous build directory {}", build_dir.display()));
            std::fs::remove_dir_all(build_dir)
                .fs_context("removing build directory", build_dir)?;
        }
        std::fs::create_dir_all(build_dir).fs_context("creating build directory", build_dir)?;
        self.reporter()
            .info(&format!("Using build directory {}", build_dir.display()));
        Ok(())
    }

    pub(super) fn generate_build_script(&self) -> Result<()> {
        self.stage("Generate build script");
        let cmake = CmakeArguments::for_config(self.config, &self.build_dir)?;

        if let Some(toolchain) = &cmake.native_toolchain {
            let path = self.build_dir.join(NATIVE_TOOLCHAIN_FILE);
            if self.runner.is_dry_run() {
                self.reporter()
                    .info(&format!("Would write {}", path.display()));
            } else {
                std::fs::write(&path, toolchain).fs_context("writing native toolchain file", &path)?;
            }
        }

        let invocation = self
            .command(["cmake".to_string(), self.config.source_dir.display().to_string()])
            .args(cmake.args)
            .envs(cmake.env);
        self.runner.run(&invocation, FailurePolicy::Fatal)?;
        Ok(())
    }

    pub(super) fn execute_build_script(&self) -> Result<()> {
        self.stage("Execute build script");
        let invocation = self.command([
            "ninja".to_string(),
            APP_NAME.to_string(),
            "-j".to_string(),
            self.config.build_concurrency.to_string(),
        ]);
        self.runner.run(&invocation, FailurePolicy::Fatal)?;

        if self.config.system == TargetSystem::Darwin && !self.runner.is_dry_run() {
            self.hoist_app_bundle()?;
        }
        Ok(())
    }

    /// Multi-config generators put the bundle under `<build_type>/`; move it
    /// up so later stages find it at a fixed place.
    fn hoist_app_bundle(&self) -> Result<()> {
        let app_name = self.config.app_name();
        let nested = self.build_dir.join(&self.config.build_type).join(&app_name);
        if !nested.exists() {
            return Ok(());
        }

        let target = self.build_dir.join(&app_name);
        if target.exists() {
            std::fs::remove_dir_all(&target).fs_context("removing stale bundle", &target)?;
        }
        std::fs::rename(&nested, &target).fs_context("moving app bundle", &nested)?;
        Ok(())
    }
}
