//! Command line argument parsing.
//!
//! Every option can also come from the environment the CI scripts export
//! (`BUILD_TYPE`, `VSCMD_ARG_TGT_ARCH`, ...). Flags are read once and turned
//! into an immutable [`BuildConfig`].

use crate::config::{BuildConfig, HostToolchainEnv, MacOsOptions, MsvcOptions};
use crate::error::{ErrorExt, Result};
use crate::platform::{TargetSystem, host_arch};
use clap::{ArgAction, Parser};
use clap::builder::BoolishValueParser;
use std::path::PathBuf;

/// Build, post-process and package yass for one target
#[derive(Parser, Debug)]
#[command(
    name = "yass_build",
    version,
    about = "Build, post-process and package yass for one target",
    long_about = "Configure with cmake, build with ninja, strip and sign the result, then \
                  package it into release archives.

Usage:
  yass_build
  yass_build --dry-run --system linux --arch arm64 --sysroot /opt/sysroot
  yass_build --nc --cmake-build-type Debug --no-packaging"
)]
pub struct Args {
    /// Log commands and archive operations without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Remove the build directory before building
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub pre_clean: bool,

    /// Keep the previous build directory (overrides --pre-clean)
    #[arg(long)]
    pub nc: bool,

    /// Stop after the build step
    #[arg(long)]
    pub no_packaging: bool,

    /// CMake build configuration
    #[arg(long, env = "BUILD_TYPE", default_value = "Release")]
    pub cmake_build_type: String,

    /// Parallel jobs passed to ninja
    #[arg(long, default_value_t = num_cpus::get())]
    pub cmake_build_concurrency: usize,

    /// Build against the bundled libc++
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub use_libcxx: bool,

    /// Run clang-tidy during the build; disables packaging and universal builds
    #[arg(
        long,
        env = "ENABLE_CLANG_TIDY",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub clang_tidy_mode: bool,

    /// clang-tidy executable (looked up on PATH when omitted)
    #[arg(long, env = "CLANG_TIDY_EXECUTABLE")]
    pub clang_tidy_executable_path: Option<String>,

    /// macOS deployment target
    #[arg(long, env = "MACOSX_VERSION_MIN", default_value = "10.10")]
    pub macosx_version_min: String,

    /// Build an arm64 + x86_64 universal binary on macOS
    #[arg(
        long,
        env = "ENABLE_OSX_UNIVERSAL_BUILD",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub macosx_universal_build: bool,

    /// Identity passed to codesign (`-` signs ad-hoc)
    #[arg(long, env = "CODESIGN_IDENTITY", default_value = "-")]
    pub macosx_codesign_identity: String,

    /// Visual C++ target architecture (x86, x64, arm, arm64)
    #[arg(long, env = "VSCMD_ARG_TGT_ARCH", default_value = "")]
    pub msvc_tgt_arch: String,

    /// Visual C++ CRT linkage (static or dynamic)
    #[arg(long, env = "MSVC_CRT_LINKAGE", default_value = "")]
    pub msvc_crt_linkage: String,

    /// Keep Windows XP compatibility
    #[arg(
        long,
        env = "MSVC_ALLOW_XP",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub msvc_allow_xp: bool,

    /// Target system (windows, darwin, linux, freebsd, ...)
    #[arg(long, default_value_t = TargetSystem::host())]
    pub system: TargetSystem,

    /// Sysroot used when cross-compiling for Linux or FreeBSD
    #[arg(long)]
    pub sysroot: Option<PathBuf>,

    /// Target architecture in Go spelling (amd64, arm64, 386, ...)
    #[arg(long, default_value_t = host_arch())]
    pub arch: String,

    /// Top of the source tree
    #[arg(long, default_value = ".")]
    pub source_dir: PathBuf,

    /// Send progress to the log instead of the terminal
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Resolve paths and the environment into the build configuration.
    pub fn into_config(self) -> Result<BuildConfig> {
        let source_dir = std::path::absolute(&self.source_dir)
            .fs_context("resolving source directory", &self.source_dir)?;
        let clang_tidy = self
            .clang_tidy_mode
            .then(|| clang_tidy_executable(self.clang_tidy_executable_path));

        let config = BuildConfig {
            dry_run: self.dry_run,
            pre_clean: self.pre_clean && !self.nc,
            no_packaging: self.no_packaging,
            build_type: self.cmake_build_type,
            build_concurrency: self.cmake_build_concurrency.max(1),
            use_libcxx: self.use_libcxx,
            clang_tidy,
            macos: MacOsOptions {
                version_min: self.macosx_version_min,
                universal_build: self.macosx_universal_build,
                codesign_identity: self.macosx_codesign_identity,
            },
            msvc: MsvcOptions {
                target_arch: self.msvc_tgt_arch,
                crt_linkage: self.msvc_crt_linkage,
                allow_xp: self.msvc_allow_xp,
            },
            system: self.system,
            arch: self.arch,
            sysroot: self.sysroot.unwrap_or_default(),
            source_dir,
            host_env: HostToolchainEnv::capture(),
        };
        Ok(config.normalized())
    }
}

fn clang_tidy_executable(explicit: Option<String>) -> String {
    match explicit.filter(|path| !path.is_empty()) {
        Some(path) => path,
        None => which::which("clang-tidy")
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| "clang-tidy".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("yass_build").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn nc_overrides_pre_clean() {
        let config = parse(&["--nc"]).into_config().unwrap();
        assert!(!config.pre_clean);
        let config = parse(&[]).into_config().unwrap();
        assert!(config.pre_clean);
    }

    #[test]
    fn boolean_flags_take_optional_values() {
        let args = parse(&["--use-libcxx=false", "--pre-clean", "off"]);
        assert!(!args.use_libcxx);
        assert!(!args.pre_clean);
        assert!(parse(&["--msvc-allow-xp"]).msvc_allow_xp);
    }

    #[test]
    fn clang_tidy_mode_disables_packaging() {
        let config = parse(&[
            "--clang-tidy-mode",
            "--clang-tidy-executable-path",
            "/opt/llvm/bin/clang-tidy",
            "--system",
            "darwin",
        ])
        .into_config()
        .unwrap();
        assert_eq!(config.clang_tidy.as_deref(), Some("/opt/llvm/bin/clang-tidy"));
        assert!(config.no_packaging);
        assert!(!config.is_universal());
    }

    #[test]
    fn source_dir_is_made_absolute() {
        let config = parse(&["--source-dir", "some/tree", "--system", "linux", "--arch", "arm"])
            .into_config()
            .unwrap();
        assert!(config.source_dir.is_absolute());
        assert!(config.source_dir.ends_with("some/tree"));
        assert_eq!(config.system, TargetSystem::Linux);
        assert_eq!(config.build_dir_name(), "build-linux-arm");
    }
}
