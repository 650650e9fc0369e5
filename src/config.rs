//! Immutable build configuration.
//!
//! Built once at startup from command-line flags and the environment, then
//! passed by reference to every pipeline stage.

use crate::platform::{TargetSystem, host_arch};
use std::path::PathBuf;

/// macOS-specific options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacOsOptions {
    /// Deployment target, e.g. `10.10`
    pub version_min: String,
    /// Build arm64 + x86_64 in one pass
    pub universal_build: bool,
    /// Identity passed to `codesign --sign` (`-` is ad-hoc)
    pub codesign_identity: String,
}

impl Default for MacOsOptions {
    fn default() -> Self {
        Self {
            version_min: "10.10".to_string(),
            universal_build: true,
            codesign_identity: "-".to_string(),
        }
    }
}

/// Visual C++ options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsvcOptions {
    /// Target architecture (`x86`, `x64`, `arm`, `arm64`); empty when not building with MSVC
    pub target_arch: String,
    /// CRT linkage (`static` or `dynamic`)
    pub crt_linkage: String,
    /// Keep Windows XP compatibility
    pub allow_xp: bool,
}

/// Toolchain variables read from the environment at startup.
///
/// Captured once so that argument generation is a pure function of the
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostToolchainEnv {
    /// `CC`
    pub cc: Option<String>,
    /// `CXX`
    pub cxx: Option<String>,
    /// `LIB` (MSVC library search path, `;`-separated)
    pub lib: Option<String>,
}

impl HostToolchainEnv {
    /// Snapshot the current process environment.
    pub fn capture() -> Self {
        Self {
            cc: std::env::var("CC").ok(),
            cxx: std::env::var("CXX").ok(),
            lib: std::env::var("LIB").ok(),
        }
    }
}

/// Everything the pipeline needs to know, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Log commands instead of running them
    pub dry_run: bool,
    /// Remove the previous build directory first
    pub pre_clean: bool,
    /// Stop after building
    pub no_packaging: bool,
    /// CMake configuration (`Release`, `Debug`, ...)
    pub build_type: String,
    /// Parallel jobs passed to ninja
    pub build_concurrency: usize,
    /// Build against the bundled libc++
    pub use_libcxx: bool,
    /// clang-tidy executable when clang-tidy mode is on
    pub clang_tidy: Option<String>,
    /// macOS options
    pub macos: MacOsOptions,
    /// Visual C++ options
    pub msvc: MsvcOptions,
    /// Target system
    pub system: TargetSystem,
    /// Target architecture
    pub arch: String,
    /// Sysroot for cross-compiling (Linux/FreeBSD)
    pub sysroot: PathBuf,
    /// Top of the source tree
    pub source_dir: PathBuf,
    /// Host toolchain environment
    pub host_env: HostToolchainEnv,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            pre_clean: true,
            no_packaging: false,
            build_type: "Release".to_string(),
            build_concurrency: num_cpus::get(),
            use_libcxx: true,
            clang_tidy: None,
            macos: MacOsOptions::default(),
            msvc: MsvcOptions::default(),
            system: TargetSystem::host(),
            arch: host_arch(),
            sysroot: PathBuf::new(),
            source_dir: PathBuf::from("."),
            host_env: HostToolchainEnv::default(),
        }
    }
}

impl BuildConfig {
    /// Apply the clang-tidy restrictions: no universal build, no packaging.
    pub fn normalized(mut self) -> Self {
        if self.clang_tidy.is_some() {
            self.macos.universal_build = false;
            self.no_packaging = true;
        }
        self
    }

    /// Build product file name for the target system
    pub fn app_name(&self) -> String {
        self.system.app_name()
    }

    /// Whether this is a `Release` configuration
    pub fn is_release(&self) -> bool {
        self.build_type == "Release"
    }

    /// Whether a macOS universal binary is produced
    pub fn is_universal(&self) -> bool {
        self.system == TargetSystem::Darwin && self.macos.universal_build
    }

    /// Whether the MSVC toolchain is selected
    pub fn is_msvc(&self) -> bool {
        !self.msvc.target_arch.is_empty()
    }

    /// Name of the build directory below the source tree.
    pub fn build_dir_name(&self) -> String {
        if self.is_msvc() {
            format!("build-msvc-{}-{}", self.msvc.target_arch, self.msvc.crt_linkage)
        } else {
            format!("build-{}-{}", self.system, self.arch)
        }
    }

    /// Absolute-or-relative path of the build directory.
    pub fn build_dir(&self) -> PathBuf {
        self.source_dir.join(self.build_dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clang_tidy_disables_packaging_and_universal() {
        let config = BuildConfig {
            clang_tidy: Some("/usr/bin/clang-tidy".into()),
            system: TargetSystem::Darwin,
            ..BuildConfig::default()
        }
        .normalized();
        assert!(config.no_packaging);
        assert!(!config.is_universal());
    }

    #[test]
    fn build_dir_names() {
        let linux = BuildConfig {
            system: TargetSystem::Linux,
            arch: "arm64".into(),
            ..BuildConfig::default()
        };
        assert_eq!(linux.build_dir_name(), "build-linux-arm64");

        let msvc = BuildConfig {
            system: TargetSystem::Windows,
            msvc: MsvcOptions {
                target_arch: "x64".into(),
                crt_linkage: "static".into(),
                allow_xp: false,
            },
            ..BuildConfig::default()
        };
        assert_eq!(msvc.build_dir_name(), "build-msvc-x64-static");
    }
}
