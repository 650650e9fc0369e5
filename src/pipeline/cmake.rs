//! CMake configure arguments per target system.
//!
//! Pure function of [`BuildConfig`]: produces the argument list, the
//! environment overlay for the cmake process, and (on Windows) the contents
//! of the native toolchain file that must be written before configuring.

use crate::config::BuildConfig;
use crate::error::Result;
use crate::platform::{TargetSystem, freebsd_target, gnu_target, msvc_llvm_triple};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of the generated host toolchain file for Windows cross builds.
pub const NATIVE_TOOLCHAIN_FILE: &str = "Native.cmake";

/// Everything needed to run `cmake <source_dir> ...`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmakeArguments {
    /// Arguments after the source directory
    pub args: Vec<String>,
    /// Environment overlay for the cmake process
    pub env: BTreeMap<String, String>,
    /// Contents of `Native.cmake`, when one is required
    pub native_toolchain: Option<String>,
}

impl CmakeArguments {
    /// Assemble configure arguments for `config`, building into `build_dir`.
    pub fn for_config(config: &BuildConfig, build_dir: &Path) -> Result<Self> {
        let mut cmake = Self::default();
        cmake.push(["-DGUI=ON", "-DCLI=ON", "-DSERVER=ON"]);
        cmake.push([format!("-DCMAKE_BUILD_TYPE={}", config.build_type)]);
        cmake.push(["-G", "Ninja"]);
        cmake.push(["-DUSE_HOST_TOOLS=on"]);
        cmake.push([if config.use_libcxx {
            "-DUSE_LIBCXX=on"
        } else {
            "-DUSE_LIBCXX=off"
        }]);
        if let Some(clang_tidy) = &config.clang_tidy {
            cmake.push([
                "-DENABLE_CLANG_TIDY=on".to_string(),
                format!("-DCLANG_TIDY_EXECUTABLE={clang_tidy}"),
            ]);
        }

        match &config.system {
            TargetSystem::Windows => cmake.windows(config, build_dir)?,
            TargetSystem::Darwin => {
                cmake.push([format!(
                    "-DCMAKE_OSX_DEPLOYMENT_TARGET={}",
                    config.macos.version_min
                )]);
                if config.macos.universal_build {
                    cmake.push(["-DCMAKE_OSX_ARCHITECTURES=arm64;x86_64"]);
                }
            }
            TargetSystem::Linux => {
                let (gnu_type, gnu_arch) = gnu_target(&config.arch)?;
                cmake.sysroot_toolchain(
                    config,
                    "Linux.cmake",
                    &[&["usr", "lib", "pkgconfig"], &["usr", "share", "pkgconfig"]],
                    gnu_type,
                    gnu_arch,
                );
            }
            TargetSystem::FreeBsd => {
                let (llvm_target, llvm_arch) = freebsd_target(&config.arch)?;
                cmake.sysroot_toolchain(
                    config,
                    "FreeBSD.cmake",
                    &[
                        &["usr", "libdata", "pkgconfig"],
                        &["usr", "local", "libdata", "pkgconfig"],
                    ],
                    llvm_target,
                    llvm_arch,
                );
            }
            TargetSystem::Other(_) => {}
        }

        Ok(cmake)
    }

    fn push<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
    }

    fn windows(&mut self, config: &BuildConfig, build_dir: &Path) -> Result<()> {
        let env = &config.host_env;
        let native_file = build_dir.join(NATIVE_TOOLCHAIN_FILE);
        self.push([format!(
            "-DCROSS_TOOLCHAIN_FLAGS_NATIVE=-DCMAKE_TOOLCHAIN_FILE={}",
            forward_slashes(&native_file.display().to_string())
        )]);
        self.push([format!(
            "-DCROSS_TOOLCHAIN_FLAGS_NATIVE_LIB={}",
            native_lib_paths(env.lib.as_deref().unwrap_or_default())
        )]);
        self.native_toolchain = Some(native_toolchain(
            env.cc.as_deref().unwrap_or("cl"),
            env.cxx.as_deref().unwrap_or("cl"),
        ));

        self.push([format!("-DCMAKE_MSVC_CRT_LINKAGE={}", config.msvc.crt_linkage)]);
        self.push([if config.msvc.allow_xp {
            "-DALLOW_XP=ON"
        } else {
            "-DALLOW_XP=OFF"
        }]);

        // clang-cl is a cross compiler and needs the target spelled out
        let triple = msvc_llvm_triple(&config.msvc.target_arch)?;
        if env.cc.as_deref().is_some_and(|cc| cc.contains("clang-cl")) {
            self.push([
                format!("-DCMAKE_C_COMPILER_TARGET={triple}"),
                format!("-DCMAKE_CXX_COMPILER_TARGET={triple}"),
            ]);
        }
        if matches!(config.msvc.target_arch.as_str(), "arm" | "arm64") {
            self.push([format!("-DCMAKE_ASM_FLAGS=--target={triple}")]);
        }
        Ok(())
    }

    fn sysroot_toolchain(
        &mut self,
        config: &BuildConfig,
        toolchain_file: &str,
        pkg_config_dirs: &[&[&str]],
        target: &str,
        processor: &str,
    ) {
        let source = &config.source_dir;
        let toolchain = source.join("cmake").join("platforms").join(toolchain_file);
        self.push([format!("-DCMAKE_TOOLCHAIN_FILE={}", toolchain.display())]);

        let pkg_config_path: Vec<String> = pkg_config_dirs
            .iter()
            .map(|parts| {
                parts
                    .iter()
                    .fold(config.sysroot.clone(), |path, part| path.join(part))
                    .display()
                    .to_string()
            })
            .collect();
        self.env
            .insert("PKG_CONFIG_PATH".to_string(), pkg_config_path.join(":"));

        let llvm_sysroot = source
            .join("third_party")
            .join("llvm-build")
            .join("Release+Asserts");
        self.push([
            format!("-DLLVM_SYSROOT={}", llvm_sysroot.display()),
            format!("-DGCC_SYSROOT={}", config.sysroot.display()),
            format!("-DGCC_SYSTEM_PROCESSOR={processor}"),
            format!("-DGCC_TARGET={target}"),
        ]);
    }
}

/// Guess the host (x64) library directories from the target's `LIB` value.
///
/// Old Windows SDKs (v7.1A) keep x86 libraries directly in `Lib` and x64 ones
/// in `Lib\x64`; newer layouts keep one directory per architecture side by side.
pub fn native_lib_paths(host_lib: &str) -> String {
    host_lib
        .split(';')
        .filter(|path| !path.is_empty())
        .map(|path| {
            let path = forward_slashes(path);
            let path = path.trim_end_matches('/');
            let lower = path.to_ascii_lowercase();
            if lower.contains("v7.1a") {
                if lower.ends_with("lib") {
                    format!("{path}/x64")
                } else {
                    path.to_string()
                }
            } else {
                match path.rsplit_once('/') {
                    Some((parent, _)) => format!("{parent}/x64"),
                    None => "x64".to_string(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Contents of the native toolchain file used to build host tools.
pub fn native_toolchain(cc: &str, cxx: &str) -> String {
    format!(
        "set(CMAKE_C_COMPILER \"{}\")\n\
         set(CMAKE_CXX_COMPILER \"{}\")\n\
         set(CMAKE_C_COMPILER_TARGET \"x86_64-pc-windows-msvc\")\n\
         set(CMAKE_CXX_COMPILER_TARGET \"x86_64-pc-windows-msvc\")\n",
        forward_slashes(cc),
        forward_slashes(cxx)
    )
}

fn forward_slashes(s: &str) -> String {
    s.replace('\\', "/")
}
