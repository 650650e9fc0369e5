//! Target systems and architecture naming.
//!
//! System and architecture names follow the Go toolchain spelling used by the
//! CI scripts (`darwin`, `amd64`, ...), with common aliases accepted.

use crate::error::{ConfigError, Result};
use std::fmt;
use std::str::FromStr;

/// Base name of the built application.
pub const APP_NAME: &str = "yass";

/// Operating system the build targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetSystem {
    /// Windows (MSVC toolchain)
    Windows,
    /// macOS
    Darwin,
    /// Linux
    Linux,
    /// FreeBSD
    FreeBsd,
    /// Any other system; built without platform-specific post-processing
    Other(String),
}

impl TargetSystem {
    /// System the tool itself runs on.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "windows" => TargetSystem::Windows,
            "macos" => TargetSystem::Darwin,
            "linux" => TargetSystem::Linux,
            "freebsd" => TargetSystem::FreeBsd,
            other => TargetSystem::Other(other.to_string()),
        }
    }

    /// Canonical name as used in build directory and archive names.
    pub fn name(&self) -> &str {
        match self {
            TargetSystem::Windows => "windows",
            TargetSystem::Darwin => "darwin",
            TargetSystem::Linux => "linux",
            TargetSystem::FreeBsd => "freebsd",
            TargetSystem::Other(name) => name,
        }
    }

    /// Linux and FreeBSD share the sysroot-based cross toolchain and tarballs.
    pub fn is_unix_like(&self) -> bool {
        matches!(self, TargetSystem::Linux | TargetSystem::FreeBsd)
    }

    /// File name of the build product: `yass.exe`, `yass.app`, or `yass`.
    pub fn app_name(&self) -> String {
        match self {
            TargetSystem::Windows => format!("{APP_NAME}.exe"),
            TargetSystem::Darwin => format!("{APP_NAME}.app"),
            _ => APP_NAME.to_string(),
        }
    }
}

impl FromStr for TargetSystem {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "windows" | "win32" | "win" => TargetSystem::Windows,
            "darwin" | "macos" | "mac" => TargetSystem::Darwin,
            "linux" => TargetSystem::Linux,
            "freebsd" => TargetSystem::FreeBsd,
            other => TargetSystem::Other(other.to_string()),
        })
    }
}

impl fmt::Display for TargetSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Architecture of the machine the tool runs on, in Go spelling.
pub fn host_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        other => other,
    }
    .to_string()
}

/// LLVM triple for a Visual C++ target architecture (`VSCMD_ARG_TGT_ARCH`).
pub fn msvc_llvm_triple(msvc_arch: &str) -> Result<&'static str> {
    match msvc_arch {
        "x86" => Ok("i686-pc-windows-msvc"),
        "x64" => Ok("x86_64-pc-windows-msvc"),
        // lld-link rejects this triple; the linker is picked by the toolchain file
        "arm" => Ok("arm-pc-windows-msvc"),
        "arm64" => Ok("arm64-pc-windows-msvc"),
        other => Err(ConfigError::InvalidMsvcArch(other.to_string()).into()),
    }
}

/// GNU target triple and Debian processor name for a Linux architecture.
pub fn gnu_target(arch: &str) -> Result<(&'static str, &'static str)> {
    match arch {
        "amd64" | "x86_64" => Ok(("x86_64-linux-gnu", "x86_64")),
        "x86" | "i386" | "386" => Ok(("i386-linux-gnu", "i386")),
        "arm64" | "aarch64" => Ok(("aarch64-linux-gnu", "aarch64")),
        "armel" => Ok(("arm-linux-gnueabi", "armel")),
        "arm" => Ok(("arm-linux-gnueabihf", "armhf")),
        "mips" => Ok(("mipsel-linux-gnu", "mipsel")),
        "mips64el" => Ok(("mips64el-linux-gnuabi64", "mips64el")),
        other => Err(ConfigError::UnsupportedArch {
            system: "linux".to_string(),
            arch: other.to_string(),
        }
        .into()),
    }
}

/// LLVM target and processor name for a FreeBSD architecture.
pub fn freebsd_target(arch: &str) -> Result<(&'static str, &'static str)> {
    match arch {
        "amd64" | "x86_64" => Ok(("x86_64-freebsd", "x86_64")),
        "x86" | "i386" | "386" => Ok(("i386-freebsd", "i386")),
        "arm64" | "aarch64" => Ok(("aarch64-freebsd", "aarch64")),
        other => Err(ConfigError::UnsupportedArch {
            system: "freebsd".to_string(),
            arch: other.to_string(),
        }
        .into()),
    }
}
