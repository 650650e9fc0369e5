//! Stages 8-9: release archives and their inspection.

use super::Pipeline;
use crate::archive::{Archiver, DmgLayout};
use crate::config::BuildConfig;
use crate::error::{Context, ErrorExt, Result};
use crate::platform::{APP_NAME, TargetSystem};
use crate::process::{FailurePolicy, Invocation};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Archive file name mapped to the paths it contains, in archive order.
pub type ArchiveManifest = BTreeMap<String, Vec<String>>;

/// Third-party license files shipped in the main archive, as
/// (name in archive, location in the source tree).
pub const LICENSE_FILES: [(&str, &[&str]); 13] = [
    ("LICENSE", &["LICENSE"]),
    ("LICENSE.abseil-cpp", &["third_party", "abseil-cpp", "LICENSE"]),
    ("LICENSE.asio", &["third_party", "asio", "asio", "LICENSE_1_0.txt"]),
    ("LICENSE.boringssl", &["third_party", "boringssl", "src", "LICENSE"]),
    ("LICENSE.chromium", &["third_party", "chromium", "LICENSE"]),
    ("LICENSE.icu", &["third_party", "icu", "LICENSE"]),
    ("LICENSE.lss", &["third_party", "lss", "LICENSE"]),
    ("LICENSE.mozilla", &["third_party", "mozilla", "LICENSE.txt"]),
    ("LICENSE.protobuf", &["third_party", "protobuf", "LICENSE"]),
    ("LICENSE.quiche", &["third_party", "quiche", "src", "LICENSE"]),
    ("LICENSE.rapidjson", &["third_party", "rapidjson", "license.txt"]),
    ("LICENSE.xxhash", &["third_party", "xxhash", "LICENSE"]),
    ("LICENSE.zlib", &["third_party", "zlib", "LICENSE"]),
];

const WINDOWS_7Z: &str = "C:\\Program Files\\7-Zip\\7z.exe";

/// Release archive naming:
/// `<app>-<platform>-release-<arch>[-<crt>]-<tag><suffix><ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveNaming {
    platform: String,
    arch: String,
    variant: Option<String>,
    tag: String,
}

impl ArchiveNaming {
    /// Naming for `config` at version `tag` (as printed by `git describe`).
    pub fn new(config: &BuildConfig, tag: &str) -> Self {
        let (platform, arch, variant) = match &config.system {
            TargetSystem::Windows => (
                if config.msvc.allow_xp { "winxp" } else { "win" }.to_string(),
                config.msvc.target_arch.clone(),
                Some(config.msvc.crt_linkage.clone()),
            ),
            TargetSystem::Darwin => (
                "macos".to_string(),
                if config.macos.universal_build {
                    "universal".to_string()
                } else {
                    config.arch.clone()
                },
                None,
            ),
            other => (other.name().to_string(), config.arch.clone(), None),
        };
        Self {
            platform,
            arch,
            variant,
            tag: tag.trim().to_string(),
        }
    }

    /// Full file name for an archive with `suffix` (e.g. `-debuginfo`) and `ext`.
    pub fn file_name(&self, suffix: &str, ext: &str) -> String {
        let mut name = format!("{APP_NAME}-{}-release-{}", self.platform, self.arch);
        if let Some(variant) = &self.variant {
            name.push('-');
            name.push_str(variant);
        }
        format!("{name}-{}{suffix}{ext}", self.tag)
    }

    /// Extension of regular (non disk image) archives for `system`.
    pub fn extension(system: &TargetSystem) -> &'static str {
        if system.is_unix_like() { ".tgz" } else { ".zip" }
    }
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).fs_context("opening file for checksum", path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).fs_context("reading file for checksum", path)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Entry prefix for an archive: its file name without the extension.
fn archive_stem<'n>(file_name: &'n str, ext: &str) -> &'n str {
    file_name.strip_suffix(ext).unwrap_or(file_name)
}

fn debug_files(system: &TargetSystem, app_name: &str) -> Vec<String> {
    match system {
        TargetSystem::Windows => vec![format!("{APP_NAME}.pdb")],
        TargetSystem::Linux | TargetSystem::FreeBsd => vec![format!("{APP_NAME}.dbg")],
        TargetSystem::Darwin => vec![format!("{app_name}.dSYM")],
        TargetSystem::Other(_) => Vec::new(),
    }
}

impl Pipeline<'_> {
    pub(super) fn create_archives(&self) -> Result<ArchiveManifest> {
        self.stage("Archives");
        let config = self.config;

        let describe = Invocation::new(["git", "describe", "--tags", "HEAD"])
            .current_dir(&config.source_dir);
        let tag = self
            .runner
            .capture_output(&describe)
            .context("reading version tag")?;
        let naming = ArchiveNaming::new(config, &tag);
        let ext = ArchiveNaming::extension(&config.system);
        let archiver = Archiver::new(&self.runner, &self.build_dir);
        let mut manifest = ArchiveManifest::new();

        let app_name = config.app_name();
        let mut paths = vec![app_name.clone()];
        paths.extend(self.copy_licenses()?);

        if config.system == TargetSystem::Darwin {
            let main = naming.file_name("", ".dmg");
            archiver.archive_bundle(&main, &app_name, &DmgLayout::for_source_tree(&config.source_dir))?;
            manifest.insert(main, paths);
        } else {
            let main = naming.file_name("", ext);
            archiver.create_archive(&main, archive_stem(&main, ext), &paths)?;
            manifest.insert(main, paths);
        }

        let debug = debug_files(&config.system, &app_name);
        if !debug.is_empty() {
            let debug_archive = naming.file_name("-debuginfo", ext);
            archiver.create_archive(&debug_archive, archive_stem(&debug_archive, ext), &debug)?;
            manifest.insert(debug_archive, debug);
        }

        Ok(manifest)
    }

    /// Copy license files next to the build products; returns their names.
    fn copy_licenses(&self) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(LICENSE_FILES.len());
        for (name, location) in LICENSE_FILES {
            let source = location
                .iter()
                .fold(self.config.source_dir.clone(), |path, part| path.join(part));
            let target = self.build_dir.join(name);
            if self.runner.is_dry_run() {
                log::debug!("Would copy {} to {}", source.display(), target.display());
            } else {
                std::fs::copy(&source, &target).fs_context("copying license file", &source)?;
            }
            names.push(name.to_string());
        }
        Ok(names)
    }

    pub(super) fn inspect_archives(&self, manifest: &ArchiveManifest) -> Result<()> {
        self.stage("Inspect archives");
        for (archive, files) in manifest {
            self.reporter().info(&format!("------ {archive}"));
            if let Some(tool) = self.inspect_command(archive) {
                self.runner.run(&tool, FailurePolicy::Tolerate)?;
            } else {
                for file in files {
                    self.reporter().info(&format!("------------ {file}"));
                }
            }

            let path = self.build_dir.join(archive);
            if !self.runner.is_dry_run() && path.is_file() {
                let digest = file_sha256(&path)?;
                self.reporter().info(&format!("SHA256 ({archive}) = {digest}"));
            }
        }
        Ok(())
    }

    fn inspect_command(&self, archive: &str) -> Option<Invocation> {
        let argv: Vec<String> = if archive.ends_with(".dmg") {
            vec!["hdiutil".into(), "imageinfo".into(), archive.into()]
        } else if archive.ends_with(".zip") || archive.ends_with(".msi") {
            vec![self.seven_zip(), "l".into(), archive.into()]
        } else if archive.ends_with(".tgz") {
            vec!["tar".into(), "tvf".into(), archive.into()]
        } else {
            return None;
        };
        Some(self.command(argv))
    }

    fn seven_zip(&self) -> String {
        if self.config.system == TargetSystem::Windows {
            return WINDOWS_7Z.to_string();
        }
        which::which("7z")
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| "7z".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MsvcOptions;

    #[test]
    fn windows_names_carry_crt_linkage() {
        let config = BuildConfig {
            system: TargetSystem::Windows,
            msvc: MsvcOptions {
                target_arch: "x64".into(),
                crt_linkage: "static".into(),
                allow_xp: true,
            },
            ..BuildConfig::default()
        };
        let naming = ArchiveNaming::new(&config, "1.4.2\n");
        assert_eq!(
            naming.file_name("-debuginfo", ".zip"),
            "yass-winxp-release-x64-static-1.4.2-debuginfo.zip"
        );
    }

    #[test]
    fn macos_universal_name() {
        let config = BuildConfig {
            system: TargetSystem::Darwin,
            arch: "arm64".into(),
            ..BuildConfig::default()
        };
        let naming = ArchiveNaming::new(&config, "1.4.2-3-gabcdef0");
        assert_eq!(
            naming.file_name("", ".dmg"),
            "yass-macos-release-universal-1.4.2-3-gabcdef0.dmg"
        );
    }

    #[test]
    fn linux_names_use_tarballs() {
        let config = BuildConfig {
            system: TargetSystem::Linux,
            arch: "arm64".into(),
            ..BuildConfig::default()
        };
        let ext = ArchiveNaming::extension(&config.system);
        assert_eq!(ext, ".tgz");
        assert_eq!(
            ArchiveNaming::new(&config, "1.0").file_name("", ext),
            "yass-linux-release-arm64-1.0.tgz"
        );
    }

    #[test]
    fn debug_files_per_system() {
        assert_eq!(debug_files(&TargetSystem::Darwin, "yass.app"), ["yass.app.dSYM"]);
        assert_eq!(debug_files(&TargetSystem::Windows, "yass.exe"), ["yass.pdb"]);
        assert!(debug_files(&TargetSystem::Other("haiku".into()), "yass").is_empty());
    }

    #[test]
    fn sha256_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            file_sha256(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
