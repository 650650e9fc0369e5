//! Stages 5-7: debug info splitting, code signing and the universal binary
//! check.

use super::Pipeline;
use crate::error::Result;
use crate::platform::{APP_NAME, TargetSystem};
use crate::process::{FailurePolicy, Invocation};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const BUNDLE_EXTENSIONS: [&str; 3] = ["app", "framework", "appex"];
const LIBRARY_EXTENSIONS: [&str; 2] = ["so", "dylib"];

/// Whether `lipo -archs` output lists both x86_64 and arm64 slices.
pub fn is_universal_binary(lipo_archs: &str) -> bool {
    let archs: Vec<&str> = lipo_archs.split_whitespace().collect();
    archs.contains(&"x86_64") && archs.contains(&"arm64")
}

impl Pipeline<'_> {
    pub(super) fn strip_binaries(&self) -> Result<()> {
        self.stage("Strip binaries");
        match &self.config.system {
            // the linker already wrote the .pdb next to the executable
            TargetSystem::Windows => {}
            TargetSystem::Linux | TargetSystem::FreeBsd => {
                let objcopy = self.objcopy();
                let debug_file = format!("{APP_NAME}.dbg");
                for argv in [
                    vec![objcopy.clone(), "--only-keep-debug".into(), APP_NAME.into(), debug_file.clone()],
                    vec![objcopy.clone(), "--strip-debug".into(), APP_NAME.into()],
                    vec![objcopy, format!("--add-gnu-debuglink={debug_file}"), APP_NAME.into()],
                ] {
                    self.runner.run(&self.command(argv), FailurePolicy::Tolerate)?;
                }
            }
            TargetSystem::Darwin => {
                let app_name = self.config.app_name();
                let binary = bundle_main_binary(Path::new(&app_name)).display().to_string();
                self.runner.run(
                    &self.command(["dsymutil", binary.as_str(), "--statistics", "--papertrail", "-o"])
                        .arg(format!("{app_name}.dSYM")),
                    FailurePolicy::Tolerate,
                )?;
                self.runner.run(
                    &self.command(["strip", "-S", "-x", "-v", binary.as_str()]),
                    FailurePolicy::Tolerate,
                )?;
            }
            TargetSystem::Other(name) => {
                self.reporter()
                    .warn(&format!("stripping binaries not supported in platform {name}"));
            }
        }
        Ok(())
    }

    /// Bundled llvm-objcopy when the toolchain has been fetched, else the host one.
    fn objcopy(&self) -> String {
        let bundled = self
            .config
            .source_dir
            .join("third_party")
            .join("llvm-build")
            .join("Release+Asserts")
            .join("bin")
            .join("llvm-objcopy");
        if bundled.exists() {
            bundled.display().to_string()
        } else {
            "objcopy".to_string()
        }
    }

    pub(super) fn code_sign(&self) -> Result<()> {
        self.stage("Code sign");
        if !self.config.is_release() || self.config.system != TargetSystem::Darwin {
            return Ok(());
        }

        let app_name = self.config.app_name();
        let identity = self.config.macos.codesign_identity.as_str();
        let commands = [
            self.command([
                "codesign",
                "--timestamp=none",
                "--preserve-metadata=entitlements",
                "--options=runtime",
                "--force",
                "--deep",
                "--sign",
                identity,
                app_name.as_str(),
            ]),
            self.command(["codesign", "-dv", "--deep", "--strict", "--verbose=4", app_name.as_str()]),
            self.command(["codesign", "-d", "--entitlements", ":-", app_name.as_str()]),
        ];
        for invocation in &commands {
            self.runner.run(invocation, FailurePolicy::Fatal)?;
        }
        Ok(())
    }

    pub(super) fn check_universal_build(&self) -> Result<()> {
        self.stage("Check universal build");
        if !self.config.is_universal() {
            return Ok(());
        }
        if self.runner.is_dry_run() {
            self.reporter().info("Would check universal build with lipo");
            return Ok(());
        }

        let bundle = self.build_dir.join(self.config.app_name());
        let mut checked = 0;
        let mut problems = Vec::new();
        for (kind, binary) in universal_candidates(&bundle)? {
            checked += 1;
            match self.lipo_archs(&binary) {
                Ok(archs) if is_universal_binary(&archs) => {
                    log::debug!("{kind} {} is universal built", binary.display());
                }
                Ok(_) => problems.push(format!("{kind} {} is not universal built", binary.display())),
                Err(err) => problems.push(format!("{kind} {} could not be checked: {err}", binary.display())),
            }
        }

        for problem in &problems {
            self.reporter().warn(problem);
        }
        self.reporter().info(&format!(
            "checked {checked} binaries, {} not universal",
            problems.len()
        ));
        Ok(())
    }

    fn lipo_archs(&self, binary: &Path) -> Result<String> {
        let invocation = Invocation::new(["lipo".to_string(), "-archs".to_string(), binary.display().to_string()]);
        self.runner.capture_output(&invocation)
    }
}

/// `Foo.app` keeps its executable at `Foo.app/Contents/MacOS/Foo`.
fn bundle_main_binary(bundle: &Path) -> PathBuf {
    let stem = bundle
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    bundle.join("Contents").join("MacOS").join(stem)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

/// Binaries to verify: the main executable of `bundle` and of every nested
/// bundle, plus every shared library inside it.
fn universal_candidates(bundle: &Path) -> Result<Vec<(&'static str, PathBuf)>> {
    let mut candidates = vec![("bundle", bundle_main_binary(bundle))];
    for entry in WalkDir::new(bundle).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_dir() {
            if has_extension(path, &BUNDLE_EXTENSIONS) {
                candidates.push(("bundle", bundle_main_binary(path)));
            }
        } else if has_extension(path, &LIBRARY_EXTENSIONS) {
            candidates.push(("dylib", path.to_path_buf()));
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn universal_needs_both_slices() {
        assert!(is_universal_binary("x86_64 arm64\n"));
        assert!(!is_universal_binary("arm64\n"));
        assert!(!is_universal_binary("x86_64h"));
    }

    #[test]
    fn main_binary_inside_bundle() {
        assert_eq!(
            bundle_main_binary(Path::new("out/yass.app")),
            Path::new("out/yass.app/Contents/MacOS/yass")
        );
    }

    #[test]
    fn candidates_cover_nested_bundles_and_libraries() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("yass.app");
        let frameworks = bundle.join("Contents").join("Frameworks");
        fs::create_dir_all(frameworks.join("Sparkle.framework")).unwrap();
        fs::create_dir_all(bundle.join("Contents").join("MacOS")).unwrap();
        fs::write(frameworks.join("libc++.dylib"), b"").unwrap();
        fs::write(bundle.join("Contents").join("Info.plist"), b"").unwrap();

        let found = universal_candidates(&bundle).unwrap();
        let kinds: Vec<_> = found.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, ["bundle", "bundle", "dylib"]);
        assert!(found[1].1.ends_with("Sparkle.framework/Contents/MacOS/Sparkle"));
    }
}
