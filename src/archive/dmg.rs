//! macOS disk images via the `pkg-dmg` script.
//!
//! The image carries the application bundle, a license agreement rendered
//! from the EULA template, a volume icon, a pre-arranged `.DS_Store` with its
//! background, and an `/Applications` shortcut for drag-to-install.

use super::{Archiver, path_arg};
use crate::error::{ErrorExt, Result};
use crate::process::{FailurePolicy, Invocation};
use base64::Engine;
use std::path::{Path, PathBuf};

const EULA_PLACEHOLDER: &str = "%PLACEHOLDER%";

/// Resources and tool locations used to build the disk image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmgLayout {
    /// The `pkg-dmg` script
    pub script: PathBuf,
    /// Volume name shown when the image is mounted
    pub volume_name: String,
    /// EULA XML template containing `%PLACEHOLDER%`
    pub eula_template: PathBuf,
    /// License text in RTF, embedded base64-encoded into the EULA
    pub eula_rtf: PathBuf,
    /// Volume icon
    pub icon: PathBuf,
    /// Finder layout
    pub ds_store: PathBuf,
    /// Background image directory referenced by the Finder layout
    pub background: PathBuf,
}

impl DmgLayout {
    /// Standard resource locations inside the yass source tree.
    pub fn for_source_tree(source_dir: &Path) -> Self {
        Self {
            script: source_dir.join("scripts").join("pkg-dmg"),
            volume_name: "Yet Another Shadow Socket".to_string(),
            eula_template: source_dir.join("src").join("mac").join("eula.xml"),
            eula_rtf: source_dir.join("GPL-2.0.rtf"),
            icon: source_dir.join("src").join("mac").join("yass.icns"),
            ds_store: source_dir.join("macos").join(".DS_Store"),
            background: source_dir.join("macos").join(".background"),
        }
    }
}

/// Substitute the base64-encoded RTF license into the EULA template.
pub fn render_eula(template: &str, rtf: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(rtf);
    template.replace(EULA_PLACEHOLDER, &encoded)
}

impl Archiver<'_> {
    /// Package an application bundle into a disk image at `output`.
    ///
    /// The rendered `eula.xml` is written next to the bundle in the archiver
    /// root and handed to `pkg-dmg` as a resource.
    pub fn archive_bundle(
        &self,
        output: impl AsRef<Path>,
        bundle: impl AsRef<Path>,
        layout: &DmgLayout,
    ) -> Result<()> {
        let output = self.root.join(output.as_ref());
        let bundle = self.root.join(bundle.as_ref());
        let eula = self.root.join("eula.xml");

        if self.runner.is_dry_run() {
            self.runner.reporter().info(&format!(
                "Would create disk image {} from {}",
                output.display(),
                bundle.display()
            ));
            return Ok(());
        }

        self.runner
            .reporter()
            .info(&format!("generating dmg file {}", output.display()));

        let template = std::fs::read_to_string(&layout.eula_template)
            .fs_context("reading EULA template", &layout.eula_template)?;
        let rtf = std::fs::read(&layout.eula_rtf).fs_context("reading license RTF", &layout.eula_rtf)?;
        std::fs::write(&eula, render_eula(&template, &rtf)).fs_context("writing EULA", &eula)?;

        let invocation = Invocation::new([path_arg(&layout.script)])
            .args(["--source".to_string(), path_arg(&bundle)])
            .args(["--target".to_string(), path_arg(&output)])
            .arg("--sourcefile")
            .args(["--volname", layout.volume_name.as_str()])
            .args(["--resource".to_string(), path_arg(&eula)])
            .args(["--icon".to_string(), path_arg(&layout.icon)])
            .args(["--copy".to_string(), format!("{}:/.DS_Store", layout.ds_store.display())])
            .args(["--copy".to_string(), format!("{}:/", layout.background.display())])
            .args(["--symlink", "/Applications:/Applications"])
            .current_dir(&self.root);
        self.runner.run(&invocation, FailurePolicy::Fatal)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eula_embeds_base64_license() {
        let xml = render_eula("<data>%PLACEHOLDER%</data>", b"{\\rtf1}");
        assert_eq!(xml, "<data>e1xydGYxfQ==</data>");
    }

    #[test]
    fn layout_points_into_source_tree() {
        let layout = DmgLayout::for_source_tree(Path::new("/src/yass"));
        assert_eq!(layout.script, Path::new("/src/yass/scripts/pkg-dmg"));
        assert!(layout.icon.ends_with("yass.icns"));
    }
}
