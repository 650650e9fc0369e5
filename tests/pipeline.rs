mod common;

#[cfg(test)]
mod tests {
    use super::common::{Event, RecordingReporter};
    use std::path::PathBuf;
    use yass_build::{BuildConfig, Pipeline, TargetSystem};

    fn linux_config(source_dir: PathBuf) -> BuildConfig {
        BuildConfig {
            dry_run: true,
            no_packaging: true,
            build_concurrency: 2,
            system: TargetSystem::Linux,
            arch: "amd64".into(),
            sysroot: PathBuf::from("/opt/sysroot"),
            source_dir,
            ..BuildConfig::default()
        }
    }

    #[test]
    fn test_dry_run_runs_build_stages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("CMakeLists.txt"), "").unwrap();
        let config = linux_config(dir.path().to_path_buf());
        let reporter = RecordingReporter::shared();

        let manifest = Pipeline::new(&config, reporter.clone()).run().unwrap();

        assert!(manifest.is_empty());
        let sections: Vec<_> = reporter
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Section(title) => Some(title),
                _ => None,
            })
            .collect();
        assert_eq!(
            sections,
            [
                "Find source directory",
                "Prepare build directory",
                "Generate build script",
                "Execute build script"
            ]
        );

        let commands: Vec<_> = reporter
            .infos()
            .into_iter()
            .filter(|m| m.starts_with("Would run command"))
            .collect();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].starts_with(&format!(
            "Would run command \"cmake {} -DGUI=ON",
            dir.path().display()
        )));
        assert!(commands[0].contains("-DGCC_SYSROOT=/opt/sysroot"));
        assert_eq!(commands[1], "Would run command \"ninja yass -j 2\"");
        assert!(!config.build_dir().exists());
    }

    #[test]
    fn test_missing_cmakelists_stops_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let config = linux_config(dir.path().to_path_buf());
        let reporter = RecordingReporter::shared();

        let err = Pipeline::new(&config, reporter.clone()).run().unwrap_err();

        assert!(err.to_string().contains("CMakeLists.txt"));
        assert!(reporter.infos().iter().all(|m| !m.starts_with("Would run")));
    }

    #[cfg(unix)]
    fn git(dir: &std::path::Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .args(["-c", "user.name=yass", "-c", "user.email=yass@example.com"])
            .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    #[cfg(unix)]
    #[test]
    fn test_dry_run_packaging_names_linux_archives() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("CMakeLists.txt"), "").unwrap();
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["add", "CMakeLists.txt"]);
        git(dir.path(), &["commit", "-q", "-m", "initial"]);
        git(dir.path(), &["tag", "v1.0"]);
        let config = BuildConfig {
            no_packaging: false,
            ..linux_config(dir.path().to_path_buf())
        };
        let build_dir = config.build_dir();
        let reporter = RecordingReporter::shared();

        let manifest = Pipeline::new(&config, reporter.clone()).run().unwrap();

        let main = "yass-linux-release-amd64-v1.0.tgz";
        let debug = "yass-linux-release-amd64-v1.0-debuginfo.tgz";
        let licenses = [
            "LICENSE",
            "LICENSE.abseil-cpp",
            "LICENSE.asio",
            "LICENSE.boringssl",
            "LICENSE.chromium",
            "LICENSE.icu",
            "LICENSE.lss",
            "LICENSE.mozilla",
            "LICENSE.protobuf",
            "LICENSE.quiche",
            "LICENSE.rapidjson",
            "LICENSE.xxhash",
            "LICENSE.zlib",
        ];
        assert_eq!(manifest.keys().collect::<Vec<_>>(), [debug, main]);
        assert_eq!(manifest[debug], ["yass.dbg"]);
        assert_eq!(manifest[main][0], "yass");
        assert_eq!(manifest[main][1..], licenses);

        let sections: Vec<_> = reporter
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Section(title) => Some(title),
                _ => None,
            })
            .collect();
        assert_eq!(
            sections[4..],
            [
                "Strip binaries",
                "Code sign",
                "Check universal build",
                "Archives",
                "Inspect archives"
            ]
        );

        let planned: Vec<_> = reporter
            .infos()
            .into_iter()
            .filter(|m| {
                ["Would run command", "Would create", "------"]
                    .iter()
                    .any(|head| m.starts_with(head))
            })
            .collect();
        assert!(planned[0].starts_with("Would run command \"cmake "));
        assert_eq!(planned[1], "Would run command \"ninja yass -j 2\"");
        assert_eq!(
            planned[2..],
            [
                "Would run command \"objcopy --only-keep-debug yass yass.dbg\"".to_string(),
                "Would run command \"objcopy --strip-debug yass\"".to_string(),
                "Would run command \"objcopy --add-gnu-debuglink=yass.dbg yass\"".to_string(),
                format!(
                    "Would create tgz file {} with [yass {}]",
                    build_dir.join(main).display(),
                    licenses.join(" ")
                ),
                format!(
                    "Would create tgz file {} with [yass.dbg]",
                    build_dir.join(debug).display()
                ),
                format!("------ {debug}"),
                format!("Would run command \"tar tvf {debug}\""),
                format!("------ {main}"),
                format!("Would run command \"tar tvf {main}\""),
            ]
        );
        assert!(!build_dir.exists());
    }
}
