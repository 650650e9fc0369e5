#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::fs;

    fn yass_build() -> Command {
        let mut cmd = Command::cargo_bin("yass_build").unwrap();
        for var in [
            "BUILD_TYPE",
            "ENABLE_CLANG_TIDY",
            "CLANG_TIDY_EXECUTABLE",
            "VSCMD_ARG_TGT_ARCH",
            "MSVC_CRT_LINKAGE",
            "MSVC_ALLOW_XP",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    #[test]
    fn test_dry_run_prints_commands_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("CMakeLists.txt"), "project(yass)\n").unwrap();

        yass_build()
            .args(["--dry-run", "--no-packaging", "--system", "linux", "--arch", "arm64"])
            .args(["--cmake-build-concurrency", "3", "--sysroot", "/opt/sysroot"])
            .arg("--source-dir")
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Would run command \"cmake"))
            .stdout(predicate::str::contains("-DGCC_TARGET=aarch64-linux-gnu"))
            .stdout(predicate::str::contains("Would run command \"ninja yass -j 3\""));

        assert!(!dir.path().join("build-linux-arm64").exists());
    }

    #[test]
    fn test_missing_source_tree_is_fatal() {
        let dir = tempfile::tempdir().unwrap();

        yass_build()
            .args(["--dry-run", "--source-dir"])
            .arg(dir.path())
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Fatal error"))
            .stderr(predicate::str::contains("CMakeLists.txt"));
    }

    #[test]
    fn test_unsupported_arch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("CMakeLists.txt"), "project(yass)\n").unwrap();

        yass_build()
            .args(["--dry-run", "--system", "freebsd", "--arch", "mips", "--source-dir"])
            .arg(dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid arch mips"));
    }
}
