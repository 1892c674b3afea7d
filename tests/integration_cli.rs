//! End-to-end tests of the mgit binary.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::workspace_with;

fn mgit() -> Command {
    let mut cmd = Command::cargo_bin("mgit").unwrap();
    // Keep the test hermetic against ambient configuration.
    cmd.env_remove("MGIT_WS")
        .env_remove("MGIT_JOBS")
        .env_remove("MGIT_PROD_BRANCH");
    cmd
}

#[test]
fn test_version_includes_build_metadata() {
    mgit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mgit"));
}

#[test]
fn test_empty_selection_fails_with_diagnostic() {
    let (workspace_dir, _) = workspace_with(&["api"]);

    mgit()
        .arg("--ws")
        .arg(workspace_dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No packages matched"));
}

#[test]
fn test_missing_workspace_root_fails() {
    let (workspace_dir, _) = workspace_with(&[]);
    let missing = workspace_dir.path().join("nope");

    mgit()
        .arg("--ws")
        .arg(&missing)
        .arg("--all")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_bash_reports_one_block_per_repository() {
    let (workspace_dir, _) = workspace_with(&["api", "web"]);

    mgit()
        .arg("--ws")
        .arg(workspace_dir.path())
        .arg("--all")
        .arg("--no-color")
        .args(["bash", "echo", "hello from mgit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# api (main)"))
        .stdout(predicate::str::contains("# web (main)"))
        .stdout(predicate::str::contains("hello from mgit"));
}

// A failing repository is reported in its own block while the process still
// exits successfully; only global preconditions set the exit code.
#[test]
fn test_partial_failure_exits_zero() {
    let (workspace_dir, paths) = workspace_with(&["api", "web"]);
    std::fs::write(paths[0].join("marker.txt"), "x").unwrap();

    mgit()
        .arg("--ws")
        .arg(workspace_dir.path())
        .arg("--all")
        .arg("--no-color")
        .args(["bash", "test", "-f", "marker.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# api (main)"))
        .stdout(predicate::str::contains("# web (main)"))
        .stdout(predicate::str::contains("failed"));
}

#[test]
fn test_selection_by_package_name() {
    let (workspace_dir, _) = workspace_with(&["api", "web"]);

    mgit()
        .arg("--ws")
        .arg(workspace_dir.path())
        .arg("--no-color")
        .args(["--packages", "web"])
        .args(["bash", "echo", "selected"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# web (main)"))
        .stdout(predicate::str::contains("# api (main)").not());
}

#[test]
fn test_commit_without_message_is_a_usage_error() {
    let (workspace_dir, _) = workspace_with(&["api"]);

    mgit()
        .arg("--ws")
        .arg(workspace_dir.path())
        .arg("--all")
        .arg("commit")
        .assert()
        .failure()
        .stderr(predicate::str::contains("MESSAGE"));
}
