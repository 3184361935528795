use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Build a project with a manifest and a populated dist/ directory. The
/// root is canonicalized so paths passed on the command line line up with
/// what the resolver computes.
fn setup_project(manifest: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::write(root.join("package.json"), manifest).unwrap();

    let dist = root.join("dist");
    fs::create_dir_all(&dist).unwrap();
    fs::write(dist.join("app.js"), "bundle").unwrap();
    fs::write(dist.join("app.js.map"), "sourcemap").unwrap();
    fs::write(dist.join("old.css"), "stale stylesheet").unwrap();

    (dir, root)
}

fn distsweep() -> Command {
    Command::cargo_bin("distsweep").unwrap()
}

#[test]
fn default_mode_cleans_unprotected_files() {
    let (_dir, root) = setup_project("{}");

    distsweep()
        .arg(&root)
        .arg("-o")
        .arg("dist")
        .arg("--protect")
        .arg("dist/app.js")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Size Removed"));

    // The build's own bundle and its inferred source map survive.
    assert!(root.join("dist/app.js").exists());
    assert!(root.join("dist/app.js.map").exists());
    assert!(!root.join("dist/old.css").exists());
}

#[test]
fn dry_run_removes_nothing() {
    let (_dir, root) = setup_project("{}");

    distsweep()
        .arg(&root)
        .arg("-o")
        .arg("dist")
        .arg("--protect")
        .arg("dist/app.js")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Would remove:"))
        .stdout(predicate::str::contains("Dry run mode"));

    assert!(root.join("dist/app.js").exists());
    assert!(root.join("dist/app.js.map").exists());
    assert!(root.join("dist/old.css").exists());
}

#[test]
fn missing_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("dist")).unwrap();

    distsweep()
        .arg(&root)
        .arg("-o")
        .arg("dist")
        .assert()
        .failure()
        .stderr(predicate::str::contains("package.json"));
}

#[test]
fn configured_mode_applies_patterns() {
    let (_dir, root) = setup_project(r#"{"cleanDistFiles": ["dist/*.css"]}"#);

    distsweep()
        .arg(&root)
        .arg("-o")
        .arg("dist")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Size Removed"));

    assert!(root.join("dist/app.js").exists());
    assert!(root.join("dist/app.js.map").exists());
    assert!(!root.join("dist/old.css").exists());
}

#[test]
fn protect_list_file_is_honored() {
    let (_dir, root) = setup_project("{}");
    let list = root.join("bundle-files.txt");
    fs::write(&list, "dist/app.js\n\n").unwrap();

    distsweep()
        .arg(&root)
        .arg("-o")
        .arg("dist")
        .arg("--protect-list")
        .arg(&list)
        .assert()
        .success();

    assert!(root.join("dist/app.js").exists());
    assert!(root.join("dist/app.js.map").exists());
    assert!(!root.join("dist/old.css").exists());
}

#[test]
fn nothing_stale_reports_cleanly() {
    let (_dir, root) = setup_project("{}");

    distsweep()
        .arg(&root)
        .arg("-o")
        .arg("dist")
        .arg("--protect")
        .arg("dist/app.js")
        .arg("--protect")
        .arg("dist/old.css")
        .assert()
        .success()
        .stdout(predicate::str::contains("No stale files found."));

    assert!(root.join("dist/app.js").exists());
    assert!(root.join("dist/app.js.map").exists());
    assert!(root.join("dist/old.css").exists());
}

#[test]
fn verbose_lists_removed_paths() {
    let (_dir, root) = setup_project("{}");

    distsweep()
        .arg(&root)
        .arg("-o")
        .arg("dist")
        .arg("--protect")
        .arg("dist/app.js")
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed:").and(predicate::str::contains("old.css")));
}
