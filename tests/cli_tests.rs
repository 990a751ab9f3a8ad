//! Binary-level tests for the `frep` command

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn frep(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("frep").expect("binary should build");
    cmd.env("FREP_CONFIG", config).env_remove("RUST_LOG");
    cmd
}

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().expect("create tempdir");
        fs::create_dir_all(root.path().join("src/a")).expect("create src");
        fs::write(root.path().join("src/a/1.txt"), b"one").expect("write file");
        fs::write(root.path().join("src/b.txt"), b"bee").expect("write file");
        Self { root }
    }

    fn config(&self) -> std::path::PathBuf {
        self.root.path().join("replicator.toml")
    }

    fn src(&self) -> std::path::PathBuf {
        self.root.path().join("src")
    }

    fn dst(&self) -> std::path::PathBuf {
        self.root.path().join("dst")
    }
}

#[test]
fn test_help_lists_commands() {
    let fx = Fixture::new();
    frep(&fx.config())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_add_registers_and_syncs() {
    let fx = Fixture::new();
    frep(&fx.config())
        .args(["add"])
        .arg(fx.src())
        .arg(fx.dst())
        .assert()
        .success()
        .stdout(predicate::str::contains("Added"))
        .stdout(predicate::str::contains("Copied: 2"));

    assert_eq!(fs::read(fx.dst().join("a/1.txt")).expect("copied"), b"one");
    let stored = fs::read_to_string(fx.config()).expect("store file written");
    assert!(stored.contains("last_sync"));
}

#[test]
fn test_add_duplicate_fails() {
    let fx = Fixture::new();
    frep(&fx.config()).arg("add").arg(fx.src()).arg(fx.dst()).assert().success();
    frep(&fx.config())
        .arg("add")
        .arg(fx.src())
        .arg(fx.root.path().join("other"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_list_and_remove() {
    let fx = Fixture::new();
    frep(&fx.config())
        .arg("add")
        .arg(fx.src())
        .arg(fx.dst())
        .args(["--exclude", "cache/"])
        .assert()
        .success();

    frep(&fx.config())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exclusions: cache/"));

    frep(&fx.config()).arg("remove").arg(fx.src()).assert().success();
    frep(&fx.config())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No replications configured."));
}

#[test]
fn test_dry_run_changes_nothing() {
    let fx = Fixture::new();
    frep(&fx.config()).arg("add").arg(fx.src()).arg(fx.dst()).assert().success();
    fs::write(fx.src().join("later.txt"), b"later").expect("write file");

    frep(&fx.config())
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("COPY      later.txt"))
        .stdout(predicate::str::contains("no changes were made"));
    assert!(!fx.dst().join("later.txt").exists());

    frep(&fx.config())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Copied: 1"));
    assert!(fx.dst().join("later.txt").exists());
}

#[test]
fn test_status_json() {
    let fx = Fixture::new();
    frep(&fx.config()).arg("add").arg(fx.src()).arg(fx.dst()).assert().success();

    let output = frep(&fx.config())
        .args(["status", "--json"])
        .output()
        .expect("run status");
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status output is JSON");
    let entry = &value[0];
    assert_eq!(entry["status"]["source_files"], 2);
    assert_eq!(entry["status"]["dest_files"], 2);
    assert_eq!(entry["status"]["pending_changes"], 0);
    assert!(entry["last_sync"].is_string());
}

#[test]
fn test_sync_unknown_source_fails() {
    let fx = Fixture::new();
    frep(&fx.config())
        .arg("sync")
        .arg(fx.root.path().join("unknown"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No replication"));
}

#[test]
fn test_watch_rejects_oversized_interval() {
    let fx = Fixture::new();
    frep(&fx.config())
        .args(["watch", "--interval", "99999999999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at most"));
}
