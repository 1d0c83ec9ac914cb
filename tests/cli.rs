use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn cargo_bin() -> Command {
    Command::cargo_bin("runboard").expect("binary exists")
}

#[test]
fn displays_help() {
    let mut cmd = cargo_bin();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Interactive dashboard for newman test runs",
        ))
        .stdout(predicate::str::contains("--demo"))
        .stdout(predicate::str::contains("--reports"));
}

#[test]
fn displays_version() {
    let mut cmd = cargo_bin();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn rejects_unknown_arguments() {
    let mut cmd = cargo_bin();
    cmd.arg("collection.json");
    cmd.assert().failure();
}

#[test]
fn errors_on_invalid_config() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("runboard.json").write_str("{ not json").unwrap();

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("parsing config"));
}

#[test]
fn errors_on_missing_env_file() {
    let temp = assert_fs::TempDir::new().unwrap();

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path()).arg("--env").arg("missing.env");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing.env"));
}
