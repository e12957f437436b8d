use assert_cmd::Command;
use predicates::prelude::*;

fn workloader() -> Command {
    let mut cmd = Command::cargo_bin("workloader").unwrap();
    cmd.env_remove("WORKLOADER_CONFIG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    workloader()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("wkld-replicate"))
        .stdout(predicate::str::contains("pce-list"));
}

#[test]
fn test_replicate_requires_pce_list() {
    workloader()
        .arg("wkld-replicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pce-list"));
}

#[test]
fn test_skip_source_must_be_in_pce_list() {
    workloader()
        .args([
            "--config",
            "/nonexistent/path/pce.toml",
            "wkld-replicate",
            "-p",
            "b,c",
            "-s",
            "a",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("a is not in the pce list"));
}

#[test]
fn test_unknown_pce_is_reported() {
    workloader()
        .args([
            "--config",
            "/nonexistent/path/pce.toml",
            "wkld-replicate",
            "--pce-list",
            "east",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("east"));
}

#[test]
fn test_pce_list_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pce.toml");
    std::fs::write(
        &path,
        "[[pce]]\nname = \"east\"\nfqdn = \"pce-east.example.com\"\nuser = \"api_1\"\n",
    )
    .unwrap();

    workloader()
        .args(["--config", path.to_str().unwrap(), "--output", "json", "pce-list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pce-east.example.com"))
        .stdout(predicate::str::contains("\"port\": 8443"));
}
