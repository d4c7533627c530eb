//! Integration tests for the sshm command line.

mod common;

use common::TestEnv;
use predicates::prelude::*;

fn sample_env() -> TestEnv {
    let env = TestEnv::with_config(
        "Include conf.d/*\nHost web\n  HostName 203.0.113.5\n  User deploy\n",
    );
    env.write(
        "conf.d/work",
        "Host bastion\n  HostName 198.51.100.7\nHost db\n  HostName 10.0.0.9\n  ProxyJump bastion\n",
    );
    env
}

#[test]
fn test_files_json_lists_tree() {
    let env = sample_env();

    let output = env.sshm().args(["--json", "files"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["is_main"], true);
    assert_eq!(files[0]["host_count"], 1);
    assert_eq!(files[1]["host_count"], 2);
    assert!(json["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn test_hosts_text_shows_groups() {
    let env = sample_env();

    env.sshm()
        .arg("hosts")
        .assert()
        .success()
        .stdout(predicate::str::contains("web"))
        .stdout(predicate::str::contains("deploy@203.0.113.5:22"))
        .stdout(predicate::str::contains("via bastion"))
        .stdout(predicate::str::contains("proxy"));
}

#[test]
fn test_hosts_json_refresh() {
    let env = sample_env();

    let output = env
        .sshm()
        .args(["--json", "hosts", "--refresh"])
        .output()
        .unwrap();
    let hosts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = hosts
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["web", "bastion", "db"]);
    assert_eq!(hosts[2]["group"], "proxy");
}

#[test]
fn test_read_included_file() {
    let env = sample_env();

    env.sshm()
        .args(["read"])
        .arg(env.path("conf.d/work"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Host bastion"));
}

#[test]
fn test_read_outside_ssh_dir_fails() {
    let env = sample_env();
    let other = common::TempDir::new().unwrap();
    let outside = other.path().join("secrets");
    std::fs::write(&outside, "Host x\n").unwrap();

    env.sshm()
        .arg("read")
        .arg(&outside)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Only files under"));
}

#[test]
fn test_validate_reports_undeclared_jump() {
    let env = sample_env();
    let candidate = env.config_dir.path().join("candidate");
    std::fs::write(&candidate, "Host web\n  ProxyJump ghost\n").unwrap();

    env.sshm()
        .arg("validate")
        .arg("--input")
        .arg(&candidate)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ghost\""));

    // Validation never touches the file
    assert!(env.read("config").starts_with("Include conf.d/*"));
}

#[test]
fn test_validate_from_stdin() {
    let env = sample_env();

    env.sshm()
        .args(["validate", "--input", "-"])
        .write_stdin("Host web\n  Port nope\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Port"));
}

#[test]
fn test_validate_clean_file() {
    let env = sample_env();

    env.sshm()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("No problems found"));
}

#[test]
fn test_save_round_trip_with_backup() {
    let env = sample_env();
    let text = "Include conf.d/*\nHost web\n  HostName 203.0.113.6\n";

    env.sshm()
        .args(["save", "--input", "-"])
        .write_stdin(text)
        .assert()
        .success()
        .stdout(predicate::str::contains("previous content in"));

    env.sshm()
        .arg("read")
        .assert()
        .success()
        .stdout(text);
    assert!(env.read("config.bak").contains("203.0.113.5"));
}

#[test]
fn test_save_included_file_json_warnings() {
    let env = sample_env();

    let output = env
        .sshm()
        .args(["--json", "save", "--input", "-", "--file"])
        .arg(env.path("conf.d/work"))
        .write_stdin("Host db\n  ProxyJump nowhere\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(env.read("conf.d/work"), "Host db\n  ProxyJump nowhere\n");
}

#[test]
fn test_missing_root_fails() {
    let env = TestEnv::new();

    env.sshm()
        .arg("files")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SSH config not found"));
}

#[test]
fn test_open_rejects_unsafe_host() {
    let env = sample_env();

    env.sshm()
        .args(["open", "web;reboot", "--terminal", "inline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsafe host name"));
}

#[test]
fn test_settings_persist() {
    let env = TestEnv::new();

    env.sshm_bare()
        .args(["settings", "--terminal", "inline", "--editor", "nano"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_terminal = inline"));

    let saved = std::fs::read_to_string(env.config_dir.path().join("sshm.toml")).unwrap();
    assert!(saved.contains("default_terminal = \"inline\""));
    assert!(saved.contains("editor = \"nano\""));

    env.sshm_bare()
        .args(["--json", "settings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"default_terminal\": \"inline\""));
}
