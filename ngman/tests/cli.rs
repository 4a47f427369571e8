//! Tests for the ngman binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const CONFIG: &str = "\
worker_processes auto;
events {
    worker_connections 1024;
}
http {
    server {
        listen 80;
        server_name example.com;
    }
    server {
        listen 443 ssl;
    }
}
";

fn config_dir(content: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("nginx.conf"), content).unwrap();
    dir
}

fn ngman(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ngman"))
        .args(args)
        .arg("--root")
        .arg(root)
        .env("XDG_CONFIG_HOME", root)
        .env("HOME", root)
        .env_remove("NGMAN_CONFIG_ROOT")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_get_selects_by_path() {
    let dir = config_dir(CONFIG);
    let output = ngman(dir.path(), &["get", "http/server[1]/listen"]);
    assert!(output.status.success());

    let node: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(node["name"], "listen");
    assert_eq!(node["args"], serde_json::json!(["443", "ssl"]));
    assert_eq!(node["context"], "server");
}

#[test]
fn test_get_missing_path_fails() {
    let dir = config_dir(CONFIG);
    let output = ngman(dir.path(), &["get", "http/server[5]"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no directive at http/server[5]"));
}

#[test]
fn test_set_saves_and_keeps_backup() {
    let dir = config_dir(CONFIG);
    let output = ngman(dir.path(), &["set", "events/worker_connections", "4096"]);
    assert!(output.status.success());

    let saved = fs::read_to_string(dir.path().join("nginx.conf")).unwrap();
    assert!(saved.contains("    worker_connections 4096;\n"));
    assert_eq!(fs::read_to_string(dir.path().join("nginx.conf.backup")).unwrap(), CONFIG);
}

#[test]
fn test_tree_and_directives_emit_json() {
    let dir = config_dir(CONFIG);

    let tree: serde_json::Value = serde_json::from_str(&stdout(&ngman(dir.path(), &["tree"]))).unwrap();
    assert_eq!(tree["status"], "ok");
    assert_eq!(tree["config"][0]["parsed"][1]["directive"], "events");

    let directives: serde_json::Value =
        serde_json::from_str(&stdout(&ngman(dir.path(), &["directives"]))).unwrap();
    assert_eq!(directives.as_array().unwrap().len(), 3);
    assert!(directives[0].get("children").is_none());
}

#[test]
fn test_fmt_dry_run_leaves_file_alone() {
    let messy = "events{worker_connections 1024;}\n";
    let dir = config_dir(messy);

    let output = ngman(dir.path(), &["fmt", "--dry-run"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "events {\n    worker_connections 1024;\n}\n");
    assert_eq!(fs::read_to_string(dir.path().join("nginx.conf")).unwrap(), messy);

    assert!(ngman(dir.path(), &["fmt"]).status.success());
    assert_eq!(
        fs::read_to_string(dir.path().join("nginx.conf")).unwrap(),
        "events {\n    worker_connections 1024;\n}\n"
    );
}

#[test]
fn test_check_reports_misplaced_directives() {
    let dir = config_dir("listen 80;\nbrotli on;\n");
    let output = ngman(dir.path(), &["check"]);

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("unregistered directive \"brotli\" on line 2"));
    assert!(out.contains("\"listen\" is not allowed in main"));

    let ok = ngman(config_dir(CONFIG).path(), &["check"]);
    assert!(ok.status.success());
}

#[test]
fn test_parse_error_is_reported_with_source() {
    let dir = config_dir("events {\n    worker_connections 1024;\n}\n}\n");
    let output = ngman(dir.path(), &["tree"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nginx.conf"));
    assert!(stderr.contains("is not allowed here"));
}

#[test]
fn test_parse_and_build_commands() {
    let dir = config_dir("# top\nuser nginx;\n");
    let file = dir.path().join("nginx.conf");

    let output = ngman(dir.path(), &["parse", file.to_str().unwrap(), "--comments"]);
    assert!(output.status.success());
    let json = stdout(&output);
    assert!(json.contains("\"comment\": \" top\""));

    let payload = dir.path().join("payload.json");
    fs::write(&payload, json).unwrap();
    let output = ngman(dir.path(), &["build", payload.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "# top\nuser nginx;\n");
}

#[test]
fn test_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = ngman(dir.path(), &["tree"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration file not found"));
}
