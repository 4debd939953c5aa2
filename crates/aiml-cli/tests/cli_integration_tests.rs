//! Integration tests for the `aiml` command-line front end.

#![cfg(test)]
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

struct Host {
    dir: TempDir,
    config: PathBuf,
}

impl Host {
    fn plugins_root(&self) -> PathBuf {
        self.dir.path().join("plugins")
    }

    fn aiml(&self) -> Command {
        let mut cmd = Command::cargo_bin("aiml").expect("aiml bin");
        cmd.env_remove("AIML_CONFIG")
            .env("HOME", self.dir.path())
            .arg("--config")
            .arg(&self.config);
        cmd
    }
}

fn add_plugin(root: &Path, id: &str, entry: &str) {
    let dir = root.join(id);
    fs::create_dir_all(&dir).expect("plugin dir");
    fs::write(dir.join(entry), "// entry").expect("entry file");
}

fn host() -> Host {
    let dir = tempdir().expect("tempdir");
    let plugins_root = dir.path().join("plugins");
    let settings_dir = dir.path().join("settings");

    add_plugin(&plugins_root, "core", "lib.rs");
    add_plugin(&plugins_root, "model", "mod.rs");
    add_plugin(&plugins_root, "_scratch", "mod.rs");

    let config = dir.path().join("aiml.yaml");
    let yaml = format!(
        r#"
plugins_root: "{root}"
settings_dir: "{settings}"
plugins:
  - id: core
    name: Core
    locked: true
  - id: model
    name: Model
  - id: legacy
    name: Legacy
    default_enabled: false
    config_schema:
      required: [alpha]
      properties:
        alpha:
          type: number
"#,
        root = plugins_root.display(),
        settings = settings_dir.display(),
    );
    fs::write(&config, yaml).expect("config file");

    Host { dir, config }
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("valid json output")
}

fn enabled_by_id(resolved: &Value) -> Vec<(String, bool)> {
    resolved
        .as_array()
        .expect("resolved array")
        .iter()
        .map(|p| {
            (
                p["id"].as_str().expect("id").to_string(),
                p["enabled"].as_bool().expect("enabled"),
            )
        })
        .collect()
}

#[test]
fn token_encode_then_decode() {
    let output = Command::cargo_bin("aiml")
        .expect("aiml bin")
        .args(["token", "encode", "core", "model"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let token = String::from_utf8(output).expect("utf8").trim().to_string();
    assert!(!token.contains('+') && !token.contains('/'));

    Command::cargo_bin("aiml")
        .expect("aiml bin")
        .args(["token", "decode", &token])
        .assert()
        .success()
        .stdout("core\nmodel\n");
}

#[test]
fn token_decode_rejects_garbage() {
    Command::cargo_bin("aiml")
        .expect("aiml bin")
        .args(["token", "decode", "not-base64!!"])
        .assert()
        .failure()
        .stderr(contains("absent or malformed"));
}

#[test]
fn resolve_without_token_uses_defaults() {
    let host = host();
    let resolved = stdout_json(host.aiml().args(["-o", "json", "resolve"]));

    assert_eq!(
        enabled_by_id(&resolved),
        vec![
            ("core".to_string(), true),
            ("model".to_string(), true),
            ("legacy".to_string(), false),
        ]
    );
    assert_eq!(resolved[0]["name"], "Core");
    assert_eq!(resolved[0]["locked"], true);
}

#[test]
fn resolve_with_token_keeps_locked_plugins() {
    let host = host();
    let token = aiml_plugins::encode_enabled(["legacy"]);
    let resolved = stdout_json(host.aiml().args(["-o", "json", "resolve", "--token", &token]));

    assert_eq!(
        enabled_by_id(&resolved),
        vec![
            ("core".to_string(), true),
            ("model".to_string(), false),
            ("legacy".to_string(), true),
        ]
    );
}

#[test]
fn resolve_with_corrupt_token_falls_back() {
    let host = host();
    let resolved = stdout_json(host.aiml().args(["-o", "json", "resolve", "-t", "%%%"]));

    assert_eq!(resolved[1]["enabled"], true);
    assert_eq!(resolved[2]["enabled"], false);
}

#[test]
fn plugin_list_shows_installed_plugins() {
    let host = host();
    let listed = stdout_json(host.aiml().args(["-o", "json", "plugin", "list"]));

    let ids: Vec<&str> = listed
        .as_array()
        .expect("plugin array")
        .iter()
        .map(|p| p["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["core", "model"]);
    assert_eq!(listed[0]["locked"], true);
    assert_eq!(listed[1]["registered"], true);
}

#[test]
fn plugin_list_follows_configured_source_extension() {
    let dir = tempdir().expect("tempdir");
    let plugins_root = dir.path().join("plugins");
    add_plugin(&plugins_root, "model", "mod.py");
    add_plugin(&plugins_root, "core", "lib.rs");

    let config = dir.path().join("aiml.yaml");
    let yaml = format!(
        "plugins_root: \"{}\"\nhot_reload:\n  source_extension: py\n",
        plugins_root.display()
    );
    fs::write(&config, yaml).expect("config file");

    let mut cmd = Command::cargo_bin("aiml").expect("aiml bin");
    cmd.env_remove("AIML_CONFIG")
        .env("HOME", dir.path())
        .args(["-o", "json", "--config"])
        .arg(&config)
        .args(["plugin", "list"]);
    let listed = stdout_json(&mut cmd);

    let ids: Vec<&str> = listed
        .as_array()
        .expect("plugin array")
        .iter()
        .map(|p| p["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["model"]);
}

#[test]
fn plugin_uninstall_removes_directory() {
    let host = host();

    host.aiml()
        .args(["plugin", "uninstall", "model"])
        .assert()
        .success()
        .stdout(contains("uninstalled"));
    assert!(!host.plugins_root().join("model").exists());

    host.aiml()
        .args(["plugin", "uninstall", "model"])
        .assert()
        .failure()
        .stderr(contains("Plugin directory not found"));
}

#[test]
fn plugin_uninstall_refuses_locked_without_force() {
    let host = host();

    host.aiml()
        .args(["plugin", "uninstall", "core"])
        .assert()
        .failure()
        .stderr(contains("locked"));
    assert!(host.plugins_root().join("core").exists());

    host.aiml()
        .args(["plugin", "uninstall", "core", "--force"])
        .assert()
        .success();
    assert!(!host.plugins_root().join("core").exists());
}

#[test]
fn plugin_settings_reports_schema_problems() {
    let host = host();
    let settings_dir = host.dir.path().join("settings");
    fs::create_dir_all(&settings_dir).expect("settings dir");
    fs::write(settings_dir.join("legacy.json"), r#"{"alpha": "high"}"#).expect("settings");

    let report = stdout_json(host.aiml().args(["-o", "json", "plugin", "settings", "legacy"]));

    assert_eq!(report["settings"]["alpha"], "high");
    assert_eq!(report["valid"], false);
    assert_eq!(
        report["problems"][0],
        "Field 'alpha' has type string, expected number"
    );
}

#[test]
fn missing_config_file_fails() {
    Command::cargo_bin("aiml")
        .expect("aiml bin")
        .env_remove("AIML_CONFIG")
        .args(["--config", "/definitely/not/here.yaml", "resolve"])
        .assert()
        .failure()
        .stderr(contains("Configuration error"));
}
