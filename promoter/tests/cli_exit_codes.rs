//! CLI tests: spawn the promoter binary and check exit codes and output.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};

use promoter::exit_codes;
use promoter::io::config::{EngineConfig, write_config};

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).expect("encode")).expect("write");
    path
}

fn write_engine_config(dir: &Path) -> PathBuf {
    let path = dir.join("promoter.toml");
    let cfg = EngineConfig {
        workdir_root: Some(dir.join("work")),
        ..EngineConfig::default()
    };
    write_config(&path, &cfg).expect("write config");
    path
}

fn promoter(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_promoter"))
        .args(args)
        .output()
        .expect("run promoter")
}

fn promote(steps: &Path, config: &Path) -> Output {
    promoter(&[
        "promote",
        "--steps",
        steps.to_str().expect("utf-8 path"),
        "--project",
        "payments",
        "--stage",
        "prod",
        "--config",
        config.to_str().expect("utf-8 path"),
    ])
}

#[test]
fn validate_accepts_valid_steps() {
    let temp = tempfile::tempdir().expect("tempdir");
    let steps = write_json(
        temp.path(),
        "steps.json",
        &json!([{"kind": "compose-output", "alias": "vars", "config": {"a": 1}}]),
    );

    let output = promoter(&["validate", "--steps", steps.to_str().expect("utf-8 path")]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
}

#[test]
fn validate_rejects_reserved_alias() {
    let temp = tempfile::tempdir().expect("tempdir");
    let steps = write_json(
        temp.path(),
        "steps.json",
        &json!([{"kind": "compose-output", "alias": "step-0"}]),
    );

    let output = promoter(&["validate", "--steps", steps.to_str().expect("utf-8 path")]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn promote_with_builtins_succeeds() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = write_engine_config(temp.path());
    let steps = write_json(
        temp.path(),
        "steps.json",
        &json!([{"kind": "compose-output", "alias": "vars", "config": {"image": "app:2"}}]),
    );

    let output = promote(&steps, &config);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let result: Value = serde_json::from_slice(&output.stdout).expect("result json");
    assert_eq!(result["status"], json!("Succeeded"));
    assert_eq!(result["currentStep"], json!(1));
    assert_eq!(result["state"]["vars"], json!({"image": "app:2"}));
}

#[test]
fn promote_with_unknown_kind_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = write_engine_config(temp.path());
    let steps = write_json(temp.path(), "steps.json", &json!([{"kind": "helm-template"}]));

    let output = promote(&steps, &config);

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let result: Value = serde_json::from_slice(&output.stdout).expect("result json");
    assert_eq!(result["status"], json!("Errored"));
}

#[test]
fn check_health_with_unknown_kind_is_pending() {
    let temp = tempfile::tempdir().expect("tempdir");
    let criteria = write_json(temp.path(), "checks.json", &json!([{"kind": "argocd"}]));

    let output = promoter(&[
        "check-health",
        "--criteria",
        criteria.to_str().expect("utf-8 path"),
        "--project",
        "payments",
        "--stage",
        "prod",
    ]);

    assert_eq!(output.status.code(), Some(exit_codes::PENDING));
    let health: Value = serde_json::from_slice(&output.stdout).expect("health json");
    assert_eq!(health["status"], json!("Unknown"));
}

#[test]
fn missing_steps_file_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = write_engine_config(temp.path());

    let output = promote(&temp.path().join("missing.json"), &config);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}
