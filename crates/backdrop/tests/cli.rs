use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn backdrop(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_backdrop"))
        .env("BACKDROP_CONFIG_DIR", config_dir)
        .env_remove("BACKDROP_CONFIG")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run backdrop")
}

#[test]
fn frame_command_prints_draw_plan() {
    let config_dir = TempDir::new().unwrap();
    let output = backdrop(
        config_dir.path(),
        &["frame", "--time", "2", "--size", "800x600"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let frame: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(frame["index"], 0);
    assert_eq!(frame["elapsed"], 2.0);
    assert_eq!(frame["uniforms"]["time"], 2.0);

    let kinds: Vec<&str> = frame["draws"]
        .as_array()
        .unwrap()
        .iter()
        .map(|draw| draw["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["ambient_light", "point_light", "field", "solid"]);
}

#[test]
fn snapshot_command_writes_png() {
    let config_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let out = out_dir.path().join("field.png");
    let out_arg = out.to_str().unwrap();

    let output = backdrop(
        config_dir.path(),
        &["snapshot", out_arg, "--size", "48x32", "--pointer", "-0.5,0.5"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let bytes = fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[test]
fn config_command_reports_discovered_file() {
    let config_dir = TempDir::new().unwrap();
    let file = config_dir.path().join("backdrop.toml");
    fs::write(&file, "[pointer]\nsmoothing = 0.2\n").unwrap();

    let output = backdrop(config_dir.path(), &["config"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with(&format!("# source: {}", file.display())));
    assert!(stdout.contains("smoothing = 0.2"));
}

#[test]
fn config_command_falls_back_to_defaults() {
    let config_dir = TempDir::new().unwrap();
    let output = backdrop(config_dir.path(), &["config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("# source: built-in defaults"));
    assert!(stdout.contains("[solid]"));
}

#[test]
fn invalid_configuration_fails() {
    let config_dir = TempDir::new().unwrap();
    fs::write(
        config_dir.path().join("backdrop.toml"),
        "[solid]\ndistort = 1.5\n",
    )
    .unwrap();

    let output = backdrop(config_dir.path(), &["frame"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid configuration"), "{stderr}");
}

#[test]
fn missing_explicit_config_fails() {
    let config_dir = TempDir::new().unwrap();
    let missing = config_dir.path().join("absent.toml");
    let output = backdrop(
        config_dir.path(),
        &["--config", missing.to_str().unwrap(), "config"],
    );
    assert!(!output.status.success());
}
