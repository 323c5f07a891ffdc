//! End-to-end tests for the dwell binary.
//!
//! Tests the full pipeline: init → replay → status, driving the real binary
//! with an isolated config and identity file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn dwell_binary() -> String {
    env!("CARGO_BIN_EXE_dwell").to_string()
}

/// Writes a config file that keeps identity inside `temp`.
fn write_config(temp: &Path) -> PathBuf {
    let identity = temp.join("data").join("identity.json");
    let config_path = temp.join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "identity_path = \"{}\"\nidle_detection_interval_secs = 20\n",
            identity.display()
        ),
    )
    .unwrap();
    config_path
}

/// Builds a command isolated from the caller's home and environment.
fn dwell(temp: &Path, config: &Path) -> Command {
    let mut cmd = Command::new(dwell_binary());
    cmd.env("HOME", temp)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

/// Runs `cmd` with `stdin` piped in.
fn run_with_stdin(mut cmd: Command, stdin: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn dwell");
    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().expect("failed to wait for dwell")
}

const SESSION: &str = r#"{"type":"activated","tab_id":1,"timestamp":"2025-01-29T12:00:00Z"}
{"type":"updated","tab_id":1,"url":"https://a.example/p1","title":"Loading","timestamp":"2025-01-29T12:00:00Z"}
{"type":"updated","tab_id":1,"title":"A Example","status":"complete","timestamp":"2025-01-29T12:00:00.300Z"}
{"type":"idle_state_changed","state":"idle","timestamp":"2025-01-29T12:00:01Z"}
{"type":"idle_state_changed","state":"active","timestamp":"2025-01-29T12:00:09Z"}
{"type":"removed","tab_id":1,"timestamp":"2025-01-29T12:00:09.500Z"}
{"type":"activated","tab_id":2,"timestamp":"2025-01-29T12:00:10Z"}
{"type":"updated","tab_id":2,"url":"https://b.example/","timestamp":"2025-01-29T12:00:10Z"}
{"type":"removed","tab_id":2,"timestamp":"2025-01-29T12:00:10.400Z"}
"#;

#[test]
fn test_replay_with_explicit_user_id() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let mut cmd = dwell(temp.path(), &config);
    cmd.arg("replay").arg("--user-id").arg("user-e2e");
    let output = run_with_stdin(cmd, SESSION);

    assert!(
        output.status.success(),
        "replay failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).unwrap();
    let records: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    // The 400ms visit to b.example is below the significance threshold.
    assert_eq!(records.len(), 1, "unexpected output: {stdout}");
    assert_eq!(records[0]["userId"], "user-e2e");
    assert_eq!(records[0]["url"], "https://a.example/p1");
    assert_eq!(records[0]["title"], "A Example");
    assert_eq!(records[0]["timeSpentSeconds"], 1);
    assert_eq!(records[0]["closeTime"], "2025-01-29T12:00:09.500Z");
}

#[test]
fn test_init_then_replay_uses_stored_identity() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = dwell(temp.path(), &config).arg("init").output().unwrap();
    assert!(
        output.status.success(),
        "init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let init_stdout = String::from_utf8(output.stdout).unwrap();
    let user_id = init_stdout
        .lines()
        .find_map(|line| line.strip_prefix("User ID:"))
        .map(str::trim)
        .unwrap()
        .to_string();

    let events_path = temp.path().join("events.jsonl");
    std::fs::write(&events_path, SESSION).unwrap();

    let output = dwell(temp.path(), &config)
        .arg("replay")
        .arg("--input")
        .arg(&events_path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let record: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(record["userId"], user_id.as_str());
}

#[test]
fn test_replay_without_identity_sends_nothing() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let mut cmd = dwell(temp.path(), &config);
    cmd.arg("replay");
    let output = run_with_stdin(cmd, SESSION);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_replay_skips_malformed_lines() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let input = format!("garbage\n{{\"type\":\"activated\"}}\n{SESSION}");
    let mut cmd = dwell(temp.path(), &config);
    cmd.arg("replay").arg("--user-id").arg("user-e2e");
    let output = run_with_stdin(cmd, &input);

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().lines().count(), 1);
}

#[test]
fn test_status_reflects_config_and_identity() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = dwell(temp.path(), &config).arg("status").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Idle detection interval: 20s"));
    assert!(stdout.contains("not provisioned"));

    dwell(temp.path(), &config).arg("init").output().unwrap();
    let output = dwell(temp.path(), &config).arg("status").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("User ID: user-"));
}

#[test]
fn test_track_writes_handshake_first() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let mut cmd = dwell(temp.path(), &config);
    cmd.arg("track");
    let output = run_with_stdin(cmd, "");

    assert!(
        output.status.success(),
        "track failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    let handshake: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(handshake["type"], "configure");
    assert_eq!(handshake["idle_detection_interval_secs"], 20);
}
