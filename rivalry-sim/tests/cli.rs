use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "rivalry-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_rivalry-sim");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("idempotent-retries"));
}

#[test]
fn cli_runs_smoke_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_rivalry-sim");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "smoke,retries",
            "--iterations",
            "1",
            "--weeks",
            "4",
            "--seeds",
            "1,0x2a",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Rivalry Season Simulator"));
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("\"scenario_name\": \"Smoke Test\""));
    assert!(content.contains("Idempotent Showdown Retries"));
}

#[test]
fn cli_rejects_a_bad_config_file() {
    let exe = env!("CARGO_BIN_EXE_rivalry-sim");
    let config_path = temp_path("config");
    std::fs::write(&config_path, "{ not json").expect("write config");
    let output = Command::new(exe)
        .args(["--report", "json", "--iterations", "1", "--config"])
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid engine config"));
}
