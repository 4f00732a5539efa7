// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::process::Command;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("zube-cli-{}-{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).ok();
    }
    dir
}

fn run_script(script: &str, out: &PathBuf, extra: &[&str]) -> (Option<i32>, serde_json::Value) {
    let script = repo_root().join("configs/bench").join(script);
    let output = Command::new(env!("CARGO_BIN_EXE_zube"))
        .arg("test")
        .arg("--script")
        .arg(&script)
        .arg("--output-dir")
        .arg(out)
        .args(extra)
        .output()
        .expect("Failed to execute zube");

    let json = std::fs::read_to_string(out.join("result.json")).unwrap_or_else(|e| {
        panic!(
            "result.json missing ({}). Stdout: {}",
            e,
            String::from_utf8_lossy(&output.stdout)
        )
    });
    (output.status.code(), serde_json::from_str(&json).unwrap())
}

#[test]
fn test_ping_script_passes() {
    let out = scratch_dir("ping");
    let (code, result) = run_script("ping.yaml", &out, &[]);

    assert_eq!(code, Some(0), "result: {}", result);
    assert_eq!(result["status"], "pass");
    assert_eq!(result["stop_reason"], "completed");
    assert_eq!(result["base_address"], 0x81);
    assert_eq!(
        result["reset_pulse"],
        serde_json::json!(["high", "low", "high"])
    );
    let exchanges = result["exchanges"].as_array().unwrap();
    assert_eq!(exchanges.len(), 10);
    assert_eq!(exchanges[3]["sent"]["data"], 3);
    assert_eq!(exchanges[3]["data_reply"], 0xFC);
    assert_eq!(exchanges[3]["control_reply"], 0xFB);
    assert!(result["assertions"]
        .as_array()
        .unwrap()
        .iter()
        .all(|a| a["passed"] == true));

    std::fs::remove_dir_all(&out).ok();
}

#[test]
fn test_wrong_port_script_expects_floating_bus() {
    let out = scratch_dir("wrong-port");
    let (code, result) = run_script("wrong_port.yaml", &out, &[]);

    assert_eq!(code, Some(0), "result: {}", result);
    assert_eq!(result["stop_reason"], "bus_floating");
    assert!(result["message"].as_str().unwrap().contains("0x40"));

    std::fs::remove_dir_all(&out).ok();
}

#[test]
fn test_vcd_generation() {
    let out = scratch_dir("vcd");
    let vcd_path = out.join("bridge.vcd");
    let (code, _) = run_script("ping.yaml", &out, &["--vcd", vcd_path.to_str().unwrap()]);
    assert_eq!(code, Some(0));

    let content = std::fs::read_to_string(&vcd_path).expect("Failed to read VCD");
    assert!(content.contains("$timescale"), "VCD header missing");
    assert!(content.contains("reset_b"));
    assert!(content.contains("$var wire 4"), "status wire missing");

    std::fs::remove_dir_all(&out).ok();
}

#[test]
fn test_vcd_parent_directories_are_created() {
    let out = scratch_dir("vcd-nested");
    let vcd_path = out.join("traces").join("run1").join("bridge.vcd");
    let (code, result) = run_script("ping.yaml", &out, &["--vcd", vcd_path.to_str().unwrap()]);
    assert_eq!(code, Some(0), "result: {}", result);
    assert!(vcd_path.is_file(), "VCD not written to {:?}", vcd_path);

    std::fs::remove_dir_all(&out).ok();
}

#[test]
fn test_vcd_write_failure_is_runtime_error() {
    let out = scratch_dir("vcd-fail");
    // A directory where the trace file should go.
    let vcd_path = out.join("bridge.vcd");
    std::fs::create_dir_all(&vcd_path).unwrap();

    let (code, result) = run_script("ping.yaml", &out, &["--vcd", vcd_path.to_str().unwrap()]);
    assert_eq!(code, Some(3), "result: {}", result);
    assert_eq!(result["status"], "error");
    assert!(result["message"].as_str().unwrap().contains("VCD"));

    std::fs::remove_dir_all(&out).ok();
}

#[test]
fn test_invalid_script_is_config_error() {
    let out = scratch_dir("bad-script");
    std::fs::create_dir_all(&out).unwrap();
    let script = out.join("bad.yaml");
    std::fs::write(&script, "schema_version: \"2.0\"\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_zube"))
        .args(["test", "--script"])
        .arg(&script)
        .arg("--output-dir")
        .arg(&out)
        .output()
        .expect("Failed to execute zube");
    assert_eq!(output.status.code(), Some(2));

    let json = std::fs::read_to_string(out.join("result.json")).unwrap();
    let result: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(result["stop_reason"], "config_error");
    assert_eq!(result["status"], "error");

    std::fs::remove_dir_all(&out).ok();
}

#[test]
fn test_failed_assertion_exit_code() {
    let out = scratch_dir("assert-fail");
    std::fs::create_dir_all(&out).unwrap();
    let script = out.join("fail.yaml");
    std::fs::write(
        &script,
        "schema_version: \"1.0\"\nexchanges:\n  - { data: 1, control: 2 }\nassertions:\n  - base_address: 0x42\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_zube"))
        .args(["test", "--script"])
        .arg(&script)
        .arg("--output-dir")
        .arg(&out)
        .output()
        .expect("Failed to execute zube");
    assert_eq!(output.status.code(), Some(1));

    std::fs::remove_dir_all(&out).ok();
}

#[test]
fn test_run_pings() {
    let output = Command::new(env!("CARGO_BIN_EXE_zube"))
        .args(["run", "--pings", "4"])
        .output()
        .expect("Failed to execute zube");
    assert!(
        output.status.success(),
        "stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("ping run finished"));
}
