// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the flowdeck CLI commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::process::Output;
use tempfile::TempDir;

/// A flowdeck invocation isolated to a temporary data dir and config file
fn flowdeck(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("flowdeck").unwrap();
    cmd.env("FLOWDECK_DATA_DIR", data_dir.path())
        .env("FLOWDECK_CONFIG", data_dir.path().join("config.toml"))
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

/// Run flowdeck with the given arguments
fn run_flowdeck(data_dir: &TempDir, args: &[&str]) -> Output {
    flowdeck(data_dir).args(args).output().unwrap()
}

/// Helper to get stdout as string
fn stdout_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to get stderr as string
fn stderr_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Register two functions and wire them into `flow:quality`
fn seed_flow(data_dir: &TempDir) {
    flowdeck(data_dir)
        .args(["function", "add", "Lint", "--input", "code:string", "--output", "score:number"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fn:lint"));
    flowdeck(data_dir)
        .args(["function", "add", "Report", "--input", "summary:string", "--output", "ok:boolean"])
        .assert()
        .success();
    flowdeck(data_dir)
        .args(["flow", "create", "Quality"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flow:quality"));
    flowdeck(data_dir)
        .args(["node", "add", "--flow", "flow:quality", "fn:lint"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lint-1"));
    flowdeck(data_dir)
        .args(["node", "add", "--flow", "flow:quality", "fn:report", "--x", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("report-1"));
}

#[test]
fn test_flow_lifecycle() {
    let data_dir = TempDir::new().unwrap();
    seed_flow(&data_dir);

    // Without a cast the number -> string connection is refused
    let output = run_flowdeck(&data_dir, &[
        "edge", "add",
        "--flow", "flow:quality",
        "--from", "lint-1.score",
        "--to", "report-1.summary",
    ]);
    assert!(!output.status.success());
    assert!(stderr_str(&output).contains("Type mismatch"), "stderr: {}", stderr_str(&output));

    // With a cast it is accepted
    let output = run_flowdeck(&data_dir, &[
        "edge", "add",
        "--flow", "flow:quality",
        "--from", "lint-1.score",
        "--to", "report-1.summary",
        "--map", "score:summary:cast",
    ]);
    assert!(output.status.success(), "Failed to add edge: {}", stderr_str(&output));
    assert!(stdout_str(&output).contains("Created edge"));
    assert!(stdout_str(&output).contains("number->string"));

    flowdeck(&data_dir)
        .args(["validate", "--flow", "flow:quality"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Flow is valid"))
        .stdout(predicate::str::contains("lint-1 -> report-1"));

    // Run and pick the execution id from the first line
    let output = run_flowdeck(&data_dir, &["run", "--flow", "flow:quality"]);
    assert!(output.status.success(), "run failed: {}", stderr_str(&output));
    let stdout = stdout_str(&output);
    assert!(stdout.contains("succeeded"));
    let exec_id = stdout
        .split_whitespace()
        .find(|w| w.starts_with("exec:"))
        .expect("execution id in output")
        .to_string();

    flowdeck(&data_dir)
        .args(["logs", &exec_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Execution started for flow flow:quality"))
        .stdout(predicate::str::contains("[report-1] Running Report"));

    flowdeck(&data_dir)
        .args(["logs", &exec_id, "--node", "lint-1", "--level", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[lint-1]"))
        .stdout(predicate::str::contains("[report-1]").not());

    flowdeck(&data_dir)
        .args(["export", "--flow", "flow:quality", "--format", "dot"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph \"flow:quality\""))
        .stdout(predicate::str::contains("\"lint-1\":\"out_score\" -> \"report-1\":\"in_summary\""));
}

#[test]
fn test_logs_empty_and_missing() {
    let data_dir = TempDir::new().unwrap();
    std::fs::write(
        data_dir.path().join("executions.json"),
        r#"{
            "executions": [
                {
                    "id": "exec:000000000000",
                    "flowId": "flow:empty",
                    "status": "succeeded",
                    "startedAt": "2025-01-01T00:00:00Z",
                    "logs": []
                }
            ]
        }"#,
    )
    .unwrap();

    flowdeck(&data_dir)
        .args(["logs", "exec:000000000000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No logs available for execution exec:000000000000"));

    flowdeck(&data_dir)
        .args(["logs", "exec:missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Execution not found"));
}

#[test]
fn test_validate_reports_cycle() {
    let data_dir = TempDir::new().unwrap();
    flowdeck(&data_dir)
        .args(["function", "add", "Step", "--input", "in:any", "--output", "out:any"])
        .assert()
        .success();
    flowdeck(&data_dir).args(["flow", "create", "Loop"]).assert().success();
    for _ in 0..2 {
        flowdeck(&data_dir)
            .args(["node", "add", "--flow", "flow:loop", "fn:step"])
            .assert()
            .success();
    }
    for (from, to) in [("step-1.out", "step-2.in"), ("step-2.out", "step-1.in")] {
        flowdeck(&data_dir)
            .args(["edge", "add", "--flow", "flow:loop", "--from", from, "--to", to])
            .assert()
            .success();
    }

    flowdeck(&data_dir)
        .args(["validate", "--flow", "flow:loop"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("cycle"));

    flowdeck(&data_dir)
        .args(["run", "--flow", "flow:loop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle"));
}

#[test]
fn test_self_loop_rejected() {
    let data_dir = TempDir::new().unwrap();
    flowdeck(&data_dir)
        .args(["function", "add", "Step", "--input", "in:any", "--output", "out:any"])
        .assert()
        .success();
    flowdeck(&data_dir).args(["flow", "create", "Solo"]).assert().success();
    flowdeck(&data_dir)
        .args(["node", "add", "--flow", "flow:solo", "fn:step", "--id", "only"])
        .assert()
        .success();

    flowdeck(&data_dir)
        .args(["edge", "add", "--flow", "flow:solo", "--from", "only.out", "--to", "only.in"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid connection"));
}

#[test]
fn test_edge_add_again_updates_mappings() {
    let data_dir = TempDir::new().unwrap();
    flowdeck(&data_dir)
        .args(["function", "add", "Split", "--output", "parts:array", "--output", "count:number"])
        .assert()
        .success();
    flowdeck(&data_dir)
        .args(["function", "add", "Join", "--input", "parts:array", "--input", "label:string"])
        .assert()
        .success();
    flowdeck(&data_dir).args(["flow", "create", "Rewire"]).assert().success();
    for f in ["fn:split", "fn:join"] {
        flowdeck(&data_dir)
            .args(["node", "add", "--flow", "flow:rewire", f])
            .assert()
            .success();
    }
    let add = |maps: &[&str]| {
        let mut args = vec![
            "edge", "add", "--flow", "flow:rewire",
            "--from", "split-1.parts", "--to", "join-1.parts",
        ];
        for m in maps {
            args.extend(["--map", *m]);
        }
        run_flowdeck(&data_dir, &args)
    };

    let output = add(&["parts:parts"]);
    assert!(output.status.success(), "stderr: {}", stderr_str(&output));
    assert!(stdout_str(&output).contains("Created edge"));

    let output = add(&["parts:parts"]);
    assert!(stdout_str(&output).contains("Edge unchanged"));

    let output = add(&["parts:parts", "count:label:cast"]);
    assert!(output.status.success(), "stderr: {}", stderr_str(&output));
    assert!(stdout_str(&output).contains("Updated edge"));
    assert!(stdout_str(&output).contains("count->label (number->string)"));

    // Mappings that fail validation are refused and nothing changes
    let output = add(&["parts:missing"]);
    assert!(!output.status.success());

    let output = run_flowdeck(&data_dir, &["--json", "edge", "list", "--flow", "flow:rewire"]);
    let edges: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(edges.as_array().unwrap().len(), 1);
    let mappings = edges[0]["data"]["mappings"].as_array().unwrap();
    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[1]["target"], "label");
}

#[test]
fn test_node_removal_drops_edges() {
    let data_dir = TempDir::new().unwrap();
    seed_flow(&data_dir);
    flowdeck(&data_dir)
        .args([
            "edge", "add", "--flow", "flow:quality",
            "--from", "lint-1.score", "--to", "report-1.summary",
            "--map", "score:summary:cast",
        ])
        .assert()
        .success();

    flowdeck(&data_dir)
        .args(["node", "remove", "--flow", "flow:quality", "lint-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 connected edge(s)"));

    flowdeck(&data_dir)
        .args(["edge", "list", "--flow", "flow:quality"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No edges defined"));
}

#[test]
fn test_project_and_json_listing() {
    let data_dir = TempDir::new().unwrap();
    flowdeck(&data_dir)
        .args(["project", "add", "Core", "--description", "core checks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("project:core"));
    flowdeck(&data_dir)
        .args(["flow", "create", "Nightly", "--project", "project:core"])
        .assert()
        .success();
    flowdeck(&data_dir)
        .args(["flow", "create", "Orphan", "--project", "project:none"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project not found"));

    let output = run_flowdeck(&data_dir, &["--json", "flow", "list"]);
    assert!(output.status.success());
    let flows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(flows[0]["id"], "flow:nightly");
    assert_eq!(flows[0]["projectId"], "project:core");

    flowdeck(&data_dir)
        .args(["project", "remove", "project:core"])
        .assert()
        .success();
    let output = run_flowdeck(&data_dir, &["--json", "flow", "show", "flow:nightly"]);
    let flow: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(flow.get("projectId").is_none());
}

#[test]
fn test_config_roundtrip() {
    let data_dir = TempDir::new().unwrap();
    flowdeck(&data_dir)
        .args(["config", "log_level", "warn"])
        .assert()
        .success();
    flowdeck(&data_dir)
        .args(["config", "log_level"])
        .assert()
        .success()
        .stdout(predicate::str::diff("warn\n"));
    flowdeck(&data_dir)
        .args(["config", "colour", "true"])
        .assert()
        .failure();
}

#[test]
fn test_unknown_action() {
    let data_dir = TempDir::new().unwrap();
    flowdeck(&data_dir)
        .args(["function", "frobnicate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown action"));
}

#[test]
fn test_completions() {
    let data_dir = TempDir::new().unwrap();
    flowdeck(&data_dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flowdeck"));
}
