use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const DATASHEET_MD: &str = "\
# GTM Module

The Generic Timer Module (GTM) ensures precise timing. It triggers the ADC.

# ADC Module

The Analog-Digital Converter (ADC) receives triggers from GTM.
";

#[allow(deprecated)]
fn cli(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("datasheet-graph").expect("binary");
    cmd.current_dir(workdir)
        .env_remove("DATASHEET_GRAPH_PATH")
        .arg("--quiet");
    cmd
}

#[test]
fn build_then_query_uses_default_graph_file() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("tc38x.md"), DATASHEET_MD).unwrap();

    let output = cli(temp.path())
        .args(["build", "tc38x.md"])
        .output()
        .expect("build run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Graph built successfully! Saved to datasheet_graph.gml"));
    assert!(stdout.contains("(5 nodes, 4 edges)"), "{stdout}");
    assert!(temp.path().join("datasheet_graph.gml").exists());

    let output = cli(temp.path())
        .args(["query", "GTM"])
        .output()
        .expect("query run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("=== Graph RAG Context ==="));
    assert!(stdout.contains("[Entity: SEC:GTM Module]"));
    assert!(stdout.contains("  --[CONTAINS]--> SEC:ADC Module"));
}

#[test]
#[allow(deprecated)]
fn default_logging_keeps_stderr_quiet() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("tc38x.md"), DATASHEET_MD).unwrap();

    let output = Command::cargo_bin("datasheet-graph")
        .expect("binary")
        .current_dir(temp.path())
        .env_remove("DATASHEET_GRAPH_PATH")
        .env_remove("RUST_LOG")
        .args(["build", "tc38x.md"])
        .output()
        .expect("build run");
    assert!(output.status.success());
    assert!(
        output.stderr.is_empty(),
        "unexpected log output: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = Command::cargo_bin("datasheet-graph")
        .expect("binary")
        .current_dir(temp.path())
        .env_remove("DATASHEET_GRAPH_PATH")
        .env_remove("RUST_LOG")
        .args(["--verbose", "build", "tc38x.md"])
        .output()
        .expect("build run");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Built document graph"));
}

#[test]
fn graph_path_from_environment_and_flag() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("tc38x.md"), DATASHEET_MD).unwrap();

    cli(temp.path())
        .env("DATASHEET_GRAPH_PATH", "env.gml")
        .args(["build", "tc38x.md"])
        .assert()
        .success();
    assert!(temp.path().join("env.gml").exists());

    cli(temp.path())
        .args(["--graph", "flag.gml", "build", "tc38x.md"])
        .assert()
        .success();
    assert!(temp.path().join("flag.gml").exists());

    let output = cli(temp.path())
        .args(["stats", "--graph", "flag.gml"])
        .output()
        .expect("stats run");
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(stats["nodes"], 5);
    assert_eq!(stats["sections"], 2);
    assert_eq!(stats["contents"], 2);
    assert_eq!(stats["relations"]["CONTAINS"], 2);
    assert_eq!(stats["relations"]["HAS"], 2);
}

#[test]
fn query_without_graph_prints_guidance() {
    let temp = tempdir().unwrap();
    let output = cli(temp.path())
        .args(["query", "GTM"])
        .output()
        .expect("query run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim_end(),
        "Graph not found. Run 'build_datasheet_graph' first."
    );
}

#[test]
fn build_failures_exit_non_zero() {
    let temp = tempdir().unwrap();

    let output = cli(temp.path())
        .args(["build", "absent.md"])
        .output()
        .expect("build run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: File not found at absent.md"));

    fs::write(temp.path().join("sheet.pdf"), b"%PDF-1.7").unwrap();
    let output = cli(temp.path())
        .args(["build", "sheet.pdf"])
        .output()
        .expect("build run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Build failed: Unsupported document format"));
    assert!(!temp.path().join("datasheet_graph.gml").exists());
}

#[test]
fn stats_without_graph_fails() {
    let temp = tempdir().unwrap();
    cli(temp.path()).arg("stats").assert().failure();
}
