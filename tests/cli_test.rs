//! Binary-level tests for the devgraph-export command line.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use devgraph_export::core::Properties;
use devgraph_export::graph::KIND_DEVICE;
use devgraph_export::{Relation, SqliteGraph};
use predicates::prelude::*;
use tempfile::TempDir;

fn devgraph() -> Command {
    let mut cmd = Command::cargo_bin("devgraph-export").expect("binary exists");
    cmd.env_remove("DEVGRAPH_DB_PATH")
        .env_remove("DEVGRAPH_CONTEXT")
        .env_remove("DEVGRAPH_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

fn seeded_store(temp_dir: &TempDir) -> std::path::PathBuf {
    let db_path = temp_dir.path().join("graph.db");
    let mut graph = SqliteGraph::create(&db_path).expect("create failed");
    let ctx = graph.add_context("Network").expect("add_context failed");
    let mut props = Properties::new();
    props.insert("name".to_string(), "router".into());
    let device = graph
        .add_node(KIND_DEVICE, None, &props)
        .expect("add_node failed");
    graph
        .relate(ctx, device, Relation::HasDevice)
        .expect("relate failed");
    db_path
}

#[test]
fn test_help() {
    devgraph()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("export"));
}

#[test]
fn test_export_requires_context() {
    devgraph()
        .arg("export")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--context"));
}

#[test]
fn test_window_json() {
    devgraph()
        .args(["window", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"start\"").and(predicate::str::contains("\"end\"")));
}

#[test]
fn test_export_to_stdout() {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = seeded_store(&temp_dir);

    devgraph()
        .arg("--db-path")
        .arg(&db_path)
        .args(["export", "--context", "Network", "--output", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"router\""))
        .stdout(predicate::str::contains("\"endpoints\": []"));
}

#[test]
fn test_export_from_env() {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = seeded_store(&temp_dir);
    let output = temp_dir.path().join("export.json");

    devgraph()
        .env("DEVGRAPH_DB_PATH", &db_path)
        .env("DEVGRAPH_CONTEXT", "Network")
        .env("DEVGRAPH_OUTPUT", &output)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export successful"));

    let text = std::fs::read_to_string(output).expect("read output");
    assert!(text.contains("router"));
}

#[test]
fn test_missing_store_exits_nonzero() {
    let temp_dir = TempDir::new().expect("temp dir");

    devgraph()
        .arg("--db-path")
        .arg(temp_dir.path().join("absent.db"))
        .args(["export", "--context", "Network", "--output", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
