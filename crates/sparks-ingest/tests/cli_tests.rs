//! End-to-end tests for the sparks-ingest binary
//!
//! Sheets are read from a directory of exported CSV files so no network is
//! needed.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const STRUCTURE: &str = ",,,Stage,Unit,Title,Tracks\n,,,Badge,1,Intro,7,8\n";
const DATA: &str = "track,file_name\n7,Welcome\n";

const RANKS: [&str; 3] = ["hangglider", "wingrunner", "skystormer"];

/// Write all six sheets under the ids and tab that [`sparks`] configures
fn write_sheets(dir: &Path, skip_rank: Option<&str>) {
    for rank in RANKS {
        if Some(rank) == skip_rank {
            continue;
        }
        std::fs::write(dir.join(format!("{}-structure.csv", rank)), STRUCTURE).unwrap();
        std::fs::write(dir.join(format!("{}-data__tracks.csv", rank)), DATA).unwrap();
    }
}

fn sparks() -> Command {
    let mut cmd = Command::cargo_bin("sparks-ingest").unwrap();
    for rank in RANKS {
        let upper = rank.to_uppercase();
        cmd.env(format!("SPARKS_{}_STRUCTURE_ID", upper), format!("{}-structure", rank))
            .env_remove(format!("SPARKS_{}_STRUCTURE_TAB", upper))
            .env(format!("SPARKS_{}_DATA_ID", upper), format!("{}-data", rank))
            .env(format!("SPARKS_{}_DATA_TAB", upper), "tracks");
    }
    cmd.env("LOG_LEVEL", "warn").env_remove("SPARKS_LOCAL_DIR");
    cmd
}

// ============================================================================
// Fetch Tests
// ============================================================================

#[test]
fn test_fetch_writes_json_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    write_sheets(dir.path(), None);

    let mut cmd = sparks();
    cmd.arg("fetch")
        .arg("--compact")
        .arg("--local-dir")
        .arg(dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"rawCount\":3"))
        .stdout(predicate::str::contains("\"id\":\"badge\""))
        .stdout(predicate::str::contains("\"title\":\"Track 8\""))
        .stdout(predicate::str::contains("tracks/skystormer/7.mp3"));
}

#[test]
fn test_fetch_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    write_sheets(dir.path(), None);
    let output = dir.path().join("out/library.json");

    sparks()
        .arg("fetch")
        .arg("--local-dir")
        .arg(dir.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(value["ranks"].as_array().unwrap().len(), 3);
    assert_eq!(value["rawCount"], 3);
}

#[test]
fn test_fetch_missing_sheet_writes_empty_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_sheets(dir.path(), Some("skystormer"));

    sparks()
        .arg("fetch")
        .arg("--compact")
        .arg("--local-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("{\"ranks\":[],\"rawCount\":0}"))
        .stderr(predicate::str::contains("no content available"));
}

// ============================================================================
// Progress Tests
// ============================================================================

#[test]
fn test_progress_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("progress.json");

    sparks()
        .args(["progress", "--file"])
        .arg(&file)
        .args(["update", "7", "95", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(completed)"));

    sparks()
        .args(["progress", "--file"])
        .arg(&file)
        .args(["toggle-unit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unit 1 completed"));

    let store: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(store["tracks"]["7"]["isCompleted"], true);
    assert_eq!(store["completedUnits"][0], "1");

    sparks()
        .args(["progress", "--file"])
        .arg(&file)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("7"));
}

#[test]
fn test_progress_rejects_negative_position() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("progress.json");

    sparks()
        .args(["progress", "--file"])
        .arg(&file)
        .args(["update", "7", "--", "-5", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid progress value"));
    assert!(!file.exists());
}

#[test]
fn test_unknown_rank_is_rejected() {
    sparks()
        .args(["mirror", "--output", "out", "--rank", "eagle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown rank"));
}
