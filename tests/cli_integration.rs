//! CLI integration tests for reader
//!
//! These tests drive the binary through the line protocol on stdin and
//! through `exec`, checking that gating and stats hold across commands.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command instance for the reader binary, isolated from user config
fn reader_cmd(dir: &TempDir) -> assert_cmd::Command {
    let config = dir.path().join("config.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }

    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("reader"));
    cmd.current_dir(dir.path())
        .env("READER_CONFIG", &config)
        .env_remove("READER_DB");
    cmd
}

/// Same as [`reader_cmd`] with an explicit database in the temp dir
fn reader_db_cmd(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = reader_cmd(dir);
    cmd.arg("--db").arg(dir.path().join("books.db"));
    cmd
}

// =============================================================================
// Protocol Scenarios
// =============================================================================

#[test]
fn test_prerequisite_scenario() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .write_stdin(
            "add_chapter Algebra Ch1 80\n\
             add_chapter Algebra Ch2 50\n\
             add_prerequisite_chapter Algebra Ch2 Ch1\n\
             read Algebra Ch2 60\n\
             stats Algebra\n\
             read Algebra Ch1 80\n\
             read Algebra Ch2 60\n\
             stats Algebra\n\
             end\n",
        )
        .assert()
        .success()
        .stdout("0 of 2\n2 of 2\n");
}

#[test]
fn test_stats_counts_only_completed_chapters() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .write_stdin(
            "add_chapter Physics Ch1 50\n\
             add_chapter Physics Ch2 50\n\
             add_chapter Physics Ch3 90\n\
             read Physics Ch1 50\n\
             read Physics Ch3 89\n\
             stats Physics\n\
             end\n",
        )
        .assert()
        .success()
        .stdout("1 of 3\n");
}

#[test]
fn test_stats_for_unknown_book() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .write_stdin("stats Nothing\nend\n")
        .assert()
        .success()
        .stdout("0 of 0\n");
}

#[test]
fn test_remove_missing_prerequisite_is_silent() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .write_stdin(
            "add_chapter Algebra Ch1 80\n\
             add_chapter Algebra Ch2 50\n\
             remove_prerequisite_chapter Algebra Ch2 Ch1\n\
             end\n",
        )
        .assert()
        .success()
        .stdout("")
        .stderr("");
}

#[test]
fn test_lines_after_end_are_ignored() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .write_stdin("add_chapter Algebra Ch1 80\nend\nstats Algebra\n")
        .assert()
        .success()
        .stdout("");
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_unknown_command_is_reported() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .write_stdin("add_chapter Algebra Ch1 80\nskim Algebra Ch1\nstats Algebra\nend\n")
        .assert()
        .failure()
        .stdout("0 of 1\n")
        .stderr(predicate::str::contains("Unknown command: 'skim'"))
        .stderr(predicate::str::contains("1 of 3 command(s) failed"));
}

#[test]
fn test_invalid_utf8_line_does_not_stop_the_loop() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .write_stdin(&b"add_chapter Algebra Ch1 80\nread Algebra \xff 90\nread Algebra Ch1 90\nstats Algebra\nend\n"[..])
        .assert()
        .failure()
        .stdout("1 of 1\n")
        .stderr(predicate::str::contains("invalid UTF-8"))
        .stderr(predicate::str::contains("1 of 4 command(s) failed"));
}

#[test]
fn test_invalid_percent_is_reported() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .args(["exec", "add_chapter", "Algebra", "Ch1", "120"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 0 and 100"));

    reader_db_cmd(&dir)
        .args(["exec", "stats", "Algebra"])
        .assert()
        .success()
        .stdout("0 of 0\n");
}

#[test]
fn test_wrong_argument_count_is_reported() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .args(["exec", "read", "Algebra", "Ch1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read <book> <chapter> <percent>"));
}

// =============================================================================
// Exec, Persistence and Output
// =============================================================================

#[test]
fn test_exec_persists_between_runs() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .args(["exec", "add_chapter", "Algebra", "Ch1", "80"])
        .assert()
        .success()
        .stdout("");

    reader_db_cmd(&dir)
        .args(["exec", "read", "Algebra", "Ch1", "95"])
        .assert()
        .success();

    reader_db_cmd(&dir)
        .args(["exec", "stats", "Algebra"])
        .assert()
        .success()
        .stdout("1 of 1\n");

    assert!(dir.path().join("books.db").is_file());
}

#[test]
fn test_default_database_in_working_directory() {
    let dir = TempDir::new().unwrap();

    reader_cmd(&dir)
        .write_stdin("add_chapter Algebra Ch1 80\nend\n")
        .assert()
        .success();

    assert!(dir.path().join("Reader.db").is_file());
}

#[test]
fn test_config_database_is_used() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("configured.db");
    fs::write(
        dir.path().join("config.toml"),
        format!("database = {:?}\n", db_path.display().to_string()),
    )
    .unwrap();

    reader_cmd(&dir)
        .args(["exec", "add_chapter", "Algebra", "Ch1", "80"])
        .assert()
        .success();

    assert!(db_path.is_file());
    assert!(!dir.path().join("Reader.db").exists());
}

#[test]
fn test_verbose_reports_rejections() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .arg("--verbose")
        .write_stdin(
            "add_chapter Algebra Ch1 80\n\
             add_chapter Algebra Ch2 50\n\
             add_prerequisite_chapter Algebra Ch2 Ch1\n\
             read Algebra Ch2 60\n\
             end\n",
        )
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains(
            "[verbose:read] rejected: 'Ch2' is locked until completed: Ch1",
        ));
}

#[test]
fn test_json_format() {
    let dir = TempDir::new().unwrap();

    let output = reader_db_cmd(&dir)
        .args(["--format", "json"])
        .write_stdin(
            "add_chapter Algebra Ch1 80\n\
             add_chapter Algebra Ch2 50\n\
             add_prerequisite_chapter Algebra Ch2 Ch2\n\
             stats Algebra\n\
             end\n",
        )
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["command"], "add_chapter");
    assert_eq!(lines[0]["status"], "applied");
    assert_eq!(lines[2]["status"], "rejected");
    assert_eq!(lines[2]["reason"]["kind"], "self_prerequisite");
    assert_eq!(lines[3]["response"], "stats");
    assert_eq!(lines[3]["completed"], 0);
    assert_eq!(lines[3]["total"], 2);
}

#[test]
fn test_chapters_listing() {
    let dir = TempDir::new().unwrap();

    reader_db_cmd(&dir)
        .write_stdin(
            "add_chapter Algebra Advanced 50\n\
             add_chapter Algebra Basics 50\n\
             add_prerequisite_chapter Algebra Advanced Basics\n\
             read Algebra Basics 100\n\
             chapters Algebra\n\
             end\n",
        )
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)\[x\]\s+Basics.*\[ \]\s+Advanced").unwrap());
}

#[test]
fn test_commands_lists_protocol() {
    let dir = TempDir::new().unwrap();

    reader_cmd(&dir)
        .arg("commands")
        .assert()
        .success()
        .stdout(predicate::str::contains("add_prerequisite_chapter <book> <chapter> <prerequisite>"));
}
