//! Integration tests for the engagedash CLI
//!
//! These tests run the built binary against a temporary raw file and cache
//! directory. They verify that commands work end-to-end without mocking.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const RAW: &str = "\
gender,NationalITy,PlaceofBirth,StageID,GradeID,SectionID,Topic,Semester,Relation,raisedhands,VisITedResources,AnnouncementsView,Discussion,ParentAnsweringSurvey,ParentschoolSatisfaction,StudentAbsenceDays,Class
M,KW,KuwaIT,lowerlevel,G-04,A,IT,F,Father,15,16,2,20,Yes,Good,Under-7,M
M,KW,KuwaIT,lowerlevel,G-04,A,IT,F,Father,20,20,3,25,Yes,Good,Under-7,M
F,lebanon,lebanon,MiddleSchool,G-07,A,Math,S,Mum,80,90,50,40,Yes,Good,Under-7,H
M,Jordan,Jordan,MiddleSchool,G-07,B,Math,S,Mum,5,3,0,10,No,Bad,Above-7,L
F,Jordan,Jordan,HighSchool,G-10,A,English,F,Father,50,60,40,30,Yes,Good,Under-7,H
M,KW,KuwaIT,lowerlevel,G-02,B,English,S,Father,2,1,1,5,No,Bad,Above-7,L
";

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("raw.csv"), RAW).expect("write raw");
        Self { dir }
    }

    fn raw(&self) -> PathBuf {
        self.dir.path().join("raw.csv")
    }

    fn processed_dir(&self) -> PathBuf {
        self.dir.path().join("processed")
    }

    /// Run engagedash with this environment's raw file and cache directory
    fn run(&self, args: &[&str]) -> Output {
        run_in(self.dir.path(), args, &self.raw(), &self.processed_dir())
    }
}

fn run_in(cwd: &Path, args: &[&str], raw: &Path, processed: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_engagedash"))
        .args(args)
        .current_dir(cwd)
        .env("ENGAGEDASH_RAW_PATH", raw)
        .env("ENGAGEDASH_PROCESSED_DIR", processed)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute engagedash")
}

/// Helper to get stdout as string
fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to get stderr as string
fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_str(&stdout(output)).expect("summary --json should print JSON")
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_engagedash"))
        .arg("--help")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("engagedash"));
    assert!(out.contains("summary"));
    assert!(out.contains("serve"));
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_engagedash"))
        .arg("--version")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("engagedash"));
}

// =============================================================================
// Shell Completion Tests
// =============================================================================

#[test]
fn test_completion_zsh() {
    let output = Command::new(env!("CARGO_BIN_EXE_engagedash"))
        .args(["completion", "zsh"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success(), "completion zsh failed: {}", stderr(&output));
    assert!(stdout(&output).contains("#compdef engagedash"));
}

#[test]
fn test_completion_bash() {
    let output = Command::new(env!("CARGO_BIN_EXE_engagedash"))
        .args(["completion", "bash"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("_engagedash"));
}

// =============================================================================
// Prepare / cache
// =============================================================================

#[test]
fn test_prepare_writes_cache_and_manifest() {
    let env = Env::new();
    let output = env.run(&["prepare"]);
    assert!(output.status.success(), "prepare failed: {}", stderr(&output));
    assert!(stderr(&output).contains("derived from raw data"));

    let cache = env.processed_dir().join("xapi_edu_processed.csv");
    let contents = fs::read_to_string(&cache).expect("cache written");
    let header = contents.lines().next().unwrap_or_default();
    assert!(header.ends_with("engagement_score,class_ordinal"));
    assert!(contents.contains("Under_7"));
    assert!(env.processed_dir().join("xapi_edu_processed.meta.json").exists());

    let again = env.run(&["prepare"]);
    assert!(again.status.success());
    assert!(stderr(&again).contains("reused cache"));
}

#[test]
fn test_raw_change_invalidates_cache() {
    let env = Env::new();
    assert!(env.run(&["prepare"]).status.success());

    fs::write(env.raw(), format!("{}F,KW,KuwaIT,lowerlevel,G-04,A,IT,F,Mum,9,9,9,9,Yes,Good,Under-7,M\n", RAW)).unwrap();
    let output = env.run(&["prepare"]);
    assert!(stderr(&output).contains("7 rows (derived from raw data)"));
}

#[test]
fn test_missing_raw_file_is_fatal() {
    let env = Env::new();
    let missing = env.dir.path().join("nope.csv");
    let output = run_in(env.dir.path(), &["summary"], &missing, &env.processed_dir());
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("nope.csv"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_raw_flag_overrides_env() {
    let env = Env::new();
    let other = env.dir.path().join("other.csv");
    fs::write(&other, "Topic,raisedhands,Class\nMath,4,H\n").unwrap();
    let output = env.run(&["summary", "--json", "--raw", other.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(json(&output)["kpis"]["students"], 1);
}

// =============================================================================
// Summary
// =============================================================================

#[test]
fn test_summary_text() {
    let env = Env::new();
    let output = env.run(&["summary"]);
    assert!(output.status.success(), "summary failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Student Engagement Summary"));
    assert!(out.contains("6 of 6"));
    assert!(out.contains("Medium"));
}

#[test]
fn test_summary_json() {
    let env = Env::new();
    let output = env.run(&["summary", "--json"]);
    assert!(output.status.success());
    let body = json(&output);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["kpis"]["students"], 6);
    assert_eq!(body["charts"].as_array().map(Vec::len), Some(4));
    // Two of six students were absent 7+ days
    let share = body["kpis"]["absence_above_7_share"].as_f64().unwrap();
    assert!((share - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_summary_with_filters() {
    let env = Env::new();
    let output = env.run(&["summary", "--json", "-f", "topic=Math", "--filter", "class=H"]);
    assert!(output.status.success());
    let body = json(&output);
    assert_eq!(body["kpis"]["students"], 1);
    assert_eq!(body["kpis"]["most_common_topic"], "Math");
}

#[test]
fn test_summary_filter_values_use_raw_spelling() {
    let env = Env::new();
    let output = env.run(&["summary", "--json", "-f", "absence=Under-7", "-f", "class=high"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let body = json(&output);
    assert_eq!(body["kpis"]["students"], 2);
    assert_eq!(body["kpis"]["most_common_class"], "H");
}

#[test]
fn test_summary_no_matches_warns() {
    let env = Env::new();
    let output = env.run(&["summary", "-f", "topic=Math", "-f", "stage=HighSchool"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("No data matches the selected filters"));
    assert!(!stdout(&output).contains("Student Engagement Summary"));
}

#[test]
fn test_summary_unknown_filter() {
    let env = Env::new();
    let output = env.run(&["summary", "-f", "colour=red"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unknown filter 'colour'"));
}

#[test]
fn test_summary_malformed_filter() {
    let env = Env::new();
    let output = env.run(&["summary", "-f", "topic"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("FIELD=VALUE"));
}

// =============================================================================
// Report
// =============================================================================

#[test]
fn test_report_writes_html() {
    let env = Env::new();
    let out = env.dir.path().join("dash.html");
    let output = env.run(&["report", "-o", out.to_str().unwrap(), "-f", "semester=F"]);
    assert!(output.status.success(), "report failed: {}", stderr(&output));

    let html = fs::read_to_string(&out).expect("report written");
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("\"status\":\"ready\""));
    assert!(html.contains("\"students\":3"));
}
