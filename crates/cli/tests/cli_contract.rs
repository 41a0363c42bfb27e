// Integration tests for the checkcell shell contract: exit codes and --json stdout.
//
// Every --json command must print exactly one JSON value on stdout.
// Settings are isolated per test through CHECKCELL_CONFIG.
//
// Run with: cargo test -p checkcell-cli --test cli_contract -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Command with settings pointed at a scratch directory.
fn checkcell(scratch: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_checkcell"));
    cmd.env("CHECKCELL_CONFIG", scratch.path().join("settings.json"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(scratch: &TempDir, args: &[&str]) -> Output {
    checkcell(scratch).args(args).output().expect("run checkcell")
}

fn budget() -> String {
    fixture("budget.json").to_string_lossy().to_string()
}

fn write(scratch: &TempDir, name: &str, contents: &str) -> String {
    let path = scratch.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

/// Assert stdout is a single, parseable JSON value.
fn assert_single_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");
    serde_json::from_str(trimmed).unwrap_or_else(|e| {
        panic!("stdout must be valid JSON.\nParse error: {}\nstdout:\n{}", e, trimmed)
    })
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn cell<'a>(report: &'a serde_json::Value, sheet: &str, reference: &str) -> &'a serde_json::Value {
    report["worksheets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == sheet)
        .and_then(|s| s["cells"].as_array().unwrap().iter().find(|c| c["ref"] == reference))
        .unwrap_or_else(|| panic!("no cell {reference} on {sheet}"))
}

// ===========================================================================
// checkcell show
// ===========================================================================

#[test]
fn show_renders_tables() {
    let scratch = TempDir::new().unwrap();
    let output = run(&scratch, &["show", &budget()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("status: all-errors\n"));
    assert!(stdout.contains("[Summary] *"));
    assert!(stdout.contains("[Inputs] *"));
    assert!(stdout.contains("12165*"));
    // Context inputs are shown as-is.
    assert!(stdout.contains("Rent"));
}

#[test]
fn show_json_shape() {
    let scratch = TempDir::new().unwrap();
    let output = run(&scratch, &["show", &budget(), "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report = assert_single_json(&output);
    assert_eq!(report["status"], "all-errors");
    assert!(report["isolated"].is_null());
    assert_eq!(report["width"], 3);
    assert_eq!(report["height"], 5);

    let names: Vec<_> = report["worksheets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Summary", "Inputs"]);

    let b2 = cell(&report, "Summary", "Summary!B2");
    assert_eq!(b2["kind"], "output");
    assert_eq!(b2["value"], "12165");
    assert_eq!(b2["status"], "error");
    assert_eq!(b2["formula"], "=SUM(Inputs!B2:B4)");

    let b4 = cell(&report, "Inputs", "Inputs!B4");
    assert_eq!(b4["rankable"], false);
    assert_eq!(b4["erroneous"], false);
}

#[test]
fn show_isolate_applies_override() {
    let scratch = TempDir::new().unwrap();
    let output = run(&scratch, &["show", &budget(), "--isolate", "Inputs!B3", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report = assert_single_json(&output);
    assert_eq!(report["status"], "all-but-one-error");
    assert_eq!(report["isolated"], "Inputs!B3");
    assert_eq!(report["worksheets"][0]["erroneous"], false);
    assert_eq!(report["worksheets"][1]["erroneous"], true);

    let b2 = cell(&report, "Summary", "Summary!B2");
    assert_eq!(b2["value"], "12065");
    assert_eq!(b2["status"], "custom");
    assert_eq!(cell(&report, "Inputs", "Inputs!B3")["value"], "650");
    assert_eq!(cell(&report, "Inputs", "Inputs!B2")["value"], "12000");
}

#[test]
fn show_sheet_filter() {
    let scratch = TempDir::new().unwrap();
    let output = run(&scratch, &["show", &budget(), "--sheet", "Inputs", "--json"]);
    assert!(output.status.success());
    let report = assert_single_json(&output);
    assert_eq!(report["worksheets"].as_array().unwrap().len(), 1);

    let output = run(&scratch, &["show", &budget(), "--sheet", "inputs"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("invalid worksheet: inputs"));
}

#[test]
fn show_rejects_context_isolation() {
    let scratch = TempDir::new().unwrap();
    let output = run(&scratch, &["show", &budget(), "--isolate", "Inputs!B4"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Inputs!B4 is not a rankable input"));
    assert!(output.stdout.is_empty());
}

#[test]
fn show_status_usage_errors() {
    let scratch = TempDir::new().unwrap();

    let output = run(&scratch, &["show", &budget(), "--status", "some-errors"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("invalid status: some-errors"));

    let output = run(&scratch, &["show", &budget(), "--status", "all-but-one-error"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("requires --isolate"));

    let output = run(&scratch, &["show", &budget(), "--status", "no-errors", "--isolate", "Inputs!B2"]);
    assert_eq!(output.status.code(), Some(2));

    let output = run(&scratch, &["show", &budget(), "--isolate", "B2"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("invalid cell reference"));
}

#[test]
fn show_uses_configured_initial_status() {
    let scratch = TempDir::new().unwrap();
    write(
        &scratch,
        "settings.json",
        r#"{ "display.initialStatus": "no-errors", "display.showFormulas": true }"#,
    );

    let output = run(&scratch, &["show", &budget(), "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let report = assert_single_json(&output);
    assert_eq!(report["status"], "no-errors");
    assert_eq!(cell(&report, "Summary", "Summary!B2")["value"], "1950");

    // Flags win over settings.
    let output = run(&scratch, &["show", &budget(), "--status", "all-errors", "--json"]);
    let report = assert_single_json(&output);
    assert_eq!(report["status"], "all-errors");
}

// ===========================================================================
// checkcell inputs
// ===========================================================================

#[test]
fn inputs_lists_rankable_cells() {
    let scratch = TempDir::new().unwrap();
    let output = run(&scratch, &["inputs", &budget(), "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let inputs = assert_single_json(&output);
    let inputs = inputs.as_array().unwrap();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0]["ref"], "Inputs!B2");
    assert_eq!(inputs[0]["showing_error"], true);
    assert_eq!(inputs[0]["dependents"][1]["ref"], "Summary!B3");
    assert_eq!(inputs[0]["dependents"][1]["noerr"], "162.5");

    let output = run(&scratch, &["inputs", &budget()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Inputs!B2  1200 -> 12000\n    Summary!B2  1950\n"));
}

// ===========================================================================
// checkcell rank
// ===========================================================================

#[test]
fn rank_accepts_complete_ranking() {
    let scratch = TempDir::new().unwrap();
    let ranking = write(
        &scratch,
        "ranking.json",
        r#"{ "ranked": [ { "x": 2, "y": 3, "worksheet": "Inputs" } ],
             "unimportant": [ { "x": 2, "y": 2, "worksheet": "Inputs" } ] }"#,
    );

    let output = run(&scratch, &["rank", &budget(), &ranking, "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let result = assert_single_json(&output);
    assert_eq!(result["ranked"][0]["y"], 3);
    assert_eq!(result["unimportant"][0]["y"], 2);

    let output = run(&scratch, &["rank", &budget(), &ranking]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("ranking accepted: 1 ranked, 1 unimportant\n"));
}

#[test]
fn rank_incomplete_exits_3() {
    let scratch = TempDir::new().unwrap();
    let ranking = write(
        &scratch,
        "ranking.json",
        r#"{ "ranked": [ { "x": 2, "y": 2, "worksheet": "Inputs" } ], "unimportant": [] }"#,
    );

    let output = run(&scratch, &["rank", &budget(), &ranking, "--json"]);
    assert_eq!(output.status.code(), Some(3));
    let err = assert_single_json(&output);
    assert_eq!(err["missing"][0]["worksheet"], "Inputs");
    assert_eq!(err["missing"][0]["y"], 3);
    assert!(stderr(&output).contains("unranked: Inputs!B3"));
}

// ===========================================================================
// Bad input files
// ===========================================================================

#[test]
fn malformed_question_exits_4() {
    let scratch = TempDir::new().unwrap();
    let question = write(&scratch, "q.json", r#"{ "errors": [ "#);
    let output = run(&scratch, &["show", &question]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("question parse error"));
}

#[test]
fn dangling_dependency_exits_5() {
    let scratch = TempDir::new().unwrap();
    let question = write(
        &scratch,
        "q.json",
        r#"{ "errors": [ { "x": 1, "y": 1, "worksheet": "s", "orig": "1", "err": "2",
                           "outputs": [ { "x": 3, "y": 3, "worksheet": "s", "noerr": "5" } ] } ],
             "outputs": [] }"#,
    );
    let output = run(&scratch, &["inputs", &question]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("never declared as an output"));
}

#[test]
fn out_of_range_coordinate_exits_5() {
    let scratch = TempDir::new().unwrap();
    let question = write(
        &scratch,
        "q.json",
        r#"{ "errors": [ { "x": 0, "y": 0, "worksheet": "s", "orig": "1", "err": "2" } ],
             "outputs": [ { "x": 18446744073709551615, "y": 1, "worksheet": "s", "orig": "1", "err": "2" } ] }"#,
    );
    let output = run(&scratch, &["show", &question]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("is outside A1:XFD1048576"));
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_file_is_usage_error() {
    let scratch = TempDir::new().unwrap();
    let missing = scratch.path().join("nope.json");
    let output = run(&scratch, &["show", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("cannot read"));
}

// ===========================================================================
// checkcell config
// ===========================================================================

#[test]
fn config_init_writes_settings() {
    let scratch = TempDir::new().unwrap();
    let output = run(&scratch, &["config", "--init"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let settings = assert_single_json(&output);
    assert_eq!(settings["display.initialStatus"], "all-errors");
    assert_eq!(settings["engine.maxChainedTransitions"], 16);

    let written = std::fs::read_to_string(scratch.path().join("settings.json")).unwrap();
    assert!(written.contains("\"display.columnWidth\": 12"));
}
