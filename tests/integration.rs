use assert_cmd::Command;
use predicates::prelude::*;

const DIRTY: &str = "tests/fixtures/corpus/output_1.json";
const CLEAN: &str = "tests/fixtures/corpus/output_2.json";

fn metacheck() -> Command {
    assert_cmd::cargo::cargo_bin_cmd!("metacheck")
}

#[test]
fn analyze_dirty_record_reports_pitfalls() {
    metacheck()
        .args(["analyze", DIRTY, "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P008"))
        .stdout(predicate::str::contains("PITFALLS FOUND"));
}

#[test]
fn analyze_strict_fails_on_findings() {
    metacheck()
        .args(["analyze", DIRTY, "--offline", "--strict"])
        .assert()
        .code(1);
}

#[test]
fn analyze_clean_record_passes_strict() {
    metacheck()
        .args(["analyze", CLEAN, "--offline", "--strict"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CLEAN"));
}

#[test]
fn analyze_json_format() {
    metacheck()
        .args(["analyze", DIRTY, "--offline", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"repository_id\": \"output_1\""))
        .stdout(predicate::str::contains("\"summary\""));
}

#[test]
fn analyze_jsonld_format() {
    metacheck()
        .args(["analyze", DIRTY, "--offline", "--format", "jsonld"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"@type\": \"SoftwareQualityAssessment\""))
        .stdout(predicate::str::contains("\"checkId\": \"P016\""));
}

#[test]
fn analyze_sarif_format() {
    metacheck()
        .args(["analyze", DIRTY, "--offline", "--format", "sarif"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\": \"2.1.0\""))
        .stdout(predicate::str::contains("\"ruleId\": \"P001\""));
}

#[test]
fn analyze_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.json");
    metacheck()
        .args(["analyze", DIRTY, "--offline", "--format", "json", "--output"])
        .arg(&out)
        .assert()
        .success();
    let text = std::fs::read_to_string(&out).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["findings"].as_array().unwrap().len(), 30);
}

#[test]
fn analyze_missing_file_exits_2() {
    metacheck()
        .args(["analyze", "tests/fixtures/does-not-exist.json", "--offline"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn analyze_unparseable_record_exits_2() {
    metacheck()
        .args(["analyze", "tests/fixtures/corpus/broken.json", "--offline"])
        .assert()
        .code(2);
}

#[test]
fn missing_config_exits_2() {
    metacheck()
        .args(["analyze", CLEAN, "--config", "tests/fixtures/nope.toml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn scan_writes_documents_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let pitfalls = dir.path().join("pitfalls");
    let summary = dir.path().join("summary.json");

    metacheck()
        .args(["scan", "tests/fixtures/corpus", "--offline", "--pitfalls-dir"])
        .arg(&pitfalls)
        .arg("--summary")
        .arg(&summary)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 analyzed"))
        .stdout(predicate::str::contains("1 unreadable"));

    assert!(pitfalls.join("output_1_pitfalls.jsonld").is_file());
    assert!(!pitfalls.join("output_2_pitfalls.jsonld").exists());

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(doc["summary"]["total_repositories_analyzed"], 2);
    assert_eq!(doc["summary"]["individual_jsonld_files_created"], 1);
    assert_eq!(doc["summary"]["unreadable_files"], 1);
}

#[test]
fn scan_strict_fails_when_any_repository_has_findings() {
    let dir = tempfile::tempdir().unwrap();
    metacheck()
        .args(["scan", "tests/fixtures/corpus", "--offline", "--strict", "--jobs", "1"])
        .arg("--pitfalls-dir")
        .arg(dir.path().join("p"))
        .arg("--summary")
        .arg(dir.path().join("s.json"))
        .assert()
        .code(1);
}

#[test]
fn scan_json_format_prints_corpus_document() {
    let dir = tempfile::tempdir().unwrap();
    metacheck()
        .args(["scan", "tests/fixtures/corpus", "--offline", "--format", "json"])
        .arg("--pitfalls-dir")
        .arg(dir.path().join("p"))
        .arg("--summary")
        .arg(dir.path().join("s.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pitfalls & warnings\""))
        .stdout(predicate::str::contains("\"warning_code\": \"W030\""));
}

#[test]
fn scan_missing_directory_exits_2() {
    metacheck()
        .args(["scan", "tests/fixtures/no-such-dir", "--offline"])
        .assert()
        .code(2);
}

#[test]
fn list_rules_shows_catalogue() {
    metacheck()
        .arg("list-rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("P001"))
        .stdout(predicate::str::contains("W031"))
        .stdout(predicate::str::contains("Total: 30 rules"));
}

#[test]
fn explain_known_rule() {
    metacheck()
        .args(["explain", "p008"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P008"))
        .stdout(predicate::str::contains("Suggestion"));
}

#[test]
fn explain_unknown_rule_exits_2() {
    metacheck()
        .args(["explain", "P999"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown rule"));
}

#[test]
fn check_tools_reports_extractor() {
    metacheck()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("somef"));
}

#[test]
fn extract_requires_a_source() {
    metacheck().arg("extract").assert().failure();
}
