use chrono::{TimeZone, Utc};
use metacheck::analyze::analyze_offline;
use metacheck::evidence::{build_repo_document, RepoDocument};
use metacheck::record::ExtractionRecord;
use std::path::Path;

const DEFAULT_LICENSE: &str = "https://spdx.org/licenses/MIT";

fn document(fixture: &str) -> RepoDocument {
    let path = Path::new("tests/fixtures/corpus").join(fixture);
    let record = ExtractionRecord::from_path(&path).unwrap();
    let report = analyze_offline(&record, "repo");
    build_repo_document(
        &record,
        &report,
        Utc.with_ymd_and_hms(2025, 2, 11, 9, 5, 0).unwrap(),
        DEFAULT_LICENSE,
    )
}

#[test]
fn assessed_software_comes_from_the_record() {
    let doc = document("output_1.json");
    assert_eq!(doc.name, "Quality Assessment for acme/dirty-tool");
    assert_eq!(doc.description, "Toolkit for cleaning survey data.");
    assert_eq!(doc.assessed_software.name, "acme/dirty-tool");
    assert_eq!(doc.assessed_software.software_version, "v1.2.0");
    assert_eq!(doc.assessed_software.url, "https://github.com/acme/dirty-tool");
    assert_eq!(
        doc.assessed_software.identifier.as_ref().map(|i| i.id.as_str()),
        Some("https://doi.org/10.5281/zenodo.1234567")
    );
    assert_eq!(doc.date_created, "2025-02-11T09:05:00Z");
}

#[test]
fn local_license_path_falls_back_to_default_license() {
    assert_eq!(document("output_1.json").license.id, DEFAULT_LICENSE);
}

#[test]
fn spdx_license_is_mapped_to_its_iri() {
    assert_eq!(
        document("output_2.json").license.id,
        "https://spdx.org/licenses/MIT"
    );
}

#[test]
fn checks_follow_catalogue_order() {
    let doc = document("output_1.json");
    let ids: Vec<&str> = doc.checks.iter().map(|c| c.check_id.as_str()).collect();
    for expected in ["P001", "W003", "P008", "P016", "P024", "P026", "W030"] {
        assert!(ids.contains(&expected), "missing {expected} in {ids:?}");
    }
    let numbers: Vec<u32> = ids.iter().map(|id| id[1..].parse().unwrap()).collect();
    assert!(numbers.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn evidence_names_the_offending_values() {
    let doc = document("output_1.json");
    let evidence = |code: &str| {
        doc.checks
            .iter()
            .find(|c| c.check_id == code)
            .map(|c| c.evidence.clone())
            .unwrap()
    };
    assert_eq!(
        evidence("P001"),
        "Pitfall P001 detected: codemeta.json version '1.0.0' does not match release version 'v1.2.0'"
    );
    assert!(evidence("W030").starts_with("Warning W030 detected: "));
    assert!(evidence("P016").contains("homepage"));
    assert!(evidence("P024").contains("10.5281/zenodo.1234567"));
}

#[test]
fn clean_record_has_no_checks() {
    let doc = document("output_2.json");
    assert!(doc.checks.is_empty());
    assert_eq!(doc.assessed_software.software_version, "v0.3.0");
    assert_eq!(doc.assessed_software.identifier, None);
}
