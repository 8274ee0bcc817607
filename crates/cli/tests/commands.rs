use std::path::Path;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use synthmon_cli::commands::{compare, convert};
use synthmon_common::codec::{self, Format};
use synthmon_common::{
    keys, Outcome, PropertyStore, RunDraft, RunRecord, StepKind, StepResult, StepTiming,
};
use synthmon_diff::{CompareOptions, Facet};
use tempfile::TempDir;
use uuid::Uuid;

fn record(http_ms: u64) -> RunRecord {
    let started = Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap();
    let mut http_props = PropertyStore::new();
    http_props.set(keys::HTTP_STATUS, 200u16);

    RunRecord::try_new(RunDraft {
        id: Uuid::new_v4(),
        url: Some("https://example.com/login".to_string()),
        started,
        reference_date: started.date_naive(),
        steps: vec![StepResult::new(
            "http",
            StepKind::Action,
            StepTiming::new(started, Duration::from_millis(http_ms)),
            Outcome::Succeeded,
            None,
            http_props,
        )],
        properties: PropertyStore::new(),
    })
    .expect("fixture is a valid run")
}

fn write(dir: &Path, name: &str, record: &RunRecord) -> std::path::PathBuf {
    let path = dir.join(name);
    codec::write_file(&path, record).unwrap();
    path
}

/// Converting between formats keeps the record intact.
#[test]
fn convert_xml_to_msgpack() {
    let tmp = TempDir::new().unwrap();
    let xml = write(tmp.path(), "run.xml", &record(120));
    let msgpack = tmp.path().join("out").join("run.msgpack");

    let format = convert::convert(&xml, &msgpack, false).unwrap();
    assert_eq!(format, Format::Binary);

    let result = compare::compare_files(&xml, &msgpack, CompareOptions::default()).unwrap();
    assert!(result.is_empty(), "conversion changed the record: {:?}", result);
}

#[test]
fn convert_refuses_to_overwrite() {
    let tmp = TempDir::new().unwrap();
    let xml = write(tmp.path(), "run.xml", &record(120));
    let bin = write(tmp.path(), "run.bin", &record(120));

    assert!(convert::convert(&xml, &bin, false).is_err());
    assert!(convert::convert(&xml, &bin, true).is_ok());
}

#[test]
fn convert_rejects_unknown_extension() {
    let tmp = TempDir::new().unwrap();
    let xml = write(tmp.path(), "run.xml", &record(120));

    let err = convert::convert(&xml, &tmp.path().join("run.json"), false).unwrap_err();
    assert!(err.to_string().contains("run.json"));
}

/// Slower candidate shows up as duration changes unless within tolerance.
#[test]
fn compare_files_applies_tolerance() {
    let tmp = TempDir::new().unwrap();
    let baseline = write(tmp.path(), "baseline.xml", &record(120));
    let candidate = write(tmp.path(), "candidate.msgpack", &record(150));

    let strict = compare::compare_files(&baseline, &candidate, CompareOptions::default()).unwrap();
    let facets: Vec<_> = strict.iter().map(|d| d.facet).collect();
    assert_eq!(facets, vec![Facet::Duration, Facet::Steps]);

    let tolerant = CompareOptions {
        duration_tolerance: Duration::from_millis(50),
        ..Default::default()
    };
    assert!(compare::compare_files(&baseline, &candidate, tolerant).unwrap().is_empty());
}

#[test]
fn compare_reports_missing_file() {
    let tmp = TempDir::new().unwrap();
    let baseline = write(tmp.path(), "baseline.xml", &record(120));

    let absent = tmp.path().join("absent.xml");
    let err = compare::compare_files(&baseline, &absent, CompareOptions::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.xml"));
}
