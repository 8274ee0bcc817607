use std::time::Duration;

use chrono::{TimeZone, Utc};
use synthmon_common::codec::{self, Format};
use synthmon_common::{
    keys, Outcome, PropertyStore, RunDraft, RunRecord, StepError, StepKind, StepResult,
    StepTiming,
};
use synthmon_diff::{
    CompareEngine, DiffReport, DifferenceKind, DurationComparer, Facet, RunReport, Style,
};
use test_case::test_case;
use uuid::Uuid;

fn nightly(url: &str, http_outcome: Outcome) -> RunRecord {
    let started = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
    let mut dns_props = PropertyStore::new();
    dns_props.set(keys::DNS_ADDRESSES, vec!["93.184.216.34".to_string()]);
    dns_props.set_transient(keys::HTTP_BODY, vec![0u8; 16]);

    let error = (http_outcome == Outcome::Failed).then(|| StepError::new("unreachable", "503"));
    let steps = vec![
        StepResult::new(
            "dns",
            StepKind::Action,
            StepTiming::new(started, Duration::from_millis(12)),
            Outcome::Succeeded,
            None,
            dns_props,
        ),
        StepResult::new(
            "http",
            StepKind::Action,
            StepTiming::new(started, Duration::from_millis(180)),
            http_outcome,
            error,
            PropertyStore::new(),
        ),
    ];

    let mut shared = PropertyStore::new();
    shared.set(keys::HTTP_STATUS, 200u16);

    RunRecord::try_new(RunDraft {
        id: Uuid::new_v4(),
        url: Some(url.to_string()),
        started,
        reference_date: started.date_naive(),
        steps,
        properties: shared,
    })
    .expect("fixture is a valid run")
}

/// A record read back from disk compares equal to the one that was written,
/// even though transient values did not survive.
#[test_case(Format::Xml ; "xml")]
#[test_case(Format::Binary ; "binary")]
fn decoded_record_matches_original(format: Format) {
    let original = nightly("https://example.com/", Outcome::Succeeded);
    let bytes = codec::encode(&original, format).unwrap();
    let decoded = codec::decode(&bytes, format).unwrap();

    let result = CompareEngine::new().compare(&original, &decoded);
    assert!(result.is_empty(), "unexpected differences: {:?}", result);
    assert!(decoded.steps()[0].properties().try_get::<Vec<u8>>(&keys::HTTP_BODY).is_none());
}

/// A regression in one step and a moved target both show up in the report.
#[test]
fn regression_is_reported() {
    let baseline = nightly("https://example.com/", Outcome::Succeeded);
    let candidate = nightly("https://example.com/v2", Outcome::Failed);

    let result = CompareEngine::new().compare(&baseline, &candidate);
    let summary: Vec<_> = result.iter().map(|d| (d.facet, d.kind)).collect();
    assert_eq!(
        summary,
        vec![(Facet::Url, DifferenceKind::Changed), (Facet::Steps, DifferenceKind::Changed)]
    );

    let report = DiffReport::new(&result).render(Style::Plain);
    assert!(report.contains("http outcome changed: succeeded → failed [unreachable] 503"));
    assert!(report.ends_with("2 difference(s)\n"));
}

/// Step durations near the top of the range saturate instead of overflowing
/// the run total.
#[test]
fn huge_decoded_durations_are_compared_and_shown() {
    let started = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
    let huge = StepTiming::new(started, Duration::from_secs(u64::MAX / 2 + 1));
    let steps = ["render", "settle"]
        .into_iter()
        .map(|name| {
            let props = PropertyStore::new();
            StepResult::new(name, StepKind::Action, huge, Outcome::Succeeded, None, props)
        })
        .collect();
    let record = RunRecord::try_new(RunDraft {
        id: Uuid::new_v4(),
        url: Some("https://example.com/".to_string()),
        started,
        reference_date: started.date_naive(),
        steps,
        properties: PropertyStore::new(),
    })
    .unwrap();

    let bytes = codec::encode(&record, Format::Binary).unwrap();
    let decoded = codec::decode(&bytes, Format::Binary).unwrap();
    assert_eq!(decoded.duration(), Duration::MAX);

    let baseline = nightly("https://example.com/", Outcome::Succeeded);
    let durations = CompareEngine::builder()
        .with(DurationComparer::new())
        .build()
        .compare(&baseline, &decoded);
    assert_eq!(durations.len(), 1);

    let shown = RunReport::new(&decoded).render(Style::Plain);
    assert!(shown.contains("render"));
}
