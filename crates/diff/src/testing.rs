//! Record fixtures for unit tests

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use synthmon_common::{
    Outcome, PropertyStore, RunDraft, RunRecord, StepError, StepKind, StepResult, StepTiming,
};
use url::Url;
use uuid::Uuid;

pub fn started() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn step(name: &str, outcome: Outcome, ms: u64) -> StepResult {
    let error = (outcome == Outcome::Failed).then(|| StepError::validation_failed("nope"));
    StepResult::new(
        name,
        StepKind::Action,
        StepTiming::new(started(), Duration::from_millis(ms)),
        outcome,
        error,
        PropertyStore::new(),
    )
}

pub struct Spec {
    url: String,
    declined: Option<String>,
    steps: Vec<StepResult>,
}

impl Default for Spec {
    fn default() -> Self {
        Self {
            url: "https://example.com/".to_string(),
            declined: None,
            steps: Vec::new(),
        }
    }
}

impl Spec {
    pub fn url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn declined(mut self, reason: &str) -> Self {
        self.declined = Some(reason.to_string());
        self
    }

    pub fn steps(mut self, steps: Vec<StepResult>) -> Self {
        self.steps = steps;
        self
    }
}

pub fn record(spec: Spec) -> RunRecord {
    let id = Uuid::new_v4();
    match spec.declined {
        Some(reason) => RunRecord::declined(id, Url::parse(&spec.url).ok(), started(), reason),
        None => RunRecord::try_new(RunDraft {
            id,
            url: Some(spec.url),
            started: started(),
            reference_date: started().date_naive(),
            steps: spec.steps,
            properties: PropertyStore::new(),
        })
        .unwrap(),
    }
}
