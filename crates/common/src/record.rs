//! Immutable step results and run records

use std::any::Any;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::property::{PropertyError, PropertyKey, PropertyStore};
use crate::types::{Outcome, RunState, StepError, StepKind, StepTiming};

/// Invariant violations found while framing a run record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Target URL is missing")]
    MissingUrl,

    #[error("Target URL '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Run start {started} is before the reference date {reference}")]
    StartedBeforeReferenceDate {
        started: DateTime<Utc>,
        reference: NaiveDate,
    },

    #[error("Step '{step}' started at {started}, before the reference date {reference}")]
    StepStartedBeforeReferenceDate {
        step: String,
        started: DateTime<Utc>,
        reference: NaiveDate,
    },
}

/// Check the framing invariants of a run and return the parsed target
pub fn frame(
    url: Option<&str>,
    started: DateTime<Utc>,
    reference: NaiveDate,
) -> Result<Url, RecordError> {
    let raw = url.ok_or(RecordError::MissingUrl)?;
    let url = Url::parse(raw).map_err(|e| RecordError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if started.date_naive() < reference {
        return Err(RecordError::StartedBeforeReferenceDate { started, reference });
    }

    Ok(url)
}

/// Result of one executed step
#[derive(Debug, Clone)]
pub struct StepResult {
    name: String,
    kind: StepKind,
    timing: StepTiming,
    outcome: Outcome,
    error: Option<StepError>,
    properties: PropertyStore,
}

impl StepResult {
    pub fn new(
        name: impl Into<String>,
        kind: StepKind,
        timing: StepTiming,
        outcome: Outcome,
        error: Option<StepError>,
        properties: PropertyStore,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            timing,
            outcome,
            error,
            properties,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.timing.started
    }

    pub fn duration(&self) -> Duration {
        self.timing.duration
    }

    pub fn timing(&self) -> StepTiming {
        self.timing
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Succeeded
    }

    pub fn failed(&self) -> bool {
        self.outcome == Outcome::Failed
    }

    pub fn error(&self) -> Option<&StepError> {
        self.error.as_ref()
    }

    /// Properties scoped to this step
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }
}

/// Look a key up across step sub-stores in execution order. The first step
/// holding the key decides the result, even if its value has another type.
pub fn lookup_step_property<'a, T: Any>(
    steps: &'a [StepResult],
    key: &PropertyKey,
) -> Result<&'a T, PropertyError> {
    steps
        .iter()
        .find(|s| s.properties.contains(key))
        .map(|s| s.properties.get::<T>(key))
        .unwrap_or_else(|| Err(PropertyError::NotFound { key: key.clone() }))
}

/// Everything a run accumulated before it is framed into a record
#[derive(Debug, Clone)]
pub struct RunDraft {
    pub id: Uuid,
    pub url: Option<String>,
    pub started: DateTime<Utc>,
    pub reference_date: NaiveDate,
    pub steps: Vec<StepResult>,
    pub properties: PropertyStore,
}

/// Finalized, read-only outcome of one pipeline execution
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub(crate) id: Uuid,
    pub(crate) url: Option<Url>,
    pub(crate) started: DateTime<Utc>,
    pub(crate) state: RunState,
    pub(crate) steps: Vec<StepResult>,
    pub(crate) properties: Option<PropertyStore>,
    pub(crate) decline_reason: Option<String>,
}

impl RunRecord {
    /// Frame a completed record, enforcing every construction invariant
    pub fn try_new(draft: RunDraft) -> Result<Self, RecordError> {
        let url = frame(draft.url.as_deref(), draft.started, draft.reference_date)?;

        let reference = draft.reference_date;
        if let Some(early) = draft.steps.iter().find(|s| s.started().date_naive() < reference) {
            return Err(RecordError::StepStartedBeforeReferenceDate {
                step: early.name.clone(),
                started: early.started(),
                reference,
            });
        }

        Ok(Self {
            id: draft.id,
            url: Some(url),
            started: draft.started,
            state: RunState::Completed,
            steps: draft.steps,
            properties: Some(draft.properties),
            decline_reason: None,
        })
    }

    /// A record for a run that could not be framed. It carries no steps and
    /// no property store.
    pub fn declined(
        id: Uuid,
        url: Option<Url>,
        started: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id,
            url,
            started,
            state: RunState::Declined,
            steps: Vec::new(),
            properties: None,
            decline_reason: Some(reason.into()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn properties(&self) -> Option<&PropertyStore> {
        self.properties.as_ref()
    }

    pub fn decline_reason(&self) -> Option<&str> {
        self.decline_reason.as_deref()
    }

    pub fn is_declined(&self) -> bool {
        self.state == RunState::Declined
    }

    /// At least one step ran and none failed
    pub fn is_valid(&self) -> bool {
        !self.steps.is_empty() && !self.steps.iter().any(StepResult::failed)
    }

    /// Sum of step durations, zero without steps. Saturates at
    /// `Duration::MAX`.
    pub fn duration(&self) -> Duration {
        self.steps
            .iter()
            .fold(Duration::ZERO, |total, s| total.saturating_add(s.duration()))
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| s.failed())
    }

    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// See [`lookup_step_property`]
    pub fn step_property<T: Any>(&self, key: &PropertyKey) -> Result<&T, PropertyError> {
        lookup_step_property(&self.steps, key)
    }
}
