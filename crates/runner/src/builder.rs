//! Run builder
//!
//! Accumulates step results and the shared property store for one run, then
//! frames them into an immutable [`RunRecord`]. Finalizing consumes the
//! builder, so nothing can be appended to a record once it exists.

use std::any::Any;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use synthmon_common::{
    lookup_step_property, record, Outcome, PropertyError, PropertyKey, PropertyStore,
    RecordError, RunDraft, RunRecord, StepError, StepKind, StepResult, StepTiming, Value,
};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::step::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Uninitialized,
    Initiated,
}

/// One result about to be appended to a run
#[derive(Debug, Clone)]
pub struct StepEntry {
    name: String,
    kind: StepKind,
    timing: StepTiming,
    outcome: Outcome,
    error: Option<StepError>,
    properties: PropertyStore,
}

impl StepEntry {
    pub fn succeeded<S: Step + ?Sized>(step: &S, timing: StepTiming) -> Self {
        Self::new(step.name(), step.kind(), timing, Outcome::Succeeded, None)
    }

    /// A classified failure
    pub fn failed<S: Step + ?Sized>(step: &S, timing: StepTiming, error: StepError) -> Self {
        Self::new(step.name(), step.kind(), timing, Outcome::Failed, Some(error))
    }

    /// An unexpected fault, wrapped into the same error shape. The alternate
    /// format is used so `anyhow` chains keep every cause.
    pub fn faulted<S: Step + ?Sized>(
        step: &S,
        timing: StepTiming,
        fault: impl fmt::Display,
    ) -> Self {
        Self::failed(step, timing, StepError::fault(format!("{:#}", fault)))
    }

    pub fn cancelled<S: Step + ?Sized>(step: &S, timing: StepTiming) -> Self {
        Self::failed(step, timing, StepError::cancelled())
    }

    /// Entry for a step that has no [`Step`] implementation
    pub fn new(
        name: impl Into<String>,
        kind: StepKind,
        timing: StepTiming,
        outcome: Outcome,
        error: Option<StepError>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            timing,
            outcome,
            error,
            properties: PropertyStore::new(),
        }
    }

    /// Attach a value to the step's private store
    pub fn with_property(mut self, key: PropertyKey, value: impl Into<Value>) -> Self {
        self.properties.set(key, value);
        self
    }

    pub fn with_transient<T: Any + Send + Sync>(mut self, key: PropertyKey, value: T) -> Self {
        self.properties.set_transient(key, value);
        self
    }

    pub fn with_properties(mut self, properties: PropertyStore) -> Self {
        self.properties.extend(properties);
        self
    }

    fn into_result(self) -> StepResult {
        StepResult::new(
            self.name,
            self.kind,
            self.timing,
            self.outcome,
            self.error,
            self.properties,
        )
    }
}

/// Mutable accumulator for one run
#[derive(Debug)]
pub struct RunBuilder {
    id: Uuid,
    state: BuilderState,
    url: Option<String>,
    started: Option<DateTime<Utc>>,
    reference_date: NaiveDate,
    steps: Vec<StepResult>,
    properties: PropertyStore,
}

impl Default for RunBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunBuilder {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: BuilderState::Uninitialized,
            url: None,
            started: None,
            reference_date: Utc::now().date_naive(),
            steps: Vec::new(),
            properties: PropertyStore::new(),
        }
    }

    /// Override the date runs must not start before (defaults to today, UTC)
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    /// Record the target and start time. Nothing is validated until
    /// [`validate`](Self::validate) or [`into_record`](Self::into_record).
    pub fn initiate(&mut self, url: Option<&str>, started: DateTime<Utc>) -> &mut Self {
        self.url = url.map(str::to_string);
        self.started = Some(started);
        self.state = BuilderState::Initiated;
        debug!("Run {} initiated for {:?}", self.id, self.url);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn started(&self) -> Option<DateTime<Utc>> {
        self.started
    }

    /// Check the framing invariants the final record will be held to
    pub fn validate(&self) -> Result<Url, RecordError> {
        record::frame(
            self.url.as_deref(),
            self.started.unwrap_or_else(Utc::now),
            self.reference_date,
        )
    }

    /// Append one step result
    pub fn record(&mut self, entry: StepEntry) -> &mut Self {
        match (&entry.outcome, &entry.error) {
            (Outcome::Failed, Some(error)) => {
                debug!("Step '{}' failed after {:?}: {}", entry.name, entry.timing.duration, error)
            }
            _ => debug!(
                "Step '{}' {} after {:?}",
                entry.name, entry.outcome, entry.timing.duration
            ),
        }
        self.steps.push(entry.into_result());
        self
    }

    /// Results recorded so far, in execution order
    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn failure_count(&self) -> usize {
        self.steps.iter().filter(|s| s.failed()).count()
    }

    /// Shared store for the whole run
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    /// Look a key up in the sub-stores of the steps recorded so far
    pub fn step_property<T: Any>(&self, key: &PropertyKey) -> Result<&T, PropertyError> {
        lookup_step_property(&self.steps, key)
    }

    /// Look a key up in the shared store first, then in step sub-stores
    pub fn property<T: Any>(&self, key: &PropertyKey) -> Result<&T, PropertyError> {
        if self.properties.contains(key) {
            self.properties.get(key)
        } else {
            self.step_property(key)
        }
    }

    /// Frame the run. Never fails: a run whose invariants do not hold comes
    /// back declined, with the violation as its reason.
    pub fn into_record(self) -> RunRecord {
        let id = self.id;
        let started = self.started.unwrap_or_else(Utc::now);
        let url = self.url.clone();
        let step_count = self.steps.len();

        let draft = RunDraft {
            id,
            url: self.url,
            started,
            reference_date: self.reference_date,
            steps: self.steps,
            properties: self.properties,
        };

        match RunRecord::try_new(draft) {
            Ok(record) => {
                info!(
                    "Run {} completed: {} step(s), {} failed, {:?}",
                    id,
                    step_count,
                    record.failures().count(),
                    record.duration()
                );
                record
            }
            Err(e) => {
                warn!("Run {} declined: {}", id, e);
                let url = url.as_deref().and_then(|u| Url::parse(u).ok());
                RunRecord::declined(id, url, started, e.to_string())
            }
        }
    }
}
