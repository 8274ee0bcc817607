//! MessagePack encoding of run records

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::CodecError;
use crate::property::{PropertyKey, PropertyStore, Value};
use crate::record::{RunRecord, StepResult};
use crate::types::{Outcome, RunState, StepError, StepKind, StepTiming};

// Field order is the wire order; rmp-serde writes structs as arrays.

#[derive(Serialize, Deserialize)]
struct PersistedRun {
    id: Uuid,
    url: Option<String>,
    started: DateTime<Utc>,
    state: RunState,
    decline_reason: Option<String>,
    properties: Option<Vec<(PropertyKey, Value)>>,
    steps: Vec<PersistedStep>,
}

#[derive(Serialize, Deserialize)]
struct PersistedStep {
    name: String,
    kind: StepKind,
    started: DateTime<Utc>,
    duration: Duration,
    outcome: Outcome,
    error: Option<StepError>,
    properties: Vec<(PropertyKey, Value)>,
}

fn persist(store: &PropertyStore) -> Vec<(PropertyKey, Value)> {
    store
        .persistent()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub(super) fn write(record: &RunRecord) -> Result<Vec<u8>, CodecError> {
    let run = PersistedRun {
        id: record.id,
        url: record.url.as_ref().map(|u| u.to_string()),
        started: record.started,
        state: record.state,
        decline_reason: record.decline_reason.clone(),
        properties: record.properties.as_ref().map(persist),
        steps: record
            .steps
            .iter()
            .map(|s| PersistedStep {
                name: s.name().to_string(),
                kind: s.kind(),
                started: s.started(),
                duration: s.duration(),
                outcome: s.outcome(),
                error: s.error().cloned(),
                properties: persist(s.properties()),
            })
            .collect(),
    };

    Ok(rmp_serde::to_vec(&run)?)
}

pub(super) fn read(bytes: &[u8]) -> Result<RunRecord, CodecError> {
    let run: PersistedRun = rmp_serde::from_slice(bytes)?;

    let url = run
        .url
        .map(|u| Url::parse(&u).map_err(|e| CodecError::invalid("url", e)))
        .transpose()?;

    let steps = run
        .steps
        .into_iter()
        .map(|s| {
            StepResult::new(
                s.name,
                s.kind,
                StepTiming::new(s.started, s.duration),
                s.outcome,
                s.error,
                s.properties.into_iter().collect(),
            )
        })
        .collect();

    Ok(RunRecord {
        id: run.id,
        url,
        started: run.started,
        state: run.state,
        steps,
        properties: run.properties.map(|p| p.into_iter().collect()),
        decline_reason: run.decline_reason,
    })
}
