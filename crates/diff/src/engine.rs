//! Comparer aggregation

use std::time::Duration;

use synthmon_common::RunRecord;
use tracing::debug;

use crate::comparer::{
    Comparer, DeclineReasonComparer, DurationComparer, StateComparer, StepsComparer, UrlComparer,
};
use crate::difference::DiffResult;

/// Knobs for the standard comparer set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Duration changes up to this much are not reported
    pub duration_tolerance: Duration,
    /// Leave out the run duration comparer and per-step durations
    pub ignore_durations: bool,
}

/// Runs comparers in order and concatenates their results
pub struct CompareEngine {
    comparers: Vec<Box<dyn Comparer>>,
}

impl Default for CompareEngine {
    fn default() -> Self {
        Self::with_options(CompareOptions::default())
    }
}

impl CompareEngine {
    /// Decline reason, state, URL, duration, then steps
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompareOptions) -> Self {
        let mut steps = StepsComparer::new().with_tolerance(options.duration_tolerance);
        let mut builder = Self::builder()
            .with(DeclineReasonComparer)
            .with(StateComparer)
            .with(UrlComparer);

        if options.ignore_durations {
            steps = steps.ignore_durations();
        } else {
            builder = builder.with(DurationComparer::with_tolerance(options.duration_tolerance));
        }

        builder.with(steps).build()
    }

    /// Start from an empty comparer set
    pub fn builder() -> CompareEngineBuilder {
        CompareEngineBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.comparers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comparers.is_empty()
    }

    /// Compare a baseline `a` with a candidate `b`
    pub fn compare(&self, a: &RunRecord, b: &RunRecord) -> DiffResult {
        let mut result = DiffResult::empty();
        for comparer in &self.comparers {
            let found = comparer.compare(a, b);
            if !found.is_empty() {
                debug!("{} comparer found {} difference(s)", comparer.facet(), found.len());
            }
            result.merge(found);
        }
        result
    }
}

#[derive(Default)]
pub struct CompareEngineBuilder {
    comparers: Vec<Box<dyn Comparer>>,
}

impl CompareEngineBuilder {
    pub fn with(mut self, comparer: impl Comparer + 'static) -> Self {
        self.comparers.push(Box::new(comparer));
        self
    }

    pub fn build(self) -> CompareEngine {
        CompareEngine {
            comparers: self.comparers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difference::Facet;
    use crate::testing::{record, step, Spec};
    use synthmon_common::Outcome;

    #[test]
    fn test_results_follow_comparer_order() {
        let a = record(
            Spec::default()
                .url("https://example.com/")
                .steps(vec![step("dns", Outcome::Succeeded, 10)]),
        );
        let b = record(
            Spec::default()
                .url("https://example.com/health")
                .declined("Target URL is missing"),
        );

        let result = CompareEngine::new().compare(&a, &b);
        let facets: Vec<_> = result.iter().map(|d| d.facet).collect();
        assert_eq!(
            facets,
            vec![Facet::DeclineReason, Facet::State, Facet::Url, Facet::Duration, Facet::Steps]
        );
    }

    #[test]
    fn test_ignore_durations_drops_duration_comparer() {
        let engine = CompareEngine::with_options(CompareOptions {
            ignore_durations: true,
            ..Default::default()
        });
        assert_eq!(engine.len(), 4);

        let a = record(Spec::default().steps(vec![step("dns", Outcome::Succeeded, 10)]));
        let b = record(Spec::default().steps(vec![step("dns", Outcome::Succeeded, 900)]));
        assert!(engine.compare(&a, &b).is_empty());
        assert_eq!(CompareEngine::new().compare(&a, &b).len(), 2);
    }

    #[test]
    fn test_custom_set() {
        let engine = CompareEngine::builder().with(UrlComparer).build();
        let a = record(Spec::default().steps(vec![step("dns", Outcome::Succeeded, 10)]));
        let b = record(Spec::default().steps(vec![step("dns", Outcome::Failed, 10)]));
        assert!(engine.compare(&a, &b).is_empty());
        assert!(CompareEngine::builder().build().is_empty());
    }
}
