//! Facet comparers
//!
//! Each comparer looks at exactly one facet of two records. Equal facets give
//! an empty result, a facet missing on one side gives `Added`/`Removed`, and
//! anything else gives `Changed` with both values.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use synthmon_common::{RunRecord, StepResult};

use crate::difference::{DiffResult, Difference, Facet};

pub trait Comparer: Send + Sync {
    fn facet(&self) -> Facet;

    /// `a` is the baseline, `b` the candidate
    fn compare(&self, a: &RunRecord, b: &RunRecord) -> DiffResult;
}

/// Durations render with full precision so sub-millisecond changes stay visible
pub(crate) fn format_duration(d: Duration) -> String {
    format!("{:?}", d)
}

fn beyond(a: Duration, b: Duration, tolerance: Duration) -> bool {
    let delta = if a > b { a - b } else { b - a };
    delta > tolerance
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineReasonComparer;

impl Comparer for DeclineReasonComparer {
    fn facet(&self) -> Facet {
        Facet::DeclineReason
    }

    fn compare(&self, a: &RunRecord, b: &RunRecord) -> DiffResult {
        Difference::between(
            self.facet(),
            self.facet().label(),
            a.decline_reason().map(str::to_string),
            b.decline_reason().map(str::to_string),
        )
        .into()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateComparer;

impl Comparer for StateComparer {
    fn facet(&self) -> Facet {
        Facet::State
    }

    fn compare(&self, a: &RunRecord, b: &RunRecord) -> DiffResult {
        Difference::between(
            self.facet(),
            self.facet().label(),
            Some(a.state().to_string()),
            Some(b.state().to_string()),
        )
        .into()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UrlComparer;

impl Comparer for UrlComparer {
    fn facet(&self) -> Facet {
        Facet::Url
    }

    fn compare(&self, a: &RunRecord, b: &RunRecord) -> DiffResult {
        Difference::between(
            self.facet(),
            self.facet().label(),
            a.url().map(|u| u.to_string()),
            b.url().map(|u| u.to_string()),
        )
        .into()
    }
}

/// Total run duration. A run without steps counts as zero, so this comparer
/// only ever reports `Changed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationComparer {
    tolerance: Duration,
}

impl DurationComparer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore changes no larger than `tolerance`
    pub fn with_tolerance(tolerance: Duration) -> Self {
        Self { tolerance }
    }
}

impl Comparer for DurationComparer {
    fn facet(&self) -> Facet {
        Facet::Duration
    }

    fn compare(&self, a: &RunRecord, b: &RunRecord) -> DiffResult {
        let (da, db) = (a.duration(), b.duration());
        if !beyond(da, db, self.tolerance) {
            return DiffResult::empty();
        }
        Some(Difference::changed(
            self.facet(),
            self.facet().label(),
            format_duration(da),
            format_duration(db),
        ))
        .into()
    }
}

/// Per-step outcome and duration.
///
/// Steps are matched by name and occurrence, so the second `http` step of one
/// run is compared with the second `http` step of the other.
#[derive(Debug, Clone, Copy)]
pub struct StepsComparer {
    tolerance: Duration,
    durations: bool,
}

impl Default for StepsComparer {
    fn default() -> Self {
        Self {
            tolerance: Duration::ZERO,
            durations: true,
        }
    }
}

impl StepsComparer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Compare outcomes only
    pub fn ignore_durations(mut self) -> Self {
        self.durations = false;
        self
    }
}

/// Display label for the `occurrence`-th step called `name`
fn step_label(name: &str, occurrence: usize) -> String {
    if occurrence == 0 {
        name.to_string()
    } else {
        format!("{}#{}", name, occurrence + 1)
    }
}

fn keyed(steps: &[StepResult]) -> Vec<((&str, usize), &StepResult)> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    steps
        .iter()
        .map(|step| {
            let count = seen.entry(step.name()).or_insert(0);
            let key = (step.name(), *count);
            *count += 1;
            (key, step)
        })
        .collect()
}

fn describe(step: &StepResult) -> String {
    match step.error() {
        Some(error) => format!("{} {}", step.outcome(), error),
        None => step.outcome().to_string(),
    }
}

impl Comparer for StepsComparer {
    fn facet(&self) -> Facet {
        Facet::Steps
    }

    fn compare(&self, a: &RunRecord, b: &RunRecord) -> DiffResult {
        let facet = self.facet();
        let left = keyed(a.steps());
        let right = keyed(b.steps());
        let right_index: HashMap<_, _> = right.iter().map(|(key, step)| (*key, *step)).collect();

        let mut result = DiffResult::empty();

        for (key, step) in &left {
            let label = step_label(key.0, key.1);
            let Some(other) = right_index.get(key) else {
                result.push(Difference::removed(facet, label, describe(step)));
                continue;
            };

            if step.outcome() != other.outcome() {
                result.push(Difference::changed(
                    facet,
                    format!("{} outcome", label),
                    describe(step),
                    describe(other),
                ));
            } else if let Some(diff) = Difference::between(
                facet,
                format!("{} error", label),
                step.error().map(ToString::to_string),
                other.error().map(ToString::to_string),
            ) {
                result.push(diff);
            }

            if self.durations && beyond(step.duration(), other.duration(), self.tolerance) {
                result.push(Difference::changed(
                    facet,
                    format!("{} duration", label),
                    format_duration(step.duration()),
                    format_duration(other.duration()),
                ));
            }
        }

        let left_keys: HashSet<_> = left.iter().map(|(key, _)| *key).collect();
        for (key, step) in &right {
            if !left_keys.contains(key) {
                result.push(Difference::added(facet, step_label(key.0, key.1), describe(step)));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difference::DifferenceKind;
    use crate::testing::{record, started, step, Spec};
    use synthmon_common::{Outcome, PropertyStore, StepError, StepKind, StepTiming};

    fn all() -> Vec<Box<dyn Comparer>> {
        vec![
            Box::new(DeclineReasonComparer),
            Box::new(StateComparer),
            Box::new(UrlComparer),
            Box::new(DurationComparer::new()),
            Box::new(StepsComparer::new()),
        ]
    }

    #[test]
    fn test_record_against_itself_is_empty() {
        let completed = record(Spec::default().steps(vec![
            step("dns", Outcome::Succeeded, 10),
            step("http", Outcome::Failed, 20),
        ]));
        let declined = record(Spec::default().declined("Target URL is missing"));

        for comparer in all() {
            assert!(comparer.compare(&completed, &completed).is_empty(), "{:?}", comparer.facet());
            assert!(comparer.compare(&declined, &declined).is_empty(), "{:?}", comparer.facet());
        }
    }

    #[test]
    fn test_url_only_change() {
        let a = record(Spec::default().url("https://example.com/").steps(vec![step(
            "dns",
            Outcome::Succeeded,
            10,
        )]));
        let b = record(Spec::default().url("https://example.org/").steps(vec![step(
            "dns",
            Outcome::Succeeded,
            10,
        )]));

        for comparer in all() {
            let result = comparer.compare(&a, &b);
            if comparer.facet() == Facet::Url {
                assert_eq!(result.len(), 1);
                let d = &result.differences()[0];
                assert_eq!(d.kind, DifferenceKind::Changed);
                assert_eq!(d.value1.as_deref(), Some("https://example.com/"));
                assert_eq!(d.value2.as_deref(), Some("https://example.org/"));
            } else {
                assert!(result.is_empty(), "{:?} reported {:?}", comparer.facet(), result);
            }
        }
    }

    #[test]
    fn test_decline_reason_added_and_removed() {
        let completed = record(Spec::default());
        let declined = record(Spec::default().declined("Run start is before the reference date"));

        let added = DeclineReasonComparer.compare(&completed, &declined);
        assert_eq!(added.differences()[0].kind, DifferenceKind::Added);
        let removed = DeclineReasonComparer.compare(&declined, &completed);
        assert_eq!(removed.differences()[0].kind, DifferenceKind::Removed);
        assert_eq!(
            StateComparer.compare(&completed, &declined).differences()[0].kind,
            DifferenceKind::Changed
        );
    }

    #[test]
    fn test_duration_treats_no_steps_as_zero() {
        let empty = record(Spec::default().declined("Target URL is missing"));
        let busy = record(Spec::default().steps(vec![step("dns", Outcome::Succeeded, 40)]));

        let result = DurationComparer::new().compare(&empty, &busy);
        assert_eq!(result.len(), 1);
        let d = &result.differences()[0];
        assert_eq!(d.kind, DifferenceKind::Changed);
        assert_eq!(d.value1.as_deref(), Some("0ns"));
        assert_eq!(d.value2.as_deref(), Some("40ms"));
    }

    #[test]
    fn test_duration_tolerance() {
        let a = record(Spec::default().steps(vec![step("dns", Outcome::Succeeded, 100)]));
        let b = record(Spec::default().steps(vec![step("dns", Outcome::Succeeded, 130)]));

        let tolerant = Duration::from_millis(50);
        assert!(DurationComparer::with_tolerance(tolerant).compare(&a, &b).is_empty());
        assert!(StepsComparer::new().with_tolerance(tolerant).compare(&a, &b).is_empty());
        assert_eq!(DurationComparer::new().compare(&a, &b).len(), 1);
        assert!(StepsComparer::new().ignore_durations().compare(&a, &b).is_empty());
    }

    #[test]
    fn test_steps_matched_by_name_and_occurrence() {
        let a = record(Spec::default().steps(vec![
            step("dns", Outcome::Succeeded, 10),
            step("http", Outcome::Succeeded, 10),
            step("http", Outcome::Succeeded, 10),
            step("ping", Outcome::Succeeded, 10),
        ]));
        let b = record(Spec::default().steps(vec![
            step("http", Outcome::Succeeded, 10),
            step("dns", Outcome::Succeeded, 10),
            step("http", Outcome::Failed, 10),
            step("browser", Outcome::Succeeded, 10),
        ]));

        let result = StepsComparer::new().compare(&a, &b);
        let summary: Vec<_> = result.iter().map(|d| (d.kind, d.subject.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (DifferenceKind::Changed, "http#2 outcome"),
                (DifferenceKind::Removed, "ping"),
                (DifferenceKind::Added, "browser"),
            ]
        );
        assert!(result.differences()[0]
            .value2
            .as_deref()
            .unwrap()
            .contains("validation_failed"));
    }

    #[test]
    fn test_same_outcome_with_new_error_text() {
        let faulted = |message: &str| {
            StepResult::new(
                "http",
                StepKind::Action,
                StepTiming::new(started(), Duration::from_millis(10)),
                Outcome::Failed,
                Some(StepError::fault(message)),
                PropertyStore::new(),
            )
        };
        let a = record(Spec::default().steps(vec![faulted("connection reset")]));
        let b = record(Spec::default().steps(vec![faulted("connection refused")]));

        let result = StepsComparer::new().compare(&a, &b);
        assert_eq!(result.len(), 1);
        let diff = &result.differences()[0];
        assert_eq!(diff.kind, DifferenceKind::Changed);
        assert_eq!(diff.subject, "http error");
        assert_eq!(diff.value1.as_deref(), Some("[fault] connection reset"));
        assert_eq!(diff.value2.as_deref(), Some("[fault] connection refused"));
    }
}
