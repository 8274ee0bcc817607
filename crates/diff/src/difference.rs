//! Differences between two run records

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Absent in the baseline, present in the candidate
    Added,
    /// Present in the baseline, absent in the candidate
    Removed,
    Changed,
}

impl fmt::Display for DifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifferenceKind::Added => write!(f, "added"),
            DifferenceKind::Removed => write!(f, "removed"),
            DifferenceKind::Changed => write!(f, "changed"),
        }
    }
}

/// The part of a run a comparer inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    DeclineReason,
    State,
    Url,
    Duration,
    Steps,
}

impl Facet {
    pub fn label(&self) -> &'static str {
        match self {
            Facet::DeclineReason => "Decline reason",
            Facet::State => "State",
            Facet::Url => "URL",
            Facet::Duration => "Duration",
            Facet::Steps => "Steps",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One discrepancy between a baseline (`value1`) and a candidate (`value2`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    pub kind: DifferenceKind,
    pub facet: Facet,
    /// What differs, e.g. the facet label or `dns#0 outcome`
    pub subject: String,
    pub value1: Option<String>,
    pub value2: Option<String>,
}

impl Difference {
    pub fn added(facet: Facet, subject: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: DifferenceKind::Added,
            facet,
            subject: subject.into(),
            value1: None,
            value2: Some(value.into()),
        }
    }

    pub fn removed(facet: Facet, subject: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: DifferenceKind::Removed,
            facet,
            subject: subject.into(),
            value1: Some(value.into()),
            value2: None,
        }
    }

    pub fn changed(
        facet: Facet,
        subject: impl Into<String>,
        value1: impl Into<String>,
        value2: impl Into<String>,
    ) -> Self {
        Self {
            kind: DifferenceKind::Changed,
            facet,
            subject: subject.into(),
            value1: Some(value1.into()),
            value2: Some(value2.into()),
        }
    }

    /// Compare one optional facet value. Equal values, including both
    /// absent, produce nothing.
    pub fn between(
        facet: Facet,
        subject: impl Into<String>,
        value1: Option<String>,
        value2: Option<String>,
    ) -> Option<Self> {
        match (value1, value2) {
            (a, b) if a == b => None,
            (None, Some(b)) => Some(Self::added(facet, subject, b)),
            (Some(a), None) => Some(Self::removed(facet, subject, a)),
            (Some(a), Some(b)) => Some(Self::changed(facet, subject, a, b)),
            (None, None) => None,
        }
    }
}

/// Ordered differences. Empty means the runs are equivalent on every facet
/// that was compared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiffResult {
    differences: Vec<Difference>,
}

impl DiffResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn push(&mut self, difference: Difference) {
        self.differences.push(difference);
    }

    /// Append every difference of `other`, keeping order
    pub fn merge(&mut self, other: DiffResult) {
        self.differences.extend(other.differences);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Difference> {
        self.differences.iter()
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    pub fn for_facet(&self, facet: Facet) -> impl Iterator<Item = &Difference> {
        self.differences.iter().filter(move |d| d.facet == facet)
    }

    /// Facets with at least one difference, in first-seen order
    pub fn facets(&self) -> Vec<Facet> {
        let mut facets = Vec::new();
        for d in &self.differences {
            if !facets.contains(&d.facet) {
                facets.push(d.facet);
            }
        }
        facets
    }
}

impl From<Option<Difference>> for DiffResult {
    fn from(difference: Option<Difference>) -> Self {
        difference.into_iter().collect()
    }
}

impl FromIterator<Difference> for DiffResult {
    fn from_iter<I: IntoIterator<Item = Difference>>(iter: I) -> Self {
        Self {
            differences: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DiffResult {
    type Item = Difference;
    type IntoIter = std::vec::IntoIter<Difference>;

    fn into_iter(self) -> Self::IntoIter {
        self.differences.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiffResult {
    type Item = &'a Difference;
    type IntoIter = std::slice::Iter<'a, Difference>;

    fn into_iter(self) -> Self::IntoIter {
        self.differences.iter()
    }
}
