//! synthmon Diff
//!
//! Compares two run records facet by facet and renders the result. Records
//! are immutable, so every comparer is a pure function of its two inputs.

pub mod comparer;
pub mod difference;
pub mod engine;
pub mod render;
pub mod report;

#[cfg(test)]
mod testing;

pub use comparer::{
    Comparer, DeclineReasonComparer, DurationComparer, StateComparer, StepsComparer, UrlComparer,
};
pub use difference::{DiffResult, Difference, DifferenceKind, Facet};
pub use engine::{CompareEngine, CompareEngineBuilder, CompareOptions};
pub use render::{Bold, Code, ListItem, Render, RenderExt, Style, Tinted, Tone};
pub use report::{DiffReport, RunReport};
