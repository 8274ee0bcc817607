//! Human-readable reports

use synthmon_common::{keys, PropertyStore, RunRecord, StepResult};

use crate::comparer::format_duration;
use crate::difference::{DiffResult, Difference, DifferenceKind};
use crate::render::{render_lines, Render, RenderExt, Style, Tone};

const DEFAULT_TITLE: &str = "Run comparison";

/// Renders a [`DiffResult`] as a tree: one bullet per facet, one nested
/// bullet per difference.
///
/// Optional metadata is read from a property store: `report.title`,
/// `report.baseline` and `report.candidate`, all text.
#[derive(Debug)]
pub struct DiffReport<'a> {
    result: &'a DiffResult,
    metadata: PropertyStore,
}

impl<'a> DiffReport<'a> {
    pub fn new(result: &'a DiffResult) -> Self {
        Self {
            result,
            metadata: PropertyStore::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: PropertyStore) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn title(&self) -> &str {
        self.metadata
            .try_get::<String>(&keys::REPORT_TITLE)
            .map(String::as_str)
            .unwrap_or(DEFAULT_TITLE)
    }

    pub fn render(&self, style: Style) -> String {
        let mut lines = vec![self.title().bold().render(style)];

        let sources = [
            ("Baseline", &keys::REPORT_BASELINE),
            ("Candidate", &keys::REPORT_CANDIDATE),
        ];
        for (label, key) in sources {
            if let Some(value) = self.metadata.try_get::<String>(key) {
                let line = format!("{}: {}", label, value.code().render(style));
                lines.push(line.list_item(0).render(style));
            }
        }
        lines.push(String::new());

        if self.result.is_empty() {
            lines.push("No differences found".tinted(Tone::Good).render(style));
            return render_lines(&lines, style);
        }

        for facet in self.result.facets() {
            lines.push(facet.label().bold().list_item(0).render(style));
            for difference in self.result.for_facet(facet) {
                lines.push(describe(difference, style).list_item(1).render(style));
            }
        }

        lines.push(String::new());
        lines.push(format!("{} difference(s)", self.result.len()).tinted(Tone::Bad).render(style));
        render_lines(&lines, style)
    }
}

fn value(v: &Option<String>, style: Style) -> String {
    v.as_deref().unwrap_or("none").code().render(style)
}

fn describe(d: &Difference, style: Style) -> String {
    match d.kind {
        DifferenceKind::Added => format!(
            "{} {}: {}",
            d.subject,
            "added".tinted(Tone::Good).render(style),
            value(&d.value2, style)
        ),
        DifferenceKind::Removed => format!(
            "{} {}: {}",
            d.subject,
            "removed".tinted(Tone::Bad).render(style),
            value(&d.value1, style)
        ),
        DifferenceKind::Changed => format!(
            "{} {}: {} → {}",
            d.subject,
            "changed".tinted(Tone::Notice).render(style),
            value(&d.value1, style),
            value(&d.value2, style)
        ),
    }
}

/// Summary of a single record
#[derive(Debug)]
pub struct RunReport<'a> {
    record: &'a RunRecord,
}

impl<'a> RunReport<'a> {
    pub fn new(record: &'a RunRecord) -> Self {
        Self { record }
    }

    pub fn render(&self, style: Style) -> String {
        let record = self.record;
        let mut lines = vec![format!("Run {}", record.id()).bold().render(style)];

        let url = record.url().map(|u| u.to_string()).unwrap_or_else(|| "none".to_string());
        let validity = if record.is_valid() {
            "yes".tinted(Tone::Good)
        } else {
            "no".tinted(Tone::Bad)
        };

        let facts = [
            format!("URL: {}", url.code().render(style)),
            format!("State: {}", record.state()),
            format!("Started: {}", record.started().to_rfc3339()),
            format!("Duration: {}", format_duration(record.duration())),
            format!("Valid: {}", validity.render(style)),
        ];
        lines.extend(facts.iter().map(|f| f.list_item(0).render(style)));

        if let Some(reason) = record.decline_reason() {
            lines.push(
                format!("Decline reason: {}", reason.tinted(Tone::Bad).render(style))
                    .list_item(0)
                    .render(style),
            );
        }

        if !record.steps().is_empty() {
            lines.push(String::new());
            lines.push("Steps".bold().render(style));
            for step in record.steps() {
                lines.extend(step_lines(step, style));
            }
        }

        render_lines(&lines, style)
    }
}

fn step_lines(step: &StepResult, style: Style) -> Vec<String> {
    let tone = if step.succeeded() { Tone::Good } else { Tone::Bad };
    let mut lines = vec![format!(
        "{} ({}) {} in {}",
        step.name().code().render(style),
        step.kind(),
        step.outcome().to_string().tinted(tone).render(style),
        format_duration(step.duration())
    )
    .list_item(0)
    .render(style)];

    if let Some(error) = step.error() {
        lines.push(error.to_string().list_item(1).render(style));
    }
    lines
}
