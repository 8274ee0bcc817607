//! Output formatting for CLI

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use synthmon_common::RunRecord;

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One row per step
pub fn steps_table(record: &RunRecord) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["#", "Step", "Kind", "Outcome", "Duration", "Error"]);
    for (i, step) in record.steps().iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            step.name().to_string(),
            step.kind().to_string(),
            step.outcome().to_string(),
            format!("{:?}", step.duration()),
            step.error().map(|e| e.to_string()).unwrap_or_default(),
        ]);
    }
    table
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}
