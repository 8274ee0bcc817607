//! Print a single run record

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use synthmon_common::codec;
use synthmon_diff::{RunReport, Style};
use synthmon_runner::MonitorConfig;

use crate::output::steps_table;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Record to print
    pub record: PathBuf,

    /// Report style: markdown, ansi or plain
    #[arg(long)]
    pub style: Option<Style>,

    /// Print steps as a table
    #[arg(long)]
    pub table: bool,
}

pub fn execute(args: ShowArgs, config: &MonitorConfig) -> anyhow::Result<()> {
    let record = codec::read_file(&args.record)
        .with_context(|| format!("Failed to read {}", args.record.display()))?;

    if args.table {
        println!("{}", steps_table(&record));
        return Ok(());
    }

    let style = args.style.unwrap_or(config.report.style);
    print!("{}", RunReport::new(&record).render(style));
    Ok(())
}
