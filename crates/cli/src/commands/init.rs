//! Write a default configuration file

use std::path::Path;

use clap::Args;
use synthmon_runner::MonitorConfig;

use crate::output::{print_success, print_warning};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Replace an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: InitArgs, path: &Path) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        print_warning(&format!("{} already exists, leaving it alone", path.display()));
        return Ok(());
    }

    MonitorConfig::default().save(path)?;
    print_success(&format!("Wrote default configuration to {}", path.display()));
    Ok(())
}
