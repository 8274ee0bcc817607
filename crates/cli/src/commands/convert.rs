//! Re-encode a run record

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Args;
use synthmon_common::codec::{self, Format};
use tracing::info;

use crate::output::print_success;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Record to read; format is taken from the extension
    pub input: PathBuf,

    /// Destination; `.xml`, `.msgpack` or `.bin`
    pub output: PathBuf,

    /// Overwrite an existing destination
    #[arg(long)]
    pub force: bool,
}

fn format_of(path: &Path) -> anyhow::Result<Format> {
    match Format::from_path(path) {
        Some(format) => Ok(format),
        None => bail!(
            "Cannot tell the record format of {} (expected .xml, .msgpack or .bin)",
            path.display()
        ),
    }
}

/// Convert `input` to the format implied by `output` and return it
pub fn convert(input: &Path, output: &Path, force: bool) -> anyhow::Result<Format> {
    let target = format_of(output)?;
    format_of(input)?;

    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let record = codec::read_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    codec::write_file(output, &record)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Converted run {} to {}", record.id(), target);
    Ok(target)
}

pub fn execute(args: ConvertArgs) -> anyhow::Result<()> {
    let format = convert(&args.input, &args.output, args.force)?;
    print_success(&format!("Wrote {} ({})", args.output.display(), format));
    Ok(())
}
