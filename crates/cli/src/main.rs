//! synthmon CLI - Main Entry Point
//!
//! Inspects, converts and compares recorded monitoring runs.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use synthmon_cli::commands::{compare, convert, init, show};
use synthmon_cli::output::print_error;
use synthmon_runner::MonitorConfig;

/// synthmon - synthetic monitoring run records
#[derive(Parser)]
#[command(name = "synthmon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "SYNTHMON_CONFIG", default_value = "synthmon.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a baseline record with a candidate
    Compare(compare::CompareArgs),

    /// Print a record
    Show(show::ShowArgs),

    /// Re-encode a record in another format
    Convert(convert::ConvertArgs),

    /// Write a default configuration file
    Init(init::InitArgs),

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compare(args) => {
            let fail_on_diff = args.fail_on_diff;
            let differs = compare::execute(args, &load_config(&cli.config))?;
            if fail_on_diff && differs {
                std::process::exit(1);
            }
        }
        Commands::Show(args) => show::execute(args, &load_config(&cli.config))?,
        Commands::Convert(args) => convert::execute(args)?,
        Commands::Init(args) => init::execute(args, &cli.config)?,
        Commands::Version => {
            println!("synthmon v{}", env!("CARGO_PKG_VERSION"));
            println!("Record formats: xml, msgpack");
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> MonitorConfig {
    match MonitorConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            print_error(&format!("Cannot load {}: {}", path.display(), e));
            std::process::exit(2);
        }
    }
}
