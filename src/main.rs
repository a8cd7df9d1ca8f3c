mod dedup;
mod error;
mod io;
mod marker;
mod parsers;
mod pipeline;
mod source;

use clap::Parser;
use pipeline::{default_output_path, run};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Merge street-art marker JSON sources (items[]) into a single GPX 1.1 file of waypoints.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// One or more URLs and/or local JSON file paths
    #[arg(required = true)]
    sources: Vec<String>,

    /// Output GPX file path (default: derived from the first source)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Value of the GPX creator attribute (default: the dataset's generator)
    #[arg(long)]
    creator: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.sources));

    match run(&cli.sources, &output, cli.creator.as_deref()) {
        Ok(summary) => {
            info!(
                skipped = summary.skipped,
                duplicates = summary.duplicates,
                "conversion finished"
            );
            let shown = fs::canonicalize(&summary.output).unwrap_or(summary.output);
            println!(
                "✓ Saved GPX to {} (waypoints: {})",
                shown.display(),
                summary.waypoints
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
