//! Constellation Synthesizer CLI
//!
//! Usage:
//!   synth-constellation --config configuration.json --output-dir data

use anyhow::{Context, Result};
use clap::Parser;
use constellation_synth::{load_config, run, FileSink};
use orbital_mechanics::TimeScale;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    name = "synth-constellation",
    about = "Generate Walker Delta TLEs and Earth-fixed positions"
)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "configuration.json")]
    config: PathBuf,

    /// Root directory for tles/ and positions/
    #[arg(short, long, default_value = "data")]
    output_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("Walker Delta Constellation Synthesizer");
    info!("{}", "=".repeat(60));

    let config = load_config(&args.config)
        .with_context(|| format!("loading configuration {:?}", args.config))?;

    let timescale = TimeScale::builtin();
    let mut sink = FileSink::new(&args.output_dir);
    let summary = run(&config, &timescale, &mut sink)?;

    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Satellites: {}", summary.satellites);
    if let Some(path) = &summary.tle_path {
        info!("TLE file: {:?}", path);
    }
    if let Some(path) = &summary.position_path {
        info!("Positions: {:?} ({} instants)", path, summary.grid_points);
    }

    Ok(())
}
