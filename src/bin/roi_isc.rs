/// roi_isc: leave-one-out ROI ISC (no lags) for every task, hemisphere and
/// group in a manifest.  Output layout: task → hemi → subject → run → r.
use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use lagisc::{pipeline::run_isc, AnalysisConfig, Manifest};

#[derive(Parser, Debug)]
#[command(name = "roi_isc", about = "Leave-one-out ROI ISC")]
struct Args {
    /// Manifest JSON listing tasks, event windows and 1D files.
    #[arg(long)]
    manifest: PathBuf,

    /// Output JSON path.
    #[arg(long)]
    output: PathBuf,

    /// TRs dropped from the start of each event window (default: 6).
    #[arg(long, default_value_t = 6)]
    initial_trim: usize,

    /// ROI label used in log messages.
    #[arg(long, default_value = "EAC")]
    roi: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let cfg = AnalysisConfig {
        initial_trim: args.initial_trim,
        roi: args.roi,
        ..AnalysisConfig::default()
    };

    let manifest = Manifest::load(&args.manifest)?;
    let outcome = run_isc(&manifest, &cfg);
    outcome.results.write_json(&args.output)?;
    info!("{} runs written → {}", outcome.results.n_runs(), args.output.display());

    if !outcome.failed.is_empty() {
        bail!("{} batch(es) skipped: {}", outcome.failed.len(), outcome.failed.join(", "));
    }
    Ok(())
}
