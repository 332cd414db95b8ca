/// roi_lags: lagged ROI ISC for every task, hemisphere and group listed in a
/// manifest, written as
///
///   task → hemi → { "lagged ISCs": subject → run → [r(-L) … r(+L)],
///                   "peak lags":   subject → run → lag }
///
/// Batches that fail (too few runs, unreadable files, lags longer than the
/// trimmed scan) are reported and skipped; the exit status is non-zero if
/// any batch was skipped.
use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use lagisc::{pipeline::run_lags, AnalysisConfig, Manifest, SummaryStatistic};

#[derive(Parser, Debug)]
#[command(name = "roi_lags", about = "Lagged leave-one-out ROI ISC")]
struct Args {
    /// Manifest JSON listing tasks, event windows and 1D files.
    #[arg(long)]
    manifest: PathBuf,

    /// Output JSON path.
    #[arg(long)]
    output: PathBuf,

    /// Analysis config JSON; command-line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Largest lag magnitude in TRs.
    #[arg(long)]
    max_lag: Option<usize>,

    /// TRs dropped from the start of each event window.
    #[arg(long)]
    initial_trim: Option<usize>,

    /// Trim non-overlapping samples instead of wrapping them around.
    #[arg(long)]
    non_circular: bool,

    /// Summary across subjects: none, mean or fisher-mean.
    #[arg(long)]
    summary: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(l) = args.max_lag {
        cfg.max_lag = l;
    }
    if let Some(t) = args.initial_trim {
        cfg.initial_trim = t;
    }
    if args.non_circular {
        cfg.circular = false;
    }
    if let Some(s) = &args.summary {
        cfg.summary_statistic = s.parse::<SummaryStatistic>()?;
    }

    let manifest = Manifest::load(&args.manifest)?;
    info!(
        "{} tasks · roi {} · ±{} lags · circular={}",
        manifest.tasks.len(), cfg.roi, cfg.max_lag, cfg.circular
    );

    let outcome = run_lags(&manifest, &cfg);
    outcome.results.write_json(&args.output)?;
    info!("{} runs written → {}", outcome.results.n_runs(), args.output.display());

    if !outcome.failed.is_empty() {
        bail!("{} batch(es) skipped: {}", outcome.failed.len(), outcome.failed.join(", "));
    }
    Ok(())
}
