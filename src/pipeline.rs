//! Task / hemisphere / group orchestration.
//!
//! For every task in a [`Manifest`], every subtask window, every configured
//! hemisphere and every experimental group:
//!
//! 1. load each scan's `.1D` file
//! 2. cut the event window and drop `initial_trim` samples
//! 3. z-score
//! 4. stack into a [`TimeseriesMatrix`] and run the analysis
//! 5. merge subject → run results into the nested result map
//!
//! A batch that fails is logged and skipped; results of other batches are
//! kept.
use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use ndarray::Array1;
use tracing::{error, info, warn};

use crate::config::AnalysisConfig;
use crate::correlation::roi_isc;
use crate::io::{load_1d, EventWindow, Manifest, ScanEntry};
use crate::lags::lagged_isc;
use crate::normalize::{trim_to_event, zscore_inplace};
use crate::results::{IscResults, LagResults};
use crate::timeseries::TimeseriesMatrix;

/// Summary key for scans without a group.
pub const UNGROUPED: &str = "all";

/// One task/subtask × hemisphere × group combination.
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    pub task: &'a str,
    pub subtask: String,
    pub window: EventWindow,
    pub hemi: &'a str,
    pub group: Option<&'a str>,
    pub scans: Vec<&'a ScanEntry>,
}

impl std::fmt::Display for Batch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.subtask, self.hemi)?;
        if let Some(g) = self.group {
            write!(f, " [{g}]")?;
        }
        Ok(())
    }
}

/// Results plus the batches that could not be computed.
#[derive(Debug, Clone, Default)]
pub struct Outcome<R> {
    pub results: R,
    pub failed: Vec<String>,
}

/// Trimmed, z-scored scans of one batch, with their labels.
#[derive(Debug, Clone)]
pub struct LoadedBatch {
    pub subjects: Vec<String>,
    pub runs: Vec<String>,
    pub data: TimeseriesMatrix,
}

/// Enumerate batches in task → subtask → hemisphere → group order.
pub fn batches<'a>(manifest: &'a Manifest, cfg: &'a AnalysisConfig) -> Vec<Batch<'a>> {
    let mut out = Vec::new();
    for (task, entry) in &manifest.tasks {
        for (subtask, window) in entry.windows(task) {
            for hemi in &cfg.hemispheres {
                let mut groups: BTreeMap<Option<&str>, Vec<&ScanEntry>> = BTreeMap::new();
                for scan in entry.scans.iter().filter(|s| &s.hemi == hemi) {
                    groups.entry(scan.group.as_deref()).or_default().push(scan);
                }
                for (group, mut scans) in groups {
                    scans.sort_by(|a, b| {
                        (a.subject.as_str(), a.run_label()).cmp(&(b.subject.as_str(), b.run_label()))
                    });
                    out.push(Batch {
                        task,
                        subtask: subtask.clone(),
                        window,
                        hemi,
                        group,
                        scans,
                    });
                }
            }
        }
    }
    out
}

/// Load one scan, cut to the event window and z-score it.
pub fn prepare_series(raw: &Array1<f64>, window: EventWindow, initial_trim: usize) -> Result<Array1<f64>> {
    let duration = window.duration_for(raw.len());
    let mut series = trim_to_event(raw, window.onset, duration, initial_trim);
    if series.len() < 2 {
        bail!(
            "only {} of {} samples left (onset {}, duration {duration}, initial trim {initial_trim})",
            series.len(),
            raw.len(),
            window.onset
        );
    }
    let (_mean, std) = zscore_inplace(&mut series);
    if std == 0.0 {
        warn!("constant timeseries after trimming; correlations will be NaN");
    }
    Ok(series)
}

/// Load every scan of a batch.
pub fn load_batch(manifest: &Manifest, batch: &Batch<'_>, cfg: &AnalysisConfig) -> Result<LoadedBatch> {
    let mut subjects = Vec::with_capacity(batch.scans.len());
    let mut runs = Vec::with_capacity(batch.scans.len());
    let mut series = Vec::with_capacity(batch.scans.len());
    for scan in &batch.scans {
        let path = manifest.resolve(scan);
        let raw = load_1d(&path)?;
        let x = prepare_series(&raw, batch.window, cfg.initial_trim)
            .with_context(|| format!("preparing {}", path.display()))?;
        subjects.push(scan.subject.clone());
        runs.push(scan.run_label());
        series.push(x);
    }
    let data = TimeseriesMatrix::from_series(&series)
        .with_context(|| format!("stacking scans for {batch}"))?;
    Ok(LoadedBatch { subjects, runs, data })
}

fn lag_batch(manifest: &Manifest, batch: &Batch<'_>, cfg: &AnalysisConfig, out: &mut LagResults) -> Result<()> {
    let loaded = load_batch(manifest, batch, cfg)?;
    let res = lagged_isc(&loaded.data, &cfg.lag_options())
        .with_context(|| format!("lagged ISC for {batch}"))?;
    let peaks = res.peak_lags_by_index();
    let curves = res
        .roi_matrix()
        .context("lagged ISC produced a multi-voxel tensor for ROI input")?;

    for (s, (subject, run)) in loaded.subjects.iter().zip(&loaded.runs).enumerate() {
        out.insert(&batch.subtask, batch.hemi, subject, run, curves.column(s).to_vec(), peaks[s]);
    }
    if let Some(summary) = &res.summary {
        let curve = summary.column(0).to_vec();
        if let Some(z) = res.lags.iter().position(|&l| l == 0) {
            info!("{batch}: {} summary ISC at lag 0 = {:.3}", cfg.summary_statistic, curve[z]);
        }
        out.insert_summary(&batch.subtask, batch.hemi, batch.group.unwrap_or(UNGROUPED), curve);
    }
    info!("lagged {} ISC ({}) computed for {batch}: {} runs", cfg.roi, cfg.space, loaded.runs.len());
    Ok(())
}

/// Lagged ISC over every batch of a manifest.
pub fn run_lags(manifest: &Manifest, cfg: &AnalysisConfig) -> Outcome<LagResults> {
    info!("lagged ISC over {} task(s): {cfg}", manifest.tasks.len());
    let mut outcome = Outcome::<LagResults>::default();
    for batch in batches(manifest, cfg) {
        if let Err(e) = lag_batch(manifest, &batch, cfg, &mut outcome.results) {
            error!("skipping {batch}: {e:#}");
            outcome.failed.push(batch.to_string());
        }
    }
    outcome
}

fn isc_batch(manifest: &Manifest, batch: &Batch<'_>, cfg: &AnalysisConfig, out: &mut IscResults) -> Result<()> {
    let loaded = load_batch(manifest, batch, cfg)?;
    let iscs = roi_isc(&loaded.data).with_context(|| format!("ISC for {batch}"))?;
    if iscs.len() != loaded.runs.len() {
        bail!("{} ISC values for {} runs (need at least 3 runs for per-run ISCs)", iscs.len(), loaded.runs.len());
    }
    for ((subject, run), &r) in loaded.subjects.iter().zip(&loaded.runs).zip(iscs.iter()) {
        out.insert(&batch.subtask, batch.hemi, subject, run, r);
    }
    let n = iscs.len() as f64;
    let mean = iscs.sum() / n;
    let sd = (iscs.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
    info!(
        "mean {} {} ISC ({}) for {} = {mean:.3} (SD = {sd:.3})",
        batch.hemi, cfg.roi, cfg.space, batch.subtask
    );
    Ok(())
}

/// Plain leave-one-out ROI ISC over every batch of a manifest.
pub fn run_isc(manifest: &Manifest, cfg: &AnalysisConfig) -> Outcome<IscResults> {
    info!("ROI ISC over {} task(s): {cfg}", manifest.tasks.len());
    let mut outcome = Outcome::<IscResults>::default();
    for batch in batches(manifest, cfg) {
        if let Err(e) = isc_batch(manifest, &batch, cfg, &mut outcome.results) {
            error!("skipping {batch}: {e:#}");
            outcome.failed.push(batch.to_string());
        }
    }
    outcome
}
