//! File I/O for the ROI analyses.
//!
//! Reader: AFNI `.1D` timeseries written by `3dTproject` / `3dmaskave`,
//! plus the JSON manifest describing which scans belong to which task.
//! Writer: pretty-printed JSON with sorted keys.
use anyhow::{bail, Context, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ── AFNI 1D ───────────────────────────────────────────────────────────────────

/// Parse the single data row of an AFNI 1D file.
///
/// Any line containing `#` is a comment (AFNI writes its history there);
/// blank lines are ignored.  Exactly one data line must remain.
pub fn parse_1d(text: &str) -> Result<Array1<f64>> {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.contains('#'))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() != 1 {
        bail!("expected exactly one data row, found {}", lines.len());
    }
    let values = lines[0]
        .split_whitespace()
        .map(|tok| tok.parse::<f64>().with_context(|| format!("bad sample '{tok}'")))
        .collect::<Result<Vec<f64>>>()?;
    Ok(Array1::from(values))
}

/// Read and parse an AFNI 1D file.
pub fn load_1d(path: &Path) -> Result<Array1<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_1d(&text).with_context(|| format!("parsing {}", path.display()))
}

// ── Manifest ──────────────────────────────────────────────────────────────────

/// Stimulus window within a run, in TRs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindow {
    pub onset: usize,
    /// `None` runs to the end of the scan.
    #[serde(default)]
    pub duration: Option<usize>,
}

impl EventWindow {
    /// Window covering the whole run.
    pub fn full() -> Self {
        Self { onset: 0, duration: None }
    }

    /// Duration resolved against a run of `len` samples.
    pub fn duration_for(&self, len: usize) -> usize {
        self.duration.unwrap_or_else(|| len.saturating_sub(self.onset))
    }
}

/// One extracted ROI timeseries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub subject: String,
    /// Run identifier; defaults to the file name.
    #[serde(default)]
    pub run: Option<String>,
    pub hemi: String,
    /// Path to the `.1D` file, relative to the manifest unless absolute.
    pub path: PathBuf,
    /// Experimental condition for tasks analysed per group.
    #[serde(default)]
    pub group: Option<String>,
}

impl ScanEntry {
    pub fn run_label(&self) -> String {
        self.run.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }
}

/// Scans and stimulus windows of one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    /// Stories cut from the same scans (e.g. `slumlord` and `reach`).
    /// Empty means one subtask named after the task, covering the full run.
    #[serde(default)]
    pub subtasks: BTreeMap<String, EventWindow>,
    #[serde(default)]
    pub scans: Vec<ScanEntry>,
}

impl TaskEntry {
    /// Subtasks with their windows; falls back to the task itself.
    pub fn windows(&self, task: &str) -> Vec<(String, EventWindow)> {
        if self.subtasks.is_empty() {
            vec![(task.to_string(), EventWindow::full())]
        } else {
            self.subtasks.iter().map(|(k, w)| (k.clone(), *w)).collect()
        }
    }
}

/// Which scans to analyse, grouped by task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub tasks: BTreeMap<String, TaskEntry>,
    /// Directory relative scan paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let mut manifest: Manifest = serde_json::from_str(&text)
            .with_context(|| format!("parsing manifest {}", path.display()))?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(manifest)
    }

    pub fn resolve(&self, scan: &ScanEntry) -> PathBuf {
        if scan.path.is_absolute() {
            scan.path.clone()
        } else {
            self.base_dir.join(&scan.path)
        }
    }
}

// ── JSON writer ───────────────────────────────────────────────────────────────

/// Write `value` as two-space indented JSON.  Map keys come out sorted when
/// the value is built from `BTreeMap`s.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    use std::io::Write;
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut w = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, value)?;
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}
