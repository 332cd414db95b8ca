//! Nested result maps, serialised as JSON.
//!
//! Lagged ISC:
//! ```text
//! task → hemi → { "lagged ISCs": subject → run → [r(lag) ...],
//!                 "peak lags":   subject → run → lag,
//!                 "summary":     group → [r(lag) ...] }
//! ```
//! `"summary"` is only written when a summary statistic was requested.
//! ROI ISC:
//! ```text
//! task → hemi → subject → run → r
//! ```
//! NaN correlations are written as `null`.
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::io::write_json;

/// Lagged ISC results for one task and hemisphere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HemiLags {
    #[serde(rename = "lagged ISCs")]
    pub lagged_iscs: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
    #[serde(rename = "peak lags")]
    pub peak_lags: BTreeMap<String, BTreeMap<String, i64>>,
    /// Lag curve collapsed across subjects, per group.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub summary: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LagResults {
    pub tasks: BTreeMap<String, BTreeMap<String, HemiLags>>,
}

impl LagResults {
    /// Results slot for a task/hemisphere, created empty on first use.
    pub fn hemi_mut(&mut self, task: &str, hemi: &str) -> &mut HemiLags {
        self.tasks
            .entry(task.to_string())
            .or_default()
            .entry(hemi.to_string())
            .or_default()
    }

    /// Record one run's lag curve and peak lag.  Later inserts for the same
    /// run replace earlier ones.
    pub fn insert(&mut self, task: &str, hemi: &str, subject: &str, run: &str, curve: Vec<f64>, peak: i64) {
        let slot = self.hemi_mut(task, hemi);
        slot.lagged_iscs
            .entry(subject.to_string())
            .or_default()
            .insert(run.to_string(), curve);
        slot.peak_lags
            .entry(subject.to_string())
            .or_default()
            .insert(run.to_string(), peak);
    }

    /// Record the summarised lag curve of one group.
    pub fn insert_summary(&mut self, task: &str, hemi: &str, group: &str, curve: Vec<f64>) {
        self.hemi_mut(task, hemi).summary.insert(group.to_string(), curve);
    }

    pub fn summary(&self, task: &str, hemi: &str, group: &str) -> Option<&[f64]> {
        self.tasks.get(task)?.get(hemi)?.summary.get(group).map(Vec::as_slice)
    }

    pub fn peak_lag(&self, task: &str, hemi: &str, subject: &str, run: &str) -> Option<i64> {
        self.tasks.get(task)?.get(hemi)?.peak_lags.get(subject)?.get(run).copied()
    }

    /// Number of runs with a recorded peak lag.
    pub fn n_runs(&self) -> usize {
        self.tasks
            .values()
            .flat_map(|h| h.values())
            .flat_map(|r| r.peak_lags.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_json(self, path)
    }
}

/// ROI ISC results: task → hemi → subject → run → r.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IscResults {
    pub tasks: BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>>,
}

impl IscResults {
    pub fn insert(&mut self, task: &str, hemi: &str, subject: &str, run: &str, r: f64) {
        self.tasks
            .entry(task.to_string())
            .or_default()
            .entry(hemi.to_string())
            .or_default()
            .entry(subject.to_string())
            .or_default()
            .insert(run.to_string(), r);
    }

    pub fn get(&self, task: &str, hemi: &str, subject: &str, run: &str) -> Option<f64> {
        self.tasks.get(task)?.get(hemi)?.get(subject)?.get(run).copied()
    }

    pub fn n_runs(&self) -> usize {
        self.tasks
            .values()
            .flat_map(|h| h.values())
            .flat_map(|s| s.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_json(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lag_results_serialise_with_published_keys() {
        let mut res = LagResults::default();
        res.insert("pieman", "L", "sub-001", "run-1.1D", vec![0.1, 0.4, 0.2], 0);
        res.insert("pieman", "L", "sub-001", "run-2.1D", vec![0.3, 0.1, 0.0], -1);
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v["pieman"]["L"]["peak lags"]["sub-001"]["run-2.1D"], -1);
        assert_eq!(v["pieman"]["L"]["lagged ISCs"]["sub-001"]["run-1.1D"][1], 0.4);
        assert_eq!(res.n_runs(), 2);
        assert_eq!(res.peak_lag("pieman", "L", "sub-001", "run-1.1D"), Some(0));
        assert_eq!(res.peak_lag("pieman", "R", "sub-001", "run-1.1D"), None);
        assert!(v["pieman"]["L"].get("summary").is_none());
    }

    #[test]
    fn summary_written_per_group() {
        let mut res = LagResults::default();
        res.insert("milkyway", "L", "sub-001", "a.1D", vec![0.2, 0.5, 0.1], 0);
        res.insert_summary("milkyway", "L", "vodka", vec![0.25, 0.45, f64::NAN]);
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v["milkyway"]["L"]["summary"]["vodka"][1], 0.45);
        assert!(v["milkyway"]["L"]["summary"]["vodka"][2].is_null());
        assert_eq!(res.summary("milkyway", "L", "vodka").map(<[f64]>::len), Some(3));
    }

    #[test]
    fn nan_written_as_null() {
        let mut res = IscResults::default();
        res.insert("tunnel", "R", "sub-004", "a.1D", f64::NAN);
        let text = serde_json::to_string(&res).unwrap();
        assert_eq!(text, r#"{"tunnel":{"R":{"sub-004":{"a.1D":null}}}}"#);
    }
}
