//! Analysis configuration.
//!
//! [`AnalysisConfig`] holds every tunable parameter of the ROI ISC and
//! lagged-ISC analyses.  All fields have defaults matching the published
//! Narratives auditory-cortex analysis.
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::lags::{LagOptions, LagRange};
use crate::summary::SummaryStatistic;

/// Configuration for one ROI analysis pass over a manifest.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use lagisc::AnalysisConfig;
///
/// let cfg = AnalysisConfig {
///     max_lag:  10,      // search ±10 TRs instead of ±30
///     circular: false,   // trim instead of wrapping
///     ..AnalysisConfig::default()
/// };
/// assert_eq!(cfg.lag_options().lags.values().len(), 21);
/// ```
///
/// It can also be read from JSON; missing keys take their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Region-of-interest label, used only in log messages and file names.
    ///
    /// Default: `"EAC"` (early auditory cortex).
    pub roi: String,

    /// Surface or volume space of the extracted timeseries; reported in log
    /// messages alongside `roi`.
    ///
    /// Default: `"fsaverage6"`.
    pub space: String,

    /// Hemispheres to analyse, in order.  Scans whose `hemi` is not listed
    /// are ignored.
    ///
    /// Default: `["L", "R"]`.
    pub hemispheres: Vec<String>,

    /// Samples dropped from the start of every event window before
    /// z-scoring, to discard the initial hemodynamic transient.
    ///
    /// Default: `6` TRs.
    pub initial_trim: usize,

    /// Largest lag magnitude searched; the lag axis is `-max_lag..=max_lag`.
    ///
    /// Default: `30` TRs.
    pub max_lag: usize,

    /// Wrap shifted samples around (`true`) or trim the non-overlapping
    /// ends (`false`).  Trimming requires `max_lag` below the series length.
    ///
    /// Default: `true`.
    pub circular: bool,

    /// Optional collapse of each group's lagged ISCs across subjects.
    ///
    /// Default: none.
    pub summary_statistic: SummaryStatistic,
}

impl Default for AnalysisConfig {
    /// Returns the published configuration:
    /// EAC · fsaverage6 · L+R · 6-TR trim · ±30 lags · circular.
    fn default() -> Self {
        Self {
            roi: "EAC".into(),
            space: "fsaverage6".into(),
            hemispheres: vec!["L".into(), "R".into()],
            initial_trim: 6,
            max_lag: 30,
            circular: true,
            summary_statistic: SummaryStatistic::None,
        }
    }
}

impl std::fmt::Display for AnalysisConfig {
    /// One-line summary, e.g. `EAC · fsaverage6 · L+R · 6-TR trim · ±30 lags · circular`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} · {} · {} · {}-TR trim · ±{} lags · {}",
            self.roi,
            self.space,
            self.hemispheres.join("+"),
            self.initial_trim,
            self.max_lag,
            if self.circular { "circular" } else { "trimmed" },
        )?;
        if self.summary_statistic != SummaryStatistic::None {
            write!(f, " · {} summary", self.summary_statistic)?;
        }
        Ok(())
    }
}

impl AnalysisConfig {
    /// Read a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// Engine options for one group (labels are attached by the caller).
    pub fn lag_options(&self) -> LagOptions {
        LagOptions {
            lags: LagRange::Symmetric(self.max_lag),
            circular: self.circular,
            subjects: None,
            summary_statistic: self.summary_statistic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"max_lag": 5, "summary_statistic": "fisher"}"#).unwrap();
        assert_eq!(cfg.max_lag, 5);
        assert_eq!(cfg.initial_trim, 6);
        assert_eq!(cfg.summary_statistic, SummaryStatistic::FisherMean);
        assert_eq!(cfg.hemispheres, vec!["L", "R"]);
    }

    #[test]
    fn unknown_keys_rejected() {
        let res: std::result::Result<AnalysisConfig, _> =
            serde_json::from_str(r#"{"maxlag": 5}"#);
        assert!(res.is_err());
        let res: std::result::Result<AnalysisConfig, _> =
            serde_json::from_str(r#"{"summary_statistic": "median"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn display_names_roi_and_space() {
        assert_eq!(
            AnalysisConfig::default().to_string(),
            "EAC · fsaverage6 · L+R · 6-TR trim · ±30 lags · circular"
        );
        let cfg = AnalysisConfig {
            space: "MNI152NLin2009cAsym".into(),
            circular: false,
            summary_statistic: SummaryStatistic::FisherMean,
            ..AnalysisConfig::default()
        };
        assert_eq!(
            cfg.to_string(),
            "EAC · MNI152NLin2009cAsym · L+R · 6-TR trim · ±30 lags · trimmed · fisher-mean summary"
        );
    }

    #[test]
    fn lag_options_follow_config() {
        let cfg = AnalysisConfig { max_lag: 3, circular: false, ..AnalysisConfig::default() };
        let opts = cfg.lag_options();
        assert_eq!(opts.lags.values(), vec![-3, -2, -1, 0, 1, 2, 3]);
        assert!(!opts.circular);
    }
}
