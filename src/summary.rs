//! Summary statistics for collapsing correlations across subjects.
//!
//! Correlations are averaged either directly (`Mean`) or in the Fisher-z
//! domain (`FisherMean`): `tanh(nanmean(atanh(r)))`.  NaN entries are
//! skipped by both.
use std::fmt;
use std::str::FromStr;

use ndarray::{Array, ArrayView1, Axis, Dimension, RemoveAxis};
use serde::{Deserialize, Serialize};

use crate::error::{IscError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStatistic {
    /// Keep per-subject values only.
    #[default]
    None,
    Mean,
    /// Average of Fisher z-transformed correlations, transformed back.
    #[serde(alias = "fisher", alias = "fisher_mean")]
    FisherMean,
}

impl FromStr for SummaryStatistic {
    type Err = IscError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "mean" => Ok(Self::Mean),
            "fisher" | "fisher-mean" | "fisher_mean" => Ok(Self::FisherMean),
            other => Err(IscError::InvalidConfiguration(format!(
                "unknown summary statistic '{other}' (expected none, mean or fisher-mean)"
            ))),
        }
    }
}

impl fmt::Display for SummaryStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Mean => "mean",
            Self::FisherMean => "fisher-mean",
        })
    }
}

/// Mean of the finite-or-infinite (non-NaN) values; NaN if there are none.
pub fn nanmean(values: ArrayView1<f64>) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(acc, n), &v| (acc + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Fisher-z mean of a set of correlations.
pub fn fisher_mean(values: ArrayView1<f64>) -> f64 {
    nanmean(values.mapv(f64::atanh).view()).tanh()
}

impl SummaryStatistic {
    /// Collapse one set of values.  Returns `None` for [`SummaryStatistic::None`].
    pub fn apply(self, values: ArrayView1<f64>) -> Option<f64> {
        match self {
            Self::None => None,
            Self::Mean => Some(nanmean(values)),
            Self::FisherMean => Some(fisher_mean(values)),
        }
    }
}

/// Collapse `data` along `axis` with `stat`.
///
/// Fails with `InvalidConfiguration` for [`SummaryStatistic::None`] or an
/// axis that does not exist.
pub fn summarize<D>(
    data: &Array<f64, D>,
    stat: SummaryStatistic,
    axis: Axis,
) -> Result<Array<f64, D::Smaller>>
where
    D: Dimension + RemoveAxis,
{
    if axis.index() >= data.ndim() {
        return Err(IscError::InvalidConfiguration(format!(
            "axis {} out of range for {}-d input",
            axis.index(),
            data.ndim()
        )));
    }
    if stat == SummaryStatistic::None {
        return Err(IscError::InvalidConfiguration(
            "no summary statistic selected".into(),
        ));
    }
    Ok(data.map_axis(axis, |lane| stat.apply(lane).unwrap_or(f64::NAN)))
}
