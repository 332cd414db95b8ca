//! Lagged intersubject correlation.
//!
//! For every lag in the requested range and every subject, the subject is
//! shifted against the mean of the remaining subjects (see [`crate::shift`])
//! and the pair is handed to a [`LooCorrelation`] primitive.  The result is a
//! `[L, V, S]` tensor (lags × voxels × subjects) plus the lag at which each
//! subject correlates best with the group.
//!
//! ```text
//!   TimeseriesMatrix [T, V, S]
//!     │
//!     ├─ leave_one_out_mean      one reference per subject
//!     ├─ shift_against           per (lag, subject), rayon-parallel
//!     ├─ LooCorrelation          pairwise row per cell
//!     │
//!     └─→ tensor [L, V, S] ─┬─→ peak lag per subject
//!                           └─→ optional summary [L, V]
//! ```
use std::collections::BTreeMap;

use ndarray::{s, Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;
use tracing::debug;

use crate::correlation::{LooCorrelation, PearsonLoo};
use crate::error::{IscError, Result};
use crate::shift::{leave_one_out_mean, shift_against, stack_pair};
use crate::summary::{summarize, SummaryStatistic};
use crate::timeseries::TimeseriesMatrix;

/// Lags to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LagRange {
    /// `-L..=L`, ascending.
    Symmetric(usize),
    /// Caller-ordered lags.
    Explicit(Vec<i64>),
}

impl LagRange {
    /// The lag axis, in tensor order.
    pub fn values(&self) -> Vec<i64> {
        match self {
            Self::Symmetric(l) => {
                let l = *l as i64;
                (-l..=l).collect()
            }
            Self::Explicit(v) => v.clone(),
        }
    }
}

impl From<usize> for LagRange {
    fn from(l: usize) -> Self {
        Self::Symmetric(l)
    }
}

impl From<Vec<i64>> for LagRange {
    fn from(v: Vec<i64>) -> Self {
        Self::Explicit(v)
    }
}

/// Peak lag per subject, positional or keyed by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeakLags {
    Indexed(Vec<i64>),
    Labeled(BTreeMap<String, i64>),
}

impl PeakLags {
    pub fn len(&self) -> usize {
        match self {
            Self::Indexed(v) => v.len(),
            Self::Labeled(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookup by label; `None` for positional results.
    pub fn get(&self, label: &str) -> Option<i64> {
        match self {
            Self::Indexed(_) => None,
            Self::Labeled(m) => m.get(label).copied(),
        }
    }
}

/// Parameters of one lagged-ISC run.
#[derive(Debug, Clone)]
pub struct LagOptions {
    pub lags: LagRange,
    /// Wrap shifted samples around instead of trimming them.
    pub circular: bool,
    /// Optional labels, one per subject column.
    pub subjects: Option<Vec<String>>,
    pub summary_statistic: SummaryStatistic,
}

impl Default for LagOptions {
    fn default() -> Self {
        Self {
            lags: LagRange::Symmetric(20),
            circular: true,
            subjects: None,
            summary_statistic: SummaryStatistic::None,
        }
    }
}

/// Output of [`lagged_isc`].
#[derive(Debug, Clone)]
pub struct LaggedIsc {
    /// Lag axis of `tensor`.
    pub lags: Vec<i64>,
    /// `[L, V, S]` leave-one-out correlations.
    pub tensor: Array3<f64>,
    pub peak_lags: PeakLags,
    /// `[L, V]` collapse over subjects, when a statistic was requested.
    pub summary: Option<Array2<f64>>,
}

impl LaggedIsc {
    pub fn n_subjects(&self) -> usize {
        self.tensor.dim().2
    }

    /// `[L, V]` lag curve of one subject.
    pub fn lag_curve(&self, subject: usize) -> Option<ArrayView2<'_, f64>> {
        (subject < self.n_subjects()).then(|| self.tensor.index_axis(Axis(2), subject))
    }

    /// `[L, S]` view for single-voxel (ROI) input.
    pub fn roi_matrix(&self) -> Option<ArrayView2<'_, f64>> {
        (self.tensor.dim().1 == 1).then(|| self.tensor.index_axis(Axis(1), 0))
    }

    /// Peak lags in subject order, regardless of labelling.
    pub fn peak_lags_by_index(&self) -> Vec<i64> {
        peaks_over_axis(self.tensor.view(), &self.lags)
    }
}

/// Lag at which each subject's correlations peak.
///
/// Lags are scanned in tensor order and voxels within each lag; the first
/// strict maximum wins, so ties go to the earliest lag.  NaN never wins; a
/// subject with only NaN reports the first lag.
///
/// `lags` must label every row of the tensor's lag axis.
pub fn find_peak_lags(tensor: ArrayView3<f64>, lags: &[i64]) -> Result<Vec<i64>> {
    let n_l = tensor.dim().0;
    if lags.len() != n_l || n_l == 0 {
        return Err(IscError::DimensionMismatch(format!(
            "{} lag values for a tensor with {n_l} lag rows",
            lags.len()
        )));
    }
    Ok(peaks_over_axis(tensor, lags))
}

fn peaks_over_axis(tensor: ArrayView3<f64>, lags: &[i64]) -> Vec<i64> {
    let (n_l, n_v, n_s) = tensor.dim();
    let n_l = n_l.min(lags.len());
    (0..n_s)
        .map(|s| {
            let mut best: Option<(usize, f64)> = None;
            for l in 0..n_l {
                for v in 0..n_v {
                    let r = tensor[[l, v, s]];
                    if r.is_nan() {
                        continue;
                    }
                    if best.map_or(true, |(_, b)| r > b) {
                        best = Some((l, r));
                    }
                }
            }
            match best {
                Some((l, _)) => lags[l],
                None => lags.first().copied().unwrap_or_default(),
            }
        })
        .collect()
}

fn check_inputs(data: &TimeseriesMatrix, opts: &LagOptions, lags: &[i64]) -> Result<()> {
    let n_s = data.n_subjects();
    if n_s < 2 {
        return Err(IscError::DimensionMismatch(format!(
            "lagged ISC needs at least 2 subjects, got {n_s}"
        )));
    }
    if lags.is_empty() {
        return Err(IscError::InvalidConfiguration("empty lag list".into()));
    }
    if let Some(labels) = &opts.subjects {
        if labels.len() != n_s {
            return Err(IscError::DimensionMismatch(format!(
                "{} subject labels for {n_s} subject columns",
                labels.len()
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        if let Some(dup) = labels.iter().find(|l| !seen.insert(l.as_str())) {
            return Err(IscError::InvalidConfiguration(format!(
                "duplicate subject label '{dup}'"
            )));
        }
    }
    if !opts.circular {
        let n_t = data.n_samples();
        if let Some(&lag) = lags.iter().find(|l| l.unsigned_abs() >= n_t as u64) {
            return Err(IscError::InvalidLag { lag, len: n_t });
        }
    }
    Ok(())
}

/// Lagged ISC with the default Pearson leave-one-out primitive.
pub fn lagged_isc(data: &TimeseriesMatrix, opts: &LagOptions) -> Result<LaggedIsc> {
    lagged_isc_with(data, opts, &PearsonLoo)
}

/// Lagged ISC with an injected correlation primitive.
///
/// Either the complete tensor is returned or the first error encountered;
/// primitive failures carry the (lag, subject) cell they came from.
pub fn lagged_isc_with<P>(data: &TimeseriesMatrix, opts: &LagOptions, primitive: &P) -> Result<LaggedIsc>
where
    P: LooCorrelation + ?Sized,
{
    let lags = opts.lags.values();
    check_inputs(data, opts, &lags)?;

    let (n_l, n_v, n_s) = (lags.len(), data.n_voxels(), data.n_subjects());
    debug!(n_lags = n_l, n_voxels = n_v, n_subjects = n_s, circular = opts.circular, "lagged ISC");

    let references: Vec<Array2<f64>> = (0..n_s)
        .into_par_iter()
        .map(|s| leave_one_out_mean(data, s))
        .collect::<Result<_>>()?;

    let cells: Vec<Array1<f64>> = (0..n_l * n_s)
        .into_par_iter()
        .map(|idx| {
            let (l, s) = (idx / n_s, idx % n_s);
            let lag = lags[l];
            let (target, reference) =
                shift_against(data.subject(s), references[s].view(), lag, opts.circular)?;
            let pair = stack_pair(&target, &reference);
            let wrap = |e: IscError| IscError::Primitive { lag, subject: s, source: Box::new(e) };
            let rows = primitive.loo_isc(pair.view()).map_err(wrap)?;
            if rows.nrows() == 0 || rows.ncols() != n_v {
                return Err(wrap(IscError::DimensionMismatch(format!(
                    "primitive returned {:?}, expected [1, {n_v}]",
                    rows.dim()
                ))));
            }
            Ok(rows.row(0).to_owned())
        })
        .collect::<Result<_>>()?;

    let mut tensor = Array3::<f64>::zeros((n_l, n_v, n_s));
    for (idx, row) in cells.iter().enumerate() {
        tensor.slice_mut(s![idx / n_s, .., idx % n_s]).assign(row);
    }

    let peaks = peaks_over_axis(tensor.view(), &lags);
    let peak_lags = match &opts.subjects {
        Some(labels) => PeakLags::Labeled(labels.iter().cloned().zip(peaks).collect()),
        None => PeakLags::Indexed(peaks),
    };

    let summary = match opts.summary_statistic {
        SummaryStatistic::None => None,
        stat => Some(summarize(&tensor, stat, Axis(2))?),
    };

    Ok(LaggedIsc { lags, tensor, peak_lags, summary })
}
