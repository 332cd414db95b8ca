//! Leave-one-out intersubject correlation.
//!
//! The lagged engine treats the LOO statistic as an injected capability
//! ([`LooCorrelation`]) so it can be swapped for another implementation.
//! [`PearsonLoo`] is the default: each subject is correlated against the
//! mean of all other subjects, voxel by voxel.  With exactly two subjects
//! the two leave-one-out correlations coincide and a single pairwise row is
//! returned.
use ndarray::{Array1, Array2, ArrayView1, ArrayView3, Axis};

use crate::error::{IscError, Result};
use crate::timeseries::TimeseriesMatrix;

/// Pearson correlation of two equal-length series.
///
/// Returns NaN when either series has zero variance (or is empty).
pub fn pearson(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len();
    if n == 0 || n != y.len() {
        return f64::NAN;
    }
    let mx = x.sum() / n as f64;
    let my = y.sum() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y.iter()) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom > 0.0 {
        (sxy / denom).clamp(-1.0, 1.0)
    } else {
        f64::NAN
    }
}

/// A group correlation statistic over a `[T, V, S]` array.
///
/// Implementations return `[S', V]`: one row per subject, or a single row
/// when `S == 2`.
pub trait LooCorrelation: Sync {
    fn loo_isc(&self, data: ArrayView3<f64>) -> Result<Array2<f64>>;
}

/// Pearson correlation against the mean of the remaining subjects.
///
/// Series shorter than two samples have no variance and correlate as NaN,
/// so the widest non-circular lags yield NaN cells rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PearsonLoo;

impl LooCorrelation for PearsonLoo {
    fn loo_isc(&self, data: ArrayView3<f64>) -> Result<Array2<f64>> {
        let (_, n_v, n_s) = data.dim();
        if n_s < 2 {
            return Err(IscError::DimensionMismatch(format!(
                "leave-one-out ISC needs at least 2 subjects, got {n_s}"
            )));
        }

        if n_s == 2 {
            let a = data.index_axis(Axis(2), 0);
            let b = data.index_axis(Axis(2), 1);
            let row = Array1::from_iter((0..n_v).map(|v| pearson(a.column(v), b.column(v))));
            return Ok(row.insert_axis(Axis(0)));
        }

        let total = data.sum_axis(Axis(2)); // [T, V]
        let inv_rest = 1.0 / (n_s - 1) as f64;
        let mut out = Array2::<f64>::zeros((n_s, n_v));
        for s in 0..n_s {
            let subj = data.index_axis(Axis(2), s);
            let rest = (&total - &subj) * inv_rest;
            for v in 0..n_v {
                out[[s, v]] = pearson(subj.column(v), rest.column(v));
            }
        }
        Ok(out)
    }
}

/// Non-lagged ROI ISC: one leave-one-out correlation per subject.
///
/// Multi-voxel input yields the flattened `[S' * V]` values in subject-major
/// order.
pub fn roi_isc(data: &TimeseriesMatrix) -> Result<Array1<f64>> {
    let iscs = PearsonLoo.loo_isc(data.view())?;
    Ok(Array1::from_iter(iscs.iter().copied()))
}
