//! Lag shifting of one subject against the rest of the group.
//!
//! Sign convention: at lag `k`, target sample `t + k` is paired with
//! reference sample `t`.  A positive lag therefore compensates for a target
//! that trails the group by `k` samples.
//!
//! * circular     — `target[t] = x[(t + k) mod T]`, full length kept
//! * non-circular — `k > 0`: `x[k..]` vs `mean[..T-k]`
//!                  `k < 0`: `x[..T-|k|]` vs `mean[|k|..]`
use ndarray::{s, Array2, ArrayView2, Axis, Zip};

use crate::error::{IscError, Result};
use crate::timeseries::TimeseriesMatrix;

/// Mean over every subject except `subject`, `[T, V]`.
pub fn leave_one_out_mean(data: &TimeseriesMatrix, subject: usize) -> Result<Array2<f64>> {
    let n_s = data.n_subjects();
    if n_s < 2 {
        return Err(IscError::DimensionMismatch(format!(
            "leave-one-out mean needs at least 2 subjects, got {n_s}"
        )));
    }
    if subject >= n_s {
        return Err(IscError::DimensionMismatch(format!(
            "subject index {subject} out of range for {n_s} subjects"
        )));
    }
    let view = data.view();
    let mut acc = Array2::<f64>::zeros((data.n_samples(), data.n_voxels()));
    for (s, block) in view.axis_iter(Axis(2)).enumerate() {
        if s != subject {
            acc += &block;
        }
    }
    acc /= (n_s - 1) as f64;
    Ok(acc)
}

/// Rotate a `[T, V]` block along time so that `out[t] = x[(t + k) mod T]`.
pub fn circular_shift(x: ArrayView2<f64>, lag: i64) -> Array2<f64> {
    let n = x.nrows();
    if n == 0 {
        return x.to_owned();
    }
    let k = lag.rem_euclid(n as i64) as usize;
    if k == 0 {
        return x.to_owned();
    }
    let mut out = Array2::<f64>::zeros(x.raw_dim());
    out.slice_mut(s![..n - k, ..]).assign(&x.slice(s![k.., ..]));
    out.slice_mut(s![n - k.., ..]).assign(&x.slice(s![..k, ..]));
    out
}

/// Trim `target` and `reference` to their overlap at `lag`.
fn trim_pair(
    target: ArrayView2<f64>,
    reference: ArrayView2<f64>,
    lag: i64,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let n = target.nrows();
    let k = lag.unsigned_abs() as usize;
    if lag.unsigned_abs() >= n as u64 {
        return Err(IscError::InvalidLag { lag, len: n });
    }
    let pair = if lag > 0 {
        (target.slice(s![k.., ..]), reference.slice(s![..n - k, ..]))
    } else {
        (target.slice(s![..n - k, ..]), reference.slice(s![k.., ..]))
    };
    Ok((pair.0.to_owned(), pair.1.to_owned()))
}

/// Aligned `(target, reference)` fragments for one subject at one lag.
///
/// Both fragments are `[T', V]` with `T' = T` in circular mode and
/// `T' = T - |lag|` otherwise.
pub fn shift_pair(
    data: &TimeseriesMatrix,
    subject: usize,
    lag: i64,
    circular: bool,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let reference = leave_one_out_mean(data, subject)?;
    shift_against(data.subject(subject), reference.view(), lag, circular)
}

/// Shift `target` against an already computed `reference` of the same shape.
pub fn shift_against(
    target: ArrayView2<f64>,
    reference: ArrayView2<f64>,
    lag: i64,
    circular: bool,
) -> Result<(Array2<f64>, Array2<f64>)> {
    if target.dim() != reference.dim() {
        return Err(IscError::DimensionMismatch(format!(
            "target {:?} and reference {:?} differ in shape",
            target.dim(),
            reference.dim()
        )));
    }
    if circular {
        Ok((circular_shift(target, lag), reference.to_owned()))
    } else {
        trim_pair(target, reference, lag)
    }
}

/// Stack a target/reference pair as a two-subject `[T', V, 2]` array.
pub(crate) fn stack_pair(target: &Array2<f64>, reference: &Array2<f64>) -> ndarray::Array3<f64> {
    let (n_t, n_v) = target.dim();
    let mut out = ndarray::Array3::<f64>::zeros((n_t, n_v, 2));
    Zip::from(out.index_axis_mut(Axis(2), 0)).and(target).for_each(|o, &v| *o = v);
    Zip::from(out.index_axis_mut(Axis(2), 1)).and(reference).for_each(|o, &v| *o = v);
    out
}
