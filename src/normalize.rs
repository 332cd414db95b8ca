//! Event trimming and z-score normalisation.
//!
//! `trim_to_event` — matches `x[onset:onset + duration][initial_trim:]`,
//!   clamped to the series length like slice indexing.
//!
//! `zscore_inplace` — matches `scipy.stats.zscore` (ddof=0):
//!   data = (data - μ) / σ
//!
//! `zscore_columns_inplace` — the same per column of a `[T, V]` block.
use ndarray::{s, Array1, Array2, ArrayBase, DataMut, Ix1};

/// Cut the stimulus window out of a run, then drop `initial_trim` samples
/// from its start.
pub fn trim_to_event(
    series: &Array1<f64>,
    onset: usize,
    duration: usize,
    initial_trim: usize,
) -> Array1<f64> {
    let n = series.len();
    let start = (onset.saturating_add(initial_trim)).min(n);
    let stop = onset.saturating_add(duration).min(n).max(start);
    series.slice(s![start..stop]).to_owned()
}

/// Row-wise variant of [`trim_to_event`] for `[T, V]` blocks.
pub fn trim_block_to_event(
    block: &Array2<f64>,
    onset: usize,
    duration: usize,
    initial_trim: usize,
) -> Array2<f64> {
    let n = block.nrows();
    let start = (onset.saturating_add(initial_trim)).min(n);
    let stop = onset.saturating_add(duration).min(n).max(start);
    block.slice(s![start..stop, ..]).to_owned()
}

/// Z-score a single series.  Returns the (mean, std) used.
/// A constant series is left untouched and reports `std = 0`.
pub fn zscore_inplace<S>(x: &mut ArrayBase<S, Ix1>) -> (f64, f64)
where
    S: DataMut<Elem = f64>,
{
    let n = x.len() as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = x.sum() / n;
    let var = x.iter().map(|&v| {
        let d = v - mean; d * d
    }).sum::<f64>() / n;
    let std = var.sqrt();

    if std > 0.0 {
        x.mapv_inplace(|v| (v - mean) / std);
    }
    (mean, std)
}

/// Z-score every column of a `[T, V]` block independently.
pub fn zscore_columns_inplace(block: &mut Array2<f64>) {
    for mut col in block.columns_mut() {
        zscore_inplace(&mut col);
    }
}
