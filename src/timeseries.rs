//! Multi-subject response matrix.
//!
//! Data is stored as `[T, V, S]` (time × voxels × subjects).  ROI analyses
//! average over the region first, so they arrive as `[T, S]` and are lifted
//! to `V = 1`.
use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::error::{IscError, Result};

/// Trimmed, z-scored responses for every subject (or run) in one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesMatrix {
    data: Array3<f64>,
}

impl TimeseriesMatrix {
    /// Wrap a `[T, V, S]` array.  Rejects arrays with no samples, voxels or
    /// subjects.
    pub fn new(data: Array3<f64>) -> Result<Self> {
        let (n_t, n_v, n_s) = data.dim();
        if n_t == 0 || n_v == 0 || n_s == 0 {
            return Err(IscError::DimensionMismatch(format!(
                "empty response array of shape [{n_t}, {n_v}, {n_s}]"
            )));
        }
        Ok(Self { data })
    }

    /// Lift a `[T, S]` ROI matrix to `[T, 1, S]`.
    pub fn from_columns(data: Array2<f64>) -> Result<Self> {
        Self::new(data.insert_axis(Axis(1)))
    }

    /// Stack one series per subject as columns.  All series must share the
    /// same length.
    pub fn from_series(series: &[Array1<f64>]) -> Result<Self> {
        let first = series.first().ok_or_else(|| {
            IscError::DimensionMismatch("no subject series supplied".into())
        })?;
        let n_t = first.len();
        if let Some((s, bad)) = series.iter().enumerate().find(|(_, x)| x.len() != n_t) {
            return Err(IscError::DimensionMismatch(format!(
                "subject {s} has {} samples, expected {n_t}",
                bad.len()
            )));
        }
        let mut out = Array2::<f64>::zeros((n_t, series.len()));
        for (mut col, x) in out.columns_mut().into_iter().zip(series) {
            col.assign(x);
        }
        Self::from_columns(out)
    }

    /// Stack per-subject `[T, V]` blocks along a new subject axis.
    pub fn from_blocks(blocks: &[Array2<f64>]) -> Result<Self> {
        let first = blocks.first().ok_or_else(|| {
            IscError::DimensionMismatch("no subject blocks supplied".into())
        })?;
        let dim = first.dim();
        if let Some((s, bad)) = blocks.iter().enumerate().find(|(_, b)| b.dim() != dim) {
            return Err(IscError::DimensionMismatch(format!(
                "subject {s} has shape {:?}, expected {:?}",
                bad.dim(),
                dim
            )));
        }
        let views: Vec<ArrayView2<f64>> = blocks.iter().map(|b| b.view()).collect();
        let data = ndarray::stack(Axis(2), &views)
            .map_err(|e| IscError::DimensionMismatch(e.to_string()))?;
        Self::new(data)
    }

    pub fn n_samples(&self) -> usize {
        self.data.dim().0
    }

    pub fn n_voxels(&self) -> usize {
        self.data.dim().1
    }

    pub fn n_subjects(&self) -> usize {
        self.data.dim().2
    }

    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// `[T, V]` responses of one subject.
    pub fn subject(&self, s: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(2), s)
    }

    pub fn into_inner(self) -> Array3<f64> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn columns_lift_to_single_voxel() {
        let m = TimeseriesMatrix::from_columns(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
        assert_eq!((m.n_samples(), m.n_voxels(), m.n_subjects()), (3, 1, 2));
        assert_eq!(m.subject(1)[[2, 0]], 6.0);
    }

    #[test]
    fn series_of_unequal_length_rejected() {
        let err = TimeseriesMatrix::from_series(&[array![1.0, 2.0, 3.0], array![1.0, 2.0]]);
        assert!(matches!(err, Err(IscError::DimensionMismatch(_))));
    }

    #[test]
    fn blocks_stack_on_subject_axis() {
        let a = Array2::from_elem((4, 3), 1.0);
        let b = Array2::from_elem((4, 3), 2.0);
        let m = TimeseriesMatrix::from_blocks(&[a, b]).unwrap();
        assert_eq!(m.view().dim(), (4, 3, 2));
        assert_eq!(m.subject(1)[[0, 0]], 2.0);

        let bad = Array2::from_elem((5, 3), 0.0);
        let err = TimeseriesMatrix::from_blocks(&[Array2::zeros((4, 3)), bad]);
        assert!(matches!(err, Err(IscError::DimensionMismatch(_))));
    }

    #[test]
    fn empty_input_rejected() {
        assert!(TimeseriesMatrix::from_series(&[]).is_err());
        assert!(TimeseriesMatrix::new(Array3::zeros((0, 1, 2))).is_err());
    }
}
