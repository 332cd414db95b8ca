mod common;
use common::{delayed_matrix, noise};
use lagisc::{
    lagged_isc, lagged_isc_with, IscError, LagOptions, LagRange, LooCorrelation, PeakLags,
    SummaryStatistic, TimeseriesMatrix,
};
use ndarray::{Array2, Array3, ArrayView3};

fn opts(lags: usize, circular: bool) -> LagOptions {
    LagOptions { lags: LagRange::Symmetric(lags), circular, ..LagOptions::default() }
}

#[test]
fn symmetric_lag_axis_and_shape() {
    let m = delayed_matrix(40, &[0, 0, 0]);
    let res = lagged_isc(&m, &opts(4, true)).unwrap();
    assert_eq!(res.lags, vec![-4, -3, -2, -1, 0, 1, 2, 3, 4]);
    assert_eq!(res.tensor.dim(), (9, 1, 3));
    assert_eq!(res.roi_matrix().unwrap().dim(), (9, 3));
}

#[test]
fn delayed_subject_peaks_at_its_delay() {
    let m = delayed_matrix(40, &[0, 0, 3, 0]);
    let res = lagged_isc(&m, &opts(5, true)).unwrap();
    assert_eq!(res.peak_lags, PeakLags::Indexed(vec![0, 0, 3, 0]));
    // Remaining subjects average to the undelayed signal exactly.
    approx::assert_abs_diff_eq!(res.tensor[[8, 0, 2]], 1.0, epsilon = 1e-12);
}

#[test]
fn leading_subject_peaks_at_negative_lag() {
    let m = delayed_matrix(40, &[0, -2, 0, 0]);
    let res = lagged_isc(&m, &opts(5, false)).unwrap();
    assert_eq!(res.peak_lags_by_index(), vec![0, -2, 0, 0]);
}

#[test]
fn identical_pair_is_perfect_at_lag_zero() {
    let x: Vec<f64> = noise(10, 11);
    let data = Array2::from_shape_fn((10, 2), |(t, _)| x[t]);
    let m = TimeseriesMatrix::from_columns(data).unwrap();
    let res = lagged_isc(&m, &opts(2, true)).unwrap();
    for s in 0..2 {
        approx::assert_abs_diff_eq!(res.tensor[[2, 0, s]], 1.0, epsilon = 1e-12);
    }
    assert_eq!(res.peak_lags, PeakLags::Indexed(vec![0, 0]));
}

#[test]
fn lag_longer_than_series_rejected_when_trimming() {
    let data = Array2::from_shape_fn((5, 2), |(t, s)| (t + s) as f64);
    let m = TimeseriesMatrix::from_columns(data).unwrap();
    match lagged_isc(&m, &opts(10, false)) {
        Err(IscError::InvalidLag { lag, len }) => {
            assert_eq!(len, 5);
            assert!(lag.unsigned_abs() >= 5);
        }
        other => panic!("expected InvalidLag, got {other:?}"),
    }
    // Circular shifts wrap, so the same range is fine.
    assert_eq!(lagged_isc(&m, &opts(10, true)).unwrap().tensor.dim(), (21, 1, 2));
}

#[test]
fn widest_trimmed_lag_yields_nan_cells() {
    let m = delayed_matrix(5, &[0, 0, 1]);
    let res = lagged_isc(&m, &opts(4, false)).unwrap();
    assert_eq!(res.tensor.dim(), (9, 1, 3));
    for s in 0..3 {
        // A single overlapping sample has no variance.
        assert!(res.tensor[[0, 0, s]].is_nan());
        assert!(res.tensor[[8, 0, s]].is_nan());
        assert!(res.tensor[[4, 0, s]].is_finite());
    }
    assert!(res.peak_lags_by_index().iter().all(|l| l.abs() < 4));
}

#[test]
fn single_subject_rejected() {
    let m = TimeseriesMatrix::from_columns(Array2::zeros((20, 1))).unwrap();
    assert!(matches!(lagged_isc(&m, &opts(2, true)), Err(IscError::DimensionMismatch(_))));
}

#[test]
fn ties_resolve_to_most_negative_lag() {
    // Period-4 signal: lags -4, 0 and 4 are indistinguishable under rotation.
    let data = Array2::from_shape_fn((16, 3), |(t, _)| [1.0, 0.0, -1.0, 0.5][t % 4]);
    let m = TimeseriesMatrix::from_columns(data).unwrap();
    let res = lagged_isc(&m, &opts(4, true)).unwrap();
    assert_eq!(res.peak_lags, PeakLags::Indexed(vec![-4, -4, -4]));
}

#[test]
fn labels_key_the_peak_map() {
    let m = delayed_matrix(40, &[0, 3, 0]);
    let o = LagOptions {
        subjects: Some(vec!["sub-001".into(), "sub-002".into(), "sub-003".into()]),
        ..opts(5, true)
    };
    let res = lagged_isc(&m, &o).unwrap();
    assert_eq!(res.peak_lags.len(), 3);
    assert_eq!(res.peak_lags.get("sub-002"), Some(3));
    assert_eq!(res.peak_lags.get("sub-003"), Some(0));
}

#[test]
fn fisher_summary_alongside_tensor() {
    let m = delayed_matrix(40, &[0, 0, 0, 0]);
    let o = LagOptions { summary_statistic: SummaryStatistic::FisherMean, ..opts(3, true) };
    let res = lagged_isc(&m, &o).unwrap();
    let summary = res.summary.as_ref().unwrap();
    assert_eq!(summary.dim(), (7, 1));
    assert_eq!(res.tensor.dim(), (7, 1, 4));
    for l in 0..7 {
        let lane = res.tensor.slice(ndarray::s![l, 0, ..]);
        let expect = (lane.mapv(f64::atanh).sum() / 4.0).tanh();
        if expect.is_finite() {
            approx::assert_abs_diff_eq!(summary[[l, 0]], expect, epsilon = 1e-12);
        }
    }
}

#[test]
fn multi_voxel_tensor_has_voxel_axis() {
    let n = 40;
    let data = Array3::from_shape_fn((n, 2, 3), |(t, v, s)| {
        let delay = if s == 1 { 2.0 } else { 0.0 };
        common::broadband(t as f64 - delay + v as f64 * 5.0, n)
    });
    let m = TimeseriesMatrix::new(data).unwrap();
    let res = lagged_isc(&m, &opts(3, true)).unwrap();
    assert_eq!(res.tensor.dim(), (7, 2, 3));
    assert!(res.roi_matrix().is_none());
    assert_eq!(res.lag_curve(1).unwrap().dim(), (7, 2));
    assert_eq!(res.peak_lags_by_index()[1], 2);
}

/// Substitute primitive: covariance instead of correlation.
struct Covariance;

impl LooCorrelation for Covariance {
    fn loo_isc(&self, data: ArrayView3<f64>) -> lagisc::error::Result<Array2<f64>> {
        let (n_t, n_v, _) = data.dim();
        let mut out = Array2::zeros((1, n_v));
        for v in 0..n_v {
            let a = data.slice(ndarray::s![.., v, 0]);
            let b = data.slice(ndarray::s![.., v, 1]);
            let (ma, mb) = (a.mean().unwrap(), b.mean().unwrap());
            out[[0, v]] = a.iter().zip(b.iter()).map(|(x, y)| (x - ma) * (y - mb)).sum::<f64>()
                / n_t as f64;
        }
        Ok(out)
    }
}

#[test]
fn injected_primitive_is_used() {
    let m = delayed_matrix(40, &[0, 0, 2]);
    let res = lagged_isc_with(&m, &opts(3, true), &Covariance).unwrap();
    // Covariance of the raw broadband signal exceeds 1 at the aligned lag.
    assert!(res.tensor[[5, 0, 2]] > 1.0);
    assert_eq!(res.peak_lags_by_index()[2], 2);
}
