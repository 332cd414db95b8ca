/// Shared synthetic signals for the integration tests.
use lagisc::TimeseriesMatrix;
use ndarray::Array2;

/// Broadband periodic signal: five harmonics of a `n`-sample period, so the
/// autocorrelation falls off quickly away from lag 0.
#[allow(unused)]
pub fn broadband(t: f64, n: usize) -> f64 {
    [1.0, 3.0, 5.0, 7.0, 11.0]
        .iter()
        .map(|m| (2.0 * std::f64::consts::PI * m * t / n as f64 + 0.7 * m).sin())
        .sum()
}

#[allow(unused)]
/// `[n, S]` matrix where subject `s` trails the shared signal by `delays[s]`.
pub fn delayed_matrix(n: usize, delays: &[i64]) -> TimeseriesMatrix {
    let data = Array2::from_shape_fn((n, delays.len()), |(t, s)| {
        broadband(t as f64 - delays[s] as f64, n)
    });
    TimeseriesMatrix::from_columns(data).unwrap()
}

#[allow(unused)]
/// Deterministic pseudo-random series (xorshift), no extra dependencies.
pub fn noise(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        })
        .collect()
}

#[allow(unused)]
/// Write a single-row AFNI 1D file with a comment header.
pub fn write_1d(path: &std::path::Path, values: &[f64]) {
    let row: Vec<String> = values.iter().map(|v| format!("{v:.9}")).collect();
    let text = format!("# 3dTproject output\n# history: synthetic\n{}\n", row.join(" "));
    std::fs::write(path, text).unwrap();
}
