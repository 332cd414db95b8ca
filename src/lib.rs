//! # lagisc — lagged intersubject correlation for naturalistic fMRI
//!
//! `lagisc` computes leave-one-out intersubject correlation (ISC) of ROI
//! timeseries recorded while subjects listen to the same story, and the
//! **lagged** variant: each subject is shifted against the mean of everyone
//! else over a symmetric range of lags, and the lag with the highest
//! correlation flags subjects whose responses are out of step with the group.
//!
//! ## Pipeline overview
//!
//! ```text
//! sub-XXX_task-YYY_..._roi-EAC_desc-clean_timeseries.1D
//!   │
//!   ├─ io::load_1d()               AFNI 1D reader (comment lines skipped)
//!   ├─ normalize::trim_to_event()  stimulus window, then initial-TR trim
//!   ├─ normalize::zscore_inplace() (x − μ) / σ, ddof = 0
//!   ├─ TimeseriesMatrix            [T, V, S]
//!   │
//!   ├─ lags::lagged_isc()          shift × leave-one-out correlation
//!   │    ├─ shift::shift_pair()      circular rotate or trim
//!   │    └─ LooCorrelation           Pearson vs. rest-of-group mean
//!   │
//!   └─→ LaggedIsc { lags, tensor [L, V, S], peak_lags, summary [L, V] }
//! ```
//!
//! ## Quick start
//!
//! ```
//! use lagisc::{lagged_isc, LagOptions, LagRange, PeakLags, TimeseriesMatrix};
//! use ndarray::Array2;
//!
//! // Four subjects hearing the same broadband signal; subject 2 trails the
//! // others by 3 samples.
//! let delays = [0.0, 0.0, 3.0, 0.0];
//! let data = Array2::from_shape_fn((40, 4), |(t, s)| {
//!     let tt = t as f64 - delays[s];
//!     [1.0, 3.0, 5.0, 7.0, 11.0]
//!         .iter()
//!         .map(|m| (2.0 * std::f64::consts::PI * m * tt / 40.0 + 0.7 * m).sin())
//!         .sum::<f64>()
//! });
//! let matrix = TimeseriesMatrix::from_columns(data).unwrap();
//!
//! let opts = LagOptions { lags: LagRange::Symmetric(5), ..LagOptions::default() };
//! let res = lagged_isc(&matrix, &opts).unwrap();
//!
//! assert_eq!(res.tensor.dim(), (11, 1, 4));
//! assert_eq!(res.peak_lags, PeakLags::Indexed(vec![0, 0, 3, 0]));
//! ```
//!
//! ## Sign convention
//!
//! At lag `k` the target's sample `t + k` is compared with the group's
//! sample `t`, in both circular and non-circular mode.  A positive peak lag
//! means the subject trails the group.
//!
//! ## Running a whole dataset
//!
//! ```no_run
//! use lagisc::{pipeline, AnalysisConfig, Manifest};
//! use std::path::Path;
//!
//! let manifest = Manifest::load(Path::new("derivatives/afni-nosmooth/manifest.json")).unwrap();
//! let outcome  = pipeline::run_lags(&manifest, &AnalysisConfig::default());
//! outcome.results.write_json(Path::new("group_roi-EAC_lags.json")).unwrap();
//! ```

pub mod config;
pub mod correlation;
pub mod error;
pub mod io;
pub mod lags;
pub mod normalize;
pub mod pipeline;
pub mod results;
pub mod shift;
pub mod summary;
pub mod timeseries;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::AnalysisConfig;

// core
pub use correlation::{pearson, roi_isc, LooCorrelation, PearsonLoo};
pub use error::IscError;
pub use lags::{find_peak_lags, lagged_isc, lagged_isc_with, LagOptions, LagRange, LaggedIsc, PeakLags};
pub use shift::{circular_shift, leave_one_out_mean, shift_against, shift_pair};
pub use summary::{fisher_mean, summarize, SummaryStatistic};
pub use timeseries::TimeseriesMatrix;

// io / preprocessing
pub use io::{load_1d, parse_1d, write_json, EventWindow, Manifest, ScanEntry, TaskEntry};
pub use normalize::{trim_block_to_event, trim_to_event, zscore_columns_inplace, zscore_inplace};

// results
pub use pipeline::{run_isc, run_lags, Outcome};
pub use results::{HemiLags, IscResults, LagResults};
