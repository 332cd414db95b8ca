//! Error type for the lagged-ISC core.
//!
//! Every failure is deterministic: the same input always fails the same way,
//! so nothing here is retried.  I/O and orchestration code wraps these in
//! `anyhow::Error` with context.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IscError {
    /// Non-circular shift whose overlap with the reference would be empty.
    #[error("lag {lag} leaves no overlap with a {len}-sample series")]
    InvalidLag { lag: i64, len: usize },

    /// Too few subjects, or shapes that disagree.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Unknown selector or otherwise unusable parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Failure inside the leave-one-out primitive for one (lag, subject) cell.
    #[error("correlation failed at lag {lag}, subject {subject}: {source}")]
    Primitive {
        lag: i64,
        subject: usize,
        #[source]
        source: Box<IscError>,
    },
}

pub type Result<T> = std::result::Result<T, IscError>;
