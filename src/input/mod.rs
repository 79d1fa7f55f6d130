//! Experimental data and tabulated inputs
//!
//! - [`ExperimentalData`]: the measured rear-surface signal with its fitting window
//! - [`Range`] / [`IndexRange`]: the fitting window in time and in samples
//! - [`Metadata`]: per-shot experimental parameters read from metafiles
//! - [`InterpolationDataset`]: tabulated material properties (specific heat, density)
//! - [`readers`]: ASCII curve and metafile readers

pub mod data;
pub mod interpolation;
pub mod metadata;
pub mod range;
pub mod readers;

pub use data::ExperimentalData;
pub use interpolation::InterpolationDataset;
pub use metadata::Metadata;
pub use range::{IndexRange, Range};
pub use readers::{parse_curve, parse_metadata, read_curve, read_metadata};

use thiserror::Error;

use crate::physics::PropertyError;

/// Errors raised while building or reading experimental inputs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("no data points")]
    Empty,

    #[error("time has {time} points but signal has {signal}")]
    LengthMismatch { time: usize, signal: usize },

    #[error("non-finite value at index {0}")]
    NonFinite(usize),

    #[error("time is not strictly increasing at index {0}")]
    NotIncreasing(usize),

    #[error("invalid index range [{lower}, {upper}) over {len} points")]
    InvalidIndexRange { lower: usize, upper: usize, len: usize },

    #[error("{key} lies outside the tabulated domain [{min}, {max}]")]
    OutOfDomain { key: f64, min: f64, max: f64 },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("metafile has no row for shot {0}")]
    MissingShot(u32),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Io(err.to_string())
    }
}
