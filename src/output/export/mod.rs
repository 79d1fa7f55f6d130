//! Export of heating curves and fit results
//!
//! The [`Exporter`] trait abstracts the file format; each format lives in its
//! own sub-module. Only CSV is provided.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pulse_rs::output::export::{CsvConfig, CsvExporter, CsvMetadata, Exporter};
//! # fn result() -> pulse_rs::tasks::FitResult { unimplemented!() }
//!
//! let result = result();
//! let config = CsvConfig::default().with_metadata(CsvMetadata::from_fit(&result));
//! let exporter = CsvExporter::new(config);
//! exporter.export_fit(&result, Path::new("fit.csv")).unwrap();
//! exporter.export_curve(&result.curve, Path::new("curve.csv")).unwrap();
//! ```

pub mod csv;

pub use csv::{write_table, CsvConfig, CsvError, CsvExporter, CsvMetadata};

use std::path::Path;

use crate::physics::HeatingCurve;
use crate::tasks::FitResult;

/// File format for results
///
/// Each format reports its own error type through `Error`, so callers can
/// react to it without downcasting.
pub trait Exporter {
    type Error: std::error::Error;

    /// Time and temperature columns of a solution
    fn export_curve(&self, curve: &HeatingCurve, path: &Path) -> Result<(), Self::Error>;

    /// Time, signal, model and residual columns over the fitting window
    fn export_fit(&self, result: &FitResult, path: &Path) -> Result<(), Self::Error>;
}
