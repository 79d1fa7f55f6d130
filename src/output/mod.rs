//! Output of results
//!
//! - [`export`]: CSV tables of heating curves and fits, with optional metadata headers
//! - [`visualization`]: PNG/SVG charts of the model against the experiment
//!
//! Both work from a [`HeatingCurve`](crate::physics::HeatingCurve) or a
//! [`FitResult`](crate::tasks::FitResult); nothing here feeds back into a fit.

pub mod export;
pub mod visualization;

pub use export::{CsvConfig, CsvError, CsvExporter, CsvMetadata, Exporter};
pub use visualization::{plot_fit, plot_heating_curve, PlotConfig};
