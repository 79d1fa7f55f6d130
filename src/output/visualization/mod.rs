//! Charts of heating curves and fits, rendered with `plotters`
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pulse_rs::output::visualization::{plot_fit, PlotConfig};
//! # fn result() -> pulse_rs::tasks::FitResult { unimplemented!() }
//!
//! let config = PlotConfig::fit("Shot 1");
//! plot_fit(&result(), Path::new("shot1.svg"), Some(&config)).unwrap();
//! ```

pub mod config;
pub mod plots;

pub use config::PlotConfig;
pub use plots::{plot_fit, plot_heating_curve};
