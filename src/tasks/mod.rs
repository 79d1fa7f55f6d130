//! Fitting tasks and their execution
//!
//! A [`SearchTask`] bundles a problem, a scheme, a measurement and the search
//! settings; [`SearchTask::run`] fits the problem to the measurement and returns
//! a [`FitResult`] with statistics and advisory [`Details`].
//!
//! The [`TaskManager`] runs many tasks side by side on a bounded worker pool.
//! Each run is single-threaded; parallelism is across tasks only. Results are
//! keyed by [`TaskId`], so completion order does not matter.
//!
//! # Example
//!
//! ```rust,no_run
//! use pulse_rs::input::read_curve;
//! use pulse_rs::physics::Problem;
//! use pulse_rs::search::SearchConfiguration;
//! use pulse_rs::solver::SchemeConfiguration;
//! use pulse_rs::tasks::{SearchTask, TaskManager};
//!
//! let manager = TaskManager::new().unwrap();
//! for path in ["shot1.dat", "shot2.dat"] {
//!     let data = read_curve(path, 1.0).unwrap();
//!     let task = SearchTask::from_data(
//!         Problem::default(),
//!         SchemeConfiguration::default(),
//!         data,
//!         SearchConfiguration::default(),
//!     )
//!     .unwrap();
//!     manager.add_task(task);
//! }
//!
//! manager.execute_all();
//! for (id, result) in manager.results() {
//!     println!("{}: R² = {:.4}", id, result.r_squared);
//! }
//! ```

pub mod manager;
pub mod result;
pub mod status;
pub mod task;

pub use manager::{Listener, TaskEvent, TaskManager};
pub use result::{FitResult, MaterialData};
pub use status::{Details, TaskStatus};
pub use task::{SearchTask, TaskError, TaskId};
