//! Laser pulse mapped onto the dimensionless time grid
//!
//! The physical pulse width is divided by the time factor `l²/a` and rounded to
//! a whole number of time steps. A zero-energy pulse deposits nothing.

use crate::physics::{Problem, TemporalShape};
use crate::solver::grid::{Grid, Grid2D};

/// Sampled laser power `Φ(t)` on a [`Grid`]
///
/// Integrates to one over the pulse when the laser energy is positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscretePulse {
    shape: TemporalShape,
    width: f64,
    amplitude: f64,
}

impl DiscretePulse {
    pub fn new(problem: &Problem, grid: &Grid) -> Self {
        let pulse = problem.pulse();
        let width = grid.grid_time(pulse.width() / problem.time_factor());
        let amplitude = if pulse.laser_energy() > 0.0 { 1.0 } else { 0.0 };
        Self { shape: pulse.shape(), width, amplitude }
    }

    /// Dimensionless pulse width, a whole number of time steps
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Power at the dimensionless time `t`
    pub fn evaluate_at(&self, time: f64) -> f64 {
        self.amplitude * self.shape.evaluate(time / self.width) / self.width
    }
}

/// [`DiscretePulse`] with the radial profile of the laser spot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscretePulse2D {
    temporal: DiscretePulse,
    /// Spot radius in units of the sample radius
    spot_ratio: f64,
    /// `(d/d_spot)²`, keeps the absorbed energy equal to the 1D case
    factor: f64,
}

impl DiscretePulse2D {
    pub fn new(problem: &Problem, grid: &Grid2D) -> Self {
        let temporal = DiscretePulse::new(problem, grid.base());
        let spot_ratio = (problem.pulse().spot_diameter() / problem.diameter()).min(1.0);
        Self { temporal, spot_ratio, factor: 1.0 / (spot_ratio * spot_ratio) }
    }

    pub fn temporal(&self) -> &DiscretePulse {
        &self.temporal
    }

    /// Power at time `t` and dimensionless radius `r ∈ [0, 1]`
    ///
    /// Full intensity inside the spot, half of it exactly on the edge. A spot
    /// covering the whole face has no edge.
    pub fn evaluate_at(&self, time: f64, radius: f64) -> f64 {
        let radial = if self.spot_ratio >= 1.0 {
            1.0
        } else if (radius - self.spot_ratio).abs() < 1e-10 {
            0.5
        } else if radius < self.spot_ratio {
            1.0
        } else {
            0.0
        };
        self.temporal.evaluate_at(time) * radial * self.factor
    }
}
