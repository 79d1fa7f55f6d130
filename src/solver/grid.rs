//! Finite-difference grids on the dimensionless domain
//!
//! The sample thickness maps to `[0, 1]` with `N` intervals, so `hx = 1/N`.
//! The time step follows from the space step: `τ = τ_F·hx²`. Output sampling
//! is expressed as a whole number of time steps between two curve points.

use crate::physics::NumericPropertyKeyword;

/// 1D grid: space step `hx = 1/N` and time step `τ = τ_F·hx²`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    density: usize,
    hx: f64,
    tau_factor: f64,
    tau: f64,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(
            NumericPropertyKeyword::GridDensity.default_value() as usize,
            NumericPropertyKeyword::TauFactor.default_value(),
        )
    }
}

impl Grid {
    pub fn new(density: usize, tau_factor: f64) -> Self {
        assert!(density >= 2, "grid density must be at least 2");
        assert!(tau_factor > 0.0, "time factor must be positive");
        let hx = 1.0 / density as f64;
        Self { density, hx, tau_factor, tau: tau_factor * hx * hx }
    }

    pub fn density(&self) -> usize {
        self.density
    }

    pub fn hx(&self) -> f64 {
        self.hx
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn tau_factor(&self) -> f64 {
        self.tau_factor
    }

    /// Change `τ_F` and recompute the time step
    pub fn set_tau_factor(&mut self, tau_factor: f64) {
        assert!(tau_factor > 0.0, "time factor must be positive");
        self.tau_factor = tau_factor;
        self.tau = tau_factor * self.hx * self.hx;
    }

    /// Round a dimensionless time to a whole number of steps, at least one
    pub fn grid_time(&self, time: f64) -> f64 {
        (time / self.tau).round().max(1.0) * self.tau
    }

    /// Time steps between two consecutive output points
    ///
    /// `max(1, ⌊(t_lim/τ)/(n − 1)⌋)` for `n` output points over the dimensionless
    /// time limit `t_lim`.
    pub fn time_interval(&self, time_limit: f64, num_points: usize) -> usize {
        let steps = time_limit / self.tau;
        // absorbs the rounding of τ = τ_F·hx² before flooring
        let interval = steps / (num_points.max(2) - 1) as f64 + 1e-9;
        (interval.floor() as usize).max(1)
    }

    /// Coordinate of node `i`
    pub fn node(&self, i: usize) -> f64 {
        i as f64 * self.hx
    }
}

/// Square 2D grid: radius and thickness share the density `N`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid2D {
    grid: Grid,
    hy: f64,
}

impl Grid2D {
    pub fn new(density: usize, tau_factor: f64) -> Self {
        let grid = Grid::new(density, tau_factor);
        Self { grid, hy: grid.hx() }
    }

    /// Radial step
    pub fn hx(&self) -> f64 {
        self.grid.hx()
    }

    /// Axial (thickness) step
    pub fn hy(&self) -> f64 {
        self.hy
    }

    pub fn density(&self) -> usize {
        self.grid.density()
    }

    pub fn tau(&self) -> f64 {
        self.grid.tau()
    }

    /// Underlying 1D grid (time stepping)
    pub fn base(&self) -> &Grid {
        &self.grid
    }
}
