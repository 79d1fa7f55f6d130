//! Laser pulse
//!
//! The pulse is described in physical units (width in seconds, spot diameter in
//! metres, energy in joules) and a [`TemporalShape`]. Schemes never use it directly:
//! they build a [`DiscretePulse`](crate::solver::DiscretePulse) that maps the shape
//! onto the dimensionless time grid.

use statrs::function::erf::erf;

use crate::physics::properties::{NumericProperty, NumericPropertyKeyword, PropertyError};

/// Fraction of the pulse width spent rising (and falling) for a trapezoidal pulse
const TRAPEZOID_RISE: f64 = 0.2;

/// Gaussian pulses span ±3σ around the pulse centre
const GAUSSIAN_SIGMAS: f64 = 3.0;

/// Temporal profile of the laser pulse
///
/// Every shape is normalised: the power integrates to one over the unit interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemporalShape {
    #[default]
    Rectangular,
    Triangular,
    Trapezoidal,
    Gaussian,
}

impl TemporalShape {
    /// Normalised power at the fraction `s = t / width` of the pulse
    ///
    /// Zero outside `[0, 1)`.
    pub fn evaluate(self, s: f64) -> f64 {
        if !(0.0..1.0).contains(&s) {
            return 0.0;
        }
        match self {
            TemporalShape::Rectangular => 1.0,
            TemporalShape::Triangular => {
                if s < 0.5 {
                    4.0 * s
                } else {
                    4.0 * (1.0 - s)
                }
            }
            TemporalShape::Trapezoidal => {
                let height = 1.0 / (1.0 - TRAPEZOID_RISE);
                if s < TRAPEZOID_RISE {
                    height * s / TRAPEZOID_RISE
                } else if s < 1.0 - TRAPEZOID_RISE {
                    height
                } else {
                    height * (1.0 - s) / TRAPEZOID_RISE
                }
            }
            TemporalShape::Gaussian => {
                let sigma = 0.5 / GAUSSIAN_SIGMAS;
                let norm = sigma
                    * (2.0 * std::f64::consts::PI).sqrt()
                    * erf(GAUSSIAN_SIGMAS / std::f64::consts::SQRT_2);
                (-(s - 0.5).powi(2) / (2.0 * sigma * sigma)).exp() / norm
            }
        }
    }

    /// Parse the upper-case name used in metafiles
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "RECTANGULAR" => Some(TemporalShape::Rectangular),
            "TRIANGULAR" => Some(TemporalShape::Triangular),
            "TRAPEZOIDAL" => Some(TemporalShape::Trapezoidal),
            "GAUSSIAN" => Some(TemporalShape::Gaussian),
            _ => None,
        }
    }
}

/// Physical description of the laser pulse
#[derive(Debug, Clone, PartialEq)]
pub struct Pulse {
    width: f64,
    spot_diameter: f64,
    laser_energy: f64,
    shape: TemporalShape,
}

impl Default for Pulse {
    fn default() -> Self {
        Self {
            width: NumericPropertyKeyword::PulseWidth.default_value(),
            spot_diameter: NumericPropertyKeyword::SpotDiameter.default_value(),
            laser_energy: NumericPropertyKeyword::LaserEnergy.default_value(),
            shape: TemporalShape::default(),
        }
    }
}

impl Pulse {
    pub fn new(shape: TemporalShape, width: f64) -> Self {
        assert!(width > 0.0, "pulse width must be positive");
        Self { width, shape, ..Default::default() }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn spot_diameter(&self) -> f64 {
        self.spot_diameter
    }

    pub fn laser_energy(&self) -> f64 {
        self.laser_energy
    }

    pub fn shape(&self) -> TemporalShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: TemporalShape) {
        self.shape = shape;
    }

    /// Keywords owned by the pulse
    pub fn keywords() -> &'static [NumericPropertyKeyword] {
        &[
            NumericPropertyKeyword::PulseWidth,
            NumericPropertyKeyword::SpotDiameter,
            NumericPropertyKeyword::LaserEnergy,
        ]
    }

    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        let value = match keyword {
            NumericPropertyKeyword::PulseWidth => self.width,
            NumericPropertyKeyword::SpotDiameter => self.spot_diameter,
            NumericPropertyKeyword::LaserEnergy => self.laser_energy,
            _ => return None,
        };
        Some(NumericProperty::derive(keyword, value))
    }

    pub fn set(
        &mut self,
        keyword: NumericPropertyKeyword,
        property: NumericProperty,
    ) -> Result<(), PropertyError> {
        keyword.require(property.keyword())?;
        keyword.check(property.value())?;
        match keyword {
            NumericPropertyKeyword::PulseWidth => self.width = property.value(),
            NumericPropertyKeyword::SpotDiameter => self.spot_diameter = property.value(),
            NumericPropertyKeyword::LaserEnergy => self.laser_energy = property.value(),
            other => return Err(PropertyError::Unsupported(other)),
        }
        Ok(())
    }
}
