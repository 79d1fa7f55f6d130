//! Tagged numeric properties
//!
//! Every physical or numerical quantity exchanged with the core is a
//! [`NumericProperty`]: a [`NumericPropertyKeyword`] plus a value in SI units and an
//! optional error bound. The keyword carries the static definition of the quantity
//! (default value, sensible bounds, display dimension factor, abbreviation).
//!
//! Setters throughout the crate take a `(keyword, property)` pair and reject the
//! property when its keyword is not the one being set. This keeps the property
//! system strongly typed at runtime without reflection.
//!
//! # Example
//!
//! ```rust
//! use pulse_rs::physics::{NumericProperty, NumericPropertyKeyword};
//!
//! let a = NumericProperty::new(NumericPropertyKeyword::Diffusivity, 2.5e-6).unwrap();
//! assert_eq!(a.keyword(), NumericPropertyKeyword::Diffusivity);
//! assert!((a.display_value() - 2.5).abs() < 1e-12); // mm²/s
//!
//! // Outside the sensible range
//! assert!(NumericProperty::new(NumericPropertyKeyword::Emissivity, 1.5).is_err());
//! ```

use std::fmt;
use thiserror::Error;

// =================================================================================================
// Errors
// =================================================================================================

/// Errors raised by the property system
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    /// A property tagged with one keyword was passed to the setter of another
    #[error("illegal property: expected {expected}, got {found}")]
    KeywordMismatch {
        expected: NumericPropertyKeyword,
        found: NumericPropertyKeyword,
    },

    /// The value is not finite or lies outside the sensible bounds of its keyword
    #[error("{keyword} = {value} is outside the sensible range [{min}, {max}]")]
    OutOfRange {
        keyword: NumericPropertyKeyword,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The target object does not own this property
    #[error("{0} is not a property of this object")]
    Unsupported(NumericPropertyKeyword),

    /// No keyword with this name exists
    #[error("unknown property keyword '{0}'")]
    UnknownKeyword(String),
}

// =================================================================================================
// Keywords
// =================================================================================================

/// Static description of a keyword
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Definition {
    pub default: f64,
    pub min: f64,
    pub max: f64,
    /// Factor converting the SI value to its display unit
    pub dimension_factor: f64,
    pub abbreviation: &'static str,
    pub unit: &'static str,
    pub discrete: bool,
}

const fn def(
    default: f64,
    min: f64,
    max: f64,
    dimension_factor: f64,
    abbreviation: &'static str,
    unit: &'static str,
) -> Definition {
    Definition { default, min, max, dimension_factor, abbreviation, unit, discrete: false }
}

const fn int(default: f64, min: f64, max: f64, abbreviation: &'static str) -> Definition {
    Definition { default, min, max, dimension_factor: 1.0, abbreviation, unit: "", discrete: true }
}

/// Keyword identifying a numeric property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericPropertyKeyword {
    Diffusivity,
    Thickness,
    Diameter,
    MaxTemp,
    NumPoints,
    TestTemperature,
    SpecificHeat,
    Density,
    Conductivity,
    PulseWidth,
    SpotDiameter,
    LaserEnergy,
    Emissivity,
    NonlinearPrecision,
    TimeLimit,
    GridDensity,
    TauFactor,
    SchemeWeight,
    LinearResolution,
    GradientResolution,
    BufferSize,
    ErrorTolerance,
    IterationLimit,
    BaselineSlope,
    BaselineIntercept,
    TimeShift,
    /// Sets front and rear Biot numbers together
    HeatLoss,
    HeatLossFront,
    HeatLossRear,
    HeatLossSide,
    FovOuter,
    FovInner,
    OpticalThickness,
    PlanckNumber,
    ScatteringAlbedo,
    ScatteringAnisotropy,
    DomDirections,
    DomIterationError,
    IntegrationSegments,
    LowerBound,
    UpperBound,
    Significance,
    CorrelationThreshold,
}

use NumericPropertyKeyword as K;

const ALL: [NumericPropertyKeyword; 43] = [
    K::Diffusivity,
    K::Thickness,
    K::Diameter,
    K::MaxTemp,
    K::NumPoints,
    K::TestTemperature,
    K::SpecificHeat,
    K::Density,
    K::Conductivity,
    K::PulseWidth,
    K::SpotDiameter,
    K::LaserEnergy,
    K::Emissivity,
    K::NonlinearPrecision,
    K::TimeLimit,
    K::GridDensity,
    K::TauFactor,
    K::SchemeWeight,
    K::LinearResolution,
    K::GradientResolution,
    K::BufferSize,
    K::ErrorTolerance,
    K::IterationLimit,
    K::BaselineSlope,
    K::BaselineIntercept,
    K::TimeShift,
    K::HeatLoss,
    K::HeatLossFront,
    K::HeatLossRear,
    K::HeatLossSide,
    K::FovOuter,
    K::FovInner,
    K::OpticalThickness,
    K::PlanckNumber,
    K::ScatteringAlbedo,
    K::ScatteringAnisotropy,
    K::DomDirections,
    K::DomIterationError,
    K::IntegrationSegments,
    K::LowerBound,
    K::UpperBound,
    K::Significance,
    K::CorrelationThreshold,
];

impl NumericPropertyKeyword {
    /// All keywords, in declaration order
    pub fn all() -> &'static [NumericPropertyKeyword] {
        &ALL
    }

    /// Static definition (default, bounds, display factor)
    pub fn definition(self) -> Definition {
        match self {
            K::Diffusivity => def(1e-6, 1e-10, 1e-3, 1e6, "a", "mm²/s"),
            K::Thickness => def(1e-3, 1e-6, 1e-1, 1e3, "l", "mm"),
            K::Diameter => def(1e-2, 1e-6, 1.0, 1e3, "d", "mm"),
            K::MaxTemp => def(1.0, 1e-6, 1e3, 1.0, "ΔT_max", "K"),
            K::NumPoints => int(200.0, 10.0, 5000.0, "N_pts"),
            K::TestTemperature => def(298.0, 1.0, 4000.0, 1.0, "T0", "K"),
            K::SpecificHeat => def(1000.0, 0.0, 1e6, 1.0, "cp", "J/(kg·K)"),
            K::Density => def(1000.0, 0.0, 1e5, 1.0, "ρ", "kg/m³"),
            K::Conductivity => def(1.0, 0.0, 1e4, 1.0, "λ", "W/(m·K)"),
            K::PulseWidth => def(5e-3, 1e-7, 1.0, 1e3, "t_p", "ms"),
            K::SpotDiameter => def(1e-2, 1e-6, 1.0, 1e3, "d_s", "mm"),
            K::LaserEnergy => def(10.0, 0.0, 1e3, 1.0, "Q", "J"),
            K::Emissivity => def(0.85, 0.0, 1.0, 1.0, "ε", ""),
            K::NonlinearPrecision => def(1e-3, 1e-10, 1.0, 1.0, "δ_nl", ""),
            K::TimeLimit => def(1.0, 1e-3, 1e3, 1.0, "t_lim", ""),
            K::GridDensity => int(30.0, 4.0, 4000.0, "N"),
            K::TauFactor => def(0.25, 1e-5, 100.0, 1.0, "τ_F", ""),
            K::SchemeWeight => def(0.5, 0.0, 1.0, 1.0, "σ", ""),
            K::LinearResolution => def(1e-3, 1e-10, 0.5, 1.0, "ε_lin", ""),
            K::GradientResolution => def(1e-4, 1e-10, 0.1, 1.0, "ε_grad", ""),
            K::BufferSize => int(4.0, 2.0, 100.0, "N_buf"),
            K::ErrorTolerance => def(1e-3, 1e-10, 1.0, 1.0, "ε_tol", ""),
            K::IterationLimit => int(50.0, 1.0, 100_000.0, "N_it"),
            K::BaselineSlope => def(0.0, -1e6, 1e6, 1.0, "k_b", "K/s"),
            K::BaselineIntercept => def(0.0, -1e6, 1e6, 1.0, "T_b", "K"),
            K::TimeShift => def(0.0, -10.0, 10.0, 1e3, "t_0", "ms"),
            K::HeatLoss => def(0.0, 0.0, 10.0, 1.0, "Bi", ""),
            K::HeatLossFront => def(0.0, 0.0, 10.0, 1.0, "Bi1", ""),
            K::HeatLossRear => def(0.0, 0.0, 10.0, 1.0, "Bi2", ""),
            K::HeatLossSide => def(0.0, 0.0, 10.0, 1.0, "Bi3", ""),
            K::FovOuter => def(8.5e-3, 0.0, 1.0, 1e3, "d_fov", "mm"),
            K::FovInner => def(0.0, 0.0, 1.0, 1e3, "d_fov,in", "mm"),
            K::OpticalThickness => def(0.1, 1e-8, 1e3, 1.0, "τ0", ""),
            K::PlanckNumber => def(10.0, 1e-6, 1e6, 1.0, "Np", ""),
            K::ScatteringAlbedo => def(0.0, 0.0, 1.0, 1.0, "ω0", ""),
            K::ScatteringAnisotropy => def(0.0, -0.999, 0.999, 1.0, "g", ""),
            K::DomDirections => int(8.0, 2.0, 64.0, "N_μ"),
            K::DomIterationError => def(1e-5, 1e-12, 1.0, 1.0, "ε_dom", ""),
            K::IntegrationSegments => int(128.0, 8.0, 100_000.0, "N_seg"),
            K::LowerBound => def(0.0, -1e3, 1e3, 1e3, "t_min", "ms"),
            K::UpperBound => def(1.0, -1e3, 1e4, 1e3, "t_max", "ms"),
            K::Significance => def(0.05, 1e-6, 0.5, 1.0, "α", ""),
            K::CorrelationThreshold => def(0.85, 0.0, 1.0, 1.0, "r_crit", ""),
        }
    }

    pub fn default_value(self) -> f64 {
        self.definition().default
    }

    /// Sensible bounds `(min, max)`, both inclusive
    pub fn bounds(self) -> (f64, f64) {
        let d = self.definition();
        (d.min, d.max)
    }

    pub fn is_discrete(self) -> bool {
        self.definition().discrete
    }

    pub fn abbreviation(self) -> &'static str {
        self.definition().abbreviation
    }

    /// Upper-case identifier as used in metafiles (`TEST_TEMPERATURE`)
    pub fn name(self) -> &'static str {
        match self {
            K::Diffusivity => "DIFFUSIVITY",
            K::Thickness => "THICKNESS",
            K::Diameter => "DIAMETER",
            K::MaxTemp => "MAXTEMP",
            K::NumPoints => "NUMPOINTS",
            K::TestTemperature => "TEST_TEMPERATURE",
            K::SpecificHeat => "SPECIFIC_HEAT",
            K::Density => "DENSITY",
            K::Conductivity => "CONDUCTIVITY",
            K::PulseWidth => "PULSE_WIDTH",
            K::SpotDiameter => "SPOT_DIAMETER",
            K::LaserEnergy => "LASER_ENERGY",
            K::Emissivity => "EMISSIVITY",
            K::NonlinearPrecision => "NONLINEAR_PRECISION",
            K::TimeLimit => "TIME_LIMIT",
            K::GridDensity => "GRID_DENSITY",
            K::TauFactor => "TAU_FACTOR",
            K::SchemeWeight => "SCHEME_WEIGHT",
            K::LinearResolution => "LINEAR_RESOLUTION",
            K::GradientResolution => "GRADIENT_RESOLUTION",
            K::BufferSize => "BUFFER_SIZE",
            K::ErrorTolerance => "ERROR_TOLERANCE",
            K::IterationLimit => "ITERATION_LIMIT",
            K::BaselineSlope => "BASELINE_SLOPE",
            K::BaselineIntercept => "BASELINE_INTERCEPT",
            K::TimeShift => "TIME_SHIFT",
            K::HeatLoss => "HEAT_LOSS",
            K::HeatLossFront => "HEAT_LOSS_FRONT",
            K::HeatLossRear => "HEAT_LOSS_REAR",
            K::HeatLossSide => "HEAT_LOSS_SIDE",
            K::FovOuter => "FOV_OUTER",
            K::FovInner => "FOV_INNER",
            K::OpticalThickness => "OPTICAL_THICKNESS",
            K::PlanckNumber => "PLANCK_NUMBER",
            K::ScatteringAlbedo => "SCATTERING_ALBEDO",
            K::ScatteringAnisotropy => "SCATTERING_ANISOTROPY",
            K::DomDirections => "DOM_DIRECTIONS",
            K::DomIterationError => "DOM_ITERATION_ERROR",
            K::IntegrationSegments => "INTEGRATION_SEGMENTS",
            K::LowerBound => "LOWER_BOUND",
            K::UpperBound => "UPPER_BOUND",
            K::Significance => "SIGNIFICANCE",
            K::CorrelationThreshold => "CORRELATION_THRESHOLD",
        }
    }

    /// Look a keyword up by name, ignoring case
    ///
    /// `Absorbed_Energy` is accepted as an alias of [`LaserEnergy`](Self::LaserEnergy).
    pub fn parse(name: &str) -> Result<Self, PropertyError> {
        let upper = name.trim().to_ascii_uppercase();
        if upper == "ABSORBED_ENERGY" {
            return Ok(K::LaserEnergy);
        }
        ALL.iter()
            .copied()
            .find(|k| k.name() == upper)
            .ok_or_else(|| PropertyError::UnknownKeyword(name.to_string()))
    }

    /// Check a raw SI value against the bounds of this keyword
    pub fn is_sensible(self, value: f64) -> bool {
        let (min, max) = self.bounds();
        value.is_finite() && value >= min && value <= max
    }

    /// Check a value, returning the appropriate error
    pub fn check(self, value: f64) -> Result<(), PropertyError> {
        if self.is_sensible(value) {
            Ok(())
        } else {
            let (min, max) = self.bounds();
            Err(PropertyError::OutOfRange { keyword: self, value, min, max })
        }
    }

    /// Fail with [`PropertyError::KeywordMismatch`] unless `found == self`
    pub fn require(self, found: NumericPropertyKeyword) -> Result<(), PropertyError> {
        if self == found {
            Ok(())
        } else {
            Err(PropertyError::KeywordMismatch { expected: self, found })
        }
    }
}

impl fmt::Display for NumericPropertyKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =================================================================================================
// Numeric property
// =================================================================================================

/// A keyword-tagged value with an optional error bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericProperty {
    keyword: NumericPropertyKeyword,
    value: f64,
    error: Option<f64>,
}

impl NumericProperty {
    /// Create a property, validating the value against the keyword bounds
    pub fn new(keyword: NumericPropertyKeyword, value: f64) -> Result<Self, PropertyError> {
        keyword.check(value)?;
        Ok(Self { keyword, value, error: None })
    }

    /// Property holding the default value of `keyword`
    pub fn default_for(keyword: NumericPropertyKeyword) -> Self {
        Self { keyword, value: keyword.default_value(), error: None }
    }

    /// Derived property, not validated (statistics, computed quantities)
    pub fn derive(keyword: NumericPropertyKeyword, value: f64) -> Self {
        Self { keyword, value, error: None }
    }

    pub fn with_error(mut self, error: f64) -> Self {
        self.error = Some(error.abs());
        self
    }

    pub fn keyword(&self) -> NumericPropertyKeyword {
        self.keyword
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value rounded to an integer (for discrete keywords)
    pub fn as_count(&self) -> usize {
        self.value.round().max(0.0) as usize
    }

    pub fn error(&self) -> Option<f64> {
        self.error
    }

    /// Value in display units (e.g. mm²/s for diffusivity)
    pub fn display_value(&self) -> f64 {
        self.value * self.keyword.definition().dimension_factor
    }

    /// Replace the value after validating it
    pub fn set_value(&mut self, value: f64) -> Result<(), PropertyError> {
        self.keyword.check(value)?;
        self.value = value;
        Ok(())
    }
}

impl fmt::Display for NumericProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.keyword.definition();
        if d.discrete {
            write!(f, "{} = {}", d.abbreviation, self.as_count())?;
        } else {
            write!(f, "{} = {:.5e}", d.abbreviation, self.display_value())?;
        }
        if let Some(e) = self.error {
            write!(f, " ± {:.2e}", e * d.dimension_factor)?;
        }
        if !d.unit.is_empty() {
            write!(f, " {}", d.unit)?;
        }
        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sensible() {
        for &k in NumericPropertyKeyword::all() {
            assert!(
                k.is_sensible(k.default_value()),
                "default of {} lies outside its own bounds",
                k
            );
        }
    }

    #[test]
    fn test_names_round_trip() {
        for &k in NumericPropertyKeyword::all() {
            assert_eq!(NumericPropertyKeyword::parse(k.name()).unwrap(), k);
        }
        assert_eq!(
            NumericPropertyKeyword::parse("test_temperature").unwrap(),
            NumericPropertyKeyword::TestTemperature
        );
        assert_eq!(
            NumericPropertyKeyword::parse("Absorbed_Energy").unwrap(),
            NumericPropertyKeyword::LaserEnergy
        );
    }

    #[test]
    fn test_unknown_keyword() {
        let err = NumericPropertyKeyword::parse("Detector_Gain").unwrap_err();
        assert_eq!(err, PropertyError::UnknownKeyword("Detector_Gain".to_string()));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = NumericProperty::new(K::Emissivity, 1.2).unwrap_err();
        assert!(matches!(err, PropertyError::OutOfRange { keyword: K::Emissivity, .. }));
        assert!(NumericProperty::new(K::Diffusivity, f64::NAN).is_err());
    }

    #[test]
    fn test_require_mismatch() {
        let err = K::Diffusivity.require(K::Thickness).unwrap_err();
        assert_eq!(
            err,
            PropertyError::KeywordMismatch { expected: K::Diffusivity, found: K::Thickness }
        );
        assert!(K::Thickness.require(K::Thickness).is_ok());
    }

    #[test]
    fn test_display_value_and_error() {
        let p = NumericProperty::new(K::Thickness, 2.0e-3).unwrap().with_error(-1e-5);
        assert!((p.display_value() - 2.0).abs() < 1e-12);
        assert_eq!(p.error(), Some(1e-5));
        let text = p.to_string();
        assert!(text.contains("mm"), "unexpected display: {}", text);
    }

    #[test]
    fn test_set_value_validates() {
        let mut p = NumericProperty::default_for(K::ScatteringAlbedo);
        assert!(p.set_value(0.5).is_ok());
        assert!(p.set_value(-0.1).is_err());
        assert_eq!(p.value(), 0.5);
    }
}
