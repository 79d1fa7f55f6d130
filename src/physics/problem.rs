//! Problem statement
//!
//! A [`Problem`] gathers everything a scheme needs to compute a heating curve:
//! thermal and geometric properties, heat-loss Biot numbers, the laser [`Pulse`],
//! the signal [`Baseline`] and the [`HeatingCurve`] template (point count, time
//! shift). The search layer reads and writes the same properties through
//! [`Problem::get`] and [`Problem::set`].
//!
//! # Kinds
//!
//! | Kind | Boundary heat loss | Radiative transfer |
//! |---|---|---|
//! | [`ProblemKind::Linearised`] | linear in temperature | none |
//! | [`ProblemKind::Nonlinear`] | `Bi·((1+δθ)⁴−1)/(4δ)` | none |
//! | [`ProblemKind::ParticipatingMedium`] | linear | coupled, semi-transparent sample |
//!
//! The [`Dimension`] selects a 1D (thickness only) or 2D (radius and thickness)
//! statement. Only the ADI scheme handles 2D problems.
//!
//! # Example
//!
//! ```rust
//! use pulse_rs::physics::{NumericProperty, NumericPropertyKeyword, Problem};
//!
//! let mut problem = Problem::default();
//! let bi = NumericProperty::new(NumericPropertyKeyword::HeatLoss, 0.1).unwrap();
//! problem.set(NumericPropertyKeyword::HeatLoss, bi).unwrap();
//! assert_eq!(problem.heat_loss_front(), 0.1);
//! assert_eq!(problem.heat_loss_rear(), 0.1);
//!
//! // l²/a with the default l = 1 mm and a = 1 mm²/s
//! assert!((problem.time_factor() - 1.0).abs() < 1e-12);
//! ```

use log::{debug, warn};

use crate::input::{ExperimentalData, Metadata};
use crate::physics::baseline::Baseline;
use crate::physics::curve::HeatingCurve;
use crate::physics::properties::{NumericProperty, NumericPropertyKeyword, PropertyError};
use crate::physics::pulse::Pulse;

use NumericPropertyKeyword as K;

/// Parker's coefficient relating the half-rise time to `l²/a`
pub const PARKER_COEFFICIENT: f64 = 0.1388;

/// Physics of the boundary and bulk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProblemKind {
    #[default]
    Linearised,
    Nonlinear,
    ParticipatingMedium,
}

/// Spatial dimension of the problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    #[default]
    One,
    Two,
}

/// Laser flash problem statement
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    kind: ProblemKind,
    dimension: Dimension,

    diffusivity: f64,
    thickness: f64,
    diameter: f64,
    max_temp: f64,
    test_temperature: f64,
    specific_heat: f64,
    density: f64,
    emissivity: f64,

    heat_loss_front: f64,
    heat_loss_rear: f64,
    heat_loss_side: f64,

    fov_outer: f64,
    fov_inner: f64,

    optical_thickness: f64,
    planck_number: f64,
    scattering_albedo: f64,
    scattering_anisotropy: f64,

    pulse: Pulse,
    baseline: Baseline,
    curve: HeatingCurve,
}

impl Default for Problem {
    fn default() -> Self {
        Self::new(ProblemKind::default(), Dimension::default())
    }
}

impl Problem {
    pub fn new(kind: ProblemKind, dimension: Dimension) -> Self {
        Self {
            kind,
            dimension,
            diffusivity: K::Diffusivity.default_value(),
            thickness: K::Thickness.default_value(),
            diameter: K::Diameter.default_value(),
            max_temp: K::MaxTemp.default_value(),
            test_temperature: K::TestTemperature.default_value(),
            specific_heat: K::SpecificHeat.default_value(),
            density: K::Density.default_value(),
            emissivity: K::Emissivity.default_value(),
            heat_loss_front: K::HeatLossFront.default_value(),
            heat_loss_rear: K::HeatLossRear.default_value(),
            heat_loss_side: K::HeatLossSide.default_value(),
            fov_outer: K::FovOuter.default_value(),
            fov_inner: K::FovInner.default_value(),
            optical_thickness: K::OpticalThickness.default_value(),
            planck_number: K::PlanckNumber.default_value(),
            scattering_albedo: K::ScatteringAlbedo.default_value(),
            scattering_anisotropy: K::ScatteringAnisotropy.default_value(),
            pulse: Pulse::default(),
            baseline: Baseline::default(),
            curve: HeatingCurve::default(),
        }
    }

    pub fn kind(&self) -> ProblemKind {
        self.kind
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn diffusivity(&self) -> f64 {
        self.diffusivity
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn max_temp(&self) -> f64 {
        self.max_temp
    }

    pub fn test_temperature(&self) -> f64 {
        self.test_temperature
    }

    pub fn specific_heat(&self) -> f64 {
        self.specific_heat
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn emissivity(&self) -> f64 {
        self.emissivity
    }

    /// Front-face Biot number `Bi1`
    pub fn heat_loss_front(&self) -> f64 {
        self.heat_loss_front
    }

    /// Rear-face Biot number `Bi2`
    pub fn heat_loss_rear(&self) -> f64 {
        self.heat_loss_rear
    }

    /// Side-surface Biot number `Bi3` (2D only)
    pub fn heat_loss_side(&self) -> f64 {
        self.heat_loss_side
    }

    pub fn fov_outer(&self) -> f64 {
        self.fov_outer
    }

    pub fn fov_inner(&self) -> f64 {
        self.fov_inner
    }

    pub fn optical_thickness(&self) -> f64 {
        self.optical_thickness
    }

    pub fn planck_number(&self) -> f64 {
        self.planck_number
    }

    pub fn scattering_albedo(&self) -> f64 {
        self.scattering_albedo
    }

    pub fn scattering_anisotropy(&self) -> f64 {
        self.scattering_anisotropy
    }

    pub fn pulse(&self) -> &Pulse {
        &self.pulse
    }

    pub fn pulse_mut(&mut self) -> &mut Pulse {
        &mut self.pulse
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn baseline_mut(&mut self) -> &mut Baseline {
        &mut self.baseline
    }

    /// Template for the curves produced by schemes
    pub fn curve(&self) -> &HeatingCurve {
        &self.curve
    }

    pub fn curve_mut(&mut self) -> &mut HeatingCurve {
        &mut self.curve
    }

    /// Characteristic time `l²/a` in seconds
    pub fn time_factor(&self) -> f64 {
        self.thickness * self.thickness / self.diffusivity
    }

    /// Nonlinearity parameter `δ = ΔT_max / T0`
    pub fn nonlinearity(&self) -> f64 {
        self.max_temp / self.test_temperature
    }

    /// Model signal at experiment time `time`: curve plus baseline
    pub fn model_at(&self, curve: &HeatingCurve, time: f64) -> f64 {
        curve.temperature_at(time) + self.baseline.value_at(time)
    }

    /// Keywords relevant to this kind and dimension
    pub fn keywords(&self) -> Vec<NumericPropertyKeyword> {
        let mut keywords = vec![
            K::Diffusivity,
            K::Thickness,
            K::MaxTemp,
            K::TestTemperature,
            K::SpecificHeat,
            K::Density,
            K::HeatLoss,
            K::HeatLossFront,
            K::HeatLossRear,
            K::NumPoints,
            K::TimeShift,
            K::BaselineIntercept,
            K::BaselineSlope,
        ];
        keywords.extend_from_slice(Pulse::keywords());

        if self.dimension == Dimension::Two {
            keywords.extend([K::Diameter, K::HeatLossSide, K::FovOuter, K::FovInner]);
        }
        match self.kind {
            ProblemKind::Linearised => {}
            ProblemKind::Nonlinear => keywords.push(K::Emissivity),
            ProblemKind::ParticipatingMedium => keywords.extend([
                K::Emissivity,
                K::OpticalThickness,
                K::PlanckNumber,
                K::ScatteringAlbedo,
                K::ScatteringAnisotropy,
            ]),
        }
        keywords
    }

    /// Read a property
    ///
    /// `HeatLoss` reads the front Biot number.
    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        let value = match keyword {
            K::Diffusivity => self.diffusivity,
            K::Thickness => self.thickness,
            K::Diameter => self.diameter,
            K::MaxTemp => self.max_temp,
            K::TestTemperature => self.test_temperature,
            K::SpecificHeat => self.specific_heat,
            K::Density => self.density,
            K::Emissivity => self.emissivity,
            K::HeatLoss | K::HeatLossFront => self.heat_loss_front,
            K::HeatLossRear => self.heat_loss_rear,
            K::HeatLossSide => self.heat_loss_side,
            K::FovOuter => self.fov_outer,
            K::FovInner => self.fov_inner,
            K::OpticalThickness => self.optical_thickness,
            K::PlanckNumber => self.planck_number,
            K::ScatteringAlbedo => self.scattering_albedo,
            K::ScatteringAnisotropy => self.scattering_anisotropy,
            K::PulseWidth | K::SpotDiameter | K::LaserEnergy => return self.pulse.get(keyword),
            K::BaselineIntercept | K::BaselineSlope => return self.baseline.get(keyword),
            K::NumPoints | K::TimeShift => return self.curve.get(keyword),
            _ => return None,
        };
        Some(NumericProperty::derive(keyword, value))
    }

    /// Write a property after checking its keyword and bounds
    ///
    /// `HeatLoss` writes both the front and the rear Biot numbers.
    pub fn set(
        &mut self,
        keyword: NumericPropertyKeyword,
        property: NumericProperty,
    ) -> Result<(), PropertyError> {
        keyword.require(property.keyword())?;

        match keyword {
            K::PulseWidth | K::SpotDiameter | K::LaserEnergy => {
                return self.pulse.set(keyword, property);
            }
            K::BaselineIntercept | K::BaselineSlope => return self.baseline.set(keyword, property),
            K::NumPoints | K::TimeShift => return self.curve.set(keyword, property),
            _ => {}
        }

        keyword.check(property.value())?;
        let value = property.value();
        match keyword {
            K::Diffusivity => self.diffusivity = value,
            K::Thickness => self.thickness = value,
            K::Diameter => self.diameter = value,
            K::MaxTemp => self.max_temp = value,
            K::TestTemperature => self.test_temperature = value,
            K::SpecificHeat => self.specific_heat = value,
            K::Density => self.density = value,
            K::Emissivity => self.emissivity = value,
            K::HeatLoss => {
                self.heat_loss_front = value;
                self.heat_loss_rear = value;
            }
            K::HeatLossFront => self.heat_loss_front = value,
            K::HeatLossRear => self.heat_loss_rear = value,
            K::HeatLossSide => self.heat_loss_side = value,
            K::FovOuter => self.fov_outer = value,
            K::FovInner => self.fov_inner = value,
            K::OpticalThickness => self.optical_thickness = value,
            K::PlanckNumber => self.planck_number = value,
            K::ScatteringAlbedo => self.scattering_albedo = value,
            K::ScatteringAnisotropy => self.scattering_anisotropy = value,
            other => return Err(PropertyError::Unsupported(other)),
        }
        Ok(())
    }

    /// Shorthand for [`Problem::set`] with a freshly validated property
    pub fn set_value(&mut self, keyword: NumericPropertyKeyword, value: f64) -> Result<(), PropertyError> {
        self.set(keyword, NumericProperty::new(keyword, value)?)
    }

    /// Copy the experimental parameters of a laser shot into the problem
    pub fn apply_metadata(&mut self, metadata: &Metadata) -> Result<(), PropertyError> {
        for property in metadata.entries() {
            let property = NumericProperty::new(property.keyword(), property.value())?;
            self.set(property.keyword(), property)?;
        }
        if let Some(shape) = metadata.pulse_shape() {
            self.pulse.set_shape(shape);
        }
        Ok(())
    }

    /// Seed the baseline, maximum temperature and diffusivity from a measurement
    ///
    /// The diffusivity comes from Parker's formula `a = 0.1388·l²/t½`. Estimates
    /// outside the sensible range of their keyword are discarded.
    pub fn estimate_from(&mut self, data: &ExperimentalData) {
        self.baseline.fit_to(data);

        let max = data.max_adjusted_signal(&self.baseline);
        self.try_estimate(K::MaxTemp, max);

        if let Some(half_time) = data.half_rise_time(&self.baseline)
            && half_time > 0.0
        {
            let a = PARKER_COEFFICIENT * self.thickness * self.thickness / half_time;
            self.try_estimate(K::Diffusivity, a);
        }
    }

    fn try_estimate(&mut self, keyword: NumericPropertyKeyword, value: f64) {
        match NumericProperty::new(keyword, value) {
            Ok(property) => {
                debug!("estimated {}", property);
                // Keyword matches by construction
                let _ = self.set(keyword, property);
            }
            Err(err) => warn!("discarding estimate: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::TemporalShape;

    #[test]
    fn test_heat_loss_sets_both_faces() {
        let mut problem = Problem::default();
        let bi = NumericProperty::new(K::HeatLoss, 0.3).unwrap();
        problem.set(K::HeatLoss, bi).unwrap();
        assert_eq!(problem.heat_loss_front(), 0.3);
        assert_eq!(problem.heat_loss_rear(), 0.3);

        let rear = NumericProperty::new(K::HeatLossRear, 0.1).unwrap();
        problem.set(K::HeatLossRear, rear).unwrap();
        assert_eq!(problem.heat_loss_front(), 0.3);
        assert_eq!(problem.heat_loss_rear(), 0.1);
    }

    #[test]
    fn test_mismatched_keyword_rejected() {
        let mut problem = Problem::default();
        let p = NumericProperty::new(K::Thickness, 2e-3).unwrap();
        assert_eq!(
            problem.set(K::Diffusivity, p),
            Err(PropertyError::KeywordMismatch { expected: K::Diffusivity, found: K::Thickness })
        );
        assert_eq!(problem.diffusivity(), K::Diffusivity.default_value());
    }

    #[test]
    fn test_unsupported_keyword() {
        let mut problem = Problem::default();
        let p = NumericProperty::default_for(K::GridDensity);
        assert_eq!(
            problem.set(K::GridDensity, p),
            Err(PropertyError::Unsupported(K::GridDensity))
        );
        assert!(problem.get(K::GridDensity).is_none());
    }

    #[test]
    fn test_delegates_to_pulse_and_curve() {
        let mut problem = Problem::default();
        let w = NumericProperty::new(K::PulseWidth, 2e-3).unwrap();
        problem.set(K::PulseWidth, w).unwrap();
        assert_eq!(problem.pulse().width(), 2e-3);
        let n = NumericProperty::new(K::NumPoints, 100.0).unwrap();
        problem.set(K::NumPoints, n).unwrap();
        assert_eq!(problem.curve().num_points(), 100);
        assert_eq!(problem.get(K::NumPoints).unwrap().as_count(), 100);
    }

    #[test]
    fn test_keywords_depend_on_kind() {
        let linear = Problem::default();
        assert!(!linear.keywords().contains(&K::OpticalThickness));
        let medium = Problem::new(ProblemKind::ParticipatingMedium, Dimension::One);
        assert!(medium.keywords().contains(&K::PlanckNumber));
        let two = Problem::new(ProblemKind::Linearised, Dimension::Two);
        assert!(two.keywords().contains(&K::HeatLossSide));
    }

    #[test]
    fn test_apply_metadata() {
        let mut metadata = Metadata::new(1);
        metadata
            .set(K::Thickness, NumericProperty::new(K::Thickness, 2e-3).unwrap())
            .unwrap();
        metadata
            .set(K::PulseWidth, NumericProperty::new(K::PulseWidth, 1e-3).unwrap())
            .unwrap();
        metadata.set_pulse_shape(TemporalShape::Triangular);

        let mut problem = Problem::default();
        problem.apply_metadata(&metadata).unwrap();
        assert_eq!(problem.thickness(), 2e-3);
        assert_eq!(problem.pulse().width(), 1e-3);
        assert_eq!(problem.pulse().shape(), TemporalShape::Triangular);
    }

    #[test]
    fn test_parker_estimate() {
        // Ideal adiabatic rear-face response for l²/a = 1 s
        let time: Vec<f64> = (0..400).map(|i| -0.05 + i as f64 * 0.005).collect();
        let signal: Vec<f64> = time
            .iter()
            .map(|&t| {
                if t <= 1e-9 {
                    return 0.0;
                }
                let mut sum = 1.0;
                for n in 1..50 {
                    let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
                    sum += 2.0 * sign * (-(n as f64).powi(2) * std::f64::consts::PI.powi(2) * t).exp();
                }
                sum
            })
            .collect();
        let data = ExperimentalData::new(time, signal).unwrap();

        let mut problem = Problem::default();
        problem.estimate_from(&data);
        assert!((problem.max_temp() - 1.0).abs() < 0.02);
        assert!(
            (problem.diffusivity() - 1e-6).abs() < 0.05e-6,
            "estimated a = {}",
            problem.diffusivity()
        );
    }
}
