//! Per-shot experimental metadata

use std::collections::BTreeMap;

use crate::physics::{NumericProperty, NumericPropertyKeyword, PropertyError, TemporalShape};

/// Experimental parameters recorded with one laser shot
///
/// Values are in SI units. Only the keywords that were actually read are
/// present; everything else falls back to the problem defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    external_id: Option<u32>,
    sample_name: Option<String>,
    pulse_shape: Option<TemporalShape>,
    values: BTreeMap<NumericPropertyKeyword, f64>,
}

impl Metadata {
    pub fn new(external_id: u32) -> Self {
        Self { external_id: Some(external_id), ..Default::default() }
    }

    pub fn external_id(&self) -> Option<u32> {
        self.external_id
    }

    pub fn sample_name(&self) -> Option<&str> {
        self.sample_name.as_deref()
    }

    pub fn set_sample_name(&mut self, name: impl Into<String>) {
        self.sample_name = Some(name.into());
    }

    pub fn pulse_shape(&self) -> Option<TemporalShape> {
        self.pulse_shape
    }

    pub fn set_pulse_shape(&mut self, shape: TemporalShape) {
        self.pulse_shape = Some(shape);
    }

    /// Keywords a metafile may carry
    pub fn keywords() -> &'static [NumericPropertyKeyword] {
        &[
            NumericPropertyKeyword::TestTemperature,
            NumericPropertyKeyword::Thickness,
            NumericPropertyKeyword::Diameter,
            NumericPropertyKeyword::SpotDiameter,
            NumericPropertyKeyword::PulseWidth,
            NumericPropertyKeyword::LaserEnergy,
            NumericPropertyKeyword::FovOuter,
        ]
    }

    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        self.values
            .get(&keyword)
            .map(|&v| NumericProperty::derive(keyword, v))
    }

    pub fn set(
        &mut self,
        keyword: NumericPropertyKeyword,
        property: NumericProperty,
    ) -> Result<(), PropertyError> {
        keyword.require(property.keyword())?;
        if !Self::keywords().contains(&keyword) {
            return Err(PropertyError::Unsupported(keyword));
        }
        keyword.check(property.value())?;
        self.values.insert(keyword, property.value());
        Ok(())
    }

    /// Pulse width in seconds, if recorded
    pub fn pulse_width(&self) -> Option<f64> {
        self.values.get(&NumericPropertyKeyword::PulseWidth).copied()
    }

    /// All recorded numeric entries
    pub fn entries(&self) -> impl Iterator<Item = NumericProperty> + '_ {
        self.values.iter().map(|(&k, &v)| NumericProperty::derive(k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut m = Metadata::new(200);
        let p = NumericProperty::new(NumericPropertyKeyword::Thickness, 2e-3).unwrap();
        m.set(NumericPropertyKeyword::Thickness, p).unwrap();
        assert_eq!(m.get(NumericPropertyKeyword::Thickness).unwrap().value(), 2e-3);
        assert!(m.get(NumericPropertyKeyword::Diameter).is_none());
        assert_eq!(m.external_id(), Some(200));
    }

    #[test]
    fn test_rejects_non_metadata_keyword() {
        let mut m = Metadata::default();
        let p = NumericProperty::default_for(NumericPropertyKeyword::GridDensity);
        assert_eq!(
            m.set(NumericPropertyKeyword::GridDensity, p),
            Err(PropertyError::Unsupported(NumericPropertyKeyword::GridDensity))
        );
    }
}
