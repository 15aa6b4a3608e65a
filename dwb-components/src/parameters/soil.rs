//! Soil profile parameters
//!
//! Static site configuration for the layered soil-moisture balance: the
//! volumetric bounds of each compartment, the depth table keyed by
//! (compartment, cover state), hydraulic conductivities and the irrigation
//! depletion fraction. All of it is passed explicitly to the engine so that
//! concurrent simulations can use independent parameter sets safely.

use crate::soil::bounds::{CoverState, LayerBounds, SoilLayer};
use dwb_core::errors::{DwbError, DwbResult};
use dwb_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Volumetric water-content bounds of one compartment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSoilProperties {
    /// Field capacity
    /// unit: % volumetric
    pub field_capacity_pct: FloatValue,
    /// Permanent wilting point
    /// unit: % volumetric
    pub wilting_point_pct: FloatValue,
}

/// Compartment depths keyed by (compartment, cover state).
///
/// The transpiration compartment has no entry here: its depth is the root
/// depth carried by [`CoverState::Covered`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilDepthTable {
    /// unit: cm
    pub evaporation_covered_cm: FloatValue,
    /// unit: cm
    pub evaporation_bare_cm: FloatValue,
    /// unit: cm
    pub transition_covered_cm: FloatValue,
    /// unit: cm
    pub transition_bare_cm: FloatValue,
}

impl Default for SoilDepthTable {
    fn default() -> Self {
        Self {
            evaporation_covered_cm: 10.0,
            evaporation_bare_cm: 15.0,
            transition_covered_cm: 90.0,
            transition_bare_cm: 100.0,
        }
    }
}

impl SoilDepthTable {
    /// Look up a compartment depth for the given cover state.
    pub fn depth_cm(&self, layer: SoilLayer, cover: &CoverState) -> DwbResult<FloatValue> {
        match (layer, cover) {
            (SoilLayer::Evaporation, CoverState::Covered { .. }) => Ok(self.evaporation_covered_cm),
            (SoilLayer::Evaporation, CoverState::Bare) => Ok(self.evaporation_bare_cm),
            (SoilLayer::Transition, CoverState::Covered { .. }) => Ok(self.transition_covered_cm),
            (SoilLayer::Transition, CoverState::Bare) => Ok(self.transition_bare_cm),
            (SoilLayer::Transpiration, CoverState::Covered { root_depth_cm }) => {
                Ok(*root_depth_cm)
            }
            (SoilLayer::Transpiration, CoverState::Bare) => Err(DwbError::Configuration(
                "the transpiration layer is only defined under cover".to_string(),
            )),
        }
    }
}

/// Parameters for the layered soil-moisture balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilProfileParameters {
    pub evaporation: LayerSoilProperties,
    pub transpiration: LayerSoilProperties,
    pub transition: LayerSoilProperties,
    pub depths: SoilDepthTable,
    pub cover: CoverState,
    /// Maximum allowable depletion of plant-available water before a refill
    /// is scheduled
    /// unit: dimensionless, within [0, 1]
    /// default: 0.5
    pub mad: FloatValue,
    /// Hydraulic conductivity of the transpiration layer
    /// unit: mm / day
    /// default: 4.0
    pub hydraulic_conductivity_transpiration: FloatValue,
    /// Hydraulic conductivity of the transition layer
    /// unit: mm / day
    /// default: 2.0
    pub hydraulic_conductivity_transition: FloatValue,
    /// Floor negative capillary gradients at zero instead of preserving
    /// them
    /// default: false
    pub clamp_negative_upward_flux: bool,
}

impl Default for SoilProfileParameters {
    fn default() -> Self {
        Self {
            evaporation: LayerSoilProperties {
                field_capacity_pct: 25.0,
                wilting_point_pct: 10.0,
            },
            transpiration: LayerSoilProperties {
                field_capacity_pct: 28.0,
                wilting_point_pct: 12.0,
            },
            transition: LayerSoilProperties {
                field_capacity_pct: 30.0,
                wilting_point_pct: 15.0,
            },
            depths: SoilDepthTable::default(),
            cover: CoverState::Bare,
            mad: 0.5,
            hydraulic_conductivity_transpiration: 4.0,
            hydraulic_conductivity_transition: 2.0,
            clamp_negative_upward_flux: false,
        }
    }
}

impl SoilProfileParameters {
    /// Load a profile from TOML, validating it before use.
    pub fn from_toml_str(raw: &str) -> DwbResult<Self> {
        let parameters: Self = toml::from_str(raw)
            .map_err(|e| DwbError::Configuration(format!("invalid soil profile: {}", e)))?;
        parameters.validate()?;
        Ok(parameters)
    }

    fn properties(&self, layer: SoilLayer) -> &LayerSoilProperties {
        match layer {
            SoilLayer::Evaporation => &self.evaporation,
            SoilLayer::Transpiration => &self.transpiration,
            SoilLayer::Transition => &self.transition,
        }
    }

    /// Active compartments for the configured cover state, top to bottom.
    pub fn active_layers(&self) -> Vec<SoilLayer> {
        match self.cover {
            CoverState::Covered { .. } => vec![
                SoilLayer::Evaporation,
                SoilLayer::Transpiration,
                SoilLayer::Transition,
            ],
            CoverState::Bare => vec![SoilLayer::Evaporation, SoilLayer::Transition],
        }
    }

    /// Storage bounds of a compartment in millimetres.
    pub fn bounds(&self, layer: SoilLayer) -> DwbResult<LayerBounds> {
        let properties = self.properties(layer);
        let depth_cm = self.depths.depth_cm(layer, &self.cover)?;
        Ok(LayerBounds::from_percentages(
            properties.field_capacity_pct,
            properties.wilting_point_pct,
            depth_cm,
        ))
    }

    /// Fail fast on a profile the engine cannot run with.
    pub fn validate(&self) -> DwbResult<()> {
        for layer in self.active_layers() {
            let properties = self.properties(layer);
            if properties.field_capacity_pct <= properties.wilting_point_pct {
                return Err(DwbError::Configuration(format!(
                    "{:?} layer: field capacity ({}%) must exceed the wilting point ({}%)",
                    layer, properties.field_capacity_pct, properties.wilting_point_pct
                )));
            }
            let depth_cm = self.depths.depth_cm(layer, &self.cover)?;
            if depth_cm <= 0.0 {
                return Err(DwbError::Configuration(format!(
                    "{:?} layer: depth of {} cm must be positive",
                    layer, depth_cm
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.mad) {
            return Err(DwbError::Configuration(format!(
                "MAD {} is outside [0, 1]",
                self.mad
            )));
        }
        if self.hydraulic_conductivity_transpiration < 0.0
            || self.hydraulic_conductivity_transition < 0.0
        {
            return Err(DwbError::Configuration(
                "hydraulic conductivities must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
