//! Per-timestep state and flux containers for the soil-moisture engine.

use crate::soil::bounds::LayerBounds;
use dwb_core::errors::{DwbError, DwbResult};
use dwb_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Water content of each compartment at the start of a timestep.
///
/// Created once as the initial condition and then threaded explicitly from
/// one timestep's [`StepResult`] into the next call; the engine keeps no
/// state of its own. The transpiration compartment only exists under cover.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    pub evaporation_mm: FloatValue,
    pub transpiration_mm: Option<FloatValue>,
    pub transition_mm: FloatValue,
}

impl LayerState {
    pub fn bare(evaporation_mm: FloatValue, transition_mm: FloatValue) -> Self {
        Self {
            evaporation_mm,
            transpiration_mm: None,
            transition_mm,
        }
    }

    pub fn covered(
        evaporation_mm: FloatValue,
        transpiration_mm: FloatValue,
        transition_mm: FloatValue,
    ) -> Self {
        Self {
            evaporation_mm,
            transpiration_mm: Some(transpiration_mm),
            transition_mm,
        }
    }
}

/// Raise an entry-time storage to the wilting point if it sits below it,
/// mirroring how storages are seeded. Content above field capacity is a
/// caller bug and is rejected.
pub fn seed_content(content_mm: FloatValue, bounds: LayerBounds) -> DwbResult<FloatValue> {
    if content_mm > bounds.field_capacity_mm {
        return Err(DwbError::StateSeed(format!(
            "storage of {} mm exceeds the field capacity of {} mm",
            content_mm, bounds.field_capacity_mm
        )));
    }
    Ok(content_mm.max(bounds.wilting_point_mm))
}

/// Daily fluxes entering a soil-moisture update, supplied by collaborating
/// modules (evapotranspiration, runoff, percolation).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FluxBundle {
    /// Water infiltrating into the evaporation layer
    /// unit: mm
    pub infiltration_mm: FloatValue,
    /// Evaporative demand on the evaporation layer
    /// unit: mm
    pub evaporation_demand_mm: FloatValue,
    /// Transpirative demand on the transpiration layer
    /// unit: mm
    pub transpiration_demand_mm: FloatValue,
    /// Externally imposed percolation demand on the transition layer
    /// unit: mm
    pub deep_percolation_demand_mm: FloatValue,
    /// Deficit-irrigation stress factor applied to the transpiration layer's
    /// field capacity
    /// unit: dimensionless, within [0, 1]
    pub stress_coefficient: FloatValue,
    /// Maximum allowable depletion of plant-available water before a refill
    /// is scheduled
    /// unit: dimensionless, within [0, 1]
    pub mad: FloatValue,
    /// Hydraulic conductivity of the transpiration layer
    /// unit: mm / day
    pub hydraulic_conductivity_transpiration: FloatValue,
    /// Hydraulic conductivity of the transition layer
    /// unit: mm / day
    pub hydraulic_conductivity_transition: FloatValue,
}

impl Default for FluxBundle {
    fn default() -> Self {
        Self {
            infiltration_mm: 0.0,
            evaporation_demand_mm: 0.0,
            transpiration_demand_mm: 0.0,
            deep_percolation_demand_mm: 0.0,
            stress_coefficient: 1.0,
            mad: 0.5,
            hydraulic_conductivity_transpiration: 0.0,
            hydraulic_conductivity_transition: 0.0,
        }
    }
}

impl FluxBundle {
    /// Check the unit-interval inputs before a step runs.
    pub fn validate(&self) -> DwbResult<()> {
        if !(0.0..=1.0).contains(&self.stress_coefficient) {
            return Err(DwbError::Configuration(format!(
                "stress coefficient {} is outside [0, 1]",
                self.stress_coefficient
            )));
        }
        if !(0.0..=1.0).contains(&self.mad) {
            return Err(DwbError::Configuration(format!(
                "MAD {} is outside [0, 1]",
                self.mad
            )));
        }
        Ok(())
    }
}

/// Everything a single soil-moisture timestep produces.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Storage of each compartment at the end of the step
    pub state: LayerState,
    /// Evaporation actually extracted, after any deficit reduction
    /// unit: mm
    pub actual_evaporation_mm: FloatValue,
    /// Transpiration actually extracted, after any deficit reduction or
    /// scheduled-refill suppression
    /// unit: mm
    pub actual_transpiration_mm: FloatValue,
    /// Surplus routed from the evaporation to the transpiration layer
    /// unit: mm
    pub infiltration_to_transpiration_mm: FloatValue,
    /// Surplus routed into the transition layer
    /// unit: mm
    pub infiltration_to_transition_mm: FloatValue,
    /// Refill depth requested from the irrigation scheduler
    /// unit: mm
    pub irrigation_requirement_mm: FloatValue,
    /// Water leaving the bottom of the profile
    /// unit: mm
    pub deep_percolation_out_mm: FloatValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> LayerBounds {
        LayerBounds {
            field_capacity_mm: 30.0,
            wilting_point_mm: 10.0,
        }
    }

    #[test]
    fn seed_raises_dry_storage_to_wilting_point() {
        assert_eq!(seed_content(4.0, bounds()).unwrap(), 10.0);
        assert_eq!(seed_content(12.0, bounds()).unwrap(), 12.0);
    }

    #[test]
    fn seed_rejects_storage_above_field_capacity() {
        assert!(matches!(
            seed_content(31.0, bounds()),
            Err(DwbError::StateSeed(_))
        ));
    }

    #[test]
    fn flux_bundle_unit_interval_checks() {
        let mut fluxes = FluxBundle::default();
        assert!(fluxes.validate().is_ok());

        fluxes.stress_coefficient = 1.2;
        assert!(fluxes.validate().is_err());

        fluxes.stress_coefficient = 1.0;
        fluxes.mad = -0.1;
        assert!(fluxes.validate().is_err());
    }
}
