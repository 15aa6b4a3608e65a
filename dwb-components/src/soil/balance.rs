//! Layered Soil-Moisture Balance Component
//!
//! Tracks the daily water content of up to three stacked soil compartments
//! and routes water between them.
//!
//! # What This Component Does
//!
//! 1. Computes capillary redistribution between adjacent compartments from
//!    the previous day's relative-saturation gradients.
//!
//! 2. Cascades the day's infiltration down the profile: a compartment filled
//!    past field capacity spills its surplus to the compartment below.
//!
//! 3. Reduces evaporative and transpirative extraction when a compartment
//!    would be drawn below its wilting point.
//!
//! 4. Under cover, applies the irrigation depletion policy: once the root
//!    zone is drawn down past the allowable fraction of plant-available
//!    water the store is refilled and an irrigation requirement is emitted.
//!
//! # Inputs
//!
//! - `Infiltration` (mm / day) - water entering the evaporation layer
//! - `Evaporation Demand` (mm / day) - demand on the evaporation layer
//! - `Transpiration Demand` (mm / day, covered only) - demand on the root zone
//! - `Stress Coefficient` (dimensionless, covered only) - deficit-irrigation factor
//! - `Deep Percolation Demand` (mm / day) - externally imposed percolation
//!
//! # States (tracked between timesteps)
//!
//! - `Soil Moisture|Evaporation Layer` (mm)
//! - `Soil Moisture|Transpiration Layer` (mm, covered only)
//! - `Soil Moisture|Transition Layer` (mm)
//!
//! # Outputs
//!
//! - `Actual Evaporation` (mm / day)
//! - `Actual Transpiration` (mm / day, covered only)
//! - `Irrigation Requirement` (mm / day, covered only)
//! - `Deep Percolation` (mm / day) - water leaving the bottom of the profile

use crate::parameters::SoilProfileParameters;
use crate::soil::bounds::{CoverState, SoilLayer};
use crate::soil::layers::{
    update_evaporation_layer, update_transition_layer, update_transpiration_layer,
};
use crate::soil::state::{seed_content, FluxBundle, LayerState, StepResult};
use crate::soil::upward::upward_fluxes;
use dwb_core::component::{Component, RequirementDefinition};
use dwb_core::errors::{DwbError, DwbResult};
use dwb_core::state::{InputState, OutputState};
use dwb_core::timeseries::Time;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Variable name constants
pub const VAR_SOIL_MOISTURE_EVAPORATION: &str = "Soil Moisture|Evaporation Layer";
pub const VAR_SOIL_MOISTURE_TRANSPIRATION: &str = "Soil Moisture|Transpiration Layer";
pub const VAR_SOIL_MOISTURE_TRANSITION: &str = "Soil Moisture|Transition Layer";
pub const VAR_INFILTRATION: &str = "Infiltration";
pub const VAR_EVAPORATION_DEMAND: &str = "Evaporation Demand";
pub const VAR_TRANSPIRATION_DEMAND: &str = "Transpiration Demand";
pub const VAR_STRESS_COEFFICIENT: &str = "Stress Coefficient";
pub const VAR_DEEP_PERCOLATION_DEMAND: &str = "Deep Percolation Demand";
pub const VAR_ACTUAL_EVAPORATION: &str = "Actual Evaporation";
pub const VAR_ACTUAL_TRANSPIRATION: &str = "Actual Transpiration";
pub const VAR_IRRIGATION_REQUIREMENT: &str = "Irrigation Requirement";
pub const VAR_DEEP_PERCOLATION: &str = "Deep Percolation";

/// Layered soil-moisture balance.
///
/// The physics lives in [`SoilMoisture::solve_step`], a pure function from
/// the previous day's [`LayerState`] and the day's [`FluxBundle`] to a
/// [`StepResult`]; the `Component` implementation only adapts it onto the
/// model's state plumbing. Callers driving the engine directly thread the
/// returned state into the next call themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilMoisture {
    parameters: SoilProfileParameters,
}

impl SoilMoisture {
    /// Create a soil-moisture component, failing fast on an invalid profile.
    pub fn from_parameters(parameters: SoilProfileParameters) -> DwbResult<Self> {
        parameters.validate()?;
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &SoilProfileParameters {
        &self.parameters
    }

    /// Advance the profile by one day.
    pub fn solve_step(
        &self,
        previous: &LayerState,
        fluxes: &FluxBundle,
    ) -> DwbResult<StepResult> {
        fluxes.validate()?;
        match self.parameters.cover {
            CoverState::Covered { .. } => self.solve_covered(previous, fluxes),
            CoverState::Bare => self.solve_bare(previous, fluxes),
        }
    }

    fn solve_covered(
        &self,
        previous: &LayerState,
        fluxes: &FluxBundle,
    ) -> DwbResult<StepResult> {
        let evaporation_bounds = self.parameters.bounds(SoilLayer::Evaporation)?;
        let transpiration_bounds = self.parameters.bounds(SoilLayer::Transpiration)?;
        let transition_bounds = self.parameters.bounds(SoilLayer::Transition)?;

        let prev_transpiration = previous.transpiration_mm.ok_or_else(|| {
            DwbError::StateSeed(
                "transpiration-layer storage is required under cover".to_string(),
            )
        })?;
        let seeded_evaporation = seed_content(previous.evaporation_mm, evaporation_bounds)?;
        let seeded_transpiration = seed_content(prev_transpiration, transpiration_bounds)?;
        let seeded_transition = seed_content(previous.transition_mm, transition_bounds)?;
        let seeded = LayerState::covered(
            seeded_evaporation,
            seeded_transpiration,
            seeded_transition,
        );

        // Capillary rise is evaluated on the previous day's contents before
        // the downward pass runs
        let upward = upward_fluxes(
            &self.parameters.cover,
            evaporation_bounds,
            Some(transpiration_bounds),
            transition_bounds,
            &seeded,
            fluxes.hydraulic_conductivity_transpiration,
            fluxes.hydraulic_conductivity_transition,
            self.parameters.clamp_negative_upward_flux,
        )?;

        let evaporation = update_evaporation_layer(
            seeded_evaporation,
            fluxes.infiltration_mm,
            fluxes.evaporation_demand_mm,
            evaporation_bounds,
        );

        let transpiration = update_transpiration_layer(
            seeded_transpiration,
            evaporation.excess_mm,
            0.0,
            fluxes.transpiration_demand_mm,
            upward.transition_to_transpiration_mm,
            upward.transpiration_to_evaporation_mm,
            fluxes.mad,
            transpiration_bounds.with_stress(fluxes.stress_coefficient),
        );

        let transition = update_transition_layer(
            seeded_transition,
            transpiration.outbound_to_transition_mm,
            fluxes.deep_percolation_demand_mm,
            transpiration.upward_from_transition_mm,
            transition_bounds,
        );

        if transpiration.irrigation_requirement_mm > 0.0 {
            debug!(
                "irrigation requirement of {:.2} mm",
                transpiration.irrigation_requirement_mm
            );
        }

        Ok(StepResult {
            state: LayerState::covered(
                evaporation.content_mm,
                transpiration.content_mm,
                transition.content_mm,
            ),
            actual_evaporation_mm: evaporation.actual_evaporation_mm,
            actual_transpiration_mm: transpiration.actual_transpiration_mm,
            infiltration_to_transpiration_mm: evaporation.excess_mm,
            infiltration_to_transition_mm: transpiration.outbound_to_transition_mm,
            irrigation_requirement_mm: transpiration.irrigation_requirement_mm,
            deep_percolation_out_mm: transition.deep_percolation_out_mm,
        })
    }

    fn solve_bare(&self, previous: &LayerState, fluxes: &FluxBundle) -> DwbResult<StepResult> {
        let evaporation_bounds = self.parameters.bounds(SoilLayer::Evaporation)?;
        let transition_bounds = self.parameters.bounds(SoilLayer::Transition)?;

        let prev_evaporation = seed_content(previous.evaporation_mm, evaporation_bounds)?;
        let prev_transition = seed_content(previous.transition_mm, transition_bounds)?;

        let evaporation = update_evaporation_layer(
            prev_evaporation,
            fluxes.infiltration_mm,
            fluxes.evaporation_demand_mm,
            evaporation_bounds,
        );

        // Without a crop the evaporation layer's surplus feeds the
        // transition layer directly and no irrigation requirement exists
        let transition = update_transition_layer(
            prev_transition,
            evaporation.excess_mm,
            fluxes.deep_percolation_demand_mm,
            0.0,
            transition_bounds,
        );

        Ok(StepResult {
            state: LayerState::bare(evaporation.content_mm, transition.content_mm),
            actual_evaporation_mm: evaporation.actual_evaporation_mm,
            actual_transpiration_mm: 0.0,
            infiltration_to_transpiration_mm: 0.0,
            infiltration_to_transition_mm: evaporation.excess_mm,
            irrigation_requirement_mm: 0.0,
            deep_percolation_out_mm: transition.deep_percolation_out_mm,
        })
    }
}

#[typetag::serde]
impl Component for SoilMoisture {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        let mut definitions = vec![
            RequirementDefinition::scalar_input(VAR_INFILTRATION, "mm / day"),
            RequirementDefinition::scalar_input(VAR_EVAPORATION_DEMAND, "mm / day"),
            RequirementDefinition::scalar_input(VAR_DEEP_PERCOLATION_DEMAND, "mm / day"),
            RequirementDefinition::scalar_state(VAR_SOIL_MOISTURE_EVAPORATION, "mm"),
            RequirementDefinition::scalar_state(VAR_SOIL_MOISTURE_TRANSITION, "mm"),
            RequirementDefinition::scalar_output(VAR_ACTUAL_EVAPORATION, "mm / day"),
            RequirementDefinition::scalar_output(VAR_DEEP_PERCOLATION, "mm / day"),
        ];
        if self.parameters.cover.is_covered() {
            definitions.extend([
                RequirementDefinition::scalar_input(VAR_TRANSPIRATION_DEMAND, "mm / day"),
                RequirementDefinition::scalar_input(VAR_STRESS_COEFFICIENT, "dimensionless"),
                RequirementDefinition::scalar_state(VAR_SOIL_MOISTURE_TRANSPIRATION, "mm"),
                RequirementDefinition::scalar_output(VAR_ACTUAL_TRANSPIRATION, "mm / day"),
                RequirementDefinition::scalar_output(VAR_IRRIGATION_REQUIREMENT, "mm / day"),
            ]);
        }
        definitions
    }

    fn solve(
        &self,
        _t_current: Time,
        _t_next: Time,
        input_state: &InputState,
    ) -> DwbResult<OutputState> {
        let covered = self.parameters.cover.is_covered();

        let previous = LayerState {
            evaporation_mm: input_state.get_latest(VAR_SOIL_MOISTURE_EVAPORATION),
            transpiration_mm: covered
                .then(|| input_state.get_latest(VAR_SOIL_MOISTURE_TRANSPIRATION)),
            transition_mm: input_state.get_latest(VAR_SOIL_MOISTURE_TRANSITION),
        };

        let fluxes = FluxBundle {
            infiltration_mm: input_state.get_latest(VAR_INFILTRATION),
            evaporation_demand_mm: input_state.get_latest(VAR_EVAPORATION_DEMAND),
            transpiration_demand_mm: if covered {
                input_state.get_latest(VAR_TRANSPIRATION_DEMAND)
            } else {
                0.0
            },
            deep_percolation_demand_mm: input_state.get_latest(VAR_DEEP_PERCOLATION_DEMAND),
            stress_coefficient: if covered {
                input_state.get_latest(VAR_STRESS_COEFFICIENT)
            } else {
                1.0
            },
            mad: self.parameters.mad,
            hydraulic_conductivity_transpiration: self
                .parameters
                .hydraulic_conductivity_transpiration,
            hydraulic_conductivity_transition: self.parameters.hydraulic_conductivity_transition,
        };

        let result = self.solve_step(&previous, &fluxes)?;

        let mut output = HashMap::new();
        output.insert(
            VAR_SOIL_MOISTURE_EVAPORATION.to_string(),
            result.state.evaporation_mm,
        );
        output.insert(
            VAR_SOIL_MOISTURE_TRANSITION.to_string(),
            result.state.transition_mm,
        );
        output.insert(
            VAR_ACTUAL_EVAPORATION.to_string(),
            result.actual_evaporation_mm,
        );
        output.insert(
            VAR_DEEP_PERCOLATION.to_string(),
            result.deep_percolation_out_mm,
        );
        if let Some(transpiration_mm) = result.state.transpiration_mm {
            output.insert(
                VAR_SOIL_MOISTURE_TRANSPIRATION.to_string(),
                transpiration_mm,
            );
            output.insert(
                VAR_ACTUAL_TRANSPIRATION.to_string(),
                result.actual_transpiration_mm,
            );
            output.insert(
                VAR_IRRIGATION_REQUIREMENT.to_string(),
                result.irrigation_requirement_mm,
            );
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{LayerSoilProperties, SoilDepthTable};
    use approx::assert_abs_diff_eq;

    /// Bare profile with evaporation bounds of 30/10 mm over 10 cm and
    /// transition bounds of 50/15 mm over 100 cm.
    fn bare_profile() -> SoilProfileParameters {
        SoilProfileParameters {
            evaporation: LayerSoilProperties {
                field_capacity_pct: 30.0,
                wilting_point_pct: 10.0,
            },
            transition: LayerSoilProperties {
                field_capacity_pct: 5.0,
                wilting_point_pct: 1.5,
            },
            depths: SoilDepthTable {
                evaporation_bare_cm: 10.0,
                transition_bare_cm: 100.0,
                ..Default::default()
            },
            cover: CoverState::Bare,
            ..Default::default()
        }
    }

    /// Covered profile whose root zone holds 80/10 mm over a 10 cm root
    /// depth, so a stress coefficient of 0.5 gives a usable capacity of 40 mm.
    fn covered_profile() -> SoilProfileParameters {
        SoilProfileParameters {
            evaporation: LayerSoilProperties {
                field_capacity_pct: 30.0,
                wilting_point_pct: 10.0,
            },
            transpiration: LayerSoilProperties {
                field_capacity_pct: 80.0,
                wilting_point_pct: 10.0,
            },
            transition: LayerSoilProperties {
                field_capacity_pct: 5.0,
                wilting_point_pct: 1.5,
            },
            depths: SoilDepthTable {
                evaporation_covered_cm: 10.0,
                transition_covered_cm: 100.0,
                ..Default::default()
            },
            cover: CoverState::Covered { root_depth_cm: 10.0 },
            ..Default::default()
        }
    }

    #[test]
    fn surplus_in_the_evaporation_layer_cascades_down() {
        let engine = SoilMoisture::from_parameters(bare_profile()).unwrap();
        let previous = LayerState::bare(28.0, 30.0);
        let fluxes = FluxBundle {
            infiltration_mm: 10.0,
            evaporation_demand_mm: 3.0,
            ..Default::default()
        };

        let result = engine.solve_step(&previous, &fluxes).unwrap();
        assert_eq!(result.state.evaporation_mm, 30.0);
        assert_eq!(result.infiltration_to_transition_mm, 5.0);
        assert_eq!(result.actual_evaporation_mm, 3.0);
        assert_eq!(result.state.transition_mm, 35.0);
        assert_eq!(result.deep_percolation_out_mm, 0.0);
    }

    #[test]
    fn deficit_in_the_evaporation_layer_reduces_extraction() {
        let engine = SoilMoisture::from_parameters(bare_profile()).unwrap();
        let previous = LayerState::bare(12.0, 30.0);
        let fluxes = FluxBundle {
            evaporation_demand_mm: 5.0,
            ..Default::default()
        };

        let result = engine.solve_step(&previous, &fluxes).unwrap();
        assert_eq!(result.state.evaporation_mm, 10.0);
        assert_eq!(result.actual_evaporation_mm, 2.0);
    }

    #[test]
    fn full_transition_layer_sheds_deep_percolation() {
        let engine = SoilMoisture::from_parameters(bare_profile()).unwrap();
        // The evaporation layer is already at capacity, so all infiltration
        // passes straight through to the transition layer
        let previous = LayerState::bare(30.0, 45.0);
        let fluxes = FluxBundle {
            infiltration_mm: 10.0,
            ..Default::default()
        };

        let result = engine.solve_step(&previous, &fluxes).unwrap();
        assert_eq!(result.infiltration_to_transition_mm, 10.0);
        assert_eq!(result.state.transition_mm, 50.0);
        assert_eq!(result.deep_percolation_out_mm, 5.0);
    }

    #[test]
    fn depletion_past_the_allowable_fraction_schedules_a_refill() {
        let engine = SoilMoisture::from_parameters(covered_profile()).unwrap();
        let previous = LayerState::covered(20.0, 12.0, 30.0);
        let fluxes = FluxBundle {
            stress_coefficient: 0.5,
            ..Default::default()
        };

        // Usable capacity 40 mm, threshold 0.5 * (40 - 10) = 15 mm, raw = 12
        let result = engine.solve_step(&previous, &fluxes).unwrap();
        assert_eq!(result.state.transpiration_mm, Some(40.0));
        assert_eq!(result.actual_transpiration_mm, 0.0);
        assert_eq!(result.irrigation_requirement_mm, 28.0);
    }

    #[test]
    fn bare_steps_never_request_irrigation() {
        let engine = SoilMoisture::from_parameters(bare_profile()).unwrap();
        let previous = LayerState::bare(12.0, 20.0);
        let fluxes = FluxBundle {
            evaporation_demand_mm: 8.0,
            ..Default::default()
        };

        let result = engine.solve_step(&previous, &fluxes).unwrap();
        assert_eq!(result.irrigation_requirement_mm, 0.0);
        assert_eq!(result.actual_transpiration_mm, 0.0);
        assert_eq!(result.state.transpiration_mm, None);
    }

    #[test]
    fn storages_stay_within_bounds_over_a_wet_dry_cycle() {
        let engine = SoilMoisture::from_parameters(covered_profile()).unwrap();
        let mut state = LayerState::covered(20.0, 45.0, 30.0);

        for day in 0..60 {
            let wet = day % 10 < 3;
            let fluxes = FluxBundle {
                infiltration_mm: if wet { 12.0 } else { 0.0 },
                evaporation_demand_mm: 2.0,
                transpiration_demand_mm: 3.0,
                hydraulic_conductivity_transpiration: 4.0,
                hydraulic_conductivity_transition: 2.0,
                ..Default::default()
            };
            let result = engine.solve_step(&state, &fluxes).unwrap();
            state = result.state;

            assert!((10.0..=30.0).contains(&state.evaporation_mm));
            assert!((10.0..=80.0).contains(&state.transpiration_mm.unwrap()));
            assert!((15.0..=50.0).contains(&state.transition_mm));
        }
    }

    #[test]
    fn unclamped_step_is_exact_bookkeeping() {
        let engine = SoilMoisture::from_parameters(bare_profile()).unwrap();
        let previous = LayerState::bare(20.0, 30.0);
        let fluxes = FluxBundle {
            infiltration_mm: 4.0,
            evaporation_demand_mm: 3.0,
            ..Default::default()
        };

        let result = engine.solve_step(&previous, &fluxes).unwrap();
        assert_abs_diff_eq!(
            result.state.evaporation_mm - previous.evaporation_mm,
            fluxes.infiltration_mm - fluxes.evaporation_demand_mm
        );
        assert_eq!(result.state.transition_mm, previous.transition_mm);
    }

    #[test]
    fn zero_flux_step_leaves_storages_unchanged() {
        let engine = SoilMoisture::from_parameters(covered_profile()).unwrap();
        // Root zone above the depletion threshold so no refill triggers
        let previous = LayerState::covered(20.0, 60.0, 30.0);

        let result = engine
            .solve_step(&previous, &FluxBundle::default())
            .unwrap();
        assert_eq!(result.state, previous);
    }

    #[test]
    fn dry_entry_storage_is_raised_to_the_wilting_point() {
        let engine = SoilMoisture::from_parameters(bare_profile()).unwrap();
        let previous = LayerState::bare(2.0, 30.0);

        let result = engine
            .solve_step(&previous, &FluxBundle::default())
            .unwrap();
        assert_eq!(result.state.evaporation_mm, 10.0);
    }

    #[test]
    fn overfull_entry_storage_is_rejected() {
        let engine = SoilMoisture::from_parameters(bare_profile()).unwrap();
        let previous = LayerState::bare(31.0, 30.0);

        assert!(matches!(
            engine.solve_step(&previous, &FluxBundle::default()),
            Err(DwbError::StateSeed(_))
        ));
    }

    #[test]
    fn invalid_profile_is_rejected_before_any_step() {
        let mut profile = bare_profile();
        profile.mad = 3.0;
        assert!(SoilMoisture::from_parameters(profile).is_err());
    }

    #[test]
    fn definitions_depend_on_cover_state() {
        let bare = SoilMoisture::from_parameters(bare_profile()).unwrap();
        let covered = SoilMoisture::from_parameters(covered_profile()).unwrap();

        let bare_names: Vec<String> =
            bare.definitions().iter().map(|d| d.name.clone()).collect();
        assert!(!bare_names.contains(&VAR_SOIL_MOISTURE_TRANSPIRATION.to_string()));
        assert!(!bare_names.contains(&VAR_IRRIGATION_REQUIREMENT.to_string()));

        let covered_names: Vec<String> = covered
            .definitions()
            .iter()
            .map(|d| d.name.clone())
            .collect();
        assert!(covered_names.contains(&VAR_SOIL_MOISTURE_TRANSPIRATION.to_string()));
        assert!(covered_names.contains(&VAR_ACTUAL_TRANSPIRATION.to_string()));
    }

    #[test]
    fn serialization_round_trip() {
        let engine = SoilMoisture::from_parameters(covered_profile()).unwrap();
        let json = serde_json::to_string(&engine).expect("Serialization failed");
        let parsed: SoilMoisture = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(parsed.parameters, engine.parameters);
    }
}
