//! Integration tests for the coupled water balance.
//!
//! These verify that water is accounted for across components:
//! - the soil profile conserves mass in the unclamped regime
//! - a precipitation -> runoff -> soil -> percolation -> groundwater chain
//!   solved through the model runtime stays physically consistent
//! - the irrigation depletion policy fires at the expected drawdown

use approx::{assert_abs_diff_eq, assert_relative_eq};
use dwb::prelude::*;
use ndarray::Array;
use std::collections::HashMap;
use std::sync::Arc;

use dwb::components::groundwater::{
    GroundwaterBalance, PercolationCorrection, VAR_GROUNDWATER_STORAGE,
};
use dwb::components::soil::balance::{
    VAR_ACTUAL_EVAPORATION, VAR_DEEP_PERCOLATION, VAR_DEEP_PERCOLATION_DEMAND,
    VAR_EVAPORATION_DEMAND, VAR_INFILTRATION, VAR_SOIL_MOISTURE_EVAPORATION,
    VAR_SOIL_MOISTURE_TRANSITION,
};
use dwb::components::surface::runoff::{VAR_ANTECEDENT_PRECIPITATION, VAR_RUNOFF};
use dwb::components::surface::{ScsRunoff, VAR_GROWING_SEASON, VAR_PRECIPITATION};
use dwb_core::interpolate::strategies::{InterpolationStrategy, PreviousStrategy};

fn covered_profile() -> SoilProfileParameters {
    SoilProfileParameters {
        transpiration: LayerSoilProperties {
            field_capacity_pct: 80.0,
            wilting_point_pct: 10.0,
        },
        cover: CoverState::Covered { root_depth_cm: 10.0 },
        ..Default::default()
    }
}

mod soil_conservation {
    use super::*;

    /// In the unclamped regime the change in total storage equals the net
    /// of the boundary fluxes exactly.
    #[test]
    fn unclamped_steps_conserve_water() {
        let engine = SoilMoisture::from_parameters(covered_profile()).unwrap();
        // Evaporation bounds 25/10 mm (25%/10% over 10 cm), root zone
        // 80/10 mm, transition 270/135 mm (30%/15% over 90 cm)
        let mut state = LayerState::covered(20.0, 60.0, 200.0);
        let initial_total = 20.0 + 60.0 + 200.0;

        let mut net_flux = 0.0;
        for _ in 0..10 {
            let fluxes = FluxBundle {
                infiltration_mm: 2.0,
                evaporation_demand_mm: 2.0,
                transpiration_demand_mm: 1.5,
                ..Default::default()
            };
            let result = engine.solve_step(&state, &fluxes).unwrap();

            net_flux += fluxes.infiltration_mm
                - result.actual_evaporation_mm
                - result.actual_transpiration_mm
                - result.deep_percolation_out_mm;
            state = result.state;
        }

        let final_total =
            state.evaporation_mm + state.transpiration_mm.unwrap() + state.transition_mm;
        assert_relative_eq!(final_total - initial_total, net_flux, epsilon = 1e-9);
    }
}

mod coupled_chain {
    use super::*;

    fn constant_series(axis: &Arc<TimeAxis>, value: FloatValue, unit: &str) -> Timeseries {
        Timeseries::new(
            Array::from_elem(axis.len(), value),
            axis.clone(),
            unit.to_string(),
            InterpolationStrategy::from(PreviousStrategy::new(true)),
        )
    }

    /// Precipitation -> runoff -> soil profile -> percolation correction ->
    /// groundwater, solved through the model runtime.
    #[test]
    fn rainfall_pulses_propagate_to_groundwater() {
        let days = 31usize;
        let axis = Arc::new(TimeAxis::from_values(Array::range(0.0, days as f64, 1.0)));

        // 25 mm pulses once a week, otherwise dry
        let precipitation = Array::from_shape_fn(axis.len(), |i| {
            if i % 7 == 0 {
                25.0
            } else {
                0.0
            }
        });

        let mut builder = ModelBuilder::new();
        builder
            .with_time_axis(TimeAxis::from_values(Array::range(0.0, days as f64, 1.0)))
            .with_component(Arc::new(ScsRunoff::new()))
            .with_component(Arc::new(
                SoilMoisture::from_parameters(SoilProfileParameters::default()).unwrap(),
            ))
            .with_component(Arc::new(PercolationCorrection::new()))
            .with_component(Arc::new(GroundwaterBalance::new()))
            .with_exogenous_variable(
                VAR_PRECIPITATION,
                Timeseries::new(
                    precipitation,
                    axis.clone(),
                    "mm / day".to_string(),
                    InterpolationStrategy::from(PreviousStrategy::new(true)),
                ),
            )
            .with_exogenous_variable(
                VAR_ANTECEDENT_PRECIPITATION,
                constant_series(&axis, 0.0, "mm"),
            )
            .with_exogenous_variable(
                VAR_GROWING_SEASON,
                constant_series(&axis, 1.0, "dimensionless"),
            )
            .with_exogenous_variable(
                VAR_EVAPORATION_DEMAND,
                constant_series(&axis, 2.0, "mm / day"),
            )
            .with_exogenous_variable(
                VAR_DEEP_PERCOLATION_DEMAND,
                constant_series(&axis, 0.0, "mm / day"),
            )
            .with_initial_values(HashMap::from([
                (VAR_SOIL_MOISTURE_EVAPORATION.to_string(), 20.0),
                // Transition layer close to its 300 mm capacity so the
                // first pulse percolates
                (VAR_SOIL_MOISTURE_TRANSITION.to_string(), 298.0),
                (VAR_GROUNDWATER_STORAGE.to_string(), 50.0),
            ]));
        let mut model = builder.build().unwrap();
        model.run();

        let collection = model.timeseries();
        let runoff = collection.get_timeseries_by_name(VAR_RUNOFF).unwrap();
        let infiltration = collection.get_timeseries_by_name(VAR_INFILTRATION).unwrap();
        let evaporation_storage = collection
            .get_timeseries_by_name(VAR_SOIL_MOISTURE_EVAPORATION)
            .unwrap();
        let transition_storage = collection
            .get_timeseries_by_name(VAR_SOIL_MOISTURE_TRANSITION)
            .unwrap();
        let actual_evaporation = collection
            .get_timeseries_by_name(VAR_ACTUAL_EVAPORATION)
            .unwrap();
        let percolation = collection
            .get_timeseries_by_name(VAR_DEEP_PERCOLATION)
            .unwrap();
        let storage = collection
            .get_timeseries_by_name(VAR_GROUNDWATER_STORAGE)
            .unwrap();

        for i in 1..days {
            // Output at index i was solved from the inputs of step i - 1
            let rainfall = if (i - 1) % 7 == 0 { 25.0 } else { 0.0 };
            let runoff_i = runoff.at(i).unwrap();
            let infiltration_i = infiltration.at(i).unwrap();
            assert!(runoff_i >= 0.0 && infiltration_i >= 0.0);
            assert!(runoff_i + infiltration_i <= rainfall + 1e-9);

            // Storages stay within the profile's bounds
            let evaporation_i = evaporation_storage.at(i).unwrap();
            assert!((15.0..=37.5).contains(&evaporation_i));
            let transition_i = transition_storage.at(i).unwrap();
            assert!((150.0..=300.0).contains(&transition_i));

            // Extraction never exceeds the demand
            assert!(actual_evaporation.at(i).unwrap() <= 2.0 + 1e-9);
        }

        // Some of the first pulse reached the aquifer
        let total_percolation: FloatValue =
            (1..days).map(|i| percolation.at(i).unwrap()).sum();
        assert!(total_percolation > 0.0);

        // The groundwater storage accumulated exactly the recharged share
        let geology_permeability = 0.1;
        assert_abs_diff_eq!(
            storage.at(days - 1).unwrap() - 50.0,
            total_percolation * (1.0 - geology_permeability),
            epsilon = 1e-9
        );
    }
}

mod irrigation_policy {
    use super::*;

    /// Drawing the root zone down past MAD * available water triggers a
    /// scheduled refill with a matching irrigation requirement.
    #[test]
    fn depletion_triggers_a_refill() {
        let engine = SoilMoisture::from_parameters(covered_profile()).unwrap();
        // Root zone: fc' = 80 mm (no stress), pwp = 10 mm, threshold =
        // 0.5 * 70 = 35 mm
        let mut state = LayerState::covered(20.0, 60.0, 200.0);

        let mut refill_days = Vec::new();
        for day in 0..6 {
            let fluxes = FluxBundle {
                transpiration_demand_mm: 5.0,
                ..Default::default()
            };
            let result = engine.solve_step(&state, &fluxes).unwrap();

            if result.irrigation_requirement_mm > 0.0 {
                refill_days.push(day);
                assert_eq!(result.state.transpiration_mm, Some(80.0));
                assert_eq!(result.actual_transpiration_mm, 0.0);
                assert_abs_diff_eq!(result.irrigation_requirement_mm, 45.0);
            }
            state = result.state;
        }

        // 60 mm less 5 mm/day reaches the 35 mm threshold on the fifth day
        assert_eq!(refill_days, vec![4]);
    }
}
