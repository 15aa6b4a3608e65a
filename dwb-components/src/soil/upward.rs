//! Capillary redistribution between adjacent compartments.
//!
//! Upward fluxes are driven by relative-saturation gradients evaluated on
//! the *previous* timestep's contents, so the result is independent of the
//! order the per-layer updates run in within a step.

use crate::soil::bounds::{CoverState, LayerBounds};
use crate::soil::state::LayerState;
use dwb_core::errors::{DwbError, DwbResult};
use dwb_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Capillary fluxes for one timestep, in millimetres.
///
/// Under cover the transition feeds the transpiration layer and the
/// transpiration layer feeds the evaporation layer; on bare soil a single
/// flux runs from the transition straight to the evaporation layer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpwardFluxes {
    pub transpiration_to_evaporation_mm: FloatValue,
    pub transition_to_transpiration_mm: FloatValue,
    pub transition_to_evaporation_mm: FloatValue,
}

/// Gradient-conductivity products for the covered and bare configurations.
///
/// Each gradient `alpha` is the saturation difference between the donor
/// (lower) and receiver (upper) compartment; the flux is
/// `alpha * hydraulic_conductivity` of the donor layer. The bare-soil
/// gradient is not guarded and may be negative; `clamp_negative` floors the
/// fluxes at zero for callers that want strictly non-negative capillary
/// rise.
#[allow(clippy::too_many_arguments)]
pub fn upward_fluxes(
    cover: &CoverState,
    evaporation_bounds: LayerBounds,
    transpiration_bounds: Option<LayerBounds>,
    transition_bounds: LayerBounds,
    previous: &LayerState,
    hydraulic_conductivity_transpiration: FloatValue,
    hydraulic_conductivity_transition: FloatValue,
    clamp_negative: bool,
) -> DwbResult<UpwardFluxes> {
    let t_evaporation = evaporation_bounds.saturation_ratio(previous.evaporation_mm)?;
    let t_transition = transition_bounds.saturation_ratio(previous.transition_mm)?;

    let mut fluxes = match cover {
        CoverState::Covered { .. } => {
            let bounds = transpiration_bounds.ok_or_else(|| {
                DwbError::Configuration(
                    "transpiration-layer bounds are required under cover".to_string(),
                )
            })?;
            let content = previous.transpiration_mm.ok_or_else(|| {
                DwbError::StateSeed(
                    "transpiration-layer storage is required under cover".to_string(),
                )
            })?;
            let t_transpiration = bounds.saturation_ratio(content)?;

            if t_transpiration >= t_transition || t_evaporation >= t_transpiration {
                // No rise against (or along a flat) gradient
                UpwardFluxes::default()
            } else {
                let alpha_transpiration_to_evaporation = t_transpiration - t_evaporation;
                let alpha_transition_to_transpiration = t_transition - t_transpiration;
                UpwardFluxes {
                    transpiration_to_evaporation_mm: alpha_transpiration_to_evaporation
                        * hydraulic_conductivity_transpiration,
                    transition_to_transpiration_mm: alpha_transition_to_transpiration
                        * hydraulic_conductivity_transition,
                    transition_to_evaporation_mm: 0.0,
                }
            }
        }
        CoverState::Bare => {
            let alpha_transition_to_evaporation = t_transition - t_evaporation;
            UpwardFluxes {
                transpiration_to_evaporation_mm: 0.0,
                transition_to_transpiration_mm: 0.0,
                transition_to_evaporation_mm: alpha_transition_to_evaporation
                    * hydraulic_conductivity_transition,
            }
        }
    };

    if clamp_negative {
        fluxes.transpiration_to_evaporation_mm = fluxes.transpiration_to_evaporation_mm.max(0.0);
        fluxes.transition_to_transpiration_mm = fluxes.transition_to_transpiration_mm.max(0.0);
        fluxes.transition_to_evaporation_mm = fluxes.transition_to_evaporation_mm.max(0.0);
    }

    Ok(fluxes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bounds(fc: FloatValue, pwp: FloatValue) -> LayerBounds {
        LayerBounds {
            field_capacity_mm: fc,
            wilting_point_mm: pwp,
        }
    }

    #[test]
    fn covered_gradients_drive_both_fluxes() {
        // Saturations: evaporation 0.25, transpiration 0.5, transition 0.75
        let previous = LayerState::covered(15.0, 25.0, 40.0);
        let fluxes = upward_fluxes(
            &CoverState::Covered { root_depth_cm: 30.0 },
            bounds(30.0, 10.0),
            Some(bounds(40.0, 10.0)),
            bounds(50.0, 10.0),
            &previous,
            4.0,
            2.0,
            false,
        )
        .unwrap();

        assert_abs_diff_eq!(fluxes.transpiration_to_evaporation_mm, 0.25 * 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fluxes.transition_to_transpiration_mm, 0.25 * 2.0, epsilon = 1e-12);
        assert_eq!(fluxes.transition_to_evaporation_mm, 0.0);
    }

    #[test]
    fn covered_flat_or_inverted_gradient_gives_no_rise() {
        // Transpiration wetter than transition: no upward flow at all
        let previous = LayerState::covered(15.0, 35.0, 20.0);
        let fluxes = upward_fluxes(
            &CoverState::Covered { root_depth_cm: 30.0 },
            bounds(30.0, 10.0),
            Some(bounds(40.0, 10.0)),
            bounds(50.0, 10.0),
            &previous,
            4.0,
            2.0,
            false,
        )
        .unwrap();

        assert_eq!(fluxes, UpwardFluxes::default());
    }

    #[test]
    fn bare_gradient_may_be_negative() {
        // Evaporation layer wetter than transition: alpha < 0 is preserved
        let previous = LayerState::bare(28.0, 20.0);
        let fluxes = upward_fluxes(
            &CoverState::Bare,
            bounds(30.0, 10.0),
            None,
            bounds(50.0, 10.0),
            &previous,
            0.0,
            2.0,
            false,
        )
        .unwrap();

        // t_transition = 0.25, t_evaporation = 0.9
        assert_abs_diff_eq!(
            fluxes.transition_to_evaporation_mm,
            (0.25 - 0.9) * 2.0,
            epsilon = 1e-12
        );
        assert!(fluxes.transition_to_evaporation_mm < 0.0);
    }

    #[test]
    fn negative_gradient_clamp_is_opt_in() {
        let previous = LayerState::bare(28.0, 20.0);
        let fluxes = upward_fluxes(
            &CoverState::Bare,
            bounds(30.0, 10.0),
            None,
            bounds(50.0, 10.0),
            &previous,
            0.0,
            2.0,
            true,
        )
        .unwrap();

        assert_eq!(fluxes.transition_to_evaporation_mm, 0.0);
    }

    #[test]
    fn missing_transpiration_storage_is_rejected_under_cover() {
        let previous = LayerState::bare(15.0, 20.0);
        let result = upward_fluxes(
            &CoverState::Covered { root_depth_cm: 30.0 },
            bounds(30.0, 10.0),
            Some(bounds(40.0, 10.0)),
            bounds(50.0, 10.0),
            &previous,
            4.0,
            2.0,
            false,
        );

        assert!(result.is_err());
    }
}
