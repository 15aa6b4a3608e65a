//! Per-compartment update rules.
//!
//! Each rule is a pure function from the previous storage and the day's
//! fluxes to the new storage plus the fluxes it actually consumed or passed
//! on. Clamping against the field-capacity/wilting-point bounds is ordinary
//! control flow here, never an error: a deficit or surplus only adjusts the
//! returned fields. Every branch assigns every output field explicitly.

use crate::soil::bounds::LayerBounds;
use dwb_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Outcome of the evaporation-layer update.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaporationLayerUpdate {
    pub content_mm: FloatValue,
    pub actual_evaporation_mm: FloatValue,
    /// Surplus routed to the next compartment down (transpiration layer
    /// under cover, transition layer on bare soil).
    pub excess_mm: FloatValue,
}

/// Update the evaporation layer.
///
/// `raw = prev + infiltration - demand`. A surplus above field capacity is
/// routed downward; a deficit below the wilting point reduces the actual
/// evaporation to what the storage could supply before reaching the floor.
///
/// The deficit reduction is computed from the previous storage alone,
/// without the infiltration added in the same step.
pub fn update_evaporation_layer(
    prev_content_mm: FloatValue,
    infiltration_mm: FloatValue,
    evaporation_demand_mm: FloatValue,
    bounds: LayerBounds,
) -> EvaporationLayerUpdate {
    let raw = prev_content_mm + infiltration_mm - evaporation_demand_mm;

    if raw <= bounds.wilting_point_mm {
        EvaporationLayerUpdate {
            content_mm: bounds.wilting_point_mm,
            actual_evaporation_mm: prev_content_mm - bounds.wilting_point_mm,
            excess_mm: 0.0,
        }
    } else if raw >= bounds.field_capacity_mm {
        EvaporationLayerUpdate {
            content_mm: bounds.field_capacity_mm,
            actual_evaporation_mm: evaporation_demand_mm,
            excess_mm: raw - bounds.field_capacity_mm,
        }
    } else {
        EvaporationLayerUpdate {
            content_mm: raw,
            actual_evaporation_mm: evaporation_demand_mm,
            excess_mm: 0.0,
        }
    }
}

/// Outcome of the transpiration-layer update.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranspirationLayerUpdate {
    pub content_mm: FloatValue,
    pub actual_transpiration_mm: FloatValue,
    pub outbound_to_transition_mm: FloatValue,
    pub irrigation_requirement_mm: FloatValue,
    /// Upward flux toward the evaporation layer after the tie-breaks.
    pub upward_to_evaporation_mm: FloatValue,
    /// Upward flux received from the transition layer after the tie-breaks.
    pub upward_from_transition_mm: FloatValue,
}

/// Update the transpiration layer (covered state only).
///
/// The usable capacity is the stressed field capacity `fc' = fc * Ks`; the
/// wilting point is unmodified. Three regimes apply to
/// `raw = prev + inbound + upward_in - demand - upward_out - prior_outbound`:
///
/// 1. deficit (`raw <= pwp`): clamp to the wilting point, reduce the actual
///    transpiration to what was extractable, request a full refill.
/// 2. surplus (`raw >= fc'`): clamp to the stressed capacity and route the
///    excess to the transition layer.
/// 3. in between, a depletion check: once the storage is drawn down past
///    `MAD * (fc' - pwp)` the store is refilled to `fc'` and transpiration
///    is suppressed for the step; otherwise the storage simply becomes
///    `raw`.
///
/// A downward flux arriving from the evaporation layer zeroes any upward
/// flux into it; a positive prior outbound flux to the transition layer
/// zeroes both upward fluxes.
#[allow(clippy::too_many_arguments)]
pub fn update_transpiration_layer(
    prev_content_mm: FloatValue,
    inbound_from_evaporation_mm: FloatValue,
    prior_outbound_to_transition_mm: FloatValue,
    transpiration_demand_mm: FloatValue,
    mut upward_from_transition_mm: FloatValue,
    mut upward_to_evaporation_mm: FloatValue,
    mad: FloatValue,
    stressed_bounds: LayerBounds,
) -> TranspirationLayerUpdate {
    // Downward movement dominates upward movement within a single step
    if inbound_from_evaporation_mm > 0.0 {
        upward_to_evaporation_mm = 0.0;
    }
    if prior_outbound_to_transition_mm > 0.0 {
        upward_from_transition_mm = 0.0;
        upward_to_evaporation_mm = 0.0;
    }

    let fc = stressed_bounds.field_capacity_mm;
    let pwp = stressed_bounds.wilting_point_mm;

    let raw = prev_content_mm + inbound_from_evaporation_mm + upward_from_transition_mm
        - transpiration_demand_mm
        - upward_to_evaporation_mm
        - prior_outbound_to_transition_mm;

    if raw <= pwp {
        TranspirationLayerUpdate {
            content_mm: pwp,
            actual_transpiration_mm: prev_content_mm - pwp + upward_from_transition_mm,
            outbound_to_transition_mm: 0.0,
            irrigation_requirement_mm: fc - pwp,
            upward_to_evaporation_mm,
            upward_from_transition_mm,
        }
    } else if raw >= fc {
        TranspirationLayerUpdate {
            content_mm: fc,
            actual_transpiration_mm: transpiration_demand_mm,
            outbound_to_transition_mm: raw - fc,
            irrigation_requirement_mm: 0.0,
            upward_to_evaporation_mm,
            upward_from_transition_mm,
        }
    } else {
        let threshold = mad * (fc - pwp);
        if raw <= threshold {
            // Drawn down past the allowable depletion: scheduled refill
            TranspirationLayerUpdate {
                content_mm: fc,
                actual_transpiration_mm: 0.0,
                outbound_to_transition_mm: prior_outbound_to_transition_mm,
                irrigation_requirement_mm: fc - raw,
                upward_to_evaporation_mm,
                upward_from_transition_mm,
            }
        } else {
            TranspirationLayerUpdate {
                content_mm: raw,
                actual_transpiration_mm: transpiration_demand_mm,
                outbound_to_transition_mm: prior_outbound_to_transition_mm,
                irrigation_requirement_mm: 0.0,
                upward_to_evaporation_mm,
                upward_from_transition_mm,
            }
        }
    }
}

/// Outcome of the transition-layer update.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionLayerUpdate {
    pub content_mm: FloatValue,
    /// Upward flux actually granted after any shortfall reduction.
    pub upward_granted_mm: FloatValue,
    pub deep_percolation_out_mm: FloatValue,
}

/// Update the transition layer.
///
/// `raw = prev + inbound - demand - upward_extracted`. A storage that would
/// fall below the wilting point reduces the upward flux actually granted by
/// the shortfall (the layer cannot supply more than it holds); a surplus
/// above field capacity leaves the profile as deep percolation. In the
/// unclamped case an externally imposed percolation demand passes through
/// unchanged as the output value.
pub fn update_transition_layer(
    prev_content_mm: FloatValue,
    mut inbound_mm: FloatValue,
    deep_percolation_demand_mm: FloatValue,
    mut upward_extracted_mm: FloatValue,
    bounds: LayerBounds,
) -> TransitionLayerUpdate {
    // Downward and upward exchange with the layer above are mutually
    // exclusive within a step
    if inbound_mm > 0.0 {
        upward_extracted_mm = 0.0;
    }
    if upward_extracted_mm > 0.0 {
        inbound_mm = 0.0;
    }

    let raw = prev_content_mm + inbound_mm - deep_percolation_demand_mm - upward_extracted_mm;

    if raw < bounds.wilting_point_mm {
        TransitionLayerUpdate {
            content_mm: bounds.wilting_point_mm,
            upward_granted_mm: upward_extracted_mm - (bounds.wilting_point_mm - raw),
            deep_percolation_out_mm: deep_percolation_demand_mm,
        }
    } else if raw > bounds.field_capacity_mm {
        TransitionLayerUpdate {
            content_mm: bounds.field_capacity_mm,
            upward_granted_mm: upward_extracted_mm,
            deep_percolation_out_mm: raw - bounds.field_capacity_mm,
        }
    } else {
        TransitionLayerUpdate {
            content_mm: raw,
            upward_granted_mm: upward_extracted_mm,
            deep_percolation_out_mm: deep_percolation_demand_mm,
        }
    }
}
