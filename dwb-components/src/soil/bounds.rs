//! Compartment identity and per-timestep storage bounds.

use crate::constants::{MM_PER_CM, PERCENT};
use dwb_core::errors::{DwbError, DwbResult};
use dwb_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// The three lumped soil compartments, top to bottom.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilLayer {
    Evaporation,
    Transpiration,
    Transition,
}

/// Ground-cover state of the site.
///
/// The transpiration compartment only exists under cover; its depth is the
/// root depth carried by the variant.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CoverState {
    Bare,
    Covered {
        /// Root depth of the crop
        /// unit: cm
        root_depth_cm: FloatValue,
    },
}

impl CoverState {
    pub fn is_covered(&self) -> bool {
        matches!(self, CoverState::Covered { .. })
    }
}

/// Storage bounds of one compartment for one timestep, in millimetres.
///
/// Derived from static volumetric percentages and the compartment depth:
/// `bound_mm = (pct / 100) * depth_cm * 10`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerBounds {
    pub field_capacity_mm: FloatValue,
    pub wilting_point_mm: FloatValue,
}

impl LayerBounds {
    pub fn from_percentages(
        field_capacity_pct: FloatValue,
        wilting_point_pct: FloatValue,
        depth_cm: FloatValue,
    ) -> Self {
        Self {
            field_capacity_mm: field_capacity_pct / PERCENT * depth_cm * MM_PER_CM,
            wilting_point_mm: wilting_point_pct / PERCENT * depth_cm * MM_PER_CM,
        }
    }

    /// Plant-available water between the two bounds.
    pub fn available_water_mm(&self) -> FloatValue {
        self.field_capacity_mm - self.wilting_point_mm
    }

    /// Relative saturation of a storage within these bounds.
    ///
    /// `0` at the wilting point, `1` at field capacity. Errors on a
    /// degenerate configuration where the bounds coincide, rather than
    /// producing a non-finite ratio.
    pub fn saturation_ratio(&self, content_mm: FloatValue) -> DwbResult<FloatValue> {
        let available = self.available_water_mm();
        if available <= 0.0 {
            return Err(DwbError::Configuration(format!(
                "field capacity ({} mm) must exceed the wilting point ({} mm)",
                self.field_capacity_mm, self.wilting_point_mm
            )));
        }
        Ok((content_mm - self.wilting_point_mm) / available)
    }

    /// Scale the field capacity by a stress coefficient, leaving the wilting
    /// point unchanged.
    pub fn with_stress(&self, stress_coefficient: FloatValue) -> Self {
        Self {
            field_capacity_mm: self.field_capacity_mm * stress_coefficient,
            wilting_point_mm: self.wilting_point_mm,
        }
    }
}
