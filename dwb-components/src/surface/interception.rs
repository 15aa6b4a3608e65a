//! Canopy interception by the bucket method.
//!
//! A fixed fraction of the day's precipitation is held on the canopy and
//! never reaches the ground; the ratio depends on the canopy class and, for
//! mixed forest, on whether the growing season is underway.

use crate::parameters::{CanopyClass, InterceptionParameters};
use crate::surface::{VAR_GROWING_SEASON, VAR_PRECIPITATION};
use dwb_core::component::{Component, RequirementDefinition};
use dwb_core::errors::DwbResult;
use dwb_core::state::{InputState, OutputState};
use dwb_core::timeseries::{FloatValue, Time};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const VAR_INTERCEPTION: &str = "Interception";

/// Interception ratio for a canopy class.
pub fn interception_ratio(canopy: CanopyClass, growing_season: bool) -> FloatValue {
    match canopy {
        CanopyClass::ForestMixed => {
            if growing_season {
                0.06
            } else {
                0.03
            }
        }
        CanopyClass::EvergreenForest => 0.1,
        CanopyClass::Other => 0.0,
    }
}

/// Bucket interception component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interception {
    parameters: InterceptionParameters,
}

impl Interception {
    pub fn new() -> Self {
        Self::from_parameters(InterceptionParameters::default())
    }

    pub fn from_parameters(parameters: InterceptionParameters) -> Self {
        Self { parameters }
    }

    pub fn intercepted(&self, precipitation_mm: FloatValue, growing_season: bool) -> FloatValue {
        interception_ratio(self.parameters.canopy, growing_season) * precipitation_mm
    }
}

impl Default for Interception {
    fn default() -> Self {
        Self::new()
    }
}

#[typetag::serde]
impl Component for Interception {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::scalar_input(VAR_PRECIPITATION, "mm / day"),
            RequirementDefinition::scalar_input(VAR_GROWING_SEASON, "dimensionless"),
            RequirementDefinition::scalar_output(VAR_INTERCEPTION, "mm / day"),
        ]
    }

    fn solve(
        &self,
        _t_current: Time,
        _t_next: Time,
        input_state: &InputState,
    ) -> DwbResult<OutputState> {
        let precipitation = input_state.get_latest(VAR_PRECIPITATION);
        let growing_season = input_state.get_latest(VAR_GROWING_SEASON) > 0.5;

        let mut output = HashMap::new();
        output.insert(
            VAR_INTERCEPTION.to_string(),
            self.intercepted(precipitation, growing_season),
        );
        Ok(output)
    }
}
