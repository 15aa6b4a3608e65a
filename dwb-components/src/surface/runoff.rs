//! Event runoff from the curve-number method.
//!
//! The curve number is first adjusted for the antecedent moisture condition
//! from the previous five days' precipitation (with different wet/dry
//! thresholds inside and outside the growing season), then converted to a
//! potential retention `S = (1000 / CN - 10) * 25.4`. On runoff source
//! areas the event runoff is `(P - 0.2 S)^2 / (P + 0.8 S)`; the remainder
//! of the precipitation infiltrates.

use crate::constants::MM_PER_INCH;
use crate::parameters::ScsRunoffParameters;
use crate::soil::balance::VAR_INFILTRATION;
use crate::surface::{VAR_GROWING_SEASON, VAR_PRECIPITATION};
use dwb_core::component::{Component, RequirementDefinition};
use dwb_core::errors::DwbResult;
use dwb_core::state::{InputState, OutputState};
use dwb_core::timeseries::{FloatValue, Time};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const VAR_RUNOFF: &str = "Runoff";
pub const VAR_ANTECEDENT_PRECIPITATION: &str = "Antecedent Precipitation";

// Antecedent-moisture thresholds, growing and dormant season
// unit: mm over the previous five days
const AMC_DRY_GROWING: FloatValue = 12.7;
const AMC_WET_GROWING: FloatValue = 27.9;
const AMC_DRY_DORMANT: FloatValue = 35.6;
const AMC_WET_DORMANT: FloatValue = 53.3;

/// Runoff and infiltration depths for one precipitation event.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunoffSplit {
    pub runoff_mm: FloatValue,
    pub infiltration_mm: FloatValue,
}

/// Adjust a curve number for the antecedent moisture condition.
///
/// A dry preceding spell lowers the curve number (AMC I), a wet one raises
/// it (AMC III); in between the tabulated value applies unchanged.
pub fn adjusted_curve_number(
    curve_number: FloatValue,
    antecedent_precipitation_mm: FloatValue,
    growing_season: bool,
) -> FloatValue {
    let (dry, wet) = if growing_season {
        (AMC_DRY_GROWING, AMC_WET_GROWING)
    } else {
        (AMC_DRY_DORMANT, AMC_WET_DORMANT)
    };

    if antecedent_precipitation_mm < dry {
        4.2 * curve_number / (10.0 - 0.058 * curve_number)
    } else if antecedent_precipitation_mm > wet {
        23.0 * curve_number / (10.0 + 0.13 * curve_number)
    } else {
        curve_number
    }
}

/// Maximum depth of storm rainfall a site can potentially abstract.
pub fn potential_retention(curve_number: FloatValue) -> FloatValue {
    (1000.0 / curve_number - 10.0) * MM_PER_INCH
}

/// Curve-number runoff component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScsRunoff {
    parameters: ScsRunoffParameters,
}

impl ScsRunoff {
    pub fn new() -> Self {
        Self {
            parameters: ScsRunoffParameters::default(),
        }
    }

    /// Create a runoff component, failing fast on an invalid curve number.
    pub fn from_parameters(parameters: ScsRunoffParameters) -> DwbResult<Self> {
        parameters.validate()?;
        Ok(Self { parameters })
    }

    /// Split a day's precipitation into event runoff and infiltration.
    ///
    /// The antecedent adjustment only applies when any precipitation fell in
    /// the preceding five days. Off runoff source areas no event runoff
    /// forms and nothing infiltrates through this pathway.
    pub fn split(
        &self,
        precipitation_mm: FloatValue,
        antecedent_precipitation_mm: FloatValue,
        growing_season: bool,
    ) -> RunoffSplit {
        let curve_number = if antecedent_precipitation_mm > 0.0 {
            adjusted_curve_number(
                self.parameters.curve_number,
                antecedent_precipitation_mm,
                growing_season,
            )
        } else {
            self.parameters.curve_number
        };

        let runoff_mm = if self.parameters.runoff_source_area {
            let retention = potential_retention(curve_number);
            let initial_abstraction = 0.2 * retention;
            if precipitation_mm <= initial_abstraction {
                // The event never exceeds the initial abstraction
                0.0
            } else {
                (precipitation_mm - initial_abstraction).powi(2)
                    / (precipitation_mm + 0.8 * retention)
            }
        } else {
            0.0
        };

        let infiltration_mm = if runoff_mm > 0.0 {
            (precipitation_mm - runoff_mm).max(0.0)
        } else {
            0.0
        };

        RunoffSplit {
            runoff_mm,
            infiltration_mm,
        }
    }
}

impl Default for ScsRunoff {
    fn default() -> Self {
        Self::new()
    }
}

#[typetag::serde]
impl Component for ScsRunoff {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::scalar_input(VAR_PRECIPITATION, "mm / day"),
            RequirementDefinition::scalar_input(VAR_ANTECEDENT_PRECIPITATION, "mm"),
            RequirementDefinition::scalar_input(VAR_GROWING_SEASON, "dimensionless"),
            RequirementDefinition::scalar_output(VAR_RUNOFF, "mm / day"),
            RequirementDefinition::scalar_output(VAR_INFILTRATION, "mm / day"),
        ]
    }

    fn solve(
        &self,
        _t_current: Time,
        _t_next: Time,
        input_state: &InputState,
    ) -> DwbResult<OutputState> {
        let precipitation = input_state.get_latest(VAR_PRECIPITATION);
        let antecedent = input_state.get_latest(VAR_ANTECEDENT_PRECIPITATION);
        let growing_season = input_state.get_latest(VAR_GROWING_SEASON) > 0.5;

        let split = self.split(precipitation, antecedent, growing_season);

        let mut output = HashMap::new();
        output.insert(VAR_RUNOFF.to_string(), split.runoff_mm);
        output.insert(VAR_INFILTRATION.to_string(), split.infiltration_mm);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn retention_follows_curve_number() {
        // CN 100 retains nothing; lower curve numbers retain more
        assert_eq!(potential_retention(100.0), 0.0);
        assert_relative_eq!(
            potential_retention(75.0),
            (1000.0 / 75.0 - 10.0) * 25.4,
            epsilon = 1e-12
        );
        assert!(potential_retention(60.0) > potential_retention(80.0));
    }

    #[test]
    fn dry_antecedent_lowers_and_wet_raises_the_curve_number() {
        let cn = 75.0;
        let dry = adjusted_curve_number(cn, 5.0, true);
        let wet = adjusted_curve_number(cn, 40.0, true);
        let mid = adjusted_curve_number(cn, 20.0, true);

        assert!(dry < cn);
        assert_eq!(mid, cn);
        assert!(wet > cn);
    }

    #[test]
    fn dormant_season_uses_wider_thresholds() {
        let cn = 75.0;
        // 40 mm over 5 days is wet in the growing season but dry outside it
        assert!(adjusted_curve_number(cn, 40.0, true) > cn);
        assert!(adjusted_curve_number(cn, 30.0, false) < cn);
    }

    #[test]
    fn runoff_plus_infiltration_never_exceeds_precipitation() {
        let component = ScsRunoff::from_parameters(ScsRunoffParameters {
            curve_number: 80.0,
            runoff_source_area: true,
        })
        .unwrap();

        for precipitation in [5.0, 20.0, 60.0, 120.0] {
            let split = component.split(precipitation, 0.0, true);
            assert!(split.runoff_mm >= 0.0);
            assert!(split.infiltration_mm >= 0.0);
            assert!(split.runoff_mm + split.infiltration_mm <= precipitation + 1e-9);
        }
    }

    #[test]
    fn no_runoff_below_the_initial_abstraction() {
        let component = ScsRunoff::new();
        // CN 75 retains 84.7 mm; small events stay below 0.2 * S
        let split = component.split(10.0, 0.0, true);
        assert_eq!(split.runoff_mm, 0.0);
        assert_eq!(split.infiltration_mm, 0.0);
    }

    #[test]
    fn no_event_runoff_off_source_areas() {
        let component = ScsRunoff::from_parameters(ScsRunoffParameters {
            curve_number: 80.0,
            runoff_source_area: false,
        })
        .unwrap();

        let split = component.split(50.0, 0.0, true);
        assert_eq!(split.runoff_mm, 0.0);
        assert_eq!(split.infiltration_mm, 0.0);
    }

    #[test]
    fn invalid_curve_number_is_rejected() {
        assert!(ScsRunoff::from_parameters(ScsRunoffParameters {
            curve_number: 0.0,
            runoff_source_area: true,
        })
        .is_err());
        assert!(ScsRunoff::from_parameters(ScsRunoffParameters {
            curve_number: 130.0,
            runoff_source_area: true,
        })
        .is_err());
    }
}
