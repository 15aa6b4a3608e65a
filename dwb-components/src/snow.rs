//! Snow pack accumulation and degree-day melt.
//!
//! Precipitation is partitioned into snow or rain from the day's
//! temperature spread; accumulated snow melts at a degree-day rate and
//! leaves the component as `Snowmelt` alongside any same-day rain.

use crate::parameters::SnowPackParameters;
use crate::surface::VAR_PRECIPITATION;
use dwb_core::component::{Component, RequirementDefinition};
use dwb_core::errors::{DwbError, DwbResult};
use dwb_core::state::{InputState, OutputState};
use dwb_core::timeseries::{FloatValue, Time};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const VAR_SNOW_PACK: &str = "Snow Pack";
pub const VAR_SNOWMELT: &str = "Snowmelt";
pub const VAR_RAIN: &str = "Rain";
pub const VAR_TMAX: &str = "Maximum Temperature";
pub const VAR_TMIN: &str = "Minimum Temperature";
pub const VAR_TMEAN: &str = "Mean Temperature";

fn check_temperature_ordering(
    tmax: FloatValue,
    tmin: FloatValue,
    tmean: FloatValue,
) -> DwbResult<()> {
    if tmin > tmean || tmean > tmax {
        return Err(DwbError::Configuration(format!(
            "daily temperatures must satisfy tmin <= tmean <= tmax, got {} / {} / {}",
            tmin, tmean, tmax
        )));
    }
    Ok(())
}

/// Decide whether the day's precipitation falls as snow.
pub fn is_snowfall(tmax: FloatValue, tmin: FloatValue, tmean: FloatValue) -> DwbResult<bool> {
    check_temperature_ordering(tmax, tmin, tmean)?;
    Ok(tmean - (tmax - tmin) / 3.0 <= 0.0)
}

/// Potential melt from the day's maximum temperature.
///
/// Sub-zero maxima produce no melt.
pub fn degree_day_melt(tmax: FloatValue, degree_day_factor: FloatValue) -> FloatValue {
    (degree_day_factor * tmax).max(0.0)
}

/// Evaporation from snow and ice surfaces.
///
/// `u10` is the wind speed 10 m above the snow surface (m/s); `esn` and
/// `e2` are the saturated vapor pressure at the snow surface temperature
/// and the vapor pressure 2 m above it (kPa).
pub fn snow_sublimation(u10: FloatValue, esn: FloatValue, e2: FloatValue) -> FloatValue {
    (0.18 + 0.98 * u10) * (esn - e2)
}

/// Outcome of one snow pack update.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnowStep {
    pub pack_mm: FloatValue,
    pub melt_mm: FloatValue,
    pub rain_mm: FloatValue,
}

/// Snow pack component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnowPack {
    parameters: SnowPackParameters,
}

impl SnowPack {
    pub fn new() -> Self {
        Self::from_parameters(SnowPackParameters::default())
    }

    pub fn from_parameters(parameters: SnowPackParameters) -> Self {
        Self { parameters }
    }

    /// Advance the pack by one day.
    ///
    /// Melt is limited to the water actually held in the pack.
    pub fn solve_pack(
        &self,
        pack_mm: FloatValue,
        precipitation_mm: FloatValue,
        tmax: FloatValue,
        tmin: FloatValue,
        tmean: FloatValue,
    ) -> DwbResult<SnowStep> {
        let (pack_mm, rain_mm) = if is_snowfall(tmax, tmin, tmean)? {
            (pack_mm + precipitation_mm, 0.0)
        } else {
            (pack_mm, precipitation_mm)
        };

        let melt_mm = degree_day_melt(tmax, self.parameters.degree_day_factor).min(pack_mm);

        Ok(SnowStep {
            pack_mm: pack_mm - melt_mm,
            melt_mm,
            rain_mm,
        })
    }
}

impl Default for SnowPack {
    fn default() -> Self {
        Self::new()
    }
}

#[typetag::serde]
impl Component for SnowPack {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::scalar_input(VAR_PRECIPITATION, "mm / day"),
            RequirementDefinition::scalar_input(VAR_TMAX, "degC"),
            RequirementDefinition::scalar_input(VAR_TMIN, "degC"),
            RequirementDefinition::scalar_input(VAR_TMEAN, "degC"),
            RequirementDefinition::scalar_state(VAR_SNOW_PACK, "mm"),
            RequirementDefinition::scalar_output(VAR_SNOWMELT, "mm / day"),
            RequirementDefinition::scalar_output(VAR_RAIN, "mm / day"),
        ]
    }

    fn solve(
        &self,
        _t_current: Time,
        _t_next: Time,
        input_state: &InputState,
    ) -> DwbResult<OutputState> {
        let step = self.solve_pack(
            input_state.get_latest(VAR_SNOW_PACK),
            input_state.get_latest(VAR_PRECIPITATION),
            input_state.get_latest(VAR_TMAX),
            input_state.get_latest(VAR_TMIN),
            input_state.get_latest(VAR_TMEAN),
        )?;

        let mut output = HashMap::new();
        output.insert(VAR_SNOW_PACK.to_string(), step.pack_mm);
        output.insert(VAR_SNOWMELT.to_string(), step.melt_mm);
        output.insert(VAR_RAIN.to_string(), step.rain_mm);
        Ok(output)
    }
}
