//! Snow pack parameters

use crate::constants::DEGREE_DAY_FACTOR;
use dwb_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for the snow pack component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnowPackParameters {
    /// Degree-day melt factor
    /// unit: mm / (day °C)
    /// default: 1.5
    pub degree_day_factor: FloatValue,
}

impl Default for SnowPackParameters {
    fn default() -> Self {
        Self {
            degree_day_factor: DEGREE_DAY_FACTOR,
        }
    }
}
