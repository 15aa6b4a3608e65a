//! Surface runoff and interception parameters

use dwb_core::errors::{DwbError, DwbResult};
use dwb_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for curve-number runoff calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScsRunoffParameters {
    /// Curve number: an index of the land condition as indicated by soils,
    /// cover and land use
    /// unit: dimensionless, within (0, 100]
    /// default: 75.0
    pub curve_number: FloatValue,
    /// Whether the site is a runoff source area; elsewhere no event runoff
    /// forms
    /// default: true
    pub runoff_source_area: bool,
}

impl Default for ScsRunoffParameters {
    fn default() -> Self {
        Self {
            curve_number: 75.0,
            runoff_source_area: true,
        }
    }
}

impl ScsRunoffParameters {
    pub fn validate(&self) -> DwbResult<()> {
        if !(self.curve_number > 0.0 && self.curve_number <= 100.0) {
            return Err(DwbError::Configuration(format!(
                "curve number {} is outside (0, 100]",
                self.curve_number
            )));
        }
        Ok(())
    }
}

/// Canopy class of the basin, determining the interception ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanopyClass {
    ForestMixed,
    EvergreenForest,
    Other,
}

/// Parameters for the bucket interception method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterceptionParameters {
    /// default: Other (no interception)
    pub canopy: CanopyClass,
}

impl Default for InterceptionParameters {
    fn default() -> Self {
        Self {
            canopy: CanopyClass::Other,
        }
    }
}
