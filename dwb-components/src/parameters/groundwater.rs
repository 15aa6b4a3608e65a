//! Deep-percolation correction and groundwater balance parameters

use dwb_core::errors::{DwbError, DwbResult};
use dwb_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters splitting profile percolation into recharge and delayed runoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercolationCorrectionParameters {
    /// Geology permeability coefficient; around 0.1 for mountainous terrain
    /// and up to 1.0 for plains
    /// unit: dimensionless, within [0, 1]
    /// default: 0.1
    pub geology_permeability: FloatValue,
}

impl Default for PercolationCorrectionParameters {
    fn default() -> Self {
        Self {
            geology_permeability: 0.1,
        }
    }
}

impl PercolationCorrectionParameters {
    pub fn validate(&self) -> DwbResult<()> {
        if !(0.0..=1.0).contains(&self.geology_permeability) {
            return Err(DwbError::Configuration(format!(
                "geology permeability {} is outside [0, 1]",
                self.geology_permeability
            )));
        }
        Ok(())
    }
}

/// Daily source and sink terms of the groundwater balance other than the
/// recharge computed by the model.
///
/// All terms are depths over the basin area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GroundwaterParameters {
    /// Lateral groundwater inflow
    /// unit: mm / day
    pub lateral_inflow: FloatValue,
    /// Lateral groundwater outflow
    /// unit: mm / day
    pub lateral_outflow: FloatValue,
    /// Return flow from water use back into the aquifer
    /// unit: mm / day
    pub return_flow: FloatValue,
    /// Evaporation directly from groundwater
    /// unit: mm / day
    pub evaporation: FloatValue,
    /// Seepage from free surface water
    /// unit: mm / day
    pub surface_water_seepage: FloatValue,
    /// Recharge through alluvial fans
    /// unit: mm / day
    pub alluvial_recharge: FloatValue,
    /// Artificial recharge projects
    /// unit: mm / day
    pub artificial_recharge: FloatValue,
    /// Leakage from the aquifer to surface water
    /// unit: mm / day
    pub leakage_to_surface: FloatValue,
    /// Withdrawal through springs
    /// unit: mm / day
    pub spring_withdrawal: FloatValue,
    /// Withdrawal through wells
    /// unit: mm / day
    pub well_withdrawal: FloatValue,
    /// Withdrawal through aqueducts
    /// unit: mm / day
    pub aqueduct_withdrawal: FloatValue,
}
