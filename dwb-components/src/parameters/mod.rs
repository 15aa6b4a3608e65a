//! Component parameters
//!
//! This module contains parameter structures for all components.
//! Each parameter struct provides sensible defaults, serde support and,
//! where constraints exist, fail-fast validation.

mod groundwater;
mod snow;
mod soil;
mod surface;

pub use groundwater::{GroundwaterParameters, PercolationCorrectionParameters};
pub use snow::SnowPackParameters;
pub use soil::{LayerSoilProperties, SoilDepthTable, SoilProfileParameters};
pub use surface::{CanopyClass, InterceptionParameters, ScsRunoffParameters};
