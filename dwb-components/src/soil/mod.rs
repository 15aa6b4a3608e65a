//! The layered soil-moisture balance.
//!
//! This is the only stateful engine in the crate: the previous day's
//! storage feeds the next day's update, compartments exchange water through
//! a downward infiltration cascade and upward capillary redistribution, and
//! every storage is clamped between its field capacity and wilting point.
//!
//! - [`balance::SoilMoisture`]: the orchestrator sequencing the per-layer
//!   updates and the component adapter
//! - [`layers`]: the pure per-compartment update rules
//! - [`upward`]: capillary redistribution from saturation gradients
//! - [`bounds`], [`state`]: compartment identity, storage bounds and the
//!   state/flux/result containers

pub mod balance;
pub mod bounds;
pub mod layers;
pub mod state;
pub mod upward;

pub use balance::SoilMoisture;
pub use bounds::{CoverState, LayerBounds, SoilLayer};
pub use state::{FluxBundle, LayerState, StepResult};
pub use upward::UpwardFluxes;
