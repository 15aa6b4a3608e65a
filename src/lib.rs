//! Daily water-balance simulation built from coupled hydrology components.
//!
//! The [`dwb_core`] crate provides the component trait, timeseries types and
//! the model runtime; [`dwb_components`] provides the hydrology processes,
//! with the layered soil-moisture balance at the centre. This crate
//! re-exports both for convenience.

pub use dwb_components as components;
pub use dwb_core as core;

pub mod prelude {
    pub use dwb_components::parameters::*;
    pub use dwb_components::soil::{
        CoverState, FluxBundle, LayerState, SoilLayer, SoilMoisture, StepResult,
    };
    pub use dwb_core::component::Component;
    pub use dwb_core::errors::{DwbError, DwbResult};
    pub use dwb_core::model::{Model, ModelBuilder};
    pub use dwb_core::timeseries::{FloatValue, Time, TimeAxis, Timeseries};
    pub use dwb_core::timeseries_collection::TimeseriesCollection;
}
