//! Hydrology components for the dwb daily water-balance model
//!
//! This crate provides the process components of a lumped daily water
//! budget, built on the component and model machinery in `dwb-core`.
//!
//! # Module Organisation
//!
//! Components are organised by domain:
//! - `soil`: the layered soil-moisture balance (the stateful core of the
//!   model)
//! - `surface`: event runoff (curve-number method) and canopy interception
//! - `snow`: snow pack accumulation and degree-day melt
//! - `groundwater`: deep-percolation correction and the groundwater balance
//!
//! # Parameters
//!
//! Each component has an associated parameters struct in the `parameters`
//! module with sensible defaults; constrained parameters validate fail-fast
//! when the component is constructed.

pub mod constants;
pub mod groundwater;
pub mod parameters;
pub mod snow;
pub mod soil;
pub mod surface;
