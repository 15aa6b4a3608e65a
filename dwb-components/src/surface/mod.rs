//! Surface processes: event runoff and canopy interception.
//!
//! Both are stateless single-equation evaluators driven by exogenous
//! precipitation; the runoff component produces the infiltration consumed by
//! the soil-moisture balance.

pub mod interception;
pub mod runoff;

pub use interception::Interception;
pub use runoff::ScsRunoff;

// Variable name constants shared by the surface components
pub const VAR_PRECIPITATION: &str = "Precipitation";
pub const VAR_GROWING_SEASON: &str = "Growing Season";
