use crate::timeseries::Time;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum DwbError {
    #[error("{0}")]
    Error(String),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("invalid initial state: {0}")]
    StateSeed(String),
    #[error("Extrapolation is not allowed. Target={0}, {1} interpolation range={2}")]
    ExtrapolationNotAllowed(Time, String, Time),
    #[error("no timeseries with variable '{0}'")]
    MissingVariable(String),
    #[error("variable '{0}' is tracked between timesteps but has no initial value")]
    MissingInitialValue(String),
    #[error("Unit mismatch for variable '{variable}': '{existing_unit}' vs '{new_unit}'. All producers and consumers of a variable must use the same unit.")]
    UnitMismatch {
        variable: String,
        existing_unit: String,
        new_unit: String,
    },
    #[error("component graph contains a cycle between different components")]
    CyclicGraph,
}

/// Convenience type for `Result<T, DwbError>`.
pub type DwbResult<T> = Result<T, DwbError>;
