//! Physical and unit-conversion constants shared across components.

use dwb_core::timeseries::FloatValue;

/// Millimetres of water per centimetre of soil depth.
pub const MM_PER_CM: FloatValue = 10.0;

/// Divisor converting volumetric percentages to fractions.
pub const PERCENT: FloatValue = 100.0;

/// Default degree-day snowmelt factor.
/// unit: mm / (day °C)
pub const DEGREE_DAY_FACTOR: FloatValue = 1.5;

/// Millimetres per inch, used by the curve-number retention formula.
pub const MM_PER_INCH: FloatValue = 25.4;
