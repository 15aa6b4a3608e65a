//! Daily timeseries and the axis they are defined on.
//!
//! A [`TimeAxis`] describes contiguous steps via `n + 1` bounds; a
//! [`Timeseries`] holds one value per step start together with the unit and
//! the interpolation strategy used to read it at arbitrary times.

use crate::errors::DwbResult;
use crate::interpolate::strategies::{InterpolationStrategy, LinearSplineStrategy};
use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Scalar type used for all state and flux values.
pub type FloatValue = f64;

/// Model time in days since the start of the simulation.
///
/// Fractional values are valid query points for interpolation.
pub type Time = f64;

/// A contiguous time axis defined by `n + 1` strictly increasing bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    bounds: Array1<Time>,
}

impl TimeAxis {
    /// Build an axis from the start times of each step.
    ///
    /// The final step is assumed to have the same width as the one before it.
    pub fn from_values(values: Array1<Time>) -> Self {
        assert!(
            values.len() >= 2,
            "a time axis requires at least two step starts"
        );
        let n = values.len();
        let mut bounds = values.to_vec();
        bounds.push(values[n - 1] + (values[n - 1] - values[n - 2]));
        Self::from_bounds(Array1::from_vec(bounds))
    }

    /// Build an axis from explicit step bounds.
    pub fn from_bounds(bounds: Array1<Time>) -> Self {
        assert!(bounds.len() >= 2, "a time axis requires at least one step");
        assert!(
            bounds.windows(2).into_iter().all(|w| w[0] < w[1]),
            "time axis bounds must be strictly increasing"
        );
        Self { bounds }
    }

    /// Number of steps on the axis.
    pub fn len(&self) -> usize {
        self.bounds.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Start times of each step.
    pub fn values(&self) -> Array1<Time> {
        self.bounds.slice(s![..-1]).to_owned()
    }

    /// Start time of step `index`.
    pub fn at(&self, index: usize) -> Option<Time> {
        (index < self.len()).then(|| self.bounds[index])
    }

    /// `(start, end)` bounds of step `index`.
    pub fn at_bounds(&self, index: usize) -> Option<(Time, Time)> {
        (index < self.len()).then(|| (self.bounds[index], self.bounds[index + 1]))
    }
}

/// A named-unit scalar timeseries on a shared [`TimeAxis`].
///
/// Values are stored per step start. Values not yet computed are NaN;
/// [`Timeseries::latest_value`] skips them when reading back model output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeseries {
    values: Array1<FloatValue>,
    time_axis: Arc<TimeAxis>,
    units: String,
    interpolation_strategy: InterpolationStrategy,
}

impl Timeseries {
    pub fn new(
        values: Array1<FloatValue>,
        time_axis: Arc<TimeAxis>,
        units: String,
        interpolation_strategy: InterpolationStrategy,
    ) -> Self {
        assert_eq!(
            values.len(),
            time_axis.len(),
            "one value per time step is required"
        );
        Self {
            values,
            time_axis,
            units,
            interpolation_strategy,
        }
    }

    /// Convenience constructor for tests and exogenous data preparation.
    pub fn from_values(values: Array1<FloatValue>, time: Array1<Time>) -> Self {
        Self::new(
            values,
            Arc::new(TimeAxis::from_values(time)),
            String::new(),
            InterpolationStrategy::from(LinearSplineStrategy::new(false)),
        )
    }

    /// An all-NaN series, used as a placeholder for model-computed output.
    pub fn new_empty(
        time_axis: Arc<TimeAxis>,
        units: String,
        interpolation_strategy: InterpolationStrategy,
    ) -> Self {
        let values = Array1::from_elem(time_axis.len(), FloatValue::NAN);
        Self {
            values,
            time_axis,
            units,
            interpolation_strategy,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Array1<FloatValue> {
        &self.values
    }

    pub fn time_axis(&self) -> &Arc<TimeAxis> {
        &self.time_axis
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn set(&mut self, index: usize, value: FloatValue) {
        self.values[index] = value;
    }

    pub fn at(&self, index: usize) -> Option<FloatValue> {
        self.values.get(index).copied()
    }

    /// Index of the most recent non-NaN value.
    pub fn latest(&self) -> Option<usize> {
        self.values.iter().rposition(|v| !v.is_nan())
    }

    /// Most recent non-NaN value.
    pub fn latest_value(&self) -> Option<FloatValue> {
        self.latest().map(|idx| self.values[idx])
    }

    /// Read the series at an arbitrary time using the interpolation strategy.
    pub fn at_time(&self, time: Time) -> DwbResult<FloatValue> {
        self.interpolation_strategy
            .interpolate(&self.time_axis.values(), &self.values, time)
    }

    /// Resample the series onto a different axis.
    pub fn interpolate_into(&self, time_axis: Arc<TimeAxis>) -> DwbResult<Self> {
        let values = time_axis
            .values()
            .iter()
            .map(|t| self.at_time(*t))
            .collect::<DwbResult<Vec<_>>>()?;
        Ok(Self {
            values: Array1::from_vec(values),
            time_axis,
            units: self.units.clone(),
            interpolation_strategy: self.interpolation_strategy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DwbError;
    use crate::interpolate::strategies::PreviousStrategy;
    use ndarray::{array, Array};

    #[test]
    fn axis_from_values_extends_last_step() {
        let axis = TimeAxis::from_values(array![0.0, 1.0, 2.0]);
        assert_eq!(axis.len(), 3);
        assert_eq!(axis.at_bounds(2), Some((2.0, 3.0)));
        assert_eq!(axis.values(), array![0.0, 1.0, 2.0]);
    }

    #[test]
    #[should_panic]
    fn axis_rejects_unordered_bounds() {
        TimeAxis::from_bounds(array![0.0, 2.0, 1.0]);
    }

    #[test]
    fn latest_value_skips_nan() {
        let axis = Arc::new(TimeAxis::from_values(Array::range(0.0, 4.0, 1.0)));
        let mut ts = Timeseries::new_empty(
            axis,
            "mm".to_string(),
            InterpolationStrategy::from(PreviousStrategy::new(true)),
        );
        assert_eq!(ts.latest_value(), None);

        ts.set(0, 3.0);
        ts.set(1, 5.0);
        assert_eq!(ts.latest(), Some(1));
        assert_eq!(ts.latest_value(), Some(5.0));
    }

    #[test]
    fn interpolate_into_daily_axis() {
        let ts = Timeseries::from_values(array![0.0, 10.0], array![0.0, 10.0]);
        let daily = Arc::new(TimeAxis::from_values(Array::range(0.0, 11.0, 1.0)));

        let resampled = ts.interpolate_into(daily).unwrap();
        assert_eq!(resampled.len(), 11);
        assert_eq!(resampled.at(3), Some(3.0));
    }

    #[test]
    fn interpolate_into_outside_range_fails() {
        let ts = Timeseries::from_values(array![0.0, 10.0], array![5.0, 10.0]);
        let daily = Arc::new(TimeAxis::from_values(Array::range(0.0, 11.0, 1.0)));

        let err = ts.interpolate_into(daily).unwrap_err();
        assert!(matches!(err, DwbError::ExtrapolationNotAllowed(..)));
    }
}
