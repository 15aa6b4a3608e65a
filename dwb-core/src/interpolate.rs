//! Interpolation of timeseries values onto arbitrary query times.
//!
//! Exogenous forcing data is rarely defined on exactly the time axis a model
//! is solved on, so every [`Timeseries`](crate::timeseries::Timeseries)
//! carries a strategy describing how to read it between (or beyond) its
//! defined points.

pub mod strategies {
    use crate::errors::{DwbError, DwbResult};
    use crate::timeseries::{FloatValue, Time};
    use ndarray::Array1;
    use serde::{Deserialize, Serialize};

    /// Piecewise-linear interpolation between defined points.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct LinearSplineStrategy {
        extrapolate: bool,
    }

    impl LinearSplineStrategy {
        pub fn new(extrapolate: bool) -> Self {
            Self { extrapolate }
        }
    }

    /// Step function holding the most recent defined value.
    ///
    /// Appropriate for quantities that are constant across a timestep, such
    /// as daily flux totals or on/off season flags.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct PreviousStrategy {
        extrapolate: bool,
    }

    impl PreviousStrategy {
        pub fn new(extrapolate: bool) -> Self {
            Self { extrapolate }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub enum InterpolationStrategy {
        Linear(LinearSplineStrategy),
        Previous(PreviousStrategy),
    }

    impl From<LinearSplineStrategy> for InterpolationStrategy {
        fn from(strategy: LinearSplineStrategy) -> Self {
            InterpolationStrategy::Linear(strategy)
        }
    }

    impl From<PreviousStrategy> for InterpolationStrategy {
        fn from(strategy: PreviousStrategy) -> Self {
            InterpolationStrategy::Previous(strategy)
        }
    }

    impl InterpolationStrategy {
        fn extrapolate(&self) -> bool {
            match self {
                InterpolationStrategy::Linear(s) => s.extrapolate,
                InterpolationStrategy::Previous(s) => s.extrapolate,
            }
        }

        /// Interpolate `values` (defined at `times`) onto `target`.
        ///
        /// Returns [`DwbError::ExtrapolationNotAllowed`] when `target` lies
        /// outside the defined range and the strategy forbids extrapolation.
        pub fn interpolate(
            &self,
            times: &Array1<Time>,
            values: &Array1<FloatValue>,
            target: Time,
        ) -> DwbResult<FloatValue> {
            assert_eq!(times.len(), values.len());
            assert!(!times.is_empty());

            let first = times[0];
            let last = times[times.len() - 1];

            if target < first {
                return if self.extrapolate() {
                    Ok(values[0])
                } else {
                    Err(DwbError::ExtrapolationNotAllowed(
                        target,
                        "lower".to_string(),
                        first,
                    ))
                };
            }
            if target > last {
                return if self.extrapolate() {
                    Ok(values[values.len() - 1])
                } else {
                    Err(DwbError::ExtrapolationNotAllowed(
                        target,
                        "upper".to_string(),
                        last,
                    ))
                };
            }

            // Index of the last defined time <= target
            let idx = times
                .iter()
                .rposition(|t| *t <= target)
                .expect("target is within the defined range");

            match self {
                InterpolationStrategy::Previous(_) => Ok(values[idx]),
                InterpolationStrategy::Linear(_) => {
                    if idx == times.len() - 1 {
                        return Ok(values[idx]);
                    }
                    let (t0, t1) = (times[idx], times[idx + 1]);
                    let (v0, v1) = (values[idx], values[idx + 1]);
                    Ok(v0 + (v1 - v0) * (target - t0) / (t1 - t0))
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use ndarray::array;

        #[test]
        fn linear_within_range() {
            let strategy = InterpolationStrategy::from(LinearSplineStrategy::new(false));
            let times = array![0.0, 1.0, 2.0];
            let values = array![10.0, 20.0, 40.0];

            assert_eq!(strategy.interpolate(&times, &values, 0.5).unwrap(), 15.0);
            assert_eq!(strategy.interpolate(&times, &values, 1.0).unwrap(), 20.0);
            assert_eq!(strategy.interpolate(&times, &values, 1.5).unwrap(), 30.0);
        }

        #[test]
        fn previous_holds_value() {
            let strategy = InterpolationStrategy::from(PreviousStrategy::new(true));
            let times = array![0.0, 1.0, 2.0];
            let values = array![10.0, 20.0, 40.0];

            assert_eq!(strategy.interpolate(&times, &values, 0.9).unwrap(), 10.0);
            assert_eq!(strategy.interpolate(&times, &values, 1.0).unwrap(), 20.0);
            assert_eq!(strategy.interpolate(&times, &values, 5.0).unwrap(), 40.0);
        }

        #[test]
        fn extrapolation_refused() {
            let strategy = InterpolationStrategy::from(LinearSplineStrategy::new(false));
            let times = array![0.0, 1.0];
            let values = array![10.0, 20.0];

            let err = strategy.interpolate(&times, &values, -1.0).unwrap_err();
            assert!(matches!(err, DwbError::ExtrapolationNotAllowed(..)));
        }
    }
}
