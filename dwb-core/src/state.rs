use crate::timeseries::{FloatValue, Time};
use crate::timeseries_collection::{TimeseriesItem, VariableType};
use num::Float;
use std::collections::HashMap;

/// Input state for a component
///
/// A state is a collection of values
/// that can be used to represent the state of a system at a given time.
///
/// This is very similar to a Hashmap (with likely worse performance),
/// but provides strong type separation.
#[derive(Debug, Clone)]
pub struct InputState<'a> {
    current_time: Time,
    state: Vec<&'a TimeseriesItem>,
}

impl<'a> InputState<'a> {
    pub fn build(values: Vec<&'a TimeseriesItem>, current_time: Time) -> Self {
        Self {
            current_time,
            state: values,
        }
    }

    pub fn empty() -> Self {
        Self {
            current_time: Time::nan(),
            state: vec![],
        }
    }

    /// Get the latest value for a variable
    ///
    /// Exogenous variables are interpolated at the current time; endogenous
    /// variables use the most recently computed value so that state written
    /// earlier in the same timestep is visible to downstream components.
    ///
    /// # Panics
    /// Panics if the variable is not found in the state.
    pub fn get_latest(&self, name: &str) -> FloatValue {
        let item = self
            .iter()
            .find(|item| item.name == name)
            .expect("No item found");

        match item.variable_type {
            VariableType::Exogenous => item.timeseries.at_time(self.current_time).unwrap(),
            VariableType::Endogenous => item.timeseries.latest_value().unwrap(),
        }
    }

    /// Test if the state contains a value with the given name
    pub fn has(&self, name: &str) -> bool {
        self.state.iter().any(|x| x.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &&TimeseriesItem> {
        self.state.iter()
    }

    /// Converts the state into an equivalent hashmap
    pub fn to_hashmap(self) -> HashMap<String, FloatValue> {
        HashMap::from_iter(
            self.state
                .into_iter()
                .map(|item| (item.name.clone(), item.timeseries.latest_value().unwrap())),
        )
    }
}

impl<'a> IntoIterator for InputState<'a> {
    type Item = &'a TimeseriesItem;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.state.into_iter()
    }
}

/// Output state from a component
///
/// Holds the scalar value of each output/state variable at the end of the
/// timestep being solved.
pub type OutputState = HashMap<String, FloatValue>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::Timeseries;
    use ndarray::array;

    #[test]
    fn get_latest_endogenous_uses_latest_value() {
        let ts = Timeseries::from_values(array![280.0, 285.0], array![0.0, 1.0]);
        let item = TimeseriesItem {
            timeseries: ts,
            name: "Soil Moisture|Transition Layer".to_string(),
            variable_type: VariableType::Endogenous,
        };

        let state = InputState::build(vec![&item], 0.5);
        assert_eq!(state.get_latest("Soil Moisture|Transition Layer"), 285.0);
    }

    #[test]
    fn get_latest_exogenous_interpolates() {
        let ts = Timeseries::from_values(array![0.0, 10.0], array![0.0, 1.0]);
        let item = TimeseriesItem {
            timeseries: ts,
            name: "Precipitation".to_string(),
            variable_type: VariableType::Exogenous,
        };

        let state = InputState::build(vec![&item], 0.5);
        assert_eq!(state.get_latest("Precipitation"), 5.0);
        assert!(state.has("Precipitation"));
        assert!(!state.has("Runoff"));
    }
}
