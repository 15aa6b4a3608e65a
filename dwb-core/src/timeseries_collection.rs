use crate::timeseries::{FloatValue, Timeseries};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, PartialOrd, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum VariableType {
    /// Values that are defined outside of the model
    Exogenous,
    /// Values that are determined within the model
    Endogenous,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeseriesItem {
    pub timeseries: Timeseries,
    pub name: String,
    pub variable_type: VariableType,
}

/// A collection of time series data.
/// Allows for easy access to time series data by name across the whole model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeseriesCollection {
    items: Vec<TimeseriesItem>,
}

impl TimeseriesCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new timeseries to the collection
    ///
    /// Panics if a timeseries with the same name already exists in the collection
    pub fn add_timeseries(
        &mut self,
        name: String,
        timeseries: Timeseries,
        variable_type: VariableType,
    ) {
        if self.iter().any(|x| x.name == name) {
            panic!("timeseries {} already exists", name)
        }

        self.items.push(TimeseriesItem {
            timeseries,
            name,
            variable_type,
        });
    }

    /// Move all timeseries from `other` into this collection.
    ///
    /// Panics on duplicate names, as with [`TimeseriesCollection::add_timeseries`].
    pub fn extend(&mut self, other: TimeseriesCollection) {
        for item in other {
            self.add_timeseries(item.name, item.timeseries, item.variable_type);
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.iter().any(|x| x.name == name)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&TimeseriesItem> {
        self.items.iter().find(|x| x.name == name)
    }

    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut TimeseriesItem> {
        self.items.iter_mut().find(|x| x.name == name)
    }

    pub fn get_timeseries_by_name(&self, name: &str) -> Option<&Timeseries> {
        self.get_by_name(name).map(|item| &item.timeseries)
    }

    fn get_timeseries_by_name_mut(&mut self, name: &str) -> Option<&mut Timeseries> {
        self.get_by_name_mut(name).map(|item| &mut item.timeseries)
    }

    pub fn set_value(&mut self, name: &str, time_index: usize, value: FloatValue) {
        self.get_timeseries_by_name_mut(name)
            .expect("Timeseries not found")
            .set(time_index, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeseriesItem> {
        self.items.iter()
    }
}

impl IntoIterator for TimeseriesCollection {
    type Item = TimeseriesItem;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
