//! The component abstraction shared by every process in a model.
//!
//! A component declares the variables it consumes and produces via
//! [`Component::definitions`] and is solved one timestep at a time by the
//! model runtime. Variables marked [`RequirementType::State`] are read from
//! the previous timestep and written to the next, which is how stateful
//! processes thread storage through a simulation without any shared mutable
//! state.

use crate::errors::DwbResult;
use crate::state::{InputState, OutputState};
use crate::timeseries::Time;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementType {
    /// Consumed by the component; produced elsewhere (or supplied exogenously)
    Input,
    /// Produced by the component for downstream consumers
    Output,
    /// Read from the previous timestep and written for the next
    State,
    /// Placeholder edge used to keep the component graph connected
    EmptyLink,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequirementDefinition {
    pub name: String,
    pub unit: String,
    pub requirement_type: RequirementType,
}

impl RequirementDefinition {
    pub fn new(name: &str, unit: &str, requirement_type: RequirementType) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            requirement_type,
        }
    }

    pub fn scalar_input(name: &str, unit: &str) -> Self {
        Self::new(name, unit, RequirementType::Input)
    }

    pub fn scalar_output(name: &str, unit: &str) -> Self {
        Self::new(name, unit, RequirementType::Output)
    }

    pub fn scalar_state(name: &str, unit: &str) -> Self {
        Self::new(name, unit, RequirementType::State)
    }
}

/// A process that can be solved as part of a model.
///
/// Implementations are expected to keep the physics in plain methods taking
/// and returning domain types, with `solve` acting only as the adapter
/// between the state plumbing and those methods. This keeps the physics
/// testable without any model scaffolding.
#[typetag::serde]
pub trait Component: Debug + Send + Sync {
    fn definitions(&self) -> Vec<RequirementDefinition>;

    /// Solve the component over `[t_current, t_next)`.
    ///
    /// The returned map holds the value of each output/state variable at
    /// `t_next`.
    fn solve(
        &self,
        t_current: Time,
        t_next: Time,
        input_state: &InputState,
    ) -> DwbResult<OutputState>;

    /// Variables read by the component (inputs and states).
    fn inputs(&self) -> Vec<RequirementDefinition> {
        self.definitions()
            .into_iter()
            .filter(|d| {
                matches!(
                    d.requirement_type,
                    RequirementType::Input | RequirementType::State
                )
            })
            .collect()
    }

    /// Variables written by the component (outputs and states).
    fn outputs(&self) -> Vec<RequirementDefinition> {
        self.definitions()
            .into_iter()
            .filter(|d| {
                matches!(
                    d.requirement_type,
                    RequirementType::Output | RequirementType::State
                )
            })
            .collect()
    }

    fn input_names(&self) -> Vec<String> {
        self.inputs().iter().map(|d| d.name.clone()).collect()
    }
}
