#![allow(dead_code)]

//! Minimal components used to exercise the model machinery in tests.

use crate::component::{Component, RequirementDefinition};
use crate::errors::DwbResult;
use crate::state::{InputState, OutputState};
use crate::timeseries::{FloatValue, Time};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for the loss-coefficient test component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LossCoefficientParameters {
    pub loss_coefficient: FloatValue,
}

/// Applies a constant fractional loss to an input series
///
/// This demonstrates the recommended component pattern:
/// keep the calculation in a plain method (`calculate_effective`) and let
/// `solve` handle only the state plumbing.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LossCoefficientComponent {
    pub parameters: LossCoefficientParameters,
    input: String,
    input_unit: String,
    output: String,
}

impl LossCoefficientComponent {
    pub fn from_parameters(parameters: LossCoefficientParameters) -> Self {
        Self {
            parameters,
            input: "Precipitation".to_string(),
            input_unit: "mm / day".to_string(),
            output: "Effective Precipitation".to_string(),
        }
    }

    /// Override the unit declared for the input variable
    pub fn with_input_unit(mut self, unit: &str) -> Self {
        self.input_unit = unit.to_string();
        self
    }

    /// Rewire the component onto different variable names
    pub fn renamed(mut self, input: &str, output: &str) -> Self {
        self.input = input.to_string();
        self.output = output.to_string();
        self
    }

    /// Core calculation - extracted for testability
    pub fn calculate_effective(&self, value: FloatValue) -> FloatValue {
        value * (1.0 - self.parameters.loss_coefficient)
    }
}

#[typetag::serde]
impl Component for LossCoefficientComponent {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::scalar_input(&self.input, &self.input_unit),
            RequirementDefinition::scalar_output(&self.output, "mm / day"),
        ]
    }

    fn solve(
        &self,
        _t_current: Time,
        _t_next: Time,
        input_state: &InputState,
    ) -> DwbResult<OutputState> {
        let value = input_state.get_latest(&self.input);

        let mut output = HashMap::new();
        output.insert(self.output.clone(), self.calculate_effective(value));
        Ok(output)
    }
}
