//! A model consists of a series of coupled components which are solved together.
//! The model orchestrates the passing of state between different components.
//! Each component is solved for a given time step in an order determined by their
//! dependencies.
//! Once all components and state are solved for, the model will move to the next time step.
//! The state from previous steps is preserved as it is useful as output or in the case where
//! a component needs previous values.
//!
//! The model also holds all of the exogenous variables required by the model.
//! The required variables are identified when building the model.
//! If a required exogenous variable isn't provided, then the build step will fail.

use crate::component::{Component, RequirementDefinition, RequirementType};
use crate::errors::{DwbError, DwbResult};
use crate::interpolate::strategies::{InterpolationStrategy, LinearSplineStrategy};
use crate::state::{InputState, OutputState};
use crate::timeseries::{FloatValue, Time, TimeAxis, Timeseries};
use crate::timeseries_collection::{TimeseriesCollection, VariableType};
use log::{debug, error};
use ndarray::Array;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::visit::{Bfs, IntoNeighbors, IntoNodeIdentifiers, Visitable};
use petgraph::Graph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::Index;
use std::sync::Arc;

type C = Arc<dyn Component>;
type CGraph = Graph<C, RequirementDefinition>;

/// A null component that does nothing
///
/// Used as an initial component to ensure that the model is connected
#[derive(Debug, Serialize, Deserialize)]
struct NullComponent {}

#[typetag::serde]
impl Component for NullComponent {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![]
    }

    fn solve(
        &self,
        _t_current: Time,
        _t_next: Time,
        _input_state: &InputState,
    ) -> DwbResult<OutputState> {
        Ok(OutputState::new())
    }
}

/// Extract the input state for the current time step
///
/// For endogenous variables which are calculated as part of the model
/// the most recent value is used, whereas exogenous variables are
/// interpolated at the current time.
/// This ensures that state calculated from previous components within the same timestep
/// is used.
pub fn extract_state(
    collection: &TimeseriesCollection,
    input_names: Vec<String>,
    t_current: Time,
) -> InputState<'_> {
    let mut state = Vec::new();

    input_names.into_iter().for_each(|name| {
        let ts = collection
            .get_by_name(name.as_str())
            .unwrap_or_else(|| panic!("No timeseries with variable='{}'", name));
        state.push(ts);
    });

    InputState::build(state, t_current)
}

/// Check whether a component graph contains a cycle
///
/// We require a directed acyclic graph (other than self-referential nodes,
/// which represent a component reading its own previous-step state).
/// This avoids the case where component `A` depends on a component `B`,
/// but component `B` also depends on component `A`.
fn has_cycle<G>(g: G) -> bool
where
    G: IntoNodeIdentifiers + IntoNeighbors + Visitable,
{
    use petgraph::visit::{depth_first_search, DfsEvent};

    depth_first_search(g, g.node_identifiers(), |event| match event {
        DfsEvent::BackEdge(a, b) => {
            // A self-referential cycle is fine
            match a == b {
                true => Ok(()),
                false => Err(()),
            }
        }
        _ => Ok(()),
    })
    .is_err()
}

fn component_name(component: &C) -> String {
    // Derive a display name from the Debug implementation
    let name = format!("{:?}", component);
    name.split(['{', ' ', '('])
        .next()
        .unwrap_or("UnknownComponent")
        .to_string()
}

/// Build a new model from a set of components
///
/// The builder generates a graph that defines the inter-component dependencies
/// and determines what variables are endogenous and exogenous to the model.
/// This graph is used by the model to define the order in which components are solved.
///
/// Components should be registered in flow order (producers before
/// consumers); a consumer registered first reads the previous timestep's
/// value of the shared variable instead.
pub struct ModelBuilder {
    components: Vec<C>,
    exogenous_variables: TimeseriesCollection,
    initial_values: HashMap<String, FloatValue>,
    pub time_axis: Arc<TimeAxis>,
}

/// Checks that a definition is consistent with any existing definition
///
/// If any definitions share a name then the units must be equivalent.
fn verify_definition(
    definitions: &mut HashMap<String, String>,
    definition: &RequirementDefinition,
) -> DwbResult<()> {
    match definitions.get(&definition.name) {
        Some(existing_unit) => {
            if *existing_unit != definition.unit {
                return Err(DwbError::UnitMismatch {
                    variable: definition.name.clone(),
                    existing_unit: existing_unit.clone(),
                    new_unit: definition.unit.clone(),
                });
            }
        }
        None => {
            definitions.insert(definition.name.clone(), definition.unit.clone());
        }
    }
    Ok(())
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self {
            components: vec![],
            initial_values: HashMap::new(),
            exogenous_variables: TimeseriesCollection::new(),
            time_axis: Arc::new(TimeAxis::from_values(Array::range(0.0, 365.0, 1.0))),
        }
    }

    /// Register a component with the builder
    pub fn with_component(&mut self, component: Arc<dyn Component + Send + Sync>) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Supply exogenous data to be used by the model
    ///
    /// Any unneeded timeseries will be ignored.
    pub fn with_exogenous_variable(&mut self, name: &str, timeseries: Timeseries) -> &mut Self {
        self.exogenous_variables.add_timeseries(
            name.to_string(),
            timeseries,
            VariableType::Exogenous,
        );
        self
    }

    /// Supply exogenous data to be used by the model
    ///
    /// Any unneeded timeseries will be ignored.
    pub fn with_exogenous_collection(&mut self, collection: TimeseriesCollection) -> &mut Self {
        self.exogenous_variables.extend(collection);
        self
    }

    /// Adds some state to the set of initial values
    ///
    /// These initial values provide values at `t_0` for variables with a
    /// requirement type of [`RequirementType::State`].
    /// State variables read their value from the previous timestep in order
    /// to generate a new value for the next timestep, so building a model
    /// with a state variable that has no initial value and no producer is an
    /// error.
    pub fn with_initial_values(
        &mut self,
        initial_values: HashMap<String, FloatValue>,
    ) -> &mut Self {
        for (name, value) in initial_values.into_iter() {
            self.initial_values.insert(name, value);
        }
        self
    }

    /// Specify the time axis that will be used by the model
    ///
    /// This time axis defines the time steps (including bounds) on which the model will be iterated.
    pub fn with_time_axis(&mut self, time_axis: TimeAxis) -> &mut Self {
        self.time_axis = Arc::new(time_axis);
        self
    }

    /// Builds the component graph for the registered components and creates a concrete model
    ///
    /// Returns an error if the component definitions are inconsistent or if
    /// required exogenous data/initial values are missing.
    pub fn build(&self) -> DwbResult<Model> {
        let mut graph: CGraph = Graph::new();
        let mut endogenous: HashMap<String, NodeIndex> = HashMap::new();
        let mut exogenous: Vec<String> = vec![];
        let mut state_variables: HashSet<String> = HashSet::new();
        let mut definitions: HashMap<String, String> = HashMap::new();
        let initial_node = graph.add_node(Arc::new(NullComponent {}));

        for component in &self.components {
            let node = graph.add_node(component.clone());
            let mut has_dependencies = false;

            for requirement in component.inputs() {
                verify_definition(&mut definitions, &requirement)?;
                if requirement.requirement_type == RequirementType::State {
                    state_variables.insert(requirement.name.clone());
                }

                match endogenous.get(&requirement.name) {
                    Some(provider) => {
                        // Link to the node that provides the requirement
                        graph.add_edge(*provider, node, requirement.clone());
                        has_dependencies = true;
                    }
                    None => {
                        if !exogenous.contains(&requirement.name) {
                            // A variable that must be defined outside of the model
                            exogenous.push(requirement.name.clone());
                        }
                    }
                }
            }

            if !has_dependencies {
                // If the node has no dependencies on other components,
                // create a link to the initial node.
                // This ensures that we have a single connected graph.
                graph.add_edge(
                    initial_node,
                    node,
                    RequirementDefinition::new("", "", RequirementType::EmptyLink),
                );
            }

            for requirement in component.outputs() {
                verify_definition(&mut definitions, &requirement)?;
                if requirement.requirement_type == RequirementType::State {
                    state_variables.insert(requirement.name.clone());
                }

                match endogenous.get(&requirement.name) {
                    None => {
                        endogenous.insert(requirement.name.clone(), node);
                    }
                    Some(node_index) => {
                        graph.add_edge(*node_index, node, requirement.clone());
                        endogenous.insert(requirement.name.clone(), node);
                    }
                }
            }
        }

        // Check that the component graph doesn't contain any loops
        if has_cycle(&graph) {
            return Err(DwbError::CyclicGraph);
        }

        // Create the timeseries collection using the information from the components
        let mut collection = TimeseriesCollection::new();
        for (name, unit) in definitions {
            if endogenous.contains_key(&name) {
                // A placeholder for data that will be generated by the model.
                // State variables additionally receive their initial value at `t_0`.
                let mut ts = Timeseries::new_empty(
                    self.time_axis.clone(),
                    unit,
                    InterpolationStrategy::from(LinearSplineStrategy::new(true)),
                );
                if let Some(initial) = self.initial_values.get(&name) {
                    ts.set(0, *initial);
                } else if state_variables.contains(&name) {
                    return Err(DwbError::MissingInitialValue(name));
                }
                collection.add_timeseries(name, ts, VariableType::Endogenous);
            } else if let Some(initial) = self.initial_values.get(&name) {
                // A state variable without a producing component other than
                // itself; all but the first time point come from the model.
                let mut ts = Timeseries::new_empty(
                    self.time_axis.clone(),
                    unit,
                    InterpolationStrategy::from(LinearSplineStrategy::new(true)),
                );
                ts.set(0, *initial);
                collection.add_timeseries(name, ts, VariableType::Endogenous);
            } else if state_variables.contains(&name) {
                return Err(DwbError::MissingInitialValue(name));
            } else {
                // Exogenous variable: interpolate the supplied data onto the
                // model time axis
                let timeseries = self
                    .exogenous_variables
                    .get_timeseries_by_name(&name)
                    .ok_or_else(|| DwbError::MissingVariable(name.clone()))?;
                collection.add_timeseries(
                    name,
                    timeseries.interpolate_into(self.time_axis.clone())?,
                    VariableType::Exogenous,
                );
            }
        }

        Ok(Model::new(
            graph,
            initial_node,
            collection,
            self.time_axis.clone(),
        ))
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A coupled set of components that are solved on a common time axis.
///
/// These components are solved over time steps defined by the [`TimeAxis`].
/// Components may pass state between themselves.
/// Each component may require information from other components to be solved (endogenous) or
/// predefined data (exogenous).
///
/// For example, a component calculating surface runoff may require
/// precipitation as input state and provide infiltration.
/// The component is agnostic about where/how that state is defined.
/// If the model has no components which provide precipitation,
/// then a precipitation timeseries must be defined externally.
/// If the model contains a component which produces infiltration,
/// then any component consuming infiltration is solved after it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Model {
    /// A directed graph with components as nodes and the edges defining the state dependencies
    /// between nodes.
    /// This graph is traversed on every time step to ensure that any state dependencies are
    /// solved before another component needs the state.
    components: CGraph,
    /// The base node of the graph from where to begin traversing.
    initial_node: NodeIndex,
    /// The model state
    ///
    /// Variable names within the model are unique and these variable names are used by
    /// components to request state.
    collection: TimeseriesCollection,
    time_axis: Arc<TimeAxis>,
    time_index: usize,
}

impl Model {
    pub fn new(
        components: CGraph,
        initial_node: NodeIndex,
        collection: TimeseriesCollection,
        time_axis: Arc<TimeAxis>,
    ) -> Self {
        Self {
            components,
            initial_node,
            collection,
            time_axis,
            time_index: 0,
        }
    }

    /// Gets the time value at the current step
    pub fn current_time(&self) -> Time {
        self.time_axis.at(self.time_index).unwrap()
    }

    pub fn current_time_bounds(&self) -> (Time, Time) {
        self.time_axis.at_bounds(self.time_index).unwrap()
    }

    /// Solve a single component for the current timestep
    ///
    /// The updated state from the component is then pushed into the model's timeseries collection
    /// to be later used by other components.
    /// The output state defines the values at the next time index as it represents the state
    /// at the start of the next timestep.
    fn step_model_component(&mut self, component: C) {
        let input_state = extract_state(
            &self.collection,
            component.input_names(),
            self.current_time(),
        );

        let (start, end) = self.current_time_bounds();
        debug!("solving {} for t={}", component_name(&component), start);

        match component.solve(start, end, &input_state) {
            Ok(output_state) => {
                for (key, value) in output_state.iter() {
                    // The next time index is used as this output state represents the value of a
                    // variable at the end of the current time step.
                    // This is the same as the start of the next timestep.
                    self.collection.set_value(key, self.time_index + 1, *value);
                }
            }
            Err(err) => {
                error!("solving {} failed: {}", component_name(&component), err)
            }
        }
    }

    /// Step the model forward a step by solving each component for the current time step.
    ///
    /// A breadth-first search across the component graph starting at the initial node
    /// will solve the components in a way that ensures any models with dependencies are solved
    /// after the dependent component is first solved.
    fn step_model(&mut self) {
        let mut bfs = Bfs::new(&self.components, self.initial_node);
        while let Some(nx) = bfs.next(&self.components) {
            let c = self.components.index(nx);
            self.step_model_component(c.clone())
        }
    }

    /// Steps the model forward one time step
    ///
    /// This solves the current time step and then updates the index.
    pub fn step(&mut self) {
        assert!(self.time_index < self.time_axis.len() - 1);
        self.step_model();

        self.time_index += 1;
    }

    /// Steps the model until the end of the time axis
    pub fn run(&mut self) {
        while self.time_index < self.time_axis.len() - 1 {
            self.step();
        }
    }

    /// Create a diagram that represents the component graph
    ///
    /// Useful for debugging
    pub fn as_dot(&self) -> Dot<'_, &CGraph> {
        Dot::with_attr_getters(
            &self.components,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &|_, er| format!("label = {:?}", er.weight().name),
            &|_, (_, component)| format!("label = \"{:?}\"", component),
        )
    }

    /// Returns true if the model has no more time steps to process
    pub fn finished(&self) -> bool {
        self.time_index == self.time_axis.len() - 1
    }

    pub fn time_index(&self) -> usize {
        self.time_index
    }

    pub fn timeseries(&self) -> &TimeseriesCollection {
        &self.collection
    }

    /// Consume the model and return the collected timeseries
    pub fn into_timeseries(self) -> TimeseriesCollection {
        self.collection
    }
}
