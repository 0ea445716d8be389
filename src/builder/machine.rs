//! Builder for constructing transition engines.

use crate::builder::definition::GraphDefinition;
use crate::checkpoint::{Persistence, SnapshotStore};
use crate::core::{GraphError, Guard, StateDefinition, StateRegistry};
use crate::engine::{EngineConfig, TransitionEngine};

/// Builder for constructing engines with a fluent API.
///
/// The graph is validated in [`build`](Self::build); an invalid graph never
/// yields an engine.
#[derive(Default)]
pub struct EngineBuilder {
    initial: Option<String>,
    states: Vec<StateDefinition>,
    guards: Vec<(String, Guard)>,
    config: EngineConfig,
    store: Option<Box<dyn SnapshotStore>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a JSON graph definition.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(Self::from_definition(GraphDefinition::from_json(json)?))
    }

    pub fn from_definition(definition: GraphDefinition) -> Self {
        let initial = definition.initial.clone();
        Self::new()
            .initial(initial)
            .states(definition.into_states())
    }

    /// Set the initial state (required).
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    pub fn state(mut self, state: StateDefinition) -> Self {
        self.states.push(state);
        self
    }

    pub fn states(mut self, states: impl IntoIterator<Item = StateDefinition>) -> Self {
        self.states.extend(states);
        self
    }

    /// Attach a guard to an already declared state by name.
    pub fn guard(mut self, state: impl Into<String>, guard: Guard) -> Self {
        self.guards.push((state.into(), guard));
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Persist snapshots to `store` under the configured key.
    pub fn persist_to(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Validate the graph and build the engine at its initial state.
    pub fn build(self) -> Result<TransitionEngine, GraphError> {
        let initial = self.initial.ok_or(GraphError::NoInitialState)?;

        let mut states = self.states;
        for (name, guard) in self.guards {
            let state = states
                .iter_mut()
                .find(|s| s.name() == name)
                .ok_or_else(|| GraphError::GuardTarget(name.clone()))?;
            state.push_guard(guard);
        }

        let registry = StateRegistry::new(states, initial)?;
        let persistence = self
            .store
            .map(|store| Persistence::boxed(store, self.config.persist_key.clone()));

        Ok(TransitionEngine::new(registry, self.config, persistence))
    }
}
