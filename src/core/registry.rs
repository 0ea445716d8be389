//! The immutable state graph.
//!
//! A registry is validated once, when it is built, and never changes
//! afterwards. Validation collects every structural problem instead of
//! stopping at the first, so a broken graph is reported in one pass.

use super::error::{GraphError, GraphIssue, UnknownState};
use super::state::StateDefinition;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<GraphIssue>>;

/// Declared states, their edges, and the initial state.
#[derive(Debug)]
pub struct StateRegistry {
    states: Vec<StateDefinition>,
    index: HashMap<String, usize>,
    initial: String,
}

impl StateRegistry {
    /// Validate and index a set of state definitions.
    ///
    /// Fails with [`GraphError::Invalid`] listing every issue when the
    /// initial state is undeclared, an edge targets an undeclared state, or
    /// a name is empty or declared twice.
    pub fn new(
        states: Vec<StateDefinition>,
        initial: impl Into<String>,
    ) -> Result<Self, GraphError> {
        let initial = initial.into();
        let mut checks: Vec<Check> = Vec::new();

        let mut seen = HashSet::new();
        for state in &states {
            if state.name().is_empty() {
                checks.push(Validation::fail(GraphIssue::EmptyName));
            } else if !seen.insert(state.name()) {
                checks.push(Validation::fail(GraphIssue::DuplicateName {
                    name: state.name().to_string(),
                }));
            }
        }

        if !seen.contains(initial.as_str()) {
            checks.push(Validation::fail(GraphIssue::MissingInitial {
                initial: initial.clone(),
            }));
        }

        for state in &states {
            for target in state.allowed_transitions() {
                if !seen.contains(target.as_str()) {
                    checks.push(Validation::fail(GraphIssue::UnknownTarget {
                        from: state.name().to_string(),
                        to: target.clone(),
                    }));
                }
            }
        }

        if let Validation::Failure(issues) = Validation::all_vec(checks).map(|_| ()) {
            return Err(GraphError::Invalid(issues.iter().cloned().collect()));
        }

        let index = states
            .iter()
            .enumerate()
            .map(|(i, state)| (state.name().to_string(), i))
            .collect();

        Ok(Self {
            states,
            index,
            initial,
        })
    }

    /// Look up a declared state.
    pub fn get(&self, name: &str) -> Result<&StateDefinition, UnknownState> {
        self.index
            .get(name)
            .map(|&i| &self.states[i])
            .ok_or_else(|| UnknownState {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// True iff `to` is in `from`'s allowed transitions. Exact match only.
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.get(from)
            .map(|state| state.allowed_transitions().iter().any(|t| t == to))
            .unwrap_or(false)
    }

    pub fn initial(&self) -> &StateDefinition {
        &self.states[self.index[&self.initial]]
    }

    pub fn initial_name(&self) -> &str {
        &self.initial
    }

    /// States in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &StateDefinition> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Describe the graph without exposing guard closures.
    pub fn export(&self) -> GraphExport {
        GraphExport {
            states: self
                .states
                .iter()
                .map(|state| StateSummary {
                    name: state.name().to_string(),
                    allowed_transitions: state.allowed_transitions().to_vec(),
                    has_guards: state.has_guards(),
                    guard_count: state.guards().len(),
                })
                .collect(),
            initial: self.initial.clone(),
        }
    }
}

/// Read-only description of a state graph, for visualization tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub states: Vec<StateSummary>,
    pub initial: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub name: String,
    pub allowed_transitions: Vec<String>,
    pub has_guards: bool,
    #[serde(default)]
    pub guard_count: usize,
}
