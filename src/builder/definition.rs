//! JSON graph definitions.
//!
//! Graphs can be written as data:
//!
//! ```json
//! {
//!   "initial": "home",
//!   "states": {
//!     "home":     { "allowedTransitions": ["products", "account"] },
//!     "products": { "allowedTransitions": ["home"], "metadata": { "title": "Shop" } },
//!     "account":  { "allowedTransitions": ["home"], "componentHandle": "AccountView" }
//!   }
//! }
//! ```
//!
//! Guards are code, so they are attached afterwards by state name through
//! [`EngineBuilder::guard`](super::EngineBuilder::guard).

use crate::core::{ComponentHandle, GraphError, GraphExport, StateDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One state as it appears in a JSON definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSpec {
    #[serde(default)]
    pub allowed_transitions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// Opaque to the engine; exposed as a [`ComponentHandle`] wrapping the
    /// JSON value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_handle: Option<Value>,
}

/// A state graph as data. States are keyed by name, so they come out in
/// name order. A name that appears twice in the source is an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    pub initial: String,
    #[serde(deserialize_with = "deserialize_unique_states")]
    pub states: BTreeMap<String, StateSpec>,
}

fn deserialize_unique_states<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, StateSpec>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, MapAccess, Visitor};
    use std::fmt;

    struct UniqueStatesVisitor;

    impl<'de> Visitor<'de> for UniqueStatesVisitor {
        type Value = BTreeMap<String, StateSpec>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of state names to state specs")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut states = BTreeMap::new();
            while let Some((name, spec)) = map.next_entry::<String, StateSpec>()? {
                if states.contains_key(&name) {
                    return Err(de::Error::custom(format!("duplicate state '{name}'")));
                }
                states.insert(name, spec);
            }
            Ok(states)
        }
    }

    deserializer.deserialize_map(UniqueStatesVisitor)
}

impl GraphDefinition {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self, GraphError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Convert into state definitions without guards.
    pub fn into_states(self) -> Vec<StateDefinition> {
        self.states
            .into_iter()
            .map(|(name, spec)| {
                let mut state = StateDefinition::new(name).transitions(spec.allowed_transitions);
                if let Some(metadata) = spec.metadata {
                    state = state.metadata(metadata);
                }
                if let Some(handle) = spec.component_handle {
                    state = state.component(ComponentHandle::new(handle));
                }
                state
            })
            .collect()
    }
}

impl From<&GraphExport> for GraphDefinition {
    /// Rebuild the structural part of a graph from an export. Guards,
    /// metadata and component handles are not part of an export.
    fn from(export: &GraphExport) -> Self {
        Self {
            initial: export.initial.clone(),
            states: export
                .states
                .iter()
                .map(|s| {
                    let spec = StateSpec {
                        allowed_transitions: s.allowed_transitions.clone(),
                        ..StateSpec::default()
                    };
                    (s.name.clone(), spec)
                })
                .collect(),
        }
    }
}
