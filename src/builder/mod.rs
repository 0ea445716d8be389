//! Builder API for ergonomic engine construction.
//!
//! This module provides a fluent builder, JSON graph definitions and a
//! macro for declaring graphs with minimal boilerplate. Every path ends in
//! the same eager validation.

pub mod definition;
pub mod machine;
pub mod macros;

pub use definition::{GraphDefinition, StateSpec};
pub use machine::EngineBuilder;

use crate::core::StateDefinition;

/// Create the states of a step-by-step flow, such as a checkout wizard.
///
/// Each step may move to the next one and back to the previous one. The
/// first step is the initial state and the last step has no forward edge.
///
/// # Example
///
/// ```
/// use waypoint::builder::linear_flow;
///
/// let engine = linear_flow(["cart", "shipping", "payment"]).build().unwrap();
///
/// assert!(engine.transition("shipping").unwrap().is_committed());
/// assert!(engine.transition("cart").unwrap().is_committed());
/// assert_eq!(engine.history().entries(), ["cart", "shipping", "cart"]);
/// ```
pub fn linear_flow<I, T>(steps: I) -> EngineBuilder
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let names: Vec<String> = steps.into_iter().map(Into::into).collect();

    let states = names.iter().enumerate().map(|(i, name)| {
        let mut state = StateDefinition::new(name.as_str());
        if let Some(next) = names.get(i + 1) {
            state = state.to(next.as_str());
        }
        if let Some(previous) = i.checked_sub(1).and_then(|p| names.get(p)) {
            state = state.to(previous.as_str());
        }
        state
    });

    let mut builder = EngineBuilder::new().states(states);
    if let Some(first) = names.first() {
        builder = builder.initial(first.as_str());
    }
    builder
}
