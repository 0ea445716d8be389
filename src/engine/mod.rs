//! The transition engine and everything that runs around a transition.
//!
//! # Key Concepts
//!
//! - **Transitions**: `transition_to` checks the graph, the target's guards
//!   and the before-hooks, then commits, runs after-hooks and notifies
//!   subscribers
//! - **Time travel**: `back`, `forward` and `go_to` move the history cursor
//!   without running guards or hooks
//! - **Persistence**: snapshots are saved after every change and loaded by
//!   `restore`
//!
//! Engines are ordinary values. Any number can coexist; none of them share
//! state.

mod config;
mod events;
mod hooks;
mod machine;
mod transition;

pub use config::{EngineConfig, DEFAULT_PERSIST_KEY};
pub use events::{EngineEvent, StateChange, SubscriptionId};
pub use hooks::{HookFault, HookId};
pub use machine::TransitionEngine;
pub use transition::{EngineError, Rejection, Transition};
