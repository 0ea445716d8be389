//! Core navigation graph types.
//!
//! This module contains the parts of the engine that hold no mutable
//! shared state:
//! - State definitions and the validated, immutable registry
//! - Guard predicates and their ordered evaluation
//! - The linear history stack

mod error;
mod guard;
mod history;
mod registry;
mod state;

pub use error::{GraphError, GraphIssue, UnknownState};
pub use guard::{Guard, GuardContext, GuardEvaluator, GuardFailure, GuardFault};
pub use history::{HistoryStack, TransitionRecord};
pub use registry::{GraphExport, StateRegistry, StateSummary};
pub use state::{ComponentHandle, StateDefinition};
