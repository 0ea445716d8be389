//! Waypoint: navigation as an explicit state machine
//!
//! Instead of matching URLs, an application declares its screens as states
//! and the moves between them as edges. The engine only follows declared
//! edges, asks the target's guards and the registered before-hooks for
//! permission, and records every committed move in a linear history that can
//! be walked back and forth and persisted across reloads.
//!
//! # Core Concepts
//!
//! - **Registry**: the immutable, eagerly validated state graph
//! - **Guards**: predicates on a state that must all pass to enter it
//! - **Hooks**: before-hooks can veto a transition, after-hooks observe it
//! - **History**: cursor-indexed undo/redo over visited states
//! - **Snapshots**: current state and history saved to a key-value store
//!
//! # Example
//!
//! ```rust
//! use waypoint::builder::EngineBuilder;
//! use waypoint::core::{Guard, StateDefinition};
//! use waypoint::engine::{Rejection, Transition};
//! use serde_json::json;
//!
//! let engine = EngineBuilder::new()
//!     .initial("login")
//!     .state(StateDefinition::new("login").to("dashboard"))
//!     .state(
//!         StateDefinition::new("dashboard")
//!             .to("settings")
//!             .guard(Guard::new(|ctx| ctx.payload["user"].is_string())),
//!     )
//!     .state(StateDefinition::new("settings").to("dashboard"))
//!     .build()
//!     .unwrap();
//!
//! let blocked = engine.transition("dashboard").unwrap();
//! assert_eq!(blocked, Transition::Rejected(Rejection::GuardRejected));
//!
//! engine.transition_to("dashboard", json!({"user": "ada"})).unwrap();
//! engine.transition("settings").unwrap();
//! assert_eq!(engine.current_name(), "settings");
//!
//! engine.back().unwrap();
//! assert_eq!(engine.current_name(), "dashboard");
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod engine;

// Re-export commonly used types
pub use builder::EngineBuilder;
pub use checkpoint::{FileStore, MemoryStore, Snapshot, SnapshotStore};
pub use core::{Guard, GuardContext, StateDefinition, StateRegistry};
pub use engine::{EngineError, EngineEvent, Rejection, Transition, TransitionEngine};
