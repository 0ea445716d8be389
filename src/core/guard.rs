//! Guard predicates for controlling state transitions.
//!
//! Guards are boolean functions that decide whether a state may be entered.
//! They receive a read-only [`GuardContext`] and must not have side effects
//! the caller can observe; the evaluator stops at the first guard that says
//! no, so later guards may never run.

use serde_json::Value;
use std::fmt;

/// Error raised by a guard that could not reach a decision.
pub type GuardFault = Box<dyn std::error::Error>;

type Predicate = Box<dyn Fn(&GuardContext<'_>) -> Result<bool, GuardFault>>;

/// Read-only view of a candidate transition handed to each guard.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    /// The state the engine is currently in.
    pub from: &'a str,
    /// The state the caller wants to enter.
    pub to: &'a str,
    /// Caller-supplied payload for this transition attempt.
    pub payload: &'a Value,
}

/// Predicate that determines if a state can be entered.
///
/// # Example
///
/// ```rust
/// use waypoint::core::{Guard, GuardContext};
/// use serde_json::json;
///
/// let signed_in = Guard::new(|ctx| ctx.payload["user"].is_string());
///
/// let payload = json!({"user": "ada"});
/// let ctx = GuardContext { from: "login", to: "dashboard", payload: &payload };
/// assert!(signed_in.check(&ctx).unwrap());
/// ```
pub struct Guard {
    name: Option<String>,
    predicate: Predicate,
}

impl Guard {
    /// Create a guard from an infallible predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&GuardContext<'_>) -> bool + 'static,
    {
        Guard {
            name: None,
            predicate: Box::new(move |ctx| Ok(predicate(ctx))),
        }
    }

    /// Create a guard whose predicate may fail.
    ///
    /// A fault blocks the transition like a `false` would, but is reported
    /// to the caller as an error instead of a plain rejection.
    pub fn fallible<F>(predicate: F) -> Self
    where
        F: Fn(&GuardContext<'_>) -> Result<bool, GuardFault> + 'static,
    {
        Guard {
            name: None,
            predicate: Box::new(predicate),
        }
    }

    /// Attach a name used in diagnostics.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn check(&self, ctx: &GuardContext<'_>) -> Result<bool, GuardFault> {
        (self.predicate)(ctx)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("name", &self.name).finish()
    }
}

/// A guard faulted while being evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardFailure {
    /// Position of the faulting guard in declaration order.
    pub index: usize,
    pub name: Option<String>,
    pub message: String,
}

/// Runs an ordered set of guards against a context.
pub struct GuardEvaluator;

impl GuardEvaluator {
    /// Evaluate guards in declaration order.
    ///
    /// Returns `Ok(true)` when every guard passes (including when there are
    /// none), `Ok(false)` at the first guard that rejects, and `Err` at the
    /// first guard that faults. Guards after the deciding one are not run.
    pub fn evaluate(guards: &[Guard], ctx: &GuardContext<'_>) -> Result<bool, GuardFailure> {
        for (index, guard) in guards.iter().enumerate() {
            match guard.check(ctx) {
                Ok(true) => continue,
                Ok(false) => return Ok(false),
                Err(fault) => {
                    return Err(GuardFailure {
                        index,
                        name: guard.name.clone(),
                        message: fault.to_string(),
                    })
                }
            }
        }
        Ok(true)
    }
}
