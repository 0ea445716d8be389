//! Transition outcomes and engine errors.

use crate::checkpoint::PersistenceError;
use crate::core::{GuardFailure, UnknownState};

/// Why a legal-looking request did not commit.
///
/// These are ordinary outcomes, not errors: the engine is unchanged and the
/// caller may try something else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The current state has no edge to the target.
    #[error("not allowed")]
    NotAllowed,
    /// A guard on the target state returned false.
    #[error("guard rejected")]
    GuardRejected,
    /// A before-hook refused or failed.
    #[error("vetoed")]
    Vetoed,
}

/// Result of a `transition_to` call that did not error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Committed { from: String, to: String },
    Rejected(Rejection),
}

impl Transition {
    pub fn is_committed(&self) -> bool {
        matches!(self, Transition::Committed { .. })
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Transition::Rejected(reason) => Some(*reason),
            Transition::Committed { .. } => None,
        }
    }
}

/// Errors from engine operations.
///
/// None of these leave a transition half applied. Apart from
/// `StaleSnapshot`, which resets to the initial state, the engine keeps its
/// last committed state.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    UnknownState(#[from] UnknownState),

    #[error(
        "guard #{} faulted on '{}' -> '{}': {}",
        .failure.index, .from, .to, .failure.message
    )]
    Guard {
        from: String,
        to: String,
        failure: GuardFailure,
    },

    #[error("history index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("snapshot references undeclared state '{state}'")]
    StaleSnapshot { state: String },

    #[error("engine re-entered while a call was already in flight")]
    Reentrancy,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl EngineError {
    /// Stable code for logs and host bindings.
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::UnknownState(_) => "UNKNOWN_STATE",
            EngineError::Guard { .. } => "GUARD_ERROR",
            EngineError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            EngineError::StaleSnapshot { .. } => "STALE_SNAPSHOT",
            EngineError::Reentrancy => "REENTRANCY",
            EngineError::Persistence(_) => "PERSISTENCE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn committed_has_no_rejection() {
        let t = Transition::Committed {
            from: "A".to_string(),
            to: "B".to_string(),
        };
        assert!(t.is_committed());
        assert_eq!(t.rejection(), None);
    }

    #[test]
    fn rejected_reports_reason() {
        let t = Transition::Rejected(Rejection::Vetoed);
        assert!(!t.is_committed());
        assert_eq!(t.rejection(), Some(Rejection::Vetoed));
        assert_eq!(Rejection::GuardRejected.to_string(), "guard rejected");
    }

    #[test]
    fn guard_error_message_names_the_edge() {
        let err = EngineError::Guard {
            from: "cart".to_string(),
            to: "checkout".to_string(),
            failure: GuardFailure {
                index: 2,
                name: None,
                message: "timeout".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "guard #2 faulted on 'cart' -> 'checkout': timeout"
        );
        assert_eq!(err.error_code(), "GUARD_ERROR");
    }

    #[test]
    fn unknown_state_is_transparent() {
        let err = EngineError::from(UnknownState {
            name: "ghost".to_string(),
        });
        assert_eq!(err.to_string(), "unknown state 'ghost'");
    }
}
