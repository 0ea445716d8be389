//! Graph construction errors.

use thiserror::Error;

/// One problem found while validating a state graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphIssue {
    /// The designated initial state is not declared.
    #[error("initial state '{initial}' is not declared")]
    MissingInitial { initial: String },

    /// An allowed transition points at an undeclared state.
    #[error("state '{from}' allows a transition to undeclared state '{to}'")]
    UnknownTarget { from: String, to: String },

    /// A state was declared with an empty name.
    #[error("state name is empty")]
    EmptyName,

    /// Two states share a name.
    #[error("state '{name}' is declared twice")]
    DuplicateName { name: String },
}

/// Errors that prevent a state graph from becoming a usable engine.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph broke one or more structural rules. Every issue is listed.
    #[error("invalid state graph: {}", join_issues(.0))]
    Invalid(Vec<GraphIssue>),

    /// A JSON graph definition could not be parsed.
    #[error("malformed graph definition: {0}")]
    Malformed(#[from] serde_json::Error),

    /// No initial state was named.
    #[error("initial state not specified")]
    NoInitialState,

    /// A guard was attached by name to a state that does not exist.
    #[error("cannot attach guard to undeclared state '{0}'")]
    GuardTarget(String),
}

impl GraphError {
    /// Issues found during validation; empty for other variants.
    pub fn issues(&self) -> &[GraphIssue] {
        match self {
            GraphError::Invalid(issues) => issues,
            _ => &[],
        }
    }
}

fn join_issues(issues: &[GraphIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A state name that is not declared in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown state '{name}'")]
pub struct UnknownState {
    pub name: String,
}
