//! Linear navigation history.
//!
//! The stack is an ordered list of visited state names plus a cursor. It
//! behaves like single-branch undo/redo: moving the cursor never changes the
//! list, and recording a new visit after stepping back discards every entry
//! after the cursor first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single committed transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The state being transitioned from
    pub from: String,
    /// The state being transitioned to
    pub to: String,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

/// Cursor-indexed record of visited states.
///
/// # Example
///
/// ```rust
/// use waypoint::core::HistoryStack;
///
/// let mut history = HistoryStack::new("a");
/// history.push("a", "b");
/// history.push("b", "c");
/// assert!(history.back());
/// assert_eq!(history.current(), "b");
///
/// history.push("b", "a");
/// assert_eq!(history.entries(), ["a", "b", "a"]);
/// assert_eq!(history.cursor(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct HistoryStack {
    entries: Vec<String>,
    cursor: usize,
    transitions: Vec<TransitionRecord>,
    limit: Option<usize>,
}

impl HistoryStack {
    /// Create a history holding only the initial state.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            cursor: 0,
            transitions: Vec::new(),
            limit: None,
        }
    }

    /// Cap the number of entries kept, and of transition records. Zero is
    /// treated as one.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.map(|l| l.max(1));
        self.enforce_limit();
        self
    }

    /// Rebuild a history from persisted parts.
    ///
    /// Returns `None` when the parts break the stack's invariants: the
    /// sequence must be non-empty and the cursor must point into it.
    pub fn from_parts(entries: Vec<String>, cursor: usize) -> Option<Self> {
        if cursor >= entries.len() {
            return None;
        }
        Some(Self {
            entries,
            cursor,
            transitions: Vec::new(),
            limit: None,
        })
    }

    /// Record a committed transition and make `to` the current entry.
    ///
    /// Entries after the cursor are dropped before appending.
    pub fn push(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let to = to.into();
        self.entries.truncate(self.cursor + 1);
        self.entries.push(to.clone());
        self.cursor = self.entries.len() - 1;
        self.transitions.push(TransitionRecord {
            from: from.into(),
            to,
            timestamp: Utc::now(),
        });
        self.enforce_limit();
    }

    /// Move the cursor one entry earlier. Returns false at the start.
    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Move the cursor one entry later. Returns false at the latest entry.
    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Jump to `index`. Returns `None` if the index is not recorded,
    /// otherwise whether the cursor moved.
    pub fn go_to(&mut self, index: usize) -> Option<bool> {
        if index >= self.entries.len() {
            return None;
        }
        let moved = index != self.cursor;
        self.cursor = index;
        Some(moved)
    }

    pub fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a history holds at least the initial entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Committed transitions in order, including those whose entries were
    /// later discarded by a diverging visit. With a limit, only the most
    /// recent records are kept.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Time from the first to the last committed transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        if self.entries.len() > limit {
            let excess = self.entries.len() - limit;
            self.entries.drain(..excess);
            self.cursor = self.cursor.saturating_sub(excess);
        }
        if self.transitions.len() > limit {
            let excess = self.transitions.len() - limit;
            self.transitions.drain(..excess);
        }
    }
}
