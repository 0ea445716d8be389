//! Change notifications delivered to subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// A committed `transition_to`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateChange {
    pub from: String,
    pub to: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

/// Everything an engine reports to its subscribers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    /// A transition passed every check and was committed.
    StateChange(StateChange),

    /// The history cursor moved via back, forward or go-to.
    TimeTravel {
        from: String,
        to: String,
        cursor: usize,
    },

    /// An after-hook failed. The transition stays committed.
    HookFailed {
        from: String,
        to: String,
        message: String,
    },

    /// State and history were loaded from a snapshot.
    Restored { current: String, cursor: usize },

    /// The engine returned to its initial state with a fresh history.
    Reset { from: String, to: String },
}

impl EngineEvent {
    pub fn as_state_change(&self) -> Option<&StateChange> {
        match self {
            EngineEvent::StateChange(change) => Some(change),
            _ => None,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

pub(crate) type Subscriber = Rc<dyn Fn(&EngineEvent)>;

/// Subscriber set with constant-time add and remove. Ids grow
/// monotonically, so sorting by id recovers registration order.
#[derive(Default)]
pub(crate) struct Subscribers {
    entries: HashMap<SubscriptionId, Subscriber>,
    next_id: u64,
}

impl Subscribers {
    pub(crate) fn add(&mut self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, subscriber);
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        self.entries.remove(&id).is_some()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Current subscribers in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Subscriber> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(id, subscriber)| (*id, Rc::clone(subscriber)))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, subscriber)| subscriber).collect()
    }
}
