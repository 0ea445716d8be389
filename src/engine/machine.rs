//! The transition engine.

use crate::checkpoint::{Persistence, PersistenceError, Snapshot};
use crate::core::{
    GraphExport, GuardContext, GuardEvaluator, HistoryStack, StateDefinition, StateRegistry,
};
use crate::engine::config::EngineConfig;
use crate::engine::events::{EngineEvent, StateChange, Subscribers, SubscriptionId};
use crate::engine::hooks::{HookDispatcher, HookFault, HookId, Veto};
use crate::engine::transition::{EngineError, Rejection, Transition};
use chrono::Utc;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Navigation state machine.
///
/// The engine owns a validated [`StateRegistry`], the history stack whose
/// cursor entry is the current state, the hook lists and the subscriber
/// list. Every operation runs to completion synchronously. Callbacks (guards,
/// hooks, subscribers) may read from the engine, but calling a mutating
/// operation from inside one fails with [`EngineError::Reentrancy`].
pub struct TransitionEngine {
    registry: StateRegistry,
    config: EngineConfig,
    history: RefCell<HistoryStack>,
    hooks: RefCell<HookDispatcher>,
    subscribers: RefCell<Subscribers>,
    persistence: Option<Persistence>,
    in_flight: Cell<bool>,
}

/// Clears the in-flight flag when an operation returns, however it returns.
struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl TransitionEngine {
    /// Create an engine at the registry's initial state.
    pub fn new(
        registry: StateRegistry,
        config: EngineConfig,
        persistence: Option<Persistence>,
    ) -> Self {
        let history = HistoryStack::new(registry.initial_name()).with_limit(config.history_limit);
        Self {
            registry,
            config,
            history: RefCell::new(history),
            hooks: RefCell::new(HookDispatcher::new()),
            subscribers: RefCell::new(Subscribers::default()),
            persistence,
            in_flight: Cell::new(false),
        }
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current state. Always a declared state.
    pub fn current_state(&self) -> &StateDefinition {
        let name = self.current_name();
        self.registry
            .get(&name)
            .unwrap_or_else(|_| self.registry.initial())
    }

    pub fn current_name(&self) -> String {
        self.history.borrow().current().to_string()
    }

    /// Allowed targets of the current state, in declaration order.
    pub fn available_transitions(&self) -> Vec<String> {
        self.current_state().allowed_transitions().to_vec()
    }

    pub fn is_terminal(&self) -> bool {
        self.current_state().is_terminal()
    }

    /// A copy of the history stack, transition records included. Use
    /// [`entries`](Self::entries) or [`cursor`](Self::cursor) when the
    /// records are not needed.
    pub fn history(&self) -> HistoryStack {
        self.history.borrow().clone()
    }

    /// Visited state names, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.history.borrow().entries().to_vec()
    }

    pub fn cursor(&self) -> usize {
        self.history.borrow().cursor()
    }

    pub fn export_state_graph(&self) -> GraphExport {
        self.registry.export()
    }

    pub fn snapshot(&self) -> Snapshot {
        let history = self.history.borrow();
        Snapshot {
            current: history.current().to_string(),
            history: history.entries().to_vec(),
            cursor: history.cursor(),
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Move to `target` if the graph, its guards and every before-hook allow
    /// it.
    ///
    /// Fails with [`EngineError::UnknownState`] for undeclared targets and
    /// [`EngineError::Guard`] when a guard faults. An absent edge, a guard
    /// returning false and a before-hook veto are reported as
    /// [`Transition::Rejected`]. Nothing changes unless the result is
    /// [`Transition::Committed`]; after commit, after-hooks run and then
    /// subscribers receive [`EngineEvent::StateChange`] in registration order.
    pub fn transition_to(&self, target: &str, payload: Value) -> Result<Transition, EngineError> {
        let _flight = self.enter()?;

        let state = self.registry.get(target)?;
        let from = self.current_name();

        if !self.registry.has_edge(&from, target) {
            debug!(from = %from, to = target, "transition not allowed");
            return Ok(Transition::Rejected(Rejection::NotAllowed));
        }

        let ctx = GuardContext {
            from: &from,
            to: target,
            payload: &payload,
        };
        match GuardEvaluator::evaluate(state.guards(), &ctx) {
            Ok(true) => {}
            Ok(false) => {
                debug!(from = %from, to = target, "transition rejected by guard");
                return Ok(Transition::Rejected(Rejection::GuardRejected));
            }
            Err(failure) => {
                warn!(from = %from, to = target, guard = failure.index, error = %failure.message, "guard faulted");
                return Err(EngineError::Guard {
                    from,
                    to: target.to_string(),
                    failure,
                });
            }
        }

        let before = self.hooks.borrow().before_hooks();
        if let Some(veto) = HookDispatcher::run_before(&before, &from, target) {
            match &veto {
                Veto::Refused { index } => {
                    debug!(from = %from, to = target, hook = index, "transition vetoed")
                }
                Veto::Faulted { index, message } => {
                    warn!(from = %from, to = target, hook = index, error = %message, "before-hook failed")
                }
            }
            return Ok(Transition::Rejected(Rejection::Vetoed));
        }

        self.history.borrow_mut().push(from.as_str(), target);
        debug!(from = %from, to = target, cursor = self.cursor(), "transition committed");
        self.persist();

        let after = self.hooks.borrow().after_hooks();
        for failure in HookDispatcher::run_after(&after, &from, target) {
            warn!(from = %from, to = target, hook = failure.index, error = %failure.message, "after-hook failed");
            self.emit(&EngineEvent::HookFailed {
                from: from.clone(),
                to: target.to_string(),
                message: failure.message,
            });
        }

        self.emit(&EngineEvent::StateChange(StateChange {
            from: from.clone(),
            to: target.to_string(),
            payload,
            timestamp: Utc::now(),
        }));

        Ok(Transition::Committed {
            from,
            to: target.to_string(),
        })
    }

    /// [`transition_to`](Self::transition_to) with a null payload.
    pub fn transition(&self, target: &str) -> Result<Transition, EngineError> {
        self.transition_to(target, Value::Null)
    }

    /// Whether `transition_to(target, payload)` would pass the graph and
    /// guard checks right now. Before-hooks are not consulted and nothing is
    /// mutated.
    pub fn can_transition_to(&self, target: &str, payload: &Value) -> Result<bool, EngineError> {
        let _flight = self.enter()?;

        let state = self.registry.get(target)?;
        let from = self.current_name();
        if !self.registry.has_edge(&from, target) {
            return Ok(false);
        }

        let ctx = GuardContext {
            from: &from,
            to: target,
            payload,
        };
        GuardEvaluator::evaluate(state.guards(), &ctx).map_err(|failure| EngineError::Guard {
            from: from.clone(),
            to: target.to_string(),
            failure,
        })
    }

    // =========================================================================
    // Time travel
    //
    // back, forward and go_to move the history cursor directly. They do not
    // consult the graph, guards or hooks: they replay states that were
    // already reached, and are not a substitute for `transition_to`.
    // =========================================================================

    /// Step one entry back. Returns false at the oldest entry.
    pub fn back(&self) -> Result<bool, EngineError> {
        self.travel(|history| Ok(history.back()))
    }

    /// Step one entry forward. Returns false at the newest entry.
    pub fn forward(&self) -> Result<bool, EngineError> {
        self.travel(|history| Ok(history.forward()))
    }

    /// Jump to a recorded history index. Returns whether the cursor moved.
    pub fn go_to(&self, index: usize) -> Result<bool, EngineError> {
        self.travel(|history| {
            history.go_to(index).ok_or(EngineError::IndexOutOfRange {
                index,
                len: history.len(),
            })
        })
    }

    fn travel<F>(&self, step: F) -> Result<bool, EngineError>
    where
        F: FnOnce(&mut HistoryStack) -> Result<bool, EngineError>,
    {
        let _flight = self.enter()?;

        let from = self.current_name();
        let moved = step(&mut *self.history.borrow_mut())?;
        if !moved {
            return Ok(false);
        }

        let (to, cursor) = {
            let history = self.history.borrow();
            (history.current().to_string(), history.cursor())
        };
        debug!(from = %from, to = %to, cursor, "time travel");
        if self.config.persist_time_travel {
            self.persist();
        }
        self.emit(&EngineEvent::TimeTravel { from, to, cursor });
        Ok(true)
    }

    /// Return to the initial state with a fresh history.
    pub fn reset(&self) -> Result<(), EngineError> {
        let _flight = self.enter()?;

        let from = self.current_name();
        *self.history.borrow_mut() = self.fresh_history();
        self.persist();
        self.emit(&EngineEvent::Reset {
            from,
            to: self.registry.initial_name().to_string(),
        });
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Save the current snapshot now. Returns false when no store is
    /// configured.
    pub fn save(&self) -> Result<bool, EngineError> {
        match &self.persistence {
            Some(persistence) => {
                persistence.save(&self.snapshot())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Load the stored snapshot, if any, and adopt it.
    ///
    /// Returns `Ok(false)` when no store is configured or nothing has been
    /// saved; the engine keeps its state. A snapshot naming a state this
    /// registry does not declare fails with [`EngineError::StaleSnapshot`]
    /// and leaves the engine at its initial state. A blob that cannot be
    /// decoded, or whose cursor does not fit its history, fails with
    /// [`EngineError::Persistence`] and changes nothing.
    pub fn restore(&self) -> Result<bool, EngineError> {
        let _flight = self.enter()?;

        let Some(persistence) = &self.persistence else {
            return Ok(false);
        };
        let Some(snapshot) = persistence.load()? else {
            debug!(key = persistence.key(), "no snapshot to restore");
            return Ok(false);
        };

        if let Some(missing) = snapshot.state_names().find(|n| !self.registry.contains(n)) {
            warn!(
                key = persistence.key(),
                state = missing,
                "stale snapshot, falling back to initial state"
            );
            let err = EngineError::StaleSnapshot {
                state: missing.to_string(),
            };
            *self.history.borrow_mut() = self.fresh_history();
            self.persist();
            return Err(err);
        }

        let history = HistoryStack::from_parts(snapshot.history.clone(), snapshot.cursor)
            .filter(|history| history.current() == snapshot.current)
            .ok_or_else(|| {
                PersistenceError::DeserializationFailed(format!(
                    "cursor {} does not point at current state '{}'",
                    snapshot.cursor, snapshot.current
                ))
            })?
            .with_limit(self.config.history_limit);

        let cursor = history.cursor();
        *self.history.borrow_mut() = history;
        info!(key = persistence.key(), current = %snapshot.current, cursor, "snapshot restored");

        self.emit(&EngineEvent::Restored {
            current: self.current_name(),
            cursor,
        });
        Ok(true)
    }

    // =========================================================================
    // Hooks and subscribers
    // =========================================================================

    /// Register a hook run before every transition. Returning false vetoes.
    pub fn before_transition<F>(&self, hook: F) -> HookId
    where
        F: Fn(&str, &str) -> bool + 'static,
    {
        self.hooks.borrow_mut().before_transition(hook)
    }

    /// Register a before-hook that may fail. A failure vetoes.
    pub fn try_before_transition<F>(&self, hook: F) -> HookId
    where
        F: Fn(&str, &str) -> Result<bool, HookFault> + 'static,
    {
        self.hooks.borrow_mut().try_before_transition(hook)
    }

    /// Register a hook run after every committed transition.
    pub fn after_transition<F>(&self, hook: F) -> HookId
    where
        F: Fn(&str, &str) + 'static,
    {
        self.hooks.borrow_mut().after_transition(hook)
    }

    /// Register an after-hook that may fail. Failures are reported as
    /// [`EngineEvent::HookFailed`] and never undo the transition.
    pub fn try_after_transition<F>(&self, hook: F) -> HookId
    where
        F: Fn(&str, &str) -> Result<(), HookFault> + 'static,
    {
        self.hooks.borrow_mut().try_after_transition(hook)
    }

    pub fn remove_hook(&self, id: HookId) -> bool {
        self.hooks.borrow_mut().remove(id)
    }

    /// Receive every [`EngineEvent`], in registration order.
    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&EngineEvent) + 'static,
    {
        self.subscribers.borrow_mut().add(Rc::new(subscriber))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.borrow_mut().remove(id)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn enter(&self) -> Result<InFlight<'_>, EngineError> {
        if self.in_flight.replace(true) {
            return Err(EngineError::Reentrancy);
        }
        Ok(InFlight(&self.in_flight))
    }

    fn fresh_history(&self) -> HistoryStack {
        HistoryStack::new(self.registry.initial_name()).with_limit(self.config.history_limit)
    }

    fn emit(&self, event: &EngineEvent) {
        let subscribers = self.subscribers.borrow().snapshot();
        for subscriber in subscribers {
            subscriber(event);
        }
    }

    /// Best effort: the change is already committed, so a failed save is
    /// logged rather than returned.
    fn persist(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if let Err(e) = persistence.save(&self.snapshot()) {
            warn!(key = persistence.key(), error = %e, "failed to persist snapshot");
        }
    }
}
