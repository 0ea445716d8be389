//! Before and after transition hooks.
//!
//! Before-hooks take part in the authorization decision: any of them can
//! veto a transition by returning `false` or failing. After-hooks only
//! observe a transition that has already been committed; their failures are
//! reported but never undo anything.

use std::collections::BTreeMap;
use std::rc::Rc;

/// Error raised by a hook.
pub type HookFault = Box<dyn std::error::Error>;

pub(crate) type BeforeHook = Rc<dyn Fn(&str, &str) -> Result<bool, HookFault>>;
pub(crate) type AfterHook = Rc<dyn Fn(&str, &str) -> Result<(), HookFault>>;

/// Handle returned when registering a hook, used to remove it again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookId(u64);

/// Why a before-hook stopped a transition.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Veto {
    /// The hook returned `false`.
    Refused { index: usize },
    /// The hook failed.
    Faulted { index: usize, message: String },
}

/// An after-hook failed once the transition was already committed.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AfterHookFailure {
    pub(crate) index: usize,
    pub(crate) message: String,
}

/// Ordered before and after hook lists.
///
/// Hooks run in registration order. Ids grow monotonically, so the ordered
/// maps double as registration-ordered lists with cheap removal.
#[derive(Default)]
pub(crate) struct HookDispatcher {
    before: BTreeMap<HookId, BeforeHook>,
    after: BTreeMap<HookId, AfterHook>,
    next_id: u64,
}

impl HookDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_transition<F>(&mut self, hook: F) -> HookId
    where
        F: Fn(&str, &str) -> bool + 'static,
    {
        self.try_before_transition(move |from, to| Ok(hook(from, to)))
    }

    pub fn try_before_transition<F>(&mut self, hook: F) -> HookId
    where
        F: Fn(&str, &str) -> Result<bool, HookFault> + 'static,
    {
        let id = self.allocate();
        self.before.insert(id, Rc::new(hook));
        id
    }

    pub fn after_transition<F>(&mut self, hook: F) -> HookId
    where
        F: Fn(&str, &str) + 'static,
    {
        self.try_after_transition(move |from, to| {
            hook(from, to);
            Ok(())
        })
    }

    pub fn try_after_transition<F>(&mut self, hook: F) -> HookId
    where
        F: Fn(&str, &str) -> Result<(), HookFault> + 'static,
    {
        let id = self.allocate();
        self.after.insert(id, Rc::new(hook));
        id
    }

    /// Remove a hook. Returns false if it was not registered.
    pub fn remove(&mut self, id: HookId) -> bool {
        self.before.remove(&id).is_some() || self.after.remove(&id).is_some()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    /// Copy of the before-hooks, so they can run without holding a borrow
    /// of the dispatcher.
    pub(crate) fn before_hooks(&self) -> Vec<BeforeHook> {
        self.before.values().cloned().collect()
    }

    pub(crate) fn after_hooks(&self) -> Vec<AfterHook> {
        self.after.values().cloned().collect()
    }

    /// Run before-hooks in order, stopping at the first veto.
    pub(crate) fn run_before(hooks: &[BeforeHook], from: &str, to: &str) -> Option<Veto> {
        for (index, hook) in hooks.iter().enumerate() {
            match hook(from, to) {
                Ok(true) => continue,
                Ok(false) => return Some(Veto::Refused { index }),
                Err(fault) => {
                    return Some(Veto::Faulted {
                        index,
                        message: fault.to_string(),
                    })
                }
            }
        }
        None
    }

    /// Run every after-hook, collecting failures.
    pub(crate) fn run_after(hooks: &[AfterHook], from: &str, to: &str) -> Vec<AfterHookFailure> {
        hooks
            .iter()
            .enumerate()
            .filter_map(|(index, hook)| {
                hook(from, to).err().map(|fault| AfterHookFailure {
                    index,
                    message: fault.to_string(),
                })
            })
            .collect()
    }

    fn allocate(&mut self) -> HookId {
        let id = HookId(self.next_id);
        self.next_id += 1;
        id
    }
}
