//! Declared navigation states.
//!
//! A state is identified by its name. It carries the ordered list of states
//! it may transition to, the guards that must pass to enter it, and two
//! opaque payloads the engine only stores and forwards: metadata and a
//! component handle.

use super::guard::Guard;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Opaque reference to an externally owned view or component.
///
/// The engine never inspects the value; consumers recover it with
/// [`ComponentHandle::downcast_ref`].
#[derive(Clone)]
pub struct ComponentHandle(Rc<dyn Any>);

impl ComponentHandle {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComponentHandle(..)")
    }
}

/// A named node in the navigation graph.
///
/// # Example
///
/// ```rust
/// use waypoint::core::{Guard, StateDefinition};
///
/// let checkout = StateDefinition::new("checkout")
///     .to("cart")
///     .to("confirmation")
///     .guard(Guard::new(|ctx| ctx.payload["items"].as_u64().unwrap_or(0) > 0));
///
/// assert_eq!(checkout.name(), "checkout");
/// assert_eq!(checkout.allowed_transitions(), ["cart", "confirmation"]);
/// assert!(checkout.has_guards());
/// ```
pub struct StateDefinition {
    name: String,
    allowed: Vec<String>,
    guards: Vec<Guard>,
    metadata: Option<Value>,
    component: Option<ComponentHandle>,
}

impl StateDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed: Vec::new(),
            guards: Vec::new(),
            metadata: None,
            component: None,
        }
    }

    /// Declare an allowed transition to `target`.
    ///
    /// Repeated targets are ignored so the edge list stays an ordered set.
    pub fn to(mut self, target: impl Into<String>) -> Self {
        let target = target.into();
        if !self.allowed.contains(&target) {
            self.allowed.push(target);
        }
        self
    }

    /// Declare several allowed transitions at once, in order.
    pub fn transitions<I, T>(self, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        targets.into_iter().fold(self, |state, target| state.to(target))
    }

    /// Attach a guard that must pass to enter this state.
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn component(mut self, handle: ComponentHandle) -> Self {
        self.component = Some(handle);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allowed_transitions(&self) -> &[String] {
        &self.allowed
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn has_guards(&self) -> bool {
        !self.guards.is_empty()
    }

    pub fn get_metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    pub fn get_component(&self) -> Option<&ComponentHandle> {
        self.component.as_ref()
    }

    /// A state with no outgoing edges. Valid, just a dead end.
    pub fn is_terminal(&self) -> bool {
        self.allowed.is_empty()
    }

    pub(crate) fn push_guard(&mut self, guard: Guard) {
        self.guards.push(guard);
    }
}

impl fmt::Debug for StateDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDefinition")
            .field("name", &self.name)
            .field("allowed", &self.allowed)
            .field("guards", &self.guards.len())
            .field("metadata", &self.metadata)
            .field("component", &self.component.is_some())
            .finish()
    }
}
