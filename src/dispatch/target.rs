//! Interaction targets and their handler tables
//!
//! A target is anything the host lets the pointer hit or registers as a global
//! receiver. It exposes the subset of capabilities it cares about, either as
//! per-capability closures or through [`EventHandler`] delegates.

use super::capability::Capability;
use super::event_data::InteractionEventData;
use crate::input::ModuleId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, trace};

pub type TargetHandle = Arc<Interactable>;

pub type Callback = Box<dyn FnMut(&InteractionEventData) + Send>;

/// Capability-based handler
///
/// Implementors return `true` when they handled the capability.
pub trait EventHandler: Send {
    fn on_event(&mut self, capability: Capability, data: &InteractionEventData) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

impl TargetId {
    fn next() -> Self {
        Self(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

#[derive(Default)]
pub struct HandlerTable {
    callbacks: HashMap<Capability, Vec<Callback>>,
    delegates: Vec<Box<dyn EventHandler>>,
}

impl HandlerTable {
    fn invoke(&mut self, capability: Capability, data: &InteractionEventData) -> bool {
        let mut handled = false;
        if let Some(callbacks) = self.callbacks.get_mut(&capability) {
            for callback in callbacks.iter_mut() {
                callback(data);
                handled = true;
            }
        }
        for delegate in self.delegates.iter_mut() {
            handled |= delegate.on_event(capability, data);
        }
        handled
    }

    fn handles(&self, capability: &Capability) -> bool {
        self.callbacks.contains_key(capability)
    }
}

pub struct Interactable {
    id: TargetId,
    name: String,
    active: AtomicBool,
    affinity: RwLock<Option<ModuleId>>,
    handlers: Mutex<HandlerTable>,
}

impl Interactable {
    pub fn new(name: impl Into<String>) -> TargetHandle {
        let target = Arc::new(Self {
            id: TargetId::next(),
            name: name.into(),
            active: AtomicBool::new(true),
            affinity: RwLock::new(None),
            handlers: Mutex::new(HandlerTable::default()),
        });
        debug!("Created interactable {} ({})", target.name, target.id);
        target
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub fn affinity(&self) -> Option<ModuleId> {
        *self.affinity.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restricts this target to input from a single module
    pub fn set_affinity(&self, module: Option<ModuleId>) {
        *self.affinity.write().unwrap_or_else(PoisonError::into_inner) = module;
    }

    /// No affinity, or affinity equal to `module`
    pub fn accepts(&self, module: ModuleId) -> bool {
        match self.affinity() {
            Some(owner) => owner == module,
            None => true,
        }
    }

    /// Registers a closure for one capability
    pub fn on<F>(&self, capability: Capability, callback: F)
    where
        F: FnMut(&InteractionEventData) + Send + 'static,
    {
        self.lock_handlers()
            .callbacks
            .entry(capability)
            .or_default()
            .push(Box::new(callback));
    }

    pub fn add_handler(&self, handler: Box<dyn EventHandler>) {
        self.lock_handlers().delegates.push(handler);
    }

    pub fn has_callback(&self, capability: &Capability) -> bool {
        self.lock_handlers().handles(capability)
    }

    /// Runs every handler for `capability`; returns whether any handled it
    ///
    /// The handler table is locked for the duration of the call, so a handler
    /// must not register new handlers on the target it runs on.
    pub fn invoke(&self, capability: Capability, data: &InteractionEventData) -> bool {
        let handled = self.lock_handlers().invoke(capability, data);
        if handled {
            trace!("{} handled {}", self.name, capability);
        }
        handled
    }

    fn lock_handlers(&self) -> std::sync::MutexGuard<'_, HandlerTable> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Interactable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interactable")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.is_active())
            .field("affinity", &self.affinity())
            .finish()
    }
}
