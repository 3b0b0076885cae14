//! Registry of global receivers
//!
//! Membership is driven by the host (register on enable, unregister on disable).
//! Readers never iterate the live list: [`ReceiverRegistry::snapshot`] copies it,
//! so a receiver may unregister itself from inside a handler.

use super::target::{TargetHandle, TargetId};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, trace};

#[derive(Debug, Clone, Default)]
pub struct ReceiverRegistry {
    receivers: Arc<RwLock<Vec<TargetHandle>>>,
}

static GLOBAL_REGISTRY: OnceLock<ReceiverRegistry> = OnceLock::new();

impl ReceiverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry for hosts that want a single shared instance
    pub fn global() -> &'static ReceiverRegistry {
        GLOBAL_REGISTRY.get_or_init(ReceiverRegistry::new)
    }

    /// Adds a receiver at the end; registering twice is a no-op
    pub fn register(&self, receiver: TargetHandle) {
        let mut receivers = self.receivers.write().unwrap_or_else(PoisonError::into_inner);
        if receivers.iter().any(|r| r.id() == receiver.id()) {
            trace!("{} already registered", receiver.name());
            return;
        }
        debug!("Registered global receiver {}", receiver.name());
        receivers.push(receiver);
    }

    pub fn unregister(&self, id: TargetId) -> bool {
        let mut receivers = self.receivers.write().unwrap_or_else(PoisonError::into_inner);
        let before = receivers.len();
        receivers.retain(|r| r.id() != id);
        let removed = receivers.len() != before;
        if removed {
            debug!("Unregistered global receiver {}", id);
        }
        removed
    }

    /// Point-in-time copy in registration order
    pub fn snapshot(&self) -> Vec<TargetHandle> {
        self.receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
