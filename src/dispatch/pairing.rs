//! Press lifecycle bookkeeping
//!
//! [`PairingTable`] remembers which target a button went down on; the matching
//! Held/Up dispatch goes there even when the pointer has moved on.
//! [`SubscriberSnapshots`] freezes the global receivers at Down for the same span.

use super::target::{Interactable, TargetHandle};
use crate::input::{ButtonChannel, LogicalButton};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

pub type ButtonKey = (LogicalButton, ButtonChannel);

/// Bound targets per (button, channel)
///
/// Targets are held weakly: a target the host dropped mid-press reads as unbound.
#[derive(Debug, Default, Clone)]
pub struct PairingTable {
    bound: BTreeMap<ButtonKey, Weak<Interactable>>,
}

impl PairingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any previous binding
    pub fn bind(&mut self, button: LogicalButton, channel: ButtonChannel, target: &TargetHandle) {
        self.bound.insert((button, channel), Arc::downgrade(target));
    }

    pub fn get(&self, button: LogicalButton, channel: ButtonChannel) -> Option<TargetHandle> {
        self.bound.get(&(button, channel)).and_then(Weak::upgrade)
    }

    pub fn clear(&mut self, button: LogicalButton, channel: ButtonChannel) {
        self.bound.remove(&(button, channel));
    }

    pub fn clear_all(&mut self) {
        self.bound.clear();
    }

    /// Live bindings in button order
    pub fn bound(&self) -> Vec<(ButtonKey, TargetHandle)> {
        self.bound
            .iter()
            .filter_map(|(key, target)| target.upgrade().map(|t| (*key, t)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.values().all(|t| t.strong_count() == 0)
    }
}

/// Receiver lists frozen at Down, per (button, channel)
#[derive(Debug, Default, Clone)]
pub struct SubscriberSnapshots {
    snapshots: BTreeMap<ButtonKey, Vec<TargetHandle>>,
}

impl SubscriberSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(
        &mut self,
        button: LogicalButton,
        channel: ButtonChannel,
        receivers: Vec<TargetHandle>,
    ) {
        self.snapshots.insert((button, channel), receivers);
    }

    pub fn get(&self, button: LogicalButton, channel: ButtonChannel) -> Option<&[TargetHandle]> {
        self.snapshots.get(&(button, channel)).map(Vec::as_slice)
    }

    pub fn take(&mut self, button: LogicalButton, channel: ButtonChannel) -> Option<Vec<TargetHandle>> {
        self.snapshots.remove(&(button, channel))
    }

    pub fn keys(&self) -> Vec<ButtonKey> {
        self.snapshots.keys().copied().collect()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
