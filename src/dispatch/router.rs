//! Pointer and global dispatch
//!
//! The router knows which (button, channel) pairs its module's device produces and
//! refuses anything else. It never looks at pairings or snapshots itself; the
//! controller module decides which target and which receiver list to pass in.

use super::capability::{Capability, HoverPhase, Scope};
use super::event_data::InteractionEventData;
use super::pairing::ButtonKey;
use super::target::{TargetHandle, TargetId};
use crate::input::{ButtonChannel, ButtonEdge, DeviceFamily, LogicalButton, ModuleId};
use std::collections::BTreeSet;
use tracing::{error, trace};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("{module} ({family:?}) has no {button} {channel} input")]
    UnsupportedButton {
        module: ModuleId,
        family: DeviceFamily,
        button: LogicalButton,
        channel: ButtonChannel,
    },

    #[error("{module} ({family:?}) cannot click {button}")]
    UnsupportedClick {
        module: ModuleId,
        family: DeviceFamily,
        button: LogicalButton,
    },
}

/// Outcome of one dispatch: which handler and who ran it
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    pub capability: Capability,
    pub recipients: Vec<TargetId>,
    /// Synthesized by a disable rather than read from the device
    pub forced: bool,
}

impl DispatchRecord {
    fn new(capability: Capability) -> Self {
        Self {
            capability,
            recipients: Vec::new(),
            forced: false,
        }
    }

    pub fn delivered(&self) -> usize {
        self.recipients.len()
    }
}

#[derive(Debug, Clone)]
pub struct DispatchRouter {
    module: ModuleId,
    family: DeviceFamily,
    supported: BTreeSet<ButtonKey>,
    clickable: BTreeSet<LogicalButton>,
}

impl DispatchRouter {
    pub fn new(
        module: ModuleId,
        family: DeviceFamily,
        supported: impl IntoIterator<Item = ButtonKey>,
        clickable: impl IntoIterator<Item = LogicalButton>,
    ) -> Self {
        Self {
            module,
            family,
            supported: supported.into_iter().collect(),
            clickable: clickable.into_iter().collect(),
        }
    }

    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn supports(&self, button: LogicalButton, channel: ButtonChannel) -> bool {
        self.supported.contains(&(button, channel))
    }

    fn check(&self, button: LogicalButton, channel: ButtonChannel) -> Result<(), DispatchError> {
        if self.supports(button, channel) {
            Ok(())
        } else {
            error!(
                "Dispatch of {} {} on {} rejected: not part of the {:?} profile",
                button, channel, self.module, self.family
            );
            Err(DispatchError::UnsupportedButton {
                module: self.module,
                family: self.family,
                button,
                channel,
            })
        }
    }

    fn check_click(&self, button: LogicalButton) -> Result<(), DispatchError> {
        if self.clickable.contains(&button) {
            Ok(())
        } else {
            error!("Click on {} rejected for {}", button, self.module);
            Err(DispatchError::UnsupportedClick {
                module: self.module,
                family: self.family,
                button,
            })
        }
    }

    /// Invokes the pointer handler on `target`; a missing target is skipped
    pub fn dispatch_pointer(
        &self,
        button: LogicalButton,
        channel: ButtonChannel,
        edge: ButtonEdge,
        target: Option<&TargetHandle>,
        data: &InteractionEventData,
    ) -> Result<DispatchRecord, DispatchError> {
        self.check(button, channel)?;
        let capability = Capability::for_button(Scope::Pointer, button, channel, edge);
        Ok(self.deliver_pointer(capability, target, data))
    }

    /// Invokes the global handler on every active receiver that accepts this module
    pub fn dispatch_global(
        &self,
        button: LogicalButton,
        channel: ButtonChannel,
        edge: ButtonEdge,
        subscribers: &[TargetHandle],
        data: &InteractionEventData,
    ) -> Result<DispatchRecord, DispatchError> {
        self.check(button, channel)?;
        let capability = Capability::for_button(Scope::Global, button, channel, edge);
        Ok(self.deliver_global(capability, subscribers, data))
    }

    /// Click goes to the target and receivers captured when the press began
    pub fn dispatch_click(
        &self,
        button: LogicalButton,
        target: Option<&TargetHandle>,
        subscribers: &[TargetHandle],
        data: &InteractionEventData,
    ) -> Result<[DispatchRecord; 2], DispatchError> {
        self.check_click(button)?;
        let pointer = self.deliver_pointer(Capability::for_click(Scope::Pointer, button), target, data);
        let global = self.deliver_global(Capability::for_click(Scope::Global, button), subscribers, data);
        Ok([pointer, global])
    }

    /// Hover events only reach targets that accept this module
    pub fn dispatch_hover(
        &self,
        phase: HoverPhase,
        target: &TargetHandle,
        data: &InteractionEventData,
    ) -> DispatchRecord {
        let mut record = DispatchRecord::new(Capability::Hover(phase));
        if target.accepts(self.module) && target.invoke(record.capability, data) {
            record.recipients.push(target.id());
        }
        record
    }

    fn deliver_pointer(
        &self,
        capability: Capability,
        target: Option<&TargetHandle>,
        data: &InteractionEventData,
    ) -> DispatchRecord {
        let mut record = DispatchRecord::new(capability);
        match target {
            Some(target) => {
                if target.invoke(capability, data) {
                    record.recipients.push(target.id());
                }
            }
            None => trace!("{} skipped: no target", capability),
        }
        record
    }

    fn deliver_global(
        &self,
        capability: Capability,
        subscribers: &[TargetHandle],
        data: &InteractionEventData,
    ) -> DispatchRecord {
        let mut record = DispatchRecord::new(capability);
        for receiver in subscribers {
            if !receiver.is_active() || !receiver.accepts(self.module) {
                trace!("{} filtered out of {}", receiver.name(), capability);
                continue;
            }
            if receiver.invoke(capability, data) {
                record.recipients.push(receiver.id());
            }
        }
        record
    }
}
