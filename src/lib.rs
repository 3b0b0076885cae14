//! VR controller input routing
//!
//! Per-device controller modules turn raw button and axis samples into edge
//! triggered press/touch/click events and dispatch them to the pointed-at target
//! and to globally registered receivers.

pub mod behaviours;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod input;
pub mod module;
pub mod replay;

pub use config::RouterConfig;
pub use dispatch::{Capability, Interactable, InteractionEventData, ReceiverRegistry, Scope};
pub use module::{ControllerModule, DeviceInput, FrameClock, FrameReport, InputRouter};
