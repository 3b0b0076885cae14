//! Event dispatch: capabilities, targets, receivers and the router

pub mod capability;
pub mod event_data;
pub mod pairing;
pub mod registry;
pub mod router;
pub mod target;

pub use capability::{canonical, Capability, HoverPhase, Scope};
pub use event_data::{InteractionEventData, RaycastHit};
pub use pairing::{ButtonKey, PairingTable, SubscriberSnapshots};
pub use registry::ReceiverRegistry;
pub use router::{DispatchError, DispatchRecord, DispatchRouter};
pub use target::{EventHandler, Interactable, TargetHandle, TargetId};
