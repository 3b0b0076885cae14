//! Controller modules and the router that owns them

pub mod controller_module;
pub mod manager;

pub use controller_module::{
    Active, ControllerModule, DeviceInput, EdgeEvent, FrameClock, FrameReport, Inactive,
    ModuleError, ModuleState,
};
pub use manager::{InputRouter, ModuleSlot, RouterError};
