//! Downstream collaborators built on the global handler set

pub mod grabbable;
pub mod holdable;

pub use grabbable::{Aabb, GrabHandle, GrabState, Grabbable};
pub use holdable::{HoldHandle, HoldState, Holdable};
