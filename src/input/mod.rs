//! Raw input, logical identities and edge tracking

pub mod axis;
pub mod raw;
pub mod tracker;
pub mod types;

pub use axis::{AnalogAxis, AxisSample, AxisSampler, RawAxes, StickDirection, TouchpadConvention};
pub use raw::{InputReadError, RawInputFrame};
pub use tracker::{ButtonStateTracker, ClickDetector, Thresholds};
pub use types::{
    ButtonChannel, ButtonEdge, DeviceFamily, EdgeState, Hand, LogicalButton, ModuleId, Pose,
    XrSystem,
};
