//! Device mapping layer
//!
//! A device adapter is the only device-specific code: it names the raw channels a
//! device reports and says which logical (button, channel) pairs it produces. Edge
//! tracking and dispatch are shared by every device.
//!
//! ```text
//! RawInputFrame ──► DeviceAdapter ──► (AxisSample, button booleans) ──► ControllerModule
//! ```

pub mod daydream;
pub mod generic_xr;
pub mod oculus_touch;

pub use daydream::DaydreamAdapter;
pub use generic_xr::GenericXrAdapter;
pub use oculus_touch::OculusTouchAdapter;

use crate::dispatch::ButtonKey;
use crate::input::{
    AnalogAxis, AxisSample, ButtonChannel, DeviceFamily, Hand, LogicalButton, Pose, RawAxes,
    RawInputFrame, StickDirection, Thresholds, TouchpadConvention, XrSystem,
};

/// Where a logical button's boolean comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ButtonSource {
    /// Named raw button channel
    Raw(String),
    /// Analog axis against the channel's threshold (press: >=, touch: >)
    Analog(AnalogAxis),
    /// Thumbstick direction against the direction threshold
    Direction(StickDirection),
    /// Not mapped on the current system; always released
    Unmapped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonBinding {
    pub button: LogicalButton,
    pub channel: ButtonChannel,
    pub source: ButtonSource,
}

impl ButtonBinding {
    pub fn new(button: LogicalButton, channel: ButtonChannel, source: ButtonSource) -> Self {
        Self {
            button,
            channel,
            source,
        }
    }

    pub fn raw(button: LogicalButton, channel: ButtonChannel, name: impl Into<String>) -> Self {
        Self::new(button, channel, ButtonSource::Raw(name.into()))
    }

    pub fn key(&self) -> ButtonKey {
        (self.button, self.channel)
    }

    /// Evaluates this binding against one frame
    pub fn sample(&self, raw: &RawInputFrame, axes: &AxisSample, thresholds: &Thresholds) -> bool {
        match &self.source {
            ButtonSource::Raw(name) => raw.button(name),
            ButtonSource::Analog(axis) => {
                let value = axes.analog(*axis);
                match self.channel {
                    ButtonChannel::Press => thresholds.pressed(value),
                    ButtonChannel::Touch => thresholds.touched(value),
                }
            }
            ButtonSource::Direction(direction) => axes.direction(*direction, thresholds.direction),
            ButtonSource::Unmapped => false,
        }
    }
}

/// Everything the shared core needs to know about a device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub family: DeviceFamily,
    /// Processed in this order every frame
    pub bindings: Vec<ButtonBinding>,
    /// Analog buttons that synthesize a click at full travel
    pub clickable: Vec<LogicalButton>,
    pub touchpad: TouchpadConvention,
}

impl DeviceProfile {
    pub fn supported(&self) -> impl Iterator<Item = ButtonKey> + '_ {
        self.bindings.iter().map(ButtonBinding::key)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum DeviceError {
    #[error("{family:?} devices do not support system {system}")]
    SystemNotSupported { family: DeviceFamily, system: XrSystem },
}

/// Per-device sampling
pub trait DeviceAdapter: Send {
    fn family(&self) -> DeviceFamily;

    fn hand(&self) -> Hand;

    fn profile(&self) -> &DeviceProfile;

    /// Raw analog values in device conventions
    fn read_axes(&self, raw: &RawInputFrame) -> RawAxes;

    fn read_pose(&self, raw: &RawInputFrame) -> Option<Pose> {
        raw.pose
    }

    /// Explicit tracking state; `None` means "pose changed since last frame"
    fn read_tracking(&self, raw: &RawInputFrame) -> Option<bool> {
        raw.tracked
    }

    fn system(&self) -> XrSystem {
        XrSystem::None
    }

    fn set_system(&mut self, system: XrSystem) -> Result<(), DeviceError> {
        Err(DeviceError::SystemNotSupported {
            family: self.family(),
            system,
        })
    }
}

/// Builds the adapter for a device family
pub fn adapter_for(family: DeviceFamily, hand: Hand, system: XrSystem) -> Box<dyn DeviceAdapter> {
    match family {
        DeviceFamily::Daydream => Box::new(DaydreamAdapter::new(hand)),
        DeviceFamily::GenericXr => Box::new(GenericXrAdapter::new(hand, system)),
        DeviceFamily::OculusTouch => Box::new(OculusTouchAdapter::new(hand)),
    }
}

/// "L" or "R", the prefix raw channel names use
pub(crate) fn hand_label(hand: Hand) -> &'static str {
    match hand {
        Hand::Left => "L",
        Hand::Right => "R",
    }
}
