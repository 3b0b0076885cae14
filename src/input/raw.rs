//! Raw per-frame samples supplied by the host

use super::types::Pose;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{trace, warn};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum InputReadError {
    #[error("Device unavailable")]
    DeviceUnavailable,

    #[error("Channel not reported: {0}")]
    MissingChannel(String),

    #[error("Axis {0} reported a non-finite value")]
    NonFinite(String),
}

/// One frame of device state as the host sampled it
///
/// Buttons and axes are keyed by device channel name (`JoystickButton7`,
/// `LTrigger`, `ClickButton`, ...). The device adapter decides which names it
/// reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInputFrame {
    pub buttons: HashMap<String, bool>,
    pub axes: HashMap<String, f32>,
    pub pose: Option<Pose>,
    /// Explicit tracking flag for systems that report tracking loss
    pub tracked: Option<bool>,
    /// The device could not be read this frame
    pub unavailable: bool,
}

impl RawInputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_button(mut self, name: impl Into<String>, down: bool) -> Self {
        self.buttons.insert(name.into(), down);
        self
    }

    pub fn with_axis(mut self, name: impl Into<String>, value: f32) -> Self {
        self.axes.insert(name.into(), value);
        self
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = Some(pose);
        self
    }

    pub fn try_button(&self, name: &str) -> Result<bool, InputReadError> {
        if self.unavailable {
            return Err(InputReadError::DeviceUnavailable);
        }
        self.buttons
            .get(name)
            .copied()
            .ok_or_else(|| InputReadError::MissingChannel(name.to_string()))
    }

    pub fn try_axis(&self, name: &str) -> Result<f32, InputReadError> {
        if self.unavailable {
            return Err(InputReadError::DeviceUnavailable);
        }
        let value = self
            .axes
            .get(name)
            .copied()
            .ok_or_else(|| InputReadError::MissingChannel(name.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(InputReadError::NonFinite(name.to_string()))
        }
    }

    /// Button read that degrades to "not pressed"
    pub fn button(&self, name: &str) -> bool {
        self.try_button(name).unwrap_or_else(|e| {
            log_degraded(name, &e);
            false
        })
    }

    /// Axis read that degrades to the neutral value
    pub fn axis(&self, name: &str) -> f32 {
        self.try_axis(name).unwrap_or_else(|e| {
            log_degraded(name, &e);
            0.0
        })
    }
}

fn log_degraded(name: &str, error: &InputReadError) {
    match error {
        // Hosts only report the channels a device has; the module warns once
        // per frame for an unavailable device
        InputReadError::MissingChannel(_) | InputReadError::DeviceUnavailable => {
            trace!("{}: {}", name, error)
        }
        InputReadError::NonFinite(_) => warn!("Using neutral value for {}: {}", name, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_device_reads_neutral() {
        let frame = RawInputFrame {
            unavailable: true,
            ..RawInputFrame::new().with_button("A", true).with_axis("LTrigger", 0.8)
        };
        assert!(!frame.button("A"));
        assert_eq!(frame.axis("LTrigger"), 0.0);
        assert_eq!(frame.try_axis("LTrigger"), Err(InputReadError::DeviceUnavailable));
    }

    #[test]
    fn nan_axis_is_neutral() {
        let frame = RawInputFrame::new().with_axis("RTrigger", f32::NAN);
        assert_eq!(frame.axis("RTrigger"), 0.0);
    }

    #[test]
    fn missing_channel_is_released() {
        let frame = RawInputFrame::new();
        assert!(!frame.button("JoystickButton0"));
    }
}
