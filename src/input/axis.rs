//! Analog axis sampling and normalization
//!
//! Devices report touchpads in different coordinate conventions. Everything leaving
//! this module is centred: x in [-1, 1] to the right, y in [-1, 1] upwards.

use super::tracker::Thresholds;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Scalar analog axes that can back a virtual button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalogAxis {
    Trigger,
    Grip,
}

/// Thumbstick directions treated as buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickDirection {
    Forward,
    Back,
    Left,
    Right,
}

/// How a device reports its touchpad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TouchpadConvention {
    /// Already centred, y up
    #[default]
    Centered,
    /// (0, 0) top-left, (1, 1) bottom-right
    TopLeftOrigin,
}

impl TouchpadConvention {
    pub fn normalize(self, raw: Vec2) -> Vec2 {
        match self {
            Self::Centered => raw,
            Self::TopLeftOrigin => Vec2::new((raw.x - 0.5) * 2.0, (-raw.y + 0.5) * 2.0),
        }
    }
}

/// Analog values sampled for one module in one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisSample {
    pub trigger: f32,
    pub grip: f32,
    pub touchpad: Vec2,
    pub thumbstick: Vec2,
}

impl AxisSample {
    pub fn analog(&self, axis: AnalogAxis) -> f32 {
        match axis {
            AnalogAxis::Trigger => self.trigger,
            AnalogAxis::Grip => self.grip,
        }
    }

    pub fn direction(&self, direction: StickDirection, threshold: f32) -> bool {
        match direction {
            StickDirection::Forward => self.thumbstick.y >= threshold,
            StickDirection::Back => self.thumbstick.y <= -threshold,
            StickDirection::Left => self.thumbstick.x <= -threshold,
            StickDirection::Right => self.thumbstick.x >= threshold,
        }
    }
}

/// Raw analog readings a device adapter collected for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawAxes {
    pub trigger: f32,
    pub grip: f32,
    pub touchpad: Vec2,
    pub touchpad_touched: bool,
    pub thumbstick: Vec2,
}

/// Normalizes raw device axes into an [`AxisSample`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSampler {
    convention: TouchpadConvention,
    deadzone: f32,
}

impl AxisSampler {
    pub fn new(convention: TouchpadConvention, thresholds: &Thresholds) -> Self {
        Self {
            convention,
            deadzone: thresholds.deadzone,
        }
    }

    pub fn sample(&self, raw: RawAxes) -> AxisSample {
        let touchpad = if raw.touchpad_touched {
            self.convention.normalize(raw.touchpad)
        } else {
            Vec2::ZERO
        };

        AxisSample {
            trigger: raw.trigger.clamp(0.0, 1.0),
            grip: raw.grip.clamp(0.0, 1.0),
            touchpad: clamp_unit(touchpad),
            thumbstick: clamp_unit(Vec2::new(
                apply_deadzone(raw.thumbstick.x, self.deadzone),
                apply_deadzone(raw.thumbstick.y, self.deadzone),
            )),
        }
    }
}

fn clamp_unit(v: Vec2) -> Vec2 {
    v.clamp(Vec2::splat(-1.0), Vec2::splat(1.0))
}

pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if deadzone <= 0.0 {
        return value;
    }
    if value.abs() < deadzone {
        0.0
    } else {
        // Rescale the value to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_left_touchpad_is_centred() {
        let sampler = AxisSampler::new(TouchpadConvention::TopLeftOrigin, &Thresholds::default());
        let sample = sampler.sample(RawAxes {
            touchpad: Vec2::new(1.0, 0.0),
            touchpad_touched: true,
            ..Default::default()
        });
        assert_eq!(sample.touchpad, Vec2::new(1.0, 1.0));

        let centre = sampler.sample(RawAxes {
            touchpad: Vec2::new(0.5, 0.5),
            touchpad_touched: true,
            ..Default::default()
        });
        assert_eq!(centre.touchpad, Vec2::ZERO);
    }

    #[test]
    fn untouched_touchpad_is_zero() {
        let sampler = AxisSampler::new(TouchpadConvention::TopLeftOrigin, &Thresholds::default());
        let sample = sampler.sample(RawAxes {
            touchpad: Vec2::new(0.9, 0.1),
            touchpad_touched: false,
            ..Default::default()
        });
        assert_eq!(sample.touchpad, Vec2::ZERO);
    }

    #[test]
    fn deadzone_rescales() {
        assert_eq!(apply_deadzone(0.05, 0.1), 0.0);
        assert!((apply_deadzone(0.55, 0.1) - 0.5).abs() < 1e-6);
        assert!((apply_deadzone(-1.0, 0.1) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn directions_use_signed_thresholds() {
        let sample = AxisSample {
            thumbstick: Vec2::new(-0.5, 0.7),
            ..Default::default()
        };
        assert!(sample.direction(StickDirection::Forward, 0.5));
        assert!(sample.direction(StickDirection::Left, 0.5));
        assert!(!sample.direction(StickDirection::Back, 0.5));
        assert!(!sample.direction(StickDirection::Right, 0.5));
    }
}
