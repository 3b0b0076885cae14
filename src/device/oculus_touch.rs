//! Oculus Touch through the OVR raw button set
//!
//! Press channel only. Trigger and grip also synthesize clicks from their axes.

use super::{hand_label, ButtonBinding, DeviceAdapter, DeviceProfile};
use crate::input::{
    ButtonChannel, DeviceFamily, Hand, LogicalButton, RawAxes, RawInputFrame, TouchpadConvention,
};
use glam::Vec2;

/// Raw OVR button names for a hand, paired with their logical identity
pub fn raw_buttons(hand: Hand) -> [(LogicalButton, &'static str); 5] {
    match hand {
        Hand::Left => [
            (LogicalButton::X, "X"),
            (LogicalButton::Y, "Y"),
            (LogicalButton::Trigger, "LIndexTrigger"),
            (LogicalButton::Grip, "LHandTrigger"),
            (LogicalButton::Thumbstick, "LThumbstick"),
        ],
        Hand::Right => [
            (LogicalButton::A, "A"),
            (LogicalButton::B, "B"),
            (LogicalButton::Trigger, "RIndexTrigger"),
            (LogicalButton::Grip, "RHandTrigger"),
            (LogicalButton::Thumbstick, "RThumbstick"),
        ],
    }
}

pub struct OculusTouchAdapter {
    hand: Hand,
    profile: DeviceProfile,
}

impl OculusTouchAdapter {
    pub fn new(hand: Hand) -> Self {
        let bindings = raw_buttons(hand)
            .into_iter()
            .map(|(button, name)| ButtonBinding::raw(button, ButtonChannel::Press, name))
            .collect();
        Self {
            hand,
            profile: DeviceProfile {
                family: DeviceFamily::OculusTouch,
                bindings,
                clickable: vec![LogicalButton::Trigger, LogicalButton::Grip],
                touchpad: TouchpadConvention::Centered,
            },
        }
    }
}

impl DeviceAdapter for OculusTouchAdapter {
    fn family(&self) -> DeviceFamily {
        DeviceFamily::OculusTouch
    }

    fn hand(&self) -> Hand {
        self.hand
    }

    fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    fn read_axes(&self, raw: &RawInputFrame) -> RawAxes {
        let label = hand_label(self.hand);
        RawAxes {
            trigger: raw.axis(&format!("{}IndexTrigger", label)),
            grip: raw.axis(&format!("{}HandTrigger", label)),
            thumbstick: Vec2::new(
                raw.axis(&format!("{}ThumbstickX", label)),
                raw.axis(&format!("{}ThumbstickY", label)),
            ),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_hand_profile() {
        let adapter = OculusTouchAdapter::new(Hand::Right);
        let keys: Vec<_> = adapter.profile().supported().collect();
        assert!(keys.contains(&(LogicalButton::A, ButtonChannel::Press)));
        assert!(!keys.contains(&(LogicalButton::X, ButtonChannel::Press)));
        assert!(keys.iter().all(|(_, channel)| *channel == ButtonChannel::Press));
    }

    #[test]
    fn axes_use_hand_prefix() {
        let adapter = OculusTouchAdapter::new(Hand::Left);
        let raw = RawInputFrame::new()
            .with_axis("LIndexTrigger", 1.0)
            .with_axis("RIndexTrigger", 0.3);
        assert_eq!(adapter.read_axes(&raw).trigger, 1.0);
    }
}
