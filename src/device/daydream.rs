//! Daydream controller: click, touch and app button plus a top-left touchpad

use super::{ButtonBinding, DeviceAdapter, DeviceProfile};
use crate::input::{
    ButtonChannel, DeviceFamily, Hand, LogicalButton, Pose, RawAxes, RawInputFrame,
    TouchpadConvention,
};
use glam::Vec2;

pub const CLICK_BUTTON: &str = "ClickButton";
pub const IS_TOUCHING: &str = "IsTouching";
pub const APP_BUTTON: &str = "AppButton";
pub const TOUCH_POS_X: &str = "TouchPosX";
pub const TOUCH_POS_Y: &str = "TouchPosY";

pub struct DaydreamAdapter {
    hand: Hand,
    profile: DeviceProfile,
}

impl DaydreamAdapter {
    pub fn new(hand: Hand) -> Self {
        let profile = DeviceProfile {
            family: DeviceFamily::Daydream,
            bindings: vec![
                ButtonBinding::raw(LogicalButton::Click, ButtonChannel::Press, CLICK_BUTTON),
                ButtonBinding::raw(LogicalButton::Touch, ButtonChannel::Touch, IS_TOUCHING),
                ButtonBinding::raw(LogicalButton::AppButton, ButtonChannel::Press, APP_BUTTON),
            ],
            clickable: Vec::new(),
            touchpad: TouchpadConvention::TopLeftOrigin,
        };
        Self { hand, profile }
    }
}

impl DeviceAdapter for DaydreamAdapter {
    fn family(&self) -> DeviceFamily {
        DeviceFamily::Daydream
    }

    fn hand(&self) -> Hand {
        self.hand
    }

    fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    fn read_axes(&self, raw: &RawInputFrame) -> RawAxes {
        RawAxes {
            touchpad: Vec2::new(raw.axis(TOUCH_POS_X), raw.axis(TOUCH_POS_Y)),
            touchpad_touched: raw.button(IS_TOUCHING),
            ..Default::default()
        }
    }

    /// Orientation only; the controller has no positional tracking
    fn read_pose(&self, raw: &RawInputFrame) -> Option<Pose> {
        raw.pose.map(|pose| Pose {
            rotation: pose.rotation,
            ..Pose::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn pose_keeps_rotation_only() {
        let adapter = DaydreamAdapter::new(Hand::Right);
        let rotation = Quat::from_rotation_y(0.5);
        let raw = RawInputFrame::new().with_pose(Pose {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation,
        });
        let pose = adapter.read_pose(&raw).unwrap();
        assert_eq!(pose.position, Vec3::ZERO);
        assert_eq!(pose.rotation, rotation);
    }

    #[test]
    fn touchpad_reports_touch_flag() {
        let adapter = DaydreamAdapter::new(Hand::Right);
        let raw = RawInputFrame::new()
            .with_button(IS_TOUCHING, true)
            .with_axis(TOUCH_POS_X, 0.25)
            .with_axis(TOUCH_POS_Y, 0.75);
        let axes = adapter.read_axes(&raw);
        assert!(axes.touchpad_touched);
        assert_eq!(axes.touchpad, Vec2::new(0.25, 0.75));
    }
}
