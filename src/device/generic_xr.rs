//! Generic XR controllers (CV1, Vive, Windows MR, GearVR)
//!
//! Digital buttons arrive as joystick button channels (`JoystickButton<N>`) whose
//! numbers depend on the runtime and the hand. Trigger and grip are analog on every
//! runtime except GearVR, which reports its trigger as a button. Thumbstick
//! directions are virtual buttons on the thumbstick axes.

use super::{hand_label, ButtonBinding, ButtonSource, DeviceAdapter, DeviceError, DeviceProfile};
use crate::input::{
    AnalogAxis, ButtonChannel, DeviceFamily, Hand, LogicalButton, RawAxes, RawInputFrame,
    StickDirection, TouchpadConvention, XrSystem,
};
use glam::Vec2;
use tracing::info;

/// Button order for every frame
pub const XR_BUTTONS: [LogicalButton; 13] = [
    LogicalButton::Trigger,
    LogicalButton::Grip,
    LogicalButton::Touchpad,
    LogicalButton::Menu,
    LogicalButton::Thumbstick,
    LogicalButton::A,
    LogicalButton::B,
    LogicalButton::X,
    LogicalButton::Y,
    LogicalButton::Forward,
    LogicalButton::Back,
    LogicalButton::Left,
    LogicalButton::Right,
];

const TOUCHABLE: [LogicalButton; 9] = [
    LogicalButton::Trigger,
    LogicalButton::Grip,
    LogicalButton::Touchpad,
    LogicalButton::Menu,
    LogicalButton::Thumbstick,
    LogicalButton::A,
    LogicalButton::B,
    LogicalButton::X,
    LogicalButton::Y,
];

// GearVR reports through the OVR runtime instead of joystick channels
pub const GEARVR_TRIGGER: &str = "PrimaryIndexTrigger";
pub const GEARVR_BACK: &str = "Back";
pub const GEARVR_TOUCHPAD: &str = "PrimaryTouchpad";
pub const GEARVR_TOUCHPAD_TOUCH: &str = "Touch.PrimaryTouchpad";
pub const GEARVR_TOUCHPAD_X: &str = "PrimaryTouchpadX";
pub const GEARVR_TOUCHPAD_Y: &str = "PrimaryTouchpadY";

pub fn joystick_button(index: u8) -> String {
    format!("JoystickButton{}", index)
}

fn press_key(hand: Hand, system: XrSystem, button: LogicalButton) -> Option<u8> {
    use LogicalButton::*;
    match (hand, system, button) {
        (Hand::Left, XrSystem::Cv1, Menu) => Some(7),
        (Hand::Left, XrSystem::Cv1, Thumbstick) => Some(8),
        (Hand::Left, XrSystem::Cv1, X) => Some(2),
        (Hand::Left, XrSystem::Cv1, Y) => Some(3),
        (Hand::Left, XrSystem::WindowsMr, Menu) => Some(6),
        (Hand::Left, XrSystem::WindowsMr, Thumbstick) => Some(8),
        (Hand::Left, XrSystem::WindowsMr, Touchpad) => Some(16),
        (Hand::Left, XrSystem::Vive, Menu) => Some(2),
        (Hand::Left, XrSystem::Vive, Touchpad) => Some(8),

        (Hand::Right, XrSystem::Cv1, Thumbstick) => Some(9),
        (Hand::Right, XrSystem::Cv1, A) => Some(0),
        (Hand::Right, XrSystem::Cv1, B) => Some(1),
        (Hand::Right, XrSystem::WindowsMr, Menu) => Some(7),
        (Hand::Right, XrSystem::WindowsMr, Thumbstick) => Some(9),
        (Hand::Right, XrSystem::WindowsMr, Touchpad) => Some(17),
        (Hand::Right, XrSystem::Vive, Menu) => Some(0),
        (Hand::Right, XrSystem::Vive, Touchpad) => Some(9),
        _ => None,
    }
}

fn touch_key(hand: Hand, system: XrSystem, button: LogicalButton) -> Option<u8> {
    use LogicalButton::*;
    match (hand, system, button) {
        (Hand::Left, XrSystem::Cv1, Thumbstick) => Some(16),
        (Hand::Left, XrSystem::Cv1, X) => Some(12),
        (Hand::Left, XrSystem::Cv1, Y) => Some(13),
        (Hand::Left, XrSystem::Cv1, Touchpad) => Some(18),
        (Hand::Left, XrSystem::WindowsMr, Touchpad) => Some(18),
        (Hand::Left, XrSystem::Vive, Touchpad) => Some(16),

        (Hand::Right, XrSystem::Cv1, Thumbstick) => Some(17),
        (Hand::Right, XrSystem::Cv1, A) => Some(10),
        (Hand::Right, XrSystem::Cv1, B) => Some(11),
        (Hand::Right, XrSystem::Cv1, Touchpad) => Some(19),
        (Hand::Right, XrSystem::WindowsMr, Touchpad) => Some(19),
        (Hand::Right, XrSystem::Vive, Touchpad) => Some(17),
        _ => None,
    }
}

fn has_joystick_mapping(system: XrSystem) -> bool {
    matches!(system, XrSystem::Cv1 | XrSystem::Vive | XrSystem::WindowsMr)
}

fn press_source(hand: Hand, system: XrSystem, button: LogicalButton) -> ButtonSource {
    if system == XrSystem::GearVr {
        return match button {
            LogicalButton::Trigger => ButtonSource::Raw(GEARVR_TRIGGER.to_string()),
            LogicalButton::Menu => ButtonSource::Raw(GEARVR_BACK.to_string()),
            LogicalButton::Touchpad => ButtonSource::Raw(GEARVR_TOUCHPAD.to_string()),
            _ => ButtonSource::Unmapped,
        };
    }
    if !has_joystick_mapping(system) {
        return ButtonSource::Unmapped;
    }
    match button {
        LogicalButton::Trigger => ButtonSource::Analog(AnalogAxis::Trigger),
        LogicalButton::Grip => ButtonSource::Analog(AnalogAxis::Grip),
        LogicalButton::Forward => ButtonSource::Direction(StickDirection::Forward),
        LogicalButton::Back => ButtonSource::Direction(StickDirection::Back),
        LogicalButton::Left => ButtonSource::Direction(StickDirection::Left),
        LogicalButton::Right => ButtonSource::Direction(StickDirection::Right),
        other => press_key(hand, system, other)
            .map(|key| ButtonSource::Raw(joystick_button(key)))
            .unwrap_or(ButtonSource::Unmapped),
    }
}

fn touch_source(hand: Hand, system: XrSystem, button: LogicalButton) -> ButtonSource {
    if system == XrSystem::GearVr {
        return match button {
            LogicalButton::Touchpad => ButtonSource::Raw(GEARVR_TOUCHPAD_TOUCH.to_string()),
            _ => ButtonSource::Unmapped,
        };
    }
    if !has_joystick_mapping(system) {
        return ButtonSource::Unmapped;
    }
    match button {
        LogicalButton::Trigger => ButtonSource::Analog(AnalogAxis::Trigger),
        LogicalButton::Grip => ButtonSource::Analog(AnalogAxis::Grip),
        other => touch_key(hand, system, other)
            .map(|key| ButtonSource::Raw(joystick_button(key)))
            .unwrap_or(ButtonSource::Unmapped),
    }
}

/// Press then touch per button, in [`XR_BUTTONS`] order
pub fn bindings_for(hand: Hand, system: XrSystem) -> Vec<ButtonBinding> {
    let mut bindings = Vec::with_capacity(XR_BUTTONS.len() + TOUCHABLE.len());
    for button in XR_BUTTONS {
        bindings.push(ButtonBinding::new(
            button,
            ButtonChannel::Press,
            press_source(hand, system, button),
        ));
        if TOUCHABLE.contains(&button) {
            bindings.push(ButtonBinding::new(
                button,
                ButtonChannel::Touch,
                touch_source(hand, system, button),
            ));
        }
    }
    bindings
}

pub struct GenericXrAdapter {
    hand: Hand,
    system: XrSystem,
    profile: DeviceProfile,
}

impl GenericXrAdapter {
    pub fn new(hand: Hand, system: XrSystem) -> Self {
        Self {
            hand,
            system,
            profile: Self::build_profile(hand, system),
        }
    }

    fn build_profile(hand: Hand, system: XrSystem) -> DeviceProfile {
        DeviceProfile {
            family: DeviceFamily::GenericXr,
            bindings: bindings_for(hand, system),
            clickable: vec![LogicalButton::Trigger, LogicalButton::Grip],
            touchpad: TouchpadConvention::Centered,
        }
    }
}

impl DeviceAdapter for GenericXrAdapter {
    fn family(&self) -> DeviceFamily {
        DeviceFamily::GenericXr
    }

    fn hand(&self) -> Hand {
        self.hand
    }

    fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    fn read_axes(&self, raw: &RawInputFrame) -> RawAxes {
        let label = hand_label(self.hand);
        let pair = |x: &str, y: &str| Vec2::new(raw.axis(x), raw.axis(y));
        let stick = || {
            pair(
                &format!("{}ThumbstickX", label),
                &format!("{}ThumbstickY", label),
            )
        };

        let (trigger, grip) = match self.system {
            XrSystem::Cv1 | XrSystem::Vive | XrSystem::WindowsMr => (
                raw.axis(&format!("{}Trigger", label)),
                raw.axis(&format!("{}Grip", label)),
            ),
            XrSystem::GearVr => (raw.axis(GEARVR_TRIGGER), 0.0),
            _ => (0.0, 0.0),
        };

        let thumbstick = match self.system {
            XrSystem::Cv1 | XrSystem::WindowsMr => stick(),
            _ => Vec2::ZERO,
        };

        let touchpad = match self.system {
            // Vive reports its touchpad on the thumbstick axes
            XrSystem::Vive => stick(),
            XrSystem::WindowsMr => pair(
                &format!("WMR_{}TouchpadX", label),
                &format!("WMR_{}TouchpadY", label),
            ),
            XrSystem::GearVr => pair(GEARVR_TOUCHPAD_X, GEARVR_TOUCHPAD_Y),
            _ => Vec2::ZERO,
        };

        RawAxes {
            trigger,
            grip,
            touchpad,
            touchpad_touched: true,
            thumbstick,
        }
    }

    fn read_tracking(&self, raw: &RawInputFrame) -> Option<bool> {
        match self.system {
            XrSystem::None | XrSystem::Daydream => Some(false),
            XrSystem::GearVr => Some(raw.tracked.unwrap_or(true)),
            _ => raw.tracked,
        }
    }

    fn system(&self) -> XrSystem {
        self.system
    }

    fn set_system(&mut self, system: XrSystem) -> Result<(), DeviceError> {
        if system == XrSystem::Daydream {
            return Err(DeviceError::SystemNotSupported {
                family: DeviceFamily::GenericXr,
                system,
            });
        }
        info!(
            "Remapping {:?} hand generic XR controller from {} to {}",
            self.hand, self.system, system
        );
        self.system = system;
        self.profile = Self::build_profile(self.hand, system);
        Ok(())
    }
}
