//! Identity types shared by the whole input pipeline
//!
//! Logical buttons, channels and edges are plain `Copy` values so they can be used
//! as map keys in the tracker, the pairing table and the capability table.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Logical button identity, independent of the device that produces it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogicalButton {
    Trigger,
    Grip,
    Touchpad,
    Menu,
    Thumbstick,
    A,
    B,
    X,
    Y,
    // Thumbstick directions treated as virtual buttons
    Forward,
    Back,
    Left,
    Right,
    // Daydream identities
    Click,
    Touch,
    AppButton,
}

impl LogicalButton {
    pub const ALL: [LogicalButton; 16] = [
        Self::Trigger,
        Self::Grip,
        Self::Touchpad,
        Self::Menu,
        Self::Thumbstick,
        Self::A,
        Self::B,
        Self::X,
        Self::Y,
        Self::Forward,
        Self::Back,
        Self::Left,
        Self::Right,
        Self::Click,
        Self::Touch,
        Self::AppButton,
    ];

    pub fn is_direction(self) -> bool {
        matches!(self, Self::Forward | Self::Back | Self::Left | Self::Right)
    }

    /// Name used when composing handler names
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trigger => "Trigger",
            Self::Grip => "Grip",
            Self::Touchpad => "Touchpad",
            Self::Menu => "Menu",
            Self::Thumbstick => "Thumbstick",
            Self::A => "A",
            Self::B => "B",
            Self::X => "X",
            Self::Y => "Y",
            Self::Forward => "Forward",
            Self::Back => "Back",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Click => "Click",
            Self::Touch => "Touch",
            Self::AppButton => "AppButton",
        }
    }
}

impl fmt::Display for LogicalButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interaction depth tracked independently per button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ButtonChannel {
    Press,
    Touch,
}

impl ButtonChannel {
    pub const ALL: [ButtonChannel; 2] = [Self::Press, Self::Touch];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Press => "Press",
            Self::Touch => "Touch",
        }
    }
}

impl fmt::Display for ButtonChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge derived by comparing the previous and the current sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeState {
    #[default]
    Idle,
    /// false -> true
    Down,
    /// true -> true
    Held,
    /// true -> false
    Up,
}

impl EdgeState {
    pub fn from_samples(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, false) => Self::Idle,
            (false, true) => Self::Down,
            (true, true) => Self::Held,
            (true, false) => Self::Up,
        }
    }

    /// The dispatchable edge, `None` for Idle
    pub fn edge(self) -> Option<ButtonEdge> {
        match self {
            Self::Idle => None,
            Self::Down => Some(ButtonEdge::Down),
            Self::Held => Some(ButtonEdge::Held),
            Self::Up => Some(ButtonEdge::Up),
        }
    }
}

/// Edges that reach handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ButtonEdge {
    Down,
    Held,
    Up,
}

impl ButtonEdge {
    /// Suffix of the handler name; Held handlers carry none
    pub fn handler_suffix(self) -> &'static str {
        match self {
            Self::Down => "Down",
            Self::Held => "",
            Self::Up => "Up",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Hand {
    Left,
    #[default]
    Right,
}

/// Process-unique identity of a controller module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u64);

static NEXT_MODULE_ID: AtomicU64 = AtomicU64::new(1);

impl ModuleId {
    pub fn next() -> Self {
        Self(NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Tracked pose of a controller in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// XR runtime the generic XR mapping is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum XrSystem {
    #[default]
    None,
    Cv1,
    Vive,
    WindowsMr,
    GearVr,
    Daydream,
}

impl XrSystem {
    /// Systems that need the OVR runtime present
    pub fn requires_ovr(self) -> bool {
        matches!(self, Self::Cv1 | Self::GearVr)
    }

    pub fn requires_daydream(self) -> bool {
        matches!(self, Self::Daydream)
    }
}

impl fmt::Display for XrSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Cv1 => "CV1",
            Self::Vive => "Vive",
            Self::WindowsMr => "WindowsMR",
            Self::GearVr => "GearVR",
            Self::Daydream => "Daydream",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFamily {
    Daydream,
    GenericXr,
    OculusTouch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_table_is_total() {
        assert_eq!(EdgeState::from_samples(false, false), EdgeState::Idle);
        assert_eq!(EdgeState::from_samples(false, true), EdgeState::Down);
        assert_eq!(EdgeState::from_samples(true, true), EdgeState::Held);
        assert_eq!(EdgeState::from_samples(true, false), EdgeState::Up);
        assert_eq!(EdgeState::Idle.edge(), None);
    }

    #[test]
    fn module_ids_are_unique() {
        let a = ModuleId::next();
        let b = ModuleId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }
}
