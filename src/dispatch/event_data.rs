//! Per-module interaction record handed to every handler

use super::pairing::PairingTable;
use super::target::TargetHandle;
use crate::input::{AxisSample, ButtonChannel, Hand, LogicalButton, ModuleId, Pose};
use glam::{Vec2, Vec3};

/// What the pointer hit this frame
#[derive(Debug, Clone)]
pub struct RaycastHit {
    pub target: TargetHandle,
    pub world_position: Vec3,
    pub world_normal: Vec3,
}

impl RaycastHit {
    pub fn new(target: TargetHandle) -> Self {
        Self {
            target,
            world_position: Vec3::ZERO,
            world_normal: Vec3::Z,
        }
    }

    pub fn at(mut self, world_position: Vec3, world_normal: Vec3) -> Self {
        self.world_position = world_position;
        self.world_normal = world_normal;
        self
    }
}

/// Interaction state of one controller module
///
/// Created with the module, updated every frame and cleared by [`reset`] when the
/// module is disabled. Module and hand identity survive a reset.
///
/// [`reset`]: InteractionEventData::reset
#[derive(Debug, Clone)]
pub struct InteractionEventData {
    pub module: ModuleId,
    pub hand: Hand,
    /// Frame this record was last updated for
    pub frame: u64,
    pub delta_time: f32,
    pub current_raycast: Option<RaycastHit>,
    pub trigger: f32,
    pub grip: f32,
    pub touchpad: Vec2,
    pub thumbstick: Vec2,
    pub pose: Pose,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub is_tracked: bool,
    pairings: PairingTable,
}

impl InteractionEventData {
    pub fn new(module: ModuleId, hand: Hand) -> Self {
        Self {
            module,
            hand,
            frame: 0,
            delta_time: 0.0,
            current_raycast: None,
            trigger: 0.0,
            grip: 0.0,
            touchpad: Vec2::ZERO,
            thumbstick: Vec2::ZERO,
            pose: Pose::default(),
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            is_tracked: false,
            pairings: PairingTable::new(),
        }
    }

    pub fn current_target(&self) -> Option<&TargetHandle> {
        self.current_raycast.as_ref().map(|hit| &hit.target)
    }

    /// Target a button went down on, if still bound
    pub fn bound_target(&self, button: LogicalButton, channel: ButtonChannel) -> Option<TargetHandle> {
        self.pairings.get(button, channel)
    }

    pub fn pairings(&self) -> &PairingTable {
        &self.pairings
    }

    pub(crate) fn pairings_mut(&mut self) -> &mut PairingTable {
        &mut self.pairings
    }

    pub(crate) fn apply_axes(&mut self, axes: &AxisSample) {
        self.trigger = axes.trigger;
        self.grip = axes.grip;
        self.touchpad = axes.touchpad;
        self.thumbstick = axes.thumbstick;
    }

    pub fn axes(&self) -> AxisSample {
        AxisSample {
            trigger: self.trigger,
            grip: self.grip,
            touchpad: self.touchpad,
            thumbstick: self.thumbstick,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.module, self.hand);
    }

    /// True when nothing but identity is set
    pub fn is_cleared(&self) -> bool {
        self.frame == 0
            && self.current_raycast.is_none()
            && self.trigger == 0.0
            && self.grip == 0.0
            && self.touchpad == Vec2::ZERO
            && self.thumbstick == Vec2::ZERO
            && self.velocity == Vec3::ZERO
            && self.acceleration == Vec3::ZERO
            && !self.is_tracked
            && self.pairings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::target::Interactable;

    #[test]
    fn reset_keeps_identity_only() {
        let module = ModuleId::next();
        let target = Interactable::new("t");
        let mut data = InteractionEventData::new(module, Hand::Left);
        data.frame = 12;
        data.trigger = 0.7;
        data.is_tracked = true;
        data.current_raycast = Some(RaycastHit::new(target.clone()));
        data.pairings_mut()
            .bind(LogicalButton::Trigger, ButtonChannel::Press, &target);
        assert!(!data.is_cleared());
        assert_eq!(data.axes().trigger, 0.7);

        data.reset();
        assert!(data.is_cleared());
        assert_eq!(data.axes().trigger, 0.0);
        assert_eq!(data.module, module);
        assert_eq!(data.hand, Hand::Left);
    }
}
