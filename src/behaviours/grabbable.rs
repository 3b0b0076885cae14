//! Grabbable object driven by the global trigger press set
//!
//! Down inside the bounds grabs, Held follows the grabbing module keeping the grab
//! offset in controller space, Up releases. Only one module holds the object at a
//! time; the others are ignored until it is released.

use crate::dispatch::{Capability, EventHandler, InteractionEventData, Interactable, Scope};
use crate::input::{ButtonChannel, ButtonEdge, LogicalButton, ModuleId};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y && d.z <= self.half_extents.z
    }
}

/// Shared view of a grabbable's pose and holder
#[derive(Debug, Clone, PartialEq)]
pub struct GrabState {
    pub bounds: Aabb,
    pub grabbed_by: Option<ModuleId>,
    /// Object position relative to the grabbing controller, in controller space
    offset: Vec3,
}

impl GrabState {
    pub fn position(&self) -> Vec3 {
        self.bounds.center
    }

    pub fn is_grabbed(&self) -> bool {
        self.grabbed_by.is_some()
    }
}

pub type GrabHandle = Arc<Mutex<GrabState>>;

pub struct Grabbable {
    name: String,
    state: GrabHandle,
}

impl Grabbable {
    pub fn new(name: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(GrabState {
                bounds,
                grabbed_by: None,
                offset: Vec3::ZERO,
            })),
        }
    }

    /// Installs a grabbable on `target` and returns its shared state
    pub fn attach(target: &Interactable, bounds: Aabb) -> GrabHandle {
        let grabbable = Self::new(target.name(), bounds);
        let handle = grabbable.state();
        target.add_handler(Box::new(grabbable));
        handle
    }

    pub fn state(&self) -> GrabHandle {
        self.state.clone()
    }

    fn grab(&self, state: &mut GrabState, data: &InteractionEventData) {
        let controller = data.pose.position;
        if state.grabbed_by.is_some() || !state.bounds.contains(controller) {
            return;
        }
        state.grabbed_by = Some(data.module);
        state.offset = inverse(data.pose.rotation) * (state.bounds.center - controller);
        info!("{} grabbed by {}", self.name, data.module);
    }

    fn follow(&self, state: &mut GrabState, data: &InteractionEventData) {
        if state.grabbed_by == Some(data.module) {
            state.bounds.center = data.pose.position + data.pose.rotation * state.offset;
        }
    }

    fn release(&self, state: &mut GrabState, data: &InteractionEventData) {
        if state.grabbed_by == Some(data.module) {
            state.grabbed_by = None;
            state.offset = Vec3::ZERO;
            debug!("{} released by {}", self.name, data.module);
        }
    }
}

fn inverse(rotation: Quat) -> Quat {
    rotation.normalize().inverse()
}

impl EventHandler for Grabbable {
    fn on_event(&mut self, capability: Capability, data: &InteractionEventData) -> bool {
        let Capability::Button {
            scope: Scope::Global,
            button: LogicalButton::Trigger,
            channel: ButtonChannel::Press,
            edge,
        } = capability
        else {
            return false;
        };

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match edge {
            ButtonEdge::Down => self.grab(&mut state, data),
            ButtonEdge::Held => self.follow(&mut state, data),
            ButtonEdge::Up => self.release(&mut state, data),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Hand, Pose};

    fn event(module: ModuleId, position: Vec3, rotation: Quat) -> InteractionEventData {
        let mut data = InteractionEventData::new(module, Hand::Right);
        data.pose = Pose { position, rotation };
        data
    }

    fn cap(edge: ButtonEdge) -> Capability {
        Capability::for_button(Scope::Global, LogicalButton::Trigger, ButtonChannel::Press, edge)
    }

    #[test]
    fn grab_follows_and_releases() {
        let module = ModuleId::next();
        let mut grabbable = Grabbable::new("cube", Aabb::new(Vec3::ZERO, Vec3::splat(0.5)));
        let state = grabbable.state();

        grabbable.on_event(cap(ButtonEdge::Down), &event(module, Vec3::new(0.2, 0.0, 0.0), Quat::IDENTITY));
        assert_eq!(state.lock().unwrap().grabbed_by, Some(module));

        grabbable.on_event(cap(ButtonEdge::Held), &event(module, Vec3::new(1.2, 0.0, 0.0), Quat::IDENTITY));
        let position = state.lock().unwrap().position();
        assert!((position - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);

        grabbable.on_event(cap(ButtonEdge::Up), &event(module, Vec3::new(1.2, 0.0, 0.0), Quat::IDENTITY));
        assert!(!state.lock().unwrap().is_grabbed());
    }

    #[test]
    fn outside_bounds_or_second_module_is_ignored() {
        let first = ModuleId::next();
        let second = ModuleId::next();
        let mut grabbable = Grabbable::new("cube", Aabb::new(Vec3::ZERO, Vec3::splat(0.5)));
        let state = grabbable.state();

        grabbable.on_event(cap(ButtonEdge::Down), &event(first, Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY));
        assert!(!state.lock().unwrap().is_grabbed());

        grabbable.on_event(cap(ButtonEdge::Down), &event(first, Vec3::ZERO, Quat::IDENTITY));
        grabbable.on_event(cap(ButtonEdge::Down), &event(second, Vec3::ZERO, Quat::IDENTITY));
        grabbable.on_event(cap(ButtonEdge::Up), &event(second, Vec3::ZERO, Quat::IDENTITY));
        assert_eq!(state.lock().unwrap().grabbed_by, Some(first));
    }

    #[test]
    fn rotation_carries_offset() {
        let module = ModuleId::next();
        let mut grabbable = Grabbable::new("cube", Aabb::new(Vec3::new(0.0, 0.0, 0.3), Vec3::splat(0.5)));
        let state = grabbable.state();

        grabbable.on_event(cap(ButtonEdge::Down), &event(module, Vec3::ZERO, Quat::IDENTITY));
        let quarter = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        grabbable.on_event(cap(ButtonEdge::Held), &event(module, Vec3::ZERO, quarter));
        let position = state.lock().unwrap().position();
        assert!((position - Vec3::new(0.3, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn other_capabilities_are_not_handled() {
        let mut grabbable = Grabbable::new("cube", Aabb::new(Vec3::ZERO, Vec3::ONE));
        let pointer = Capability::for_button(
            Scope::Pointer,
            LogicalButton::Trigger,
            ButtonChannel::Press,
            ButtonEdge::Down,
        );
        assert!(!grabbable.on_event(pointer, &event(ModuleId::next(), Vec3::ZERO, Quat::IDENTITY)));
    }
}
