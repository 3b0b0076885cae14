//! Holdable object toggled by a configurable global press
//!
//! A press Down of the configured button inside the bounds picks the object up; the
//! next Down from the same module puts it back. While held the object copies the
//! holding module's pose on every event that module dispatches. Hosts call
//! [`HoldState::release`] when the object itself is disabled.

use super::grabbable::Aabb;
use crate::dispatch::{canonical, Capability, EventHandler, InteractionEventData, Interactable, Scope};
use crate::input::{ButtonChannel, ButtonEdge, LogicalButton, ModuleId};
use glam::{Quat, Vec3};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct HoldState {
    pub bounds: Aabb,
    pub rotation: Quat,
    pub held_by: Option<ModuleId>,
}

impl HoldState {
    pub fn position(&self) -> Vec3 {
        self.bounds.center
    }

    pub fn is_held(&self) -> bool {
        self.held_by.is_some()
    }

    /// Drops the object where it is; returns whether it was held
    pub fn release(&mut self) -> bool {
        self.held_by.take().is_some()
    }
}

pub type HoldHandle = Arc<Mutex<HoldState>>;

pub struct Holdable {
    name: String,
    button: LogicalButton,
    state: HoldHandle,
}

impl Holdable {
    pub fn new(name: impl Into<String>, button: LogicalButton, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            button: canonical(button),
            state: Arc::new(Mutex::new(HoldState {
                bounds,
                rotation: Quat::IDENTITY,
                held_by: None,
            })),
        }
    }

    /// Installs a holdable on `target` and returns its shared state
    pub fn attach(target: &Interactable, button: LogicalButton, bounds: Aabb) -> HoldHandle {
        let holdable = Self::new(target.name(), button, bounds);
        let handle = holdable.state();
        target.add_handler(Box::new(holdable));
        handle
    }

    pub fn state(&self) -> HoldHandle {
        self.state.clone()
    }

    pub fn button(&self) -> LogicalButton {
        self.button
    }

    fn is_toggle(&self, capability: Capability) -> bool {
        capability
            == Capability::Button {
                scope: Scope::Global,
                button: self.button,
                channel: ButtonChannel::Press,
                edge: ButtonEdge::Down,
            }
    }

    fn toggle(&self, state: &mut HoldState, data: &InteractionEventData) -> bool {
        match state.held_by {
            Some(holder) if holder == data.module => {
                state.release();
                debug!("{} put down by {}", self.name, data.module);
                true
            }
            Some(_) => false,
            None if state.bounds.contains(data.pose.position) => {
                state.held_by = Some(data.module);
                follow(state, data);
                info!("{} picked up by {}", self.name, data.module);
                true
            }
            None => false,
        }
    }
}

fn follow(state: &mut HoldState, data: &InteractionEventData) {
    state.bounds.center = data.pose.position;
    state.rotation = data.pose.rotation;
}

impl EventHandler for Holdable {
    fn on_event(&mut self, capability: Capability, data: &InteractionEventData) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_toggle(capability) && self.toggle(&mut state, data) {
            return true;
        }
        if state.held_by == Some(data.module) {
            follow(&mut state, data);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Hand, Pose};

    fn event(module: ModuleId, position: Vec3) -> InteractionEventData {
        let mut data = InteractionEventData::new(module, Hand::Left);
        data.pose = Pose {
            position,
            rotation: Quat::from_rotation_x(0.25),
        };
        data
    }

    fn press(button: LogicalButton, edge: ButtonEdge) -> Capability {
        Capability::for_button(Scope::Global, button, ButtonChannel::Press, edge)
    }

    #[test]
    fn press_toggles_hold_and_copies_pose() {
        let module = ModuleId::next();
        let mut holdable = Holdable::new("torch", LogicalButton::Grip, Aabb::new(Vec3::ZERO, Vec3::splat(0.3)));
        let state = holdable.state();

        assert!(holdable.on_event(press(LogicalButton::Grip, ButtonEdge::Down), &event(module, Vec3::new(0.1, 0.0, 0.0))));
        assert_eq!(state.lock().unwrap().held_by, Some(module));
        assert_eq!(state.lock().unwrap().position(), Vec3::new(0.1, 0.0, 0.0));

        // Up and other buttons from the holder still move it
        holdable.on_event(press(LogicalButton::Grip, ButtonEdge::Up), &event(module, Vec3::new(2.0, 1.0, 0.0)));
        holdable.on_event(press(LogicalButton::A, ButtonEdge::Down), &event(module, Vec3::new(3.0, 1.0, 0.0)));
        {
            let held = state.lock().unwrap();
            assert!(held.is_held());
            assert_eq!(held.position(), Vec3::new(3.0, 1.0, 0.0));
            assert_eq!(held.rotation, Quat::from_rotation_x(0.25));
        }

        // Second press Down from the holder puts it down, even outside the bounds
        holdable.on_event(press(LogicalButton::Grip, ButtonEdge::Down), &event(module, Vec3::new(4.0, 1.0, 0.0)));
        assert!(!state.lock().unwrap().is_held());
        assert_eq!(state.lock().unwrap().position(), Vec3::new(3.0, 1.0, 0.0));
    }

    #[test]
    fn other_buttons_and_modules_are_ignored() {
        let first = ModuleId::next();
        let second = ModuleId::next();
        let mut holdable = Holdable::new("torch", LogicalButton::Grip, Aabb::new(Vec3::ZERO, Vec3::splat(0.3)));
        let state = holdable.state();

        assert!(!holdable.on_event(press(LogicalButton::Trigger, ButtonEdge::Down), &event(first, Vec3::ZERO)));
        assert!(!holdable.on_event(press(LogicalButton::Grip, ButtonEdge::Down), &event(first, Vec3::splat(1.0))));
        assert!(!state.lock().unwrap().is_held());

        holdable.on_event(press(LogicalButton::Grip, ButtonEdge::Down), &event(first, Vec3::ZERO));
        assert!(!holdable.on_event(press(LogicalButton::Grip, ButtonEdge::Down), &event(second, Vec3::ZERO)));
        assert_eq!(state.lock().unwrap().held_by, Some(first));
    }

    #[test]
    fn daydream_app_button_maps_to_menu() {
        let module = ModuleId::next();
        let mut holdable = Holdable::new("map", LogicalButton::AppButton, Aabb::new(Vec3::ZERO, Vec3::ONE));
        assert_eq!(holdable.button(), LogicalButton::Menu);
        assert!(holdable.on_event(press(LogicalButton::AppButton, ButtonEdge::Down), &event(module, Vec3::ZERO)));
    }

    #[test]
    fn release_drops_in_place() {
        let module = ModuleId::next();
        let mut holdable = Holdable::new("torch", LogicalButton::Trigger, Aabb::new(Vec3::ZERO, Vec3::ONE));
        let state = holdable.state();
        holdable.on_event(press(LogicalButton::Trigger, ButtonEdge::Down), &event(module, Vec3::new(0.5, 0.0, 0.0)));

        assert!(state.lock().unwrap().release());
        assert!(!state.lock().unwrap().release());
        assert_eq!(state.lock().unwrap().position(), Vec3::new(0.5, 0.0, 0.0));
        assert!(!holdable.on_event(press(LogicalButton::Trigger, ButtonEdge::Held), &event(module, Vec3::ZERO)));
    }
}
