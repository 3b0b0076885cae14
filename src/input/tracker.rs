//! Edge detection per (button, channel)
//!
//! The tracker only remembers one bit per pair: whether the button was down last
//! frame. Down and Held are mutually exclusive because exactly one `EdgeState` is
//! derived from each sample.

use super::types::{ButtonChannel, EdgeState, LogicalButton};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Thresholds turning analog values into button booleans
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Press channel: value >= press
    pub press: f32,
    /// Touch channel: value > touch
    pub touch: f32,
    /// Click fires when the axis reaches this value
    pub click: f32,
    /// Thumbstick directions: |axis| >= direction
    pub direction: f32,
    /// Deadzone applied to 2D axes before anything else
    pub deadzone: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            press: 0.5,
            touch: 0.0,
            click: 1.0,
            direction: 0.5,
            deadzone: 0.0,
        }
    }
}

impl Thresholds {
    pub fn pressed(&self, value: f32) -> bool {
        value >= self.press
    }

    pub fn touched(&self, value: f32) -> bool {
        value > self.touch
    }
}

#[derive(Debug, Default, Clone)]
pub struct ButtonStateTracker {
    previous: HashMap<(LogicalButton, ButtonChannel), bool>,
}

impl ButtonStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds this frame's boolean for one pair and returns the derived edge
    pub fn sample(&mut self, button: LogicalButton, channel: ButtonChannel, raw: bool) -> EdgeState {
        let previous = self.previous.insert((button, channel), raw).unwrap_or(false);
        let edge = EdgeState::from_samples(previous, raw);
        if edge != EdgeState::Idle {
            trace!("{} {} -> {:?}", button, channel, edge);
        }
        edge
    }

    pub fn is_down(&self, button: LogicalButton, channel: ButtonChannel) -> bool {
        self.previous
            .get(&(button, channel))
            .copied()
            .unwrap_or(false)
    }

    /// Pairs currently reported as down
    pub fn down_pairs(&self) -> impl Iterator<Item = (LogicalButton, ButtonChannel)> + '_ {
        self.previous
            .iter()
            .filter(|(_, down)| **down)
            .map(|(pair, _)| *pair)
    }

    pub fn reset(&mut self) {
        self.previous.clear();
    }
}

/// Fires once when an axis reaches the click value from below
#[derive(Debug, Default, Clone)]
pub struct ClickDetector {
    last: HashMap<LogicalButton, f32>,
}

impl ClickDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, button: LogicalButton, value: f32, click: f32) -> bool {
        let previous = self.last.insert(button, value).unwrap_or(0.0);
        previous < click && value >= click
    }

    pub fn reset(&mut self) {
        self.last.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_sweep_produces_three_stage_gesture() {
        let thresholds = Thresholds::default();
        let mut tracker = ButtonStateTracker::new();
        let mut clicks = ClickDetector::new();

        let mut press = Vec::new();
        let mut touch = Vec::new();
        let mut clicked = Vec::new();
        for value in [0.0, 0.3, 0.6, 1.0, 0.4] {
            press.push(tracker.sample(
                LogicalButton::Trigger,
                ButtonChannel::Press,
                thresholds.pressed(value),
            ));
            touch.push(tracker.sample(
                LogicalButton::Trigger,
                ButtonChannel::Touch,
                thresholds.touched(value),
            ));
            clicked.push(clicks.sample(LogicalButton::Trigger, value, thresholds.click));
        }

        use EdgeState::*;
        assert_eq!(press, vec![Idle, Idle, Down, Held, Up]);
        assert_eq!(touch, vec![Idle, Down, Held, Held, Held]);
        let down: Vec<_> = tracker.down_pairs().collect();
        assert_eq!(down, vec![(LogicalButton::Trigger, ButtonChannel::Touch)]);
        assert_eq!(clicked, vec![false, false, false, true, false]);
    }

    #[test]
    fn click_does_not_repeat_while_at_max() {
        let mut clicks = ClickDetector::new();
        assert!(clicks.sample(LogicalButton::Grip, 1.0, 1.0));
        assert!(!clicks.sample(LogicalButton::Grip, 1.0, 1.0));
        assert!(!clicks.sample(LogicalButton::Grip, 0.9, 1.0));
        assert!(clicks.sample(LogicalButton::Grip, 1.0, 1.0));
    }

    #[test]
    fn reset_forgets_held_buttons() {
        let mut tracker = ButtonStateTracker::new();
        tracker.sample(LogicalButton::A, ButtonChannel::Press, true);
        assert!(tracker.is_down(LogicalButton::A, ButtonChannel::Press));
        tracker.reset();
        assert_eq!(
            tracker.sample(LogicalButton::A, ButtonChannel::Press, true),
            EdgeState::Down
        );
    }
}
