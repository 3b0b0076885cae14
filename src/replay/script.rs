//! Session scripts
//!
//! A script declares the targets of a scene and a list of frames. Each frame may
//! change module or target state before it runs and supplies raw input per module.
//! A module's input is sticky: it stays as last given until a frame replaces it.
//!
//! ```toml
//! delta_time = 0.011
//!
//! [[targets]]
//! name = "cube"
//! global = true
//! grabbable = { center = [0.0, 0.0, 0.0], half_extents = [0.2, 0.2, 0.2] }
//!
//! [[frames]]
//! [frames.input.right]
//! raycast = "cube"
//! axes = { RTrigger = 0.8 }
//! pose = { position = [0.0, 0.0, 0.0], rotation = [0.0, 0.0, 0.0, 1.0] }
//! ```

use crate::behaviours::Aabb;
use crate::input::{LogicalButton, Pose, RawInputFrame, XrSystem};
use color_eyre::{eyre::eyre, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub name: String,
    /// Register as a global receiver
    #[serde(default)]
    pub global: bool,
    /// Only accept input from this module
    #[serde(default)]
    pub affinity: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Log every capability the target receives
    #[serde(default = "default_true")]
    pub log: bool,
    #[serde(default)]
    pub grabbable: Option<Aabb>,
    #[serde(default)]
    pub holdable: Option<HoldableSpec>,
    /// Hit point reported when the pointer is on this target
    #[serde(default)]
    pub hit_point: Option<Vec3>,
}

fn default_true() -> bool {
    true
}

/// Toggle button and bounds of a holdable target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldableSpec {
    #[serde(default = "default_hold_button")]
    pub button: LogicalButton,
    pub bounds: Aabb,
}

fn default_hold_button() -> LogicalButton {
    LogicalButton::Trigger
}

/// Raw input plus what the pointer hits, for one module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleFrame {
    pub raycast: Option<String>,
    pub buttons: HashMap<String, bool>,
    pub axes: HashMap<String, f32>,
    pub pose: Option<Pose>,
    pub tracked: Option<bool>,
    pub unavailable: bool,
}

impl ModuleFrame {
    pub fn raw(&self) -> RawInputFrame {
        RawInputFrame {
            buttons: self.buttons.clone(),
            axes: self.axes.clone(),
            pose: self.pose,
            tracked: self.tracked,
            unavailable: self.unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSpec {
    /// Number of consecutive frames this entry produces
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    #[serde(default)]
    pub enable: Vec<String>,
    #[serde(default)]
    pub disable: Vec<String>,
    #[serde(default)]
    pub system: Option<XrSystem>,
    /// Targets whose active flag is set to false / true
    #[serde(default)]
    pub deactivate: Vec<String>,
    #[serde(default)]
    pub activate: Vec<String>,
    #[serde(default)]
    pub unregister: Vec<String>,
    #[serde(default)]
    pub input: HashMap<String, ModuleFrame>,
}

fn default_repeat() -> u32 {
    1
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self {
            repeat: 1,
            enable: Vec::new(),
            disable: Vec::new(),
            system: None,
            deactivate: Vec::new(),
            activate: Vec::new(),
            unregister: Vec::new(),
            input: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    #[serde(default = "default_delta_time")]
    pub delta_time: f32,
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
    #[serde(default)]
    pub frames: Vec<FrameSpec>,
}

fn default_delta_time() -> f32 {
    1.0 / 90.0
}

impl SessionScript {
    pub fn from_toml(content: &str) -> Result<Self> {
        let script: Self =
            toml::from_str(content).map_err(|e| eyre!("Failed to parse session script: {}", e))?;
        if script.delta_time <= 0.0 {
            return Err(eyre!("delta_time must be positive, got {}", script.delta_time));
        }
        if let Some(index) = script.frames.iter().position(|f| f.repeat == 0) {
            return Err(eyre!("Frame entry {} has repeat = 0", index));
        }
        let mut seen = std::collections::HashSet::new();
        for target in &script.targets {
            if !seen.insert(target.name.as_str()) {
                return Err(eyre!("Duplicate target name: {}", target.name));
            }
        }
        debug!(
            "Parsed session script: {} targets, {} frame entries",
            script.targets.len(),
            script.frames.len()
        );
        Ok(script)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read session script {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    /// Frames the script expands to
    pub fn frame_count(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.repeat)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets_and_frames() {
        let script = SessionScript::from_toml(
            r#"
            [[targets]]
            name = "cube"
            global = true
            affinity = "right"
            grabbable = { center = [0.0, 1.0, 0.0], half_extents = [0.1, 0.1, 0.1] }

            [[frames]]
            repeat = 3
            [frames.input.right]
            raycast = "cube"
            axes = { RTrigger = 0.8 }
            buttons = { JoystickButton0 = true }

            [[frames]]
            disable = ["right"]
            "#,
        )
        .unwrap();

        assert_eq!(script.targets[0].affinity.as_deref(), Some("right"));
        assert!(script.targets[0].log);
        assert_eq!(
            script.targets[0].grabbable.map(|b| b.center),
            Some(Vec3::new(0.0, 1.0, 0.0))
        );
        assert_eq!(script.frame_count(), 4);
        let right = &script.frames[0].input["right"];
        assert_eq!(right.raw().axes["RTrigger"], 0.8);
        assert!(right.raw().buttons["JoystickButton0"]);
        assert_eq!(script.frames[1].disable, vec!["right".to_string()]);
    }

    #[test]
    fn holdable_button_defaults_to_trigger() {
        let script = SessionScript::from_toml(
            r#"
            [[targets]]
            name = "torch"
            holdable = { bounds = { center = [0.0, 0.0, 0.0], half_extents = [0.1, 0.1, 0.1] } }

            [[targets]]
            name = "map"
            holdable = { button = "Grip", bounds = { center = [1.0, 0.0, 0.0], half_extents = [0.1, 0.1, 0.1] } }
            "#,
        )
        .unwrap();
        assert_eq!(script.targets[0].holdable.map(|h| h.button), Some(LogicalButton::Trigger));
        assert_eq!(script.targets[1].holdable.map(|h| h.button), Some(LogicalButton::Grip));
    }

    #[test]
    fn zero_repeat_is_rejected() {
        let result = SessionScript::from_toml(
            r#"
            [[frames]]
            repeat = 0
            disable = ["right"]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let result = SessionScript::from_toml(
            r#"
            [[targets]]
            name = "a"
            [[targets]]
            name = "a"
            "#,
        );
        assert!(result.is_err());
    }
}
