//! Router configuration
//!
//! Stored as TOML under `~/.config/xrinput/config.toml`. A missing file is replaced
//! by the defaults, which are written back so the user has something to edit.
//!
//! ```toml
//! [router]
//! frame_interval_ms = 11
//! stats_interval_s = 30
//!
//! [thresholds]
//! press = 0.5
//! touch = 0.0
//! click = 1.0
//! direction = 0.5
//! deadzone = 0.0
//!
//! [sdk]
//! system = "Vive"
//! ovr = false
//! daydream = false
//!
//! [[modules]]
//! name = "left"
//! family = "GenericXr"
//! hand = "Left"
//! ```

use crate::input::{DeviceFamily, Hand, Thresholds, XrSystem};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".config/xrinput";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Module name must not be empty")]
    EmptyModuleName,

    #[error("Duplicate module name: {0}")]
    DuplicateModule(String),

    #[error("System {0} requires an SDK that is not available")]
    SdkUnavailable(XrSystem),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RouterSettings {
    /// Replay frame interval; 0 runs frames back to back
    pub frame_interval_ms: u64,
    pub stats_interval_s: i64,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 11, // ~90 Hz headset refresh
            stats_interval_s: 30,
        }
    }
}

/// Which vendor runtimes are present
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct SdkSupport {
    pub system: XrSystem,
    pub ovr: bool,
    pub daydream: bool,
}

impl Default for SdkSupport {
    fn default() -> Self {
        Self {
            system: XrSystem::Vive,
            ovr: false,
            daydream: false,
        }
    }
}

impl SdkSupport {
    pub fn allows(&self, system: XrSystem) -> bool {
        (!system.requires_ovr() || self.ovr) && (!system.requires_daydream() || self.daydream)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ModuleConfig {
    pub name: String,
    pub family: DeviceFamily,
    #[serde(default)]
    pub hand: Hand,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ModuleConfig {
    pub fn new(name: impl Into<String>, family: DeviceFamily, hand: Hand) -> Self {
        Self {
            name: name.into(),
            family,
            hand,
            enabled: true,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    pub router: RouterSettings,
    pub thresholds: Thresholds,
    pub sdk: SdkSupport,
    pub modules: Vec<ModuleConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            router: RouterSettings::default(),
            thresholds: Thresholds::default(),
            sdk: SdkSupport::default(),
            modules: vec![
                ModuleConfig::new("left", DeviceFamily::GenericXr, Hand::Left),
                ModuleConfig::new("right", DeviceFamily::GenericXr, Hand::Right),
            ],
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if ![t.press, t.touch, t.click, t.direction].into_iter().all(in_unit) {
            return Err(ConfigError::InvalidThresholds(
                "values must lie in [0, 1]".to_string(),
            ));
        }
        if t.touch >= t.press || t.press > t.click {
            return Err(ConfigError::InvalidThresholds(format!(
                "expected touch < press <= click, got {} / {} / {}",
                t.touch, t.press, t.click
            )));
        }
        // A zero direction threshold reads a centred stick as pressed
        if t.direction <= 0.0 {
            return Err(ConfigError::InvalidThresholds(format!(
                "direction threshold must be positive, got {}",
                t.direction
            )));
        }
        if !(0.0..1.0).contains(&t.deadzone) {
            return Err(ConfigError::InvalidThresholds(format!(
                "deadzone {} outside [0, 1)",
                t.deadzone
            )));
        }

        let mut names = HashSet::new();
        for module in &self.modules {
            if module.name.trim().is_empty() {
                return Err(ConfigError::EmptyModuleName);
            }
            if !names.insert(module.name.as_str()) {
                return Err(ConfigError::DuplicateModule(module.name.clone()));
            }
        }

        if !self.sdk.allows(self.sdk.system) {
            return Err(ConfigError::SdkUnavailable(self.sdk.system));
        }
        Ok(())
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| eyre!("Failed to parse config: {}", e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid config: {}", e))?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config = Self::from_toml(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !tokio::fs::try_exists(parent)
                .await
                .map_err(|e| eyre!("Failed to check if config directory exists: {}", e))?
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
            }
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// Loads `path`, writing the defaults there first if it does not exist
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            Self::load(path).await
        } else {
            info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save(path).await?;
            Ok(config)
        }
    }
}

pub fn default_config_path() -> PathBuf {
    let mut path = get_home_dir();
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}
