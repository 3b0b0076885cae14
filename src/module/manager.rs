//! Manager for all controller modules of a session
//!
//! Owns the modules, drives them once per frame and switches the XR runtime the
//! generic XR modules are mapped for. Modules move between their typestates inside
//! [`ModuleSlot`]; a slot is briefly emptied while a transition consumes the module.

use super::controller_module::{
    Active, ControllerModule, DeviceInput, FrameClock, FrameReport, Inactive, ModuleError,
};
use crate::config::{ModuleConfig, RouterConfig, SdkSupport};
use crate::device::{adapter_for, DeviceAdapter};
use crate::dispatch::ReceiverRegistry;
use crate::input::{DeviceFamily, ModuleId, Thresholds, XrSystem};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("Module error: {0}")]
    ModuleError(#[from] ModuleError),

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Module already exists: {0}")]
    DuplicateModule(String),

    #[error("System {0} requires an SDK that is not available")]
    SdkUnavailable(XrSystem),
}

pub enum ModuleSlot {
    Inactive(ControllerModule<Inactive>),
    Active(ControllerModule<Active>),
}

impl ModuleSlot {
    pub fn id(&self) -> ModuleId {
        match self {
            Self::Inactive(m) => m.id(),
            Self::Active(m) => m.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Inactive(m) => m.name(),
            Self::Active(m) => m.name(),
        }
    }

    pub fn family(&self) -> DeviceFamily {
        match self {
            Self::Inactive(m) => m.family(),
            Self::Active(m) => m.family(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn as_active(&self) -> Option<&ControllerModule<Active>> {
        match self {
            Self::Active(m) => Some(m),
            Self::Inactive(_) => None,
        }
    }
}

pub struct InputRouter {
    registry: ReceiverRegistry,
    thresholds: Thresholds,
    sdk: SdkSupport,
    system: XrSystem,
    modules: Vec<Option<ModuleSlot>>,
}

impl InputRouter {
    pub fn new(registry: ReceiverRegistry, thresholds: Thresholds, sdk: SdkSupport) -> Self {
        info!("Creating input router for {}", sdk.system);
        Self {
            registry,
            thresholds,
            system: sdk.system,
            sdk,
            modules: Vec::new(),
        }
    }

    /// Builds the router and every configured module
    pub fn from_config(config: &RouterConfig, registry: ReceiverRegistry) -> Result<Self, RouterError> {
        let mut router = Self::new(registry, config.thresholds, config.sdk);
        for module in &config.modules {
            router.add_configured(module)?;
        }
        Ok(router)
    }

    pub fn registry(&self) -> &ReceiverRegistry {
        &self.registry
    }

    pub fn system(&self) -> XrSystem {
        self.system
    }

    fn add_configured(&mut self, config: &ModuleConfig) -> Result<ModuleId, RouterError> {
        let adapter = adapter_for(config.family, config.hand, self.system);
        let id = self.add_module(config.name.clone(), adapter)?;
        if config.enabled {
            self.enable(&config.name)?;
        }
        Ok(id)
    }

    /// Adds an inactive module
    pub fn add_module(
        &mut self,
        name: impl Into<String>,
        adapter: Box<dyn DeviceAdapter>,
    ) -> Result<ModuleId, RouterError> {
        let name = name.into();
        if self.position(&name).is_some() {
            return Err(RouterError::DuplicateModule(name));
        }
        let module = ControllerModule::create(name, adapter, self.registry.clone(), self.thresholds);
        let id = module.id();
        self.modules.push(Some(ModuleSlot::Inactive(module)));
        Ok(id)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleSlot> {
        self.modules
            .iter()
            .flatten()
            .find(|slot| slot.name() == name)
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.module(name).map(ModuleSlot::id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleSlot> {
        self.modules.iter().flatten()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.modules
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| s.name() == name))
    }

    /// Enabling an active module is a no-op
    pub fn enable(&mut self, name: &str) -> Result<(), RouterError> {
        let index = self
            .position(name)
            .ok_or_else(|| RouterError::UnknownModule(name.to_string()))?;
        let slot = self.modules[index].take();
        self.modules[index] = match slot {
            Some(ModuleSlot::Inactive(module)) => Some(ModuleSlot::Active(module.enable())),
            other => other,
        };
        Ok(())
    }

    /// Disables a module; returns the forced releases it produced
    pub fn disable(&mut self, name: &str) -> Result<Option<FrameReport>, RouterError> {
        let index = self
            .position(name)
            .ok_or_else(|| RouterError::UnknownModule(name.to_string()))?;
        let slot = self.modules[index].take();
        let (slot, report) = match slot {
            Some(ModuleSlot::Active(module)) => {
                let (module, report) = module.disable();
                (Some(ModuleSlot::Inactive(module)), Some(report))
            }
            other => (other, None),
        };
        self.modules[index] = slot;
        Ok(report)
    }

    /// Processes every active module once
    ///
    /// Modules without an entry in `inputs` see neutral input. Stops at the first
    /// failing module.
    pub fn process_frame(
        &mut self,
        clock: FrameClock,
        inputs: &HashMap<String, DeviceInput>,
    ) -> Result<Vec<FrameReport>, RouterError> {
        let neutral = DeviceInput::default();
        let mut reports = Vec::new();
        for slot in self.modules.iter_mut().flatten() {
            if let ModuleSlot::Active(module) = slot {
                let input = inputs.get(module.name()).unwrap_or_else(|| {
                    debug!("No input for {} in frame {}", module.name(), clock.frame);
                    &neutral
                });
                match module.process(clock, input) {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        error!("Module {} failed in frame {}: {}", module.name(), clock.frame, e);
                        return Err(e.into());
                    }
                }
            }
        }
        Ok(reports)
    }

    /// Remaps generic XR modules for another runtime
    ///
    /// Active generic XR modules are disabled (releasing every press), remapped and
    /// enabled again. Other device families are left alone.
    pub fn switch_system(&mut self, system: XrSystem) -> Result<Vec<FrameReport>, RouterError> {
        if !self.sdk.allows(system) {
            warn!("Refusing to switch to {}: SDK not available", system);
            return Err(RouterError::SdkUnavailable(system));
        }
        if system == XrSystem::Daydream {
            warn!("Generic XR modules cannot be mapped for Daydream; only the system changes");
        }
        info!("Switching XR system from {} to {}", self.system, system);

        let mut reports = Vec::new();
        for index in 0..self.modules.len() {
            let Some(slot) = self.modules[index].take() else {
                continue;
            };
            if slot.family() != DeviceFamily::GenericXr || system == XrSystem::Daydream {
                self.modules[index] = Some(slot);
                continue;
            }
            let (mut module, was_active) = match slot {
                ModuleSlot::Active(module) => {
                    let (module, report) = module.disable();
                    reports.push(report);
                    (module, true)
                }
                ModuleSlot::Inactive(module) => (module, false),
            };
            let result = module.set_system(system);
            self.modules[index] = Some(if was_active {
                ModuleSlot::Active(module.enable())
            } else {
                ModuleSlot::Inactive(module)
            });
            result?;
        }
        self.system = system;
        self.sdk.system = system;
        Ok(reports)
    }

    /// Disables every active module
    pub fn shutdown(&mut self) -> Vec<FrameReport> {
        let names: Vec<String> = self
            .modules()
            .filter(|slot| slot.is_active())
            .map(|slot| slot.name().to_string())
            .collect();
        let mut reports = Vec::new();
        for name in names {
            match self.disable(&name) {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {}
                Err(e) => error!("Failed to disable {}: {}", name, e),
            }
        }
        info!("Input router shut down ({} modules released)", reports.len());
        reports
    }
}
