#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use xrinput::device::GenericXrAdapter;
use xrinput::dispatch::{Capability, EventHandler, Interactable, InteractionEventData, TargetHandle};
use xrinput::input::{Hand, RawInputFrame, Thresholds, XrSystem};
use xrinput::module::{Active, ControllerModule, DeviceInput};
use xrinput::ReceiverRegistry;

/// Handler names a target received, in order
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn names(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Names that start with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.names()
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| n.as_str() == name).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

struct Recording(Log);

impl EventHandler for Recording {
    fn on_event(&mut self, capability: Capability, _data: &InteractionEventData) -> bool {
        self.0 .0.lock().unwrap().push(capability.handler_name());
        true
    }
}

pub fn recorded_target(name: &str) -> (TargetHandle, Log) {
    let target = Interactable::new(name);
    let log = Log::default();
    target.add_handler(Box::new(Recording(log.clone())));
    (target, log)
}

pub fn cv1_right(registry: &ReceiverRegistry) -> ControllerModule<Active> {
    ControllerModule::create(
        "right",
        Box::new(GenericXrAdapter::new(Hand::Right, XrSystem::Cv1)),
        registry.clone(),
        Thresholds::default(),
    )
    .enable()
}

pub fn trigger(value: f32) -> DeviceInput {
    DeviceInput::new(RawInputFrame::new().with_axis("RTrigger", value))
}
