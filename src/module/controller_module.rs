//! Controller module with statum state machine
//!
//! One module per physical controller. The device adapter samples, everything
//! else (edge tracking, pairing, snapshots, dispatch) is shared by all devices.
//!
//! # State Machine
//!
//! ```text
//! Inactive ──enable()──► Active ──disable()──► Inactive
//!                          │ ▲
//!                          └─┘ process() once per frame
//! ```
//!
//! # Frame order
//!
//! ```text
//! pose/tracking ─► hover ─► axes ─► buttons (profile order) ─► clicks
//! ```
//!
//! Disabling synthesizes a pointer and global Up for every press still in flight
//! before the tables and the event data are cleared.

use crate::device::{DeviceAdapter, DeviceError, DeviceProfile};
use crate::dispatch::{
    ButtonKey, DispatchError, DispatchRecord, DispatchRouter, HoverPhase, InteractionEventData,
    RaycastHit, ReceiverRegistry, SubscriberSnapshots, TargetHandle,
};
use crate::input::{
    AnalogAxis, AxisSampler, ButtonChannel, ButtonEdge, ButtonStateTracker, ClickDetector,
    DeviceFamily, Hand, LogicalButton, ModuleId, Pose, RawInputFrame, Thresholds, XrSystem,
};
use glam::Vec3;
use statum::{machine, state};
use std::collections::BTreeSet;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

/// Frame number and elapsed time supplied by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    pub frame: u64,
    pub delta_time: f32,
}

impl FrameClock {
    pub fn new(frame: u64, delta_time: f32) -> Self {
        Self { frame, delta_time }
    }
}

/// What the host sampled for one module this frame
#[derive(Debug, Clone, Default)]
pub struct DeviceInput {
    pub raw: RawInputFrame,
    pub raycast: Option<RaycastHit>,
}

impl DeviceInput {
    pub fn new(raw: RawInputFrame) -> Self {
        Self { raw, raycast: None }
    }

    pub fn pointing_at(mut self, hit: RaycastHit) -> Self {
        self.raycast = Some(hit);
        self
    }
}

/// One derived edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    pub button: LogicalButton,
    pub channel: ButtonChannel,
    pub edge: ButtonEdge,
}

/// Everything a module did in one `process` or `disable` call
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub module: ModuleId,
    pub frame: u64,
    /// The frame had already been processed
    pub skipped: bool,
    pub edges: Vec<EdgeEvent>,
    pub clicks: Vec<LogicalButton>,
    /// Dispatches that reached at least one handler
    pub records: Vec<DispatchRecord>,
}

impl FrameReport {
    fn new(module: ModuleId, frame: u64) -> Self {
        Self {
            module,
            frame,
            skipped: false,
            edges: Vec::new(),
            clicks: Vec::new(),
            records: Vec::new(),
        }
    }

    fn push(&mut self, record: DispatchRecord) {
        if record.delivered() > 0 {
            self.records.push(record);
        }
    }

    pub fn dispatch_count(&self) -> usize {
        self.records.iter().map(DispatchRecord::delivered).sum()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Motion {
    previous: Option<Pose>,
    velocity: Vec3,
}

#[state]
#[derive(Debug, Clone)]
pub enum ModuleState {
    Inactive, // Constructed or disabled, tables empty
    Active,   // Processing frames
}

#[machine]
pub struct ControllerModule<S: ModuleState> {
    id: ModuleId,
    name: String,
    adapter: Box<dyn DeviceAdapter>,
    registry: ReceiverRegistry,
    thresholds: Thresholds,
    router: DispatchRouter,
    sampler: AxisSampler,
    tracker: ButtonStateTracker,
    clicks: ClickDetector,
    snapshots: SubscriberSnapshots,
    event_data: InteractionEventData,
    motion: Motion,
    hovered: Option<TargetHandle>,
    last_frame: Option<u64>,
}

fn router_for(id: ModuleId, profile: &DeviceProfile) -> DispatchRouter {
    DispatchRouter::new(
        id,
        profile.family,
        profile.supported(),
        profile.clickable.iter().copied(),
    )
}

fn click_axis(button: LogicalButton) -> Option<AnalogAxis> {
    match button {
        LogicalButton::Trigger => Some(AnalogAxis::Trigger),
        LogicalButton::Grip => Some(AnalogAxis::Grip),
        _ => None,
    }
}

impl<S: ModuleState> ControllerModule<S> {
    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hand(&self) -> Hand {
        self.adapter.hand()
    }

    pub fn family(&self) -> DeviceFamily {
        self.adapter.family()
    }

    pub fn system(&self) -> XrSystem {
        self.adapter.system()
    }

    pub fn profile(&self) -> &DeviceProfile {
        self.adapter.profile()
    }

    pub fn event_data(&self) -> &InteractionEventData {
        &self.event_data
    }

    pub fn registry(&self) -> &ReceiverRegistry {
        &self.registry
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

impl ControllerModule<Inactive> {
    pub fn create(
        name: impl Into<String>,
        adapter: Box<dyn DeviceAdapter>,
        registry: ReceiverRegistry,
        thresholds: Thresholds,
    ) -> Self {
        let name = name.into();
        let id = ModuleId::next();
        info!(
            "Creating {:?} controller module {} ({}, {:?} hand)",
            adapter.family(),
            name,
            id,
            adapter.hand()
        );

        let router = router_for(id, adapter.profile());
        let sampler = AxisSampler::new(adapter.profile().touchpad, &thresholds);
        let event_data = InteractionEventData::new(id, adapter.hand());

        Self::new(
            id,
            name,
            adapter,
            registry,
            thresholds,
            router,
            sampler,
            ButtonStateTracker::new(), // tracker
            ClickDetector::new(),      // clicks
            SubscriberSnapshots::new(), // snapshots
            event_data,
            Motion::default(), // motion
            None,              // hovered
            None,              // last_frame
        )
    }

    /// Remaps the device for another XR runtime
    pub fn set_system(&mut self, system: XrSystem) -> Result<(), ModuleError> {
        self.adapter.set_system(system)?;
        self.router = router_for(self.id, self.adapter.profile());
        self.sampler = AxisSampler::new(self.adapter.profile().touchpad, &self.thresholds);
        debug!("Module {} now mapped for {}", self.name, system);
        Ok(())
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.sampler = AxisSampler::new(self.adapter.profile().touchpad, &thresholds);
        self.thresholds = thresholds;
    }

    pub fn enable(mut self) -> ControllerModule<Active> {
        info!("Enabling controller module {}", self.name);
        self.tracker.reset();
        self.clicks.reset();
        self.snapshots.clear();
        self.event_data.reset();
        self.motion = Motion::default();
        self.hovered = None;
        self.last_frame = None;
        self.transition()
    }
}

impl ControllerModule<Active> {
    /// Runs one frame; a frame number seen before is a no-op
    pub fn process(
        &mut self,
        clock: FrameClock,
        input: &DeviceInput,
    ) -> Result<FrameReport, ModuleError> {
        let mut report = FrameReport::new(self.id, clock.frame);
        if self.last_frame == Some(clock.frame) {
            trace!("Module {} already processed frame {}", self.name, clock.frame);
            report.skipped = true;
            return Ok(report);
        }
        self.last_frame = Some(clock.frame);

        if input.raw.unavailable {
            warn!(
                "Module {} device unavailable in frame {}, using neutral input",
                self.name, clock.frame
            );
        }

        self.event_data.frame = clock.frame;
        self.event_data.delta_time = clock.delta_time;
        self.update_pose(clock.delta_time, &input.raw);

        self.event_data.current_raycast = input.raycast.clone();
        self.update_hover(&mut report);

        let axes = self.sampler.sample(self.adapter.read_axes(&input.raw));
        self.event_data.apply_axes(&axes);

        let samples: Vec<(LogicalButton, ButtonChannel, bool)> = self
            .adapter
            .profile()
            .bindings
            .iter()
            .map(|binding| {
                (
                    binding.button,
                    binding.channel,
                    binding.sample(&input.raw, &axes, &self.thresholds),
                )
            })
            .collect();

        for (button, channel, down) in samples {
            if let Some(edge) = self.tracker.sample(button, channel, down).edge() {
                report.edges.push(EdgeEvent {
                    button,
                    channel,
                    edge,
                });
                self.dispatch_edge(button, channel, edge, &mut report)?;
            }
        }

        let clickable = self.adapter.profile().clickable.clone();
        for button in clickable {
            let Some(axis) = click_axis(button) else {
                continue;
            };
            if self
                .clicks
                .sample(button, axes.analog(axis), self.thresholds.click)
            {
                report.clicks.push(button);
                self.dispatch_click(button, &mut report)?;
            }
        }

        debug!(
            "Module {} frame {}: {} edges, {} clicks, {} deliveries",
            self.name,
            clock.frame,
            report.edges.len(),
            report.clicks.len(),
            report.dispatch_count()
        );
        Ok(report)
    }

    /// Whether a (button, channel) is currently down
    pub fn is_down(&self, button: LogicalButton, channel: ButtonChannel) -> bool {
        self.tracker.is_down(button, channel)
    }

    /// Receivers frozen for an in-flight press, if any
    pub fn subscribers(&self, button: LogicalButton, channel: ButtonChannel) -> Option<&[TargetHandle]> {
        self.snapshots.get(button, channel)
    }

    /// Forces Up for every press in flight, then clears all state
    pub fn disable(mut self) -> (ControllerModule<Inactive>, FrameReport) {
        info!("Disabling controller module {}", self.name);
        let frame = self.event_data.frame;
        let mut report = FrameReport::new(self.id, frame);

        let mut in_flight: BTreeSet<ButtonKey> = self
            .event_data
            .pairings()
            .bound()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        in_flight.extend(self.snapshots.keys());

        for (button, channel) in in_flight {
            debug!("Forcing {} {} up on {}", button, channel, self.name);
            report.edges.push(EdgeEvent {
                button,
                channel,
                edge: ButtonEdge::Up,
            });
            let before = report.records.len();
            if let Err(e) = self.dispatch_up(button, channel, &mut report) {
                error!("Forced release of {} {} failed: {}", button, channel, e);
            }
            for record in &mut report.records[before..] {
                record.forced = true;
            }
        }

        if let Some(previous) = self.hovered.take() {
            report.push(
                self.router
                    .dispatch_hover(HoverPhase::Exit, &previous, &self.event_data),
            );
        }

        self.tracker.reset();
        self.clicks.reset();
        self.snapshots.clear();
        self.event_data.reset();
        self.motion = Motion::default();
        self.last_frame = None;

        (self.transition(), report)
    }

    fn update_pose(&mut self, delta_time: f32, raw: &RawInputFrame) {
        let previous = self.motion.previous;
        let pose = self
            .adapter
            .read_pose(raw)
            .or(previous)
            .unwrap_or_default();

        let (velocity, acceleration) = match previous {
            Some(prev) if delta_time > 0.0 => {
                let velocity = (pose.position - prev.position) / delta_time;
                let acceleration = (velocity - self.motion.velocity) / delta_time;
                (velocity, acceleration)
            }
            _ => (Vec3::ZERO, Vec3::ZERO),
        };

        let changed = previous.is_some_and(|prev| prev != pose);
        let tracked = self.adapter.read_tracking(raw).unwrap_or(changed);
        if tracked != self.event_data.is_tracked {
            debug!("Module {} tracking: {}", self.name, tracked);
        }

        self.event_data.pose = pose;
        self.event_data.velocity = velocity;
        self.event_data.acceleration = acceleration;
        self.event_data.is_tracked = tracked;
        self.motion = Motion {
            previous: Some(pose),
            velocity,
        };
    }

    fn update_hover(&mut self, report: &mut FrameReport) {
        let current = self.event_data.current_target().cloned();
        let same = match (&self.hovered, &current) {
            (Some(a), Some(b)) => a.id() == b.id(),
            _ => false,
        };

        if same {
            if let Some(target) = &current {
                report.push(
                    self.router
                        .dispatch_hover(HoverPhase::Stay, target, &self.event_data),
                );
            }
            return;
        }

        if let Some(previous) = self.hovered.take() {
            report.push(
                self.router
                    .dispatch_hover(HoverPhase::Exit, &previous, &self.event_data),
            );
        }
        if let Some(target) = &current {
            report.push(
                self.router
                    .dispatch_hover(HoverPhase::Enter, target, &self.event_data),
            );
        }
        self.hovered = current;
    }

    fn dispatch_edge(
        &mut self,
        button: LogicalButton,
        channel: ButtonChannel,
        edge: ButtonEdge,
        report: &mut FrameReport,
    ) -> Result<(), DispatchError> {
        match edge {
            ButtonEdge::Down => self.dispatch_down(button, channel, report),
            ButtonEdge::Held => self.dispatch_held(button, channel, report),
            ButtonEdge::Up => self.dispatch_up(button, channel, report),
        }
    }

    fn dispatch_down(
        &mut self,
        button: LogicalButton,
        channel: ButtonChannel,
        report: &mut FrameReport,
    ) -> Result<(), DispatchError> {
        let target = self
            .event_data
            .current_target()
            .filter(|t| t.accepts(self.id))
            .cloned();
        if let Some(target) = &target {
            self.event_data.pairings_mut().bind(button, channel, target);
            trace!("{} {} bound to {}", button, channel, target.name());
        }
        report.push(self.router.dispatch_pointer(
            button,
            channel,
            ButtonEdge::Down,
            target.as_ref(),
            &self.event_data,
        )?);

        self.snapshots
            .capture(button, channel, self.registry.snapshot());
        let subscribers = self.snapshots.get(button, channel).unwrap_or_default();
        report.push(self.router.dispatch_global(
            button,
            channel,
            ButtonEdge::Down,
            subscribers,
            &self.event_data,
        )?);
        Ok(())
    }

    fn dispatch_held(
        &mut self,
        button: LogicalButton,
        channel: ButtonChannel,
        report: &mut FrameReport,
    ) -> Result<(), DispatchError> {
        if let Some(target) = self.event_data.bound_target(button, channel) {
            report.push(self.router.dispatch_pointer(
                button,
                channel,
                ButtonEdge::Held,
                Some(&target),
                &self.event_data,
            )?);
        }
        if let Some(subscribers) = self.snapshots.get(button, channel) {
            report.push(self.router.dispatch_global(
                button,
                channel,
                ButtonEdge::Held,
                subscribers,
                &self.event_data,
            )?);
        }
        Ok(())
    }

    fn dispatch_up(
        &mut self,
        button: LogicalButton,
        channel: ButtonChannel,
        report: &mut FrameReport,
    ) -> Result<(), DispatchError> {
        if let Some(target) = self.event_data.bound_target(button, channel) {
            let record = self.router.dispatch_pointer(
                button,
                channel,
                ButtonEdge::Up,
                Some(&target),
                &self.event_data,
            );
            self.event_data.pairings_mut().clear(button, channel);
            report.push(record?);
        } else {
            self.event_data.pairings_mut().clear(button, channel);
        }

        if let Some(subscribers) = self.snapshots.take(button, channel) {
            report.push(self.router.dispatch_global(
                button,
                channel,
                ButtonEdge::Up,
                &subscribers,
                &self.event_data,
            )?);
        }
        Ok(())
    }

    fn dispatch_click(
        &mut self,
        button: LogicalButton,
        report: &mut FrameReport,
    ) -> Result<(), DispatchError> {
        let target = self.event_data.bound_target(button, ButtonChannel::Press);
        let subscribers = self
            .snapshots
            .get(button, ButtonChannel::Press)
            .unwrap_or_default();
        let [pointer, global] =
            self.router
                .dispatch_click(button, target.as_ref(), subscribers, &self.event_data)?;
        report.push(pointer);
        report.push(global);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::GenericXrAdapter;
    use crate::dispatch::{Capability, Interactable, Scope};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn module() -> ControllerModule<Active> {
        ControllerModule::create(
            "right",
            Box::new(GenericXrAdapter::new(Hand::Right, XrSystem::Cv1)),
            ReceiverRegistry::new(),
            Thresholds::default(),
        )
        .enable()
    }

    fn trigger(value: f32) -> DeviceInput {
        DeviceInput::new(RawInputFrame::new().with_axis("RTrigger", value))
    }

    #[test]
    fn same_frame_is_processed_once() {
        let mut module = module();
        let first = module.process(FrameClock::new(1, 0.016), &trigger(0.8)).unwrap();
        let again = module.process(FrameClock::new(1, 0.016), &trigger(0.8)).unwrap();
        assert!(!first.edges.is_empty());
        assert!(again.skipped);
        assert!(again.edges.is_empty());
    }

    #[test]
    fn hover_enter_stay_exit() {
        let mut module = module();
        let target = Interactable::new("button");
        let count = Arc::new(AtomicUsize::new(0));
        for phase in [HoverPhase::Enter, HoverPhase::Stay, HoverPhase::Exit] {
            let c = count.clone();
            target.on(Capability::Hover(phase), move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }

        let pointing = DeviceInput::new(RawInputFrame::new()).pointing_at(RaycastHit::new(target.clone()));
        let enter = module.process(FrameClock::new(1, 0.016), &pointing).unwrap();
        let stay = module.process(FrameClock::new(2, 0.016), &pointing).unwrap();
        let exit = module
            .process(FrameClock::new(3, 0.016), &DeviceInput::default())
            .unwrap();

        assert_eq!(enter.records[0].capability, Capability::Hover(HoverPhase::Enter));
        assert_eq!(stay.records[0].capability, Capability::Hover(HoverPhase::Stay));
        assert_eq!(exit.records[0].capability, Capability::Hover(HoverPhase::Exit));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn velocity_from_pose_delta() {
        let mut module = module();
        let at = |x: f32| {
            DeviceInput::new(RawInputFrame::new().with_pose(Pose {
                position: Vec3::new(x, 0.0, 0.0),
                ..Pose::default()
            }))
        };
        module.process(FrameClock::new(1, 0.5), &at(0.0)).unwrap();
        assert!(!module.event_data().is_tracked);
        module.process(FrameClock::new(2, 0.5), &at(1.0)).unwrap();
        assert_eq!(module.event_data().velocity, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(module.event_data().acceleration, Vec3::new(4.0, 0.0, 0.0));
        assert!(module.event_data().is_tracked);
    }

    #[test]
    fn foreign_affinity_target_is_not_bound() {
        let mut module = module();
        let target = Interactable::new("other module only");
        target.set_affinity(Some(ModuleId::next()));
        let cap = Capability::for_button(
            Scope::Pointer,
            LogicalButton::Trigger,
            ButtonChannel::Press,
            ButtonEdge::Down,
        );
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        target.on(cap, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let input = trigger(0.9).pointing_at(RaycastHit::new(target.clone()));
        module.process(FrameClock::new(1, 0.016), &input).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(module
            .event_data()
            .bound_target(LogicalButton::Trigger, ButtonChannel::Press)
            .is_none());
    }
}
