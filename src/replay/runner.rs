//! Replays a session script through an [`InputRouter`] on a frame clock
//!
//! Frame reports are sent over an mpsc channel as they are produced. The frame
//! clock is a tokio interval; an interval of 0 replays as fast as possible.

use super::script::{FrameSpec, SessionScript, TargetSpec};
use crate::behaviours::{GrabHandle, Grabbable, HoldHandle, Holdable};
use crate::config::RouterSettings;
use crate::dispatch::{Capability, EventHandler, Interactable, InteractionEventData, RaycastHit, TargetHandle};
use crate::module::{DeviceInput, FrameClock, FrameReport, InputRouter, RouterError};
use chrono::Local;
use glam::Vec3;
use std::collections::HashMap;
use std::sync::PoisonError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Router error: {0}")]
    RouterError(#[from] RouterError),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

/// Reports of one replayed frame
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub frame: u64,
    /// Releases forced by disables and system switches before the frame ran
    pub forced: Vec<FrameReport>,
    pub reports: Vec<FrameReport>,
}

impl FrameOutcome {
    pub fn dispatch_count(&self) -> usize {
        self.forced
            .iter()
            .chain(&self.reports)
            .map(FrameReport::dispatch_count)
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    pub frames: u64,
    pub dispatches: usize,
    /// Final position and holder of every grabbable, by target name
    pub grabbables: HashMap<String, (Vec3, bool)>,
    pub holdables: HashMap<String, (Vec3, bool)>,
}

/// Logs every capability a target receives
struct LogHandler {
    target: String,
}

impl EventHandler for LogHandler {
    fn on_event(&mut self, capability: Capability, data: &InteractionEventData) -> bool {
        info!(
            "[frame {}] {} <- {} from {}",
            data.frame, self.target, capability, data.module
        );
        true
    }
}

pub struct ReplayRunner {
    router: InputRouter,
    script: SessionScript,
    settings: RouterSettings,
    targets: HashMap<String, TargetHandle>,
    hit_points: HashMap<String, Vec3>,
    grabbables: HashMap<String, GrabHandle>,
    holdables: HashMap<String, HoldHandle>,
    sticky: HashMap<String, DeviceInput>,
    output: mpsc::Sender<FrameOutcome>,
}

impl ReplayRunner {
    pub fn new(
        router: InputRouter,
        script: SessionScript,
        settings: RouterSettings,
        output: mpsc::Sender<FrameOutcome>,
    ) -> Result<Self, ReplayError> {
        let mut runner = Self {
            router,
            script,
            settings,
            targets: HashMap::new(),
            hit_points: HashMap::new(),
            grabbables: HashMap::new(),
            holdables: HashMap::new(),
            sticky: HashMap::new(),
            output,
        };
        let specs = runner.script.targets.clone();
        for spec in &specs {
            runner.build_target(spec)?;
        }
        info!("Replay prepared with {} targets", runner.targets.len());
        Ok(runner)
    }

    fn build_target(&mut self, spec: &TargetSpec) -> Result<(), ReplayError> {
        let target = Interactable::new(spec.name.clone());
        target.set_active(spec.active);
        if let Some(module) = &spec.affinity {
            let id = self
                .router
                .module_id(module)
                .ok_or_else(|| ReplayError::UnknownModule(module.clone()))?;
            target.set_affinity(Some(id));
        }
        if spec.log {
            target.add_handler(Box::new(LogHandler {
                target: spec.name.clone(),
            }));
        }
        if let Some(bounds) = spec.grabbable {
            let handle = Grabbable::attach(&target, bounds);
            self.grabbables.insert(spec.name.clone(), handle);
        }
        if let Some(hold) = spec.holdable {
            let handle = Holdable::attach(&target, hold.button, hold.bounds);
            self.holdables.insert(spec.name.clone(), handle);
        }
        if spec.global {
            self.router.registry().register(target.clone());
        }
        if let Some(point) = spec.hit_point {
            self.hit_points.insert(spec.name.clone(), point);
        }
        self.targets.insert(spec.name.clone(), target);
        Ok(())
    }

    pub fn target(&self, name: &str) -> Option<&TargetHandle> {
        self.targets.get(name)
    }

    pub fn grab_state(&self, name: &str) -> Option<&GrabHandle> {
        self.grabbables.get(name)
    }

    pub fn hold_state(&self, name: &str) -> Option<&HoldHandle> {
        self.holdables.get(name)
    }

    fn target_or_err(&self, name: &str) -> Result<&TargetHandle, ReplayError> {
        self.targets
            .get(name)
            .ok_or_else(|| ReplayError::UnknownTarget(name.to_string()))
    }

    /// State changes requested by a frame entry, applied before the frame runs
    fn apply_controls(&mut self, spec: &FrameSpec) -> Result<Vec<FrameReport>, ReplayError> {
        let mut forced = Vec::new();
        for name in &spec.deactivate {
            self.target_or_err(name)?.set_active(false);
            // A disabled holdable drops whatever it was doing
            if let Some(handle) = self.holdables.get(name) {
                if handle.lock().unwrap_or_else(PoisonError::into_inner).release() {
                    debug!("{} released on deactivate", name);
                }
            }
        }
        for name in &spec.activate {
            self.target_or_err(name)?.set_active(true);
        }
        for name in &spec.unregister {
            let id = self.target_or_err(name)?.id();
            self.router.registry().unregister(id);
        }
        for name in &spec.disable {
            if let Some(report) = self.router.disable(name)? {
                forced.push(report);
            }
        }
        if let Some(system) = spec.system {
            forced.extend(self.router.switch_system(system)?);
        }
        for name in &spec.enable {
            self.router.enable(name)?;
        }
        Ok(forced)
    }

    fn update_inputs(&mut self, spec: &FrameSpec) -> Result<(), ReplayError> {
        for (module, frame) in &spec.input {
            let raycast = match &frame.raycast {
                Some(name) => {
                    let target = self.target_or_err(name)?.clone();
                    let point = self.hit_points.get(name).copied().unwrap_or(Vec3::ZERO);
                    Some(RaycastHit::new(target).at(point, Vec3::Z))
                }
                None => None,
            };
            self.sticky.insert(
                module.clone(),
                DeviceInput {
                    raw: frame.raw(),
                    raycast,
                },
            );
        }
        Ok(())
    }

    pub async fn run(mut self) -> Result<ReplaySummary, ReplayError> {
        info!(
            "Starting replay of {} frames with {}ms interval",
            self.script.frame_count(),
            self.settings.frame_interval_ms
        );

        let mut interval_timer = (self.settings.frame_interval_ms > 0).then(|| {
            tokio::time::interval(tokio::time::Duration::from_millis(
                self.settings.frame_interval_ms,
            ))
        });

        let mut summary = ReplaySummary::default();
        let mut frames_since_stats = 0u64;
        let mut dispatches_since_stats = 0usize;
        let mut last_stats_time = Local::now();
        let stats_interval = chrono::Duration::seconds(self.settings.stats_interval_s.max(1));
        let delta_time = self.script.delta_time;
        let mut frame = 0u64;

        let entries = std::mem::take(&mut self.script.frames);
        for spec in &entries {
            for repeat in 0..spec.repeat {
                if let Some(timer) = interval_timer.as_mut() {
                    timer.tick().await;
                }
                frame += 1;

                // Controls and input changes apply on the first frame of an entry
                let forced = if repeat == 0 {
                    let forced = self.apply_controls(spec)?;
                    self.update_inputs(spec)?;
                    forced
                } else {
                    Vec::new()
                };

                let reports = self
                    .router
                    .process_frame(FrameClock::new(frame, delta_time), &self.sticky)?;
                let outcome = FrameOutcome {
                    frame,
                    forced,
                    reports,
                };
                let count = outcome.dispatch_count();
                summary.dispatches += count;
                dispatches_since_stats += count;
                frames_since_stats += 1;

                self.output
                    .send(outcome)
                    .await
                    .map_err(|e| ReplayError::ChannelError(e.to_string()))?;

                let now = Local::now();
                if now - last_stats_time > stats_interval {
                    let elapsed_seconds = (now - last_stats_time).num_seconds().max(1);
                    info!(
                        "Replay stats: {} frames, {} dispatches in {} seconds",
                        frames_since_stats, dispatches_since_stats, elapsed_seconds
                    );
                    frames_since_stats = 0;
                    dispatches_since_stats = 0;
                    last_stats_time = now;
                }
            }
        }

        let released = self.router.shutdown();
        if !released.is_empty() {
            let outcome = FrameOutcome {
                frame,
                forced: released,
                reports: Vec::new(),
            };
            summary.dispatches += outcome.dispatch_count();
            if let Err(e) = self.output.send(outcome).await {
                warn!("Shutdown report dropped: {}", e);
            }
        }

        summary.frames = frame;
        for (name, handle) in &self.grabbables {
            let state = handle.lock().unwrap_or_else(PoisonError::into_inner);
            summary
                .grabbables
                .insert(name.clone(), (state.position(), state.is_grabbed()));
        }
        for (name, handle) in &self.holdables {
            let state = handle.lock().unwrap_or_else(PoisonError::into_inner);
            summary
                .holdables
                .insert(name.clone(), (state.position(), state.is_held()));
        }
        debug!("Replay summary: {:?}", summary);
        info!(
            "Replay finished: {} frames, {} dispatches",
            summary.frames, summary.dispatches
        );
        Ok(summary)
    }
}
