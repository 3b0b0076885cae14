//! Scripted session replay

pub mod runner;
pub mod script;

pub use runner::{FrameOutcome, ReplayError, ReplayRunner, ReplaySummary};
pub use script::{FrameSpec, HoldableSpec, ModuleFrame, SessionScript, TargetSpec};
