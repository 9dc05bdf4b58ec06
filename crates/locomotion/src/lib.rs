//! Locomotion core: mode state machines, pause and gravity policy, rig motion.
//!
//! The host owns the rig pose and feeds [`FrameInput`] to
//! [`LocomotionCoordinator::tick`] once per frame. Modes read hand and head poses
//! in tracking space and write world-space offsets back to the rig.
//!
//! # Invariants
//! - Pause never changes a mode's enable flag; it only masks it.
//! - A mutually exclusive mode never has more than one active hand.
//! - Every failure degrades to "no motion this tick" plus a log line.

mod activation;
mod config;
mod coordinator;
mod frame;
mod manipulation;
mod modes;
mod pause;
mod raycast;
mod telemetry;

pub use activation::{ActivationError, ActivationHook, HandActivationTracker};
pub use config::{
    ConfigError, FlySettings, GravityConstraint, LocomotionConfig, ManipulationSettings,
    ModeConfig, ModeKind, ModeTable, MotionConstraint, MotionMultipliers, TeleportSettings,
};
pub use coordinator::{Dependencies, IntegrityFault, LocomotionCoordinator, TickReport};
pub use frame::{ClimbAnchor, FrameInput, HandFrame, HandFrameInput, RigSetup, TickContext};
pub use manipulation::RigManipulator;
pub use modes::{
    Armswing, Climb, Fly, LocomotionMode, Navigate, RigDelta, Teleport, TeleportState,
    nearest_anchor,
};
pub use pause::PauseCounter;
pub use raycast::{GroundPlane, NoSurface, RayCaster, RayHit};
pub use telemetry::{TelemetryEvent, TelemetryKey, TelemetrySink, TelemetryStore, TelemetryValue};

pub fn crate_info() -> &'static str {
    "locomotion-core v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("locomotion"));
    }
}
