//! The closed family of locomotion modes.
//!
//! Each mode owns its configuration and its hand activation tracker. The
//! coordinator routes hand events to the enabled modes and calls [`LocomotionMode::tick`]
//! once per frame for each mode that is enabled, unpaused and passes its integrity check.

mod armswing;
mod climb;
mod fly;
mod navigate;
mod teleport;

pub use armswing::Armswing;
pub use climb::{Climb, nearest_anchor};
pub use fly::Fly;
pub use navigate::Navigate;
pub use teleport::{Teleport, TeleportState};

use glam::Vec3;

use crate::activation::HandActivationTracker;
use crate::config::{ModeConfig, ModeKind};
use crate::frame::TickContext;

/// What a mode asks the coordinator to do to the rig this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RigDelta {
    #[default]
    None,
    /// Move the rig by a world-space offset.
    Translate(Vec3),
    /// Place the rig origin at a world-space position.
    Relocate(Vec3),
}

#[derive(Debug)]
pub enum LocomotionMode {
    Teleport(Teleport),
    Armswing(Armswing),
    Fly(Fly),
    Navigate(Navigate),
    Climb(Climb),
}

impl LocomotionMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Teleport(_) => ModeKind::Teleport,
            Self::Armswing(_) => ModeKind::Armswing,
            Self::Fly(_) => ModeKind::Fly,
            Self::Navigate(_) => ModeKind::Navigate,
            Self::Climb(_) => ModeKind::Climb,
        }
    }

    pub fn config(&self) -> &ModeConfig {
        match self {
            Self::Teleport(m) => &m.config,
            Self::Armswing(m) => &m.config,
            Self::Fly(m) => &m.config,
            Self::Navigate(m) => &m.config,
            Self::Climb(m) => &m.config,
        }
    }

    pub fn config_mut(&mut self) -> &mut ModeConfig {
        match self {
            Self::Teleport(m) => &mut m.config,
            Self::Armswing(m) => &mut m.config,
            Self::Fly(m) => &mut m.config,
            Self::Navigate(m) => &mut m.config,
            Self::Climb(m) => &mut m.config,
        }
    }

    pub fn tracker(&self) -> &HandActivationTracker {
        match self {
            Self::Teleport(m) => &m.tracker,
            Self::Armswing(m) => &m.tracker,
            Self::Fly(m) => &m.tracker,
            Self::Navigate(m) => &m.tracker,
            Self::Climb(m) => &m.tracker,
        }
    }

    pub fn tracker_mut(&mut self) -> &mut HandActivationTracker {
        match self {
            Self::Teleport(m) => &mut m.tracker,
            Self::Armswing(m) => &mut m.tracker,
            Self::Fly(m) => &mut m.tracker,
            Self::Navigate(m) => &mut m.tracker,
            Self::Climb(m) => &mut m.tracker,
        }
    }

    /// Modes that cannot work without a tracked head.
    pub fn requires_head(&self) -> bool {
        matches!(self, Self::Navigate(_) | Self::Teleport(_))
    }

    pub fn tick(&mut self, ctx: &TickContext<'_>) -> RigDelta {
        match self {
            Self::Teleport(m) => m.tick(ctx),
            Self::Armswing(m) => m.tick(ctx),
            Self::Fly(m) => m.tick(ctx),
            Self::Navigate(m) => m.tick(ctx),
            Self::Climb(m) => m.tick(ctx),
        }
    }

    /// Drop every hand and any in-flight interaction (aim, climb hold).
    pub fn reset(&mut self) {
        match self {
            Self::Teleport(m) => m.cancel(),
            Self::Climb(m) => m.release_all(),
            _ => self.tracker_mut().deactivate_all(),
        }
    }
}
