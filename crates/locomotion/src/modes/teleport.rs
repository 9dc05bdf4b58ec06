use glam::Vec3;
use locomotion_common::{HandId, RigPose};

use super::RigDelta;
use crate::activation::HandActivationTracker;
use crate::config::{ModeConfig, ModeKind, TeleportSettings};
use crate::frame::TickContext;
use crate::raycast::RayHit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeleportState {
    #[default]
    Idle,
    /// A hand is holding select and the pointer ray is live.
    Aiming,
    /// Aiming is refused until the block is lifted.
    Blocked,
}

/// Point-and-release relocation.
///
/// Select-begin starts aiming, the ray is re-cast every tick, and select-complete
/// moves the rig so that the head lands above the hit point.
#[derive(Debug)]
pub struct Teleport {
    pub(crate) config: ModeConfig,
    pub(crate) settings: TeleportSettings,
    pub(crate) tracker: HandActivationTracker,
    state: TeleportState,
    blocked: bool,
    aiming_hand: Option<HandId>,
    current_hit: Option<RayHit>,
    release_requested: bool,
}

impl Teleport {
    pub fn new(config: ModeConfig, settings: TeleportSettings, hands: &[HandId]) -> Self {
        Self {
            tracker: HandActivationTracker::new(ModeKind::Teleport, hands, config.mutually_exclusive),
            config,
            settings,
            state: TeleportState::Idle,
            blocked: false,
            aiming_hand: None,
            current_hit: None,
            release_requested: false,
        }
    }

    pub fn state(&self) -> TeleportState {
        if self.blocked {
            TeleportState::Blocked
        } else {
            self.state
        }
    }

    /// Select was released on the aiming hand and the jump has not been resolved yet.
    pub fn release_pending(&self) -> bool {
        self.release_requested
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn aiming_hand(&self) -> Option<HandId> {
        self.aiming_hand
    }

    /// The surface the pointer currently rests on, if any.
    pub fn current_hit(&self) -> Option<&RayHit> {
        self.current_hit.as_ref()
    }

    pub fn settings(&self) -> &TeleportSettings {
        &self.settings
    }

    pub(crate) fn set_max_distance(&mut self, max_distance: f32) {
        self.settings.max_distance = max_distance;
    }

    /// Blocking cancels any aim in progress and refuses new ones until cleared.
    pub fn set_blocked(&mut self, blocked: bool) {
        if self.blocked == blocked {
            return;
        }
        self.blocked = blocked;
        tracing::debug!(blocked, "teleport block changed");
        if blocked {
            self.cancel();
        }
    }

    /// Start aiming with `hand`. Returns false when blocked or another hand is aiming.
    pub fn begin_aim(&mut self, hand: HandId) -> bool {
        if self.blocked {
            tracing::debug!(%hand, "teleport blocked, aim ignored");
            return false;
        }
        if let Err(err) = self.tracker.set_active(hand, true) {
            tracing::debug!(%hand, %err, "teleport aim refused");
            return false;
        }
        if self.aiming_hand.is_some_and(|h| h != hand) {
            let _ = self.tracker.set_active(hand, false);
            return false;
        }
        self.state = TeleportState::Aiming;
        self.aiming_hand = Some(hand);
        self.current_hit = None;
        self.release_requested = false;
        true
    }

    /// Select released on `hand`: the jump happens on the next evaluation.
    pub fn release_aim(&mut self, hand: HandId) {
        if self.state == TeleportState::Aiming && self.aiming_hand == Some(hand) {
            self.release_requested = true;
        } else {
            let _ = self.tracker.set_active(hand, false);
        }
    }

    /// Drop the aim without moving.
    pub fn cancel(&mut self) {
        self.state = TeleportState::Idle;
        self.aiming_hand = None;
        self.current_hit = None;
        self.release_requested = false;
        self.tracker.deactivate_all();
    }

    pub fn tick(&mut self, ctx: &TickContext<'_>) -> RigDelta {
        if self.state != TeleportState::Aiming {
            return RigDelta::None;
        }
        let Some(hand) = self.aiming_hand else {
            return RigDelta::None;
        };

        if let Some(frame) = ctx.hand(hand) {
            let origin = ctx.to_world_point(frame.pose.position);
            let direction = (ctx.rig.rotation * frame.pose.forward()).normalize_or_zero();
            self.current_hit = ctx
                .ray_caster
                .cast(origin, direction, self.settings.max_distance)
                .filter(|hit| hit.distance <= self.settings.max_distance);
        }

        if !self.release_requested {
            return RigDelta::None;
        }

        let target = match (self.current_hit, ctx.world_head()) {
            (Some(hit), Some(head)) if hit.valid => {
                Some(Self::landing_for(hit.point, ctx.rig, head.position))
            }
            _ => None,
        };
        self.cancel();

        match target {
            Some(position) => {
                tracing::info!(?position, "teleporting rig");
                RigDelta::Relocate(position)
            }
            None => {
                tracing::debug!("teleport released without a valid target");
                RigDelta::None
            }
        }
    }

    /// Rig position that puts the head horizontally above `point`.
    pub fn landing_for(point: Vec3, rig: &RigPose, world_head: Vec3) -> Vec3 {
        let mut offset = world_head - rig.position;
        offset.y = 0.0;
        point - offset
    }
}
