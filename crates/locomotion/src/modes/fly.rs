use locomotion_common::HandId;

use super::RigDelta;
use crate::activation::HandActivationTracker;
use crate::config::{FlySettings, ModeConfig, ModeKind};
use crate::frame::TickContext;

/// Free flight: the rig follows the movement of the single selecting hand.
#[derive(Debug)]
pub struct Fly {
    pub(crate) config: ModeConfig,
    pub(crate) settings: FlySettings,
    pub(crate) tracker: HandActivationTracker,
}

impl Fly {
    pub fn new(config: ModeConfig, settings: FlySettings, hands: &[HandId]) -> Self {
        Self {
            tracker: HandActivationTracker::new(ModeKind::Fly, hands, config.mutually_exclusive),
            config,
            settings,
        }
    }

    pub fn settings(&self) -> &FlySettings {
        &self.settings
    }

    pub fn set_reverse_motion(&mut self, reverse: bool) {
        self.settings.reverse_motion = reverse;
    }

    pub fn tick(&mut self, ctx: &TickContext<'_>) -> RigDelta {
        let active = self.tracker.active_hands();
        let [hand] = active.as_slice() else {
            return RigDelta::None;
        };
        let hand = *hand;
        let Some(frame) = ctx.hand(hand) else {
            return RigDelta::None;
        };

        let delta = frame.delta();
        if delta.length() > self.settings.glitch_threshold {
            tracing::debug!(%hand, jump = delta.length(), "ignoring tracking discontinuity");
            return RigDelta::None;
        }
        if delta == glam::Vec3::ZERO {
            return RigDelta::None;
        }

        let sign = if self.settings.reverse_motion { -1.0 } else { 1.0 };
        RigDelta::Translate(ctx.to_world_vector(delta) * ctx.multiplier * sign)
    }
}
