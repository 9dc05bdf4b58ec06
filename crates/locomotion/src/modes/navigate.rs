use locomotion_common::{HandId, flatten};

use super::RigDelta;
use crate::activation::HandActivationTracker;
use crate::config::{ModeConfig, ModeKind};
use crate::frame::TickContext;

/// Thumbstick / touchpad walking relative to where the head is looking.
#[derive(Debug)]
pub struct Navigate {
    pub(crate) config: ModeConfig,
    pub(crate) tracker: HandActivationTracker,
}

impl Navigate {
    pub fn new(config: ModeConfig, hands: &[HandId]) -> Self {
        Self {
            tracker: HandActivationTracker::new(ModeKind::Navigate, hands, config.mutually_exclusive),
            config,
        }
    }

    pub fn tick(&mut self, ctx: &TickContext<'_>) -> RigDelta {
        let active = self.tracker.active_hands();
        // Two navigating hands is ambiguous; stand still.
        let [hand] = active.as_slice() else {
            return RigDelta::None;
        };
        let (Some(frame), Some(head)) = (ctx.hand(*hand), ctx.world_head()) else {
            return RigDelta::None;
        };

        let axis = frame.state.navigate_value;
        let forward = head.flattened_forward();
        let right = flatten(head.right());
        let displacement = (forward * axis.y + right * axis.x) * (ctx.dt * ctx.multiplier);
        if displacement == glam::Vec3::ZERO {
            return RigDelta::None;
        }
        RigDelta::Translate(displacement)
    }
}
