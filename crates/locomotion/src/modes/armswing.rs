use glam::Vec3;
use locomotion_common::{HandId, flatten};

use super::RigDelta;
use crate::activation::HandActivationTracker;
use crate::config::{ModeConfig, ModeKind};
use crate::frame::TickContext;

const CANCEL_EPSILON: f32 = 1e-6;

/// Walk by swinging the arms: hands held with grab push the rig along where they point.
#[derive(Debug)]
pub struct Armswing {
    pub(crate) config: ModeConfig,
    pub(crate) tracker: HandActivationTracker,
}

impl Armswing {
    pub fn new(config: ModeConfig, hands: &[HandId]) -> Self {
        Self {
            tracker: HandActivationTracker::new(ModeKind::Armswing, hands, config.mutually_exclusive),
            config,
        }
    }

    /// Direction is the normalized sum of the active hands' flattened forwards;
    /// distance is the sum of their per-tick movement.
    pub fn tick(&mut self, ctx: &TickContext<'_>) -> RigDelta {
        let mut heading = Vec3::ZERO;
        let mut distance = 0.0;
        for hand in self.tracker.active_hands() {
            let Some(frame) = ctx.hand(hand) else {
                continue;
            };
            heading += flatten(ctx.to_world_vector(frame.pose.forward()));
            distance += ctx.to_world_vector(frame.delta()).length();
        }

        // Opposing hands cancel instead of snapping to an arbitrary axis.
        let direction = if heading.length_squared() > CANCEL_EPSILON {
            heading.normalize()
        } else {
            Vec3::ZERO
        };
        let displacement = direction * distance * ctx.multiplier;
        if displacement == Vec3::ZERO {
            return RigDelta::None;
        }
        RigDelta::Translate(displacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::HandFrame;
    use crate::raycast::NoSurface;
    use glam::Quat;
    use locomotion_common::{RigPose, Transform};
    use locomotion_input::HandState;
    use std::collections::BTreeMap;

    fn frame(hand: HandId, rotation: Quat, previous: Vec3, current: Vec3) -> HandFrame {
        HandFrame {
            hand,
            pose: Transform::from_position_rotation(current, rotation),
            previous_position: previous,
            state: HandState::default(),
        }
    }

    fn run(mode: &mut Armswing, hands: &BTreeMap<HandId, HandFrame>, multiplier: f32) -> RigDelta {
        let rig = RigPose::default();
        let ctx = TickContext {
            rig: &rig,
            head: None,
            hands,
            dt: 0.016,
            multiplier,
            ray_caster: &NoSurface,
        };
        mode.tick(&ctx)
    }

    fn armswing() -> Armswing {
        Armswing::new(ModeConfig::default(), &HandId::ALL)
    }

    #[test]
    fn one_hand_moves_along_its_forward() {
        let mut mode = armswing();
        mode.tracker.set_active(HandId::Left, true).unwrap();
        let hands = BTreeMap::from([(
            HandId::Left,
            frame(HandId::Left, Quat::IDENTITY, Vec3::ZERO, Vec3::new(0.0, 0.2, 0.0)),
        )]);
        let RigDelta::Translate(d) = run(&mut mode, &hands, 2.0) else {
            panic!("expected translation");
        };
        assert!(d.abs_diff_eq(Vec3::new(0.0, 0.0, -0.4), 1e-5));
    }

    #[test]
    fn two_hands_sum_distances_and_average_direction() {
        let mut mode = armswing();
        mode.tracker.set_active(HandId::Left, true).unwrap();
        mode.tracker.set_active(HandId::Right, true).unwrap();
        let yaw = 90.0_f32.to_radians();
        let hands = BTreeMap::from([
            (
                HandId::Left,
                frame(HandId::Left, Quat::IDENTITY, Vec3::ZERO, Vec3::new(0.1, 0.0, 0.0)),
            ),
            (
                HandId::Right,
                frame(HandId::Right, Quat::from_rotation_y(yaw), Vec3::ZERO, Vec3::new(0.0, 0.3, 0.0)),
            ),
        ]);
        let RigDelta::Translate(d) = run(&mut mode, &hands, 1.0) else {
            panic!("expected translation");
        };
        // Forwards -Z and -X: average direction is diagonal, distance 0.1 + 0.3.
        let expected = Vec3::new(-1.0, 0.0, -1.0).normalize() * 0.4;
        assert!(d.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn antiparallel_hands_cancel() {
        let mut mode = armswing();
        mode.tracker.set_active(HandId::Left, true).unwrap();
        mode.tracker.set_active(HandId::Right, true).unwrap();
        let hands = BTreeMap::from([
            (
                HandId::Left,
                frame(HandId::Left, Quat::IDENTITY, Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0)),
            ),
            (
                HandId::Right,
                frame(
                    HandId::Right,
                    Quat::from_rotation_y(180.0_f32.to_radians()),
                    Vec3::ZERO,
                    Vec3::new(0.0, 0.01, 0.0),
                ),
            ),
        ]);
        match run(&mut mode, &hands, 1.0) {
            RigDelta::None => {}
            RigDelta::Translate(d) => assert!(d.length() < 1e-4, "got {d:?}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inactive_hands_do_not_move() {
        let mut mode = armswing();
        let hands = BTreeMap::from([(
            HandId::Left,
            frame(HandId::Left, Quat::IDENTITY, Vec3::ZERO, Vec3::ONE),
        )]);
        assert_eq!(run(&mut mode, &hands, 1.0), RigDelta::None);
    }
}
