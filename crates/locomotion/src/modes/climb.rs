use glam::Vec3;
use locomotion_common::{AnchorId, HandId};

use super::RigDelta;
use crate::activation::HandActivationTracker;
use crate::config::{ModeConfig, ModeKind};
use crate::frame::{ClimbAnchor, TickContext};

/// Pick the anchor closest to `point` by squared distance; ties go to the first encountered.
pub fn nearest_anchor(point: Vec3, anchors: &[ClimbAnchor]) -> Option<&ClimbAnchor> {
    let mut best: Option<(&ClimbAnchor, f32)> = None;
    for anchor in anchors {
        let d = anchor.position.distance_squared(point);
        match best {
            Some((_, min)) if d >= min => {}
            _ => best = Some((anchor, d)),
        }
    }
    best.map(|(a, _)| a)
}

/// Climbing: a hand holding an anchor pulls the rig opposite to its own motion.
#[derive(Debug)]
pub struct Climb {
    pub(crate) config: ModeConfig,
    pub(crate) tracker: HandActivationTracker,
    climbing: Option<(HandId, AnchorId)>,
}

impl Climb {
    pub fn new(config: ModeConfig, hands: &[HandId]) -> Self {
        Self {
            tracker: HandActivationTracker::new(ModeKind::Climb, hands, config.mutually_exclusive),
            config,
            climbing: None,
        }
    }

    pub fn climbing_hand(&self) -> Option<HandId> {
        self.climbing.map(|(h, _)| h)
    }

    pub fn held_anchor(&self) -> Option<AnchorId> {
        self.climbing.map(|(_, a)| a)
    }

    /// Grab with `hand` at world position `hand_position`. The nearest overlapping
    /// anchor becomes the hold; a new grab takes over from the previous hand.
    pub fn grab(
        &mut self,
        hand: HandId,
        hand_position: Vec3,
        anchors: &[ClimbAnchor],
    ) -> Option<AnchorId> {
        let anchor = nearest_anchor(hand_position, anchors)?.id;

        if let Some((previous, _)) = self.climbing.filter(|(h, _)| *h != hand) {
            let _ = self.tracker.set_active(previous, false);
        }
        if let Err(err) = self.tracker.set_active(hand, true) {
            tracing::debug!(%hand, %err, "climb grab refused");
            return None;
        }
        self.climbing = Some((hand, anchor));
        tracing::debug!(%hand, ?anchor, "climb hold acquired");
        Some(anchor)
    }

    /// Let go with `hand`. Releasing a hand that is not holding is a no-op.
    pub fn release(&mut self, hand: HandId) {
        let _ = self.tracker.set_active(hand, false);
        if self.climbing_hand() == Some(hand) {
            self.climbing = None;
            tracing::debug!(%hand, "climb hold released");
        }
    }

    pub fn release_all(&mut self) {
        self.climbing = None;
        self.tracker.deactivate_all();
    }

    pub fn tick(&mut self, ctx: &TickContext<'_>) -> RigDelta {
        let Some((hand, _)) = self.climbing else {
            return RigDelta::None;
        };
        let Some(frame) = ctx.hand(hand) else {
            return RigDelta::None;
        };
        let velocity = ctx.to_world_vector(frame.velocity(ctx.dt));
        let displacement = -velocity * ctx.multiplier * ctx.dt;
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
    use locomotion_common::{RigPose, Transform};
    use locomotion_input::HandState;
    use std::collections::BTreeMap;

    fn anchor(x: f32) -> ClimbAnchor {
        ClimbAnchor {
            id: AnchorId::new(),
            position: Vec3::new(x, 0.0, 0.0),
        }
    }

    fn climb() -> Climb {
        Climb::new(
            ModeConfig {
                mutually_exclusive: true,
                ..ModeConfig::default()
            },
            &HandId::ALL,
        )
    }

    #[test]
    fn nearest_picks_minimum_distance() {
        let anchors = [anchor(3.0), anchor(1.0), anchor(-2.0)];
        let best = nearest_anchor(Vec3::ZERO, &anchors).unwrap();
        assert_eq!(best.id, anchors[1].id);
    }

    #[test]
    fn nearest_tie_goes_to_first() {
        let anchors = [anchor(1.0), anchor(-1.0)];
        let best = nearest_anchor(Vec3::ZERO, &anchors).unwrap();
        assert_eq!(best.id, anchors[0].id);
    }

    #[test]
    fn nearest_of_nothing_is_none() {
        assert!(nearest_anchor(Vec3::ZERO, &[]).is_none());
    }

    #[test]
    fn grab_without_anchor_does_nothing() {
        let mut c = climb();
        assert!(c.grab(HandId::Left, Vec3::ZERO, &[]).is_none());
        assert!(c.climbing_hand().is_none());
        assert!(!c.tracker.any_active());
    }

    #[test]
    fn hand_over_hand_takes_over_hold() {
        let mut c = climb();
        let anchors = [anchor(0.0)];
        c.grab(HandId::Left, Vec3::ZERO, &anchors).unwrap();
        c.grab(HandId::Right, Vec3::ZERO, &anchors).unwrap();
        assert_eq!(c.climbing_hand(), Some(HandId::Right));
        assert_eq!(c.tracker.active_hands(), vec![HandId::Right]);

        // Releasing the old hand leaves the new hold intact.
        c.release(HandId::Left);
        assert_eq!(c.climbing_hand(), Some(HandId::Right));
        c.release(HandId::Right);
        assert!(c.climbing_hand().is_none());
    }

    #[test]
    fn pulling_down_lifts_the_rig() {
        let mut c = climb();
        c.grab(HandId::Right, Vec3::ZERO, &[anchor(0.0)]).unwrap();
        let hands = BTreeMap::from([(
            HandId::Right,
            HandFrame {
                hand: HandId::Right,
                pose: Transform::from_position(Vec3::new(0.0, 0.8, 0.0)),
                previous_position: Vec3::new(0.0, 1.0, 0.0),
                state: HandState::default(),
            },
        )]);
        let rig = RigPose::default();
        let ctx = TickContext {
            rig: &rig,
            head: None,
            hands: &hands,
            dt: 0.02,
            multiplier: 1.0,
            ray_caster: &NoSurface,
        };
        let RigDelta::Translate(d) = c.tick(&ctx) else {
            panic!("expected translation");
        };
        assert!(d.abs_diff_eq(Vec3::new(0.0, 0.2, 0.0), 1e-5));
    }

    #[test]
    fn no_hold_no_motion() {
        let mut c = climb();
        let hands = BTreeMap::new();
        let rig = RigPose::default();
        let ctx = TickContext {
            rig: &rig,
            head: None,
            hands: &hands,
            dt: 0.02,
            multiplier: 1.0,
            ray_caster: &NoSurface,
        };
        assert_eq!(c.tick(&ctx), RigDelta::None);
    }
}
