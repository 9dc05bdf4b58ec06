use std::collections::{BTreeMap, BTreeSet};

use glam::{Quat, Vec3};
use locomotion_common::{Axis, HandId, RigPose};

use crate::config::ManipulationSettings;
use crate::frame::HandFrame;

const MIN_SPAN: f32 = 1e-4;

/// Two-handed rig rotation and scaling.
///
/// While both hands grab, the change of the hand-to-hand vector since the last
/// tick turns the rig about each enabled axis and scales it by the inverse change
/// in hand separation, so the world appears to follow the hands.
#[derive(Debug, Clone, Default)]
pub struct RigManipulator {
    settings: ManipulationSettings,
    rotate: BTreeSet<Axis>,
    scale: bool,
}

impl RigManipulator {
    pub fn new(settings: ManipulationSettings) -> Self {
        Self {
            settings,
            rotate: BTreeSet::new(),
            scale: false,
        }
    }

    pub fn set_rotation_enabled(&mut self, axis: Axis, enabled: bool) -> bool {
        if enabled {
            self.rotate.insert(axis)
        } else {
            self.rotate.remove(&axis)
        }
    }

    pub fn rotation_enabled(&self, axis: Axis) -> bool {
        self.rotate.contains(&axis)
    }

    pub fn set_scale_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.scale != enabled;
        self.scale = enabled;
        changed
    }

    pub fn scale_enabled(&self) -> bool {
        self.scale
    }

    pub fn any_enabled(&self) -> bool {
        self.scale || !self.rotate.is_empty()
    }

    /// Apply one tick of manipulation. Returns true if the rig changed.
    pub fn apply(&self, hands: &BTreeMap<HandId, HandFrame>, rig: &mut RigPose) -> bool {
        let (Some(left), Some(right)) = (hands.get(&HandId::Left), hands.get(&HandId::Right)) else {
            return false;
        };
        if !(left.state.grabbing && right.state.grabbing) {
            return false;
        }

        let before = right.previous_position - left.previous_position;
        let after = right.pose.position - left.pose.position;
        let mut changed = false;

        for axis in &self.rotate {
            let angle = signed_angle_about(before, after, axis.unit());
            if angle != 0.0 {
                rig.rotation = (rig.rotation * Quat::from_axis_angle(axis.unit(), -angle)).normalize();
                changed = true;
            }
        }

        if self.scale && before.length() > MIN_SPAN && after.length() > MIN_SPAN {
            let ratio = before.length() / after.length();
            let current = rig.scale.x;
            let next = (current * ratio).clamp(self.settings.min_scale, self.settings.max_scale);
            if next != current {
                rig.scale = Vec3::splat(next);
                changed = true;
            }
        }

        if changed {
            tracing::trace!(rotation = ?rig.rotation, scale = rig.scale.x, "rig manipulated");
        }
        changed
    }
}

/// Angle from `a` to `b` measured in the plane perpendicular to `axis`.
fn signed_angle_about(a: Vec3, b: Vec3, axis: Vec3) -> f32 {
    let pa = a - axis * a.dot(axis);
    let pb = b - axis * b.dot(axis);
    if pa.length() < MIN_SPAN || pb.length() < MIN_SPAN {
        return 0.0;
    }
    axis.dot(pa.cross(pb)).atan2(pa.dot(pb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use locomotion_common::Transform;
    use locomotion_input::HandState;

    fn grabbing(hand: HandId, previous: Vec3, current: Vec3) -> HandFrame {
        HandFrame {
            hand,
            pose: Transform::from_position(current),
            previous_position: previous,
            state: HandState {
                grabbing: true,
                ..HandState::default()
            },
        }
    }

    fn twist_quarter_turn() -> BTreeMap<HandId, HandFrame> {
        // Hands start left/right of the chest and rotate to front/back.
        BTreeMap::from([
            (
                HandId::Left,
                grabbing(HandId::Left, Vec3::new(-0.5, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.5)),
            ),
            (
                HandId::Right,
                grabbing(HandId::Right, Vec3::new(0.5, 1.0, 0.0), Vec3::new(0.0, 1.0, -0.5)),
            ),
        ])
    }

    #[test]
    fn signed_angle_quarter_turn() {
        let angle = signed_angle_about(Vec3::X, Vec3::NEG_Z, Vec3::Y);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn disabled_manipulator_does_nothing() {
        let m = RigManipulator::new(ManipulationSettings::default());
        let mut rig = RigPose::default();
        assert!(!m.apply(&twist_quarter_turn(), &mut rig));
        assert_eq!(rig, RigPose::default());
    }

    #[test]
    fn yaw_rotation_counters_hand_twist() {
        let mut m = RigManipulator::new(ManipulationSettings::default());
        m.set_rotation_enabled(Axis::Y, true);
        let mut rig = RigPose::default();
        assert!(m.apply(&twist_quarter_turn(), &mut rig));
        let expected = Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2);
        assert!(rig.rotation.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn axis_perpendicular_to_motion_is_unaffected() {
        let mut m = RigManipulator::new(ManipulationSettings::default());
        m.set_rotation_enabled(Axis::X, true);
        let mut rig = RigPose::default();
        // The hand span starts along X, so it has no extent in the YZ plane.
        assert!(!m.apply(&twist_quarter_turn(), &mut rig));
    }

    #[test]
    fn spreading_hands_shrinks_rig() {
        let mut m = RigManipulator::new(ManipulationSettings::default());
        m.set_scale_enabled(true);
        let hands = BTreeMap::from([
            (
                HandId::Left,
                grabbing(HandId::Left, Vec3::new(-0.25, 1.0, 0.0), Vec3::new(-0.5, 1.0, 0.0)),
            ),
            (
                HandId::Right,
                grabbing(HandId::Right, Vec3::new(0.25, 1.0, 0.0), Vec3::new(0.5, 1.0, 0.0)),
            ),
        ]);
        let mut rig = RigPose::default();
        assert!(m.apply(&hands, &mut rig));
        assert!(rig.scale.abs_diff_eq(Vec3::splat(0.5), 1e-5));
    }

    #[test]
    fn scale_is_clamped() {
        let mut m = RigManipulator::new(ManipulationSettings {
            min_scale: 0.8,
            max_scale: 1.2,
        });
        m.set_scale_enabled(true);
        let hands = BTreeMap::from([
            (
                HandId::Left,
                grabbing(HandId::Left, Vec3::new(-0.1, 1.0, 0.0), Vec3::new(-1.0, 1.0, 0.0)),
            ),
            (
                HandId::Right,
                grabbing(HandId::Right, Vec3::new(0.1, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)),
            ),
        ]);
        let mut rig = RigPose::default();
        m.apply(&hands, &mut rig);
        assert_eq!(rig.scale, Vec3::splat(0.8));
    }

    #[test]
    fn one_hand_grabbing_is_ignored() {
        let mut m = RigManipulator::new(ManipulationSettings::default());
        m.set_scale_enabled(true);
        let mut hands = twist_quarter_turn();
        if let Some(left) = hands.get_mut(&HandId::Left) {
            left.state.grabbing = false;
        }
        let mut rig = RigPose::default();
        assert!(!m.apply(&hands, &mut rig));
    }
}
