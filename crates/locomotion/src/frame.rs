//! Per-tick inputs supplied by the host and the views handed to each mode.

use std::collections::BTreeMap;

use glam::Vec3;
use locomotion_common::{AnchorId, HandId, RigPose, Transform};
use locomotion_input::{DeviceSample, HandState};

use crate::raycast::RayCaster;

/// A climbable anchor currently overlapping a hand, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimbAnchor {
    pub id: AnchorId,
    pub position: Vec3,
}

/// Everything the host reports about one hand this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct HandFrameInput {
    pub hand: HandId,
    /// Pose in tracking space (relative to the rig origin).
    pub pose: Transform,
    pub device: DeviceSample,
    /// Anchors whose colliders overlap the hand, in the host's encounter order.
    pub overlapping_anchors: Vec<ClimbAnchor>,
}

impl HandFrameInput {
    pub fn new(hand: HandId, pose: Transform, device: DeviceSample) -> Self {
        Self {
            hand,
            pose,
            device,
            overlapping_anchors: Vec::new(),
        }
    }

    pub fn with_anchors(mut self, anchors: Vec<ClimbAnchor>) -> Self {
        self.overlapping_anchors = anchors;
        self
    }
}

/// One tick of host input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Head pose in tracking space; `None` when the headset is not tracked.
    pub head: Option<Transform>,
    pub hands: Vec<HandFrameInput>,
}

impl FrameInput {
    pub fn hand(&self, id: HandId) -> Option<&HandFrameInput> {
        self.hands.iter().find(|h| h.hand == id)
    }
}

/// A hand as seen by the modes: current pose plus the previous-sample cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandFrame {
    pub hand: HandId,
    pub pose: Transform,
    pub previous_position: Vec3,
    pub state: HandState,
}

impl HandFrame {
    /// Position change since the previous tick, in tracking space.
    pub fn delta(&self) -> Vec3 {
        self.pose.position - self.previous_position
    }

    /// Tracking-space velocity. Zero for a non-positive `dt`.
    pub fn velocity(&self, dt: f32) -> Vec3 {
        if dt > 0.0 {
            self.delta() / dt
        } else {
            Vec3::ZERO
        }
    }
}

/// Hands registered with the rig at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RigSetup {
    pub hands: Vec<HandId>,
}

impl Default for RigSetup {
    fn default() -> Self {
        Self {
            hands: HandId::ALL.to_vec(),
        }
    }
}

/// What a mode reads during its tick.
pub struct TickContext<'a> {
    pub rig: &'a RigPose,
    pub head: Option<&'a Transform>,
    pub hands: &'a BTreeMap<HandId, HandFrame>,
    pub dt: f32,
    /// Multiplier of the current motion constraint for the ticking mode.
    pub multiplier: f32,
    pub ray_caster: &'a dyn RayCaster,
}

impl TickContext<'_> {
    pub fn hand(&self, id: HandId) -> Option<&HandFrame> {
        self.hands.get(&id)
    }

    /// Tracking-space vector to world space (rig rotation and scale, no translation).
    pub fn to_world_vector(&self, local: Vec3) -> Vec3 {
        self.rig.rotation * (self.rig.scale * local)
    }

    pub fn to_world_point(&self, local: Vec3) -> Vec3 {
        self.rig.transform_point(local)
    }

    /// Head pose composed with the rig.
    pub fn world_head(&self) -> Option<Transform> {
        self.head.map(|h| Transform {
            position: self.rig.transform_point(h.position),
            rotation: self.rig.rotation * h.rotation,
            scale: self.rig.scale * h.scale,
        })
    }
}
