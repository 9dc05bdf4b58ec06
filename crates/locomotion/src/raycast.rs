use glam::Vec3;

/// Result of a ray query against the host's scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    /// Whether the surface accepts a teleport (floor, not wall or ceiling).
    pub valid: bool,
}

/// Physics collaborator used by teleport aiming.
pub trait RayCaster {
    /// Cast a world-space ray. `direction` is normalized; hits beyond `max_distance` are misses.
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

/// A scene with nothing to hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSurface;

impl RayCaster for NoSurface {
    fn cast(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<RayHit> {
        None
    }
}

/// An infinite horizontal floor at a fixed height. Hits from below are invalid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    pub height: f32,
}

impl GroundPlane {
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl RayCaster for GroundPlane {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        if direction.y.abs() <= f32::EPSILON {
            return None;
        }
        let distance = (self.height - origin.y) / direction.y;
        if distance < 0.0 || distance > max_distance {
            return None;
        }
        Some(RayHit {
            point: origin + direction * distance,
            normal: Vec3::Y,
            distance,
            valid: origin.y > self.height,
        })
    }
}
