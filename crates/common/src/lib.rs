//! Shared spatial types for the locomotion workspace.

mod types;

pub use types::{AnchorId, Axis, HandId, RigPose, Transform, flatten};
