//! Hand input: raw device samples mapped to edge-triggered semantic events.
//!
//! # Invariants
//! - Events fire only on transitions, never on every sample.
//! - A missing device feature never raises; the last known value is held.

mod event;
mod hand;
mod sample;

pub use event::{HandEvent, HandEvents, HandState};
pub use hand::{HandInputState, InputThresholds};
pub use sample::{DeviceSample, InputFeature};

pub fn crate_info() -> &'static str {
    "locomotion-input v0.1.0"
}
