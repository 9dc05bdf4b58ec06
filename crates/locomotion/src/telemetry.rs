//! Typed publish/subscribe for locomotion state.
//!
//! The coordinator publishes a [`TelemetryEvent`] for every externally visible
//! state change. [`TelemetryStore`] folds those events into a keyed snapshot that
//! UI toggles and persistence can read without knowing about the coordinator.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::Vec3;
use locomotion_common::Axis;
use serde::Serialize;

use crate::config::{ModeKind, MotionConstraint, MotionMultipliers};

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    ModeEnabled { mode: ModeKind, enabled: bool },
    MultipliersChanged { mode: ModeKind, multipliers: MotionMultipliers },
    MotionConstraintChanged(MotionConstraint),
    GravityChanged(bool),
    PauseChanged(bool),
    RotationEnabled { axis: Axis, enabled: bool },
    ScaleEnabled(bool),
    Teleported { from: Vec3, to: Vec3 },
}

/// Receiver of locomotion state changes.
pub trait TelemetrySink {
    fn publish(&mut self, event: &TelemetryEvent);
}

impl TelemetrySink for Vec<TelemetryEvent> {
    fn publish(&mut self, event: &TelemetryEvent) {
        self.push(event.clone());
    }
}

impl<S: TelemetrySink> TelemetrySink for Rc<RefCell<S>> {
    fn publish(&mut self, event: &TelemetryEvent) {
        self.borrow_mut().publish(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TelemetryKey {
    ModeEnabled(ModeKind),
    Multiplier(ModeKind, MotionConstraint),
    MotionConstraint,
    Gravity,
    Paused,
    RotationEnabled(Axis),
    ScaleEnabled,
    LastTeleport,
}

impl TelemetryKey {
    /// Dotted path used when the snapshot is exported.
    pub fn path(&self) -> String {
        match self {
            Self::ModeEnabled(mode) => format!("locomotion.mode.{mode}"),
            Self::Multiplier(mode, c) => format!("locomotion.multiplier.{mode}.{c}"),
            Self::MotionConstraint => "locomotion.motion_constraint".into(),
            Self::Gravity => "locomotion.gravity".into(),
            Self::Paused => "locomotion.paused".into(),
            Self::RotationEnabled(axis) => {
                let axis = match axis {
                    Axis::X => "x",
                    Axis::Y => "y",
                    Axis::Z => "z",
                };
                format!("locomotion.rotate.{axis}")
            }
            Self::ScaleEnabled => "locomotion.scale".into(),
            Self::LastTeleport => "locomotion.teleport.last_target".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Bool(bool),
    Float(f32),
    Constraint(MotionConstraint),
    Position([f32; 3]),
}

/// Latest value of every published key.
#[derive(Debug, Clone, Default)]
pub struct TelemetryStore {
    values: BTreeMap<TelemetryKey, TelemetryValue>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: TelemetryKey) -> Option<TelemetryValue> {
        self.values.get(&key).copied()
    }

    pub fn get_bool(&self, key: TelemetryKey) -> Option<bool> {
        match self.get(key)? {
            TelemetryValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn get_float(&self, key: TelemetryKey) -> Option<f32> {
        match self.get(key)? {
            TelemetryValue::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TelemetryKey, &TelemetryValue)> {
        self.values.iter()
    }

    /// Snapshot as a flat JSON object keyed by dotted path.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.path(), serde_json::to_value(v).unwrap_or(serde_json::Value::Null)))
            .collect();
        serde_json::Value::Object(map)
    }

    fn set(&mut self, key: TelemetryKey, value: TelemetryValue) {
        self.values.insert(key, value);
    }
}

impl TelemetrySink for TelemetryStore {
    fn publish(&mut self, event: &TelemetryEvent) {
        match *event {
            TelemetryEvent::ModeEnabled { mode, enabled } => {
                self.set(TelemetryKey::ModeEnabled(mode), TelemetryValue::Bool(enabled));
            }
            TelemetryEvent::MultipliersChanged { mode, multipliers } => {
                for c in MotionConstraint::ALL {
                    self.set(
                        TelemetryKey::Multiplier(mode, c),
                        TelemetryValue::Float(multipliers.get(c)),
                    );
                }
            }
            TelemetryEvent::MotionConstraintChanged(c) => {
                self.set(TelemetryKey::MotionConstraint, TelemetryValue::Constraint(c));
            }
            TelemetryEvent::GravityChanged(on) => {
                self.set(TelemetryKey::Gravity, TelemetryValue::Bool(on));
            }
            TelemetryEvent::PauseChanged(paused) => {
                self.set(TelemetryKey::Paused, TelemetryValue::Bool(paused));
            }
            TelemetryEvent::RotationEnabled { axis, enabled } => {
                self.set(TelemetryKey::RotationEnabled(axis), TelemetryValue::Bool(enabled));
            }
            TelemetryEvent::ScaleEnabled(enabled) => {
                self.set(TelemetryKey::ScaleEnabled, TelemetryValue::Bool(enabled));
            }
            TelemetryEvent::Teleported { to, .. } => {
                self.set(TelemetryKey::LastTeleport, TelemetryValue::Position(to.to_array()));
            }
        }
    }
}
