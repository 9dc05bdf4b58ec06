//! Configuration records for the locomotion core.
//!
//! Every field has a documented default so a partial YAML file (or none at all)
//! yields a working setup. Values are validated once at initialization and
//! again whenever a setter changes them.

use std::path::Path;

use locomotion_input::InputThresholds;
use serde::{Deserialize, Serialize};

/// The closed set of locomotion modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Teleport,
    Armswing,
    Fly,
    Navigate,
    Climb,
}

impl ModeKind {
    pub const ALL: [ModeKind; 5] = [
        ModeKind::Teleport,
        ModeKind::Armswing,
        ModeKind::Fly,
        ModeKind::Navigate,
        ModeKind::Climb,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Teleport => "teleport",
            Self::Armswing => "armswing",
            Self::Fly => "fly",
            Self::Navigate => "navigate",
            Self::Climb => "climb",
        }
    }
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rig-wide speed tier. Exactly one is current at any tick.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MotionConstraint {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl MotionConstraint {
    pub const ALL: [MotionConstraint; 3] = [
        MotionConstraint::Slow,
        MotionConstraint::Normal,
        MotionConstraint::Fast,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Normal => "normal",
            Self::Fast => "fast",
        }
    }
}

impl std::fmt::Display for MotionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What enabling a mode does to gravity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GravityConstraint {
    /// Leave gravity to the next mode in priority order.
    #[default]
    Allowed,
    /// Force gravity on.
    Required,
    /// Force gravity off.
    Prohibited,
}

/// Per-tier speed multipliers. All three must be positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionMultipliers {
    pub slow: f32,
    pub normal: f32,
    pub fast: f32,
}

impl Default for MotionMultipliers {
    fn default() -> Self {
        Self::new(0.5, 1.0, 2.0)
    }
}

impl MotionMultipliers {
    pub const fn new(slow: f32, normal: f32, fast: f32) -> Self {
        Self { slow, normal, fast }
    }

    /// The same multiplier for every tier.
    pub const fn uniform(value: f32) -> Self {
        Self::new(value, value, value)
    }

    pub fn get(&self, constraint: MotionConstraint) -> f32 {
        match constraint {
            MotionConstraint::Slow => self.slow,
            MotionConstraint::Normal => self.normal,
            MotionConstraint::Fast => self.fast,
        }
    }

    /// Check every tier, naming the mode in the error.
    pub fn validate(&self, mode: ModeKind) -> Result<(), ConfigError> {
        for constraint in MotionConstraint::ALL {
            let value = self.get(constraint);
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidMultiplier {
                    mode,
                    constraint,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Settings shared by every mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    pub multipliers: MotionMultipliers,
    pub gravity: GravityConstraint,
    /// At most one hand may be active for this mode at a time.
    pub mutually_exclusive: bool,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            multipliers: MotionMultipliers::default(),
            gravity: GravityConstraint::Allowed,
            mutually_exclusive: false,
        }
    }
}

/// Per-mode settings, one entry per [`ModeKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTable {
    pub teleport: ModeConfig,
    pub armswing: ModeConfig,
    pub fly: ModeConfig,
    pub navigate: ModeConfig,
    pub climb: ModeConfig,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self {
            teleport: ModeConfig {
                multipliers: MotionMultipliers::uniform(1.0),
                gravity: GravityConstraint::Allowed,
                mutually_exclusive: true,
            },
            armswing: ModeConfig {
                multipliers: MotionMultipliers::new(0.5, 1.5, 3.0),
                gravity: GravityConstraint::Required,
                mutually_exclusive: false,
            },
            fly: ModeConfig {
                multipliers: MotionMultipliers::new(0.5, 1.0, 4.0),
                gravity: GravityConstraint::Prohibited,
                mutually_exclusive: true,
            },
            navigate: ModeConfig {
                multipliers: MotionMultipliers::new(0.5, 1.5, 4.0),
                gravity: GravityConstraint::Allowed,
                mutually_exclusive: true,
            },
            climb: ModeConfig {
                multipliers: MotionMultipliers::new(0.5, 1.0, 1.5),
                gravity: GravityConstraint::Prohibited,
                mutually_exclusive: true,
            },
        }
    }
}

impl ModeTable {
    pub fn get(&self, kind: ModeKind) -> &ModeConfig {
        match kind {
            ModeKind::Teleport => &self.teleport,
            ModeKind::Armswing => &self.armswing,
            ModeKind::Fly => &self.fly,
            ModeKind::Navigate => &self.navigate,
            ModeKind::Climb => &self.climb,
        }
    }

    pub fn get_mut(&mut self, kind: ModeKind) -> &mut ModeConfig {
        match kind {
            ModeKind::Teleport => &mut self.teleport,
            ModeKind::Armswing => &mut self.armswing,
            ModeKind::Fly => &mut self.fly,
            ModeKind::Navigate => &mut self.navigate,
            ModeKind::Climb => &mut self.climb,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlySettings {
    /// Move opposite to the hand instead of with it.
    pub reverse_motion: bool,
    /// Single-frame hand deltas longer than this are tracking glitches, not motion.
    pub glitch_threshold: f32,
}

impl Default for FlySettings {
    fn default() -> Self {
        Self {
            reverse_motion: false,
            glitch_threshold: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportSettings {
    /// Longest ray, in world units, that can pick a destination.
    pub max_distance: f32,
}

impl Default for TeleportSettings {
    fn default() -> Self {
        Self { max_distance: 20.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManipulationSettings {
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for ManipulationSettings {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 10.0,
        }
    }
}

/// Top-level configuration supplied at initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub input: InputThresholds,
    pub modes: ModeTable,
    pub fly: FlySettings,
    pub teleport: TeleportSettings,
    pub manipulation: ManipulationSettings,
    /// Gravity state before any mode constrains it.
    pub gravity_enabled: bool,
    pub motion_constraint: MotionConstraint,
    /// Modes enabled right after initialization.
    pub enabled_modes: Vec<ModeKind>,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            input: InputThresholds::default(),
            modes: ModeTable::default(),
            fly: FlySettings::default(),
            teleport: TeleportSettings::default(),
            manipulation: ManipulationSettings::default(),
            gravity_enabled: true,
            motion_constraint: MotionConstraint::Normal,
            enabled_modes: Vec::new(),
        }
    }
}

impl LocomotionConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loading locomotion config");
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in ModeKind::ALL {
            self.modes.get(kind).multipliers.validate(kind)?;
        }
        validate_max_distance(self.teleport.max_distance)?;
        if !(self.fly.glitch_threshold.is_finite() && self.fly.glitch_threshold > 0.0) {
            return Err(ConfigError::InvalidGlitchThreshold(self.fly.glitch_threshold));
        }
        let m = &self.manipulation;
        if !(m.min_scale > 0.0 && m.min_scale <= m.max_scale && m.max_scale.is_finite()) {
            return Err(ConfigError::InvalidScaleLimits {
                min: m.min_scale,
                max: m.max_scale,
            });
        }
        let t = &self.input;
        if !(t.select_end < t.select_begin && t.navigate_tolerance >= 0.0) {
            return Err(ConfigError::InvalidThresholds {
                select_begin: t.select_begin,
                select_end: t.select_end,
                navigate_tolerance: t.navigate_tolerance,
            });
        }
        Ok(())
    }
}

pub(crate) fn validate_max_distance(value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidMaxDistance(value))
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{mode} {constraint} multiplier must be positive and finite, got {value}")]
    InvalidMultiplier {
        mode: ModeKind,
        constraint: MotionConstraint,
        value: f32,
    },
    #[error("teleport max distance must be positive and finite, got {0}")]
    InvalidMaxDistance(f32),
    #[error("fly glitch threshold must be positive and finite, got {0}")]
    InvalidGlitchThreshold(f32),
    #[error("scale limits invalid: min {min}, max {max}")]
    InvalidScaleLimits { min: f32, max: f32 },
    #[error(
        "input thresholds invalid: select {select_end}..{select_begin}, navigate tolerance {navigate_tolerance}"
    )]
    InvalidThresholds {
        select_begin: f32,
        select_end: f32,
        navigate_tolerance: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = LocomotionConfig::default();
        config.validate().unwrap();
        assert_eq!(config.teleport.max_distance, 20.0);
        assert_eq!(config.fly.glitch_threshold, 1.5);
        assert_eq!(config.motion_constraint, MotionConstraint::Normal);
        assert!(config.enabled_modes.is_empty());
    }

    #[test]
    fn multiplier_lookup_by_constraint() {
        let m = MotionMultipliers::new(0.25, 1.0, 3.0);
        assert_eq!(m.get(MotionConstraint::Slow), 0.25);
        assert_eq!(m.get(MotionConstraint::Normal), 1.0);
        assert_eq!(m.get(MotionConstraint::Fast), 3.0);
    }

    #[test]
    fn rejects_non_positive_multiplier() {
        let m = MotionMultipliers::new(0.0, 1.0, 2.0);
        let err = m.validate(ModeKind::Fly).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidMultiplier {
                mode: ModeKind::Fly,
                constraint: MotionConstraint::Slow,
                ..
            }
        ));
    }

    #[test]
    fn rejects_nan_multiplier() {
        let m = MotionMultipliers::new(0.5, f32::NAN, 2.0);
        assert!(m.validate(ModeKind::Navigate).is_err());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = r#"
modes:
  fly:
    multipliers: { slow: 0.1, normal: 0.2, fast: 0.3 }
    gravity: required
teleport:
  max_distance: 12.5
enabled_modes: [navigate, teleport]
"#;
        let config = LocomotionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.modes.fly.multipliers.normal, 0.2);
        assert_eq!(config.modes.fly.gravity, GravityConstraint::Required);
        assert_eq!(config.teleport.max_distance, 12.5);
        assert_eq!(
            config.enabled_modes,
            vec![ModeKind::Navigate, ModeKind::Teleport]
        );
        // Untouched sections keep their per-mode defaults.
        assert_eq!(config.modes.armswing, ModeTable::default().armswing);
        assert_eq!(config.input, InputThresholds::default());
    }

    #[test]
    fn yaml_with_bad_distance_fails_validation() {
        let err = LocomotionConfig::from_yaml_str("teleport: { max_distance: -1.0 }").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMaxDistance(_)));
    }

    #[test]
    fn inverted_select_band_is_rejected() {
        let mut config = LocomotionConfig::default();
        config.input.select_end = 0.9;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "gravity_enabled: false").unwrap();
        writeln!(file, "motion_constraint: slow").unwrap();
        let config = LocomotionConfig::load(file.path()).unwrap();
        assert!(!config.gravity_enabled);
        assert_eq!(config.motion_constraint, MotionConstraint::Slow);
    }

    #[test]
    fn yaml_round_trip_preserves_config() {
        let mut config = LocomotionConfig::default();
        config.fly.reverse_motion = true;
        let text = config.to_yaml_string().unwrap();
        let back = LocomotionConfig::from_yaml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LocomotionConfig::load("/nonexistent/locomotion.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
