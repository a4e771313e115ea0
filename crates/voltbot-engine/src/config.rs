//! Simulation configuration.
//!
//! Every section is `#[serde(default)]`, so a partial JSON document only
//! overrides what it names:
//!
//! ```
//! use voltbot_engine::config::{GameConfig, WiringPolicy};
//!
//! let config = GameConfig::from_json_str(r#"{ "wiring": "strict" }"#).unwrap();
//! assert_eq!(config.wiring, WiringPolicy::Strict);
//! assert_eq!(config.physics.gravity, -10.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Physics steps per simulated second.
pub const STEPS_PER_SECOND: f32 = 45.0;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Fixed-step clock settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds per physics step.
    pub fixed_dt: f32,
    /// Upper bound on the real time a single frame may feed into the
    /// accumulator.
    pub max_frame_time: f32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / STEPS_PER_SECOND,
            max_frame_time: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical gravity in world units per second squared.
    pub gravity: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self { gravity: -10.0 }
    }
}

/// Bullet tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Horizontal speed in world units per second.
    pub speed: f32,
    /// Seconds after which a bullet is destroyed. `None` keeps bullets alive
    /// until they hit something.
    pub lifetime: Option<f32>,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 10.0,
            lifetime: None,
        }
    }
}

/// What to do with a switch whose door number matches no door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WiringPolicy {
    /// Log a warning and leave the switch unlinked.
    #[default]
    Lenient,
    /// Refuse to load the level.
    Strict,
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tick: TickConfig,
    pub physics: PhysicsConfig,
    pub projectile: ProjectileTuning,
    pub wiring: WiringPolicy,
}

impl GameConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fixed_dt = self.tick.fixed_dt;
        if !(fixed_dt.is_finite() && fixed_dt > 0.0) {
            return Err(ConfigError::InvalidTimestep { fixed_dt });
        }
        let max_frame_time = self.tick.max_frame_time;
        if !(max_frame_time.is_finite() && max_frame_time >= fixed_dt) {
            return Err(ConfigError::InvalidFrameClamp { max_frame_time });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_game_tuning() {
        let config = GameConfig::default();
        assert!((config.tick.fixed_dt - 1.0 / 45.0).abs() < 1e-9);
        assert_eq!(config.tick.max_frame_time, 0.25);
        assert_eq!(config.projectile.speed, 10.0);
        assert_eq!(config.projectile.lifetime, None);
        assert_eq!(config.wiring, WiringPolicy::Lenient);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config =
            GameConfig::from_json_str(r#"{ "projectile": { "lifetime": 2.5 } }"#).unwrap();
        assert_eq!(config.projectile.lifetime, Some(2.5));
        assert_eq!(config.projectile.speed, 10.0);
        assert_eq!(config.tick, TickConfig::default());
    }

    #[test]
    fn rejects_non_positive_timestep() {
        let err = GameConfig::from_json_str(r#"{ "tick": { "fixed_dt": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimestep { .. }));
    }

    #[test]
    fn rejects_clamp_shorter_than_step() {
        let err = GameConfig::from_json_str(r#"{ "tick": { "fixed_dt": 0.5, "max_frame_time": 0.25 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFrameClamp { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
