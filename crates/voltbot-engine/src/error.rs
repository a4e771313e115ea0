//! Error types for level loading and configuration.
//!
//! Nothing that happens inside a tick returns an error: malformed contact
//! events and stale handles are logged and dropped. These types only cover
//! defects detected before play begins.

/// Defects found while turning a level record into a live world.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// A switch targets a door number that no door in the level carries.
    #[error("switch targets door {door}, which does not exist in this level")]
    UnknownDoor { door: u32 },

    /// Two doors share the same number.
    #[error("door number {door} is used by more than one door")]
    DuplicateDoor { door: u32 },

    /// An automated behavior was declared without any moves.
    #[error("object #{object} has an automated behavior with no moves")]
    EmptyPatrol { object: usize },

    /// The level (or a tile) has a zero or negative extent.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
}

/// Invalid or unparsable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("fixed timestep must be positive and finite, got {fixed_dt}")]
    InvalidTimestep { fixed_dt: f32 },

    #[error("frame clamp {max_frame_time} must be finite and at least one timestep")]
    InvalidFrameClamp { max_frame_time: f32 },
}

/// Umbrella error returned by [`Game::load`](crate::game::Game::load).
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Level(#[from] LevelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ecs(#[from] voltbot_ecs::EcsError),
}
