//! Voltbot Engine -- entity interaction and lifecycle for a 2D platformer.
//!
//! This crate builds on [`voltbot_ecs`] to run a platformer level at a fixed
//! timestep: a rapier2d-backed physics world reports contacts, a capability
//! based dispatcher routes them to gameplay handlers, and removals are
//! deferred until the step has returned. On top of that sit the player's
//! resource state machine, enemy behaviors, switch/door linkage and the
//! projectile manager.
//!
//! # Quick Start
//!
//! ```
//! use voltbot_engine::prelude::*;
//!
//! let level: LevelData = serde_json::from_str(r#"{
//!     "name": "quick",
//!     "width": 640,
//!     "height": 320,
//!     "entrance": { "x": 0, "y": 64 },
//!     "exit": { "x": 512, "y": 64 },
//!     "tiles": [{ "x": 0, "y": 0, "width": 10 }]
//! }"#).unwrap();
//!
//! let config = GameConfig::default();
//! let mut game = Game::load(&config, &level, RapierWorld::new(config.physics.gravity)).unwrap();
//!
//! game.run_script(&InputScript::new().with(0, Intent::Shoot), 10);
//! assert_eq!(game.tick_count(), 10);
//! ```

#![deny(unsafe_code)]

pub mod addon;
pub mod animation;
pub mod behavior;
pub mod config;
pub mod contact;
pub mod enemy;
pub mod error;
pub mod game;
pub mod level;
pub mod math;
pub mod objects;
pub mod physics;
pub mod player;
pub mod projectile;
pub mod script;
pub mod snapshot;
pub mod switch;
pub mod tick;
pub mod world;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the entity crate for convenience.
pub use voltbot_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use voltbot_ecs::prelude::*;

    pub use crate::config::{GameConfig, PhysicsConfig, ProjectileTuning, TickConfig, WiringPolicy};
    pub use crate::contact::{ContactContext, ContactDispatcher};
    pub use crate::error::{ConfigError, GameError, LevelError};
    pub use crate::game::Game;
    pub use crate::level::{LevelData, ObjectData, ObjectFactory, ObjectKind};
    pub use crate::math::{Direction, Vec2};
    pub use crate::physics::{
        BodyPart, BoundaryKind, ContactEvent, ContactPhase, FixtureTag, PhysicsWorld, RapierWorld,
    };
    pub use crate::player::{Player, PlayerSave};
    pub use crate::script::{InputScript, Intent};
    pub use crate::snapshot::FrameView;
    pub use crate::world::{GameEvent, World};
}
