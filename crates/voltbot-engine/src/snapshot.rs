//! Read-only per-tick view of the world with a BLAKE3 digest.
//!
//! [`FrameView`] is what a renderer or UI reads once a tick has finished:
//! every entity's position, animation frame, facing and visible state, the
//! player's resources and addon inventory, and the live bullets. Entities
//! are listed in id order, so two runs fed the same inputs produce
//! byte-identical views and therefore identical digests.

use serde::{Deserialize, Serialize};
use voltbot_ecs::entity::EntityId;

use crate::addon::AddonKind;
use crate::math::{Direction, Vec2};
use crate::objects::ObjectState;
use crate::physics::PhysicsWorld;
use crate::projectile::BulletKind;
use crate::world::World;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameView {
    /// Number of ticks simulated before this view was taken.
    pub tick: u64,
    pub level: String,
    pub paused: bool,
    pub player: PlayerView,
    pub entities: Vec<EntityView>,
    pub bullets: Vec<BulletView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub position: Option<Vec2>,
    pub direction: Direction,
    pub frame: u32,
    pub moving: bool,
    pub pushing: bool,
    pub health_percent: i32,
    pub battery_percent: i32,
    pub score: u32,
    pub addons: Vec<AddonView>,
    pub current_addon: Option<usize>,
    pub ready_to_exit: bool,
    pub dead: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AddonView {
    pub kind: AddonKind,
    pub battery_percent: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: String,
    pub position: Option<Vec2>,
    pub detail: EntityDetail,
}

/// Kind-specific state a renderer needs to pick a sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum EntityDetail {
    Plain,
    Switch { on: bool },
    Door { open: bool, openers_on: u32, max_openers: u32 },
    Enemy { health: i32, direction: Direction, frame: u32, moving: bool },
    Hint { shown: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletView {
    pub id: EntityId,
    pub kind: BulletKind,
    pub position: Option<Vec2>,
    pub direction: Direction,
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

impl FrameView {
    pub fn capture<P: PhysicsWorld>(world: &World<P>, tick: u64) -> Self {
        let physics = world.physics();
        let player = world.player();
        let inventory = player.inventory();

        let player_view = PlayerView {
            position: physics.position(player.body),
            direction: player.direction(),
            frame: player.frame(),
            moving: player.is_moving(),
            pushing: player.is_pushing(),
            health_percent: player.health_percent(),
            battery_percent: player.battery_percent(),
            score: player.score(),
            addons: inventory
                .addons()
                .iter()
                .map(|a| AddonView {
                    kind: a.kind,
                    battery_percent: a.battery_percent(),
                })
                .collect(),
            current_addon: inventory.current_index(),
            ready_to_exit: player.is_ready_to_exit(),
            dead: player.is_dead(),
        };

        let entities = world
            .objects()
            .map(|(id, object)| EntityView {
                id,
                kind: object.state.label().to_owned(),
                position: physics.position(object.body),
                detail: detail(&object.state),
            })
            .collect();

        let bullets = world
            .projectiles()
            .iter()
            .map(|(id, bullet)| BulletView {
                id,
                kind: bullet.kind,
                position: physics.position(bullet.body),
                direction: bullet.direction,
            })
            .collect();

        Self {
            tick,
            level: world.level_name().to_owned(),
            paused: world.is_paused(),
            player: player_view,
            entities,
            bullets,
        }
    }

    /// BLAKE3 hex digest of the JSON-serialized view.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityView> {
        self.entities.iter().find(|e| e.id == id)
    }
}

fn detail(state: &ObjectState) -> EntityDetail {
    match state {
        ObjectState::Switch(switch) => EntityDetail::Switch { on: switch.is_on() },
        ObjectState::Door(door) => EntityDetail::Door {
            open: door.is_open(),
            openers_on: door.openers_on(),
            max_openers: door.max_openers(),
        },
        ObjectState::Enemy(enemy) => EntityDetail::Enemy {
            health: enemy.health,
            direction: enemy.direction,
            frame: enemy.frame(),
            moving: enemy.moving,
        },
        ObjectState::Hint(hint) => EntityDetail::Hint { shown: hint.shown() },
        _ => EntityDetail::Plain,
    }
}
