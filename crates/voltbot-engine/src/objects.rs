//! Live level objects and how they are built from level records.
//!
//! Every object is a [`LevelObject`]: a physics body, a sprite size and an
//! [`ObjectState`] variant. A [`Blueprint`] turns a record into the state,
//! the capability set and the body description, so spawning goes through one
//! path for every kind.

use voltbot_ecs::capability::Capabilities;
use voltbot_ecs::entity::EntityId;
use voltbot_ecs::registry::BodyHandle;

use crate::addon::AddonKind;
use crate::behavior::Behavior;
use crate::enemy::{Enemy, EnemyKind, ENEMY_GRAVITY_SCALE};
use crate::error::LevelError;
use crate::level::{EnemyData, ObjectData, TileData, TileKind, TILE_SIZE};
use crate::math::Vec2;
use crate::physics::{BodyDesc, BodyKind, FixtureDesc, FixtureTag};
use crate::player::BonusKind;
use crate::switch::{Door, Switch};

pub const PORTAL_SIZE: Vec2 = Vec2::new(64.0, 128.0);
pub const DOOR_SIZE: Vec2 = Vec2::new(32.0, 128.0);
/// Save points and hints.
pub const HELPER_SIZE: Vec2 = Vec2::new(64.0, 64.0);
/// Addon and bonus pickups.
pub const ARTIFACT_SIZE: Vec2 = Vec2::new(32.0, 32.0);

const GROUND_FRICTION: f32 = 0.1;

// ---------------------------------------------------------------------------
// Hint
// ---------------------------------------------------------------------------

/// A sign showing one line of text per interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Hint {
    lines: Vec<String>,
    next: usize,
}

impl Hint {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines, next: 0 }
    }

    /// The next line to show, or `None` once every line was shown, in which
    /// case the hint starts over.
    pub fn advance(&mut self) -> Option<&str> {
        if self.next < self.lines.len() {
            self.next += 1;
            return self.lines.get(self.next - 1).map(String::as_str);
        }
        self.reset();
        None
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Lines shown so far in the current reading.
    pub fn shown(&self) -> usize {
        self.next
    }
}

// ---------------------------------------------------------------------------
// ObjectState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum ObjectState {
    Tile { bouncy: bool },
    Portal { exit: bool },
    MovingBlock { behavior: Behavior },
    MovableBlock,
    Switch(Switch),
    Door(Door),
    Addon { kind: AddonKind, used: bool },
    Bonus { kind: BonusKind, used: bool },
    Save,
    Hint(Hint),
    Enemy(Enemy),
}

impl ObjectState {
    /// The capability set attached to the entity at spawn.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            ObjectState::Tile { .. } | ObjectState::Switch(_) => {
                Capabilities::GROUND | Capabilities::HIT_BY_PROJECTILE
            }
            ObjectState::Portal { .. } | ObjectState::Addon { .. } | ObjectState::Bonus { .. } => {
                Capabilities::TRAVERSABLE | Capabilities::HANDLES_PLAYER_CONTACT
            }
            ObjectState::MovingBlock { .. } => {
                Capabilities::GROUND | Capabilities::MOVABLE | Capabilities::HANDLES_PLAYER_CONTACT
            }
            ObjectState::MovableBlock => {
                Capabilities::GROUND | Capabilities::PUSHABLE | Capabilities::HANDLES_PLAYER_CONTACT
            }
            ObjectState::Door(_) => Capabilities::NONE,
            ObjectState::Save | ObjectState::Hint(_) => {
                Capabilities::TRAVERSABLE
                    | Capabilities::INTERACTABLE
                    | Capabilities::HANDLES_PLAYER_CONTACT
            }
            ObjectState::Enemy(_) => {
                Capabilities::HIT_BY_PROJECTILE
                    | Capabilities::HANDLES_PLAYER_CONTACT
                    | Capabilities::MOVABLE
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ObjectState::Tile { bouncy: false } => "tile",
            ObjectState::Tile { bouncy: true } => "tile-bouncy",
            ObjectState::Portal { exit: false } => "entrance",
            ObjectState::Portal { exit: true } => "exit",
            ObjectState::MovingBlock { .. } => "block-moving",
            ObjectState::MovableBlock => "block-movable",
            ObjectState::Switch(_) => "switch",
            ObjectState::Door(_) => "door",
            ObjectState::Addon { .. } => "addon",
            ObjectState::Bonus { .. } => "bonus",
            ObjectState::Save => "save",
            ObjectState::Hint(_) => "hint",
            ObjectState::Enemy(enemy) => match enemy.kind {
                EnemyKind::Lion => "enemy-lion",
                EnemyKind::Sheep => "enemy-sheep",
                EnemyKind::SmartSheep => "enemy-sheep-smart",
                EnemyKind::Tripod => "enemy-tripod",
                EnemyKind::Tree => "enemy-tree",
            },
        }
    }
}

/// A spawned object.
#[derive(Debug, Clone)]
pub struct LevelObject {
    pub body: BodyHandle,
    /// Sprite size in pixels.
    pub size: Vec2,
    pub state: ObjectState,
}

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

/// Everything needed to spawn one object.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub state: ObjectState,
    /// Bottom-left corner in pixels.
    pub position: Vec2,
    /// Sprite size in pixels.
    pub size: Vec2,
    pub body: BodyKind,
    pub sensor: bool,
    pub friction: f32,
    pub gravity_scale: f32,
}

impl Blueprint {
    fn new(state: ObjectState, position: Vec2, size: Vec2, body: BodyKind) -> Self {
        Self {
            state,
            position,
            size,
            body,
            sensor: false,
            friction: 0.0,
            gravity_scale: 1.0,
        }
    }

    fn sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn tile(tile: &TileData) -> Self {
        let position = Vec2::new(tile.x as f32 * TILE_SIZE, tile.y as f32 * TILE_SIZE);
        let size = Vec2::new(tile.width as f32 * TILE_SIZE, tile.height as f32 * TILE_SIZE);
        let state = ObjectState::Tile {
            bouncy: tile.kind == TileKind::Bouncy,
        };
        Self::new(state, position, size, BodyKind::Static).friction(GROUND_FRICTION)
    }

    pub fn portal(position: Vec2, exit: bool) -> Self {
        Self::new(ObjectState::Portal { exit }, position, PORTAL_SIZE, BodyKind::Static).sensor()
    }

    /// Build from an object record. `index` is the record's position in the
    /// level, used in error messages.
    pub fn from_object(data: &ObjectData, index: usize) -> Result<Self, LevelError> {
        let position = data.position();
        let blocks = |width: u32, height: u32| {
            Vec2::new(width.max(1) as f32 * TILE_SIZE, height.max(1) as f32 * TILE_SIZE)
        };

        let blueprint = match data {
            ObjectData::BlockMoving {
                width,
                height,
                behavior,
                ..
            } => {
                let behavior = behavior
                    .build()
                    .ok_or(LevelError::EmptyPatrol { object: index })?;
                Self::new(
                    ObjectState::MovingBlock { behavior },
                    position,
                    blocks(*width, *height),
                    BodyKind::Kinematic,
                )
            }
            ObjectData::BlockMovable { width, height, .. } => Self::new(
                ObjectState::MovableBlock,
                position,
                blocks(*width, *height),
                BodyKind::Kinematic,
            )
            .friction(GROUND_FRICTION),
            ObjectData::Switch { door, timeout, .. } => Self::new(
                ObjectState::Switch(Switch::new(*door, *timeout)),
                position,
                blocks(1, 1),
                BodyKind::Kinematic,
            )
            .friction(GROUND_FRICTION),
            ObjectData::Door { number, .. } => Self::new(
                ObjectState::Door(Door::new(*number)),
                position,
                DOOR_SIZE,
                BodyKind::Kinematic,
            ),
            ObjectData::Addon { addon, .. } => Self::new(
                ObjectState::Addon {
                    kind: *addon,
                    used: false,
                },
                position,
                ARTIFACT_SIZE,
                BodyKind::Static,
            )
            .sensor(),
            ObjectData::Bonus { bonus, .. } => Self::new(
                ObjectState::Bonus {
                    kind: *bonus,
                    used: false,
                },
                position,
                ARTIFACT_SIZE,
                BodyKind::Static,
            )
            .sensor(),
            ObjectData::Save { .. } => {
                Self::new(ObjectState::Save, position, HELPER_SIZE, BodyKind::Static).sensor()
            }
            ObjectData::Hint { text, .. } => Self::new(
                ObjectState::Hint(Hint::new(text.clone())),
                position,
                HELPER_SIZE,
                BodyKind::Static,
            )
            .sensor(),
            ObjectData::EnemyLion(enemy) => Self::enemy(EnemyKind::Lion, enemy, index)?,
            ObjectData::EnemySheep(enemy) => Self::enemy(EnemyKind::Sheep, enemy, index)?,
            ObjectData::EnemySheepSmart(enemy) => Self::enemy(EnemyKind::SmartSheep, enemy, index)?,
            ObjectData::EnemyTree(enemy) => Self::enemy(EnemyKind::Tree, enemy, index)?,
            ObjectData::EnemyTripod(enemy) => Self::enemy(EnemyKind::Tripod, enemy, index)?,
        };
        Ok(blueprint)
    }

    fn enemy(kind: EnemyKind, data: &EnemyData, index: usize) -> Result<Self, LevelError> {
        let behavior = data
            .behavior
            .build()
            .ok_or(LevelError::EmptyPatrol { object: index })?;
        let descriptor = kind.descriptor();
        let mut blueprint = Self::new(
            ObjectState::Enemy(Enemy::new(kind, behavior)),
            data.position,
            descriptor.size,
            descriptor.body,
        );
        if descriptor.body == BodyKind::Dynamic {
            blueprint.gravity_scale = ENEMY_GRAVITY_SCALE;
        }
        Ok(blueprint)
    }

    /// Body center in world units.
    pub fn center(&self) -> Vec2 {
        (self.position + self.size * 0.5).to_world()
    }

    pub fn body_desc(&self, id: EntityId) -> BodyDesc {
        let fixture = FixtureDesc::cuboid(self.size.to_world() * 0.5)
            .sensor(self.sensor)
            .friction(self.friction)
            .tag(FixtureTag::entity(id));
        BodyDesc::new(self.body, self.center())
            .gravity_scale(self.gravity_scale)
            .fixture(fixture)
    }
}
