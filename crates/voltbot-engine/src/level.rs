//! Level records and the object factory.
//!
//! A level is plain data: its extent, the entrance and exit portals, tiles
//! and a list of objects. Positions are bottom-left corners in pixels; tiles
//! are laid out on a 64 px grid. The records deserialize from JSON with a
//! `"class"` tag per object:
//!
//! ```
//! use voltbot_engine::level::{LevelData, ObjectKind};
//!
//! let level: LevelData = serde_json::from_str(r#"{
//!     "name": "intro",
//!     "width": 1280,
//!     "height": 640,
//!     "entrance": { "x": 0, "y": 64 },
//!     "exit": { "x": 1152, "y": 64 },
//!     "tiles": [{ "x": 0, "y": 0, "width": 20 }],
//!     "objects": [
//!         { "class": "door", "position": { "x": 640, "y": 64 }, "number": 1 },
//!         { "class": "switch", "position": { "x": 320, "y": 64 }, "door": 1 }
//!     ]
//! }"#).unwrap();
//! assert_eq!(level.objects[0].kind(), ObjectKind::Door);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::addon::AddonKind;
use crate::behavior::BehaviorData;
use crate::enemy::EnemyKind;
use crate::error::LevelError;
use crate::math::Vec2;
use crate::player::BonusKind;

/// Edge of a tile or block in pixels.
pub const TILE_SIZE: f32 = 64.0;

fn one() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    pub name: String,
    /// Level extent in pixels.
    pub width: i64,
    pub height: i64,
    #[serde(default)]
    pub next_level: Option<String>,
    pub entrance: Vec2,
    pub exit: Vec2,
    #[serde(default)]
    pub tiles: Vec<TileData>,
    #[serde(default)]
    pub objects: Vec<ObjectData>,
}

impl LevelData {
    /// Reject extents the world cannot be built from.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(LevelError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        for tile in &self.tiles {
            if tile.width == 0 || tile.height == 0 {
                return Err(LevelError::InvalidDimensions {
                    width: i64::from(tile.width),
                    height: i64::from(tile.height),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    #[default]
    Normal,
    /// Bullets bounce off instead of being destroyed.
    Bouncy,
}

/// A rectangle of tiles, in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileData {
    pub x: i32,
    pub y: i32,
    #[serde(default = "one")]
    pub width: u32,
    #[serde(default = "one")]
    pub height: u32,
    #[serde(default)]
    pub kind: TileKind,
}

/// Fields shared by every enemy record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyData {
    pub position: Vec2,
    #[serde(default)]
    pub behavior: BehaviorData,
}

/// One placed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "kebab-case")]
pub enum ObjectData {
    BlockMoving {
        position: Vec2,
        /// Size in blocks.
        #[serde(default = "one")]
        width: u32,
        #[serde(default = "one")]
        height: u32,
        #[serde(default)]
        behavior: BehaviorData,
    },
    BlockMovable {
        position: Vec2,
        #[serde(default = "one")]
        width: u32,
        #[serde(default = "one")]
        height: u32,
    },
    Switch {
        position: Vec2,
        /// Number of the door this switch opens.
        door: u32,
        /// Seconds before an activated switch turns itself off.
        #[serde(default)]
        timeout: Option<f32>,
    },
    Door {
        position: Vec2,
        number: u32,
    },
    Addon {
        position: Vec2,
        addon: AddonKind,
    },
    Bonus {
        position: Vec2,
        bonus: BonusKind,
    },
    Save {
        position: Vec2,
    },
    Hint {
        position: Vec2,
        #[serde(default)]
        text: Vec<String>,
    },
    EnemyLion(EnemyData),
    EnemySheep(EnemyData),
    EnemySheepSmart(EnemyData),
    EnemyTree(EnemyData),
    EnemyTripod(EnemyData),
}

/// Key of the object factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    BlockMoving,
    BlockMovable,
    Switch,
    Door,
    Addon,
    Bonus,
    Save,
    Hint,
    EnemyLion,
    EnemySheep,
    EnemySheepSmart,
    EnemyTree,
    EnemyTripod,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 13] = [
        ObjectKind::BlockMoving,
        ObjectKind::BlockMovable,
        ObjectKind::Switch,
        ObjectKind::Door,
        ObjectKind::Addon,
        ObjectKind::Bonus,
        ObjectKind::Save,
        ObjectKind::Hint,
        ObjectKind::EnemyLion,
        ObjectKind::EnemySheep,
        ObjectKind::EnemySheepSmart,
        ObjectKind::EnemyTree,
        ObjectKind::EnemyTripod,
    ];

    pub fn enemy_kind(self) -> Option<EnemyKind> {
        match self {
            ObjectKind::EnemyLion => Some(EnemyKind::Lion),
            ObjectKind::EnemySheep => Some(EnemyKind::Sheep),
            ObjectKind::EnemySheepSmart => Some(EnemyKind::SmartSheep),
            ObjectKind::EnemyTree => Some(EnemyKind::Tree),
            ObjectKind::EnemyTripod => Some(EnemyKind::Tripod),
            _ => None,
        }
    }
}

impl ObjectData {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectData::BlockMoving { .. } => ObjectKind::BlockMoving,
            ObjectData::BlockMovable { .. } => ObjectKind::BlockMovable,
            ObjectData::Switch { .. } => ObjectKind::Switch,
            ObjectData::Door { .. } => ObjectKind::Door,
            ObjectData::Addon { .. } => ObjectKind::Addon,
            ObjectData::Bonus { .. } => ObjectKind::Bonus,
            ObjectData::Save { .. } => ObjectKind::Save,
            ObjectData::Hint { .. } => ObjectKind::Hint,
            ObjectData::EnemyLion(_) => ObjectKind::EnemyLion,
            ObjectData::EnemySheep(_) => ObjectKind::EnemySheep,
            ObjectData::EnemySheepSmart(_) => ObjectKind::EnemySheepSmart,
            ObjectData::EnemyTree(_) => ObjectKind::EnemyTree,
            ObjectData::EnemyTripod(_) => ObjectKind::EnemyTripod,
        }
    }

    pub fn position(&self) -> Vec2 {
        match self {
            ObjectData::BlockMoving { position, .. }
            | ObjectData::BlockMovable { position, .. }
            | ObjectData::Switch { position, .. }
            | ObjectData::Door { position, .. }
            | ObjectData::Addon { position, .. }
            | ObjectData::Bonus { position, .. }
            | ObjectData::Save { position }
            | ObjectData::Hint { position, .. } => *position,
            ObjectData::EnemyLion(e)
            | ObjectData::EnemySheep(e)
            | ObjectData::EnemySheepSmart(e)
            | ObjectData::EnemyTree(e)
            | ObjectData::EnemyTripod(e) => e.position,
        }
    }

    /// A copy of this record placed at `position`.
    pub fn placed_at(&self, at: Vec2) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            ObjectData::BlockMoving { position, .. }
            | ObjectData::BlockMovable { position, .. }
            | ObjectData::Switch { position, .. }
            | ObjectData::Door { position, .. }
            | ObjectData::Addon { position, .. }
            | ObjectData::Bonus { position, .. }
            | ObjectData::Save { position }
            | ObjectData::Hint { position, .. } => *position = at,
            ObjectData::EnemyLion(e)
            | ObjectData::EnemySheep(e)
            | ObjectData::EnemySheepSmart(e)
            | ObjectData::EnemyTree(e)
            | ObjectData::EnemyTripod(e) => e.position = at,
        }
        copy
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Prototype registry keyed by [`ObjectKind`].
///
/// Every kind starts with a built-in template; [`ObjectFactory::register`]
/// replaces it. [`ObjectFactory::create`] copies the template to a position.
#[derive(Debug, Clone)]
pub struct ObjectFactory {
    prototypes: BTreeMap<ObjectKind, ObjectData>,
}

impl Default for ObjectFactory {
    fn default() -> Self {
        let prototypes = ObjectKind::ALL
            .iter()
            .map(|kind| (*kind, Self::prototype(*kind)))
            .collect();
        Self { prototypes }
    }
}

impl ObjectFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in template for `kind`, placed at the origin.
    pub fn prototype(kind: ObjectKind) -> ObjectData {
        let position = Vec2::ZERO;
        let enemy = |behavior| EnemyData { position, behavior };
        match kind {
            ObjectKind::BlockMoving => ObjectData::BlockMoving {
                position,
                width: 1,
                height: 1,
                behavior: BehaviorData::None,
            },
            ObjectKind::BlockMovable => ObjectData::BlockMovable {
                position,
                width: 1,
                height: 1,
            },
            ObjectKind::Switch => ObjectData::Switch {
                position,
                door: 0,
                timeout: None,
            },
            ObjectKind::Door => ObjectData::Door { position, number: 0 },
            ObjectKind::Addon => ObjectData::Addon {
                position,
                addon: AddonKind::Shield,
            },
            ObjectKind::Bonus => ObjectData::Bonus {
                position,
                bonus: BonusKind::Score,
            },
            ObjectKind::Save => ObjectData::Save { position },
            ObjectKind::Hint => ObjectData::Hint {
                position,
                text: Vec::new(),
            },
            ObjectKind::EnemyLion => ObjectData::EnemyLion(enemy(BehaviorData::None)),
            ObjectKind::EnemySheep => ObjectData::EnemySheep(enemy(BehaviorData::None)),
            ObjectKind::EnemySheepSmart => ObjectData::EnemySheepSmart(enemy(BehaviorData::None)),
            ObjectKind::EnemyTree => ObjectData::EnemyTree(enemy(BehaviorData::Static)),
            ObjectKind::EnemyTripod => ObjectData::EnemyTripod(enemy(BehaviorData::None)),
        }
    }

    /// Replace the template of `data`'s kind.
    pub fn register(&mut self, data: ObjectData) {
        self.prototypes.insert(data.kind(), data);
    }

    /// A new record of `kind` at `position`.
    pub fn create(&self, kind: ObjectKind, position: Vec2) -> ObjectData {
        match self.prototypes.get(&kind) {
            Some(prototype) => prototype.placed_at(position),
            None => Self::prototype(kind).placed_at(position),
        }
    }
}
