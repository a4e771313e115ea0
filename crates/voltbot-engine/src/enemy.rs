//! Data-driven enemies.
//!
//! Every enemy kind is described by an [`EnemyDescriptor`] (health, sprite
//! frames, size, body kind, optional shooting) instead of a subclass. The
//! runtime [`Enemy`] combines a descriptor with its behavior and mutable
//! state.

use serde::{Deserialize, Serialize};

use crate::animation::{Animation, ANIMATION_STEP};
use crate::behavior::{Behavior, BehaviorCommand};
use crate::math::{Direction, Vec2};
use crate::physics::BodyKind;
use crate::projectile::{BulletKind, ShotRequest};

/// Contact damage shared by every kind in the stock table.
const DEFAULT_STRENGTH: i32 = 10;

/// Gravity multiplier for walking enemies.
pub const ENEMY_GRAVITY_SCALE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnemyKind {
    Lion,
    Sheep,
    SmartSheep,
    Tripod,
    Tree,
}

/// Periodic shooting towards the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shooter {
    /// Minimum seconds between two shots.
    pub delay: f32,
    pub strength: i32,
    /// Vertical reach as a multiple of the enemy's height.
    pub range_heights: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyDescriptor {
    pub max_health: i32,
    /// Damage dealt to the player on contact.
    pub strength: i32,
    pub last_frame: u32,
    /// Sprite size in pixels.
    pub size: Vec2,
    pub body: BodyKind,
    /// Whether a `Face` command turns the enemy.
    pub turns: bool,
    pub shooter: Option<Shooter>,
}

impl EnemyKind {
    pub fn descriptor(self) -> EnemyDescriptor {
        let walker = |max_health, last_frame, size| EnemyDescriptor {
            max_health,
            strength: DEFAULT_STRENGTH,
            last_frame,
            size,
            body: BodyKind::Dynamic,
            turns: false,
            shooter: None,
        };
        match self {
            EnemyKind::Lion => walker(100, 5, Vec2::new(96.0, 64.0)),
            EnemyKind::Sheep => walker(10, 4, Vec2::new(64.0, 48.0)),
            EnemyKind::SmartSheep => walker(20, 4, Vec2::new(64.0, 48.0)),
            EnemyKind::Tripod => walker(50, 4, Vec2::new(64.0, 96.0)),
            EnemyKind::Tree => EnemyDescriptor {
                max_health: 60,
                strength: DEFAULT_STRENGTH,
                last_frame: 1,
                size: Vec2::new(64.0, 128.0),
                body: BodyKind::Static,
                turns: true,
                shooter: Some(Shooter {
                    delay: 1.5,
                    strength: 20,
                    range_heights: 2.0,
                }),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub descriptor: EnemyDescriptor,
    pub health: i32,
    pub direction: Direction,
    pub moving: bool,
    behavior: Behavior,
    animation: Animation,
    since_last_shot: f32,
}

impl Enemy {
    pub fn new(kind: EnemyKind, behavior: Behavior) -> Self {
        let descriptor = kind.descriptor();
        Self {
            kind,
            descriptor,
            health: descriptor.max_health,
            direction: Direction::Left,
            moving: false,
            behavior,
            animation: Animation::new(1, descriptor.last_frame),
            since_last_shot: 0.0,
        }
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn frame(&self) -> u32 {
        self.animation.frame()
    }

    /// Damage this enemy deals when it touches the player.
    pub fn strength(&self) -> i32 {
        self.descriptor.strength
    }

    /// Subtract `strength`. Returns `true` when the enemy is dead.
    pub fn take_hit(&mut self, strength: i32) -> bool {
        self.health -= strength;
        self.health <= 0
    }

    /// Animate and evaluate the behavior. Returns the velocity to apply, if
    /// the behavior asked to move.
    pub fn update(&mut self, dt: f32, own: Vec2, player: Vec2) -> Option<Vec2> {
        if self.moving {
            self.animation.advance(dt, ANIMATION_STEP);
        }
        match self.behavior.evaluate(own, player) {
            BehaviorCommand::Idle => None,
            BehaviorCommand::Move(velocity) => {
                self.direction = if velocity.x < 0.0 {
                    Direction::Left
                } else {
                    Direction::Right
                };
                self.moving = true;
                Some(velocity)
            }
            BehaviorCommand::Face(direction) => {
                if self.descriptor.turns {
                    self.direction = direction;
                }
                None
            }
        }
    }

    /// Advance the shooting timer and fire when the player is within
    /// vertical range and the delay has elapsed. `own` and `player` are body
    /// centers and `size` the enemy's extent, all in world units.
    pub fn try_shoot(&mut self, dt: f32, own: Vec2, player: Vec2, size: Vec2) -> Option<ShotRequest> {
        let shooter = self.descriptor.shooter?;
        self.since_last_shot += dt;

        let range = size.y * shooter.range_heights;
        if (own.y - player.y).abs() >= range || self.since_last_shot <= shooter.delay {
            return None;
        }
        self.since_last_shot = 0.0;

        let direction = if player.x < own.x {
            Direction::Left
        } else {
            Direction::Right
        };
        Some(ShotRequest {
            kind: BulletKind::Enemy,
            origin: Vec2::new(own.x + direction.sign() * size.x, own.y),
            direction,
            strength: shooter.strength,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Patrol;

    #[test]
    fn descriptors_follow_kind_table() {
        assert_eq!(EnemyKind::Lion.descriptor().max_health, 100);
        assert_eq!(EnemyKind::Sheep.descriptor().last_frame, 4);
        assert_eq!(EnemyKind::Tree.descriptor().body, BodyKind::Static);
        assert!(EnemyKind::Tree.descriptor().shooter.is_some());
        assert!(EnemyKind::Tripod.descriptor().shooter.is_none());
        assert_eq!(EnemyKind::Tree.descriptor().strength, 10);
        assert_eq!(Enemy::new(EnemyKind::Lion, Behavior::None).strength(), 10);
    }

    #[test]
    fn dies_at_zero_health() {
        let mut sheep = Enemy::new(EnemyKind::Sheep, Behavior::None);
        assert!(sheep.take_hit(10));
        let mut lion = Enemy::new(EnemyKind::Lion, Behavior::None);
        assert!(!lion.take_hit(10));
        assert_eq!(lion.health, 90);
    }

    #[test]
    fn patrol_move_sets_direction_and_moving() {
        let patrol = Patrol::new(vec![Vec2::new(-1.0, 0.0)], Vec2::new(10.0, 0.0)).unwrap();
        let mut lion = Enemy::new(EnemyKind::Lion, Behavior::Automated(patrol));
        let v = lion.update(1.0 / 45.0, Vec2::ZERO, Vec2::ZERO).unwrap();
        assert!(v.x < 0.0);
        assert_eq!(lion.direction, Direction::Left);
        assert!(lion.moving);
    }

    #[test]
    fn only_turning_kinds_face_the_player() {
        let mut tree = Enemy::new(EnemyKind::Tree, Behavior::Static);
        tree.update(0.1, Vec2::ZERO, Vec2::new(3.0, 0.0));
        assert_eq!(tree.direction, Direction::Right);

        let mut tripod = Enemy::new(EnemyKind::Tripod, Behavior::Static);
        tripod.update(0.1, Vec2::ZERO, Vec2::new(3.0, 0.0));
        assert_eq!(tripod.direction, Direction::Left);
    }

    #[test]
    fn tree_shoots_after_delay_when_in_range() {
        let mut tree = Enemy::new(EnemyKind::Tree, Behavior::Static);
        let size = Vec2::new(0.64, 1.28);
        let own = Vec2::new(5.0, 1.0);
        let player = Vec2::new(2.0, 1.2);

        assert!(tree.try_shoot(1.0, own, player, size).is_none());
        let shot = tree.try_shoot(0.6, own, player, size).unwrap();
        assert_eq!(shot.direction, Direction::Left);
        assert_eq!(shot.strength, 20);
        assert!((shot.origin.x - (5.0 - 0.64)).abs() < 1e-6);

        // timer restarted
        assert!(tree.try_shoot(0.1, own, player, size).is_none());
    }

    #[test]
    fn tree_holds_fire_when_player_out_of_vertical_range() {
        let mut tree = Enemy::new(EnemyKind::Tree, Behavior::Static);
        let size = Vec2::new(0.64, 1.28);
        assert!(tree
            .try_shoot(2.0, Vec2::new(5.0, 1.0), Vec2::new(2.0, 9.0), size)
            .is_none());
    }

    #[test]
    fn walkers_never_shoot() {
        let mut sheep = Enemy::new(EnemyKind::Sheep, Behavior::None);
        assert!(sheep
            .try_shoot(5.0, Vec2::ZERO, Vec2::ZERO, Vec2::new(0.64, 0.48))
            .is_none());
    }
}
