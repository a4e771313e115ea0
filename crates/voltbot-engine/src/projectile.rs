//! Bullets: spawning, bouncing, ageing and deferred removal.
//!
//! Bullets are sensor bodies without gravity that keep a constant horizontal
//! velocity. They are never destroyed directly: [`ProjectileManager::destroy`]
//! marks them in a [`DeferredDestructionQueue`] and
//! [`ProjectileManager::flush`] removes their bodies once the physics step
//! has returned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use voltbot_ecs::capability::Capabilities;
use voltbot_ecs::destruction::DeferredDestructionQueue;
use voltbot_ecs::entity::EntityId;
use voltbot_ecs::registry::{BodyHandle, EntityRegistry};

use crate::config::ProjectileTuning;
use crate::math::{Direction, Vec2};
use crate::physics::{BodyDesc, BodyKind, FixtureDesc, FixtureTag, PhysicsWorld};

/// Bullet sprite size in pixels.
pub const BULLET_SIZE: Vec2 = Vec2::new(16.0, 8.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BulletKind {
    Player,
    PlayerSuper,
    Enemy,
}

/// A bullet some shooter wants fired this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub kind: BulletKind,
    /// Shooter-side origin in world units, before the half-sprite offset.
    pub origin: Vec2,
    pub direction: Direction,
    pub strength: i32,
}

/// A live bullet.
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub kind: BulletKind,
    pub body: BodyHandle,
    pub direction: Direction,
    pub strength: i32,
    /// Seconds since spawn.
    pub age: f32,
}

/// Owns every bullet of the level and its destruction queue.
#[derive(Debug)]
pub struct ProjectileManager {
    bullets: BTreeMap<EntityId, Bullet>,
    doomed: DeferredDestructionQueue<EntityId>,
    tuning: ProjectileTuning,
}

impl ProjectileManager {
    pub fn new(tuning: ProjectileTuning) -> Self {
        Self {
            bullets: BTreeMap::new(),
            doomed: DeferredDestructionQueue::new(),
            tuning,
        }
    }

    /// Create a bullet leaving `origin` (world units) in `direction`.
    ///
    /// The body starts half a sprite width ahead of the origin so the bullet
    /// appears at the shooter's edge.
    pub fn spawn(
        &mut self,
        physics: &mut dyn PhysicsWorld,
        registry: &mut EntityRegistry,
        kind: BulletKind,
        origin: Vec2,
        direction: Direction,
        strength: i32,
    ) -> EntityId {
        let id = registry.spawn(Capabilities::PROJECTILE | Capabilities::TRAVERSABLE);
        let half = BULLET_SIZE.to_world() * 0.5;
        let position = Vec2::new(origin.x + direction.sign() * half.x, origin.y);

        let desc = BodyDesc::new(BodyKind::Dynamic, position)
            .gravity_scale(0.0)
            .bullet(true)
            .velocity(Vec2::new(direction.sign() * self.tuning.speed, 0.0))
            .fixture(FixtureDesc::cuboid(half).sensor(true).tag(FixtureTag::entity(id)));
        let body = physics.create_body(&desc);
        if let Err(err) = registry.attach_body(id, body) {
            tracing::warn!(error = %err, "fresh bullet entity rejected its body");
        }

        self.bullets.insert(
            id,
            Bullet {
                kind,
                body,
                direction,
                strength,
                age: 0.0,
            },
        );
        tracing::trace!(bullet = %id, ?kind, ?direction, strength, "bullet spawned");
        id
    }

    /// Fire a [`ShotRequest`].
    pub fn fire(
        &mut self,
        physics: &mut dyn PhysicsWorld,
        registry: &mut EntityRegistry,
        shot: ShotRequest,
    ) -> EntityId {
        self.spawn(physics, registry, shot.kind, shot.origin, shot.direction, shot.strength)
    }

    /// Mark a bullet for removal. Returns `false` if it was already pending
    /// or is unknown.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        if !self.bullets.contains_key(&id) {
            return false;
        }
        self.doomed.mark(id)
    }

    /// Reverse a bullet's direction and velocity without destroying it.
    pub fn invert_direction(&mut self, physics: &mut dyn PhysicsWorld, id: EntityId) {
        let Some(bullet) = self.bullets.get_mut(&id) else {
            return;
        };
        bullet.direction = bullet.direction.opposite();
        physics.set_linear_velocity(
            bullet.body,
            Vec2::new(bullet.direction.sign() * self.tuning.speed, 0.0),
        );
        tracing::trace!(bullet = %id, direction = ?bullet.direction, "bullet bounced");
    }

    /// Age every bullet by `dt` and mark those past the configured lifetime.
    pub fn age(&mut self, dt: f32) {
        for (id, bullet) in self.bullets.iter_mut() {
            bullet.age += dt;
            if let Some(lifetime) = self.tuning.lifetime {
                if bullet.age > lifetime {
                    self.doomed.mark(*id);
                }
            }
        }
    }

    /// Remove every marked bullet from the physics world and the registry.
    /// Must only run after the physics step. Returns the number removed.
    pub fn flush(&mut self, physics: &mut dyn PhysicsWorld, registry: &mut EntityRegistry) -> usize {
        let mut removed = 0;
        for id in self.doomed.drain() {
            let Some(bullet) = self.bullets.remove(&id) else {
                continue;
            };
            physics.destroy_body(bullet.body);
            if let Err(err) = registry.despawn(id) {
                tracing::debug!(bullet = %id, error = %err, "bullet already gone from registry");
            }
            removed += 1;
        }
        if removed > 0 {
            tracing::trace!(removed, "bullets flushed");
        }
        removed
    }

    pub fn get(&self, id: EntityId) -> Option<&Bullet> {
        self.bullets.get(&id)
    }

    pub fn is_pending(&self, id: EntityId) -> bool {
        self.doomed.is_pending(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Bullet)> {
        self.bullets.iter().map(|(id, bullet)| (*id, bullet))
    }

    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::px;
    use crate::physics::RapierWorld;

    fn setup(lifetime: Option<f32>) -> (RapierWorld, EntityRegistry, ProjectileManager) {
        let tuning = ProjectileTuning {
            lifetime,
            ..ProjectileTuning::default()
        };
        (RapierWorld::new(-10.0), EntityRegistry::new(), ProjectileManager::new(tuning))
    }

    #[test]
    fn spawn_offsets_by_half_sprite_and_moves() {
        let (mut physics, mut registry, mut bullets) = setup(None);
        let id = bullets.spawn(
            &mut physics,
            &mut registry,
            BulletKind::Player,
            Vec2::new(2.0, 1.0),
            Direction::Left,
            10,
        );
        let bullet = bullets.get(id).unwrap();
        let pos = physics.position(bullet.body).unwrap();
        assert!((pos.x - (2.0 - px(8.0))).abs() < 1e-6);
        assert_eq!(pos.y, 1.0);
        assert_eq!(physics.linear_velocity(bullet.body), Some(Vec2::new(-10.0, 0.0)));
        assert!(registry.has(id, Capabilities::PROJECTILE));

        physics.step(1.0 / 45.0);
        let v = physics.linear_velocity(bullet.body).unwrap();
        assert!(v.y.abs() < 1e-4, "bullets ignore gravity");
    }

    #[test]
    fn destroy_is_idempotent() {
        let (mut physics, mut registry, mut bullets) = setup(None);
        let id = bullets.spawn(&mut physics, &mut registry, BulletKind::Enemy, Vec2::ZERO, Direction::Right, 20);

        assert!(bullets.destroy(id));
        assert!(!bullets.destroy(id));
        assert!(bullets.is_pending(id));
        assert_eq!(bullets.flush(&mut physics, &mut registry), 1);
        assert_eq!(bullets.flush(&mut physics, &mut registry), 0);
        assert!(!bullets.destroy(id), "unknown after flush");
        assert!(bullets.is_empty());
        assert_eq!(physics.body_count(), 0);
        assert!(!registry.is_alive(id));
    }

    #[test]
    fn invert_flips_direction_and_velocity() {
        let (mut physics, mut registry, mut bullets) = setup(None);
        let id = bullets.spawn(&mut physics, &mut registry, BulletKind::Player, Vec2::ZERO, Direction::Right, 10);
        bullets.invert_direction(&mut physics, id);
        let bullet = bullets.get(id).unwrap();
        assert_eq!(bullet.direction, Direction::Left);
        assert_eq!(physics.linear_velocity(bullet.body), Some(Vec2::new(-10.0, 0.0)));
        assert!(!bullets.is_pending(id));
    }

    #[test]
    fn lifetime_expires_bullets() {
        let (mut physics, mut registry, mut bullets) = setup(Some(0.5));
        let id = bullets.spawn(&mut physics, &mut registry, BulletKind::Player, Vec2::ZERO, Direction::Right, 10);
        bullets.age(0.4);
        assert!(!bullets.is_pending(id));
        bullets.age(0.2);
        assert!(bullets.is_pending(id));
        bullets.flush(&mut physics, &mut registry);
        assert!(bullets.get(id).is_none());
    }

    #[test]
    fn without_lifetime_bullets_live_forever() {
        let (mut physics, mut registry, mut bullets) = setup(None);
        let id = bullets.spawn(&mut physics, &mut registry, BulletKind::Player, Vec2::ZERO, Direction::Right, 10);
        bullets.age(1000.0);
        assert!(!bullets.is_pending(id));
    }
}
