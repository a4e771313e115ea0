//! Physics boundary: the [`PhysicsWorld`] trait and its rapier2d backend.
//!
//! Gameplay code never touches rapier types. It creates bodies from a
//! [`BodyDesc`], issues velocity/impulse/transform commands through opaque
//! [`BodyHandle`]s, and receives begin/end [`ContactEvent`]s after each step.
//! Every fixture may carry a [`FixtureTag`] naming its owner; contacts on
//! untagged fixtures are still reported, with a `None` side.
//!
//! # Determinism
//!
//! rapier2d is compiled with `enhanced-determinism`. Contact events are
//! sorted after each step, and body handles are allocated from a counter, so
//! the same sequence of commands yields the same sequence of events.

use std::collections::{BTreeMap, HashMap};

use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};
use voltbot_ecs::entity::EntityId;
use voltbot_ecs::registry::BodyHandle;

use crate::math::Vec2;

// ---------------------------------------------------------------------------
// Fixture tags
// ---------------------------------------------------------------------------

/// The four invisible walls around a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    Ground,
    Ceiling,
    Left,
    Right,
}

/// Named sub-fixtures of the player's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyPart {
    Feet,
    Middle,
}

impl BodyPart {
    /// Number of tracked parts. The exit portal requires all of them inside.
    pub const COUNT: u32 = 2;
}

/// Who a fixture belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Owner {
    Entity(EntityId),
    Boundary(BoundaryKind),
}

/// User data attached to a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FixtureTag {
    pub owner: Owner,
    pub part: Option<BodyPart>,
}

impl FixtureTag {
    pub fn entity(id: EntityId) -> Self {
        Self {
            owner: Owner::Entity(id),
            part: None,
        }
    }

    pub fn part(id: EntityId, part: BodyPart) -> Self {
        Self {
            owner: Owner::Entity(id),
            part: Some(part),
        }
    }

    pub fn boundary(kind: BoundaryKind) -> Self {
        Self {
            owner: Owner::Boundary(kind),
            part: None,
        }
    }

    /// The owning entity, if the fixture is not a boundary.
    pub fn entity_id(&self) -> Option<EntityId> {
        match self.owner {
            Owner::Entity(id) => Some(id),
            Owner::Boundary(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Contact events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactPhase {
    Begin,
    End,
}

/// A begin or end contact between two fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: Option<FixtureTag>,
    pub b: Option<FixtureTag>,
}

impl ContactEvent {
    pub fn begin(a: FixtureTag, b: FixtureTag) -> Self {
        Self {
            phase: ContactPhase::Begin,
            a: Some(a),
            b: Some(b),
        }
    }

    pub fn end(a: FixtureTag, b: FixtureTag) -> Self {
        Self {
            phase: ContactPhase::End,
            a: Some(a),
            b: Some(b),
        }
    }

    /// The same contact with its sides swapped.
    pub fn swapped(self) -> Self {
        Self {
            phase: self.phase,
            a: self.b,
            b: self.a,
        }
    }

    fn sort_key(&self) -> (ContactPhase, Option<FixtureTag>, Option<FixtureTag>) {
        let (lo, hi) = if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        };
        (self.phase, lo, hi)
    }
}

// ---------------------------------------------------------------------------
// Body descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Simulated by the solver (player, enemies, bullets).
    Dynamic,
    /// Moved by setting its velocity (moving blocks, doors).
    Kinematic,
    /// Never moves (tiles, boundaries, pickups).
    Static,
}

/// An axis-aligned box fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureDesc {
    pub half_extents: Vec2,
    /// Offset of the box center from the body origin.
    pub offset: Vec2,
    pub sensor: bool,
    pub friction: f32,
    pub restitution: f32,
    pub density: f32,
    pub tag: Option<FixtureTag>,
}

impl FixtureDesc {
    pub fn cuboid(half_extents: Vec2) -> Self {
        Self {
            half_extents,
            offset: Vec2::ZERO,
            sensor: false,
            friction: 0.0,
            restitution: 0.0,
            density: 1.0,
            tag: None,
        }
    }

    pub fn offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn tag(mut self, tag: FixtureTag) -> Self {
        self.tag = Some(tag);
        self
    }
}

/// Everything needed to create a body and its fixtures.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub gravity_scale: f32,
    pub fixed_rotation: bool,
    /// Continuous collision detection for fast movers.
    pub bullet: bool,
    pub fixtures: Vec<FixtureDesc>,
}

impl BodyDesc {
    pub fn new(kind: BodyKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            fixed_rotation: true,
            bullet: false,
            fixtures: Vec::new(),
        }
    }

    pub fn velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn bullet(mut self, bullet: bool) -> Self {
        self.bullet = bullet;
        self
    }

    pub fn fixture(mut self, fixture: FixtureDesc) -> Self {
        self.fixtures.push(fixture);
        self
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld trait
// ---------------------------------------------------------------------------

/// The physics engine as seen by gameplay code.
///
/// Commands addressed to an unknown handle are ignored, and reads return
/// `None`. Bodies must only be created or destroyed between steps.
pub trait PhysicsWorld {
    /// Advance the simulation and return the contacts that began or ended.
    fn step(&mut self, dt: f32) -> Vec<ContactEvent>;

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Remove a body and its fixtures. Unknown handles are a no-op.
    fn destroy_body(&mut self, body: BodyHandle);

    /// Position of the body origin in world units.
    fn position(&self, body: BodyHandle) -> Option<Vec2>;

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2>;

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2);

    fn set_position(&mut self, body: BodyHandle, position: Vec2);

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2);

    /// Toggle every fixture of the body between solid and sensor.
    fn set_sensor(&mut self, body: BodyHandle, sensor: bool);

    /// Set the friction of every fixture of the body.
    fn set_friction(&mut self, body: BodyHandle, friction: f32);

    fn body_count(&self) -> usize;
}

// ---------------------------------------------------------------------------
// RapierWorld
// ---------------------------------------------------------------------------

/// [`PhysicsWorld`] backed by rapier2d.
pub struct RapierWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    next_handle: u64,
    bodies: BTreeMap<BodyHandle, RigidBodyHandle>,
    /// Tags of live colliders.
    collider_tags: HashMap<ColliderHandle, FixtureTag>,
    /// Tags of colliders removed since the last step. rapier reports their
    /// `Stopped` events during the next step, after which they are dropped.
    retired_tags: HashMap<ColliderHandle, FixtureTag>,
}

impl RapierWorld {
    /// Create a world with vertical gravity `gravity_y`.
    pub fn new(gravity_y: f32) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, gravity_y as Real],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            next_handle: 0,
            bodies: BTreeMap::new(),
            collider_tags: HashMap::new(),
            retired_tags: HashMap::new(),
        }
    }

    fn rigid_body(&self, body: BodyHandle) -> Option<&RigidBody> {
        let handle = self.bodies.get(&body)?;
        self.rigid_body_set.get(*handle)
    }

    fn rigid_body_mut(&mut self, body: BodyHandle) -> Option<&mut RigidBody> {
        let handle = self.bodies.get(&body)?;
        self.rigid_body_set.get_mut(*handle)
    }

    fn colliders_of(&self, body: BodyHandle) -> Vec<ColliderHandle> {
        self.rigid_body(body)
            .map(|rb| rb.colliders().to_vec())
            .unwrap_or_default()
    }

    fn tag_of(&self, collider: ColliderHandle) -> Option<FixtureTag> {
        self.collider_tags
            .get(&collider)
            .or_else(|| self.retired_tags.get(&collider))
            .copied()
    }
}

impl PhysicsWorld for RapierWorld {
    fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        self.integration_params.dt = dt as Real;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        let mut events = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            let (phase, h1, h2) = match event {
                CollisionEvent::Started(h1, h2, _) => (ContactPhase::Begin, h1, h2),
                CollisionEvent::Stopped(h1, h2, _) => (ContactPhase::End, h1, h2),
            };
            events.push(ContactEvent {
                phase,
                a: self.tag_of(h1),
                b: self.tag_of(h2),
            });
        }
        self.retired_tags.clear();

        // Channel delivery order is not guaranteed; sort so identical states
        // yield identical event sequences.
        events.sort_by_key(ContactEvent::sort_key);
        events
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let translation = vector![desc.position.x as Real, desc.position.y as Real];
        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        let mut builder = builder
            .translation(translation)
            .linvel(vector![desc.velocity.x as Real, desc.velocity.y as Real])
            .gravity_scale(desc.gravity_scale as Real)
            .ccd_enabled(desc.bullet);
        if desc.fixed_rotation {
            builder = builder.lock_rotations();
        }
        let rb_handle = self.rigid_body_set.insert(builder.build());

        for fixture in &desc.fixtures {
            let collider = ColliderBuilder::cuboid(
                fixture.half_extents.x as Real,
                fixture.half_extents.y as Real,
            )
            .translation(vector![fixture.offset.x as Real, fixture.offset.y as Real])
            .sensor(fixture.sensor)
            .friction(fixture.friction as Real)
            .restitution(fixture.restitution as Real)
            .density(fixture.density as Real)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
            let collider_handle = self.collider_set.insert_with_parent(
                collider,
                rb_handle,
                &mut self.rigid_body_set,
            );
            if let Some(tag) = fixture.tag {
                self.collider_tags.insert(collider_handle, tag);
            }
        }

        let handle = BodyHandle::from_raw(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, rb_handle);
        handle
    }

    fn destroy_body(&mut self, body: BodyHandle) {
        let Some(rb_handle) = self.bodies.remove(&body) else {
            return;
        };
        let colliders = self
            .rigid_body_set
            .get(rb_handle)
            .map(|rb| rb.colliders().to_vec())
            .unwrap_or_default();
        for collider in colliders {
            if let Some(tag) = self.collider_tags.remove(&collider) {
                self.retired_tags.insert(collider, tag);
            }
        }
        self.rigid_body_set.remove(
            rb_handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.rigid_body(body).map(|rb| {
            let t = rb.translation();
            Vec2::new(t.x, t.y)
        })
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.rigid_body(body).map(|rb| {
            let v = rb.linvel();
            Vec2::new(v.x, v.y)
        })
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(rb) = self.rigid_body_mut(body) {
            rb.set_linvel(vector![velocity.x as Real, velocity.y as Real], true);
        }
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec2) {
        if let Some(rb) = self.rigid_body_mut(body) {
            rb.set_translation(vector![position.x as Real, position.y as Real], true);
        }
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2) {
        if let Some(rb) = self.rigid_body_mut(body) {
            rb.apply_impulse(vector![impulse.x as Real, impulse.y as Real], true);
        }
    }

    fn set_sensor(&mut self, body: BodyHandle, sensor: bool) {
        for handle in self.colliders_of(body) {
            if let Some(collider) = self.collider_set.get_mut(handle) {
                collider.set_sensor(sensor);
            }
        }
    }

    fn set_friction(&mut self, body: BodyHandle, friction: f32) {
        for handle in self.colliders_of(body) {
            if let Some(collider) = self.collider_set.get_mut(handle) {
                collider.set_friction(friction as Real);
            }
        }
    }

    fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged_box(kind: BodyKind, position: Vec2, tag: FixtureTag) -> BodyDesc {
        BodyDesc::new(kind, position).fixture(FixtureDesc::cuboid(Vec2::new(0.5, 0.5)).tag(tag))
    }

    fn run_until_event(world: &mut RapierWorld, max_steps: usize) -> Vec<ContactEvent> {
        for _ in 0..max_steps {
            let events = world.step(1.0 / 45.0);
            if !events.is_empty() {
                return events;
            }
        }
        Vec::new()
    }

    #[test]
    fn create_and_destroy_body() {
        let mut world = RapierWorld::new(0.0);
        let handle = world.create_body(&BodyDesc::new(BodyKind::Static, Vec2::new(1.0, 2.0)));
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.position(handle), Some(Vec2::new(1.0, 2.0)));

        world.destroy_body(handle);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.position(handle), None);
        world.destroy_body(handle); // no-op
    }

    #[test]
    fn dynamic_body_falls_under_gravity() {
        let mut world = RapierWorld::new(-10.0);
        let body = world.create_body(
            &BodyDesc::new(BodyKind::Dynamic, Vec2::new(0.0, 5.0))
                .fixture(FixtureDesc::cuboid(Vec2::new(0.2, 0.2))),
        );
        for _ in 0..10 {
            world.step(1.0 / 45.0);
        }
        let pos = world.position(body).unwrap();
        assert!(pos.y < 5.0, "body should fall, y = {}", pos.y);
    }

    #[test]
    fn gravity_scale_zero_keeps_velocity() {
        let mut world = RapierWorld::new(-10.0);
        let body = world.create_body(
            &BodyDesc::new(BodyKind::Dynamic, Vec2::ZERO)
                .gravity_scale(0.0)
                .velocity(Vec2::new(10.0, 0.0))
                .fixture(FixtureDesc::cuboid(Vec2::new(0.08, 0.04)).sensor(true)),
        );
        world.step(1.0 / 45.0);
        let v = world.linear_velocity(body).unwrap();
        assert!((v.x - 10.0).abs() < 1e-3);
        assert!(v.y.abs() < 1e-3);
    }

    #[test]
    fn overlap_produces_tagged_begin_event() {
        let mut world = RapierWorld::new(0.0);
        let a = FixtureTag::entity(EntityId::new(0, 0));
        let b = FixtureTag::boundary(BoundaryKind::Ground);
        world.create_body(
            &tagged_box(BodyKind::Dynamic, Vec2::new(-2.0, 0.0), a).velocity(Vec2::new(20.0, 0.0)),
        );
        world.create_body(&tagged_box(BodyKind::Static, Vec2::ZERO, b));

        let events = run_until_event(&mut world, 30);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, ContactPhase::Begin);
        let sides = [events[0].a, events[0].b];
        assert!(sides.contains(&Some(a)));
        assert!(sides.contains(&Some(b)));
    }

    #[test]
    fn untagged_fixture_reports_none_side() {
        let mut world = RapierWorld::new(0.0);
        let a = FixtureTag::entity(EntityId::new(3, 0));
        world.create_body(&tagged_box(BodyKind::Dynamic, Vec2::ZERO, a));
        world.create_body(
            &BodyDesc::new(BodyKind::Static, Vec2::new(0.5, 0.0))
                .fixture(FixtureDesc::cuboid(Vec2::new(0.5, 0.5))),
        );

        let events = run_until_event(&mut world, 5);
        assert_eq!(events.len(), 1);
        assert!(events[0].a.is_none() || events[0].b.is_none());
    }

    #[test]
    fn destroyed_body_still_reports_end_event() {
        let mut world = RapierWorld::new(0.0);
        let sensor = FixtureTag::entity(EntityId::new(1, 0));
        let wall = FixtureTag::entity(EntityId::new(2, 0));
        let handle = world.create_body(
            &BodyDesc::new(BodyKind::Dynamic, Vec2::ZERO)
                .gravity_scale(0.0)
                .fixture(FixtureDesc::cuboid(Vec2::new(0.5, 0.5)).sensor(true).tag(sensor)),
        );
        world.create_body(&tagged_box(BodyKind::Static, Vec2::new(0.2, 0.0), wall));

        let begun = run_until_event(&mut world, 5);
        assert_eq!(begun.len(), 1);

        world.destroy_body(handle);
        let ended = world.step(1.0 / 45.0);
        assert_eq!(ended.len(), 1);
        assert_eq!(ended[0].phase, ContactPhase::End);
        assert!([ended[0].a, ended[0].b].contains(&Some(sensor)));
    }

    #[test]
    fn sensor_toggle_and_velocity_commands() {
        let mut world = RapierWorld::new(0.0);
        let door = world.create_body(
            &BodyDesc::new(BodyKind::Kinematic, Vec2::ZERO)
                .fixture(FixtureDesc::cuboid(Vec2::new(0.16, 0.64))),
        );
        world.set_sensor(door, true);
        world.set_friction(door, 1.0);
        world.set_linear_velocity(door, Vec2::new(0.0, 1.0));
        assert_eq!(world.linear_velocity(door), Some(Vec2::new(0.0, 1.0)));

        world.set_position(door, Vec2::new(3.0, 3.0));
        assert_eq!(world.position(door), Some(Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn swapped_events_share_sort_key() {
        let a = FixtureTag::entity(EntityId::new(0, 0));
        let b = FixtureTag::part(EntityId::new(1, 0), BodyPart::Feet);
        let e = ContactEvent::begin(a, b);
        assert_eq!(e.sort_key(), e.swapped().sort_key());
    }
}
