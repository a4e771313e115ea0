//! The simulation context every gameplay call receives.
//!
//! [`World`] owns the physics backend, the entity registry, every spawned
//! level object, the player and the projectile manager. It implements
//! [`ContactContext`], so the contact dispatcher mutates gameplay state
//! through it, and it runs the post-step housekeeping of a tick:
//!
//! 1. flush the object destruction queue,
//! 2. run behaviors, switch timers and shooters,
//! 3. update the player (and drag pushed blocks along),
//! 4. age and flush bullets.
//!
//! Nothing in here creates or destroys a body while the physics step is
//! running; destruction always goes through a deferred queue.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use voltbot_ecs::capability::Capabilities;
use voltbot_ecs::destruction::DeferredDestructionQueue;
use voltbot_ecs::entity::EntityId;
use voltbot_ecs::registry::EntityRegistry;

use crate::behavior::BehaviorCommand;
use crate::config::GameConfig;
use crate::contact::ContactContext;
use crate::error::{GameError, LevelError};
use crate::level::{LevelData, ObjectData};
use crate::math::{Direction, Vec2};
use crate::objects::{Blueprint, LevelObject, ObjectState, PORTAL_SIZE};
use crate::physics::{
    BodyDesc, BodyKind, BodyPart, BoundaryKind, ContactEvent, ContactPhase, FixtureDesc,
    FixtureTag, Owner, PhysicsWorld,
};
use crate::player::{HitOutcome, InteractTarget, Player, PlayerSave, PLAYER_SIZE};
use crate::projectile::{ProjectileManager, ShotRequest};
use crate::switch::{self, DoorTransition};

/// Thickness of the invisible level walls, in world units.
const BOUNDARY_THICKNESS: f32 = 1.0;

/// Tolerance when comparing the bottoms of the player and a pushed block.
const PUSH_LEVEL_TOLERANCE: f32 = 0.1;

/// Something the embedding application should react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum GameEvent {
    PlayerDied,
    LevelCompleted { next_level: Option<String> },
    CheckpointSaved { level: String, save: PlayerSave },
    HintShown { text: String },
    HintClosed,
}

pub struct World<P: PhysicsWorld> {
    physics: P,
    registry: EntityRegistry,
    objects: BTreeMap<EntityId, LevelObject>,
    doomed: DeferredDestructionQueue<EntityId>,
    projectiles: ProjectileManager,
    player: Player,
    player_id: EntityId,
    level: String,
    next_level: Option<String>,
    paused: bool,
    /// The hint whose text is currently on screen.
    hint_open: Option<EntityId>,
    events: Vec<GameEvent>,
    finished: bool,
    dt: f32,
}

impl<P: PhysicsWorld> World<P> {
    /// Populate `physics` with everything `level` describes and wire its
    /// switches to their doors.
    pub fn build(config: &GameConfig, level: &LevelData, physics: P) -> Result<Self, GameError> {
        config.validate()?;
        level.validate()?;

        let mut physics = physics;
        let mut registry = EntityRegistry::new();
        let player_id = registry.spawn(Capabilities::PLAYER | Capabilities::HIT_BY_PROJECTILE);
        let spawn = Vec2::new(
            level.entrance.x + PORTAL_SIZE.x / 2.0,
            level.entrance.y + PLAYER_SIZE.y / 2.0,
        )
        .to_world();
        let body = physics.create_body(&Player::body_desc(player_id, spawn));
        registry.attach_body(player_id, body)?;

        let mut world = Self {
            physics,
            registry,
            objects: BTreeMap::new(),
            doomed: DeferredDestructionQueue::new(),
            projectiles: ProjectileManager::new(config.projectile),
            player: Player::new(body, spawn),
            player_id,
            level: level.name.clone(),
            next_level: level.next_level.clone(),
            paused: false,
            hint_open: None,
            events: Vec::new(),
            finished: false,
            dt: config.tick.fixed_dt,
        };

        world.build_boundaries(level.width as f32, level.height as f32);
        for tile in &level.tiles {
            world.insert(Blueprint::tile(tile));
        }
        world.insert(Blueprint::portal(level.entrance, false));
        world.insert(Blueprint::portal(level.exit, true));
        for (index, data) in level.objects.iter().enumerate() {
            world.insert(Blueprint::from_object(data, index)?);
        }
        world.wire(config)?;

        tracing::debug!(
            level = %world.level,
            objects = world.objects.len(),
            bodies = world.physics.body_count(),
            "level built"
        );
        Ok(world)
    }

    fn build_boundaries(&mut self, width_px: f32, height_px: f32) {
        let w = width_px / crate::math::WORLD_UNIT_TO_PIXELS;
        let h = height_px / crate::math::WORLD_UNIT_TO_PIXELS;
        let t = BOUNDARY_THICKNESS;
        let walls = [
            (BoundaryKind::Ground, Vec2::new(w / 2.0, -t), Vec2::new(w / 2.0 + 2.0 * t, t)),
            (BoundaryKind::Ceiling, Vec2::new(w / 2.0, h + t), Vec2::new(w / 2.0 + 2.0 * t, t)),
            (BoundaryKind::Left, Vec2::new(-t, h / 2.0), Vec2::new(t, h / 2.0 + 2.0 * t)),
            (BoundaryKind::Right, Vec2::new(w + t, h / 2.0), Vec2::new(t, h / 2.0 + 2.0 * t)),
        ];
        for (kind, center, half) in walls {
            let desc = BodyDesc::new(BodyKind::Static, center)
                .fixture(FixtureDesc::cuboid(half).tag(FixtureTag::boundary(kind)));
            self.physics.create_body(&desc);
        }
    }

    fn insert(&mut self, blueprint: Blueprint) -> EntityId {
        let id = self.registry.spawn(blueprint.state.capabilities());
        let body = self.physics.create_body(&blueprint.body_desc(id));
        if let Err(err) = self.registry.attach_body(id, body) {
            tracing::warn!(entity = %id, error = %err, "fresh entity rejected its body");
        }
        tracing::trace!(entity = %id, kind = blueprint.state.label(), "object spawned");
        self.objects.insert(
            id,
            LevelObject {
                body,
                size: blueprint.size,
                state: blueprint.state,
            },
        );
        id
    }

    /// Spawn one object from a level record while the level is running.
    ///
    /// Switches and doors spawned this way are not wired; wiring happens
    /// once, when the level is built.
    pub fn spawn_object(&mut self, data: &ObjectData) -> Result<EntityId, LevelError> {
        let blueprint = Blueprint::from_object(data, self.objects.len())?;
        Ok(self.insert(blueprint))
    }

    fn wire(&mut self, config: &GameConfig) -> Result<(), LevelError> {
        let mut doors = BTreeMap::new();
        let mut switches = BTreeMap::new();
        for (id, object) in self.objects.iter_mut() {
            match &mut object.state {
                ObjectState::Door(door) => {
                    doors.insert(*id, door);
                }
                ObjectState::Switch(switch) => {
                    switches.insert(*id, switch);
                }
                _ => {}
            }
        }
        switch::wire(&mut doors, &mut switches, config.wiring)?;

        let open: Vec<EntityId> = self
            .objects
            .iter()
            .filter(|(_, o)| matches!(&o.state, ObjectState::Door(door) if door.is_open()))
            .map(|(id, _)| *id)
            .collect();
        for id in open {
            self.set_door_open(id, true);
        }
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_id(&self) -> EntityId {
        self.player_id
    }

    pub fn object(&self, id: EntityId) -> Option<&LevelObject> {
        self.objects.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = (EntityId, &LevelObject)> {
        self.objects.iter().map(|(id, o)| (*id, o))
    }

    /// First object whose state matches `pred`, in entity order.
    pub fn find(&self, pred: impl Fn(&ObjectState) -> bool) -> Option<EntityId> {
        self.objects.iter().find(|(_, o)| pred(&o.state)).map(|(id, _)| *id)
    }

    pub fn projectiles(&self) -> &ProjectileManager {
        &self.projectiles
    }

    /// Body position of any live entity, player and bullets included.
    pub fn position_of(&self, id: EntityId) -> Option<Vec2> {
        let body = self.registry.body(id).ok()?;
        self.physics.position(body)
    }

    pub fn level_name(&self) -> &str {
        &self.level
    }

    pub fn next_level(&self) -> Option<&str> {
        self.next_level.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_hint_open(&self) -> bool {
        self.hint_open.is_some()
    }

    /// Whether the player died or left the level.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn fixed_dt(&self) -> f32 {
        self.dt
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: GameEvent) {
        if matches!(event, GameEvent::PlayerDied | GameEvent::LevelCompleted { .. }) {
            self.finished = true;
        }
        self.events.push(event);
    }

    fn player_position(&self) -> Vec2 {
        self.physics
            .position(self.player.body)
            .unwrap_or_else(|| self.player.checkpoint())
    }

    // -- intents ------------------------------------------------------------

    pub fn start_move(&mut self, direction: Direction) -> bool {
        self.player.start_moving(&mut self.physics, direction)
    }

    pub fn stop_move(&mut self, direction: Direction) {
        self.player.stop_moving(&mut self.physics, direction);
    }

    pub fn jump(&mut self) -> bool {
        self.player.jump(&mut self.physics)
    }

    /// Fire the player's weapon. Returns the new bullet, if the battery
    /// allowed it.
    pub fn shoot(&mut self) -> Option<EntityId> {
        let shot = self.player.shoot(&self.physics)?;
        Some(self.fire(shot))
    }

    /// Spawn a bullet on behalf of any shooter.
    pub fn fire(&mut self, shot: ShotRequest) -> EntityId {
        self.projectiles.fire(&mut self.physics, &mut self.registry, shot)
    }

    pub fn start_push(&mut self) {
        self.player.start_pushing();
    }

    pub fn stop_push(&mut self) {
        self.player.stop_pushing();
    }

    pub fn cycle_addon(&mut self, backwards: bool) {
        self.player.cycle_addon(backwards);
    }

    /// Pause or resume. Ignored while a hint is on screen.
    pub fn toggle_pause(&mut self) {
        if self.hint_open.is_some() {
            tracing::trace!("pause toggle ignored while a hint is shown");
            return;
        }
        self.paused = !self.paused;
    }

    /// Restore a checkpoint of this level. Returns `false` for a save made
    /// in another level.
    pub fn reload_from_save(&mut self, save: &PlayerSave) -> bool {
        if save.level != self.level {
            tracing::warn!(save = %save.level, level = %self.level, "save belongs to another level");
            return false;
        }
        self.player.reload_from_save(&mut self.physics, save);
        true
    }

    /// Press the action key: leave through the exit if the player is fully
    /// inside it, otherwise use the nearest touched interactable.
    pub fn interact(&mut self) {
        match self.player.interact_target() {
            InteractTarget::NextLevel => {
                tracing::debug!(level = %self.level, next = ?self.next_level, "level completed");
                let next_level = self.next_level.clone();
                self.emit(GameEvent::LevelCompleted { next_level });
            }
            InteractTarget::Object(id) => {
                let done = self.interact_with(id);
                self.player.set_interacting(!done);
            }
            InteractTarget::Nothing => {}
        }
    }

    /// Returns whether the interaction is over.
    fn interact_with(&mut self, id: EntityId) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return true;
        };
        match &mut object.state {
            ObjectState::Save => {
                let save = self.player.create_save(&self.physics, &self.level);
                tracing::debug!(entity = %id, position = ?save.position, "checkpoint saved");
                let level = self.level.clone();
                self.emit(GameEvent::CheckpointSaved { level, save });
                true
            }
            ObjectState::Hint(hint) => match hint.advance().map(str::to_owned) {
                Some(text) => {
                    self.paused = true;
                    self.hint_open = Some(id);
                    self.emit(GameEvent::HintShown { text });
                    false
                }
                None => {
                    self.paused = false;
                    self.hint_open = None;
                    self.emit(GameEvent::HintClosed);
                    true
                }
            },
            _ => true,
        }
    }

    // -- tick ---------------------------------------------------------------

    /// Advance the physics backend by one fixed step.
    pub fn step_physics(&mut self) -> Vec<ContactEvent> {
        self.physics.step(self.dt)
    }

    /// Everything that runs after contacts have been dispatched.
    pub fn finish_tick(&mut self) {
        self.flush_objects();
        self.update_objects();
        if self.player.update(&mut self.physics, self.dt) && self.player.is_pushing() {
            self.stick_movables();
        }
        self.projectiles.age(self.dt);
        self.projectiles.flush(&mut self.physics, &mut self.registry);
    }

    /// Remove every object marked for destruction. Returns how many went.
    pub fn flush_objects(&mut self) -> usize {
        let mut removed = 0;
        for id in self.doomed.drain() {
            let Some(object) = self.objects.remove(&id) else {
                continue;
            };
            self.physics.destroy_body(object.body);
            if let Err(err) = self.registry.despawn(id) {
                tracing::debug!(entity = %id, error = %err, "entity already gone from registry");
            }
            self.player.forget(id);
            if self.hint_open == Some(id) {
                self.hint_open = None;
                self.paused = false;
            }
            tracing::debug!(entity = %id, kind = object.state.label(), "entity destroyed");
            removed += 1;
        }
        removed
    }

    fn update_objects(&mut self) {
        let player = self.player_position();
        let mut shots = Vec::new();
        let mut closing = Vec::new();

        for (id, object) in self.objects.iter_mut() {
            let Some(own) = self.physics.position(object.body) else {
                continue;
            };
            match &mut object.state {
                ObjectState::MovingBlock { behavior } => {
                    if let BehaviorCommand::Move(velocity) = behavior.evaluate(own, player) {
                        self.physics.set_linear_velocity(object.body, velocity);
                    }
                }
                ObjectState::Enemy(enemy) => {
                    if let Some(velocity) = enemy.update(self.dt, own, player) {
                        self.physics.set_linear_velocity(object.body, velocity);
                    }
                    if let Some(shot) = enemy.try_shoot(self.dt, own, player, object.size.to_world()) {
                        shots.push(shot);
                    }
                }
                ObjectState::Switch(switch) => {
                    if switch.tick(self.dt) {
                        tracing::debug!(switch = %id, "switch timed out");
                        if let Some(door) = switch.door {
                            closing.push(door);
                        }
                    }
                }
                _ => {}
            }
        }

        for door in closing {
            self.opener_changed(door, false);
        }
        for shot in shots {
            self.fire(shot);
        }
    }

    /// Drag every touched movable block to the far side of the player when
    /// both stand on the same level.
    fn stick_movables(&mut self) {
        let player = self.player_position();
        let player_bottom = player.y - self.player.size().y / 2.0;
        let facing = self.player.direction().sign();
        let movables: Vec<EntityId> = self.player.movables().collect();

        for id in movables {
            let Some(object) = self.objects.get(&id) else {
                continue;
            };
            let Some(block) = self.physics.position(object.body) else {
                continue;
            };
            let size = object.size.to_world();
            let block_bottom = block.y - size.y / 2.0;
            if (player_bottom - block_bottom).abs() > PUSH_LEVEL_TOLERANCE {
                continue;
            }
            let x = player.x + facing * (self.player.trimmed_width() / 2.0 + size.x / 2.0);
            self.physics.set_position(object.body, Vec2::new(x, block.y));
        }
    }

    // -- doors --------------------------------------------------------------

    fn opener_changed(&mut self, door_id: EntityId, on: bool) {
        let transition = match self.objects.get_mut(&door_id).map(|o| &mut o.state) {
            Some(ObjectState::Door(door)) => {
                if on {
                    door.opener_on()
                } else {
                    door.opener_off()
                }
            }
            _ => return,
        };
        match transition {
            Some(DoorTransition::Opened) => self.set_door_open(door_id, true),
            Some(DoorTransition::Closed) => self.set_door_open(door_id, false),
            None => {}
        }
    }

    fn set_door_open(&mut self, id: EntityId, open: bool) {
        let Some(object) = self.objects.get(&id) else {
            return;
        };
        self.physics.set_sensor(object.body, open);
        if let Err(err) = self.registry.set_capability(id, Capabilities::TRAVERSABLE, open) {
            tracing::debug!(door = %id, error = %err, "door missing from registry");
        }
        tracing::debug!(door = %id, open, "door toggled");
    }

    // -- player contact handlers -------------------------------------------

    fn hurt_player(&mut self, strength: i32, direction: Direction) -> HitOutcome {
        let outcome = self.player.hit_by(&mut self.physics, strength, direction);
        if outcome == HitOutcome::Died {
            self.emit(GameEvent::PlayerDied);
        }
        outcome
    }

    fn refresh_nearest(&mut self) {
        let own = self.player_position();
        let objects = &self.objects;
        let physics = &self.physics;
        self.player
            .recompute_nearest(own, |id| objects.get(&id).and_then(|o| physics.position(o.body)));
    }

    fn moving_block_friction(&mut self, id: EntityId) {
        let Some(object) = self.objects.get(&id) else {
            return;
        };
        let (Some(block), Some(player)) = (
            self.physics.position(object.body),
            self.physics.position(self.player.body),
        ) else {
            return;
        };
        let size = object.size.to_world();
        let on_top = player.y - block.y >= size.y / 2.0 + self.player.size().y / 2.0 - 0.1
            && (player.x - block.x).abs() < size.x / 2.0 + self.player.trimmed_width();
        let friction = if on_top { 1.0 } else { 0.0 };
        self.physics.set_friction(object.body, friction);
    }

    fn player_contact_begin(&mut self, id: EntityId) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        match &mut object.state {
            ObjectState::Portal { exit: true } => self.player.entered_exit(),
            ObjectState::MovingBlock { .. } => self.moving_block_friction(id),
            ObjectState::MovableBlock => self.player.touch_movable(id),
            ObjectState::Addon { kind, used } => {
                if !*used {
                    *used = true;
                    let kind = *kind;
                    self.player.collect_addon(kind);
                    self.doomed.mark(id);
                    tracing::debug!(entity = %id, ?kind, "addon collected");
                }
            }
            ObjectState::Bonus { kind, used } => {
                if !*used {
                    *used = true;
                    let kind = *kind;
                    self.player.apply_bonus(kind);
                    self.doomed.mark(id);
                    tracing::debug!(entity = %id, ?kind, "bonus collected");
                }
            }
            ObjectState::Save | ObjectState::Hint(_) => {
                if self.player.touch_interactable(id) {
                    self.refresh_nearest();
                }
            }
            ObjectState::Enemy(enemy) => {
                let strength = enemy.strength();
                let body = object.body;
                let (Some(enemy), Some(player)) = (
                    self.physics.position(body),
                    self.physics.position(self.player.body),
                ) else {
                    return;
                };
                let direction = if enemy.x > player.x {
                    Direction::Left
                } else {
                    Direction::Right
                };
                self.hurt_player(strength, direction);
            }
            _ => {}
        }
    }

    fn player_contact_end(&mut self, id: EntityId) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        match &mut object.state {
            ObjectState::Portal { exit: true } => self.player.left_exit(),
            ObjectState::MovableBlock => self.player.release_movable(id),
            ObjectState::Save => {
                if self.player.release_interactable(id) {
                    self.refresh_nearest();
                }
            }
            ObjectState::Hint(hint) => {
                if self.player.release_interactable(id) {
                    hint.reset();
                    if self.hint_open == Some(id) {
                        self.hint_open = None;
                        self.paused = false;
                        self.emit(GameEvent::HintClosed);
                    }
                    self.refresh_nearest();
                }
            }
            _ => {}
        }
    }

    // -- projectile hit handlers -------------------------------------------

    fn bullet_hits_enemy(&mut self, target: EntityId, bullet: EntityId, strength: i32, direction: Direction) {
        let Some(object) = self.objects.get_mut(&target) else {
            return;
        };
        let ObjectState::Enemy(enemy) = &mut object.state else {
            return;
        };
        let dead = enemy.take_hit(strength);
        let size = object.size.to_world();
        let impulse = Vec2::new(direction.sign() * size.x * 2.0, size.y * 2.0);
        self.physics.apply_impulse(object.body, impulse);
        self.projectiles.destroy(bullet);
        if dead {
            tracing::debug!(enemy = %target, "enemy killed");
            self.doomed.mark(target);
        }
    }
}

impl<P: PhysicsWorld> ContactContext for World<P> {
    fn capabilities(&self, id: EntityId) -> Option<Capabilities> {
        self.registry.caps(id)
    }

    fn projectile_pending(&self, bullet: EntityId) -> bool {
        self.projectiles.is_pending(bullet)
    }

    fn projectile_hit(&mut self, target: EntityId, bullet: EntityId) {
        let Some((strength, direction)) = self.projectiles.get(bullet).map(|b| (b.strength, b.direction))
        else {
            return;
        };

        if target == self.player_id {
            if self.hurt_player(strength, direction) != HitOutcome::Died {
                self.projectiles.destroy(bullet);
            }
            return;
        }

        let state = self.objects.get_mut(&target).map(|o| &mut o.state);
        match state {
            Some(ObjectState::Tile { bouncy: true }) => {
                self.projectiles.invert_direction(&mut self.physics, bullet);
            }
            Some(ObjectState::Switch(switch)) => {
                let on = switch.invert();
                let door = switch.door;
                tracing::debug!(switch = %target, on, "switch toggled");
                self.projectiles.destroy(bullet);
                if let Some(door) = door {
                    self.opener_changed(door, on);
                }
            }
            Some(ObjectState::Enemy(_)) => self.bullet_hits_enemy(target, bullet, strength, direction),
            Some(_) => {
                self.projectiles.destroy(bullet);
            }
            None => {}
        }
    }

    fn destroy_projectile(&mut self, bullet: EntityId) {
        self.projectiles.destroy(bullet);
    }

    fn feet_landed(&mut self, ground: Owner) {
        self.player.feet_landed();
        if ground == Owner::Boundary(BoundaryKind::Ground) {
            tracing::debug!("player fell off the level");
            self.player.request_reset();
        }
    }

    fn feet_left(&mut self) {
        self.player.feet_left();
    }

    fn player_contact(&mut self, phase: ContactPhase, other: EntityId, _part: Option<BodyPart>) {
        if !self.registry.has(other, Capabilities::HANDLES_PLAYER_CONTACT) {
            return;
        }
        match phase {
            ContactPhase::Begin => self.player_contact_begin(other),
            ContactPhase::End => self.player_contact_end(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addon::AddonKind;
    use crate::level::{TileData, TileKind};
    use crate::physics::RapierWorld;
    use crate::player::BonusKind;

    fn level(objects: Vec<ObjectData>) -> LevelData {
        LevelData {
            name: "test".into(),
            width: 1280,
            height: 640,
            next_level: Some("second".into()),
            entrance: Vec2::new(64.0, 64.0),
            exit: Vec2::new(1088.0, 64.0),
            tiles: vec![TileData {
                x: 0,
                y: 0,
                width: 20,
                height: 1,
                kind: TileKind::Normal,
            }],
            objects,
        }
    }

    fn world(objects: Vec<ObjectData>) -> World<RapierWorld> {
        let config = GameConfig::default();
        World::build(&config, &level(objects), RapierWorld::new(config.physics.gravity)).unwrap()
    }

    #[test]
    fn build_spawns_player_boundaries_and_objects() {
        let w = world(vec![ObjectData::Save {
            position: Vec2::new(300.0, 64.0),
        }]);
        // player + 4 walls + 1 tile + 2 portals + 1 save
        assert_eq!(w.physics().body_count(), 9);
        assert_eq!(w.objects().count(), 4);
        assert!(w.registry().has(w.player_id(), Capabilities::PLAYER));
        let spawn = w.position_of(w.player_id()).unwrap();
        assert!((spawn.x - 0.96).abs() < 1e-5);
        assert!((spawn.y - 0.96).abs() < 1e-5);
    }

    #[test]
    fn doors_without_switches_start_open() {
        let w = world(vec![ObjectData::Door {
            position: Vec2::new(500.0, 64.0),
            number: 1,
        }]);
        let door = w.find(|s| matches!(s, ObjectState::Door(_))).unwrap();
        assert!(w.registry().has(door, Capabilities::TRAVERSABLE));
    }

    #[test]
    fn pickups_are_single_use() {
        let mut w = world(vec![
            ObjectData::Addon {
                position: Vec2::new(300.0, 64.0),
                addon: AddonKind::Shield,
            },
            ObjectData::Bonus {
                position: Vec2::new(400.0, 64.0),
                bonus: BonusKind::Score,
            },
        ]);
        let addon = w.find(|s| matches!(s, ObjectState::Addon { .. })).unwrap();
        let bonus = w.find(|s| matches!(s, ObjectState::Bonus { .. })).unwrap();

        for id in [addon, addon, bonus, bonus] {
            w.player_contact(ContactPhase::Begin, id, Some(BodyPart::Middle));
        }
        assert_eq!(w.player().inventory().addons().len(), 1);
        assert_eq!(w.player().score(), 1);
        assert_eq!(w.flush_objects(), 2);
        assert!(w.object(addon).is_none());
        assert!(!w.registry().is_alive(bonus));
    }

    #[test]
    fn hint_pages_through_lines_and_pauses() {
        let mut w = world(vec![ObjectData::Hint {
            position: Vec2::new(64.0, 64.0),
            text: vec!["first".into(), "second".into()],
        }]);
        let hint = w.find(|s| matches!(s, ObjectState::Hint(_))).unwrap();
        w.player_contact(ContactPhase::Begin, hint, Some(BodyPart::Middle));

        w.interact();
        w.interact();
        assert!(w.is_paused());
        w.toggle_pause();
        assert!(w.is_paused(), "pause toggle is ignored while a hint shows");
        w.interact();
        assert!(!w.is_paused());
        assert_eq!(
            w.drain_events(),
            vec![
                GameEvent::HintShown { text: "first".into() },
                GameEvent::HintShown { text: "second".into() },
                GameEvent::HintClosed,
            ]
        );
    }

    #[test]
    fn leaving_a_hint_closes_it() {
        let mut w = world(vec![ObjectData::Hint {
            position: Vec2::new(64.0, 64.0),
            text: vec!["only".into()],
        }]);
        let hint = w.find(|s| matches!(s, ObjectState::Hint(_))).unwrap();
        w.player_contact(ContactPhase::Begin, hint, Some(BodyPart::Middle));
        w.interact();
        w.player_contact(ContactPhase::End, hint, Some(BodyPart::Middle));
        assert!(!w.is_paused());
        assert!(!w.is_hint_open());
        assert_eq!(w.drain_events().last(), Some(&GameEvent::HintClosed));
    }

    #[test]
    fn exit_needs_every_body_part() {
        let mut w = world(Vec::new());
        let exit = w.find(|s| matches!(s, ObjectState::Portal { exit: true })).unwrap();
        w.player_contact(ContactPhase::Begin, exit, Some(BodyPart::Feet));
        w.interact();
        assert!(w.drain_events().is_empty());

        w.player_contact(ContactPhase::Begin, exit, Some(BodyPart::Middle));
        w.interact();
        assert_eq!(
            w.drain_events(),
            vec![GameEvent::LevelCompleted {
                next_level: Some("second".into())
            }]
        );
        assert!(w.is_finished());
    }

    #[test]
    fn reload_rejects_saves_from_other_levels() {
        let mut w = world(Vec::new());
        let mut save = w.player.create_save(&w.physics, "elsewhere");
        assert!(!w.reload_from_save(&save));
        save.level = "test".into();
        assert!(w.reload_from_save(&save));
    }
}
