//! The player's resource and ability state machine.
//!
//! [`Player`] owns everything about the robot that is not physics: health,
//! battery, score, addons, what it touches and where it respawns. Physics is
//! reached only through the [`PhysicsWorld`] passed into each call.
//!
//! # Battery
//!
//! Moving, jumping and shooting spend battery, and one point regenerates
//! every tick regardless. An action is refused only when the battery is below
//! half its cost (integer division), so the player can act down to half the
//! nominal reserve and the battery then clamps at zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use voltbot_ecs::entity::EntityId;
use voltbot_ecs::registry::BodyHandle;

use crate::addon::{Addon, AddonKind, Inventory};
use crate::animation::{Animation, ANIMATION_STEP};
use crate::math::{px, Direction, Vec2};
use crate::physics::{BodyDesc, BodyKind, BodyPart, FixtureDesc, FixtureTag, PhysicsWorld};
use crate::projectile::{BulletKind, ShotRequest};

pub const MAX_HEALTH: i32 = 100;
pub const MAX_BATTERY: i32 = 1000;

/// Horizontal speed in world units per second.
pub const PLAYER_SPEED: f32 = 3.9;
/// Damage of a normal shot. Doubled by the Strength addon.
pub const PLAYER_STRENGTH: i32 = 10;

pub const SHOOTING_POWER_USE: i32 = MAX_BATTERY / 10;
pub const JUMPING_POWER_USE: i32 = MAX_BATTERY / 15;
pub const MOVING_POWER_USE: i32 = 1;

/// Battery regained every tick.
pub const BATTERY_REGEN: i32 = 1;
/// Addon units drained by one Strength shot.
pub const STRENGTH_SHOT_COST: i32 = 30;
/// Multiplier applied to speed and animation rate by the Speed addon.
pub const SPEED_BOOST: f32 = 1.3;

/// Player sprite size in pixels.
pub const PLAYER_SIZE: Vec2 = Vec2::new(48.0, 64.0);
/// Pixels trimmed from the sprite width for the collision boxes.
const TRIM_WIDTH: f32 = 8.0;

const FIRST_FRAME: u32 = 1;
const LAST_FRAME: u32 = 8;

/// Velocities below this magnitude count as standing still.
const STILL_EPSILON: f32 = 0.1;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of [`Player::hit_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// The Shield addon took the hit.
    Absorbed,
    /// Health dropped and knockback was applied.
    Hurt,
    /// Health went below zero. Reported once.
    Died,
    /// The player was already dead.
    Ignored,
}

/// What pressing the action key should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractTarget {
    /// Every body part is inside the exit portal.
    NextLevel,
    Object(EntityId),
    Nothing,
}

/// Bonus pickup effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BonusKind {
    Battery,
    Health,
    Score,
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

/// A checkpoint of the player's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSave {
    /// Name of the level the save was made in.
    pub level: String,
    pub addons: Vec<Addon>,
    pub current_addon: Option<usize>,
    pub health: i32,
    pub score: u32,
    pub battery: i32,
    /// Body center in world units.
    pub position: Vec2,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Player {
    pub body: BodyHandle,
    size: Vec2,
    health: i32,
    battery: i32,
    score: u32,
    direction: Direction,
    moving: bool,
    pushing: bool,
    inventory: Inventory,
    objects_below_feet: u32,
    parts_inside_exit: u32,
    /// Touched interactables and how many player fixtures touch each.
    interactables: BTreeMap<EntityId, u32>,
    nearest: Option<EntityId>,
    interacting: bool,
    movables: BTreeMap<EntityId, u32>,
    animation: Animation,
    /// Where a fall onto the ground boundary sends the player back to.
    checkpoint: Vec2,
    reset_pending: bool,
    dead: bool,
}

impl Player {
    pub fn new(body: BodyHandle, checkpoint: Vec2) -> Self {
        Self {
            body,
            size: PLAYER_SIZE.to_world(),
            health: MAX_HEALTH,
            battery: MAX_BATTERY,
            score: 0,
            direction: Direction::Left,
            moving: false,
            pushing: false,
            inventory: Inventory::new(),
            objects_below_feet: 0,
            parts_inside_exit: 0,
            interactables: BTreeMap::new(),
            nearest: None,
            interacting: false,
            movables: BTreeMap::new(),
            animation: Animation::new(FIRST_FRAME, LAST_FRAME),
            checkpoint,
            reset_pending: false,
            dead: false,
        }
    }

    /// The player's body: a dynamic box for the torso and a thinner box at
    /// the bottom for the feet, both tagged with their part.
    pub fn body_desc(id: EntityId, center: Vec2) -> BodyDesc {
        let size = PLAYER_SIZE.to_world();
        let trimmed = size.x - px(TRIM_WIDTH);
        let middle = FixtureDesc::cuboid(Vec2::new(trimmed / 2.0, (size.y - px(2.0)) / 2.0))
            .density(1.0)
            .tag(FixtureTag::part(id, BodyPart::Middle));
        let feet = FixtureDesc::cuboid(Vec2::new(trimmed / 2.2, size.y / 10.0))
            .offset(Vec2::new(0.0, -size.y / 2.0 + size.y / 10.0))
            .friction(0.2)
            .tag(FixtureTag::part(id, BodyPart::Feet));
        BodyDesc::new(BodyKind::Dynamic, center).fixture(middle).fixture(feet)
    }

    // -- accessors ----------------------------------------------------------

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn battery(&self) -> i32 {
        self.battery
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn is_pushing(&self) -> bool {
        self.pushing
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn objects_below_feet(&self) -> u32 {
        self.objects_below_feet
    }

    pub fn parts_inside_exit(&self) -> u32 {
        self.parts_inside_exit
    }

    pub fn nearest_interactable(&self) -> Option<EntityId> {
        self.nearest
    }

    pub fn interactables(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.interactables.keys().copied()
    }

    pub fn movables(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.movables.keys().copied()
    }

    pub fn frame(&self) -> u32 {
        self.animation.frame()
    }

    pub fn checkpoint(&self) -> Vec2 {
        self.checkpoint
    }

    /// Sprite size in world units.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Width of the collision boxes in world units.
    pub fn trimmed_width(&self) -> f32 {
        self.size.x - px(TRIM_WIDTH)
    }

    pub fn is_ready_to_exit(&self) -> bool {
        self.parts_inside_exit == BodyPart::COUNT
    }

    pub fn health_percent(&self) -> i32 {
        self.health * 100 / MAX_HEALTH
    }

    pub fn battery_percent(&self) -> i32 {
        self.battery * 100 / MAX_BATTERY
    }

    fn speed(&self) -> f32 {
        if self.inventory.is_using(AddonKind::Speed) {
            PLAYER_SPEED * SPEED_BOOST
        } else {
            PLAYER_SPEED
        }
    }

    fn animation_step(&self) -> f32 {
        if self.inventory.is_using(AddonKind::Speed) {
            ANIMATION_STEP / 2.0
        } else {
            ANIMATION_STEP
        }
    }

    fn strength(&self) -> i32 {
        if self.inventory.is_using(AddonKind::Strength) {
            PLAYER_STRENGTH * 2
        } else {
            PLAYER_STRENGTH
        }
    }

    fn velocity(&self, physics: &dyn PhysicsWorld) -> Vec2 {
        physics.linear_velocity(self.body).unwrap_or(Vec2::ZERO)
    }

    fn is_jumping(&self, physics: &dyn PhysicsWorld) -> bool {
        self.velocity(physics).y.abs() > STILL_EPSILON && self.objects_below_feet == 0
    }

    // -- resources ----------------------------------------------------------

    pub fn increase_health(&mut self, amount: i32) {
        self.health = (self.health + amount).min(MAX_HEALTH);
    }

    pub fn increase_battery(&mut self, amount: i32) {
        self.battery = (self.battery + amount).min(MAX_BATTERY);
    }

    fn decrease_battery(&mut self, amount: i32) {
        self.battery = (self.battery - amount).max(0);
    }

    pub fn increase_score(&mut self, amount: u32) {
        self.score += amount;
    }

    pub fn apply_bonus(&mut self, bonus: BonusKind) {
        match bonus {
            BonusKind::Battery => self.increase_battery(MAX_BATTERY / 2),
            BonusKind::Health => self.increase_health(MAX_HEALTH / 2),
            BonusKind::Score => self.increase_score(1),
        }
    }

    pub fn collect_addon(&mut self, kind: AddonKind) {
        self.inventory.collect(kind);
    }

    pub fn cycle_addon(&mut self, backwards: bool) {
        self.inventory.cycle(backwards);
    }

    fn drain_addon(&mut self, amount: i32) {
        if let Some(kind) = self.inventory.drain_current(amount) {
            tracing::debug!(addon = ?kind, "addon battery empty; addon dropped");
        }
    }

    // -- movement -----------------------------------------------------------

    /// Face `direction` and start running. Returns whether a step was taken.
    pub fn start_moving(&mut self, physics: &mut dyn PhysicsWorld, direction: Direction) -> bool {
        self.moving = true;
        self.direction = direction;
        self.keep_moving(physics)
    }

    /// Stop running, but only if `direction` is the one being faced.
    pub fn stop_moving(&mut self, physics: &mut dyn PhysicsWorld, direction: Direction) {
        if direction != self.direction {
            return;
        }
        self.moving = false;
        let v = self.velocity(physics);
        physics.set_linear_velocity(self.body, Vec2::new(0.0, v.y));
    }

    fn keep_moving(&mut self, physics: &mut dyn PhysicsWorld) -> bool {
        if self.battery < MOVING_POWER_USE / 2 {
            return false;
        }
        self.decrease_battery(MOVING_POWER_USE);
        let v = self.velocity(physics);
        physics.set_linear_velocity(
            self.body,
            Vec2::new(self.direction.sign() * self.speed(), v.y),
        );
        true
    }

    /// Jump if standing on something and the battery allows it.
    pub fn jump(&mut self, physics: &mut dyn PhysicsWorld) -> bool {
        if self.objects_below_feet == 0 || self.battery < JUMPING_POWER_USE / 2 {
            return false;
        }
        physics.apply_impulse(self.body, Vec2::new(0.0, self.speed() / 2.0));
        self.decrease_battery(JUMPING_POWER_USE);
        self.animation.reset();
        true
    }

    pub fn start_pushing(&mut self) {
        self.pushing = true;
    }

    pub fn stop_pushing(&mut self) {
        self.pushing = false;
    }

    // -- combat -------------------------------------------------------------

    /// Take `strength` damage from an attacker pushing towards `direction`.
    pub fn hit_by(&mut self, physics: &mut dyn PhysicsWorld, strength: i32, direction: Direction) -> HitOutcome {
        if self.dead {
            return HitOutcome::Ignored;
        }
        if self.inventory.is_using(AddonKind::Shield) {
            return HitOutcome::Absorbed;
        }

        let raw = self.health - strength;
        self.health = raw.clamp(0, MAX_HEALTH);
        if raw < 0 {
            self.dead = true;
            self.moving = false;
            tracing::debug!(strength, "player died");
            return HitOutcome::Died;
        }

        let impulse = Vec2::new(direction.sign() * self.trimmed_width(), self.size.y / 2.0);
        physics.apply_impulse(self.body, impulse);
        HitOutcome::Hurt
    }

    /// Pay for a shot and describe the bullet to fire. `None` when the
    /// battery is too low.
    pub fn shoot(&mut self, physics: &dyn PhysicsWorld) -> Option<ShotRequest> {
        let strength = self.strength();
        let kind = if self.inventory.is_using(AddonKind::Strength) {
            self.drain_addon(STRENGTH_SHOT_COST);
            BulletKind::PlayerSuper
        } else {
            if self.battery < SHOOTING_POWER_USE / 2 {
                return None;
            }
            self.decrease_battery(SHOOTING_POWER_USE);
            BulletKind::Player
        };

        let center = physics.position(self.body)?;
        Some(ShotRequest {
            kind,
            origin: Vec2::new(center.x + self.direction.sign() * self.trimmed_width(), center.y),
            direction: self.direction,
            strength,
        })
    }

    // -- contacts -----------------------------------------------------------

    pub fn feet_landed(&mut self) {
        self.objects_below_feet += 1;
    }

    pub fn feet_left(&mut self) {
        self.objects_below_feet = self.objects_below_feet.saturating_sub(1);
    }

    pub fn entered_exit(&mut self) {
        self.parts_inside_exit = (self.parts_inside_exit + 1).min(BodyPart::COUNT);
    }

    pub fn left_exit(&mut self) {
        self.parts_inside_exit = self.parts_inside_exit.saturating_sub(1);
    }

    /// Record one more fixture touching `id`. Returns `true` on first touch.
    pub fn touch_interactable(&mut self, id: EntityId) -> bool {
        let count = self.interactables.entry(id).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Record one fixture leaving `id`. Returns `true` once nothing touches
    /// it anymore; any interaction in progress stops.
    pub fn release_interactable(&mut self, id: EntityId) -> bool {
        let Some(count) = self.interactables.get_mut(&id) else {
            return false;
        };
        *count -= 1;
        if *count > 0 {
            return false;
        }
        self.interactables.remove(&id);
        self.interacting = false;
        true
    }

    /// Pick the touched interactable closest to the player. Ties keep the
    /// lowest entity id.
    pub fn recompute_nearest(&mut self, own: Vec2, locate: impl Fn(EntityId) -> Option<Vec2>) {
        let mut best: Option<(EntityId, f32)> = None;
        for id in self.interactables.keys() {
            let Some(pos) = locate(*id) else {
                continue;
            };
            let distance = own.distance(pos);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((*id, distance));
            }
        }
        self.nearest = best.map(|(id, _)| id);
    }

    pub fn touch_movable(&mut self, id: EntityId) {
        *self.movables.entry(id).or_insert(0) += 1;
    }

    pub fn release_movable(&mut self, id: EntityId) {
        if let Some(count) = self.movables.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.movables.remove(&id);
            }
        }
    }

    /// Drop every reference to an entity that no longer exists.
    pub fn forget(&mut self, id: EntityId) {
        self.movables.remove(&id);
        if self.interactables.remove(&id).is_some() && self.nearest == Some(id) {
            self.nearest = None;
            self.interacting = false;
        }
    }

    pub fn interact_target(&self) -> InteractTarget {
        if self.is_ready_to_exit() {
            return InteractTarget::NextLevel;
        }
        self.nearest
            .map(InteractTarget::Object)
            .unwrap_or(InteractTarget::Nothing)
    }

    /// Record whether the last interaction wants further presses.
    pub fn set_interacting(&mut self, interacting: bool) {
        self.interacting = interacting;
    }

    // -- checkpoints --------------------------------------------------------

    /// Send the player back to the checkpoint at the start of the next update.
    pub fn request_reset(&mut self) {
        self.reset_pending = true;
    }

    /// Snapshot the player and make the current position the checkpoint.
    pub fn create_save(&mut self, physics: &dyn PhysicsWorld, level: &str) -> PlayerSave {
        let position = physics.position(self.body).unwrap_or(self.checkpoint);
        self.checkpoint = position;
        PlayerSave {
            level: level.to_owned(),
            addons: self.inventory.addons().to_vec(),
            current_addon: self.inventory.current_index(),
            health: self.health,
            score: self.score,
            battery: self.battery,
            position,
        }
    }

    pub fn reload_from_save(&mut self, physics: &mut dyn PhysicsWorld, save: &PlayerSave) {
        self.inventory = Inventory::from_parts(save.addons.clone(), save.current_addon);
        self.health = save.health.clamp(0, MAX_HEALTH);
        self.score = save.score;
        self.battery = save.battery.clamp(0, MAX_BATTERY);
        self.checkpoint = save.position;
        physics.set_position(self.body, save.position);
        physics.set_linear_velocity(self.body, Vec2::ZERO);
    }

    // -- per tick -----------------------------------------------------------

    /// Advance one tick. Returns whether the player took a running step, in
    /// which case pushed blocks should follow.
    pub fn update(&mut self, physics: &mut dyn PhysicsWorld, dt: f32) -> bool {
        if self.reset_pending {
            physics.set_position(self.body, self.checkpoint);
            physics.set_linear_velocity(self.body, Vec2::ZERO);
            self.reset_pending = false;
        }

        if self.velocity(physics).x.abs() < STILL_EPSILON || !self.moving {
            self.moving = false;
            self.animation.reset();
        }

        let stepped = self.moving && self.keep_moving(physics);

        if self.moving && !self.is_jumping(physics) {
            let step = self.animation_step();
            self.animation.advance(dt, step);
        }

        let airborne = self.is_jumping(physics);
        if self.inventory.is_using(AddonKind::Shield)
            || (self.inventory.is_using(AddonKind::Speed) && (self.moving || airborne))
        {
            self.drain_addon(1);
        }

        self.increase_battery(BATTERY_REGEN);
        stepped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::RapierWorld;

    fn player_in(world: &mut RapierWorld) -> Player {
        let id = EntityId::new(0, 0);
        let center = Vec2::new(2.0, 2.0);
        let body = world.create_body(&Player::body_desc(id, center));
        Player::new(body, center)
    }

    fn zero_g() -> (RapierWorld, Player) {
        let mut world = RapierWorld::new(0.0);
        let player = player_in(&mut world);
        // settle mass properties before impulses are applied
        world.step(1.0 / 45.0);
        (world, player)
    }

    #[test]
    fn jump_costs_exactly_jumping_power_and_resets_frame() {
        let (mut world, mut player) = zero_g();
        player.feet_landed();
        assert!(player.jump(&mut world));
        assert_eq!(player.battery(), MAX_BATTERY - JUMPING_POWER_USE);
        assert_eq!(JUMPING_POWER_USE, 66);
        assert_eq!(player.frame(), 1);
        assert!(world.linear_velocity(player.body).unwrap().y > 0.0);
    }

    #[test]
    fn cannot_jump_in_the_air() {
        let (mut world, mut player) = zero_g();
        assert!(!player.jump(&mut world));
        assert_eq!(player.battery(), MAX_BATTERY);
    }

    #[test]
    fn jump_allowed_down_to_half_cost() {
        let (mut world, mut player) = zero_g();
        player.feet_landed();
        player.battery = JUMPING_POWER_USE / 2;
        assert!(player.jump(&mut world));
        assert_eq!(player.battery(), 0);
        player.battery = JUMPING_POWER_USE / 2 - 1;
        assert!(!player.jump(&mut world));
    }

    #[test]
    fn shield_absorbs_hits() {
        let (mut world, mut player) = zero_g();
        player.collect_addon(AddonKind::Shield);
        let outcome = player.hit_by(&mut world, 50, Direction::Left);
        assert_eq!(outcome, HitOutcome::Absorbed);
        assert_eq!(player.health(), MAX_HEALTH);
        assert_eq!(world.linear_velocity(player.body), Some(Vec2::ZERO));
    }

    #[test]
    fn hit_applies_damage_and_knockback_away_from_attacker() {
        let (mut world, mut player) = zero_g();
        assert_eq!(player.hit_by(&mut world, 30, Direction::Left), HitOutcome::Hurt);
        assert_eq!(player.health(), 70);
        let v = world.linear_velocity(player.body).unwrap();
        assert!(v.x < 0.0 && v.y > 0.0);
    }

    #[test]
    fn death_is_reported_once() {
        let (mut world, mut player) = zero_g();
        assert_eq!(player.hit_by(&mut world, 100, Direction::Right), HitOutcome::Hurt);
        assert_eq!(player.health(), 0);
        assert_eq!(player.hit_by(&mut world, 1, Direction::Right), HitOutcome::Died);
        assert_eq!(player.hit_by(&mut world, 1, Direction::Right), HitOutcome::Ignored);
        assert_eq!(player.health(), 0);
        assert!(player.is_dead());
    }

    #[test]
    fn moving_drains_and_regen_refills() {
        let (mut world, mut player) = zero_g();
        player.battery = 500;
        assert!(player.start_moving(&mut world, Direction::Right));
        assert_eq!(player.battery(), 499);
        assert!((world.linear_velocity(player.body).unwrap().x - PLAYER_SPEED).abs() < 1e-5);

        world.step(1.0 / 45.0);
        assert!(player.update(&mut world, 1.0 / 45.0));
        // one spent, one regenerated
        assert_eq!(player.battery(), 499);
        assert!(player.is_moving());
    }

    #[test]
    fn stop_only_applies_to_faced_direction() {
        let (mut world, mut player) = zero_g();
        player.start_moving(&mut world, Direction::Right);
        player.stop_moving(&mut world, Direction::Left);
        assert!(player.is_moving());
        player.stop_moving(&mut world, Direction::Right);
        assert!(!player.is_moving());
        assert_eq!(world.linear_velocity(player.body).unwrap().x, 0.0);
    }

    #[test]
    fn speed_addon_boosts_and_drains_while_moving() {
        let (mut world, mut player) = zero_g();
        player.collect_addon(AddonKind::Speed);
        player.start_moving(&mut world, Direction::Left);
        let vx = world.linear_velocity(player.body).unwrap().x;
        assert!((vx + PLAYER_SPEED * SPEED_BOOST).abs() < 1e-5);

        world.step(1.0 / 45.0);
        player.update(&mut world, 1.0 / 45.0);
        assert_eq!(player.inventory().current().unwrap().battery, 1000 - 3);
    }

    #[test]
    fn battery_regen_clamps_to_max() {
        let (mut world, mut player) = zero_g();
        player.update(&mut world, 1.0 / 45.0);
        assert_eq!(player.battery(), MAX_BATTERY);
    }

    #[test]
    fn shooting_spends_battery_and_refuses_when_low() {
        let (world, mut player) = zero_g();
        let shot = player.shoot(&world).unwrap();
        assert_eq!(shot.kind, BulletKind::Player);
        assert_eq!(shot.strength, PLAYER_STRENGTH);
        assert_eq!(shot.direction, Direction::Left);
        assert!(shot.origin.x < 2.0);
        assert_eq!(player.battery(), MAX_BATTERY - SHOOTING_POWER_USE);

        player.battery = SHOOTING_POWER_USE / 2 - 1;
        assert!(player.shoot(&world).is_none());
    }

    #[test]
    fn strength_shot_uses_addon_battery() {
        let (world, mut player) = zero_g();
        player.collect_addon(AddonKind::Strength);
        let shot = player.shoot(&world).unwrap();
        assert_eq!(shot.kind, BulletKind::PlayerSuper);
        assert_eq!(shot.strength, PLAYER_STRENGTH * 2);
        assert_eq!(player.battery(), MAX_BATTERY);
        assert_eq!(player.inventory().current().unwrap().battery, 1000 - 90);
    }

    #[test]
    fn nearest_interactable_follows_distance() {
        let (_, mut player) = zero_g();
        let near = EntityId::new(5, 0);
        let far = EntityId::new(2, 0);
        let locate = |id: EntityId| {
            if id == near {
                Some(Vec2::new(2.5, 2.0))
            } else {
                Some(Vec2::new(4.0, 2.0))
            }
        };

        player.touch_interactable(far);
        player.recompute_nearest(Vec2::new(2.0, 2.0), locate);
        assert_eq!(player.nearest_interactable(), Some(far));

        player.touch_interactable(near);
        player.touch_interactable(near);
        player.recompute_nearest(Vec2::new(2.0, 2.0), locate);
        assert_eq!(player.interact_target(), InteractTarget::Object(near));

        assert!(!player.release_interactable(near), "second fixture still touching");
        assert!(player.release_interactable(near));
        player.recompute_nearest(Vec2::new(2.0, 2.0), locate);
        assert_eq!(player.nearest_interactable(), Some(far));
    }

    #[test]
    fn exit_requires_every_body_part() {
        let (_, mut player) = zero_g();
        player.entered_exit();
        assert_eq!(player.interact_target(), InteractTarget::Nothing);
        player.entered_exit();
        assert_eq!(player.interact_target(), InteractTarget::NextLevel);
        player.left_exit();
        assert!(!player.is_ready_to_exit());
    }

    #[test]
    fn save_round_trip_restores_state() {
        let (mut world, mut player) = zero_g();
        player.collect_addon(AddonKind::Speed);
        player.increase_score(4);
        let save = player.create_save(&world, "intro");
        assert_eq!(save.level, "intro");
        assert_eq!(save.current_addon, Some(0));

        player.hit_by(&mut world, 40, Direction::Left);
        player.cycle_addon(false);
        player.reload_from_save(&mut world, &save);
        assert_eq!(player.health(), MAX_HEALTH);
        assert_eq!(player.score(), 4);
        assert!(player.inventory().is_using(AddonKind::Speed));
        assert_eq!(world.position(player.body), Some(save.position));
    }

    #[test]
    fn reset_moves_back_to_checkpoint() {
        let (mut world, mut player) = zero_g();
        world.set_position(player.body, Vec2::new(7.0, 0.5));
        player.request_reset();
        player.update(&mut world, 1.0 / 45.0);
        assert_eq!(world.position(player.body), Some(player.checkpoint()));
    }

    #[test]
    fn bonuses_clamp_to_max() {
        let (mut world, mut player) = zero_g();
        player.hit_by(&mut world, 10, Direction::Left);
        player.apply_bonus(BonusKind::Health);
        assert_eq!(player.health(), MAX_HEALTH);
        player.apply_bonus(BonusKind::Score);
        assert_eq!(player.score(), 1);
    }
}
