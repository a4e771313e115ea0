//! The simulation driver: one level, one player, one fixed-step clock.
//!
//! A tick runs, in order:
//!
//! 1. the physics step,
//! 2. contact dispatch for every event the step produced,
//! 3. the world's post-step housekeeping (see [`World::finish_tick`]).
//!
//! Intents apply immediately against the current state. Once the player has
//! died or left through the exit, the game is terminal and further ticks and
//! intents do nothing.
//!
//! ```
//! use voltbot_engine::prelude::*;
//!
//! let level: LevelData = serde_json::from_str(r#"{
//!     "name": "flat",
//!     "width": 1280,
//!     "height": 640,
//!     "entrance": { "x": 64, "y": 64 },
//!     "exit": { "x": 1088, "y": 64 },
//!     "tiles": [{ "x": 0, "y": 0, "width": 20 }]
//! }"#).unwrap();
//!
//! let config = GameConfig::default();
//! let physics = RapierWorld::new(config.physics.gravity);
//! let mut game = Game::load(&config, &level, physics).unwrap();
//!
//! game.start_move(Direction::Right);
//! for _ in 0..45 {
//!     game.tick();
//! }
//! assert_eq!(game.tick_count(), 45);
//! assert!(game.frame().digest().unwrap().len() == 64);
//! ```

use crate::config::GameConfig;
use crate::contact::ContactDispatcher;
use crate::error::GameError;
use crate::level::LevelData;
use crate::math::Direction;
use crate::physics::{ContactEvent, PhysicsWorld};
use crate::player::{Player, PlayerSave};
use crate::script::{InputScript, Intent};
use crate::snapshot::FrameView;
use crate::tick::FixedStep;
use crate::world::{GameEvent, World};

pub struct Game<P: PhysicsWorld> {
    world: World<P>,
    dispatcher: ContactDispatcher,
    clock: FixedStep,
}

impl<P: PhysicsWorld> Game<P> {
    /// Build `level` into `physics` and get ready for the first tick.
    pub fn load(config: &GameConfig, level: &LevelData, physics: P) -> Result<Self, GameError> {
        let world = World::build(config, level, physics)?;
        Ok(Self {
            world,
            dispatcher: ContactDispatcher::new(),
            clock: FixedStep::new(&config.tick),
        })
    }

    // -- driving ------------------------------------------------------------

    /// Feed a frame's real elapsed time and run every fixed step now due.
    /// Returns the number of steps taken.
    pub fn advance(&mut self, frame_seconds: f32) -> u32 {
        let due = self.clock.accumulate(frame_seconds);
        (0..due).filter(|_| self.tick()).count() as u32
    }

    /// Run one fixed step. Returns `false` when nothing ran because the game
    /// is paused or over.
    pub fn tick(&mut self) -> bool {
        if self.is_terminal() || self.world.is_paused() {
            return false;
        }

        let events = self.world.step_physics();
        for event in events {
            self.dispatcher.dispatch(&mut self.world, event);
        }
        self.world.finish_tick();
        self.clock.record_tick();

        if self.is_terminal() {
            tracing::debug!(tick = self.clock.tick_count(), "game over");
        }
        true
    }

    /// Run `ticks` steps, applying the script's intents before each one.
    /// Stops early once the game is terminal. Returns the steps taken.
    pub fn run_script(&mut self, script: &InputScript, ticks: u64) -> u64 {
        let mut ran = 0;
        for tick in 0..ticks {
            if self.is_terminal() {
                break;
            }
            for intent in script.at(tick) {
                self.apply(intent);
            }
            if self.tick() {
                ran += 1;
            }
        }
        ran
    }

    /// Route a contact through the dispatcher as if the physics step had
    /// reported it.
    pub fn inject_contact(&mut self, event: ContactEvent) {
        self.dispatcher.dispatch(&mut self.world, event);
    }

    // -- intents ------------------------------------------------------------

    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::StartMove { direction } => {
                self.start_move(direction);
            }
            Intent::StopMove { direction } => self.stop_move(direction),
            Intent::Jump => {
                self.jump();
            }
            Intent::Shoot => self.shoot(),
            Intent::Interact => self.interact(),
            Intent::StartPush => self.start_push(),
            Intent::StopPush => self.stop_push(),
            Intent::CycleAddon { backwards } => self.cycle_addon(backwards),
            Intent::TogglePause => self.toggle_pause(),
        }
    }

    /// Whether intents that act on the simulation are accepted right now.
    fn accepts_input(&self) -> bool {
        !self.is_terminal() && !self.world.is_paused()
    }

    pub fn start_move(&mut self, direction: Direction) -> bool {
        self.accepts_input() && self.world.start_move(direction)
    }

    pub fn stop_move(&mut self, direction: Direction) {
        if self.accepts_input() {
            self.world.stop_move(direction);
        }
    }

    pub fn jump(&mut self) -> bool {
        self.accepts_input() && self.world.jump()
    }

    pub fn shoot(&mut self) {
        if self.accepts_input() {
            self.world.shoot();
        }
    }

    /// Works while paused, so an open hint can be paged through.
    pub fn interact(&mut self) {
        if !self.is_terminal() {
            self.world.interact();
        }
    }

    pub fn start_push(&mut self) {
        if self.accepts_input() {
            self.world.start_push();
        }
    }

    pub fn stop_push(&mut self) {
        if self.accepts_input() {
            self.world.stop_push();
        }
    }

    pub fn cycle_addon(&mut self, backwards: bool) {
        if self.accepts_input() {
            self.world.cycle_addon(backwards);
        }
    }

    pub fn toggle_pause(&mut self) {
        if !self.is_terminal() {
            self.world.toggle_pause();
        }
    }

    /// Restore a checkpoint made in this level.
    pub fn reload_from_save(&mut self, save: &PlayerSave) -> bool {
        !self.is_terminal() && self.world.reload_from_save(save)
    }

    // -- reading ------------------------------------------------------------

    pub fn is_terminal(&self) -> bool {
        self.world.is_finished()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.world.drain_events()
    }

    pub fn frame(&self) -> FrameView {
        FrameView::capture(&self.world, self.clock.tick_count())
    }

    pub fn tick_count(&self) -> u64 {
        self.clock.tick_count()
    }

    /// Interpolation factor for rendering between the last two ticks.
    pub fn alpha(&self) -> f32 {
        self.clock.alpha()
    }

    pub fn world(&self) -> &World<P> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World<P> {
        &mut self.world
    }

    pub fn player(&self) -> &Player {
        self.world.player()
    }

    pub fn dispatcher(&self) -> &ContactDispatcher {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::RapierWorld;

    fn flat() -> Game<RapierWorld> {
        let level: LevelData = serde_json::from_str(
            r#"{
                "name": "flat",
                "width": 1280,
                "height": 640,
                "entrance": {"x": 64, "y": 64},
                "exit": {"x": 1088, "y": 64},
                "tiles": [{"x": 0, "y": 0, "width": 20}]
            }"#,
        )
        .unwrap();
        let config = GameConfig::default();
        Game::load(&config, &level, RapierWorld::new(config.physics.gravity)).unwrap()
    }

    #[test]
    fn player_lands_on_the_floor() {
        let mut game = flat();
        for _ in 0..45 {
            game.tick();
        }
        assert!(game.player().objects_below_feet() >= 1);
        assert_eq!(game.dispatcher().feet_contacts(), game.player().objects_below_feet());
    }

    #[test]
    fn advance_runs_due_steps() {
        let mut game = flat();
        assert_eq!(game.advance(0.0), 0);
        let steps = game.advance(0.1);
        assert_eq!(steps, 4);
        assert_eq!(game.tick_count(), 4);
    }

    #[test]
    fn pause_freezes_ticks_and_movement() {
        let mut game = flat();
        game.toggle_pause();
        assert!(!game.tick());
        assert!(!game.start_move(Direction::Right));
        assert_eq!(game.tick_count(), 0);
        game.toggle_pause();
        assert!(game.tick());
    }
}
