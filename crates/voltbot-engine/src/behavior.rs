//! Movement policies for enemies and moving blocks.
//!
//! A [`Behavior`] is chosen when its owner is spawned and never replaced.
//! Each tick it is evaluated against the owner's and the player's positions
//! and yields a [`BehaviorCommand`]; applying the command to the physics
//! body is the caller's business.

use serde::{Deserialize, Serialize};

use crate::math::{Direction, Vec2};

/// Patrol speed used when a level does not specify one.
pub const DEFAULT_PATROL_SPEED: Vec2 = Vec2::new(10.0, 0.0);

/// Remaining distances below this count as covered.
const SEGMENT_EPSILON: f32 = 1e-6;

/// What the owner should do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorCommand {
    Idle,
    /// Set the body's linear velocity.
    Move(Vec2),
    /// Turn without moving.
    Face(Direction),
}

/// Progress through a patrol route.
#[derive(Debug, Clone, PartialEq)]
pub struct Patrol {
    moves: Vec<Vec2>,
    speed: Vec2,
    index: usize,
    accumulated: Vec2,
}

impl Patrol {
    /// Returns `None` for an empty route.
    pub fn new(moves: Vec<Vec2>, speed: Vec2) -> Option<Self> {
        if moves.is_empty() {
            return None;
        }
        Some(Self {
            moves,
            speed,
            index: 0,
            accumulated: Vec2::ZERO,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Distance covered along the current segment, per axis.
    pub fn accumulated(&self) -> Vec2 {
        self.accumulated
    }

    pub fn moves(&self) -> &[Vec2] {
        &self.moves
    }

    fn advance(&mut self) -> Vec2 {
        let target = self.moves[self.index];
        let step = self.speed.to_world();

        let (dx, done_x) = axis_step(&mut self.accumulated.x, target.x, step.x);
        let (dy, done_y) = axis_step(&mut self.accumulated.y, target.y, step.y);

        if done_x && done_y {
            self.accumulated = Vec2::ZERO;
            self.index = (self.index + 1) % self.moves.len();
        }
        Vec2::new(dx, dy)
    }
}

/// Advance one axis of a patrol segment. Returns the signed step to emit and
/// whether the axis has covered its target.
fn axis_step(accumulated: &mut f32, target: f32, speed: f32) -> (f32, bool) {
    let goal = target.abs();
    let remaining = goal - *accumulated;
    if remaining <= SEGMENT_EPSILON {
        *accumulated = goal;
        return (0.0, true);
    }
    let stride = speed.abs();
    let (step, done) = if stride + SEGMENT_EPSILON >= remaining {
        *accumulated = goal;
        (remaining, true)
    } else {
        *accumulated += stride;
        (stride, false)
    };
    let sign = if target < 0.0 { -1.0 } else { 1.0 };
    (step * sign, done)
}

/// The policy attached to a behaving entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Behavior {
    #[default]
    None,
    /// Follow a looped route of relative moves at constant speed.
    Automated(Patrol),
    /// Stand still and keep facing the player.
    Static,
}

impl Behavior {
    /// Evaluate one tick.
    pub fn evaluate(&mut self, own: Vec2, player: Vec2) -> BehaviorCommand {
        match self {
            Behavior::None => BehaviorCommand::Idle,
            Behavior::Automated(patrol) => BehaviorCommand::Move(patrol.advance()),
            Behavior::Static => BehaviorCommand::Face(Direction::towards(own.x, player.x)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Behavior::None => "none",
            Behavior::Automated(_) => "automated",
            Behavior::Static => "static",
        }
    }
}

// ---------------------------------------------------------------------------
// Level data
// ---------------------------------------------------------------------------

fn default_speed() -> Vec2 {
    DEFAULT_PATROL_SPEED
}

/// Serialized form of a [`Behavior`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum BehaviorData {
    #[default]
    None,
    Automated {
        /// Pixels per tick, converted to world units on evaluation.
        #[serde(default = "default_speed")]
        speed: Vec2,
        #[serde(default)]
        moves: Vec<Vec2>,
    },
    Static,
}

impl BehaviorData {
    /// Build the runtime behavior. `None` means an automated behavior had no
    /// moves.
    pub fn build(&self) -> Option<Behavior> {
        match self {
            BehaviorData::None => Some(Behavior::None),
            BehaviorData::Static => Some(Behavior::Static),
            BehaviorData::Automated { speed, moves } => {
                if moves.iter().all(|m| m.x == 0.0 && m.y == 0.0) && !moves.is_empty() {
                    tracing::warn!(moves = moves.len(), "patrol route has only zero-length moves");
                }
                if (speed.x == 0.0 && moves.iter().any(|m| m.x != 0.0))
                    || (speed.y == 0.0 && moves.iter().any(|m| m.y != 0.0))
                {
                    tracing::warn!(?speed, "patrol speed is zero on an axis the route moves along");
                }
                Patrol::new(moves.clone(), *speed).map(Behavior::Automated)
            }
        }
    }
}
