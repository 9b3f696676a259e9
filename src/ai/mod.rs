//! # Monster AI
//!
//! Per-monster behavior state machines.
//!
//! A behavior reads the world through a [`TurnContext`] and answers with a
//! list of [`Effect`]s. It never mutates the map, the roster, or its owner;
//! the only state it changes is its own counters. Swapping the owner's
//! behavior (confusion wearing off, a stun ending) is requested with
//! [`Effect::SwapBehavior`] and applied by the turn driver.
//!
//! Randomness comes from the `StdRng` passed to every turn, so the draw
//! order is part of each behavior's contract.

pub mod guard;
pub mod hunt;
pub mod stopped;

pub use guard::*;
pub use hunt::*;
pub use stopped::*;

use crate::game::{Effect, Entity, EntityRoster, GameMap};
use crate::utils::{next_step, FieldOfView};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Everything a behavior may look at while deciding its turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    /// The entity whose behavior is acting
    pub owner: &'a Entity,
    /// The entity being hunted, normally the player
    pub target: &'a Entity,
    /// The target's field of view; a monster "sees" the target when it stands in it
    pub fov: &'a FieldOfView,
    pub map: &'a GameMap,
    pub roster: &'a EntityRoster,
}

impl<'a> TurnContext<'a> {
    /// Whether the owner stands in the target's field of view.
    pub fn owner_in_fov(&self) -> bool {
        self.fov.is_in_fov(self.owner.position)
    }

    /// Euclidean distance from owner to target.
    pub fn distance_to_target(&self) -> f64 {
        self.owner.distance_to(self.target)
    }

    /// Whether the target still has hit points left.
    pub fn target_alive(&self) -> bool {
        self.target
            .fighter
            .as_ref()
            .map_or(false, |fighter| fighter.hp > 0)
    }

    fn attack(&self) -> Effect {
        Effect::Attack {
            attacker: self.owner.id,
            target: self.target.id,
        }
    }
}

/// A monster's decision procedure for one turn.
pub trait MonsterBehavior {
    /// Decides this turn and returns the requested effects in order.
    fn take_turn(&mut self, ctx: &TurnContext<'_>, rng: &mut StdRng) -> Vec<Effect>;

    /// Short human-readable description.
    fn describe(&self) -> &'static str;
}

/// The behavior attached to a monster. One variant per state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Hunt(Hunt),
    AggressiveHunt(AggressiveHunt),
    Confused(Confused),
    Dormant,
    HardStopped(HardStopped),
    SoftStopped(SoftStopped),
    StaticGuard,
    SpawnerGuard(SpawnerGuard),
}

impl Behavior {
    /// Wraps this behavior in a confusion that restores it after `turns`.
    ///
    /// # Examples
    ///
    /// ```
    /// use leaven::{Behavior, Hunt};
    ///
    /// let confused = Behavior::Hunt(Hunt).confused(10);
    /// assert!(matches!(confused, Behavior::Confused(ref c) if c.turns_left == 10));
    /// ```
    pub fn confused(self, turns: i32) -> Behavior {
        Behavior::Confused(Confused::new(self, turns))
    }

    /// Stops this behavior for exactly `turns` turns.
    pub fn hard_stopped(self, turns: i32, label: impl Into<String>) -> Behavior {
        Behavior::HardStopped(HardStopped::new(self, turns, label))
    }

    /// Stops this behavior for up to `turns` turns with a per-turn chance to resume early.
    pub fn soft_stopped(self, turns: i32, chance_per_turn: f64, label: impl Into<String>) -> Behavior {
        Behavior::SoftStopped(SoftStopped::new(self, turns, chance_per_turn, label))
    }
}

impl MonsterBehavior for Behavior {
    fn take_turn(&mut self, ctx: &TurnContext<'_>, rng: &mut StdRng) -> Vec<Effect> {
        match self {
            Behavior::Hunt(hunt) => hunt.take_turn(ctx, rng),
            Behavior::AggressiveHunt(hunt) => hunt.take_turn(ctx, rng),
            Behavior::Confused(confused) => confused.take_turn(ctx, rng),
            Behavior::Dormant => Vec::new(),
            Behavior::HardStopped(stopped) => stopped.take_turn(ctx, rng),
            Behavior::SoftStopped(stopped) => stopped.take_turn(ctx, rng),
            Behavior::StaticGuard => guard_strike(ctx).into_iter().collect(),
            Behavior::SpawnerGuard(spawner) => spawner.take_turn(ctx, rng),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Behavior::Hunt(hunt) => hunt.describe(),
            Behavior::AggressiveHunt(hunt) => hunt.describe(),
            Behavior::Confused(confused) => confused.describe(),
            Behavior::Dormant => "Does nothing.",
            Behavior::HardStopped(stopped) => stopped.describe(),
            Behavior::SoftStopped(stopped) => stopped.describe(),
            Behavior::StaticGuard => "Attacks adjacent targets but never moves.",
            Behavior::SpawnerGuard(spawner) => spawner.describe(),
        }
    }
}

/// Bounded random step used for idle wandering.
///
/// Draws `dx` then `dy` from `{-1, 0, 1}`. Only the four diagonal outcomes
/// move; the destination must be open terrain with no blocking entity.
pub fn jitter(ctx: &TurnContext<'_>, rng: &mut StdRng) -> Vec<Effect> {
    let dx = rng.gen_range(-1..=1);
    let dy = rng.gen_range(-1..=1);
    if dx == 0 || dy == 0 {
        return Vec::new();
    }

    let destination = ctx.owner.position.offset(dx, dy);
    if ctx.map.is_blocked(destination) || ctx.roster.blocking_entity_at(destination).is_some() {
        return Vec::new();
    }

    vec![Effect::Move {
        entity: ctx.owner.id,
        dx,
        dy,
    }]
}

/// One step along an A* route to the target; wanders when no route exists.
pub fn pursue(ctx: &TurnContext<'_>, rng: &mut StdRng) -> Vec<Effect> {
    let origin = ctx.owner.position;
    match next_step(ctx.map, ctx.roster, origin, ctx.target.position) {
        Some(step) if step != ctx.target.position => vec![Effect::Move {
            entity: ctx.owner.id,
            dx: step.x - origin.x,
            dy: step.y - origin.y,
        }],
        Some(_) => Vec::new(),
        None => {
            log::debug!("{} has no route to {}", ctx.owner.name, ctx.target.name);
            jitter(ctx, rng)
        }
    }
}

/// The attack a stationary guard makes, if the target is in reach.
///
/// Requires the owner in view, the target within distance 2, visible, and alive.
pub fn guard_strike(ctx: &TurnContext<'_>) -> Option<Effect> {
    (ctx.owner_in_fov()
        && ctx.distance_to_target() < 2.0
        && !ctx.target.is_invisible()
        && ctx.target_alive())
    .then(|| ctx.attack())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::game::{Position, StatusKind};
    use rand::SeedableRng;

    #[test]
    fn test_jitter_only_moves_diagonally() {
        let arena = Arena::new(Position::new(2, 2), Position::new(10, 10), Behavior::Dormant);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            for effect in jitter(&arena.ctx(), &mut rng) {
                match effect {
                    Effect::Move { entity, dx, dy } => {
                        assert_eq!(entity, MONSTER);
                        assert!(dx.abs() == 1 && dy.abs() == 1);
                    }
                    other => panic!("unexpected effect {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_jitter_never_enters_walls() {
        // Pinned in the corner, three of the four diagonals are walls
        let arena = Arena::new(Position::new(10, 10), Position::new(1, 1), Behavior::Dormant);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..200 {
            for effect in jitter(&arena.ctx(), &mut rng) {
                assert_eq!(
                    effect,
                    Effect::Move {
                        entity: MONSTER,
                        dx: 1,
                        dy: 1
                    }
                );
            }
        }
    }

    #[test]
    fn test_guard_strike_conditions() {
        let mut arena = Arena::new(Position::new(5, 5), Position::new(6, 6), Behavior::StaticGuard);
        assert!(guard_strike(&arena.ctx()).is_some());

        arena
            .roster
            .get_mut(PLAYER)
            .and_then(|player| player.fighter.as_mut())
            .unwrap()
            .set_status(StatusKind::Invisible, 3);
        assert!(guard_strike(&arena.ctx()).is_none());

        let arena = Arena::new(Position::new(5, 5), Position::new(7, 5), Behavior::StaticGuard);
        assert!(guard_strike(&arena.ctx()).is_none());
    }

    #[test]
    fn test_dormant_does_nothing() {
        let arena = Arena::new(Position::new(5, 5), Position::new(6, 5), Behavior::Dormant);
        let mut rng = StdRng::seed_from_u64(0);
        let mut behavior = Behavior::Dormant;
        assert!(behavior.take_turn(&arena.ctx(), &mut rng).is_empty());
    }

    #[test]
    fn test_behavior_serializes() {
        let behavior = Behavior::AggressiveHunt(AggressiveHunt::new(20)).confused(10);
        let json = serde_json::to_string(&behavior).unwrap();
        let restored: Behavior = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, behavior);
    }
}
