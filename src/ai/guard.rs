//! # Spawners
//!
//! Stationary monsters that grow: every so often they bud an offspring onto a
//! free neighbouring tile and regain some health. They fight like a static
//! guard.

use super::{guard_strike, MonsterBehavior, TurnContext};
use crate::config::{MOTHER_DOUGH_SPAWN_INTERVAL, OFFSPRING_DEFINITION_ID, SPAWNER_HEAL_AMOUNT};
use crate::game::{Effect, Position};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a spawner schedules its next offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnerKind {
    /// Fixed interval of 40 turns
    MotherDough,
    /// Uniform interval in `min_spread_time..=max_spread_time`, re-rolled after each spawn
    Sourdough {
        min_spread_time: i32,
        max_spread_time: i32,
    },
}

/// A static guard with a spawn countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnerGuard {
    pub kind: SpawnerKind,
    pub turns_to_spawn: i32,
}

impl SpawnerGuard {
    /// A mother dough, first spawning after 40 turns.
    pub fn mother_dough() -> Self {
        Self {
            kind: SpawnerKind::MotherDough,
            turns_to_spawn: MOTHER_DOUGH_SPAWN_INTERVAL,
        }
    }

    /// A sourdough starter with a randomly rolled first countdown.
    pub fn sourdough(min_spread_time: i32, max_spread_time: i32, rng: &mut StdRng) -> Self {
        let kind = SpawnerKind::Sourdough {
            min_spread_time: min_spread_time.min(max_spread_time),
            max_spread_time: min_spread_time.max(max_spread_time),
        };
        Self {
            kind,
            turns_to_spawn: kind.next_interval(rng),
        }
    }

    /// The first free neighbour: open terrain without a blocking entity.
    ///
    /// Neighbours are scanned row by row, top to bottom and left to right.
    fn free_neighbour(ctx: &TurnContext<'_>) -> Option<Position> {
        ctx.owner
            .position
            .neighbours()
            .into_iter()
            .find(|pos| !ctx.map.is_blocked(*pos) && ctx.roster.blocking_entity_at(*pos).is_none())
    }
}

impl SpawnerKind {
    fn next_interval(self, rng: &mut StdRng) -> i32 {
        match self {
            SpawnerKind::MotherDough => MOTHER_DOUGH_SPAWN_INTERVAL,
            SpawnerKind::Sourdough {
                min_spread_time,
                max_spread_time,
            } => rng.gen_range(min_spread_time..=max_spread_time),
        }
    }
}

impl MonsterBehavior for SpawnerGuard {
    fn take_turn(&mut self, ctx: &TurnContext<'_>, rng: &mut StdRng) -> Vec<Effect> {
        let mut effects = Vec::new();

        if self.turns_to_spawn <= 0 {
            // A crowded spawner stays due and tries again next turn
            if let Some(position) = Self::free_neighbour(ctx) {
                log::debug!("{} spawns offspring at {:?}", ctx.owner.name, position);
                effects.push(Effect::SpawnEntity {
                    kind: OFFSPRING_DEFINITION_ID.to_string(),
                    position,
                });
                effects.push(Effect::Heal {
                    entity: ctx.owner.id,
                    amount: SPAWNER_HEAL_AMOUNT,
                });
                self.turns_to_spawn = self.kind.next_interval(rng);
            }
        } else {
            self.turns_to_spawn -= 1;
        }

        effects.extend(guard_strike(ctx));
        effects
    }

    fn describe(&self) -> &'static str {
        match self.kind {
            SpawnerKind::MotherDough => {
                "Attacks nearby targets, and spreads sourdough starters every few turns."
            }
            SpawnerKind::Sourdough { .. } => {
                "Attacks nearby targets, and spreads sourdough starters more rarely."
            }
        }
    }
}
