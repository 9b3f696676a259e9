//! # Hunting Behaviors
//!
//! Monsters that chase the target. [`Hunt`] only pursues while it can see
//! the target; [`AggressiveHunt`] keeps tracking it for a while after
//! losing sight, bounded by its patience.

use super::{jitter, pursue, MonsterBehavior, TurnContext};
use crate::game::Effect;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Chases the target while in view, wanders otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunt;

/// The in-view half of both hunters: close the distance or strike.
///
/// An invisible target cannot be tracked from range, so the hunter wanders.
fn hunt_in_view(ctx: &TurnContext<'_>, rng: &mut StdRng) -> Vec<Effect> {
    if ctx.distance_to_target() >= 2.0 {
        if ctx.target.is_invisible() {
            jitter(ctx, rng)
        } else {
            pursue(ctx, rng)
        }
    } else if ctx.target_alive() {
        vec![ctx.attack()]
    } else {
        Vec::new()
    }
}

impl MonsterBehavior for Hunt {
    fn take_turn(&mut self, ctx: &TurnContext<'_>, rng: &mut StdRng) -> Vec<Effect> {
        if ctx.owner_in_fov() {
            hunt_in_view(ctx, rng)
        } else {
            jitter(ctx, rng)
        }
    }

    fn describe(&self) -> &'static str {
        "Hunts the closest target while it is in view."
    }
}

/// Keeps hunting after losing sight of the target until patience runs out.
///
/// Seeing the target refills patience and starts seeking. Out of view, each
/// turn spent seeking costs one point of patience; idle turns regain one,
/// up to `max_patience`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggressiveHunt {
    pub max_patience: i32,
    pub current_patience: i32,
    pub seeking: bool,
}

impl AggressiveHunt {
    /// Creates a hunter that starts calm, with no patience banked.
    pub fn new(max_patience: i32) -> Self {
        Self {
            max_patience,
            current_patience: 0,
            seeking: false,
        }
    }

    fn regain_patience(&mut self) {
        if self.current_patience < self.max_patience {
            self.current_patience += 1;
        }
    }
}

impl MonsterBehavior for AggressiveHunt {
    fn take_turn(&mut self, ctx: &TurnContext<'_>, rng: &mut StdRng) -> Vec<Effect> {
        if ctx.owner_in_fov() {
            self.seeking = true;
            self.current_patience = self.max_patience;
            return hunt_in_view(ctx, rng);
        }

        if self.seeking && self.current_patience > 0 {
            self.current_patience -= 1;
            if self.current_patience <= 0 {
                self.seeking = false;
            }

            // Out of view the hunter follows its last scent and ignores invisibility
            if ctx.distance_to_target() >= 2.0 {
                pursue(ctx, rng)
            } else if ctx.target_alive() {
                self.regain_patience();
                vec![ctx.attack()]
            } else {
                Vec::new()
            }
        } else {
            self.regain_patience();
            jitter(ctx, rng)
        }
    }

    fn describe(&self) -> &'static str {
        "Hunts the closest target until its patience runs out."
    }
}
