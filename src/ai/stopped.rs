//! # Temporary Behaviors
//!
//! Behaviors that wrap a monster's regular behavior for a while and then hand
//! it back. Each keeps the previous behavior boxed and, when it expires,
//! returns an [`Effect::SwapBehavior`] restoring it together with a message.

use super::{jitter, Behavior, MonsterBehavior, TurnContext};
use crate::game::{Color, Effect};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

fn restore(ctx: &TurnContext<'_>, previous: &Behavior, label: &str) -> Vec<Effect> {
    vec![
        Effect::SwapBehavior {
            entity: ctx.owner.id,
            behavior: Box::new(previous.clone()),
        },
        Effect::message(
            format!("The {} is no longer {}!", ctx.owner.name, label),
            Color::RED,
        ),
    ]
}

/// Stumbles around at random, then recovers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confused {
    pub previous: Box<Behavior>,
    pub turns_left: i32,
}

impl Confused {
    pub fn new(previous: Behavior, turns: i32) -> Self {
        Self {
            previous: Box::new(previous),
            turns_left: turns,
        }
    }
}

impl MonsterBehavior for Confused {
    fn take_turn(&mut self, ctx: &TurnContext<'_>, rng: &mut StdRng) -> Vec<Effect> {
        if self.turns_left > 0 {
            self.turns_left -= 1;
            jitter(ctx, rng)
        } else {
            restore(ctx, &self.previous, "confused")
        }
    }

    fn describe(&self) -> &'static str {
        "Walks in a random direction until no longer confused."
    }
}

/// Does nothing for a fixed number of turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardStopped {
    pub previous: Box<Behavior>,
    pub turns_left: i32,
    /// Completes "The X is no longer ...!"
    pub label: String,
}

impl HardStopped {
    pub fn new(previous: Behavior, turns: i32, label: impl Into<String>) -> Self {
        Self {
            previous: Box::new(previous),
            turns_left: turns,
            label: label.into(),
        }
    }
}

impl MonsterBehavior for HardStopped {
    fn take_turn(&mut self, ctx: &TurnContext<'_>, _rng: &mut StdRng) -> Vec<Effect> {
        if self.turns_left > 0 {
            self.turns_left -= 1;
            Vec::new()
        } else {
            restore(ctx, &self.previous, &self.label)
        }
    }

    fn describe(&self) -> &'static str {
        "Resumes its previous behavior after a fixed number of turns."
    }
}

/// Does nothing for up to `turns_left` turns, with a chance each turn to
/// recover early.
///
/// The turn it is applied on never counts: the first call only clears
/// `first_turn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftStopped {
    pub previous: Box<Behavior>,
    pub turns_left: i32,
    pub chance_per_turn: f64,
    pub label: String,
    pub first_turn: bool,
}

impl SoftStopped {
    pub fn new(previous: Behavior, turns: i32, chance_per_turn: f64, label: impl Into<String>) -> Self {
        Self {
            previous: Box::new(previous),
            turns_left: turns,
            chance_per_turn,
            label: label.into(),
            first_turn: true,
        }
    }
}

impl MonsterBehavior for SoftStopped {
    fn take_turn(&mut self, ctx: &TurnContext<'_>, rng: &mut StdRng) -> Vec<Effect> {
        if self.first_turn {
            self.first_turn = false;
            Vec::new()
        } else if self.turns_left != 0 {
            self.turns_left -= 1;
            if rng.gen::<f64>() < self.chance_per_turn {
                restore(ctx, &self.previous, &self.label)
            } else {
                Vec::new()
            }
        } else {
            restore(ctx, &self.previous, &self.label)
        }
    }

    fn describe(&self) -> &'static str {
        "Resumes its previous behavior after a number of turns, or earlier by chance."
    }
}
