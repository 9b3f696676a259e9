//! # Actions Module
//!
//! Player commands, turn outcomes and the game phase.

use crate::game::{Direction, Effect, EntityId, LevelUpChoice, Position};
use serde::{Deserialize, Serialize};

/// Everything the player can ask for on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Step by one tile, attacking a blocking fighter in the way
    Move { dx: i32, dy: i32 },
    /// Pass the turn
    Wait,
    /// Pick up whatever lies under the player
    PickUp,
    /// Use an inventory item, optionally at a target tile
    UseItem {
        item: EntityId,
        target: Option<Position>,
    },
    /// Drop an inventory item at the player's feet
    DropItem { item: EntityId },
    /// Take the stairs down
    Descend,
    /// Spend a pending level-up; only valid in [`GamePhase::LevelUp`]
    LevelUp { choice: LevelUpChoice },
}

impl PlayerAction {
    /// Creates a move action from a direction.
    ///
    /// # Examples
    ///
    /// ```
    /// use leaven::{Direction, PlayerAction};
    ///
    /// assert_eq!(PlayerAction::step(Direction::North), PlayerAction::Move { dx: 0, dy: -1 });
    /// ```
    pub fn step(direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        PlayerAction::Move { dx, dy }
    }
}

/// Result of resolving one player action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// Whether the action consumed the player's turn
    pub took_turn: bool,
    /// Effects applied while resolving the action, in order
    pub effects: Vec<Effect>,
}

impl TurnOutcome {
    /// An outcome that used the turn.
    pub fn acted(effects: Vec<Effect>) -> Self {
        Self {
            took_turn: true,
            effects,
        }
    }

    /// An outcome that left the turn with the player.
    pub fn refused(effects: Vec<Effect>) -> Self {
        Self {
            took_turn: false,
            effects,
        }
    }
}

/// Which mode the game is in.
///
/// The turn driver enters `PlayersTurn`, `EnemyTurn`, `PlayerDead`,
/// `Targeting` and `LevelUp` itself. The remaining phases belong to
/// whatever front end embeds the engine (menus, look mode, resting); the
/// driver never enters them and treats them like `PlayersTurn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    PlayersTurn,
    EnemyTurn,
    PlayerDead,
    ShowInventory,
    DropInventory,
    /// Waiting for a target tile for the pending item
    Targeting,
    /// The player gained a level and must pick a stat before play resumes
    LevelUp,
    CharacterScreen,
    HelpScreen,
    LookAt,
    ShowPickup,
    CharacterCreation,
    Resting,
}

impl GamePhase {
    /// Whether the game has ended.
    pub fn is_over(self) -> bool {
        self == GamePhase::PlayerDead
    }
}

impl Default for GamePhase {
    fn default() -> Self {
        GamePhase::PlayersTurn
    }
}
