//! # Autoexplore Module
//!
//! A simple autopilot that plays the player's turns: fight what is next to
//! you, otherwise walk to the stairs and take them.
//!
//! The headless binary and the benchmarks use it to drive long simulations.

use crate::game::{EntityId, GamePhase, GameState, LevelUpChoice, PlayerAction, Position};
use crate::utils::find_path;

/// Picks player actions for unattended runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Autopilot {
    /// Path being followed to the stairs
    pub current_path: Vec<Position>,
    /// Where the current path leads
    pub target: Option<Position>,
}

impl Autopilot {
    /// Creates an autopilot with no path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chooses the next action, or `None` once the game is over.
    ///
    /// Priorities, in order: spend a pending level-up on constitution, take
    /// the stairs when standing on them, attack an adjacent visible monster,
    /// step along a path to the stairs, wait.
    pub fn next_action(&mut self, state: &GameState) -> Option<PlayerAction> {
        if state.is_game_over() {
            return None;
        }
        if state.phase == GamePhase::LevelUp {
            return Some(PlayerAction::LevelUp {
                choice: LevelUpChoice::Constitution,
            });
        }
        let player = state.player()?;
        let here = player.position;

        let stairs = state.stairs_position();
        if stairs == Some(here) {
            self.clear();
            return Some(PlayerAction::Descend);
        }

        if let Some(enemy) = self.adjacent_enemy(state) {
            return Some(Self::toward(here, enemy));
        }

        let Some(stairs) = stairs else {
            return Some(PlayerAction::Wait);
        };

        // Replan whenever the path is stale or the next step is taken
        let next = self.current_path.first().copied();
        let blocked = next.map_or(true, |step| {
            step.chebyshev_distance(here) != 1 || state.roster.blocking_entity_at(step).is_some()
        });
        if self.target != Some(stairs) || blocked {
            self.current_path = find_path(&state.map, &state.roster, here, stairs).unwrap_or_default();
            self.target = Some(stairs);
        }

        if self.current_path.is_empty() {
            log::debug!("Autopilot has no route from {:?} to {:?}", here, stairs);
            return Some(PlayerAction::Wait);
        }
        let step = self.current_path.remove(0);
        Some(Self::toward(here, step))
    }

    /// Forgets the current path.
    pub fn clear(&mut self) {
        self.current_path.clear();
        self.target = None;
    }

    fn adjacent_enemy(&self, state: &GameState) -> Option<Position> {
        let player_id: EntityId = state.player_id;
        let here = state.player()?.position;
        state
            .roster
            .iter()
            .filter(|entity| {
                entity.id != player_id
                    && entity.ai.is_some()
                    && entity.is_alive()
                    && entity.blocks_movement
                    && state.fov.is_in_fov(entity.position)
                    && entity.position.chebyshev_distance(here) == 1
            })
            .map(|entity| entity.position)
            .next()
    }

    fn toward(from: Position, to: Position) -> PlayerAction {
        PlayerAction::Move {
            dx: (to.x - from.x).signum(),
            dy: (to.y - from.y).signum(),
        }
    }
}
