//! Integration tests for taking the stairs between floors.

use leaven::{ContentRegistry, GameConfig, GameState, PlayerAction, Position};
use rand::{rngs::StdRng, SeedableRng};

fn new_game(seed: u64) -> (GameState, StdRng) {
    let mut rng = StdRng::seed_from_u64(seed);
    let state = GameState::new(GameConfig::for_testing(seed), ContentRegistry::builtin(), &mut rng)
        .expect("Failed to create game");
    (state, rng)
}

fn warp_to_stairs(state: &mut GameState) -> Position {
    let stairs = state.stairs_position().expect("Floor has stairs");
    state.player_mut().expect("Player exists").position = stairs;
    state.refresh_fov();
    stairs
}

/// Test stair navigation across several floors.
#[test]
fn test_descending_through_floors() {
    let (mut state, mut rng) = new_game(98765);
    let player_id = state.player_id;

    for expected_depth in 2..=5 {
        warp_to_stairs(&mut state);
        let outcome = state
            .step(PlayerAction::Descend, &mut rng)
            .expect("Descend failed");

        assert!(outcome.took_turn);
        assert_eq!(state.depth(), expected_depth);
        assert_eq!(state.statistics.deepest_floor, expected_depth);
        assert_eq!(state.player_id, player_id);

        let player = state.player().expect("Player survives the stairs");
        assert!(!state.map.is_blocked(player.position));
        assert!(state.fov.is_in_fov(player.position));

        let stairs: Vec<_> = state.roster.iter().filter_map(|e| e.stairs).collect();
        assert_eq!(stairs.len(), 1, "exactly one staircase per floor");
        assert_eq!(stairs[0].floor, expected_depth + 1);
    }
}

#[test]
fn test_descending_discards_previous_floor() {
    let (mut state, mut rng) = new_game(4242);
    let old_ids: Vec<_> = state
        .roster
        .iter()
        .map(|e| e.id)
        .filter(|id| *id != state.player_id)
        .collect();

    warp_to_stairs(&mut state);
    state.step(PlayerAction::Descend, &mut rng).expect("Descend failed");

    for id in old_ids {
        assert!(!state.roster.contains(id), "entity {} followed the player down", id);
    }
}

#[test]
fn test_descending_heals_a_quarter() {
    let (mut state, mut rng) = new_game(5150);
    state
        .player_mut()
        .and_then(|p| p.fighter.as_mut())
        .expect("Player fights")
        .hp = 50;

    warp_to_stairs(&mut state);
    state.step(PlayerAction::Descend, &mut rng).expect("Descend failed");

    let hp = state.player().and_then(|p| p.fighter.as_ref()).map(|f| f.hp);
    assert_eq!(hp, Some(75));

    // Healing never exceeds the maximum
    warp_to_stairs(&mut state);
    state.player_mut().and_then(|p| p.fighter.as_mut()).expect("Player fights").hp = 90;
    state.step(PlayerAction::Descend, &mut rng).expect("Descend failed");
    let hp = state.player().and_then(|p| p.fighter.as_ref()).map(|f| f.hp);
    assert_eq!(hp, Some(100));
}

#[test]
fn test_descend_off_the_stairs_is_refused() {
    let (mut state, mut rng) = new_game(31337);
    let stairs = state.stairs_position().expect("Floor has stairs");
    let start = state.player().expect("Player exists").position;
    if start == stairs {
        // Single-room floor: nothing to test here
        return;
    }

    let outcome = state.step(PlayerAction::Descend, &mut rng).expect("Descend call failed");
    assert!(!outcome.took_turn);
    assert_eq!(state.depth(), 1);
    assert_eq!(state.turn_number, 0);
}
