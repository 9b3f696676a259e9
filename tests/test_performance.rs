//! Performance tests for the per-turn hot paths

use leaven::{
    calculate_fov, find_path, Autopilot, ContentRegistry, EntityRoster, GameConfig, GameMap,
    GameState, LeavenResult, Position, Room,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

fn open_map(size: i32) -> GameMap {
    let mut map = GameMap::new(size, size, 1);
    map.create_room(&Room::new(0, 0, 0, size - 1, size - 1));
    map
}

#[test]
fn test_visibility_update_performance() {
    let map = open_map(100);

    let start = Instant::now();
    let iterations = 50;

    for i in 0..iterations {
        let origin = Position::new(40 + (i % 10) as i32, 40 + (i / 10) as i32);
        let fov = calculate_fov(&map, origin, 10);
        assert!(fov.is_in_fov(origin));
    }

    let elapsed = start.elapsed();
    let avg_update_time = elapsed / iterations;

    println!("Average visibility update time: {:?}", avg_update_time);

    assert!(
        avg_update_time.as_millis() < 20,
        "Visibility updates too slow: {:?}",
        avg_update_time
    );
}

#[test]
fn test_pathfinding_performance() {
    let mut map = open_map(80);
    // A wall across most of the map forces a detour
    for y in 0..70 {
        map.set_tile(Position::new(40, y), leaven::Tile::wall()).unwrap();
    }
    let roster = EntityRoster::new();

    let start = Instant::now();
    let iterations = 20;

    for _ in 0..iterations {
        let path = find_path(&map, &roster, Position::new(2, 2), Position::new(77, 2));
        assert!(path.is_some());
    }

    let elapsed = start.elapsed();
    let avg_search_time = elapsed / iterations;

    println!("Average path search time: {:?}", avg_search_time);

    assert!(
        avg_search_time.as_millis() < 100,
        "Path searches too slow: {:?}",
        avg_search_time
    );
}

#[test]
fn test_turn_throughput() -> LeavenResult<()> {
    let mut rng = StdRng::seed_from_u64(12345);
    let mut state = GameState::new(GameConfig::for_testing(12345), ContentRegistry::builtin(), &mut rng)?;
    let mut pilot = Autopilot::new();

    let start = Instant::now();
    let mut rounds = 0u32;

    for _ in 0..200 {
        let Some(action) = pilot.next_action(&state) else {
            break;
        };
        state.step(action, &mut rng)?;
        rounds += 1;
    }

    let elapsed = start.elapsed();
    let avg_round_time = elapsed / rounds.max(1);

    println!("Played {} rounds, average round time: {:?}", rounds, avg_round_time);

    assert!(
        avg_round_time.as_millis() < 50,
        "Rounds too slow: {:?}",
        avg_round_time
    );

    Ok(())
}
