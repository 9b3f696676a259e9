//! # Pathfinding Algorithms
//!
//! A* search over the tile grid for monster pursuit and the autopilot.
//!
//! Steps are 8-directional with a uniform cost of one (Chebyshev metric), so
//! the Chebyshev distance is an exact-when-unobstructed heuristic. The search
//! visits each tile at most once, which bounds it by the map size.

use crate::game::{EntityRoster, GameMap, Position};
use ::pathfinding::prelude::astar;
use std::collections::HashSet;

/// Finds a route from `start` to `goal`.
///
/// Tiles are impassable when the terrain is blocked or a blocking entity
/// stands on them. Entities on `start` (the mover) and `goal` (usually the
/// target) are ignored. Returns the steps after `start`, ending with `goal`,
/// or `None` when no route exists.
///
/// # Examples
///
/// ```
/// use leaven::{find_path, EntityRoster, GameMap, Position, Room};
///
/// let mut map = GameMap::new(10, 10, 1);
/// map.create_room(&Room::new(0, 0, 0, 9, 9));
///
/// let path = find_path(&map, &EntityRoster::new(), Position::new(1, 1), Position::new(4, 4)).unwrap();
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.last(), Some(&Position::new(4, 4)));
/// ```
pub fn find_path(
    map: &GameMap,
    roster: &EntityRoster,
    start: Position,
    goal: Position,
) -> Option<Vec<Position>> {
    let occupied: HashSet<Position> = roster
        .iter()
        .filter(|entity| entity.blocks_movement)
        .map(|entity| entity.position)
        .filter(|position| *position != start && *position != goal)
        .collect();

    find_path_avoiding(map, &occupied, start, goal)
}

/// Same search as [`find_path`] with an explicit set of occupied tiles.
pub fn find_path_avoiding(
    map: &GameMap,
    occupied: &HashSet<Position>,
    start: Position,
    goal: Position,
) -> Option<Vec<Position>> {
    if !map.in_bounds(start) || map.is_blocked(goal) {
        return None;
    }

    let (mut path, _cost) = astar(
        &start,
        |position| {
            position
                .neighbours()
                .into_iter()
                .filter(|next| *next == goal || (!map.is_blocked(*next) && !occupied.contains(next)))
                .map(|next| (next, 1u32))
                .collect::<Vec<_>>()
        },
        |position| position.chebyshev_distance(goal),
        |position| *position == goal,
    )?;

    // The search includes the starting tile
    path.remove(0);
    Some(path)
}

/// The first step of a route, if one exists.
pub fn next_step(
    map: &GameMap,
    roster: &EntityRoster,
    start: Position,
    goal: Position,
) -> Option<Position> {
    find_path(map, roster, start, goal).and_then(|path| path.first().copied())
}
