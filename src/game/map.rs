//! # Tile Map
//!
//! The dungeon grid: tiles with movement and sight flags, plus the carving
//! primitives the generator uses to open rooms and tunnels.

use crate::game::Position;
use crate::generation::Room;
use crate::{LeavenError, LeavenResult};
use serde::{Deserialize, Serialize};

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Whether movement into this tile is impossible
    pub blocked: bool,
    /// Whether this tile occludes sight
    pub block_sight: bool,
    /// Whether the player has ever seen this tile
    pub explored: bool,
}

impl Tile {
    /// Creates a tile. Sight blocking defaults to the movement flag.
    pub fn new(blocked: bool) -> Self {
        Self {
            blocked,
            block_sight: blocked,
            explored: false,
        }
    }

    /// An uncarved wall tile.
    pub fn wall() -> Self {
        Self::new(true)
    }

    /// An open floor tile.
    pub fn floor() -> Self {
        Self::new(false)
    }
}

/// The dungeon floor currently being played.
///
/// Dimensions are fixed at construction; `is_blocked` is the single source of
/// truth for terrain movement legality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMap {
    width: i32,
    height: i32,
    /// Tiles stored row-major: `tiles[y][x]`
    tiles: Vec<Vec<Tile>>,
    /// Depth of this floor, starting at 1
    pub dungeon_level: i32,
}

impl GameMap {
    /// Creates a map where every tile is an uncarved wall.
    ///
    /// # Examples
    ///
    /// ```
    /// use leaven::{GameMap, Position};
    ///
    /// let map = GameMap::new(20, 10, 1);
    /// assert!(map.is_blocked(Position::new(3, 3)));
    /// assert!(map.is_blocked(Position::new(-1, 0))); // out of bounds
    /// ```
    pub fn new(width: i32, height: i32, dungeon_level: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![vec![Tile::wall(); width as usize]; height as usize],
            dungeon_level,
        }
    }

    /// Width of the map in tiles.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height of the map in tiles.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Checks if a position lies inside the map.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Gets a tile at the given position.
    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.tiles
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
    }

    /// Gets a mutable tile at the given position.
    pub fn get_tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.tiles
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
    }

    /// Replaces the tile at a position.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> LeavenResult<()> {
        let slot = self.get_tile_mut(pos).ok_or_else(|| {
            LeavenError::InvalidState(format!("Position {:?} is outside the map", pos))
        })?;
        *slot = tile;
        Ok(())
    }

    /// Whether terrain forbids entering the tile. Out-of-bounds counts as blocked.
    pub fn is_blocked(&self, pos: Position) -> bool {
        self.get_tile(pos).map_or(true, |tile| tile.blocked)
    }

    /// Whether the tile occludes sight. Out-of-bounds counts as opaque.
    pub fn blocks_sight(&self, pos: Position) -> bool {
        self.get_tile(pos).map_or(true, |tile| tile.block_sight)
    }

    /// Whether the tile has been seen by the player.
    pub fn is_explored(&self, pos: Position) -> bool {
        self.get_tile(pos).map_or(false, |tile| tile.explored)
    }

    /// Marks a tile as explored.
    pub fn mark_explored(&mut self, pos: Position) {
        if let Some(tile) = self.get_tile_mut(pos) {
            tile.explored = true;
        }
    }

    /// Opens a single tile for movement and sight.
    fn open(&mut self, pos: Position) {
        if let Some(tile) = self.get_tile_mut(pos) {
            tile.blocked = false;
            tile.block_sight = false;
        }
    }

    /// Carves the interior of a room, leaving its border as wall.
    pub fn create_room(&mut self, room: &Room) {
        for pos in room.interior_positions() {
            self.open(pos);
        }
    }

    /// Carves a horizontal tunnel between two columns (inclusive) on row `y`.
    pub fn create_h_tunnel(&mut self, x1: i32, x2: i32, y: i32) {
        for x in x1.min(x2)..=x1.max(x2) {
            self.open(Position::new(x, y));
        }
    }

    /// Carves a vertical tunnel between two rows (inclusive) on column `x`.
    pub fn create_v_tunnel(&mut self, y1: i32, y2: i32, x: i32) {
        for y in y1.min(y2)..=y1.max(y2) {
            self.open(Position::new(x, y));
        }
    }

    /// Iterates over every tile with its position.
    pub fn iter_tiles(&self) -> impl Iterator<Item = (Position, &Tile)> + '_ {
        self.tiles.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, tile)| (Position::new(x as i32, y as i32), tile))
        })
    }

    /// Counts the open floor tiles.
    pub fn floor_count(&self) -> usize {
        self.iter_tiles().filter(|(_, tile)| !tile.blocked).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_map_is_solid_wall() {
        let map = GameMap::new(12, 8, 1);
        assert_eq!(map.width(), 12);
        assert_eq!(map.height(), 8);
        assert!(map
            .iter_tiles()
            .all(|(_, tile)| tile.blocked && tile.block_sight && !tile.explored));
        assert_eq!(map.floor_count(), 0);
    }

    #[test]
    fn test_out_of_bounds_is_blocked() {
        let map = GameMap::new(5, 5, 1);
        assert!(map.is_blocked(Position::new(5, 0)));
        assert!(map.is_blocked(Position::new(0, -1)));
        assert!(map.blocks_sight(Position::new(10, 10)));
        assert!(map.get_tile(Position::new(-1, -1)).is_none());
    }

    #[test]
    fn test_create_room_leaves_border() {
        let mut map = GameMap::new(20, 20, 1);
        let room = Room::new(0, 2, 2, 5, 4);
        map.create_room(&room);

        // Interior spans x1+1..x2 and y1+1..y2, exclusive of the far edge
        assert!(!map.is_blocked(Position::new(3, 3)));
        assert!(!map.is_blocked(Position::new(6, 5)));
        assert!(map.is_blocked(Position::new(2, 3)));
        assert!(map.is_blocked(Position::new(7, 3)));
        assert!(map.is_blocked(Position::new(3, 6)));
        assert_eq!(map.floor_count(), 4 * 3);
    }

    #[test]
    fn test_tunnels_are_inclusive() {
        let mut map = GameMap::new(20, 20, 1);
        map.create_h_tunnel(8, 3, 5);
        map.create_v_tunnel(2, 6, 10);

        for x in 3..=8 {
            assert!(!map.is_blocked(Position::new(x, 5)));
        }
        for y in 2..=6 {
            assert!(!map.is_blocked(Position::new(10, y)));
            assert!(!map.blocks_sight(Position::new(10, y)));
        }
        assert!(map.is_blocked(Position::new(9, 5)));
    }

    #[test]
    fn test_set_tile_outside_fails() {
        let mut map = GameMap::new(4, 4, 1);
        assert!(map.set_tile(Position::new(1, 1), Tile::floor()).is_ok());
        assert!(map.set_tile(Position::new(4, 1), Tile::floor()).is_err());
        assert!(!map.is_blocked(Position::new(1, 1)));
    }

    #[test]
    fn test_explored_tracking() {
        let mut map = GameMap::new(4, 4, 1);
        assert!(!map.is_explored(Position::new(2, 2)));
        map.mark_explored(Position::new(2, 2));
        assert!(map.is_explored(Position::new(2, 2)));
    }
}
