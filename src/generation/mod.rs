//! # Generation Module
//!
//! Procedural content generation for dungeon floors.
//!
//! Generation happens in two passes. [`RoomCorridorGenerator`] lays out
//! rooms and tunnels on a fresh [`GameMap`]; the population pass
//! ([`populate_dungeon`]) then fills each room with monsters, items and gold
//! drawn from depth-scaled tables.

pub mod dungeon;
pub mod encounters;
pub mod items;

pub use dungeon::*;
pub use encounters::*;
pub use items::*;

use crate::config::{DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH};
use crate::game::{GameMap, Position};
use crate::{LeavenError, LeavenResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for procedural generation.
///
/// Controls map dimensions and room placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Seed for [`create_rng`]. Generators only draw from the rng they are
    /// handed, so this is where a game's whole random stream starts.
    pub seed: u64,
    /// Map width in tiles
    pub map_width: i32,
    /// Map height in tiles
    pub map_height: i32,
    /// Number of room placement attempts per floor
    pub max_rooms: u32,
    /// Minimum room side, walls included
    pub room_min_size: i32,
    /// Maximum room side, walls included
    pub room_max_size: i32,
}

impl GenerationConfig {
    /// Creates the standard configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use leaven::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(42);
    /// assert_eq!(config.map_width, 80);
    /// assert!(config.room_max_size >= config.room_min_size);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
            max_rooms: 30,
            room_min_size: 6,
            room_max_size: 10,
        }
    }

    /// Creates a configuration for testing with smaller, simpler floors.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            map_width: 40,
            map_height: 24,
            max_rooms: 8,
            room_min_size: 4,
            room_max_size: 7,
        }
    }

    /// Checks that rooms of every allowed size fit on the map.
    pub fn validate(&self) -> LeavenResult<()> {
        if self.room_min_size < 3 || self.room_min_size > self.room_max_size {
            return Err(LeavenError::InvalidState(format!(
                "Room sizes must satisfy 3 <= min <= max, got {}..={}",
                self.room_min_size, self.room_max_size
            )));
        }
        if self.room_max_size >= self.map_width || self.room_max_size >= self.map_height {
            return Err(LeavenError::InvalidState(format!(
                "Rooms up to {} tiles do not fit a {}x{} map",
                self.room_max_size, self.map_width, self.map_height
            )));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// A rectangular room, stored by its corners.
///
/// The rectangle spans `x1..=x2` and `y1..=y2`; the outermost ring is wall
/// and only the interior is carved. Rooms exist during generation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Order of acceptance on its floor
    pub id: u32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Room {
    /// Creates a room from its top-left corner and size.
    ///
    /// # Examples
    ///
    /// ```
    /// use leaven::{Position, Room};
    ///
    /// let room = Room::new(1, 5, 5, 10, 8);
    /// assert_eq!((room.x2, room.y2), (15, 13));
    /// assert_eq!(room.center(), Position::new(10, 9));
    /// ```
    pub fn new(id: u32, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            id,
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    /// The center tile, rounding toward the top-left.
    pub fn center(&self) -> Position {
        Position::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// Whether two rooms overlap or touch.
    pub fn intersects(&self, other: &Room) -> bool {
        self.x1 <= other.x2 && self.x2 >= other.x1 && self.y1 <= other.y2 && self.y2 >= other.y1
    }

    /// Whether a position lies in the carved interior.
    pub fn contains_interior(&self, pos: Position) -> bool {
        pos.x > self.x1 && pos.x < self.x2 && pos.y > self.y1 && pos.y < self.y2
    }

    /// Every interior tile, row by row.
    pub fn interior_positions(&self) -> impl Iterator<Item = Position> + '_ {
        ((self.y1 + 1)..self.y2)
            .flat_map(move |y| ((self.x1 + 1)..self.x2).map(move |x| Position::new(x, y)))
    }

    /// Number of interior tiles.
    pub fn interior_area(&self) -> i32 {
        (self.x2 - self.x1 - 1).max(0) * (self.y2 - self.y1 - 1).max(0)
    }
}

/// A laid-out floor before population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dungeon {
    pub map: GameMap,
    /// Accepted rooms in acceptance order
    pub rooms: Vec<Room>,
    /// Center of the first room
    pub player_start: Position,
    /// Center of the last room
    pub stairs: Position,
}

/// Something that lays out a `T` from a configuration and a seeded rng.
///
/// Implementations must draw from `rng` in a fixed order so a seed always
/// produces the same result.
pub trait Generator<T> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> LeavenResult<T>;

    /// Checks the structural guarantees of a generated value.
    fn validate(&self, content: &T, config: &GenerationConfig) -> LeavenResult<()>;

    /// Short name used in log lines.
    fn generator_type(&self) -> &'static str;
}

/// Seeds an rng from `config.seed`.
pub fn create_rng(config: &GenerationConfig) -> StdRng {
    StdRng::seed_from_u64(config.seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!((config.map_width, config.map_height), (80, 43));
        assert_eq!(config.max_rooms, 30);
        assert_eq!((config.room_min_size, config.room_max_size), (6, 10));
        assert!(GenerationConfig::for_testing(1).validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = GenerationConfig::for_testing(1);
        config.room_min_size = 9;
        assert!(config.validate().is_err());

        let mut config = GenerationConfig::for_testing(1);
        config.room_max_size = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_room_geometry() {
        let room = Room::new(1, 5, 5, 10, 8);

        assert_eq!(room.center(), Position::new(10, 9));
        assert!(room.contains_interior(Position::new(6, 6)));
        assert!(room.contains_interior(Position::new(14, 12)));
        assert!(!room.contains_interior(Position::new(5, 6))); // Left wall
        assert!(!room.contains_interior(Position::new(15, 6))); // Right wall
        assert_eq!(room.interior_area(), 9 * 7);
        assert_eq!(room.interior_positions().count(), 9 * 7);
    }

    #[test]
    fn test_room_intersection_is_inclusive() {
        let room1 = Room::new(1, 5, 5, 10, 8);
        let touching = Room::new(2, 15, 5, 4, 4); // Shares the x = 15 edge
        let apart = Room::new(3, 16, 5, 4, 4);

        assert!(room1.intersects(&touching));
        assert!(touching.intersects(&room1));
        assert!(!room1.intersects(&apart));
        assert!(!apart.intersects(&room1));
    }
}
