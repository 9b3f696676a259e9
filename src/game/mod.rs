//! # Game Module
//!
//! Core game state management, map representation, and entity systems.
//!
//! This module contains the fundamental building blocks of the Leaven engine:
//! - The tile map and its carving primitives
//! - Entities with optional capabilities and the roster that owns them
//! - Combat resolution and the closed effect vocabulary
//! - Player actions, the turn driver, and snapshots

pub mod actions;
pub mod autoexplore;
pub mod combat;
pub mod effects;
pub mod entity;
pub mod equipment;
pub mod map;
pub mod state;

pub use actions::*;
pub use autoexplore::*;
pub use combat::*;
pub use effects::*;
pub use entity::*;
pub use equipment::*;
pub use map::*;
pub use state::*;

use serde::{Deserialize, Serialize};

/// A tile coordinate. `x` grows east, `y` grows south.
///
/// # Examples
///
/// ```
/// use leaven::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.offset(1, -1), Position::new(11, 4));
/// assert_eq!(pos.neighbours().len(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The top-left corner of the map.
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Straight-line distance, the metric AI range checks use.
    ///
    /// ```
    /// use leaven::Position;
    ///
    /// assert_eq!(Position::new(0, 0).euclidean_distance(Position::new(3, 4)), 5.0);
    /// ```
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }

    /// Number of king moves between two tiles.
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The eight surrounding tiles, rows top to bottom and columns left to
    /// right. Spawners scan their neighbourhood in this order.
    pub fn neighbours(self) -> [Position; 8] {
        let mut out = [self; 8];
        let mut i = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                out[i] = self.offset(dx, dy);
                i += 1;
            }
        }
        out
    }
}

/// The eight compass directions a single step can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Direction {
    /// `(dx, dy)` for one step in this direction.
    ///
    /// ```
    /// use leaven::Direction;
    ///
    /// assert_eq!(Direction::North.delta(), (0, -1));
    /// ```
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::Northeast => (1, -1),
            Direction::Northwest => (-1, -1),
            Direction::Southeast => (1, 1),
            Direction::Southwest => (-1, 1),
        }
    }
}

/// Entity handle. The [`EntityRoster`] hands these out in increasing order,
/// so a replayed turn sequence allocates the same ids.
pub type EntityId = u64;
