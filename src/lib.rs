//! # Leaven Roguelike Engine
//!
//! The simulation core of a turn-based dungeon crawler.
//!
//! ## Architecture Overview
//!
//! Leaven keeps everything that has algorithmic weight and leaves drawing and
//! input decoding to whoever embeds it:
//!
//! - **Game State**: the map, the entity roster, the message log and the turn driver
//! - **Entities**: positioned actors carrying optional capabilities (fighter, AI, item, ...)
//! - **AI**: per-monster behavior state machines that return effects instead of mutating the world
//! - **Generation**: room-and-tunnel dungeons populated from depth-scaled spawn tables
//! - **Utilities**: field of view, A* pathfinding and weighted random tables
//!
//! ## Determinism
//!
//! Every function that needs randomness takes an explicit `&mut StdRng`. Given
//! the same snapshot and the same seed, a turn sequence replays identically.

pub mod ai;
pub mod content;
pub mod game;
pub mod generation;
pub mod utils;

pub use ai::*;
pub use content::*;
pub use game::*;
pub use generation::*;
pub use utils::*;

// Explicit re-exports for the types most embedders touch
pub use game::{
    Autopilot, Color, Direction, Effect, Entity, EntityId, EntityRoster, Equipment,
    EquipmentSlot, Fighter, GameMap, GamePhase, GameState, GameStatistics, Message, MessageLog,
    PlayerAction, Position, StatusKind, Tile, TurnOutcome,
};

pub use generation::{Dungeon, GenerationConfig, Generator, Room, RoomCorridorGenerator};

/// Core error type for the Leaven engine.
#[derive(thiserror::Error, Debug)]
pub enum LeavenError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Content definitions could not be read at all
    #[error("Content unavailable: {0}")]
    ContentUnavailable(String),

    /// A saved game could not be restored
    #[error("Could not load saved game: {0}")]
    LoadFailed(String),
}

/// Result type used throughout the Leaven codebase.
pub type LeavenResult<T> = Result<T, LeavenError>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine constants.
pub mod config {
    /// Default dungeon width in tiles
    pub const DEFAULT_MAP_WIDTH: i32 = 80;

    /// Default dungeon height in tiles
    pub const DEFAULT_MAP_HEIGHT: i32 = 43;

    /// Default field-of-view radius for the player
    pub const DEFAULT_FOV_RADIUS: i32 = 10;

    /// Default number of messages kept in the log
    pub const DEFAULT_MESSAGE_LOG_CAPACITY: usize = 100;

    /// Default number of items the player can carry
    pub const DEFAULT_INVENTORY_CAPACITY: usize = 26;

    /// Hit points a spawner regains whenever it produces offspring
    pub const SPAWNER_HEAL_AMOUNT: i32 = 10;

    /// Turns between spawns for the mother dough
    pub const MOTHER_DOUGH_SPAWN_INTERVAL: i32 = 40;

    /// Definition id spawned by dough spawners
    pub const OFFSPRING_DEFINITION_ID: &str = "sourdough_starter";

    /// Turns a confusion scroll keeps a monster confused
    pub const CONFUSION_TURNS: i32 = 10;

    /// Default patience for aggressive hunters
    pub const DEFAULT_PATIENCE: i32 = 20;

    /// Fraction of max hp restored when taking the stairs down
    pub const DESCEND_HEAL_DIVISOR: i32 = 4;

    /// Experience needed to leave level 1 is `BASE + FACTOR`, then grows by `FACTOR`
    pub const LEVEL_UP_BASE: i32 = 200;

    /// Extra experience each further level needs
    pub const LEVEL_UP_FACTOR: i32 = 150;

    /// Max hp granted by a constitution level-up
    pub const LEVEL_UP_HP_BONUS: i32 = 20;
}
