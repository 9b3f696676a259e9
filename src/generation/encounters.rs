//! # Encounter Generation
//!
//! Populates carved rooms with monsters, items and gold.
//!
//! Every room rolls its budget up front (monster count, item count, gold
//! pool, number of gold piles) and then places each entity at a random
//! interior tile. A tile that is blocked or already holds any entity is
//! skipped rather than re-rolled, so crowded rooms end up with less.

use crate::content::ContentRegistry;
use crate::game::{EntityRoster, GameMap, Position};
use crate::generation::items::{place_gold, place_items};
use crate::generation::{Dungeon, Room};
use crate::utils::{from_dungeon_level, random_choice_from_table};
use rand::rngs::StdRng;
use rand::Rng;

/// Depth-scaled cap on monsters per room.
pub const MAX_MONSTERS_PER_ROOM: [(i32, i32); 3] = [(2, 1), (3, 4), (5, 6)];

/// Depth-scaled cap on items per room.
pub const MAX_ITEMS_PER_ROOM: [(i32, i32); 2] = [(1, 1), (2, 4)];

/// Gold pile count, drawn uniformly: 13/16 none, 1/8 one, 1/16 two.
const GOLD_PASSES: [u32; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 2];

/// What one room is allowed to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomBudget {
    pub monsters: i32,
    pub items: i32,
    pub gold: i32,
    pub gold_piles: u32,
}

impl RoomBudget {
    /// Rolls a budget for a room at `depth`.
    pub fn roll(depth: i32, rng: &mut StdRng) -> Self {
        let max_monsters = from_dungeon_level(&MAX_MONSTERS_PER_ROOM, depth);
        let max_items = from_dungeon_level(&MAX_ITEMS_PER_ROOM, depth);

        let monsters = rng.gen_range(0..=max_monsters);
        let items = rng.gen_range(0..=max_items);
        let gold = rng.gen_range(0..=20 + 10 * depth) + 2;
        let gold_piles = GOLD_PASSES[rng.gen_range(0..GOLD_PASSES.len())];

        Self {
            monsters,
            items,
            gold,
            gold_piles,
        }
    }
}

/// Entities added to a floor by population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationSummary {
    pub monsters: usize,
    pub items: usize,
    pub gold_piles: usize,
}

impl std::ops::AddAssign for PopulationSummary {
    fn add_assign(&mut self, other: Self) {
        self.monsters += other.monsters;
        self.items += other.items;
        self.gold_piles += other.gold_piles;
    }
}

/// A uniformly random interior tile of a room.
pub(crate) fn random_interior_spot(room: &Room, rng: &mut StdRng) -> Position {
    let x = rng.gen_range(room.x1 + 1..=room.x2 - 1);
    let y = rng.gen_range(room.y1 + 1..=room.y2 - 1);
    Position::new(x, y)
}

/// Whether a spot can receive a new entity during population.
pub(crate) fn spot_is_free(map: &GameMap, roster: &EntityRoster, pos: Position) -> bool {
    !roster.is_occupied(pos) && !map.is_blocked(pos)
}

/// Places up to `count` monsters chosen from the depth's spawn weights.
pub fn place_monsters(
    room: &Room,
    count: i32,
    map: &GameMap,
    content: &ContentRegistry,
    roster: &mut EntityRoster,
    rng: &mut StdRng,
) -> usize {
    let chances = content.monster_chances(map.dungeon_level);
    let mut placed = 0;

    for _ in 0..count {
        let pos = random_interior_spot(room, rng);
        if !spot_is_free(map, roster, pos) {
            continue;
        }

        let Some(choice) = random_choice_from_table(&chances, rng) else {
            continue;
        };
        let Some(definition) = content.monster(choice) else {
            continue;
        };
        let id = roster.allocate_id();
        roster.insert(definition.instantiate(id, pos, rng));
        placed += 1;
    }

    placed
}

/// Rolls a budget for one room and fills it.
pub fn populate_room(
    room: &Room,
    map: &GameMap,
    content: &ContentRegistry,
    roster: &mut EntityRoster,
    rng: &mut StdRng,
) -> PopulationSummary {
    let budget = RoomBudget::roll(map.dungeon_level, rng);

    PopulationSummary {
        monsters: place_monsters(room, budget.monsters, map, content, roster, rng),
        items: place_items(room, budget.items, map, content, roster, rng),
        gold_piles: place_gold(room, budget.gold_piles, budget.gold, map, roster, rng),
    }
}

/// Populates every room of an already laid-out floor, in room order.
///
/// Entities already in the roster (the player) count as occupants. The
/// game itself populates each room while the layout is generated, through
/// [`RoomCorridorGenerator::generate_with`](crate::generation::RoomCorridorGenerator::generate_with).
pub fn populate_dungeon(
    dungeon: &Dungeon,
    content: &ContentRegistry,
    roster: &mut EntityRoster,
    rng: &mut StdRng,
) -> PopulationSummary {
    let mut total = PopulationSummary::default();
    for room in &dungeon.rooms {
        total += populate_room(room, &dungeon.map, content, roster, rng);
    }

    log::debug!(
        "Populated floor {}: {} monsters, {} items, {} gold piles",
        dungeon.map.dungeon_level,
        total.monsters,
        total.items,
        total.gold_piles
    );
    total
}
