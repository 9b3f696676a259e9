//! # Item Generation
//!
//! Item and gold placement for room population.

use crate::content::ContentRegistry;
use crate::game::{Color, Entity, EntityId, EntityRoster, GameMap, Position, RenderOrder, Valuable};
use crate::generation::encounters::{random_interior_spot, spot_is_free};
use crate::generation::Room;
use crate::utils::random_choice_from_table;
use rand::rngs::StdRng;
use rand::Rng;

/// Creates a gold pile entity.
pub fn gold_pile(id: EntityId, position: Position, value: i32) -> Entity {
    Entity::new(id, position, '$', Color::GOLD, "Gold", false, RenderOrder::Gold)
        .with_valuable(Valuable { value })
}

/// Places up to `count` items chosen from the depth's spawn weights.
pub fn place_items(
    room: &Room,
    count: i32,
    map: &GameMap,
    content: &ContentRegistry,
    roster: &mut EntityRoster,
    rng: &mut StdRng,
) -> usize {
    let chances = content.item_chances(map.dungeon_level);
    let mut placed = 0;

    for _ in 0..count {
        let pos = random_interior_spot(room, rng);
        if !spot_is_free(map, roster, pos) {
            continue;
        }

        let Some(definition) = random_choice_from_table(&chances, rng).and_then(|id| content.item(id))
        else {
            continue;
        };
        let id = roster.allocate_id();
        roster.insert(definition.instantiate(id, pos));
        placed += 1;
    }

    placed
}

/// Splits a gold pool over up to `passes` piles.
///
/// Each pile takes a uniform share `0..=remaining` of the pool. Empty
/// shares are not placed, and an exhausted pool ends the placement.
pub fn place_gold(
    room: &Room,
    passes: u32,
    mut amount: i32,
    map: &GameMap,
    roster: &mut EntityRoster,
    rng: &mut StdRng,
) -> usize {
    let mut placed = 0;

    for _ in 0..passes {
        if amount == 0 {
            break;
        }

        let pos = random_interior_spot(room, rng);
        if !spot_is_free(map, roster, pos) {
            continue;
        }

        let take = rng.gen_range(0..=amount);
        amount -= take;
        if take > 0 {
            let id = roster.allocate_id();
            roster.insert(gold_pile(id, pos, take));
            placed += 1;
        }
    }

    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentRegistry;
    use rand::SeedableRng;

    fn open_room() -> (GameMap, Room) {
        let room = Room::new(0, 0, 0, 10, 10);
        let mut map = GameMap::new(12, 12, 1);
        map.create_room(&room);
        (map, room)
    }

    #[test]
    fn test_gold_never_exceeds_pool() {
        let (map, room) = open_room();
        let mut rng = StdRng::seed_from_u64(13);

        for _ in 0..200 {
            let mut roster = EntityRoster::new();
            place_gold(&room, 2, 30, &map, &mut roster, &mut rng);

            let total: i32 = roster
                .iter()
                .filter_map(|entity| entity.valuable)
                .map(|valuable| valuable.value)
                .sum();
            assert!(total <= 30);
            assert!(roster.iter().all(|entity| entity.valuable.map_or(false, |v| v.value > 0)));
        }
    }

    #[test]
    fn test_empty_pool_places_nothing() {
        let (map, room) = open_room();
        let mut roster = EntityRoster::new();
        let mut rng = StdRng::seed_from_u64(13);

        assert_eq!(place_gold(&room, 2, 0, &map, &mut roster, &mut rng), 0);
        assert!(roster.is_empty());
    }

    #[test]
    fn test_items_come_from_registry() {
        let (map, room) = open_room();
        let content = ContentRegistry::builtin();
        let mut roster = EntityRoster::new();
        let mut rng = StdRng::seed_from_u64(13);

        let placed = place_items(&room, 5, &map, &content, &mut roster, &mut rng);
        assert_eq!(placed, roster.len());
        for item in roster.iter() {
            assert!(item.item.is_some());
            assert!(!item.blocks_movement);
            assert!(room.contains_interior(item.position));
        }
    }
}
