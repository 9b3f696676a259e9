//! # Dungeon Generation
//!
//! Room-and-tunnel layout.
//!
//! The generator makes a fixed number of placement attempts. Each attempt
//! rolls a room size and position; a room that intersects an accepted room
//! is discarded. Accepted rooms are carved and joined to the previous
//! accepted room by an L-shaped pair of tunnels whose order is a coin flip.

use crate::game::GameMap;
use crate::generation::{Dungeon, GenerationConfig, Generator, Room};
use crate::{LeavenError, LeavenResult};
use rand::{rngs::StdRng, Rng};

/// Primary dungeon generator using the room-and-corridor algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomCorridorGenerator {
    /// Depth recorded on the generated map
    pub dungeon_level: i32,
}

impl RoomCorridorGenerator {
    /// Creates a generator for the given depth.
    ///
    /// # Examples
    ///
    /// ```
    /// use leaven::{create_rng, GenerationConfig, Generator, RoomCorridorGenerator};
    ///
    /// let config = GenerationConfig::for_testing(7);
    /// let mut rng = create_rng(&config);
    /// let dungeon = RoomCorridorGenerator::new(1).generate(&config, &mut rng).unwrap();
    /// assert!(!dungeon.rooms.is_empty());
    /// assert!(!dungeon.map.is_blocked(dungeon.player_start));
    /// ```
    pub fn new(dungeon_level: i32) -> Self {
        Self { dungeon_level }
    }

    /// Rolls one candidate room.
    fn roll_room(&self, id: u32, config: &GenerationConfig, rng: &mut StdRng) -> Room {
        let width = rng.gen_range(config.room_min_size..=config.room_max_size);
        let height = rng.gen_range(config.room_min_size..=config.room_max_size);
        let x = rng.gen_range(0..=config.map_width - width - 1);
        let y = rng.gen_range(0..=config.map_height - height - 1);
        Room::new(id, x, y, width, height)
    }

    /// Joins two rooms with a horizontal and a vertical tunnel.
    fn connect(map: &mut GameMap, previous: &Room, room: &Room, rng: &mut StdRng) {
        let prev = previous.center();
        let new = room.center();

        if rng.gen_range(0..=1) == 1 {
            map.create_h_tunnel(prev.x, new.x, prev.y);
            map.create_v_tunnel(prev.y, new.y, new.x);
        } else {
            map.create_v_tunnel(prev.y, new.y, prev.x);
            map.create_h_tunnel(prev.x, new.x, new.y);
        }
    }
}

impl RoomCorridorGenerator {
    /// Lays out a floor, handing each accepted room to `on_room` as soon as
    /// it is carved and joined to the previous one.
    ///
    /// `on_room` sees the map as carved so far and shares the generator's
    /// rng, so whatever it draws is interleaved with the layout rolls. Rooms
    /// arrive in acceptance order; the first has id 0.
    pub fn generate_with<F>(
        &self,
        config: &GenerationConfig,
        rng: &mut StdRng,
        mut on_room: F,
    ) -> LeavenResult<Dungeon>
    where
        F: FnMut(&GameMap, &Room, &mut StdRng),
    {
        config.validate()?;

        let mut map = GameMap::new(config.map_width, config.map_height, self.dungeon_level);
        let mut rooms: Vec<Room> = Vec::new();

        for attempt in 0..config.max_rooms {
            let room = self.roll_room(rooms.len() as u32, config, rng);
            if rooms.iter().any(|other| room.intersects(other)) {
                log::trace!("Room attempt {} rejected", attempt);
                continue;
            }

            map.create_room(&room);
            if let Some(previous) = rooms.last() {
                Self::connect(&mut map, previous, &room, rng);
            }
            on_room(&map, &room, rng);
            rooms.push(room);
        }

        let (Some(first), Some(last)) = (rooms.first(), rooms.last()) else {
            return Err(LeavenError::GenerationFailed(
                "Failed to place any rooms".to_string(),
            ));
        };
        let player_start = first.center();
        let stairs = last.center();

        let dungeon = Dungeon {
            map,
            rooms,
            player_start,
            stairs,
        };
        self.validate(&dungeon, config)?;

        log::debug!(
            "{} generated floor {} with {} rooms, {} floor tiles",
            self.generator_type(),
            self.dungeon_level,
            dungeon.rooms.len(),
            dungeon.map.floor_count()
        );
        Ok(dungeon)
    }
}

impl Generator<Dungeon> for RoomCorridorGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> LeavenResult<Dungeon> {
        self.generate_with(config, rng, |_, _, _| {})
    }

    fn validate(&self, dungeon: &Dungeon, _config: &GenerationConfig) -> LeavenResult<()> {
        if dungeon.rooms.is_empty() {
            return Err(LeavenError::GenerationFailed("Floor has no rooms".to_string()));
        }
        for (index, room) in dungeon.rooms.iter().enumerate() {
            if dungeon.rooms[index + 1..].iter().any(|other| room.intersects(other)) {
                return Err(LeavenError::GenerationFailed(format!(
                    "Room {} intersects a later room",
                    room.id
                )));
            }
        }
        if dungeon.map.is_blocked(dungeon.player_start) || dungeon.map.is_blocked(dungeon.stairs) {
            return Err(LeavenError::GenerationFailed(
                "Start or stairs are not on open floor".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "room-corridor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{EntityRoster, Position};
    use crate::generation::create_rng;
    use crate::utils::find_path;
    use proptest::prelude::*;

    #[test]
    fn test_generation_is_deterministic() {
        let config = GenerationConfig::for_testing(12345);
        let generator = RoomCorridorGenerator::new(1);

        let first = generator.generate(&config, &mut create_rng(&config)).unwrap();
        let second = generator.generate(&config, &mut create_rng(&config)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rooms_are_handed_over_as_they_are_carved() {
        let config = GenerationConfig::for_testing(31);
        let mut seen = Vec::new();
        let dungeon = RoomCorridorGenerator::new(2)
            .generate_with(&config, &mut create_rng(&config), |map, room, _| {
                assert!(room.interior_positions().all(|pos| !map.is_blocked(pos)));
                seen.push(room.id);
            })
            .unwrap();

        let ids: Vec<u32> = dungeon.rooms.iter().map(|room| room.id).collect();
        assert_eq!(seen, ids);
        assert_eq!(seen.first(), Some(&0));

        // A hook that draws nothing leaves the layout unchanged
        let plain = RoomCorridorGenerator::new(2)
            .generate(&config, &mut create_rng(&config))
            .unwrap();
        assert_eq!(plain, dungeon);
    }

    #[test]
    fn test_start_and_stairs_are_room_centers() {
        let config = GenerationConfig::new(99);
        let dungeon = RoomCorridorGenerator::new(3)
            .generate(&config, &mut create_rng(&config))
            .unwrap();

        assert_eq!(dungeon.map.dungeon_level, 3);
        assert_eq!(dungeon.player_start, dungeon.rooms[0].center());
        assert_eq!(dungeon.stairs, dungeon.rooms[dungeon.rooms.len() - 1].center());
    }

    #[test]
    fn test_every_room_is_reachable() {
        let config = GenerationConfig::new(2024);
        let dungeon = RoomCorridorGenerator::new(1)
            .generate(&config, &mut create_rng(&config))
            .unwrap();
        let roster = EntityRoster::new();

        for room in &dungeon.rooms[1..] {
            assert!(
                find_path(&dungeon.map, &roster, dungeon.player_start, room.center()).is_some(),
                "room {} unreachable",
                room.id
            );
        }
    }

    #[test]
    fn test_walls_outside_rooms_and_tunnels() {
        let config = GenerationConfig::for_testing(5);
        let dungeon = RoomCorridorGenerator::new(1)
            .generate(&config, &mut create_rng(&config))
            .unwrap();

        // The map frame is never carved
        for x in 0..config.map_width {
            assert!(dungeon.map.is_blocked(Position::new(x, 0)));
            assert!(dungeon.map.is_blocked(Position::new(x, config.map_height - 1)));
        }
        for (_, tile) in dungeon.map.iter_tiles().filter(|(_, tile)| tile.blocked) {
            assert!(tile.block_sight);
        }
    }

    #[test]
    fn test_zero_attempts_fails() {
        let mut config = GenerationConfig::for_testing(5);
        config.max_rooms = 0;
        let result = RoomCorridorGenerator::new(1).generate(&config, &mut create_rng(&config));
        assert!(matches!(result, Err(LeavenError::GenerationFailed(_))));
    }

    proptest! {
        #[test]
        fn prop_accepted_rooms_never_intersect(seed in any::<u64>()) {
            let config = GenerationConfig::new(seed);
            let dungeon = RoomCorridorGenerator::new(1)
                .generate(&config, &mut create_rng(&config))
                .unwrap();

            for (i, a) in dungeon.rooms.iter().enumerate() {
                for b in &dungeon.rooms[i + 1..] {
                    prop_assert!(!a.intersects(b));
                }
            }
        }
    }
}
