//! # Field of View
//!
//! Recursive shadowcasting over the tile grid. A tile is visible when it lies
//! within the Euclidean radius and no sight-blocking tile occludes it from the
//! origin. Walls that stop sight are themselves visible.

use crate::game::{GameMap, Position};
use serde::{Deserialize, Serialize};

/// Octant transforms: (xx, xy, yx, yy)
const OCTANTS: [(i32, i32, i32, i32); 8] = [
    (1, 0, 0, 1),
    (0, 1, 1, 0),
    (0, -1, 1, 0),
    (-1, 0, 0, 1),
    (-1, 0, 0, -1),
    (0, -1, -1, 0),
    (0, 1, -1, 0),
    (1, 0, 0, -1),
];

/// The set of tiles visible from one viewpoint, with O(1) membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOfView {
    pub origin: Position,
    pub radius: i32,
    width: i32,
    height: i32,
    visible: Vec<bool>,
}

impl FieldOfView {
    /// A field of view where nothing is visible.
    pub fn empty(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            origin: Position::origin(),
            radius: 0,
            width,
            height,
            visible: vec![false; (width * height) as usize],
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some((pos.y * self.width + pos.x) as usize)
    }

    fn set_visible(&mut self, pos: Position) {
        if let Some(index) = self.index(pos) {
            self.visible[index] = true;
        }
    }

    /// Whether the position is visible.
    pub fn is_in_fov(&self, pos: Position) -> bool {
        self.index(pos)
            .and_then(|index| self.visible.get(index).copied())
            .unwrap_or(false)
    }

    /// Every visible position, row by row.
    pub fn visible_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.visible
            .iter()
            .enumerate()
            .filter(|(_, visible)| **visible)
            .map(move |(index, _)| {
                let index = index as i32;
                Position::new(index % self.width, index / self.width)
            })
    }

    /// Number of visible tiles.
    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|visible| **visible).count()
    }
}

/// Computes the visible set without touching the map.
///
/// A radius of zero or less means unlimited range.
pub fn calculate_fov(map: &GameMap, origin: Position, radius: i32) -> FieldOfView {
    let mut fov = FieldOfView::empty(map.width(), map.height());
    let radius = if radius <= 0 {
        map.width().max(map.height())
    } else {
        radius
    };
    fov.origin = origin;
    fov.radius = radius;

    if !map.in_bounds(origin) {
        return fov;
    }

    fov.set_visible(origin);
    for &transform in OCTANTS.iter() {
        cast_light(map, &mut fov, origin, radius, 1, 1.0, 0.0, transform);
    }
    fov
}

/// Computes the visible set and marks every visible tile as explored.
pub fn compute_fov(map: &mut GameMap, origin: Position, radius: i32) -> FieldOfView {
    let fov = calculate_fov(map, origin, radius);
    for pos in fov.visible_positions() {
        map.mark_explored(pos);
    }
    fov
}

#[allow(clippy::too_many_arguments)]
fn cast_light(
    map: &GameMap,
    fov: &mut FieldOfView,
    origin: Position,
    radius: i32,
    row: i32,
    mut start: f64,
    end: f64,
    (xx, xy, yx, yy): (i32, i32, i32, i32),
) {
    if start < end {
        return;
    }

    let radius_sq = radius * radius;
    let mut new_start = 0.0;

    for distance in row..=radius {
        let dy = -distance;
        let mut blocked = false;

        for dx in -distance..=0 {
            let current = Position::new(
                origin.x + dx * xx + dy * xy,
                origin.y + dx * yx + dy * yy,
            );
            let left_slope = (dx as f64 - 0.5) / (dy as f64 + 0.5);
            let right_slope = (dx as f64 + 0.5) / (dy as f64 - 0.5);

            if start < right_slope {
                continue;
            }
            if end > left_slope {
                break;
            }

            if dx * dx + dy * dy <= radius_sq {
                fov.set_visible(current);
            }

            let opaque = map.blocks_sight(current);
            if blocked {
                if opaque {
                    new_start = right_slope;
                } else {
                    blocked = false;
                    start = new_start;
                }
            } else if opaque && distance < radius {
                blocked = true;
                cast_light(
                    map,
                    fov,
                    origin,
                    radius,
                    distance + 1,
                    start,
                    left_slope,
                    (xx, xy, yx, yy),
                );
                new_start = right_slope;
            }
        }

        if blocked {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Room;

    fn open_room() -> GameMap {
        let mut map = GameMap::new(20, 20, 1);
        map.create_room(&Room::new(0, 0, 0, 19, 19));
        map
    }

    #[test]
    fn test_open_room_is_visible() {
        let map = open_room();
        let fov = calculate_fov(&map, Position::new(9, 9), 10);

        assert!(fov.is_in_fov(Position::new(9, 9)));
        assert!(fov.is_in_fov(Position::new(14, 9)));
        assert!(fov.is_in_fov(Position::new(5, 5)));
        // Border walls are lit
        assert!(fov.is_in_fov(Position::new(0, 9)));
    }

    #[test]
    fn test_radius_is_euclidean() {
        let map = open_room();
        let fov = calculate_fov(&map, Position::new(9, 9), 3);

        assert!(fov.is_in_fov(Position::new(12, 9)));
        assert!(fov.is_in_fov(Position::new(11, 11)));
        assert!(!fov.is_in_fov(Position::new(12, 12)));
        assert!(!fov.is_in_fov(Position::new(13, 9)));
    }

    #[test]
    fn test_wall_occludes() {
        let mut map = open_room();
        for y in 1..19 {
            map.set_tile(Position::new(12, y), crate::game::Tile::wall())
                .unwrap();
        }

        let fov = calculate_fov(&map, Position::new(9, 9), 10);
        assert!(fov.is_in_fov(Position::new(12, 9)), "the wall itself is seen");
        assert!(!fov.is_in_fov(Position::new(14, 9)));
        assert!(!fov.is_in_fov(Position::new(16, 12)));
        assert!(fov.is_in_fov(Position::new(10, 12)));
    }

    #[test]
    fn test_compute_marks_explored() {
        let mut map = open_room();
        assert!(!map.is_explored(Position::new(9, 10)));

        let fov = compute_fov(&mut map, Position::new(9, 9), 4);
        assert!(map.is_explored(Position::new(9, 10)));
        assert!(!map.is_explored(Position::new(1, 1)));
        assert_eq!(
            fov.visible_positions().count(),
            fov.visible_count()
        );
    }

    #[test]
    fn test_out_of_bounds_origin_sees_nothing() {
        let map = open_room();
        let fov = calculate_fov(&map, Position::new(-3, 4), 5);
        assert_eq!(fov.visible_count(), 0);
    }
}
