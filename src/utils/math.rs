//! # Game Mathematics
//!
//! Depth-scaled lookups and weighted random choice, used by spawning and
//! content selection.

use rand::rngs::StdRng;
use rand::Rng;

/// Looks up a value from a stepped `(value, min_depth)` table.
///
/// Entries are scanned from the last to the first; the first entry whose
/// `min_depth` is at most `depth` wins. Tables are expected in ascending
/// depth order. Returns 0 when no entry applies.
///
/// # Examples
///
/// ```
/// use leaven::from_dungeon_level;
///
/// let table = [(2, 1), (3, 4), (5, 6)];
/// assert_eq!(from_dungeon_level(&table, 1), 2);
/// assert_eq!(from_dungeon_level(&table, 5), 3);
/// assert_eq!(from_dungeon_level(&table, 9), 5);
/// assert_eq!(from_dungeon_level(&[(15, 3)], 2), 0);
/// ```
pub fn from_dungeon_level(table: &[(i32, i32)], depth: i32) -> i32 {
    table
        .iter()
        .rev()
        .find(|(_, level)| depth >= *level)
        .map_or(0, |(value, _)| *value)
}

/// Picks an index with probability proportional to its weight.
///
/// Draws uniformly in `1..=sum` and returns the first index whose running
/// total reaches the draw. Non-positive weights are never picked. Returns
/// `None` when the total weight is zero.
pub fn random_choice_index(weights: &[i32], rng: &mut StdRng) -> Option<usize> {
    let total: i64 = weights.iter().map(|w| (*w).max(0) as i64).sum();
    if total <= 0 {
        return None;
    }

    let draw = rng.gen_range(1..=total);
    let mut running = 0i64;
    for (index, weight) in weights.iter().enumerate() {
        running += (*weight).max(0) as i64;
        if draw <= running {
            return Some(index);
        }
    }
    None
}

/// Picks a key from `(key, weight)` pairs with weighted probability.
pub fn random_choice_from_table<'a, K>(table: &'a [(K, i32)], rng: &mut StdRng) -> Option<&'a K> {
    let weights: Vec<i32> = table.iter().map(|(_, weight)| *weight).collect();
    random_choice_index(&weights, rng).map(|index| &table[index].0)
}
