//! # Definition Loading
//!
//! Reads monster and item definitions from JSON arrays of records. A file
//! that is missing or is not a JSON array is fatal; a record that is
//! malformed or lacks a required field is skipped with a warning.
//!
//! Monster record:
//!
//! ```json
//! { "monster_id": "orc", "name": "Orc", "symbol": "o", "color": [63, 127, 63],
//!   "fighter": { "hp": 20, "defense": 0, "power": 4, "xp": 35, "max_gold_drop": 4 },
//!   "ai": "BasicMonster", "spawn_rate": [[80, 1]] }
//! ```
//!
//! Item record:
//!
//! ```json
//! { "item_id": "healing_potion", "name": "Healing Potion", "symbol": "!",
//!   "color": [127, 0, 255], "use_function": "heal", "positional": { "amount": 40 },
//!   "spawn_rate": [[70, 1]] }
//! ```

use super::{AiKind, FighterTemplate, ItemDefinition, MonsterDefinition};
use crate::config::{CONFUSION_TURNS, DEFAULT_PATIENCE};
use crate::game::{Color, EquipmentSlot, Equippable, Item, ItemUse, Message};
use crate::{LeavenError, LeavenResult};
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawFighter {
    hp: Option<i32>,
    defense: Option<i32>,
    power: Option<i32>,
    xp: Option<i32>,
    golden: Option<bool>,
    max_gold_drop: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RawMonster {
    monster_id: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
    color: Option<Vec<u8>>,
    fighter: Option<RawFighter>,
    ai: Option<String>,
    patience: Option<i32>,
    min_spread_time: Option<i32>,
    max_spread_time: Option<i32>,
    spawn_rate: Option<Vec<(i32, i32)>>,
}

#[derive(Debug, Deserialize)]
struct RawEquippable {
    slot: String,
    #[serde(default)]
    power_bonus: i32,
    #[serde(default)]
    defense_bonus: i32,
    #[serde(default)]
    max_hp_bonus: i32,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    item_id: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
    color: Option<Vec<u8>>,
    use_function: Option<String>,
    #[serde(default)]
    targeting: bool,
    targeting_message: Option<String>,
    #[serde(default)]
    positional: BTreeMap<String, i32>,
    equippable: Option<RawEquippable>,
    spawn_rate: Option<Vec<(i32, i32)>>,
}

/// Parses an AI name as written in definition files. Unknown names hunt.
pub fn parse_ai_kind(
    name: Option<&str>,
    patience: Option<i32>,
    spread: (Option<i32>, Option<i32>),
) -> AiKind {
    match name {
        Some("AggressiveMonster") | Some("aggressive") => AiKind::Aggressive {
            patience: patience.unwrap_or(DEFAULT_PATIENCE),
        },
        Some("ConfusedMonster") | Some("confused") => AiKind::Confused,
        Some("DummyMonster") | Some("dormant") => AiKind::Dormant,
        Some("StaticMonster") | Some("static") => AiKind::Static,
        Some("MotherDoughAI") | Some("mother_dough") => AiKind::MotherDough,
        Some("SourdoughAI") | Some("sourdough") => {
            let min_spread_time = spread.0.unwrap_or(30);
            AiKind::Sourdough {
                min_spread_time,
                max_spread_time: spread.1.unwrap_or(min_spread_time),
            }
        }
        Some("BasicMonster") | Some("hunt") | None => AiKind::Hunt,
        Some(other) => {
            warn!("Unknown AI '{}', defaulting to hunt", other);
            AiKind::Hunt
        }
    }
}

fn parse_glyph(symbol: Option<String>) -> Option<char> {
    symbol.and_then(|symbol| symbol.chars().next())
}

fn parse_color(color: Option<Vec<u8>>) -> Option<Color> {
    color.and_then(|components| Color::from_slice(&components))
}

fn parse_spawn_rate(spawn_rate: Option<Vec<(i32, i32)>>) -> Option<Vec<(i32, i32)>> {
    spawn_rate.filter(|rate| !rate.is_empty())
}

fn monster_from_raw(raw: RawMonster) -> Option<MonsterDefinition> {
    let fighter = raw.fighter?;
    Some(MonsterDefinition {
        id: raw.monster_id.filter(|id| !id.is_empty())?,
        name: raw.name.filter(|name| !name.is_empty())?,
        glyph: parse_glyph(raw.symbol)?,
        color: parse_color(raw.color)?,
        fighter: FighterTemplate {
            hp: fighter.hp?,
            defense: fighter.defense?,
            power: fighter.power?,
            xp: fighter.xp.unwrap_or(0),
            golden: fighter.golden.unwrap_or(false),
            max_gold_drop: fighter.max_gold_drop.unwrap_or(0),
        },
        ai: parse_ai_kind(
            raw.ai.as_deref(),
            raw.patience,
            (raw.min_spread_time, raw.max_spread_time),
        ),
        spawn_rate: parse_spawn_rate(raw.spawn_rate)?,
    })
}

fn item_use(name: &str, positional: &BTreeMap<String, i32>) -> Option<ItemUse> {
    let get = |key: &str| positional.get(key).copied();
    match name {
        "heal" => Some(ItemUse::Heal {
            amount: get("amount")?,
        }),
        "cast_lightning" | "lightning" => Some(ItemUse::Lightning {
            damage: get("damage")?,
            maximum_range: get("maximum_range")?,
        }),
        "cast_fireball" | "fireball" => Some(ItemUse::Fireball {
            damage: get("damage")?,
            radius: get("radius")?,
        }),
        "cast_confuse" | "confuse" => Some(ItemUse::Confuse {
            turns: get("turns").unwrap_or(CONFUSION_TURNS),
        }),
        _ => None,
    }
}

fn item_from_raw(raw: RawItem) -> Option<ItemDefinition> {
    let use_function = match raw.use_function.as_deref() {
        Some(name) => Some(item_use(name, &raw.positional)?),
        None => None,
    };
    let equippable = match raw.equippable {
        Some(equippable) => Some(Equippable {
            slot: EquipmentSlot::from_name(&equippable.slot)?,
            power_bonus: equippable.power_bonus,
            defense_bonus: equippable.defense_bonus,
            max_hp_bonus: equippable.max_hp_bonus,
        }),
        None => None,
    };

    let mut item = Item {
        use_function,
        targeting: false,
        targeting_message: None,
    };
    if raw.targeting {
        item = item.with_targeting(
            raw.targeting_message
                .map(|text| Message::new(text, Color::LIGHT_CYAN)),
        );
    }

    Some(ItemDefinition {
        id: raw.item_id.filter(|id| !id.is_empty())?,
        name: raw.name.filter(|name| !name.is_empty())?,
        glyph: parse_glyph(raw.symbol)?,
        color: parse_color(raw.color)?,
        item,
        equippable,
        spawn_rate: parse_spawn_rate(raw.spawn_rate)?,
    })
}

fn records(json: &str, what: &str) -> LeavenResult<Vec<Value>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| LeavenError::ContentUnavailable(format!("{} definitions: {}", what, e)))?;
    match value {
        Value::Array(records) => Ok(records),
        _ => Err(LeavenError::ContentUnavailable(format!(
            "{} definitions must be a JSON array",
            what
        ))),
    }
}

fn parse_records<R, T>(json: &str, what: &str, convert: impl Fn(R) -> Option<T>) -> LeavenResult<Vec<T>>
where
    R: for<'de> Deserialize<'de>,
{
    let mut definitions = Vec::new();
    for (index, record) in records(json, what)?.into_iter().enumerate() {
        match serde_json::from_value::<R>(record).ok().and_then(&convert) {
            Some(definition) => definitions.push(definition),
            None => warn!("Skipping malformed {} record #{}", what, index),
        }
    }
    Ok(definitions)
}

fn read_definitions(path: &Path, what: &str) -> LeavenResult<String> {
    fs::read_to_string(path).map_err(|e| {
        LeavenError::ContentUnavailable(format!(
            "{} definitions at {}: {}",
            what,
            path.display(),
            e
        ))
    })
}

/// Parses monster definitions from a JSON string.
///
/// # Examples
///
/// ```
/// use leaven::monsters_from_str;
///
/// let json = r#"[
///     {"monster_id": "orc", "name": "Orc", "symbol": "o", "color": [63, 127, 63],
///      "fighter": {"hp": 20, "defense": 0, "power": 4}, "spawn_rate": [[80, 1]]},
///     {"monster_id": "ghost", "name": "Ghost"}
/// ]"#;
/// let monsters = monsters_from_str(json).unwrap();
/// assert_eq!(monsters.len(), 1);
/// ```
pub fn monsters_from_str(json: &str) -> LeavenResult<Vec<MonsterDefinition>> {
    parse_records(json, "monster", monster_from_raw)
}

/// Parses item definitions from a JSON string.
pub fn items_from_str(json: &str) -> LeavenResult<Vec<ItemDefinition>> {
    parse_records(json, "item", item_from_raw)
}

/// Loads monster definitions from a JSON file.
pub fn load_monsters(path: impl AsRef<Path>) -> LeavenResult<Vec<MonsterDefinition>> {
    let json = read_definitions(path.as_ref(), "monster")?;
    let monsters = monsters_from_str(&json)?;
    log::info!(
        "Loaded {} monster definitions from {}",
        monsters.len(),
        path.as_ref().display()
    );
    Ok(monsters)
}

/// Loads item definitions from a JSON file.
pub fn load_items(path: impl AsRef<Path>) -> LeavenResult<Vec<ItemDefinition>> {
    let json = read_definitions(path.as_ref(), "item")?;
    let items = items_from_str(&json)?;
    log::info!(
        "Loaded {} item definitions from {}",
        items.len(),
        path.as_ref().display()
    );
    Ok(items)
}
