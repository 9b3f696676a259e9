//! Built-in monster and item tables, used when no definition files are given.

use super::{AiKind, ContentRegistry, FighterTemplate, ItemDefinition, MonsterDefinition};
use crate::game::{Color, EquipmentSlot, Equippable, Item, ItemUse, Message};

const DESATURATED_GREEN: Color = Color::new(63, 127, 63);
const DARKER_GREEN: Color = Color::new(0, 127, 0);
const DOUGH: Color = Color::new(222, 184, 135);
const LIGHT_PINK: Color = Color::new(255, 114, 184);
const SKY: Color = Color::new(0, 191, 255);
const DARKER_ORANGE: Color = Color::new(127, 63, 0);

fn monster(
    id: &str,
    name: &str,
    glyph: char,
    color: Color,
    fighter: FighterTemplate,
    ai: AiKind,
    spawn_rate: &[(i32, i32)],
) -> MonsterDefinition {
    MonsterDefinition {
        id: id.to_string(),
        name: name.to_string(),
        glyph,
        color,
        fighter,
        ai,
        spawn_rate: spawn_rate.to_vec(),
    }
}

fn fighter(hp: i32, defense: i32, power: i32, xp: i32, golden: bool, max_gold_drop: i32) -> FighterTemplate {
    FighterTemplate {
        hp,
        defense,
        power,
        xp,
        golden,
        max_gold_drop,
    }
}

fn item(
    id: &str,
    name: &str,
    glyph: char,
    color: Color,
    item: Item,
    equippable: Option<Equippable>,
    spawn_rate: &[(i32, i32)],
) -> ItemDefinition {
    ItemDefinition {
        id: id.to_string(),
        name: name.to_string(),
        glyph,
        color,
        item,
        equippable,
        spawn_rate: spawn_rate.to_vec(),
    }
}

fn equippable(slot: EquipmentSlot, power_bonus: i32, defense_bonus: i32) -> Option<Equippable> {
    Some(Equippable {
        slot,
        power_bonus,
        defense_bonus,
        max_hp_bonus: 0,
    })
}

/// The stock monsters.
pub fn builtin_monsters() -> Vec<MonsterDefinition> {
    vec![
        monster(
            "orc",
            "Orc",
            'o',
            DESATURATED_GREEN,
            fighter(20, 0, 4, 35, false, 4),
            AiKind::Hunt,
            &[(80, 1)],
        ),
        monster(
            "troll",
            "Troll",
            'T',
            DARKER_GREEN,
            fighter(30, 2, 8, 100, false, 8),
            AiKind::Hunt,
            &[(15, 3), (30, 5), (60, 7)],
        ),
        monster(
            "mother_dough",
            "Mother Dough",
            'M',
            DOUGH,
            fighter(40, 1, 3, 200, true, 30),
            AiKind::MotherDough,
            &[(10, 5)],
        ),
        // Only ever budded off a spawner
        monster(
            "sourdough_starter",
            "Sourdough Starter",
            's',
            DOUGH,
            fighter(8, 0, 2, 10, false, 2),
            AiKind::Sourdough {
                min_spread_time: 30,
                max_spread_time: 60,
            },
            &[(0, 1)],
        ),
    ]
}

/// The stock items.
pub fn builtin_items() -> Vec<ItemDefinition> {
    vec![
        item(
            "healing_potion",
            "Healing Potion",
            '!',
            Color::VIOLET,
            Item::consumable(ItemUse::Heal { amount: 40 }),
            None,
            &[(70, 1)],
        ),
        item(
            "sword",
            "Sword",
            ')',
            SKY,
            Item::inert(),
            equippable(EquipmentSlot::MainHand, 3, 0),
            &[(5, 4)],
        ),
        item(
            "shield",
            "Shield",
            '[',
            DARKER_ORANGE,
            Item::inert(),
            equippable(EquipmentSlot::OffHand, 0, 1),
            &[(15, 8)],
        ),
        item(
            "lightning_scroll",
            "Lightning Scroll",
            '?',
            Color::LIGHT_CYAN,
            Item::consumable(ItemUse::Lightning {
                damage: 40,
                maximum_range: 5,
            }),
            None,
            &[(25, 4)],
        ),
        item(
            "fireball_scroll",
            "Fireball Scroll",
            '?',
            Color::RED,
            Item::consumable(ItemUse::Fireball {
                damage: 25,
                radius: 3,
            })
            .with_targeting(Some(Message::new(
                "Choose a target tile for the fireball, or cancel.",
                Color::LIGHT_CYAN,
            ))),
            None,
            &[(25, 6)],
        ),
        item(
            "confusion_scroll",
            "Confusion Scroll",
            '?',
            LIGHT_PINK,
            Item::consumable(ItemUse::Confuse {
                turns: crate::config::CONFUSION_TURNS,
            })
            .with_targeting(Some(Message::new(
                "Choose an enemy to confuse, or cancel.",
                Color::LIGHT_CYAN,
            ))),
            None,
            &[(10, 2)],
        ),
    ]
}

impl ContentRegistry {
    /// A registry holding the stock monsters and items.
    ///
    /// # Examples
    ///
    /// ```
    /// use leaven::ContentRegistry;
    ///
    /// let registry = ContentRegistry::builtin();
    /// assert!(registry.monster("orc").is_some());
    /// assert!(registry.item("healing_potion").is_some());
    /// ```
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for definition in builtin_monsters() {
            registry.add_monster(definition);
        }
        for definition in builtin_items() {
            registry.add_item(definition);
        }
        registry
    }
}
