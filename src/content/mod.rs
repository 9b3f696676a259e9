//! # Content Definitions
//!
//! Immutable monster and item templates, looked up by id when the generator
//! or a spawner needs a new entity.
//!
//! Definitions come either from the built-in tables ([`ContentRegistry::builtin`])
//! or from JSON files ([`load_monsters`], [`load_items`]). A registry is part
//! of the game snapshot, so a restored game spawns exactly what the saved one
//! would have.

pub mod builtin;
pub mod loader;

pub use builtin::*;
pub use loader::*;

use crate::ai::{AggressiveHunt, Behavior, Hunt, SpawnerGuard};
use crate::config::CONFUSION_TURNS;
use crate::game::{Color, Entity, EntityId, Equippable, Fighter, Item, Position, RenderOrder};
use crate::utils::from_dungeon_level;
use crate::LeavenResult;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Base combat statistics of a monster template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterTemplate {
    pub hp: i32,
    pub defense: i32,
    pub power: i32,
    pub xp: i32,
    pub golden: bool,
    pub max_gold_drop: i32,
}

impl FighterTemplate {
    fn build(&self) -> Fighter {
        Fighter::new(self.hp, self.defense, self.power, self.xp)
            .with_gold(self.golden, self.max_gold_drop)
    }
}

/// Which behavior a freshly spawned monster starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AiKind {
    Hunt,
    Aggressive { patience: i32 },
    Confused,
    Dormant,
    Static,
    MotherDough,
    Sourdough {
        min_spread_time: i32,
        max_spread_time: i32,
    },
}

impl AiKind {
    /// Builds the initial behavior. Sourdough rolls its first countdown here.
    pub fn build(self, rng: &mut StdRng) -> Behavior {
        match self {
            AiKind::Hunt => Behavior::Hunt(Hunt),
            AiKind::Aggressive { patience } => Behavior::AggressiveHunt(AggressiveHunt::new(patience)),
            AiKind::Confused => Behavior::Hunt(Hunt).confused(CONFUSION_TURNS),
            AiKind::Dormant => Behavior::Dormant,
            AiKind::Static => Behavior::StaticGuard,
            AiKind::MotherDough => Behavior::SpawnerGuard(SpawnerGuard::mother_dough()),
            AiKind::Sourdough {
                min_spread_time,
                max_spread_time,
            } => Behavior::SpawnerGuard(SpawnerGuard::sourdough(
                min_spread_time,
                max_spread_time,
                rng,
            )),
        }
    }
}

/// A monster template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterDefinition {
    pub id: String,
    pub name: String,
    pub glyph: char,
    pub color: Color,
    pub fighter: FighterTemplate,
    pub ai: AiKind,
    /// `(weight, min_depth)` steps
    pub spawn_rate: Vec<(i32, i32)>,
}

impl MonsterDefinition {
    /// Spawn weight at a depth.
    pub fn rate_at(&self, depth: i32) -> i32 {
        from_dungeon_level(&self.spawn_rate, depth)
    }

    /// Creates a live monster from this template.
    pub fn instantiate(&self, id: EntityId, position: Position, rng: &mut StdRng) -> Entity {
        Entity::new(
            id,
            position,
            self.glyph,
            self.color,
            self.name.clone(),
            true,
            RenderOrder::Actor,
        )
        .with_definition(self.id.clone())
        .with_fighter(self.fighter.build())
        .with_ai(self.ai.build(rng))
    }
}

/// An item template. Equipment carries an [`Equippable`]; consumables carry a use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    pub glyph: char,
    pub color: Color,
    pub item: Item,
    pub equippable: Option<Equippable>,
    pub spawn_rate: Vec<(i32, i32)>,
}

impl ItemDefinition {
    /// Spawn weight at a depth.
    pub fn rate_at(&self, depth: i32) -> i32 {
        from_dungeon_level(&self.spawn_rate, depth)
    }

    /// Creates a floor item from this template.
    pub fn instantiate(&self, id: EntityId, position: Position) -> Entity {
        let entity = Entity::new(
            id,
            position,
            self.glyph,
            self.color,
            self.name.clone(),
            false,
            RenderOrder::Item,
        )
        .with_definition(self.id.clone())
        .with_item(self.item.clone());

        match &self.equippable {
            Some(equippable) => entity.with_equippable(equippable.clone()),
            None => entity,
        }
    }
}

/// Every definition the game can spawn, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRegistry {
    monsters: BTreeMap<String, MonsterDefinition>,
    items: BTreeMap<String, ItemDefinition>,
}

impl ContentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from JSON definition files.
    ///
    /// Either file failing to load at all is fatal; individual bad records
    /// are skipped.
    pub fn from_files(monsters: impl AsRef<Path>, items: impl AsRef<Path>) -> LeavenResult<Self> {
        let mut registry = Self::new();
        for definition in load_monsters(monsters)? {
            registry.add_monster(definition);
        }
        for definition in load_items(items)? {
            registry.add_item(definition);
        }
        Ok(registry)
    }

    /// Adds or replaces a monster definition.
    pub fn add_monster(&mut self, definition: MonsterDefinition) {
        self.monsters.insert(definition.id.clone(), definition);
    }

    /// Adds or replaces an item definition.
    pub fn add_item(&mut self, definition: ItemDefinition) {
        self.items.insert(definition.id.clone(), definition);
    }

    pub fn monster(&self, id: &str) -> Option<&MonsterDefinition> {
        self.monsters.get(id)
    }

    pub fn item(&self, id: &str) -> Option<&ItemDefinition> {
        self.items.get(id)
    }

    pub fn monsters(&self) -> impl Iterator<Item = &MonsterDefinition> {
        self.monsters.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items.values()
    }

    /// `(id, weight)` pairs for monster selection at a depth, in id order.
    pub fn monster_chances(&self, depth: i32) -> Vec<(String, i32)> {
        self.monsters
            .values()
            .map(|definition| (definition.id.clone(), definition.rate_at(depth)))
            .collect()
    }

    /// `(id, weight)` pairs for item selection at a depth, in id order.
    pub fn item_chances(&self, depth: i32) -> Vec<(String, i32)> {
        self.items
            .values()
            .map(|definition| (definition.id.clone(), definition.rate_at(depth)))
            .collect()
    }

    /// Instantiates any definition, monsters first. `None` for unknown ids.
    pub fn instantiate(
        &self,
        definition_id: &str,
        id: EntityId,
        position: Position,
        rng: &mut StdRng,
    ) -> Option<Entity> {
        if let Some(monster) = self.monster(definition_id) {
            return Some(monster.instantiate(id, position, rng));
        }
        self.item(definition_id)
            .map(|item| item.instantiate(id, position))
    }
}
