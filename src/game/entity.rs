//! # Entities
//!
//! Positioned actors with optional capabilities. Instead of attaching
//! arbitrary components at runtime, an [`Entity`] has one optional field per
//! known capability, each owned exclusively by that entity.

use crate::ai::Behavior;
use crate::config::{LEVEL_UP_BASE, LEVEL_UP_FACTOR};
use crate::game::{Color, EntityId, Equipment, EquipmentSlot, Message, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Timed conditions a fighter can be under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Monsters cannot lock onto an invisible target
    Invisible,
}

/// Draw order hint for renderers. The core never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RenderOrder {
    Stairs,
    Gold,
    Item,
    Actor,
}

/// Combat statistics.
///
/// `power`, `defense` and `max_hp` are base values; equipment bonuses are
/// added by [`Entity::power`] and friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fighter {
    pub hp: i32,
    pub max_hp: i32,
    pub defense: i32,
    pub power: i32,
    /// Experience awarded to whoever kills this fighter
    pub xp_value: i32,
    /// Golden fighters always drop their full gold allowance
    pub golden: bool,
    pub max_gold_drop: i32,
    /// Remaining turns per active status
    pub status: BTreeMap<StatusKind, i32>,
}

impl Fighter {
    /// Creates a fighter at full health.
    pub fn new(hp: i32, defense: i32, power: i32, xp_value: i32) -> Self {
        let hp = hp.max(0);
        Self {
            hp,
            max_hp: hp,
            defense,
            power,
            xp_value,
            golden: false,
            max_gold_drop: 0,
            status: BTreeMap::new(),
        }
    }

    /// Sets the gold reward carried by this fighter.
    pub fn with_gold(mut self, golden: bool, max_gold_drop: i32) -> Self {
        self.golden = golden;
        self.max_gold_drop = max_gold_drop.max(0);
        self
    }

    /// Applies damage, clamping at zero. Returns true if the fighter died.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.hp = (self.hp - amount.max(0)).max(0);
        self.hp == 0
    }

    /// Remaining turns of a status, zero when inactive.
    pub fn status_remaining(&self, kind: StatusKind) -> i32 {
        self.status.get(&kind).copied().unwrap_or(0)
    }

    /// Whether a status is active with a positive duration.
    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.status_remaining(kind) > 0
    }

    /// Starts or extends a status.
    pub fn set_status(&mut self, kind: StatusKind, turns: i32) {
        self.status.insert(kind, turns);
    }

    /// Counts every status down by one turn and drops the expired ones.
    pub fn tick_statuses(&mut self) {
        for turns in self.status.values_mut() {
            *turns -= 1;
        }
        self.status.retain(|_, turns| *turns > 0);
    }
}

/// Experience and character level. Only the player carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub current_level: i32,
    /// Experience gathered towards the next level
    pub current_xp: i32,
    pub level_up_base: i32,
    pub level_up_factor: i32,
}

impl Level {
    /// Level 1 with no experience.
    pub fn new() -> Self {
        Self {
            current_level: 1,
            current_xp: 0,
            level_up_base: LEVEL_UP_BASE,
            level_up_factor: LEVEL_UP_FACTOR,
        }
    }

    /// Experience needed to leave the current level.
    ///
    /// ```
    /// use leaven::Level;
    ///
    /// assert_eq!(Level::new().experience_to_next_level(), 350);
    /// ```
    pub fn experience_to_next_level(&self) -> i32 {
        self.level_up_base + self.current_level * self.level_up_factor
    }

    /// Adds experience. Returns true when this crossed into a new level.
    ///
    /// At most one level is gained per call; the surplus carries over.
    pub fn add_xp(&mut self, xp: i32) -> bool {
        self.current_xp += xp.max(0);
        let needed = self.experience_to_next_level();
        if self.current_xp > needed {
            self.current_xp -= needed;
            self.current_level += 1;
            true
        } else {
            false
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::new()
    }
}

/// Stat raised when the player levels up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelUpChoice {
    /// +20 max hp, healed by the same amount
    Constitution,
    /// +1 power
    Strength,
    /// +1 defense
    Agility,
}

/// What a consumable does when used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemUse {
    Heal { amount: i32 },
    Lightning { damage: i32, maximum_range: i32 },
    Fireball { damage: i32, radius: i32 },
    Confuse { turns: i32 },
}

/// Marks an entity as something that can be picked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub use_function: Option<ItemUse>,
    /// Whether the item needs a target tile before it can be used
    pub targeting: bool,
    pub targeting_message: Option<Message>,
}

impl Item {
    /// An item with no use of its own (equipment, trinkets).
    pub fn inert() -> Self {
        Self {
            use_function: None,
            targeting: false,
            targeting_message: None,
        }
    }

    /// A consumable item.
    pub fn consumable(use_function: ItemUse) -> Self {
        Self {
            use_function: Some(use_function),
            targeting: false,
            targeting_message: None,
        }
    }

    /// Requires a target tile, prompting with `message`.
    pub fn with_targeting(mut self, message: Option<Message>) -> Self {
        self.targeting = true;
        self.targeting_message = message;
        self
    }
}

/// Stat bonuses granted while equipped in `slot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equippable {
    pub slot: EquipmentSlot,
    pub power_bonus: i32,
    pub defense_bonus: i32,
    pub max_hp_bonus: i32,
}

/// Down stairs leading to `floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stairs {
    pub floor: i32,
}

/// A pile of gold worth `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuable {
    pub value: i32,
}

/// Items carried by an entity. Carried items are owned here and are not on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub capacity: usize,
    pub items: Vec<Entity>,
    pub gold: i32,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
            gold: 0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn get(&self, item: EntityId) -> Option<&Entity> {
        self.items.iter().find(|entity| entity.id == item)
    }

    /// Removes and returns a carried item.
    pub fn take(&mut self, item: EntityId) -> Option<Entity> {
        let index = self.items.iter().position(|entity| entity.id == item)?;
        Some(self.items.remove(index))
    }
}

/// A positioned actor or object in the dungeon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub position: Position,
    pub glyph: char,
    pub color: Color,
    pub name: String,
    pub blocks_movement: bool,
    pub render_order: RenderOrder,
    /// Content definition this entity was created from, if any
    pub definition_id: Option<String>,
    pub fighter: Option<Fighter>,
    pub ai: Option<Behavior>,
    pub item: Option<Item>,
    pub equippable: Option<Equippable>,
    pub equipment: Option<Equipment>,
    pub inventory: Option<Inventory>,
    pub stairs: Option<Stairs>,
    pub valuable: Option<Valuable>,
    pub level: Option<Level>,
}

impl Entity {
    /// Creates a bare entity with no capabilities.
    pub fn new(
        id: EntityId,
        position: Position,
        glyph: char,
        color: Color,
        name: impl Into<String>,
        blocks_movement: bool,
        render_order: RenderOrder,
    ) -> Self {
        Self {
            id,
            position,
            glyph,
            color,
            name: name.into(),
            blocks_movement,
            render_order,
            definition_id: None,
            fighter: None,
            ai: None,
            item: None,
            equippable: None,
            equipment: None,
            inventory: None,
            stairs: None,
            valuable: None,
            level: None,
        }
    }

    pub fn with_definition(mut self, definition_id: impl Into<String>) -> Self {
        self.definition_id = Some(definition_id.into());
        self
    }

    pub fn with_fighter(mut self, fighter: Fighter) -> Self {
        self.fighter = Some(fighter);
        self
    }

    pub fn with_ai(mut self, ai: Behavior) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_equippable(mut self, equippable: Equippable) -> Self {
        self.equippable = Some(equippable);
        self
    }

    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.equipment = Some(equipment);
        self
    }

    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn with_stairs(mut self, stairs: Stairs) -> Self {
        self.stairs = Some(stairs);
        self
    }

    pub fn with_valuable(mut self, valuable: Valuable) -> Self {
        self.valuable = Some(valuable);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Entities without a fighter never die; fighters are alive while hp > 0.
    pub fn is_alive(&self) -> bool {
        self.fighter.as_ref().map_or(true, |fighter| fighter.hp > 0)
    }

    /// Euclidean distance to another entity.
    pub fn distance_to(&self, other: &Entity) -> f64 {
        self.position.euclidean_distance(other.position)
    }

    /// Whether the entity is under an active invisibility status.
    pub fn is_invisible(&self) -> bool {
        self.fighter
            .as_ref()
            .map_or(false, |fighter| fighter.has_status(StatusKind::Invisible))
    }

    fn equipped_bonus(&self, bonus: impl Fn(&Equippable) -> i32) -> i32 {
        let (Some(equipment), Some(inventory)) = (&self.equipment, &self.inventory) else {
            return 0;
        };
        equipment
            .equipped_items()
            .filter_map(|id| inventory.get(id))
            .filter_map(|item| item.equippable.as_ref())
            .map(bonus)
            .sum()
    }

    /// Attack power including equipment.
    pub fn power(&self) -> i32 {
        self.fighter.as_ref().map_or(0, |fighter| fighter.power)
            + self.equipped_bonus(|equippable| equippable.power_bonus)
    }

    /// Defense including equipment.
    pub fn defense(&self) -> i32 {
        self.fighter.as_ref().map_or(0, |fighter| fighter.defense)
            + self.equipped_bonus(|equippable| equippable.defense_bonus)
    }

    /// Maximum hit points including equipment.
    pub fn max_hp(&self) -> i32 {
        self.fighter.as_ref().map_or(0, |fighter| fighter.max_hp)
            + self.equipped_bonus(|equippable| equippable.max_hp_bonus)
    }

    /// Heals up to the effective maximum. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let max_hp = self.max_hp();
        let Some(fighter) = self.fighter.as_mut() else {
            return 0;
        };
        let before = fighter.hp;
        fighter.hp = (fighter.hp + amount.max(0)).min(max_hp);
        fighter.hp - before
    }

    /// Re-establishes `hp <= max_hp` after equipment changes.
    pub fn clamp_hp(&mut self) {
        let max_hp = self.max_hp();
        if let Some(fighter) = self.fighter.as_mut() {
            fighter.hp = fighter.hp.clamp(0, max_hp.max(0));
        }
    }
}

/// Owner of every entity on the current floor, keyed by id.
///
/// Iteration is in id order, which is also creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRoster {
    next_id: EntityId,
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a fresh id.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Adds an entity under its own id.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        self.entities.insert(id, entity);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Ids of every entity, in order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Drops every entity except `keep`.
    pub fn retain_only(&mut self, keep: EntityId) {
        self.entities.retain(|id, _| *id == keep);
    }

    /// All entities standing on a position.
    pub fn entities_at(&self, position: Position) -> impl Iterator<Item = &Entity> {
        self.entities
            .values()
            .filter(move |entity| entity.position == position)
    }

    /// The first movement-blocking entity on a position.
    pub fn blocking_entity_at(&self, position: Position) -> Option<&Entity> {
        self.entities_at(position)
            .find(|entity| entity.blocks_movement)
    }

    /// Whether anything at all occupies the position.
    pub fn is_occupied(&self, position: Position) -> bool {
        self.entities_at(position).next().is_some()
    }
}
