//! # Equipment
//!
//! Slot bookkeeping for worn and wielded items. Equipment only records which
//! item id sits in which slot; the items themselves live in the owner's
//! inventory.

use crate::game::{Effect, EntityId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body slots an item can be equipped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    MainHand,
    OffHand,
    Head,
    UnderTorso,
    OverTorso,
    Legs,
    Feet,
    LeftFinger,
    RightFinger,
}

impl EquipmentSlot {
    /// Every slot in display order.
    pub const ALL: [EquipmentSlot; 9] = [
        EquipmentSlot::MainHand,
        EquipmentSlot::OffHand,
        EquipmentSlot::Head,
        EquipmentSlot::UnderTorso,
        EquipmentSlot::OverTorso,
        EquipmentSlot::Legs,
        EquipmentSlot::Feet,
        EquipmentSlot::LeftFinger,
        EquipmentSlot::RightFinger,
    ];

    /// Parses the snake_case names used by content files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "main_hand" => Some(EquipmentSlot::MainHand),
            "off_hand" => Some(EquipmentSlot::OffHand),
            "head" => Some(EquipmentSlot::Head),
            "under_torso" => Some(EquipmentSlot::UnderTorso),
            "over_torso" => Some(EquipmentSlot::OverTorso),
            "legs" => Some(EquipmentSlot::Legs),
            "feet" => Some(EquipmentSlot::Feet),
            "left_finger" => Some(EquipmentSlot::LeftFinger),
            "right_finger" => Some(EquipmentSlot::RightFinger),
            _ => None,
        }
    }

    /// Human-readable slot name.
    pub fn label(self) -> &'static str {
        match self {
            EquipmentSlot::MainHand => "main hand",
            EquipmentSlot::OffHand => "off hand",
            EquipmentSlot::Head => "head",
            EquipmentSlot::UnderTorso => "under torso",
            EquipmentSlot::OverTorso => "over torso",
            EquipmentSlot::Legs => "legs",
            EquipmentSlot::Feet => "feet",
            EquipmentSlot::LeftFinger => "left finger",
            EquipmentSlot::RightFinger => "right finger",
        }
    }
}

/// Which inventory item occupies each slot. At most one item per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    slots: BTreeMap<EquipmentSlot, EntityId>,
}

impl Equipment {
    /// Creates equipment with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// The item in a slot, if any.
    pub fn in_slot(&self, slot: EquipmentSlot) -> Option<EntityId> {
        self.slots.get(&slot).copied()
    }

    /// The slot an item is equipped in, if any.
    pub fn slot_of(&self, item: EntityId) -> Option<EquipmentSlot> {
        self.slots
            .iter()
            .find_map(|(slot, equipped)| (*equipped == item).then_some(*slot))
    }

    /// Whether the item is currently equipped.
    pub fn is_equipped(&self, item: EntityId) -> bool {
        self.slot_of(item).is_some()
    }

    /// Ids of every equipped item.
    pub fn equipped_items(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.values().copied()
    }

    /// Equips or unequips `item`.
    ///
    /// If the item already sits in `item_slot` it is taken off. Otherwise it
    /// replaces whatever occupies `item_slot`, and the previous occupant is
    /// reported as unequipped. An item recorded in a different slot is a
    /// mismatch: nothing changes and no effect is returned.
    pub fn toggle_equip(
        &mut self,
        owner: EntityId,
        item: EntityId,
        item_slot: EquipmentSlot,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();

        match self.slot_of(item) {
            Some(slot) if slot == item_slot => {
                self.slots.remove(&slot);
                effects.push(Effect::Unequipped {
                    entity: owner,
                    item,
                    slot,
                });
            }
            Some(_) => {}
            None => {
                if let Some(previous) = self.slots.insert(item_slot, item) {
                    effects.push(Effect::Unequipped {
                        entity: owner,
                        item: previous,
                        slot: item_slot,
                    });
                }
                effects.push(Effect::Equipped {
                    entity: owner,
                    item,
                    slot: item_slot,
                });
            }
        }

        effects
    }

    /// Removes an item from whatever slot holds it.
    pub fn unequip(&mut self, item: EntityId) -> Option<EquipmentSlot> {
        let slot = self.slot_of(item)?;
        self.slots.remove(&slot);
        Some(slot)
    }
}
