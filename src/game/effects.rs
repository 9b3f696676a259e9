//! # Effects and Messages
//!
//! Behaviors and player actions never touch shared state directly. They
//! describe what should happen as [`Effect`] values, and the turn driver in
//! [`crate::GameState`] applies them in order. Combat and equipment changes
//! resolve on the spot and report what happened with the same vocabulary.

use crate::ai::Behavior;
use crate::game::{EntityId, EquipmentSlot, Position};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// An RGB color attached to messages and entity glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const ORANGE: Color = Color::new(255, 127, 0);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const GOLD: Color = Color::new(229, 191, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const LIGHT_GREEN: Color = Color::new(63, 255, 63);
    pub const LIGHT_CYAN: Color = Color::new(63, 255, 255);
    pub const VIOLET: Color = Color::new(127, 0, 255);
    pub const LIGHT_VIOLET: Color = Color::new(159, 63, 255);

    /// Creates a color from its components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from a `[r, g, b]` triple as found in content files.
    pub fn from_slice(components: &[u8]) -> Option<Self> {
        match components {
            [r, g, b] => Some(Self::new(*r, *g, *b)),
            _ => None,
        }
    }
}

/// A line of text for the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub color: Color,
}

impl Message {
    /// Creates a message.
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// Bounded log of recent messages; the oldest entry is dropped first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    capacity: usize,
    messages: VecDeque<Message>,
}

impl MessageLog {
    /// Creates an empty log holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            messages: VecDeque::new(),
        }
    }

    /// Appends a message, evicting the oldest when full.
    pub fn add_message(&mut self, message: Message) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Messages from oldest to newest.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Everything a turn can ask the world to do.
///
/// The set is closed: the turn driver handles every variant exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Melee attack to be resolved by combat
    Attack {
        attacker: EntityId,
        target: EntityId,
    },
    /// Single step; the driver re-validates the destination before applying it
    Move { entity: EntityId, dx: i32, dy: i32 },
    /// Request to instantiate a definition at a position
    SpawnEntity { kind: String, position: Position },
    /// Restore hit points, capped at the entity's max hp
    Heal { entity: EntityId, amount: i32 },
    /// Raw damage that ignores defense, from spells and the like
    Damage {
        entity: EntityId,
        amount: i32,
        source: Option<EntityId>,
    },
    /// Text for the message log
    Message(Message),
    /// Replace an entity's active behavior
    SwapBehavior {
        entity: EntityId,
        behavior: Box<Behavior>,
    },
    /// A fighter dropped to zero hit points
    Death {
        entity: EntityId,
        killer: Option<EntityId>,
        xp: i32,
        max_gold_drop: i32,
        golden: bool,
    },
    /// An item moved from the floor into an inventory
    ItemPickedUp { entity: EntityId, item: EntityId },
    /// Gold moved from the floor into a purse
    GoldCollected {
        entity: EntityId,
        pile: EntityId,
        amount: i32,
    },
    /// An item left an inventory for the floor
    ItemDropped { entity: EntityId, item: EntityId },
    /// A consumable was used up
    ItemConsumed { entity: EntityId, item: EntityId },
    /// An item was put into an equipment slot
    Equipped {
        entity: EntityId,
        item: EntityId,
        slot: EquipmentSlot,
    },
    /// An item was taken out of an equipment slot
    Unequipped {
        entity: EntityId,
        item: EntityId,
        slot: EquipmentSlot,
    },
}

impl Effect {
    /// Shorthand for a message effect.
    pub fn message(text: impl Into<String>, color: Color) -> Self {
        Effect::Message(Message::new(text, color))
    }
}
