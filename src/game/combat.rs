//! # Combat
//!
//! Attack resolution. Damage is applied to the defender immediately; anything
//! that needs the rest of the world (removing the corpse, crediting xp,
//! dropping gold) is returned as effects.

use crate::game::{Color, Effect, Entity, EntityId};

/// Resolves a melee attack.
///
/// Damage is `max(0, attacker power - defender defense)`. A defender that drops
/// to zero hit points produces a [`Effect::Death`].
///
/// # Examples
///
/// ```
/// use leaven::{attack, Color, Effect, Entity, Fighter, Position, RenderOrder};
///
/// let attacker = Entity::new(1, Position::new(0, 0), 'T', Color::GREEN, "Troll", true, RenderOrder::Actor)
///     .with_fighter(Fighter::new(30, 2, 10, 100));
/// let mut defender = Entity::new(2, Position::new(1, 0), '@', Color::WHITE, "Player", true, RenderOrder::Actor)
///     .with_fighter(Fighter::new(20, 3, 2, 0));
/// defender.fighter.as_mut().unwrap().hp = 5;
///
/// let effects = attack(&attacker, &mut defender);
/// assert_eq!(defender.fighter.as_ref().unwrap().hp, 0);
/// assert!(effects.iter().any(|e| matches!(e, Effect::Death { entity: 2, .. })));
/// ```
pub fn attack(attacker: &Entity, defender: &mut Entity) -> Vec<Effect> {
    if defender.fighter.is_none() || !defender.is_alive() {
        return Vec::new();
    }

    let damage = (attacker.power() - defender.defense()).max(0);
    let mut effects = Vec::new();

    if damage > 0 {
        effects.push(Effect::message(
            format!(
                "{} attacks {} for {} hit points.",
                capitalize(&attacker.name),
                defender.name,
                damage
            ),
            Color::WHITE,
        ));
        effects.extend(take_damage(defender, damage, Some(attacker.id)));
    } else {
        effects.push(Effect::message(
            format!(
                "{} attacks {} but does no damage.",
                capitalize(&attacker.name),
                defender.name
            ),
            Color::WHITE,
        ));
    }

    effects
}

/// Applies raw damage from any source and reports a death if it was lethal.
pub fn take_damage(defender: &mut Entity, amount: i32, killer: Option<EntityId>) -> Vec<Effect> {
    let id = defender.id;
    let Some(fighter) = defender.fighter.as_mut() else {
        return Vec::new();
    };
    if fighter.hp == 0 {
        return Vec::new();
    }

    if fighter.take_damage(amount) {
        vec![Effect::Death {
            entity: id,
            killer,
            xp: fighter.xp_value,
            max_gold_drop: fighter.max_gold_drop,
            golden: fighter.golden,
        }]
    } else {
        Vec::new()
    }
}

/// Upper-cases the first letter of a name for the start of a sentence.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
