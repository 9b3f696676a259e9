//! # Game State Module
//!
//! Central game state and the turn driver.
//!
//! [`GameState`] owns the current floor (map and entity roster), the player's
//! field of view, the message log and the content registry. The world only
//! advances through [`GameState::step`]: the player's action is resolved,
//! then every monster alive at the start of the round takes exactly one turn
//! in roster order, then statuses tick down.
//!
//! Every effect produced along the way goes through one queue. Effects that
//! cause further effects (an attack that kills, say) have their follow-ups
//! resolved before the rest of the queue.

use crate::ai::{MonsterBehavior, TurnContext};
use crate::config::{
    DEFAULT_FOV_RADIUS, DEFAULT_INVENTORY_CAPACITY, DEFAULT_MESSAGE_LOG_CAPACITY,
    DESCEND_HEAL_DIVISOR, LEVEL_UP_HP_BONUS,
};
use crate::content::ContentRegistry;
use crate::game::combat::{self, capitalize};
use crate::game::{
    Color, Effect, Entity, EntityId, EntityRoster, Equipment, Fighter, GameMap, GamePhase,
    Inventory, ItemUse, Level, LevelUpChoice, MessageLog, PlayerAction, Position, RenderOrder,
    Stairs, TurnOutcome,
};
use crate::generation::{
    gold_pile, populate_room, GenerationConfig, PopulationSummary, RoomCorridorGenerator,
};
use crate::utils::{compute_fov, FieldOfView};
use crate::{LeavenError, LeavenResult};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// Starting stats for the player character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTemplate {
    pub hp: i32,
    pub defense: i32,
    pub power: i32,
}

impl Default for PlayerTemplate {
    fn default() -> Self {
        Self {
            hp: 100,
            defense: 1,
            power: 2,
        }
    }
}

/// Everything needed to start a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub generation: GenerationConfig,
    /// Player sight radius; zero or less means unlimited
    pub fov_radius: i32,
    pub message_log_capacity: usize,
    pub inventory_capacity: usize,
    pub player: PlayerTemplate,
}

impl GameConfig {
    /// Standard configuration with the given generation seed.
    pub fn new(seed: u64) -> Self {
        Self {
            generation: GenerationConfig::new(seed),
            ..Self::default()
        }
    }

    /// Smaller floors for tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            generation: GenerationConfig::for_testing(seed),
            ..Self::default()
        }
    }

    /// Reads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> LeavenResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&json)?;
        config.generation.validate()?;
        log::info!("Loaded game config from {}", path.display());
        Ok(config)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            fov_radius: DEFAULT_FOV_RADIUS,
            message_log_capacity: DEFAULT_MESSAGE_LOG_CAPACITY,
            inventory_capacity: DEFAULT_INVENTORY_CAPACITY,
            player: PlayerTemplate::default(),
        }
    }
}

/// Game statistics tracking player progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Monsters killed by the player
    pub enemies_defeated: u32,
    /// Experience from those kills
    pub xp_earned: i32,
    /// Gold picked up
    pub gold_collected: i32,
    /// Items picked up
    pub items_collected: u32,
    /// Damage the player dealt
    pub damage_dealt: u64,
    /// Damage the player took
    pub damage_taken: u64,
    /// Successful player steps
    pub steps_taken: u64,
    /// Deepest floor reached
    pub deepest_floor: i32,
}

impl GameStatistics {
    /// Creates new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_damage(&mut self, player: EntityId, source: Option<EntityId>, target: EntityId, amount: i32) {
        let amount = amount.max(0) as u64;
        if source == Some(player) && target != player {
            self.damage_dealt += amount;
        }
        if target == player {
            self.damage_taken += amount;
        }
    }
}

/// The complete, snapshotable state of a game.
///
/// The random source is not part of the state: callers own a `StdRng` and
/// pass it to every operation, so a snapshot plus a seed replays exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub map: GameMap,
    pub roster: EntityRoster,
    pub player_id: EntityId,
    /// What the player currently sees
    pub fov: FieldOfView,
    pub message_log: MessageLog,
    pub phase: GamePhase,
    /// Completed rounds
    pub turn_number: u64,
    pub statistics: GameStatistics,
    pub content: ContentRegistry,
    pub config: GameConfig,
    /// Item waiting for a target while in [`GamePhase::Targeting`]
    pub pending_item: Option<EntityId>,
}

impl GameState {
    /// Starts a new game on floor 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use leaven::{ContentRegistry, GameState};
    /// use leaven::game::GameConfig;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    /// let state = GameState::new(GameConfig::for_testing(7), ContentRegistry::builtin(), &mut rng).unwrap();
    /// assert_eq!(state.depth(), 1);
    /// assert!(state.fov.is_in_fov(state.player().unwrap().position));
    /// ```
    pub fn new(config: GameConfig, content: ContentRegistry, rng: &mut StdRng) -> LeavenResult<Self> {
        let mut roster = EntityRoster::new();
        let player_id = roster.allocate_id();
        roster.insert(Self::create_player(player_id, &config));

        let generation = &config.generation;
        let mut state = Self {
            map: GameMap::new(generation.map_width, generation.map_height, 0),
            roster,
            player_id,
            fov: FieldOfView::empty(generation.map_width, generation.map_height),
            message_log: MessageLog::new(config.message_log_capacity),
            phase: GamePhase::PlayersTurn,
            turn_number: 0,
            statistics: GameStatistics::new(),
            content,
            config,
            pending_item: None,
        };
        state.enter_floor(1, rng)?;
        Ok(state)
    }

    /// Builds a state around an existing floor.
    ///
    /// The roster must already contain the player.
    pub fn with_floor(
        map: GameMap,
        roster: EntityRoster,
        player_id: EntityId,
        config: GameConfig,
        content: ContentRegistry,
    ) -> LeavenResult<Self> {
        if !roster.contains(player_id) {
            return Err(LeavenError::InvalidState(format!(
                "Player {} is not in the roster",
                player_id
            )));
        }

        let mut state = Self {
            fov: FieldOfView::empty(map.width(), map.height()),
            statistics: GameStatistics {
                deepest_floor: map.dungeon_level,
                ..GameStatistics::new()
            },
            map,
            roster,
            player_id,
            message_log: MessageLog::new(config.message_log_capacity),
            phase: GamePhase::PlayersTurn,
            turn_number: 0,
            content,
            config,
            pending_item: None,
        };
        state.refresh_fov();
        Ok(state)
    }

    /// Creates the player entity from the configured template.
    pub fn create_player(id: EntityId, config: &GameConfig) -> Entity {
        let template = config.player;
        Entity::new(id, Position::origin(), '@', Color::WHITE, "Player", true, RenderOrder::Actor)
            .with_fighter(Fighter::new(template.hp, template.defense, template.power, 0))
            .with_inventory(Inventory::new(config.inventory_capacity))
            .with_equipment(Equipment::new())
            .with_level(Level::new())
    }

    /// Current dungeon depth.
    pub fn depth(&self) -> i32 {
        self.map.dungeon_level
    }

    pub fn player(&self) -> Option<&Entity> {
        self.roster.get(self.player_id)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.roster.get_mut(self.player_id)
    }

    fn require_player(&self) -> LeavenResult<&Entity> {
        self.player()
            .ok_or_else(|| LeavenError::InvalidState("No player found".to_string()))
    }

    /// Whether the game has ended.
    pub fn is_game_over(&self) -> bool {
        self.phase.is_over()
    }

    /// Position of the down stairs on this floor, if any.
    pub fn stairs_position(&self) -> Option<Position> {
        self.roster
            .iter()
            .find(|entity| entity.stairs.is_some())
            .map(|entity| entity.position)
    }

    /// Recomputes the player's field of view and marks what it reveals.
    pub fn refresh_fov(&mut self) {
        if let Some(origin) = self.player().map(|player| player.position) {
            self.fov = compute_fov(&mut self.map, origin, self.config.fov_radius);
        }
    }

    /// Replaces the current floor with a freshly generated one at `depth`.
    ///
    /// Only the player survives the transition. Each room is populated as
    /// soon as it is carved; the player is placed in the first room before
    /// anything else so it counts as an occupant there.
    fn enter_floor(&mut self, depth: i32, rng: &mut StdRng) -> LeavenResult<()> {
        self.require_player()?;
        let player_id = self.player_id;
        let mut next_roster = self.roster.clone();
        next_roster.retain_only(player_id);

        let content = &self.content;
        let roster = &mut next_roster;
        let mut summary = PopulationSummary::default();
        let dungeon = RoomCorridorGenerator::new(depth).generate_with(
            &self.config.generation,
            rng,
            |map, room, rng| {
                if room.id == 0 {
                    if let Some(player) = roster.get_mut(player_id) {
                        player.position = room.center();
                    }
                }
                summary += populate_room(room, map, content, roster, rng);
            },
        )?;
        self.roster = next_roster;

        let stairs_id = self.roster.allocate_id();
        self.roster.insert(
            Entity::new(
                stairs_id,
                dungeon.stairs,
                '>',
                Color::WHITE,
                "Stairs",
                false,
                RenderOrder::Stairs,
            )
            .with_stairs(Stairs { floor: depth + 1 }),
        );

        self.map = dungeon.map;
        self.pending_item = None;
        self.statistics.deepest_floor = self.statistics.deepest_floor.max(depth);
        self.refresh_fov();

        log::info!(
            "Entered floor {} ({} rooms, {} monsters, {} items)",
            depth,
            dungeon.rooms.len(),
            summary.monsters,
            summary.items
        );
        Ok(())
    }

    /// Runs one full round: the player's action, then, if it used the
    /// turn, every monster and the status tick.
    ///
    /// Taking the stairs ends the round without monster turns. A kill that
    /// levels the player up pauses the round in [`GamePhase::LevelUp`]; the
    /// monsters move once the player has picked a stat.
    pub fn step(&mut self, action: PlayerAction, rng: &mut StdRng) -> LeavenResult<TurnOutcome> {
        let mut outcome = self.advance_player_turn(action, rng)?;
        if !outcome.took_turn || self.is_game_over() || self.phase == GamePhase::LevelUp {
            return Ok(outcome);
        }

        if action != PlayerAction::Descend {
            outcome.effects.extend(self.run_monster_turns(rng));
        }
        self.end_round();
        Ok(outcome)
    }

    /// Resolves the player's action and applies its effects.
    ///
    /// A dead player cannot act; the call is a no-op.
    pub fn advance_player_turn(
        &mut self,
        action: PlayerAction,
        rng: &mut StdRng,
    ) -> LeavenResult<TurnOutcome> {
        if self.is_game_over() {
            return Ok(TurnOutcome::refused(Vec::new()));
        }
        match (self.phase, action) {
            (GamePhase::LevelUp, PlayerAction::LevelUp { .. }) => {}
            (GamePhase::LevelUp, _) => return Ok(TurnOutcome::refused(Vec::new())),
            (_, PlayerAction::LevelUp { .. }) => {
                return Err(LeavenError::InvalidAction(
                    "No level-up is pending".to_string(),
                ))
            }
            (GamePhase::Targeting, _) => self.phase = GamePhase::PlayersTurn,
            _ => {}
        }

        let outcome = match action {
            PlayerAction::Move { dx, dy } => self.player_move(dx, dy)?,
            PlayerAction::Wait => TurnOutcome::acted(Vec::new()),
            PlayerAction::PickUp => self.pick_up()?,
            PlayerAction::UseItem { item, target } => self.use_item(item, target)?,
            PlayerAction::DropItem { item } => self.drop_item(item)?,
            PlayerAction::Descend => self.descend(rng)?,
            PlayerAction::LevelUp { choice } => self.level_up(choice)?,
        };

        let effects = self.apply_effects(outcome.effects, rng);
        Ok(TurnOutcome {
            took_turn: outcome.took_turn,
            effects,
        })
    }

    /// Gives one monster its turn and applies what it decided.
    ///
    /// Dead, missing or mindless entities are skipped.
    pub fn advance_monster_turn(&mut self, id: EntityId, rng: &mut StdRng) -> Vec<Effect> {
        if id == self.player_id || self.is_game_over() {
            return Vec::new();
        }

        let Some(monster) = self.roster.get_mut(id) else {
            return Vec::new();
        };
        if !monster.is_alive() {
            return Vec::new();
        }
        let Some(mut behavior) = monster.ai.take() else {
            return Vec::new();
        };

        let effects = match (self.roster.get(id), self.roster.get(self.player_id)) {
            (Some(owner), Some(target)) => {
                let ctx = TurnContext {
                    owner,
                    target,
                    fov: &self.fov,
                    map: &self.map,
                    roster: &self.roster,
                };
                behavior.take_turn(&ctx, rng)
            }
            _ => Vec::new(),
        };

        // Put the behavior back before applying, so a swap it asked for wins
        if let Some(monster) = self.roster.get_mut(id) {
            log::debug!(
                "{} #{} ({}) produced {} effects",
                monster.name,
                id,
                behavior.describe(),
                effects.len()
            );
            monster.ai = Some(behavior);
        }

        self.apply_effects(effects, rng)
    }

    /// Gives every monster alive at the start of the phase one turn, in
    /// roster order. Offspring spawned during the phase wait for the next.
    pub fn run_monster_turns(&mut self, rng: &mut StdRng) -> Vec<Effect> {
        self.phase = GamePhase::EnemyTurn;

        let actors: Vec<EntityId> = self
            .roster
            .iter()
            .filter(|entity| entity.id != self.player_id && entity.ai.is_some())
            .map(|entity| entity.id)
            .collect();

        let mut effects = Vec::new();
        for id in actors {
            effects.extend(self.advance_monster_turn(id, rng));
            if self.is_game_over() {
                break;
            }
        }

        if !self.is_game_over() {
            self.phase = GamePhase::PlayersTurn;
        }
        effects
    }

    /// Ticks every status duration and closes the round.
    pub fn end_round(&mut self) {
        for entity in self.roster.iter_mut() {
            if let Some(fighter) = entity.fighter.as_mut() {
                fighter.tick_statuses();
            }
        }
        self.turn_number += 1;
    }

    /// Applies effects in order and returns everything that was applied,
    /// follow-ups included.
    pub fn apply_effects(&mut self, effects: Vec<Effect>, rng: &mut StdRng) -> Vec<Effect> {
        let mut queue: VecDeque<Effect> = effects.into();
        let mut applied = Vec::new();

        while let Some(effect) = queue.pop_front() {
            let follow_ups = self.apply_effect(&effect, rng);
            applied.push(effect);
            for follow_up in follow_ups.into_iter().rev() {
                queue.push_front(follow_up);
            }
        }

        applied
    }

    fn apply_effect(&mut self, effect: &Effect, rng: &mut StdRng) -> Vec<Effect> {
        match effect {
            Effect::Attack { attacker, target } => self.resolve_attack(*attacker, *target),
            Effect::Move { entity, dx, dy } => {
                self.apply_move(*entity, *dx, *dy);
                Vec::new()
            }
            Effect::SpawnEntity { kind, position } => {
                self.spawn(kind, *position, rng);
                Vec::new()
            }
            Effect::Heal { entity, amount } => {
                if let Some(target) = self.roster.get_mut(*entity) {
                    target.heal(*amount);
                }
                Vec::new()
            }
            Effect::Damage {
                entity,
                amount,
                source,
            } => {
                let Some(target) = self.roster.get_mut(*entity) else {
                    return Vec::new();
                };
                let follow_ups = combat::take_damage(target, *amount, *source);
                self.statistics
                    .record_damage(self.player_id, *source, *entity, *amount);
                follow_ups
            }
            Effect::Message(message) => {
                self.message_log.add_message(message.clone());
                Vec::new()
            }
            Effect::SwapBehavior { entity, behavior } => {
                if let Some(target) = self.roster.get_mut(*entity) {
                    target.ai = Some(behavior.as_ref().clone());
                }
                Vec::new()
            }
            Effect::Death {
                entity,
                killer,
                xp,
                max_gold_drop,
                golden,
            } => self.resolve_death(*entity, *killer, *xp, *max_gold_drop, *golden, rng),
            Effect::ItemPickedUp { entity, item } => self.apply_pick_up(*entity, *item),
            Effect::GoldCollected {
                entity,
                pile,
                amount,
            } => self.apply_gold(*entity, *pile, *amount),
            Effect::ItemDropped { entity, item } => self.apply_drop(*entity, *item),
            Effect::ItemConsumed { entity, item } => {
                if let Some(inventory) = self
                    .roster
                    .get_mut(*entity)
                    .and_then(|owner| owner.inventory.as_mut())
                {
                    inventory.take(*item);
                }
                Vec::new()
            }
            Effect::Equipped { entity, item, slot } => {
                let name = self.carried_name(*entity, *item);
                vec![Effect::message(
                    format!("You equipped the {} ({})", name, slot.label()),
                    Color::LIGHT_GREEN,
                )]
            }
            Effect::Unequipped { entity, item, slot } => {
                let name = self.carried_name(*entity, *item);
                if let Some(owner) = self.roster.get_mut(*entity) {
                    owner.clamp_hp();
                }
                vec![Effect::message(
                    format!("You dequipped the {} ({})", name, slot.label()),
                    Color::LIGHT_VIOLET,
                )]
            }
        }
    }

    fn carried_name(&self, owner: EntityId, item: EntityId) -> String {
        self.roster
            .get(owner)
            .and_then(|entity| entity.inventory.as_ref())
            .and_then(|inventory| inventory.get(item))
            .map(|entity| entity.name.clone())
            .unwrap_or_else(|| "item".to_string())
    }

    fn resolve_attack(&mut self, attacker: EntityId, target: EntityId) -> Vec<Effect> {
        if attacker == target {
            return Vec::new();
        }
        let Some(mut defender) = self.roster.remove(target) else {
            return Vec::new();
        };

        let hp_before = defender.fighter.as_ref().map_or(0, |fighter| fighter.hp);
        let effects = match self.roster.get(attacker) {
            Some(striker) if striker.is_alive() && striker.fighter.is_some() => {
                combat::attack(striker, &mut defender)
            }
            _ => Vec::new(),
        };
        let hp_after = defender.fighter.as_ref().map_or(0, |fighter| fighter.hp);

        self.roster.insert(defender);
        self.statistics
            .record_damage(self.player_id, Some(attacker), target, hp_before - hp_after);
        effects
    }

    fn apply_move(&mut self, id: EntityId, dx: i32, dy: i32) {
        let Some(entity) = self.roster.get(id) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }

        let destination = entity.position.offset(dx, dy);
        if self.map.is_blocked(destination) || self.roster.blocking_entity_at(destination).is_some() {
            log::debug!("Move of #{} to {:?} rejected", id, destination);
            return;
        }

        if let Some(entity) = self.roster.get_mut(id) {
            entity.position = destination;
        }
        if id == self.player_id {
            self.statistics.steps_taken += 1;
            self.refresh_fov();
        }
    }

    fn spawn(&mut self, kind: &str, position: Position, rng: &mut StdRng) {
        if self.map.is_blocked(position) || self.roster.blocking_entity_at(position).is_some() {
            log::warn!("Cannot spawn {} at {:?}: tile is taken", kind, position);
            return;
        }

        let id = self.roster.allocate_id();
        match self.content.instantiate(kind, id, position, rng) {
            Some(entity) => {
                log::debug!("Spawned {} #{} at {:?}", kind, id, position);
                self.roster.insert(entity);
            }
            None => log::warn!("Cannot spawn {}: no such definition", kind),
        }
    }

    fn resolve_death(
        &mut self,
        id: EntityId,
        killer: Option<EntityId>,
        xp: i32,
        max_gold_drop: i32,
        golden: bool,
        rng: &mut StdRng,
    ) -> Vec<Effect> {
        if id == self.player_id {
            self.phase = GamePhase::PlayerDead;
            if let Some(player) = self.player_mut() {
                player.glyph = '%';
                player.color = Color::RED;
            }
            log::info!("Player died on floor {} after {} rounds", self.depth(), self.turn_number);
            return vec![Effect::message("You died!", Color::RED)];
        }

        let Some(dead) = self.roster.remove(id) else {
            return Vec::new();
        };
        let mut messages = Vec::new();
        if killer == Some(self.player_id) {
            self.statistics.enemies_defeated += 1;
            self.statistics.xp_earned += xp;
            messages.extend(self.credit_experience(xp));
        }

        let gold = if golden {
            max_gold_drop
        } else if max_gold_drop > 0 {
            rng.gen_range(0..=max_gold_drop)
        } else {
            0
        };
        if gold > 0 {
            let pile = self.roster.allocate_id();
            self.roster.insert(gold_pile(pile, dead.position, gold));
        }

        messages.insert(
            0,
            Effect::message(format!("{} is dead!", capitalize(&dead.name)), Color::ORANGE),
        );
        messages
    }

    /// Adds kill experience to the player's level and opens the level-up
    /// choice when a threshold is crossed.
    fn credit_experience(&mut self, xp: i32) -> Vec<Effect> {
        let Some(level) = self.player_mut().and_then(|player| player.level.as_mut()) else {
            return Vec::new();
        };
        let leveled = level.add_xp(xp);
        let reached = level.current_level;

        let mut effects = vec![Effect::message(
            format!("You gain {} experience points.", xp),
            Color::WHITE,
        )];
        if leveled {
            log::info!("Player reached level {}", reached);
            self.phase = GamePhase::LevelUp;
            effects.push(Effect::message(
                format!("Your battle skills grow stronger! You reached level {}!", reached),
                Color::YELLOW,
            ));
        }
        effects
    }

    /// Raises the chosen stat and resumes the paused round.
    fn level_up(&mut self, choice: LevelUpChoice) -> LeavenResult<TurnOutcome> {
        let fighter = self
            .player_mut()
            .and_then(|player| player.fighter.as_mut())
            .ok_or_else(|| LeavenError::InvalidState("Player has no fighter".to_string()))?;

        match choice {
            LevelUpChoice::Constitution => {
                fighter.max_hp += LEVEL_UP_HP_BONUS;
                fighter.hp += LEVEL_UP_HP_BONUS;
            }
            LevelUpChoice::Strength => fighter.power += 1,
            LevelUpChoice::Agility => fighter.defense += 1,
        }
        self.phase = GamePhase::PlayersTurn;
        Ok(TurnOutcome::acted(Vec::new()))
    }

    fn apply_pick_up(&mut self, owner: EntityId, item: EntityId) -> Vec<Effect> {
        let has_room = self
            .roster
            .get(owner)
            .and_then(|entity| entity.inventory.as_ref())
            .map_or(false, |inventory| !inventory.is_full());
        if !has_room || !self.roster.contains(item) {
            return Vec::new();
        }

        let Some(picked) = self.roster.remove(item) else {
            return Vec::new();
        };
        let message = format!("You pick up the {}!", picked.name);
        if let Some(inventory) = self
            .roster
            .get_mut(owner)
            .and_then(|entity| entity.inventory.as_mut())
        {
            inventory.items.push(picked);
        }
        if owner == self.player_id {
            self.statistics.items_collected += 1;
        }
        vec![Effect::message(message, Color::LIGHT_CYAN)]
    }

    fn apply_gold(&mut self, owner: EntityId, pile: EntityId, amount: i32) -> Vec<Effect> {
        if self.roster.remove(pile).is_none() {
            return Vec::new();
        }
        if let Some(inventory) = self
            .roster
            .get_mut(owner)
            .and_then(|entity| entity.inventory.as_mut())
        {
            inventory.gold += amount;
        }
        if owner == self.player_id {
            self.statistics.gold_collected += amount;
        }
        vec![Effect::message(
            format!("You pick up {} gold.", amount),
            Color::GOLD,
        )]
    }

    fn apply_drop(&mut self, owner: EntityId, item: EntityId) -> Vec<Effect> {
        let Some(entity) = self.roster.get_mut(owner) else {
            return Vec::new();
        };
        let position = entity.position;
        let Some(mut dropped) = entity.inventory.as_mut().and_then(|inventory| inventory.take(item))
        else {
            return Vec::new();
        };

        dropped.position = position;
        let message = format!("You dropped the {}.", dropped.name);
        self.roster.insert(dropped);
        vec![Effect::message(message, Color::YELLOW)]
    }

    fn player_move(&mut self, dx: i32, dy: i32) -> LeavenResult<TurnOutcome> {
        if dx.abs() > 1 || dy.abs() > 1 || (dx == 0 && dy == 0) {
            return Err(LeavenError::InvalidAction(format!(
                "Cannot move by ({}, {})",
                dx, dy
            )));
        }

        let player = self.require_player()?;
        let destination = player.position.offset(dx, dy);
        if self.map.is_blocked(destination) {
            return Ok(TurnOutcome::refused(Vec::new()));
        }

        let target = self
            .roster
            .entities_at(destination)
            .find(|entity| entity.blocks_movement && entity.fighter.is_some() && entity.is_alive());
        let effect = match target {
            Some(target) => Effect::Attack {
                attacker: self.player_id,
                target: target.id,
            },
            None => Effect::Move {
                entity: self.player_id,
                dx,
                dy,
            },
        };
        Ok(TurnOutcome::acted(vec![effect]))
    }

    fn pick_up(&mut self) -> LeavenResult<TurnOutcome> {
        let player = self.require_player()?;
        let loot = self
            .roster
            .entities_at(player.position)
            .find(|entity| entity.id != self.player_id && (entity.item.is_some() || entity.valuable.is_some()));

        let Some(loot) = loot else {
            return Ok(TurnOutcome::refused(vec![Effect::message(
                "There is nothing here to pick up.",
                Color::YELLOW,
            )]));
        };

        if let Some(valuable) = loot.valuable {
            return Ok(TurnOutcome::acted(vec![Effect::GoldCollected {
                entity: self.player_id,
                pile: loot.id,
                amount: valuable.value,
            }]));
        }

        let full = player
            .inventory
            .as_ref()
            .map_or(true, |inventory| inventory.is_full());
        if full {
            return Ok(TurnOutcome::refused(vec![Effect::message(
                "You cannot carry any more, your inventory is full",
                Color::YELLOW,
            )]));
        }

        Ok(TurnOutcome::acted(vec![Effect::ItemPickedUp {
            entity: self.player_id,
            item: loot.id,
        }]))
    }

    fn use_item(&mut self, item: EntityId, target: Option<Position>) -> LeavenResult<TurnOutcome> {
        let player_id = self.player_id;
        let player = self.require_player()?;
        let carried = player
            .inventory
            .as_ref()
            .and_then(|inventory| inventory.get(item))
            .ok_or_else(|| {
                LeavenError::InvalidAction(format!("Item {} is not in the inventory", item))
            })?;

        if let Some(equippable) = carried.equippable.as_ref() {
            let slot = equippable.slot;
            let effects = self
                .player_mut()
                .and_then(|player| player.equipment.as_mut())
                .map(|equipment| equipment.toggle_equip(player_id, item, slot))
                .unwrap_or_default();
            return Ok(if effects.is_empty() {
                TurnOutcome::refused(effects)
            } else {
                TurnOutcome::acted(effects)
            });
        }

        let name = carried.name.clone();
        let Some(details) = carried.item.clone() else {
            return Ok(TurnOutcome::refused(Vec::new()));
        };
        let Some(use_function) = details.use_function else {
            return Ok(TurnOutcome::refused(vec![Effect::message(
                format!("The {} cannot be used", name),
                Color::YELLOW,
            )]));
        };

        let at_full_health = player
            .fighter
            .as_ref()
            .map_or(true, |fighter| fighter.hp >= player.max_hp());

        if details.targeting && target.is_none() {
            self.phase = GamePhase::Targeting;
            self.pending_item = Some(item);
            let prompt = details
                .targeting_message
                .unwrap_or_else(|| crate::game::Message::new("Choose a target.", Color::LIGHT_CYAN));
            return Ok(TurnOutcome::refused(vec![Effect::Message(prompt)]));
        }
        self.pending_item = None;

        let consumed = Effect::ItemConsumed {
            entity: player_id,
            item,
        };
        let outcome = match use_function {
            ItemUse::Heal { amount } => {
                if at_full_health {
                    TurnOutcome::refused(vec![Effect::message(
                        "You are already at full health",
                        Color::YELLOW,
                    )])
                } else {
                    TurnOutcome::acted(vec![
                        Effect::Heal {
                            entity: player_id,
                            amount,
                        },
                        Effect::message("Your wounds start to feel better!", Color::GREEN),
                        consumed,
                    ])
                }
            }
            ItemUse::Lightning {
                damage,
                maximum_range,
            } => match self.closest_visible_monster(maximum_range) {
                Some(struck) => TurnOutcome::acted(vec![
                    Effect::message(
                        format!(
                            "A lightning bolt strikes the {} with a loud thunder! The damage is {}",
                            struck.name, damage
                        ),
                        Color::LIGHT_CYAN,
                    ),
                    Effect::Damage {
                        entity: struck.id,
                        amount: damage,
                        source: Some(player_id),
                    },
                    consumed,
                ]),
                None => TurnOutcome::refused(vec![Effect::message(
                    "No enemy is close enough to strike.",
                    Color::RED,
                )]),
            },
            ItemUse::Fireball { damage, radius } => match target {
                Some(center) if self.fov.is_in_fov(center) => {
                    let mut effects = vec![Effect::message(
                        format!(
                            "The fireball explodes, burning everything within {} tiles!",
                            radius
                        ),
                        Color::ORANGE,
                    )];
                    for victim in self.roster.iter().filter(|entity| {
                        entity.fighter.is_some()
                            && entity.is_alive()
                            && entity.position.euclidean_distance(center) <= radius as f64
                    }) {
                        effects.push(Effect::message(
                            format!("The {} gets burned for {} hit points.", victim.name, damage),
                            Color::ORANGE,
                        ));
                        effects.push(Effect::Damage {
                            entity: victim.id,
                            amount: damage,
                            source: Some(player_id),
                        });
                    }
                    effects.push(consumed);
                    TurnOutcome::acted(effects)
                }
                _ => TurnOutcome::refused(vec![Effect::message(
                    "You cannot target a tile outside your field of view.",
                    Color::YELLOW,
                )]),
            },
            ItemUse::Confuse { turns } => {
                let victim = target.filter(|center| self.fov.is_in_fov(*center)).and_then(|center| {
                    self.roster.entities_at(center).find(|entity| {
                        entity.id != player_id && entity.ai.is_some() && entity.is_alive()
                    })
                });
                match victim.and_then(|victim| victim.ai.clone().map(|ai| (victim, ai))) {
                    Some((victim, ai)) => TurnOutcome::acted(vec![
                        Effect::SwapBehavior {
                            entity: victim.id,
                            behavior: Box::new(ai.confused(turns)),
                        },
                        Effect::message(
                            format!(
                                "The eyes of the {} look vacant, as it starts to stumble around!",
                                victim.name
                            ),
                            Color::LIGHT_GREEN,
                        ),
                        consumed,
                    ]),
                    None => TurnOutcome::refused(vec![Effect::message(
                        "There is no targetable enemy at that location.",
                        Color::YELLOW,
                    )]),
                }
            }
        };
        Ok(outcome)
    }

    /// The nearest living, visible monster strictly closer than
    /// `maximum_range + 1`.
    fn closest_visible_monster(&self, maximum_range: i32) -> Option<&Entity> {
        let player = self.player()?;
        self.roster
            .iter()
            .filter(|entity| {
                entity.id != self.player_id
                    && entity.ai.is_some()
                    && entity.fighter.is_some()
                    && entity.is_alive()
                    && self.fov.is_in_fov(entity.position)
            })
            .map(|entity| (entity, player.distance_to(entity)))
            .filter(|(_, distance)| *distance < (maximum_range + 1) as f64)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(entity, _)| entity)
    }

    fn drop_item(&mut self, item: EntityId) -> LeavenResult<TurnOutcome> {
        let player_id = self.player_id;
        let player = self
            .player_mut()
            .ok_or_else(|| LeavenError::InvalidState("No player found".to_string()))?;
        let carried = player
            .inventory
            .as_ref()
            .map_or(false, |inventory| inventory.get(item).is_some());
        if !carried {
            return Err(LeavenError::InvalidAction(format!(
                "Item {} is not in the inventory",
                item
            )));
        }

        let mut effects = Vec::new();
        if let Some(slot) = player.equipment.as_mut().and_then(|equipment| equipment.unequip(item)) {
            effects.push(Effect::Unequipped {
                entity: player_id,
                item,
                slot,
            });
        }
        effects.push(Effect::ItemDropped {
            entity: player_id,
            item,
        });
        Ok(TurnOutcome::acted(effects))
    }

    fn descend(&mut self, rng: &mut StdRng) -> LeavenResult<TurnOutcome> {
        let player = self.require_player()?;
        let next_floor = self
            .roster
            .entities_at(player.position)
            .find_map(|entity| entity.stairs)
            .map(|stairs| stairs.floor);

        let Some(next_floor) = next_floor else {
            return Ok(TurnOutcome::refused(vec![Effect::message(
                "There are no stairs here.",
                Color::YELLOW,
            )]));
        };

        self.enter_floor(next_floor, rng)?;
        let player = self.require_player()?;
        Ok(TurnOutcome::acted(vec![
            Effect::Heal {
                entity: self.player_id,
                amount: player.max_hp() / DESCEND_HEAL_DIVISOR,
            },
            Effect::message(
                "You take a moment to rest, and recover your strength.",
                Color::LIGHT_VIOLET,
            ),
        ]))
    }

    /// Saves the game state to JSON.
    pub fn save_to_json(&self) -> LeavenResult<String> {
        serde_json::to_string_pretty(self).map_err(LeavenError::from)
    }

    /// Loads game state from JSON.
    pub fn load_from_json(json: &str) -> LeavenResult<Self> {
        let state: GameState =
            serde_json::from_str(json).map_err(|e| LeavenError::LoadFailed(e.to_string()))?;
        if !state.roster.contains(state.player_id) {
            return Err(LeavenError::LoadFailed(
                "Saved game has no player".to_string(),
            ));
        }
        Ok(state)
    }

    /// Writes a snapshot to disk.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> LeavenResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.save_to_json()?)?;
        log::info!("Saved game to {}", path.display());
        Ok(())
    }

    /// Restores a snapshot from disk.
    pub fn load_from_file(path: impl AsRef<Path>) -> LeavenResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| LeavenError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        let state = Self::load_from_json(&json)?;
        log::info!("Loaded game from {}", path.display());
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Behavior, Hunt};
    use crate::game::{EquipmentSlot, Equippable, Item, StatusKind, Valuable};
    use crate::generation::Room;
    use rand::SeedableRng;

    const PLAYER: EntityId = 0;

    /// A single open 20x20 room with the player at (5, 5).
    fn arena() -> (GameState, StdRng) {
        let mut map = GameMap::new(20, 20, 1);
        map.create_room(&Room::new(0, 0, 0, 19, 19));

        let config = GameConfig::for_testing(1);
        let mut roster = EntityRoster::new();
        let mut player = GameState::create_player(roster.allocate_id(), &config);
        player.position = Position::new(5, 5);
        roster.insert(player);

        let state =
            GameState::with_floor(map, roster, PLAYER, config, ContentRegistry::builtin()).unwrap();
        (state, StdRng::seed_from_u64(99))
    }

    fn add_orc(state: &mut GameState, pos: Position, rng: &mut StdRng) -> EntityId {
        let id = state.roster.allocate_id();
        let orc = state.content.instantiate("orc", id, pos, rng).unwrap();
        state.roster.insert(orc);
        id
    }

    fn give(state: &mut GameState, definition: &str, rng: &mut StdRng) -> EntityId {
        let id = state.roster.allocate_id();
        let item = state
            .content
            .instantiate(definition, id, Position::origin(), rng)
            .unwrap();
        state
            .player_mut()
            .unwrap()
            .inventory
            .as_mut()
            .unwrap()
            .items
            .push(item);
        id
    }

    fn player_hp(state: &GameState) -> i32 {
        state.player().unwrap().fighter.as_ref().unwrap().hp
    }

    fn last_text(state: &GameState) -> String {
        state.message_log.last().unwrap().text.clone()
    }

    #[test]
    fn test_new_game_layout() {
        let mut rng = StdRng::seed_from_u64(5);
        let state = GameState::new(GameConfig::for_testing(5), ContentRegistry::builtin(), &mut rng)
            .unwrap();

        let player = state.player().unwrap();
        assert_eq!(player.fighter.as_ref().unwrap().hp, 100);
        assert!(!state.map.is_blocked(player.position));
        assert!(state.stairs_position().is_some());
        assert_eq!(state.statistics.deepest_floor, 1);
        assert!(state.map.is_explored(player.position));
        assert_eq!(state.phase, GamePhase::PlayersTurn);
    }

    #[test]
    fn test_move_and_wall_bump() {
        let (mut state, mut rng) = arena();

        let outcome = state.step(PlayerAction::Move { dx: 1, dy: 0 }, &mut rng).unwrap();
        assert!(outcome.took_turn);
        assert_eq!(state.player().unwrap().position, Position::new(6, 5));
        assert_eq!(state.statistics.steps_taken, 1);
        assert_eq!(state.turn_number, 1);

        state.player_mut().unwrap().position = Position::new(1, 1);
        state.refresh_fov();
        let outcome = state.step(PlayerAction::Move { dx: -1, dy: 0 }, &mut rng).unwrap();
        assert!(!outcome.took_turn);
        assert_eq!(state.turn_number, 1);
    }

    #[test]
    fn test_oversized_move_is_rejected() {
        let (mut state, mut rng) = arena();
        let result = state.step(PlayerAction::Move { dx: 2, dy: 0 }, &mut rng);
        assert!(matches!(result, Err(LeavenError::InvalidAction(_))));
    }

    #[test]
    fn test_bump_attack_kills_and_credits() {
        let (mut state, mut rng) = arena();
        let orc = add_orc(&mut state, Position::new(6, 5), &mut rng);
        state.roster.get_mut(orc).unwrap().fighter.as_mut().unwrap().hp = 1;

        let outcome = state.step(PlayerAction::Move { dx: 1, dy: 0 }, &mut rng).unwrap();

        assert!(!state.roster.contains(orc));
        assert!(outcome
            .effects
            .iter()
            .any(|effect| matches!(effect, Effect::Death { entity, .. } if *entity == orc)));
        let texts: Vec<_> = state.message_log.messages().map(|m| m.text.clone()).collect();
        assert_eq!(
            texts[texts.len() - 2..],
            ["Orc is dead!".to_string(), "You gain 35 experience points.".to_string()]
        );
        assert_eq!(state.statistics.enemies_defeated, 1);
        assert_eq!(state.statistics.xp_earned, 35);
        assert_eq!(state.statistics.damage_dealt, 1);
        assert_eq!(state.player().unwrap().level.unwrap().current_xp, 35);
        assert_eq!(state.phase, GamePhase::PlayersTurn);
        // The player did not move into the fight
        assert_eq!(state.player().unwrap().position, Position::new(5, 5));
    }

    #[test]
    fn test_level_up_pauses_round_until_a_stat_is_chosen() {
        let (mut state, mut rng) = arena();
        state.player_mut().unwrap().level.as_mut().unwrap().current_xp = 340;
        let victim = add_orc(&mut state, Position::new(6, 5), &mut rng);
        state.roster.get_mut(victim).unwrap().fighter.as_mut().unwrap().hp = 1;
        let watcher = add_orc(&mut state, Position::new(9, 5), &mut rng);

        let outcome = state.step(PlayerAction::Move { dx: 1, dy: 0 }, &mut rng).unwrap();
        assert!(outcome.took_turn);
        assert_eq!(state.phase, GamePhase::LevelUp);
        assert_eq!(last_text(&state), "Your battle skills grow stronger! You reached level 2!");
        let level = state.player().unwrap().level.unwrap();
        assert_eq!((level.current_level, level.current_xp), (2, 25));
        // The round is on hold: nobody else moved and it has not ended
        assert_eq!(state.roster.get(watcher).unwrap().position, Position::new(9, 5));
        assert_eq!(state.turn_number, 0);

        assert!(!state.step(PlayerAction::Wait, &mut rng).unwrap().took_turn);
        assert!(!state.step(PlayerAction::Move { dx: 0, dy: 1 }, &mut rng).unwrap().took_turn);
        assert_eq!(state.phase, GamePhase::LevelUp);

        let outcome = state
            .step(
                PlayerAction::LevelUp {
                    choice: LevelUpChoice::Constitution,
                },
                &mut rng,
            )
            .unwrap();
        assert!(outcome.took_turn);
        assert_eq!(state.phase, GamePhase::PlayersTurn);
        let fighter = state.player().unwrap().fighter.clone().unwrap();
        assert_eq!((fighter.hp, fighter.max_hp), (120, 120));
        assert_eq!(state.turn_number, 1);
        let watcher_at = state.roster.get(watcher).unwrap().position;
        assert!(watcher_at.chebyshev_distance(Position::new(5, 5)) < 4);
    }

    #[test]
    fn test_level_up_strength_and_agility() {
        let (mut state, mut rng) = arena();

        let stray = state.step(
            PlayerAction::LevelUp {
                choice: LevelUpChoice::Strength,
            },
            &mut rng,
        );
        assert!(matches!(stray, Err(LeavenError::InvalidAction(_))));

        state.phase = GamePhase::LevelUp;
        state
            .step(
                PlayerAction::LevelUp {
                    choice: LevelUpChoice::Strength,
                },
                &mut rng,
            )
            .unwrap();
        state.phase = GamePhase::LevelUp;
        state
            .step(
                PlayerAction::LevelUp {
                    choice: LevelUpChoice::Agility,
                },
                &mut rng,
            )
            .unwrap();

        let player = state.player().unwrap();
        assert_eq!(player.power(), 3);
        assert_eq!(player.defense(), 2);
        assert_eq!(player.max_hp(), 100);
    }

    #[test]
    fn test_monster_closes_in_and_attacks() {
        let (mut state, mut rng) = arena();
        add_orc(&mut state, Position::new(9, 5), &mut rng);

        // Three steps to close the gap, then one swing
        for _ in 0..4 {
            state.step(PlayerAction::Wait, &mut rng).unwrap();
        }
        // Orc power 4 against defense 1
        assert_eq!(player_hp(&state), 97);
        assert_eq!(state.statistics.damage_taken, 3);
        assert_eq!(last_text(&state), "Orc attacks Player for 3 hit points.");
    }

    #[test]
    fn test_player_death_ends_the_game() {
        let (mut state, mut rng) = arena();
        add_orc(&mut state, Position::new(6, 5), &mut rng);
        state.player_mut().unwrap().fighter.as_mut().unwrap().hp = 2;

        state.step(PlayerAction::Wait, &mut rng).unwrap();

        assert_eq!(state.phase, GamePhase::PlayerDead);
        assert!(state.is_game_over());
        assert_eq!(last_text(&state), "You died!");

        let outcome = state.step(PlayerAction::Wait, &mut rng).unwrap();
        assert!(!outcome.took_turn);
        assert!(outcome.effects.is_empty());
    }

    #[test]
    fn test_gold_drop_from_golden_fighter() {
        let (mut state, mut rng) = arena();
        let orc = add_orc(&mut state, Position::new(6, 5), &mut rng);
        {
            let fighter = state.roster.get_mut(orc).unwrap().fighter.as_mut().unwrap();
            fighter.hp = 1;
            fighter.golden = true;
            fighter.max_gold_drop = 12;
        }

        state.step(PlayerAction::Move { dx: 1, dy: 0 }, &mut rng).unwrap();
        let pile = state
            .roster
            .entities_at(Position::new(6, 5))
            .find_map(|entity| entity.valuable)
            .unwrap();
        assert_eq!(pile.value, 12);
    }

    #[test]
    fn test_pick_up_gold_and_items() {
        let (mut state, mut rng) = arena();
        let pile = state.roster.allocate_id();
        state.roster.insert(gold_pile(pile, Position::new(5, 5), 9));

        state.step(PlayerAction::PickUp, &mut rng).unwrap();
        assert_eq!(state.player().unwrap().inventory.as_ref().unwrap().gold, 9);
        assert_eq!(state.statistics.gold_collected, 9);
        assert!(!state.roster.contains(pile));

        let potion = state.roster.allocate_id();
        let item = state
            .content
            .instantiate("healing_potion", potion, Position::new(5, 5), &mut rng)
            .unwrap();
        state.roster.insert(item);
        state.step(PlayerAction::PickUp, &mut rng).unwrap();

        let inventory = state.player().unwrap().inventory.as_ref().unwrap();
        assert!(inventory.get(potion).is_some());
        assert_eq!(last_text(&state), "You pick up the Healing Potion!");

        let outcome = state.step(PlayerAction::PickUp, &mut rng).unwrap();
        assert!(!outcome.took_turn);
    }

    #[test]
    fn test_full_inventory_refuses_pick_up() {
        let (mut state, mut rng) = arena();
        state
            .player_mut()
            .unwrap()
            .inventory
            .as_mut()
            .unwrap()
            .capacity = 0;
        let id = state.roster.allocate_id();
        let item = state
            .content
            .instantiate("healing_potion", id, Position::new(5, 5), &mut rng)
            .unwrap();
        state.roster.insert(item);

        let outcome = state.step(PlayerAction::PickUp, &mut rng).unwrap();
        assert!(!outcome.took_turn);
        assert!(state.roster.contains(id));
        assert_eq!(
            last_text(&state),
            "You cannot carry any more, your inventory is full"
        );
    }

    #[test]
    fn test_healing_potion() {
        let (mut state, mut rng) = arena();
        let potion = give(&mut state, "healing_potion", &mut rng);

        let outcome = state
            .step(PlayerAction::UseItem { item: potion, target: None }, &mut rng)
            .unwrap();
        assert!(!outcome.took_turn);
        assert_eq!(last_text(&state), "You are already at full health");

        state.player_mut().unwrap().fighter.as_mut().unwrap().hp = 30;
        let outcome = state
            .step(PlayerAction::UseItem { item: potion, target: None }, &mut rng)
            .unwrap();
        assert!(outcome.took_turn);
        assert_eq!(player_hp(&state), 70);
        assert!(state.player().unwrap().inventory.as_ref().unwrap().get(potion).is_none());
    }

    #[test]
    fn test_lightning_hits_closest_visible_monster() {
        let (mut state, mut rng) = arena();
        let near = add_orc(&mut state, Position::new(8, 5), &mut rng);
        let far = add_orc(&mut state, Position::new(9, 9), &mut rng);
        let scroll = give(&mut state, "lightning_scroll", &mut rng);

        state
            .advance_player_turn(PlayerAction::UseItem { item: scroll, target: None }, &mut rng)
            .unwrap();

        assert!(!state.roster.contains(near));
        assert!(state.roster.contains(far));
        assert_eq!(state.statistics.enemies_defeated, 1);
    }

    #[test]
    fn test_lightning_without_target_is_kept() {
        let (mut state, mut rng) = arena();
        add_orc(&mut state, Position::new(15, 15), &mut rng);
        let scroll = give(&mut state, "lightning_scroll", &mut rng);

        let outcome = state
            .advance_player_turn(PlayerAction::UseItem { item: scroll, target: None }, &mut rng)
            .unwrap();
        assert!(!outcome.took_turn);
        assert_eq!(last_text(&state), "No enemy is close enough to strike.");
        assert!(state.player().unwrap().inventory.as_ref().unwrap().get(scroll).is_some());
    }

    #[test]
    fn test_fireball_targeting_then_blast() {
        let (mut state, mut rng) = arena();
        let orc = add_orc(&mut state, Position::new(10, 10), &mut rng);
        let scroll = give(&mut state, "fireball_scroll", &mut rng);

        let outcome = state
            .step(PlayerAction::UseItem { item: scroll, target: None }, &mut rng)
            .unwrap();
        assert!(!outcome.took_turn);
        assert_eq!(state.phase, GamePhase::Targeting);
        assert_eq!(state.pending_item, Some(scroll));

        state
            .step(
                PlayerAction::UseItem {
                    item: scroll,
                    target: Some(Position::new(10, 10)),
                },
                &mut rng,
            )
            .unwrap();
        assert_eq!(state.pending_item, None);
        assert!(!state.roster.contains(orc));
        // The player stood well outside the radius
        assert_eq!(player_hp(&state), 100);
    }

    #[test]
    fn test_confusion_scroll_wraps_behavior() {
        let (mut state, mut rng) = arena();
        let orc = add_orc(&mut state, Position::new(8, 8), &mut rng);
        let scroll = give(&mut state, "confusion_scroll", &mut rng);

        state
            .advance_player_turn(
                PlayerAction::UseItem {
                    item: scroll,
                    target: Some(Position::new(8, 8)),
                },
                &mut rng,
            )
            .unwrap();

        match state.roster.get(orc).unwrap().ai.as_ref().unwrap() {
            Behavior::Confused(confused) => {
                assert_eq!(confused.turns_left, 10);
                assert_eq!(*confused.previous, Behavior::Hunt(Hunt));
            }
            other => panic!("expected confusion, got {:?}", other),
        }
    }

    #[test]
    fn test_equip_toggle_and_drop() {
        let (mut state, mut rng) = arena();
        let sword = give(&mut state, "sword", &mut rng);

        state
            .step(PlayerAction::UseItem { item: sword, target: None }, &mut rng)
            .unwrap();
        assert_eq!(state.player().unwrap().power(), 5);
        assert_eq!(
            state
                .player()
                .unwrap()
                .equipment
                .as_ref()
                .unwrap()
                .in_slot(EquipmentSlot::MainHand),
            Some(sword)
        );

        state.step(PlayerAction::DropItem { item: sword }, &mut rng).unwrap();
        assert_eq!(state.player().unwrap().power(), 2);
        let dropped = state.roster.get(sword).unwrap();
        assert_eq!(dropped.position, Position::new(5, 5));
        assert_eq!(last_text(&state), "You dropped the Sword.");
    }

    #[test]
    fn test_unequipping_max_hp_bonus_clamps_hp() {
        let (mut state, mut rng) = arena();
        let id = state.roster.allocate_id();
        let ring = Entity::new(id, Position::origin(), '=', Color::GOLD, "Ring", false, RenderOrder::Item)
            .with_item(Item::inert())
            .with_equippable(Equippable {
                slot: EquipmentSlot::LeftFinger,
                power_bonus: 0,
                defense_bonus: 0,
                max_hp_bonus: 20,
            });
        state.player_mut().unwrap().inventory.as_mut().unwrap().items.push(ring);

        state.step(PlayerAction::UseItem { item: id, target: None }, &mut rng).unwrap();
        state.player_mut().unwrap().heal(50);
        assert_eq!(player_hp(&state), 120);

        state.step(PlayerAction::UseItem { item: id, target: None }, &mut rng).unwrap();
        assert_eq!(player_hp(&state), 100);
    }

    #[test]
    fn test_status_ticks_once_per_round() {
        let (mut state, mut rng) = arena();
        state
            .player_mut()
            .unwrap()
            .fighter
            .as_mut()
            .unwrap()
            .set_status(StatusKind::Invisible, 2);

        state.step(PlayerAction::Wait, &mut rng).unwrap();
        assert!(state.player().unwrap().is_invisible());
        state.step(PlayerAction::Wait, &mut rng).unwrap();
        assert!(!state.player().unwrap().is_invisible());
    }

    #[test]
    fn test_descend_requires_stairs() {
        let (mut state, mut rng) = arena();
        let outcome = state.step(PlayerAction::Descend, &mut rng).unwrap();
        assert!(!outcome.took_turn);
        assert_eq!(last_text(&state), "There are no stairs here.");
    }

    #[test]
    fn test_descend_regenerates_and_heals() {
        let mut rng = StdRng::seed_from_u64(31);
        let mut state =
            GameState::new(GameConfig::for_testing(31), ContentRegistry::builtin(), &mut rng).unwrap();
        let stairs = state.stairs_position().unwrap();
        state.player_mut().unwrap().position = stairs;
        state.player_mut().unwrap().fighter.as_mut().unwrap().hp = 10;
        let potion = give(&mut state, "healing_potion", &mut rng);

        state.step(PlayerAction::Descend, &mut rng).unwrap();

        assert_eq!(state.depth(), 2);
        assert_eq!(state.statistics.deepest_floor, 2);
        assert_eq!(player_hp(&state), 35);
        assert_eq!(
            last_text(&state),
            "You take a moment to rest, and recover your strength."
        );
        // Carried items travel with the player
        assert!(state.player().unwrap().inventory.as_ref().unwrap().get(potion).is_some());
        let new_stairs = state.roster.iter().find_map(|entity| entity.stairs).unwrap();
        assert_eq!(new_stairs.floor, 3);
    }

    #[test]
    fn test_offspring_spawns_next_to_mother() {
        let (mut state, mut rng) = arena();
        let id = state.roster.allocate_id();
        let mut mother = state
            .content
            .instantiate("mother_dough", id, Position::new(15, 15), &mut rng)
            .unwrap();
        if let Some(Behavior::SpawnerGuard(guard)) = mother.ai.as_mut() {
            guard.turns_to_spawn = 0;
        }
        state.roster.insert(mother);
        let before = state.roster.len();

        state.step(PlayerAction::Wait, &mut rng).unwrap();

        assert_eq!(state.roster.len(), before + 1);
        let offspring = state
            .roster
            .iter()
            .find(|entity| entity.definition_id.as_deref() == Some("sourdough_starter"))
            .unwrap();
        assert_eq!(offspring.position.chebyshev_distance(Position::new(15, 15)), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut state =
            GameState::new(GameConfig::for_testing(8), ContentRegistry::builtin(), &mut rng).unwrap();
        state.step(PlayerAction::Wait, &mut rng).unwrap();

        let json = state.save_to_json().unwrap();
        let restored = GameState::load_from_json(&json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            GameState::load_from_json("{\"not\": \"a game\"}"),
            Err(LeavenError::LoadFailed(_))
        ));
        assert!(matches!(
            GameState::load_from_file("/nonexistent/leaven/save.json"),
            Err(LeavenError::LoadFailed(_))
        ));
    }

    #[test]
    fn test_config_from_json_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "fov_radius": 6, "player": { "hp": 50, "defense": 0, "power": 5 } }"#)
            .unwrap();

        let config = GameConfig::from_json_file(&path).unwrap();
        assert_eq!(config.fov_radius, 6);
        assert_eq!(config.player.hp, 50);
        assert_eq!(config.inventory_capacity, 26);
        assert_eq!(config.generation, GenerationConfig::default());
    }

    #[test]
    fn test_gold_pile_is_valuable() {
        let pile = gold_pile(3, Position::new(1, 1), 4);
        assert_eq!(pile.valuable, Some(Valuable { value: 4 }));
    }
}
