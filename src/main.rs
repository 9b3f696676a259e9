//! # Leaven Headless Runner
//!
//! Generates a dungeon, lets the autopilot play it for a number of rounds and
//! prints what happened. Useful for soak-testing content files and AI changes.

use clap::Parser;
use leaven::game::GameConfig;
use leaven::{create_rng, Autopilot, ContentRegistry, GameState, LeavenError, LeavenResult};
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;

/// Command line arguments for the Leaven runner.
#[derive(Parser, Debug)]
#[command(name = "leaven")]
#[command(about = "Headless turn-based roguelike simulation")]
#[command(version)]
struct Args {
    /// Random seed for generation and the turn sequence; overrides the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum number of rounds to play
    #[arg(short, long, default_value_t = 500)]
    turns: u64,

    /// Monster definitions (JSON); built-in content when omitted
    #[arg(long, requires = "items")]
    monsters: Option<PathBuf>,

    /// Item definitions (JSON); built-in content when omitted
    #[arg(long, requires = "monsters")]
    items: Option<PathBuf>,

    /// Game configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a snapshot here when the run ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .init();
}

fn run(args: &Args) -> LeavenResult<()> {
    info!("Starting Leaven v{}", leaven::VERSION);

    let mut config = match &args.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.generation.seed = seed;
    }
    let seed = config.generation.seed;

    let content = match (&args.monsters, &args.items) {
        (Some(monsters), Some(items)) => ContentRegistry::from_files(monsters, items)?,
        _ => ContentRegistry::builtin(),
    };
    if content.monsters().next().is_none() {
        return Err(LeavenError::ContentUnavailable(
            "No monster definitions loaded".to_string(),
        ));
    }

    let mut rng = create_rng(&config.generation);
    let mut state = GameState::new(config, content, &mut rng)?;
    let mut pilot = Autopilot::new();
    info!("Generated floor 1 with seed {}", seed);

    for _ in 0..args.turns {
        let Some(action) = pilot.next_action(&state) else {
            break;
        };
        if !state.step(action, &mut rng)?.took_turn {
            warn!("Autopilot action {:?} was refused, stopping", action);
            break;
        }
    }

    print_summary(&state);

    if let Some(path) = &args.save {
        state.save_to_file(path)?;
    }
    Ok(())
}

fn print_summary(state: &GameState) {
    let stats = &state.statistics;
    let (hp, max_hp, gold) = state
        .player()
        .map(|player| {
            (
                player.fighter.as_ref().map_or(0, |fighter| fighter.hp),
                player.max_hp(),
                player.inventory.as_ref().map_or(0, |inventory| inventory.gold),
            )
        })
        .unwrap_or_default();

    println!("Rounds played:     {}", state.turn_number);
    println!("Outcome:           {}", if state.is_game_over() { "died" } else { "alive" });
    println!("Deepest floor:     {}", stats.deepest_floor);
    println!(
        "Character level:   {}",
        state
            .player()
            .and_then(|player| player.level)
            .map_or(1, |level| level.current_level)
    );
    println!("Player hp:         {}/{}", hp, max_hp);
    println!("Enemies defeated:  {} ({} xp)", stats.enemies_defeated, stats.xp_earned);
    println!("Gold carried:      {}", gold);
    println!("Damage dealt:      {}", stats.damage_dealt);
    println!("Damage taken:      {}", stats.damage_taken);
    println!("Steps taken:       {}", stats.steps_taken);
    println!("Monsters on floor: {}", state.roster.iter().filter(|e| e.ai.is_some()).count());

    println!();
    let messages: Vec<_> = state.message_log.messages().collect();
    for message in &messages[messages.len().saturating_sub(5)..] {
        println!("  {}", message.text);
    }
}
