//! Headless runner: load a level, play a scripted input sequence and print
//! the final frame digest.
//!
//! ```text
//! voltbot-headless <level.json> [ticks] [script.json] [config.json]
//! ```
//!
//! Game events are logged through `tracing`; set `RUST_LOG=voltbot_engine=debug`
//! to see state transitions as well.

use std::path::Path;

use anyhow::{bail, Context};
use voltbot_engine::prelude::*;

const DEFAULT_TICKS: u64 = 450;

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(level_path) = args.first() else {
        bail!("usage: voltbot-headless <level.json> [ticks] [script.json] [config.json]");
    };
    let ticks = match args.get(1) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("tick count {raw:?} is not a number"))?,
        None => DEFAULT_TICKS,
    };
    let script = match args.get(2) {
        Some(path) => InputScript::from_json_str(&read(Path::new(path))?)
            .with_context(|| format!("parsing script {path}"))?,
        None => InputScript::new(),
    };
    let config = match args.get(3) {
        Some(path) => GameConfig::from_json_str(&read(Path::new(path))?)
            .with_context(|| format!("parsing config {path}"))?,
        None => GameConfig::default(),
    };

    let level: LevelData = serde_json::from_str(&read(Path::new(level_path))?)
        .with_context(|| format!("parsing level {level_path}"))?;
    let physics = RapierWorld::new(config.physics.gravity);
    let mut game = Game::load(&config, &level, physics).context("building level")?;
    tracing::info!(level = %level.name, ticks, intents = script.len(), "running");

    let mut ran = 0;
    for tick in 0..ticks {
        if game.is_terminal() {
            break;
        }
        for intent in script.at(tick) {
            game.apply(intent);
        }
        if game.tick() {
            ran += 1;
        }
        for event in game.drain_events() {
            tracing::info!(tick, ?event, "game event");
        }
    }

    let frame = game.frame();
    let player = &frame.player;
    tracing::info!(
        ran,
        health = player.health_percent,
        battery = player.battery_percent,
        score = player.score,
        entities = frame.entities.len(),
        bullets = frame.bullets.len(),
        "finished"
    );
    println!("{}", frame.digest().context("serializing frame")?);
    Ok(())
}
