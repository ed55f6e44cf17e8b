//! Tanks headless runner
//!
//! Usage: `tanks [catalog.json] [map] [frames]`
//!
//! Loads the catalog (the bundled one by default) plus any mods listed in
//! `settings.json`, plays the map at 60 fps with the autopilot driving the
//! player, and records the result on the leaderboard.

use std::path::Path;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;

use tanks::catalog::{self, CatalogLoader};
use tanks::highscores::HighScoreEntry;
use tanks::scene::Scene;
use tanks::sim::{FrameInput, GameEvent, GamePhase, World};
use tanks::{HighScores, Settings};

const FRAME: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u64 = 60 * 60 * 5;
const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Tanks (headless) starting...");

    let mut args = std::env::args().skip(1);
    let catalog_path = args.next();
    let map_arg = args.next();
    let frames = match args.next().map(|f| f.parse::<u64>()) {
        None => DEFAULT_FRAMES,
        Some(Ok(f)) => f,
        Some(Err(err)) => {
            eprintln!("frame count: {err}");
            return ExitCode::FAILURE;
        }
    };

    let settings = Settings::load(Path::new(Settings::FILE_NAME));

    let mut loader = CatalogLoader::new();
    match &catalog_path {
        Some(path) => loader.add_file(Path::new(path)),
        None => loader.add_str("bundled", catalog::BUNDLED),
    };
    for dir in &settings.mods {
        loader.add_mod(dir);
    }
    let loaded = loader.compile();
    for problem in &loaded.problems {
        eprintln!("{problem}");
    }

    let map = match map_arg.or_else(|| loaded.catalog.map_names().next().map(String::from)) {
        Some(map) => map,
        None => {
            eprintln!("catalog has no playable maps");
            return ExitCode::FAILURE;
        }
    };

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let mut world = World::new(loaded.catalog, &settings, seed);
    if !world.load_map_named(&map) {
        eprintln!("unknown map {map}");
        return ExitCode::FAILURE;
    }

    let input = FrameInput {
        viewport: VIEWPORT,
        autopilot: true,
        ..Default::default()
    };
    let mut scene = Scene::from_settings(&settings);
    let mut ended = None;

    for frame in 0..frames {
        world.update(&input, FRAME);
        scene.build(&world);
        log::trace!("frame {}: {} draw commands", frame, scene.commands.len());

        for event in world.drain_events() {
            match event {
                GameEvent::ScoreChanged {
                    score,
                    needed,
                    total,
                } => log::info!("Score {}/{} (total {})", score, needed, total),
                GameEvent::TankSpawned {
                    id,
                    template,
                    group,
                } => log::debug!("{} #{} joined group {}", template, id, group),
                GameEvent::Killed {
                    killer,
                    victim,
                    value,
                } => log::debug!("#{} destroyed #{} (+{})", killer, victim, value),
                GameEvent::LeveledUp { old, new, template } => {
                    log::debug!("#{} became {} #{}", old, template, new)
                }
                GameEvent::GameEnded {
                    victory,
                    message,
                    total_score,
                } => {
                    println!("{message}");
                    ended = Some((victory, total_score));
                }
            }
        }

        if matches!(world.phase, GamePhase::Over { .. }) {
            log::info!("Run ended after {} frames", frame + 1);
            break;
        }
    }

    let (victory, score) = ended.unwrap_or_else(|| {
        log::info!("Out of frames");
        (false, world.total_score)
    });
    println!(
        "{} on {}: score {}",
        if victory { "Victory" } else { "Defeat" },
        map,
        score
    );

    let path = Path::new(HighScores::FILE_NAME);
    let mut scores = HighScores::load(path);
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let entry = HighScoreEntry {
        score,
        map,
        victory,
        timestamp,
    };
    if let Some(rank) = scores.add(entry) {
        println!("New high score, rank {rank}");
        if let Err(err) = scores.save(path) {
            log::warn!("Could not save high scores: {}", err);
        }
    }

    ExitCode::SUCCESS
}
