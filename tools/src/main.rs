//! pet-runner: headless driver for the Pet Keeper engine.
//!
//! Usage:
//!   pet-runner --seconds 900 --speed fast --care-every 3 --db pet.db
//!   pet-runner --ipc-mode --db pet.db
//!
//! Batch mode runs on a virtual clock and prints a summary. IPC mode runs
//! the real-time engine thread and speaks JSON lines: requests on stdin,
//! events and replies on stdout.

use anyhow::{Context, Result};
use pet_keeper_core::{
    clock::{Clock, ManualClock, SystemClock},
    command::PlayerCommand,
    config::PetConfig,
    engine::PetEngine,
    event::PetEvent,
    runtime::PetRuntime,
    settings::GameSpeed,
    store::PetStore,
    time_format::format_elapsed,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::thread;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcRequest {
    GetState,
    BestTimes,
    Command { command: PlayerCommand },
    Save,
    Quit,
}

const CARE_ROTATION: [PlayerCommand; 4] = [
    PlayerCommand::Feed,
    PlayerCommand::Wash,
    PlayerCommand::Play,
    PlayerCommand::Rest,
];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let continue_game = args.iter().any(|a| a == "--continue");
    let seconds = parse_arg(&args, "--seconds", 3_600u64);
    let care_every = parse_arg(&args, "--care-every", 0u64);
    let db = str_arg(&args, "--db").unwrap_or(":memory:");

    let mut config = match str_arg(&args, "--config") {
        Some(path) => PetConfig::load(path)?,
        None => PetConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);

    let store = PetStore::open(db).with_context(|| format!("cannot open {db}"))?;
    store.migrate()?;

    if let Some(speed) = str_arg(&args, "--speed") {
        let speed = match speed {
            "fast" => GameSpeed::Fast,
            "medium" => GameSpeed::Medium,
            other => anyhow::bail!("unknown speed '{other}', expected medium or fast"),
        };
        let mut settings = store.load_settings()?;
        settings.game_speed = speed;
        store.save_settings(&settings)?;
    }

    if ipc_mode {
        let engine = PetEngine::build(config, store, Box::new(SystemClock));
        run_ipc_loop(engine, !continue_game)
    } else {
        println!("Pet Keeper pet-runner");
        println!("  seed:       {}", config.seed);
        println!("  seconds:    {seconds}");
        println!("  care every: {care_every}");
        println!("  db:         {db}");
        println!();
        run_batch(config, store, !continue_game, seconds, care_every)
    }
}

fn run_batch(
    config: PetConfig,
    store: PetStore,
    new_game: bool,
    seconds: u64,
    care_every: u64,
) -> Result<()> {
    let clock = ManualClock::new(SystemClock.now_ms());
    let period = config.tick_period_ms as i64;
    let periods_per_second = (1_000 / config.tick_period_ms).max(1);
    let mut engine = PetEngine::build(config, store, Box::new(clock.clone()));
    engine.load_game(new_game)?;

    let mut care_index = 0usize;
    let mut game_over_at = None;
    'run: for second in 1..=seconds {
        if care_every > 0 && second % care_every == 0 {
            let command = CARE_ROTATION[care_index % CARE_ROTATION.len()].clone();
            care_index += 1;
            engine.apply(command);
        }
        for _ in 0..periods_per_second {
            clock.advance(period);
            for event in engine.step() {
                match event {
                    PetEvent::DifficultyChanged { level } => {
                        println!("  [{second:>6}s] difficulty -> {level}");
                    }
                    PetEvent::GameOver { elapsed_ms, new_record, .. } => {
                        game_over_at = Some((elapsed_ms, new_record));
                        break 'run;
                    }
                    PetEvent::PersistenceFailed { operation, reason } => {
                        log::warn!("{operation} failed: {reason}");
                    }
                    _ => {}
                }
            }
        }
    }

    print_summary(&engine, game_over_at)?;
    engine.shutdown()?;
    Ok(())
}

fn print_summary(engine: &PetEngine, game_over_at: Option<(i64, bool)>) -> Result<()> {
    let snapshot = engine.snapshot().context("no game loaded")?;
    let stats = snapshot.stats;

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  pet:          {:?}", snapshot.settings.pet_name());
    println!("  speed:        {}", snapshot.settings.game_speed.name());
    println!("  elapsed:      {}", snapshot.timer_text);
    println!("  difficulty:   {}", snapshot.difficulty);
    println!(
        "  stats:        hunger {} | happiness {} | cleanliness {} | energy {}",
        stats.hunger(),
        stats.happiness(),
        stats.cleanliness(),
        stats.energy()
    );
    match game_over_at {
        Some((elapsed, new_record)) => println!(
            "  game over at: {}{}",
            format_elapsed(elapsed),
            if new_record { " (new record)" } else { "" }
        ),
        None => println!("  game over at: (survived)"),
    }

    println!();
    println!("=== BEST TIMES ===");
    for record in engine.best_times()? {
        println!("  {:<7} {}", record.speed.name(), record.text);
    }
    Ok(())
}

fn run_ipc_loop(engine: PetEngine, new_game: bool) -> Result<()> {
    let runtime = PetRuntime::spawn(engine, new_game)?;
    let events = runtime.subscribe()?;

    let writer = thread::spawn(move || -> Result<()> {
        for event in events {
            let line = serde_json::to_string(&event)?;
            writeln!(io::stdout().lock(), "{line}")?;
        }
        Ok(())
    });

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let request: IpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                reply(&serde_json::json!({ "error": e.to_string() }))?;
                continue;
            }
        };

        match request {
            IpcRequest::Quit => break,
            IpcRequest::GetState => reply(&runtime.snapshot()?)?,
            IpcRequest::BestTimes => reply(&runtime.best_times()?)?,
            IpcRequest::Command { command } => runtime.send(command)?,
            IpcRequest::Save => {
                if let Err(e) = runtime.save_game() {
                    reply(&serde_json::json!({ "error": e.to_string() }))?;
                }
            }
        }
    }

    // Best time is recorded before the final save so an abrupt exit
    // cannot lose it.
    runtime.send(PlayerCommand::SaveBestTimeNow)?;
    runtime.shutdown()?;
    match writer.join() {
        Ok(result) => result,
        Err(_) => anyhow::bail!("event writer thread panicked"),
    }
}

fn reply<T: serde::Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
