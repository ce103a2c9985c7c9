//! The engine thread: command ordering, subscriptions, timers, and
//! shutdown.

use pet_keeper_core::{
    clock::{ManualClock, SystemClock},
    command::PlayerCommand,
    config::PetConfig,
    engine::PetEngine,
    event::PetEvent,
    runtime::PetRuntime,
    settings::GameSpeed,
    state::GamePhase,
    store::PetStore,
};
use std::time::{Duration, Instant};

const T0: i64 = 1_700_000_000_000;

fn store_with_speed(path: &str, speed: GameSpeed) -> PetStore {
    let store = PetStore::open(path).expect("open store");
    store.migrate().expect("migration");
    let mut settings = store.load_settings().expect("settings");
    settings.game_speed = speed;
    store.save_settings(&settings).expect("save settings");
    store
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Ticks far apart enough that only the immediate clock tick fires.
fn quiet_runtime() -> PetRuntime {
    init_logging();
    let config = PetConfig {
        tick_period_ms: 600_000,
        ..PetConfig::default()
    };
    let engine = PetEngine::build(
        config,
        store_with_speed(":memory:", GameSpeed::Medium),
        Box::new(ManualClock::new(T0)),
    );
    PetRuntime::spawn(engine, true).expect("spawn runtime")
}

fn fast_runtime(path: &str, tick_period_ms: u64) -> PetRuntime {
    init_logging();
    let config = PetConfig {
        tick_period_ms,
        ..PetConfig::default()
    };
    let engine = PetEngine::build(
        config,
        store_with_speed(path, GameSpeed::Fast),
        Box::new(SystemClock),
    );
    PetRuntime::spawn(engine, true).expect("spawn runtime")
}

fn temp_db(name: &str) -> String {
    let path = std::env::temp_dir().join(format!(
        "pet-keeper-rt-{name}-{}.db",
        std::process::id()
    ));
    let path = path.to_string_lossy().into_owned();
    remove_db(&path);
    path
}

fn remove_db(path: &str) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path}{suffix}"));
    }
}

#[test]
fn commands_apply_in_send_order() {
    let runtime = quiet_runtime();
    runtime.send(PlayerCommand::Play).unwrap();
    runtime.send(PlayerCommand::Rest).unwrap();
    runtime.send(PlayerCommand::Play).unwrap();

    let stats = runtime.snapshot().unwrap().stats;
    assert_eq!(
        (stats.hunger(), stats.happiness(), stats.cleanliness(), stats.energy()),
        (95, 100, 100, 90)
    );
    runtime.shutdown().unwrap();
}

#[test]
fn subscribers_get_a_snapshot_then_live_events() {
    let runtime = quiet_runtime();
    let events = runtime.subscribe().unwrap();

    match events.recv_timeout(Duration::from_secs(5)).unwrap() {
        PetEvent::StateUpdated { snapshot } => {
            assert_eq!(snapshot.phase, GamePhase::Running);
            assert!(snapshot.is_new_game);
        }
        other => panic!("unexpected first event {other:?}"),
    }

    runtime.send(PlayerCommand::Play).unwrap();
    match events.recv_timeout(Duration::from_secs(5)).unwrap() {
        PetEvent::StatsUpdated { stats } => assert_eq!(stats.energy(), 90),
        other => panic!("unexpected event {other:?}"),
    }
    assert!(matches!(
        events.recv_timeout(Duration::from_secs(5)).unwrap(),
        PetEvent::StateUpdated { .. }
    ));

    runtime.shutdown().unwrap();
    // The stream ends with the engine thread.
    assert!(events.recv_timeout(Duration::from_secs(5)).is_err());
}

#[test]
fn best_times_are_queryable() {
    let runtime = quiet_runtime();
    let times = runtime.best_times().unwrap();
    assert_eq!(times.len(), 2);
    assert_eq!(times[0].speed, GameSpeed::Medium);
    assert_eq!(times[1].speed, GameSpeed::Fast);
    assert!(times.iter().all(|t| t.elapsed_ms == 0 && t.text == "00:00:00"));
}

#[test]
fn blocking_save_is_visible_to_another_connection() {
    let path = temp_db("save");
    let runtime = fast_runtime(&path, 600_000);
    runtime.send(PlayerCommand::Play).unwrap();
    runtime.save_game().unwrap();

    let reader = PetStore::open(&path).unwrap();
    let stored = reader.load_game_state(false, T0).unwrap();
    assert_eq!(stored.stats.energy(), 90);
    assert_eq!(stored.settings.game_speed, GameSpeed::Fast);

    drop(reader);
    runtime.shutdown().unwrap();
    remove_db(&path);
}

#[test]
fn dropping_the_handle_saves_the_game() {
    let path = temp_db("drop");
    {
        let runtime = fast_runtime(&path, 600_000);
        runtime.send(PlayerCommand::Play).unwrap();
        runtime.send(PlayerCommand::Play).unwrap();
    }

    let reader = PetStore::open(&path).unwrap();
    assert_eq!(reader.load_game_state(false, T0).unwrap().stats.energy(), 80);
    drop(reader);
    remove_db(&path);
}

#[test]
fn pause_cancels_both_timers() {
    let runtime = fast_runtime(":memory:", 5);
    let events = runtime.subscribe().unwrap();

    // Let a few ticks through.
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut ticks = 0;
    while ticks < 3 && Instant::now() < deadline {
        if let Ok(PetEvent::TimerUpdated { .. }) = events.recv_timeout(Duration::from_millis(100)) {
            ticks += 1;
        }
    }
    assert_eq!(ticks, 3);

    runtime.send(PlayerCommand::Pause).unwrap();
    let paused = runtime.snapshot().unwrap();
    assert_eq!(paused.phase, GamePhase::Paused);
    events.try_iter().for_each(drop);

    std::thread::sleep(Duration::from_millis(60));
    let stray: Vec<_> = events
        .try_iter()
        .filter(|e| matches!(e, PetEvent::TimerUpdated { .. } | PetEvent::StatsUpdated { .. }))
        .collect();
    assert!(stray.is_empty(), "ticks after pause: {stray:?}");
    assert_eq!(runtime.snapshot().unwrap().elapsed_ms, paused.elapsed_ms);

    runtime.send(PlayerCommand::Resume).unwrap();
    let resumed = events
        .iter()
        .find(|e| matches!(e, PetEvent::TimerUpdated { .. }));
    assert!(resumed.is_some());
    runtime.shutdown().unwrap();
}

#[test]
fn neglected_pet_ends_the_game() {
    let runtime = fast_runtime(":memory:", 1);
    let events = runtime.subscribe().unwrap();

    let deadline = Instant::now() + Duration::from_secs(30);
    let mut game_over = None;
    while game_over.is_none() && Instant::now() < deadline {
        if let Ok(PetEvent::GameOver { elapsed_ms, speed, new_record }) =
            events.recv_timeout(Duration::from_millis(100))
        {
            game_over = Some((elapsed_ms, speed, new_record));
        }
    }
    let (elapsed_ms, speed, new_record) = game_over.expect("no game over event");
    assert_eq!(speed, GameSpeed::Fast);
    assert!(new_record);

    let snapshot = runtime.snapshot().unwrap();
    assert!(snapshot.is_game_over);
    assert_eq!(snapshot.phase, GamePhase::GameOver);
    assert!(snapshot.stats.any_critical());
    let times = runtime.best_times().unwrap();
    assert_eq!(times[1].elapsed_ms, elapsed_ms);

    // A reset brings the timers back.
    runtime.send(PlayerCommand::Reset).unwrap();
    let restarted = events
        .iter()
        .find(|e| matches!(e, PetEvent::TimerUpdated { .. }));
    assert!(restarted.is_some());
    assert!(!runtime.snapshot().unwrap().is_game_over);
    runtime.shutdown().unwrap();
}
