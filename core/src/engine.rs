//! The game engine. Owns the one GameState and everything that mutates it.
//!
//! PERIODIC ACTIONS (both fire once per `tick_period_ms`, only while running):
//!   1. Clock tick: elapsed time, difficulty, timer text, game-over check.
//!   2. Decay tick: every Nth call applies one round of stat decay,
//!      N taken from the speed mode.
//!
//! RULES:
//!   - The engine is single-threaded; `runtime` serializes access to it.
//!   - Time comes only from the injected Clock, randomness only from the
//!     injected RandomSource.
//!   - Every mutation returns the events that describe it. Persistence
//!     failures become `PersistenceFailed` events, never panics or aborts.

use crate::{
    clock::Clock,
    command::PlayerCommand,
    config::PetConfig,
    error::PetResult,
    event::PetEvent,
    rng::{PetRng, RandomSource, RngSlot},
    settings::{Character, GameSpeed},
    snapshot::{BestTime, GameSnapshot},
    state::{GamePhase, GameState},
    stats::PetStats,
    store::PetStore,
    time_format::format_elapsed,
};

pub struct PetEngine {
    config: PetConfig,
    store: PetStore,
    clock: Box<dyn Clock>,
    rng: Box<dyn RandomSource>,
    state: Option<GameState>,
    decay_counter: u32,
    timers_running: bool,
}

impl PetEngine {
    pub fn new(
        config: PetConfig,
        store: PetStore,
        clock: Box<dyn Clock>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
            rng,
            state: None,
            decay_counter: 0,
            timers_running: false,
        }
    }

    /// Engine with the decay stream seeded from `config.seed`.
    pub fn build(config: PetConfig, store: PetStore, clock: Box<dyn Clock>) -> Self {
        let rng = PetRng::new(config.seed, RngSlot::Decay);
        Self::new(config, store, clock, Box::new(rng))
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn config(&self) -> &PetConfig {
        &self.config
    }

    pub fn store(&self) -> &PetStore {
        &self.store
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    pub fn now_ms(&self) -> crate::types::Millis {
        self.clock.now_ms()
    }

    pub fn snapshot(&self) -> Option<GameSnapshot> {
        let now = self.clock.now_ms();
        self.state.as_ref().map(|s| GameSnapshot::capture(s, now))
    }

    /// Whether the periodic actions should be firing right now.
    pub fn timers_active(&self) -> bool {
        self.timers_running
            && self
                .state
                .as_ref()
                .is_some_and(|s| s.phase() == GamePhase::Running)
    }

    pub fn decay_counter(&self) -> u32 {
        self.decay_counter
    }

    // ── Lifecycle ──────────────────────────────────────────────

    /// Load (or start) a game from the store and start both periodic actions.
    pub fn load_game(&mut self, is_new_game: bool) -> PetResult<Vec<PetEvent>> {
        let now = self.clock.now_ms();
        let state = self.store.load_game_state(is_new_game, now)?;
        log::info!(
            "game loaded: new={} speed={} difficulty={}",
            state.is_new_game,
            state.settings.game_speed.name(),
            state.difficulty()
        );
        let snapshot = GameSnapshot::capture(&state, now);
        self.state = Some(state);
        self.decay_counter = 0;
        self.start_timers();
        Ok(vec![PetEvent::GameLoaded { snapshot }])
    }

    pub fn start_timers(&mut self) {
        self.timers_running = true;
    }

    /// Safe to call repeatedly.
    pub fn stop_timers(&mut self) {
        self.timers_running = false;
    }

    pub fn pause_game(&mut self) -> Vec<PetEvent> {
        let now = self.clock.now_ms();
        let Some(state) = self.state.as_mut() else {
            return vec![];
        };
        state.pause(now);
        log::info!("game paused at {}", format_elapsed(state.elapsed_ms(now)));

        let mut events = self.state_updated();
        if let Err(e) = self.save_game() {
            events.push(PetEvent::persistence_failed("save_game", &e));
        }
        events
    }

    pub fn resume_game(&mut self) -> Vec<PetEvent> {
        let now = self.clock.now_ms();
        let Some(state) = self.state.as_mut() else {
            return vec![];
        };
        state.resume(now);
        log::info!("game resumed at {}", format_elapsed(state.elapsed_ms(now)));
        self.state_updated()
    }

    /// Start over with full stats. Settings and best times are kept.
    pub fn reset_game(&mut self) -> Vec<PetEvent> {
        let now = self.clock.now_ms();
        let Some(state) = self.state.as_mut() else {
            return vec![];
        };
        state.reset(now);
        self.decay_counter = 0;
        log::info!("game reset");

        let mut events = Vec::new();
        if let Err(e) = self.store.reset_game_state() {
            events.push(PetEvent::persistence_failed("reset_game_state", &e));
        }
        self.stop_timers();
        self.start_timers();
        if let Some(snapshot) = self.snapshot() {
            events.insert(0, PetEvent::GameReset { snapshot });
        }
        events
    }

    /// Persist the current game. A no-op when nothing is loaded.
    ///
    /// A finished game keeps its game-over sentinel so the next start
    /// is a new game.
    pub fn save_game(&mut self) -> PetResult<()> {
        let now = self.clock.now_ms();
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        state.settings.elapsed_ms = state.elapsed_ms(now);
        self.store.save_game_state(state, now)?;
        if state.is_game_over() {
            self.store.mark_game_over()?;
        }
        log::debug!("game saved at {}", format_elapsed(state.settings.elapsed_ms));
        Ok(())
    }

    /// Record the current run as a best time candidate immediately.
    pub fn save_best_time_now(&mut self) -> Vec<PetEvent> {
        let now = self.clock.now_ms();
        let Some(state) = self.state.as_ref() else {
            return vec![];
        };
        let elapsed = state.elapsed_ms(now);
        let speed = state.settings.game_speed;
        match self.store.save_best_time(elapsed, speed) {
            Ok(new_record) => vec![PetEvent::BestTimeSaved {
                record: BestTime::new(speed, elapsed),
                new_record,
            }],
            Err(e) => vec![PetEvent::persistence_failed("save_best_time", &e)],
        }
    }

    /// Stop both periodic actions and flush the game to disk.
    pub fn shutdown(&mut self) -> PetResult<()> {
        self.stop_timers();
        self.save_game()?;
        log::info!("engine shut down");
        Ok(())
    }

    // ── Periodic actions ───────────────────────────────────────

    pub fn clock_tick(&mut self) -> Vec<PetEvent> {
        if !self.timers_active() {
            return vec![];
        }
        let now = self.clock.now_ms();
        let Some(state) = self.state.as_mut() else {
            return vec![];
        };

        let mut events = Vec::new();
        let elapsed_ms = state.elapsed_ms(now);
        state.settings.elapsed_ms = elapsed_ms;

        if let Some(level) = state.update_difficulty(now) {
            log::info!("difficulty is now {level}");
            events.push(PetEvent::DifficultyChanged { level });
        }
        events.push(PetEvent::TimerUpdated {
            elapsed_ms,
            text: format_elapsed(elapsed_ms),
        });

        if state.stats.any_critical() {
            let speed = state.settings.game_speed;
            state.end(now);
            log::info!(
                "game over after {} on {} speed",
                format_elapsed(elapsed_ms),
                speed.name()
            );

            let new_record = match self.store.save_best_time(elapsed_ms, speed) {
                Ok(new_record) => new_record,
                Err(e) => {
                    events.push(PetEvent::persistence_failed("save_best_time", &e));
                    false
                }
            };
            events.push(PetEvent::GameOver {
                elapsed_ms,
                speed,
                new_record,
            });
            self.timers_running = false;
            if let Err(e) = self.store.mark_game_over() {
                events.push(PetEvent::persistence_failed("mark_game_over", &e));
            }
        }
        events
    }

    pub fn decay_tick(&mut self) -> Vec<PetEvent> {
        if !self.timers_active() {
            return vec![];
        }
        let Some(state) = self.state.as_mut() else {
            return vec![];
        };

        self.decay_counter += 1;
        let interval = self.config.decay_interval(state.settings.game_speed);
        if self.decay_counter < interval {
            return vec![];
        }
        self.decay_counter = 0;

        state.stats.decay(
            state.difficulty(),
            &self.config.decay_rates,
            &self.config.extra_decay_chance,
            self.rng.as_mut(),
        );
        log::debug!("decay applied at level {}: {:?}", state.difficulty(), state.stats);

        let stats = state.stats;
        let mut events = vec![PetEvent::StatsUpdated { stats }];
        events.extend(self.state_updated());
        events
    }

    /// One period of both actions, clock first.
    pub fn step(&mut self) -> Vec<PetEvent> {
        let mut events = self.clock_tick();
        events.extend(self.decay_tick());
        events
    }

    // ── Player actions ─────────────────────────────────────────

    pub fn feed(&mut self) -> Vec<PetEvent> {
        self.care("feed", PetStats::feed)
    }

    pub fn wash(&mut self) -> Vec<PetEvent> {
        self.care("wash", PetStats::wash)
    }

    pub fn play(&mut self) -> Vec<PetEvent> {
        self.care("play", PetStats::play)
    }

    pub fn rest(&mut self) -> Vec<PetEvent> {
        self.care("rest", PetStats::rest)
    }

    fn care(&mut self, action: &str, apply: fn(&mut PetStats)) -> Vec<PetEvent> {
        let Some(state) = self.state.as_mut() else {
            return vec![];
        };
        apply(&mut state.stats);
        log::debug!("{action}: {:?}", state.stats);

        let stats = state.stats;
        let mut events = vec![PetEvent::StatsUpdated { stats }];
        events.extend(self.state_updated());
        events
    }

    // ── Settings ───────────────────────────────────────────────

    pub fn update_pet_name(&mut self, name: &str) -> Vec<PetEvent> {
        self.update_settings(|s| s.set_pet_name(name))
    }

    pub fn update_character(&mut self, character: Character) -> Vec<PetEvent> {
        self.update_settings(|s| s.character = character)
    }

    pub fn update_game_speed(&mut self, speed: GameSpeed) -> Vec<PetEvent> {
        self.update_settings(|s| s.game_speed = speed)
    }

    fn update_settings<F>(&mut self, f: F) -> Vec<PetEvent>
    where
        F: FnOnce(&mut crate::settings::GameSettings),
    {
        let Some(state) = self.state.as_mut() else {
            return vec![];
        };
        f(&mut state.settings);
        vec![PetEvent::SettingsUpdated {
            settings: state.settings.clone(),
        }]
    }

    pub fn save_settings(&self) -> PetResult<()> {
        match &self.state {
            Some(state) => self.store.save_settings(&state.settings),
            None => Ok(()),
        }
    }

    /// Both records, Medium first.
    pub fn best_times(&self) -> PetResult<Vec<BestTime>> {
        GameSpeed::ALL
            .iter()
            .map(|&speed| self.store.best_time(speed).map(|ms| BestTime::new(speed, ms)))
            .collect()
    }

    // ── Command dispatch ───────────────────────────────────────

    pub fn apply(&mut self, command: PlayerCommand) -> Vec<PetEvent> {
        match command {
            PlayerCommand::Feed => self.feed(),
            PlayerCommand::Wash => self.wash(),
            PlayerCommand::Play => self.play(),
            PlayerCommand::Rest => self.rest(),
            PlayerCommand::Pause => self.pause_game(),
            PlayerCommand::Resume => self.resume_game(),
            PlayerCommand::Reset => self.reset_game(),
            PlayerCommand::SaveGame => match self.save_game() {
                Ok(()) => vec![PetEvent::GameSaved],
                Err(e) => vec![PetEvent::persistence_failed("save_game", &e)],
            },
            PlayerCommand::SaveBestTimeNow => self.save_best_time_now(),
            PlayerCommand::SetPetName { name } => self.update_pet_name(&name),
            PlayerCommand::SetCharacter { character } => self.update_character(character),
            PlayerCommand::SetGameSpeed { speed } => self.update_game_speed(speed),
            PlayerCommand::SaveSettings => match self.save_settings() {
                Ok(()) => vec![PetEvent::SettingsSaved],
                Err(e) => vec![PetEvent::persistence_failed("save_settings", &e)],
            },
        }
    }

    fn state_updated(&self) -> Vec<PetEvent> {
        self.snapshot()
            .map(|snapshot| PetEvent::StateUpdated { snapshot })
            .into_iter()
            .collect()
    }
}
