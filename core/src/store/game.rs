use super::{put_on, PetStore};
use crate::{
    error::PetResult,
    settings::{Character, GameSettings, GameSpeed},
    state::GameState,
    stats::PetStats,
    types::{Millis, StatValue, STAT_MAX, STAT_MIN},
};

/// Persisted key names. Stored on disk; never rename.
pub mod keys {
    pub const HUNGER: &str = "hunger";
    pub const HAPPINESS: &str = "happiness";
    pub const CLEANLINESS: &str = "cleanliness";
    pub const ENERGY: &str = "energy";
    pub const ELAPSED_TIME: &str = "elapsed_time";
    pub const PET_NAME: &str = "pet_name";
    pub const CHARACTER: &str = "character";
    pub const GAME_SPEED: &str = "game_speed";
    pub const WAS_GAME_OVER: &str = "was_game_over";

    pub fn best_time(speed: crate::settings::GameSpeed) -> String {
        format!("best_time_{}", speed.id())
    }
}

impl PetStore {
    // ── Game state ─────────────────────────────────────────────

    /// Build the game to play. A game that ended before the last shutdown
    /// always comes back as a new game.
    pub fn load_game_state(&self, is_new_game: bool, now: Millis) -> PetResult<GameState> {
        let was_game_over = self.was_game_over()?;
        let is_new_game = is_new_game || was_game_over;

        let mut settings = self.load_settings()?;

        let state = if is_new_game {
            settings.elapsed_ms = 0;
            let mut state = GameState::new(now);
            state.settings = settings;
            state
        } else {
            let stats = PetStats::new(
                self.stat(keys::HUNGER)?,
                self.stat(keys::HAPPINESS)?,
                self.stat(keys::CLEANLINESS)?,
                self.stat(keys::ENERGY)?,
            );
            let elapsed = self.get_or(keys::ELAPSED_TIME, 0i64)?.max(0);
            settings.elapsed_ms = elapsed;
            GameState::resumed(stats, settings, elapsed, now)
        };

        log::debug!(
            "loaded game: new={} was_game_over={was_game_over} elapsed={}ms",
            state.is_new_game,
            state.elapsed_ms(now)
        );
        Ok(state)
    }

    fn stat(&self, key: &str) -> PetResult<StatValue> {
        let raw = self.get_or(key, i64::from(STAT_MAX))?;
        Ok(raw.clamp(i64::from(STAT_MIN), i64::from(STAT_MAX)) as StatValue)
    }

    /// Persist stats, elapsed time and speed, and clear the game-over flag.
    pub fn save_game_state(&self, state: &GameState, now: Millis) -> PetResult<()> {
        let stats = &state.stats;
        self.write_batch(|conn| {
            put_on(conn, keys::HUNGER, i64::from(stats.hunger()))?;
            put_on(conn, keys::HAPPINESS, i64::from(stats.happiness()))?;
            put_on(conn, keys::CLEANLINESS, i64::from(stats.cleanliness()))?;
            put_on(conn, keys::ENERGY, i64::from(stats.energy()))?;
            put_on(conn, keys::ELAPSED_TIME, state.elapsed_ms(now))?;
            put_on(conn, keys::GAME_SPEED, state.settings.game_speed.id())?;
            put_on(conn, keys::WAS_GAME_OVER, false)?;
            Ok(())
        })
    }

    /// Forget the stored game but keep settings and best times.
    pub fn reset_game_state(&self) -> PetResult<()> {
        self.remove(&[
            keys::HUNGER,
            keys::HAPPINESS,
            keys::CLEANLINESS,
            keys::ENERGY,
            keys::ELAPSED_TIME,
        ])?;
        self.clear_game_over_flag()
    }

    // ── Settings ───────────────────────────────────────────────

    pub fn load_settings(&self) -> PetResult<GameSettings> {
        let mut settings = GameSettings::default();
        settings.set_pet_name(&self.get_or(keys::PET_NAME, String::new())?);
        settings.character = Character::from_id(self.get_or(keys::CHARACTER, 1i64)?);
        settings.game_speed = GameSpeed::from_id(self.get_or(keys::GAME_SPEED, 0i64)?);
        settings.elapsed_ms = self.get_or(keys::ELAPSED_TIME, 0i64)?;
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &GameSettings) -> PetResult<()> {
        self.write_batch(|conn| {
            put_on(conn, keys::PET_NAME, settings.pet_name())?;
            put_on(conn, keys::CHARACTER, settings.character.id())?;
            put_on(conn, keys::GAME_SPEED, settings.game_speed.id())?;
            Ok(())
        })
    }

    // ── Best time ──────────────────────────────────────────────

    /// Ratchet: writes only if `elapsed` beats the stored record.
    /// Returns whether the record changed.
    pub fn save_best_time(&self, elapsed: Millis, speed: GameSpeed) -> PetResult<bool> {
        let key = keys::best_time(speed);
        let current = self.get_or(&key, 0i64)?;
        if elapsed <= current {
            return Ok(false);
        }
        self.put(&key, elapsed)?;
        log::info!("new best time for {} speed: {elapsed}ms", speed.name());
        Ok(true)
    }

    pub fn best_time(&self, speed: GameSpeed) -> PetResult<Millis> {
        self.get_or(&keys::best_time(speed), 0i64)
    }

    // ── Game-over sentinel ─────────────────────────────────────

    pub fn mark_game_over(&self) -> PetResult<()> {
        self.put(keys::WAS_GAME_OVER, true)
    }

    pub fn clear_game_over_flag(&self) -> PetResult<()> {
        self.put(keys::WAS_GAME_OVER, false)
    }

    pub fn was_game_over(&self) -> PetResult<bool> {
        self.get_or(keys::WAS_GAME_OVER, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Millis = 1_700_000_000_000;

    fn store() -> PetStore {
        let store = PetStore::in_memory().expect("in-memory store");
        store.migrate().expect("migration");
        store
    }

    #[test]
    fn empty_store_loads_a_fresh_game() {
        let s = store();
        let state = s.load_game_state(false, NOW).unwrap();
        assert_eq!(state.stats, PetStats::full());
        assert_eq!(state.elapsed_ms(NOW), 0);
        assert_eq!(state.settings, GameSettings::default());
        assert!(!state.is_new_game);
    }

    #[test]
    fn round_trip_restores_stats_and_elapsed() {
        let s = store();
        let mut state = GameState::new(NOW);
        state.stats = PetStats::new(12, 34, 56, 78);
        state.settings.game_speed = GameSpeed::Fast;
        s.save_game_state(&state, NOW + 90_000).unwrap();

        let later = NOW + 1_000_000;
        let loaded = s.load_game_state(false, later).unwrap();
        assert_eq!(loaded.stats, state.stats);
        assert_eq!(loaded.elapsed_ms(later), 90_000);
        assert_eq!(loaded.settings.game_speed, GameSpeed::Fast);
        assert_eq!(loaded.difficulty(), 2);
    }

    #[test]
    fn new_game_ignores_stored_stats() {
        let s = store();
        let mut state = GameState::new(NOW);
        state.stats = PetStats::new(1, 1, 1, 1);
        s.save_game_state(&state, NOW + 5_000).unwrap();

        let loaded = s.load_game_state(true, NOW + 10_000).unwrap();
        assert_eq!(loaded.stats, PetStats::full());
        assert_eq!(loaded.elapsed_ms(NOW + 10_000), 0);
        assert!(loaded.is_new_game);
    }

    #[test]
    fn game_over_flag_forces_new_game() {
        let s = store();
        let mut state = GameState::new(NOW);
        state.stats = PetStats::new(5, 5, 5, 5);
        s.save_game_state(&state, NOW + 5_000).unwrap();
        s.mark_game_over().unwrap();

        let loaded = s.load_game_state(false, NOW + 10_000).unwrap();
        assert!(loaded.is_new_game);
        assert!(!loaded.is_game_over());
        assert_eq!(loaded.stats, PetStats::full());
    }

    #[test]
    fn saving_clears_game_over_flag() {
        let s = store();
        s.mark_game_over().unwrap();
        s.save_game_state(&GameState::new(NOW), NOW).unwrap();
        assert!(!s.was_game_over().unwrap());
    }

    #[test]
    fn best_time_only_ratchets_up() {
        let s = store();
        assert!(s.save_best_time(5_000, GameSpeed::Medium).unwrap());
        assert!(!s.save_best_time(4_000, GameSpeed::Medium).unwrap());
        assert!(!s.save_best_time(5_000, GameSpeed::Medium).unwrap());
        assert_eq!(s.best_time(GameSpeed::Medium).unwrap(), 5_000);
        assert_eq!(s.best_time(GameSpeed::Fast).unwrap(), 0);

        assert!(s.save_best_time(9_000, GameSpeed::Fast).unwrap());
        assert_eq!(s.best_time(GameSpeed::Fast).unwrap(), 9_000);
        assert_eq!(s.best_time(GameSpeed::Medium).unwrap(), 5_000);
    }

    #[test]
    fn settings_round_trip() {
        let s = store();
        let mut settings = GameSettings::default();
        settings.set_pet_name("Biscuit");
        settings.character = Character::C;
        settings.game_speed = GameSpeed::Fast;
        s.save_settings(&settings).unwrap();

        let loaded = s.load_settings().unwrap();
        assert_eq!(loaded.pet_name(), "Biscuit");
        assert_eq!(loaded.character, Character::C);
        assert_eq!(loaded.game_speed, GameSpeed::Fast);
    }

    #[test]
    fn unknown_enum_ids_fall_back() {
        let s = store();
        s.put(keys::CHARACTER, 42i64).unwrap();
        s.put(keys::GAME_SPEED, 9i64).unwrap();
        let loaded = s.load_settings().unwrap();
        assert_eq!(loaded.character, Character::A);
        assert_eq!(loaded.game_speed, GameSpeed::Medium);
    }

    #[test]
    fn out_of_range_stats_are_clamped_on_load() {
        let s = store();
        s.put(keys::HUNGER, 500i64).unwrap();
        s.put(keys::ENERGY, -20i64).unwrap();
        let loaded = s.load_game_state(false, NOW).unwrap();
        assert_eq!(loaded.stats.hunger(), 100);
        assert_eq!(loaded.stats.energy(), 0);
    }

    #[test]
    fn reset_game_state_keeps_settings_and_records() {
        let s = store();
        let mut settings = GameSettings::default();
        settings.set_pet_name("Pip");
        s.save_settings(&settings).unwrap();
        s.save_best_time(1_234, GameSpeed::Fast).unwrap();
        s.save_game_state(&GameState::new(NOW), NOW + 3_000).unwrap();
        s.mark_game_over().unwrap();

        s.reset_game_state().unwrap();
        assert!(!s.contains(keys::HUNGER).unwrap());
        assert!(!s.contains(keys::ELAPSED_TIME).unwrap());
        assert!(!s.was_game_over().unwrap());
        assert_eq!(s.load_settings().unwrap().pet_name(), "Pip");
        assert_eq!(s.best_time(GameSpeed::Fast).unwrap(), 1_234);
    }
}
