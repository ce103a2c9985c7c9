//! Immutable views handed to observers. Nothing here points back into
//! engine-owned state.

use crate::{
    settings::{GameSettings, GameSpeed},
    state::{GamePhase, GameState},
    stats::PetStats,
    time_format::format_elapsed,
    types::{Difficulty, Millis},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub stats: PetStats,
    pub settings: GameSettings,
    pub phase: GamePhase,
    pub elapsed_ms: Millis,
    pub timer_text: String,
    pub difficulty: Difficulty,
    pub is_game_over: bool,
    pub is_new_game: bool,
    pub any_low: bool,
}

impl GameSnapshot {
    pub fn capture(state: &GameState, now: Millis) -> Self {
        let elapsed_ms = state.elapsed_ms(now);
        Self {
            stats: state.stats,
            settings: state.settings.clone(),
            phase: state.phase(),
            elapsed_ms,
            timer_text: format_elapsed(elapsed_ms),
            difficulty: state.difficulty(),
            is_game_over: state.is_game_over(),
            is_new_game: state.is_new_game,
            any_low: state.stats.any_low(),
        }
    }
}

/// One best-time record with its display string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BestTime {
    pub speed: GameSpeed,
    pub elapsed_ms: Millis,
    pub text: String,
}

impl BestTime {
    pub fn new(speed: GameSpeed, elapsed_ms: Millis) -> Self {
        Self {
            speed,
            elapsed_ms,
            text: format_elapsed(elapsed_ms),
        }
    }
}
