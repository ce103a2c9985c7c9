//! Game state: stats, settings, and wall-clock bookkeeping.
//!
//! All methods take `now` explicitly; the engine supplies it from its Clock.

use crate::{
    settings::GameSettings,
    stats::PetStats,
    types::{Difficulty, Millis},
};
use serde::{Deserialize, Serialize};

const MINUTE_MS: Millis = 60_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Running,
    Paused,
    GameOver,
}

/// Difficulty as a step function of elapsed whole minutes.
pub fn difficulty_for_elapsed(elapsed_ms: Millis) -> Difficulty {
    match elapsed_ms.max(0) / MINUTE_MS {
        0 => 1,
        1 => 2,
        2..=4 => 3,
        5..=9 => 4,
        _ => 5,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub stats: PetStats,
    pub settings: GameSettings,
    start_ms: Millis,
    paused_at_ms: Option<Millis>,
    ended_at_ms: Option<Millis>,
    is_game_over: bool,
    pub is_new_game: bool,
    difficulty: Difficulty,
}

impl GameState {
    /// A fresh game starting at `now`.
    pub fn new(now: Millis) -> Self {
        Self {
            stats: PetStats::full(),
            settings: GameSettings::default(),
            start_ms: now,
            paused_at_ms: None,
            ended_at_ms: None,
            is_game_over: false,
            is_new_game: true,
            difficulty: 1,
        }
    }

    /// A continued game that has already run for `elapsed_ms`.
    pub fn resumed(
        stats: PetStats,
        settings: GameSettings,
        elapsed_ms: Millis,
        now: Millis,
    ) -> Self {
        let elapsed_ms = elapsed_ms.max(0);
        Self {
            stats,
            settings,
            start_ms: now - elapsed_ms,
            paused_at_ms: None,
            ended_at_ms: None,
            is_game_over: false,
            is_new_game: false,
            difficulty: difficulty_for_elapsed(elapsed_ms),
        }
    }

    pub fn phase(&self) -> GamePhase {
        if self.is_game_over {
            GamePhase::GameOver
        } else if self.paused_at_ms.is_some() {
            GamePhase::Paused
        } else {
            GamePhase::Running
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at_ms.is_some()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Frozen while paused and after the game ends; never negative.
    pub fn elapsed_ms(&self, now: Millis) -> Millis {
        let end = self.ended_at_ms.or(self.paused_at_ms).unwrap_or(now);
        (end - self.start_ms).max(0)
    }

    /// Recompute difficulty. Returns the new level only if it changed.
    pub fn update_difficulty(&mut self, now: Millis) -> Option<Difficulty> {
        let level = difficulty_for_elapsed(self.elapsed_ms(now));
        if level == self.difficulty {
            return None;
        }
        self.difficulty = level;
        Some(level)
    }

    pub fn pause(&mut self, now: Millis) {
        if self.paused_at_ms.is_none() {
            self.paused_at_ms = Some(now);
        }
    }

    /// Shifts the start forward by the pause length so elapsed time
    /// continues where it stopped. A finished game stays frozen.
    pub fn resume(&mut self, now: Millis) {
        if let Some(paused_at) = self.paused_at_ms.take() {
            if self.ended_at_ms.is_none() {
                self.start_ms += (now - paused_at).max(0);
            }
        }
    }

    /// Latch game over. Elapsed time stops at the first call.
    pub fn end(&mut self, now: Millis) {
        if self.ended_at_ms.is_none() {
            self.ended_at_ms = Some(self.paused_at_ms.unwrap_or(now));
        }
        self.is_game_over = true;
    }

    pub fn reset(&mut self, now: Millis) {
        self.stats.reset();
        self.start_ms = now;
        self.paused_at_ms = None;
        self.ended_at_ms = None;
        self.settings.elapsed_ms = 0;
        self.is_game_over = false;
        self.is_new_game = true;
        self.difficulty = 1;
    }
}
