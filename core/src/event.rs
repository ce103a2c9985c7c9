//! Everything the engine publishes to observers.
//!
//! RULE: Observers learn about state changes ONLY through events and
//! snapshots. They never hold a reference into engine-owned state.

use crate::{
    settings::{GameSettings, GameSpeed},
    snapshot::{BestTime, GameSnapshot},
    stats::PetStats,
    types::{Difficulty, Millis},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PetEvent {
    // ── Lifecycle ──────────────────────────────────
    GameLoaded {
        snapshot: GameSnapshot,
    },
    GameReset {
        snapshot: GameSnapshot,
    },
    StateUpdated {
        snapshot: GameSnapshot,
    },

    // ── Ticks ──────────────────────────────────────
    TimerUpdated {
        elapsed_ms: Millis,
        text: String,
    },
    DifficultyChanged {
        level: Difficulty,
    },
    StatsUpdated {
        stats: PetStats,
    },
    GameOver {
        elapsed_ms: Millis,
        speed: GameSpeed,
        new_record: bool,
    },

    // ── Settings and persistence ───────────────────
    SettingsUpdated {
        settings: GameSettings,
    },
    SettingsSaved,
    GameSaved,
    BestTimeSaved {
        record: BestTime,
        new_record: bool,
    },
    PersistenceFailed {
        operation: String,
        reason: String,
    },
}

impl PetEvent {
    /// Log a persistence failure and turn it into an event for observers.
    pub fn persistence_failed(operation: &str, err: &crate::error::PetError) -> Self {
        log::error!("persistence failure during {operation}: {err}");
        Self::PersistenceFailed {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }

    /// Stable name of the variant, for logs and the runner's output.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::GameLoaded { .. } => "game_loaded",
            Self::GameReset { .. } => "game_reset",
            Self::StateUpdated { .. } => "state_updated",
            Self::TimerUpdated { .. } => "timer_updated",
            Self::DifficultyChanged { .. } => "difficulty_changed",
            Self::StatsUpdated { .. } => "stats_updated",
            Self::GameOver { .. } => "game_over",
            Self::SettingsUpdated { .. } => "settings_updated",
            Self::SettingsSaved => "settings_saved",
            Self::GameSaved => "game_saved",
            Self::BestTimeSaved { .. } => "best_time_saved",
            Self::PersistenceFailed { .. } => "persistence_failed",
        }
    }
}
