use crate::settings::GameSpeed;
use serde::{Deserialize, Serialize};

/// A per-stat set of floats: decay base rates or extra-decrement chances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StatRates {
    pub hunger: f64,
    pub happiness: f64,
    pub cleanliness: f64,
    pub energy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PetConfig {
    /// Period of both the clock tick and the decay tick.
    pub tick_period_ms: u64,
    /// Decay ticks between two decay applications in Medium mode.
    pub medium_decay_interval: u32,
    /// Decay ticks between two decay applications in Fast mode.
    pub fast_decay_interval: u32,
    /// Base decrement per difficulty level.
    pub decay_rates: StatRates,
    /// Probability of one extra point of decrement per application.
    pub extra_decay_chance: StatRates,
    /// Master seed for the decay RNG stream.
    pub seed: u64,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1_000,
            medium_decay_interval: 30,
            fast_decay_interval: 1,
            decay_rates: StatRates {
                hunger: 1.2,
                happiness: 1.0,
                cleanliness: 0.8,
                energy: 0.9,
            },
            extra_decay_chance: StatRates {
                hunger: 0.3,
                happiness: 0.3,
                cleanliness: 0.5,
                energy: 0.4,
            },
            seed: 0xC0FFEE,
        }
    }
}

impl PetConfig {
    /// Load balance values from a JSON file.
    /// In tests, use PetConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PetConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        anyhow::ensure!(config.tick_period_ms > 0, "{path}: tick_period_ms must be > 0");
        anyhow::ensure!(
            config.medium_decay_interval > 0 && config.fast_decay_interval > 0,
            "{path}: decay intervals must be > 0"
        );
        Ok(config)
    }

    pub fn decay_interval(&self, speed: GameSpeed) -> u32 {
        match speed {
            GameSpeed::Medium => self.medium_decay_interval,
            GameSpeed::Fast => self.fast_decay_interval,
        }
    }
}
