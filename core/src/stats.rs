//! The pet's four needs. Every mutation clamps to [STAT_MIN, STAT_MAX].

use crate::{
    config::StatRates,
    rng::RandomSource,
    types::{Difficulty, StatValue, STAT_MAX, STAT_MIN},
};
use serde::{Deserialize, Serialize};

/// Below this a stat counts as low.
pub const LOW_THRESHOLD: StatValue = 40;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawStats")]
pub struct PetStats {
    hunger: StatValue,
    happiness: StatValue,
    cleanliness: StatValue,
    energy: StatValue,
}

/// Unchecked wire form; converting it clamps.
#[derive(Deserialize)]
struct RawStats {
    hunger: StatValue,
    happiness: StatValue,
    cleanliness: StatValue,
    energy: StatValue,
}

impl From<RawStats> for PetStats {
    fn from(raw: RawStats) -> Self {
        Self::new(raw.hunger, raw.happiness, raw.cleanliness, raw.energy)
    }
}

impl Default for PetStats {
    fn default() -> Self {
        Self::full()
    }
}

fn clamp(v: StatValue) -> StatValue {
    v.clamp(STAT_MIN, STAT_MAX)
}

impl PetStats {
    /// Construct from raw values; each is clamped.
    pub fn new(
        hunger: StatValue,
        happiness: StatValue,
        cleanliness: StatValue,
        energy: StatValue,
    ) -> Self {
        Self {
            hunger: clamp(hunger),
            happiness: clamp(happiness),
            cleanliness: clamp(cleanliness),
            energy: clamp(energy),
        }
    }

    pub fn full() -> Self {
        Self::new(STAT_MAX, STAT_MAX, STAT_MAX, STAT_MAX)
    }

    pub fn hunger(&self) -> StatValue {
        self.hunger
    }

    pub fn happiness(&self) -> StatValue {
        self.happiness
    }

    pub fn cleanliness(&self) -> StatValue {
        self.cleanliness
    }

    pub fn energy(&self) -> StatValue {
        self.energy
    }

    pub fn set_hunger(&mut self, v: StatValue) {
        self.hunger = clamp(v);
    }

    pub fn set_happiness(&mut self, v: StatValue) {
        self.happiness = clamp(v);
    }

    pub fn set_cleanliness(&mut self, v: StatValue) {
        self.cleanliness = clamp(v);
    }

    pub fn set_energy(&mut self, v: StatValue) {
        self.energy = clamp(v);
    }

    fn as_array(&self) -> [StatValue; 4] {
        [self.hunger, self.happiness, self.cleanliness, self.energy]
    }

    /// Any stat has run out. Ends the game when seen by a clock tick.
    pub fn any_critical(&self) -> bool {
        self.as_array().iter().any(|&v| v <= STAT_MIN)
    }

    pub fn any_low(&self) -> bool {
        self.as_array().iter().any(|&v| v < LOW_THRESHOLD)
    }

    pub fn feed(&mut self) {
        self.set_hunger(self.hunger + 20);
        self.set_energy(self.energy + 5);
    }

    pub fn wash(&mut self) {
        self.set_cleanliness(self.cleanliness + 25);
        self.set_happiness(self.happiness + 5);
    }

    pub fn play(&mut self) {
        self.set_happiness(self.happiness + 20);
        self.set_energy(self.energy - 10);
    }

    pub fn rest(&mut self) {
        self.set_energy(self.energy + 30);
        self.set_hunger(self.hunger - 5);
    }

    pub fn reset(&mut self) {
        *self = Self::full();
    }

    /// Apply one round of decay.
    ///
    /// Each stat loses `max(1, round(difficulty * rate))`, plus one extra
    /// point with that stat's `extra_chance`. Rolls are drawn in the fixed
    /// order hunger, happiness, cleanliness, energy.
    pub fn decay(
        &mut self,
        difficulty: Difficulty,
        rates: &StatRates,
        extra_chance: &StatRates,
        rng: &mut dyn RandomSource,
    ) {
        let mut step = |rate: f64, chance: f64| -> StatValue {
            let base = (f64::from(difficulty) * rate).round().max(1.0) as StatValue;
            if rng.chance(chance) { base + 1 } else { base }
        };
        let hunger = step(rates.hunger, extra_chance.hunger);
        let happiness = step(rates.happiness, extra_chance.happiness);
        let cleanliness = step(rates.cleanliness, extra_chance.cleanliness);
        let energy = step(rates.energy, extra_chance.energy);

        self.set_hunger(self.hunger - hunger);
        self.set_happiness(self.happiness - happiness);
        self.set_cleanliness(self.cleanliness - cleanliness);
        self.set_energy(self.energy - energy);
    }
}
