//! Shared primitive types used across the entire simulation.

/// Wall-clock or virtual time, in milliseconds since the Unix epoch.
pub type Millis = i64;

/// Difficulty level, always within 1..=5.
pub type Difficulty = u8;

/// A single pet stat value. Always within [STAT_MIN, STAT_MAX].
pub type StatValue = i32;

pub const STAT_MIN: StatValue = 0;
pub const STAT_MAX: StatValue = 100;
