//! Pet Keeper core: a virtual-pet simulation engine.
//!
//! The engine keeps four pet stats, decays them on a timer whose cadence
//! depends on the speed mode, ramps difficulty with play time, and keeps a
//! best-time record per speed in a SQLite key/value store. Presentation
//! layers drive it through `PlayerCommand`s and observe `PetEvent`s.

pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod rng;
pub mod runtime;
pub mod settings;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod store;
pub mod time_format;
pub mod types;
