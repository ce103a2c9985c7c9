//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through a RandomSource handed to the engine,
//! so a run is fully reproducible from its seed.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// The engine's only source of randomness.
pub trait RandomSource: Send {
    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Bernoulli trial: returns true with probability p.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// PCG-backed stream derived from a master seed and a stable slot.
pub struct PetRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl PetRng {
    /// The slot must never change once assigned, or every stream shifts.
    pub fn new(master_seed: u64, slot: RngSlot) -> Self {
        let derived_seed = master_seed ^ ((slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: slot.name(),
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }
}

impl RandomSource for PetRng {
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries; only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    Decay = 0,
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Decay => "decay",
        }
    }
}
