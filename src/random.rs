//! Random number generation helpers.
//!
//! Every randomizing subsystem (sampler, annealer, planner state) owns its
//! own 64-bit Mersenne Twister, seeded from OS entropy at construction
//! unless a deterministic seed is injected.

use rand_mt::Mt64;

/// Builds the generator used throughout the crate.
pub(crate) fn create_rng(seed: u64) -> Mt64 {
    Mt64::new(seed)
}

/// Draws a 64-bit seed from OS entropy, combining two 32-bit draws.
pub(crate) fn entropy_seed() -> u64 {
    (u64::from(rand::random::<u32>()) << 32) | u64::from(rand::random::<u32>())
}
