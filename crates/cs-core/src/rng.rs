//! Deterministic replication RNG.
//!
//! One `SimRng` is threaded through exactly one replication.  When several
//! replications run side by side, each is seeded from the run's root seed:
//!
//!   seed = root_seed XOR ((replication + 1) * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive replication indices across the seed space.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Random source for one replication.
///
/// Not `Sync`: a replication owns its generator outright.
#[derive(Clone, Debug)]
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// A generator seeded from OS entropy, for runs that do not supply one.
    pub fn from_entropy() -> Self {
        SimRng(SmallRng::from_entropy())
    }

    /// Seed of the `replication`-th child of a root seeded with `root_seed`,
    /// without advancing any generator.
    pub fn replication_seed(root_seed: u64, replication: u64) -> u64 {
        root_seed ^ replication.wrapping_add(1).wrapping_mul(MIXING_CONSTANT)
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    /// `f64` samples lie in `[0, 1)`.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }
}
