//! Seeded random source so a run's endpoint and think-time sequence can be
//! replayed.
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Per-run seed from which every VU derives its own generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSource {
    seed: u64,
}

impl SeedSource {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed drawn from the thread RNG, for runs without an explicit seed.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().next_u64())
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Independent generator for one VU; the same seed and id always yield
    /// the same stream.
    #[must_use]
    pub fn vu_rng(&self, vu_id: u64) -> StdRng {
        StdRng::seed_from_u64(splitmix64(self.seed ^ splitmix64(vu_id)))
    }
}

const fn splitmix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
