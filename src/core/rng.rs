/// Run-scoped seeded randomness.
///
/// One seed is captured per run and never reused across runs; every draw
/// advances shared state, so identical seeds replay identical sequences as
/// long as draws happen in the same order.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

/// A deterministic generator bound to the seed it was created with.
#[derive(Debug)]
pub struct SessionRng {
    seed: u64,
    rng: StdRng,
}

impl SessionRng {
    /// Build from an explicit seed. Same seed, same draw sequence.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Build from wall-clock nanos mixed with an auxiliary OS-entropy draw.
    /// Called once per run; the captured seed is observable via `seed()`.
    pub fn from_entropy() -> Self {
        let clock = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let aux: u64 = rand::random();
        Self::from_seed(clock ^ aux.rotate_left(17))
    }

    /// The seed this generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform float in [lo, hi).
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Uniform index in [0, len). `len` must be non-zero.
    pub fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}
