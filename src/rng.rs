//! Deterministic random number generation
//!
//! The whole simulation draws from a single seeded stream. Every phase
//! borrows it in a fixed order, so the sequence of draws for a given seed is
//! part of the observable behaviour of a run.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// The process-wide random source handed to every phase of the annual cycle.
#[derive(Clone, Debug)]
pub struct SimRng {
    seed: u64,
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(42)
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Helper draws shared by the biological rules.
pub trait RngExt {
    /// Uniform draw from `[0, 1)`.
    fn uniform(&mut self) -> f64;
    /// Gaussian draw with the given mean and standard deviation.
    fn gauss(&mut self, mean: f64, sd: f64) -> f64;
}

impl<R: Rng + ?Sized> RngExt for R {
    fn uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn gauss(&mut self, mean: f64, sd: f64) -> f64 {
        let z: f64 = self.sample(StandardNormal);
        mean + sd * z
    }
}
