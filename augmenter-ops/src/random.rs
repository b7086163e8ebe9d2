use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A ChaCha8 generator shared by the threads applying one transform.
#[derive(Debug)]
pub struct SharedRng(Mutex<ChaCha8Rng>);

impl SharedRng {
    /// Seeded from `seed`, or from entropy when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        Self(Mutex::new(ChaCha8Rng::seed_from_u64(
            seed.unwrap_or_else(rand::random),
        )))
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut ChaCha8Rng) -> T) -> T {
        let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Uniform draw from the closed interval spanned by `range`.
    pub fn uniform(&self, range: [f64; 2]) -> f64 {
        let (lo, hi) = (range[0].min(range[1]), range[0].max(range[1]));
        if lo == hi {
            return lo;
        }
        self.with(|rng| rng.random_range(lo..=hi))
    }

    /// Uniform index below `len`, which must be non-zero.
    pub fn index(&self, len: usize) -> usize {
        self.with(|rng| rng.random_range(0..len))
    }
}
