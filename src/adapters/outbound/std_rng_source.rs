//! Entropy-seeded uniform source for the simulation fallback.

use crate::domain::ports::UniformSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct StdRngSource(StdRng);

impl StdRngSource {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl UniformSource for StdRngSource {
    fn next_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}
