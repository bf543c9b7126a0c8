use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A source of independent uniform draws in `[0, 1)`.
///
/// The sketch owns its source, so two sketches built with the same seed see the
/// same draws and make the same eviction decisions.
#[cfg_attr(test, mockall::automock)]
pub trait UniformSource {
    fn next_f64(&mut self) -> f64;
}

/// Default source: a `SmallRng` seeded from a 64-bit value.
#[derive(Debug, Clone)]
pub struct SeededUniform {
    rng: SmallRng,
}

impl SeededUniform {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl UniformSource for SeededUniform {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        // StandardUniform for f64 samples the half-open [0, 1)
        self.rng.random::<f64>()
    }
}

impl<S: UniformSource + ?Sized> UniformSource for &mut S {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

impl<S: UniformSource + ?Sized> UniformSource for Box<S> {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}
