//! Scalar samplers used to seed random sources.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws one value per call.
pub type Sampler = Box<dyn FnMut() -> f64>;

/// Always returns `value`.
pub fn constant(value: f64) -> Sampler {
    Box::new(move || value)
}

/// Uniform samples over `[low, high)` from the thread-local RNG.
pub fn uniform(low: f64, high: f64) -> Sampler {
    let mut rng = rand::thread_rng();
    Box::new(move || low + rng.r#gen::<f64>() * (high - low))
}

/// Uniform samples over `[low, high)` from a seeded RNG (reproducible).
pub fn seeded_uniform(low: f64, high: f64, seed: u64) -> Sampler {
    let mut rng = StdRng::seed_from_u64(seed);
    Box::new(move || low + rng.r#gen::<f64>() * (high - low))
}
