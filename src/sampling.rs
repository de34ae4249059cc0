//! Random sampling helpers shared by the whole engine. The generator
//! is thread local and seeded from the operating system, so parallel
//! phonon batches draw independent streams.

use ::rand::{self, Rng};

/// A uniform sample over [0, 1).
pub fn urand() -> f64 {
    rand::thread_rng().gen()
}
