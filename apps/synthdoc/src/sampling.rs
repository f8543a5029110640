use rand::{Rng, RngCore};

/// Draws from `[lo, hi)`. A degenerate range (`lo == hi`) always yields `lo`,
/// and an inverted range samples `(hi, lo]` instead of panicking.
pub fn uniform(rng: &mut dyn RngCore, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.random::<f64>()
}
