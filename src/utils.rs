use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::StdRng, SeedableRng};

/// Computes the max-norm distance `max_i |a[i] - b[i]|` between two value functions.
///
/// # Parameters
/// - `a`, `b`: Slices of equal length. Extra trailing entries of the longer one are ignored.
///
/// # Returns
/// The largest absolute difference, or `0.0` for empty slices. NaN if any
/// difference is NaN.
pub fn max_norm_distance(a: &[f64], b: &[f64]) -> f64{
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, |acc, d| if d.is_nan() || d > acc { d } else { acc })
}

/// Creates the random number generator used to initialize policies.
///
/// # Parameters
/// - `seed`: `Some(value)` gives a reproducible generator. `None` derives a seed
///           from the current system time, so runs are not reproducible.
///
/// # Returns
/// A `StdRng` seeded accordingly.
pub fn seeded_rng(seed: Option<u64>) -> StdRng{
    StdRng::seed_from_u64(
        if let Some(seed) = seed {
            seed
        } else {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| (d.as_nanos() % u64::MAX as u128) as u64)
                .unwrap_or_default()
        }
    )
}
