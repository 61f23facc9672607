//! Convergence parameters shared by every solver.

use crate::{MdpError, Result};

/// Configuration parameters for the dynamic programming solvers.
///
/// The plain entry points ([`crate::evaluate_policy`], [`crate::value_iteration`],
/// [`crate::policy_iteration`]) take `epsilon` and `gamma` directly and run
/// without an iteration ceiling. The `*_from_config` variants accept this struct,
/// which can also carry a diagnostic ceiling.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig{
    /// Convergence threshold on the max-norm change of the value function
    /// between two sweeps. Must be strictly positive.
    pub epsilon: f64,
    /// Discount factor applied to future rewards. Must lie in the open interval `(0, 1)`.
    pub gamma: f64,
    /// Optional ceiling on the number of iterations of any single loop.
    ///
    /// `None` (the default) lets the loops run until the stopping rule is met,
    /// which is guaranteed for a valid `gamma`. `Some(n)` makes a loop that has
    /// not converged after `n` iterations fail with `MdpError::DidNotConverge`.
    pub max_iterations: Option<usize>
}

impl SolverConfig{
    /// The default solver configuration.
    ///
    /// - `epsilon`: `1e-6`.
    /// - `gamma`: `0.9`.
    /// - `max_iterations`: `None`.
    pub const DEFAULT: SolverConfig = SolverConfig{
        epsilon: 1e-6,
        gamma: 0.9,
        max_iterations: None
    };

    /// Creates a configuration with the given `epsilon` and `gamma` and no iteration ceiling.
    ///
    /// The values are not checked here; see [`SolverConfig::validate`].
    #[inline]
    pub fn new(epsilon: f64, gamma: f64) -> Self{
        SolverConfig { epsilon, gamma, max_iterations: None }
    }

    /// Returns a copy of this configuration with an iteration ceiling.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self{
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Checks `epsilon > 0`, `0 < gamma < 1` and that a ceiling, if any, is at least 1.
    ///
    /// # Errors
    /// `InvalidArgument` describing the first violated condition. NaN fails both checks.
    pub fn validate(&self) -> Result<()>{
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(MdpError::InvalidArgument(format!(
                "epsilon must be a positive finite number, got {}",
                self.epsilon
            )));
        }

        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(MdpError::InvalidArgument(format!(
                "gamma must lie strictly between 0 and 1, got {}",
                self.gamma
            )));
        }

        if self.max_iterations == Some(0) {
            return Err(MdpError::InvalidArgument(
                "max_iterations must allow at least one iteration".to_string()
            ));
        }

        Ok(())
    }

    /// Stopping threshold of value iteration: `epsilon · (1 − gamma) / gamma`.
    ///
    /// A sweep whose largest change is strictly below this bound guarantees the
    /// value function is within `epsilon` of the optimum in max-norm.
    #[inline]
    pub fn value_iteration_threshold(&self) -> f64{
        self.epsilon * (1.0 - self.gamma) / self.gamma
    }
}

impl Default for SolverConfig{
    fn default() -> Self{
        SolverConfig::DEFAULT
    }
}
