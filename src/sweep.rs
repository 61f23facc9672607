//! Double-buffered Bellman sweeps shared by policy evaluation and value iteration.

use tracing::{debug, trace, warn};

use crate::{utility::check_values, utils::max_norm_distance, Mdp, MdpError, Result, SolverConfig};

/// When a sweep is considered converged, given its max-norm change `delta`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum StoppingRule{
    /// Stop once `delta <= threshold`.
    AtMost(f64),
    /// Stop once `delta < threshold`.
    Below(f64)
}

impl StoppingRule{
    #[inline]
    fn is_met(self, delta: f64) -> bool{
        match self {
            StoppingRule::AtMost(threshold) => delta <= threshold,
            StoppingRule::Below(threshold) => delta < threshold
        }
    }
}

/// Checks the configuration and the value buffer before a solve.
pub(crate) fn check_inputs(mdp: &Mdp, config: &SolverConfig, values: &[f64]) -> Result<()>{
    config.validate()?;
    check_values(mdp, values)?;

    if let Some(state) = values.iter().position(|v| !v.is_finite()) {
        return Err(MdpError::InvalidArgument(format!(
            "initial value of state {state} is not finite"
        )));
    }

    Ok(())
}

/// Repeats synchronous sweeps until `rule` is met and returns the number of sweeps.
///
/// Every sweep computes all new values from the previous sweep's vector and then
/// commits them at once:
/// - terminal states take their reward;
/// - other states take `reward + gamma * backup(state, values)`.
///
/// Inputs must have been checked with [`check_inputs`]. A sweep whose change is
/// infinite or NaN ends the loop with `DidNotConverge`.
pub(crate) fn sweep_until<F>(
    mdp: &Mdp,
    config: &SolverConfig,
    rule: StoppingRule,
    values: &mut [f64],
    mut backup: F
) -> Result<usize>
where
    F: FnMut(usize, &[f64]) -> f64
{
    let mut updated = vec![0.0; mdp.num_states()];
    let mut sweeps: usize = 0;

    loop {
        if let Some(max) = config.max_iterations {
            if sweeps >= max {
                debug!(sweeps, "sweep ceiling reached");
                return Err(MdpError::DidNotConverge { iterations: max });
            }
        }

        for (state, value) in updated.iter_mut().enumerate() {
            *value = if mdp.is_terminal(state) {
                mdp.reward(state)
            }
            else{
                mdp.reward(state) + config.gamma * backup(state, &*values)
            };
        }

        let delta = max_norm_distance(&updated, values);
        values.copy_from_slice(&updated);
        sweeps += 1;

        trace!(sweeps, delta, "sweep");

        if !delta.is_finite() {
            warn!(sweeps, delta, "value function diverged");
            return Err(MdpError::DidNotConverge { iterations: sweeps });
        }

        if rule.is_met(delta) {
            debug!(sweeps, delta, "converged");
            return Ok(sweeps);
        }
    }
}
