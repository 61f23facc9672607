//! Value iteration.

use crate::{
    sweep::{check_inputs, sweep_until, StoppingRule},
    utility::meu,
    Mdp, Result, SolverConfig
};

/// Computes the optimal value function of `mdp`.
///
/// Equivalent to [`value_iteration_from_config`] with `SolverConfig::new(epsilon, gamma)`.
///
/// # Parameters
/// - `mdp`: The model.
/// - `epsilon`: Maximum allowed error of the result in max-norm, `> 0`.
/// - `gamma`: Discount factor, in `(0, 1)`.
/// - `values`: One entry per state. Used as the starting estimate and
///             overwritten with the result.
///
/// # Returns
/// The number of sweeps performed.
///
/// # Examples
/// ```rust
/// use simple_mdp::{greedy_policy, test_utils::two_state_chain, value_iteration, MdpError};
///
/// fn main() -> Result<(), MdpError> {
///     let mdp = two_state_chain();
///     let mut values = vec![0.0; mdp.num_states()];
///
///     value_iteration(&mdp, 1e-6, 0.9, &mut values)?;
///     assert_eq!(values[1], 10.0);
///     assert!((values[0] - 9.0).abs() < 1e-6);
///
///     // The optimal policy is greedy with respect to the optimal values.
///     assert_eq!(greedy_policy(&mdp, &values)?[0], 0);
///     Ok(())
/// }
/// ```
#[inline]
pub fn value_iteration(mdp: &Mdp, epsilon: f64, gamma: f64, values: &mut [f64]) -> Result<usize>{
    value_iteration_from_config(mdp, &SolverConfig::new(epsilon, gamma), values)
}

/// Computes the optimal value function of `mdp`, using a [`SolverConfig`].
///
/// Each sweep sets terminal states to their reward and every other state to
/// `rewards[s] + gamma * MEU(s)`, MEU being `0` for states without actions.
/// Sweeps are synchronous and stop once the largest change of a sweep is
/// strictly below `epsilon * (1 - gamma) / gamma`, which bounds the error of
/// the result by `epsilon`.
///
/// # Errors
/// - `InvalidArgument` for an invalid configuration, a buffer of the wrong length
///   or non-finite starting values.
/// - `DidNotConverge` if `config.max_iterations` is reached first.
pub fn value_iteration_from_config(mdp: &Mdp, config: &SolverConfig, values: &mut [f64]) -> Result<usize>{
    check_inputs(mdp, config, values)?;

    let rule = StoppingRule::Below(config.value_iteration_threshold());

    sweep_until(mdp, config, rule, values, |state, values| meu(mdp, state, values).0)
}
