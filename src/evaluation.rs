//! Iterative policy evaluation.

use crate::{
    check_policy,
    sweep::{check_inputs, sweep_until, StoppingRule},
    utility::eu,
    Mdp, Result, SolverConfig
};

/// Computes the value function induced by a fixed policy.
///
/// Equivalent to [`evaluate_policy_from_config`] with `SolverConfig::new(epsilon, gamma)`,
/// i.e. without an iteration ceiling.
///
/// # Parameters
/// - `policy`: One action per state; see [`check_policy`] for the requirements.
/// - `mdp`: The model.
/// - `epsilon`: Convergence threshold, `> 0`.
/// - `gamma`: Discount factor, in `(0, 1)`.
/// - `values`: One entry per state. Used as the starting estimate and
///             overwritten with the result.
///
/// # Returns
/// The number of sweeps performed.
///
/// # Examples
/// ```rust
/// use simple_mdp::{evaluate_policy, test_utils::two_state_chain, MdpError};
///
/// fn main() -> Result<(), MdpError> {
///     let mdp = two_state_chain();
///     let mut values = vec![0.0; 2];
///
///     evaluate_policy(&[0, 0], &mdp, 1e-6, 0.9, &mut values)?;
///     assert!((values[0] - 9.0).abs() < 1e-5);
///     assert_eq!(values[1], 10.0);
///     Ok(())
/// }
/// ```
#[inline]
pub fn evaluate_policy(policy: &[usize], mdp: &Mdp, epsilon: f64, gamma: f64, values: &mut [f64]) -> Result<usize>{
    evaluate_policy_from_config(policy, mdp, &SolverConfig::new(epsilon, gamma), values)
}

/// Computes the value function induced by a fixed policy, using a [`SolverConfig`].
///
/// Each sweep sets, for every state `s`:
/// - `rewards[s]` if `s` is terminal;
/// - `rewards[s]` if `s` has no available action (its policy entry is never applied);
/// - `rewards[s] + gamma * EU(s, policy[s])` otherwise.
///
/// Sweeps are synchronous and stop as soon as the largest change of a sweep is
/// `<= epsilon`.
///
/// # Errors
/// - `InvalidArgument` for an invalid configuration, a buffer of the wrong length
///   or non-finite starting values.
/// - `IndexOutOfRange` / `InvalidPolicy` if the policy selects an unusable action.
/// - `DidNotConverge` if `config.max_iterations` is reached first.
pub fn evaluate_policy_from_config(policy: &[usize], mdp: &Mdp, config: &SolverConfig, values: &mut [f64]) -> Result<usize>{
    check_inputs(mdp, config, values)?;
    check_policy(mdp, policy)?;

    sweep_until(mdp, config, StoppingRule::AtMost(config.epsilon), values, |state, values| {
        if mdp.num_available_actions(state) == 0 {
            0.0
        }
        else{
            eu(mdp, state, values, policy[state])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{random_policy, test_utils::*, MdpError};
    use float_eq::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_two_state_chain(){
        let mdp = two_state_chain();
        let mut values = vec![0.0; 2];

        evaluate_policy(&[0, 0], &mdp, 1e-6, 0.9, &mut values).unwrap();

        assert_eq!(values[1], 10.0);
        assert_float_eq!(values[0], 9.0, abs <= 1e-6);
    }

    #[test]
    fn test_single_terminal(){
        let mdp = single_terminal();

        for start in [0.0, 5.0, -100.0] {
            let mut values = vec![start];
            let sweeps = evaluate_policy(&[0], &mdp, 1e-6, 0.9, &mut values).unwrap();

            assert_eq!(values, vec![5.0]);
            assert!(sweeps <= 2);
        }

        let mut values = vec![5.0];
        assert_eq!(evaluate_policy(&[0], &mdp, 1e-6, 0.9, &mut values).unwrap(), 1);
    }

    #[test]
    fn test_self_loop_geometric_series(){
        // staying forever in a state with reward 1 is worth 1 / (1 - gamma)
        let mdp = self_loop(1.0);
        let mut values = vec![0.0];

        evaluate_policy(&[0], &mdp, 1e-9, 0.5, &mut values).unwrap();
        assert_float_eq!(values[0], 2.0, abs <= 1e-8);
    }

    #[test]
    fn test_state_without_actions_keeps_reward(){
        let mdp = dead_end();
        let mut values = vec![0.0; 1];

        // placeholder action 0 of a non-terminal state without actions is never applied
        evaluate_policy(&[0], &mdp, 1e-9, 0.9, &mut values).unwrap();
        assert_eq!(values, vec![-2.0]);
    }

    #[test]
    fn test_fixed_point(){
        let mdp = grid_world();
        let epsilon = 1e-6;
        let policy = random_policy(&mdp, &mut StdRng::seed_from_u64(42));

        let mut values = vec![0.0; mdp.num_states()];
        evaluate_policy(&policy, &mdp, epsilon, 0.9, &mut values).unwrap();

        let mut again = values.clone();
        let sweeps = evaluate_policy(&policy, &mdp, epsilon, 0.9, &mut again).unwrap();

        assert_eq!(sweeps, 1);
        assert_float_eq!(again, values, abs_all <= epsilon);
    }

    #[test]
    fn test_values_do_not_depend_on_start(){
        let mdp = grid_world();
        let policy = random_policy(&mdp, &mut StdRng::seed_from_u64(7));
        let mut from_zero = vec![0.0; mdp.num_states()];
        let mut from_far = vec![50.0; mdp.num_states()];

        evaluate_policy(&policy, &mdp, 1e-9, 0.9, &mut from_zero).unwrap();
        evaluate_policy(&policy, &mdp, 1e-9, 0.9, &mut from_far).unwrap();

        assert_float_eq!(from_zero, from_far, abs_all <= 1e-7);
    }

    #[test]
    fn test_rejects_bad_arguments(){
        let mdp = two_state_chain();
        let mut values = vec![0.0; 2];

        assert!(matches!(evaluate_policy(&[0, 0], &mdp, 0.0, 0.9, &mut values), Err(MdpError::InvalidArgument(_))));
        assert!(matches!(evaluate_policy(&[0, 0], &mdp, 1e-6, 1.0, &mut values), Err(MdpError::InvalidArgument(_))));
        assert!(matches!(evaluate_policy(&[0], &mdp, 1e-6, 0.9, &mut values), Err(MdpError::InvalidArgument(_))));
        assert!(matches!(evaluate_policy(&[0, 0], &mdp, 1e-6, 0.9, &mut [0.0]), Err(MdpError::InvalidArgument(_))));
        assert!(matches!(evaluate_policy(&[1, 0], &mdp, 1e-6, 0.9, &mut values), Err(MdpError::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_iteration_ceiling(){
        let mdp = self_loop(1.0);
        let config = SolverConfig::new(1e-12, 0.99).with_max_iterations(5);
        let mut values = vec![0.0];

        let result = evaluate_policy_from_config(&[0], &mdp, &config, &mut values);
        assert!(matches!(result, Err(MdpError::DidNotConverge { iterations: 5 })));
    }
}
