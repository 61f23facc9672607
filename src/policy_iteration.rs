//! Policy iteration: alternate policy evaluation and greedy improvement until
//! the policy is stable.

use tracing::{debug, info};

use crate::{
    check_policy, evaluate_policy_from_config,
    utility::{check_values, meu},
    Mdp, MdpError, Result, SolverConfig
};

/// Steps of the policy iteration loop.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase{
    /// Compute the value function of the current policy.
    Evaluate,
    /// Make the policy greedy with respect to that value function.
    Improve,
    /// The last improvement changed nothing; the policy is optimal.
    Converged
}

/// Makes `policy` greedy with respect to `values`.
///
/// For every non-terminal state with at least one available action, the entry
/// is set to the action returned by [`crate::max_expected_utility`], so ties go
/// to the action listed first in [`Mdp::available_actions`].
///
/// # Parameters
/// - `mdp`: The model.
/// - `values`: Value function of the current policy, one entry per state.
/// - `policy`: The policy to improve in place.
///
/// # Returns
/// The number of states whose action changed.
///
/// # Errors
/// - `InvalidArgument` if `values` or `policy` does not have one entry per state.
/// - `IndexOutOfRange` / `InvalidPolicy` if `policy` selects an unusable action.
pub fn improve_policy(mdp: &Mdp, values: &[f64], policy: &mut [usize]) -> Result<usize>{
    check_values(mdp, values)?;
    check_policy(mdp, policy)?;

    let mut changed = 0;

    for (state, action) in policy.iter_mut().enumerate() {
        if mdp.is_terminal(state) || mdp.num_available_actions(state) == 0 {
            continue;
        }

        let (_, best_action) = meu(mdp, state, values);

        if best_action != *action {
            *action = best_action;
            changed += 1;
        }
    }

    Ok(changed)
}

/// Optimizes `policy` in place by policy iteration.
///
/// Equivalent to [`policy_iteration_from_config`] with `SolverConfig::new(epsilon, gamma)`.
///
/// # Parameters
/// - `mdp`: The model.
/// - `epsilon`: Convergence threshold of every policy evaluation, `> 0`.
/// - `gamma`: Discount factor, in `(0, 1)`.
/// - `policy`: The initial policy (see [`crate::random_policy`]), overwritten
///             with the optimal one.
///
/// # Returns
/// The number of evaluate/improve rounds performed.
///
/// # Examples
/// ```rust
/// use rand::{rngs::StdRng, SeedableRng};
/// use simple_mdp::{policy_iteration, random_policy, test_utils::grid_world, MdpError};
///
/// fn main() -> Result<(), MdpError> {
///     let mdp = grid_world();
///     let mut policy = random_policy(&mdp, &mut StdRng::seed_from_u64(42));
///
///     let rounds = policy_iteration(&mdp, 1e-6, 0.9, &mut policy)?;
///     assert!(rounds >= 1);
///
///     // Running again from the optimal policy stops after the first improvement step.
///     assert_eq!(policy_iteration(&mdp, 1e-6, 0.9, &mut policy)?, 1);
///     Ok(())
/// }
/// ```
#[inline]
pub fn policy_iteration(mdp: &Mdp, epsilon: f64, gamma: f64, policy: &mut [usize]) -> Result<usize>{
    policy_iteration_from_config(mdp, &SolverConfig::new(epsilon, gamma), policy)
}

/// Optimizes `policy` in place by policy iteration, using a [`SolverConfig`].
///
/// Each round evaluates the current policy with [`evaluate_policy_from_config`]
/// (reusing the previous round's values as the starting estimate) and then
/// applies [`improve_policy`]. The loop ends after the first round in which no
/// action changed.
///
/// `config.max_iterations`, when set, bounds both the number of rounds and the
/// sweeps of every evaluation.
///
/// # Errors
/// - `InvalidArgument` for an invalid configuration or a policy of the wrong length.
/// - `IndexOutOfRange` / `InvalidPolicy` if the initial policy selects an unusable action.
/// - `DidNotConverge` if the ceiling is reached.
pub fn policy_iteration_from_config(mdp: &Mdp, config: &SolverConfig, policy: &mut [usize]) -> Result<usize>{
    config.validate()?;
    check_policy(mdp, policy)?;

    let mut values = vec![0.0; mdp.num_states()];
    let mut rounds: usize = 0;
    let mut phase = Phase::Evaluate;

    loop {
        phase = match phase {
            Phase::Evaluate => {
                if let Some(max) = config.max_iterations {
                    if rounds >= max {
                        return Err(MdpError::DidNotConverge { iterations: max });
                    }
                }

                rounds += 1;
                let sweeps = evaluate_policy_from_config(policy, mdp, config, &mut values)?;
                debug!(round = rounds, sweeps, "policy evaluated");

                Phase::Improve
            }
            Phase::Improve => {
                let changed = improve_policy(mdp, &values, policy)?;
                debug!(round = rounds, changed, "policy improved");

                if changed == 0 { Phase::Converged } else { Phase::Evaluate }
            }
            Phase::Converged => {
                info!(rounds, "policy iteration converged");
                return Ok(rounds);
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{evaluate_policy, greedy_policy, random_policy, test_utils::*, value_iteration};
    use float_eq::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_two_state_chain(){
        let mdp = two_state_chain();
        let mut policy = vec![0, 0];

        assert_eq!(policy_iteration(&mdp, 1e-6, 0.9, &mut policy).unwrap(), 1);
        assert_eq!(policy, vec![0, 0]);
    }

    #[test]
    fn test_single_terminal(){
        let mdp = single_terminal();
        let mut policy = vec![0];

        assert_eq!(policy_iteration(&mdp, 1e-6, 0.9, &mut policy).unwrap(), 1);

        let mut values = vec![0.0];
        evaluate_policy(&policy, &mdp, 1e-6, 0.9, &mut values).unwrap();
        assert_eq!(values, vec![5.0]);
    }

    #[test]
    fn test_leaves_detour(){
        // state 0 may loop on itself (action 1) or move towards the exit (action 0)
        let mdp = three_state_chain_with_detour();
        let mut policy = vec![1, 0, 0];

        let rounds = policy_iteration(&mdp, 1e-9, 0.9, &mut policy).unwrap();

        assert_eq!(policy[0], 0);
        assert_eq!(rounds, 2);
    }

    #[test]
    fn test_improve_policy_counts_changes(){
        let mdp = three_state_chain_with_detour();
        let values = vec![0.0, 0.9, 1.0];

        let mut policy = vec![1, 0, 0];
        assert_eq!(improve_policy(&mdp, &values, &mut policy).unwrap(), 1);
        assert_eq!(policy, vec![0, 0, 0]);

        assert_eq!(improve_policy(&mdp, &values, &mut policy).unwrap(), 0);
    }

    #[test]
    fn test_improve_policy_takes_first_maximizer(){
        let mdp = tie_mdp();
        let values = vec![0.0, 1.0, 0.0];

        // actions 2 and 0 are tied and 2 is listed first
        let mut policy = vec![0, 0, 0];
        assert_eq!(improve_policy(&mdp, &values, &mut policy).unwrap(), 1);
        assert_eq!(policy[0], 2);
        assert_eq!(improve_policy(&mdp, &values, &mut policy).unwrap(), 0);

        let mut policy = vec![1, 0, 0];
        assert_eq!(improve_policy(&mdp, &values, &mut policy).unwrap(), 1);
        assert_eq!(policy[0], 2);
    }

    #[test]
    fn test_tied_actions_converge_to_first_listed(){
        let mdp = tie_mdp();

        for start in [0, 1, 2] {
            let mut policy = vec![start, 0, 0];
            policy_iteration(&mdp, 1e-9, 0.9, &mut policy).unwrap();

            assert_eq!(policy[0], 2, "starting from action {start}");
        }
    }

    #[test]
    fn test_matches_greedy_policy_of_value_iteration(){
        let mdp = grid_world();

        for gamma in [0.9, 0.95, 0.99] {
            let mut values = vec![0.0; mdp.num_states()];
            value_iteration(&mdp, 1e-9, gamma, &mut values).unwrap();
            let expected = greedy_policy(&mdp, &values).unwrap();

            let mut policy = random_policy(&mdp, &mut StdRng::seed_from_u64(42));
            policy_iteration(&mdp, 1e-9, gamma, &mut policy).unwrap();

            assert_eq!(policy, expected, "gamma = {gamma}");
        }
    }

    #[test]
    fn test_idempotent(){
        let mdp = grid_world();
        let mut policy = random_policy(&mdp, &mut StdRng::seed_from_u64(3));

        policy_iteration(&mdp, 1e-8, 0.9, &mut policy).unwrap();
        let optimal = policy.clone();

        assert_eq!(policy_iteration(&mdp, 1e-8, 0.9, &mut policy).unwrap(), 1);
        assert_eq!(policy, optimal);
    }

    #[test]
    fn test_monotonic_improvement(){
        let mdp = grid_world();
        let (epsilon, gamma) = (1e-10, 0.95);
        let mut policy = random_policy(&mdp, &mut StdRng::seed_from_u64(11));

        let mut previous = vec![0.0; mdp.num_states()];
        evaluate_policy(&policy, &mdp, epsilon, gamma, &mut previous).unwrap();

        loop {
            if improve_policy(&mdp, &previous, &mut policy).unwrap() == 0 {
                break;
            }

            let mut current = vec![0.0; mdp.num_states()];
            evaluate_policy(&policy, &mdp, epsilon, gamma, &mut current).unwrap();

            for state in 0..mdp.num_states() {
                assert!(current[state] >= previous[state] - 1e-7, "state {state} got worse");
            }
            previous = current;
        }

        let mut optimal = vec![0.0; mdp.num_states()];
        value_iteration(&mdp, epsilon, gamma, &mut optimal).unwrap();
        assert_float_eq!(previous, optimal, abs_all <= 1e-6);
    }

    #[test]
    fn test_round_ceiling(){
        let mdp = three_state_chain_with_detour();
        let config = SolverConfig::new(1e-9, 0.9).with_max_iterations(1_000);
        let mut policy = vec![1, 0, 0];
        assert!(policy_iteration_from_config(&mdp, &config, &mut policy).is_ok());

        // the ceiling also bounds the sweeps of each evaluation
        let config = SolverConfig::new(1e-3, 0.5).with_max_iterations(1);
        let mut policy = vec![1, 0, 0];
        let result = policy_iteration_from_config(&mdp, &config, &mut policy);
        assert!(matches!(result, Err(MdpError::DidNotConverge { iterations: 1 })));
    }

    #[test]
    fn test_rejects_bad_arguments(){
        let mdp = three_state_chain_with_detour();

        assert!(matches!(policy_iteration(&mdp, 0.0, 0.9, &mut [0, 0, 0]), Err(MdpError::InvalidArgument(_))));
        assert!(matches!(policy_iteration(&mdp, 1e-6, 0.9, &mut [0, 0]), Err(MdpError::InvalidArgument(_))));
        assert!(matches!(policy_iteration(&mdp, 1e-6, 0.9, &mut [0, 1, 0]), Err(MdpError::InvalidPolicy { state: 1, action: 1 })));
    }
}
