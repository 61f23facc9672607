//! A Rust library for solving finite, fully observed Markov Decision Processes
//! (MDPs) by dynamic programming.
//!
//! Given a tabular model (states, actions, transition probabilities, rewards and
//! terminal states), it computes the value function of a fixed policy, the
//! optimal value function and an optimal deterministic policy.
//!
//! # Modules
//! - `mdp`: The immutable model and its builder.
//! - `utility`: Expected utility of an action and maximum expected utility of a state.
//! - `config`: Convergence parameters shared by the solvers.
//! - `policy`: Policy validation, random initialization and greedy extraction.
//! - `evaluation`: Iterative policy evaluation.
//! - `value_iteration`: Value iteration.
//! - `policy_iteration`: Policy iteration.
//! - `format`: Reading models and policies from text.
//! - `utils`: Contains general utility functions.
//! - `test_utils`: Provides small models for tests and examples.
//!
//! # Examples
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use simple_mdp::{
//!     evaluate_policy, policy_iteration, random_policy, value_iteration,
//!     test_utils::grid_world, MdpError
//! };
//!
//! fn main() -> Result<(), MdpError> {
//!     let mdp = grid_world();
//!     let (epsilon, gamma) = (1e-6, 0.9);
//!
//!     // Optimal values directly
//!     let mut optimal = vec![0.0; mdp.num_states()];
//!     let sweeps = value_iteration(&mdp, epsilon, gamma, &mut optimal)?;
//!     println!("value iteration converged after {} sweeps", sweeps);
//!
//!     // Optimal policy from a random one
//!     let mut policy = random_policy(&mdp, &mut StdRng::seed_from_u64(42));
//!     let rounds = policy_iteration(&mdp, epsilon, gamma, &mut policy)?;
//!     println!("policy iteration converged after {} rounds: {:?}", rounds, policy);
//!
//!     // Both agree on what the optimal policy is worth
//!     let mut values = vec![0.0; mdp.num_states()];
//!     evaluate_policy(&policy, &mdp, epsilon, gamma, &mut values)?;
//!     for (v, o) in values.iter().zip(&optimal) {
//!         assert!((v - o).abs() < 1e-4);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod error;
mod mdp;
mod utility;
mod config;
mod sweep;
mod policy;
mod evaluation;
mod value_iteration;
mod policy_iteration;
mod format;
pub mod utils;

#[doc(hidden)]
pub mod test_utils;

pub use error::*;
pub use mdp::*;
pub use utility::{expected_utility, max_expected_utility};
pub use config::*;
pub use policy::*;
pub use evaluation::*;
pub use value_iteration::*;
pub use policy_iteration::*;
pub use format::*;

#[cfg(test)]
mod proptest_tests {
    use crate::{
        evaluate_policy, evaluate_policy_from_config, policy_iteration_from_config,
        random_policy, value_iteration, Mdp, MdpBuilder, SolverConfig
    };
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// Generate a model with normalized transition rows, random action sets and terminal states.
    fn arb_mdp() -> impl Strategy<Value = Mdp> {
        (1usize..=5, 1usize..=3)
            .prop_flat_map(|(n, m)| {
                (
                    Just((n, m)),
                    proptest::collection::vec(0.01_f64..=1.0, n * n * m),
                    proptest::collection::vec(proptest::collection::vec(any::<bool>(), m), n),
                    proptest::collection::vec(-1.0_f64..=1.0, n),
                    proptest::collection::vec(proptest::bool::weighted(0.2), n)
                )
            })
            .prop_map(|((n, m), weights, available, rewards, terminal)| {
                let mut builder = MdpBuilder::new(n, m);

                for state in 0..n {
                    for action in 0..m {
                        let row = &weights[(state * m + action) * n..(state * m + action + 1) * n];
                        let sum: f64 = row.iter().sum();

                        for (next, w) in row.iter().enumerate() {
                            builder.transition(next, state, action, w / sum).unwrap();
                        }
                    }

                    let actions: Vec<usize> = (0..m).filter(|&a| available[state][a]).collect();
                    builder.actions(state, &actions).unwrap();
                    builder.reward(state, rewards[state]).unwrap();

                    if terminal[state] {
                        builder.terminal(state).unwrap();
                    }
                }

                builder.build().unwrap()
            })
    }

    fn solve_config(gamma: f64) -> SolverConfig {
        SolverConfig::new(1e-9, gamma).with_max_iterations(10_000)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn evaluation_output_is_a_fixed_point(mdp in arb_mdp(), gamma in 0.1_f64..0.95, seed in any::<u64>()) {
            let epsilon = 1e-6;
            let policy = random_policy(&mdp, &mut StdRng::seed_from_u64(seed));

            let mut values = vec![0.0; mdp.num_states()];
            evaluate_policy(&policy, &mdp, epsilon, gamma, &mut values).unwrap();

            let mut again = values.clone();
            let sweeps = evaluate_policy(&policy, &mdp, epsilon, gamma, &mut again).unwrap();

            prop_assert_eq!(sweeps, 1);
            for (a, b) in again.iter().zip(&values) {
                prop_assert!((a - b).abs() <= epsilon);
            }
        }

        #[test]
        fn policy_iteration_beats_random_policies(mdp in arb_mdp(), gamma in 0.1_f64..0.95, seed in any::<u64>()) {
            let config = solve_config(gamma);
            let rng = &mut StdRng::seed_from_u64(seed);

            let mut policy = random_policy(&mdp, rng);
            policy_iteration_from_config(&mdp, &config, &mut policy).unwrap();

            let mut best = vec![0.0; mdp.num_states()];
            evaluate_policy_from_config(&policy, &mdp, &config, &mut best).unwrap();

            for _ in 0..5 {
                let other = random_policy(&mdp, rng);
                let mut values = vec![0.0; mdp.num_states()];
                evaluate_policy_from_config(&other, &mdp, &config, &mut values).unwrap();

                for state in 0..mdp.num_states() {
                    prop_assert!(
                        best[state] >= values[state] - 1e-6,
                        "state {} worth {} under the optimized policy, {} under {:?}",
                        state, best[state], values[state], other
                    );
                }
            }
        }

        #[test]
        fn value_iteration_is_within_epsilon_of_policy_iteration(mdp in arb_mdp(), gamma in 0.1_f64..0.95) {
            let epsilon = 1e-6;
            let config = solve_config(gamma);

            let mut optimal = vec![0.0; mdp.num_states()];
            value_iteration(&mdp, epsilon, gamma, &mut optimal).unwrap();

            let mut policy = random_policy(&mdp, &mut StdRng::seed_from_u64(0));
            policy_iteration_from_config(&mdp, &config, &mut policy).unwrap();
            let mut values = vec![0.0; mdp.num_states()];
            evaluate_policy_from_config(&policy, &mdp, &config, &mut values).unwrap();

            for state in 0..mdp.num_states() {
                prop_assert!((optimal[state] - values[state]).abs() <= epsilon + 1e-7);
            }

            for state in mdp.terminal_states() {
                prop_assert_eq!(optimal[state], mdp.reward(state));
            }
        }
    }
}
