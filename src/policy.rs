//! Deterministic policies: validation, random initialization and greedy extraction.
//!
//! A policy is a plain `[usize]` with one action per state. Entries of states
//! with no available actions are placeholders and are never applied.

use rand::Rng;

use crate::{error::check_index, utility::{check_values, meu}, Mdp, MdpError, Result};

/// Checks that `policy` is usable with `mdp`.
///
/// Every non-terminal state with at least one available action must select
/// one of those actions. Other entries are not inspected.
///
/// # Errors
/// - `InvalidArgument` if `policy` does not have one entry per state.
/// - `IndexOutOfRange` if a checked entry is not a valid action index.
/// - `InvalidPolicy` if a checked entry is not available in its state.
pub fn check_policy(mdp: &Mdp, policy: &[usize]) -> Result<()>{
    if policy.len() != mdp.num_states() {
        return Err(MdpError::InvalidArgument(format!(
            "policy has {} entries, expected {}",
            policy.len(),
            mdp.num_states()
        )));
    }

    for (state, &action) in policy.iter().enumerate() {
        if mdp.is_terminal(state) || mdp.num_available_actions(state) == 0 {
            continue;
        }

        check_index("action", action, mdp.num_actions())?;

        if !mdp.is_available(state, action) {
            return Err(MdpError::InvalidPolicy { state, action });
        }
    }

    Ok(())
}

/// Overwrites `policy` with a uniformly random available action for every state
/// that has at least one. Entries of states without actions are left untouched.
///
/// # Parameters
/// - `mdp`: The model.
/// - `policy`: The policy to overwrite, one entry per state.
/// - `rng`: The random source. Pass a seeded generator for reproducible policies.
///
/// # Errors
/// `InvalidArgument` if `policy` does not have one entry per state.
pub fn randomize_policy<R: Rng + ?Sized>(mdp: &Mdp, policy: &mut [usize], rng: &mut R) -> Result<()>{
    if policy.len() != mdp.num_states() {
        return Err(MdpError::InvalidArgument(format!(
            "policy has {} entries, expected {}",
            policy.len(),
            mdp.num_states()
        )));
    }

    fill_random(mdp, policy, rng);
    Ok(())
}

/// Creates a policy with a uniformly random available action per state.
///
/// States without available actions get the placeholder `0`.
///
/// # Examples
/// ```rust
/// use rand::{rngs::StdRng, SeedableRng};
/// use simple_mdp::{check_policy, random_policy, test_utils::grid_world};
///
/// let mdp = grid_world();
/// let policy = random_policy(&mdp, &mut StdRng::seed_from_u64(42));
/// assert!(check_policy(&mdp, &policy).is_ok());
/// ```
pub fn random_policy<R: Rng + ?Sized>(mdp: &Mdp, rng: &mut R) -> Vec<usize>{
    let mut policy = vec![0; mdp.num_states()];
    fill_random(mdp, &mut policy, rng);
    policy
}

fn fill_random<R: Rng + ?Sized>(mdp: &Mdp, policy: &mut [usize], rng: &mut R){
    for (state, entry) in policy.iter_mut().enumerate() {
        let actions = mdp.available_actions(state);

        if !actions.is_empty() {
            *entry = actions[rng.random_range(0..actions.len())];
        }
    }
}

/// Extracts the greedy policy of a value function.
///
/// Each state gets the action of maximum expected utility under `values`, with
/// ties going to the first available action. Applied to the output of
/// [`crate::value_iteration`] this recovers an optimal policy.
///
/// # Returns
/// One action per state; `0` for states without available actions.
///
/// # Errors
/// `InvalidArgument` if `values` does not have one entry per state.
pub fn greedy_policy(mdp: &Mdp, values: &[f64]) -> Result<Vec<usize>>{
    check_values(mdp, values)?;

    Ok((0..mdp.num_states())
        .map(|state| meu(mdp, state, values).1)
        .collect())
}
