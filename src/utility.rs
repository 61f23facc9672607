//! Expected-utility evaluation for a single state.
//!
//! These are the inner steps of every solver: the expected utility (EU) of a
//! `(state, action)` pair under a value function, and the maximum expected
//! utility (MEU) over the actions available in a state.

use crate::{error::check_index, Mdp, MdpError, Result};

/// Checks that `values` holds exactly one entry per state of `mdp`.
#[inline]
pub(crate) fn check_values(mdp: &Mdp, values: &[f64]) -> Result<()>{
    if values.len() == mdp.num_states() {
        Ok(())
    }
    else{
        Err(MdpError::InvalidArgument(format!(
            "value function has {} entries, expected {}",
            values.len(),
            mdp.num_states()
        )))
    }
}

/// Unchecked expected utility; indices and `values` length must already be valid.
#[inline]
pub(crate) fn eu(mdp: &Mdp, state: usize, values: &[f64], action: usize) -> f64{
    mdp.row(state, action)
        .iter()
        .zip(values)
        .map(|(p, v)| p * v)
        .sum()
}

/// Unchecked maximum expected utility; `state` and `values` length must already be valid.
///
/// The first action reaching the maximum in `available_actions(state)` order wins.
pub(crate) fn meu(mdp: &Mdp, state: usize, values: &[f64]) -> (f64, usize){
    let mut best: Option<(f64, usize)> = None;

    for &action in mdp.available_actions(state) {
        let utility = eu(mdp, state, values, action);

        match best {
            Some((best_utility, _)) if utility <= best_utility => {}
            _ => best = Some((utility, action))
        }
    }

    best.unwrap_or((0.0, 0))
}

/// Calculates the expected utility of taking `action` in `state`.
///
/// `EU(state, action) = Σ_{s'} P(s' | state, action) · values[s']`
///
/// The action does not need to be available in `state`; an unavailable action
/// normally has an all-zero row and thus an expected utility of zero.
///
/// # Parameters
/// - `mdp`: The model.
/// - `state`: The state the action is taken from.
/// - `values`: The current value function, one entry per state.
/// - `action`: The action to evaluate.
///
/// # Returns
/// The expected utility of the successor states.
///
/// # Errors
/// - `IndexOutOfRange` if `state` or `action` is out of bounds.
/// - `InvalidArgument` if `values` does not have one entry per state.
///
/// # Examples
/// ```rust
/// use simple_mdp::{expected_utility, test_utils::two_state_chain};
///
/// let mdp = two_state_chain();
/// assert_eq!(expected_utility(&mdp, 0, &[0.0, 10.0], 0).unwrap(), 10.0);
/// ```
pub fn expected_utility(mdp: &Mdp, state: usize, values: &[f64], action: usize) -> Result<f64>{
    check_index("state", state, mdp.num_states())?;
    check_index("action", action, mdp.num_actions())?;
    check_values(mdp, values)?;

    Ok(eu(mdp, state, values, action))
}

/// Calculates the maximum expected utility of `state` and the action achieving it.
///
/// Only the actions available in `state` are considered. When several actions
/// share the maximum, the one listed first in [`Mdp::available_actions`] is
/// returned.
///
/// # Parameters
/// - `mdp`: The model.
/// - `state`: The state to evaluate.
/// - `values`: The current value function, one entry per state.
///
/// # Returns
/// A tuple `(meu, action)`. A state with no available actions yields `(0.0, 0)`;
/// that action is a placeholder and must not be applied.
///
/// # Errors
/// - `IndexOutOfRange` if `state` is out of bounds.
/// - `InvalidArgument` if `values` does not have one entry per state.
pub fn max_expected_utility(mdp: &Mdp, state: usize, values: &[f64]) -> Result<(f64, usize)>{
    check_index("state", state, mdp.num_states())?;
    check_values(mdp, values)?;

    Ok(meu(mdp, state, values))
}
