//! The Markov Decision Process model and its builder.
//!
//! An [`Mdp`] is immutable once built. All transition probabilities live in a
//! single contiguous buffer; the successor distribution of one `(state, action)`
//! pair occupies `num_states` consecutive entries, so the inner loop of every
//! Bellman update reads one slice.

use tracing::warn;

use crate::{error::check_index, MdpError, Result};

/// Tolerance used when checking that a transition row sums to one.
///
/// Rows outside this tolerance only produce a warning.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// A finite, fully observed Markov Decision Process.
///
/// Built with [`MdpBuilder`] (or read from text with [`crate::parse_mdp`]) and
/// read-only afterwards. Solvers borrow it immutably, so a single instance can be
/// shared by any number of independent solves.
#[derive(Clone, Debug, PartialEq)]
pub struct Mdp{
    num_states: usize,
    num_actions: usize,
    start: usize,
    /// `P(next | state, action)` stored at `offset(next, state, action)`.
    transitions: Vec<f64>,
    actions: Vec<Vec<usize>>,
    rewards: Vec<f64>,
    terminal: Vec<bool>
}

/// Number of entries in the transition table of a model with the given
/// dimensions, or `None` if that table cannot be allocated.
pub(crate) fn transition_table_len(num_states: usize, num_actions: usize) -> Option<usize>{
    num_states
        .checked_mul(num_states)?
        .checked_mul(num_actions)
        .filter(|&len| len <= isize::MAX as usize / std::mem::size_of::<f64>())
}

#[inline]
fn offset(num_states: usize, num_actions: usize, next: usize, state: usize, action: usize) -> usize{
    (state * num_actions + action) * num_states + next
}

impl Mdp{
    /// Returns the number of states.
    #[inline]
    pub fn num_states(&self) -> usize{
        self.num_states
    }

    /// Returns the number of actions (an exclusive bound on action indices).
    #[inline]
    pub fn num_actions(&self) -> usize{
        self.num_actions
    }

    /// Returns the designated initial state. Solvers do not use it.
    #[inline]
    pub fn start(&self) -> usize{
        self.start
    }

    /// Returns `P(next | state, action)`.
    ///
    /// This keeps the logical `transitionProb[next][state][action]` indexing of
    /// the model regardless of how the probabilities are laid out in memory.
    ///
    /// # Errors
    /// `IndexOutOfRange` if any index is out of bounds.
    pub fn transition_prob(&self, next: usize, state: usize, action: usize) -> Result<f64>{
        check_index("state", next, self.num_states)?;
        check_index("state", state, self.num_states)?;
        check_index("action", action, self.num_actions)?;

        Ok(self.transitions[offset(self.num_states, self.num_actions, next, state, action)])
    }

    /// Returns the successor distribution of `(state, action)`, indexed by next state.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `state` or `action` is out of bounds.
    pub fn successors(&self, state: usize, action: usize) -> Result<&[f64]>{
        check_index("state", state, self.num_states)?;
        check_index("action", action, self.num_actions)?;

        Ok(self.row(state, action))
    }

    /// Unchecked variant of [`Mdp::successors`] for callers that validated the indices.
    #[inline]
    pub(crate) fn row(&self, state: usize, action: usize) -> &[f64]{
        let begin = offset(self.num_states, self.num_actions, 0, state, action);
        &self.transitions[begin..begin + self.num_states]
    }

    /// Returns the ordered list of actions available in `state`.
    ///
    /// # Panics
    /// Panics if `state >= num_states()`.
    #[inline]
    pub fn available_actions(&self, state: usize) -> &[usize]{
        &self.actions[state]
    }

    /// Returns how many actions are available in `state`.
    ///
    /// # Panics
    /// Panics if `state >= num_states()`.
    #[inline]
    pub fn num_available_actions(&self, state: usize) -> usize{
        self.actions[state].len()
    }

    /// Checks whether `action` is listed among the actions available in `state`.
    ///
    /// # Panics
    /// Panics if `state >= num_states()`.
    #[inline]
    pub fn is_available(&self, state: usize, action: usize) -> bool{
        self.actions[state].contains(&action)
    }

    /// Returns the reward for occupying `state`.
    ///
    /// # Panics
    /// Panics if `state >= num_states()`.
    #[inline]
    pub fn reward(&self, state: usize) -> f64{
        self.rewards[state]
    }

    /// Returns the rewards of all states, indexed by state.
    #[inline]
    pub fn rewards(&self) -> &[f64]{
        &self.rewards
    }

    /// Returns whether `state` is terminal.
    ///
    /// # Panics
    /// Panics if `state >= num_states()`.
    #[inline]
    pub fn is_terminal(&self, state: usize) -> bool{
        self.terminal[state]
    }

    /// Iterates over the indices of terminal states in increasing order.
    pub fn terminal_states(&self) -> impl Iterator<Item = usize> + '_{
        self.terminal.iter().enumerate().filter(|(_, t)| **t).map(|(s, _)| s)
    }

    /// Emits a warning for every probability outside `[0, 1]` and for every
    /// available action of a non-terminal state whose row does not sum to one.
    ///
    /// Returns the number of warnings emitted. Never fails.
    fn warn_suspicious_probabilities(&self) -> usize{
        let mut warnings = 0;

        for state in 0..self.num_states {
            for action in 0..self.num_actions {
                for (next, &p) in self.row(state, action).iter().enumerate() {
                    if p < 0.0 {
                        warn!(next, state, action, p, "negative transition probability");
                        warnings += 1;
                    }
                    else if p > 1.0 {
                        warn!(next, state, action, p, "transition probability exceeds 1");
                        warnings += 1;
                    }
                }
            }

            if self.terminal[state] {
                continue;
            }

            for &action in &self.actions[state] {
                let sum: f64 = self.row(state, action).iter().sum();
                if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                    warn!(state, action, sum, "transition probabilities do not sum to 1");
                    warnings += 1;
                }
            }
        }

        warnings
    }
}

/// Incremental constructor for an [`Mdp`].
///
/// Every probability starts at zero, no action is available anywhere, rewards
/// are zero, no state is terminal and the start state is 0. Setters check the
/// indices they are given; [`MdpBuilder::build`] checks the remaining invariants.
///
/// Dimensions that are zero or too large to allocate are accepted by
/// [`MdpBuilder::new`]; every setter and [`MdpBuilder::build`] then fail with
/// `InvalidArgument`.
///
/// # Examples
/// ```rust
/// use simple_mdp::{MdpBuilder, MdpError};
///
/// fn main() -> Result<(), MdpError> {
///     let mut builder = MdpBuilder::new(2, 1);
///     builder
///         .transition(1, 0, 0, 1.0)?
///         .actions(0, &[0])?
///         .reward(1, 10.0)?
///         .terminal(1)?;
///     let mdp = builder.build()?;
///
///     assert_eq!(mdp.transition_prob(1, 0, 0)?, 1.0);
///     assert!(mdp.is_terminal(1));
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct MdpBuilder{
    num_states: usize,
    num_actions: usize,
    start: usize,
    transitions: Vec<f64>,
    actions: Vec<Vec<usize>>,
    rewards: Vec<f64>,
    terminal: Vec<bool>
}

impl MdpBuilder{
    /// Creates a builder for a model with `num_states` states and `num_actions` actions.
    ///
    /// Nothing is allocated for unusable dimensions; the error is reported by
    /// the first setter or by [`MdpBuilder::build`].
    pub fn new(num_states: usize, num_actions: usize) -> Self{
        let len = transition_table_len(num_states, num_actions).filter(|&len| len > 0);
        // every per-state buffer is no longer than the transition table
        let states = if len.is_some() { num_states } else { 0 };

        MdpBuilder {
            num_states,
            num_actions,
            start: 0,
            transitions: vec![0.0; len.unwrap_or(0)],
            actions: vec![Vec::new(); states],
            rewards: vec![0.0; states],
            terminal: vec![false; states]
        }
    }

    /// Fails unless the dimensions are positive and the model fits in memory.
    fn check_dimensions(&self) -> Result<()>{
        if self.num_states == 0 || self.num_actions == 0 {
            return Err(MdpError::InvalidArgument(format!(
                "an MDP needs at least one state and one action (got {} states, {} actions)",
                self.num_states, self.num_actions
            )));
        }

        if transition_table_len(self.num_states, self.num_actions).is_none() {
            return Err(MdpError::InvalidArgument(format!(
                "{} states and {} actions do not fit in memory",
                self.num_states, self.num_actions
            )));
        }

        Ok(())
    }

    /// Sets the designated initial state. Checked by [`MdpBuilder::build`].
    pub fn start(&mut self, start: usize) -> &mut Self{
        self.start = start;
        self
    }

    /// Sets `P(next | state, action) = probability`.
    ///
    /// Probabilities outside `[0, 1]` are accepted and reported as warnings on build.
    ///
    /// # Errors
    /// `IndexOutOfRange` if any index is out of bounds.
    pub fn transition(&mut self, next: usize, state: usize, action: usize, probability: f64) -> Result<&mut Self>{
        self.check_dimensions()?;
        check_index("state", next, self.num_states)?;
        check_index("state", state, self.num_states)?;
        check_index("action", action, self.num_actions)?;

        self.transitions[offset(self.num_states, self.num_actions, next, state, action)] = probability;
        Ok(self)
    }

    /// Replaces the ordered list of actions available in `state`.
    ///
    /// The order matters: it is the iteration order used for tie-breaking in
    /// [`crate::max_expected_utility`].
    ///
    /// # Errors
    /// `IndexOutOfRange` if `state` is out of bounds. Action indices are checked on build.
    pub fn actions(&mut self, state: usize, actions: &[usize]) -> Result<&mut Self>{
        self.check_dimensions()?;
        check_index("state", state, self.num_states)?;

        self.actions[state] = actions.to_vec();
        Ok(self)
    }

    /// Sets the reward for occupying `state`.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `state` is out of bounds.
    pub fn reward(&mut self, state: usize, reward: f64) -> Result<&mut Self>{
        self.check_dimensions()?;
        check_index("state", state, self.num_states)?;

        self.rewards[state] = reward;
        Ok(self)
    }

    /// Marks `state` as terminal.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `state` is out of bounds.
    pub fn terminal(&mut self, state: usize) -> Result<&mut Self>{
        self.check_dimensions()?;
        check_index("state", state, self.num_states)?;

        self.terminal[state] = true;
        Ok(self)
    }

    /// Validates the model and freezes it.
    ///
    /// Hard failures:
    /// - `InvalidArgument` if a dimension is zero or too large, an action is listed
    ///   twice for a state, or a reward or probability is NaN or infinite;
    /// - `IndexOutOfRange` if the start state or a listed action is out of bounds.
    ///
    /// Finite probabilities outside `[0, 1]` and rows that do not sum to one only log warnings.
    pub fn build(self) -> Result<Mdp>{
        self.check_dimensions()?;
        check_index("start", self.start, self.num_states)?;

        if let Some(state) = self.rewards.iter().position(|r| !r.is_finite()) {
            return Err(MdpError::InvalidArgument(format!(
                "reward of state {state} is {}", self.rewards[state]
            )));
        }

        if let Some(index) = self.transitions.iter().position(|p| !p.is_finite()) {
            let (pair, next) = (index / self.num_states, index % self.num_states);
            return Err(MdpError::InvalidArgument(format!(
                "P({next} | {}, {}) is {}",
                pair / self.num_actions, pair % self.num_actions, self.transitions[index]
            )));
        }

        for (state, actions) in self.actions.iter().enumerate() {
            for (i, &action) in actions.iter().enumerate() {
                check_index("action", action, self.num_actions)?;

                if actions[..i].contains(&action) {
                    return Err(MdpError::InvalidArgument(format!(
                        "action {action} is listed twice for state {state}"
                    )));
                }
            }
        }

        let mdp = Mdp {
            num_states: self.num_states,
            num_actions: self.num_actions,
            start: self.start,
            transitions: self.transitions,
            actions: self.actions,
            rewards: self.rewards,
            terminal: self.terminal
        };

        mdp.warn_suspicious_probabilities();
        Ok(mdp)
    }
}
