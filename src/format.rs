//! Plain-text model and policy files.
//!
//! A model file is a stream of whitespace-separated tokens:
//!
//! 1. `numStates numActions`
//! 2. `start`
//! 3. `numStates * numStates * numActions` transition probabilities, next state
//!    outermost, then state, then action
//! 4. one available-action count per state
//! 5. the available actions of each state, in order
//! 6. one reward per state
//! 7. up to `numStates` terminal state indices, until the end of the input
//!
//! A policy file holds one action per state.

use std::{fmt::Display, fs, path::Path, str::{FromStr, SplitWhitespace}};

use tracing::{debug, warn};

use crate::{mdp::transition_table_len, Mdp, MdpBuilder, MdpError, Result};

/// Sequential reader over the tokens of a text input.
struct Tokens<'a>{
    inner: SplitWhitespace<'a>,
    consumed: usize
}

impl<'a> Tokens<'a>{
    fn new(text: &'a str) -> Self{
        Tokens { inner: text.split_whitespace(), consumed: 0 }
    }

    /// Reads the next token as a `T`, failing with a `Parse` error naming `section`.
    fn next<T>(&mut self, section: &'static str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display
    {
        let token = self.inner.next().ok_or_else(|| MdpError::Parse {
            section,
            message: format!("unexpected end of input after {} tokens", self.consumed)
        })?;
        self.consumed += 1;

        token.parse().map_err(|e| MdpError::Parse {
            section,
            message: format!("token {} (`{token}`): {e}", self.consumed)
        })
    }

    /// Reads the next token as a `T` if there is one left.
    fn next_if_any<T>(&mut self, section: &'static str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display
    {
        match self.inner.clone().next() {
            Some(_) => self.next(section).map(Some),
            None => Ok(None)
        }
    }

    fn remaining(&self) -> usize{
        self.inner.clone().count()
    }
}

/// Parses a model from its text representation.
///
/// Probabilities outside `[0, 1]` and rows that do not sum to one are logged as
/// warnings, as with [`MdpBuilder::build`].
///
/// # Errors
/// - `Parse` if a token is missing or malformed, the dimensions are too large,
///   or an available-action count exceeds the number of actions.
/// - Any error of [`MdpBuilder`] for indices out of range or duplicate actions.
///
/// # Examples
/// ```rust
/// use simple_mdp::{parse_mdp, MdpError};
///
/// fn main() -> Result<(), MdpError> {
///     // two states, one action: state 0 moves to the terminal state 1
///     let mdp = parse_mdp("2 1  0  0 0 1 0  1 0  0  0 10  1")?;
///
///     assert_eq!(mdp.transition_prob(1, 0, 0)?, 1.0);
///     assert_eq!(mdp.available_actions(0), &[0]);
///     assert!(mdp.is_terminal(1));
///     Ok(())
/// }
/// ```
pub fn parse_mdp(text: &str) -> Result<Mdp>{
    let mut tokens = Tokens::new(text);

    let num_states: usize = tokens.next("dimensions")?;
    let num_actions: usize = tokens.next("dimensions")?;

    let Some(len) = transition_table_len(num_states, num_actions) else {
        return Err(MdpError::Parse {
            section: "dimensions",
            message: format!("{num_states} states and {num_actions} actions do not fit in memory")
        });
    };

    if len == 0 {
        // a zero dimension, reported by the builder
        return MdpBuilder::new(num_states, num_actions).build();
    }

    let start: usize = tokens.next("start state")?;

    // nothing is allocated for a table the input cannot fill
    let available = tokens.remaining();
    if available < len {
        return Err(MdpError::Parse {
            section: "transition probabilities",
            message: format!("expected {len} probabilities, found {available} tokens")
        });
    }

    let mut builder = MdpBuilder::new(num_states, num_actions);
    builder.start(start);

    for next in 0..num_states {
        for state in 0..num_states {
            for action in 0..num_actions {
                let probability: f64 = tokens.next("transition probabilities")?;
                builder.transition(next, state, action, probability)?;
            }
        }
    }

    let mut counts = Vec::with_capacity(num_states);
    for state in 0..num_states {
        let count: usize = tokens.next("available action counts")?;

        if count > num_actions {
            return Err(MdpError::Parse {
                section: "available action counts",
                message: format!("state {state} lists {count} actions but there are only {num_actions}")
            });
        }
        counts.push(count);
    }

    for (state, &count) in counts.iter().enumerate() {
        let actions = (0..count)
            .map(|_| tokens.next("available actions"))
            .collect::<Result<Vec<usize>>>()?;
        builder.actions(state, &actions)?;
    }

    for state in 0..num_states {
        builder.reward(state, tokens.next("rewards")?)?;
    }

    let mut terminals = 0;
    while terminals < num_states {
        match tokens.next_if_any::<usize>("terminal states")? {
            Some(state) => {
                builder.terminal(state)?;
                terminals += 1;
            }
            None => break
        }
    }

    let ignored = tokens.remaining();
    if ignored > 0 {
        warn!(ignored, "trailing tokens after the terminal states are ignored");
    }

    let mdp = builder.build()?;
    debug!(num_states, num_actions, terminals, "parsed model");
    Ok(mdp)
}

impl FromStr for Mdp{
    type Err = MdpError;

    fn from_str(s: &str) -> Result<Self>{
        parse_mdp(s)
    }
}

/// Reads a model file. See [`parse_mdp`].
///
/// # Errors
/// `Io` if the file cannot be read, otherwise the errors of [`parse_mdp`].
pub fn read_mdp<P: AsRef<Path>>(path: P) -> Result<Mdp>{
    parse_mdp(&fs::read_to_string(path)?)
}

/// Parses a policy of `num_states` actions.
///
/// Actions are only read here; they are checked against a model by the solvers
/// (see [`crate::check_policy`]).
///
/// # Errors
/// `Parse` if fewer than `num_states` unsigned integers are present.
pub fn parse_policy(text: &str, num_states: usize) -> Result<Vec<usize>>{
    let mut tokens = Tokens::new(text);

    let policy = (0..num_states)
        .map(|_| tokens.next("policy"))
        .collect::<Result<Vec<usize>>>()?;

    let ignored = tokens.remaining();
    if ignored > 0 {
        warn!(ignored, "trailing tokens after the policy are ignored");
    }

    Ok(policy)
}

/// Reads a policy file of `num_states` actions. See [`parse_policy`].
///
/// # Errors
/// `Io` if the file cannot be read, otherwise the errors of [`parse_policy`].
pub fn read_policy<P: AsRef<Path>>(path: P, num_states: usize) -> Result<Vec<usize>>{
    parse_policy(&fs::read_to_string(path)?, num_states)
}
