//! Error type shared by the model, the solvers and the text loader.

use thiserror::Error;

/// Represents possible errors that can occur while building, loading or solving an MDP.
#[derive(Error, Debug)]
pub enum MdpError{
    /// A scalar argument or a buffer does not satisfy the operation's preconditions
    /// (e.g. `epsilon <= 0`, `gamma` outside `(0, 1)`, a value buffer of the wrong length).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A state or action index lies outside `[0, bound)`.
    #[error("{what} index {index} out of range (bound {bound})")]
    IndexOutOfRange{
        /// What kind of index was rejected ("state", "action", "start", ...).
        what: &'static str,
        /// The offending index.
        index: usize,
        /// The exclusive upper bound it was checked against.
        bound: usize
    },

    /// A policy selects an action that is not available in a non-terminal state.
    #[error("policy selects action {action} which is not available in state {state}")]
    InvalidPolicy{
        /// The state whose entry is invalid.
        state: usize,
        /// The action the policy selected.
        action: usize
    },

    /// The optional iteration ceiling of a `SolverConfig` was reached before the
    /// stopping rule was met.
    #[error("did not converge within {iterations} iterations")]
    DidNotConverge{
        /// The ceiling that was reached.
        iterations: usize
    },

    /// The text input could not be parsed.
    #[error("failed to read {section}: {message}")]
    Parse{
        /// The section of the file being read when the error occurred.
        section: &'static str,
        /// Human readable description of the problem.
        message: String
    },

    /// Reading an input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error)
}

/// Result type alias for MDP operations
pub type Result<T> = std::result::Result<T, MdpError>;

/// Checks that `index < bound`, naming the index kind in the error.
#[inline]
pub(crate) fn check_index(what: &'static str, index: usize, bound: usize) -> Result<()>{
    if index < bound {
        Ok(())
    }
    else{
        Err(MdpError::IndexOutOfRange { what, index, bound })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_index(){
        assert!(check_index("state", 2, 3).is_ok());
        assert!(matches!(
            check_index("action", 3, 3),
            Err(MdpError::IndexOutOfRange { what: "action", index: 3, bound: 3 })
        ));
    }

    #[test]
    fn test_messages(){
        let err = MdpError::IndexOutOfRange { what: "state", index: 7, bound: 4 };
        assert_eq!(err.to_string(), "state index 7 out of range (bound 4)");

        let err = MdpError::Parse { section: "rewards", message: "premature end of input".to_string() };
        assert_eq!(err.to_string(), "failed to read rewards: premature end of input");
    }
}
