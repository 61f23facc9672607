//! Small models shared by the unit tests and the documentation examples.

use crate::{Mdp, MdpBuilder, Result};

/// Index of the bottom-left start cell of [`grid_world`].
pub const GRID_START: usize = 0;
/// Index of the cell left of the +1 exit of [`grid_world`].
pub const GRID_BESIDE_GOAL: usize = 9;
/// Index of the +1 exit of [`grid_world`].
pub const GRID_GOAL: usize = 10;
/// Index of the -1 exit of [`grid_world`].
pub const GRID_PIT: usize = 6;

/// Moves of [`grid_world`].
pub const NORTH: usize = 0;
pub const EAST: usize = 1;
pub const SOUTH: usize = 2;
pub const WEST: usize = 3;

fn fixture<F>(num_states: usize, num_actions: usize, setup: F) -> Mdp
where
    F: FnOnce(&mut MdpBuilder) -> Result<()>
{
    let mut builder = MdpBuilder::new(num_states, num_actions);
    setup(&mut builder).and_then(|_| builder.build()).expect("invalid test fixture")
}

/// `0 -> 1` with certainty; state 1 is terminal with reward 10.
pub fn two_state_chain() -> Mdp{
    fixture(2, 1, |b| {
        b.transition(1, 0, 0, 1.0)?
            .actions(0, &[0])?
            .reward(1, 10.0)?
            .terminal(1)?;
        Ok(())
    })
}

/// One terminal state with reward 5 and no actions.
pub fn single_terminal() -> Mdp{
    fixture(1, 1, |b| {
        b.reward(0, 5.0)?.terminal(0)?;
        Ok(())
    })
}

/// `0 -> 1 -> 2` with certainty; state 2 is terminal with reward 1.
pub fn three_state_chain() -> Mdp{
    fixture(3, 1, |b| {
        b.transition(1, 0, 0, 1.0)?
            .transition(2, 1, 0, 1.0)?
            .actions(0, &[0])?
            .actions(1, &[0])?
            .reward(2, 1.0)?
            .terminal(2)?;
        Ok(())
    })
}

/// Like [`three_state_chain`] with two actions: in state 0, action 0 moves on
/// and action 1 loops back to state 0. State 1 only offers action 0.
pub fn three_state_chain_with_detour() -> Mdp{
    fixture(3, 2, |b| {
        b.transition(1, 0, 0, 1.0)?
            .transition(0, 0, 1, 1.0)?
            .transition(2, 1, 0, 1.0)?
            .actions(0, &[0, 1])?
            .actions(1, &[0])?
            .reward(2, 1.0)?
            .terminal(2)?;
        Ok(())
    })
}

/// State 0 lists actions `[2, 0, 1]`. Actions 2 and 0 lead to state 1 (reward 1),
/// action 1 leads to state 2 (reward 0). Both successors are terminal.
pub fn tie_mdp() -> Mdp{
    fixture(3, 3, |b| {
        b.transition(1, 0, 2, 1.0)?
            .transition(1, 0, 0, 1.0)?
            .transition(2, 0, 1, 1.0)?
            .actions(0, &[2, 0, 1])?
            .reward(1, 1.0)?
            .terminal(1)?
            .terminal(2)?;
        Ok(())
    })
}

/// A single non-terminal state that loops on itself and earns `reward` each step.
pub fn self_loop(reward: f64) -> Mdp{
    fixture(1, 1, |b| {
        b.transition(0, 0, 0, 1.0)?
            .actions(0, &[0])?
            .reward(0, reward)?;
        Ok(())
    })
}

/// A single non-terminal state with reward -2 and no available action.
pub fn dead_end() -> Mdp{
    fixture(1, 1, |b| {
        b.reward(0, -2.0)?;
        Ok(())
    })
}

/// The 4x3 grid world.
///
/// ```text
///  y=2 |  7 |  8 |  9 | 10 (+1)
///  y=1 |  4 |####|  5 |  6 (-1)
///  y=0 |  0 |  1 |  2 |  3
/// ```
///
/// Every move goes in the intended direction with probability 0.8 and slips to
/// each perpendicular direction with probability 0.1. Bumping into the wall or
/// the border leaves the agent in place. Non-terminal cells cost 0.04.
pub fn grid_world() -> Mdp{
    const WIDTH: i32 = 4;
    const HEIGHT: i32 = 3;
    const WALL: (i32, i32) = (1, 1);
    const MOVES: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

    let cells: Vec<(i32, i32)> = (0..HEIGHT)
        .flat_map(|y| (0..WIDTH).map(move |x| (x, y)))
        .filter(|&cell| cell != WALL)
        .collect();
    let index_of = |cell: (i32, i32)| cells.iter().position(|&c| c == cell);

    fixture(cells.len(), MOVES.len(), |b| {
        b.reward(GRID_GOAL, 1.0)?.terminal(GRID_GOAL)?;
        b.reward(GRID_PIT, -1.0)?.terminal(GRID_PIT)?;

        for (state, &(x, y)) in cells.iter().enumerate() {
            if state == GRID_GOAL || state == GRID_PIT {
                continue;
            }

            b.reward(state, -0.04)?.actions(state, &[NORTH, EAST, SOUTH, WEST])?;

            for action in 0..MOVES.len() {
                let mut row = vec![0.0; cells.len()];

                for (direction, p) in [(action, 0.8), ((action + 1) % 4, 0.1), ((action + 3) % 4, 0.1)] {
                    let (dx, dy) = MOVES[direction];
                    let next = index_of((x + dx, y + dy)).unwrap_or(state);
                    row[next] += p;
                }

                for (next, p) in row.into_iter().enumerate().filter(|(_, p)| *p > 0.0) {
                    b.transition(next, state, action, p)?;
                }
            }
        }

        Ok(())
    })
}
