//! Two-phase and optimal solvers for the 3x3x3 cube.
//!
//! Everything a solver reads lives in an explicit [`Tables`] aggregate, built once (or loaded from
//! disk) with [`Tables::load_or_build`] and then shared read-only between solves.

pub mod constants;
pub mod cube;
pub mod error;
pub mod r#move;
pub mod solver;
pub mod tables;

mod prelude;

#[cfg(test)]
mod test;

pub use cube::{CubeLike, CubieCube, FaceCube};
pub use error::{CubeError, FaceletError, InputError};
pub use r#move::{Direction, Face, Move};
pub use solver::{
    solve_optimal, solve_smart, solve_two_phase, Cancellation, OptimalSolver, Solution,
    SolveResult, Solver, TwoPhaseSolver, SMART_TARGET, SMART_TIMEOUT,
};
pub use tables::{TableConfig, TableSet, Tables};
