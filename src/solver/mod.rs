use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use smallvec::SmallVec;

use crate::prelude::*;

mod optimal;
pub use optimal::*;

mod two_phase;
pub use two_phase::*;

/// The moves of a search in progress, deepest last.
pub type MoveStack = SmallVec<[Move; 24]>;

/// The `solve(cube, max_length, timeout) -> result` contract every solver offers.
pub trait Solver {
    fn default_max_length(&self) -> usize;

    fn default_timeout(&self) -> Duration;

    fn solve(&self, cube: &CubieCube, max_length: usize, timeout: Duration) -> SolveResult;

    /// Checks a facelet string before solving it. A bad string is reported as a failed result.
    fn solve_facelets(&self, facelets: &str, max_length: usize, timeout: Duration) -> SolveResult {
        match CubieCube::from_facelets(facelets) {
            Ok(cube) => self.solve(&cube, max_length, timeout),
            Err(e) => SolveResult::failure(e.to_string()),
        }
    }

    fn solve_default(&self, facelets: &str) -> SolveResult {
        self.solve_facelets(facelets, self.default_max_length(), self.default_timeout())
    }
}

/// A sequence of moves that solves a cube.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub moves: Vec<Move>,
    /// Proven to be as short as possible.
    pub optimal: bool,
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.moves {
            write!(f, "{} ", m)?;
        }
        let star = if self.optimal { "*" } else { "" };
        write!(f, "({}f{})", self.moves.len(), star)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveResult {
    pub success: bool,
    /// The rendered solution, or why there isn't one.
    pub message: String,
    /// Empty on failure, except for a solution that came out longer than asked for.
    pub moves: Vec<Move>,
}

impl SolveResult {
    pub fn solved(solution: Solution) -> SolveResult {
        SolveResult {
            success: true,
            message: solution.to_string(),
            moves: solution.moves,
        }
    }

    pub fn failure(message: impl Into<String>) -> SolveResult {
        SolveResult {
            success: false,
            message: message.into(),
            moves: Vec::new(),
        }
    }
}

/// Tells running searches to stop. Searches check it between nodes, so they stop soon after, not
/// immediately.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Cancellation {
        Cancellation::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A search that panicked can't leave the best solution half written, so a poisoned lock is
/// still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn solve_two_phase(
    tables: &Tables,
    facelets: &str,
    max_length: usize,
    timeout: Duration,
) -> SolveResult {
    TwoPhaseSolver::new(tables).solve_facelets(facelets, max_length, timeout)
}

/// Has no internal timeout; `max_length` bounds the work instead.
pub fn solve_optimal(tables: &Tables, facelets: &str, max_length: usize) -> SolveResult {
    let solver = OptimalSolver::new(tables);
    solver.solve_facelets(facelets, max_length, solver.default_timeout())
}

/// Target length of the first two-phase pass in smart mode.
pub const SMART_TARGET: usize = 18;
/// Timeout of the first two-phase pass in smart mode.
pub const SMART_TIMEOUT: Duration = Duration::from_secs(10);

/// Passes faster than this are repeated with a shorter target.
const QUICK_PASS: Duration = Duration::from_secs(1);
/// Solutions longer than this are worth searching longer for.
const TIGHTEN_BELOW: usize = 17;
const LONGEST_RETRY: Duration = Duration::from_secs(100);

/// Finds a short solution with the two-phase solver, then lets the optimal solver look for
/// anything shorter.
pub fn solve_smart(
    tables: &Tables,
    facelets: &str,
    target: usize,
    timeout: Duration,
) -> SolveResult {
    let cube = match CubieCube::from_facelets(facelets) {
        Ok(cube) => cube,
        Err(e) => return SolveResult::failure(e.to_string()),
    };
    if let Err(e) = tables.optimal() {
        return SolveResult::failure(e.to_string());
    }

    let moves = match shortest_two_phase(&TwoPhaseSolver::new(tables), &cube, target, timeout) {
        Ok(moves) => moves,
        Err(failure) => return failure,
    };
    log::info!("Proving {} moves optimal", moves.len());

    let optimal = OptimalSolver::new(tables);
    let shorter = optimal.solve(&cube, moves.len(), optimal.default_timeout());
    if shorter.success {
        return shorter;
    }

    SolveResult::solved(Solution {
        moves,
        optimal: true,
    })
}

/// Runs the two-phase solver, then again with a shorter target while passes stay quick, then
/// with longer timeouts while the solution is longer than the two-phase default.
fn shortest_two_phase(
    solver: &TwoPhaseSolver,
    cube: &CubieCube,
    target: usize,
    timeout: Duration,
) -> Result<Vec<Move>, SolveResult> {
    let pass = |max_length: usize, timeout: Duration| {
        let start = Instant::now();
        let result = solver.solve(cube, max_length, timeout);
        (result, start.elapsed())
    };

    let (first, mut took) = pass(target, timeout);
    if first.moves.is_empty() && !first.success {
        return Err(first);
    }
    log::info!("Found initial solution in {:?}: {}", took, first.message);
    let mut best = first.moves;

    while best.len() > TIGHTEN_BELOW && took < QUICK_PASS {
        let limit = best.len() - 1;
        let (next, t) = pass(limit, timeout);
        took = t;
        if !next.success {
            log::info!("No {} move solution after {:?}", limit, took);
            break;
        }
        log::info!("Shortened to {} in {:?}", next.message, took);
        best = next.moves;
    }

    let mut retry = timeout;
    while best.len() > TwoPhaseSolver::DEFAULT_MAX_LENGTH && retry < LONGEST_RETRY {
        retry = (retry * 2).min(LONGEST_RETRY);
        let (next, took) = pass(TwoPhaseSolver::DEFAULT_MAX_LENGTH, retry);
        if !next.moves.is_empty() && next.moves.len() < best.len() {
            log::info!("Shortened to {} in {:?}", next.message, took);
            best = next.moves;
        }
    }

    Ok(best)
}
