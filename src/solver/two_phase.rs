//! Kociemba's two-phase algorithm: reach the subgroup `<U, D, R2, F2, L2, B2>`, then solve inside
//! it, keeping the shortest total found.
//!
//! Up to six searches run side by side, one for each of the three axis orientations of the cube
//! and of its inverse. They share the best solution and stop together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use super::{lock, Cancellation, MoveStack, SolveResult, Solution, Solver};
use crate::prelude::*;

/// Phase-1 searches stop short of this many moves.
const PHASE1_LIMIT: u8 = 20;
/// The phase-2 distance table holds nothing further than this.
const PHASE2_LIMIT: usize = 11;

/// Symmetries that rotate the cube around the URF-DBL diagonal, possibly followed by a UD
/// preserving one. A cube fixed by any of them looks the same along all three axes.
const DIAGONAL_ROTATIONS: [usize; 4] = [16, 20, 24, 28];

pub struct TwoPhaseSolver<'t> {
    tables: &'t Tables,
    cancellation: Cancellation,
}

impl<'t> TwoPhaseSolver<'t> {
    pub const DEFAULT_MAX_LENGTH: usize = 20;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(tables: &'t Tables) -> TwoPhaseSolver<'t> {
        TwoPhaseSolver {
            tables,
            cancellation: Cancellation::new(),
        }
    }

    /// Also stops when `cancellation` is cancelled, returning the best solution so far.
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> TwoPhaseSolver<'t> {
        self.cancellation = cancellation;
        self
    }
}

/// The searches to run, numbered `3 * inverse + rotation`.
fn searches(cube: &CubieCube) -> Vec<usize> {
    let syms = cube_symmetries(cube);
    let rotated = syms.iter().any(|s| DIAGONAL_ROTATIONS.contains(s));
    let antisymmetric = syms.iter().any(|&s| s >= N_SYM);

    (0..6)
        .filter(|&i| !rotated || i % 3 == 0)
        .filter(|&i| !antisymmetric || i < 3)
        .collect()
}

impl Solver for TwoPhaseSolver<'_> {
    fn default_max_length(&self) -> usize {
        Self::DEFAULT_MAX_LENGTH
    }

    fn default_timeout(&self) -> Duration {
        Self::DEFAULT_TIMEOUT
    }

    fn solve(&self, cube: &CubieCube, max_length: usize, timeout: Duration) -> SolveResult {
        if let Err(e) = cube.verify() {
            return SolveResult::failure(e.to_string());
        }

        let shared = Shared {
            best: Mutex::new(None),
            shortest: AtomicUsize::new(usize::MAX),
            done: Cancellation::new(),
            caller: self.cancellation.clone(),
            max_length,
            start: Instant::now(),
            timeout,
        };

        std::thread::scope(|scope| {
            for i in searches(cube) {
                let shared = &shared;
                scope.spawn(move || Worker::new(self.tables, shared, cube, i).run());
            }
        });

        let elapsed = shared.start.elapsed();
        match shared.best.into_inner().unwrap_or_else(|p| p.into_inner()) {
            None => SolveResult::failure("No solution found"),
            Some(moves) if moves.len() > max_length => {
                log::info!(
                    "Best solution has {} moves after {:?}, wanted {}",
                    moves.len(),
                    elapsed,
                    max_length
                );
                SolveResult {
                    success: false,
                    message: format!("No solution within {} moves", max_length),
                    moves,
                }
            }
            Some(moves) => {
                log::debug!("Solved in {} moves, took {:?}", moves.len(), elapsed);
                SolveResult::solved(Solution {
                    moves,
                    optimal: false,
                })
            }
        }
    }
}

/// What the searches of one solve share.
struct Shared {
    best: Mutex<Option<Vec<Move>>>,
    shortest: AtomicUsize,
    done: Cancellation,
    caller: Cancellation,
    max_length: usize,
    start: Instant,
    timeout: Duration,
}

impl Shared {
    fn stopped(&self) -> bool {
        self.done.is_cancelled() || self.caller.is_cancelled()
    }

    fn shortest(&self) -> usize {
        self.shortest.load(Ordering::Relaxed)
    }

    /// Keeps `moves` if it beats every solution so far.
    fn offer(&self, moves: Vec<Move>) {
        let mut best = lock(&self.best);
        if moves.len() >= self.shortest() {
            return;
        }
        log::debug!("{} move solution: {}", moves.len(), Move::format_sequence(&moves));
        self.shortest.store(moves.len(), Ordering::Relaxed);
        if moves.len() <= self.max_length {
            self.done.cancel();
        }
        *best = Some(moves);
    }

    /// Only gives up once there is something to return.
    fn timed_out(&self) -> bool {
        self.shortest() != usize::MAX && self.start.elapsed() > self.timeout
    }
}

struct Worker<'a, 't> {
    tables: &'t Tables,
    shared: &'a Shared,
    /// Solutions found here are conjugated by symmetry `16 * rotation` to fit the input cube.
    rotation: usize,
    inverse: bool,
    start: PhaseCube<'t>,
    phase1: MoveStack,
    phase2: MoveStack,
    phase2_done: bool,
}

impl<'a, 't> Worker<'a, 't> {
    fn new(tables: &'t Tables, shared: &'a Shared, cube: &CubieCube, i: usize) -> Self {
        let rotation = i % 3;
        let inverse = i / 3 == 1;

        let mut cube = match rotation {
            0 => *cube,
            1 => conjugate(cube, SYM_URF3_INV),
            _ => conjugate(cube, SYM_URF3),
        };
        if inverse {
            cube = cube.inverse();
        }

        Worker {
            tables,
            shared,
            rotation,
            inverse,
            start: PhaseCube::new(tables, &cube),
            phase1: MoveStack::new(),
            phase2: MoveStack::new(),
            phase2_done: false,
        }
    }

    fn run(&mut self) {
        let dist = self.start.depth_phase1();
        let (flip, twist, slice_sorted) =
            (self.start.flip(), self.start.twist(), self.start.slice_sorted());
        for togo in dist..PHASE1_LIMIT {
            self.phase1.clear();
            self.search_phase1(flip, twist, slice_sorted, dist, togo);
            if self.shared.stopped() {
                break;
            }
        }
    }

    fn search_phase1(&mut self, flip: usize, twist: usize, slice_sorted: usize, dist: u8, togo: u8) {
        if self.shared.stopped() {
            return;
        }
        if togo == 0 {
            self.phase1_leaf(slice_sorted);
            return;
        }

        let tables = self.tables;
        let last = self.phase1.last().copied();
        for m in Move::all() {
            // Already in the subgroup: a phase-2 move here only repeats a shorter phase 1.
            if dist == 0 && togo < 5 && m.is_phase2() {
                continue;
            }
            if last.map_or(false, |prev| !m.could_follow(&prev)) {
                continue;
            }

            let i = m.index();
            let flip1 = tables.moves.flip(flip, i);
            let twist1 = tables.moves.twist(twist, i);
            let slice_sorted1 = tables.moves.slice_sorted(slice_sorted, i);
            let dist1 = distance(
                dist,
                phase1_mod3(tables, twist1, flip1, slice_sorted1 / N_PERM_4),
            );
            if dist1 >= togo {
                continue;
            }

            self.phase1.push(m);
            self.search_phase1(flip1, twist1, slice_sorted1, dist1, togo - 1);
            self.phase1.pop();
        }
    }

    fn phase1_leaf(&mut self, slice_sorted: usize) {
        let shared = self.shared;
        if shared.timed_out() {
            shared.done.cancel();
            return;
        }

        let tables = self.tables;
        let (moves, pruning) = (&tables.moves, &tables.pruning);
        let (mut corners, mut u_edges, mut d_edges) =
            (self.start.corners(), self.start.u_edges(), self.start.d_edges());
        for m in &self.phase1 {
            let i = m.index();
            corners = moves.corners(corners, i);
            u_edges = moves.u_edges(u_edges, i);
            d_edges = moves.d_edges(d_edges, i);
        }

        let limit = shared
            .shortest()
            .saturating_sub(self.phase1.len())
            .min(PHASE2_LIMIT) as u8;
        if pruning.cornslice_depth(corners, slice_sorted) >= limit {
            return;
        }

        let ud_edges = pruning.ud_edges(u_edges, d_edges);
        let dist = PhaseCube::depth_phase2(tables, corners, ud_edges);
        for togo in dist..limit {
            self.phase2.clear();
            self.phase2_done = false;
            self.search_phase2(corners, ud_edges, slice_sorted, dist, togo);
            if self.phase2_done || shared.stopped() {
                break;
            }
        }
    }

    fn search_phase2(
        &mut self,
        corners: usize,
        ud_edges: usize,
        slice_sorted: usize,
        dist: u8,
        togo: u8,
    ) {
        if self.shared.stopped() || self.phase2_done {
            return;
        }
        if togo == 0 && slice_sorted == 0 {
            self.store_solution();
            self.phase2_done = true;
            return;
        }

        let tables = self.tables;
        let first = self.phase2.is_empty();
        let last = self.phase2.last().or(self.phase1.last()).copied();
        for m in Move::PHASE2 {
            if let Some(prev) = last {
                // A quarter turn ending phase 1 may be followed by the half turn of its face.
                // The two are stored as one move.
                let merges = first && prev.face == m.face && !prev.is_phase2();
                if !merges && !m.could_follow(&prev) {
                    continue;
                }
            }

            let i = m.index();
            let corners1 = tables.moves.corners(corners, i);
            let ud_edges1 = tables.moves.ud_edges(ud_edges, i);
            let slice_sorted1 = tables.moves.slice_sorted(slice_sorted, i);
            let dist1 = distance(dist, phase2_mod3(tables, corners1, ud_edges1));
            let cornslice = tables.pruning.cornslice_depth(corners1, slice_sorted1);
            if dist1.max(cornslice) >= togo {
                continue;
            }

            self.phase2.push(m);
            self.search_phase2(corners1, ud_edges1, slice_sorted1, dist1, togo - 1);
            self.phase2.pop();
            if self.shared.stopped() || self.phase2_done {
                return;
            }
        }
    }

    fn store_solution(&self) {
        let mut moves: Vec<Move> = self.phase1.to_vec();
        let mut phase2 = self.phase2.iter().copied();
        if let (Some(last), Some(next)) = (moves.last_mut(), self.phase2.first()) {
            if last.face == next.face {
                // A quarter turn and a half turn of one face.
                *last = last.inverse();
                phase2.next();
            }
        }
        moves.extend(phase2);
        if self.inverse {
            moves = Move::invert_sequence(&moves);
        }
        for m in &mut moves {
            *m = Move::from_index(conj_move(16 * self.rotation, m.index()));
        }
        self.shared.offer(moves);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(cube: &CubieCube) -> SolveResult {
        TwoPhaseSolver::new(tables()).solve(cube, 20, Duration::from_secs(3))
    }

    fn solves(cube: &CubieCube, result: &SolveResult) -> bool {
        cube.apply_all(result.moves.iter().copied()).is_solved()
    }

    #[test]
    fn solved_cube_runs_one_search() {
        assert_eq!(searches(&CubieCube::solved()), vec![0]);
    }

    #[test]
    fn asymmetric_cube_runs_all_searches() {
        let cube = cube_with_moves("R U2 F' L D B2 R' U F2 D'");
        assert_eq!(searches(&cube), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn single_move() {
        let result = solve(&cube_with_moves("R"));
        assert!(result.success);
        assert_eq!(result.message, "R' (1f)");
    }

    #[test]
    fn single_move_every_time() {
        for _ in 0..20 {
            let result = solve(&cube_with_moves("R"));
            assert_eq!(result.message, "R' (1f)");
        }
    }

    #[test]
    fn quarter_turns_of_other_faces() {
        assert_eq!(solve(&cube_with_moves("F")).message, "F' (1f)");
        assert_eq!(solve(&cube_with_moves("B'")).message, "B (1f)");
        assert_eq!(solve(&cube_with_moves("L2")).message, "L2 (1f)");
    }

    #[test]
    fn half_turn_after_phase1_is_merged() {
        let shared = Shared {
            best: Mutex::new(None),
            shortest: AtomicUsize::new(usize::MAX),
            done: Cancellation::new(),
            caller: Cancellation::new(),
            max_length: 20,
            start: Instant::now(),
            timeout: Duration::from_secs(3),
        };
        let mut worker = Worker::new(tables(), &shared, &cube_with_moves("U R"), 0);
        worker.phase1.extend(Move::parse_sequence("R").unwrap());
        worker.phase2.extend(Move::parse_sequence("R2 U'").unwrap());
        worker.store_solution();
        let best = shared.best.into_inner().unwrap().unwrap();
        assert_eq!(Move::format_sequence(&best), "R' U'");
    }

    #[test]
    fn short_scramble() {
        let cube = cube_with_moves("F U' B2 L");
        let result = TwoPhaseSolver::new(tables()).solve(&cube, 4, Duration::from_secs(3));
        assert!(result.success, "{}", result.message);
        assert!(result.moves.len() <= 4, "{}", result.message);
        assert!(solves(&cube, &result));
    }

    #[test]
    fn random_cubes_within_twenty_moves() {
        let mut rng = rand::thread_rng();
        for _ in 0..5 {
            let cube = CubieCube::random(&mut rng);
            let result = solve(&cube);
            assert!(result.success, "{}", result.message);
            assert!(result.moves.len() <= 20);
            assert!(solves(&cube, &result));
        }
    }

    #[test]
    fn superflip() {
        let cube = cube_with_moves("U R2 F B R B2 R U2 L B2 R U' D' R2 F R' L B2 U2 F2");
        let result = solve(&cube);
        assert!(!result.moves.is_empty());
        assert!(solves(&cube, &result));
    }

    #[test]
    fn too_short_a_target_keeps_the_best_found() {
        let cube = cube_with_moves("R U2 F' L D B2 R' U F2 D' L2 B");
        let result = TwoPhaseSolver::new(tables()).solve(&cube, 3, Duration::from_millis(200));
        assert!(!result.success);
        assert_eq!(result.message, "No solution within 3 moves");
        assert!(!result.moves.is_empty());
        assert!(solves(&cube, &result));
    }

    #[test]
    fn cancelled_before_start() {
        let token = Cancellation::new();
        token.cancel();
        let result = TwoPhaseSolver::new(tables())
            .with_cancellation(token)
            .solve(&cube_with_moves("R U"), 20, Duration::from_secs(3));
        assert!(!result.success);
        assert_eq!(result.message, "No solution found");
    }
}
