//! Iterative deepening A* over [`AxisCube`], pruned by the corner, phase-1×24 and tetra-aware
//! distances along all three axes.
//!
//! Past [`SPLIT_DEPTH`] the first moves of each round are expanded up front into jobs, which a
//! worker per core then drains.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use super::{lock, Cancellation, MoveStack, SolveResult, Solution, Solver};
use crate::prelude::*;

/// Rounds deeper than this are split into jobs this many moves in.
pub const SPLIT_DEPTH: u8 = 4;

/// Rounds deeper than this log their progress.
const LOG_DEPTH: u8 = 13;

pub struct OptimalSolver<'t> {
    tables: &'t Tables,
}

impl<'t> OptimalSolver<'t> {
    pub const DEFAULT_MAX_LENGTH: usize = 100;

    pub fn new(tables: &'t Tables) -> OptimalSolver<'t> {
        OptimalSolver { tables }
    }
}

impl Solver for OptimalSolver<'_> {
    fn default_max_length(&self) -> usize {
        Self::DEFAULT_MAX_LENGTH
    }

    /// The search always runs to completion, so this is never consulted.
    fn default_timeout(&self) -> Duration {
        Duration::MAX
    }

    /// Finds a shortest solution of fewer than `max_length` moves. `timeout` is ignored.
    fn solve(&self, cube: &CubieCube, max_length: usize, _timeout: Duration) -> SolveResult {
        if let Err(e) = cube.verify() {
            return SolveResult::failure(e.to_string());
        }
        let start = match AxisCube::new(self.tables, cube) {
            Ok(start) => start,
            Err(e) => return SolveResult::failure(e.to_string()),
        };

        let search = Search::default();
        let limit = max_length.min(u8::MAX as usize) as u8;
        let began = Instant::now();
        let mut total_nodes = 0;
        let mut togo = start.lower_bound();

        while !search.found.is_cancelled() && togo < limit {
            let round = Instant::now();
            search.round(start, togo, SPLIT_DEPTH);

            let nodes = search.nodes.swap(0, Ordering::Relaxed);
            total_nodes += nodes;
            if togo > LOG_DEPTH {
                let elapsed = round.elapsed();
                log::info!(
                    "Depth {} done in {:?}, {} nodes, {:.0} nodes/s",
                    togo,
                    elapsed,
                    nodes,
                    nodes as f64 / elapsed.as_secs_f64().max(1e-4)
                );
            }
            togo += 1;
        }
        log::debug!("Optimal search took {:?}, {} nodes", began.elapsed(), total_nodes);

        match search.solution.into_inner().unwrap_or_else(|p| p.into_inner()) {
            Some(moves) => SolveResult::solved(Solution {
                moves,
                optimal: true,
            }),
            None => SolveResult::failure(format!(
                "Proved Optimal (no solution within {} moves)",
                max_length.saturating_sub(1)
            )),
        }
    }
}

/// A position the search can expand.
trait Node: Copy + Send + Sync {
    /// The position after move `m`, or `None` if it can't be solved within `togo - 1` more moves.
    fn advance(&self, m: usize, togo: u8) -> Option<Self>;

    fn is_solved(&self) -> bool;
}

impl Node for AxisCube<'_> {
    fn advance(&self, m: usize, togo: u8) -> Option<Self> {
        AxisCube::advance(self, m, togo)
    }

    fn is_solved(&self) -> bool {
        CubeLike::is_solved(self)
    }
}

/// A search position to finish on a worker.
struct Job<N> {
    cube: N,
    togo: u8,
    path: MoveStack,
}

#[derive(Default)]
struct Search {
    found: Cancellation,
    nodes: AtomicU64,
    solution: Mutex<Option<Vec<Move>>>,
}

impl Search {
    /// Looks for a solution of exactly `togo` moves, handing out jobs `split_depth` moves in when
    /// `togo` is deeper than that.
    fn round<N: Node>(&self, start: N, togo: u8, split_depth: u8) {
        if togo <= split_depth {
            self.run(start, togo, &mut MoveStack::new());
        } else {
            let mut jobs = Vec::new();
            self.split(start, togo, &mut MoveStack::new(), split_depth, &mut jobs);
            self.drain(&jobs);
        }
    }

    /// The children of `cube` that survive pruning with `togo` moves left.
    fn children<'a, N: Node + 'a>(
        &'a self,
        cube: N,
        togo: u8,
        last: Option<Move>,
    ) -> impl Iterator<Item = (Move, N)> + 'a {
        Move::all()
            .filter(move |m| last.map_or(true, |prev| m.could_follow(&prev)))
            .filter_map(move |m| {
                self.nodes.fetch_add(1, Ordering::Relaxed);
                cube.advance(m.index(), togo).map(|child| (m, child))
            })
    }

    fn run<N: Node>(&self, cube: N, togo: u8, path: &mut MoveStack) {
        if self.found.is_cancelled() {
            return;
        }
        if togo == 0 {
            if cube.is_solved() {
                let mut solution = lock(&self.solution);
                if solution.is_none() {
                    *solution = Some(path.to_vec());
                }
                self.found.cancel();
            }
            return;
        }

        for (m, child) in self.children(cube, togo, path.last().copied()) {
            path.push(m);
            self.run(child, togo - 1, path);
            path.pop();
            if self.found.is_cancelled() {
                return;
            }
        }
    }

    /// Like [`Search::run`], but stops `depth` moves in and queues the positions reached.
    fn split<N: Node>(
        &self,
        cube: N,
        togo: u8,
        path: &mut MoveStack,
        depth: u8,
        jobs: &mut Vec<Job<N>>,
    ) {
        if self.found.is_cancelled() {
            return;
        }
        if togo == 0 || depth == 0 {
            if togo == 0 {
                self.run(cube, togo, path);
            } else {
                jobs.push(Job {
                    cube,
                    togo,
                    path: path.clone(),
                });
            }
            return;
        }

        for (m, child) in self.children(cube, togo, path.last().copied()) {
            path.push(m);
            self.split(child, togo - 1, path, depth - 1, jobs);
            path.pop();
            if self.found.is_cancelled() {
                return;
            }
        }
    }

    fn drain<N: Node>(&self, jobs: &[Job<N>]) {
        let next = AtomicUsize::new(0);
        let workers = std::thread::available_parallelism()
            .map_or(1, NonZeroUsize::get)
            .min(jobs.len());

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    let mut path = MoveStack::new();
                    while !self.found.is_cancelled() {
                        let Some(job) = jobs.get(next.fetch_add(1, Ordering::Relaxed)) else {
                            break;
                        };
                        path.clone_from(&job.path);
                        self.run(job.cube, job.togo, &mut path);
                    }
                });
            }
        });
    }
}
