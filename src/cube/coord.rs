//! Coordinate views of a cube: the numbers each solver searches over, advanced by table lookups
//! instead of cubie multiplication.

use crate::prelude::*;

/// A raw coordinate reduced by the symmetry class table it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymCoord {
    pub class: usize,
    pub sym: usize,
    pub rep: usize,
}

impl SymCoord {
    #[inline]
    pub fn of(classes: &ClassTable, raw: usize) -> SymCoord {
        let class = classes.class(raw);
        SymCoord {
            class,
            sym: classes.sym(raw),
            rep: classes.rep(class),
        }
    }
}

/// Counts the steps from `state` down to a state where `solved` holds, taking at each step a
/// neighbour whose distance mod 3 is one less. Gives up where no such neighbour exists.
fn walk_down<S: Copy>(
    mut state: S,
    moves: impl Iterator<Item = usize> + Clone,
    solved: impl Fn(&S) -> bool,
    mod3: impl Fn(&S) -> u8,
    step: impl Fn(&S, usize) -> S,
) -> u8 {
    let mut depth = 0;
    let mut current = mod3(&state);
    while !solved(&state) {
        if current == 0 {
            current = 3;
        }
        let wanted = current - 1;
        match moves
            .clone()
            .map(|m| step(&state, m))
            .find(|next| mod3(next) == wanted)
        {
            Some(next) => {
                state = next;
                current = wanted;
                depth += 1;
            }
            None => {
                log::warn!("Distance walk got stuck after {} steps", depth);
                break;
            }
        }
    }
    depth
}

fn phase2_moves() -> impl Iterator<Item = usize> + Clone {
    Move::PHASE2.into_iter().map(Move::index)
}

/// Phase-1 distance mod 3 of a (twist, flip, slice) state.
#[inline]
pub fn phase1_mod3(tables: &Tables, twist: usize, flip: usize, slice: usize) -> u8 {
    let fs = SymCoord::of(&tables.symmetry.flipslice, N_FLIP * slice + flip);
    tables
        .pruning
        .phase1_mod3(fs.class, tables.symmetry.twist_conj(twist, fs.sym))
}

/// Phase-2 distance mod 3 of a (corners, U/D edges) state.
#[inline]
pub fn phase2_mod3(tables: &Tables, corners: usize, ud_edges: usize) -> u8 {
    let co = SymCoord::of(&tables.symmetry.corners, corners);
    tables
        .pruning
        .phase2_mod3(co.class, tables.symmetry.ud_edges_conj(ud_edges, co.sym))
}

/// The coordinates the two-phase solver works with.
#[derive(Clone, Copy)]
pub struct PhaseCube<'t> {
    tables: &'t Tables,
    twist: usize,
    flip: usize,
    slice_sorted: usize,
    u_edges: usize,
    d_edges: usize,
    corners: usize,
    /// Only known while the slice edges sit in the slice.
    ud_edges: Option<usize>,
    flipslice: SymCoord,
    corner_class: SymCoord,
}

impl<'t> PhaseCube<'t> {
    pub fn new(tables: &'t Tables, cube: &CubieCube) -> PhaseCube<'t> {
        let mut view = PhaseCube {
            tables,
            twist: cube.twist() as usize,
            flip: cube.flip() as usize,
            slice_sorted: cube.slice_sorted() as usize,
            u_edges: cube.u_edges() as usize,
            d_edges: cube.d_edges() as usize,
            corners: cube.corners() as usize,
            ud_edges: cube.ud_edges().map(usize::from),
            flipslice: SymCoord::default(),
            corner_class: SymCoord::default(),
        };
        view.reclass();
        view
    }

    fn reclass(&mut self) {
        let symmetry = &self.tables.symmetry;
        self.flipslice = SymCoord::of(&symmetry.flipslice, N_FLIP * self.slice() + self.flip);
        self.corner_class = SymCoord::of(&symmetry.corners, self.corners);
    }

    fn move_common(&mut self, m: usize) {
        let moves = &self.tables.moves;
        self.twist = moves.twist(self.twist, m);
        self.flip = moves.flip(self.flip, m);
        self.slice_sorted = moves.slice_sorted(self.slice_sorted, m);
        self.u_edges = moves.u_edges(self.u_edges, m);
        self.d_edges = moves.d_edges(self.d_edges, m);
        self.corners = moves.corners(self.corners, m);
    }

    /// Any of the 18 moves. The U/D edge permutation is recovered from the U and D edges whenever
    /// the move lands in the phase-2 subgroup.
    pub fn phase1_move(&mut self, m: Move) {
        self.move_common(m.index());
        self.ud_edges = (self.slice_sorted < N_PERM_4)
            .then(|| self.tables.pruning.ud_edges(self.u_edges, self.d_edges));
        self.reclass();
    }

    /// One of the 10 moves that keep the cube in the phase-2 subgroup.
    pub fn phase2_move(&mut self, m: Move) {
        debug_assert!(m.is_phase2(), "{} leaves the phase-2 subgroup", m);
        let ud_edges = self
            .ud_edges
            .map(|ud| self.tables.moves.ud_edges(ud, m.index()));
        self.move_common(m.index());
        self.ud_edges = ud_edges;
        self.reclass();
    }

    pub fn twist(&self) -> usize {
        self.twist
    }

    pub fn flip(&self) -> usize {
        self.flip
    }

    pub fn slice_sorted(&self) -> usize {
        self.slice_sorted
    }

    pub fn slice(&self) -> usize {
        self.slice_sorted / N_PERM_4
    }

    pub fn u_edges(&self) -> usize {
        self.u_edges
    }

    pub fn d_edges(&self) -> usize {
        self.d_edges
    }

    pub fn corners(&self) -> usize {
        self.corners
    }

    pub fn ud_edges(&self) -> Option<usize> {
        self.ud_edges
    }

    pub fn flipslice(&self) -> SymCoord {
        self.flipslice
    }

    pub fn corner_class(&self) -> SymCoord {
        self.corner_class
    }

    pub fn is_phase2(&self) -> bool {
        self.twist == 0 && self.flip == 0 && self.slice_sorted < N_PERM_4
    }

    /// Exact number of moves to reach the phase-2 subgroup.
    pub fn depth_phase1(&self) -> u8 {
        let t = self.tables;
        walk_down(
            (self.twist, self.flip, self.slice()),
            0..N_MOVE,
            |&s| s == (0, 0, 0),
            |&(twist, flip, slice)| phase1_mod3(t, twist, flip, slice),
            |&(twist, flip, slice), m| {
                (
                    t.moves.twist(twist, m),
                    t.moves.flip(flip, m),
                    t.moves.slice(slice, m),
                )
            },
        )
    }

    /// Exact phase-2 distance of the corners and U/D edges, or 11 when it is further than the
    /// table reaches.
    pub fn depth_phase2(tables: &Tables, corners: usize, ud_edges: usize) -> u8 {
        if phase2_mod3(tables, corners, ud_edges) == UNVISITED {
            return 11;
        }
        walk_down(
            (corners, ud_edges),
            phase2_moves(),
            |&s| s == (0, 0),
            |&(corners, ud_edges)| phase2_mod3(tables, corners, ud_edges),
            |&(corners, ud_edges), m| {
                (
                    tables.moves.corners(corners, m),
                    tables.moves.ud_edges(ud_edges, m),
                )
            },
        )
    }
}

impl CubeLike for PhaseCube<'_> {
    fn apply(mut self, move_: Move) -> Self {
        self.phase1_move(move_);
        self
    }

    fn is_solved(&self) -> bool {
        self.twist == 0
            && self.flip == 0
            && self.slice_sorted == 0
            && self.corners == 0
            && self.ud_edges == Some(0)
    }
}

/// The axis views of an [`AxisCube`] are the cube conjugated by these symmetries.
const AXIS_SYM: [usize; 3] = [0, SYM_URF3, SYM_URF3_INV];

/// The optimal solver's coordinates as seen along one of the three face axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axis {
    pub twist: usize,
    pub flip: usize,
    pub slice_sorted: usize,
    pub tetra: usize,
    /// Exact (flip, slice_sorted, twist) distance.
    pub x24: u8,
    /// Exact (tetra, flip, slice, twist) distance.
    pub big: u8,
}

impl Axis {
    fn of(cube: &CubieCube) -> Axis {
        Axis {
            twist: cube.twist() as usize,
            flip: cube.flip() as usize,
            slice_sorted: cube.slice_sorted() as usize,
            tetra: cube.tetra() as usize,
            x24: 0,
            big: 0,
        }
    }

    fn x24_mod3(tables: &Tables, optimal: &OptimalTables, twist: usize, flip: usize, ss: usize) -> u8 {
        let fs = SymCoord::of(&optimal.flipslice_sorted, N_FLIP * ss + flip);
        optimal.phase1x24_mod3(fs.class, tables.symmetry.twist_conj(twist, fs.sym))
    }

    /// `(tetra, class, twist)` with tetra and twist conjugated into the (flip, slice) class.
    fn big_index(tables: &Tables, state: (usize, usize, usize, usize)) -> (usize, usize, usize) {
        let (twist, flip, ss, tetra) = state;
        let symmetry = &tables.symmetry;
        let fs = SymCoord::of(&symmetry.flipslice, N_FLIP * (ss / N_PERM_4) + flip);
        (
            symmetry.tetra_conj(tetra, fs.sym),
            fs.class,
            symmetry.twist_conj(twist, fs.sym),
        )
    }

    fn depth_x24(&self, tables: &Tables, optimal: &OptimalTables) -> u8 {
        let moves = &tables.moves;
        walk_down(
            (self.twist, self.flip, self.slice_sorted),
            0..N_MOVE,
            |&s| s == (0, 0, 0),
            |&(twist, flip, ss)| Axis::x24_mod3(tables, optimal, twist, flip, ss),
            |&(twist, flip, ss), m| {
                (
                    moves.twist(twist, m),
                    moves.flip(flip, m),
                    moves.slice_sorted(ss, m),
                )
            },
        )
    }

    fn depth_big(&self, tables: &Tables, optimal: &OptimalTables) -> u8 {
        let moves = &tables.moves;
        walk_down(
            (self.twist, self.flip, self.slice_sorted, self.tetra),
            0..N_MOVE,
            |&s| Axis::big_index(tables, s) == (0, 0, 0),
            |&s| {
                let (tetra, class, twist) = Axis::big_index(tables, s);
                optimal.ubig_mod3(tetra, class, twist)
            },
            |&(twist, flip, ss, tetra), m| {
                (
                    moves.twist(twist, m),
                    moves.flip(flip, m),
                    moves.slice_sorted(ss, m),
                    moves.tetra(tetra, m),
                )
            },
        )
    }
}

/// The coordinates the optimal solver works with, kept for the UD, RL and FB axes at once so that
/// each can give its own lower bound.
#[derive(Clone, Copy)]
pub struct AxisCube<'t> {
    tables: &'t Tables,
    optimal: &'t OptimalTables,
    corners: usize,
    corner_depth: u8,
    axes: [Axis; 3],
}

impl<'t> AxisCube<'t> {
    pub fn new(tables: &'t Tables, cube: &CubieCube) -> anyhow::Result<AxisCube<'t>> {
        let optimal = tables.optimal()?;
        let corners = cube.corners() as usize;

        let mut axes = AXIS_SYM.map(|s| Axis::of(&conjugate(cube, s)));
        for axis in &mut axes {
            axis.x24 = axis.depth_x24(tables, optimal);
            axis.big = axis.depth_big(tables, optimal);
        }

        Ok(AxisCube {
            tables,
            optimal,
            corners,
            corner_depth: optimal.corner_depth(corners),
            axes,
        })
    }

    pub fn corners(&self) -> usize {
        self.corners
    }

    pub fn corner_depth(&self) -> u8 {
        self.corner_depth
    }

    /// UD, RL, FB.
    pub fn axes(&self) -> &[Axis; 3] {
        &self.axes
    }

    /// The largest of the lower bounds this view keeps.
    pub fn lower_bound(&self) -> u8 {
        self.axes
            .iter()
            .flat_map(|a| [a.x24, a.big])
            .fold(self.corner_depth, u8::max)
    }

    /// The cube after move `m`, or `None` when some lower bound shows it can't be solved in
    /// fewer than `togo` moves.
    pub fn advance(&self, m: usize, togo: u8) -> Option<AxisCube<'t>> {
        let (moves, optimal) = (&self.tables.moves, self.optimal);

        let corners = moves.corners(self.corners, m);
        let corner_depth = optimal.corner_depth(corners);
        if corner_depth >= togo {
            return None;
        }

        let mut axes = self.axes;
        for (axis, &s) in axes.iter_mut().zip(&AXIS_SYM) {
            let m = conj_move(s, m);
            axis.twist = moves.twist(axis.twist, m);
            axis.flip = moves.flip(axis.flip, m);
            axis.slice_sorted = moves.slice_sorted(axis.slice_sorted, m);
            let mod3 = Axis::x24_mod3(self.tables, optimal, axis.twist, axis.flip, axis.slice_sorted);
            axis.x24 = distance(axis.x24, mod3);
        }
        if too_far(axes.map(|a| a.x24), togo) {
            return None;
        }

        for (axis, &s) in axes.iter_mut().zip(&AXIS_SYM) {
            axis.tetra = moves.tetra(axis.tetra, conj_move(s, m));
            let (tetra, class, twist) = Axis::big_index(
                self.tables,
                (axis.twist, axis.flip, axis.slice_sorted, axis.tetra),
            );
            axis.big = distance(axis.big, optimal.ubig_mod3(tetra, class, twist));
        }
        if too_far(axes.map(|a| a.big), togo) {
            return None;
        }

        Some(AxisCube {
            corners,
            corner_depth,
            axes,
            ..*self
        })
    }
}

/// Whether one lower bound per axis rules out finishing in fewer than `togo` moves.
fn too_far(depths: [u8; 3], togo: u8) -> bool {
    depths.iter().any(|&d| d >= togo) || all_equal_and_short(depths, togo)
}

/// Three equal nonzero axis distances can't all be met by the same final moves, so one more move
/// is needed.
fn all_equal_and_short([ud, rl, fb]: [u8; 3], togo: u8) -> bool {
    ud != 0 && ud == rl && rl == fb && ud + 1 >= togo
}

impl CubeLike for AxisCube<'_> {
    fn apply(self, move_: Move) -> Self {
        // Nothing is pruned against an unbounded depth.
        self.advance(move_.index(), u8::MAX).unwrap_or(self)
    }

    fn is_solved(&self) -> bool {
        self.corners == 0
            && self
                .axes
                .iter()
                .all(|a| a.twist == 0 && a.flip == 0 && a.slice_sorted == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    mod phase_cube {
        use super::*;

        fn view(moves: &str) -> PhaseCube<'static> {
            PhaseCube::new(tables(), &cube_with_moves(moves))
        }

        #[test]
        fn solved() {
            let cube = view("");
            assert!(cube.is_solved());
            assert!(cube.is_phase2());
            assert_eq!(cube.depth_phase1(), 0);
            assert_eq!(cube.flipslice().class, 0);
            assert_eq!(cube.corner_class().class, 0);
        }

        #[test]
        fn single_quarter_turn() {
            let cube = view("R");
            assert!(!cube.is_solved());
            assert!(!cube.is_phase2());
            assert_eq!(cube.depth_phase1(), 1);
            assert_eq!(cube.ud_edges(), None);
        }

        #[test]
        fn phase2_moves_keep_phase1_solved() {
            let cube = view("R2 U D' F2 L2 B2");
            assert!(cube.is_phase2());
            assert_eq!(cube.depth_phase1(), 0);
        }

        #[test]
        fn half_turn_is_one_phase2_move() {
            let cube = view("R2");
            let ud_edges = cube.ud_edges().unwrap();
            assert_eq!(PhaseCube::depth_phase2(tables(), cube.corners(), ud_edges), 1);
            assert_eq!(PhaseCube::depth_phase2(tables(), 0, 0), 0);
        }

        #[quickcheck]
        fn phase1_depth_is_a_lower_bound(moves: Vec<Move>) -> bool {
            let cube = PhaseCube::new(tables(), &CubieCube::from_moves(&moves));
            cube.depth_phase1() as usize <= moves.len()
        }

        #[quickcheck]
        fn phase2_depth_is_a_lower_bound(moves: Vec<Move>) -> bool {
            let phase2: Vec<Move> = moves.into_iter().filter(|m| m.is_phase2()).collect();
            let cube = PhaseCube::new(tables(), &CubieCube::from_moves(&phase2));
            let depth = PhaseCube::depth_phase2(tables(), cube.corners(), cube.ud_edges().unwrap());
            depth as usize <= phase2.len()
        }

        #[quickcheck]
        fn moves_track_cubie_coordinates(start: Vec<Move>, moves: Vec<Move>) -> bool {
            let cube = CubieCube::from_moves(&start);
            let moved = PhaseCube::new(tables(), &cube).apply_all(moves.iter().copied());
            let expected = PhaseCube::new(tables(), &cube.apply_all(moves));

            moved.twist() == expected.twist()
                && moved.flip() == expected.flip()
                && moved.slice_sorted() == expected.slice_sorted()
                && moved.u_edges() == expected.u_edges()
                && moved.d_edges() == expected.d_edges()
                && moved.corners() == expected.corners()
                && moved.ud_edges() == expected.ud_edges()
                && moved.flipslice() == expected.flipslice()
                && moved.corner_class() == expected.corner_class()
        }

        #[quickcheck]
        fn phase2_moves_track_ud_edges(moves: Vec<Move>) -> bool {
            let phase2: Vec<Move> = moves.into_iter().filter(|m| m.is_phase2()).collect();
            let mut cube = view("");
            for &m in &phase2 {
                cube.phase2_move(m);
            }
            cube.ud_edges() == CubieCube::from_moves(&phase2).ud_edges().map(usize::from)
        }

        #[quickcheck]
        fn solved_after_inverse(moves: Vec<Move>) -> bool {
            let cube = CubieCube::from_moves(&moves);
            PhaseCube::new(tables(), &cube)
                .apply_all(Move::invert_sequence(&moves))
                .is_solved()
        }
    }

    mod axis_cube {
        use super::*;

        #[test]
        fn needs_full_tables() {
            assert!(AxisCube::new(tables(), &CubieCube::solved()).is_err());
        }

        #[test]
        fn equal_axis_distances() {
            assert!(all_equal_and_short([3, 3, 3], 4));
            assert!(!all_equal_and_short([3, 3, 3], 5));
            assert!(!all_equal_and_short([3, 2, 3], 4));
            assert!(!all_equal_and_short([0, 0, 0], 1));
        }

        #[test]
        fn pruning_by_axis_distances() {
            assert!(!too_far([0, 0, 0], 1));
            assert!(too_far([0, 4, 1], 4));
            assert!(!too_far([3, 1, 2], 4));
            // Equal on all three axes costs one more move.
            assert!(too_far([3, 3, 3], 4));
            assert!(!too_far([3, 3, 3], 5));
            assert!(!too_far([3, 3, 2], 4));
        }

        #[test]
        #[ignore = "builds the multi-gigabyte optimal tables"]
        fn solved() {
            let cube = AxisCube::new(full_tables(), &CubieCube::solved()).unwrap();
            assert!(cube.is_solved());
            assert_eq!(cube.lower_bound(), 0);
        }

        #[test]
        #[ignore = "builds the multi-gigabyte optimal tables"]
        fn axis_moves_track_cubie_coordinates() {
            let scramble = Move::parse_sequence("R U2 F' L D B2 R' U F2").unwrap();
            let cube = CubieCube::from_moves(&scramble);
            let moved = AxisCube::new(full_tables(), &CubieCube::solved())
                .unwrap()
                .apply_all(scramble.iter().copied());
            let expected = AxisCube::new(full_tables(), &cube).unwrap();

            assert_eq!(moved.corners(), expected.corners());
            assert_eq!(moved.axes(), expected.axes());
            assert!(expected.lower_bound() as usize <= scramble.len());
            assert!(moved.apply_all(Move::invert_sequence(&scramble)).is_solved());
        }
    }
}
