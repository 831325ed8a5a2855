//! Distance tables built by breadth-first search over symmetry-reduced coordinate spaces.
//!
//! Most tables only store each distance mod 3. A search always knows the depth of the node it
//! came from, and a neighbour is one step away, so [`distance`] recovers the exact value.

use rayon::prelude::*;

use crate::prelude::*;
use crate::tables::moves::MoveTables;
use crate::tables::packed::{
    entries_equal, Layered2, Packed2, TritTable, BYTES_PER_TETRA, UNVISITED,
};
use crate::tables::persist::{populating, Store};
use crate::tables::symmetry::{ClassKind, ClassTable, SymmetryTables};

const fn distance_table() -> [u8; 60] {
    let mut dist = [0; 60];
    let mut i = 0;
    while i < 20 {
        let mut j = 0;
        while j < 3 {
            let base: usize = (i / 3) * 3 + j;
            let depth = if i % 3 == 2 && j == 0 {
                base + 3
            } else if i % 3 == 0 && j == 2 {
                base.saturating_sub(3)
            } else {
                base
            };
            dist[3 * i + j] = depth as u8;
            j += 1;
        }
        i += 1;
    }
    dist
}

const DISTANCE: [u8; 60] = distance_table();

/// The exact distance of a neighbour of a node at `depth`, given the neighbour's distance mod 3.
#[inline]
pub fn distance(depth: u8, mod3: u8) -> u8 {
    DISTANCE[3 * depth as usize + mod3 as usize]
}

/// A coordinate space split into symmetry classes, each holding `sub_len` entries. Entry
/// `class * sub_len + sub` is the distance of the reduced state `(class, sub)`.
trait ReducedGraph: Sync {
    fn classes(&self) -> usize;

    fn sub_len(&self) -> usize;

    fn moves(&self) -> &[usize];

    /// The reduced state one move away.
    fn neighbour(&self, class: usize, sub: usize, m: usize) -> (usize, usize);

    /// Bit `s` set when symmetry `s` maps the class representative onto itself.
    fn self_symmetries(&self, class: usize) -> u16;

    /// The state `(class, sub)` conjugated by a self-symmetry of its class.
    fn conjugate(&self, class: usize, sub: usize, s: usize) -> (usize, usize);
}

struct Search {
    /// Switch from expanding the frontier to scanning unvisited entries at this depth.
    backward_from: Option<u8>,
    /// Leave entries further than this unvisited.
    max_depth: Option<u8>,
    /// Number of equally long layers the storage is split into.
    layers: usize,
}

fn breadth_first(name: &str, graph: &impl ReducedGraph, search: Search) -> Layered2 {
    let sub_len = graph.sub_len();
    let total = graph.classes() * sub_len;
    let mut table = Layered2::unvisited(search.layers, total / search.layers);
    table.set(0, 0);
    let mut done = 1;
    let mut depth = 0u8;

    while done < total && search.max_depth.map_or(true, |max| depth < max) {
        let backward = search.backward_from.map_or(false, |from| depth >= from);
        let current = depth % 3;
        let next = (depth + 1) % 3;
        let wanted = if backward { UNVISITED } else { current };
        let done_before = done;

        for class in 0..graph.classes() {
            let mut sub = 0;
            while sub < sub_len {
                let idx = class * sub_len + sub;
                if sub + 16 <= sub_len {
                    if let Some(word) = table.word_at(idx) {
                        if entries_equal(word, wanted) == 0 {
                            sub += 16;
                            continue;
                        }
                    }
                }

                if table.get(idx) == wanted {
                    for &m in graph.moves() {
                        let (class1, sub1) = graph.neighbour(class, sub, m);
                        let idx1 = class1 * sub_len + sub1;
                        if backward {
                            if table.get(idx1) == current {
                                table.set(idx, next);
                                done += 1 + fill_symmetric(graph, &mut table, class, sub, next);
                                break;
                            }
                        } else if table.get(idx1) == UNVISITED {
                            table.set(idx1, next);
                            done += 1 + fill_symmetric(graph, &mut table, class1, sub1, next);
                        }
                    }
                }
                sub += 1;
            }
        }

        depth += 1;
        log::debug!(
            "{} depth {}{}: {}/{}",
            name,
            depth,
            if backward { " (backward)" } else { "" },
            done,
            total
        );
        if done == done_before {
            break;
        }
    }
    table
}

fn fill_symmetric(
    graph: &impl ReducedGraph,
    table: &mut Layered2,
    class: usize,
    sub: usize,
    value: u8,
) -> usize {
    let mut filled = 0;
    let mut mask = graph.self_symmetries(class) >> 1;
    let mut s = 1;
    while mask != 0 {
        if mask & 1 != 0 {
            let (class2, sub2) = graph.conjugate(class, sub, s);
            let idx2 = class2 * graph.sub_len() + sub2;
            if table.get(idx2) == UNVISITED {
                table.set(idx2, value);
                filled += 1;
            }
        }
        mask >>= 1;
        s += 1;
    }
    filled
}

fn single_layer(table: Layered2) -> Packed2 {
    table
        .into_layers()
        .pop()
        .unwrap_or_else(|| Packed2::unvisited(0))
}

const ALL_MOVES: [usize; N_MOVE] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17];
const PHASE2_MOVES: [usize; N_PHASE2_MOVE] = [0, 1, 2, 4, 7, 9, 10, 11, 13, 16];

/// (flip, slice) classes by twist, or (flip, slice_sorted) classes by twist.
struct FlipSliceTwist<'t> {
    moves: &'t MoveTables,
    symmetry: &'t SymmetryTables,
    classes: &'t ClassTable,
    sorted: bool,
    masks: Vec<u16>,
}

impl<'t> FlipSliceTwist<'t> {
    fn new(moves: &'t MoveTables, symmetry: &'t SymmetryTables, classes: &'t ClassTable) -> Self {
        FlipSliceTwist {
            moves,
            symmetry,
            classes,
            sorted: classes.kind() == ClassKind::FlipSliceSorted,
            masks: classes.self_symmetries(),
        }
    }

    /// The raw (flip, slice) coordinate one move away from class representative `rep`.
    #[inline]
    fn step_flipslice(&self, rep: usize, m: usize) -> usize {
        let flip = self.moves.flip(rep % N_FLIP, m);
        let slice = if self.sorted {
            self.moves.slice_sorted(rep / N_FLIP, m)
        } else {
            self.moves.slice(rep / N_FLIP, m)
        };
        N_FLIP * slice + flip
    }
}

impl ReducedGraph for FlipSliceTwist<'_> {
    fn classes(&self) -> usize {
        self.classes.len()
    }

    fn sub_len(&self) -> usize {
        N_TWIST
    }

    fn moves(&self) -> &[usize] {
        &ALL_MOVES
    }

    fn neighbour(&self, class: usize, twist: usize, m: usize) -> (usize, usize) {
        let flipslice = self.step_flipslice(self.classes.rep(class), m);
        let twist = self.moves.twist(twist, m);
        (
            self.classes.class(flipslice),
            self.symmetry.twist_conj(twist, self.classes.sym(flipslice)),
        )
    }

    fn self_symmetries(&self, class: usize) -> u16 {
        self.masks[class]
    }

    fn conjugate(&self, class: usize, twist: usize, s: usize) -> (usize, usize) {
        (class, self.symmetry.twist_conj(twist, s))
    }
}

/// Corner classes by U/D edge permutation, phase-2 moves only.
struct CornersUdEdges<'t> {
    moves: &'t MoveTables,
    symmetry: &'t SymmetryTables,
    masks: Vec<u16>,
}

impl ReducedGraph for CornersUdEdges<'_> {
    fn classes(&self) -> usize {
        N_CORNERS_CLASS
    }

    fn sub_len(&self) -> usize {
        N_UD_EDGES
    }

    fn moves(&self) -> &[usize] {
        &PHASE2_MOVES
    }

    fn neighbour(&self, class: usize, ud_edges: usize, m: usize) -> (usize, usize) {
        let classes = &self.symmetry.corners;
        let corners = self.moves.corners(classes.rep(class), m);
        let ud_edges = self.moves.ud_edges(ud_edges, m);
        (
            classes.class(corners),
            self.symmetry.ud_edges_conj(ud_edges, classes.sym(corners)),
        )
    }

    fn self_symmetries(&self, class: usize) -> u16 {
        self.masks[class]
    }

    fn conjugate(&self, class: usize, ud_edges: usize, s: usize) -> (usize, usize) {
        (class, self.symmetry.ud_edges_conj(ud_edges, s))
    }
}

/// (flip, slice) classes by twist, one layer per tetra value. The class of layer `tetra` is
/// numbered `tetra * N_FLIPSLICE_CLASS + flipslice_class`.
struct TetraFlipSliceTwist<'t> {
    inner: FlipSliceTwist<'t>,
}

impl ReducedGraph for TetraFlipSliceTwist<'_> {
    fn classes(&self) -> usize {
        N_TETRA * N_FLIPSLICE_CLASS
    }

    fn sub_len(&self) -> usize {
        N_TWIST
    }

    fn moves(&self) -> &[usize] {
        &ALL_MOVES
    }

    fn neighbour(&self, class: usize, twist: usize, m: usize) -> (usize, usize) {
        let (tetra, class) = (class / N_FLIPSLICE_CLASS, class % N_FLIPSLICE_CLASS);
        let inner = &self.inner;
        let flipslice = inner.step_flipslice(inner.classes.rep(class), m);
        let sym = inner.classes.sym(flipslice);
        let tetra = inner.symmetry.tetra_conj(inner.moves.tetra(tetra, m), sym);
        (
            tetra * N_FLIPSLICE_CLASS + inner.classes.class(flipslice),
            inner.symmetry.twist_conj(inner.moves.twist(twist, m), sym),
        )
    }

    fn self_symmetries(&self, class: usize) -> u16 {
        self.inner.masks[class % N_FLIPSLICE_CLASS]
    }

    fn conjugate(&self, class: usize, twist: usize, s: usize) -> (usize, usize) {
        let (tetra, class) = (class / N_FLIPSLICE_CLASS, class % N_FLIPSLICE_CLASS);
        (
            self.inner.symmetry.tetra_conj(tetra, s) * N_FLIPSLICE_CLASS + class,
            self.inner.symmetry.twist_conj(twist, s),
        )
    }
}

/// Exact distances over a small space without symmetry reduction.
fn exact_depths(len: usize, moves: &[usize], step: impl Fn(usize, usize) -> usize) -> Vec<u8> {
    let mut depths = vec![u8::MAX; len];
    depths[0] = 0;
    let mut done = 1;
    let mut depth = 0;
    while done < len {
        let mut progress = false;
        for i in 0..len {
            if depths[i] != depth {
                continue;
            }
            for &m in moves {
                let j = step(i, m);
                if depths[j] == u8::MAX {
                    depths[j] = depth + 1;
                    done += 1;
                    progress = true;
                }
            }
        }
        if !progress {
            break;
        }
        depth += 1;
    }
    depths
}

fn load_or_build_packed(
    store: &Store,
    name: &str,
    len: usize,
    build: impl FnOnce() -> Packed2,
) -> anyhow::Result<Packed2> {
    let words = store.load_or_build(name, Packed2::words_for(len), || build().into_words())?;
    Packed2::from_words(words, len)
}

/// The tables the two-phase solver prunes with.
#[derive(Debug, Clone)]
pub struct PruningTables {
    phase1: Packed2,
    phase2: Packed2,
    cornslice: Vec<u8>,
    edge_merge: Vec<u16>,
}

impl PruningTables {
    pub fn load_or_build(
        store: &Store,
        moves: &MoveTables,
        symmetry: &SymmetryTables,
    ) -> anyhow::Result<PruningTables> {
        let phase1 = load_or_build_packed(store, "phase1_prun", N_FLIPSLICE_CLASS * N_TWIST, || {
            let graph = FlipSliceTwist::new(moves, symmetry, &symmetry.flipslice);
            let search = Search {
                backward_from: Some(9),
                max_depth: None,
                layers: 1,
            };
            single_layer(breadth_first("phase1_prun", &graph, search))
        })?;

        let phase2 = load_or_build_packed(store, "phase2_prun", N_CORNERS_CLASS * N_UD_EDGES, || {
            let graph = CornersUdEdges {
                moves,
                symmetry,
                masks: symmetry.corners.self_symmetries(),
            };
            let search = Search {
                backward_from: None,
                max_depth: Some(10),
                layers: 1,
            };
            single_layer(breadth_first("phase2_prun", &graph, search))
        })?;

        let cornslice = store.load_or_build("phase2_cornsliceprun", N_CORNERS * N_PERM_4, || {
            exact_depths(N_CORNERS * N_PERM_4, &PHASE2_MOVES, |i, m| {
                N_PERM_4 * moves.corners(i / N_PERM_4, m) + moves.slice_sorted(i % N_PERM_4, m)
            })
        })?;

        let edge_merge = store.load_or_build(
            "phase2_edgemerge",
            N_U_EDGES_PHASE2 * N_PERM_4,
            build_edge_merge,
        )?;

        Ok(PruningTables {
            phase1,
            phase2,
            cornslice,
            edge_merge,
        })
    }

    /// Phase-1 distance mod 3 of a (flip, slice) class and the twist conjugated into it.
    #[inline]
    pub fn phase1_mod3(&self, class: usize, twist: usize) -> u8 {
        self.phase1.get(N_TWIST * class + twist)
    }

    /// Phase-2 distance mod 3 of a corner class and the U/D edges conjugated into it. Distances
    /// past 10 read as unvisited.
    #[inline]
    pub fn phase2_mod3(&self, class: usize, ud_edges: usize) -> u8 {
        self.phase2.get(N_UD_EDGES * class + ud_edges)
    }

    /// Exact phase-2 distance of the corners and slice edges alone.
    #[inline]
    pub fn cornslice_depth(&self, corners: usize, slice_sorted: usize) -> u8 {
        self.cornslice[N_PERM_4 * corners + slice_sorted]
    }

    /// The U/D edge permutation in phase 2, from the U and D edge coordinates.
    #[inline]
    pub fn ud_edges(&self, u_edges: usize, d_edges: usize) -> usize {
        self.edge_merge[N_PERM_4 * u_edges + d_edges % N_PERM_4] as usize
    }
}

/// Entry `24 * u_edges + d_edges % 24`. Only the D edge set that complements `u_edges` is
/// possible in phase 2, so the order of the D edges is all that's left to index.
fn build_edge_merge() -> Vec<u16> {
    let mut table = vec![0u16; N_U_EDGES_PHASE2 * N_PERM_4];
    table
        .par_chunks_mut(N_PERM_4)
        .enumerate()
        .for_each(|(u_edges, row)| {
            let u_edges = u_edges as u16;
            let Some(set) = (0..N_TETRA as u16)
                .find(|&set| merge_ud_edges(u_edges, N_PERM_4 as u16 * set).is_some())
            else {
                return;
            };
            for (order, entry) in row.iter_mut().enumerate() {
                *entry = merge_ud_edges(u_edges, N_PERM_4 as u16 * set + order as u16)
                    .unwrap_or(0);
            }
        });
    table
}

/// The larger tables the optimal solver prunes with.
#[derive(Debug, Clone)]
pub struct OptimalTables {
    pub flipslice_sorted: ClassTable,
    corner_depth: Vec<u8>,
    phase1x24: Packed2,
    ubig: TritTable,
}

impl OptimalTables {
    pub fn load_or_build(
        store: &Store,
        moves: &MoveTables,
        symmetry: &SymmetryTables,
    ) -> anyhow::Result<OptimalTables> {
        let flipslice_sorted = ClassTable::load_or_build(store, ClassKind::FlipSliceSorted)?;

        let corner_depth = store.load_or_build("cornerprun", N_CORNERS, || {
            exact_depths(N_CORNERS, &ALL_MOVES, |c, m| moves.corners(c, m))
        })?;

        let phase1x24 = load_or_build_packed(
            store,
            "phase1x24_prun",
            N_FLIPSLICESORTED_CLASS * N_TWIST,
            || {
                let graph = FlipSliceTwist::new(moves, symmetry, &flipslice_sorted);
                let search = Search {
                    backward_from: Some(10),
                    max_depth: None,
                    layers: 1,
                };
                single_layer(breadth_first("phase1x24_prun", &graph, search))
            },
        )?;

        let ubig = load_or_build_ubig(store, moves, symmetry)?;

        Ok(OptimalTables {
            flipslice_sorted,
            corner_depth,
            phase1x24,
            ubig,
        })
    }

    /// Exact number of moves needed to solve the corner permutation.
    #[inline]
    pub fn corner_depth(&self, corners: usize) -> u8 {
        self.corner_depth[corners]
    }

    #[inline]
    pub fn phase1x24_mod3(&self, class: usize, twist: usize) -> u8 {
        self.phase1x24.get(N_TWIST * class + twist)
    }

    #[inline]
    pub fn ubig_mod3(&self, tetra: usize, class: usize, twist: usize) -> u8 {
        self.ubig.get(tetra, N_TWIST * class + twist)
    }
}

const UBIG: &str = "ubigPF";

/// Built one tetra layer at a time into 2-bit storage, then packed and written layer by layer.
fn load_or_build_ubig(
    store: &Store,
    moves: &MoveTables,
    symmetry: &SymmetryTables,
) -> anyhow::Result<TritTable> {
    if let Some(bytes) = store.load(UBIG, TritTable::LEN)? {
        return TritTable::from_bytes(bytes);
    }

    let layers = populating(UBIG, || {
        let graph = TetraFlipSliceTwist {
            inner: FlipSliceTwist::new(moves, symmetry, &symmetry.flipslice),
        };
        let search = Search {
            backward_from: Some(10),
            max_depth: None,
            layers: N_TETRA,
        };
        breadth_first(UBIG, &graph, search).into_layers()
    });

    let mut writer = store.writer::<u8>(UBIG, TritTable::LEN)?;
    let mut packed = Vec::new();
    let mut layer_bytes = Vec::with_capacity(BYTES_PER_TETRA);
    for layer in layers {
        TritTable::pack_layer(&layer, &mut layer_bytes);
        drop(layer);
        match writer.as_mut() {
            Some(writer) => writer.write(&layer_bytes)?,
            None => packed.extend_from_slice(&layer_bytes),
        }
    }

    match writer {
        Some(writer) => {
            writer.finish()?;
            let bytes = store
                .load(UBIG, TritTable::LEN)?
                .ok_or_else(|| anyhow::anyhow!("{} vanished after being written", UBIG))?;
            TritTable::from_bytes(bytes)
        }
        None => TritTable::from_bytes(packed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn pruning() -> &'static PruningTables {
        &tables().pruning
    }

    #[test]
    fn distance_steps_by_one() {
        for depth in 1..19u8 {
            for next in [depth - 1, depth, depth + 1] {
                assert_eq!(distance(depth, next % 3), next, "from {} to {}", depth, next);
            }
        }
        assert_eq!(distance(0, 0), 0);
        assert_eq!(distance(0, 1), 1);
    }

    #[test]
    fn exact_depths_of_corners() {
        let moves = &tables().moves;
        let depths = exact_depths(N_CORNERS, &ALL_MOVES, |c, m| moves.corners(c, m));
        assert!(depths.iter().all(|&d| d <= 11));
        assert_eq!(depths[0], 0);

        let r = cube_with_moves("R");
        assert_eq!(depths[r.corners() as usize], 1);
        let r2 = cube_with_moves("R2");
        assert_eq!(depths[r2.corners() as usize], 1);
    }

    #[test]
    fn solved_is_zero_everywhere() {
        assert_eq!(pruning().phase1_mod3(0, 0), 0);
        assert_eq!(pruning().phase2_mod3(0, 0), 0);
        assert_eq!(pruning().cornslice_depth(0, 0), 0);
        assert_eq!(pruning().ud_edges(SOLVED_U_EDGES as usize, 0), 0);
    }

    #[test]
    fn phase1_table_is_full() {
        let phase1 = &pruning().phase1;
        assert!((0..phase1.len()).all(|i| phase1.get(i) != UNVISITED));
    }

    #[test]
    fn cornslice_of_half_turn() {
        let cube = cube_with_moves("R2");
        assert_eq!(
            pruning().cornslice_depth(cube.corners() as usize, cube.slice_sorted() as usize),
            1
        );
    }

    #[quickcheck]
    fn edge_merge_matches_cubies(moves: Vec<Move>) -> bool {
        let phase2: Vec<Move> = moves.into_iter().filter(|m| m.is_phase2()).collect();
        let cube = CubieCube::from_moves(&phase2);
        Some(pruning().ud_edges(cube.u_edges() as usize, cube.d_edges() as usize) as u16)
            == cube.ud_edges()
    }

    #[quickcheck]
    fn cornslice_is_admissible(moves: Vec<Move>) -> bool {
        let phase2: Vec<Move> = moves.into_iter().filter(|m| m.is_phase2()).collect();
        let cube = CubieCube::from_moves(&phase2);
        let depth =
            pruning().cornslice_depth(cube.corners() as usize, cube.slice_sorted() as usize);
        (depth as usize) <= phase2.len()
    }
}
