use rayon::prelude::*;

use crate::prelude::*;
use crate::tables::persist::Store;

/// Which half of the cubie state a coordinate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pieces {
    Corners,
    Edges,
}

struct Coordinate {
    name: &'static str,
    len: usize,
    pieces: Pieces,
    set: fn(&mut CubieCube, u16),
    get: fn(&CubieCube) -> u16,
}

/// For every coordinate value `v` and move `m`, entry `18 * v + m` is the coordinate after `m`.
#[derive(Debug, Clone)]
pub struct MoveTables {
    twist: Vec<u16>,
    flip: Vec<u16>,
    slice_sorted: Vec<u16>,
    corners: Vec<u16>,
    u_edges: Vec<u16>,
    d_edges: Vec<u16>,
    ud_edges: Vec<u16>,
    tetra: Vec<u16>,
}

impl MoveTables {
    pub fn load_or_build(store: &Store) -> anyhow::Result<MoveTables> {
        let table = |c: Coordinate| store.load_or_build(c.name, c.len * N_MOVE, || build(&c));

        Ok(MoveTables {
            twist: table(Coordinate {
                name: "move_twist",
                len: N_TWIST,
                pieces: Pieces::Corners,
                set: CubieCube::set_twist,
                get: CubieCube::twist,
            })?,
            flip: table(Coordinate {
                name: "move_flip",
                len: N_FLIP,
                pieces: Pieces::Edges,
                set: CubieCube::set_flip,
                get: CubieCube::flip,
            })?,
            slice_sorted: table(Coordinate {
                name: "move_slice_sorted",
                len: N_SLICE_SORTED,
                pieces: Pieces::Edges,
                set: CubieCube::set_slice_sorted,
                get: CubieCube::slice_sorted,
            })?,
            corners: table(Coordinate {
                name: "move_corners",
                len: N_CORNERS,
                pieces: Pieces::Corners,
                set: CubieCube::set_corners,
                get: CubieCube::corners,
            })?,
            u_edges: table(Coordinate {
                name: "move_u_edges",
                len: N_U_EDGES,
                pieces: Pieces::Edges,
                set: CubieCube::set_u_edges,
                get: CubieCube::u_edges,
            })?,
            d_edges: table(Coordinate {
                name: "move_d_edges",
                len: N_D_EDGES,
                pieces: Pieces::Edges,
                set: CubieCube::set_d_edges,
                get: CubieCube::d_edges,
            })?,
            ud_edges: store.load_or_build("move_ud_edges", N_UD_EDGES * N_MOVE, build_ud_edges)?,
            tetra: table(Coordinate {
                name: "move_tetra",
                len: N_TETRA,
                pieces: Pieces::Corners,
                set: CubieCube::set_tetra,
                get: CubieCube::tetra,
            })?,
        })
    }

    #[inline]
    pub fn twist(&self, twist: usize, m: usize) -> usize {
        self.twist[N_MOVE * twist + m] as usize
    }

    #[inline]
    pub fn flip(&self, flip: usize, m: usize) -> usize {
        self.flip[N_MOVE * flip + m] as usize
    }

    #[inline]
    pub fn slice_sorted(&self, slice_sorted: usize, m: usize) -> usize {
        self.slice_sorted[N_MOVE * slice_sorted + m] as usize
    }

    /// The unordered slice coordinate after `m`, read through the sorted table.
    #[inline]
    pub fn slice(&self, slice: usize, m: usize) -> usize {
        self.slice_sorted(N_PERM_4 * slice, m) / N_PERM_4
    }

    #[inline]
    pub fn corners(&self, corners: usize, m: usize) -> usize {
        self.corners[N_MOVE * corners + m] as usize
    }

    #[inline]
    pub fn u_edges(&self, u_edges: usize, m: usize) -> usize {
        self.u_edges[N_MOVE * u_edges + m] as usize
    }

    #[inline]
    pub fn d_edges(&self, d_edges: usize, m: usize) -> usize {
        self.d_edges[N_MOVE * d_edges + m] as usize
    }

    /// Only defined for phase-2 moves.
    #[inline]
    pub fn ud_edges(&self, ud_edges: usize, m: usize) -> usize {
        self.ud_edges[N_MOVE * ud_edges + m] as usize
    }

    #[inline]
    pub fn tetra(&self, tetra: usize, m: usize) -> usize {
        self.tetra[N_MOVE * tetra + m] as usize
    }
}

fn build(c: &Coordinate) -> Vec<u16> {
    let multiply = match c.pieces {
        Pieces::Corners => CubieCube::corner_multiply,
        Pieces::Edges => CubieCube::edge_multiply,
    };

    let mut table = vec![0u16; c.len * N_MOVE];
    table
        .par_chunks_mut(N_MOVE)
        .enumerate()
        .for_each_init(CubieCube::solved, |cube, (i, row)| {
            (c.set)(cube, i as u16);
            for face in Face::all() {
                let basic = CubieCube::basic_move(face);
                for turn in 0..3 {
                    multiply(cube, basic);
                    row[3 * face.index() + turn] = (c.get)(cube);
                }
                // The fourth quarter turn restores the cube for the next face.
                multiply(cube, basic);
            }
        });
    table
}

/// The U/D edge permutation only stays defined under phase-2 moves; other entries stay 0.
fn build_ud_edges() -> Vec<u16> {
    let mut table = vec![0u16; N_UD_EDGES * N_MOVE];
    table
        .par_chunks_mut(N_MOVE)
        .enumerate()
        .for_each_init(CubieCube::solved, |cube, (i, row)| {
            cube.set_ud_edges(i as u16);
            for face in Face::all() {
                let basic = CubieCube::basic_move(face);
                for turn in 0..3 {
                    cube.edge_multiply(basic);
                    let m = Move::from_index(3 * face.index() + turn);
                    if m.is_phase2() {
                        row[m.index()] = cube.ud_edges().unwrap_or(0);
                    }
                }
                cube.edge_multiply(basic);
            }
        });
    table
}
