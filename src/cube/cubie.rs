use crate::prelude::*;

use Corner::*;
use Edge::*;

/// A cube as the permutation and orientation of its 8 corners and 12 edges.
///
/// Corner orientations of 3 and above only appear while composing with a mirror symmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubieCube {
    pub(super) cp: [Corner; 8],
    pub(super) co: [u8; 8],
    pub(super) ep: [Edge; 12],
    pub(super) eo: [u8; 12],
}

/// Quarter turns of U, R, F, D, L, B.
const BASIC_MOVES: [CubieCube; 6] = [
    CubieCube {
        cp: [UBR, URF, UFL, ULB, DFR, DLF, DBL, DRB],
        co: [0, 0, 0, 0, 0, 0, 0, 0],
        ep: [UB, UR, UF, UL, DR, DF, DL, DB, FR, FL, BL, BR],
        eo: [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    },
    CubieCube {
        cp: [DFR, UFL, ULB, URF, DRB, DLF, DBL, UBR],
        co: [2, 0, 0, 1, 1, 0, 0, 2],
        ep: [FR, UF, UL, UB, BR, DF, DL, DB, DR, FL, BL, UR],
        eo: [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    },
    CubieCube {
        cp: [UFL, DLF, ULB, UBR, URF, DFR, DBL, DRB],
        co: [1, 2, 0, 0, 2, 1, 0, 0],
        ep: [UR, FL, UL, UB, DR, FR, DL, DB, UF, DF, BL, BR],
        eo: [0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
    },
    CubieCube {
        cp: [URF, UFL, ULB, UBR, DLF, DBL, DRB, DFR],
        co: [0, 0, 0, 0, 0, 0, 0, 0],
        ep: [UR, UF, UL, UB, DF, DL, DB, DR, FR, FL, BL, BR],
        eo: [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    },
    CubieCube {
        cp: [URF, ULB, DBL, UBR, DFR, UFL, DLF, DRB],
        co: [0, 1, 2, 0, 0, 2, 1, 0],
        ep: [UR, UF, BL, UB, DR, DF, FL, DB, FR, UL, DL, BR],
        eo: [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    },
    CubieCube {
        cp: [URF, UFL, UBR, DRB, DFR, DLF, ULB, DBL],
        co: [0, 0, 1, 2, 0, 0, 2, 1],
        ep: [UR, UF, UL, BR, DR, DF, DL, BL, FR, FL, UB, DB],
        eo: [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1],
    },
];

lazy_static::lazy_static! {
    /// The cube after each of the 18 moves, in move index order.
    static ref MOVE_CUBES: [CubieCube; N_MOVE] = {
        let mut cubes = [CubieCube::SOLVED; N_MOVE];
        for (face, basic) in BASIC_MOVES.iter().enumerate() {
            let mut cube = CubieCube::SOLVED;
            for turn in 0..3 {
                cube.multiply(basic);
                cubes[3 * face + turn] = cube;
            }
        }
        cubes
    };
}

impl CubieCube {
    pub const SOLVED: CubieCube = CubieCube {
        cp: [URF, UFL, ULB, UBR, DFR, DLF, DBL, DRB],
        co: [0; 8],
        ep: [UR, UF, UL, UB, DR, DF, DL, DB, FR, FL, BL, BR],
        eo: [0; 12],
    };

    pub fn solved() -> CubieCube {
        CubieCube::SOLVED
    }

    pub(crate) const fn new(cp: [Corner; 8], co: [u8; 8], ep: [Edge; 12], eo: [u8; 12]) -> Self {
        CubieCube { cp, co, ep, eo }
    }

    pub fn from_moves(moves: &[Move]) -> CubieCube {
        CubieCube::SOLVED.apply_all(moves.iter().copied())
    }

    /// The cube after a quarter turn of `face`.
    pub fn basic_move(face: Face) -> &'static CubieCube {
        &BASIC_MOVES[face.index()]
    }

    pub fn move_cube(m: Move) -> &'static CubieCube {
        &MOVE_CUBES[m.index()]
    }

    /// A uniformly random reachable cube.
    pub fn random(rng: &mut impl rand::Rng) -> CubieCube {
        use rand::seq::SliceRandom;

        let mut cube = CubieCube::SOLVED;
        cube.ep.shuffle(rng);
        cube.set_corners(rng.gen_range(0, N_CORNERS) as u16);
        if cube.corner_parity() != cube.edge_parity() {
            cube.cp.swap(URF as usize, ULB as usize);
        }
        cube.set_flip(rng.gen_range(0, N_FLIP) as u16);
        cube.set_twist(rng.gen_range(0, N_TWIST) as u16);
        cube
    }

    /// `self = self * b` for the corners. Orientations of 3 to 5 mark a mirrored corner.
    pub fn corner_multiply(&mut self, b: &CubieCube) {
        let mut cp = [URF; 8];
        let mut co = [0; 8];
        for c in 0..8 {
            let from = b.cp[c] as usize;
            cp[c] = self.cp[from];
            let ori_a = self.co[from];
            let ori_b = b.co[c];
            co[c] = match (ori_a < 3, ori_b < 3) {
                (true, true) => (ori_a + ori_b) % 3,
                (true, false) => {
                    let ori = ori_a + ori_b;
                    if ori >= 6 {
                        ori - 3
                    } else {
                        ori
                    }
                }
                (false, true) => {
                    let ori = ori_a - ori_b;
                    if ori < 3 {
                        ori + 3
                    } else {
                        ori
                    }
                }
                (false, false) => (ori_a + 3 - ori_b) % 3,
            };
        }
        self.cp = cp;
        self.co = co;
    }

    /// `self = self * b` for the edges.
    pub fn edge_multiply(&mut self, b: &CubieCube) {
        let mut ep = [UR; 12];
        let mut eo = [0; 12];
        for e in 0..12 {
            let from = b.ep[e] as usize;
            ep[e] = self.ep[from];
            eo[e] = (b.eo[e] + self.eo[from]) % 2;
        }
        self.ep = ep;
        self.eo = eo;
    }

    pub fn multiply(&mut self, b: &CubieCube) {
        self.corner_multiply(b);
        self.edge_multiply(b);
    }

    pub fn inverse(&self) -> CubieCube {
        let mut inv = CubieCube::SOLVED;
        for e in 0..12 {
            inv.ep[self.ep[e] as usize] = Edge::from_index(e);
        }
        for e in 0..12 {
            inv.eo[e] = self.eo[inv.ep[e] as usize];
        }
        for c in 0..8 {
            inv.cp[self.cp[c] as usize] = Corner::from_index(c);
        }
        for c in 0..8 {
            let ori = self.co[inv.cp[c] as usize];
            inv.co[c] = if ori >= 3 { ori } else { (3 - ori) % 3 };
        }
        inv
    }

    /// `sym * self * sym_inv`.
    pub fn conjugate(&self, sym: &CubieCube, sym_inv: &CubieCube) -> CubieCube {
        let mut c = *sym;
        c.multiply(self);
        c.multiply(sym_inv);
        c
    }

    /// True for an odd corner permutation.
    pub fn corner_parity(&self) -> bool {
        permutation_parity(&self.cp)
    }

    /// True for an odd edge permutation.
    pub fn edge_parity(&self) -> bool {
        permutation_parity(&self.ep)
    }

    /// Checks that every piece is present once and that the cube can be reached by face turns.
    pub fn verify(&self) -> Result<(), CubeError> {
        let mut edge_count = [0; 12];
        for e in self.ep {
            edge_count[e as usize] += 1;
        }
        if edge_count.iter().any(|&n| n != 1) {
            return Err(CubeError::UndefinedEdges);
        }
        if self.eo.iter().sum::<u8>() % 2 != 0 {
            return Err(CubeError::EdgeFlip);
        }

        let mut corner_count = [0; 8];
        for c in self.cp {
            corner_count[c as usize] += 1;
        }
        if corner_count.iter().any(|&n| n != 1) {
            return Err(CubeError::UndefinedCorners);
        }
        if self.co.iter().any(|&o| o >= 3) || self.co.iter().sum::<u8>() % 3 != 0 {
            return Err(CubeError::CornerTwist);
        }

        if self.edge_parity() != self.corner_parity() {
            return Err(CubeError::Parity);
        }
        Ok(())
    }
}

impl Default for CubieCube {
    fn default() -> Self {
        CubieCube::SOLVED
    }
}

impl CubeLike for CubieCube {
    fn apply(mut self, move_: Move) -> Self {
        self.multiply(CubieCube::move_cube(move_));
        self
    }

    fn is_solved(&self) -> bool {
        *self == CubieCube::SOLVED
    }
}

fn permutation_parity<T: Ord>(perm: &[T]) -> bool {
    let mut inversions = 0;
    for i in 0..perm.len() {
        inversions += perm[..i].iter().filter(|p| **p > perm[i]).count();
    }
    inversions % 2 == 1
}
