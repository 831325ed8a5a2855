//! The 48 symmetries of the cube and the tables that use them to shrink coordinate spaces.
//!
//! Symmetry `16 * urf3 + 8 * f2 + 2 * u4 + lr2` is `URF3^urf3 * F2^f2 * U4^u4 * LR2^lr2`. The
//! first 16 (`urf3 = 0`) keep the UD axis in place and are the ones used for class reduction.
//! Conjugating by `s` means `S_s * c * S_s^-1`.

use rayon::prelude::*;

use crate::cube::{Corner::*, Edge::*};
use crate::prelude::*;
use crate::tables::persist::{populating, Store};

/// 120° rotation around the URF-DBL diagonal.
const ROT_URF3: CubieCube = CubieCube::new(
    [URF, DFR, DLF, UFL, UBR, DRB, DBL, ULB],
    [1, 2, 1, 2, 2, 1, 2, 1],
    [UF, FR, DF, FL, UB, BR, DB, BL, UR, DR, DL, UL],
    [1, 0, 1, 0, 1, 0, 1, 0, 1, 1, 1, 1],
);

/// 180° rotation around the F-B axis.
const ROT_F2: CubieCube = CubieCube::new(
    [DLF, DFR, DRB, DBL, UFL, URF, UBR, ULB],
    [0; 8],
    [DL, DF, DR, DB, UL, UF, UR, UB, FL, FR, BR, BL],
    [0; 12],
);

/// 90° rotation around the U-D axis.
const ROT_U4: CubieCube = CubieCube::new(
    [UBR, URF, UFL, ULB, DRB, DFR, DLF, DBL],
    [0; 8],
    [UB, UR, UF, UL, DB, DR, DF, DL, BR, FR, FL, BL],
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1],
);

/// Reflection in the plane through the U, D, F and B centers.
const MIRR_LR2: CubieCube = CubieCube::new(
    [UFL, URF, UBR, ULB, DLF, DFR, DRB, DBL],
    [3; 8],
    [UL, UF, UR, UB, DL, DF, DR, DB, FL, FR, BR, BL],
    [0; 12],
);

lazy_static::lazy_static! {
    static ref SYM_CUBES: [CubieCube; N_SYM] = {
        let mut syms = [CubieCube::SOLVED; N_SYM];
        let mut cube = CubieCube::SOLVED;
        let mut i = 0;
        for _ in 0..3 {
            for _ in 0..2 {
                for _ in 0..4 {
                    for _ in 0..2 {
                        syms[i] = cube;
                        i += 1;
                        cube.multiply(&MIRR_LR2);
                    }
                    cube.multiply(&ROT_U4);
                }
                cube.multiply(&ROT_F2);
            }
            cube.multiply(&ROT_URF3);
        }
        syms
    };

    static ref INVERSE: [usize; N_SYM] = {
        let mut inverse = [0; N_SYM];
        for (j, inv) in inverse.iter_mut().enumerate() {
            *inv = (0..N_SYM)
                .find(|&i| {
                    let mut c = SYM_CUBES[j];
                    c.corner_multiply(&SYM_CUBES[i]);
                    c.corners() == 0
                })
                .unwrap_or(0);
        }
        inverse
    };

    static ref CONJ_MOVE: [[u8; N_MOVE]; N_SYM] = {
        let mut conj = [[0; N_MOVE]; N_SYM];
        for (s, row) in conj.iter_mut().enumerate() {
            for m in Move::all() {
                let c = CubieCube::move_cube(m).conjugate(sym_cube(s), sym_cube(inverse(s)));
                row[m.index()] = Move::all()
                    .position(|m2| *CubieCube::move_cube(m2) == c)
                    .unwrap_or(0) as u8;
            }
        }
        conj
    };
}

pub fn sym_cube(s: usize) -> &'static CubieCube {
    &SYM_CUBES[s]
}

/// Index of the inverse of symmetry `s`.
pub fn inverse(s: usize) -> usize {
    INVERSE[s]
}

/// The move `m2` with `S_s * M_m * S_s^-1 == M_m2`.
#[inline]
pub fn conj_move(s: usize, m: usize) -> usize {
    CONJ_MOVE[s][m] as usize
}

/// `S_s * cube * S_s^-1`.
pub fn conjugate(cube: &CubieCube, s: usize) -> CubieCube {
    cube.conjugate(sym_cube(s), sym_cube(inverse(s)))
}

/// Symmetries `s` of the 48 with `S_s * cube * S_s^-1 == cube`, followed by `s + 48` for every
/// `s` that conjugates the cube into its inverse.
pub fn cube_symmetries(cube: &CubieCube) -> Vec<usize> {
    let inverse = cube.inverse();
    let mut syms = Vec::new();
    let mut antisyms = Vec::new();
    for s in 0..N_SYM {
        let c = conjugate(cube, s);
        if c == *cube {
            syms.push(s);
        }
        if c == inverse {
            antisyms.push(s + N_SYM);
        }
    }
    syms.extend(antisyms);
    syms
}

/// A coordinate space reduced by the 16 symmetries that keep the UD axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// `2048 * slice + flip`.
    FlipSlice,
    /// `2048 * slice_sorted + flip`.
    FlipSliceSorted,
    Corners,
}

impl ClassKind {
    fn prefix(self) -> &'static str {
        match self {
            ClassKind::FlipSlice => "fs",
            ClassKind::FlipSliceSorted => "fs24",
            ClassKind::Corners => "co",
        }
    }

    pub fn raw_len(self) -> usize {
        match self {
            ClassKind::FlipSlice => N_FLIPSLICE,
            ClassKind::FlipSliceSorted => N_FLIPSLICESORTED,
            ClassKind::Corners => N_CORNERS,
        }
    }

    pub fn classes(self) -> usize {
        match self {
            ClassKind::FlipSlice => N_FLIPSLICE_CLASS,
            ClassKind::FlipSliceSorted => N_FLIPSLICESORTED_CLASS,
            ClassKind::Corners => N_CORNERS_CLASS,
        }
    }

    pub fn set(self, cube: &mut CubieCube, raw: usize) {
        match self {
            ClassKind::FlipSlice => {
                cube.set_slice((raw / N_FLIP) as u16);
                cube.set_flip((raw % N_FLIP) as u16);
            }
            ClassKind::FlipSliceSorted => {
                cube.set_slice_sorted((raw / N_FLIP) as u16);
                cube.set_flip((raw % N_FLIP) as u16);
            }
            ClassKind::Corners => cube.set_corners(raw as u16),
        }
    }

    pub fn get(self, cube: &CubieCube) -> usize {
        match self {
            ClassKind::FlipSlice => N_FLIP * cube.slice() as usize + cube.flip() as usize,
            ClassKind::FlipSliceSorted => {
                N_FLIP * cube.slice_sorted() as usize + cube.flip() as usize
            }
            ClassKind::Corners => cube.corners() as usize,
        }
    }

    /// `S_s * cube * S_s^-1` on the pieces this coordinate reads.
    fn conjugate(self, cube: &CubieCube, s: usize) -> CubieCube {
        let mut c = *sym_cube(s);
        match self {
            ClassKind::Corners => {
                c.corner_multiply(cube);
                c.corner_multiply(sym_cube(inverse(s)));
            }
            _ => {
                c.edge_multiply(cube);
                c.edge_multiply(sym_cube(inverse(s)));
            }
        }
        c
    }
}

/// For each raw coordinate, its class and the symmetry `s` with
/// `S_s * raw * S_s^-1 == rep[class]`.
#[derive(Debug, Clone)]
pub struct ClassTable {
    kind: ClassKind,
    class_index: Vec<u32>,
    sym: Vec<u8>,
    rep: Vec<u32>,
}

const UNASSIGNED: u32 = u32::MAX;

impl ClassTable {
    pub fn load_or_build(store: &Store, kind: ClassKind) -> anyhow::Result<ClassTable> {
        let names = [
            format!("{}_classidx", kind.prefix()),
            format!("{}_sym", kind.prefix()),
            format!("{}_rep", kind.prefix()),
        ];

        let class_index = store.load(&names[0], kind.raw_len())?;
        let sym = store.load(&names[1], kind.raw_len())?;
        let rep = store.load(&names[2], kind.classes())?;
        if let (Some(class_index), Some(sym), Some(rep)) = (class_index, sym, rep) {
            return Ok(ClassTable {
                kind,
                class_index,
                sym,
                rep,
            });
        }

        let table = populating(&names[0], || ClassTable::build(kind))?;
        store.save(&names[0], &table.class_index)?;
        store.save(&names[1], &table.sym)?;
        store.save(&names[2], &table.rep)?;
        Ok(table)
    }

    /// Numbers classes in order of their smallest member, which becomes the representative.
    fn build(kind: ClassKind) -> anyhow::Result<ClassTable> {
        let mut class_index = vec![UNASSIGNED; kind.raw_len()];
        let mut sym = vec![0u8; kind.raw_len()];
        let mut rep = Vec::with_capacity(kind.classes());

        let mut cube = CubieCube::solved();
        for raw in 0..kind.raw_len() {
            if class_index[raw] != UNASSIGNED {
                continue;
            }
            let class = rep.len() as u32;
            class_index[raw] = class;
            rep.push(raw as u32);

            kind.set(&mut cube, raw);
            for s in 0..N_SYM_D4H {
                let image = kind.get(&kind.conjugate(&cube, inverse(s)));
                if class_index[image] == UNASSIGNED {
                    class_index[image] = class;
                    sym[image] = s as u8;
                }
            }
        }

        anyhow::ensure!(
            rep.len() == kind.classes(),
            "found {} {} classes, expected {}",
            rep.len(),
            kind.prefix(),
            kind.classes()
        );
        Ok(ClassTable {
            kind,
            class_index,
            sym,
            rep,
        })
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    #[inline]
    pub fn class(&self, raw: usize) -> usize {
        self.class_index[raw] as usize
    }

    #[inline]
    pub fn sym(&self, raw: usize) -> usize {
        self.sym[raw] as usize
    }

    #[inline]
    pub fn rep(&self, class: usize) -> usize {
        self.rep[class] as usize
    }

    pub fn len(&self) -> usize {
        self.rep.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rep.is_empty()
    }

    /// For each class, bit `s` is set when symmetry `s` maps the representative onto itself.
    pub fn self_symmetries(&self) -> Vec<u16> {
        let kind = self.kind;
        self.rep
            .par_iter()
            .map_init(CubieCube::solved, |cube, &rep| {
                kind.set(cube, rep as usize);
                (0..N_SYM_D4H)
                    .filter(|&s| kind.get(&kind.conjugate(cube, s)) == rep as usize)
                    .fold(0u16, |mask, s| mask | 1 << s)
            })
            .collect()
    }
}

/// Conjugation of the coordinates that aren't reduced to classes. Entry `16 * v + s` is the
/// coordinate `v` conjugated by `s`.
#[derive(Debug, Clone)]
pub struct SymmetryTables {
    twist_conj: Vec<u16>,
    ud_edges_conj: Vec<u16>,
    tetra_conj: Vec<u16>,
    pub flipslice: ClassTable,
    pub corners: ClassTable,
}

impl SymmetryTables {
    pub fn load_or_build(store: &Store) -> anyhow::Result<SymmetryTables> {
        let twist_conj = store.load_or_build("conj_twist", N_TWIST * N_SYM_D4H, || {
            conjugation_table(N_TWIST, CubieCube::set_twist, CubieCube::twist, true)
        })?;
        let ud_edges_conj = store.load_or_build("conj_ud_edges", N_UD_EDGES * N_SYM_D4H, || {
            conjugation_table(
                N_UD_EDGES,
                CubieCube::set_ud_edges,
                |c| c.ud_edges().unwrap_or(0),
                false,
            )
        })?;
        let tetra_conj = conjugation_table(N_TETRA, CubieCube::set_tetra, CubieCube::tetra, true);

        Ok(SymmetryTables {
            twist_conj,
            ud_edges_conj,
            tetra_conj,
            flipslice: ClassTable::load_or_build(store, ClassKind::FlipSlice)?,
            corners: ClassTable::load_or_build(store, ClassKind::Corners)?,
        })
    }

    #[inline]
    pub fn twist_conj(&self, twist: usize, s: usize) -> usize {
        self.twist_conj[N_SYM_D4H * twist + s] as usize
    }

    #[inline]
    pub fn ud_edges_conj(&self, ud_edges: usize, s: usize) -> usize {
        self.ud_edges_conj[N_SYM_D4H * ud_edges + s] as usize
    }

    #[inline]
    pub fn tetra_conj(&self, tetra: usize, s: usize) -> usize {
        self.tetra_conj[N_SYM_D4H * tetra + s] as usize
    }
}

fn conjugation_table(
    len: usize,
    set: fn(&mut CubieCube, u16),
    get: fn(&CubieCube) -> u16,
    corners: bool,
) -> Vec<u16> {
    let mut table = vec![0u16; len * N_SYM_D4H];
    table
        .par_chunks_mut(N_SYM_D4H)
        .enumerate()
        .for_each_init(CubieCube::solved, |cube, (v, row)| {
            set(cube, v as u16);
            for (s, entry) in row.iter_mut().enumerate() {
                let mut c = *sym_cube(s);
                if corners {
                    c.corner_multiply(cube);
                    c.corner_multiply(sym_cube(inverse(s)));
                } else {
                    c.edge_multiply(cube);
                    c.edge_multiply(sym_cube(inverse(s)));
                }
                *entry = get(&c);
            }
        });
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn symmetry() -> &'static SymmetryTables {
        &tables().symmetry
    }

    #[test]
    fn identity_comes_first() {
        assert_eq!(*sym_cube(0), CubieCube::SOLVED);
        assert_eq!(inverse(0), 0);
    }

    #[test]
    fn inverses_compose_to_identity() {
        for s in 0..N_SYM {
            let mut c = *sym_cube(s);
            c.multiply(sym_cube(inverse(s)));
            assert_eq!(c, CubieCube::SOLVED, "symmetry {}", s);
            assert_eq!(inverse(inverse(s)), s);
        }
        assert_eq!(inverse(SYM_URF3), SYM_URF3_INV);
    }

    #[test]
    fn symmetries_are_distinct() {
        let set: std::collections::HashSet<_> = (0..N_SYM).map(|s| *sym_cube(s)).collect();
        assert_eq!(set.len(), N_SYM);
    }

    #[test]
    fn ud_axis_symmetries_keep_ud_moves() {
        for s in 0..N_SYM_D4H {
            for m in Move::all() {
                let conj = Move::from_index(conj_move(s, m.index()));
                assert_eq!(
                    matches!(m.face, Face::Up | Face::Down),
                    matches!(conj.face, Face::Up | Face::Down)
                );
                assert_eq!(m.is_phase2(), conj.is_phase2());
            }
        }
    }

    #[test]
    fn urf3_cycles_faces() {
        let r = Move::new(Face::Right, Direction::Single).index();
        let u = Move::new(Face::Up, Direction::Single).index();
        let f = Move::new(Face::Front, Direction::Single).index();
        let image = |m| Move::from_index(conj_move(SYM_URF3, m)).face;
        let faces = [image(u), image(r), image(f)];
        assert!(faces.contains(&Face::Up));
        assert!(faces.contains(&Face::Right));
        assert!(faces.contains(&Face::Front));
        assert_ne!(image(u), Face::Up);
    }

    #[test]
    fn solved_cube_has_every_symmetry() {
        let syms = cube_symmetries(&CubieCube::SOLVED);
        assert_eq!(syms, (0..2 * N_SYM).collect::<Vec<_>>());
    }

    #[test]
    fn antisymmetries_come_after_symmetries() {
        // A mirror through the RL axis turns R into R'.
        let syms = cube_symmetries(&cube_with_moves("R"));
        let split = syms.iter().position(|&s| s >= N_SYM).unwrap_or(syms.len());
        assert!(split > 0 && split < syms.len(), "{:?}", syms);
        assert!(syms[..split].iter().all(|&s| s < N_SYM));
        assert!(syms[split..].iter().all(|&s| s >= N_SYM));
        assert!(syms.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn superflip_is_symmetric() {
        let superflip = cube_with_moves(
            "U R2 F B R B2 R U2 L B2 R U' D' R2 F R' L B2 U2 F2",
        );
        assert_eq!(superflip.flip() as usize, N_FLIP - 1);
        assert!(cube_symmetries(&superflip).len() >= N_SYM);
    }

    #[test]
    fn class_counts() {
        assert_eq!(symmetry().flipslice.len(), N_FLIPSLICE_CLASS);
        assert_eq!(symmetry().corners.len(), N_CORNERS_CLASS);
        assert_eq!(symmetry().flipslice.class(0), 0);
        assert_eq!(symmetry().corners.rep(0), 0);
    }

    #[test]
    fn representatives_are_their_own_class() {
        for table in [&symmetry().flipslice, &symmetry().corners] {
            for class in (0..table.len()).step_by(97) {
                let rep = table.rep(class);
                assert_eq!(table.class(rep), class);
                assert_eq!(table.sym(rep), 0);
            }
        }
    }

    #[test]
    fn identity_is_always_a_self_symmetry() {
        let masks = symmetry().corners.self_symmetries();
        assert_eq!(masks.len(), N_CORNERS_CLASS);
        assert!(masks.iter().all(|m| m & 1 == 1));
        assert_eq!(masks[0], u16::MAX);
    }

    #[quickcheck]
    fn sym_maps_onto_representative(moves: Vec<Move>) -> bool {
        let cube = CubieCube::from_moves(&moves);
        let fs = &symmetry().flipslice;
        let raw = ClassKind::FlipSlice.get(&cube);
        let s = fs.sym(raw);
        let image = ClassKind::FlipSlice.get(&conjugate(&cube, s));

        let co = &symmetry().corners;
        let corners = cube.corners() as usize;
        let corner_image = conjugate(&cube, co.sym(corners)).corners() as usize;

        image == fs.rep(fs.class(raw)) && corner_image == co.rep(co.class(corners))
    }

    #[quickcheck]
    fn coordinate_conjugation_matches_cubies(moves: Vec<Move>, s: u8) -> bool {
        let s = s as usize % N_SYM_D4H;
        let cube = CubieCube::from_moves(&moves);
        let conj = conjugate(&cube, s);
        symmetry().twist_conj(cube.twist() as usize, s) == conj.twist() as usize
            && symmetry().tetra_conj(cube.tetra() as usize, s) == conj.tetra() as usize
    }

    #[quickcheck]
    fn conjugated_moves_commute(moves: Vec<Move>, m: Move, s: u8) -> bool {
        let s = s as usize % N_SYM;
        let cube = CubieCube::from_moves(&moves);
        let m2 = Move::from_index(conj_move(s, m.index()));
        conjugate(&cube.apply(m), s) == conjugate(&cube, s).apply(m2)
    }

    #[quickcheck]
    fn ud_edges_conjugation(moves: Vec<Move>, s: u8) -> bool {
        let s = s as usize % N_SYM_D4H;
        let phase2: Vec<Move> = moves.into_iter().filter(|m| m.is_phase2()).collect();
        let cube = CubieCube::from_moves(&phase2);
        let ud_edges = cube.ud_edges().unwrap_or(0) as usize;
        Some(symmetry().ud_edges_conj(ud_edges, s) as u16) == conjugate(&cube, s).ud_edges()
    }
}
