//! Bijections between a cube and the integer coordinates the tables are indexed by.
//!
//! Permutations are ranked by rotating a prefix until the next slot holds its own piece and
//! counting the rotations as a mixed-radix digit. Sets of positions are ranked by binomial
//! coefficients.

use crate::prelude::*;

use Corner::*;
use Edge::*;

/// `u_edges` of the solved cube.
pub const SOLVED_U_EDGES: u16 = 1656;

impl CubieCube {
    pub fn twist(&self) -> u16 {
        self.co[..7].iter().fold(0, |t, &o| 3 * t + o as u16)
    }

    pub fn set_twist(&mut self, mut twist: u16) {
        let mut sum = 0;
        for i in (0..7).rev() {
            self.co[i] = (twist % 3) as u8;
            sum += self.co[i];
            twist /= 3;
        }
        self.co[7] = (3 - sum % 3) % 3;
    }

    pub fn flip(&self) -> u16 {
        self.eo[..11].iter().fold(0, |f, &o| 2 * f + o as u16)
    }

    pub fn set_flip(&mut self, mut flip: u16) {
        self.eo[11] = 0;
        for i in (0..11).rev() {
            self.eo[i] = (flip & 1) as u8;
            self.eo[11] ^= self.eo[i];
            flip >>= 1;
        }
    }

    /// Positions of FR, FL, BL and BR, ignoring their order.
    pub fn slice(&self) -> u16 {
        self.slice_sorted() / N_PERM_4 as u16
    }

    pub fn set_slice(&mut self, slice: u16) {
        self.set_slice_sorted(slice * N_PERM_4 as u16);
    }

    /// Positions and order of FR, FL, BL and BR. Zero when they are home.
    pub fn slice_sorted(&self) -> u16 {
        rank_four_edges(&self.ep, FR)
    }

    pub fn set_slice_sorted(&mut self, idx: u16) {
        self.ep = unrank_four_edges(idx, FR);
    }

    /// Positions and order of UR, UF, UL and UB. The edge array is rotated by four slots first
    /// so that the phase-2 values stay below 1680.
    pub fn u_edges(&self) -> u16 {
        let mut ep = self.ep;
        ep.rotate_right(4);
        rank_four_edges(&ep, UR)
    }

    pub fn set_u_edges(&mut self, idx: u16) {
        self.ep = unrank_four_edges(idx, UR);
        self.ep.rotate_left(4);
    }

    /// Positions and order of DR, DF, DL and DB.
    pub fn d_edges(&self) -> u16 {
        let mut ep = self.ep;
        ep.rotate_right(4);
        rank_four_edges(&ep, DR)
    }

    pub fn set_d_edges(&mut self, idx: u16) {
        self.ep = unrank_four_edges(idx, DR);
        self.ep.rotate_left(4);
    }

    pub fn corners(&self) -> u16 {
        rank_permutation(self.cp)
    }

    pub fn set_corners(&mut self, idx: u16) {
        self.cp = unrank_permutation(idx, Corner::ALL);
    }

    /// Permutation of the eight U and D edges. Only defined while the slice edges are in the
    /// slice.
    pub fn ud_edges(&self) -> Option<u16> {
        let mut perm = [UR; 8];
        perm.copy_from_slice(&self.ep[..8]);
        if perm.iter().any(|e| e.is_slice()) {
            return None;
        }
        Some(rank_permutation(perm))
    }

    pub fn set_ud_edges(&mut self, idx: u16) {
        let perm = unrank_permutation(idx, [UR, UF, UL, UB, DR, DF, DL, DB]);
        self.ep[..8].copy_from_slice(&perm);
        self.ep[8..].copy_from_slice(&[FR, FL, BL, BR]);
    }

    /// Positions of the four D corners, ignoring their order.
    pub fn tetra(&self) -> u16 {
        let mut k = 4;
        let mut s = 0;
        for n in (0..8).rev() {
            if k == 0 {
                break;
            }
            if self.cp[n] >= DFR {
                k -= 1;
            } else {
                s += n_choose_r(n, k - 1);
            }
        }
        s as u16
    }

    /// Puts the D corners in the positions named by `idx` and the U corners in the rest, each in
    /// their natural order.
    pub fn set_tetra(&mut self, idx: u16) {
        let mut idx = idx as usize;
        let mut occupied = [false; 8];
        let mut k = 4;
        for n in (0..8).rev() {
            if k == 0 {
                break;
            }
            let v = n_choose_r(n, k - 1);
            if idx < v {
                occupied[n] = true;
                k -= 1;
            } else {
                idx -= v;
            }
        }

        let mut up = [URF, UFL, ULB, UBR].into_iter();
        let mut down = [DFR, DLF, DBL, DRB].into_iter();
        for (c, &d) in occupied.iter().enumerate() {
            let next = if d { down.next() } else { up.next() };
            if let Some(corner) = next {
                self.cp[c] = corner;
            }
        }
    }
}

/// The U/D edge permutation of a cube with its U edges at `u_edges` and its D edges at
/// `d_edges`. `None` unless together they fill the eight U and D slots.
pub fn merge_ud_edges(u_edges: u16, d_edges: u16) -> Option<u16> {
    let mut up = CubieCube::SOLVED;
    up.set_u_edges(u_edges);
    let mut down = CubieCube::SOLVED;
    down.set_d_edges(d_edges);

    let mut merged = CubieCube::SOLVED;
    for i in 0..8 {
        merged.ep[i] = if up.ep[i] <= UB {
            up.ep[i]
        } else if (DR..=DB).contains(&down.ep[i]) {
            down.ep[i]
        } else {
            return None;
        };
    }
    merged.ud_edges()
}

fn rank_permutation<T: Copy + Into<usize>, const N: usize>(mut perm: [T; N]) -> u16 {
    let mut b = 0;
    for j in (1..N).rev() {
        let mut k = 0;
        while perm[j].into() != j {
            perm[..=j].rotate_left(1);
            k += 1;
        }
        b = (j + 1) * b + k;
    }
    b as u16
}

fn unrank_permutation<T: Copy, const N: usize>(idx: u16, mut perm: [T; N]) -> [T; N] {
    let mut idx = idx as usize;
    for j in 0..N {
        let k = idx % (j + 1);
        idx /= j + 1;
        perm[..=j].rotate_right(k);
    }
    perm
}

/// Ranks where the four consecutive edges starting at `first` sit, and in which order.
fn rank_four_edges(ep: &[Edge; 12], first: Edge) -> u16 {
    let first = first as usize;
    let mut a = 0;
    let mut x = 0;
    let mut edge4 = [0; 4];
    for j in (0..12).rev() {
        let e = ep[j] as usize;
        if (first..first + 4).contains(&e) {
            a += n_choose_r(11 - j, x + 1);
            edge4[3 - x] = e - first;
            x += 1;
        }
    }
    (N_PERM_4 * a + rank_permutation(edge4) as usize) as u16
}

/// Inverse of [`rank_four_edges`]. The remaining edges fill the free slots in cyclic order after
/// the tracked ones.
fn unrank_four_edges(idx: u16, first: Edge) -> [Edge; 12] {
    let first = first as usize;
    let mut a = idx as usize / N_PERM_4;
    let tracked = unrank_permutation(
        (idx as usize % N_PERM_4) as u16,
        [0, 1, 2, 3].map(|i| Edge::from_index(first + i)),
    );

    let mut others = (4..12).map(|i| Edge::from_index((first + i) % 12));
    let mut ep = [UR; 12];
    let mut x = 4;
    for (j, slot) in ep.iter_mut().enumerate() {
        if x > 0 && a >= n_choose_r(11 - j, x) {
            *slot = tracked[4 - x];
            a -= n_choose_r(11 - j, x);
            x -= 1;
        } else if let Some(e) = others.next() {
            *slot = e;
        }
    }
    ep
}

impl From<Corner> for usize {
    fn from(c: Corner) -> usize {
        c as usize
    }
}

impl From<Edge> for usize {
    fn from(e: Edge) -> usize {
        e as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn assert_bijection(
        range: usize,
        set: impl Fn(&mut CubieCube, u16),
        get: impl Fn(&CubieCube) -> u16,
    ) {
        let mut cube = CubieCube::solved();
        for i in 0..range {
            set(&mut cube, i as u16);
            assert_eq!(get(&cube) as usize, i);
        }
    }

    mod bijections {
        use super::*;

        #[test]
        fn twist() {
            assert_bijection(N_TWIST, CubieCube::set_twist, CubieCube::twist);
        }

        #[test]
        fn flip() {
            assert_bijection(N_FLIP, CubieCube::set_flip, CubieCube::flip);
        }

        #[test]
        fn slice() {
            assert_bijection(N_SLICE, CubieCube::set_slice, CubieCube::slice);
        }

        #[test]
        fn slice_sorted() {
            assert_bijection(
                N_SLICE_SORTED,
                CubieCube::set_slice_sorted,
                CubieCube::slice_sorted,
            );
        }

        #[test]
        fn u_edges() {
            assert_bijection(N_U_EDGES, CubieCube::set_u_edges, CubieCube::u_edges);
        }

        #[test]
        fn d_edges() {
            assert_bijection(N_D_EDGES, CubieCube::set_d_edges, CubieCube::d_edges);
        }

        #[test]
        fn corners() {
            assert_bijection(N_CORNERS, CubieCube::set_corners, CubieCube::corners);
        }

        #[test]
        fn ud_edges() {
            let mut cube = CubieCube::solved();
            for i in 0..N_UD_EDGES {
                cube.set_ud_edges(i as u16);
                assert_eq!(cube.ud_edges(), Some(i as u16));
            }
        }

        #[test]
        fn tetra() {
            assert_bijection(N_TETRA, CubieCube::set_tetra, CubieCube::tetra);
        }
    }

    #[test]
    fn solved_is_zero() {
        let cube = CubieCube::solved();
        assert_eq!(cube.twist(), 0);
        assert_eq!(cube.flip(), 0);
        assert_eq!(cube.slice_sorted(), 0);
        assert_eq!(cube.corners(), 0);
        assert_eq!(cube.d_edges(), 0);
        assert_eq!(cube.ud_edges(), Some(0));
        assert_eq!(cube.tetra(), 0);
        assert_eq!(cube.u_edges(), SOLVED_U_EDGES);
    }

    #[test]
    fn merging_needs_disjoint_edges() {
        assert_eq!(merge_ud_edges(SOLVED_U_EDGES, 0), Some(0));
        assert_eq!(merge_ud_edges(0, 0), None);
    }

    #[quickcheck]
    fn merged_edges_match_phase2_cubes(moves: Vec<Move>) -> bool {
        let phase2: Vec<Move> = moves.into_iter().filter(|m| m.is_phase2()).collect();
        let cube = CubieCube::from_moves(&phase2);
        cube.u_edges() < N_U_EDGES_PHASE2 as u16
            && merge_ud_edges(cube.u_edges(), cube.d_edges()) == cube.ud_edges()
    }

    #[test]
    fn setters_produce_valid_pieces() {
        let mut cube = CubieCube::solved();
        cube.set_d_edges(7777);
        let mut seen = cube.ep.to_vec();
        seen.sort();
        assert_eq!(seen, Edge::ALL.to_vec());
    }

    #[test]
    fn quarter_turn_leaves_phase2() {
        assert_eq!(cube_with_moves("R").ud_edges(), None);
        assert!(cube_with_moves("R2 U D'").ud_edges().is_some());
    }

    #[test]
    fn orientation_is_untouched_by_half_turns() {
        let cube = cube_with_moves("R2 F2 U L2 B2 D'");
        assert_eq!(cube.twist(), 0);
        assert_eq!(cube.flip(), 0);
        assert_eq!(cube.slice(), 0);
        assert!(cube.u_edges() < N_U_EDGES_PHASE2 as u16);
    }

    #[quickcheck]
    fn coordinates_stay_in_range(moves: Vec<Move>) -> bool {
        let cube = CubieCube::from_moves(&moves);
        (cube.twist() as usize) < N_TWIST
            && (cube.flip() as usize) < N_FLIP
            && (cube.slice_sorted() as usize) < N_SLICE_SORTED
            && (cube.u_edges() as usize) < N_U_EDGES
            && (cube.d_edges() as usize) < N_D_EDGES
            && (cube.corners() as usize) < N_CORNERS
            && (cube.tetra() as usize) < N_TETRA
    }

    #[quickcheck]
    fn slice_ignores_order(moves: Vec<Move>) -> bool {
        let cube = CubieCube::from_moves(&moves);
        cube.slice() as usize == cube.slice_sorted() as usize / N_PERM_4
    }
}
