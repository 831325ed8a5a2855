//! Sizes of the coordinate spaces and the combinatorics they are indexed with.

pub const N_MOVE: usize = 18;
pub const N_PHASE2_MOVE: usize = 10;

/// 3^7 corner orientations.
pub const N_TWIST: usize = 2187;
/// 2^11 edge orientations.
pub const N_FLIP: usize = 2048;
/// Positions of the four slice edges, ignoring their order.
pub const N_SLICE: usize = 495;
/// Positions and order of the four slice edges.
pub const N_SLICE_SORTED: usize = 11880;
pub const N_PERM_4: usize = 24;
pub const N_CORNERS: usize = 40320;
pub const N_U_EDGES: usize = 11880;
pub const N_D_EDGES: usize = 11880;
/// u-edges values reachable while the cube is in the phase-2 subgroup.
pub const N_U_EDGES_PHASE2: usize = 1680;
pub const N_UD_EDGES: usize = 40320;
/// Positions of the four D-layer corners.
pub const N_TETRA: usize = 70;

pub const N_SYM: usize = 48;
/// Symmetries that keep the UD axis in place.
pub const N_SYM_D4H: usize = 16;

pub const N_FLIPSLICE_CLASS: usize = 64430;
pub const N_FLIPSLICESORTED_CLASS: usize = 1523864;
pub const N_CORNERS_CLASS: usize = 2768;

pub const N_FLIPSLICE: usize = N_FLIP * N_SLICE;
pub const N_FLIPSLICESORTED: usize = N_FLIP * N_SLICE_SORTED;

/// The 120 degree rotation around the URF-DBL diagonal, and its square.
pub const SYM_URF3: usize = 16;
pub const SYM_URF3_INV: usize = 32;

/// Binomial coefficient, zero when `r > n`.
pub const fn n_choose_r(n: usize, r: usize) -> usize {
    if n < r {
        return 0;
    }
    let r = if r > n - r { n - r } else { r };
    let mut result = 1;
    let mut i = 1;
    while i <= r {
        result = result * (n + 1 - i) / i;
        i += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_binomials() {
        assert_eq!(n_choose_r(0, 0), 1);
        assert_eq!(n_choose_r(4, 2), 6);
        assert_eq!(n_choose_r(12, 4), N_SLICE);
        assert_eq!(n_choose_r(8, 4), N_TETRA);
        assert_eq!(n_choose_r(11, 11), 1);
    }

    #[test]
    fn more_chosen_than_available_is_zero() {
        assert_eq!(n_choose_r(3, 4), 0);
        assert_eq!(n_choose_r(0, 1), 0);
    }

    #[test]
    fn is_symmetric() {
        for n in 0..13 {
            for r in 0..=n {
                assert_eq!(n_choose_r(n, r), n_choose_r(n, n - r));
            }
        }
    }

    #[test]
    fn sizes_are_consistent() {
        assert_eq!(N_SLICE_SORTED, N_SLICE * N_PERM_4);
        assert_eq!(N_TWIST, 3usize.pow(7));
        assert_eq!(N_FLIP, 1 << 11);
        assert_eq!(N_U_EDGES_PHASE2, n_choose_r(8, 4) * N_PERM_4);
    }
}
