use crate::prelude::*;

use enum_iterator::Sequence;

mod coord;
mod cubie;
mod facelet;
mod indexing;

pub use coord::*;
pub use cubie::*;
pub use facelet::*;
pub use indexing::{merge_ud_edges, SOLVED_U_EDGES};

/// Anything that can be turned and knows when it is solved: the cubie representation and the
/// coordinate views built on top of it.
pub trait CubeLike: Sized {
    fn apply(self, move_: Move) -> Self;

    fn is_solved(&self) -> bool;

    fn apply_all(self, moves: impl IntoIterator<Item = Move>) -> Self {
        moves.into_iter().fold(self, |cube, m| cube.apply(m))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum Corner {
    URF,
    UFL,
    ULB,
    UBR,
    DFR,
    DLF,
    DBL,
    DRB,
}

impl Corner {
    pub const ALL: [Corner; 8] = [
        Corner::URF,
        Corner::UFL,
        Corner::ULB,
        Corner::UBR,
        Corner::DFR,
        Corner::DLF,
        Corner::DBL,
        Corner::DRB,
    ];

    pub fn from_index(i: usize) -> Corner {
        Corner::ALL[i]
    }

    pub fn all() -> impl Iterator<Item = Corner> {
        enum_iterator::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum Edge {
    UR,
    UF,
    UL,
    UB,
    DR,
    DF,
    DL,
    DB,
    FR,
    FL,
    BL,
    BR,
}

impl Edge {
    pub const ALL: [Edge; 12] = [
        Edge::UR,
        Edge::UF,
        Edge::UL,
        Edge::UB,
        Edge::DR,
        Edge::DF,
        Edge::DL,
        Edge::DB,
        Edge::FR,
        Edge::FL,
        Edge::BL,
        Edge::BR,
    ];

    pub fn from_index(i: usize) -> Edge {
        Edge::ALL[i]
    }

    pub fn all() -> impl Iterator<Item = Edge> {
        enum_iterator::all()
    }

    /// One of FR, FL, BL, BR.
    pub fn is_slice(self) -> bool {
        self >= Edge::FR
    }
}
