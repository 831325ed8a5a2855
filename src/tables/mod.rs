use std::path::PathBuf;

use persist::Store;

mod moves;
mod packed;
mod persist;
mod pruning;
mod symmetry;

pub use moves::MoveTables;
pub use packed::{Packed2, TritTable, UNVISITED};
pub use persist::FORMAT_VERSION;
pub use pruning::{distance, OptimalTables, PruningTables};
pub use symmetry::{
    conj_move, conjugate, cube_symmetries, inverse as inverse_sym, sym_cube, ClassKind,
    ClassTable, SymmetryTables,
};

/// Which tables to load or build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableSet {
    /// Enough for the two-phase solver.
    #[default]
    TwoPhase,
    /// Adds the much larger tables the optimal solver needs.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Where table files are kept. `None` builds every table in memory and saves nothing.
    pub dir: Option<PathBuf>,
    pub set: TableSet,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            dir: Some(PathBuf::from("tables")),
            set: TableSet::TwoPhase,
        }
    }
}

/// Every table the solvers read. Built once, then shared read-only.
#[derive(Debug)]
pub struct Tables {
    pub moves: MoveTables,
    pub symmetry: SymmetryTables,
    pub pruning: PruningTables,
    optimal: Option<OptimalTables>,
}

impl Tables {
    pub fn load_or_build(config: &TableConfig) -> anyhow::Result<Tables> {
        let store = Store::new(config.dir.as_deref());
        let start = std::time::Instant::now();

        let moves = MoveTables::load_or_build(&store)?;
        let symmetry = SymmetryTables::load_or_build(&store)?;
        let pruning = PruningTables::load_or_build(&store, &moves, &symmetry)?;
        let optimal = match config.set {
            TableSet::TwoPhase => None,
            TableSet::Full => Some(OptimalTables::load_or_build(&store, &moves, &symmetry)?),
        };

        log::info!("Tables ready, took {:?}", start.elapsed());
        Ok(Tables {
            moves,
            symmetry,
            pruning,
            optimal,
        })
    }

    pub fn set(&self) -> TableSet {
        match self.optimal {
            Some(_) => TableSet::Full,
            None => TableSet::TwoPhase,
        }
    }

    pub fn optimal(&self) -> anyhow::Result<&OptimalTables> {
        self.optimal.as_ref().ok_or_else(|| {
            anyhow::anyhow!("The optimal solver needs tables loaded with TableSet::Full")
        })
    }
}
