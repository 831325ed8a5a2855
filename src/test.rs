use crate::prelude::*;

pub fn cube_with_moves(moves: &str) -> CubieCube {
    CubieCube::solved().apply_all(Move::parse_sequence(moves).unwrap())
}

fn test_config(set: TableSet) -> TableConfig {
    TableConfig {
        dir: Some(concat!(env!("CARGO_MANIFEST_DIR"), "/target/test-tables").into()),
        set,
    }
}

lazy_static::lazy_static! {
    static ref TABLES: Tables = Tables::load_or_build(&test_config(TableSet::TwoPhase)).unwrap();
    static ref FULL_TABLES: Tables = Tables::load_or_build(&test_config(TableSet::Full)).unwrap();
}

/// The two-phase tables, built once per test run and cached on disk between runs.
pub fn tables() -> &'static Tables {
    &TABLES
}

/// Every table, optimal ones included. Only for ignored tests.
pub fn full_tables() -> &'static Tables {
    &FULL_TABLES
}
