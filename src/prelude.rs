pub use crate::constants::*;
pub use crate::cube::*;
pub use crate::error::*;
pub use crate::r#move::*;
pub use crate::solver::*;
pub use crate::tables::*;

#[cfg(test)]
pub use crate::test::*;

pub use std::time::Duration;
