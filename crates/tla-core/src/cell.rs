//! Identities of symbolic memory cells
//!
//! Cells are allocated by the arena of a symbolic checker. The identity is all
//! that the AST, the constraint terms and the solver ever see of a cell.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a cell, unique and increasing within one arena lineage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl CellId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Cells print as solver-friendly constant names: `$C$12`
impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$C${}", self.0)
    }
}
