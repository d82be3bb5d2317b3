//! Solver representation of cells
//!
//! Primitive cells are solver constants of their own sort. Sets are encoded
//! per the configured [`Encoding`]: with `Arrays`, a set of primitive
//! elements is an array from elements to Bool; sets of structured elements,
//! and every set under `Oracles`, are constants of an uninterpreted sort whose
//! membership is the atom `in(e, S)`. Records and functions are constants of
//! uninterpreted sorts; their content lives in the arena's edges.

use tla_core::CellId;
use tla_smt::{Sort, Term};

use crate::arena::CellType;
use crate::config::Encoding;

/// How a particular set type is represented
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetRepr {
    /// Characteristic array indexed by the given sort
    Array(Sort),
    /// Membership oracle
    Oracle,
}

/// Solver sort of a primitive cell type
pub fn primitive_sort(ty: &CellType) -> Option<Sort> {
    match ty {
        CellType::Bool => Some(Sort::Bool),
        CellType::Int => Some(Sort::Int),
        CellType::Str => Some(Sort::Str),
        _ => None,
    }
}

/// Representation of sets with elements of type `elem`
pub fn set_repr(encoding: Encoding, elem: &CellType) -> SetRepr {
    match (encoding, primitive_sort(elem)) {
        (Encoding::Arrays, Some(index)) => SetRepr::Array(index),
        _ => SetRepr::Oracle,
    }
}

/// Sort of the solver constant declared for a cell of type `ty`
pub fn sort_of(encoding: Encoding, ty: &CellType) -> Sort {
    match ty {
        CellType::Bool => Sort::Bool,
        CellType::Int => Sort::Int,
        CellType::Str => Sort::Str,
        CellType::FinSet(elem) => match set_repr(encoding, elem) {
            SetRepr::Array(index) => Sort::array(index),
            SetRepr::Oracle => Sort::Uninterpreted("Set".to_string()),
        },
        CellType::Fun(..) => Sort::Uninterpreted("Fun".to_string()),
        CellType::Record(_) => Sort::Uninterpreted("Record".to_string()),
    }
}

/// The boolean term "`elem` is a member of `set`"
pub fn membership(repr: &SetRepr, elem: CellId, set: CellId) -> Term {
    match repr {
        SetRepr::Array(_) => Term::select(Term::cell(set), Term::cell(elem)),
        SetRepr::Oracle => Term::in_oracle(elem, set),
    }
}
