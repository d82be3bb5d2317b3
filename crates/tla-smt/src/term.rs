//! Ground constraint terms
//!
//! Terms are the solver-neutral language the rewriting rules emit. They are
//! ground: the only constants are literals and declared cells, and the only
//! predicates besides the usual connectives are array selection (for the
//! array encoding of sets) and the membership oracle `in(e, S)` (for the
//! oracle encoding).

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;
use tla_core::CellId;

use crate::error::{SmtError, SmtResult};

/// Sort (type) of a term in the solver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sort {
    /// Boolean sort
    Bool,
    /// Integer sort
    Int,
    /// String sort
    Str,
    /// Uninterpreted sort, used for cells the solver only needs to tell apart
    Uninterpreted(String),
    /// Array from the index sort to Bool (characteristic function of a set)
    Array(Box<Sort>),
}

impl Sort {
    pub fn array(index: Sort) -> Self {
        Sort::Array(Box::new(index))
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Int => write!(f, "Int"),
            Sort::Str => write!(f, "Str"),
            Sort::Uninterpreted(name) => write!(f, "{}", name),
            Sort::Array(index) => write!(f, "(Array {} Bool)", index),
        }
    }
}

/// A ground constraint term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Bool(bool),
    Int(BigInt),
    Str(String),
    /// The solver constant of a declared cell
    Cell(CellId),
    Not(Box<Term>),
    /// N-ary conjunction; empty is true
    And(Vec<Term>),
    /// N-ary disjunction; empty is false
    Or(Vec<Term>),
    Implies(Box<Term>, Box<Term>),
    Iff(Box<Term>, Box<Term>),
    Eq(Box<Term>, Box<Term>),
    Lt(Box<Term>, Box<Term>),
    Le(Box<Term>, Box<Term>),
    Add(Vec<Term>),
    Sub(Box<Term>, Box<Term>),
    Ite(Box<Term>, Box<Term>, Box<Term>),
    /// Membership oracle: the boolean atom `in(elem, set)`
    InOracle { elem: CellId, set: CellId },
    /// `array[index]`
    Select { array: Box<Term>, index: Box<Term> },
    /// `array` with `index` mapped to `value`
    Store {
        array: Box<Term>,
        index: Box<Term>,
        value: Box<Term>,
    },
    /// The array mapping every index of the given sort to `value`
    ConstArray { index: Sort, value: bool },
    /// Pairwise distinct
    Distinct(Vec<Term>),
}

impl Term {
    pub fn cell(cell: CellId) -> Self {
        Term::Cell(cell)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(t: Term) -> Self {
        Term::Not(Box::new(t))
    }

    pub fn and(ts: Vec<Term>) -> Self {
        Term::And(ts)
    }

    pub fn or(ts: Vec<Term>) -> Self {
        Term::Or(ts)
    }

    pub fn implies(a: Term, b: Term) -> Self {
        Term::Implies(Box::new(a), Box::new(b))
    }

    pub fn iff(a: Term, b: Term) -> Self {
        Term::Iff(Box::new(a), Box::new(b))
    }

    pub fn eq(a: Term, b: Term) -> Self {
        Term::Eq(Box::new(a), Box::new(b))
    }

    pub fn lt(a: Term, b: Term) -> Self {
        Term::Lt(Box::new(a), Box::new(b))
    }

    pub fn le(a: Term, b: Term) -> Self {
        Term::Le(Box::new(a), Box::new(b))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(a: Term, b: Term) -> Self {
        Term::Add(vec![a, b])
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sub(a: Term, b: Term) -> Self {
        Term::Sub(Box::new(a), Box::new(b))
    }

    pub fn ite(c: Term, t: Term, e: Term) -> Self {
        Term::Ite(Box::new(c), Box::new(t), Box::new(e))
    }

    pub fn in_oracle(elem: CellId, set: CellId) -> Self {
        Term::InOracle { elem, set }
    }

    pub fn select(array: Term, index: Term) -> Self {
        Term::Select {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn store(array: Term, index: Term, value: Term) -> Self {
        Term::Store {
            array: Box::new(array),
            index: Box::new(index),
            value: Box::new(value),
        }
    }

    /// The empty set over `index` in the array encoding
    pub fn empty_array(index: Sort) -> Self {
        Term::ConstArray {
            index,
            value: false,
        }
    }

    /// Cells mentioned anywhere in this term, oracle atoms included
    pub fn cells(&self) -> Vec<CellId> {
        let mut out = Vec::new();
        self.collect_cells(&mut out);
        out
    }

    fn collect_cells(&self, out: &mut Vec<CellId>) {
        match self {
            Term::Bool(_) | Term::Int(_) | Term::Str(_) | Term::ConstArray { .. } => {}
            Term::Cell(c) => out.push(*c),
            Term::InOracle { elem, set } => {
                out.push(*elem);
                out.push(*set);
            }
            Term::Not(t) => t.collect_cells(out),
            Term::And(ts) | Term::Or(ts) | Term::Add(ts) | Term::Distinct(ts) => {
                ts.iter().for_each(|t| t.collect_cells(out))
            }
            Term::Implies(a, b)
            | Term::Iff(a, b)
            | Term::Eq(a, b)
            | Term::Lt(a, b)
            | Term::Le(a, b)
            | Term::Sub(a, b)
            | Term::Select { array: a, index: b } => {
                a.collect_cells(out);
                b.collect_cells(out);
            }
            Term::Ite(a, b, c)
            | Term::Store {
                array: a,
                index: b,
                value: c,
            } => {
                a.collect_cells(out);
                b.collect_cells(out);
                c.collect_cells(out);
            }
        }
    }

    /// Infer the sort of this term, looking up cell sorts with `sort_of`.
    ///
    /// Fails with `UndeclaredCell` for unknown cells and with
    /// `ConstraintEncoding` for ill-sorted applications.
    pub fn sort_with<F>(&self, sort_of: &F) -> SmtResult<Sort>
    where
        F: Fn(CellId) -> Option<Sort>,
    {
        let expect = |t: &Term, want: &Sort| -> SmtResult<()> {
            let got = t.sort_with(sort_of)?;
            if &got == want {
                Ok(())
            } else {
                Err(SmtError::ConstraintEncoding(format!(
                    "expected {} but `{}` has sort {}",
                    want, t, got
                )))
            }
        };
        match self {
            Term::Bool(_) => Ok(Sort::Bool),
            Term::Int(_) => Ok(Sort::Int),
            Term::Str(_) => Ok(Sort::Str),
            Term::Cell(c) => sort_of(*c).ok_or(SmtError::UndeclaredCell(*c)),
            Term::Not(t) => {
                expect(t, &Sort::Bool)?;
                Ok(Sort::Bool)
            }
            Term::And(ts) | Term::Or(ts) => {
                for t in ts {
                    expect(t, &Sort::Bool)?;
                }
                Ok(Sort::Bool)
            }
            Term::Implies(a, b) | Term::Iff(a, b) => {
                expect(a, &Sort::Bool)?;
                expect(b, &Sort::Bool)?;
                Ok(Sort::Bool)
            }
            Term::Eq(a, b) => {
                let sa = a.sort_with(sort_of)?;
                expect(b, &sa)?;
                Ok(Sort::Bool)
            }
            Term::Distinct(ts) => {
                if let Some(first) = ts.first() {
                    let s = first.sort_with(sort_of)?;
                    for t in &ts[1..] {
                        expect(t, &s)?;
                    }
                }
                Ok(Sort::Bool)
            }
            Term::Lt(a, b) | Term::Le(a, b) => {
                expect(a, &Sort::Int)?;
                expect(b, &Sort::Int)?;
                Ok(Sort::Bool)
            }
            Term::Add(ts) => {
                for t in ts {
                    expect(t, &Sort::Int)?;
                }
                Ok(Sort::Int)
            }
            Term::Sub(a, b) => {
                expect(a, &Sort::Int)?;
                expect(b, &Sort::Int)?;
                Ok(Sort::Int)
            }
            Term::Ite(c, t, e) => {
                expect(c, &Sort::Bool)?;
                let st = t.sort_with(sort_of)?;
                expect(e, &st)?;
                Ok(st)
            }
            Term::InOracle { elem, set } => {
                sort_of(*elem).ok_or(SmtError::UndeclaredCell(*elem))?;
                sort_of(*set).ok_or(SmtError::UndeclaredCell(*set))?;
                Ok(Sort::Bool)
            }
            Term::Select { array, index } => {
                let index_sort = array_index(array, sort_of)?;
                expect(index, &index_sort)?;
                Ok(Sort::Bool)
            }
            Term::Store {
                array,
                index,
                value,
            } => {
                let index_sort = array_index(array, sort_of)?;
                expect(index, &index_sort)?;
                expect(value, &Sort::Bool)?;
                Ok(Sort::array(index_sort))
            }
            Term::ConstArray { index, .. } => Ok(Sort::array(index.clone())),
        }
    }
}

fn array_index<F>(array: &Term, sort_of: &F) -> SmtResult<Sort>
where
    F: Fn(CellId) -> Option<Sort>,
{
    match array.sort_with(sort_of)? {
        Sort::Array(index) => Ok(*index),
        other => Err(SmtError::ConstraintEncoding(format!(
            "`{}` has sort {}, expected an array",
            array, other
        ))),
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, op: &str, ts: &[Term]) -> fmt::Result {
    write!(f, "({}", op)?;
    for t in ts {
        write!(f, " {}", t)?;
    }
    write!(f, ")")
}

/// SMT-LIB flavoured rendering, used in debug logs and error messages
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Bool(b) => write!(f, "{}", b),
            Term::Int(n) => write!(f, "{}", n),
            Term::Str(s) => write!(f, "{:?}", s),
            Term::Cell(c) => write!(f, "{}", c),
            Term::Not(t) => write!(f, "(not {})", t),
            Term::And(ts) => write_list(f, "and", ts),
            Term::Or(ts) => write_list(f, "or", ts),
            Term::Implies(a, b) => write!(f, "(=> {} {})", a, b),
            Term::Iff(a, b) => write!(f, "(= {} {})", a, b),
            Term::Eq(a, b) => write!(f, "(= {} {})", a, b),
            Term::Lt(a, b) => write!(f, "(< {} {})", a, b),
            Term::Le(a, b) => write!(f, "(<= {} {})", a, b),
            Term::Add(ts) => write_list(f, "+", ts),
            Term::Sub(a, b) => write!(f, "(- {} {})", a, b),
            Term::Ite(c, t, e) => write!(f, "(ite {} {} {})", c, t, e),
            Term::InOracle { elem, set } => write!(f, "(in {} {})", elem, set),
            Term::Select { array, index } => write!(f, "(select {} {})", array, index),
            Term::Store {
                array,
                index,
                value,
            } => write!(f, "(store {} {} {})", array, index, value),
            Term::ConstArray { index, value } => {
                write!(f, "((as const (Array {} Bool)) {})", index, value)
            }
            Term::Distinct(ts) => write_list(f, "distinct", ts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorts(c: CellId) -> Option<Sort> {
        match c.0 {
            0 => Some(Sort::Bool),
            1 => Some(Sort::Int),
            2 => Some(Sort::array(Sort::Int)),
            _ => None,
        }
    }

    #[test]
    fn test_sort_inference() {
        let t = Term::store(
            Term::cell(CellId(2)),
            Term::add(Term::cell(CellId(1)), Term::Int(BigInt::from(1))),
            Term::cell(CellId(0)),
        );
        assert_eq!(t.sort_with(&sorts).unwrap(), Sort::array(Sort::Int));
        let sel = Term::select(t, Term::Int(BigInt::from(3)));
        assert_eq!(sel.sort_with(&sorts).unwrap(), Sort::Bool);
    }

    #[test]
    fn test_ill_sorted_terms() {
        let bad = Term::and(vec![Term::cell(CellId(1))]);
        assert!(matches!(
            bad.sort_with(&sorts),
            Err(SmtError::ConstraintEncoding(_))
        ));
        let undeclared = Term::eq(Term::cell(CellId(9)), Term::Int(BigInt::from(0)));
        assert_eq!(
            undeclared.sort_with(&sorts),
            Err(SmtError::UndeclaredCell(CellId(9)))
        );
    }

    #[test]
    fn test_display() {
        let t = Term::iff(
            Term::in_oracle(CellId(3), CellId(4)),
            Term::and(vec![Term::Bool(true), Term::not(Term::cell(CellId(0)))]),
        );
        assert_eq!(t.to_string(), "(= (in $C$3 $C$4) (and true (not $C$0)))");
        assert_eq!(
            Term::empty_array(Sort::Int).to_string(),
            "((as const (Array Int Bool)) false)"
        );
    }

    #[test]
    fn test_cells_collected() {
        let t = Term::ite(
            Term::cell(CellId(0)),
            Term::in_oracle(CellId(5), CellId(6)),
            Term::Bool(false),
        );
        assert_eq!(t.cells(), vec![CellId(0), CellId(5), CellId(6)]);
    }
}
