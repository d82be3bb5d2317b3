//! The narrow solver interface consumed by the symbolic checker

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tla_core::CellId;

use crate::error::SmtResult;
use crate::term::{Sort, Term};

/// Value of a term in the last model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(BigInt),
    /// String value
    Str(String),
    /// Value of an uninterpreted sort, in the backend's own notation
    Opaque(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Opaque(s) => write!(f, "{}", s),
        }
    }
}

/// Result of a satisfiability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmtCheckResult {
    /// Constraints are satisfiable; a model is available for `evaluate`
    Sat,
    /// Constraints are unsatisfiable
    Unsat,
    /// Result is unknown (incompleteness, resource limits)
    Unknown(String),
}

impl SmtCheckResult {
    /// Check if the result is satisfiable
    pub fn is_sat(&self) -> bool {
        matches!(self, SmtCheckResult::Sat)
    }

    /// Check if the result is unsatisfiable
    pub fn is_unsat(&self) -> bool {
        matches!(self, SmtCheckResult::Unsat)
    }

    /// Check if the result is unknown
    pub fn is_unknown(&self) -> bool {
        matches!(self, SmtCheckResult::Unknown(_))
    }
}

impl fmt::Display for SmtCheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmtCheckResult::Sat => write!(f, "sat"),
            SmtCheckResult::Unsat => write!(f, "unsat"),
            SmtCheckResult::Unknown(reason) => write!(f, "unknown ({})", reason),
        }
    }
}

/// A scoped, incremental solver.
///
/// Declarations and assertions made after a `push` are discarded by the
/// matching `pop`. A timeout set with `set_timeout` applies to every later
/// `check_sat` and surfaces as [`SmtError::Timeout`](crate::SmtError::Timeout).
pub trait SolverContext {
    /// Make `cell` a solver constant of the given sort in the current scope.
    /// Re-declaring a visible cell with the same sort is a no-op.
    fn declare_cell(&mut self, cell: CellId, sort: &Sort) -> SmtResult<()>;

    /// Add a ground boolean constraint to the current scope
    fn assert_ground_expr(&mut self, term: &Term) -> SmtResult<()>;

    fn push(&mut self) -> SmtResult<()>;

    /// Discard the innermost scope; fails on an empty stack
    fn pop(&mut self) -> SmtResult<()>;

    /// Number of open scopes
    fn depth(&self) -> usize;

    fn check_sat(&mut self) -> SmtResult<SmtCheckResult>;

    /// Evaluate a term in the model of the last satisfiable `check_sat`
    fn evaluate(&mut self, term: &Term) -> SmtResult<Value>;

    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Pop scopes until `depth() == target`
    fn pop_to(&mut self, target: usize) -> SmtResult<()> {
        while self.depth() > target {
            self.pop()?;
        }
        Ok(())
    }
}

impl<S: SolverContext + ?Sized> SolverContext for Box<S> {
    fn declare_cell(&mut self, cell: CellId, sort: &Sort) -> SmtResult<()> {
        (**self).declare_cell(cell, sort)
    }

    fn assert_ground_expr(&mut self, term: &Term) -> SmtResult<()> {
        (**self).assert_ground_expr(term)
    }

    fn push(&mut self) -> SmtResult<()> {
        (**self).push()
    }

    fn pop(&mut self) -> SmtResult<()> {
        (**self).pop()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }

    fn check_sat(&mut self) -> SmtResult<SmtCheckResult> {
        (**self).check_sat()
    }

    fn evaluate(&mut self, term: &Term) -> SmtResult<Value> {
        (**self).evaluate(term)
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        (**self).set_timeout(timeout)
    }
}
