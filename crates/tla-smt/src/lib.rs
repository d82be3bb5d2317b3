//! tla-smt - Solver interface for symbolic TLA+ model checking
//!
//! This crate provides the narrow, scoped solver interface the symbolic
//! checker talks to, the ground constraint language it speaks, and the
//! backends behind it.
//!
//! # Features
//!
//! - Ground terms over cells: booleans, integers, strings, arrays and
//!   membership oracles
//! - Scoped declarations and assertions (`push`/`pop`)
//! - An in-memory finite-domain solver that needs no native library
//! - Recording and replay of solver sessions
//! - A Z3 backend behind the `z3` feature
//!
//! # Example
//!
//! ```rust
//! use tla_core::CellId;
//! use tla_smt::{MemorySolver, SmtCheckResult, SolverContext, Sort, Term};
//!
//! let mut solver = MemorySolver::new();
//! solver.declare_cell(CellId(0), &Sort::Bool).unwrap();
//! solver.assert_ground_expr(&Term::not(Term::cell(CellId(0)))).unwrap();
//! assert_eq!(solver.check_sat().unwrap(), SmtCheckResult::Sat);
//! ```

mod context;
mod error;
mod memory;
mod recording;
mod term;
#[cfg(feature = "z3")]
mod z3_backend;

pub use context::{SmtCheckResult, SolverContext, Value};
pub use error::{SmtError, SmtResult as Result};
pub use memory::{MemorySolver, DEFAULT_MAX_ASSIGNMENTS};
pub use recording::{RecordingSolver, ReplaySolver, SolverCall, SolverLog};
pub use term::{Sort, Term};
#[cfg(feature = "z3")]
pub use z3_backend::Z3SolverContext;
