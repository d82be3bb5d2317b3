//! tla-bmc - Symbolic bounded model checking for TLA+
//!
//! This crate translates typed TLA+ expressions into solver constraints and
//! executes transitions symbolically, one solver scope per step.
//!
//! # Overview
//!
//! - [`Arena`]: append-only ledger of cells, the symbolic memory
//! - [`Rewriter`] and [`RuleSet`]: rewrite an expression to a single cell,
//!   emitting constraints as a side effect
//! - [`TransitionExecutor`]: begin, rewrite and commit steps; snapshot and
//!   restore for backtracking; check invariants
//! - [`BoundedChecker`]: depth-first search over alternative transitions
//!
//! # Example
//!
//! ```rust
//! use tla_bmc::{BmcConfig, BoundedChecker, CheckOutcome, Problem};
//! use tla_core::{ExprBuilder, TlaType};
//! use tla_smt::MemorySolver;
//!
//! let b = ExprBuilder::new();
//! let x = || b.name("x", TlaType::Int);
//! let problem = Problem::new(["x"], b.assign("x", b.int(0)))
//!     .transition(b.and(vec![
//!         b.lt(x(), b.int(3)),
//!         b.assign("x", b.add(x(), b.int(1))),
//!     ]))
//!     .invariant("Small", b.lt(x(), b.int(2)));
//!
//! let mut checker = BoundedChecker::new(MemorySolver::new(), BmcConfig::default(), problem)?;
//! match checker.run()? {
//!     CheckOutcome::Violation { invariant, depth, trace } => {
//!         assert_eq!(invariant, "Small");
//!         assert_eq!(depth, 2);
//!         println!("{}", trace);
//!     }
//!     other => panic!("unexpected outcome: {:?}", other),
//! }
//! # Ok::<(), tla_bmc::BmcError>(())
//! ```

pub mod arena;
pub mod cache;
pub mod config;
pub mod decode;
pub mod encoding;
pub mod error;
pub mod executor;
pub mod rewriter;
pub mod rules;
pub mod search;
pub mod state;

#[cfg(test)]
mod test_support;

pub use arena::{Arena, ArenaMark, Cell, CellType};
pub use cache::{Literal, RewriteCache};
pub use config::{BmcConfig, BmcConfigBuilder, Encoding, ExecutionMode};
pub use decode::{decode_cell, StateValue};
pub use error::{BmcError, BmcResult};
pub use executor::{
    Counterexample, FailureReason, InvariantVerdict, Phase, SnapshotToken, StepOutcome,
    TransitionExecutor,
};
pub use rewriter::{RewriteStats, Rewriter, RewritingRule, RuleSet};
pub use search::{BoundedChecker, CheckOutcome, Problem, SearchStats};
pub use state::{Binding, SymbState};
