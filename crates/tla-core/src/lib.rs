//! tla-core - Typed TLA+ expressions for the symbolic checker
//!
//! This crate holds what the front-end hands to the symbolic model checker:
//! - `ast`: the typed, identified, span-annotated expression tree
//! - `types`: the inferred types carried by every node
//! - `span`: source locations
//! - `cell`: identities of symbolic memory cells, shared by the checker
//!   and the solver layer
//! - `builder`: programmatic construction of well-formed trees
//! - `pretty`: rendering back to TLA+ notation
//!
//! # Example
//!
//! ```
//! use tla_core::{ExprBuilder, TlaType};
//!
//! let b = ExprBuilder::new();
//! let next = b.assign("x", b.add(b.name("x", TlaType::Int), b.int(1)));
//! assert_eq!(next.to_string(), "x' := (x + 1)");
//! ```

pub mod ast;
pub mod builder;
pub mod cell;
pub mod pretty;
pub mod span;
pub mod types;

pub use ast::{Expr, ExprId, ExprKind, ExprRef};
pub use builder::ExprBuilder;
pub use cell::CellId;
pub use pretty::pretty_expr;
pub use span::{FileId, Position, Span};
pub use types::TlaType;
