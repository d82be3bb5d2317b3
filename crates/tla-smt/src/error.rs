//! Error types for solver operations

use thiserror::Error;
use tla_core::CellId;

/// Result type alias for solver operations
pub type SmtResult<T> = std::result::Result<T, SmtError>;

/// Errors that can occur while talking to a solver
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SmtError {
    /// Term is malformed or ill-sorted and cannot be asserted
    #[error("cannot encode constraint: {0}")]
    ConstraintEncoding(String),

    /// Term mentions a cell that was never declared in any open scope
    #[error("undeclared cell: {0}")]
    UndeclaredCell(CellId),

    /// Cell declared twice with different sorts
    #[error("sort mismatch for cell {cell}: declared {declared}, requested {requested}")]
    SortMismatch {
        cell: CellId,
        declared: String,
        requested: String,
    },

    /// `pop` on an empty scope stack
    #[error("pop on empty solver scope stack")]
    ScopeUnderflow,

    /// Timeout during solving
    #[error("solver timed out after {0}ms")]
    Timeout(u64),

    /// Model extraction error
    #[error("failed to extract model: {0}")]
    ModelError(String),

    /// A replayed call did not match the recorded trace
    #[error("replay diverged at call {index}: expected {expected}, got {actual}")]
    ReplayDivergence {
        index: usize,
        expected: String,
        actual: String,
    },

    /// Operation the backend does not offer
    #[error("unsupported solver operation: {0}")]
    Unsupported(String),

    /// Z3 solver error
    #[error("Z3 error: {0}")]
    Z3Error(String),
}
