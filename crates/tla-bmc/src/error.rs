//! Error types for the symbolic checker

use thiserror::Error;
use tla_core::{CellId, Span};
use tla_smt::SmtError;

/// Result type for symbolic checking operations
pub type BmcResult<T> = Result<T, BmcError>;

/// Errors that can occur while rewriting or executing transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BmcError {
    /// No rewriting rule handles the expression
    #[error("no rewriting rule applies to `{expr}`")]
    NoApplicableRule { expr: String, span: Option<Span> },

    /// A cell identity that the arena never allocated
    #[error("unknown cell {0}")]
    UnknownCell(CellId),

    /// An operand has the wrong type
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Option<Span>,
    },

    /// A rule was applied to an expression it does not handle
    #[error("rule `{rule}` applied to `{expr}`")]
    RuleMisuse { rule: &'static str, expr: String },

    /// A name with no cell in the current binding
    #[error("unbound name: {name}")]
    UnboundName { name: String, span: Option<Span> },

    /// Construct outside the supported fragment
    #[error("unsupported: {what}")]
    Unsupported { what: String, span: Option<Span> },

    /// Executor operation not allowed in the current phase
    #[error("cannot {op} while {phase}")]
    InvalidStateTransition { op: &'static str, phase: String },

    /// Snapshot token from another context or a discarded future
    #[error("invalid snapshot token")]
    InvalidSnapshot,

    /// Too many snapshots held at once
    #[error("snapshot depth limit of {0} exceeded")]
    SnapshotDepthExceeded(usize),

    /// The configured number of transitions has been taken
    #[error("step bound of {0} transitions exceeded")]
    StepBoundExceeded(usize),

    /// A state variable was not assigned by the committed step
    #[error("state variable `{0}` has no assignment after the step")]
    MissingAssignment(String),

    /// Configuration values that cannot work together
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Solver error
    #[error("solver error: {0}")]
    Solver(#[from] SmtError),
}

impl BmcError {
    pub fn type_mismatch(
        expected: impl ToString,
        found: impl ToString,
        span: Option<Span>,
    ) -> Self {
        BmcError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            span,
        }
    }

    pub fn unsupported(what: impl Into<String>, span: Option<Span>) -> Self {
        BmcError::Unsupported {
            what: what.into(),
            span,
        }
    }

    /// Get the span associated with this error, if any
    pub fn span(&self) -> Option<Span> {
        match self {
            BmcError::NoApplicableRule { span, .. } => *span,
            BmcError::TypeMismatch { span, .. } => *span,
            BmcError::UnboundName { span, .. } => *span,
            BmcError::Unsupported { span, .. } => *span,
            _ => None,
        }
    }
}
