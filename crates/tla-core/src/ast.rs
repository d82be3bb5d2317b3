//! Typed expression tree for TLA+
//!
//! This module defines the expressions consumed by the symbolic checker.
//! The AST is designed to be:
//! - Typed: every node carries its inferred `TlaType`
//! - Identified: every node has an `ExprId` unique within the process
//! - Span-aware: every node has source location info
//! - Immutable: children are shared `Arc`s, suitable for caching and sharing
//!
//! Besides the front-end's constructs the tree has one extra leaf,
//! [`ExprKind::Cell`], which the rewriting engine uses to stand for an
//! already-normalized sub-expression.

use crate::cell::CellId;
use crate::span::Span;
use crate::types::TlaType;
use num_bigint::BigInt;
use std::sync::Arc;

/// Unique identifier of an AST node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

/// Shared reference to an expression
pub type ExprRef = Arc<Expr>;

/// A typed, located expression node
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub ty: TlaType,
    pub span: Span,
    /// No free names anywhere below this node
    closed: bool,
}

/// TLA+ expressions
#[derive(Debug, Clone)]
pub enum ExprKind {
    // === Literals ===
    /// TRUE or FALSE
    Bool(bool),
    /// Integer literal
    Int(BigInt),
    /// String literal
    Str(String),

    // === Names ===
    /// State variable, bound variable, or primed variable (`x'`)
    Name(String),
    /// Reference to a symbolic memory cell (normal form)
    Cell(CellId),

    // === Operators ===
    /// Application of a user-defined operator that the front-end did not inline
    OperApp(String, Vec<ExprRef>),

    // === Logic ===
    /// Conjunction: A /\ B /\ ...
    And(Vec<ExprRef>),
    /// Disjunction: A \/ B \/ ...
    Or(Vec<ExprRef>),
    /// Negation: ~A
    Not(ExprRef),
    /// Implication: A => B
    Implies(ExprRef, ExprRef),
    /// Equivalence: A <=> B
    Equiv(ExprRef, ExprRef),

    // === Quantifiers ===
    /// Existential: \E x \in S : P
    Exists {
        var: String,
        set: ExprRef,
        body: ExprRef,
    },
    /// Universal: \A x \in S : P
    Forall {
        var: String,
        set: ExprRef,
        body: ExprRef,
    },

    // === Sets ===
    /// Set enumeration: {a, b, c}
    SetEnum(Vec<ExprRef>),
    /// Membership: x \in S
    In(ExprRef, ExprRef),
    /// Non-membership: x \notin S
    NotIn(ExprRef, ExprRef),
    /// Set filter: {x \in S : P}
    SetFilter {
        var: String,
        set: ExprRef,
        pred: ExprRef,
    },

    // === Functions ===
    /// Function definition: [x \in S |-> e]
    FunCtor {
        var: String,
        set: ExprRef,
        body: ExprRef,
    },
    /// Function application: `f[x]`
    FunApp(ExprRef, ExprRef),

    // === Records ===
    /// Record constructor: [a |-> 1, b |-> 2]
    Record(Vec<(String, ExprRef)>),
    /// Record field access: r.field
    RecordAccess(ExprRef, String),

    // === Actions ===
    /// Assignment to a primed variable: x' := e (the name includes the prime)
    Assign(String, ExprRef),
    /// UNCHANGED <<x, y>>; the operands are `Name` nodes of state variables
    Unchanged(Vec<ExprRef>),

    // === Control ===
    /// IF cond THEN a ELSE b
    If(ExprRef, ExprRef, ExprRef),

    // === Comparison ===
    /// Equality: a = b
    Eq(ExprRef, ExprRef),
    /// Inequality: a /= b
    Neq(ExprRef, ExprRef),
    /// Less than: a < b
    Lt(ExprRef, ExprRef),
    /// Less or equal: a <= b
    Leq(ExprRef, ExprRef),
    /// Greater than: a > b
    Gt(ExprRef, ExprRef),
    /// Greater or equal: a >= b
    Geq(ExprRef, ExprRef),

    // === Arithmetic ===
    /// Addition: a + b
    Add(ExprRef, ExprRef),
    /// Subtraction: a - b
    Sub(ExprRef, ExprRef),
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind, ty: TlaType, span: Span) -> Self {
        let closed = match &kind {
            ExprKind::Name(_) | ExprKind::Assign(..) | ExprKind::Unchanged(_) => false,
            ExprKind::Exists { .. }
            | ExprKind::Forall { .. }
            | ExprKind::SetFilter { .. }
            | ExprKind::FunCtor { .. } => false,
            other => other.children().iter().all(|c| c.closed),
        };
        Expr {
            id,
            kind,
            ty,
            span,
            closed,
        }
    }

    /// A cell reference standing for this node
    pub fn to_cell(&self, cell: CellId) -> ExprRef {
        Arc::new(Expr::new(
            self.id,
            ExprKind::Cell(cell),
            self.ty.clone(),
            self.span,
        ))
    }

    /// A synthesized node reusing this node's identity and location
    pub fn derive(&self, kind: ExprKind, ty: TlaType) -> ExprRef {
        Arc::new(Expr::new(self.id, kind, ty, self.span))
    }

    /// The cell this node refers to, if it is in normal form
    pub fn cell(&self) -> Option<CellId> {
        match self.kind {
            ExprKind::Cell(cell) => Some(cell),
            _ => None,
        }
    }

    /// True when no name occurs free below this node, so its value does not
    /// depend on the binding it is rewritten under
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of nodes in this tree
    pub fn size(&self) -> usize {
        1 + self.kind.children().iter().map(|c| c.size()).sum::<usize>()
    }
}

impl ExprKind {
    /// Direct sub-expressions, in source order
    pub fn children(&self) -> Vec<&ExprRef> {
        match self {
            ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Str(_)
            | ExprKind::Name(_)
            | ExprKind::Cell(_) => Vec::new(),
            ExprKind::OperApp(_, args)
            | ExprKind::And(args)
            | ExprKind::Or(args)
            | ExprKind::SetEnum(args)
            | ExprKind::Unchanged(args) => args.iter().collect(),
            ExprKind::Not(e) | ExprKind::RecordAccess(e, _) | ExprKind::Assign(_, e) => vec![e],
            ExprKind::Exists { set, body, .. }
            | ExprKind::Forall { set, body, .. }
            | ExprKind::FunCtor { set, body, .. } => vec![set, body],
            ExprKind::SetFilter { set, pred, .. } => vec![set, pred],
            ExprKind::Record(fields) => fields.iter().map(|(_, e)| e).collect(),
            ExprKind::If(c, t, e) => vec![c, t, e],
            ExprKind::Implies(a, b)
            | ExprKind::Equiv(a, b)
            | ExprKind::In(a, b)
            | ExprKind::NotIn(a, b)
            | ExprKind::FunApp(a, b)
            | ExprKind::Eq(a, b)
            | ExprKind::Neq(a, b)
            | ExprKind::Lt(a, b)
            | ExprKind::Leq(a, b)
            | ExprKind::Gt(a, b)
            | ExprKind::Geq(a, b)
            | ExprKind::Add(a, b)
            | ExprKind::Sub(a, b) => vec![a, b],
        }
    }

    /// Short operator tag used in diagnostics
    pub fn tag(&self) -> &'static str {
        match self {
            ExprKind::Bool(_) => "Bool",
            ExprKind::Int(_) => "Int",
            ExprKind::Str(_) => "Str",
            ExprKind::Name(_) => "Name",
            ExprKind::Cell(_) => "Cell",
            ExprKind::OperApp(..) => "OperApp",
            ExprKind::And(_) => "And",
            ExprKind::Or(_) => "Or",
            ExprKind::Not(_) => "Not",
            ExprKind::Implies(..) => "Implies",
            ExprKind::Equiv(..) => "Equiv",
            ExprKind::Exists { .. } => "Exists",
            ExprKind::Forall { .. } => "Forall",
            ExprKind::SetEnum(_) => "SetEnum",
            ExprKind::In(..) => "In",
            ExprKind::NotIn(..) => "NotIn",
            ExprKind::SetFilter { .. } => "SetFilter",
            ExprKind::FunCtor { .. } => "FunCtor",
            ExprKind::FunApp(..) => "FunApp",
            ExprKind::Record(_) => "Record",
            ExprKind::RecordAccess(..) => "RecordAccess",
            ExprKind::Assign(..) => "Assign",
            ExprKind::Unchanged(_) => "Unchanged",
            ExprKind::If(..) => "If",
            ExprKind::Eq(..) => "Eq",
            ExprKind::Neq(..) => "Neq",
            ExprKind::Lt(..) => "Lt",
            ExprKind::Leq(..) => "Leq",
            ExprKind::Gt(..) => "Gt",
            ExprKind::Geq(..) => "Geq",
            ExprKind::Add(..) => "Add",
            ExprKind::Sub(..) => "Sub",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ExprBuilder;

    #[test]
    fn test_closedness() {
        let b = ExprBuilder::new();
        let lit = b.add(b.int(1), b.int(2));
        assert!(lit.is_closed());

        let x = b.name("x", TlaType::Int);
        let open = b.add(x, b.int(2));
        assert!(!open.is_closed());

        let set = b.set_enum(TlaType::Int, vec![b.int(1), b.int(2)]);
        let filter = b.filter("y", set.clone(), b.bool(true));
        assert!(set.is_closed());
        assert!(!filter.is_closed());
    }

    #[test]
    fn test_size_and_cell() {
        let b = ExprBuilder::new();
        let e = b.and(vec![b.bool(true), b.not(b.bool(false))]);
        assert_eq!(e.size(), 4);
        assert_eq!(e.cell(), None);

        let c = e.to_cell(CellId(7));
        assert_eq!(c.cell(), Some(CellId(7)));
        assert_eq!(c.id, e.id);
        assert_eq!(c.ty, TlaType::Bool);
    }
}
