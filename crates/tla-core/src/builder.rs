//! Construction of well-formed typed expressions
//!
//! The front-end owns parsing and type inference; this builder is the
//! programmatic entry point it (and tests) use to produce trees with unique
//! node identities and consistent types.
//!
//! # Example
//!
//! ```
//! use tla_core::{ExprBuilder, TlaType};
//!
//! let b = ExprBuilder::new();
//! // {x \in {1, 2, 3} : x > 1}
//! let set = b.set_enum(TlaType::Int, vec![b.int(1), b.int(2), b.int(3)]);
//! let pred = b.gt(b.name("x", TlaType::Int), b.int(1));
//! let filter = b.filter("x", set, pred);
//! assert_eq!(filter.ty, TlaType::set_of(TlaType::Int));
//! ```

use crate::ast::{Expr, ExprId, ExprKind, ExprRef};
use crate::span::Span;
use crate::types::TlaType;
use num_bigint::BigInt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_EXPR_ID: AtomicU32 = AtomicU32::new(0);

/// Builds typed nodes. Ids come from one process-wide counter, so trees from
/// different builders never share an `ExprId`.
#[derive(Debug, Default)]
pub struct ExprBuilder {
    built: AtomicU32,
    span: Span,
}

impl ExprBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose nodes all carry the given span
    pub fn at(span: Span) -> Self {
        ExprBuilder {
            built: AtomicU32::new(0),
            span,
        }
    }

    /// Number of nodes built so far by this builder
    pub fn node_count(&self) -> u32 {
        self.built.load(Ordering::Relaxed)
    }

    fn node(&self, kind: ExprKind, ty: TlaType) -> ExprRef {
        self.built.fetch_add(1, Ordering::Relaxed);
        let id = ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed));
        Arc::new(Expr::new(id, kind, ty, self.span))
    }

    // === Literals ===

    pub fn bool(&self, value: bool) -> ExprRef {
        self.node(ExprKind::Bool(value), TlaType::Bool)
    }

    pub fn int(&self, value: i64) -> ExprRef {
        self.big_int(BigInt::from(value))
    }

    pub fn big_int(&self, value: BigInt) -> ExprRef {
        self.node(ExprKind::Int(value), TlaType::Int)
    }

    pub fn str(&self, value: &str) -> ExprRef {
        self.node(ExprKind::Str(value.to_string()), TlaType::Str)
    }

    // === Names ===

    pub fn name(&self, name: &str, ty: TlaType) -> ExprRef {
        self.node(ExprKind::Name(name.to_string()), ty)
    }

    /// Reference to the next-state value of a variable: `x'`
    pub fn prime(&self, name: &str, ty: TlaType) -> ExprRef {
        self.node(ExprKind::Name(format!("{}'", name)), ty)
    }

    pub fn oper_app(&self, name: &str, args: Vec<ExprRef>, ty: TlaType) -> ExprRef {
        self.node(ExprKind::OperApp(name.to_string(), args), ty)
    }

    // === Logic ===

    pub fn and(&self, args: Vec<ExprRef>) -> ExprRef {
        self.node(ExprKind::And(args), TlaType::Bool)
    }

    pub fn or(&self, args: Vec<ExprRef>) -> ExprRef {
        self.node(ExprKind::Or(args), TlaType::Bool)
    }

    pub fn not(&self, arg: ExprRef) -> ExprRef {
        self.node(ExprKind::Not(arg), TlaType::Bool)
    }

    pub fn implies(&self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        self.node(ExprKind::Implies(lhs, rhs), TlaType::Bool)
    }

    pub fn equiv(&self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        self.node(ExprKind::Equiv(lhs, rhs), TlaType::Bool)
    }

    // === Quantifiers ===

    pub fn exists(&self, var: &str, set: ExprRef, body: ExprRef) -> ExprRef {
        let kind = ExprKind::Exists {
            var: var.to_string(),
            set,
            body,
        };
        self.node(kind, TlaType::Bool)
    }

    pub fn forall(&self, var: &str, set: ExprRef, body: ExprRef) -> ExprRef {
        let kind = ExprKind::Forall {
            var: var.to_string(),
            set,
            body,
        };
        self.node(kind, TlaType::Bool)
    }

    // === Sets ===

    pub fn set_enum(&self, elem_ty: TlaType, elems: Vec<ExprRef>) -> ExprRef {
        self.node(ExprKind::SetEnum(elems), TlaType::set_of(elem_ty))
    }

    pub fn in_set(&self, elem: ExprRef, set: ExprRef) -> ExprRef {
        self.node(ExprKind::In(elem, set), TlaType::Bool)
    }

    pub fn not_in(&self, elem: ExprRef, set: ExprRef) -> ExprRef {
        self.node(ExprKind::NotIn(elem, set), TlaType::Bool)
    }

    pub fn filter(&self, var: &str, set: ExprRef, pred: ExprRef) -> ExprRef {
        let ty = set.ty.clone();
        let kind = ExprKind::SetFilter {
            var: var.to_string(),
            set,
            pred,
        };
        self.node(kind, ty)
    }

    // === Functions ===

    pub fn fun_ctor(&self, var: &str, set: ExprRef, body: ExprRef) -> ExprRef {
        let domain = set.ty.elem().cloned().unwrap_or(TlaType::Unknown);
        let ty = TlaType::func(domain, body.ty.clone());
        let kind = ExprKind::FunCtor {
            var: var.to_string(),
            set,
            body,
        };
        self.node(kind, ty)
    }

    pub fn fun_app(&self, fun: ExprRef, arg: ExprRef) -> ExprRef {
        let ty = fun.ty.range().cloned().unwrap_or(TlaType::Unknown);
        self.node(ExprKind::FunApp(fun, arg), ty)
    }

    // === Records ===

    pub fn record(&self, fields: Vec<(&str, ExprRef)>) -> ExprRef {
        let mut sorted: Vec<(String, ExprRef)> = fields
            .into_iter()
            .map(|(name, e)| (name.to_string(), e))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let ty = TlaType::Record(
            sorted
                .iter()
                .map(|(name, e)| (name.clone(), e.ty.clone()))
                .collect::<BTreeMap<_, _>>(),
        );
        self.node(ExprKind::Record(sorted), ty)
    }

    pub fn access(&self, record: ExprRef, field: &str) -> ExprRef {
        let ty = record.ty.field(field).cloned().unwrap_or(TlaType::Unknown);
        self.node(ExprKind::RecordAccess(record, field.to_string()), ty)
    }

    // === Actions ===

    /// `x' := value`
    pub fn assign(&self, var: &str, value: ExprRef) -> ExprRef {
        self.node(ExprKind::Assign(format!("{}'", var), value), TlaType::Bool)
    }

    /// `UNCHANGED <<vars>>`
    pub fn unchanged(&self, vars: Vec<(&str, TlaType)>) -> ExprRef {
        let names = vars
            .into_iter()
            .map(|(name, ty)| self.name(name, ty))
            .collect();
        self.node(ExprKind::Unchanged(names), TlaType::Bool)
    }

    // === Control ===

    pub fn ite(&self, cond: ExprRef, then_branch: ExprRef, else_branch: ExprRef) -> ExprRef {
        let ty = then_branch.ty.clone();
        self.node(ExprKind::If(cond, then_branch, else_branch), ty)
    }

    // === Comparison ===

    pub fn eq(&self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        self.node(ExprKind::Eq(lhs, rhs), TlaType::Bool)
    }

    pub fn neq(&self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        self.node(ExprKind::Neq(lhs, rhs), TlaType::Bool)
    }

    pub fn lt(&self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        self.node(ExprKind::Lt(lhs, rhs), TlaType::Bool)
    }

    pub fn le(&self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        self.node(ExprKind::Leq(lhs, rhs), TlaType::Bool)
    }

    pub fn gt(&self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        self.node(ExprKind::Gt(lhs, rhs), TlaType::Bool)
    }

    pub fn ge(&self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        self.node(ExprKind::Geq(lhs, rhs), TlaType::Bool)
    }

    // === Arithmetic ===

    pub fn add(&self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        self.node(ExprKind::Add(lhs, rhs), TlaType::Int)
    }

    pub fn sub(&self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        self.node(ExprKind::Sub(lhs, rhs), TlaType::Int)
    }
}
