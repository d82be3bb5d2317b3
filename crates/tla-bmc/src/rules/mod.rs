//! Rewriting rules, grouped by operator family
//!
//! [`standard_rules`] fixes the priority order: names, constants, actions,
//! logic, comparison and arithmetic, sets, filters, quantifiers, control,
//! records and functions. No two rules accept the same operator.

mod actions;
mod compare;
mod constants;
mod control;
mod filter;
mod functions;
mod logic;
mod quant;
mod records;
mod sets;
mod subst;

pub use actions::{AssignRule, UnchangedRule};
pub use compare::{EqRule, IntArithRule, IntCmpRule};
pub use constants::{BoolConstRule, IntConstRule, StrConstRule};
pub use control::IteRule;
pub use filter::SetFilterRule;
pub use functions::{FunAppRule, FunCtorRule};
pub use logic::{AndRule, EquivRule, ImpliesRule, NotRule, OrRule};
pub use quant::QuantifierRule;
pub use records::{RecordAccessRule, RecordCtorRule};
pub use sets::{SetEnumRule, SetInRule};
pub use subst::SubstRule;

use tla_core::{CellId, Expr, ExprRef, Span};

use crate::arena::CellType;
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

/// All rules, in priority order
pub fn standard_rules() -> Vec<Box<dyn RewritingRule>> {
    vec![
        Box::new(SubstRule),
        Box::new(BoolConstRule),
        Box::new(IntConstRule),
        Box::new(StrConstRule),
        Box::new(AssignRule),
        Box::new(UnchangedRule),
        Box::new(AndRule),
        Box::new(OrRule),
        Box::new(NotRule),
        Box::new(ImpliesRule),
        Box::new(EquivRule),
        Box::new(EqRule),
        Box::new(IntCmpRule),
        Box::new(IntArithRule),
        Box::new(SetEnumRule),
        Box::new(SetInRule),
        Box::new(SetFilterRule),
        Box::new(QuantifierRule),
        Box::new(IteRule),
        Box::new(RecordCtorRule),
        Box::new(RecordAccessRule),
        Box::new(FunCtorRule),
        Box::new(FunAppRule),
    ]
}

fn misuse(rule: &'static str, state: &SymbState) -> BmcError {
    BmcError::RuleMisuse {
        rule,
        expr: state.expr.to_string(),
    }
}

/// Cell type of an expression's inferred type
fn cell_type_of(expr: &Expr) -> BmcResult<CellType> {
    CellType::from_tla(&expr.ty)
        .ok_or_else(|| BmcError::type_mismatch("a resolved type", &expr.ty, Some(expr.span)))
}

fn expect_type(state: &SymbState, cell: CellId, expected: &CellType, span: Span) -> BmcResult<()> {
    let found = state.arena.cell_type(cell)?;
    if found == expected {
        Ok(())
    } else {
        Err(BmcError::type_mismatch(expected, found, Some(span)))
    }
}

/// Element type of the set held by `set`
fn set_elem_type(state: &SymbState, set: CellId, span: Span) -> BmcResult<CellType> {
    match state.arena.cell_type(set)? {
        CellType::FinSet(elem) => Ok((**elem).clone()),
        other => Err(BmcError::type_mismatch("a finite set", other, Some(span))),
    }
}

/// Rewrite `body` once per element, with `var` bound to the element.
///
/// Every rewrite starts from the binding of `state` and the binding is
/// restored afterwards, so sibling rewrites never see each other's variable.
/// A body that assigns a primed variable is rejected.
fn rewrite_per_element(
    rw: &mut Rewriter<'_>,
    mut state: SymbState,
    var: &str,
    elems: &[CellId],
    body: &ExprRef,
    context: &str,
) -> BmcResult<(SymbState, Vec<CellId>)> {
    let outer = state.binding.clone();
    let mut results = Vec::with_capacity(elems.len());
    for &elem in elems {
        let inner = outer.with(var, elem);
        let (next, cell) = rw.rewrite_sub(state.with_binding(inner.clone()), body)?;
        if next.binding != inner {
            return Err(BmcError::unsupported(
                format!("assignment inside {}", context),
                Some(body.span),
            ));
        }
        state = next.with_binding(outer.clone());
        results.push(cell);
    }
    Ok((state, results))
}

/// Rewrite `expr` and require that the binding is left untouched
fn rewrite_pure(
    rw: &mut Rewriter<'_>,
    state: SymbState,
    expr: &ExprRef,
    context: &str,
) -> BmcResult<(SymbState, CellId)> {
    let before = state.binding.clone();
    let (state, cell) = rw.rewrite_sub(state, expr)?;
    if state.binding != before {
        return Err(BmcError::unsupported(
            format!("assignment inside {}", context),
            Some(expr.span),
        ));
    }
    Ok((state, cell))
}
