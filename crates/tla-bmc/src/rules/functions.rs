//! Functions over finite domains: `[x \in S |-> e]` and `f[a]`
//!
//! A function cell has its domain set as first edge, followed by one result
//! cell per potential element of the domain, in the domain's order.

use tla_core::ExprKind;
use tla_smt::Term;

use super::compare::equal_cells;
use super::{cell_type_of, expect_type, misuse, rewrite_per_element, rewrite_pure};
use crate::arena::{Arena, CellType};
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

pub struct FunCtorRule;

impl RewritingRule for FunCtorRule {
    fn name(&self) -> &'static str {
        "fun_ctor"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::FunCtor { .. })
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        let ExprKind::FunCtor { var, set, body } = &parent.kind else {
            return Err(misuse(self.name(), &state));
        };
        let fun_ty = cell_type_of(&parent)?;
        let CellType::Fun(domain_ty, range_ty) = &fun_ty else {
            return Err(BmcError::type_mismatch("a function type", &fun_ty, Some(parent.span)));
        };

        let (state, domain) = rewrite_pure(rw, state, set, "a function constructor")?;
        expect_type(
            &state,
            domain,
            &CellType::FinSet(domain_ty.clone()),
            set.span,
        )?;
        let elems = state.arena.get_has(domain);
        let (mut state, results) =
            rewrite_per_element(rw, state, var, &elems, body, "a function constructor")?;
        for &r in &results {
            expect_type(&state, r, range_ty, body.span)?;
        }

        let fun = rw.fresh_cell(&mut state, fun_ty.clone())?;
        let mut edges = Vec::with_capacity(results.len() + 1);
        edges.push(domain);
        edges.extend(results);
        rw.append_positional(&mut state, fun, &edges)?;
        Ok(state.with_result(&parent, fun))
    }
}

/// `f[a]`. An argument that is one of the domain's cells selects its result
/// directly; otherwise the result is a chain of `IF a = e THEN f[e] ELSE ..`
/// ending in the last result.
pub struct FunAppRule;

impl RewritingRule for FunAppRule {
    fn name(&self) -> &'static str {
        "fun_app"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::FunApp(..))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        let ExprKind::FunApp(fun_expr, arg_expr) = &parent.kind else {
            return Err(misuse(self.name(), &state));
        };

        let (state, fun) = rewrite_pure(rw, state, fun_expr, "a function application")?;
        let (mut state, arg) = rewrite_pure(rw, state, arg_expr, "a function application")?;
        let fun_ty = state.arena.cell_type(fun)?.clone();
        let CellType::Fun(domain_ty, range_ty) = &fun_ty else {
            return Err(BmcError::type_mismatch("a function", &fun_ty, Some(fun_expr.span)));
        };
        expect_type(&state, arg, domain_ty, arg_expr.span)?;

        let edges = state.arena.get_has(fun);
        let Some((&domain, results)) = edges.split_first() else {
            return Err(BmcError::UnknownCell(fun));
        };
        let elems = state.arena.get_has(domain);
        let Some(&fallback) = results.last() else {
            return Err(BmcError::unsupported(
                "application of a function with an empty domain",
                Some(parent.span),
            ));
        };

        if let Some(i) = elems.iter().position(|&e| e == arg) {
            return Ok(state.with_result(&parent, results[i]));
        }
        if !range_ty.is_primitive() {
            return Err(BmcError::unsupported(
                format!("symbolic application of a function with range {}", range_ty),
                Some(parent.span),
            ));
        }

        let mut chain = Term::cell(fallback);
        for (&e, &r) in elems.iter().zip(results).rev() {
            match equal_cells(rw, &mut state, arg, e, parent.span)? {
                Arena::FALSE => {}
                Arena::TRUE => chain = Term::cell(r),
                eq => chain = Term::ite(Term::cell(eq), Term::cell(r), chain),
            }
        }
        let result = match chain {
            Term::Cell(c) => c,
            other => rw.define(&mut state, (**range_ty).clone(), other)?,
        };
        Ok(state.with_result(&parent, result))
    }
}
