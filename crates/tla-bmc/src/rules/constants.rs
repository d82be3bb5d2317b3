//! Literal constants

use tla_core::ExprKind;

use super::misuse;
use crate::cache::Literal;
use crate::error::BmcResult;
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

/// `TRUE` and `FALSE` are the predefined cells
pub struct BoolConstRule;

impl RewritingRule for BoolConstRule {
    fn name(&self) -> &'static str {
        "bool_const"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Bool(_))
    }

    fn apply(&self, _rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let value = match state.expr.kind {
            ExprKind::Bool(b) => b,
            _ => return Err(misuse(self.name(), &state)),
        };
        Ok(state.with_cell(Rewriter::bool_cell(value)))
    }
}

/// Integer literals, one cell per value
pub struct IntConstRule;

impl RewritingRule for IntConstRule {
    fn name(&self) -> &'static str {
        "int_const"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Int(_))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, mut state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::Int(n) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        let lit = Literal::Int(n.clone());
        let cell = rw.literal_cell(&mut state, lit)?;
        Ok(state.with_cell(cell))
    }
}

/// String literals, one cell per value
pub struct StrConstRule;

impl RewritingRule for StrConstRule {
    fn name(&self) -> &'static str {
        "str_const"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Str(_))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, mut state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::Str(s) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        let lit = Literal::Str(s.clone());
        let cell = rw.literal_cell(&mut state, lit)?;
        Ok(state.with_cell(cell))
    }
}
