use tla_core::ExprKind;

use super::misuse;
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

/// A name becomes the cell it is bound to
pub struct SubstRule;

impl RewritingRule for SubstRule {
    fn name(&self) -> &'static str {
        "subst"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Name(_))
    }

    fn apply(&self, _rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::Name(name) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        match state.binding.get(name) {
            Some(cell) => Ok(state.with_cell(cell)),
            None => Err(BmcError::UnboundName {
                name: name.clone(),
                span: Some(state.expr.span),
            }),
        }
    }
}
