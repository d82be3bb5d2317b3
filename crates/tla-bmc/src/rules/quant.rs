//! Bounded quantifiers over finite sets

use tla_core::ExprKind;
use tla_smt::Term;

use super::{misuse, rewrite_per_element, rewrite_pure, set_elem_type};
use crate::arena::{Arena, CellType};
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

/// `\E x \in S : P` and `\A x \in S : P`, expanded over the potential
/// elements of `S`:
///
/// - `\E`: `\/ (in(e, S) /\ P(e))`
/// - `\A`: `/\ (in(e, S) => P(e))`
pub struct QuantifierRule;

impl RewritingRule for QuantifierRule {
    fn name(&self) -> &'static str {
        "quantifier"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(
            state.expr.kind,
            ExprKind::Exists { .. } | ExprKind::Forall { .. }
        )
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        let (var, set, body, exists) = match &parent.kind {
            ExprKind::Exists { var, set, body } => (var, set, body, true),
            ExprKind::Forall { var, set, body } => (var, set, body, false),
            _ => return Err(misuse(self.name(), &state)),
        };

        let (state, s) = rewrite_pure(rw, state, set, "a quantifier")?;
        set_elem_type(&state, s, set.span)?;
        let elems = state.arena.get_has(s);
        let (mut state, preds) = rewrite_per_element(rw, state, var, &elems, body, "a quantifier")?;

        let mut terms = Vec::new();
        for (e, p) in elems.into_iter().zip(preds) {
            let ty = state.arena.cell_type(p)?;
            if *ty != CellType::Bool {
                return Err(BmcError::type_mismatch(CellType::Bool, ty, Some(body.span)));
            }
            let member = rw.membership(&state, e, s)?;
            match (exists, p) {
                (true, Arena::FALSE) | (false, Arena::TRUE) => {}
                (true, Arena::TRUE) => terms.push(member),
                (true, _) => terms.push(Term::and(vec![member, Term::cell(p)])),
                (false, Arena::FALSE) => terms.push(Term::not(member)),
                (false, _) => terms.push(Term::implies(member, Term::cell(p))),
            }
        }
        let result = if exists {
            rw.bool_term_cell(&mut state, Term::or(terms))?
        } else {
            rw.bool_term_cell(&mut state, Term::and(terms))?
        };
        Ok(state.with_result(&parent, result))
    }
}
