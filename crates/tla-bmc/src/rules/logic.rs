//! Boolean connectives with constant folding

use tla_core::{ExprKind, TlaType};
use tla_smt::Term;

use super::{expect_type, misuse, rewrite_pure};
use crate::arena::{Arena, CellType};
use crate::error::BmcResult;
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

/// Conjunction, rewritten left to right.
///
/// The binding is threaded through the conjuncts, so an assignment made by
/// one conjunct is visible to the following ones. A conjunct that folds to
/// FALSE ends the rewriting.
pub struct AndRule;

impl RewritingRule for AndRule {
    fn name(&self) -> &'static str {
        "and"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::And(_))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::And(args) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        let args = args.clone();
        let parent = state.expr.clone();

        let mut state = state;
        let mut cells = Vec::with_capacity(args.len());
        for arg in &args {
            let (next, cell) = rw.rewrite_sub(state, arg)?;
            state = next;
            expect_type(&state, cell, &CellType::Bool, arg.span)?;
            if cell == Arena::FALSE {
                return Ok(state.with_result(&parent, Arena::FALSE));
            }
            cells.push(cell);
        }
        let result = rw.conjoin(&mut state, cells)?;
        Ok(state.with_result(&parent, result))
    }
}

/// Disjunction. Disjuncts may not assign variables: alternative actions are
/// separate transitions.
pub struct OrRule;

impl RewritingRule for OrRule {
    fn name(&self) -> &'static str {
        "or"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Or(_))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::Or(args) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        let args = args.clone();
        let parent = state.expr.clone();

        let mut state = state;
        let mut cells = Vec::with_capacity(args.len());
        for arg in &args {
            let (next, cell) = rewrite_pure(rw, state, arg, "a disjunction")?;
            state = next;
            expect_type(&state, cell, &CellType::Bool, arg.span)?;
            if cell == Arena::TRUE {
                return Ok(state.with_result(&parent, Arena::TRUE));
            }
            cells.push(cell);
        }
        let result = rw.disjoin(&mut state, cells)?;
        Ok(state.with_result(&parent, result))
    }
}

pub struct NotRule;

impl RewritingRule for NotRule {
    fn name(&self) -> &'static str {
        "not"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Not(_))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::Not(arg) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        let arg = arg.clone();
        let parent = state.expr.clone();

        let (mut state, cell) = rewrite_pure(rw, state, &arg, "a negation")?;
        expect_type(&state, cell, &CellType::Bool, arg.span)?;
        let result = match rw.bool_value(cell) {
            Some(b) => Rewriter::bool_cell(!b),
            None => rw.define(&mut state, CellType::Bool, Term::not(Term::cell(cell)))?,
        };
        Ok(state.with_result(&parent, result))
    }
}

/// `a => b` is `~a \/ b`
pub struct ImpliesRule;

impl RewritingRule for ImpliesRule {
    fn name(&self) -> &'static str {
        "implies"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Implies(..))
    }

    fn apply(&self, _rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::Implies(a, b) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        let parent = state.expr.clone();
        let not_a = parent.derive(ExprKind::Not(a.clone()), TlaType::Bool);
        let or = parent.derive(ExprKind::Or(vec![not_a, b.clone()]), TlaType::Bool);
        Ok(state.with_expr(or))
    }
}

pub struct EquivRule;

impl RewritingRule for EquivRule {
    fn name(&self) -> &'static str {
        "equiv"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Equiv(..))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::Equiv(a, b) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        let (a, b) = (a.clone(), b.clone());
        let parent = state.expr.clone();

        let (state, ca) = rewrite_pure(rw, state, &a, "an equivalence")?;
        let (mut state, cb) = rewrite_pure(rw, state, &b, "an equivalence")?;
        expect_type(&state, ca, &CellType::Bool, a.span)?;
        expect_type(&state, cb, &CellType::Bool, b.span)?;
        let result = if ca == cb {
            Arena::TRUE
        } else {
            match (rw.bool_value(ca), rw.bool_value(cb)) {
                (Some(x), Some(y)) => Rewriter::bool_cell(x == y),
                (Some(true), None) => cb,
                (None, Some(true)) => ca,
                _ => rw.define(
                    &mut state,
                    CellType::Bool,
                    Term::iff(Term::cell(ca), Term::cell(cb)),
                )?,
            }
        };
        Ok(state.with_result(&parent, result))
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::CellType;
    use crate::error::BmcError;
    use crate::test_support::Harness;
    use crate::Arena;
    use tla_core::{ExprBuilder, TlaType};

    #[test]
    fn test_constant_folding() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let t = || b.bool(true);
        let f = || b.bool(false);
        assert_eq!(h.rewrite(&b.and(vec![t(), t()])).1, Arena::TRUE);
        assert_eq!(h.rewrite(&b.and(vec![t(), f()])).1, Arena::FALSE);
        assert_eq!(h.rewrite(&b.or(vec![f(), f()])).1, Arena::FALSE);
        assert_eq!(h.rewrite(&b.or(vec![f(), t()])).1, Arena::TRUE);
        assert_eq!(h.rewrite(&b.not(f())).1, Arena::TRUE);
        assert_eq!(h.rewrite(&b.implies(t(), f())).1, Arena::FALSE);
        assert_eq!(h.rewrite(&b.implies(f(), f())).1, Arena::TRUE);
        assert_eq!(h.rewrite(&b.equiv(f(), f())).1, Arena::TRUE);
        assert_eq!(h.rewrite(&b.and(vec![])).1, Arena::TRUE);
    }

    #[test]
    fn test_symbolic_connectives() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        h.var("p", CellType::Bool);
        h.var("q", CellType::Bool);
        let p = || b.name("p", TlaType::Bool);
        let q = || b.name("q", TlaType::Bool);
        // (p => q) /\ p /\ ~q is unsatisfiable
        let (_, cell) = h.rewrite(&b.and(vec![b.implies(p(), q()), p(), b.not(q())]));
        h.assert_true(cell);
        assert!(h.check().is_unsat());
    }

    #[test]
    fn test_equiv_model() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let p = h.var("p", CellType::Bool);
        h.var("q", CellType::Bool);
        let (_, cell) = h.rewrite(&b.equiv(b.name("p", TlaType::Bool), b.not(b.name("q", TlaType::Bool))));
        h.assert_true(cell);
        h.assert_true(p);
        assert!(h.is_sat());
        let q = h.binding.get("q").unwrap();
        assert!(!h.eval_bool(q));
    }

    #[test]
    fn test_disjunction_may_not_assign() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let err = h
            .try_rewrite(&b.or(vec![b.assign("x", b.int(1)), b.assign("x", b.int(2))]))
            .unwrap_err();
        assert!(matches!(err, BmcError::Unsupported { .. }));
    }

    #[test]
    fn test_and_requires_booleans() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let err = h.try_rewrite(&b.and(vec![b.int(1)])).unwrap_err();
        assert!(matches!(err, BmcError::TypeMismatch { .. }));
        assert!(err.span().is_some());
    }
}
