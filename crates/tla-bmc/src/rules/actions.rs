//! Primed assignments and `UNCHANGED`

use tla_core::{ExprKind, TlaType};

use super::misuse;
use crate::arena::Arena;
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

/// `x' := e`
///
/// The first assignment to `x'` in a step binds it to the cell of `e` and is
/// TRUE. Later ones are equalities against the bound cell.
pub struct AssignRule;

impl RewritingRule for AssignRule {
    fn name(&self) -> &'static str {
        "assign"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Assign(..))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::Assign(name, value) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        let (name, value) = (name.clone(), value.clone());
        let parent = state.expr.clone();

        let (mut state, cell) = rw.rewrite_sub(state, &value)?;
        if state.binding.contains(&name) {
            let lhs = parent.derive(ExprKind::Name(name), value.ty.clone());
            let rhs = value.to_cell(cell);
            let eq = parent.derive(ExprKind::Eq(lhs, rhs), TlaType::Bool);
            return Ok(state.with_expr(eq));
        }
        state.binding.insert(name, cell);
        Ok(state.with_result(&parent, Arena::TRUE))
    }
}

/// `UNCHANGED <<x, y>>` is `x' := x /\ y' := y`
pub struct UnchangedRule;

impl RewritingRule for UnchangedRule {
    fn name(&self) -> &'static str {
        "unchanged"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Unchanged(_))
    }

    fn apply(&self, _rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::Unchanged(vars) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        let parent = state.expr.clone();
        let mut assignments = Vec::with_capacity(vars.len());
        for var in vars {
            let ExprKind::Name(name) = &var.kind else {
                return Err(BmcError::unsupported(
                    format!("UNCHANGED of `{}`, which is not a variable", var),
                    Some(var.span),
                ));
            };
            let assign = ExprKind::Assign(format!("{}'", name), var.clone());
            assignments.push(parent.derive(assign, TlaType::Bool));
        }
        let conj = parent.derive(ExprKind::And(assignments), TlaType::Bool);
        Ok(state.with_expr(conj))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::Harness;
    use crate::Arena;
    use num_bigint::BigInt;
    use tla_core::{ExprBuilder, TlaType};

    #[test]
    fn test_first_assignment_binds() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let x = h.int_var("x", 4);
        let (state, cell) = h.rewrite(&b.assign("x", b.add(b.name("x", TlaType::Int), b.int(1))));
        assert_eq!(cell, Arena::TRUE);
        let next = state.binding.get("x'").unwrap();
        assert_ne!(next, x);
        assert!(h.is_sat());
        assert_eq!(h.eval_int(next), BigInt::from(5));
    }

    #[test]
    fn test_second_assignment_is_equality() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let both = b.and(vec![b.assign("x", b.int(1)), b.assign("x", b.int(2))]);
        let (_, cell) = h.rewrite(&both);
        assert_eq!(cell, Arena::FALSE);
    }

    #[test]
    fn test_unchanged() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let x = h.int_var("x", 3);
        let y = h.int_var("y", 8);
        let (state, cell) = h.rewrite(&b.unchanged(vec![("x", TlaType::Int), ("y", TlaType::Int)]));
        assert_eq!(cell, Arena::TRUE);
        assert_eq!(state.binding.get("x'"), Some(x));
        assert_eq!(state.binding.get("y'"), Some(y));
    }
}
