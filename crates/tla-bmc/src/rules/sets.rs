//! Set enumeration and membership

use tla_core::{ExprKind, TlaType};
use tla_smt::Term;

use super::compare::equal_cells;
use super::{cell_type_of, expect_type, misuse, rewrite_pure, set_elem_type};
use crate::arena::{Arena, CellType};
use crate::encoding::SetRepr;
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

/// `{a, b, c}`: a fresh set whose potential elements are the element cells,
/// all of them members
pub struct SetEnumRule;

impl RewritingRule for SetEnumRule {
    fn name(&self) -> &'static str {
        "set_enum"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::SetEnum(_))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let ExprKind::SetEnum(elems) = &state.expr.kind else {
            return Err(misuse(self.name(), &state));
        };
        let elems = elems.clone();
        let parent = state.expr.clone();
        let set_ty = cell_type_of(&parent)?;
        let Some(elem_ty) = set_ty.elem().cloned() else {
            return Err(BmcError::type_mismatch("a set type", &set_ty, Some(parent.span)));
        };

        let mut state = state;
        let mut cells = Vec::with_capacity(elems.len());
        for elem in &elems {
            let (next, cell) = rewrite_pure(rw, state, elem, "a set enumeration")?;
            state = next;
            expect_type(&state, cell, &elem_ty, elem.span)?;
            cells.push(cell);
        }

        let set = rw.fresh_cell(&mut state, set_ty)?;
        state.arena.append_has(set, &cells)?;
        let members = state.arena.get_has(set);
        match rw.set_repr(&state, set)? {
            SetRepr::Array(index) => {
                let chain = members.iter().fold(Term::empty_array(index), |acc, &e| {
                    Term::store(acc, Term::cell(e), Term::Bool(true))
                });
                rw.assert(Term::eq(Term::cell(set), chain))?;
            }
            SetRepr::Oracle => {
                if !members.is_empty() {
                    let all = members.iter().map(|&e| Term::in_oracle(e, set)).collect();
                    rw.assert(Term::and(all))?;
                }
            }
        }
        Ok(state.with_result(&parent, set))
    }
}

/// `x \in S` and `x \notin S`
pub struct SetInRule;

impl RewritingRule for SetInRule {
    fn name(&self) -> &'static str {
        "set_in"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::In(..) | ExprKind::NotIn(..))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        let (x, s) = match &parent.kind {
            ExprKind::NotIn(x, s) => {
                let member = parent.derive(ExprKind::In(x.clone(), s.clone()), TlaType::Bool);
                return Ok(state.with_expr(parent.derive(ExprKind::Not(member), TlaType::Bool)));
            }
            ExprKind::In(x, s) => (x, s),
            _ => return Err(misuse(self.name(), &state)),
        };

        let (state, cx) = rewrite_pure(rw, state, x, "a membership test")?;
        let (mut state, cs) = rewrite_pure(rw, state, s, "a membership test")?;
        let elem_ty = set_elem_type(&state, cs, s.span)?;
        expect_type(&state, cx, &elem_ty, x.span)?;

        let candidates = state.arena.get_has(cs);
        let result = match rw.set_repr(&state, cs)? {
            _ if candidates.is_empty() => Arena::FALSE,
            SetRepr::Array(_) => rw.define(
                &mut state,
                CellType::Bool,
                Term::select(Term::cell(cs), Term::cell(cx)),
            )?,
            SetRepr::Oracle => {
                let mut disjuncts = Vec::new();
                for f in candidates {
                    let eq = equal_cells(rw, &mut state, cx, f, parent.span)?;
                    if eq == Arena::FALSE {
                        continue;
                    }
                    let member = Term::in_oracle(f, cs);
                    disjuncts.push(if eq == Arena::TRUE {
                        member
                    } else {
                        Term::and(vec![member, Term::cell(eq)])
                    });
                }
                rw.bool_term_cell(&mut state, Term::or(disjuncts))?
            }
        };
        Ok(state.with_result(&parent, result))
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::CellType;
    use crate::config::Encoding;
    use crate::decode::StateValue;
    use crate::error::BmcError;
    use crate::test_support::Harness;
    use crate::Arena;
    use num_bigint::BigInt;
    use std::collections::BTreeSet;
    use tla_core::{ExprBuilder, TlaType};

    fn ints(xs: &[i64]) -> StateValue {
        StateValue::Set(
            xs.iter()
                .map(|&x| StateValue::Int(BigInt::from(x)))
                .collect::<BTreeSet<_>>(),
        )
    }

    #[test]
    fn test_enumeration_decodes() {
        for encoding in [Encoding::Arrays, Encoding::Oracles] {
            let mut h = Harness::with_encoding(encoding);
            let b = ExprBuilder::new();
            let set = b.set_enum(TlaType::Int, vec![b.int(3), b.int(1), b.int(3)]);
            let (state, cell) = h.rewrite(&set);
            assert_eq!(state.arena.get_has(cell).len(), 2);
            assert!(h.is_sat());
            assert_eq!(h.decode(cell), ints(&[1, 3]));
        }
    }

    #[test]
    fn test_membership() {
        for encoding in [Encoding::Arrays, Encoding::Oracles] {
            let mut h = Harness::with_encoding(encoding);
            let b = ExprBuilder::new();
            h.int_var("x", 2);
            let set = || b.set_enum(TlaType::Int, vec![b.int(1), b.int(2)]);
            let x = || b.name("x", TlaType::Int);
            let (_, member) = h.rewrite(&b.in_set(x(), set()));
            let (_, outside) = h.rewrite(&b.not_in(b.add(x(), b.int(5)), set()));
            assert!(h.is_sat(), "{:?}", encoding);
            assert!(h.eval_bool(member), "{:?}", encoding);
            assert!(h.eval_bool(outside), "{:?}", encoding);
        }
    }

    #[test]
    fn test_empty_set_has_no_members() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let empty = b.set_enum(TlaType::Int, vec![]);
        let (_, cell) = h.rewrite(&b.in_set(b.int(1), empty));
        assert_eq!(cell, Arena::FALSE);
    }

    #[test]
    fn test_membership_type_errors() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let set = b.set_enum(TlaType::Int, vec![b.int(1)]);
        let err = h.try_rewrite(&b.in_set(b.str("a"), set)).unwrap_err();
        assert!(matches!(err, BmcError::TypeMismatch { .. }));

        h.var("n", CellType::Int);
        let err = h
            .try_rewrite(&b.in_set(b.int(1), b.name("n", TlaType::set_of(TlaType::Int))))
            .unwrap_err();
        assert!(matches!(err, BmcError::TypeMismatch { .. }));
    }
}
