//! Set comprehension by filtering: `{x \in S : P}`
//!
//! The predicate is rewritten once per potential element of `S`, each time
//! under the outer binding extended with `x`. Elements whose predicate
//! rewrites to the FALSE cell cannot be members and are dropped; every other
//! element becomes a potential element of the result, which is tied to `S`
//! and the predicates by a single constraint:
//!
//! - arrays: `S' = store(..store(const false, a, S[a] /\ P(a)).., c, S[c] /\ P(c))`
//! - oracles: `/\ in(e, S') <=> (in(e, S) /\ P(e))` over the survivors

use tla_core::{CellId, ExprKind};
use tla_smt::Term;

use super::{misuse, rewrite_pure, rewrite_per_element};
use crate::arena::{Arena, CellType};
use crate::encoding::{self, SetRepr};
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

pub struct SetFilterRule;

impl RewritingRule for SetFilterRule {
    fn name(&self) -> &'static str {
        "set_filter"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::SetFilter { .. })
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        let ExprKind::SetFilter { var, set, pred } = &parent.kind else {
            return Err(misuse(self.name(), &state));
        };

        let (state, source) = rewrite_pure(rw, state, set, "a set filter")?;
        let set_ty = state.arena.cell_type(source)?.clone();
        let CellType::FinSet(elem_ty) = &set_ty else {
            return Err(BmcError::type_mismatch("a finite set", &set_ty, Some(set.span)));
        };

        let elems = state.arena.get_has(source);
        let (mut state, preds) = rewrite_per_element(rw, state, var, &elems, pred, "a set filter")?;
        for &p in &preds {
            let ty = state.arena.cell_type(p)?;
            if *ty != CellType::Bool {
                return Err(BmcError::type_mismatch(CellType::Bool, ty, Some(pred.span)));
            }
        }
        let survivors: Vec<_> = elems
            .into_iter()
            .zip(preds)
            .filter(|&(_, p)| p != Arena::FALSE)
            .collect();

        let result = rw.fresh_cell(&mut state, set_ty.clone())?;
        let members: Vec<_> = survivors.iter().map(|&(e, _)| e).collect();
        state.arena.append_has(result, &members)?;

        let guarded = |repr: &SetRepr, e: CellId, p: CellId| {
            let in_source = encoding::membership(repr, e, source);
            if p == Arena::TRUE {
                in_source
            } else {
                Term::and(vec![in_source, Term::cell(p)])
            }
        };
        let repr = encoding::set_repr(rw.encoding(), elem_ty);
        match &repr {
            SetRepr::Array(index) => {
                let chain = survivors
                    .iter()
                    .fold(Term::empty_array(index.clone()), |acc, &(e, p)| {
                        Term::store(acc, Term::cell(e), guarded(&repr, e, p))
                    });
                rw.assert(Term::eq(Term::cell(result), chain))?;
            }
            SetRepr::Oracle => {
                let ties: Vec<_> = survivors
                    .iter()
                    .map(|&(e, p)| Term::iff(Term::in_oracle(e, result), guarded(&repr, e, p)))
                    .collect();
                if !ties.is_empty() {
                    rw.assert(Term::and(ties))?;
                }
            }
        }
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
    use num_bigint::BigInt;
    use std::collections::BTreeSet;
    use tla_core::{ExprBuilder, ExprRef, TlaType};

    fn ints(xs: &[i64]) -> StateValue {
        StateValue::Set(
            xs.iter()
                .map(|&x| StateValue::Int(BigInt::from(x)))
                .collect::<BTreeSet<_>>(),
        )
    }

    fn one_two_three(b: &ExprBuilder) -> ExprRef {
        b.set_enum(TlaType::Int, vec![b.int(1), b.int(2), b.int(3)])
    }

    #[test]
    fn test_filter_drops_false_elements() {
        for encoding in [Encoding::Arrays, Encoding::Oracles] {
            let mut h = Harness::with_encoding(encoding);
            let b = ExprBuilder::new();
            let x = b.name("x", TlaType::Int);
            let filter = b.filter("x", one_two_three(&b), b.neq(x, b.int(2)));
            let (state, cell) = h.rewrite(&filter);

            let survivors: Vec<_> = state
                .arena
                .get_has(cell)
                .into_iter()
                .map(|c| h.cache.literal_of(c).cloned())
                .collect();
            assert_eq!(
                survivors,
                vec![
                    Some(crate::cache::Literal::Int(BigInt::from(1))),
                    Some(crate::cache::Literal::Int(BigInt::from(3)))
                ],
                "{:?}",
                encoding
            );
            assert!(h.is_sat());
            assert_eq!(h.decode(cell), ints(&[1, 3]), "{:?}", encoding);
        }
    }

    #[test]
    fn test_filter_restores_binding() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let outer = h.int_var("x", 10);
        let x = b.name("x", TlaType::Int);
        let filter = b.filter("x", one_two_three(&b), b.lt(x, b.int(3)));
        let (state, _) = h.rewrite(&filter);
        assert_eq!(state.binding.get("x"), Some(outer));
        assert_eq!(state.binding.len(), 1);
    }

    #[test]
    fn test_filter_with_symbolic_predicate() {
        for encoding in [Encoding::Arrays, Encoding::Oracles] {
            let mut h = Harness::with_encoding(encoding);
            let b = ExprBuilder::new();
            h.int_var("k", 2);
            let x = b.name("x", TlaType::Int);
            let k = b.name("k", TlaType::Int);
            // {x \in {1, 2, 3} : x >= k}
            let filter = b.filter("x", one_two_three(&b), b.ge(x, k));
            let (state, cell) = h.rewrite(&filter);
            // nothing is provably false, all three are kept as candidates
            assert_eq!(state.arena.get_has(cell).len(), 3);
            assert!(h.is_sat());
            assert_eq!(h.decode(cell), ints(&[2, 3]), "{:?}", encoding);
        }
    }

    #[test]
    fn test_filter_of_filter() {
        for encoding in [Encoding::Arrays, Encoding::Oracles] {
            let mut h = Harness::with_encoding(encoding);
            let b = ExprBuilder::new();
            h.int_var("k", 1);
            let x = || b.name("x", TlaType::Int);
            let y = || b.name("y", TlaType::Int);
            let inner = b.filter("x", one_two_three(&b), b.gt(x(), b.name("k", TlaType::Int)));
            let outer = b.filter("y", inner, b.neq(y(), b.int(3)));
            let (_, cell) = h.rewrite(&outer);
            assert!(h.is_sat());
            assert_eq!(h.decode(cell), ints(&[2]), "{:?}", encoding);
        }
    }

    #[test]
    fn test_filter_of_empty_set() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let empty = b.set_enum(TlaType::Int, vec![]);
        let (state, cell) = h.rewrite(&b.filter("x", empty, b.bool(true)));
        assert!(state.arena.get_has(cell).is_empty());
        assert!(h.is_sat());
        assert_eq!(h.decode(cell), ints(&[]));
    }

    #[test]
    fn test_filter_requires_a_set() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        h.var("n", CellType::Int);
        let filter = b.filter("x", b.name("n", TlaType::set_of(TlaType::Int)), b.bool(true));
        let err = h.try_rewrite(&filter).unwrap_err();
        assert!(matches!(err, BmcError::TypeMismatch { .. }));
    }

    #[test]
    fn test_filter_predicate_must_be_boolean() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let filter = b.filter("x", one_two_three(&b), b.name("x", TlaType::Int));
        let err = h.try_rewrite(&filter).unwrap_err();
        assert!(matches!(err, BmcError::TypeMismatch { .. }));
    }

    #[test]
    fn test_filter_with_constant_true_keeps_all() {
        let mut h = Harness::with_encoding(Encoding::Oracles);
        let b = ExprBuilder::new();
        let (state, cell) = h.rewrite(&b.filter("x", one_two_three(&b), b.bool(true)));
        assert_eq!(state.arena.get_has(cell).len(), 3);
        assert!(h.is_sat());
        assert_eq!(h.decode(cell), ints(&[1, 2, 3]));
    }
}
