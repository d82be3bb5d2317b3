//! `IF c THEN a ELSE b`

use tla_core::{CellId, ExprKind, Span};
use tla_smt::Term;

use super::{expect_type, misuse, rewrite_pure};
use crate::arena::CellType;
use crate::encoding::SetRepr;
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

/// A constant condition selects its branch; otherwise both branches are
/// rewritten and merged into a fresh cell
pub struct IteRule;

impl RewritingRule for IteRule {
    fn name(&self) -> &'static str {
        "ite"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::If(..))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        let ExprKind::If(cond, then_branch, else_branch) = &parent.kind else {
            return Err(misuse(self.name(), &state));
        };

        let (state, c) = rewrite_pure(rw, state, cond, "a condition")?;
        expect_type(&state, c, &CellType::Bool, cond.span)?;
        match rw.bool_value(c) {
            Some(true) => return Ok(state.with_expr(then_branch.clone())),
            Some(false) => return Ok(state.with_expr(else_branch.clone())),
            None => {}
        }

        let (state, a) = rewrite_pure(rw, state, then_branch, "a branch of IF")?;
        let (mut state, b) = rewrite_pure(rw, state, else_branch, "a branch of IF")?;
        let result = ite_cells(rw, &mut state, c, a, b, parent.span)?;
        Ok(state.with_result(&parent, result))
    }
}

/// A cell holding `a` when `c` holds and `b` otherwise
fn ite_cells(
    rw: &mut Rewriter<'_>,
    state: &mut SymbState,
    c: CellId,
    a: CellId,
    b: CellId,
    span: Span,
) -> BmcResult<CellId> {
    if a == b {
        return Ok(a);
    }
    let ty = state.arena.cell_type(a)?.clone();
    let tb = state.arena.cell_type(b)?;
    if &ty != tb {
        return Err(BmcError::type_mismatch(&ty, tb, Some(span)));
    }

    match &ty {
        CellType::Bool | CellType::Int | CellType::Str => {
            let term = Term::ite(Term::cell(c), Term::cell(a), Term::cell(b));
            rw.define(state, ty, term)
        }
        CellType::FinSet(_) => {
            let from_a = state.arena.get_has(a);
            let from_b = state.arena.get_has(b);
            let r = rw.fresh_cell(state, ty.clone())?;
            state.arena.append_has(r, &from_a)?;
            state.arena.append_has(r, &from_b)?;
            match rw.set_repr(state, r)? {
                SetRepr::Array(_) => {
                    let term = Term::ite(Term::cell(c), Term::cell(a), Term::cell(b));
                    rw.assert(Term::eq(Term::cell(r), term))?;
                }
                SetRepr::Oracle => {
                    let member = |set: CellId, elems: &[CellId], e: CellId| {
                        if elems.contains(&e) {
                            Term::in_oracle(e, set)
                        } else {
                            Term::Bool(false)
                        }
                    };
                    let ties: Vec<_> = state
                        .arena
                        .get_has(r)
                        .into_iter()
                        .map(|e| {
                            let picked = Term::ite(
                                Term::cell(c),
                                member(a, &from_a, e),
                                member(b, &from_b, e),
                            );
                            Term::iff(Term::in_oracle(e, r), picked)
                        })
                        .collect();
                    if !ties.is_empty() {
                        rw.assert(Term::and(ties))?;
                    }
                }
            }
            Ok(r)
        }
        CellType::Record(_) => {
            let fa = state.arena.get_has(a);
            let fb = state.arena.get_has(b);
            let mut fields = Vec::with_capacity(fa.len());
            for (x, y) in fa.into_iter().zip(fb) {
                fields.push(ite_cells(rw, state, c, x, y, span)?);
            }
            let r = rw.fresh_cell(state, ty.clone())?;
            rw.append_positional(state, r, &fields)?;
            Ok(r)
        }
        CellType::Fun(..) => Err(BmcError::unsupported(
            "IF-THEN-ELSE over function values",
            Some(span),
        )),
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
    use std::collections::{BTreeMap, BTreeSet};
    use tla_core::{ExprBuilder, TlaType};
    use tla_smt::{SolverContext, Term};

    #[test]
    fn test_constant_condition_selects_branch() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let before = h.arena.len();
        let (_, cell) = h.rewrite(&b.ite(b.bool(true), b.int(1), b.int(2)));
        assert_eq!(
            h.cache.literal_of(cell),
            Some(&crate::cache::Literal::Int(BigInt::from(1)))
        );
        // only the literal cell for 1 was allocated
        assert_eq!(h.arena.len(), before + 1);
    }

    #[test]
    fn test_symbolic_condition() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        h.int_var("x", 4);
        let x = || b.name("x", TlaType::Int);
        let (_, cell) = h.rewrite(&b.ite(b.lt(x(), b.int(3)), b.int(1), b.sub(x(), b.int(1))));
        assert!(h.is_sat());
        assert_eq!(h.eval_int(cell), BigInt::from(3));
    }

    #[test]
    fn test_set_valued_branches() {
        for encoding in [Encoding::Arrays, Encoding::Oracles] {
            let mut h = Harness::with_encoding(encoding);
            let b = ExprBuilder::new();
            h.var("p", CellType::Bool);
            let p = h.binding.get("p").unwrap();
            let small = b.set_enum(TlaType::Int, vec![b.int(1)]);
            let big = b.set_enum(TlaType::Int, vec![b.int(2), b.int(3)]);
            let (_, cell) = h.rewrite(&b.ite(b.name("p", TlaType::Bool), small, big));
            h.solver
                .assert_ground_expr(&Term::not(Term::cell(p)))
                .unwrap();
            assert!(h.is_sat());
            let expected: BTreeSet<_> = [2, 3]
                .iter()
                .map(|&n| StateValue::Int(BigInt::from(n)))
                .collect();
            assert_eq!(h.decode(cell), StateValue::Set(expected), "{:?}", encoding);
        }
    }

    #[test]
    fn test_record_valued_branches() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        h.var("p", CellType::Bool);
        let p = h.binding.get("p").unwrap();
        let r1 = b.record(vec![("a", b.int(1)), ("b", b.str("x"))]);
        let r2 = b.record(vec![("a", b.int(2)), ("b", b.str("x"))]);
        let (_, cell) = h.rewrite(&b.ite(b.name("p", TlaType::Bool), r1, r2));
        h.assert_true(p);
        assert!(h.is_sat());
        let mut fields = BTreeMap::new();
        fields.insert("a".to_string(), StateValue::Int(BigInt::from(1)));
        fields.insert("b".to_string(), StateValue::Str("x".to_string()));
        assert_eq!(h.decode(cell), StateValue::Record(fields));
    }

    #[test]
    fn test_branch_types_must_agree() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        h.var("p", CellType::Bool);
        let err = h
            .try_rewrite(&b.ite(b.name("p", TlaType::Bool), b.int(1), b.str("one")))
            .unwrap_err();
        assert!(matches!(err, BmcError::TypeMismatch { .. }));
    }
}
