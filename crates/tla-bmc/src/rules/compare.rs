//! Equality, integer comparison and integer arithmetic

use tla_core::{CellId, ExprKind, Span, TlaType};
use tla_smt::Term;

use super::{expect_type, misuse, rewrite_pure};
use crate::arena::{Arena, CellType};
use crate::cache::Literal;
use crate::encoding::SetRepr;
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

/// `a = b` and `a /= b`
pub struct EqRule;

impl RewritingRule for EqRule {
    fn name(&self) -> &'static str {
        "eq"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Eq(..) | ExprKind::Neq(..))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        match &parent.kind {
            ExprKind::Neq(a, b) => {
                let eq = parent.derive(ExprKind::Eq(a.clone(), b.clone()), TlaType::Bool);
                Ok(state.with_expr(parent.derive(ExprKind::Not(eq), TlaType::Bool)))
            }
            ExprKind::Eq(a, b) => {
                let (state, ca) = rewrite_pure(rw, state, a, "an equality")?;
                let (mut state, cb) = rewrite_pure(rw, state, b, "an equality")?;
                let result = equal_cells(rw, &mut state, ca, cb, parent.span)?;
                Ok(state.with_result(&parent, result))
            }
            _ => Err(misuse(self.name(), &state)),
        }
    }
}

/// A boolean cell that holds iff `a` and `b` hold equal values
pub(crate) fn equal_cells(
    rw: &mut Rewriter<'_>,
    state: &mut SymbState,
    a: CellId,
    b: CellId,
    span: Span,
) -> BmcResult<CellId> {
    if a == b {
        return Ok(Arena::TRUE);
    }
    let ta = state.arena.cell_type(a)?.clone();
    let tb = state.arena.cell_type(b)?;
    if &ta != tb {
        return Err(BmcError::type_mismatch(&ta, tb, Some(span)));
    }

    match &ta {
        CellType::Bool | CellType::Int | CellType::Str => {
            if let (Some(x), Some(y)) = (rw.literal_of(a), rw.literal_of(b)) {
                return Ok(Rewriter::bool_cell(x == y));
            }
            rw.define(
                state,
                CellType::Bool,
                Term::eq(Term::cell(a), Term::cell(b)),
            )
        }
        CellType::FinSet(_) => match rw.set_repr(state, a)? {
            SetRepr::Array(_) => rw.define(
                state,
                CellType::Bool,
                Term::eq(Term::cell(a), Term::cell(b)),
            ),
            SetRepr::Oracle => {
                let ab = subset_cell(rw, state, a, b, span)?;
                let ba = subset_cell(rw, state, b, a, span)?;
                rw.conjoin(state, vec![ab, ba])
            }
        },
        CellType::Record(_) => {
            let fa = state.arena.get_has(a);
            let fb = state.arena.get_has(b);
            let mut fields = Vec::with_capacity(fa.len());
            for (x, y) in fa.into_iter().zip(fb) {
                let eq = equal_cells(rw, state, x, y, span)?;
                if eq == Arena::FALSE {
                    return Ok(Arena::FALSE);
                }
                fields.push(eq);
            }
            rw.conjoin(state, fields)
        }
        CellType::Fun(..) => {
            let ea = state.arena.get_has(a);
            let eb = state.arena.get_has(b);
            match (ea.split_first(), eb.split_first()) {
                (Some((da, ra)), Some((db, rb))) if da == db => {
                    let mut points = Vec::with_capacity(ra.len());
                    for (&x, &y) in ra.iter().zip(rb) {
                        let eq = equal_cells(rw, state, x, y, span)?;
                        if eq == Arena::FALSE {
                            return Ok(Arena::FALSE);
                        }
                        points.push(eq);
                    }
                    rw.conjoin(state, points)
                }
                _ => Err(BmcError::unsupported(
                    "equality of functions over different domain sets",
                    Some(span),
                )),
            }
        }
    }
}

/// `a \subseteq b` for sets with oracle membership
fn subset_cell(
    rw: &mut Rewriter<'_>,
    state: &mut SymbState,
    a: CellId,
    b: CellId,
    span: Span,
) -> BmcResult<CellId> {
    let mut conjuncts = Vec::new();
    for e in state.arena.get_has(a) {
        let mut witnesses = Vec::new();
        for f in state.arena.get_has(b) {
            let eq = equal_cells(rw, state, e, f, span)?;
            if eq == Arena::FALSE {
                continue;
            }
            let in_b = rw.membership(state, f, b)?;
            witnesses.push(if eq == Arena::TRUE {
                in_b
            } else {
                Term::and(vec![in_b, Term::cell(eq)])
            });
        }
        let in_a = rw.membership(state, e, a)?;
        conjuncts.push(Term::implies(in_a, Term::or(witnesses)));
    }
    rw.bool_term_cell(state, Term::and(conjuncts))
}

/// `<`, `<=`, `>`, `>=`; the latter two are flipped into the former
pub struct IntCmpRule;

impl RewritingRule for IntCmpRule {
    fn name(&self) -> &'static str {
        "int_cmp"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(
            state.expr.kind,
            ExprKind::Lt(..) | ExprKind::Leq(..) | ExprKind::Gt(..) | ExprKind::Geq(..)
        )
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        let (a, b, strict) = match &parent.kind {
            ExprKind::Gt(a, b) => {
                let flipped = ExprKind::Lt(b.clone(), a.clone());
                return Ok(state.with_expr(parent.derive(flipped, TlaType::Bool)));
            }
            ExprKind::Geq(a, b) => {
                let flipped = ExprKind::Leq(b.clone(), a.clone());
                return Ok(state.with_expr(parent.derive(flipped, TlaType::Bool)));
            }
            ExprKind::Lt(a, b) => (a, b, true),
            ExprKind::Leq(a, b) => (a, b, false),
            _ => return Err(misuse(self.name(), &state)),
        };

        let (state, ca) = rewrite_pure(rw, state, a, "a comparison")?;
        let (mut state, cb) = rewrite_pure(rw, state, b, "a comparison")?;
        expect_type(&state, ca, &CellType::Int, a.span)?;
        expect_type(&state, cb, &CellType::Int, b.span)?;

        let folded = match (rw.int_value(ca), rw.int_value(cb)) {
            (Some(x), Some(y)) => Some(if strict { x < y } else { x <= y }),
            _ if ca == cb => Some(!strict),
            _ => None,
        };
        let result = match folded {
            Some(v) => Rewriter::bool_cell(v),
            None => {
                let (x, y) = (Term::cell(ca), Term::cell(cb));
                let term = if strict { Term::lt(x, y) } else { Term::le(x, y) };
                rw.define(&mut state, CellType::Bool, term)?
            }
        };
        Ok(state.with_result(&parent, result))
    }
}

/// `+` and `-`
pub struct IntArithRule;

impl RewritingRule for IntArithRule {
    fn name(&self) -> &'static str {
        "int_arith"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Add(..) | ExprKind::Sub(..))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        let (a, b, add) = match &parent.kind {
            ExprKind::Add(a, b) => (a, b, true),
            ExprKind::Sub(a, b) => (a, b, false),
            _ => return Err(misuse(self.name(), &state)),
        };

        let (state, ca) = rewrite_pure(rw, state, a, "an arithmetic expression")?;
        let (mut state, cb) = rewrite_pure(rw, state, b, "an arithmetic expression")?;
        expect_type(&state, ca, &CellType::Int, a.span)?;
        expect_type(&state, cb, &CellType::Int, b.span)?;

        let folded = match (rw.int_value(ca), rw.int_value(cb)) {
            (Some(x), Some(y)) => Some(if add { x + y } else { x - y }),
            _ => None,
        };
        let result = match folded {
            Some(n) => rw.literal_cell(&mut state, Literal::Int(n))?,
            None => {
                let (x, y) = (Term::cell(ca), Term::cell(cb));
                let term = if add { Term::add(x, y) } else { Term::sub(x, y) };
                rw.define(&mut state, CellType::Int, term)?
            }
        };
        Ok(state.with_result(&parent, result))
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::CellType;
    use crate::config::Encoding;
    use crate::error::BmcError;
    use crate::test_support::Harness;
    use crate::Arena;
    use num_bigint::BigInt;
    use tla_core::{ExprBuilder, TlaType};

    #[test]
    fn test_literal_comparisons_fold() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        assert_eq!(h.rewrite(&b.eq(b.int(1), b.int(2))).1, Arena::FALSE);
        assert_eq!(h.rewrite(&b.neq(b.int(1), b.int(2))).1, Arena::TRUE);
        assert_eq!(h.rewrite(&b.lt(b.int(1), b.int(2))).1, Arena::TRUE);
        assert_eq!(h.rewrite(&b.ge(b.int(1), b.int(2))).1, Arena::FALSE);
        assert_eq!(h.rewrite(&b.eq(b.str("a"), b.str("a"))).1, Arena::TRUE);
        let (_, sum) = h.rewrite(&b.sub(b.add(b.int(2), b.int(3)), b.int(1)));
        assert!(h.is_sat());
        assert_eq!(h.eval_int(sum), BigInt::from(4));
    }

    #[test]
    fn test_symbolic_comparison() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        h.int_var("x", 7);
        let x = || b.name("x", TlaType::Int);
        let (_, gt) = h.rewrite(&b.gt(x(), b.int(5)));
        let (_, le) = h.rewrite(&b.le(x(), b.int(6)));
        assert!(h.is_sat());
        assert!(h.eval_bool(gt));
        assert!(!h.eval_bool(le));
    }

    #[test]
    fn test_type_mismatch() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let err = h.try_rewrite(&b.eq(b.int(1), b.bool(true))).unwrap_err();
        assert!(matches!(err, BmcError::TypeMismatch { .. }));
        let err = h.try_rewrite(&b.lt(b.str("a"), b.int(1))).unwrap_err();
        assert!(matches!(err, BmcError::TypeMismatch { .. }));
    }

    #[test]
    fn test_set_equality_is_extensional() {
        for encoding in [Encoding::Arrays, Encoding::Oracles] {
            let mut h = Harness::with_encoding(encoding);
            let b = ExprBuilder::new();
            let ints = |xs: &[i64]| b.set_enum(TlaType::Int, xs.iter().map(|&x| b.int(x)).collect());
            let (_, same) = h.rewrite(&b.eq(ints(&[1, 2]), ints(&[2, 1, 2])));
            let (_, different) = h.rewrite(&b.eq(ints(&[1, 2]), ints(&[1, 3])));
            assert!(h.is_sat(), "{:?}", encoding);
            assert!(h.eval_bool(same), "{:?}", encoding);
            assert!(!h.eval_bool(different), "{:?}", encoding);
        }
    }

    #[test]
    fn test_record_equality_is_fieldwise() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        h.var("y", CellType::Int);
        let rec = |v| b.record(vec![("a", b.int(1)), ("b", v)]);
        let (_, eq) = h.rewrite(&b.eq(rec(b.name("y", TlaType::Int)), rec(b.int(2))));
        h.assert_true(eq);
        assert!(h.is_sat());
        let y = h.binding.get("y").unwrap();
        assert_eq!(h.eval_int(y), BigInt::from(2));
    }
}
