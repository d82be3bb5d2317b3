//! Records: `[a |-> e1, b |-> e2]` and `r.a`
//!
//! A record cell has one edge per field, in field-name order. Field access is
//! resolved statically from the record type, no constraint is emitted.

use tla_core::ExprKind;

use super::{cell_type_of, expect_type, misuse, rewrite_pure};
use crate::arena::CellType;
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{Rewriter, RewritingRule};
use crate::state::SymbState;

pub struct RecordCtorRule;

impl RewritingRule for RecordCtorRule {
    fn name(&self) -> &'static str {
        "record_ctor"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::Record(_))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        let ExprKind::Record(fields) = &parent.kind else {
            return Err(misuse(self.name(), &state));
        };
        let ty = cell_type_of(&parent)?;
        let CellType::Record(field_types) = &ty else {
            return Err(BmcError::type_mismatch("a record type", &ty, Some(parent.span)));
        };
        if field_types.len() != fields.len() {
            return Err(BmcError::type_mismatch(&ty, &parent.ty, Some(parent.span)));
        }

        let mut state = state;
        let mut cells = Vec::with_capacity(fields.len());
        for (name, field_ty) in field_types {
            let Some((_, value)) = fields.iter().find(|(n, _)| n == name) else {
                return Err(BmcError::type_mismatch(&ty, &parent.ty, Some(parent.span)));
            };
            let (next, cell) = rewrite_pure(rw, state, value, "a record")?;
            state = next;
            expect_type(&state, cell, field_ty, value.span)?;
            cells.push(cell);
        }

        let record = rw.fresh_cell(&mut state, ty.clone())?;
        rw.append_positional(&mut state, record, &cells)?;
        Ok(state.with_result(&parent, record))
    }
}

pub struct RecordAccessRule;

impl RewritingRule for RecordAccessRule {
    fn name(&self) -> &'static str {
        "record_access"
    }

    fn is_applicable(&self, state: &SymbState) -> bool {
        matches!(state.expr.kind, ExprKind::RecordAccess(..))
    }

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState> {
        let parent = state.expr.clone();
        let ExprKind::RecordAccess(rec, field) = &parent.kind else {
            return Err(misuse(self.name(), &state));
        };

        let (state, cell) = rewrite_pure(rw, state, rec, "a record access")?;
        let position = match state.arena.cell_type(cell)? {
            CellType::Record(fields) => fields.keys().position(|name| name == field),
            other => {
                return Err(BmcError::type_mismatch("a record", other, Some(rec.span)));
            }
        };
        let Some(position) = position else {
            return Err(BmcError::type_mismatch(
                format!("a record with field `{}`", field),
                state.arena.cell_type(cell)?,
                Some(parent.span),
            ));
        };
        let edges = state.arena.get_has(cell);
        let value = edges
            .get(position)
            .copied()
            .ok_or(BmcError::UnknownCell(cell))?;
        Ok(state.with_result(&parent, value))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Encoding;
    use crate::decode::StateValue;
    use crate::error::BmcError;
    use crate::test_support::Harness;
    use num_bigint::BigInt;
    use std::collections::BTreeMap;
    use tla_core::{ExprBuilder, TlaType};

    #[test]
    fn test_fields_are_positional_in_name_order() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let rec = b.record(vec![("z", b.int(1)), ("a", b.bool(true))]);
        let (state, cell) = h.rewrite(&rec);
        let edges = state.arena.get_has(cell);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0], crate::Arena::TRUE);
    }

    #[test]
    fn test_access() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        h.int_var("x", 7);
        let rec = || b.record(vec![("a", b.name("x", TlaType::Int)), ("b", b.str("s"))]);
        let (_, a) = h.rewrite(&b.access(rec(), "a"));
        let (_, s) = h.rewrite(&b.access(rec(), "b"));
        assert!(h.is_sat());
        assert_eq!(h.eval_int(a), BigInt::from(7));
        assert_eq!(h.decode(s), StateValue::Str("s".to_string()));
    }

    #[test]
    fn test_same_value_in_two_fields() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let rec = b.record(vec![("a", b.int(4)), ("b", b.int(4))]);
        let (state, cell) = h.rewrite(&rec);
        let edges = state.arena.get_has(cell);
        assert_eq!(edges.len(), 2);
        assert_ne!(edges[0], edges[1]);
        assert!(h.is_sat());
        let mut fields = BTreeMap::new();
        fields.insert("a".to_string(), StateValue::Int(BigInt::from(4)));
        fields.insert("b".to_string(), StateValue::Int(BigInt::from(4)));
        assert_eq!(h.decode(cell), StateValue::Record(fields));
    }

    #[test]
    fn test_nested_record_with_set_field() {
        let mut h = Harness::with_encoding(Encoding::Oracles);
        let b = ExprBuilder::new();
        let inner = b.record(vec![("s", b.set_enum(TlaType::Int, vec![b.int(1)]))]);
        let outer = b.record(vec![("in", inner)]);
        let (_, cell) = h.rewrite(&b.in_set(b.int(1), b.access(b.access(outer, "in"), "s")));
        assert!(h.is_sat());
        assert!(h.eval_bool(cell));
    }

    #[test]
    fn test_missing_field() {
        let mut h = Harness::new();
        let b = ExprBuilder::new();
        let rec = b.record(vec![("a", b.int(1))]);
        let err = h.try_rewrite(&b.access(rec, "b")).unwrap_err();
        assert!(matches!(err, BmcError::TypeMismatch { .. }));
    }
}
