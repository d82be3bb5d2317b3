//! Reading concrete values back out of a model
//!
//! After a satisfiable check every cell has a value in the solver's model.
//! Primitive cells are evaluated directly; containers are rebuilt from their
//! has-edges, keeping only the potential elements the model makes members.

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tla_core::CellId;
use tla_smt::{SolverContext, Term, Value};

use crate::arena::{Arena, CellType};
use crate::config::Encoding;
use crate::encoding;
use crate::error::{BmcError, BmcResult};

/// A concrete TLA+ value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StateValue {
    Bool(bool),
    Int(BigInt),
    Str(String),
    Set(BTreeSet<StateValue>),
    Record(BTreeMap<String, StateValue>),
    Fun(BTreeMap<StateValue, StateValue>),
    /// Value of an uninterpreted sort, as printed by the solver
    Opaque(String),
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(true) => write!(f, "TRUE"),
            StateValue::Bool(false) => write!(f, "FALSE"),
            StateValue::Int(n) => write!(f, "{}", n),
            StateValue::Str(s) => write!(f, "{:?}", s),
            StateValue::Set(elems) => {
                write!(f, "{{")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "}}")
            }
            StateValue::Record(fields) => {
                write!(f, "[")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} |-> {}", name, v)?;
                }
                write!(f, "]")
            }
            StateValue::Fun(map) => {
                if map.is_empty() {
                    return write!(f, "<<>>");
                }
                write!(f, "(")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, " @@ ")?;
                    }
                    write!(f, "{} :> {}", k, v)?;
                }
                write!(f, ")")
            }
            StateValue::Opaque(s) => write!(f, "{}", s),
        }
    }
}

/// Value of `cell` in the solver's last model
pub fn decode_cell<S: SolverContext + ?Sized>(
    arena: &Arena,
    solver: &mut S,
    encoding: Encoding,
    cell: CellId,
) -> BmcResult<StateValue> {
    match arena.cell_type(cell)? {
        CellType::Bool | CellType::Int | CellType::Str => {
            Ok(match solver.evaluate(&Term::cell(cell))? {
                Value::Bool(b) => StateValue::Bool(b),
                Value::Int(n) => StateValue::Int(n),
                Value::Str(s) => StateValue::Str(s),
                Value::Opaque(s) => StateValue::Opaque(s),
            })
        }
        CellType::FinSet(elem) => {
            let repr = encoding::set_repr(encoding, elem);
            let mut out = BTreeSet::new();
            for e in arena.get_has(cell) {
                if is_member(solver, encoding::membership(&repr, e, cell))? {
                    out.insert(decode_cell(arena, solver, encoding, e)?);
                }
            }
            Ok(StateValue::Set(out))
        }
        CellType::Record(fields) => {
            let edges = arena.get_has(cell);
            if edges.len() != fields.len() {
                return Err(BmcError::UnknownCell(cell));
            }
            let mut out = BTreeMap::new();
            for (name, field) in fields.keys().zip(edges) {
                out.insert(name.clone(), decode_cell(arena, solver, encoding, field)?);
            }
            Ok(StateValue::Record(out))
        }
        CellType::Fun(domain_ty, _) => {
            let edges = arena.get_has(cell);
            let Some((&domain, results)) = edges.split_first() else {
                return Err(BmcError::UnknownCell(cell));
            };
            let repr = encoding::set_repr(encoding, domain_ty);
            let mut out = BTreeMap::new();
            for (e, &r) in arena.get_has(domain).into_iter().zip(results) {
                if is_member(solver, encoding::membership(&repr, e, domain))? {
                    let key = decode_cell(arena, solver, encoding, e)?;
                    out.insert(key, decode_cell(arena, solver, encoding, r)?);
                }
            }
            Ok(StateValue::Fun(out))
        }
    }
}

fn is_member<S: SolverContext + ?Sized>(solver: &mut S, term: Term) -> BmcResult<bool> {
    match solver.evaluate(&term)? {
        Value::Bool(b) => Ok(b),
        other => Err(BmcError::type_mismatch(CellType::Bool, other, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> StateValue {
        StateValue::Int(BigInt::from(n))
    }

    #[test]
    fn test_display_like_tlc() {
        let set = StateValue::Set([int(2), int(1)].into_iter().collect());
        assert_eq!(set.to_string(), "{1, 2}");

        let mut fields = BTreeMap::new();
        fields.insert("b".to_string(), StateValue::Bool(true));
        fields.insert("a".to_string(), StateValue::Str("x".to_string()));
        assert_eq!(
            StateValue::Record(fields).to_string(),
            r#"[a |-> "x", b |-> TRUE]"#
        );

        let fun: BTreeMap<_, _> = [(int(1), int(2)), (int(2), int(3))].into_iter().collect();
        assert_eq!(StateValue::Fun(fun).to_string(), "(1 :> 2 @@ 2 :> 3)");
        assert_eq!(StateValue::Fun(BTreeMap::new()).to_string(), "<<>>");
    }

    #[test]
    fn test_values_order_for_sets() {
        let nested: BTreeSet<_> = [
            StateValue::Set(BTreeSet::new()),
            StateValue::Set([int(1)].into_iter().collect()),
        ]
        .into_iter()
        .collect();
        assert_eq!(nested.len(), 2);
    }

    #[test]
    fn test_serde_roundtrip() {
        let value = StateValue::Set([int(1), int(-4)].into_iter().collect());
        let json = serde_json::to_string(&value).unwrap();
        let back: StateValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
