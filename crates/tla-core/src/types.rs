//! Types of TLA+ expressions
//!
//! TLA+ is untyped, but the front-end runs type inference before handing
//! expressions to the symbolic checker, so every AST node carries one of
//! these types.

use std::collections::BTreeMap;
use std::fmt;

/// Inferred TLA+ types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TlaType {
    /// BOOLEAN
    Bool,
    /// Int
    Int,
    /// STRING
    Str,
    /// Set(T)
    Set(Box<TlaType>),
    /// T1 -> T2
    Func(Box<TlaType>, Box<TlaType>),
    /// Record type, fields kept in name order
    Record(BTreeMap<String, TlaType>),
    /// Unknown type (inference failed)
    Unknown,
}

impl TlaType {
    pub fn set_of(elem: TlaType) -> Self {
        TlaType::Set(Box::new(elem))
    }

    pub fn func(domain: TlaType, range: TlaType) -> Self {
        TlaType::Func(Box::new(domain), Box::new(range))
    }

    /// Element type of a set type
    pub fn elem(&self) -> Option<&TlaType> {
        match self {
            TlaType::Set(elem) => Some(elem),
            _ => None,
        }
    }

    /// Range type of a function type
    pub fn range(&self) -> Option<&TlaType> {
        match self {
            TlaType::Func(_, range) => Some(range),
            _ => None,
        }
    }

    /// Type of a record field
    pub fn field(&self, name: &str) -> Option<&TlaType> {
        match self {
            TlaType::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Check if type is fully resolved
    pub fn is_resolved(&self) -> bool {
        match self {
            TlaType::Unknown => false,
            TlaType::Bool | TlaType::Int | TlaType::Str => true,
            TlaType::Set(t) => t.is_resolved(),
            TlaType::Func(d, r) => d.is_resolved() && r.is_resolved(),
            TlaType::Record(fs) => fs.values().all(|t| t.is_resolved()),
        }
    }
}

impl fmt::Display for TlaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlaType::Bool => write!(f, "Bool"),
            TlaType::Int => write!(f, "Int"),
            TlaType::Str => write!(f, "Str"),
            TlaType::Set(elem) => write!(f, "Set({})", elem),
            TlaType::Func(d, r) => write!(f, "({} -> {})", d, r),
            TlaType::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}}")
            }
            TlaType::Unknown => write!(f, "?"),
        }
    }
}
