//! Symbolic states and variable bindings
//!
//! A [`SymbState`] is the unit the rewriting rules pass around: the
//! expression still to be rewritten, the arena it is rewritten against and the
//! binding of names to cells. States are values; rules consume one and return
//! the next. Both the arena and the binding are persistent, so keeping an old
//! state around (to restore a binding after a bound variable goes out of
//! scope) costs nothing.

use crate::arena::Arena;
use std::fmt;
use tla_core::{CellId, ExprRef};

/// Map from variable names (`x`, `x'`, bound variables) to cells
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Binding {
    map: im::HashMap<String, CellId>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<CellId> {
        self.map.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, cell: CellId) {
        self.map.insert(name.into(), cell);
    }

    /// A copy of this binding with `name` mapped to `cell`
    pub fn with(&self, name: impl Into<String>, cell: CellId) -> Binding {
        Binding {
            map: self.map.update(name.into(), cell),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Bindings sorted by name
    pub fn iter_sorted(&self) -> Vec<(&str, CellId)> {
        let mut out: Vec<_> = self.map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        out.sort();
        out
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, cell)) in self.iter_sorted().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> {}", name, cell)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, CellId)> for Binding {
    fn from_iter<I: IntoIterator<Item = (String, CellId)>>(iter: I) -> Self {
        Binding {
            map: iter.into_iter().collect(),
        }
    }
}

/// Expression, arena and binding
#[derive(Clone, Debug)]
pub struct SymbState {
    pub expr: ExprRef,
    pub arena: Arena,
    pub binding: Binding,
}

impl SymbState {
    pub fn new(expr: ExprRef, arena: Arena, binding: Binding) -> Self {
        SymbState {
            expr,
            arena,
            binding,
        }
    }

    /// Normal form: the expression is a single cell reference
    pub fn is_normalized(&self) -> bool {
        self.expr.cell().is_some()
    }

    pub fn cell(&self) -> Option<CellId> {
        self.expr.cell()
    }

    pub fn with_expr(self, expr: ExprRef) -> Self {
        SymbState { expr, ..self }
    }

    /// Replace the expression by a reference to `cell`
    pub fn with_cell(self, cell: CellId) -> Self {
        let expr = self.expr.to_cell(cell);
        SymbState { expr, ..self }
    }

    /// Normal form of `origin`: a reference to `cell` carrying the identity
    /// and type of the node that was rewritten
    pub fn with_result(self, origin: &ExprRef, cell: CellId) -> Self {
        SymbState {
            expr: origin.to_cell(cell),
            ..self
        }
    }

    pub fn with_binding(self, binding: Binding) -> Self {
        SymbState { binding, ..self }
    }
}
