//! Memoization of rewriting results
//!
//! Two caches share one eviction policy: closed expressions (no free names)
//! are remembered by node identity, and literal constants by value. Both map
//! to cells of the arena they were computed in, so truncating the arena must
//! be followed by [`RewriteCache::evict_from`].

use num_bigint::BigInt;
use rustc_hash::FxHashMap;
use tla_core::{CellId, ExprId};
use tla_smt::Term;

use crate::arena::Arena;

/// A constant held by a cell
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Bool(bool),
    Int(BigInt),
    Str(String),
}

impl Literal {
    pub fn to_term(&self) -> Term {
        match self {
            Literal::Bool(b) => Term::Bool(*b),
            Literal::Int(n) => Term::Int(n.clone()),
            Literal::Str(s) => Term::Str(s.clone()),
        }
    }
}

/// Arena-scoped rewriting cache
#[derive(Clone, Debug)]
pub struct RewriteCache {
    /// Keyed by node identity and operator tag: synthesized nodes share the
    /// identity of the node they replace but never its tag
    exprs: FxHashMap<(ExprId, &'static str), CellId>,
    literals: FxHashMap<Literal, CellId>,
    values: FxHashMap<CellId, Literal>,
}

impl Default for RewriteCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteCache {
    pub fn new() -> Self {
        let mut cache = RewriteCache {
            exprs: FxHashMap::default(),
            literals: FxHashMap::default(),
            values: FxHashMap::default(),
        };
        cache.remember_literal(Literal::Bool(false), Arena::FALSE);
        cache.remember_literal(Literal::Bool(true), Arena::TRUE);
        cache
    }

    pub fn lookup_expr(&self, id: ExprId, tag: &'static str) -> Option<CellId> {
        self.exprs.get(&(id, tag)).copied()
    }

    pub fn remember_expr(&mut self, id: ExprId, tag: &'static str, cell: CellId) {
        self.exprs.insert((id, tag), cell);
    }

    pub fn literal_cell(&self, lit: &Literal) -> Option<CellId> {
        self.literals.get(lit).copied()
    }

    pub fn remember_literal(&mut self, lit: Literal, cell: CellId) {
        self.values.insert(cell, lit.clone());
        self.literals.insert(lit, cell);
    }

    /// Record the constant held by a cell that is not the shared cell of
    /// that constant
    pub fn remember_value(&mut self, cell: CellId, lit: Literal) {
        self.values.insert(cell, lit);
    }

    /// The constant a cell is known to hold
    pub fn literal_of(&self, cell: CellId) -> Option<&Literal> {
        self.values.get(&cell)
    }

    /// Drop every entry pointing at a cell with identity `>= len`
    pub fn evict_from(&mut self, len: usize) {
        let live = |c: &CellId| c.as_usize() < len;
        self.exprs.retain(|_, c| live(c));
        self.literals.retain(|_, c| live(c));
        self.values.retain(|c, _| live(c));
    }

    pub fn len(&self) -> usize {
        self.exprs.len() + self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_known_for_predefined_cells() {
        let cache = RewriteCache::new();
        assert_eq!(cache.literal_of(Arena::TRUE), Some(&Literal::Bool(true)));
        assert_eq!(
            cache.literal_cell(&Literal::Bool(false)),
            Some(Arena::FALSE)
        );
    }

    #[test]
    fn test_evict_from() {
        let mut cache = RewriteCache::new();
        cache.remember_literal(Literal::Int(BigInt::from(7)), CellId(5));
        cache.remember_expr(ExprId(1), "Add", CellId(6));
        cache.remember_expr(ExprId(2), "Add", CellId(3));
        cache.evict_from(5);
        assert_eq!(cache.literal_cell(&Literal::Int(BigInt::from(7))), None);
        assert_eq!(cache.literal_of(CellId(5)), None);
        assert_eq!(cache.lookup_expr(ExprId(1), "Add"), None);
        assert_eq!(cache.lookup_expr(ExprId(2), "Add"), Some(CellId(3)));
        assert_eq!(cache.literal_of(Arena::TRUE), Some(&Literal::Bool(true)));
    }

    #[test]
    fn test_tags_separate_synthesized_nodes() {
        let mut cache = RewriteCache::new();
        cache.remember_expr(ExprId(4), "Not", CellId(9));
        assert_eq!(cache.lookup_expr(ExprId(4), "Eq"), None);
    }
}
