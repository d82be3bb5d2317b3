//! Cell arena: the symbolic memory of the checker
//!
//! Every TLA+ value the checker reasons about lives in a cell. The
//! arena is an append-only ledger of cells and of "has" edges from container
//! cells to the cells they may contain:
//!
//! - a finite set has its potential elements;
//! - a record has one cell per field, in field-name order;
//! - a function has its domain set cell first, then one result cell per
//!   domain element, in the order of the domain's elements.
//!
//! # Persistence
//!
//! The ledger is stored in `im` collections, so cloning an arena is O(1) and
//! a clone shares structure with its origin. Backtracking never copies: the
//! extent of an arena is captured by an [`ArenaMark`] and [`Arena::truncate`]
//! drops everything appended after it, in time proportional to what is
//! dropped. Identities of dropped cells are handed out again.

use crate::error::{BmcError, BmcResult};
use std::collections::BTreeMap;
use std::fmt;
use tla_core::{CellId, TlaType};

/// Type tag of a cell
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CellType {
    Bool,
    Int,
    Str,
    FinSet(Box<CellType>),
    Fun(Box<CellType>, Box<CellType>),
    /// Fields in name order
    Record(BTreeMap<String, CellType>),
}

impl CellType {
    /// Cell type for an inferred expression type; `None` if unresolved
    pub fn from_tla(ty: &TlaType) -> Option<CellType> {
        Some(match ty {
            TlaType::Bool => CellType::Bool,
            TlaType::Int => CellType::Int,
            TlaType::Str => CellType::Str,
            TlaType::Set(elem) => CellType::FinSet(Box::new(Self::from_tla(elem)?)),
            TlaType::Func(d, r) => {
                CellType::Fun(Box::new(Self::from_tla(d)?), Box::new(Self::from_tla(r)?))
            }
            TlaType::Record(fields) => {
                let mut out = BTreeMap::new();
                for (name, ty) in fields {
                    out.insert(name.clone(), Self::from_tla(ty)?);
                }
                CellType::Record(out)
            }
            TlaType::Unknown => return None,
        })
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, CellType::Bool | CellType::Int | CellType::Str)
    }

    /// Element type of a set type
    pub fn elem(&self) -> Option<&CellType> {
        match self {
            CellType::FinSet(elem) => Some(elem),
            _ => None,
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellType::Bool => write!(f, "Bool"),
            CellType::Int => write!(f, "Int"),
            CellType::Str => write!(f, "Str"),
            CellType::FinSet(elem) => write!(f, "Set({})", elem),
            CellType::Fun(d, r) => write!(f, "({} -> {})", d, r),
            CellType::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// An immutable, numbered memory location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub id: CellId,
    pub ty: CellType,
}

/// Extent of an arena, for truncation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaMark {
    cells: usize,
    edges: usize,
}

impl ArenaMark {
    /// Number of cells at the time of the mark
    pub fn cells(&self) -> usize {
        self.cells
    }
}

/// Has-edges of one container: append order plus an identity set for
/// duplicate checks
#[derive(Clone, Debug, Default)]
struct Edges {
    order: im::Vector<CellId>,
    members: im::HashSet<CellId>,
}

/// Append-only ledger of cells and has-edges
#[derive(Clone, Debug)]
pub struct Arena {
    cells: im::Vector<Cell>,
    has: im::HashMap<CellId, Edges>,
    /// Container of every edge, in append order
    edge_log: im::Vector<CellId>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// The predefined cell holding FALSE
    pub const FALSE: CellId = CellId(0);
    /// The predefined cell holding TRUE
    pub const TRUE: CellId = CellId(1);

    /// An arena holding only the `FALSE` and `TRUE` cells
    pub fn new() -> Self {
        let mut arena = Arena {
            cells: im::Vector::new(),
            has: im::HashMap::new(),
            edge_log: im::Vector::new(),
        };
        arena.append_cell(CellType::Bool);
        arena.append_cell(CellType::Bool);
        arena
    }

    /// Allocate a fresh cell; its identity is greater than every live one
    pub fn append_cell(&mut self, ty: CellType) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push_back(Cell { id, ty });
        id
    }

    /// Record `elements` as potential members of `container`, skipping
    /// those already recorded
    pub fn append_has(&mut self, container: CellId, elements: &[CellId]) -> BmcResult<()> {
        self.check(container)?;
        for &e in elements {
            self.check(e)?;
        }
        let mut edges = self.has.get(&container).cloned().unwrap_or_default();
        for &e in elements {
            if edges.members.insert(e).is_none() {
                edges.order.push_back(e);
                self.edge_log.push_back(container);
            }
        }
        self.has.insert(container, edges);
        Ok(())
    }

    /// Potential members of `container`, in append order
    pub fn get_has(&self, container: CellId) -> Vec<CellId> {
        self.has
            .get(&container)
            .map(|edges| edges.order.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn cell(&self, id: CellId) -> BmcResult<&Cell> {
        self.cells.get(id.as_usize()).ok_or(BmcError::UnknownCell(id))
    }

    pub fn cell_type(&self, id: CellId) -> BmcResult<&CellType> {
        self.cell(id).map(|c| &c.ty)
    }

    pub fn contains(&self, id: CellId) -> bool {
        id.as_usize() < self.cells.len()
    }

    /// Number of cells, predefined ones included
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of has-edges
    pub fn edge_count(&self) -> usize {
        self.edge_log.len()
    }

    pub fn mark(&self) -> ArenaMark {
        ArenaMark {
            cells: self.cells.len(),
            edges: self.edge_log.len(),
        }
    }

    /// Drop every cell and edge appended after `mark`
    pub fn truncate(&mut self, mark: ArenaMark) {
        while self.edge_log.len() > mark.edges {
            let Some(container) = self.edge_log.pop_back() else {
                break;
            };
            if let Some(mut edges) = self.has.remove(&container) {
                if let Some(last) = edges.order.pop_back() {
                    edges.members.remove(&last);
                }
                if !edges.order.is_empty() {
                    self.has.insert(container, edges);
                }
            }
        }
        self.cells.truncate(mark.cells);
    }

    fn check(&self, id: CellId) -> BmcResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(BmcError::UnknownCell(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_cells() {
        let arena = Arena::new();
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.cell_type(Arena::FALSE).unwrap(), &CellType::Bool);
        assert_eq!(arena.cell_type(Arena::TRUE).unwrap(), &CellType::Bool);
    }

    #[test]
    fn test_identities_increase() {
        let mut arena = Arena::new();
        let a = arena.append_cell(CellType::Int);
        let b = arena.append_cell(CellType::Int);
        assert!(b > a);
        assert!(a > Arena::TRUE);
    }

    #[test]
    fn test_has_skips_duplicates() {
        let mut arena = Arena::new();
        let set = arena.append_cell(CellType::FinSet(Box::new(CellType::Int)));
        let x = arena.append_cell(CellType::Int);
        let y = arena.append_cell(CellType::Int);
        arena.append_has(set, &[x, y, x]).unwrap();
        arena.append_has(set, &[y]).unwrap();
        assert_eq!(arena.get_has(set), vec![x, y]);
        assert_eq!(arena.edge_count(), 2);
        assert!(arena.get_has(x).is_empty());
    }

    #[test]
    fn test_has_rejects_unknown_cells() {
        let mut arena = Arena::new();
        let set = arena.append_cell(CellType::FinSet(Box::new(CellType::Int)));
        assert_eq!(
            arena.append_has(set, &[CellId(42)]),
            Err(BmcError::UnknownCell(CellId(42)))
        );
        assert_eq!(
            arena.append_has(CellId(7), &[]),
            Err(BmcError::UnknownCell(CellId(7)))
        );
        assert!(arena.get_has(set).is_empty());
    }

    #[test]
    fn test_truncate_restores_extent() {
        let mut arena = Arena::new();
        let set = arena.append_cell(CellType::FinSet(Box::new(CellType::Int)));
        let x = arena.append_cell(CellType::Int);
        arena.append_has(set, &[x]).unwrap();
        let mark = arena.mark();
        let saved = arena.clone();

        let y = arena.append_cell(CellType::Int);
        arena.append_has(set, &[y]).unwrap();
        let other = arena.append_cell(CellType::FinSet(Box::new(CellType::Int)));
        arena.append_has(other, &[x, y]).unwrap();

        arena.truncate(mark);
        assert_eq!(arena.len(), saved.len());
        assert_eq!(arena.get_has(set), vec![x]);
        assert!(arena.get_has(other).is_empty());
        assert_eq!(arena.edge_count(), 1);
        // identities are handed out again
        assert_eq!(arena.append_cell(CellType::Int), y);
    }

    #[test]
    fn test_truncated_edges_can_be_appended_again() {
        let mut arena = Arena::new();
        let set = arena.append_cell(CellType::FinSet(Box::new(CellType::Int)));
        let elems: Vec<CellId> = (0..500).map(|_| arena.append_cell(CellType::Int)).collect();
        arena.append_has(set, &elems[..250]).unwrap();
        let mark = arena.mark();

        arena.append_has(set, &elems).unwrap();
        assert_eq!(arena.get_has(set), elems);
        assert_eq!(arena.edge_count(), 500);

        arena.truncate(mark);
        assert_eq!(arena.get_has(set), elems[..250].to_vec());
        arena.append_has(set, &[elems[300], elems[0], elems[300]]).unwrap();
        let mut expected = elems[..250].to_vec();
        expected.push(elems[300]);
        assert_eq!(arena.get_has(set), expected);
        assert_eq!(arena.edge_count(), 251);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut arena = Arena::new();
        let fork = arena.clone();
        arena.append_cell(CellType::Int);
        assert_eq!(fork.len(), 2);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_cell_type_from_tla() {
        let ty = TlaType::set_of(TlaType::func(TlaType::Int, TlaType::Bool));
        assert_eq!(
            CellType::from_tla(&ty),
            Some(CellType::FinSet(Box::new(CellType::Fun(
                Box::new(CellType::Int),
                Box::new(CellType::Bool)
            ))))
        );
        assert_eq!(CellType::from_tla(&TlaType::set_of(TlaType::Unknown)), None);
    }
}
