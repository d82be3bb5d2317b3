//! The rewriting engine
//!
//! [`Rewriter::rewrite_until_done`] normalizes an expression to a single cell
//! by repeatedly applying the first applicable [`RewritingRule`]. Rules
//! allocate cells in the state's arena and emit constraints through the
//! solver context held by the rewriter; they never touch the solver's scope
//! stack.
//!
//! The helpers on [`Rewriter`] are shared by the rules: allocating and
//! declaring cells, literal cells, defining a cell by a term, folding
//! conjunctions and disjunctions of cells, and the structural operations on
//! containers (equality, copying).

use std::collections::BTreeMap;

use num_bigint::BigInt;
use tla_core::{CellId, ExprRef};
use tla_smt::{SolverContext, Term};
use tracing::{debug, trace};

use crate::arena::{Arena, CellType};
use crate::cache::{Literal, RewriteCache};
use crate::config::Encoding;
use crate::encoding::{self, SetRepr};
use crate::error::{BmcError, BmcResult};
use crate::rules;
use crate::state::SymbState;

/// A rewriting rule
///
/// `is_applicable` is a pure test on the expression; `apply` on an expression
/// the rule does not handle fails with [`BmcError::RuleMisuse`].
pub trait RewritingRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_applicable(&self, state: &SymbState) -> bool;

    fn apply(&self, rw: &mut Rewriter<'_>, state: SymbState) -> BmcResult<SymbState>;
}

/// Rules in priority order
pub struct RuleSet {
    rules: Vec<Box<dyn RewritingRule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn RewritingRule>>) -> Self {
        RuleSet { rules }
    }

    /// The complete rule set for the supported fragment
    pub fn standard() -> Self {
        Self::new(rules::standard_rules())
    }

    /// First applicable rule
    pub fn find(&self, state: &SymbState) -> Option<&dyn RewritingRule> {
        self.rules
            .iter()
            .find(|r| r.is_applicable(state))
            .map(|r| r.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Counters for rule applications
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub rule_applications: u64,
    pub cache_hits: u64,
    pub per_rule: BTreeMap<&'static str, u64>,
}

impl RewriteStats {
    fn record(&mut self, rule: &'static str) {
        self.rule_applications += 1;
        *self.per_rule.entry(rule).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &RewriteStats) {
        self.rule_applications += other.rule_applications;
        self.cache_hits += other.cache_hits;
        for (rule, n) in &other.per_rule {
            *self.per_rule.entry(rule).or_insert(0) += n;
        }
    }
}

/// Rewriting context threaded through the rules
pub struct Rewriter<'a> {
    rules: &'a RuleSet,
    solver: &'a mut dyn SolverContext,
    cache: &'a mut RewriteCache,
    encoding: Encoding,
    debug: bool,
    stats: RewriteStats,
}

impl<'a> Rewriter<'a> {
    pub fn new(
        rules: &'a RuleSet,
        solver: &'a mut dyn SolverContext,
        cache: &'a mut RewriteCache,
        encoding: Encoding,
    ) -> Self {
        Rewriter {
            rules,
            solver,
            cache,
            encoding,
            debug: false,
            stats: RewriteStats::default(),
        }
    }

    /// Log every assertion at debug level
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn stats(&self) -> &RewriteStats {
        &self.stats
    }

    pub fn into_stats(self) -> RewriteStats {
        self.stats
    }

    /// Rewrite until the expression is a cell reference
    pub fn rewrite_until_done(&mut self, state: SymbState) -> BmcResult<SymbState> {
        self.normalize(state).map(|(state, _)| state)
    }

    /// Rewrite `expr` in the arena and binding of `state`; returns the
    /// resulting state, whose binding may carry new primed assignments, and
    /// the cell `expr` normalized to
    pub fn rewrite_sub(
        &mut self,
        state: SymbState,
        expr: &ExprRef,
    ) -> BmcResult<(SymbState, CellId)> {
        self.normalize(state.with_expr(expr.clone()))
    }

    fn normalize(&mut self, mut state: SymbState) -> BmcResult<(SymbState, CellId)> {
        let origin = state.expr.clone();
        loop {
            if let Some(cell) = state.cell() {
                if origin.is_closed() && origin.cell().is_none() {
                    self.cache.remember_expr(origin.id, origin.kind.tag(), cell);
                }
                return Ok((state, cell));
            }

            if state.expr.is_closed() {
                let hit = self
                    .cache
                    .lookup_expr(state.expr.id, state.expr.kind.tag())
                    .filter(|c| state.arena.contains(*c));
                if let Some(cell) = hit {
                    self.stats.cache_hits += 1;
                    state = state.with_cell(cell);
                    continue;
                }
            }

            let rules = self.rules;
            let rule = rules
                .find(&state)
                .ok_or_else(|| BmcError::NoApplicableRule {
                    expr: state.expr.to_string(),
                    span: Some(state.expr.span),
                })?;
            trace!(rule = rule.name(), expr = %state.expr, "apply rule");
            state = rule.apply(self, state)?;
            self.stats.record(rule.name());
        }
    }

    // === Cells and constraints ===

    /// Allocate a cell and declare it to the solver
    pub fn fresh_cell(&mut self, state: &mut SymbState, ty: CellType) -> BmcResult<CellId> {
        let sort = encoding::sort_of(self.encoding, &ty);
        let cell = state.arena.append_cell(ty);
        self.solver.declare_cell(cell, &sort)?;
        Ok(cell)
    }

    pub fn assert(&mut self, term: Term) -> BmcResult<()> {
        if self.debug {
            debug!(%term, "assert");
        }
        self.solver.assert_ground_expr(&term)?;
        Ok(())
    }

    /// A fresh cell of type `ty` constrained to equal `term`
    pub fn define(&mut self, state: &mut SymbState, ty: CellType, term: Term) -> BmcResult<CellId> {
        let cell = self.fresh_cell(state, ty)?;
        self.assert(Term::eq(Term::cell(cell), term))?;
        Ok(cell)
    }

    /// The cell holding a constant, shared per value
    pub fn literal_cell(&mut self, state: &mut SymbState, lit: Literal) -> BmcResult<CellId> {
        if let Some(cell) = self.cache.literal_cell(&lit) {
            if state.arena.contains(cell) {
                return Ok(cell);
            }
        }
        let ty = match &lit {
            Literal::Bool(_) => CellType::Bool,
            Literal::Int(_) => CellType::Int,
            Literal::Str(_) => CellType::Str,
        };
        let cell = self.define(state, ty, lit.to_term())?;
        self.cache.remember_literal(lit, cell);
        Ok(cell)
    }

    pub fn bool_cell(value: bool) -> CellId {
        if value {
            Arena::TRUE
        } else {
            Arena::FALSE
        }
    }

    /// The constant a boolean cell is known to hold
    pub fn bool_value(&self, cell: CellId) -> Option<bool> {
        match self.cache.literal_of(cell) {
            Some(Literal::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn int_value(&self, cell: CellId) -> Option<&BigInt> {
        match self.cache.literal_of(cell) {
            Some(Literal::Int(n)) => Some(n),
            _ => None,
        }
    }

    pub fn literal_of(&self, cell: CellId) -> Option<&Literal> {
        self.cache.literal_of(cell)
    }

    /// Conjunction of boolean cells, folded where constant
    pub fn conjoin(&mut self, state: &mut SymbState, cells: Vec<CellId>) -> BmcResult<CellId> {
        self.junction(state, cells, false)
    }

    /// Disjunction of boolean cells, folded where constant
    pub fn disjoin(&mut self, state: &mut SymbState, cells: Vec<CellId>) -> BmcResult<CellId> {
        self.junction(state, cells, true)
    }

    fn junction(
        &mut self,
        state: &mut SymbState,
        cells: Vec<CellId>,
        absorbing: bool,
    ) -> BmcResult<CellId> {
        let mut operands = Vec::new();
        for cell in cells {
            match self.bool_value(cell) {
                Some(b) if b == absorbing => return Ok(Self::bool_cell(absorbing)),
                Some(_) => {}
                None if operands.contains(&cell) => {}
                None => operands.push(cell),
            }
        }
        match operands.len() {
            0 => Ok(Self::bool_cell(!absorbing)),
            1 => Ok(operands[0]),
            _ => {
                let terms = operands.into_iter().map(Term::cell).collect();
                let term = if absorbing {
                    Term::or(terms)
                } else {
                    Term::and(terms)
                };
                self.define(state, CellType::Bool, term)
            }
        }
    }

    /// A boolean cell for `term`, folding the trivial terms
    pub fn bool_term_cell(&mut self, state: &mut SymbState, term: Term) -> BmcResult<CellId> {
        match term {
            Term::Bool(b) => Ok(Self::bool_cell(b)),
            Term::Cell(c) => Ok(c),
            Term::And(ts) if ts.is_empty() => Ok(Arena::TRUE),
            Term::Or(ts) if ts.is_empty() => Ok(Arena::FALSE),
            Term::And(mut ts) | Term::Or(mut ts) if ts.len() == 1 => {
                let only = ts.remove(0);
                self.bool_term_cell(state, only)
            }
            other => self.define(state, CellType::Bool, other),
        }
    }

    // === Sets ===

    /// Representation of the set held by `set`
    pub fn set_repr(&self, state: &SymbState, set: CellId) -> BmcResult<SetRepr> {
        match state.arena.cell_type(set)? {
            CellType::FinSet(elem) => Ok(encoding::set_repr(self.encoding, elem)),
            other => Err(BmcError::type_mismatch("a finite set", other, None)),
        }
    }

    /// The boolean term "`elem` is a member of `set`"
    pub fn membership(&self, state: &SymbState, elem: CellId, set: CellId) -> BmcResult<Term> {
        let repr = self.set_repr(state, set)?;
        Ok(encoding::membership(&repr, elem, set))
    }

    // === Containers ===

    /// Append `cells` to the edges of a record or function, copying cells
    /// that are already among its edges so positions are preserved
    pub fn append_positional(
        &mut self,
        state: &mut SymbState,
        container: CellId,
        cells: &[CellId],
    ) -> BmcResult<()> {
        let mut edges: Vec<CellId> = state.arena.get_has(container);
        for &cell in cells {
            let cell = if edges.contains(&cell) {
                self.copy_cell(state, cell)?
            } else {
                cell
            };
            edges.push(cell);
            state.arena.append_has(container, &[cell])?;
        }
        Ok(())
    }

    /// A fresh cell holding the same value as `cell`
    pub fn copy_cell(&mut self, state: &mut SymbState, cell: CellId) -> BmcResult<CellId> {
        let ty = state.arena.cell_type(cell)?.clone();
        match &ty {
            CellType::Bool | CellType::Int | CellType::Str => {
                let copy = self.define(state, ty.clone(), Term::cell(cell))?;
                if let Some(lit) = self.cache.literal_of(cell).cloned() {
                    // the copy is not the shared literal cell, so only
                    // remember its value
                    self.cache.remember_value(copy, lit);
                }
                Ok(copy)
            }
            CellType::FinSet(_) => {
                let copy = self.fresh_cell(state, ty.clone())?;
                let elems = state.arena.get_has(cell);
                state.arena.append_has(copy, &elems)?;
                match self.set_repr(state, cell)? {
                    SetRepr::Array(_) => self.assert(Term::eq(Term::cell(copy), Term::cell(cell)))?,
                    SetRepr::Oracle => {
                        let ties: Vec<Term> = elems
                            .iter()
                            .map(|&e| Term::iff(Term::in_oracle(e, copy), Term::in_oracle(e, cell)))
                            .collect();
                        if !ties.is_empty() {
                            self.assert(Term::and(ties))?;
                        }
                    }
                }
                Ok(copy)
            }
            CellType::Record(_) | CellType::Fun(..) => {
                let copy = self.fresh_cell(state, ty.clone())?;
                let edges = state.arena.get_has(cell);
                state.arena.append_has(copy, &edges)?;
                Ok(copy)
            }
        }
    }
}
