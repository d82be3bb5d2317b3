//! Rule-level test harness: an arena, a binding and a memory solver

use num_bigint::BigInt;
use tla_core::{CellId, ExprRef};
use tla_smt::{MemorySolver, SmtCheckResult, SolverContext, Sort, Term, Value};

use crate::arena::{Arena, CellType};
use crate::cache::RewriteCache;
use crate::config::Encoding;
use crate::decode::{decode_cell, StateValue};
use crate::encoding;
use crate::error::BmcResult;
use crate::rewriter::{RewriteStats, Rewriter, RuleSet};
use crate::state::{Binding, SymbState};

pub(crate) struct Harness {
    pub rules: RuleSet,
    pub solver: MemorySolver,
    pub cache: RewriteCache,
    pub encoding: Encoding,
    pub arena: Arena,
    pub binding: Binding,
    pub stats: RewriteStats,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_encoding(Encoding::Arrays)
    }

    pub fn with_encoding(encoding: Encoding) -> Self {
        let mut solver = MemorySolver::new();
        solver.declare_cell(Arena::FALSE, &Sort::Bool).unwrap();
        solver.declare_cell(Arena::TRUE, &Sort::Bool).unwrap();
        solver
            .assert_ground_expr(&Term::not(Term::cell(Arena::FALSE)))
            .unwrap();
        solver.assert_ground_expr(&Term::cell(Arena::TRUE)).unwrap();
        Harness {
            rules: RuleSet::standard(),
            solver,
            cache: RewriteCache::new(),
            encoding,
            arena: Arena::new(),
            binding: Binding::new(),
            stats: RewriteStats::default(),
        }
    }

    /// Bind `name` to a fresh, unconstrained cell
    pub fn var(&mut self, name: &str, ty: CellType) -> CellId {
        let sort = encoding::sort_of(self.encoding, &ty);
        let cell = self.arena.append_cell(ty);
        self.solver.declare_cell(cell, &sort).unwrap();
        self.binding.insert(name, cell);
        cell
    }

    /// Bind `name` to a fresh cell equal to `value`
    pub fn int_var(&mut self, name: &str, value: i64) -> CellId {
        let cell = self.var(name, CellType::Int);
        self.solver
            .assert_ground_expr(&Term::eq(Term::cell(cell), Term::Int(BigInt::from(value))))
            .unwrap();
        cell
    }

    pub fn try_rewrite(&mut self, expr: &ExprRef) -> BmcResult<(SymbState, CellId)> {
        let state = SymbState::new(expr.clone(), self.arena.clone(), self.binding.clone());
        let mut rw = Rewriter::new(&self.rules, &mut self.solver, &mut self.cache, self.encoding);
        let result = rw.rewrite_sub(state, expr);
        self.stats.merge(rw.stats());
        let (state, cell) = result?;
        self.arena = state.arena.clone();
        Ok((state, cell))
    }

    pub fn rewrite(&mut self, expr: &ExprRef) -> (SymbState, CellId) {
        match self.try_rewrite(expr) {
            Ok(out) => out,
            Err(e) => panic!("rewriting `{}` failed: {}", expr, e),
        }
    }

    pub fn assert_true(&mut self, cell: CellId) {
        self.solver.assert_ground_expr(&Term::cell(cell)).unwrap();
    }

    pub fn check(&mut self) -> SmtCheckResult {
        self.solver.check_sat().unwrap()
    }

    pub fn is_sat(&mut self) -> bool {
        self.check().is_sat()
    }

    pub fn eval_bool(&mut self, cell: CellId) -> bool {
        match self.solver.evaluate(&Term::cell(cell)).unwrap() {
            Value::Bool(b) => b,
            other => panic!("{} is not a boolean: {}", cell, other),
        }
    }

    pub fn eval_int(&mut self, cell: CellId) -> BigInt {
        match self.solver.evaluate(&Term::cell(cell)).unwrap() {
            Value::Int(n) => n,
            other => panic!("{} is not an integer: {}", cell, other),
        }
    }

    pub fn decode(&mut self, cell: CellId) -> StateValue {
        decode_cell(&self.arena, &mut self.solver, self.encoding, cell).unwrap()
    }

    /// Decode the boolean value of `cell` in a fresh check
    pub fn holds(&mut self, cell: CellId) -> bool {
        assert!(self.is_sat(), "constraints are not satisfiable");
        self.eval_bool(cell)
    }
}
