//! Z3 adapter for [`SolverContext`]
//!
//! Only built with the `z3` feature, because it links against a system libz3.
//! Cells become Z3 constants named after the cell (`$C$12`); membership
//! oracle atoms become boolean constants `in$C$3$C$7`.

use num_bigint::BigInt;
use rustc_hash::FxHashMap;
use std::time::Duration;
use tla_core::CellId;
use tracing::debug;
use z3::ast::{Array, Ast, Bool, Dynamic, Int};
use z3::{Context, FuncDecl, Model, Params, SatResult, Solver, Sort as Z3Sort};

use crate::context::{SmtCheckResult, SolverContext, Value};
use crate::error::{SmtError, SmtResult};
use crate::term::{Sort, Term};

/// A scoped Z3 solver over cells
pub struct Z3SolverContext<'ctx> {
    ctx: &'ctx Context,
    solver: Solver<'ctx>,
    consts: FxHashMap<CellId, (Sort, Dynamic<'ctx>)>,
    oracles: FxHashMap<(CellId, CellId), Bool<'ctx>>,
    /// Cells and oracle atoms created in each open scope, base scope first
    scopes: Vec<(Vec<CellId>, Vec<(CellId, CellId)>)>,
    timeout_ms: Option<u64>,
    model: Option<Model<'ctx>>,
}

impl<'ctx> Z3SolverContext<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        Z3SolverContext {
            ctx,
            solver: Solver::new(ctx),
            consts: FxHashMap::default(),
            oracles: FxHashMap::default(),
            scopes: vec![(Vec::new(), Vec::new())],
            timeout_ms: None,
            model: None,
        }
    }

    fn z3_sort(&self, sort: &Sort) -> Z3Sort<'ctx> {
        match sort {
            Sort::Bool => Z3Sort::bool(self.ctx),
            Sort::Int => Z3Sort::int(self.ctx),
            Sort::Str => Z3Sort::string(self.ctx),
            Sort::Uninterpreted(name) => {
                Z3Sort::uninterpreted(self.ctx, z3::Symbol::String(name.clone()))
            }
            Sort::Array(index) => Z3Sort::array(self.ctx, &self.z3_sort(index), &Z3Sort::bool(self.ctx)),
        }
    }

    fn oracle(&mut self, elem: CellId, set: CellId) -> Bool<'ctx> {
        if let Some(b) = self.oracles.get(&(elem, set)) {
            return b.clone();
        }
        let b = Bool::new_const(self.ctx, format!("in{}{}", elem, set));
        self.oracles.insert((elem, set), b.clone());
        if let Some(scope) = self.scopes.last_mut() {
            scope.1.push((elem, set));
        }
        b
    }

    fn translate(&mut self, term: &Term) -> SmtResult<Dynamic<'ctx>> {
        let ctx = self.ctx;
        Ok(match term {
            Term::Bool(b) => Dynamic::from_ast(&Bool::from_bool(ctx, *b)),
            Term::Int(n) => Dynamic::from_ast(&self.int_lit(n)?),
            Term::Str(s) => Dynamic::from_ast(
                &z3::ast::String::from_str(ctx, s)
                    .map_err(|e| SmtError::ConstraintEncoding(e.to_string()))?,
            ),
            Term::Cell(c) => self
                .consts
                .get(c)
                .map(|(_, d)| d.clone())
                .ok_or(SmtError::UndeclaredCell(*c))?,
            Term::InOracle { elem, set } => Dynamic::from_ast(&self.oracle(*elem, *set)),
            Term::Not(t) => Dynamic::from_ast(&self.bool(t)?.not()),
            Term::And(ts) => {
                let bs = self.bools(ts)?;
                let refs: Vec<&Bool> = bs.iter().collect();
                Dynamic::from_ast(&Bool::and(ctx, &refs))
            }
            Term::Or(ts) => {
                let bs = self.bools(ts)?;
                let refs: Vec<&Bool> = bs.iter().collect();
                Dynamic::from_ast(&Bool::or(ctx, &refs))
            }
            Term::Implies(a, b) => Dynamic::from_ast(&self.bool(a)?.implies(&self.bool(b)?)),
            Term::Iff(a, b) => Dynamic::from_ast(&self.bool(a)?.iff(&self.bool(b)?)),
            Term::Eq(a, b) => {
                let a = self.translate(a)?;
                let b = self.translate(b)?;
                Dynamic::from_ast(&a._eq(&b))
            }
            Term::Lt(a, b) => Dynamic::from_ast(&self.int(a)?.lt(&self.int(b)?)),
            Term::Le(a, b) => Dynamic::from_ast(&self.int(a)?.le(&self.int(b)?)),
            Term::Add(ts) => {
                let mut is = Vec::with_capacity(ts.len());
                for t in ts {
                    is.push(self.int(t)?);
                }
                let refs: Vec<&Int> = is.iter().collect();
                Dynamic::from_ast(&Int::add(ctx, &refs))
            }
            Term::Sub(a, b) => {
                let a = self.int(a)?;
                let b = self.int(b)?;
                Dynamic::from_ast(&Int::sub(ctx, &[&a, &b]))
            }
            Term::Ite(c, t, e) => {
                let c = self.bool(c)?;
                let t = self.translate(t)?;
                let e = self.translate(e)?;
                c.ite(&t, &e)
            }
            Term::Select { array, index } => {
                let array = self.array(array)?;
                let index = self.translate(index)?;
                array.select(&index)
            }
            Term::Store {
                array,
                index,
                value,
            } => {
                let array = self.array(array)?;
                let index = self.translate(index)?;
                let value = self.bool(value)?;
                Dynamic::from_ast(&array.store(&index, &value))
            }
            Term::ConstArray { index, value } => {
                let domain = self.z3_sort(index);
                let value = Bool::from_bool(ctx, *value);
                Dynamic::from_ast(&Array::const_array(ctx, &domain, &value))
            }
            Term::Distinct(ts) => {
                let mut ds = Vec::with_capacity(ts.len());
                for t in ts {
                    ds.push(self.translate(t)?);
                }
                let refs: Vec<&Dynamic> = ds.iter().collect();
                Dynamic::from_ast(&Dynamic::distinct(ctx, &refs))
            }
        })
    }

    fn int_lit(&self, n: &BigInt) -> SmtResult<Int<'ctx>> {
        Int::from_str(self.ctx, &n.to_string())
            .ok_or_else(|| SmtError::ConstraintEncoding(format!("integer literal {}", n)))
    }

    fn bool(&mut self, t: &Term) -> SmtResult<Bool<'ctx>> {
        self.translate(t)?
            .as_bool()
            .ok_or_else(|| SmtError::ConstraintEncoding(format!("`{}` is not boolean", t)))
    }

    fn bools(&mut self, ts: &[Term]) -> SmtResult<Vec<Bool<'ctx>>> {
        ts.iter().map(|t| self.bool(t)).collect()
    }

    fn int(&mut self, t: &Term) -> SmtResult<Int<'ctx>> {
        self.translate(t)?
            .as_int()
            .ok_or_else(|| SmtError::ConstraintEncoding(format!("`{}` is not an integer", t)))
    }

    fn array(&mut self, t: &Term) -> SmtResult<Array<'ctx>> {
        self.translate(t)?
            .as_array()
            .ok_or_else(|| SmtError::ConstraintEncoding(format!("`{}` is not an array", t)))
    }
}

impl SolverContext for Z3SolverContext<'_> {
    fn declare_cell(&mut self, cell: CellId, sort: &Sort) -> SmtResult<()> {
        if let Some((existing, _)) = self.consts.get(&cell) {
            if existing == sort {
                return Ok(());
            }
            return Err(SmtError::SortMismatch {
                cell,
                declared: existing.to_string(),
                requested: sort.to_string(),
            });
        }
        let z3_sort = self.z3_sort(sort);
        let decl = FuncDecl::new(self.ctx, cell.to_string(), &[], &z3_sort);
        self.consts.insert(cell, (sort.clone(), decl.apply(&[])));
        if let Some(scope) = self.scopes.last_mut() {
            scope.0.push(cell);
        }
        Ok(())
    }

    fn assert_ground_expr(&mut self, term: &Term) -> SmtResult<()> {
        let b = self.bool(term)?;
        self.model = None;
        self.solver.assert(&b);
        Ok(())
    }

    fn push(&mut self) -> SmtResult<()> {
        self.model = None;
        self.solver.push();
        self.scopes.push((Vec::new(), Vec::new()));
        Ok(())
    }

    fn pop(&mut self) -> SmtResult<()> {
        if self.scopes.len() <= 1 {
            return Err(SmtError::ScopeUnderflow);
        }
        self.model = None;
        self.solver.pop(1);
        if let Some((cells, atoms)) = self.scopes.pop() {
            for cell in cells {
                self.consts.remove(&cell);
            }
            for atom in atoms {
                self.oracles.remove(&atom);
            }
        }
        Ok(())
    }

    fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    fn check_sat(&mut self) -> SmtResult<SmtCheckResult> {
        if let Some(ms) = self.timeout_ms {
            let mut params = Params::new(self.ctx);
            params.set_u32("timeout", ms as u32);
            self.solver.set_params(&params);
        }
        let result = self.solver.check();
        debug!(?result, "z3 check");
        match result {
            SatResult::Sat => {
                self.model = self.solver.get_model();
                Ok(SmtCheckResult::Sat)
            }
            SatResult::Unsat => Ok(SmtCheckResult::Unsat),
            SatResult::Unknown => {
                let reason = self
                    .solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "unknown".to_string());
                match self.timeout_ms {
                    Some(ms) if reason.contains("timeout") || reason.contains("canceled") => {
                        Err(SmtError::Timeout(ms))
                    }
                    _ => Ok(SmtCheckResult::Unknown(reason)),
                }
            }
        }
    }

    fn evaluate(&mut self, term: &Term) -> SmtResult<Value> {
        let ast = self.translate(term)?;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| SmtError::ModelError("no model available".to_string()))?;
        let value = model
            .eval(&ast, true)
            .ok_or_else(|| SmtError::ModelError(format!("cannot evaluate `{}`", term)))?;
        if let Some(b) = value.as_bool().and_then(|b| b.as_bool()) {
            return Ok(Value::Bool(b));
        }
        if let Some(i) = value.as_int() {
            return i
                .to_string()
                .parse::<BigInt>()
                .map(Value::Int)
                .map_err(|e| SmtError::ModelError(e.to_string()));
        }
        if let Some(s) = value.as_string().and_then(|s| s.as_string()) {
            return Ok(Value::Str(s));
        }
        Ok(Value::Opaque(value.to_string()))
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout_ms = timeout.map(|t| t.as_millis() as u64);
    }
}
