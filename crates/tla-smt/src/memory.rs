//! In-memory finite-domain solver
//!
//! `MemorySolver` decides the constraint fragment emitted by the symbolic
//! checker without any native solver, which keeps the test suite free of a
//! system Z3. The decision procedure:
//!
//! 1. Top-level conjunctions of all open scopes are split into conjuncts.
//! 2. Conjuncts of the shape `a = t` / `a <=> t` (and bare `a`, `~a`) where
//!    `a` is a cell or membership atom not yet defined and `t` does not depend
//!    on `a` become definitions. Everything else is a check.
//! 3. The remaining free atoms reachable from the checks are enumerated:
//!    booleans over both values, integers over the literals of the trace
//!    (and their neighbours), strings over the string literals. Cells of
//!    uninterpreted sort are pairwise distinct opaque values.
//! 4. The first assignment that makes every check true is the model.
//!
//! Integer and string domains are samples, so failing to find a model when
//! such atoms are free yields `Unknown` rather than `Unsat`.

use num_bigint::BigInt;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};
use tla_core::CellId;
use tracing::{debug, trace};

use crate::context::{SmtCheckResult, SolverContext, Value};
use crate::error::{SmtError, SmtResult};
use crate::term::{Sort, Term};

/// Default cap on the number of enumerated assignments per check
pub const DEFAULT_MAX_ASSIGNMENTS: u64 = 1 << 20;

/// A boolean, integer or string unknown of the constraint system
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Atom {
    Cell(CellId),
    In(CellId, CellId),
}

impl Atom {
    fn of(term: &Term) -> Option<Atom> {
        match term {
            Term::Cell(c) => Some(Atom::Cell(*c)),
            Term::InOracle { elem, set } => Some(Atom::In(*elem, *set)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Val {
    Bool(bool),
    Int(BigInt),
    Str(String),
    Opaque(String),
    /// Finite-support array, canonical: no entry equals the default
    Array {
        default: bool,
        entries: BTreeMap<Val, bool>,
    },
}

/// Evaluation could not decide a value
#[derive(Debug, Clone)]
struct Stuck(String);

#[derive(Debug, Default, Clone)]
struct Scope {
    declared: Vec<CellId>,
    assertions: Vec<Term>,
}

#[derive(Debug, Clone)]
struct Model {
    defs: FxHashMap<Atom, Term>,
    assignment: FxHashMap<Atom, Val>,
    sorts: FxHashMap<CellId, Sort>,
}

/// Pure in-memory solver for the ground fragment the rewriting rules emit
#[derive(Debug, Clone)]
pub struct MemorySolver {
    sorts: FxHashMap<CellId, Sort>,
    /// `scopes[0]` is the base scope and is never popped
    scopes: Vec<Scope>,
    timeout: Option<Duration>,
    max_assignments: u64,
    model: Option<Model>,
}

impl Default for MemorySolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySolver {
    pub fn new() -> Self {
        MemorySolver {
            sorts: FxHashMap::default(),
            scopes: vec![Scope::default()],
            timeout: None,
            max_assignments: DEFAULT_MAX_ASSIGNMENTS,
            model: None,
        }
    }

    /// Set the cap on enumerated assignments; larger searches answer `Unknown`
    pub fn with_max_assignments(mut self, max: u64) -> Self {
        self.max_assignments = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of assertions across all open scopes
    pub fn assertion_count(&self) -> usize {
        self.scopes.iter().map(|s| s.assertions.len()).sum()
    }

    /// Number of cells visible in the open scopes
    pub fn declared_count(&self) -> usize {
        self.sorts.len()
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0)
    }
}

impl SolverContext for MemorySolver {
    fn declare_cell(&mut self, cell: CellId, sort: &Sort) -> SmtResult<()> {
        if let Some(existing) = self.sorts.get(&cell) {
            if existing == sort {
                return Ok(());
            }
            return Err(SmtError::SortMismatch {
                cell,
                declared: existing.to_string(),
                requested: sort.to_string(),
            });
        }
        self.model = None;
        self.sorts.insert(cell, sort.clone());
        if let Some(scope) = self.scopes.last_mut() {
            scope.declared.push(cell);
        }
        Ok(())
    }

    fn assert_ground_expr(&mut self, term: &Term) -> SmtResult<()> {
        let sorts = &self.sorts;
        let sort = term.sort_with(&|c| sorts.get(&c).cloned())?;
        if sort != Sort::Bool {
            return Err(SmtError::ConstraintEncoding(format!(
                "asserted term `{}` has sort {}",
                term, sort
            )));
        }
        self.model = None;
        if let Some(scope) = self.scopes.last_mut() {
            scope.assertions.push(term.clone());
        }
        Ok(())
    }

    fn push(&mut self) -> SmtResult<()> {
        self.model = None;
        self.scopes.push(Scope::default());
        Ok(())
    }

    fn pop(&mut self) -> SmtResult<()> {
        if self.scopes.len() <= 1 {
            return Err(SmtError::ScopeUnderflow);
        }
        self.model = None;
        if let Some(scope) = self.scopes.pop() {
            for cell in scope.declared {
                self.sorts.remove(&cell);
            }
        }
        Ok(())
    }

    fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    fn check_sat(&mut self) -> SmtResult<SmtCheckResult> {
        self.model = None;
        let deadline = self.timeout.map(|t| Instant::now() + t);

        let mut conjuncts = Vec::new();
        for scope in &self.scopes {
            for t in &scope.assertions {
                split_conjuncts(t, &mut conjuncts);
            }
        }

        let mut defs: FxHashMap<Atom, Term> = FxHashMap::default();
        let mut checks: Vec<&Term> = Vec::new();
        for t in &conjuncts {
            let chosen = definition_candidates(t)
                .into_iter()
                .find(|(atom, rhs)| !defs.contains_key(atom) && !depends_on(&defs, rhs, *atom));
            match chosen {
                Some((atom, rhs)) => {
                    defs.insert(atom, rhs);
                }
                None => checks.push(t),
            }
        }

        // atoms the checks depend on, through definitions
        let mut reachable = BTreeSet::new();
        let mut stack: Vec<Atom> = Vec::new();
        for t in &checks {
            collect_atoms(t, &mut stack);
        }
        while let Some(atom) = stack.pop() {
            if reachable.insert(atom) {
                if let Some(def) = defs.get(&atom) {
                    collect_atoms(def, &mut stack);
                }
            }
        }

        let mut int_lits = BTreeSet::new();
        let mut str_lits = BTreeSet::new();
        for t in &conjuncts {
            collect_literals(t, &mut int_lits, &mut str_lits);
        }

        let mut incomplete = false;
        let mut free: Vec<(Atom, Vec<Val>)> = Vec::new();
        for atom in reachable.iter().filter(|a| !defs.contains_key(a)) {
            let domain = match atom {
                Atom::In(..) => bool_domain(),
                Atom::Cell(c) => match self.sorts.get(c) {
                    Some(Sort::Bool) => bool_domain(),
                    Some(Sort::Int) => {
                        incomplete = true;
                        int_domain(&int_lits)
                    }
                    Some(Sort::Str) => {
                        incomplete = true;
                        str_domain(&str_lits)
                    }
                    // opaque values, or stuck on read
                    Some(Sort::Uninterpreted(_)) | Some(Sort::Array(_)) | None => continue,
                },
            };
            free.push((*atom, domain));
        }

        let space = free
            .iter()
            .try_fold(1u64, |acc, (_, d)| acc.checked_mul(d.len() as u64));
        debug!(
            conjuncts = conjuncts.len(),
            definitions = defs.len(),
            checks = checks.len(),
            free = free.len(),
            ?space,
            "memory solver check"
        );
        let space = match space {
            Some(n) if n <= self.max_assignments => n,
            _ => {
                return Ok(SmtCheckResult::Unknown(format!(
                    "search space over {} free atoms exceeds {} assignments",
                    free.len(),
                    self.max_assignments
                )))
            }
        };

        let mut stuck: Option<String> = None;
        let mut indices = vec![0usize; free.len()];
        for _ in 0..space {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(SmtError::Timeout(self.timeout_ms()));
                }
            }
            let assignment: FxHashMap<Atom, Val> = free
                .iter()
                .zip(&indices)
                .map(|((atom, domain), &i)| (*atom, domain[i].clone()))
                .collect();
            let mut eval = Evaluator {
                defs: &defs,
                assignment: &assignment,
                sorts: &self.sorts,
                complete: false,
                memo: FxHashMap::default(),
            };
            let mut all_hold = true;
            for t in &checks {
                match eval.bool(t) {
                    Ok(true) => {}
                    Ok(false) => {
                        all_hold = false;
                        break;
                    }
                    Err(Stuck(reason)) => {
                        stuck.get_or_insert(reason);
                        all_hold = false;
                        break;
                    }
                }
            }
            if all_hold {
                trace!(?assignment, "memory solver model");
                self.model = Some(Model {
                    defs,
                    assignment,
                    sorts: self.sorts.clone(),
                });
                return Ok(SmtCheckResult::Sat);
            }
            advance(&mut indices, &free);
        }

        if let Some(reason) = stuck {
            return Ok(SmtCheckResult::Unknown(reason));
        }
        if incomplete {
            return Ok(SmtCheckResult::Unknown(
                "no model over the sampled integer and string values".to_string(),
            ));
        }
        Ok(SmtCheckResult::Unsat)
    }

    fn evaluate(&mut self, term: &Term) -> SmtResult<Value> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| SmtError::ModelError("no model available".to_string()))?;
        let sorts = &model.sorts;
        term.sort_with(&|c| sorts.get(&c).cloned())?;
        let mut eval = Evaluator {
            defs: &model.defs,
            assignment: &model.assignment,
            sorts,
            complete: true,
            memo: FxHashMap::default(),
        };
        match eval.eval(term) {
            Ok(Val::Bool(b)) => Ok(Value::Bool(b)),
            Ok(Val::Int(n)) => Ok(Value::Int(n)),
            Ok(Val::Str(s)) => Ok(Value::Str(s)),
            Ok(Val::Opaque(s)) => Ok(Value::Opaque(s)),
            Ok(Val::Array { .. }) => Err(SmtError::ModelError(format!(
                "`{}` is array-valued; select its elements instead",
                term
            ))),
            Err(Stuck(reason)) => Err(SmtError::ModelError(reason)),
        }
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }
}

fn split_conjuncts(t: &Term, out: &mut Vec<Term>) {
    match t {
        Term::And(ts) => ts.iter().for_each(|t| split_conjuncts(t, out)),
        Term::Bool(true) => {}
        other => out.push(other.clone()),
    }
}

/// Ways a conjunct may be read as `atom := rhs`, in order of preference
fn definition_candidates(t: &Term) -> Vec<(Atom, Term)> {
    match t {
        Term::Eq(a, b) | Term::Iff(a, b) => {
            let mut out = Vec::new();
            if let Some(atom) = Atom::of(a) {
                out.push((atom, (**b).clone()));
            }
            if let Some(atom) = Atom::of(b) {
                out.push((atom, (**a).clone()));
            }
            out
        }
        Term::Not(inner) => Atom::of(inner)
            .map(|atom| vec![(atom, Term::Bool(false))])
            .unwrap_or_default(),
        other => Atom::of(other)
            .map(|atom| vec![(atom, Term::Bool(true))])
            .unwrap_or_default(),
    }
}

fn collect_atoms(t: &Term, out: &mut Vec<Atom>) {
    match t {
        Term::Bool(_) | Term::Int(_) | Term::Str(_) | Term::ConstArray { .. } => {}
        Term::Cell(c) => out.push(Atom::Cell(*c)),
        Term::InOracle { elem, set } => out.push(Atom::In(*elem, *set)),
        Term::Not(t) => collect_atoms(t, out),
        Term::And(ts) | Term::Or(ts) | Term::Add(ts) | Term::Distinct(ts) => {
            ts.iter().for_each(|t| collect_atoms(t, out))
        }
        Term::Implies(a, b)
        | Term::Iff(a, b)
        | Term::Eq(a, b)
        | Term::Lt(a, b)
        | Term::Le(a, b)
        | Term::Sub(a, b)
        | Term::Select { array: a, index: b } => {
            collect_atoms(a, out);
            collect_atoms(b, out);
        }
        Term::Ite(a, b, c)
        | Term::Store {
            array: a,
            index: b,
            value: c,
        } => {
            collect_atoms(a, out);
            collect_atoms(b, out);
            collect_atoms(c, out);
        }
    }
}

/// Does `rhs` reach `target` through the current definitions?
fn depends_on(defs: &FxHashMap<Atom, Term>, rhs: &Term, target: Atom) -> bool {
    let mut stack = Vec::new();
    collect_atoms(rhs, &mut stack);
    let mut seen = BTreeSet::new();
    while let Some(atom) = stack.pop() {
        if atom == target {
            return true;
        }
        if seen.insert(atom) {
            if let Some(def) = defs.get(&atom) {
                collect_atoms(def, &mut stack);
            }
        }
    }
    false
}

fn collect_literals(t: &Term, ints: &mut BTreeSet<BigInt>, strs: &mut BTreeSet<String>) {
    match t {
        Term::Int(n) => {
            ints.insert(n.clone());
        }
        Term::Str(s) => {
            strs.insert(s.clone());
        }
        Term::Bool(_) | Term::Cell(_) | Term::InOracle { .. } | Term::ConstArray { .. } => {}
        Term::Not(t) => collect_literals(t, ints, strs),
        Term::And(ts) | Term::Or(ts) | Term::Add(ts) | Term::Distinct(ts) => {
            ts.iter().for_each(|t| collect_literals(t, ints, strs))
        }
        Term::Implies(a, b)
        | Term::Iff(a, b)
        | Term::Eq(a, b)
        | Term::Lt(a, b)
        | Term::Le(a, b)
        | Term::Sub(a, b)
        | Term::Select { array: a, index: b } => {
            collect_literals(a, ints, strs);
            collect_literals(b, ints, strs);
        }
        Term::Ite(a, b, c)
        | Term::Store {
            array: a,
            index: b,
            value: c,
        } => {
            collect_literals(a, ints, strs);
            collect_literals(b, ints, strs);
            collect_literals(c, ints, strs);
        }
    }
}

fn bool_domain() -> Vec<Val> {
    vec![Val::Bool(false), Val::Bool(true)]
}

/// Literals, their neighbours, and zero
fn int_domain(lits: &BTreeSet<BigInt>) -> Vec<Val> {
    let mut domain = BTreeSet::new();
    domain.insert(BigInt::from(0));
    for n in lits {
        domain.insert(n - 1);
        domain.insert(n.clone());
        domain.insert(n + 1);
    }
    domain.into_iter().map(Val::Int).collect()
}

fn str_domain(lits: &BTreeSet<String>) -> Vec<Val> {
    let mut domain = lits.clone();
    domain.insert(String::new());
    domain.into_iter().map(Val::Str).collect()
}

/// Odometer step over the free atoms' domains
fn advance(indices: &mut [usize], free: &[(Atom, Vec<Val>)]) {
    for (i, (_, domain)) in indices.iter_mut().zip(free) {
        *i += 1;
        if *i < domain.len() {
            return;
        }
        *i = 0;
    }
}

struct Evaluator<'a> {
    defs: &'a FxHashMap<Atom, Term>,
    assignment: &'a FxHashMap<Atom, Val>,
    sorts: &'a FxHashMap<CellId, Sort>,
    /// Give unconstrained atoms a default value instead of getting stuck
    complete: bool,
    memo: FxHashMap<Atom, Val>,
}

impl Evaluator<'_> {
    fn atom(&mut self, atom: Atom) -> Result<Val, Stuck> {
        if let Some(v) = self.memo.get(&atom) {
            return Ok(v.clone());
        }
        let v = if let Some(def) = self.defs.get(&atom) {
            self.eval(def)?
        } else if let Some(v) = self.assignment.get(&atom) {
            v.clone()
        } else {
            self.unassigned(atom)?
        };
        self.memo.insert(atom, v.clone());
        Ok(v)
    }

    fn unassigned(&self, atom: Atom) -> Result<Val, Stuck> {
        let cell = match atom {
            Atom::In(..) if self.complete => return Ok(Val::Bool(false)),
            Atom::In(elem, set) => {
                return Err(Stuck(format!("membership in({}, {}) is undecided", elem, set)))
            }
            Atom::Cell(c) => c,
        };
        match self.sorts.get(&cell) {
            Some(Sort::Uninterpreted(name)) => Ok(Val::Opaque(format!("{}!{}", name, cell.0))),
            Some(sort) if self.complete => Ok(default_value(sort)),
            Some(sort) => Err(Stuck(format!("cell {} of sort {} is unconstrained", cell, sort))),
            None => Err(Stuck(format!("cell {} is not declared", cell))),
        }
    }

    fn bool(&mut self, t: &Term) -> Result<bool, Stuck> {
        match self.eval(t)? {
            Val::Bool(b) => Ok(b),
            other => Err(Stuck(format!("expected a boolean, found {:?}", other))),
        }
    }

    fn int(&mut self, t: &Term) -> Result<BigInt, Stuck> {
        match self.eval(t)? {
            Val::Int(n) => Ok(n),
            other => Err(Stuck(format!("expected an integer, found {:?}", other))),
        }
    }

    fn array(&mut self, t: &Term) -> Result<(bool, BTreeMap<Val, bool>), Stuck> {
        match self.eval(t)? {
            Val::Array { default, entries } => Ok((default, entries)),
            other => Err(Stuck(format!("expected an array, found {:?}", other))),
        }
    }

    fn eval(&mut self, t: &Term) -> Result<Val, Stuck> {
        match t {
            Term::Bool(b) => Ok(Val::Bool(*b)),
            Term::Int(n) => Ok(Val::Int(n.clone())),
            Term::Str(s) => Ok(Val::Str(s.clone())),
            Term::Cell(c) => self.atom(Atom::Cell(*c)),
            Term::InOracle { elem, set } => self.atom(Atom::In(*elem, *set)),
            Term::Not(t) => Ok(Val::Bool(!self.bool(t)?)),
            Term::And(ts) => self.junction(ts, false),
            Term::Or(ts) => self.junction(ts, true),
            Term::Implies(a, b) => {
                if !self.bool(a)? {
                    return Ok(Val::Bool(true));
                }
                Ok(Val::Bool(self.bool(b)?))
            }
            Term::Iff(a, b) | Term::Eq(a, b) => {
                let va = self.eval(a)?;
                let vb = self.eval(b)?;
                Ok(Val::Bool(va == vb))
            }
            Term::Lt(a, b) => Ok(Val::Bool(self.int(a)? < self.int(b)?)),
            Term::Le(a, b) => Ok(Val::Bool(self.int(a)? <= self.int(b)?)),
            Term::Add(ts) => {
                let mut sum = BigInt::from(0);
                for t in ts {
                    sum += self.int(t)?;
                }
                Ok(Val::Int(sum))
            }
            Term::Sub(a, b) => Ok(Val::Int(self.int(a)? - self.int(b)?)),
            Term::Ite(c, a, b) => {
                if self.bool(c)? {
                    self.eval(a)
                } else {
                    self.eval(b)
                }
            }
            Term::Select { array, index } => {
                let (default, entries) = self.array(array)?;
                let index = self.eval(index)?;
                Ok(Val::Bool(entries.get(&index).copied().unwrap_or(default)))
            }
            Term::Store {
                array,
                index,
                value,
            } => {
                let (default, mut entries) = self.array(array)?;
                let index = self.eval(index)?;
                let value = self.bool(value)?;
                if value == default {
                    entries.remove(&index);
                } else {
                    entries.insert(index, value);
                }
                Ok(Val::Array { default, entries })
            }
            Term::ConstArray { value, .. } => Ok(Val::Array {
                default: *value,
                entries: BTreeMap::new(),
            }),
            Term::Distinct(ts) => {
                let mut vals = Vec::with_capacity(ts.len());
                for t in ts {
                    vals.push(self.eval(t)?);
                }
                let distinct = vals
                    .iter()
                    .enumerate()
                    .all(|(i, v)| vals[i + 1..].iter().all(|w| v != w));
                Ok(Val::Bool(distinct))
            }
        }
    }

    /// And (`absorbing == false`) or Or (`absorbing == true`), deciding as
    /// soon as an operand has the absorbing value even if others are stuck
    fn junction(&mut self, ts: &[Term], absorbing: bool) -> Result<Val, Stuck> {
        let mut stuck = None;
        for t in ts {
            match self.bool(t) {
                Ok(b) if b == absorbing => return Ok(Val::Bool(absorbing)),
                Ok(_) => {}
                Err(s) => {
                    stuck.get_or_insert(s);
                }
            }
        }
        match stuck {
            Some(s) => Err(s),
            None => Ok(Val::Bool(!absorbing)),
        }
    }
}

fn default_value(sort: &Sort) -> Val {
    match sort {
        Sort::Bool => Val::Bool(false),
        Sort::Int => Val::Int(BigInt::from(0)),
        Sort::Str => Val::Str(String::new()),
        Sort::Uninterpreted(name) => Val::Opaque(format!("{}!default", name)),
        Sort::Array(_) => Val::Array {
            default: false,
            entries: BTreeMap::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(n: u32) -> CellId {
        CellId(n)
    }

    fn int(n: i64) -> Term {
        Term::Int(BigInt::from(n))
    }

    #[test]
    fn test_definitions_and_evaluate() {
        let mut s = MemorySolver::new();
        s.declare_cell(c(0), &Sort::Int).unwrap();
        s.declare_cell(c(1), &Sort::Int).unwrap();
        s.assert_ground_expr(&Term::eq(Term::cell(c(0)), int(5)))
            .unwrap();
        s.assert_ground_expr(&Term::eq(
            Term::cell(c(1)),
            Term::add(Term::cell(c(0)), int(1)),
        ))
        .unwrap();
        assert_eq!(s.check_sat().unwrap(), SmtCheckResult::Sat);
        assert_eq!(
            s.evaluate(&Term::cell(c(1))).unwrap(),
            Value::Int(BigInt::from(6))
        );
    }

    #[test]
    fn test_boolean_search() {
        // (a \/ b) /\ ~a
        let mut s = MemorySolver::new();
        s.declare_cell(c(0), &Sort::Bool).unwrap();
        s.declare_cell(c(1), &Sort::Bool).unwrap();
        s.assert_ground_expr(&Term::or(vec![Term::cell(c(0)), Term::cell(c(1))]))
            .unwrap();
        s.assert_ground_expr(&Term::not(Term::cell(c(0)))).unwrap();
        assert!(s.check_sat().unwrap().is_sat());
        assert_eq!(s.evaluate(&Term::cell(c(0))).unwrap(), Value::Bool(false));
        assert_eq!(s.evaluate(&Term::cell(c(1))).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_boolean_unsat() {
        let mut s = MemorySolver::new();
        s.declare_cell(c(0), &Sort::Bool).unwrap();
        s.assert_ground_expr(&Term::cell(c(0))).unwrap();
        s.assert_ground_expr(&Term::not(Term::cell(c(0)))).unwrap();
        assert_eq!(s.check_sat().unwrap(), SmtCheckResult::Unsat);
        assert!(matches!(
            s.evaluate(&Term::cell(c(0))),
            Err(SmtError::ModelError(_))
        ));
    }

    #[test]
    fn test_free_integer_is_sampled() {
        // x > 5 /\ x < 7 is found from the neighbours of the literals
        let mut s = MemorySolver::new();
        s.declare_cell(c(0), &Sort::Int).unwrap();
        s.assert_ground_expr(&Term::lt(int(5), Term::cell(c(0))))
            .unwrap();
        s.assert_ground_expr(&Term::lt(Term::cell(c(0)), int(7)))
            .unwrap();
        assert!(s.check_sat().unwrap().is_sat());
        assert_eq!(
            s.evaluate(&Term::cell(c(0))).unwrap(),
            Value::Int(BigInt::from(6))
        );
    }

    #[test]
    fn test_free_integer_without_model_is_unknown() {
        // x > 5 /\ x < 6 has no model, but the sample is not the whole of Int
        let mut s = MemorySolver::new();
        s.declare_cell(c(0), &Sort::Int).unwrap();
        s.assert_ground_expr(&Term::lt(int(5), Term::cell(c(0))))
            .unwrap();
        s.assert_ground_expr(&Term::lt(Term::cell(c(0)), int(6)))
            .unwrap();
        assert!(s.check_sat().unwrap().is_unknown());
    }

    #[test]
    fn test_arrays_are_extensional() {
        let mut s = MemorySolver::new();
        s.declare_cell(c(0), &Sort::array(Sort::Int)).unwrap();
        s.declare_cell(c(1), &Sort::array(Sort::Int)).unwrap();
        let store = |arr: Term, n: i64| Term::store(arr, int(n), Term::Bool(true));
        s.assert_ground_expr(&Term::eq(
            Term::cell(c(0)),
            store(store(Term::empty_array(Sort::Int), 1), 2),
        ))
        .unwrap();
        s.assert_ground_expr(&Term::eq(
            Term::cell(c(1)),
            store(store(Term::empty_array(Sort::Int), 2), 1),
        ))
        .unwrap();
        s.assert_ground_expr(&Term::eq(Term::cell(c(0)), Term::cell(c(1))))
            .unwrap();
        assert!(s.check_sat().unwrap().is_sat());
        assert_eq!(
            s.evaluate(&Term::select(Term::cell(c(0)), int(2))).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            s.evaluate(&Term::select(Term::cell(c(0)), int(3))).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_scopes() {
        let mut s = MemorySolver::new();
        s.declare_cell(c(0), &Sort::Bool).unwrap();
        s.assert_ground_expr(&Term::cell(c(0))).unwrap();
        s.push().unwrap();
        s.declare_cell(c(1), &Sort::Bool).unwrap();
        s.assert_ground_expr(&Term::not(Term::cell(c(0)))).unwrap();
        assert_eq!(s.depth(), 1);
        assert!(s.check_sat().unwrap().is_unsat());
        s.pop().unwrap();
        assert_eq!(s.depth(), 0);
        assert!(s.check_sat().unwrap().is_sat());
        assert_eq!(s.declared_count(), 1);
        assert_eq!(s.pop(), Err(SmtError::ScopeUnderflow));
    }

    #[test]
    fn test_sort_checks() {
        let mut s = MemorySolver::new();
        s.declare_cell(c(0), &Sort::Int).unwrap();
        assert!(s.declare_cell(c(0), &Sort::Int).is_ok());
        assert!(matches!(
            s.declare_cell(c(0), &Sort::Bool),
            Err(SmtError::SortMismatch { .. })
        ));
        assert!(matches!(
            s.assert_ground_expr(&Term::cell(c(0))),
            Err(SmtError::ConstraintEncoding(_))
        ));
        assert_eq!(
            s.assert_ground_expr(&Term::cell(c(3))),
            Err(SmtError::UndeclaredCell(c(3)))
        );
    }

    #[test]
    fn test_uninterpreted_cells_are_distinct() {
        let mut s = MemorySolver::new();
        let rec = Sort::Uninterpreted("Record".to_string());
        s.declare_cell(c(0), &rec).unwrap();
        s.declare_cell(c(1), &rec).unwrap();
        s.assert_ground_expr(&Term::Distinct(vec![Term::cell(c(0)), Term::cell(c(1))]))
            .unwrap();
        assert!(s.check_sat().unwrap().is_sat());
    }

    #[test]
    fn test_search_cap_is_unknown() {
        let mut s = MemorySolver::new().with_max_assignments(4);
        let mut atoms = Vec::new();
        for i in 0..3 {
            s.declare_cell(c(i), &Sort::Bool).unwrap();
            atoms.push(Term::cell(c(i)));
        }
        s.assert_ground_expr(&Term::or(atoms)).unwrap();
        assert!(s.check_sat().unwrap().is_unknown());
    }

    #[test]
    fn test_timeout() {
        let mut s = MemorySolver::new();
        s.set_timeout(Some(Duration::ZERO));
        s.declare_cell(c(0), &Sort::Bool).unwrap();
        s.assert_ground_expr(&Term::cell(c(0))).unwrap();
        assert_eq!(s.check_sat(), Err(SmtError::Timeout(0)));
    }

    #[test]
    fn test_oracle_atoms() {
        let mut s = MemorySolver::new();
        s.declare_cell(c(0), &Sort::Int).unwrap();
        s.declare_cell(c(1), &Sort::Uninterpreted("Set".to_string()))
            .unwrap();
        s.declare_cell(c(2), &Sort::Bool).unwrap();
        s.assert_ground_expr(&Term::in_oracle(c(0), c(1))).unwrap();
        s.assert_ground_expr(&Term::iff(
            Term::cell(c(2)),
            Term::in_oracle(c(0), c(1)),
        ))
        .unwrap();
        s.assert_ground_expr(&Term::cell(c(2))).unwrap();
        assert!(s.check_sat().unwrap().is_sat());
        assert_eq!(
            s.evaluate(&Term::in_oracle(c(0), c(1))).unwrap(),
            Value::Bool(true)
        );
    }
}
