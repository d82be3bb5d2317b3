//! The transition executor
//!
//! A [`TransitionExecutor`] owns everything one symbolic run needs: the
//! arena, the rewrite cache, the solver and the bindings of every committed
//! state. It walks a small state machine:
//!
//! ```text
//!   Idle ──begin_step──▶ StepInProgress ──commit_step (sat)──▶ StepCommitted
//!                              │                                    │
//!                              └── unsat / unknown / timeout ──▶ Failed
//!                                                                   │
//!   StepCommitted ◀──────────────── restore(token) ─────────────────┘
//! ```
//!
//! Each step runs in its own solver scope. A [`SnapshotToken`] captures the
//! arena extent, the solver depth and the number of committed states;
//! restoring it pops scopes and truncates back to that point, so
//! backtracking never copies.
//!
//! In [`ExecutionMode::Incremental`] constraints reach the solver while the
//! step is rewritten. In [`ExecutionMode::Offline`] they are batched in a
//! [`SolverLog`] and handed over in one go at commit.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tla_core::{CellId, ExprRef};
use tla_smt::{RecordingSolver, SmtCheckResult, SmtError, SolverContext, SolverLog, Term};
use tracing::debug;

use crate::arena::{Arena, ArenaMark, CellType};
use crate::cache::RewriteCache;
use crate::config::{BmcConfig, ExecutionMode};
use crate::decode::{decode_cell, StateValue};
use crate::error::{BmcError, BmcResult};
use crate::rewriter::{RewriteStats, Rewriter, RuleSet};
use crate::state::{Binding, SymbState};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Why a step did not commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Unsat,
    Unknown(String),
    /// Milliseconds
    Timeout(u64),
    Error(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Unsat => write!(f, "unsatisfiable"),
            FailureReason::Unknown(reason) => write!(f, "unknown ({})", reason),
            FailureReason::Timeout(ms) => write!(f, "timed out after {}ms", ms),
            FailureReason::Error(e) => write!(f, "error: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    StepInProgress,
    StepCommitted,
    Failed(FailureReason),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::StepInProgress => write!(f, "a step is in progress"),
            Phase::StepCommitted => write!(f, "a step is committed"),
            Phase::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Result of `rewrite_step` and `commit_step`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// More constraints may be added to the step
    InProgress,
    Committed,
    /// The executor is now `Failed`; restore a snapshot to continue
    Rejected(FailureReason),
}

/// Handle on a saved execution point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotToken {
    context: u64,
    index: usize,
    serial: u64,
}

#[derive(Debug, Clone)]
struct Snapshot {
    serial: u64,
    arena: ArenaMark,
    depth: usize,
    states: usize,
}

/// Result of checking a state predicate in the last committed state
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantVerdict {
    Holds,
    Violated(Counterexample),
    Unknown(String),
}

/// Concrete values of the state variables, one map per state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counterexample {
    pub states: Vec<BTreeMap<String, StateValue>>,
}

impl Counterexample {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            writeln!(f, "State {}:", i)?;
            for (var, value) in state {
                writeln!(f, "  {} = {}", var, value)?;
            }
        }
        Ok(())
    }
}

/// Symbolic execution of a sequence of transitions
pub struct TransitionExecutor<S: SolverContext> {
    id: u64,
    config: BmcConfig,
    rules: Arc<RuleSet>,
    solver: RecordingSolver<S>,
    arena: Arena,
    cache: RewriteCache,
    /// State variables, unprimed
    vars: Vec<String>,
    /// Binding of every committed state
    states: Vec<Binding>,
    /// Binding of the step being built, primed assignments included
    step_binding: Option<Binding>,
    /// Offline mode: constraints of the step being built
    pending: SolverLog,
    snapshots: Vec<Snapshot>,
    next_serial: u64,
    phase: Phase,
    stats: RewriteStats,
}

impl<S: SolverContext> TransitionExecutor<S> {
    pub fn new<I, V>(solver: S, config: BmcConfig, vars: I) -> BmcResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self::with_rules(solver, config, vars, Arc::new(RuleSet::standard()))
    }

    /// Executor with a custom rule set; rule sets are immutable and may be
    /// shared between executors
    pub fn with_rules<I, V>(
        solver: S,
        config: BmcConfig,
        vars: I,
        rules: Arc<RuleSet>,
    ) -> BmcResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut solver = RecordingSolver::new(solver, config.record_solver);
        solver.set_timeout(config.check_timeout);
        solver.declare_cell(Arena::FALSE, &tla_smt::Sort::Bool)?;
        solver.declare_cell(Arena::TRUE, &tla_smt::Sort::Bool)?;
        solver.assert_ground_expr(&Term::not(Term::cell(Arena::FALSE)))?;
        solver.assert_ground_expr(&Term::cell(Arena::TRUE))?;

        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        let vars: Vec<String> = vars.into_iter().map(Into::into).collect();
        debug!(context = id, vars = ?vars, mode = ?config.mode, encoding = ?config.encoding, "new executor");
        Ok(TransitionExecutor {
            id,
            config,
            rules,
            solver,
            arena: Arena::new(),
            cache: RewriteCache::new(),
            vars,
            states: Vec::new(),
            step_binding: None,
            pending: SolverLog::new(),
            snapshots: Vec::new(),
            next_serial: 0,
            phase: Phase::Idle,
            stats: RewriteStats::default(),
        })
    }

    // === Steps ===

    /// Open a new step in a fresh solver scope
    pub fn begin_step(&mut self) -> BmcResult<()> {
        if !matches!(self.phase, Phase::Idle | Phase::StepCommitted) {
            return Err(self.invalid("begin a step"));
        }
        if self.states.len() > self.config.max_steps {
            return Err(BmcError::StepBoundExceeded(self.config.max_steps));
        }
        self.solver.push()?;
        self.step_binding = Some(self.states.last().cloned().unwrap_or_default());
        self.phase = Phase::StepInProgress;
        debug!(context = self.id, step = self.states.len(), "begin step");
        Ok(())
    }

    /// Rewrite a boolean expression under the step binding and assert it.
    ///
    /// May be called several times per step; the step is the conjunction of
    /// all the expressions. A rewriting error moves the executor to `Failed`.
    pub fn rewrite_step(&mut self, expr: &ExprRef) -> BmcResult<StepOutcome> {
        if self.phase != Phase::StepInProgress {
            return Err(self.invalid("rewrite a step"));
        }
        let binding = self.step_binding.clone().unwrap_or_default();
        let state = SymbState::new(expr.clone(), self.arena.clone(), binding);
        let offline = self.config.mode == ExecutionMode::Offline;
        let result = if offline {
            rewrite_in(
                &self.rules,
                &mut self.pending,
                &mut self.cache,
                &self.config,
                &mut self.stats,
                state,
            )
        } else {
            rewrite_in(
                &self.rules,
                &mut self.solver,
                &mut self.cache,
                &self.config,
                &mut self.stats,
                state,
            )
        };
        let (state, cell) = self.or_fail(result)?;
        let ty = state.arena.cell_type(cell)?;
        if *ty != CellType::Bool {
            let err = BmcError::type_mismatch(CellType::Bool, ty, Some(expr.span));
            return Err(self.fail_with(err));
        }

        let asserted = if offline {
            self.pending.assert_ground_expr(&Term::cell(cell))
        } else {
            self.solver.assert_ground_expr(&Term::cell(cell))
        };
        self.or_fail(asserted.map_err(BmcError::from))?;
        self.arena = state.arena;
        self.step_binding = Some(state.binding);

        if offline || !self.config.early_unsat_check {
            return Ok(StepOutcome::InProgress);
        }
        let result = self.solver.check_sat();
        match self.settle(result)? {
            Some(reason @ (FailureReason::Unsat | FailureReason::Timeout(_))) => {
                self.fail(reason.clone());
                Ok(StepOutcome::Rejected(reason))
            }
            // only a commit decides an inconclusive step
            _ => Ok(StepOutcome::InProgress),
        }
    }

    /// Check the step and, if satisfiable, make its primed assignments the
    /// next state
    pub fn commit_step(&mut self) -> BmcResult<StepOutcome> {
        if self.phase != Phase::StepInProgress {
            return Err(self.invalid("commit a step"));
        }
        if self.config.mode == ExecutionMode::Offline {
            let batch = self.pending.take();
            debug!(context = self.id, assertions = batch.assertion_count(), "hand over batch");
            let replayed = batch.replay_into(&mut self.solver);
            self.or_fail(replayed.map_err(BmcError::from))?;
        }

        let result = self.solver.check_sat();
        if let Some(reason) = self.settle(result)? {
            self.fail(reason.clone());
            return Ok(StepOutcome::Rejected(reason));
        }

        let step = self.step_binding.take().unwrap_or_default();
        let mut next = Binding::new();
        for var in &self.vars {
            match step.get(&format!("{}'", var)) {
                Some(cell) => next.insert(var.clone(), cell),
                None => {
                    let err = BmcError::MissingAssignment(var.clone());
                    return Err(self.fail_with(err));
                }
            }
        }
        debug!(context = self.id, step = self.states.len(), binding = %next, "commit step");
        self.states.push(next);
        self.phase = Phase::StepCommitted;
        Ok(StepOutcome::Committed)
    }

    // === Snapshots ===

    pub fn snapshot(&mut self) -> BmcResult<SnapshotToken> {
        if self.phase != Phase::StepCommitted {
            return Err(self.invalid("take a snapshot"));
        }
        if self.snapshots.len() >= self.config.max_snapshot_depth {
            return Err(BmcError::SnapshotDepthExceeded(self.config.max_snapshot_depth));
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        self.snapshots.push(Snapshot {
            serial,
            arena: self.arena.mark(),
            depth: self.solver.depth(),
            states: self.states.len(),
        });
        Ok(SnapshotToken {
            context: self.id,
            index: self.snapshots.len() - 1,
            serial,
        })
    }

    /// Return to the point where `token` was taken. Snapshots taken after it
    /// are discarded; `token` itself stays valid.
    pub fn restore(&mut self, token: &SnapshotToken) -> BmcResult<()> {
        if !matches!(self.phase, Phase::StepCommitted | Phase::Failed(_)) {
            return Err(self.invalid("restore a snapshot"));
        }
        if token.context != self.id {
            return Err(BmcError::InvalidSnapshot);
        }
        let snapshot = self
            .snapshots
            .get(token.index)
            .filter(|s| s.serial == token.serial)
            .cloned()
            .ok_or(BmcError::InvalidSnapshot)?;

        self.solver.pop_to(snapshot.depth)?;
        self.arena.truncate(snapshot.arena);
        self.cache.evict_from(snapshot.arena.cells());
        self.states.truncate(snapshot.states);
        self.snapshots.truncate(token.index + 1);
        self.pending = SolverLog::new();
        self.step_binding = None;
        self.phase = Phase::StepCommitted;
        debug!(context = self.id, states = self.states.len(), "restore snapshot");
        Ok(())
    }

    // === Invariants ===

    /// Check that `expr` holds in every model of the execution so far,
    /// evaluated in the last committed state. Leaves the executor as it was.
    pub fn check_invariant(&mut self, expr: &ExprRef) -> BmcResult<InvariantVerdict> {
        if self.phase != Phase::StepCommitted {
            return Err(self.invalid("check an invariant"));
        }
        let mark = self.arena.mark();
        let depth = self.solver.depth();
        self.solver.push()?;
        let verdict = self.check_negation(expr);
        let popped = self.solver.pop_to(depth);
        self.arena.truncate(mark);
        self.cache.evict_from(mark.cells());
        let verdict = verdict?;
        popped?;
        Ok(verdict)
    }

    fn check_negation(&mut self, expr: &ExprRef) -> BmcResult<InvariantVerdict> {
        let binding = self.states.last().cloned().unwrap_or_default();
        let state = SymbState::new(expr.clone(), self.arena.clone(), binding.clone());
        let (state, cell) = rewrite_in(
            &self.rules,
            &mut self.solver,
            &mut self.cache,
            &self.config,
            &mut self.stats,
            state,
        )?;
        let ty = state.arena.cell_type(cell)?;
        if *ty != CellType::Bool {
            return Err(BmcError::type_mismatch(CellType::Bool, ty, Some(expr.span)));
        }
        if state.binding != binding {
            return Err(BmcError::unsupported(
                "assignment inside an invariant",
                Some(expr.span),
            ));
        }
        self.arena = state.arena;
        self.solver
            .assert_ground_expr(&Term::not(Term::cell(cell)))?;
        match self.solver.check_sat() {
            Ok(SmtCheckResult::Unsat) => Ok(InvariantVerdict::Holds),
            Ok(SmtCheckResult::Sat) => Ok(InvariantVerdict::Violated(self.counterexample()?)),
            Ok(SmtCheckResult::Unknown(reason)) => Ok(InvariantVerdict::Unknown(reason)),
            Err(SmtError::Timeout(ms)) => {
                Ok(InvariantVerdict::Unknown(format!("timed out after {}ms", ms)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Values of the state variables in every committed state, read from the
    /// solver's last model
    fn counterexample(&mut self) -> BmcResult<Counterexample> {
        let mut states = Vec::with_capacity(self.states.len());
        for binding in &self.states {
            let mut values = BTreeMap::new();
            for (var, cell) in binding.iter_sorted() {
                let value = decode_cell(&self.arena, &mut self.solver, self.config.encoding, cell)?;
                values.insert(var.to_string(), value);
            }
            states.push(values);
        }
        Ok(Counterexample { states })
    }

    // === Accessors ===

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Number of transitions committed after the initial step
    pub fn depth(&self) -> usize {
        self.states.len().saturating_sub(1)
    }

    /// Number of committed states, the initial one included
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Binding of the last committed state
    pub fn current_binding(&self) -> Option<&Binding> {
        self.states.last()
    }

    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    pub fn config(&self) -> &BmcConfig {
        &self.config
    }

    pub fn stats(&self) -> &RewriteStats {
        &self.stats
    }

    pub fn solver(&self) -> &S {
        self.solver.inner()
    }

    pub fn solver_mut(&mut self) -> &mut S {
        self.solver.inner_mut()
    }

    /// Calls recorded so far (empty unless `record_solver` is set)
    pub fn take_solver_log(&mut self) -> SolverLog {
        self.solver.take_log()
    }

    pub fn into_solver(self) -> S {
        self.solver.into_inner()
    }

    // === Failure handling ===

    fn invalid(&self, op: &'static str) -> BmcError {
        BmcError::InvalidStateTransition {
            op,
            phase: self.phase.to_string(),
        }
    }

    fn fail(&mut self, reason: FailureReason) {
        debug!(context = self.id, reason = %reason, "step failed");
        self.phase = Phase::Failed(reason);
    }

    fn fail_with(&mut self, err: BmcError) -> BmcError {
        self.fail(FailureReason::Error(err.to_string()));
        err
    }

    fn or_fail<T>(&mut self, result: BmcResult<T>) -> BmcResult<T> {
        result.map_err(|e| self.fail_with(e))
    }

    /// Classify a check result; `None` means satisfiable. Solver errors other
    /// than a timeout move the executor to `Failed` and are returned.
    fn settle(
        &mut self,
        result: tla_smt::Result<SmtCheckResult>,
    ) -> BmcResult<Option<FailureReason>> {
        match result {
            Ok(SmtCheckResult::Sat) => Ok(None),
            Ok(SmtCheckResult::Unsat) => Ok(Some(FailureReason::Unsat)),
            Ok(SmtCheckResult::Unknown(reason)) => Ok(Some(FailureReason::Unknown(reason))),
            Err(SmtError::Timeout(ms)) => Ok(Some(FailureReason::Timeout(ms))),
            Err(e) => Err(self.fail_with(e.into())),
        }
    }
}

impl<S: SolverContext> fmt::Debug for TransitionExecutor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionExecutor")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("states", &self.states.len())
            .field("cells", &self.arena.len())
            .field("snapshots", &self.snapshots.len())
            .finish()
    }
}

fn rewrite_in(
    rules: &RuleSet,
    solver: &mut dyn SolverContext,
    cache: &mut RewriteCache,
    config: &BmcConfig,
    stats: &mut RewriteStats,
    state: SymbState,
) -> BmcResult<(SymbState, CellId)> {
    let expr = state.expr.clone();
    let mut rw = Rewriter::new(rules, solver, cache, config.encoding).with_debug(config.debug);
    let result = rw.rewrite_sub(state, &expr);
    stats.merge(rw.stats());
    result
}
