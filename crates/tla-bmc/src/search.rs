//! Bounded depth-first search over transitions
//!
//! The checker commits the initial predicate, then explores every sequence of
//! alternative transitions up to `max_steps` deep. Before descending it takes
//! a snapshot; after each alternative it restores it. Invariants are checked
//! in every committed state.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tla_core::ExprRef;
use tla_smt::SolverContext;
use tracing::{debug, info};

use crate::config::BmcConfig;
use crate::error::{BmcError, BmcResult};
use crate::executor::{
    Counterexample, FailureReason, InvariantVerdict, StepOutcome, TransitionExecutor,
};

/// A system to check: state variables, an initial predicate written with
/// primed assignments (`x' := 0`), alternative transitions and invariants
#[derive(Debug, Clone)]
pub struct Problem {
    pub vars: Vec<String>,
    pub init: ExprRef,
    pub transitions: Vec<ExprRef>,
    pub invariants: Vec<(String, ExprRef)>,
}

impl Problem {
    pub fn new<I, V>(vars: I, init: ExprRef) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Problem {
            vars: vars.into_iter().map(Into::into).collect(),
            init,
            transitions: Vec::new(),
            invariants: Vec::new(),
        }
    }

    pub fn transition(mut self, next: ExprRef) -> Self {
        self.transitions.push(next);
        self
    }

    pub fn invariant(mut self, name: impl Into<String>, inv: ExprRef) -> Self {
        self.invariants.push((name.into(), inv));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Every execution up to `depth` transitions satisfies the invariants
    NoViolation { depth: usize },
    Violation {
        invariant: String,
        depth: usize,
        trace: Counterexample,
    },
    /// A state reached after `depth` transitions has no enabled transition
    Deadlock { depth: usize },
    /// Some alternative could not be decided
    Unknown { depth: usize, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub steps_committed: u64,
    pub steps_rejected: u64,
    pub invariant_checks: u64,
    /// Deepest committed transition
    pub max_depth: usize,
}

#[derive(Debug)]
pub struct BoundedChecker<S: SolverContext> {
    executor: TransitionExecutor<S>,
    problem: Problem,
    rng: Option<StdRng>,
    stats: SearchStats,
    /// First undecided alternative, reported if nothing worse is found
    unknown: Option<(usize, String)>,
}

impl<S: SolverContext> BoundedChecker<S> {
    /// Fails with `InvalidConfig` when `max_snapshot_depth` is below
    /// `max_steps`: the search holds one snapshot per depth
    pub fn new(solver: S, config: BmcConfig, problem: Problem) -> BmcResult<Self> {
        if config.max_snapshot_depth < config.max_steps {
            return Err(BmcError::InvalidConfig(format!(
                "max_snapshot_depth {} is below max_steps {}",
                config.max_snapshot_depth, config.max_steps
            )));
        }
        let rng = config.seed.map(StdRng::seed_from_u64);
        let executor = TransitionExecutor::new(solver, config, problem.vars.clone())?;
        Ok(BoundedChecker {
            executor,
            problem,
            rng,
            stats: SearchStats::default(),
            unknown: None,
        })
    }

    pub fn run(&mut self) -> BmcResult<CheckOutcome> {
        info!(
            vars = ?self.problem.vars,
            transitions = self.problem.transitions.len(),
            max_steps = self.executor.config().max_steps,
            "starting bounded search"
        );
        let init = self.problem.init.clone();
        if !self.take_step(&init, 0)? {
            let outcome = match self.unknown.take() {
                Some((depth, reason)) => CheckOutcome::Unknown { depth, reason },
                None => CheckOutcome::NoViolation { depth: 0 },
            };
            info!(outcome = ?outcome, "no initial state");
            return Ok(outcome);
        }
        if let Some(outcome) = self.check_invariants(0)? {
            return Ok(outcome);
        }

        let outcome = match self.explore(1)? {
            Some(outcome) => outcome,
            None => match self.unknown.take() {
                Some((depth, reason)) => CheckOutcome::Unknown { depth, reason },
                None => CheckOutcome::NoViolation {
                    depth: self.stats.max_depth,
                },
            },
        };
        info!(
            committed = self.stats.steps_committed,
            rejected = self.stats.steps_rejected,
            "search finished"
        );
        Ok(outcome)
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn executor(&self) -> &TransitionExecutor<S> {
        &self.executor
    }

    pub fn into_executor(self) -> TransitionExecutor<S> {
        self.executor
    }

    /// Try every alternative from the last committed state
    fn explore(&mut self, depth: usize) -> BmcResult<Option<CheckOutcome>> {
        if depth > self.executor.config().max_steps {
            return Ok(None);
        }
        let token = self.executor.snapshot()?;
        let mut order: Vec<usize> = (0..self.problem.transitions.len()).collect();
        if let Some(rng) = self.rng.as_mut() {
            order.shuffle(rng);
        }

        let mut enabled = false;
        let mut undecided = false;
        for i in order {
            let next = self.problem.transitions[i].clone();
            let unknown_before = self.unknown.is_some();
            if self.take_step(&next, depth)? {
                enabled = true;
                self.stats.max_depth = self.stats.max_depth.max(depth);
                debug!(depth, transition = i, "transition enabled");
                if let Some(outcome) = self.check_invariants(depth)? {
                    return Ok(Some(outcome));
                }
                if let Some(outcome) = self.explore(depth + 1)? {
                    return Ok(Some(outcome));
                }
            } else if self.unknown.is_some() && !unknown_before {
                undecided = true;
            }
            self.executor.restore(&token)?;
        }

        if !enabled && !undecided && self.executor.config().check_deadlock {
            info!(depth = depth - 1, "deadlock");
            return Ok(Some(CheckOutcome::Deadlock { depth: depth - 1 }));
        }
        Ok(None)
    }

    /// Begin, rewrite and commit one step; `false` if it was rejected
    fn take_step(&mut self, expr: &ExprRef, depth: usize) -> BmcResult<bool> {
        self.executor.begin_step()?;
        let outcome = match self.executor.rewrite_step(expr)? {
            StepOutcome::Rejected(reason) => StepOutcome::Rejected(reason),
            _ => self.executor.commit_step()?,
        };
        match outcome {
            StepOutcome::Committed => {
                self.stats.steps_committed += 1;
                Ok(true)
            }
            StepOutcome::Rejected(reason) => {
                self.stats.steps_rejected += 1;
                if reason != FailureReason::Unsat && self.unknown.is_none() {
                    self.unknown = Some((depth, reason.to_string()));
                }
                Ok(false)
            }
            StepOutcome::InProgress => Ok(false),
        }
    }

    fn check_invariants(&mut self, depth: usize) -> BmcResult<Option<CheckOutcome>> {
        for (name, inv) in &self.problem.invariants {
            self.stats.invariant_checks += 1;
            match self.executor.check_invariant(inv)? {
                InvariantVerdict::Holds => {}
                InvariantVerdict::Violated(trace) => {
                    info!(invariant = %name, depth, "invariant violated");
                    return Ok(Some(CheckOutcome::Violation {
                        invariant: name.clone(),
                        depth,
                        trace,
                    }));
                }
                InvariantVerdict::Unknown(reason) => {
                    if self.unknown.is_none() {
                        self.unknown = Some((depth, format!("invariant {}: {}", name, reason)));
                    }
                }
            }
        }
        Ok(None)
    }
}
