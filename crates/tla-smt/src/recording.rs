//! Recording and replaying solver interactions
//!
//! Three pieces share one call vocabulary, [`SolverCall`]:
//!
//! - [`SolverLog`] is a solver that only records. The offline execution mode
//!   batches one step's declarations and assertions in it and replays them to
//!   the real solver at commit time.
//! - [`RecordingSolver`] forwards every call to a real solver and logs it,
//!   results included.
//! - [`ReplaySolver`] answers from a recorded log without any solver behind
//!   it, so a trace captured once can be re-run deterministically in tests.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tla_core::CellId;
use tracing::debug;

use crate::context::{SmtCheckResult, SolverContext, Value};
use crate::error::{SmtError, SmtResult};
use crate::term::{Sort, Term};

/// One interaction with a solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolverCall {
    Declare { cell: CellId, sort: Sort },
    Assert(Term),
    Push,
    Pop,
    CheckSat(SmtCheckResult),
    /// A `check_sat` that ran out of time, in milliseconds
    CheckTimeout(u64),
    Evaluate { term: Term, value: Value },
}

/// A recording-only solver: a batch of calls to be replayed later
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverLog {
    calls: Vec<SolverCall>,
    #[serde(skip)]
    depth: usize,
}

impl SolverLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SolverCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Number of assertions in the batch
    pub fn assertion_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SolverCall::Assert(_)))
            .count()
    }

    /// Take the recorded calls, leaving an empty log
    pub fn take(&mut self) -> SolverLog {
        self.depth = 0;
        std::mem::take(self)
    }

    /// Re-issue the declarations, assertions and scope changes to `target`.
    /// Recorded `check_sat`/`evaluate` results are not replayed.
    pub fn replay_into(&self, target: &mut dyn SolverContext) -> SmtResult<()> {
        debug!(calls = self.calls.len(), "replaying solver log");
        for call in &self.calls {
            match call {
                SolverCall::Declare { cell, sort } => target.declare_cell(*cell, sort)?,
                SolverCall::Assert(term) => target.assert_ground_expr(term)?,
                SolverCall::Push => target.push()?,
                SolverCall::Pop => target.pop()?,
                SolverCall::CheckSat(_)
                | SolverCall::CheckTimeout(_)
                | SolverCall::Evaluate { .. } => {}
            }
        }
        Ok(())
    }

    fn record(&mut self, call: SolverCall) {
        self.calls.push(call);
    }
}

impl SolverContext for SolverLog {
    fn declare_cell(&mut self, cell: CellId, sort: &Sort) -> SmtResult<()> {
        self.record(SolverCall::Declare {
            cell,
            sort: sort.clone(),
        });
        Ok(())
    }

    fn assert_ground_expr(&mut self, term: &Term) -> SmtResult<()> {
        self.record(SolverCall::Assert(term.clone()));
        Ok(())
    }

    fn push(&mut self) -> SmtResult<()> {
        self.depth += 1;
        self.record(SolverCall::Push);
        Ok(())
    }

    fn pop(&mut self) -> SmtResult<()> {
        if self.depth == 0 {
            return Err(SmtError::ScopeUnderflow);
        }
        self.depth -= 1;
        self.record(SolverCall::Pop);
        Ok(())
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn check_sat(&mut self) -> SmtResult<SmtCheckResult> {
        Err(SmtError::Unsupported(
            "check_sat on a recording-only solver log".to_string(),
        ))
    }

    fn evaluate(&mut self, _term: &Term) -> SmtResult<Value> {
        Err(SmtError::Unsupported(
            "evaluate on a recording-only solver log".to_string(),
        ))
    }

    fn set_timeout(&mut self, _timeout: Option<Duration>) {}
}

/// Forwards to a solver and logs every call while recording is enabled
#[derive(Debug)]
pub struct RecordingSolver<S> {
    inner: S,
    log: SolverLog,
    enabled: bool,
}

impl<S: SolverContext> RecordingSolver<S> {
    /// Wrap `inner`, recording every call
    pub fn record(inner: S) -> Self {
        Self::new(inner, true)
    }

    pub fn new(inner: S, enabled: bool) -> Self {
        RecordingSolver {
            inner,
            log: SolverLog::new(),
            enabled,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.enabled
    }

    pub fn set_recording(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn log(&self) -> &SolverLog {
        &self.log
    }

    pub fn take_log(&mut self) -> SolverLog {
        self.log.take()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn note(&mut self, call: SolverCall) {
        if self.enabled {
            self.log.record(call);
        }
    }
}

impl<S: SolverContext> SolverContext for RecordingSolver<S> {
    fn declare_cell(&mut self, cell: CellId, sort: &Sort) -> SmtResult<()> {
        self.inner.declare_cell(cell, sort)?;
        self.note(SolverCall::Declare {
            cell,
            sort: sort.clone(),
        });
        Ok(())
    }

    fn assert_ground_expr(&mut self, term: &Term) -> SmtResult<()> {
        self.inner.assert_ground_expr(term)?;
        self.note(SolverCall::Assert(term.clone()));
        Ok(())
    }

    fn push(&mut self) -> SmtResult<()> {
        self.inner.push()?;
        self.note(SolverCall::Push);
        Ok(())
    }

    fn pop(&mut self) -> SmtResult<()> {
        self.inner.pop()?;
        self.note(SolverCall::Pop);
        Ok(())
    }

    fn depth(&self) -> usize {
        self.inner.depth()
    }

    fn check_sat(&mut self) -> SmtResult<SmtCheckResult> {
        match self.inner.check_sat() {
            Ok(result) => {
                self.note(SolverCall::CheckSat(result.clone()));
                Ok(result)
            }
            Err(SmtError::Timeout(ms)) => {
                self.note(SolverCall::CheckTimeout(ms));
                Err(SmtError::Timeout(ms))
            }
            Err(e) => Err(e),
        }
    }

    fn evaluate(&mut self, term: &Term) -> SmtResult<Value> {
        let value = self.inner.evaluate(term)?;
        self.note(SolverCall::Evaluate {
            term: term.clone(),
            value: value.clone(),
        });
        Ok(value)
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.inner.set_timeout(timeout)
    }
}

/// Answers from a recorded log; any deviation from it is an error
#[derive(Debug, Clone)]
pub struct ReplaySolver {
    calls: Vec<SolverCall>,
    cursor: usize,
    depth: usize,
}

impl ReplaySolver {
    pub fn replay(log: SolverLog) -> Self {
        ReplaySolver {
            calls: log.calls,
            cursor: 0,
            depth: 0,
        }
    }

    /// True once every recorded call has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.calls.len()
    }

    fn next(&mut self, actual: &str) -> SmtResult<&SolverCall> {
        let index = self.cursor;
        match self.calls.get(index) {
            Some(call) => {
                self.cursor += 1;
                Ok(call)
            }
            None => Err(SmtError::ReplayDivergence {
                index,
                expected: "end of log".to_string(),
                actual: actual.to_string(),
            }),
        }
    }

    fn expect(&mut self, actual: SolverCall) -> SmtResult<()> {
        let index = self.cursor;
        let recorded = self.next(&format!("{:?}", actual))?;
        if *recorded == actual {
            Ok(())
        } else {
            Err(divergence(index, recorded, &actual))
        }
    }
}

fn divergence(index: usize, expected: &SolverCall, actual: &dyn std::fmt::Debug) -> SmtError {
    SmtError::ReplayDivergence {
        index,
        expected: format!("{:?}", expected),
        actual: format!("{:?}", actual),
    }
}

impl SolverContext for ReplaySolver {
    fn declare_cell(&mut self, cell: CellId, sort: &Sort) -> SmtResult<()> {
        self.expect(SolverCall::Declare {
            cell,
            sort: sort.clone(),
        })
    }

    fn assert_ground_expr(&mut self, term: &Term) -> SmtResult<()> {
        self.expect(SolverCall::Assert(term.clone()))
    }

    fn push(&mut self) -> SmtResult<()> {
        self.expect(SolverCall::Push)?;
        self.depth += 1;
        Ok(())
    }

    fn pop(&mut self) -> SmtResult<()> {
        if self.depth == 0 {
            return Err(SmtError::ScopeUnderflow);
        }
        self.expect(SolverCall::Pop)?;
        self.depth -= 1;
        Ok(())
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn check_sat(&mut self) -> SmtResult<SmtCheckResult> {
        let index = self.cursor;
        match self.next("CheckSat")? {
            SolverCall::CheckSat(result) => Ok(result.clone()),
            SolverCall::CheckTimeout(ms) => Err(SmtError::Timeout(*ms)),
            other => Err(divergence(index, other, &"CheckSat")),
        }
    }

    fn evaluate(&mut self, term: &Term) -> SmtResult<Value> {
        let index = self.cursor;
        match self.next("Evaluate")? {
            SolverCall::Evaluate {
                term: recorded,
                value,
            } if recorded == term => Ok(value.clone()),
            other => Err(divergence(index, other, term)),
        }
    }

    fn set_timeout(&mut self, _timeout: Option<Duration>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySolver;

    fn session(solver: &mut dyn SolverContext) -> SmtResult<SmtCheckResult> {
        solver.declare_cell(CellId(0), &Sort::Bool)?;
        solver.push()?;
        solver.assert_ground_expr(&Term::cell(CellId(0)))?;
        let result = solver.check_sat()?;
        solver.pop()?;
        Ok(result)
    }

    #[test]
    fn test_record_then_replay() {
        let mut recording = RecordingSolver::record(MemorySolver::new());
        assert_eq!(session(&mut recording).unwrap(), SmtCheckResult::Sat);
        let log = recording.take_log();
        assert_eq!(log.len(), 5);

        let mut replay = ReplaySolver::replay(log);
        assert_eq!(session(&mut replay).unwrap(), SmtCheckResult::Sat);
        assert!(replay.is_exhausted());
    }

    #[test]
    fn test_timeout_is_recorded_and_replayed() {
        let mut recording = RecordingSolver::record(MemorySolver::new());
        recording.set_timeout(Some(Duration::ZERO));
        assert_eq!(session(&mut recording), Err(SmtError::Timeout(0)));
        let log = recording.take_log();
        assert_eq!(log.calls().last(), Some(&SolverCall::CheckTimeout(0)));

        let mut replay = ReplaySolver::replay(log);
        assert_eq!(session(&mut replay), Err(SmtError::Timeout(0)));
        assert!(replay.is_exhausted());
    }

    #[test]
    fn test_replay_divergence() {
        let mut recording = RecordingSolver::record(MemorySolver::new());
        session(&mut recording).unwrap();
        let mut replay = ReplaySolver::replay(recording.take_log());
        let err = replay.declare_cell(CellId(0), &Sort::Int).unwrap_err();
        assert!(matches!(err, SmtError::ReplayDivergence { index: 0, .. }));
    }

    #[test]
    fn test_log_replays_into_solver() {
        let mut log = SolverLog::new();
        log.declare_cell(CellId(0), &Sort::Bool).unwrap();
        log.assert_ground_expr(&Term::not(Term::cell(CellId(0))))
            .unwrap();
        assert!(log.check_sat().is_err());
        assert_eq!(log.assertion_count(), 1);

        let mut solver = MemorySolver::new();
        log.replay_into(&mut solver).unwrap();
        assert!(solver.check_sat().unwrap().is_sat());
        assert_eq!(
            solver.evaluate(&Term::cell(CellId(0))).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_log_serde_roundtrip() {
        let mut recording = RecordingSolver::record(MemorySolver::new());
        session(&mut recording).unwrap();
        let json = serde_json::to_string(recording.log()).unwrap();
        let parsed: SolverLog = serde_json::from_str(&json).unwrap();
        assert_eq!(&parsed, recording.log());
    }

    #[test]
    fn test_log_pop_underflow() {
        let mut log = SolverLog::new();
        assert_eq!(log.pop(), Err(SmtError::ScopeUnderflow));
    }
}
