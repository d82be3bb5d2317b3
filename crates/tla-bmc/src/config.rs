//! Configuration for symbolic bounded model checking

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How finite sets are represented in the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Sets are arrays from elements to Bool (characteristic functions)
    #[default]
    Arrays,
    /// Membership is an uninterpreted predicate `in(e, S)`
    Oracles,
}

/// When constraints reach the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Stream constraints while rewriting
    #[default]
    Incremental,
    /// Batch a step's constraints and hand them over at commit
    Offline,
}

/// Configuration for the transition executor and the search driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BmcConfig {
    /// Set representation, fixed for the run
    pub encoding: Encoding,

    pub mode: ExecutionMode,

    /// Maximum number of transitions after the initial step
    pub max_steps: usize,

    /// Maximum number of live snapshots
    pub max_snapshot_depth: usize,

    /// Shuffle alternative transitions with this seed
    pub seed: Option<u64>,

    /// Timeout for each satisfiability check
    pub check_timeout: Option<Duration>,

    /// In incremental mode, check satisfiability right after rewriting a
    /// step so unsatisfiable alternatives are rejected before commit
    pub early_unsat_check: bool,

    /// Report states without enabled transitions
    pub check_deadlock: bool,

    /// Log every solver call for later replay
    pub record_solver: bool,

    /// Log every assertion at debug level
    pub debug: bool,
}

impl Default for BmcConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Arrays,
            mode: ExecutionMode::Incremental,
            max_steps: 10,
            max_snapshot_depth: 64,
            seed: None,
            check_timeout: None,
            early_unsat_check: true,
            check_deadlock: true,
            record_solver: false,
            debug: false,
        }
    }
}

impl BmcConfig {
    pub fn builder() -> BmcConfigBuilder {
        BmcConfigBuilder::new()
    }
}

/// Builder for BmcConfig
#[derive(Debug, Default)]
pub struct BmcConfigBuilder {
    encoding: Option<Encoding>,
    mode: Option<ExecutionMode>,
    max_steps: Option<usize>,
    max_snapshot_depth: Option<usize>,
    seed: Option<u64>,
    check_timeout: Option<Duration>,
    early_unsat_check: Option<bool>,
    check_deadlock: Option<bool>,
    record_solver: Option<bool>,
    debug: Option<bool>,
}

impl BmcConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encoding(mut self, value: Encoding) -> Self {
        self.encoding = Some(value);
        self
    }

    pub fn mode(mut self, value: ExecutionMode) -> Self {
        self.mode = Some(value);
        self
    }

    pub fn max_steps(mut self, value: usize) -> Self {
        self.max_steps = Some(value);
        self
    }

    pub fn max_snapshot_depth(mut self, value: usize) -> Self {
        self.max_snapshot_depth = Some(value);
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    pub fn check_timeout(mut self, value: Duration) -> Self {
        self.check_timeout = Some(value);
        self
    }

    pub fn check_timeout_ms(mut self, millis: u64) -> Self {
        self.check_timeout = Some(Duration::from_millis(millis));
        self
    }

    pub fn early_unsat_check(mut self, value: bool) -> Self {
        self.early_unsat_check = Some(value);
        self
    }

    pub fn check_deadlock(mut self, value: bool) -> Self {
        self.check_deadlock = Some(value);
        self
    }

    pub fn record_solver(mut self, value: bool) -> Self {
        self.record_solver = Some(value);
        self
    }

    pub fn debug(mut self, value: bool) -> Self {
        self.debug = Some(value);
        self
    }

    pub fn build(self) -> BmcConfig {
        let defaults = BmcConfig::default();
        BmcConfig {
            encoding: self.encoding.unwrap_or(defaults.encoding),
            mode: self.mode.unwrap_or(defaults.mode),
            max_steps: self.max_steps.unwrap_or(defaults.max_steps),
            max_snapshot_depth: self
                .max_snapshot_depth
                .unwrap_or(defaults.max_snapshot_depth),
            seed: self.seed.or(defaults.seed),
            check_timeout: self.check_timeout.or(defaults.check_timeout),
            early_unsat_check: self
                .early_unsat_check
                .unwrap_or(defaults.early_unsat_check),
            check_deadlock: self.check_deadlock.unwrap_or(defaults.check_deadlock),
            record_solver: self.record_solver.unwrap_or(defaults.record_solver),
            debug: self.debug.unwrap_or(defaults.debug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BmcConfig::default();
        assert_eq!(config.encoding, Encoding::Arrays);
        assert_eq!(config.mode, ExecutionMode::Incremental);
        assert_eq!(config.max_steps, 10);
        assert_eq!(config.max_snapshot_depth, 64);
        assert!(config.early_unsat_check);
        assert!(config.check_deadlock);
        assert!(!config.record_solver);
    }

    #[test]
    fn test_builder_overrides() {
        let config = BmcConfig::builder()
            .encoding(Encoding::Oracles)
            .mode(ExecutionMode::Offline)
            .max_steps(3)
            .seed(7)
            .check_timeout_ms(250)
            .build();
        assert_eq!(config.encoding, Encoding::Oracles);
        assert_eq!(config.mode, ExecutionMode::Offline);
        assert_eq!(config.max_steps, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.check_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.max_snapshot_depth, 64);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: BmcConfig =
            serde_json::from_str(r#"{"encoding": "oracles", "max_steps": 4}"#).unwrap();
        assert_eq!(config.encoding, Encoding::Oracles);
        assert_eq!(config.max_steps, 4);
        assert_eq!(config.mode, ExecutionMode::Incremental);
        assert!(config.check_deadlock);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = BmcConfig::builder().debug(true).record_solver(true).build();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: BmcConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
