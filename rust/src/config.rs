//! Configuration types for the project scheduler.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default tolerance, in days, below which slack counts as zero.
pub const DEFAULT_CRITICAL_EPSILON: f64 = 1e-3;

/// How the forward and backward passes visit tasks.
///
/// Both strategies reach the same fixed point on an acyclic graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStrategy {
    /// Sweep the task list repeatedly until no value changes.
    #[default]
    Relaxation,
    /// Visit tasks once in dependency order.
    Topological,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown pass strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl FromStr for PassStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relaxation" => Ok(PassStrategy::Relaxation),
            "topological" => Ok(PassStrategy::Topological),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for PassStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassStrategy::Relaxation => f.write_str("relaxation"),
            PassStrategy::Topological => f.write_str("topological"),
        }
    }
}

/// Rejected slack tolerance. Anything not strictly positive and finite would
/// leave every task non-critical.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("critical_epsilon must be a positive finite number, got {0}")]
pub struct InvalidEpsilon(pub f64);

/// Configuration for one scheduler run.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Slack below this many days marks a task critical.
    pub critical_epsilon: f64,
    pub strategy: PassStrategy,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            critical_epsilon: DEFAULT_CRITICAL_EPSILON,
            strategy: PassStrategy::default(),
            verbosity: 0,
        }
    }
}

impl SchedulerConfig {
    pub fn with_strategy(mut self, strategy: PassStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_critical_epsilon(mut self, epsilon: f64) -> Result<Self, InvalidEpsilon> {
        self.critical_epsilon = check_epsilon(epsilon)?;
        Ok(self)
    }

    /// Check values that may have arrived through field access or serde.
    pub fn validate(&self) -> Result<(), InvalidEpsilon> {
        check_epsilon(self.critical_epsilon).map(|_| ())
    }
}

fn check_epsilon(epsilon: f64) -> Result<f64, InvalidEpsilon> {
    if epsilon.is_finite() && epsilon > 0.0 {
        Ok(epsilon)
    } else {
        Err(InvalidEpsilon(epsilon))
    }
}

#[cfg(feature = "python")]
fn value_error(err: impl ToString) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

#[cfg(feature = "python")]
#[pymethods]
impl SchedulerConfig {
    #[new]
    #[pyo3(signature = (critical_epsilon=None, strategy=None, verbosity=None))]
    fn py_new(
        critical_epsilon: Option<f64>,
        strategy: Option<String>,
        verbosity: Option<u8>,
    ) -> PyResult<Self> {
        let mut config = Self::default();
        if let Some(epsilon) = critical_epsilon {
            config = config.with_critical_epsilon(epsilon).map_err(value_error)?;
        }
        if let Some(strategy) = strategy {
            config.strategy = strategy.parse().map_err(value_error)?;
        }
        if let Some(verbosity) = verbosity {
            config.verbosity = verbosity;
        }
        Ok(config)
    }

    #[getter(critical_epsilon)]
    fn py_critical_epsilon(&self) -> f64 {
        self.critical_epsilon
    }

    #[setter(critical_epsilon)]
    fn py_set_critical_epsilon(&mut self, epsilon: f64) -> PyResult<()> {
        self.critical_epsilon = check_epsilon(epsilon).map_err(value_error)?;
        Ok(())
    }

    #[getter(strategy)]
    fn py_strategy(&self) -> String {
        self.strategy.to_string()
    }

    #[setter(strategy)]
    fn py_set_strategy(&mut self, strategy: String) -> PyResult<()> {
        self.strategy = strategy.parse().map_err(value_error)?;
        Ok(())
    }

    #[getter(verbosity)]
    fn py_verbosity(&self) -> u8 {
        self.verbosity
    }

    #[setter(verbosity)]
    fn py_set_verbosity(&mut self, verbosity: u8) {
        self.verbosity = verbosity;
    }

    fn __repr__(&self) -> String {
        format!(
            "SchedulerConfig(strategy={:?}, critical_epsilon={}, verbosity={})",
            self.strategy.to_string(),
            self.critical_epsilon,
            self.verbosity
        )
    }
}
