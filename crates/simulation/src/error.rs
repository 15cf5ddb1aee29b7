//! Error types for the comparison engine.
//!
//! [`ConfigError`] aborts a run before any simulation happens.
//! [`EvaluationError`] is raised by a single strategy on a single path and
//! is recorded per trial by the orchestrator instead of propagating.

use defi_lab_domain::DomainError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid run, scenario or strategy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Initial price was not positive and finite.
    #[error("Initial price must be positive and finite, got {0}")]
    InvalidInitialPrice(f64),

    /// Initial capital was not positive and finite.
    #[error("Initial capital must be positive and finite, got {0}")]
    InvalidCapital(f64),

    /// Trial count was zero.
    #[error("Trial count must be at least 1")]
    ZeroTrials,

    /// A scenario has no steps.
    #[error("Scenario '{scenario}' must have at least one step")]
    ZeroSteps {
        /// Scenario name.
        scenario: String,
    },

    /// A scenario parameter is out of range.
    #[error("Scenario '{scenario}': {reason}")]
    InvalidScenario {
        /// Scenario name.
        scenario: String,
        /// What is wrong.
        reason: String,
    },

    /// Strategy kind is not one of the supported kinds.
    #[error("Unknown strategy kind '{0}'")]
    UnknownStrategyKind(String),

    /// A parameter name is not recognized for the strategy kind.
    #[error("Strategy '{strategy}' does not accept parameter '{parameter}'")]
    UnknownParameter {
        /// Strategy identifier.
        strategy: String,
        /// Offending parameter name.
        parameter: String,
    },

    /// A parameter value is out of range.
    #[error("Strategy '{strategy}': parameter '{parameter}' = {value} {reason}")]
    InvalidParameter {
        /// Strategy identifier.
        strategy: String,
        /// Parameter name.
        parameter: String,
        /// Supplied value.
        value: f64,
        /// Constraint that was violated.
        reason: &'static str,
    },

    /// Two scenarios share a name.
    #[error("Duplicate scenario name '{0}'")]
    DuplicateScenario(String),

    /// Two strategies share an identifier.
    #[error("Duplicate strategy identifier '{0}'")]
    DuplicateStrategy(String),

    /// The configuration file could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A strategy could not produce a value for some step of a path.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum EvaluationError {
    /// The path contains a price that is zero, negative or not finite.
    #[error("Non-positive price {price} at step {step}")]
    NonPositivePrice {
        /// Step index.
        step: usize,
        /// Offending price.
        price: f64,
    },

    /// A pool reserve collapsed to zero.
    #[error("Pool reserve collapsed at step {step}")]
    CollapsedReserve {
        /// Step index.
        step: usize,
    },

    /// The computed portfolio value is NaN or infinite.
    #[error("Portfolio value is not finite at step {step}")]
    NonFiniteValue {
        /// Step index.
        step: usize,
    },

    /// The produced series does not line up with the path.
    #[error("Series length {actual} does not match path length {expected}")]
    LengthMismatch {
        /// Path length.
        expected: usize,
        /// Series length.
        actual: usize,
    },

    /// A domain calculation failed.
    #[error("Step {step}: {source}")]
    Domain {
        /// Step index.
        step: usize,
        /// Underlying error.
        #[source]
        source: DomainError,
    },
}

impl EvaluationError {
    /// Wraps a domain error raised while evaluating `step`.
    #[must_use]
    pub fn at_step(step: usize, source: DomainError) -> Self {
        match source {
            DomainError::CollapsedReserve { .. } => Self::CollapsedReserve { step },
            DomainError::InvalidPrice(price) => Self::NonPositivePrice { step, price },
            source => Self::Domain { step, source },
        }
    }
}
