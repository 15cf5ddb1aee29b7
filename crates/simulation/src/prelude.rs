//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use defi_lab_simulation::prelude::*;
//! ```

// Configuration
pub use crate::config::ComparisonConfig;

// Errors
pub use crate::error::{ConfigError, EvaluationError};

// Monte Carlo
pub use crate::monte_carlo::{
    ComparisonReport, ComparisonResult, ComparisonRunner, ComparisonSettings,
    ComparisonStatistics, TrialFailure, run_comparison,
};

// Performance
pub use crate::performance::PerformanceSeries;

// Price path generators
pub use crate::price_path::{
    GeometricBrownianMotion, HestonModel, PricePath, PricePathGenerator, ScenarioPathGenerator,
};

// Scenarios
pub use crate::scenario::{MarketScenario, PriceModel};

// Strategies
pub use crate::strategies::{
    CoveredCall, FixedRateLending, HoldAndStake, LeveragedFarm, LiquidityProvision,
    StrategyConfig, StrategyDefinition, StrategyKind, StrategyModel, TransactionCosts,
};
