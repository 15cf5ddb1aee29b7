//! Monte-Carlo comparison of DeFi yield strategies.
//!
//! This crate provides the strategy comparison engine:
//! - Market scenarios and stochastic price path generators (GBM, Heston)
//! - Yield strategies evaluated as pure functions of a price path
//! - Portfolio value series with drawdown tracking
//! - A seeded Monte-Carlo runner aggregating per-scenario statistics
//! - JSON run configuration

/// Prelude module for convenient imports.
pub mod prelude;

/// Run configuration.
pub mod config;
/// Error types.
pub mod error;
/// Monte-Carlo comparison runner.
pub mod monte_carlo;
/// Portfolio value series.
pub mod performance;
/// Price path generators.
pub mod price_path;
/// Market scenarios.
pub mod scenario;
/// Yield strategies.
pub mod strategies;
