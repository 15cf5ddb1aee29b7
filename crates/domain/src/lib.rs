//! Domain model and pure math for the DeFi lab.
//!
//! This crate holds everything that does not depend on randomness or I/O:
//! - Constant-product pool math and impermanent loss
//! - Black-Scholes helpers and option-equivalent Greeks for LP positions
//! - Lending trove snapshots, collateral ratios and deposit APR
//! - On-chain integer amounts and price value objects

/// Domain error type.
pub mod error;
/// Lending protocol positions (troves, stability pool, staking).
pub mod lending;
/// Closed-form math helpers.
pub mod math;
/// Position metrics (impermanent loss, Greeks).
pub mod metrics;
/// Value objects shared across crates.
pub mod value_objects;

pub use error::DomainError;
