//! Errors raised by the domain math.

use serde::Serialize;
use thiserror::Error;

/// Errors produced when a closed-form calculation receives inputs
/// outside its domain.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum DomainError {
    /// A price was zero, negative or not finite.
    #[error("Price must be positive and finite, got {0}")]
    InvalidPrice(f64),

    /// A pool reserve was zero, negative or not finite.
    #[error("Pool reserve collapsed: base={base}, quote={quote}")]
    CollapsedReserve {
        /// Base token reserve.
        base: f64,
        /// Quote token reserve.
        quote: f64,
    },

    /// Time to expiry was not positive.
    #[error("Time to expiry must be positive, got {0} years")]
    InvalidExpiry(f64),

    /// Volatility was not positive.
    #[error("Volatility must be positive, got {0}")]
    InvalidVolatility(f64),

    /// A token amount does not fit into the decimal representation.
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    /// A lookback window of zero days was requested.
    #[error("Period must be at least one day")]
    EmptyPeriod,
}
