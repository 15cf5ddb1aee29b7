//! Constant-product (x * y = k) pool math.
//!
//! Prices are quoted as quote tokens per base token, so a pool holding
//! `base` and `quote` reserves has spot price `quote / base`.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Reserves of a two-asset constant-product pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantProductPool {
    /// Base token reserve (the volatile asset).
    pub base_reserve: f64,
    /// Quote token reserve (the numeraire).
    pub quote_reserve: f64,
}

impl ConstantProductPool {
    /// Creates a pool from explicit reserves.
    ///
    /// # Errors
    /// Returns [`DomainError::CollapsedReserve`] if either reserve is not
    /// strictly positive and finite.
    pub fn new(base_reserve: f64, quote_reserve: f64) -> Result<Self, DomainError> {
        let valid = |r: f64| r.is_finite() && r > 0.0;
        if !valid(base_reserve) || !valid(quote_reserve) {
            return Err(DomainError::CollapsedReserve {
                base: base_reserve,
                quote: quote_reserve,
            });
        }
        Ok(Self {
            base_reserve,
            quote_reserve,
        })
    }

    /// Creates a pool by depositing `capital` (in quote units) split evenly
    /// between both assets at `price`.
    ///
    /// # Errors
    /// Returns an error if the price is invalid or the resulting reserves
    /// are empty.
    pub fn from_capital(capital: f64, price: f64) -> Result<Self, DomainError> {
        ensure_price(price)?;
        Self::new(capital / (2.0 * price), capital / 2.0)
    }

    /// The invariant `k = x * y`.
    #[must_use]
    pub fn invariant(&self) -> f64 {
        self.base_reserve * self.quote_reserve
    }

    /// Spot price implied by the reserves.
    #[must_use]
    pub fn spot_price(&self) -> f64 {
        self.quote_reserve / self.base_reserve
    }

    /// Reserves after arbitrage has moved the pool to `price`.
    ///
    /// formula: x = sqrt(k / p), y = sqrt(k * p)
    ///
    /// # Errors
    /// Returns an error if the price is invalid or the invariant has
    /// collapsed to zero.
    pub fn rebalanced_at(&self, price: f64) -> Result<Self, DomainError> {
        ensure_price(price)?;
        let k = self.invariant();
        Self::new((k / price).sqrt(), (k * price).sqrt())
    }

    /// Total value of the reserves in quote units at `price`.
    #[must_use]
    pub fn value_at(&self, price: f64) -> f64 {
        self.base_reserve * price + self.quote_reserve
    }
}

pub(crate) fn ensure_price(price: f64) -> Result<(), DomainError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(DomainError::InvalidPrice(price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_capital_splits_evenly() {
        let pool = ConstantProductPool::from_capital(20_000.0, 100.0).unwrap();
        assert_relative_eq!(pool.base_reserve, 100.0);
        assert_relative_eq!(pool.quote_reserve, 10_000.0);
        assert_relative_eq!(pool.spot_price(), 100.0);
    }

    #[test]
    fn test_rebalance_preserves_invariant() {
        let pool = ConstantProductPool::from_capital(20_000.0, 100.0).unwrap();
        let moved = pool.rebalanced_at(400.0).unwrap();

        assert_relative_eq!(moved.invariant(), pool.invariant(), max_relative = 1e-12);
        assert_relative_eq!(moved.spot_price(), 400.0, max_relative = 1e-12);
        // Price up 4x: base halves, quote doubles.
        assert_relative_eq!(moved.base_reserve, 50.0, max_relative = 1e-12);
        assert_relative_eq!(moved.quote_reserve, 20_000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_rejects_collapsed_reserves() {
        assert!(matches!(
            ConstantProductPool::new(0.0, 10.0),
            Err(DomainError::CollapsedReserve { .. })
        ));
        assert!(ConstantProductPool::new(1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_invalid_price() {
        let pool = ConstantProductPool::new(1.0, 1.0).unwrap();
        assert_eq!(
            pool.rebalanced_at(-1.0),
            Err(DomainError::InvalidPrice(-1.0))
        );
        assert!(ConstantProductPool::from_capital(100.0, 0.0).is_err());
    }
}
