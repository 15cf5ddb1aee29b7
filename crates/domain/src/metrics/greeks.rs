//! Option-equivalent risk metrics for a constant-product LP position.
//!
//! A full-range LP position behaves like a covered position that is short
//! volatility. This module expresses its risk in option terms: the position
//! is priced as a put struck at the pool-balanced price and the resulting
//! Greeks are scaled to the position size in standard contracts.

use crate::error::DomainError;
use crate::math::black_scholes::{d1_d2, norm_cdf, norm_pdf};
use crate::math::constant_product::ensure_price;
use serde::{Deserialize, Serialize};

/// Units of the underlying per option contract.
pub const CONTRACT_SIZE: f64 = 100.0;

/// Days per year used for time scaling.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// A liquidity position in a two-asset constant-product pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LpPosition {
    /// Amount of token A (the quote asset, e.g. USDC).
    pub token_a: f64,
    /// Amount of token B (the volatile asset, e.g. ETH).
    pub token_b: f64,
    /// Current price of token B in token A.
    pub price: f64,
    /// Pool fee tier as a fraction (0.003 = 0.3%).
    pub fee_tier: f64,
}

/// Option Greeks of a position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionGreeks {
    /// Sensitivity to the underlying price.
    pub delta: f64,
    /// Sensitivity of delta to the underlying price.
    pub gamma: f64,
    /// Value change for a one percentage point move in volatility.
    pub vega: f64,
    /// Value change per day.
    pub theta: f64,
}

/// Exact price sensitivities of the constant-product value curve
/// `V(p) = 2 * sqrt(k * p)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSensitivities {
    /// dV/dp, equal to the base reserve.
    pub delta: f64,
    /// d2V/dp2, always negative.
    pub gamma: f64,
}

impl LpPosition {
    /// Creates a new position.
    #[must_use]
    pub fn new(token_a: f64, token_b: f64, price: f64, fee_tier: f64) -> Self {
        Self {
            token_a,
            token_b,
            price,
            fee_tier,
        }
    }

    /// Mark-to-market value in token A.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.token_a + self.token_b * self.price
    }

    /// Price at which the current reserves would be balanced
    /// (`token_a / token_b`). Used as the strike of the equivalent option.
    ///
    /// # Errors
    /// Returns an error if either reserve is empty.
    pub fn implied_strike(&self) -> Result<f64, DomainError> {
        if !(self.token_a > 0.0 && self.token_b > 0.0) {
            return Err(DomainError::CollapsedReserve {
                base: self.token_b,
                quote: self.token_a,
            });
        }
        Ok(self.token_a / self.token_b)
    }

    /// Computes the option-equivalent Greeks over a horizon of `days`.
    ///
    /// Delta, gamma, vega and theta are those of a put struck at
    /// [`implied_strike`](Self::implied_strike), scaled by
    /// `position value / (price * CONTRACT_SIZE)`. Vega is per one
    /// percentage point of volatility and theta is per day.
    ///
    /// # Errors
    /// Returns an error for a zero horizon, invalid volatility or price,
    /// or empty reserves.
    pub fn option_greeks(
        &self,
        days: u32,
        risk_free_rate: f64,
        volatility: f64,
    ) -> Result<PositionGreeks, DomainError> {
        let strike = self.implied_strike()?;
        let s = self.price;
        let t = f64::from(days) / DAYS_PER_YEAR;
        let (d1, d2) = d1_d2(s, strike, risk_free_rate, volatility, t)?;

        let sqrt_t = t.sqrt();
        let pdf_d1 = norm_pdf(d1);
        let discount = (-risk_free_rate * t).exp();

        let delta = norm_cdf(d1) - 1.0;
        let gamma = pdf_d1 / (s * volatility * sqrt_t);
        let vega = s * pdf_d1 * sqrt_t / 100.0;
        let theta = (-s * pdf_d1 * volatility / (2.0 * sqrt_t)
            + risk_free_rate * strike * discount * norm_cdf(-d2))
            / DAYS_PER_YEAR;

        let scale = self.value() / (s * CONTRACT_SIZE);

        Ok(PositionGreeks {
            delta: delta * scale,
            gamma: gamma * scale,
            vega: vega * scale,
            theta: theta * scale,
        })
    }

    /// Exact delta and gamma of the pool value as a function of price,
    /// using the position's invariant `k = token_a * token_b`.
    ///
    /// # Errors
    /// Returns an error for an invalid price or empty reserves.
    pub fn curve_sensitivities(&self) -> Result<CurveSensitivities, DomainError> {
        ensure_price(self.price)?;
        self.implied_strike()?;
        let k = self.token_a * self.token_b;
        let delta = (k / self.price).sqrt();
        Ok(CurveSensitivities {
            delta,
            gamma: -0.5 * delta / self.price,
        })
    }

    /// Expected fee income per day given a daily traded volume.
    #[must_use]
    pub fn daily_fee_income(&self, daily_volume: f64) -> f64 {
        daily_volume * self.fee_tier
    }
}
