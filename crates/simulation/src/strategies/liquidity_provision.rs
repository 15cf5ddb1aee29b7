//! Passive liquidity in a 50/50 constant-product pool.
//!
//! The position starts with half of the capital in each asset. Arbitrage
//! keeps the pool at the path price, so reserves follow the invariant and
//! the position suffers impermanent loss against holding. Fees accrue from
//! two sources each step: the arbitrage flow implied by the reserve change
//! and organic volume proportional to pool value.

use super::{ParameterCheck, Parameters, check_price};
use crate::error::{ConfigError, EvaluationError};
use crate::performance::PerformanceSeries;
use crate::price_path::PricePath;
use defi_lab_domain::math::constant_product::ConstantProductPool;
use serde::Serialize;

const DEFAULT_FEE_RATE: f64 = 0.003;
const DEFAULT_VOLUME_RATIO: f64 = 50.0;

/// Constant-product LP position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiquidityProvision {
    /// Swap fee charged on traded quote volume.
    pub fee_rate: f64,
    /// Organic volume per unit of time as a multiple of pool value.
    pub volume_ratio: f64,
}

impl Default for LiquidityProvision {
    fn default() -> Self {
        Self {
            fee_rate: DEFAULT_FEE_RATE,
            volume_ratio: DEFAULT_VOLUME_RATIO,
        }
    }
}

impl LiquidityProvision {
    pub(crate) const PARAMETERS: &'static [&'static str] = &["fee_rate", "volume_ratio"];

    pub(crate) fn from_parameters(params: &Parameters<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            fee_rate: params.get("fee_rate", DEFAULT_FEE_RATE)?,
            volume_ratio: params.get("volume_ratio", DEFAULT_VOLUME_RATIO)?,
        })
    }

    pub(crate) fn validate(&self, check: &ParameterCheck<'_>) -> Result<(), ConfigError> {
        check.non_negative("fee_rate", self.fee_rate)?;
        check.ensure("fee_rate", self.fee_rate, self.fee_rate < 1.0, "must be below 1")?;
        check.non_negative("volume_ratio", self.volume_ratio)
    }

    /// Pool value plus accumulated fees at every step.
    ///
    /// # Errors
    /// Returns an [`EvaluationError`] for an invalid price or if the pool
    /// reserves collapse.
    pub fn evaluate(
        &self,
        path: &PricePath,
        initial_capital: f64,
    ) -> Result<PerformanceSeries, EvaluationError> {
        let Some(p0) = path.initial_price() else {
            return Ok(PerformanceSeries::new(Vec::new(), None));
        };
        let p0 = check_price(0, p0)?;
        let entry = ConstantProductPool::from_capital(initial_capital, p0)
            .map_err(|e| EvaluationError::at_step(0, e))?;
        let dt = path.time_step();

        let mut values = Vec::with_capacity(path.len());
        let mut previous_quote = entry.quote_reserve;
        let mut fees = 0.0;

        for (step, &price) in path.prices().iter().enumerate() {
            let price = check_price(step, price)?;
            let pool = entry
                .rebalanced_at(price)
                .map_err(|e| EvaluationError::at_step(step, e))?;
            let pool_value = pool.value_at(price);

            if step > 0 {
                let arbitrage_volume = (pool.quote_reserve - previous_quote).abs();
                let organic_volume = self.volume_ratio * pool_value * dt;
                fees += self.fee_rate * (arbitrage_volume + organic_volume);
            }
            previous_quote = pool.quote_reserve;

            values.push(pool_value + fees);
        }

        Ok(PerformanceSeries::new(values, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use defi_lab_domain::metrics::impermanent_loss::il_from_price_ratio;

    fn no_fees() -> LiquidityProvision {
        LiquidityProvision {
            fee_rate: 0.0,
            volume_ratio: 0.0,
        }
    }

    #[test]
    fn test_value_matches_impermanent_loss() {
        let path = PricePath::new(vec![100.0, 400.0, 25.0], 1.0 / 365.0);
        let series = no_fees().evaluate(&path, 10_000.0).unwrap();

        assert_relative_eq!(series.values()[0], 10_000.0, epsilon = 1e-9);
        for (step, ratio) in [(1, 4.0), (2, 0.25)] {
            let hold_value = 10_000.0 * (1.0 + ratio) / 2.0;
            let il = il_from_price_ratio(ratio).unwrap();
            assert_relative_eq!(series.values()[step], hold_value * (1.0 + il), epsilon = 1e-6);
        }
        // 4x move: pool worth 2 * sqrt(4) = 4 halves of capital, hold worth 5.
        assert_relative_eq!(series.values()[1], 20_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_flat_path_earns_organic_fees_only() {
        let path = PricePath::new(vec![100.0; 3], 1.0);
        let lp = LiquidityProvision {
            fee_rate: 0.01,
            volume_ratio: 1.0,
        };
        let series = lp.evaluate(&path, 1_000.0).unwrap();

        assert_relative_eq!(series.values()[0], 1_000.0, epsilon = 1e-9);
        assert_relative_eq!(series.values()[1], 1_010.0, epsilon = 1e-9);
        assert_relative_eq!(series.values()[2], 1_020.0, epsilon = 1e-9);
    }

    #[test]
    fn test_arbitrage_flow_earns_fees() {
        let path = PricePath::new(vec![100.0, 400.0], 1.0);
        let lp = LiquidityProvision {
            fee_rate: 0.01,
            volume_ratio: 0.0,
        };
        let series = lp.evaluate(&path, 1_000.0).unwrap();
        // Quote reserve moves from 500 to 1000.
        assert_relative_eq!(series.values()[1], 2_000.0 + 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_capital_collapses_reserves() {
        let path = PricePath::new(vec![100.0, 101.0], 1.0);
        assert_eq!(
            no_fees().evaluate(&path, 0.0),
            Err(EvaluationError::CollapsedReserve { step: 0 })
        );
    }
}
