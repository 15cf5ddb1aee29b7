//! Fixed-rate lending deposit.

use super::{ParameterCheck, Parameters, growth_factor};
use crate::error::{ConfigError, EvaluationError};
use crate::performance::PerformanceSeries;
use crate::price_path::PricePath;
use serde::Serialize;

const DEFAULT_APY: f64 = 0.05;

/// Capital deposited into a money market at a fixed yield. The value does
/// not depend on the asset price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixedRateLending {
    /// Deposit yield per unit of time.
    pub apy: f64,
}

impl Default for FixedRateLending {
    fn default() -> Self {
        Self { apy: DEFAULT_APY }
    }
}

impl FixedRateLending {
    pub(crate) const PARAMETERS: &'static [&'static str] = &["apy"];

    pub(crate) fn from_parameters(params: &Parameters<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            apy: params.get("apy", DEFAULT_APY)?,
        })
    }

    pub(crate) fn validate(&self, check: &ParameterCheck<'_>) -> Result<(), ConfigError> {
        check.rate("apy", self.apy)
    }

    /// Compounded deposit value at every step.
    ///
    /// # Errors
    /// Never fails; the signature matches the other strategies.
    pub fn evaluate(
        &self,
        path: &PricePath,
        initial_capital: f64,
    ) -> Result<PerformanceSeries, EvaluationError> {
        let dt = path.time_step();
        let values = (0..path.len())
            .map(|step| initial_capital * growth_factor(self.apy, step, dt))
            .collect();
        Ok(PerformanceSeries::new(values, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_independent_of_price() {
        let crash = PricePath::new(vec![100.0, 1.0, 0.01], 1.0);
        let series = FixedRateLending::default().evaluate(&crash, 1_000.0).unwrap();

        assert_eq!(series.values()[0], 1_000.0);
        assert_relative_eq!(series.values()[1], 1_050.0);
        assert_relative_eq!(series.values()[2], 1_102.5);
    }

    #[test]
    fn test_one_year_of_daily_steps() {
        let path = PricePath::new(vec![100.0; 366], 1.0 / 365.0);
        let series = FixedRateLending::default().evaluate(&path, 20_000.0).unwrap();
        assert_relative_eq!(series.final_value().unwrap(), 21_000.0, epsilon = 1e-6);
    }
}
