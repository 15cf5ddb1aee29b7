//! Buy the asset at entry and stake it.

use super::{ParameterCheck, Parameters, check_price, growth_factor};
use crate::error::{ConfigError, EvaluationError};
use crate::performance::PerformanceSeries;
use crate::price_path::PricePath;
use serde::Serialize;

/// Holds `capital / p0` units of the asset, earning a staking yield paid in
/// the asset itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HoldAndStake {
    /// Staking yield per unit of time.
    pub staking_apy: f64,
}

impl HoldAndStake {
    pub(crate) const PARAMETERS: &'static [&'static str] = &["staking_apy"];

    /// Creates a hold strategy with the given staking yield.
    #[must_use]
    pub fn new(staking_apy: f64) -> Self {
        Self { staking_apy }
    }

    pub(crate) fn from_parameters(params: &Parameters<'_>) -> Result<Self, ConfigError> {
        Ok(Self::new(params.get("staking_apy", 0.0)?))
    }

    pub(crate) fn validate(&self, check: &ParameterCheck<'_>) -> Result<(), ConfigError> {
        check.rate("staking_apy", self.staking_apy)
    }

    /// Value of the staked holding at every step.
    ///
    /// # Errors
    /// Returns [`EvaluationError::NonPositivePrice`] for an invalid price.
    pub fn evaluate(
        &self,
        path: &PricePath,
        initial_capital: f64,
    ) -> Result<PerformanceSeries, EvaluationError> {
        let Some(p0) = path.initial_price() else {
            return Ok(PerformanceSeries::new(Vec::new(), None));
        };
        let p0 = check_price(0, p0)?;
        let dt = path.time_step();

        let values = path
            .prices()
            .iter()
            .enumerate()
            .map(|(step, &price)| {
                let price = check_price(step, price)?;
                Ok(initial_capital * (price / p0) * growth_factor(self.staking_apy, step, dt))
            })
            .collect::<Result<Vec<_>, EvaluationError>>()?;

        Ok(PerformanceSeries::new(values, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tracks_price() {
        let path = PricePath::new(vec![100.0, 150.0, 50.0], 1.0 / 365.0);
        let series = HoldAndStake::default().evaluate(&path, 1_000.0).unwrap();
        assert_eq!(series.values(), &[1_000.0, 1_500.0, 500.0]);
        assert!(!series.is_liquidated());
    }

    #[test]
    fn test_staking_yield_compounds() {
        let path = PricePath::new(vec![10.0; 3], 1.0);
        let series = HoldAndStake::new(0.1).evaluate(&path, 100.0).unwrap();
        assert_relative_eq!(series.values()[1], 110.0);
        assert_relative_eq!(series.values()[2], 121.0);
    }
}
