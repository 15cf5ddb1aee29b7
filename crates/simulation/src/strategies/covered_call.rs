//! Covered call: hold the asset and sell one European call per unit.

use super::{ParameterCheck, Parameters, check_price};
use crate::error::{ConfigError, EvaluationError};
use crate::performance::PerformanceSeries;
use crate::price_path::PricePath;
use defi_lab_domain::math::black_scholes::call_price;
use serde::Serialize;

const DEFAULT_STRIKE_RATIO: f64 = 1.1;
const DEFAULT_RISK_FREE_RATE: f64 = 0.02;
const DEFAULT_IMPLIED_VOLATILITY: f64 = 0.5;

/// Long `capital / p0` units, short the same number of calls struck at
/// `strike_ratio * p0`. The premium is collected at entry and the short call
/// is marked with Black-Scholes until it settles at expiry.
///
/// Without an explicit `implied_volatility` the call is priced at the
/// volatility the path was generated with, or 0.5 for a path that carries
/// none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoveredCall {
    /// Strike as a multiple of the entry price.
    pub strike_ratio: f64,
    /// Risk-free rate used to price the call.
    pub risk_free_rate: f64,
    /// Volatility used to price the call. `None` uses the path volatility.
    pub implied_volatility: Option<f64>,
    /// Step at which the call expires. `None` means the last step.
    pub expiration_steps: Option<usize>,
}

impl Default for CoveredCall {
    fn default() -> Self {
        Self {
            strike_ratio: DEFAULT_STRIKE_RATIO,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            implied_volatility: None,
            expiration_steps: None,
        }
    }
}

impl CoveredCall {
    pub(crate) const PARAMETERS: &'static [&'static str] = &[
        "strike_ratio",
        "risk_free_rate",
        "implied_volatility",
        "expiration_steps",
    ];

    pub(crate) fn from_parameters(params: &Parameters<'_>) -> Result<Self, ConfigError> {
        let expiration_steps = match params.optional("expiration_steps")? {
            Some(steps) if steps < 0.0 || steps.fract() != 0.0 => {
                return Err(params.invalid(
                    "expiration_steps",
                    steps,
                    "must be a non-negative whole number",
                ));
            }
            Some(steps) => Some(steps as usize),
            None => None,
        };

        Ok(Self {
            strike_ratio: params.get("strike_ratio", DEFAULT_STRIKE_RATIO)?,
            risk_free_rate: params.get("risk_free_rate", DEFAULT_RISK_FREE_RATE)?,
            implied_volatility: params.optional("implied_volatility")?,
            expiration_steps,
        })
    }

    pub(crate) fn validate(&self, check: &ParameterCheck<'_>) -> Result<(), ConfigError> {
        check.positive("strike_ratio", self.strike_ratio)?;
        check.finite("risk_free_rate", self.risk_free_rate)?;
        if let Some(volatility) = self.implied_volatility {
            check.positive("implied_volatility", volatility)?;
        }
        Ok(())
    }

    /// Volatility the call is priced at on `path`.
    #[must_use]
    pub fn pricing_volatility(&self, path: &PricePath) -> f64 {
        self.implied_volatility
            .or_else(|| path.volatility())
            .unwrap_or(DEFAULT_IMPLIED_VOLATILITY)
    }

    /// Position value at every step: asset minus short call plus premium.
    ///
    /// # Errors
    /// Returns an [`EvaluationError`] for an invalid price or if the call
    /// cannot be priced.
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
        let expiry = self
            .expiration_steps
            .unwrap_or_else(|| path.len().saturating_sub(1));

        let units = initial_capital / p0;
        let strike = self.strike_ratio * p0;
        let sigma = self.pricing_volatility(path);
        let call = |step: usize, price: f64| {
            let time_to_expiry = expiry.saturating_sub(step) as f64 * dt;
            call_price(price, strike, self.risk_free_rate, sigma, time_to_expiry)
                .map_err(|e| EvaluationError::at_step(step, e))
        };
        let premium = units * call(0, p0)?;

        let values = path
            .prices()
            .iter()
            .enumerate()
            .map(|(step, &price)| {
                let price = check_price(step, price)?;
                if step >= expiry {
                    Ok(units * price.min(strike) + premium)
                } else {
                    Ok(units * price - units * call(step, price)? + premium)
                }
            })
            .collect::<Result<Vec<_>, EvaluationError>>()?;

        Ok(PerformanceSeries::new(values, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    const DAY: f64 = 1.0 / 365.0;

    #[test]
    fn test_entry_value_is_capital() {
        let path = PricePath::new(vec![100.0, 105.0, 98.0], 1.0 / 365.0);
        let series = CoveredCall::default().evaluate(&path, 10_000.0).unwrap();
        assert_relative_eq!(series.values()[0], 10_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_flat_path_keeps_premium() {
        let path = PricePath::new(vec![100.0; 31], 1.0 / 365.0);
        let strategy = CoveredCall::default();
        let series = strategy.evaluate(&path, 10_000.0).unwrap();

        let premium = 100.0 * call_price(100.0, 110.0, 0.02, 0.5, 30.0 / 365.0).unwrap();
        assert!(premium > 0.0);
        assert_relative_eq!(series.final_value().unwrap(), 10_000.0 + premium, epsilon = 1e-9);
    }

    #[test]
    fn test_upside_capped_at_strike() {
        let path = PricePath::new(vec![100.0, 120.0, 200.0], 1.0 / 365.0);
        let series = CoveredCall::default().evaluate(&path, 1_000.0).unwrap();

        let premium = 10.0 * call_price(100.0, 110.0, 0.02, 0.5, 2.0 / 365.0).unwrap();
        assert_relative_eq!(series.final_value().unwrap(), 1_100.0 + premium, epsilon = 1e-9);
    }

    #[test]
    fn test_settles_at_early_expiry() {
        let strategy = CoveredCall {
            expiration_steps: Some(1),
            ..CoveredCall::default()
        };
        let path = PricePath::new(vec![100.0, 90.0, 150.0], 1.0 / 365.0);
        let series = strategy.evaluate(&path, 1_000.0).unwrap();

        let premium = 10.0 * call_price(100.0, 110.0, 0.02, 0.5, 1.0 / 365.0).unwrap();
        assert_relative_eq!(series.values()[1], 900.0 + premium, epsilon = 1e-9);
        assert_relative_eq!(series.values()[2], 1_100.0 + premium, epsilon = 1e-9);
    }

    #[test]
    fn test_prices_call_at_path_volatility() {
        let path = PricePath::new(vec![100.0; 31], DAY).with_volatility(0.8);
        let series = CoveredCall::default().evaluate(&path, 10_000.0).unwrap();

        let premium = 100.0 * call_price(100.0, 110.0, 0.02, 0.8, 30.0 * DAY).unwrap();
        assert_relative_eq!(series.final_value().unwrap(), 10_000.0 + premium, epsilon = 1e-9);

        let fixed = CoveredCall {
            implied_volatility: Some(0.3),
            ..CoveredCall::default()
        };
        assert_eq!(fixed.pricing_volatility(&path), 0.3);
        assert_eq!(CoveredCall::default().pricing_volatility(&path), 0.8);
    }

    #[test]
    fn test_flat_market_sells_worthless_call() {
        let path = PricePath::new(vec![100.0; 31], DAY).with_volatility(0.0);
        let series = CoveredCall::default().evaluate(&path, 10_000.0).unwrap();
        assert!(series.values().iter().all(|v| (*v - 10_000.0).abs() < 1e-9));
    }

    #[test]
    fn test_fractional_expiry_rejected() {
        let values: BTreeMap<String, f64> =
            [("expiration_steps".to_string(), 2.5)].into_iter().collect();
        let params = Parameters {
            strategy: "covered_call",
            values: &values,
        };
        assert!(CoveredCall::from_parameters(&params).is_err());
    }

    #[test]
    fn test_non_positive_volatility_rejected() {
        let check = ParameterCheck {
            strategy: "covered_call",
        };
        let strategy = CoveredCall {
            implied_volatility: Some(0.0),
            ..CoveredCall::default()
        };
        let error = strategy.validate(&check).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::InvalidParameter { ref parameter, .. } if parameter == "implied_volatility"
        ));
        assert!(CoveredCall::default().validate(&check).is_ok());
    }
}
