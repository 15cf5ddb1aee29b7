//! Market scenarios.
//!
//! A scenario is a named market regime: a drift and a volatility applied
//! over a fixed number of discrete steps, plus the stochastic model used to
//! turn those parameters into price paths.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// One day expressed in years.
pub const DAILY: f64 = 1.0 / 365.0;

/// Stochastic process used to generate prices for a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriceModel {
    /// Geometric Brownian motion with constant volatility.
    #[default]
    Gbm,
    /// Heston stochastic variance. The scenario volatility sets both the
    /// initial and the long-run variance (`volatility²`).
    Heston {
        /// Speed at which variance reverts to its long-run level.
        mean_reversion: f64,
        /// Volatility of the variance process.
        vol_of_vol: f64,
        /// Correlation between price and variance shocks.
        correlation: f64,
    },
}

impl PriceModel {
    /// Heston parameters typical for crypto assets: fast mean reversion and
    /// a strong leverage effect.
    #[must_use]
    pub fn heston() -> Self {
        Self::Heston {
            mean_reversion: 2.0,
            vol_of_vol: 0.5,
            correlation: -0.7,
        }
    }
}

/// A named market regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketScenario {
    /// Scenario identifier.
    pub name: String,
    /// Drift rate per unit of time.
    pub drift: f64,
    /// Volatility per square root unit of time.
    pub volatility: f64,
    /// Number of price samples in each path (including the initial price).
    pub steps: usize,
    /// Length of one step in units of time (defaults to one day of a year).
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    /// Price process.
    #[serde(default)]
    pub model: PriceModel,
}

fn default_time_step() -> f64 {
    DAILY
}

impl MarketScenario {
    /// Creates a GBM scenario with daily steps.
    #[must_use]
    pub fn new(name: impl Into<String>, drift: f64, volatility: f64, steps: usize) -> Self {
        Self {
            name: name.into(),
            drift,
            volatility,
            steps,
            time_step: DAILY,
            model: PriceModel::Gbm,
        }
    }

    /// Sets the step length.
    #[must_use]
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    /// Sets the price model.
    #[must_use]
    pub fn with_model(mut self, model: PriceModel) -> Self {
        self.model = model;
        self
    }

    /// Rising market: 10% drift, 20% volatility.
    #[must_use]
    pub fn bull(steps: usize) -> Self {
        Self::new("bull", 0.1, 0.2, steps)
    }

    /// Falling market: -10% drift, 40% volatility.
    #[must_use]
    pub fn bear(steps: usize) -> Self {
        Self::new("bear", -0.1, 0.4, steps)
    }

    /// Range-bound market: no drift, 10% volatility.
    #[must_use]
    pub fn sideways(steps: usize) -> Self {
        Self::new("sideways", 0.0, 0.1, steps)
    }

    /// Turbulent market: no drift, 80% volatility.
    #[must_use]
    pub fn volatile(steps: usize) -> Self {
        Self::new("volatile", 0.0, 0.8, steps)
    }

    /// Checks that the scenario can be simulated.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for zero steps, a non-finite drift, a
    /// negative or non-finite volatility, a non-positive time step or
    /// out-of-range Heston parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidScenario {
            scenario: self.name.clone(),
            reason,
        };

        if self.steps == 0 {
            return Err(ConfigError::ZeroSteps {
                scenario: self.name.clone(),
            });
        }
        if !self.drift.is_finite() {
            return Err(invalid(format!("drift must be finite, got {}", self.drift)));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(invalid(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(invalid(format!(
                "time step must be positive, got {}",
                self.time_step
            )));
        }

        if let PriceModel::Heston {
            mean_reversion,
            vol_of_vol,
            correlation,
        } = self.model
        {
            if !(mean_reversion.is_finite() && mean_reversion >= 0.0) {
                return Err(invalid(format!(
                    "mean reversion must be non-negative, got {mean_reversion}"
                )));
            }
            if !(vol_of_vol.is_finite() && vol_of_vol >= 0.0) {
                return Err(invalid(format!(
                    "vol of vol must be non-negative, got {vol_of_vol}"
                )));
            }
            if !(-1.0..=1.0).contains(&correlation) {
                return Err(invalid(format!(
                    "correlation must be within [-1, 1], got {correlation}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for scenario in [
            MarketScenario::bull(31),
            MarketScenario::bear(31),
            MarketScenario::sideways(31),
            MarketScenario::volatile(31).with_model(PriceModel::heston()),
        ] {
            assert!(scenario.validate().is_ok(), "{} invalid", scenario.name);
        }
    }

    #[test]
    fn test_zero_steps_rejected() {
        let scenario = MarketScenario::new("empty", 0.0, 0.1, 0);
        assert!(matches!(
            scenario.validate(),
            Err(ConfigError::ZeroSteps { scenario }) if scenario == "empty"
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let negative_vol = MarketScenario::new("x", 0.0, -0.1, 10);
        assert!(matches!(
            negative_vol.validate(),
            Err(ConfigError::InvalidScenario { .. })
        ));

        let nan_drift = MarketScenario::new("x", f64::NAN, 0.1, 10);
        assert!(nan_drift.validate().is_err());

        let zero_dt = MarketScenario::new("x", 0.0, 0.1, 10).with_time_step(0.0);
        assert!(zero_dt.validate().is_err());

        let bad_rho = MarketScenario::new("x", 0.0, 0.1, 10).with_model(PriceModel::Heston {
            mean_reversion: 2.0,
            vol_of_vol: 0.5,
            correlation: -1.5,
        });
        assert!(bad_rho.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"name": "flat", "drift": 0.0, "volatility": 0.0, "steps": 10}"#;
        let scenario: MarketScenario = serde_json::from_str(json).unwrap();

        assert_eq!(scenario, MarketScenario::new("flat", 0.0, 0.0, 10));
        assert_eq!(scenario.model, PriceModel::Gbm);
    }

    #[test]
    fn test_deserialize_heston_model() {
        let json = r#"{
            "name": "bear", "drift": -0.1, "volatility": 0.4, "steps": 31,
            "model": {
                "type": "heston", "mean_reversion": 2.0, "vol_of_vol": 0.5, "correlation": -0.7
            }
        }"#;
        let scenario: MarketScenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.model, PriceModel::heston());
    }
}
