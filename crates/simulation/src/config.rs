//! Comparison run configuration.
//!
//! A run is described by a JSON document:
//!
//! ```json
//! {
//!   "initial_price": 100.0,
//!   "initial_capital": 20000.0,
//!   "trials": 1000,
//!   "seed": 42,
//!   "scenarios": [{"name": "flat", "drift": 0.0, "volatility": 0.0, "steps": 10}],
//!   "strategies": [{"kind": "hold"}, {"kind": "lending", "parameters": {"apy": 0.04}}]
//! }
//! ```
//!
//! Every field is optional; missing fields take the values of
//! [`ComparisonConfig::default`].

use crate::error::ConfigError;
use crate::monte_carlo::{
    ComparisonReport, ComparisonRunner, ComparisonSettings, DEFAULT_INITIAL_CAPITAL,
    DEFAULT_INITIAL_PRICE,
};
use crate::scenario::{MarketScenario, PriceModel};
use crate::strategies::{StrategyConfig, StrategyDefinition};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Trials per scenario when none are configured.
pub const DEFAULT_TRIALS: usize = 10_000;
/// Daily steps simulated per path by the default scenarios.
pub const DEFAULT_DAYS: usize = 30;

/// Complete description of a comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub initial_price: f64,
    pub initial_capital: f64,
    pub trials: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub scenarios: Vec<MarketScenario>,
    pub strategies: Vec<StrategyConfig>,
}

impl Default for ComparisonConfig {
    /// Thirty days of Heston paths under four market regimes, comparing
    /// every strategy kind with typical gas costs.
    fn default() -> Self {
        let steps = DEFAULT_DAYS + 1;
        let scenarios = [
            MarketScenario::bull(steps),
            MarketScenario::bear(steps),
            MarketScenario::sideways(steps),
            MarketScenario::volatile(steps),
        ]
        .into_iter()
        .map(|scenario| scenario.with_model(PriceModel::heston()))
        .collect();

        let strategies = vec![
            StrategyConfig::new("hold"),
            StrategyConfig::new("liquidity_provision")
                .with_parameter("entry_cost", 50.0)
                .with_parameter("exit_cost", 50.0),
            StrategyConfig::new("leveraged"),
            StrategyConfig::new("covered_call")
                .with_parameter("entry_cost", 20.0)
                .with_parameter("exit_cost", 20.0),
            StrategyConfig::new("lending"),
        ];

        Self {
            initial_price: DEFAULT_INITIAL_PRICE,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            trials: DEFAULT_TRIALS,
            seed: None,
            scenarios,
            strategies,
        }
    }
}

impl ComparisonConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read or
    /// [`ConfigError::Parse`] if it is not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading comparison config");
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Overrides the trial count.
    #[must_use]
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Overrides the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run-wide settings.
    #[must_use]
    pub fn settings(&self) -> ComparisonSettings {
        ComparisonSettings::default()
            .with_initial_price(self.initial_price)
            .with_initial_capital(self.initial_capital)
    }

    /// Validated strategy definitions in declaration order.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for an unknown kind or an invalid or
    /// unknown parameter.
    pub fn strategy_definitions(&self) -> Result<Vec<StrategyDefinition>, ConfigError> {
        self.strategies.iter().map(StrategyDefinition::try_from).collect()
    }

    /// Runs the configured comparison.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if any part of the configuration is
    /// invalid.
    pub fn run(&self) -> Result<ComparisonReport, ConfigError> {
        let strategies = self.strategy_definitions()?;
        ComparisonRunner::new(self.settings()).run(
            &self.scenarios,
            &strategies,
            self.trials,
            self.seed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::StrategyKind;

    #[test]
    fn test_default_config_is_valid() {
        let config = ComparisonConfig::default();
        let definitions = config.strategy_definitions().unwrap();

        assert_eq!(config.scenarios.len(), 4);
        assert!(config.scenarios.iter().all(|s| s.steps == 31));
        assert_eq!(definitions.len(), 5);
        assert_eq!(definitions[1].kind(), StrategyKind::LiquidityProvision);
        assert_eq!(definitions[1].costs.exit_cost, 50.0);
        assert_eq!(definitions[3].costs.entry_cost, 20.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ComparisonConfig::from_json_str(r#"{"trials": 12, "seed": 9}"#).unwrap();
        assert_eq!(config.trials, 12);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.initial_capital, DEFAULT_INITIAL_CAPITAL);
        assert_eq!(config.scenarios, ComparisonConfig::default().scenarios);
    }

    #[test]
    fn test_run_from_json() {
        let json = r#"{
            "initial_capital": 1000.0,
            "trials": 5,
            "seed": 42,
            "scenarios": [{"name": "flat", "drift": 0.0, "volatility": 0.0, "steps": 10}],
            "strategies": [{"kind": "hold"}, {"kind": "lending", "id": "aave"}]
        }"#;
        let report = ComparisonConfig::from_json_str(json).unwrap().run().unwrap();

        assert_eq!(report.results.len(), 2);
        let hold = report.get("hold", "flat").unwrap().statistics.as_ref().unwrap();
        assert_eq!(hold.mean_final_value, 1_000.0);
        let aave = report.get("aave", "flat").unwrap().statistics.as_ref().unwrap();
        assert!(aave.mean_final_value > 1_000.0);
        assert_eq!(aave.win_rate, 1.0);
    }

    #[test]
    fn test_invalid_strategy_aborts_run() {
        let json = r#"{"trials": 1, "strategies": [{"kind": "yolo"}]}"#;
        let config = ComparisonConfig::from_json_str(json).unwrap();
        assert!(matches!(
            config.run(),
            Err(ConfigError::UnknownStrategyKind(kind)) if kind == "yolo"
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ComparisonConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ComparisonConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
