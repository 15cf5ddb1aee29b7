//! Monte-Carlo strategy comparison.
//!
//! For every scenario the runner draws one price path per trial from a
//! single RNG, evaluates every strategy against that path and folds the
//! resulting series into per-(strategy, scenario) statistics. Paths are
//! dropped as soon as all strategies have seen them.

use crate::error::{ConfigError, EvaluationError};
use crate::performance::PerformanceSeries;
use crate::price_path::ScenarioPathGenerator;
use crate::scenario::MarketScenario;
use crate::strategies::StrategyDefinition;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Default initial asset price.
pub const DEFAULT_INITIAL_PRICE: f64 = 100.0;
/// Default capital allocated to each strategy.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 20_000.0;

/// Run-wide parameters shared by every scenario and strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSettings {
    /// Price at the start of every path.
    pub initial_price: f64,
    /// Capital each strategy starts with, in quote units.
    pub initial_capital: f64,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            initial_price: DEFAULT_INITIAL_PRICE,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
        }
    }
}

impl ComparisonSettings {
    /// Sets the initial price.
    #[must_use]
    pub fn with_initial_price(mut self, price: f64) -> Self {
        self.initial_price = price;
        self
    }

    /// Sets the initial capital.
    #[must_use]
    pub fn with_initial_capital(mut self, capital: f64) -> Self {
        self.initial_capital = capital;
        self
    }

    /// Checks that both values are positive and finite.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidInitialPrice`] or
    /// [`ConfigError::InvalidCapital`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_price.is_finite() && self.initial_price > 0.0) {
            return Err(ConfigError::InvalidInitialPrice(self.initial_price));
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::InvalidCapital(self.initial_capital));
        }
        Ok(())
    }
}

/// Aggregate metrics over the successful trials of one strategy in one
/// scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonStatistics {
    /// Mean final portfolio value.
    pub mean_final_value: f64,
    /// Population standard deviation of the final value.
    pub stddev_final_value: f64,
    /// Worst peak-to-trough decline across all trials, in [0, 1].
    pub max_drawdown: f64,
    /// Fraction of trials ending strictly above the initial capital.
    pub win_rate: f64,
    /// Mean simple return over the initial capital.
    pub mean_return: f64,
    /// Population standard deviation of the return.
    pub stddev_return: f64,
    /// Mean return over its standard deviation; 0 without dispersion.
    pub sharpe_ratio: f64,
    /// Mean return over the deviation of negative returns; 0 without
    /// downside.
    pub sortino_ratio: f64,
    /// Fraction of trials that were liquidated.
    pub liquidation_rate: f64,
    /// Mean portfolio value at each step.
    pub mean_series: Vec<f64>,
}

/// A trial whose evaluation failed and was excluded from the statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialFailure {
    /// Zero-based trial index within the scenario.
    pub trial: usize,
    /// Why the strategy could not be evaluated.
    pub error: EvaluationError,
}

/// Outcome for one (strategy, scenario) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub strategy_id: String,
    pub scenario: String,
    /// Trials requested.
    pub trials: usize,
    pub failures: Vec<TrialFailure>,
    /// `None` when every trial failed.
    pub statistics: Option<ComparisonStatistics>,
}

impl ComparisonResult {
    /// Number of trials that contributed to the statistics.
    #[must_use]
    pub fn successful_trials(&self) -> usize {
        self.trials - self.failures.len()
    }

    /// Number of trials that failed.
    #[must_use]
    pub fn failed_trials(&self) -> usize {
        self.failures.len()
    }
}

/// Results of a full comparison run, ordered scenario-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Trials per scenario.
    pub trials: usize,
    /// Seed used, if the run was seeded.
    pub seed: Option<u64>,
    pub settings: ComparisonSettings,
    pub results: Vec<ComparisonResult>,
}

impl ComparisonReport {
    /// Looks up the result for a strategy in a scenario.
    #[must_use]
    pub fn get(&self, strategy_id: &str, scenario: &str) -> Option<&ComparisonResult> {
        self.results
            .iter()
            .find(|r| r.strategy_id == strategy_id && r.scenario == scenario)
    }

    /// Results for one scenario, in strategy declaration order.
    pub fn for_scenario<'a>(
        &'a self,
        scenario: &'a str,
    ) -> impl Iterator<Item = &'a ComparisonResult> + 'a {
        self.results.iter().filter(move |r| r.scenario == scenario)
    }

    /// All results in output order.
    pub fn iter(&self) -> std::slice::Iter<'_, ComparisonResult> {
        self.results.iter()
    }
}

/// Runs comparisons with fixed settings.
#[derive(Debug, Clone, Default)]
pub struct ComparisonRunner {
    settings: ComparisonSettings,
}

impl ComparisonRunner {
    #[must_use]
    pub fn new(settings: ComparisonSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &ComparisonSettings {
        &self.settings
    }

    /// Runs the comparison with an RNG seeded from `seed`, or from the OS
    /// when no seed is given.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the settings, a scenario or the trial
    /// count is invalid, or if names are duplicated.
    pub fn run(
        &self,
        scenarios: &[MarketScenario],
        strategies: &[StrategyDefinition],
        trials: usize,
        seed: Option<u64>,
    ) -> Result<ComparisonReport, ConfigError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut report = self.run_with_rng(scenarios, strategies, trials, &mut rng)?;
        report.seed = seed;
        Ok(report)
    }

    /// Runs the comparison drawing all randomness from `rng`.
    ///
    /// # Errors
    /// See [`ComparisonRunner::run`].
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        scenarios: &[MarketScenario],
        strategies: &[StrategyDefinition],
        trials: usize,
        rng: &mut R,
    ) -> Result<ComparisonReport, ConfigError> {
        self.validate(scenarios, strategies, trials)?;
        let generator = ScenarioPathGenerator::new(self.settings.initial_price)?;
        let capital = self.settings.initial_capital;

        info!(
            scenarios = scenarios.len(),
            strategies = strategies.len(),
            trials,
            initial_price = self.settings.initial_price,
            initial_capital = capital,
            "Starting strategy comparison"
        );

        let mut results = Vec::with_capacity(scenarios.len() * strategies.len());
        for scenario in scenarios {
            debug!(
                scenario = %scenario.name,
                drift = scenario.drift,
                volatility = scenario.volatility,
                steps = scenario.steps,
                "Simulating scenario"
            );

            let mut accumulators: Vec<Accumulator> = strategies
                .iter()
                .map(|_| Accumulator::new(scenario.steps))
                .collect();

            for trial in 0..trials {
                let path = generator.generate_path(scenario, rng)?;
                for (strategy, accumulator) in strategies.iter().zip(accumulators.iter_mut()) {
                    match strategy.evaluate(&path, capital) {
                        Ok(series) => accumulator.record(&series, capital),
                        Err(error) => {
                            debug!(
                                strategy = %strategy.id,
                                scenario = %scenario.name,
                                trial,
                                %error,
                                "Trial failed"
                            );
                            accumulator.failures.push(TrialFailure { trial, error });
                        }
                    }
                }
            }

            for (strategy, accumulator) in strategies.iter().zip(accumulators) {
                let result = accumulator.finish(&strategy.id, &scenario.name, trials, capital);
                if result.statistics.is_none() {
                    warn!(
                        strategy = %result.strategy_id,
                        scenario = %result.scenario,
                        "Every trial failed"
                    );
                }
                results.push(result);
            }
        }

        info!(results = results.len(), "Strategy comparison finished");

        Ok(ComparisonReport {
            trials,
            seed: None,
            settings: self.settings,
            results,
        })
    }

    fn validate(
        &self,
        scenarios: &[MarketScenario],
        strategies: &[StrategyDefinition],
        trials: usize,
    ) -> Result<(), ConfigError> {
        self.settings.validate()?;
        if trials == 0 {
            return Err(ConfigError::ZeroTrials);
        }

        let mut names = HashSet::new();
        for scenario in scenarios {
            scenario.validate()?;
            if !names.insert(scenario.name.as_str()) {
                return Err(ConfigError::DuplicateScenario(scenario.name.clone()));
            }
        }

        let mut ids = HashSet::new();
        for strategy in strategies {
            strategy.validate()?;
            if !ids.insert(strategy.id.as_str()) {
                return Err(ConfigError::DuplicateStrategy(strategy.id.clone()));
            }
        }

        Ok(())
    }
}

/// Runs a comparison of `strategies` across `scenarios`.
///
/// # Errors
/// Returns a [`ConfigError`] for invalid configuration. Per-trial
/// evaluation failures are recorded in the report instead.
pub fn run_comparison(
    scenarios: &[MarketScenario],
    strategies: &[StrategyDefinition],
    trials: usize,
    seed: Option<u64>,
    settings: &ComparisonSettings,
) -> Result<ComparisonReport, ConfigError> {
    ComparisonRunner::new(*settings).run(scenarios, strategies, trials, seed)
}

/// Running totals for one strategy within one scenario.
struct Accumulator {
    final_values: Vec<f64>,
    series_sum: Vec<f64>,
    max_drawdown: f64,
    wins: usize,
    liquidations: usize,
    failures: Vec<TrialFailure>,
}

impl Accumulator {
    fn new(steps: usize) -> Self {
        Self {
            final_values: Vec::new(),
            series_sum: vec![0.0; steps],
            max_drawdown: 0.0,
            wins: 0,
            liquidations: 0,
            failures: Vec::new(),
        }
    }

    fn record(&mut self, series: &PerformanceSeries, capital: f64) {
        let Some(final_value) = series.final_value() else {
            return;
        };
        self.final_values.push(final_value);
        if final_value > capital {
            self.wins += 1;
        }
        if series.is_liquidated() {
            self.liquidations += 1;
        }
        self.max_drawdown = self.max_drawdown.max(series.max_drawdown());
        for (sum, value) in self.series_sum.iter_mut().zip(series.values()) {
            *sum += value;
        }
    }

    fn finish(
        self,
        strategy_id: &str,
        scenario: &str,
        trials: usize,
        capital: f64,
    ) -> ComparisonResult {
        let statistics = (!self.final_values.is_empty()).then(|| {
            let count = self.final_values.len() as f64;
            let returns: Vec<f64> = self
                .final_values
                .iter()
                .map(|value| (value - capital) / capital)
                .collect();
            let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();

            let (mean_final_value, stddev_final_value) = mean_and_stddev(&self.final_values);
            let (mean_return, stddev_return) = mean_and_stddev(&returns);
            let (_, downside_deviation) = mean_and_stddev(&downside);

            ComparisonStatistics {
                mean_final_value,
                stddev_final_value,
                max_drawdown: self.max_drawdown,
                win_rate: self.wins as f64 / count,
                mean_return,
                stddev_return,
                sharpe_ratio: ratio_or_zero(mean_return, stddev_return),
                sortino_ratio: ratio_or_zero(mean_return, downside_deviation),
                liquidation_rate: self.liquidations as f64 / count,
                mean_series: self.series_sum.iter().map(|sum| sum / count).collect(),
            }
        });

        ComparisonResult {
            strategy_id: strategy_id.to_string(),
            scenario: scenario.to_string(),
            trials,
            failures: self.failures,
            statistics,
        }
    }
}

/// Mean and population standard deviation; `(0, 0)` for no samples.
fn mean_and_stddev(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
