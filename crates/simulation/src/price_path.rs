//! Synthetic price paths.
//!
//! Every path starts at the configured initial price and contains exactly
//! `steps` samples. Prices move by multiplicative log-normal shocks, so they
//! stay positive by construction; each sample is additionally clamped into
//! `[initial * PRICE_FLOOR_RATIO, initial * PRICE_CEILING_RATIO]` so that
//! floating point underflow or overflow can never yield zero or infinity.

use crate::error::ConfigError;
use crate::scenario::{MarketScenario, PriceModel};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::Serialize;

/// Lowest reachable price as a fraction of the initial price.
pub const PRICE_FLOOR_RATIO: f64 = 1e-9;
/// Highest reachable price as a multiple of the initial price.
pub const PRICE_CEILING_RATIO: f64 = 1e9;

/// An ordered sequence of prices, one per time step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePath {
    prices: Vec<f64>,
    time_step: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    volatility: Option<f64>,
}

impl PricePath {
    /// Wraps a price sequence sampled every `time_step` units of time.
    #[must_use]
    pub fn new(prices: Vec<f64>, time_step: f64) -> Self {
        Self {
            prices,
            time_step,
            volatility: None,
        }
    }

    /// Records the volatility the path was generated with.
    #[must_use]
    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = Some(volatility);
        self
    }

    /// The price samples.
    #[must_use]
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the path has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// First price of the path.
    #[must_use]
    pub fn initial_price(&self) -> Option<f64> {
        self.prices.first().copied()
    }

    /// Last price of the path.
    #[must_use]
    pub fn final_price(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    /// Length of one step in units of time.
    #[must_use]
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Volatility of the generating process, if known.
    #[must_use]
    pub fn volatility(&self) -> Option<f64> {
        self.volatility
    }
}

/// A stochastic price process.
pub trait PricePathGenerator {
    /// Generates `steps` samples starting at `initial_price`, drawing all
    /// randomness from `rng`.
    fn generate<R: Rng + ?Sized>(&self, initial_price: f64, steps: usize, rng: &mut R)
    -> PricePath;
}

/// Geometric Brownian motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricBrownianMotion {
    pub drift: f64,      // drift per unit of time (mu)
    pub volatility: f64, // volatility per sqrt unit of time (sigma)
    pub time_step: f64,  // step length (dt) e.g. 1/365 for daily
}

impl GeometricBrownianMotion {
    pub fn new(drift: f64, volatility: f64, time_step: f64) -> Self {
        Self {
            drift,
            volatility,
            time_step,
        }
    }
}

impl PricePathGenerator for GeometricBrownianMotion {
    fn generate<R: Rng + ?Sized>(
        &self,
        initial_price: f64,
        steps: usize,
        rng: &mut R,
    ) -> PricePath {
        let mut prices = Vec::with_capacity(steps);
        if steps == 0 {
            return PricePath::new(prices, self.time_step).with_volatility(self.volatility);
        }
        prices.push(initial_price);

        let dt = self.time_step;
        let drift_term = (self.drift - 0.5 * self.volatility.powi(2)) * dt;
        let vol_term = self.volatility * dt.sqrt();

        let mut current_price = initial_price;
        for _ in 1..steps {
            let z: f64 = StandardNormal.sample(rng);
            let next = current_price * (drift_term + vol_term * z).exp();
            current_price = clamp_price(next, initial_price);
            prices.push(current_price);
        }

        PricePath::new(prices, self.time_step).with_volatility(self.volatility)
    }
}

/// Heston stochastic volatility model with full truncation of negative
/// variance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HestonModel {
    pub drift: f64,
    pub initial_variance: f64,
    pub long_run_variance: f64,
    pub mean_reversion: f64,
    pub vol_of_vol: f64,
    pub correlation: f64,
    pub time_step: f64,
}

impl PricePathGenerator for HestonModel {
    fn generate<R: Rng + ?Sized>(
        &self,
        initial_price: f64,
        steps: usize,
        rng: &mut R,
    ) -> PricePath {
        let long_run_volatility = self.long_run_variance.sqrt();
        let mut prices = Vec::with_capacity(steps);
        if steps == 0 {
            return PricePath::new(prices, self.time_step).with_volatility(long_run_volatility);
        }
        prices.push(initial_price);

        let dt = self.time_step;
        let sqrt_dt = dt.sqrt();
        let orthogonal = (1.0 - self.correlation.powi(2)).max(0.0).sqrt();

        let mut variance = self.initial_variance;
        let mut current_price = initial_price;
        for _ in 1..steps {
            let z1: f64 = StandardNormal.sample(rng);
            let z2: f64 = StandardNormal.sample(rng);
            let dw_variance = z1 * sqrt_dt;
            let dw_price = self.correlation * dw_variance + orthogonal * z2 * sqrt_dt;

            let vol = variance.sqrt();
            let log_return = (self.drift - 0.5 * variance) * dt + vol * dw_price;
            current_price = clamp_price(current_price * log_return.exp(), initial_price);
            prices.push(current_price);

            variance = (variance
                + self.mean_reversion * (self.long_run_variance - variance) * dt
                + self.vol_of_vol * vol * dw_variance)
                .max(0.0);
        }

        PricePath::new(prices, self.time_step).with_volatility(long_run_volatility)
    }
}

fn clamp_price(price: f64, initial_price: f64) -> f64 {
    let floor = initial_price * PRICE_FLOOR_RATIO;
    let ceiling = initial_price * PRICE_CEILING_RATIO;
    if price.is_nan() {
        return floor;
    }
    price.clamp(floor, ceiling)
}

/// Generates price paths for market scenarios from a fixed initial price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioPathGenerator {
    initial_price: f64,
}

impl ScenarioPathGenerator {
    /// Creates a generator starting every path at `initial_price`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidInitialPrice`] if the price is not
    /// positive and finite.
    pub fn new(initial_price: f64) -> Result<Self, ConfigError> {
        if !(initial_price.is_finite() && initial_price > 0.0) {
            return Err(ConfigError::InvalidInitialPrice(initial_price));
        }
        Ok(Self { initial_price })
    }

    /// The price every path starts at.
    #[must_use]
    pub fn initial_price(&self) -> f64 {
        self.initial_price
    }

    /// Generates one path per trial.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for an invalid scenario or a zero trial
    /// count.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        scenario: &MarketScenario,
        trials: usize,
        rng: &mut R,
    ) -> Result<Vec<PricePath>, ConfigError> {
        if trials == 0 {
            return Err(ConfigError::ZeroTrials);
        }
        (0..trials)
            .map(|_| self.generate_path(scenario, rng))
            .collect()
    }

    /// Generates a single path for `scenario`.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the scenario is invalid.
    pub fn generate_path<R: Rng + ?Sized>(
        &self,
        scenario: &MarketScenario,
        rng: &mut R,
    ) -> Result<PricePath, ConfigError> {
        scenario.validate()?;

        let path = match scenario.model {
            PriceModel::Gbm => GeometricBrownianMotion::new(
                scenario.drift,
                scenario.volatility,
                scenario.time_step,
            )
            .generate(self.initial_price, scenario.steps, rng),
            PriceModel::Heston {
                mean_reversion,
                vol_of_vol,
                correlation,
            } => {
                let variance = scenario.volatility.powi(2);
                HestonModel {
                    drift: scenario.drift,
                    initial_variance: variance,
                    long_run_variance: variance,
                    mean_reversion,
                    vol_of_vol,
                    correlation,
                    time_step: scenario.time_step,
                }
                .generate(self.initial_price, scenario.steps, rng)
            }
        };

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_gbm_generation() {
        let gbm = GeometricBrownianMotion::new(0.0, 0.2, 1.0 / 365.0);
        let mut rng = StdRng::seed_from_u64(7);
        let path = gbm.generate(100.0, 10, &mut rng);

        assert_eq!(path.len(), 10);
        assert_eq!(path.initial_price(), Some(100.0));

        // 0.2 volatility moves every sample.
        let all_same = path.prices().iter().all(|p| *p == 100.0);
        assert!(!all_same);
        assert_eq!(path.volatility(), Some(0.2));
    }

    #[test]
    fn test_paths_carry_scenario_volatility() {
        let generator = ScenarioPathGenerator::new(100.0).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let gbm = MarketScenario::new("gbm", 0.1, 0.35, 5);
        let path = generator.generate_path(&gbm, &mut rng).unwrap();
        assert_eq!(path.volatility(), Some(0.35));

        let heston = gbm.with_model(PriceModel::heston());
        let path = generator.generate_path(&heston, &mut rng).unwrap();
        assert!((path.volatility().unwrap() - 0.35).abs() < 1e-12);

        assert_eq!(PricePath::new(vec![1.0], 1.0).volatility(), None);
    }

    #[test]
    fn test_zero_volatility_path_is_flat() {
        let generator = ScenarioPathGenerator::new(100.0).unwrap();
        let scenario = MarketScenario::new("flat", 0.0, 0.0, 10);
        let mut rng = StdRng::seed_from_u64(42);

        for path in generator.generate(&scenario, 5, &mut rng).unwrap() {
            assert_eq!(path.prices(), &[100.0; 10]);
        }

        let heston = scenario.with_model(PriceModel::heston());
        let path = generator.generate_path(&heston, &mut rng).unwrap();
        assert_eq!(path.prices(), &[100.0; 10]);
    }

    #[test]
    fn test_single_step_path_is_initial_price() {
        let generator = ScenarioPathGenerator::new(50.0).unwrap();
        let scenario = MarketScenario::volatile(1);
        let mut rng = StdRng::seed_from_u64(1);

        let path = generator.generate_path(&scenario, &mut rng).unwrap();
        assert_eq!(path.prices(), &[50.0]);
    }

    #[test]
    fn test_same_seed_same_paths() {
        let generator = ScenarioPathGenerator::new(100.0).unwrap();
        let scenario = MarketScenario::bear(31).with_model(PriceModel::heston());

        let a = generator
            .generate(&scenario, 3, &mut StdRng::seed_from_u64(99))
            .unwrap();
        let b = generator
            .generate(&scenario, 3, &mut StdRng::seed_from_u64(99))
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);
    }

    #[test]
    fn test_extreme_volatility_stays_positive_and_finite() {
        let generator = ScenarioPathGenerator::new(1.0).unwrap();
        let scenario = MarketScenario::new("crash", -50.0, 40.0, 500).with_time_step(1.0);
        let mut rng = StdRng::seed_from_u64(3);

        let path = generator.generate_path(&scenario, &mut rng).unwrap();
        assert!(path.prices().iter().all(|p| p.is_finite() && *p > 0.0));
        assert!(path.prices().iter().all(|p| *p >= PRICE_FLOOR_RATIO));
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(matches!(
            ScenarioPathGenerator::new(0.0),
            Err(ConfigError::InvalidInitialPrice(_))
        ));
        assert!(ScenarioPathGenerator::new(f64::INFINITY).is_err());

        let generator = ScenarioPathGenerator::new(100.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            generator.generate(&MarketScenario::bull(10), 0, &mut rng),
            Err(ConfigError::ZeroTrials)
        ));
        assert!(matches!(
            generator.generate(&MarketScenario::bull(0), 1, &mut rng),
            Err(ConfigError::ZeroSteps { .. })
        ));
    }
}
