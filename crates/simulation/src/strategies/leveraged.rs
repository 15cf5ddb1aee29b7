//! Leveraged yield farming.
//!
//! Borrow against the asset, buy more of it and farm the whole stack. The
//! position is opened at `collateral_ratio`: with capital `C` the debt is
//! `C / (cr - 1)` so that collateral / debt equals `cr` at entry. Once the
//! price touches the liquidation threshold the position is closed with a
//! penalty and the residual equity is held flat.

use super::{ParameterCheck, Parameters, check_price};
use crate::error::{ConfigError, EvaluationError};
use crate::performance::PerformanceSeries;
use crate::price_path::PricePath;
use serde::Serialize;

const DEFAULT_COLLATERAL_RATIO: f64 = 2.0;
const DEFAULT_BORROW_RATE: f64 = 0.05;
const DEFAULT_MIN_COLLATERAL_RATIO: f64 = 1.1;
const DEFAULT_LIQUIDATION_PENALTY: f64 = 0.1;

/// Leveraged long with debt accrual and price-triggered liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeveragedFarm {
    /// Collateral value over debt at entry; must exceed 1.
    pub collateral_ratio: f64,
    /// Borrow interest per unit of time.
    pub borrow_rate: f64,
    /// Farming yield per unit of time, paid in the asset.
    pub farm_apy: f64,
    /// Liquidation price. `None` derives it from `min_collateral_ratio`.
    pub liquidation_threshold: Option<f64>,
    /// Collateral ratio below which the position is liquidated.
    pub min_collateral_ratio: f64,
    /// Fraction of the debt lost to liquidators.
    pub liquidation_penalty: f64,
}

impl Default for LeveragedFarm {
    fn default() -> Self {
        Self {
            collateral_ratio: DEFAULT_COLLATERAL_RATIO,
            borrow_rate: DEFAULT_BORROW_RATE,
            farm_apy: 0.0,
            liquidation_threshold: None,
            min_collateral_ratio: DEFAULT_MIN_COLLATERAL_RATIO,
            liquidation_penalty: DEFAULT_LIQUIDATION_PENALTY,
        }
    }
}

impl LeveragedFarm {
    pub(crate) const PARAMETERS: &'static [&'static str] = &[
        "collateral_ratio",
        "borrow_rate",
        "farm_apy",
        "liquidation_threshold",
        "min_collateral_ratio",
        "liquidation_penalty",
    ];

    /// Sets an explicit liquidation price.
    #[must_use]
    pub fn with_liquidation_threshold(mut self, price: f64) -> Self {
        self.liquidation_threshold = Some(price);
        self
    }

    pub(crate) fn from_parameters(params: &Parameters<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            collateral_ratio: params.get("collateral_ratio", DEFAULT_COLLATERAL_RATIO)?,
            borrow_rate: params.get("borrow_rate", DEFAULT_BORROW_RATE)?,
            farm_apy: params.get("farm_apy", 0.0)?,
            liquidation_threshold: params.optional("liquidation_threshold")?,
            min_collateral_ratio: params.get("min_collateral_ratio", DEFAULT_MIN_COLLATERAL_RATIO)?,
            liquidation_penalty: params.get("liquidation_penalty", DEFAULT_LIQUIDATION_PENALTY)?,
        })
    }

    pub(crate) fn validate(&self, check: &ParameterCheck<'_>) -> Result<(), ConfigError> {
        let cr = self.collateral_ratio;
        check.ensure("collateral_ratio", cr, cr > 1.0, "must be greater than 1")?;
        check.non_negative("borrow_rate", self.borrow_rate)?;
        check.rate("farm_apy", self.farm_apy)?;
        if let Some(price) = self.liquidation_threshold {
            check.non_negative("liquidation_threshold", price)?;
        }
        check.positive("min_collateral_ratio", self.min_collateral_ratio)?;
        check.non_negative("liquidation_penalty", self.liquidation_penalty)
    }

    /// Equity at every step, or the post-liquidation residual.
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

        let initial_debt = initial_capital / (self.collateral_ratio - 1.0);
        let initial_units = (initial_capital + initial_debt) / p0;
        let threshold = self.liquidation_threshold.unwrap_or_else(|| {
            if initial_units > 0.0 {
                self.min_collateral_ratio * initial_debt / initial_units
            } else {
                0.0
            }
        });

        let debt_growth = 1.0 + self.borrow_rate * dt;
        let unit_growth = 1.0 + self.farm_apy * dt;

        let mut values = Vec::with_capacity(path.len());
        let mut debt = initial_debt;
        let mut units = initial_units;
        let mut liquidated_at = None;

        for (step, &price) in path.prices().iter().enumerate() {
            let price = check_price(step, price)?;
            if step > 0 {
                debt *= debt_growth;
                units *= unit_growth;
            }

            if price <= threshold {
                let residual = (units * price - debt * (1.0 + self.liquidation_penalty)).max(0.0);
                liquidated_at = Some(step);
                values.resize(path.len(), residual);
                break;
            }

            values.push(units * price - debt);
        }

        Ok(PerformanceSeries::new(values, liquidated_at))
    }
}
