//! Yield strategies evaluated against simulated price paths.
//!
//! Strategies are a closed set selected by a `kind` string. Each variant
//! owns its static parameters and maps a [`PricePath`] to a
//! [`PerformanceSeries`] with a pure function: no shared state, no side
//! effects, the path is only borrowed.

mod covered_call;
mod hold;
mod lending;
mod leveraged;
mod liquidity_provision;

pub use covered_call::CoveredCall;
pub use hold::HoldAndStake;
pub use lending::FixedRateLending;
pub use leveraged::LeveragedFarm;
pub use liquidity_provision::LiquidityProvision;

use crate::error::{ConfigError, EvaluationError};
use crate::performance::PerformanceSeries;
use crate::price_path::PricePath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const COST_PARAMETERS: &[&str] = &["entry_cost", "exit_cost"];

/// Supported strategy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Buy the asset and stake it.
    Hold,
    /// Provide liquidity to a constant-product pool.
    LiquidityProvision,
    /// Borrow against the asset to increase exposure and farm.
    Leveraged,
    /// Hold the asset and sell a call against it.
    CoveredCall,
    /// Deposit the capital at a fixed rate.
    Lending,
}

impl StrategyKind {
    /// All kinds, in documentation order.
    pub const ALL: [Self; 5] = [
        Self::Hold,
        Self::LiquidityProvision,
        Self::Leveraged,
        Self::CoveredCall,
        Self::Lending,
    ];

    /// Canonical configuration name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::LiquidityProvision => "liquidity_provision",
            Self::Leveraged => "leveraged",
            Self::CoveredCall => "covered_call",
            Self::Lending => "lending",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hold" => Ok(Self::Hold),
            "liquidity_provision" | "lp" => Ok(Self::LiquidityProvision),
            "leveraged" => Ok(Self::Leveraged),
            "covered_call" => Ok(Self::CoveredCall),
            "lending" => Ok(Self::Lending),
            other => Err(ConfigError::UnknownStrategyKind(other.to_string())),
        }
    }
}

/// The per-variant return model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "parameters", rename_all = "snake_case")]
pub enum StrategyModel {
    Hold(HoldAndStake),
    LiquidityProvision(LiquidityProvision),
    Leveraged(LeveragedFarm),
    CoveredCall(CoveredCall),
    Lending(FixedRateLending),
}

impl StrategyModel {
    /// The kind this model belongs to.
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Hold(_) => StrategyKind::Hold,
            Self::LiquidityProvision(_) => StrategyKind::LiquidityProvision,
            Self::Leveraged(_) => StrategyKind::Leveraged,
            Self::CoveredCall(_) => StrategyKind::CoveredCall,
            Self::Lending(_) => StrategyKind::Lending,
        }
    }

    /// Gross portfolio values before transaction costs.
    ///
    /// # Errors
    /// Returns an [`EvaluationError`] if a step cannot be valued.
    pub fn evaluate(
        &self,
        path: &PricePath,
        initial_capital: f64,
    ) -> Result<PerformanceSeries, EvaluationError> {
        match self {
            Self::Hold(model) => model.evaluate(path, initial_capital),
            Self::LiquidityProvision(model) => model.evaluate(path, initial_capital),
            Self::Leveraged(model) => model.evaluate(path, initial_capital),
            Self::CoveredCall(model) => model.evaluate(path, initial_capital),
            Self::Lending(model) => model.evaluate(path, initial_capital),
        }
    }

    /// Checks the model parameters, naming `strategy` in the error.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidParameter`] for the first parameter
    /// outside its range.
    pub fn validate(&self, strategy: &str) -> Result<(), ConfigError> {
        let check = ParameterCheck { strategy };
        match self {
            Self::Hold(model) => model.validate(&check),
            Self::LiquidityProvision(model) => model.validate(&check),
            Self::Leveraged(model) => model.validate(&check),
            Self::CoveredCall(model) => model.validate(&check),
            Self::Lending(model) => model.validate(&check),
        }
    }
}

/// Flat costs charged in quote units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TransactionCosts {
    /// Charged when the position is opened.
    pub entry_cost: f64,
    /// Charged when the position is closed at the end of the path.
    pub exit_cost: f64,
}

/// A fully validated strategy ready for evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyDefinition {
    /// Identifier used to key results.
    pub id: String,
    /// Return model.
    pub model: StrategyModel,
    /// Entry and exit costs.
    pub costs: TransactionCosts,
}

impl StrategyDefinition {
    /// Creates a definition without transaction costs.
    #[must_use]
    pub fn new(id: impl Into<String>, model: StrategyModel) -> Self {
        Self {
            id: id.into(),
            model,
            costs: TransactionCosts::default(),
        }
    }

    /// Sets the transaction costs.
    #[must_use]
    pub fn with_costs(mut self, entry_cost: f64, exit_cost: f64) -> Self {
        self.costs = TransactionCosts {
            entry_cost,
            exit_cost,
        };
        self
    }

    /// The strategy kind.
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        self.model.kind()
    }

    /// Checks the model parameters and the transaction costs. Definitions
    /// built from a [`StrategyConfig`] are already valid; hand-built ones
    /// are checked again before a run.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidParameter`] for the first value
    /// outside its range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate(&self.id)?;
        let check = ParameterCheck {
            strategy: &self.id,
        };
        check.non_negative("entry_cost", self.costs.entry_cost)?;
        check.non_negative("exit_cost", self.costs.exit_cost)
    }

    /// Evaluates the strategy on `path` starting with `initial_capital`.
    ///
    /// The entry cost is deducted from every step and the exit cost from the
    /// final step unless the position was liquidated. Values are floored at
    /// zero.
    ///
    /// # Errors
    /// Returns an [`EvaluationError`] if any step cannot be valued or the
    /// series does not match the path length.
    pub fn evaluate(
        &self,
        path: &PricePath,
        initial_capital: f64,
    ) -> Result<PerformanceSeries, EvaluationError> {
        let gross = self.model.evaluate(path, initial_capital)?;
        if gross.len() != path.len() {
            return Err(EvaluationError::LengthMismatch {
                expected: path.len(),
                actual: gross.len(),
            });
        }

        let last = gross.len().saturating_sub(1);
        let liquidated_at = gross.liquidated_at();
        let values = gross
            .values()
            .iter()
            .enumerate()
            .map(|(step, &value)| {
                let mut net = value - self.costs.entry_cost;
                if step == last && liquidated_at.is_none() {
                    net -= self.costs.exit_cost;
                }
                if net.is_finite() {
                    Ok(net.max(0.0))
                } else {
                    Err(EvaluationError::NonFiniteValue { step })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PerformanceSeries::new(values, liquidated_at))
    }
}

/// A strategy as written in configuration: a kind plus named parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Identifier; defaults to the kind name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Strategy kind name.
    pub kind: String,
    /// Named numeric parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

impl StrategyConfig {
    /// Creates a config with no parameters.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Identifier used for results.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.kind)
    }
}

impl TryFrom<&StrategyConfig> for StrategyDefinition {
    type Error = ConfigError;

    fn try_from(config: &StrategyConfig) -> Result<Self, Self::Error> {
        let kind: StrategyKind = config.kind.parse()?;
        let id = config.id.clone().unwrap_or_else(|| kind.to_string());
        let params = Parameters {
            strategy: &id,
            values: &config.parameters,
        };

        let model = match kind {
            StrategyKind::Hold => {
                params.ensure_known(HoldAndStake::PARAMETERS)?;
                StrategyModel::Hold(HoldAndStake::from_parameters(&params)?)
            }
            StrategyKind::LiquidityProvision => {
                params.ensure_known(LiquidityProvision::PARAMETERS)?;
                StrategyModel::LiquidityProvision(LiquidityProvision::from_parameters(&params)?)
            }
            StrategyKind::Leveraged => {
                params.ensure_known(LeveragedFarm::PARAMETERS)?;
                StrategyModel::Leveraged(LeveragedFarm::from_parameters(&params)?)
            }
            StrategyKind::CoveredCall => {
                params.ensure_known(CoveredCall::PARAMETERS)?;
                StrategyModel::CoveredCall(CoveredCall::from_parameters(&params)?)
            }
            StrategyKind::Lending => {
                params.ensure_known(FixedRateLending::PARAMETERS)?;
                StrategyModel::Lending(FixedRateLending::from_parameters(&params)?)
            }
        };

        let entry_cost = params.get("entry_cost", 0.0)?;
        let exit_cost = params.get("exit_cost", 0.0)?;

        let definition = StrategyDefinition::new(id, model).with_costs(entry_cost, exit_cost);
        definition.validate()?;
        Ok(definition)
    }
}

/// Read access to a strategy's named parameters.
pub(crate) struct Parameters<'a> {
    strategy: &'a str,
    values: &'a BTreeMap<String, f64>,
}

impl Parameters<'_> {
    fn ensure_known(&self, allowed: &[&str]) -> Result<(), ConfigError> {
        let unknown = self.values.keys().find(|name| {
            let name = name.as_str();
            !allowed.contains(&name) && !COST_PARAMETERS.contains(&name)
        });
        match unknown {
            Some(name) => Err(ConfigError::UnknownParameter {
                strategy: self.strategy.to_string(),
                parameter: name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn invalid(&self, parameter: &str, value: f64, reason: &'static str) -> ConfigError {
        ParameterCheck {
            strategy: self.strategy,
        }
        .invalid(parameter, value, reason)
    }

    /// A finite parameter or `None` when absent.
    pub(crate) fn optional(&self, name: &str) -> Result<Option<f64>, ConfigError> {
        match self.values.get(name) {
            Some(&value) if !value.is_finite() => Err(self.invalid(name, value, "must be finite")),
            Some(&value) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    /// A finite parameter, falling back to `default`.
    pub(crate) fn get(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        Ok(self.optional(name)?.unwrap_or(default))
    }
}

/// Range checks over a built model, reported against its strategy id.
pub(crate) struct ParameterCheck<'a> {
    strategy: &'a str,
}

impl ParameterCheck<'_> {
    pub(crate) fn invalid(&self, parameter: &str, value: f64, reason: &'static str) -> ConfigError {
        ConfigError::InvalidParameter {
            strategy: self.strategy.to_string(),
            parameter: parameter.to_string(),
            value,
            reason,
        }
    }

    pub(crate) fn ensure(
        &self,
        name: &str,
        value: f64,
        valid: bool,
        reason: &'static str,
    ) -> Result<(), ConfigError> {
        if !value.is_finite() {
            return Err(self.invalid(name, value, "must be finite"));
        }
        if !valid {
            return Err(self.invalid(name, value, reason));
        }
        Ok(())
    }

    pub(crate) fn finite(&self, name: &str, value: f64) -> Result<(), ConfigError> {
        self.ensure(name, value, true, "must be finite")
    }

    pub(crate) fn non_negative(&self, name: &str, value: f64) -> Result<(), ConfigError> {
        self.ensure(name, value, value >= 0.0, "must not be negative")
    }

    pub(crate) fn positive(&self, name: &str, value: f64) -> Result<(), ConfigError> {
        self.ensure(name, value, value > 0.0, "must be positive")
    }

    /// A rate that must stay above -100%.
    pub(crate) fn rate(&self, name: &str, value: f64) -> Result<(), ConfigError> {
        self.ensure(name, value, value > -1.0, "must be greater than -1")
    }
}

/// Rejects prices that cannot be valued.
pub(crate) fn check_price(step: usize, price: f64) -> Result<f64, EvaluationError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(EvaluationError::NonPositivePrice { step, price })
    }
}

/// Compound growth factor of an annual-style `rate` after `step` steps of
/// length `time_step`.
pub(crate) fn growth_factor(rate: f64, step: usize, time_step: f64) -> f64 {
    (1.0 + rate).powf(step as f64 * time_step)
}
