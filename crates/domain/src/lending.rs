//! Lending protocol positions.
//!
//! Snapshots of a Liquity-style account: a trove (collateralized debt
//! position), a stability pool deposit and a governance token stake. The
//! values are read elsewhere; this module only derives ratios from them.

use crate::error::DomainError;
use crate::value_objects::{Amount, Price};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// Minimum collateral ratio (110%) below which a trove can be liquidated.
pub const MINIMUM_COLLATERAL_RATIO: Decimal = Decimal::from_parts(110, 0, 0, false, 2);

/// Average block time assumed when converting days into blocks.
pub const SECONDS_PER_BLOCK: u64 = 15;

const SECONDS_PER_DAY: u64 = 86_400;
const DAYS_PER_YEAR: f64 = 365.0;

/// Trove status as stored on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TroveStatus {
    NonExistent,
    Active,
    ClosedByOwner,
    ClosedByLiquidation,
    ClosedByRedemption,
}

impl TroveStatus {
    /// Maps the contract's status code. Unknown codes map to `NonExistent`.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Active,
            2 => Self::ClosedByOwner,
            3 => Self::ClosedByLiquidation,
            4 => Self::ClosedByRedemption,
            _ => Self::NonExistent,
        }
    }
}

/// Raw trove state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TroveSnapshot {
    /// Outstanding debt in stablecoin units.
    pub debt: Amount,
    /// Locked collateral in ETH units.
    pub collateral: Amount,
    /// Trove status.
    pub status: TroveStatus,
}

/// Ratios derived from an active trove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TroveReport {
    /// Collateral in tokens.
    pub collateral: Decimal,
    /// Debt in tokens.
    pub debt: Decimal,
    /// Collateral value over debt; `None` when there is no debt.
    pub collateral_ratio: Option<Decimal>,
    /// Whether the ratio is below [`MINIMUM_COLLATERAL_RATIO`].
    pub liquidatable: bool,
}

impl TroveSnapshot {
    /// Creates a new snapshot.
    #[must_use]
    pub fn new(debt: Amount, collateral: Amount, status: TroveStatus) -> Self {
        Self {
            debt,
            collateral,
            status,
        }
    }

    /// Whether the trove is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == TroveStatus::Active
    }

    /// Collateral value divided by debt at `price`, or `None` without debt.
    ///
    /// # Errors
    /// Returns [`DomainError::AmountOverflow`] if an amount, the collateral
    /// value or the ratio does not fit into a decimal.
    pub fn collateral_ratio(&self, price: Price) -> Result<Option<Decimal>, DomainError> {
        let debt = self.debt.to_decimal()?;
        if debt.is_zero() {
            return Ok(None);
        }
        let collateral_value = price.value_of(self.collateral.to_decimal()?)?;
        collateral_value
            .checked_div(debt)
            .map(Some)
            .ok_or_else(|| DomainError::AmountOverflow(format!("{collateral_value} / {debt}")))
    }

    /// Builds a report for an active trove. Returns `None` for any other
    /// status.
    ///
    /// # Errors
    /// Returns an error if the collateral ratio cannot be computed.
    pub fn report(&self, price: Price) -> Result<Option<TroveReport>, DomainError> {
        if !self.is_active() {
            return Ok(None);
        }
        let collateral_ratio = self.collateral_ratio(price)?;
        Ok(Some(TroveReport {
            collateral: self.collateral.to_decimal()?,
            debt: self.debt.to_decimal()?,
            liquidatable: collateral_ratio.is_some_and(|cr| cr < MINIMUM_COLLATERAL_RATIO),
            collateral_ratio,
        }))
    }
}

/// Annualized return of a deposit that grew from `initial` to `current`
/// over `days`, in percent, assuming daily compounding.
///
/// Returns zero when the initial balance is zero.
///
/// # Errors
/// Returns [`DomainError::EmptyPeriod`] for a zero-day window and
/// [`DomainError::AmountOverflow`] if the growth or the APR is out of range.
pub fn deposit_apr(initial: Decimal, current: Decimal, days: u32) -> Result<Decimal, DomainError> {
    if days == 0 {
        return Err(DomainError::EmptyPeriod);
    }
    if initial.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let growth = current
        .checked_div(initial)
        .and_then(|growth| growth.to_f64())
        .ok_or_else(|| DomainError::AmountOverflow(format!("{current} / {initial}")))?;
    let daily_rate = growth.powf(1.0 / f64::from(days)) - 1.0;
    let apr = ((1.0 + daily_rate).powf(DAYS_PER_YEAR) - 1.0) * 100.0;

    Decimal::from_f64(apr).ok_or_else(|| DomainError::AmountOverflow(apr.to_string()))
}

/// Approximate number of blocks produced in `days`.
#[must_use]
pub fn blocks_for_days(days: u32) -> u64 {
    u64::from(days) * SECONDS_PER_DAY / SECONDS_PER_BLOCK
}

/// Block number roughly `days` before `current_block`, saturating at genesis.
#[must_use]
pub fn lookback_block(current_block: u64, days: u32) -> u64 {
    current_block.saturating_sub(blocks_for_days(days))
}

/// A staked token balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    /// Staked amount.
    pub amount: Amount,
    /// Market price of the staked token.
    pub price: Price,
}

impl StakePosition {
    /// Market value of the stake.
    ///
    /// # Errors
    /// Returns an error if the amount does not fit into a decimal.
    pub fn value(&self) -> Result<Decimal, DomainError> {
        self.price.value_of(self.amount.to_decimal()?)
    }
}
