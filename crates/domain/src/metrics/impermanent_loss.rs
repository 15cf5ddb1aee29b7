use crate::error::DomainError;
use crate::math::constant_product::ensure_price;

/// Calculates Impermanent Loss for a constant product pool from the ratio
/// `current_price / entry_price`.
/// formula: 2 * sqrt(price_ratio) / (1 + price_ratio) - 1
///
/// # Returns
///
/// * `f64` - The impermanent loss as a non-positive fraction (e.g., -0.05 for 5% loss)
///
/// # Errors
///
/// Returns [`DomainError::InvalidPrice`] if the ratio is not positive.
pub fn il_from_price_ratio(price_ratio: f64) -> Result<f64, DomainError> {
    ensure_price(price_ratio)?;
    Ok(2.0 * price_ratio.sqrt() / (1.0 + price_ratio) - 1.0)
}

/// Calculates Impermanent Loss between an entry price and the current price.
///
/// # Errors
///
/// Returns [`DomainError::InvalidPrice`] if either price is not positive.
pub fn calculate_il_constant_product(
    entry_price: f64,
    current_price: f64,
) -> Result<f64, DomainError> {
    ensure_price(entry_price)?;
    ensure_price(current_price)?;
    il_from_price_ratio(current_price / entry_price)
}
