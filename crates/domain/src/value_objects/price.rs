use crate::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A quoted price in the numeraire (e.g. USD per ETH).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price {
    pub value: Decimal,
}

impl Price {
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Value of `amount` units at this price.
    ///
    /// # Errors
    /// Returns [`DomainError::AmountOverflow`] if the product does not fit
    /// into a decimal.
    pub fn value_of(&self, amount: Decimal) -> Result<Decimal, DomainError> {
        amount
            .checked_mul(self.value)
            .ok_or_else(|| DomainError::AmountOverflow(format!("{amount} * {}", self.value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_value_of() {
        assert_eq!(Price::new(dec!(1.5)).value_of(dec!(4)).unwrap(), dec!(6));
        assert!(matches!(
            Price::new(Decimal::MAX).value_of(dec!(2)),
            Err(DomainError::AmountOverflow(_))
        ));
    }
}
