use crate::error::DomainError;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Decimals used by ETH and most ERC-20 tokens.
pub const WEI_DECIMALS: u8 = 18;

/// A raw on-chain integer amount together with its token decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount {
    pub raw: U256,
    pub decimals: u8,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// An 18-decimal amount, as returned by most contract calls.
    pub fn from_wei(raw: U256) -> Self {
        Self::new(raw, WEI_DECIMALS)
    }

    /// Parses a base-10 integer string of raw units.
    ///
    /// # Errors
    /// Returns [`DomainError::AmountOverflow`] if the string is not a valid
    /// unsigned integer that fits in 256 bits.
    pub fn parse_raw(raw: &str, decimals: u8) -> Result<Self, DomainError> {
        let raw = U256::from_dec_str(raw.trim())
            .map_err(|e| DomainError::AmountOverflow(format!("{raw}: {e:?}")))?;
        Ok(Self::new(raw, decimals))
    }

    /// Scales a token amount up to raw units.
    ///
    /// # Errors
    /// Returns [`DomainError::AmountOverflow`] for negative values or values
    /// that do not fit.
    pub fn from_decimal(d: Decimal, decimals: u8) -> Result<Self, DomainError> {
        let raw = 10u64
            .checked_pow(u32::from(decimals))
            .and_then(|multiplier| d.checked_mul(Decimal::from(multiplier)))
            .and_then(|raw| raw.trunc().to_u128())
            .ok_or_else(|| DomainError::AmountOverflow(d.to_string()))?;
        Ok(Self::new(U256::from(raw), decimals))
    }

    /// Converts raw units to a token amount without losing precision.
    ///
    /// # Errors
    /// Returns [`DomainError::AmountOverflow`] if the raw value exceeds the
    /// 96-bit decimal mantissa.
    pub fn to_decimal(&self) -> Result<Decimal, DomainError> {
        let overflow = || DomainError::AmountOverflow(self.raw.to_string());
        if self.raw > U256::from(i128::MAX as u128) {
            return Err(overflow());
        }
        Decimal::try_from_i128_with_scale(self.raw.as_u128() as i128, u32::from(self.decimals))
            .map_err(|_| overflow())
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wei_to_decimal() {
        let amount = Amount::parse_raw("12500000000000000000", WEI_DECIMALS).unwrap();
        assert_eq!(amount.to_decimal().unwrap(), dec!(12.5));
    }

    #[test]
    fn test_from_decimal_round_trip() {
        let amount = Amount::from_decimal(dec!(1234.5678), 6).unwrap();
        assert_eq!(amount.raw, U256::from(1_234_567_800u64));
        assert_eq!(amount.to_decimal().unwrap(), dec!(1234.5678));
    }

    #[test]
    fn test_overflow_is_reported() {
        let huge = Amount::from_wei(U256::MAX);
        assert!(matches!(huge.to_decimal(), Err(DomainError::AmountOverflow(_))));
        assert!(Amount::parse_raw("not a number", 18).is_err());
        assert!(Amount::from_decimal(dec!(-1), 18).is_err());
    }
}
