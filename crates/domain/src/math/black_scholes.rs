//! Black-Scholes building blocks.

use crate::error::DomainError;

const SQRT_2PI: f64 = 2.506_628_274_631_000_7;

/// Standard normal cumulative distribution function.
#[must_use]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
}

/// Standard normal probability density function.
#[must_use]
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / SQRT_2PI
}

/// Returns `(d1, d2)` for spot `s`, strike `k`, rate `r`, volatility
/// `sigma` and time to expiry `t` in years.
///
/// # Errors
/// Returns an error for non-positive prices, volatility or expiry.
pub fn d1_d2(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> Result<(f64, f64), DomainError> {
    crate::math::constant_product::ensure_price(s)?;
    crate::math::constant_product::ensure_price(k)?;
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(DomainError::InvalidVolatility(sigma));
    }
    if !(t.is_finite() && t > 0.0) {
        return Err(DomainError::InvalidExpiry(t));
    }

    let vol_sqrt_t = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / vol_sqrt_t;
    Ok((d1, d1 - vol_sqrt_t))
}

/// European call price. At or past expiry (`t <= 0`) this is the intrinsic
/// value; with zero volatility it is the discounted forward payoff.
///
/// # Errors
/// Returns an error for invalid prices or volatility.
pub fn call_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> Result<f64, DomainError> {
    if t <= 0.0 {
        return Ok((s - k).max(0.0));
    }
    if sigma == 0.0 {
        crate::math::constant_product::ensure_price(s)?;
        crate::math::constant_product::ensure_price(k)?;
        return Ok((s - k * (-r * t).exp()).max(0.0));
    }
    let (d1, d2) = d1_d2(s, k, r, sigma, t)?;
    Ok(s * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_norm_cdf_symmetry() {
        assert_abs_diff_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-15);
        for x in [0.1, 0.5, 1.0, 2.5] {
            assert_abs_diff_eq!(norm_cdf(-x), 1.0 - norm_cdf(x), epsilon = 1e-15);
            assert_abs_diff_eq!(norm_pdf(-x), norm_pdf(x), epsilon = 1e-15);
        }
        assert_abs_diff_eq!(norm_cdf(1.96), 0.975, epsilon = 1e-4);
    }

    #[test]
    fn test_call_price_reference_value() {
        // S=100, K=100, r=5%, sigma=20%, T=1y -> 10.4506
        let price = call_price(100.0, 100.0, 0.05, 0.2, 1.0).unwrap();
        assert_abs_diff_eq!(price, 10.4506, epsilon = 1e-4);
    }

    #[test]
    fn test_call_price_at_expiry_is_intrinsic() {
        assert_abs_diff_eq!(call_price(120.0, 110.0, 0.02, 0.5, 0.0).unwrap(), 10.0);
        assert_abs_diff_eq!(call_price(90.0, 110.0, 0.02, 0.5, -1.0).unwrap(), 0.0);
    }

    #[test]
    fn test_call_price_without_volatility() {
        let t = 30.0 / 365.0;
        assert_eq!(call_price(100.0, 110.0, 0.02, 0.0, t).unwrap(), 0.0);
        assert_abs_diff_eq!(
            call_price(120.0, 110.0, 0.02, 0.0, t).unwrap(),
            120.0 - 110.0 * (-0.02 * t).exp(),
            epsilon = 1e-12
        );
        // Small volatility converges to the same value.
        assert_abs_diff_eq!(
            call_price(120.0, 110.0, 0.02, 1e-6, t).unwrap(),
            call_price(120.0, 110.0, 0.02, 0.0, t).unwrap(),
            epsilon = 1e-9
        );
        assert!(call_price(100.0, 110.0, 0.02, -0.1, t).is_err());
    }

    #[test]
    fn test_d1_d2_rejects_bad_inputs() {
        assert_eq!(
            d1_d2(100.0, 100.0, 0.0, 0.0, 1.0),
            Err(DomainError::InvalidVolatility(0.0))
        );
        assert_eq!(
            d1_d2(100.0, 100.0, 0.0, 0.2, 0.0),
            Err(DomainError::InvalidExpiry(0.0))
        );
    }
}
