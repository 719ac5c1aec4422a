//! Fixed-point helpers over arbitrary-precision integers.
//!
//! All monetary quantities in the aggregates are integers scaled by 10^18.
//! Multiplication and division divide/multiply by 10^18 to keep the scale
//! constant. Integer division truncates toward zero, so callers must tolerate
//! up to one unit of truncation error per call.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use once_cell::sync::Lazy;

/// The fixed-point scale: 10^18.
pub static ONE_E18: Lazy<BigInt> = Lazy::new(|| BigInt::from(10u64.pow(18)));

static POW10_CACHE: Lazy<[BigInt; 37]> =
    Lazy::new(|| std::array::from_fn(|i| BigInt::from(10u32).pow(i as u32)));

/// Compute 10^exp as BigInt.
pub fn pow10(exp: u8) -> BigInt {
    if (exp as usize) < POW10_CACHE.len() {
        POW10_CACHE[exp as usize].clone()
    } else {
        BigInt::from(10u32).pow(exp as u32)
    }
}

/// Fixed-point multiply: `a * b / 1e18`.
pub fn mul_1e18(a: &BigInt, b: &BigInt) -> BigInt {
    (a * b) / &*ONE_E18
}

/// Fixed-point divide: `a * 1e18 / b`.
///
/// A zero divisor is a caller bug (fatal precondition violation), not a
/// recoverable error.
pub fn div_1e18(a: &BigInt, b: &BigInt) -> BigInt {
    assert!(!b.is_zero(), "div_1e18: division by zero");
    (a * &*ONE_E18) / b
}

/// Rescale a raw token amount with `decimals` decimal places to 1e18 scale:
/// `amount * 1e18 / 10^decimals`. A zero-decimals amount passes through
/// unchanged.
pub fn normalize_to_1e18(amount: &BigInt, decimals: u8) -> BigInt {
    if decimals == 0 {
        return amount.clone();
    }
    (amount * &*ONE_E18) / pow10(decimals)
}

/// Unsigned magnitude of `x`.
pub fn abs(x: &BigInt) -> BigInt {
    x.abs()
}

/// Convert a 1e18-scaled value to `f64` for display/logging.
///
/// Uses BigDecimal to avoid the precision loss of a direct cast for values
/// larger than 2^53. Returns 0.0 if the value does not fit a finite f64.
pub fn to_f64(x: &BigInt) -> f64 {
    let scaled = BigDecimal::from(x.clone()) / BigDecimal::from(ONE_E18.clone());
    match scaled.to_f64() {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn big(s: &str) -> BigInt {
        BigInt::from_str(s).unwrap()
    }

    #[test]
    fn mul_div_keep_scale() {
        // 2.0 * 3.0 = 6.0 at 1e18 scale
        let two = big("2000000000000000000");
        let three = big("3000000000000000000");
        assert_eq!(mul_1e18(&two, &three), big("6000000000000000000"));
        // 6.0 / 3.0 = 2.0
        assert_eq!(div_1e18(&big("6000000000000000000"), &three), two);
    }

    #[test]
    fn mul_truncates_toward_zero() {
        // 1 wei * 1 wei / 1e18 truncates to zero, including for negatives
        assert_eq!(mul_1e18(&BigInt::from(1), &BigInt::from(1)), BigInt::zero());
        assert_eq!(
            mul_1e18(&BigInt::from(-1), &BigInt::from(1)),
            BigInt::zero()
        );
    }

    #[test]
    #[should_panic(expected = "division by zero")]
    fn div_by_zero_is_fatal() {
        div_1e18(&BigInt::from(1), &BigInt::zero());
    }

    #[test]
    fn normalize_round_trips_within_truncation() {
        // 22000 USDC (6 decimals) -> 1e18 scale and back
        let raw = big("22000000000");
        let normalized = normalize_to_1e18(&raw, 6);
        assert_eq!(normalized, big("22000000000000000000000"));
        let back = (&normalized * pow10(6)) / &*ONE_E18;
        assert_eq!(back, raw);
    }

    #[test]
    fn normalize_zero_decimals_is_identity() {
        let raw = big("12345");
        assert_eq!(normalize_to_1e18(&raw, 0), raw);
    }

    #[test]
    fn normalize_18_decimals_is_identity() {
        let raw = big("11000000000000000000000");
        assert_eq!(normalize_to_1e18(&raw, 18), raw);
    }

    #[test]
    fn abs_magnitude() {
        assert_eq!(abs(&BigInt::from(-42)), BigInt::from(42));
        assert_eq!(abs(&BigInt::from(42)), BigInt::from(42));
    }

    #[test]
    fn to_f64_display() {
        assert_eq!(to_f64(&big("1500000000000000000")), 1.5);
        assert_eq!(to_f64(&BigInt::zero()), 0.0);
    }
}
