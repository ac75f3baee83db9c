//! # Exact Arithmetic
//!
//! Integer-exact quantities and ratios. Every on-chain value in this crate is a
//! `U256` magnitude; intermediate products are taken in 512 bits and narrowed back
//! with an explicit overflow check. Decimal text is produced here and nowhere else,
//! and it never flows back into a calculation.

/// Token-denominated quantities
pub mod amount;
/// Exact ratios and percents
pub mod fraction;

pub use amount::ExactAmount;
pub use fraction::{Fraction, Percent};

use std::num::NonZeroU64;
use std::str::FromStr;

use alloy::primitives::{U256, U512};
use bigdecimal::{BigDecimal, RoundingMode};

use crate::error::{DexError, DexResult};

/// Widen a 256-bit value to 512 bits
pub(crate) fn widen(value: U256) -> U512 {
    U512::from_limbs_slice(value.as_limbs())
}

/// Narrow a 512-bit value back to 256 bits, failing if the high half is set
pub(crate) fn narrow(value: U512) -> DexResult<U256> {
    let limbs = value.as_limbs();
    if limbs[4..].iter().any(|limb| *limb != 0) {
        return Err(DexError::Overflow);
    }
    Ok(U256::from_limbs_slice(&limbs[..4]))
}

/// `floor(a * b / denominator)` without intermediate overflow
///
/// # Errors
///
/// `DivisionByZero` for a zero denominator, `Overflow` if the quotient does not fit
pub fn mul_div_floor(a: U256, b: U256, denominator: U256) -> DexResult<U256> {
    if denominator.is_zero() {
        return Err(DexError::DivisionByZero);
    }
    narrow(widen(a) * widen(b) / widen(denominator))
}

/// Exact decimal for `magnitude / 10^decimals`
pub(crate) fn scaled_decimal(magnitude: U256, decimals: u8) -> BigDecimal {
    // `{m}e-{d}` parses to an exact BigDecimal with scale `d`
    BigDecimal::from_str(&format!("{magnitude}e-{decimals}")).unwrap_or_default()
}

/// Decimal for `numerator / denominator`, exact for terminating ratios
pub(crate) fn ratio_decimal(numerator: U256, denominator: U256) -> BigDecimal {
    let n = scaled_decimal(numerator, 0);
    let d = scaled_decimal(denominator, 0);
    if d == BigDecimal::from(0) {
        return BigDecimal::from(0);
    }
    n / d
}

/// Round to `digits` significant digits, half up, and render without exponent or
/// trailing zeros
pub(crate) fn significant_string(value: &BigDecimal, digits: u64) -> String {
    let digits = NonZeroU64::new(digits).unwrap_or(NonZeroU64::MIN);
    let rounded = value.with_precision_round(digits, RoundingMode::HalfUp);
    plain_string(&rounded, None)
}

/// Round to exactly `places` decimals, half up, keeping trailing zeros
pub(crate) fn fixed_string(value: &BigDecimal, places: u8) -> String {
    let rounded = value.with_scale_round(i64::from(places), RoundingMode::HalfUp);
    plain_string(&rounded, Some(places))
}

/// Render a non-negative decimal in positional notation.
///
/// With `keep` set the fractional part is padded/kept to that many places,
/// otherwise trailing zeros (and a dangling point) are stripped.
pub(crate) fn plain_string(value: &BigDecimal, keep: Option<u8>) -> String {
    let negative = *value < BigDecimal::from(0);
    let (digits, scale) = value.abs().as_bigint_and_exponent();
    let mut digits = digits.to_string();

    let rendered = if scale <= 0 {
        if digits != "0" {
            digits.extend(std::iter::repeat('0').take(scale.unsigned_abs() as usize));
        }
        match keep {
            Some(places) if places > 0 => format!("{digits}.{}", "0".repeat(places as usize)),
            _ => digits,
        }
    } else {
        let scale = scale.unsigned_abs() as usize;
        if digits.len() <= scale {
            digits = format!("{}{digits}", "0".repeat(scale - digits.len() + 1));
        }
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        let frac_part = match keep {
            Some(places) => {
                let mut frac = frac_part.to_string();
                frac.truncate(places as usize);
                while frac.len() < places as usize {
                    frac.push('0');
                }
                frac
            }
            None => frac_part.trim_end_matches('0').to_string(),
        };
        if frac_part.is_empty() {
            int_part.to_string()
        } else {
            format!("{int_part}.{frac_part}")
        }
    };

    if negative {
        format!("-{rendered}")
    } else {
        rendered
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_floor_survives_256_bit_products() {
        let big = U256::MAX / U256::from(2);
        // big * 4 overflows 256 bits, but the quotient fits
        assert_eq!(
            mul_div_floor(big, U256::from(4), U256::from(8)).unwrap(),
            big / U256::from(2)
        );
        assert_eq!(
            mul_div_floor(U256::MAX, U256::from(2), U256::from(1)),
            Err(DexError::Overflow)
        );
        assert_eq!(
            mul_div_floor(U256::from(1), U256::from(1), U256::ZERO),
            Err(DexError::DivisionByZero)
        );
    }

    #[test]
    fn test_plain_string() {
        for (raw, decimals, expected) in &[
            // magnitude,            decimals, rendered
            (1_500_000_000_000_000_000_u128, 18, "1.5"),
            (1, 18, "0.000000000000000001"),
            (0, 6, "0"),
            (1_000_000, 6, "1"),
            (123_456, 0, "123456"),
        ] {
            let value = scaled_decimal(U256::from(*raw), *decimals);
            assert_eq!(plain_string(&value, None), *expected);
        }
    }

    #[test]
    fn test_significant_and_fixed() {
        let value = ratio_decimal(U256::from(123_456), U256::from(1));
        assert_eq!(significant_string(&value, 3), "123000");

        let value = ratio_decimal(U256::from(1), U256::from(3));
        assert_eq!(significant_string(&value, 4), "0.3333");
        assert_eq!(fixed_string(&value, 2), "0.33");

        let value = ratio_decimal(U256::from(2), U256::from(3));
        assert_eq!(significant_string(&value, 2), "0.67");

        let value = ratio_decimal(U256::from(3), U256::from(2));
        assert_eq!(fixed_string(&value, 0), "2");
        assert_eq!(fixed_string(&value, 3), "1.500");
    }
}
