use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};

use alloy::primitives::U256;

use super::{fixed_string, mul_div_floor, scaled_decimal, significant_string, Fraction};
use crate::error::{DexError, DexResult};
use crate::models::token::Token;

/// A token quantity: a raw integer magnitude scaled by the token's decimals.
///
/// `1.5 USDC` is `ExactAmount { token: USDC, raw: 1_500_000 }`. The magnitude is never
/// negative and never a float. Arithmetic between two amounts requires the same token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ExactAmount {
    /// The token this amount is denominated in
    token: Token,
    /// Raw on-chain magnitude
    raw: U256,
}

impl ExactAmount {
    /// Creates an amount from its raw on-chain magnitude
    #[must_use]
    pub const fn from_raw(token: Token, raw: U256) -> Self {
        Self { token, raw }
    }

    /// A zero amount of `token`
    #[must_use]
    pub const fn zero(token: Token) -> Self {
        Self::from_raw(token, U256::ZERO)
    }

    /// Parses user-typed decimal text into an exact amount.
    ///
    /// Accepts digits with at most one `.`, e.g. `"12"`, `"0.5"`, `".5"`, `"3."`.
    ///
    /// # Returns
    ///
    /// `None` for empty text or a value of zero, which the UI treats as "no amount"
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for anything that is not a plain non-negative decimal, for more
    /// fractional digits than the token supports, or for a value beyond 256 bits
    pub fn parse(token: &Token, text: &str) -> DexResult<Option<Self>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let invalid = |why: &str| DexError::InvalidAmount(format!("{text:?} {why}"));

        let (int_part, frac_part) = match text.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (text, ""),
        };
        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) || (int_part.is_empty() && frac_part.is_empty()) {
            return Err(invalid("is not a decimal number"));
        }
        if frac_part.len() > usize::from(token.decimals()) {
            return Err(invalid(&format!(
                "has more than {} decimals for {}",
                token.decimals(),
                token.symbol()
            )));
        }

        let mut digits = String::with_capacity(int_part.len() + usize::from(token.decimals()));
        digits.push_str(int_part);
        digits.push_str(frac_part);
        digits.extend(std::iter::repeat('0').take(usize::from(token.decimals()) - frac_part.len()));
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(None);
        }

        let raw = U256::from_str_radix(digits, 10).map_err(|_| invalid("does not fit 256 bits"))?;
        Ok(Some(Self::from_raw(token.clone(), raw)))
    }

    /// The token
    #[must_use]
    pub const fn token(&self) -> &Token {
        &self.token
    }

    /// The raw magnitude
    #[must_use]
    pub const fn raw(&self) -> U256 {
        self.raw
    }

    /// Whether the magnitude is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// `10^decimals` of the token
    ///
    /// # Errors
    ///
    /// `Overflow` for tokens with more than 77 decimals
    fn scale(&self) -> DexResult<U256> {
        U256::from(10)
            .checked_pow(U256::from(self.token.decimals()))
            .ok_or(DexError::Overflow)
    }

    /// Fails unless both amounts are in the same token
    fn same_token(&self, other: &Self) -> DexResult<()> {
        if self.token == other.token {
            Ok(())
        } else {
            Err(DexError::TokenMismatch {
                left: format!("{:?}", self.token),
                right: format!("{:?}", other.token),
            })
        }
    }

    /// Sum.
    ///
    /// # Errors
    ///
    /// `TokenMismatch`, or `Overflow` past 256 bits
    pub fn add(&self, other: &Self) -> DexResult<Self> {
        self.same_token(other)?;
        let raw = self.raw.checked_add(other.raw).ok_or(DexError::Overflow)?;
        Ok(Self::from_raw(self.token.clone(), raw))
    }

    /// Difference.
    ///
    /// # Errors
    ///
    /// `TokenMismatch`, or `Underflow` if `other` is larger
    pub fn subtract(&self, other: &Self) -> DexResult<Self> {
        self.same_token(other)?;
        let raw = self.raw.checked_sub(other.raw).ok_or(DexError::Underflow)?;
        Ok(Self::from_raw(self.token.clone(), raw))
    }

    /// Absolute difference, for comparing two quotes regardless of order.
    ///
    /// # Errors
    ///
    /// `TokenMismatch`
    pub fn abs_diff(&self, other: &Self) -> DexResult<Self> {
        self.same_token(other)?;
        Ok(Self::from_raw(self.token.clone(), self.raw.abs_diff(other.raw)))
    }

    /// Fixed-point product: `floor(a * b / 10^decimals)`, so `1.5 * 2 = 3`.
    ///
    /// # Errors
    ///
    /// `TokenMismatch`, or `Overflow` past 256 bits
    pub fn multiply(&self, other: &Self) -> DexResult<Self> {
        self.same_token(other)?;
        let raw = mul_div_floor(self.raw, other.raw, self.scale()?)?;
        Ok(Self::from_raw(self.token.clone(), raw))
    }

    /// Fixed-point quotient: `floor(a * 10^decimals / b)`, so `3 / 2 = 1.5`.
    ///
    /// # Errors
    ///
    /// `TokenMismatch`, `DivisionByZero` for a zero divisor, or `Overflow`
    pub fn divide(&self, other: &Self) -> DexResult<Self> {
        self.same_token(other)?;
        if other.raw.is_zero() {
            return Err(DexError::DivisionByZero);
        }
        let raw = mul_div_floor(self.raw, self.scale()?, other.raw)?;
        Ok(Self::from_raw(self.token.clone(), raw))
    }

    /// `self / other` as an exact ratio.
    ///
    /// # Errors
    ///
    /// `TokenMismatch`, or `DivisionByZero` for a zero `other`
    pub fn ratio(&self, other: &Self) -> DexResult<Fraction> {
        self.same_token(other)?;
        Fraction::new(self.raw, other.raw)
    }

    /// Full-precision decimal text, trailing zeros stripped (`1.5`, not `1.500000`)
    #[must_use]
    pub fn to_exact(&self) -> String {
        super::plain_string(&self.decimal(), None)
    }

    /// Display text with `digits` significant digits, rounded half up
    #[must_use]
    pub fn to_significant(&self, digits: u64) -> String {
        significant_string(&self.decimal(), digits)
    }

    /// Display text with exactly `places` decimals, rounded half up
    #[must_use]
    pub fn to_fixed(&self, places: u8) -> String {
        fixed_string(&self.decimal(), places)
    }

    /// Exact decimal value, only ever used for rendering
    fn decimal(&self) -> bigdecimal::BigDecimal {
        scaled_decimal(self.raw, self.token.decimals())
    }
}

/// Amounts of different tokens are unordered.
impl PartialOrd for ExactAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.token == other.token).then(|| self.raw.cmp(&other.raw))
    }
}

impl Debug for ExactAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.to_exact(), self.token.symbol(), self.raw)
    }
}

impl Display for ExactAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_significant(6), self.token.symbol())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::test_helpers::{amount, token};

    #[test]
    fn test_parse() {
        let usdc = token("USDC", 6);
        for (text, expected) in &[
            // typed,        raw
            ("1", Some(1_000_000_u128)),
            ("1.5", Some(1_500_000)),
            (".25", Some(250_000)),
            ("3.", Some(3_000_000)),
            ("0.000001", Some(1)),
            ("  42 ", Some(42_000_000)),
            ("0", None),
            ("0.000", None),
            ("", None),
        ] {
            let parsed = ExactAmount::parse(&usdc, text).unwrap();
            assert_eq!(parsed.map(|a| a.raw()), expected.map(U256::from), "{text}");
        }
    }

    #[test]
    fn test_parse_rejects() {
        let usdc = token("USDC", 6);
        for text in &["0.0000001", "-1", "1e6", "1.2.3", "abc", ".", "1,5"] {
            assert!(
                matches!(ExactAmount::parse(&usdc, text), Err(DexError::InvalidAmount(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn test_fixed_point_multiply_and_divide() {
        let quick = token("QUICK", 18);
        let one_and_half = ExactAmount::parse(&quick, "1.5").unwrap().unwrap();
        let two = ExactAmount::parse(&quick, "2").unwrap().unwrap();

        assert_eq!(one_and_half.multiply(&two).unwrap().to_exact(), "3");
        assert_eq!(two.divide(&one_and_half).unwrap().to_significant(4), "1.333");
        assert_eq!(
            two.divide(&ExactAmount::zero(quick.clone())),
            Err(DexError::DivisionByZero)
        );
    }

    #[test]
    fn test_token_mismatch() {
        let usdc = token("USDC", 6);
        let dai = token("DAI", 18);
        let err = amount(&usdc, 1).add(&amount(&dai, 1)).unwrap_err();
        assert!(matches!(err, DexError::TokenMismatch { .. }));
        assert_eq!(amount(&usdc, 1).partial_cmp(&amount(&dai, 1)), None);
    }

    #[test]
    fn test_subtract_below_zero() {
        let usdc = token("USDC", 6);
        assert_eq!(
            amount(&usdc, 1).subtract(&amount(&usdc, 2)),
            Err(DexError::Underflow)
        );
    }

    #[test]
    fn test_display() {
        let usdc = token("USDC", 6);
        let value = amount(&usdc, 1_234_567_891);
        assert_eq!(value.to_exact(), "1234.567891");
        assert_eq!(value.to_significant(3), "1230");
        assert_eq!(value.to_fixed(2), "1234.57");
        assert_eq!(value.to_string(), "1234.57 USDC");
    }

    proptest! {
        #[test]
        fn prop_add_then_subtract_is_exact(a in 0u128..=u128::MAX, b in 0u128..=u128::MAX) {
            let quick = token("QUICK", 18);
            let a = amount(&quick, a);
            let b = amount(&quick, b);
            let sum = a.add(&b).unwrap();

            prop_assert_eq!(sum.subtract(&a).unwrap().raw(), b.raw());
            prop_assert_eq!(a.abs_diff(&sum).unwrap().raw(), b.raw());
        }
    }
}
