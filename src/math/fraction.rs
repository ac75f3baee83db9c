use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};

use alloy::primitives::U256;

use super::{fixed_string, mul_div_floor, narrow, ratio_decimal, significant_string, widen};
use crate::error::{DexError, DexResult};
use crate::math::amount::ExactAmount;
use crate::utils::constants::BIPS_BASE;

/// A non-negative exact ratio `numerator / denominator`.
///
/// Fractions are not reduced. Equality and ordering compare values by
/// cross-multiplication, so `1/2 == 2/4`.
#[derive(Clone, Copy)]
pub struct Fraction {
    /// Numerator
    numerator: U256,
    /// Denominator, never zero
    denominator: U256,
}

impl Fraction {
    /// Creates a new fraction.
    ///
    /// # Errors
    ///
    /// `DivisionByZero` if `denominator` is zero
    pub fn new(numerator: U256, denominator: U256) -> DexResult<Self> {
        if denominator.is_zero() {
            return Err(DexError::DivisionByZero);
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// A whole number `n / 1`
    #[must_use]
    pub const fn integer(n: U256) -> Self {
        Self {
            numerator: n,
            denominator: U256::from_limbs([1, 0, 0, 0]),
        }
    }

    /// Zero
    #[must_use]
    pub const fn zero() -> Self {
        Self::integer(U256::ZERO)
    }

    /// One
    #[must_use]
    pub const fn one() -> Self {
        Self::integer(U256::from_limbs([1, 0, 0, 0]))
    }

    /// `bps / 10_000`
    #[must_use]
    pub fn from_bps(bps: u64) -> Self {
        Self {
            numerator: U256::from(bps),
            denominator: U256::from(BIPS_BASE),
        }
    }

    /// The numerator
    #[must_use]
    pub const fn numerator(&self) -> U256 {
        self.numerator
    }

    /// The denominator
    #[must_use]
    pub const fn denominator(&self) -> U256 {
        self.denominator
    }

    /// Whether the value is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    /// `floor(numerator / denominator)`
    #[must_use]
    pub fn quotient(&self) -> U256 {
        self.numerator / self.denominator
    }

    /// What is left after taking the quotient out, as a fraction
    #[must_use]
    pub fn remainder(&self) -> Self {
        Self {
            numerator: self.numerator % self.denominator,
            denominator: self.denominator,
        }
    }

    /// `denominator / numerator`
    ///
    /// # Errors
    ///
    /// `DivisionByZero` if the fraction is zero
    pub fn invert(&self) -> DexResult<Self> {
        Self::new(self.denominator, self.numerator)
    }

    /// Sum of two fractions.
    ///
    /// # Errors
    ///
    /// `Overflow` if the common-denominator form does not fit 256 bits
    pub fn add(&self, other: &Self) -> DexResult<Self> {
        if self.denominator == other.denominator {
            let numerator = self
                .numerator
                .checked_add(other.numerator)
                .ok_or(DexError::Overflow)?;
            return Self::new(numerator, self.denominator);
        }
        let numerator = widen(self.numerator) * widen(other.denominator)
            + widen(other.numerator) * widen(self.denominator);
        let denominator = widen(self.denominator) * widen(other.denominator);
        Self::new(narrow(numerator)?, narrow(denominator)?)
    }

    /// Difference of two fractions.
    ///
    /// # Errors
    ///
    /// `Underflow` if `other` is larger, `Overflow` if the result does not fit
    pub fn subtract(&self, other: &Self) -> DexResult<Self> {
        if self < other {
            return Err(DexError::Underflow);
        }
        if self.denominator == other.denominator {
            return Self::new(self.numerator - other.numerator, self.denominator);
        }
        let numerator = widen(self.numerator) * widen(other.denominator)
            - widen(other.numerator) * widen(self.denominator);
        let denominator = widen(self.denominator) * widen(other.denominator);
        Self::new(narrow(numerator)?, narrow(denominator)?)
    }

    /// Product of two fractions.
    ///
    /// # Errors
    ///
    /// `Overflow` if either product does not fit 256 bits
    pub fn multiply(&self, other: &Self) -> DexResult<Self> {
        let numerator = narrow(widen(self.numerator) * widen(other.numerator))?;
        let denominator = narrow(widen(self.denominator) * widen(other.denominator))?;
        Self::new(numerator, denominator)
    }

    /// `floor(numerator * value / denominator)`
    ///
    /// # Errors
    ///
    /// `Overflow` if the result does not fit 256 bits
    pub fn multiply_raw(&self, value: U256) -> DexResult<U256> {
        mul_div_floor(self.numerator, value, self.denominator)
    }

    /// Scale an amount by this fraction, truncating toward zero.
    ///
    /// The result is never larger than the exact product, so a quantity computed this
    /// way is never more than what the chain will actually deliver.
    ///
    /// # Errors
    ///
    /// `Overflow` if the result does not fit 256 bits
    pub fn multiply_amount(&self, amount: &ExactAmount) -> DexResult<ExactAmount> {
        let raw = self.multiply_raw(amount.raw())?;
        Ok(ExactAmount::from_raw(amount.token().clone(), raw))
    }

    /// Display string with `digits` significant digits, rounded half up
    #[must_use]
    pub fn to_significant(&self, digits: u64) -> String {
        significant_string(&ratio_decimal(self.numerator, self.denominator), digits)
    }

    /// Display string with exactly `places` decimals, rounded half up
    #[must_use]
    pub fn to_fixed(&self, places: u8) -> String {
        fixed_string(&ratio_decimal(self.numerator, self.denominator), places)
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        (widen(self.numerator) * widen(other.denominator))
            .cmp(&(widen(other.numerator) * widen(self.denominator)))
    }
}

impl Debug for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_significant(6))
    }
}

/// A fraction displayed as a percentage (`1/4` shows as `25`)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percent(Fraction);

impl Percent {
    /// Creates a new percent from a raw ratio.
    ///
    /// # Errors
    ///
    /// `DivisionByZero` if `denominator` is zero
    pub fn new(numerator: U256, denominator: U256) -> DexResult<Self> {
        Fraction::new(numerator, denominator).map(Self)
    }

    /// `whole / 100`, the value typed on a percent slider
    #[must_use]
    pub fn from_whole(whole: u64) -> Self {
        Self(Fraction {
            numerator: U256::from(whole),
            denominator: U256::from(100),
        })
    }

    /// One percent
    #[must_use]
    pub fn one_percent() -> Self {
        Self::from_whole(1)
    }

    /// The underlying ratio (not multiplied by 100)
    #[must_use]
    pub const fn as_fraction(&self) -> &Fraction {
        &self.0
    }

    /// Display with `digits` significant digits, in percent units
    #[must_use]
    pub fn to_significant(&self, digits: u64) -> String {
        self.scaled().to_significant(digits)
    }

    /// Display with exactly `places` decimals, in percent units
    #[must_use]
    pub fn to_fixed(&self, places: u8) -> String {
        self.scaled().to_fixed(places)
    }

    /// The ratio times 100, for display only. Falls back to dividing the
    /// denominator when the numerator is too large to scale.
    fn scaled(&self) -> Fraction {
        let hundred = U256::from(100);
        match self.0.numerator.checked_mul(hundred) {
            Some(numerator) => Fraction {
                numerator,
                denominator: self.0.denominator,
            },
            None => Fraction {
                numerator: self.0.numerator,
                denominator: (self.0.denominator / hundred).max(U256::from(1)),
            },
        }
    }
}

impl From<Fraction> for Percent {
    fn from(fraction: Fraction) -> Self {
        Self(fraction)
    }
}

impl Debug for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}%", self.0)
    }
}

impl Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.to_significant(5))
    }
}
