use alloy::primitives::U256;

use super::position::{redeemable, side_of, PoolPosition};
use crate::error::{DexError, DexResult};
use crate::math::{mul_div_floor, ExactAmount, Fraction, Percent};
use crate::models::{Currency, PoolSnapshot, Token};
use crate::utils::constants::{BIPS_BASE, DEFAULT_SLIPPAGE_BPS};

/// Which field of the remove-liquidity form the user typed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The percent slider
    Percent,
    /// LP tokens to burn
    Liquidity,
    /// Amount of the first selected currency to receive
    CurrencyA,
    /// Amount of the second selected currency to receive
    CurrencyB,
}

/// The one independent input; the other three fields are derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawInput {
    /// Share of the LP balance, in `(0, 100]` percent
    Percent(Percent),
    /// LP tokens to burn
    Liquidity(ExactAmount),
    /// Desired amount of the first currency
    CurrencyA(ExactAmount),
    /// Desired amount of the second currency
    CurrencyB(ExactAmount),
}

impl WithdrawInput {
    /// Turn typed text into an input.
    ///
    /// Percent text must be a whole number, as produced by the slider. Amount text
    /// is parsed against the token of its field.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for unparseable text, or for an empty or zero value
    pub fn parse(
        field: Field,
        typed: &str,
        liquidity_token: &Token,
        token_a: &Token,
        token_b: &Token,
    ) -> DexResult<Self> {
        let enter_amount = || DexError::InvalidAmount("Enter an amount".to_string());
        match field {
            Field::Percent => {
                let whole: u64 = typed
                    .trim()
                    .parse()
                    .map_err(|_| DexError::InvalidAmount(format!("{typed:?} is not a whole percent")))?;
                if whole == 0 {
                    return Err(enter_amount());
                }
                Ok(Self::Percent(Percent::from_whole(whole)))
            }
            Field::Liquidity => ExactAmount::parse(liquidity_token, typed)?
                .map(Self::Liquidity)
                .ok_or_else(enter_amount),
            Field::CurrencyA => ExactAmount::parse(token_a, typed)?
                .map(Self::CurrencyA)
                .ok_or_else(enter_amount),
            Field::CurrencyB => ExactAmount::parse(token_b, typed)?
                .map(Self::CurrencyB)
                .ok_or_else(enter_amount),
        }
    }
}

/// Everything the remove-liquidity view shows and the router call needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalQuote {
    /// Share of the LP balance being removed
    pub percent: Percent,
    /// LP tokens burned
    pub liquidity: ExactAmount,
    /// token0 received
    pub amount0: ExactAmount,
    /// token1 received
    pub amount1: ExactAmount,
    /// Least token0 accepted after slippage
    pub minimum0: ExactAmount,
    /// Least token1 accepted after slippage
    pub minimum1: ExactAmount,
    /// The full position before removal
    pub position: PoolPosition,
}

impl WithdrawalQuote {
    /// Percent for display: `"0"`, `"<1"` or a whole number
    #[must_use]
    pub fn display_percent(&self) -> String {
        if self.percent.as_fraction().is_zero() {
            "0".to_string()
        } else if self.percent < Percent::one_percent() {
            "<1".to_string()
        } else {
            self.percent.to_fixed(0)
        }
    }

    /// Amount of `token` received
    ///
    /// # Errors
    ///
    /// `TokenMismatch` if `token` is not in the pool
    pub fn amount_of(&self, token: &Token) -> DexResult<&ExactAmount> {
        side_of(token, &self.amount0, &self.amount1)
    }

    /// Minimum of `token` accepted
    ///
    /// # Errors
    ///
    /// `TokenMismatch` if `token` is not in the pool
    pub fn minimum_of(&self, token: &Token) -> DexResult<&ExactAmount> {
        side_of(token, &self.minimum0, &self.minimum1)
    }

    /// `Remove 1.23 MATIC and 4.56 USDC`, in the order the user picked the currencies
    ///
    /// # Errors
    ///
    /// `TokenMismatch` if a currency is not in the pool, `MissingDependency` if the
    /// chain has no wrapped native token
    pub fn summary(&self, currency_a: &Currency, currency_b: &Currency) -> DexResult<String> {
        let chain_id = self.liquidity.token().chain_id();
        let amount_a = self.amount_of(&currency_a.wrapped(chain_id)?)?;
        let amount_b = self.amount_of(&currency_b.wrapped(chain_id)?)?;
        Ok(format!(
            "Remove {} {} and {} {}",
            amount_a.to_significant(3),
            currency_a.symbol(chain_id),
            amount_b.to_significant(3),
            currency_b.symbol(chain_id)
        ))
    }
}

/// Least acceptable output for `amount` under a slippage tolerance:
/// `floor(amount * (10000 - bps) / 10000)`.
///
/// # Errors
///
/// `InvalidAmount` if `bps` is above 10000
pub fn minimum_out(amount: &ExactAmount, slippage_bps: u64) -> DexResult<ExactAmount> {
    let keep = BIPS_BASE
        .checked_sub(slippage_bps)
        .ok_or_else(|| DexError::InvalidAmount(format!("slippage of {slippage_bps} bps is above 100%")))?;
    let raw = mul_div_floor(amount.raw(), U256::from(keep), U256::from(BIPS_BASE))?;
    Ok(ExactAmount::from_raw(amount.token().clone(), raw))
}

/// Derives a withdrawal quote from whichever field the user typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalCalculator {
    /// Slippage tolerance in basis points
    slippage_bps: u64,
}

impl Default for WithdrawalCalculator {
    fn default() -> Self {
        Self {
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl WithdrawalCalculator {
    /// Creates a calculator with the given slippage tolerance.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `slippage_bps` is above 10000
    pub fn new(slippage_bps: u64) -> DexResult<Self> {
        if slippage_bps > BIPS_BASE {
            return Err(DexError::InvalidAmount(format!(
                "slippage of {slippage_bps} bps is above 100%"
            )));
        }
        Ok(Self { slippage_bps })
    }

    /// Slippage tolerance in basis points
    #[must_use]
    pub const fn slippage_bps(&self) -> u64 {
        self.slippage_bps
    }

    /// Quote a withdrawal of `input` from `lp_balance` in `pool`.
    ///
    /// # Errors
    ///
    /// * `EmptyPool` when the pool has no LP supply
    /// * `InvalidAmount` for a zero input
    /// * `InsufficientBalance` when the input exceeds what the user holds
    /// * `TokenMismatch` when the input is in a token foreign to the pool
    /// * `InvalidFeed` when the balance exceeds the total supply
    pub fn quote(
        &self,
        pool: &PoolSnapshot,
        lp_balance: &ExactAmount,
        input: &WithdrawInput,
    ) -> DexResult<WithdrawalQuote> {
        let position = PoolPosition::new(pool, lp_balance)?;
        let percent = percent_to_remove(&position, input)?;

        let liquidity = if *percent.as_fraction() == Fraction::one() {
            lp_balance.clone()
        } else {
            percent.as_fraction().multiply_amount(lp_balance)?
        };

        let total = pool.total_supply().raw();
        let amount0 = redeemable(pool.reserve0(), &liquidity, total)?;
        let amount1 = redeemable(pool.reserve1(), &liquidity, total)?;
        let minimum0 = minimum_out(&amount0, self.slippage_bps)?;
        let minimum1 = minimum_out(&amount1, self.slippage_bps)?;

        log::debug!(
            "liquidity::withdraw: {pool} burn {} of {} for {amount0:?} + {amount1:?}",
            liquidity.raw(),
            lp_balance.raw()
        );

        Ok(WithdrawalQuote {
            percent,
            liquidity,
            amount0,
            amount1,
            minimum0,
            minimum1,
            position,
        })
    }
}

/// Express the typed input as a share of the LP balance
fn percent_to_remove(position: &PoolPosition, input: &WithdrawInput) -> DexResult<Percent> {
    let requested = match input {
        WithdrawInput::Percent(percent) => {
            if percent.as_fraction().is_zero() {
                return Err(DexError::InvalidAmount("Enter an amount".to_string()));
            }
            if *percent.as_fraction() > Fraction::one() {
                return Err(DexError::InsufficientBalance {
                    symbol: position.lp_balance.token().symbol().to_string(),
                    requested: percent.to_string(),
                    available: "100%".to_string(),
                });
            }
            *percent
        }
        WithdrawInput::Liquidity(amount) => share_of(amount, &position.lp_balance)?,
        WithdrawInput::CurrencyA(amount) | WithdrawInput::CurrencyB(amount) => {
            share_of(amount, position.pooled(amount.token())?)?
        }
    };

    if position.lp_balance.is_zero() {
        return Err(DexError::InsufficientBalance {
            symbol: position.lp_balance.token().symbol().to_string(),
            requested: requested.to_string(),
            available: "0".to_string(),
        });
    }
    Ok(requested)
}

/// `amount / held` as a percent, refusing zero and anything above what is held
fn share_of(amount: &ExactAmount, held: &ExactAmount) -> DexResult<Percent> {
    if amount.is_zero() {
        return Err(DexError::InvalidAmount("Enter an amount".to_string()));
    }
    if amount > held {
        return Err(DexError::InsufficientBalance {
            symbol: amount.token().symbol().to_string(),
            requested: amount.to_significant(6),
            available: held.to_significant(6),
        });
    }
    amount.ratio(held).map(Percent::from)
}
