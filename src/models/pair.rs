use std::fmt::{self, Debug, Display};

use alloy::primitives::{Address, U256};

use crate::error::{DexError, DexResult};
use crate::math::{ExactAmount, Fraction};
use crate::models::token::Token;

/// A V2 pair's reserves and LP supply at one point in time.
///
/// Supplied by the chain-read feed and used for the duration of a single
/// calculation; the core never caches it.
#[derive(Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// The LP token minted by the pair; its address is the pair address
    liquidity_token: Token,
    /// Reserve of token0
    reserve0: ExactAmount,
    /// Reserve of token1
    reserve1: ExactAmount,
    /// LP tokens in circulation
    total_supply: ExactAmount,
}

impl PoolSnapshot {
    /// Creates a new snapshot after checking it is internally consistent.
    ///
    /// # Arguments
    ///
    /// * `liquidity_token` - The pair's LP token
    /// * `token0`, `token1` - The pooled tokens, in any order
    /// * `reserve0`, `reserve1` - Raw reserves matching `token0` and `token1`
    /// * `total_supply` - Raw LP supply
    ///
    /// # Errors
    ///
    /// `InvalidFeed` if the tokens are identical or span chains
    pub fn new(
        liquidity_token: Token,
        token0: Token,
        token1: Token,
        reserve0: U256,
        reserve1: U256,
        total_supply: U256,
    ) -> DexResult<Self> {
        if token0 == token1 {
            return Err(DexError::InvalidFeed(format!(
                "pair {} lists {} twice",
                liquidity_token.address(),
                token0.symbol()
            )));
        }
        if token0.chain_id() != token1.chain_id() || token0.chain_id() != liquidity_token.chain_id() {
            return Err(DexError::InvalidFeed(format!(
                "pair {} spans chains {} and {}",
                liquidity_token.address(),
                token0.chain_id(),
                token1.chain_id()
            )));
        }

        // keep the on-chain token0 < token1 order whatever order the feed used
        let (reserve0, reserve1) = if token0.sorts_before(&token1) {
            (ExactAmount::from_raw(token0, reserve0), ExactAmount::from_raw(token1, reserve1))
        } else {
            (ExactAmount::from_raw(token1, reserve1), ExactAmount::from_raw(token0, reserve0))
        };

        Ok(Self {
            total_supply: ExactAmount::from_raw(liquidity_token.clone(), total_supply),
            liquidity_token,
            reserve0,
            reserve1,
        })
    }

    /// The pair address
    #[must_use]
    pub const fn address(&self) -> Address {
        self.liquidity_token.address()
    }

    /// The LP token
    #[must_use]
    pub const fn liquidity_token(&self) -> &Token {
        &self.liquidity_token
    }

    /// token0 (the lower address)
    #[must_use]
    pub const fn token0(&self) -> &Token {
        self.reserve0.token()
    }

    /// token1 (the higher address)
    #[must_use]
    pub const fn token1(&self) -> &Token {
        self.reserve1.token()
    }

    /// Reserve of token0
    #[must_use]
    pub const fn reserve0(&self) -> &ExactAmount {
        &self.reserve0
    }

    /// Reserve of token1
    #[must_use]
    pub const fn reserve1(&self) -> &ExactAmount {
        &self.reserve1
    }

    /// LP tokens in circulation
    #[must_use]
    pub const fn total_supply(&self) -> &ExactAmount {
        &self.total_supply
    }

    /// Whether `token` is one of the two pooled tokens
    #[must_use]
    pub fn involves(&self, token: &Token) -> bool {
        token == self.token0() || token == self.token1()
    }

    /// The reserve held of `token`.
    ///
    /// # Errors
    ///
    /// `TokenMismatch` if the pair does not hold `token`
    pub fn reserve_of(&self, token: &Token) -> DexResult<&ExactAmount> {
        if token == self.token0() {
            Ok(&self.reserve0)
        } else if token == self.token1() {
            Ok(&self.reserve1)
        } else {
            Err(DexError::TokenMismatch {
                left: format!("{token:?}"),
                right: self.to_string(),
            })
        }
    }

    /// Mid price of `token` in units of the other token, decimals accounted for.
    ///
    /// `1 token = price_of(token) other`, i.e.
    /// `(reserve_other / 10^dec_other) / (reserve_self / 10^dec_self)`.
    ///
    /// # Errors
    ///
    /// `TokenMismatch` for a foreign token, `DivisionByZero` for an empty reserve,
    /// `Overflow` if decimal scaling leaves 256 bits
    pub fn price_of(&self, token: &Token) -> DexResult<Fraction> {
        let (base, quote) = if token == self.token0() {
            (&self.reserve0, &self.reserve1)
        } else {
            self.reserve_of(token)?;
            (&self.reserve1, &self.reserve0)
        };
        let scale = |decimals: u8| {
            U256::from(10)
                .checked_pow(U256::from(decimals))
                .ok_or(DexError::Overflow)
        };
        let numerator = Fraction::new(quote.raw(), scale(quote.token().decimals())?)?;
        let denominator = Fraction::new(base.raw(), scale(base.token().decimals())?)?;
        numerator.multiply(&denominator.invert()?)
    }
}

impl PoolSnapshot {
    /// `"1 SYM = <price> OTHER"` for the mid price of `token`
    ///
    /// # Errors
    ///
    /// See [`PoolSnapshot::price_of`]
    pub fn price_line(&self, token: &Token) -> DexResult<String> {
        let other = if token == self.token0() { self.token1() } else { self.token0() };
        let price = self.price_of(token)?;
        Ok(format!("1 {} = {} {}", token.symbol(), price.to_significant(6), other.symbol()))
    }
}

impl Debug for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pool({}, {:?} / {:?}, supply {})",
            self.address(),
            self.reserve0,
            self.reserve1,
            self.total_supply.raw()
        )
    }
}

impl Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token0().symbol(), self.token1().symbol())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_helpers::{lp_token, pool, token};

    #[test]
    fn test_same_tokens() {
        let usdc = token("USDC", 6);
        let snapshot = PoolSnapshot::new(
            lp_token("LP"),
            usdc.clone(),
            usdc,
            U256::from(1),
            U256::from(1),
            U256::from(1),
        );
        assert!(matches!(snapshot, Err(DexError::InvalidFeed(_))));
    }

    #[test]
    fn test_reserves_follow_token_order() {
        let a = token("AAA", 18);
        let b = token("BBB", 18);
        let (lo, hi) = if a.sorts_before(&b) { (a, b) } else { (b, a) };

        // feed lists the higher address first
        let snapshot = PoolSnapshot::new(
            lp_token("LP"),
            hi.clone(),
            lo.clone(),
            U256::from(7),
            U256::from(3),
            U256::from(10),
        )
        .unwrap();

        assert_eq!(snapshot.token0(), &lo);
        assert_eq!(snapshot.reserve0().raw(), U256::from(3));
        assert_eq!(snapshot.reserve_of(&hi).unwrap().raw(), U256::from(7));
    }

    #[test]
    fn test_price_of_accounts_for_decimals() {
        // 2_000 USDC (6 decimals) against 1 WETH (18 decimals)
        let snapshot = pool(
            ("USDC", 6, 2_000_000_000),
            ("WETH", 18, 1_000_000_000_000_000_000),
            1_000,
        );
        let weth = token("WETH", 18);
        let usdc = token("USDC", 6);

        assert_eq!(snapshot.price_of(&weth).unwrap().to_significant(6), "2000");
        assert_eq!(snapshot.price_of(&usdc).unwrap().to_significant(6), "0.0005");
        assert!(snapshot.price_of(&token("DAI", 18)).is_err());
    }

    #[test]
    fn test_price_lines() {
        let snapshot = pool(
            ("USDC", 6, 2_000_000_000),
            ("WETH", 18, 1_000_000_000_000_000_000),
            1_000,
        );
        assert_eq!(snapshot.price_line(&token("WETH", 18)).unwrap(), "1 WETH = 2000 USDC");
        assert_eq!(snapshot.price_line(&token("USDC", 6)).unwrap(), "1 USDC = 0.0005 WETH");
        assert!(snapshot.price_line(&token("DAI", 18)).is_err());
    }
}
