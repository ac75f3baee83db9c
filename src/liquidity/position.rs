use crate::error::{DexError, DexResult};
use crate::math::{mul_div_floor, ExactAmount, Percent};
use crate::models::{PoolSnapshot, Token};

/// What an LP balance is worth inside a pool right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolPosition {
    /// The account's LP tokens
    pub lp_balance: ExactAmount,
    /// token0 the LP balance would redeem for
    pub pooled0: ExactAmount,
    /// token1 the LP balance would redeem for
    pub pooled1: ExactAmount,
    /// `lp_balance / total_supply`
    pub share: Percent,
}

impl PoolPosition {
    /// Derive the position of `lp_balance` in `pool`.
    ///
    /// # Errors
    ///
    /// * `TokenMismatch` if `lp_balance` is not the pool's LP token
    /// * `EmptyPool` if nothing is in circulation
    /// * `InvalidFeed` if the balance exceeds the total supply, which a consistent
    ///   snapshot can never show
    pub fn new(pool: &PoolSnapshot, lp_balance: &ExactAmount) -> DexResult<Self> {
        check_balance(pool, lp_balance)?;
        let total = pool.total_supply().raw();

        Ok(Self {
            lp_balance: lp_balance.clone(),
            pooled0: redeemable(pool.reserve0(), lp_balance, total)?,
            pooled1: redeemable(pool.reserve1(), lp_balance, total)?,
            share: Percent::new(lp_balance.raw(), total)?,
        })
    }

    /// Pooled amount of `token`
    ///
    /// # Errors
    ///
    /// `TokenMismatch` if `token` is not in the pool
    pub fn pooled(&self, token: &Token) -> DexResult<&ExactAmount> {
        side_of(token, &self.pooled0, &self.pooled1)
    }
}

/// Whichever of a pool-ordered pair of amounts is in `token`
pub(super) fn side_of<'a>(
    token: &Token,
    side0: &'a ExactAmount,
    side1: &'a ExactAmount,
) -> DexResult<&'a ExactAmount> {
    if token == side0.token() {
        Ok(side0)
    } else if token == side1.token() {
        Ok(side1)
    } else {
        Err(DexError::TokenMismatch {
            left: format!("{token:?}"),
            right: format!("{:?}/{:?}", side0.token(), side1.token()),
        })
    }
}

/// Common guards for anything computed off an LP balance
pub(super) fn check_balance(pool: &PoolSnapshot, lp_balance: &ExactAmount) -> DexResult<()> {
    if lp_balance.token() != pool.liquidity_token() {
        return Err(DexError::TokenMismatch {
            left: format!("{:?}", lp_balance.token()),
            right: format!("{:?}", pool.liquidity_token()),
        });
    }
    let total = pool.total_supply().raw();
    if total.is_zero() {
        return Err(DexError::EmptyPool {
            pair: pool.to_string(),
        });
    }
    if lp_balance.raw() > total {
        log::warn!(
            "liquidity::position: {pool} balance {} exceeds total supply {total}",
            lp_balance.raw()
        );
        return Err(DexError::InvalidFeed(format!(
            "{pool} LP balance {} exceeds total supply {total}",
            lp_balance.raw()
        )));
    }
    Ok(())
}

/// `floor(reserve * liquidity / total_supply)`, in the reserve's token
pub(super) fn redeemable(
    reserve: &ExactAmount,
    liquidity: &ExactAmount,
    total_supply: alloy::primitives::U256,
) -> DexResult<ExactAmount> {
    let raw = mul_div_floor(reserve.raw(), liquidity.raw(), total_supply)?;
    Ok(ExactAmount::from_raw(reserve.token().clone(), raw))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_helpers::{amount, pool, token};

    #[test]
    fn test_position() {
        let snapshot = pool(("USDC", 6, 1_000_000_000), ("QUICK", 18, 5_000_000_000_000_000_000), 3_000);
        let position = PoolPosition::new(&snapshot, &amount(snapshot.liquidity_token(), 1_000)).unwrap();

        let usdc = token("USDC", 6);
        let quick = token("QUICK", 18);
        // a third of each reserve, floored
        assert_eq!(position.pooled(&usdc).unwrap().to_exact(), "333.333333");
        assert_eq!(position.pooled(&quick).unwrap().to_exact(), "1.666666666666666666");
        assert_eq!(position.share.to_significant(5), "33.333");
    }

    #[test]
    fn test_empty_pool() {
        let snapshot = pool(("USDC", 6, 0), ("QUICK", 18, 0), 0);
        let err = PoolPosition::new(&snapshot, &amount(snapshot.liquidity_token(), 0)).unwrap_err();
        assert!(matches!(err, DexError::EmptyPool { .. }));
    }

    #[test]
    fn test_balance_above_supply_is_flagged() {
        let snapshot = pool(("USDC", 6, 100), ("QUICK", 18, 100), 10);
        let err = PoolPosition::new(&snapshot, &amount(snapshot.liquidity_token(), 11)).unwrap_err();
        assert!(matches!(err, DexError::InvalidFeed(_)));
    }

    #[test]
    fn test_foreign_balance() {
        let snapshot = pool(("USDC", 6, 100), ("QUICK", 18, 100), 10);
        let err = PoolPosition::new(&snapshot, &amount(&token("USDC", 6), 1)).unwrap_err();
        assert!(matches!(err, DexError::TokenMismatch { .. }));
    }
}
