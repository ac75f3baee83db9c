//! # Feed Boundary
//!
//! Read-only inputs from the chain-read and indexing collaborators. Raw payloads are
//! validated into the typed model here, so nothing past this module sees an
//! unchecked reserve, decimal count or USD figure.

/// Last-request-wins gate for keyed queries
pub mod latest;
/// Raw feed payloads and their validation
pub mod types;

pub use latest::{LatestRequest, LiveQuery, Ticket};
pub use types::{PairStatsFeed, PoolFeed, StakingFeed, TokenFeed};

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::math::ExactAmount;
use crate::models::{PoolSnapshot, Token};

/// Chain reads the core depends on.
///
/// Each call returns an immutable snapshot; the caller decides how long to keep it.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Reserves and LP supply of `pair`
    async fn pool_snapshot(&self, pair: Address) -> eyre::Result<PoolSnapshot>;

    /// Balance of `token` held by `account`
    async fn balance(&self, token: &Token, account: Address) -> eyre::Result<ExactAmount>;

    /// How much of `token` `spender` may move on behalf of `owner`
    async fn allowance(&self, token: &Token, owner: Address, spender: Address) -> eyre::Result<ExactAmount>;
}

/// Key of a position query: which pair, whose balance
pub type PositionKey = (Address, Address);

/// A pool snapshot together with the account's LP balance in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSnapshot {
    /// The pool
    pub pool: PoolSnapshot,
    /// The account's LP tokens
    pub lp_balance: ExactAmount,
}

/// Fetch pool and LP balance for `(pair, account)` through a last-request-wins gate.
///
/// If the user switched pair or account while the reads were in flight, the result
/// is dropped and `None` returned.
///
/// # Errors
///
/// A failed read, when this request is still the latest
pub async fn refresh_position<R: ChainReader + ?Sized>(
    reader: &R,
    query: &LiveQuery<PositionKey, PositionSnapshot>,
    pair: Address,
    account: Address,
) -> eyre::Result<Option<PositionSnapshot>> {
    query
        .refresh((pair, account), async {
            let pool = reader.pool_snapshot(pair).await?;
            let lp_balance = reader.balance(pool.liquidity_token(), account).await?;
            log::debug!(
                "feed::refresh_position: {pool:?} balance {} for {account}",
                lp_balance.raw()
            );
            Ok(PositionSnapshot { pool, lp_balance })
        })
        .await
}
