use std::str::FromStr;

use alloy::primitives::{Address, U256};
use serde::Deserialize;

use crate::error::{DexError, DexResult};
use crate::models::{PairStats, PoolSnapshot, StakingInfo, Token};

/// Indexers send numbers either as JSON numbers or as decimal strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    /// `18`
    Number(u64),
    /// `"18"`
    Text(String),
}

impl NumberOrString {
    /// Interpret as an unsigned integer
    fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Token as it comes from the feed
#[derive(Debug, Clone, Deserialize)]
pub struct TokenFeed {
    /// Token address
    pub id: Address,
    /// Ticker symbol
    pub symbol: String,
    /// Full name
    #[serde(default)]
    pub name: Option<String>,
    /// Decimal count
    pub decimals: NumberOrString,
}

impl TokenFeed {
    /// Validate into a [`Token`] on `chain_id`.
    ///
    /// # Errors
    ///
    /// `InvalidFeed` if decimals are missing or above 255
    pub fn into_token(self, chain_id: u64) -> DexResult<Token> {
        let decimals = self
            .decimals
            .as_u64()
            .and_then(|d| u8::try_from(d).ok())
            .ok_or_else(|| {
                DexError::InvalidFeed(format!("token {} has invalid decimals {:?}", self.id, self.decimals))
            })?;
        let token = Token::new(chain_id, self.id, decimals, self.symbol);
        Ok(match self.name {
            Some(name) => token.with_name(name),
            None => token,
        })
    }
}

/// Pair reserves and supply as read from chain.
///
/// Raw magnitudes are decimal or `0x` strings so no precision is lost in JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolFeed {
    /// Chain the pair lives on
    pub chain_id: u64,
    /// Pair (LP token) address
    pub pair: Address,
    /// First pooled token
    pub token0: TokenFeed,
    /// Second pooled token
    pub token1: TokenFeed,
    /// Raw reserve of `token0`
    pub reserve0: String,
    /// Raw reserve of `token1`
    pub reserve1: String,
    /// Raw LP supply
    pub total_supply: String,
}

/// Parse a raw on-chain magnitude
fn parse_raw(field: &str, value: &str) -> DexResult<U256> {
    U256::from_str(value.trim())
        .map_err(|e| DexError::InvalidFeed(format!("{field} {value:?} is not a raw integer: {e}")))
}

impl TryFrom<PoolFeed> for PoolSnapshot {
    type Error = DexError;

    fn try_from(feed: PoolFeed) -> DexResult<Self> {
        let liquidity_token = Token::new(feed.chain_id, feed.pair, 18, format!(
            "{}-{} LP",
            feed.token0.symbol, feed.token1.symbol
        ));
        let reserve0 = parse_raw("reserve0", &feed.reserve0)?;
        let reserve1 = parse_raw("reserve1", &feed.reserve1)?;
        let total_supply = parse_raw("totalSupply", &feed.total_supply)?;

        Self::new(
            liquidity_token,
            feed.token0.into_token(feed.chain_id)?,
            feed.token1.into_token(feed.chain_id)?,
            reserve0,
            reserve1,
            total_supply,
        )
    }
}

/// Staking program as the rewards feed reports it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingFeed {
    /// Pair whose LP tokens are staked
    pub pair: Address,
    /// Reward tokens emitted per day
    pub reward_rate_per_day: f64,
    /// USD price of one reward token
    pub reward_token_price_usd: f64,
    /// USD value staked
    pub total_staked_usd: f64,
    /// Unix end of the program
    #[serde(default)]
    pub period_end: Option<i64>,
    /// Closed out
    #[serde(default)]
    pub ended: bool,
}

impl TryFrom<StakingFeed> for StakingInfo {
    type Error = DexError;

    fn try_from(feed: StakingFeed) -> DexResult<Self> {
        for (field, value) in [
            ("rewardRatePerDay", feed.reward_rate_per_day),
            ("rewardTokenPriceUsd", feed.reward_token_price_usd),
            ("totalStakedUsd", feed.total_staked_usd),
        ] {
            if value < 0.0 {
                return Err(DexError::InvalidFeed(format!(
                    "staking {} has negative {field} {value}",
                    feed.pair
                )));
            }
        }
        Ok(Self {
            pair: feed.pair,
            reward_rate_per_day: feed.reward_rate_per_day,
            reward_token_price_usd: feed.reward_token_price_usd,
            total_staked_usd: feed.total_staked_usd,
            period_end: feed.period_end,
            ended: feed.ended,
        })
    }
}

/// Pair aggregate from the indexer; every figure is a decimal string
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairStatsFeed {
    /// Pair address
    pub id: Address,
    /// Reserve in USD
    #[serde(rename = "reserveUSD")]
    pub reserve_usd: String,
    /// Tracked reserve in USD
    #[serde(default, rename = "trackedReserveUSD")]
    pub tracked_reserve_usd: Option<String>,
    /// Tracked 24h volume
    #[serde(default, rename = "oneDayVolumeUSD")]
    pub one_day_volume_usd: Option<String>,
    /// Untracked 24h volume
    #[serde(default)]
    pub one_day_volume_untracked: Option<String>,
}

impl From<PairStatsFeed> for PairStats {
    /// Unparseable figures become NaN so downstream yield math reports them as absent
    fn from(feed: PairStatsFeed) -> Self {
        let parse = |s: &str| s.trim().parse::<f64>().unwrap_or(f64::NAN);
        Self {
            pair: feed.id,
            reserve_usd: parse(&feed.reserve_usd),
            tracked_reserve_usd: feed.tracked_reserve_usd.as_deref().map(parse),
            one_day_volume_usd: feed.one_day_volume_usd.as_deref().map(parse),
            one_day_volume_untracked: feed.one_day_volume_untracked.as_deref().map(parse),
        }
    }
}
