use alloy::primitives::Address;

/// A liquidity-mining program for one pair, as one immutable snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct StakingInfo {
    /// Address of the pair whose LP tokens are staked
    pub pair: Address,
    /// Reward tokens emitted per day
    pub reward_rate_per_day: f64,
    /// USD price of one reward token
    pub reward_token_price_usd: f64,
    /// USD value of everything staked in the program
    pub total_staked_usd: f64,
    /// Unix timestamp the program stops emitting, if it ever does
    pub period_end: Option<i64>,
    /// Set by the feed once the program has been closed out
    pub ended: bool,
}

impl StakingInfo {
    /// USD value emitted per day
    #[must_use]
    pub fn daily_rewards_usd(&self) -> f64 {
        self.reward_rate_per_day * self.reward_token_price_usd
    }

    /// Whether the program is over at `now`
    #[must_use]
    pub fn is_ended(&self, now: i64) -> bool {
        self.ended || self.period_end.is_some_and(|end| end <= now)
    }
}

/// Indexer aggregate for a pair: reserves and volume priced in USD.
///
/// The indexer reports two variants of each figure. The `tracked` ones only count
/// whitelisted tokens and are preferred; the untracked ones fill the gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairStats {
    /// Pair address
    pub pair: Address,
    /// Total reserve value in USD
    pub reserve_usd: f64,
    /// Reserve value counting whitelisted tokens only
    pub tracked_reserve_usd: Option<f64>,
    /// Tracked 24h volume
    pub one_day_volume_usd: Option<f64>,
    /// Untracked 24h volume
    pub one_day_volume_untracked: Option<f64>,
}

impl PairStats {
    /// Liquidity shown for the pair: the tracked reserve when the indexer has one
    #[must_use]
    pub fn liquidity_usd(&self) -> f64 {
        self.tracked_reserve_usd
            .filter(|v| v.is_finite() && *v != 0.0)
            .unwrap_or(self.reserve_usd)
    }

    /// 24h volume: tracked when usable, otherwise untracked, otherwise zero
    #[must_use]
    pub fn one_day_volume(&self) -> f64 {
        let usable = |v: &f64| v.is_finite() && *v != 0.0;
        self.one_day_volume_usd
            .filter(usable)
            .or_else(|| self.one_day_volume_untracked.filter(usable))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_fallbacks() {
        let stats = PairStats {
            reserve_usd: 1_000.0,
            tracked_reserve_usd: Some(0.0),
            one_day_volume_usd: Some(f64::NAN),
            one_day_volume_untracked: Some(250.0),
            ..PairStats::default()
        };
        assert!((stats.liquidity_usd() - 1_000.0).abs() < f64::EPSILON);
        assert!((stats.one_day_volume() - 250.0).abs() < f64::EPSILON);

        let stats = PairStats {
            tracked_reserve_usd: Some(900.0),
            one_day_volume_usd: Some(40.0),
            one_day_volume_untracked: Some(250.0),
            ..stats
        };
        assert!((stats.liquidity_usd() - 900.0).abs() < f64::EPSILON);
        assert!((stats.one_day_volume() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_is_ended() {
        let info = StakingInfo {
            pair: Address::ZERO,
            reward_rate_per_day: 1.0,
            reward_token_price_usd: 1.0,
            total_staked_usd: 1.0,
            period_end: Some(100),
            ended: false,
        };
        assert!(!info.is_ended(99));
        assert!(info.is_ended(100));
        assert!(!StakingInfo { period_end: None, ..info.clone() }.is_ended(i64::MAX));
        assert!(StakingInfo { ended: true, ..info }.is_ended(0));
    }
}
