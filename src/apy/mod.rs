//! # Yield Engine
//!
//! Annualized figures for pairs and staking programs. These are estimates shown to
//! the user, so they are plain `f64`; anything that cannot be computed (an empty
//! reserve, a NaN from the indexer) is `None` rather than a misleading zero or
//! infinity.

/// Periodic re-evaluation of a program's remaining time
pub mod countdown;

use std::fmt::{self, Display};

use crate::models::{PairStats, StakingInfo};
use crate::utils::constants::FEE_PERCENT;

/// Days in a year for annualizing
const DAYS_PER_YEAR: f64 = 365.0;
/// Days in a reward month
const DAYS_PER_MONTH: f64 = 30.0;
/// Above this an APY is shown as a bound rather than a number
const APY_DISPLAY_CAP: f64 = 100_000_000.0;

/// Keep finite values only
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Fraction of the reserve LPs earn back in fees over a year:
/// `daily_volume * FEE_PERCENT * 365 / reserve_usd`
#[must_use]
pub fn one_year_fee(daily_volume: f64, reserve_usd: f64) -> Option<f64> {
    if reserve_usd == 0.0 {
        return None;
    }
    finite(daily_volume * FEE_PERCENT * DAYS_PER_YEAR / reserve_usd)
}

/// Fee yield in percent per year.
///
/// `None` for a zero reserve or any non-finite input; zero volume yields `0`.
#[must_use]
pub fn annualized_fee_yield(daily_volume: f64, reserve_usd: f64) -> Option<f64> {
    one_year_fee(daily_volume, reserve_usd).map(|ratio| ratio * 100.0)
}

/// Fees LPs of a pair earned over the last day, in USD
#[must_use]
pub fn pair_daily_fee(stats: &PairStats) -> f64 {
    stats.one_day_volume() * FEE_PERCENT
}

/// Fee yield of a pair from its indexer figures
#[must_use]
pub fn pair_fee_yield(stats: &PairStats) -> Option<f64> {
    annualized_fee_yield(stats.one_day_volume(), stats.liquidity_usd())
}

/// Reward return of a staking program over one month, as a ratio
#[must_use]
pub fn per_month_return(staking: &StakingInfo) -> Option<f64> {
    if staking.total_staked_usd == 0.0 {
        return None;
    }
    finite(staking.daily_rewards_usd() * DAYS_PER_MONTH / staking.total_staked_usd)
}

/// Reward APR of a staking program in percent, without compounding
#[must_use]
pub fn reward_apr(staking: &StakingInfo) -> Option<f64> {
    if staking.total_staked_usd == 0.0 {
        return None;
    }
    finite(staking.daily_rewards_usd() * DAYS_PER_YEAR / staking.total_staked_usd * 100.0)
}

/// Rewards and fees compounded monthly, in percent:
/// `((1 + monthly_reward_return + annual_fee_ratio / 12)^12 - 1) * 100`
#[must_use]
pub fn combined_apy(monthly_reward_return: f64, annual_fee_ratio: f64) -> Option<f64> {
    let monthly = 1.0 + monthly_reward_return + annual_fee_ratio / 12.0;
    finite((monthly.powi(12) - 1.0) * 100.0)
}

/// APY of staking in a farm for a pair: the program's rewards plus the pair's fees.
///
/// `None` once the feed has closed the program out.
#[must_use]
pub fn farm_apy(staking: &StakingInfo, stats: &PairStats) -> Option<f64> {
    if staking.ended {
        return None;
    }
    let fee = one_year_fee(stats.one_day_volume(), stats.liquidity_usd()).unwrap_or(0.0);
    combined_apy(per_month_return(staking).unwrap_or(0.0), fee)
}

/// Percent for display: two decimals with thousands separators, or a bound when huge
#[must_use]
pub fn format_apy(apy: f64) -> String {
    if !apy.is_finite() {
        return "0".to_string();
    }
    if apy > APY_DISPLAY_CAP {
        return format!(">{APY_DISPLAY_CAP:.0}");
    }

    let fixed = format!("{:.2}", apy.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if apy < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

/// How long a reward program still runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    /// The end lies in the past
    Ended,
    /// The program has no end
    Unbounded,
    /// Whole units until the end
    Remaining {
        /// Days
        days: i64,
        /// Hours, `0..24`
        hours: i64,
        /// Minutes, `0..60`
        minutes: i64,
        /// Seconds, `0..60`
        seconds: i64,
    },
}

impl TimeRemaining {
    /// Whether nothing is left to count down
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !matches!(self, Self::Remaining { .. })
    }
}

impl Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ended => write!(f, "Rewards Ended"),
            Self::Unbounded => write!(f, "No end date"),
            Self::Remaining {
                days,
                hours,
                minutes,
                seconds,
            } => write!(f, "{days}d {hours:02}h {minutes:02}m {seconds}s"),
        }
    }
}

/// Split the time from `now` until `end` into whole units
#[must_use]
pub const fn time_remaining(end: Option<i64>, now: i64) -> TimeRemaining {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    let Some(end) = end else {
        return TimeRemaining::Unbounded;
    };
    if end <= now {
        return TimeRemaining::Ended;
    }
    let left = end - now;
    TimeRemaining::Remaining {
        days: left / DAY,
        hours: left % DAY / HOUR,
        minutes: left % HOUR / MINUTE,
        seconds: left % MINUTE,
    }
}

/// Remaining time of a staking program; a program the feed closed out has ended
/// whatever its end timestamp says
#[must_use]
pub const fn time_remaining_for(staking: &StakingInfo, now: i64) -> TimeRemaining {
    if staking.ended {
        return TimeRemaining::Ended;
    }
    time_remaining(staking.period_end, now)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use alloy::primitives::Address;

    use super::*;

    fn staking(rate: f64, price: f64, staked: f64) -> StakingInfo {
        StakingInfo {
            pair: Address::ZERO,
            reward_rate_per_day: rate,
            reward_token_price_usd: price,
            total_staked_usd: staked,
            period_end: None,
            ended: false,
        }
    }

    #[test]
    fn test_fee_yield() {
        assert_eq!(annualized_fee_yield(0.0, 1_000.0), Some(0.0));
        assert_eq!(annualized_fee_yield(100.0, 0.0), None);
        assert_eq!(annualized_fee_yield(f64::NAN, 1_000.0), None);
        // 1000 * 0.0025 * 365 / 36500 = 2.5%
        let apy = annualized_fee_yield(1_000.0, 36_500.0).unwrap();
        assert!((apy - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_reward_figures() {
        // 10 tokens a day at $3 over $10 950 staked
        let info = staking(10.0, 3.0, 10_950.0);
        assert!((reward_apr(&info).unwrap() - 100.0).abs() < 1e-9);
        assert!((per_month_return(&info).unwrap() - 900.0 / 10_950.0).abs() < 1e-12);
        assert_eq!(reward_apr(&staking(10.0, 3.0, 0.0)), None);
    }

    #[test]
    fn test_combined_apy() {
        assert_eq!(combined_apy(0.0, 0.0), Some(0.0));
        // 1% a month compounds to about 12.68%
        let apy = combined_apy(0.01, 0.0).unwrap();
        assert!((apy - 12.682_503_013_196_976).abs() < 1e-9);
        // fees alone are spread over twelve months
        let apy = combined_apy(0.0, 0.12).unwrap();
        assert!((apy - 12.682_503_013_196_976).abs() < 1e-9);
        assert_eq!(combined_apy(f64::INFINITY, 0.0), None);
    }

    #[test]
    fn test_farm_apy_without_stats() {
        let info = staking(10.0, 3.0, 10_950.0);
        let expected = combined_apy(per_month_return(&info).unwrap(), 0.0);
        assert_eq!(farm_apy(&info, &PairStats::default()), expected);
    }

    #[test]
    fn test_closed_program_has_no_farm_apy() {
        let info = StakingInfo {
            ended: true,
            ..staking(10.0, 3.0, 10_950.0)
        };
        assert_eq!(farm_apy(&info, &PairStats::default()), None);
    }

    #[test]
    fn test_time_remaining_for_closed_program() {
        let open = StakingInfo {
            period_end: Some(3_600),
            ..staking(1.0, 1.0, 1.0)
        };
        assert_eq!(time_remaining_for(&open, 0).to_string(), "0d 01h 00m 0s");

        let closed = StakingInfo { ended: true, ..open };
        assert_eq!(time_remaining_for(&closed, 0), TimeRemaining::Ended);
    }

    #[test]
    fn test_format_apy() {
        assert_eq!(format_apy(0.0), "0.00");
        assert_eq!(format_apy(12.346), "12.35");
        assert_eq!(format_apy(1_234_567.891), "1,234,567.89");
        assert_eq!(format_apy(100_000_000.5), ">100000000");
        assert_eq!(format_apy(f64::NAN), "0");
    }

    #[test]
    fn test_time_remaining() {
        assert_eq!(time_remaining(Some(99), 100), TimeRemaining::Ended);
        assert_eq!(time_remaining(Some(100), 100), TimeRemaining::Ended);
        assert_eq!(time_remaining(None, 100), TimeRemaining::Unbounded);

        let left = time_remaining(Some(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5), 0);
        assert_eq!(left.to_string(), "2d 03h 04m 5s");
        assert_eq!(TimeRemaining::Ended.to_string(), "Rewards Ended");
    }
}
