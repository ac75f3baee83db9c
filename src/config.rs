//! Runtime configuration read from the environment (and `.env`).
//!
//! | Variable | Default |
//! |---|---|
//! | `LPDESK_RPC_URL` | none, required for chain access |
//! | `LPDESK_CHAIN_ID` | `137` |
//! | `LPDESK_ROUTER` | QuickSwap router |
//! | `LPDESK_ACCOUNT` | none, required to submit |
//! | `LPDESK_SLIPPAGE_BPS` | `50` |
//! | `LPDESK_DEADLINE_SECS` | `1200` |
//! | `LPDESK_GAS_MARGIN_BPS` | `1000` |

use std::env;
use std::str::FromStr;

use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use url::Url;

use crate::utils::constants::{
    BIPS_BASE, DEFAULT_DEADLINE_SECS, DEFAULT_GAS_MARGIN_BPS, DEFAULT_SLIPPAGE_BPS, POLYGON, QUICKSWAP_ROUTER,
};

/// Settings shared by the CLI and the chain client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON-RPC endpoint
    pub rpc_url: Option<Url>,
    /// Chain the router lives on
    pub chain_id: u64,
    /// Router contract
    pub router: Address,
    /// Account that signs and receives
    pub account: Option<Address>,
    /// Slippage tolerance in basis points
    pub slippage_bps: u64,
    /// Seconds a transaction stays valid
    pub deadline_secs: u64,
    /// Margin on top of gas estimates in basis points
    pub gas_margin_bps: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: None,
            chain_id: POLYGON,
            router: QUICKSWAP_ROUTER,
            account: None,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            deadline_secs: DEFAULT_DEADLINE_SECS,
            gas_margin_bps: DEFAULT_GAS_MARGIN_BPS,
        }
    }
}

impl Config {
    /// Load from the process environment after reading `.env` if present.
    ///
    /// # Errors
    ///
    /// A variable that is set but does not parse, or a slippage above 100%
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through `lookup`, which returns the raw value of a variable if set.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            rpc_url: parse_var(&lookup, "LPDESK_RPC_URL")?,
            chain_id: parse_var(&lookup, "LPDESK_CHAIN_ID")?.unwrap_or(defaults.chain_id),
            router: parse_var(&lookup, "LPDESK_ROUTER")?.unwrap_or(defaults.router),
            account: parse_var(&lookup, "LPDESK_ACCOUNT")?,
            slippage_bps: parse_var(&lookup, "LPDESK_SLIPPAGE_BPS")?.unwrap_or(defaults.slippage_bps),
            deadline_secs: parse_var(&lookup, "LPDESK_DEADLINE_SECS")?.unwrap_or(defaults.deadline_secs),
            gas_margin_bps: parse_var(&lookup, "LPDESK_GAS_MARGIN_BPS")?.unwrap_or(defaults.gas_margin_bps),
        };
        if config.slippage_bps > BIPS_BASE {
            return Err(eyre!(
                "LPDESK_SLIPPAGE_BPS must be at most {BIPS_BASE}, got {}",
                config.slippage_bps
            ));
        }
        Ok(config)
    }

    /// The RPC endpoint, required for anything touching the chain.
    ///
    /// # Errors
    ///
    /// If `LPDESK_RPC_URL` is not set
    pub fn require_rpc_url(&self) -> Result<&Url> {
        self.rpc_url
            .as_ref()
            .ok_or_else(|| eyre!("LPDESK_RPC_URL must be set"))
    }
}

/// Parse `key` if it is set and not blank
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .wrap_err_with(|| format!("{key} has invalid value {raw:?}")),
        _ => Ok(None),
    }
}
