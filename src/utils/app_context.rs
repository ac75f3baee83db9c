//! Application context shared by the CLI commands.
//!
//! Holds the loaded configuration, the chain client built from it and the
//! session's transaction list.

use alloy::network::Ethereum;
use alloy::primitives::Address;
use alloy::providers::RootProvider;
use eyre::{eyre, Result};

use crate::chain::{connect, RouterClient};
use crate::config::Config;
use crate::tx::{MethodResolver, TxFlow, TxTracker};

/// Everything a command needs to talk to the chain
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Loaded configuration
    pub config: Config,
    /// Reader, estimator and submitter
    pub client: RouterClient<RootProvider<Ethereum>>,
    /// Transactions sent this session
    pub tracker: TxTracker,
}

impl AppContext {
    /// Creates a context connected to the configured endpoint.
    ///
    /// # Errors
    ///
    /// * If `LPDESK_RPC_URL` is not set
    pub fn new(config: Config) -> Result<Self> {
        let client = connect(&config)?;
        Ok(Self {
            config,
            client,
            tracker: TxTracker::new(),
        })
    }

    /// The configured account, needed for anything user-specific.
    ///
    /// # Errors
    ///
    /// * If `LPDESK_ACCOUNT` is not set
    pub fn account(&self) -> Result<Address> {
        self.config
            .account
            .ok_or_else(|| eyre!("LPDESK_ACCOUNT must be set"))
    }

    /// A submission flow over this context's client and tracker
    #[must_use]
    pub fn flow(&self) -> TxFlow<'_, RouterClient<RootProvider<Ethereum>>, RouterClient<RootProvider<Ethereum>>> {
        TxFlow::new(
            MethodResolver::new(self.config.gas_margin_bps),
            &self.client,
            &self.client,
            self.tracker.clone(),
        )
    }
}
