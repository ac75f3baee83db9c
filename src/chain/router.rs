use std::time::Duration;

use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use eyre::{eyre, Result};

use super::abi::{IUniswapV2Pair, IUniswapV2Router02, IERC20};
use crate::feed::ChainReader;
use crate::math::ExactAmount;
use crate::models::{PoolSnapshot, Token};
use crate::tx::{Confirmation, GasEstimator, ResolvedCall, RouterCall, TransactionSubmitter};

/// How often a pending transaction is polled for its receipt
const RECEIPT_POLL: Duration = Duration::from_secs(2);
/// How long to wait for a receipt before giving up
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(600);

/// Reads pools and balances and sends router calls through an alloy provider.
///
/// Transactions are sent with `eth_sendTransaction` from `account`, so the provider
/// (or the node behind it) has to hold that account's key.
#[derive(Debug, Clone)]
pub struct RouterClient<P> {
    /// Connection to the node
    provider: P,
    /// Chain id the provider is connected to
    chain_id: u64,
    /// Router contract
    router: Address,
    /// Sender of every transaction
    account: Option<Address>,
}

impl<P: Provider + Clone> RouterClient<P> {
    /// Creates a client for `router` on `chain_id`
    pub const fn new(provider: P, chain_id: u64, router: Address, account: Option<Address>) -> Self {
        Self {
            provider,
            chain_id,
            router,
            account,
        }
    }

    /// The router
    #[must_use]
    pub const fn router(&self) -> Address {
        self.router
    }

    /// Latest block timestamp, the base for transaction deadlines
    ///
    /// # Errors
    ///
    /// If the node cannot be reached or has no latest block
    pub async fn block_timestamp(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block_by_number(
                alloy::eips::BlockNumberOrTag::Latest,
                alloy::rpc::types::BlockTransactionsKind::Hashes,
            )
            .await?
            .ok_or_else(|| eyre!("node returned no latest block"))?;
        Ok(block.header.timestamp)
    }

    /// ERC-20 metadata of `address`
    async fn token(&self, address: Address) -> Result<Token> {
        let erc20 = IERC20::new(address, &self.provider);
        let decimals = erc20.decimals().call().await?._0;
        let symbol = erc20.symbol().call().await?._0;
        Ok(Token::new(self.chain_id, address, decimals, symbol))
    }

    /// Unsigned request for `call`
    fn request(&self, call: &RouterCall) -> Result<TransactionRequest> {
        let from = self.account.ok_or_else(|| eyre!("no account configured to send from"))?;
        Ok(TransactionRequest::default()
            .with_from(from)
            .with_to(call.target(self.router))
            .with_input(calldata(call)))
    }
}

/// ABI-encoded input of `call`
fn calldata(call: &RouterCall) -> Bytes {
    let encoded = match call {
        RouterCall::RemoveLiquidity {
            token_a,
            token_b,
            liquidity,
            amount_a_min,
            amount_b_min,
            to,
            deadline,
        } => IUniswapV2Router02::removeLiquidityCall {
            tokenA: *token_a,
            tokenB: *token_b,
            liquidity: *liquidity,
            amountAMin: *amount_a_min,
            amountBMin: *amount_b_min,
            to: *to,
            deadline: *deadline,
        }
        .abi_encode(),
        RouterCall::RemoveLiquidityEth(removal) => IUniswapV2Router02::removeLiquidityETHCall {
            token: removal.token,
            liquidity: removal.liquidity,
            amountTokenMin: removal.amount_token_min,
            amountETHMin: removal.amount_eth_min,
            to: removal.to,
            deadline: removal.deadline,
        }
        .abi_encode(),
        RouterCall::RemoveLiquidityEthSupportingFeeOnTransferTokens(removal) => {
            IUniswapV2Router02::removeLiquidityETHSupportingFeeOnTransferTokensCall {
                token: removal.token,
                liquidity: removal.liquidity,
                amountTokenMin: removal.amount_token_min,
                amountETHMin: removal.amount_eth_min,
                to: removal.to,
                deadline: removal.deadline,
            }
            .abi_encode()
        }
        RouterCall::Approve { spender, amount, .. } => IERC20::approveCall {
            spender: *spender,
            amount: *amount,
        }
        .abi_encode(),
    };
    encoded.into()
}

#[async_trait]
impl<P: Provider + Clone> GasEstimator<RouterCall> for RouterClient<P> {
    async fn estimate_gas(&self, call: &RouterCall) -> Result<u64> {
        let request = self.request(call)?;
        Ok(self.provider.estimate_gas(&request).await?)
    }
}

#[async_trait]
impl<P: Provider + Clone> TransactionSubmitter<RouterCall> for RouterClient<P> {
    async fn submit(&self, call: &ResolvedCall<RouterCall>) -> Result<TxHash> {
        let request = self.request(&call.call)?.with_gas_limit(call.gas_limit);
        let pending = self.provider.send_transaction(request).await?;
        Ok(*pending.tx_hash())
    }

    async fn wait(&self, hash: TxHash) -> Result<Confirmation> {
        let poll = async {
            loop {
                if let Some(receipt) = self.provider.get_transaction_receipt(hash).await? {
                    return Ok::<_, eyre::Report>(Confirmation {
                        success: receipt.status(),
                        block_number: receipt.block_number().unwrap_or_default(),
                    });
                }
                tokio::time::sleep(RECEIPT_POLL).await;
            }
        };
        tokio::time::timeout(RECEIPT_TIMEOUT, poll)
            .await
            .map_err(|_| eyre!("{hash} not mined within {}s", RECEIPT_TIMEOUT.as_secs()))?
    }
}

#[async_trait]
impl<P: Provider + Clone> ChainReader for RouterClient<P> {
    async fn pool_snapshot(&self, pair: Address) -> Result<PoolSnapshot> {
        let contract = IUniswapV2Pair::new(pair, &self.provider);
        let token0 = contract.token0().call().await?._0;
        let token1 = contract.token1().call().await?._0;
        let reserves = contract.getReserves().call().await?;
        let total_supply = contract.totalSupply().call().await?._0;

        let token0 = self.token(token0).await?;
        let token1 = self.token(token1).await?;
        let liquidity_token = Token::new(
            self.chain_id,
            pair,
            18,
            format!("{}-{} LP", token0.symbol(), token1.symbol()),
        );
        log::debug!("chain::router: read reserves of {pair}");

        Ok(PoolSnapshot::new(
            liquidity_token,
            token0,
            token1,
            U256::from(reserves.reserve0.to::<u128>()),
            U256::from(reserves.reserve1.to::<u128>()),
            total_supply,
        )?)
    }

    async fn balance(&self, token: &Token, account: Address) -> Result<ExactAmount> {
        let raw = IERC20::new(token.address(), &self.provider)
            .balanceOf(account)
            .call()
            .await?
            ._0;
        Ok(ExactAmount::from_raw(token.clone(), raw))
    }

    async fn allowance(&self, token: &Token, owner: Address, spender: Address) -> Result<ExactAmount> {
        let raw = IERC20::new(token.address(), &self.provider)
            .allowance(owner, spender)
            .call()
            .await?
            ._0;
        Ok(ExactAmount::from_raw(token.clone(), raw))
    }
}
