//! # Chain Client
//!
//! [`RouterClient`] is the production side of the seams in [`crate::feed`] and
//! [`crate::tx`]: it reads pairs and balances and estimates, sends and waits for
//! router calls over an alloy provider.

/// Alloy-backed reader, estimator and submitter
pub mod router;

pub use router::RouterClient;

use alloy::network::Ethereum;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use eyre::Result;

use crate::config::Config;

/// Contract bindings
mod abi {
    #![allow(missing_docs, clippy::pedantic, clippy::missing_docs_in_private_items)]

    use alloy::sol;

    sol! {
        #[sol(rpc)]
        interface IERC20 {
            function decimals() external view returns (uint8);
            function symbol() external view returns (string);
            function balanceOf(address owner) external view returns (uint256);
            function allowance(address owner, address spender) external view returns (uint256);
            function approve(address spender, uint256 amount) external returns (bool);
        }
    }

    sol! {
        #[sol(rpc)]
        interface IUniswapV2Pair {
            function token0() external view returns (address);
            function token1() external view returns (address);
            function totalSupply() external view returns (uint256);
            function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        }
    }

    sol! {
        #[sol(rpc)]
        interface IUniswapV2Router02 {
            function removeLiquidity(
                address tokenA,
                address tokenB,
                uint256 liquidity,
                uint256 amountAMin,
                uint256 amountBMin,
                address to,
                uint256 deadline
            ) external returns (uint256 amountA, uint256 amountB);

            function removeLiquidityETH(
                address token,
                uint256 liquidity,
                uint256 amountTokenMin,
                uint256 amountETHMin,
                address to,
                uint256 deadline
            ) external returns (uint256 amountToken, uint256 amountETH);

            function removeLiquidityETHSupportingFeeOnTransferTokens(
                address token,
                uint256 liquidity,
                uint256 amountTokenMin,
                uint256 amountETHMin,
                address to,
                uint256 deadline
            ) external returns (uint256 amountETH);
        }
    }
}

/// Connects to the configured RPC endpoint and wraps the router from `config`.
///
/// # Errors
///
/// If no RPC URL is configured
pub fn connect(config: &Config) -> Result<RouterClient<RootProvider<Ethereum>>> {
    let url = config.require_rpc_url()?.clone();
    let provider = ProviderBuilder::new().on_http(url);
    log::info!("chain::connect: chain {} router {}", config.chain_id, config.router);
    Ok(RouterClient::new(
        (*provider.root()).clone(),
        config.chain_id,
        config.router,
        config.account,
    ))
}
