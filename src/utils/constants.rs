use alloy::primitives::{address, Address};

use crate::models::token::Token;

/// Ethereum mainnet chain id
pub const ETHEREUM: u64 = 1;
/// Polygon PoS chain id
pub const POLYGON: u64 = 137;

/// QuickSwap V2 router on Polygon
pub const QUICKSWAP_ROUTER: Address = address!("0xa5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff");

/// Basis points in one whole
pub const BIPS_BASE: u64 = 10_000;
/// 0.50%
pub const DEFAULT_SLIPPAGE_BPS: u64 = 50;
/// 20 minutes
pub const DEFAULT_DEADLINE_SECS: u64 = 20 * 60;
/// +10% on top of every gas estimate
pub const DEFAULT_GAS_MARGIN_BPS: u64 = 1_000;

/// Share of each swap's volume paid to liquidity providers (0.25% of the 0.30% fee)
pub const FEE_PERCENT: f64 = 0.0025;

/// WMATIC
const WMATIC_POLYGON: Address = address!("0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270");
/// WETH on Ethereum
const WETH_ETHEREUM: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

/// The wrapped native token for a chain, if the chain is known
#[must_use]
pub fn wrapped_native(chain_id: u64) -> Option<Token> {
    match chain_id {
        POLYGON => Some(
            Token::new(POLYGON, WMATIC_POLYGON, 18, "WMATIC").with_name("Wrapped Matic"),
        ),
        ETHEREUM => Some(
            Token::new(ETHEREUM, WETH_ETHEREUM, 18, "WETH").with_name("Wrapped Ether"),
        ),
        _ => None,
    }
}

/// Tokens offered as one-click picks in the token selector, wrapped native first
#[must_use]
pub fn common_bases(chain_id: u64) -> Vec<Token> {
    let mut bases: Vec<Token> = wrapped_native(chain_id).into_iter().collect();
    if chain_id == POLYGON {
        bases.extend([
            Token::new(POLYGON, address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"), 6, "USDC"),
            Token::new(POLYGON, address!("0x831753DD7087CaC61aB5644b308642cc1c33Dc13"), 18, "QUICK"),
            Token::new(POLYGON, address!("0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619"), 18, "ETH"),
            Token::new(POLYGON, address!("0xc2132D05D31c914a87C6611C10748AEb04B58e8F"), 6, "USDT"),
            Token::new(POLYGON, address!("0x8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063"), 18, "DAI"),
        ]);
    }
    bases
}
