use alloy::primitives::{keccak256, Address, U256};

use crate::math::ExactAmount;
use crate::models::pair::PoolSnapshot;
use crate::models::token::Token;
use crate::utils::constants::POLYGON;

/// Deterministic address for a symbol, so `token("USDC", 6) == token("USDC", 6)`
pub fn address_from_str(symbol: &str) -> Address {
    Address::from_slice(&keccak256(symbol.as_bytes())[12..])
}

/// Polygon token whose address derives from `symbol`
pub fn token(symbol: &str, decimals: u8) -> Token {
    Token::new(POLYGON, address_from_str(symbol), decimals, symbol)
}

/// 18-decimal LP token
pub fn lp_token(symbol: &str) -> Token {
    token(symbol, 18)
}

/// `raw` units of `token`
pub fn amount(token: &Token, raw: u128) -> ExactAmount {
    ExactAmount::from_raw(token.clone(), U256::from(raw))
}

/// Pool snapshot from `(symbol, decimals, reserve)` sides
///
/// `pool(("USDC", 6, reserve), ("WETH", 18, reserve), total_supply)`
pub fn pool(side_a: (&str, u8, u128), side_b: (&str, u8, u128), total_supply: u128) -> PoolSnapshot {
    let (symbol_a, decimals_a, reserve_a) = side_a;
    let (symbol_b, decimals_b, reserve_b) = side_b;
    #[allow(clippy::unwrap_used)]
    PoolSnapshot::new(
        lp_token(&format!("{symbol_a}-{symbol_b}-LP")),
        token(symbol_a, decimals_a),
        token(symbol_b, decimals_b),
        U256::from(reserve_a),
        U256::from(reserve_b),
        U256::from(total_supply),
    )
    .unwrap()
}
