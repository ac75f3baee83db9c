/*!
 * # lpdesk - Liquidity Position Desk
 *
 * Value calculation and transaction submission for Uniswap V2 style pools:
 * what a liquidity position is worth, what removing part of it returns, whether
 * the router may spend the LP tokens, and which router method will go through.
 *
 * ## Module Structure
 *
 * - `math`: exact token amounts, fractions and percents
 * - `models`: tokens, pool snapshots, staking programs
 * - `feed`: chain and indexer inputs, validated
 * - `liquidity`: position value and withdrawal quotes
 * - `approval`: the allowance state machine
 * - `tx`: call candidates, gas-based method resolution, submission
 * - `apy`: fee and reward yields, reward countdown
 * - `chain`: the alloy-backed client
 * - `config`: environment configuration
 * - `utils`: constants, logging, app context
 */

/// Approval state machine
pub mod approval;
/// Fee and reward yields
pub mod apy;
/// Alloy chain client
pub mod chain;
/// Configuration management
pub mod config;
/// Error taxonomy
pub mod error;
/// Chain and indexer inputs
pub mod feed;
/// Withdrawal calculation
pub mod liquidity;
/// Exact arithmetic
pub mod math;
/// Data models
pub mod models;
/// Transaction building and submission
pub mod tx;
/// Utility functions and helpers
pub mod utils;

#[cfg(test)]
mod test_helpers;

pub use error::{DexError, DexResult};
