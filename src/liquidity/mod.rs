//! # Liquidity Withdrawal
//!
//! Turns one typed field of the remove-liquidity form into the exact LP amount to
//! burn, the tokens it redeems for and the slippage-bounded minimums the router
//! call carries. All amounts are floored, so a quote never promises more than the
//! pair contract pays out.

/// What an LP balance is worth in its pool
pub mod position;
/// The withdrawal calculator
pub mod withdraw;

pub use position::PoolPosition;
pub use withdraw::{minimum_out, Field, WithdrawInput, WithdrawalCalculator, WithdrawalQuote};
