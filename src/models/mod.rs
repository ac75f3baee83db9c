//! # Models
//!
//! The typed data the core computes on. Everything here is an immutable snapshot;
//! raw feed payloads become these types in [`crate::feed`].

/// Pool reserves and LP supply
pub mod pair;
/// Liquidity-mining programs and indexer pair aggregates
pub mod staking;
/// Tokens and currencies
pub mod token;

pub use pair::PoolSnapshot;
pub use staking::{PairStats, StakingInfo};
pub use token::{Currency, Token};
