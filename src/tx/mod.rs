//! # Transactions
//!
//! From semantic call candidates to a mined transaction:
//!
//! 1. [`call`] builds the ordered candidates for a withdrawal or approval
//! 2. [`resolver`] estimates all of them at once and keeps the first that would succeed
//! 3. [`submit`] sends the winner and waits for it
//! 4. [`tracker`] records every step so each transaction ends confirmed or failed

/// Router and token call descriptors
pub mod call;
/// Gas-estimation based method selection
pub mod resolver;
/// Submission and confirmation flow
pub mod submit;
/// Session transaction list
pub mod tracker;

pub use call::{deadline_from, remove_liquidity_candidates, CallContext, NativeRemoval, RouterCall};
pub use resolver::{GasEstimateAttempt, GasEstimator, MethodCall, MethodResolver, ResolvedCall};
pub use submit::{Confirmation, Submitted, TransactionSubmitter, TxFlow};
pub use tracker::{TrackedTx, TxId, TxStatus, TxTracker};
