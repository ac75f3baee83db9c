//! Error handling for the value and submission core

use thiserror::Error;

use crate::approval::ApprovalState;

/// Convenience alias for results carrying a [`DexError`]
pub type DexResult<T> = Result<T, DexError>;

/// Everything the core can surface to its caller.
///
/// Variants carry enough context (symbols, amounts, method names) for the
/// caller to render a message. None of them is retried by the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DexError {
    /// The caller asked for more than it holds
    #[error("Insufficient {symbol} balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Symbol of the token being spent
        symbol: String,
        /// Requested amount, human readable
        requested: String,
        /// Available amount, human readable
        available: String,
    },

    /// The pool has no liquidity tokens in circulation
    #[error("Pool {pair} has zero total supply")]
    EmptyPool {
        /// `SYM0/SYM1` of the pool
        pair: String,
    },

    /// Division by a zero magnitude or a zero fraction
    #[error("Division by zero")]
    DivisionByZero,

    /// An intermediate result does not fit 256 bits
    #[error("Arithmetic overflow")]
    Overflow,

    /// A subtraction would go below zero
    #[error("Arithmetic underflow")]
    Underflow,

    /// Two amounts of different tokens were combined
    #[error("Token mismatch: {left} vs {right}")]
    TokenMismatch {
        /// Token of the left operand
        left: String,
        /// Token of the right operand
        right: String,
    },

    /// Typed input could not be turned into an amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A feed snapshot failed validation at the boundary
    #[error("Invalid feed data: {0}")]
    InvalidFeed(String),

    /// The approval state machine refused a transition
    #[error("Invalid approval transition from {from} to {to}")]
    InvalidApprovalTransition {
        /// State the record was in
        from: ApprovalState,
        /// State that was requested
        to: ApprovalState,
    },

    /// A spending call was built before the spender was approved
    #[error("Attempting to confirm without approval of {symbol}")]
    NotApproved {
        /// Symbol of the token lacking approval
        symbol: String,
    },

    /// Every candidate call failed gas estimation
    #[error("This transaction would fail, all gas estimates failed: {}", format_failures(.failures))]
    AllEstimatesFailed {
        /// `(method, reason)` for each candidate, in list order
        failures: Vec<(String, String)>,
    },

    /// Required context (chain id, deadline, signer, recipient) is absent
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),

    /// The user or the node declined the submission
    #[error("Transaction rejected: {0}")]
    SubmissionRejected(String),

    /// The transaction was mined but reverted, or waiting for it failed
    #[error("Transaction {hash} failed: {reason}")]
    ConfirmationFailed {
        /// Transaction hash, 0x-hex
        hash: String,
        /// Why it is considered failed
        reason: String,
    },

    /// The result belongs to a cancelled or superseded request
    #[error("Stale request result dropped")]
    StaleRequest,
}

/// Render `(method, reason)` pairs as `method (reason), ...`
fn format_failures(failures: &[(String, String)]) -> String {
    use itertools::Itertools;

    failures
        .iter()
        .map(|(method, reason)| format!("{method} ({reason})"))
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_estimates_failed_lists_methods_in_order() {
        let err = DexError::AllEstimatesFailed {
            failures: vec![
                ("removeLiquidityETH".to_string(), "execution reverted".to_string()),
                (
                    "removeLiquidityETHSupportingFeeOnTransferTokens".to_string(),
                    "out of gas".to_string(),
                ),
            ],
        };
        assert_eq!(
            err.to_string(),
            "This transaction would fail, all gas estimates failed: \
             removeLiquidityETH (execution reverted), \
             removeLiquidityETHSupportingFeeOnTransferTokens (out of gas)"
        );
    }

    #[test]
    fn test_insufficient_balance_message() {
        let err = DexError::InsufficientBalance {
            symbol: "QUICK".to_string(),
            requested: "2".to_string(),
            available: "1.5".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient QUICK balance: requested 2, available 1.5"
        );
    }
}
