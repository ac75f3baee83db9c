//! # Approval State Machine
//!
//! Tracks whether a spender may move the tokens a transaction needs.
//!
//! ```text
//! UNKNOWN -> NOT_APPROVED -> PENDING -> APPROVED
//!                 ^             |
//!                 +-- failure --+
//! ```
//!
//! The state is derived from the on-chain allowance and the local submission, and is
//! re-derived from scratch whenever the required amount changes. Every asynchronous
//! completion carries an [`ApprovalTicket`]; a ticket from before a cancel or an
//! amount change is stale and applies nothing.

use alloy::primitives::{Address, TxHash, U256};
use derive_more::Display;

use crate::error::{DexError, DexResult};
use crate::math::ExactAmount;
use crate::models::Currency;
use crate::tx::call::RouterCall;

/// Where an approval stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ApprovalState {
    /// Not enough information to tell
    #[display("UNKNOWN")]
    Unknown,
    /// The allowance is below the required amount
    #[display("NOT_APPROVED")]
    NotApproved,
    /// An approve transaction is in flight
    #[display("PENDING")]
    Pending,
    /// The allowance covers the required amount
    #[display("APPROVED")]
    Approved,
}

/// Generation an asynchronous completion belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApprovalTicket(u64);

/// Approval bookkeeping for one currency and spender
#[derive(Debug, Clone)]
pub struct ApprovalRecord {
    /// What is being spent
    currency: Currency,
    /// Who spends it; usually the router
    spender: Option<Address>,
    /// What the next transaction will spend
    required: Option<ExactAmount>,
    /// Last allowance read from chain
    allowance: Option<ExactAmount>,
    /// Current state
    state: ApprovalState,
    /// Hash of the approve transaction once accepted
    pending_tx: Option<TxHash>,
    /// Bumped whenever earlier completions must stop applying
    generation: u64,
}

impl ApprovalRecord {
    /// A record with nothing known yet
    #[must_use]
    pub const fn new(currency: Currency, spender: Option<Address>) -> Self {
        Self {
            currency,
            spender,
            required: None,
            allowance: None,
            state: ApprovalState::Unknown,
            pending_tx: None,
            generation: 0,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ApprovalState {
        self.state
    }

    /// Amount the next transaction spends
    #[must_use]
    pub const fn required(&self) -> Option<&ExactAmount> {
        self.required.as_ref()
    }

    /// The spender
    #[must_use]
    pub const fn spender(&self) -> Option<Address> {
        self.spender
    }

    /// Hash of the in-flight approve transaction
    #[must_use]
    pub const fn pending_tx(&self) -> Option<TxHash> {
        self.pending_tx
    }

    /// Ticket for a completion started now (an allowance read, typically)
    #[must_use]
    pub const fn ticket(&self) -> ApprovalTicket {
        ApprovalTicket(self.generation)
    }

    /// Change what the next transaction spends.
    ///
    /// A different amount discards the known allowance and anything in flight, and
    /// the state falls back to what can be derived without them.
    pub fn set_required(&mut self, required: Option<ExactAmount>) {
        if self.required == required {
            return;
        }
        log::debug!(
            "approval::set_required: {:?} -> {required:?}",
            self.required
        );
        self.required = required;
        self.allowance = None;
        self.pending_tx = None;
        self.state = ApprovalState::Unknown;
        self.generation += 1;
        self.state = self.derive();
    }

    /// Apply an allowance read.
    ///
    /// # Errors
    ///
    /// `StaleRequest` if the read was started before the last amount change,
    /// submission or cancel; `TokenMismatch` if the allowance is in another token
    pub fn apply_allowance(&mut self, ticket: ApprovalTicket, allowance: ExactAmount) -> DexResult<ApprovalState> {
        self.check(ticket)?;
        if let Some(required) = &self.required {
            if required.token() != allowance.token() {
                return Err(DexError::TokenMismatch {
                    left: format!("{:?}", allowance.token()),
                    right: format!("{:?}", required.token()),
                });
            }
        }
        self.allowance = Some(allowance);
        self.state = self.derive();
        Ok(self.state)
    }

    /// Enter `PENDING` ahead of sending an approve transaction.
    ///
    /// `ticket` is the one taken when the approve candidates were built, so a cancel
    /// or amount change while they were being estimated stops the submission.
    ///
    /// # Returns
    ///
    /// The ticket the submission and confirmation results must carry
    ///
    /// # Errors
    ///
    /// `StaleRequest` for an outdated ticket; `InvalidApprovalTransition` unless the
    /// state is exactly `NOT_APPROVED`
    pub fn begin_submission(&mut self, ticket: ApprovalTicket) -> DexResult<ApprovalTicket> {
        self.check(ticket)?;
        self.transition(ApprovalState::Pending)?;
        self.generation += 1;
        Ok(self.ticket())
    }

    /// The approve transaction was accepted by the node
    ///
    /// # Errors
    ///
    /// `StaleRequest` for an outdated ticket
    pub fn submission_accepted(&mut self, ticket: ApprovalTicket, hash: TxHash) -> DexResult<()> {
        self.check(ticket)?;
        self.pending_tx = Some(hash);
        Ok(())
    }

    /// The approve transaction was never sent. Returns to `NOT_APPROVED`.
    ///
    /// # Errors
    ///
    /// `StaleRequest` for an outdated ticket, otherwise always `SubmissionRejected`
    /// carrying `reason`
    pub fn submission_failed(&mut self, ticket: ApprovalTicket, reason: impl Into<String>) -> DexResult<()> {
        self.check(ticket)?;
        let reason = reason.into();
        log::warn!("approval::submission_failed: {reason}");
        self.settle(ApprovalState::NotApproved);
        Err(DexError::SubmissionRejected(reason))
    }

    /// The approve transaction was mined.
    ///
    /// # Errors
    ///
    /// `StaleRequest` for an outdated ticket; `ConfirmationFailed` if it reverted,
    /// after returning to `NOT_APPROVED`
    pub fn confirmed(&mut self, ticket: ApprovalTicket, success: bool) -> DexResult<()> {
        self.check(ticket)?;
        let hash = self.pending_tx.map(|h| h.to_string()).unwrap_or_default();
        if success {
            self.settle(ApprovalState::Approved);
            Ok(())
        } else {
            log::warn!("approval::confirmed: approve {hash} reverted");
            self.settle(ApprovalState::NotApproved);
            Err(DexError::ConfirmationFailed {
                hash,
                reason: "approve transaction reverted".to_string(),
            })
        }
    }

    /// Abandon whatever is in flight; its completions will be rejected as stale
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending_tx = None;
        if self.state == ApprovalState::Pending {
            self.state = ApprovalState::Unknown;
            self.state = self.derive();
        }
    }

    /// Calls that grant the approval, unlimited first.
    ///
    /// # Errors
    ///
    /// `InvalidApprovalTransition` unless `NOT_APPROVED`, `MissingDependency` without
    /// a required amount or spender
    pub fn approve_candidates(&self) -> DexResult<Vec<RouterCall>> {
        if self.state != ApprovalState::NotApproved {
            return Err(DexError::InvalidApprovalTransition {
                from: self.state,
                to: ApprovalState::Pending,
            });
        }
        let required = self.required.as_ref().ok_or(DexError::MissingDependency("amount to approve"))?;
        let spender = self.spender.ok_or(DexError::MissingDependency("spender"))?;
        let token = required.token().address();

        Ok(vec![
            RouterCall::Approve {
                token,
                spender,
                amount: U256::MAX,
            },
            RouterCall::Approve {
                token,
                spender,
                amount: required.raw(),
            },
        ])
    }

    /// Move to `to` if the machine allows it
    fn transition(&mut self, to: ApprovalState) -> DexResult<()> {
        let allowed = matches!(
            (self.state, to),
            (ApprovalState::NotApproved, ApprovalState::Pending)
        );
        if !allowed {
            return Err(DexError::InvalidApprovalTransition { from: self.state, to });
        }
        self.state = to;
        Ok(())
    }

    /// Land a finished submission in `state`
    fn settle(&mut self, state: ApprovalState) {
        self.state = state;
        self.pending_tx = None;
        self.generation += 1;
    }

    /// Reject tickets from an earlier generation
    fn check(&self, ticket: ApprovalTicket) -> DexResult<()> {
        if ticket.0 == self.generation {
            Ok(())
        } else {
            log::debug!(
                "approval::check: dropped completion from generation {} (now {})",
                ticket.0,
                self.generation
            );
            Err(DexError::StaleRequest)
        }
    }

    /// State implied by what is known
    fn derive(&self) -> ApprovalState {
        let Some(required) = &self.required else {
            return ApprovalState::Unknown;
        };
        if self.spender.is_none() {
            return ApprovalState::Unknown;
        }
        if self.currency.is_native() {
            return ApprovalState::Approved;
        }
        let Some(allowance) = &self.allowance else {
            return ApprovalState::Unknown;
        };
        if allowance.raw() >= required.raw() {
            ApprovalState::Approved
        } else if self.state == ApprovalState::Pending {
            ApprovalState::Pending
        } else {
            ApprovalState::NotApproved
        }
    }
}
