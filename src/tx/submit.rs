use std::sync::{Mutex, MutexGuard, PoisonError};

use alloy::primitives::TxHash;
use async_trait::async_trait;

use super::call::RouterCall;
use super::resolver::{GasEstimator, MethodCall, MethodResolver, ResolvedCall};
use super::tracker::{TxId, TxTracker};
use crate::approval::ApprovalRecord;
use crate::error::{DexError, DexResult};

/// How a mined transaction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// Whether it executed without reverting
    pub success: bool,
    /// Block it was included in
    pub block_number: u64,
}

/// Signs, sends and watches transactions
#[async_trait]
pub trait TransactionSubmitter<C: Sync>: Send + Sync {
    /// Send `call` with its gas limit; resolves once the node accepted it
    async fn submit(&self, call: &ResolvedCall<C>) -> eyre::Result<TxHash>;

    /// Wait until `hash` is mined
    async fn wait(&self, hash: TxHash) -> eyre::Result<Confirmation>;
}

/// A transaction the node accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitted {
    /// Local tracker id
    pub id: TxId,
    /// Transaction hash
    pub hash: TxHash,
    /// Gas limit it was sent with
    pub gas_limit: u64,
}

/// Runs resolve, submit and confirm for router calls and records every step in a
/// [`TxTracker`].
///
/// Nothing is retried. Once a transaction is tracked it always ends `Confirmed` or
/// `Failed`, whichever step goes wrong.
pub struct TxFlow<'a, E: ?Sized, S: ?Sized> {
    /// Picks the candidate to send
    resolver: MethodResolver,
    /// Gas estimation collaborator
    estimator: &'a E,
    /// Submission collaborator
    submitter: &'a S,
    /// Where progress is recorded
    tracker: TxTracker,
}

impl<'a, E, S> TxFlow<'a, E, S>
where
    E: GasEstimator<RouterCall> + ?Sized,
    S: TransactionSubmitter<RouterCall> + ?Sized,
{
    /// Creates a flow over the given collaborators
    pub const fn new(resolver: MethodResolver, estimator: &'a E, submitter: &'a S, tracker: TxTracker) -> Self {
        Self {
            resolver,
            estimator,
            submitter,
            tracker,
        }
    }

    /// The tracker this flow records to
    #[must_use]
    pub const fn tracker(&self) -> &TxTracker {
        &self.tracker
    }

    /// Resolve `candidates` and send the winner.
    ///
    /// # Errors
    ///
    /// `AllEstimatesFailed` (nothing is sent) or `SubmissionRejected`; the tracked
    /// transaction is `Failed` in both cases
    pub async fn send(&self, summary: &str, candidates: Vec<RouterCall>) -> DexResult<Submitted> {
        let id = self.tracker.begin(summary);

        let resolved = match self.resolver.resolve(self.estimator, candidates).await {
            Ok(resolved) => resolved,
            Err(e) => {
                self.tracker.failed(id, e.to_string());
                return Err(e);
            }
        };

        match self.submitter.submit(&resolved).await {
            Ok(hash) => {
                log::info!(
                    "tx::submit: {} accepted as {hash}",
                    resolved.call.method_name()
                );
                self.tracker.accepted(id, hash);
                Ok(Submitted {
                    id,
                    hash,
                    gas_limit: resolved.gas_limit,
                })
            }
            Err(e) => {
                log::warn!("tx::submit: {} rejected: {e}", resolved.call.method_name());
                self.tracker.failed(id, e.to_string());
                Err(DexError::SubmissionRejected(e.to_string()))
            }
        }
    }

    /// Wait for an accepted transaction to be mined.
    ///
    /// # Errors
    ///
    /// `ConfirmationFailed` if it reverted or could not be watched; the tracked
    /// transaction is `Failed`
    pub async fn confirm(&self, submitted: &Submitted) -> DexResult<Confirmation> {
        let failed = |reason: String| {
            self.tracker.failed(submitted.id, reason.clone());
            DexError::ConfirmationFailed {
                hash: submitted.hash.to_string(),
                reason,
            }
        };

        match self.submitter.wait(submitted.hash).await {
            Ok(confirmation) if confirmation.success => {
                self.tracker.confirmed(submitted.id, confirmation.block_number);
                Ok(confirmation)
            }
            Ok(confirmation) => Err(failed(format!("reverted in block {}", confirmation.block_number))),
            Err(e) => Err(failed(e.to_string())),
        }
    }

    /// Send and confirm a withdrawal built from
    /// [`remove_liquidity_candidates`](super::call::remove_liquidity_candidates).
    ///
    /// # Errors
    ///
    /// Anything [`TxFlow::send`] or [`TxFlow::confirm`] fails with
    pub async fn remove_liquidity(&self, summary: &str, candidates: Vec<RouterCall>) -> DexResult<Confirmation> {
        let submitted = self.send(summary, candidates).await?;
        self.confirm(&submitted).await
    }

    /// Run an approval: `NOT_APPROVED -> PENDING -> APPROVED`.
    ///
    /// The record is locked only between awaits. If the record was cancelled or its
    /// amount changed meanwhile, the late results are dropped and `StaleRequest` is
    /// returned, while the tracked transaction still reaches its terminal status.
    /// A cancel or amount change during gas estimation sends nothing.
    ///
    /// # Errors
    ///
    /// * `InvalidApprovalTransition` unless the record is `NOT_APPROVED`
    /// * `AllEstimatesFailed`, the record stays `NOT_APPROVED`
    /// * `SubmissionRejected` or `ConfirmationFailed`, the record returns to `NOT_APPROVED`
    /// * `StaleRequest` when superseded
    pub async fn approve(&self, summary: &str, record: &Mutex<ApprovalRecord>) -> DexResult<Confirmation> {
        let (candidates, ticket) = {
            let record = lock(record);
            (record.approve_candidates()?, record.ticket())
        };

        let id = self.tracker.begin(summary);
        let resolved = match self.resolver.resolve(self.estimator, candidates).await {
            Ok(resolved) => resolved,
            Err(e) => {
                self.tracker.failed(id, e.to_string());
                return Err(e);
            }
        };

        let begun = lock(record).begin_submission(ticket);
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(e) => {
                self.tracker.failed(id, e.to_string());
                return Err(e);
            }
        };

        let hash = match self.submitter.submit(&resolved).await {
            Ok(hash) => hash,
            Err(e) => {
                self.tracker.failed(id, e.to_string());
                lock(record).submission_failed(ticket, e.to_string())?;
                return Err(DexError::SubmissionRejected(e.to_string()));
            }
        };
        self.tracker.accepted(id, hash);
        let current = lock(record).submission_accepted(ticket, hash);

        let submitted = Submitted {
            id,
            hash,
            gas_limit: resolved.gas_limit,
        };
        let outcome = self.confirm(&submitted).await;
        current?;
        match outcome {
            Ok(confirmation) => {
                lock(record).confirmed(ticket, true)?;
                Ok(confirmation)
            }
            Err(e) => {
                let settled = lock(record).confirmed(ticket, false);
                match settled {
                    Err(DexError::StaleRequest) => Err(DexError::StaleRequest),
                    _ => Err(e),
                }
            }
        }
    }
}

/// Lock an approval record; each mutation is one step so poisoning leaves it consistent
fn lock(record: &Mutex<ApprovalRecord>) -> MutexGuard<'_, ApprovalRecord> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use alloy::primitives::{Address, U256};

    use super::*;
    use crate::approval::ApprovalState;
    use crate::models::Currency;
    use crate::test_helpers::{address_from_str, amount, lp_token};
    use crate::tx::tracker::TxStatus;

    /// Estimates by method name, answers submissions and confirmations from a script
    struct ScriptedChain {
        estimates: HashMap<&'static str, Result<u64, &'static str>>,
        submit: Result<TxHash, &'static str>,
        confirmation: Result<Confirmation, &'static str>,
        estimate_delay: Duration,
        sent: Mutex<Vec<(String, u64)>>,
        approval_amounts: Mutex<Vec<U256>>,
    }

    impl ScriptedChain {
        fn new(estimates: &[(&'static str, Result<u64, &'static str>)]) -> Self {
            Self {
                estimates: estimates.iter().copied().collect(),
                submit: Ok(TxHash::repeat_byte(9)),
                confirmation: Ok(Confirmation {
                    success: true,
                    block_number: 100,
                }),
                estimate_delay: Duration::ZERO,
                sent: Mutex::new(Vec::new()),
                approval_amounts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GasEstimator<RouterCall> for ScriptedChain {
        async fn estimate_gas(&self, call: &RouterCall) -> eyre::Result<u64> {
            tokio::time::sleep(self.estimate_delay).await;
            if let RouterCall::Approve { amount, .. } = call {
                self.approval_amounts.lock().unwrap().push(*amount);
                // unlimited approvals are refused by this token
                if *amount == U256::MAX {
                    return Err(eyre::eyre!("approve amount exceeds allowance cap"));
                }
            }
            self.estimates
                .get(call.method_name())
                .copied()
                .unwrap_or(Err("unknown method"))
                .map_err(|reason| eyre::eyre!(reason))
        }
    }

    #[async_trait]
    impl TransactionSubmitter<RouterCall> for ScriptedChain {
        async fn submit(&self, call: &ResolvedCall<RouterCall>) -> eyre::Result<TxHash> {
            self.sent
                .lock()
                .unwrap()
                .push((call.call.method_name().to_string(), call.gas_limit));
            self.submit.map_err(|reason| eyre::eyre!(reason))
        }

        async fn wait(&self, _hash: TxHash) -> eyre::Result<Confirmation> {
            self.confirmation.map_err(|reason| eyre::eyre!(reason))
        }
    }

    fn removal_candidates() -> Vec<RouterCall> {
        let removal = crate::tx::call::NativeRemoval {
            token: address_from_str("USDC"),
            liquidity: U256::from(500),
            amount_token_min: U256::from(1),
            amount_eth_min: U256::from(1),
            to: address_from_str("alice"),
            deadline: U256::from(1_700_001_200),
        };
        vec![
            RouterCall::RemoveLiquidityEth(removal.clone()),
            RouterCall::RemoveLiquidityEthSupportingFeeOnTransferTokens(removal),
        ]
    }

    fn not_approved_record() -> Mutex<ApprovalRecord> {
        let lp = lp_token("WMATIC-USDC-LP");
        let mut record = ApprovalRecord::new(Currency::Token(lp.clone()), Some(address_from_str("router")));
        record.set_required(Some(amount(&lp, 1_000)));
        let ticket = record.ticket();
        record.apply_allowance(ticket, amount(&lp, 0)).unwrap();
        Mutex::new(record)
    }

    #[tokio::test]
    async fn test_remove_liquidity_falls_back_to_fee_on_transfer() {
        let chain = ScriptedChain::new(&[
            ("removeLiquidityETH", Err("execution reverted: TransferHelper")),
            ("removeLiquidityETHSupportingFeeOnTransferTokens", Ok(200_000)),
        ]);
        let flow = TxFlow::new(MethodResolver::default(), &chain, &chain, TxTracker::new());

        let confirmation = flow
            .remove_liquidity("Remove 5 MATIC and 10 USDC", removal_candidates())
            .await
            .unwrap();

        assert_eq!(confirmation.block_number, 100);
        assert_eq!(
            *chain.sent.lock().unwrap(),
            vec![("removeLiquidityETHSupportingFeeOnTransferTokens".to_string(), 220_000)]
        );
        assert_eq!(flow.tracker().all()[0].1.status, TxStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_nothing_sent_when_all_estimates_fail() {
        let chain = ScriptedChain::new(&[
            ("removeLiquidityETH", Err("execution reverted")),
            ("removeLiquidityETHSupportingFeeOnTransferTokens", Err("execution reverted")),
        ]);
        let flow = TxFlow::new(MethodResolver::default(), &chain, &chain, TxTracker::new());

        let err = flow.send("Remove", removal_candidates()).await.unwrap_err();

        assert!(matches!(err, DexError::AllEstimatesFailed { ref failures } if failures.len() == 2));
        assert!(chain.sent.lock().unwrap().is_empty());
        assert_eq!(flow.tracker().all()[0].1.status, TxStatus::Failed);
    }

    #[tokio::test]
    async fn test_revert_lands_in_failed() {
        let mut chain = ScriptedChain::new(&[("removeLiquidityETH", Ok(100_000))]);
        chain.confirmation = Ok(Confirmation {
            success: false,
            block_number: 7,
        });
        let flow = TxFlow::new(MethodResolver::default(), &chain, &chain, TxTracker::new());

        let err = flow.remove_liquidity("Remove", removal_candidates()).await.unwrap_err();

        assert!(matches!(err, DexError::ConfirmationFailed { .. }));
        assert_eq!(flow.tracker().all()[0].1.status, TxStatus::Failed);
    }

    #[tokio::test]
    async fn test_approve_uses_exact_amount_when_unlimited_fails() {
        let chain = ScriptedChain::new(&[("approve", Ok(46_000))]);
        let flow = TxFlow::new(MethodResolver::default(), &chain, &chain, TxTracker::new());
        let record = not_approved_record();

        flow.approve("Approve WMATIC-USDC-LP", &record).await.unwrap();

        assert_eq!(lock(&record).state(), ApprovalState::Approved);
        assert_eq!(
            *chain.approval_amounts.lock().unwrap(),
            vec![U256::MAX, U256::from(1_000)]
        );
        assert_eq!(chain.sent.lock().unwrap()[0], ("approve".to_string(), 50_600));
    }

    #[tokio::test]
    async fn test_rejected_approval_returns_to_not_approved() {
        let mut chain = ScriptedChain::new(&[("approve", Ok(46_000))]);
        chain.submit = Err("User denied transaction signature");
        let flow = TxFlow::new(MethodResolver::default(), &chain, &chain, TxTracker::new());
        let record = not_approved_record();

        let err = flow.approve("Approve", &record).await.unwrap_err();

        assert_eq!(
            err,
            DexError::SubmissionRejected("User denied transaction signature".to_string())
        );
        assert_eq!(lock(&record).state(), ApprovalState::NotApproved);
        assert_eq!(flow.tracker().all()[0].1.status, TxStatus::Failed);
    }

    #[tokio::test]
    async fn test_cancel_during_estimate_sends_nothing() {
        let mut chain = ScriptedChain::new(&[("approve", Ok(46_000))]);
        chain.estimate_delay = Duration::from_millis(100);
        let flow = TxFlow::new(MethodResolver::default(), &chain, &chain, TxTracker::new());
        let record = not_approved_record();

        let (result, ()) = tokio::join!(flow.approve("Approve", &record), async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            lock(&record).cancel();
        });

        assert_eq!(result.unwrap_err(), DexError::StaleRequest);
        assert!(chain.sent.lock().unwrap().is_empty());
        assert_eq!(lock(&record).state(), ApprovalState::NotApproved);
        assert_eq!(flow.tracker().all()[0].1.status, TxStatus::Failed);
    }

    #[tokio::test]
    async fn test_amount_change_during_estimate_sends_nothing() {
        let mut chain = ScriptedChain::new(&[("approve", Ok(46_000))]);
        chain.estimate_delay = Duration::from_millis(100);
        let flow = TxFlow::new(MethodResolver::default(), &chain, &chain, TxTracker::new());
        let record = not_approved_record();
        let lp = lp_token("WMATIC-USDC-LP");

        let (result, ()) = tokio::join!(flow.approve("Approve", &record), async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let mut record = lock(&record);
            record.set_required(Some(amount(&lp, 5_000)));
            let ticket = record.ticket();
            record.apply_allowance(ticket, amount(&lp, 0)).unwrap();
        });

        assert_eq!(result.unwrap_err(), DexError::StaleRequest);
        assert!(chain.sent.lock().unwrap().is_empty());
        let record = lock(&record);
        assert_eq!(record.state(), ApprovalState::NotApproved);
        assert_eq!(record.required().unwrap().raw(), U256::from(5_000));
    }

    #[tokio::test]
    async fn test_approve_refused_outside_not_approved() {
        let chain = ScriptedChain::new(&[]);
        let flow = TxFlow::new(MethodResolver::default(), &chain, &chain, TxTracker::new());
        let record = Mutex::new(ApprovalRecord::new(Currency::Native, Some(Address::ZERO)));

        let err = flow.approve("Approve", &record).await.unwrap_err();
        assert!(matches!(err, DexError::InvalidApprovalTransition { .. }));
        assert!(flow.tracker().pending().is_empty());
    }
}
