use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::TxHash;
use derive_more::Display;

/// Where a tracked transaction stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TxStatus {
    /// Being estimated or signed, no hash yet
    #[display("attempting")]
    Attempting,
    /// Accepted by the node, not mined yet
    #[display("pending")]
    Pending,
    /// Mined successfully
    #[display("confirmed")]
    Confirmed,
    /// Never sent, reverted, or lost
    #[display("failed")]
    Failed,
}

impl TxStatus {
    /// Whether the transaction is finished one way or another
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

/// Local id of a tracked transaction, known before its hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub struct TxId(u64);

/// One transaction as the user sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTx {
    /// `Remove 1.23 MATIC and 4.56 USDC`, `Approve WMATIC-USDC LP`
    pub summary: String,
    /// Current status
    pub status: TxStatus,
    /// Hash once accepted
    pub hash: Option<TxHash>,
    /// Block it was mined in
    pub block_number: Option<u64>,
    /// Why it failed
    pub error: Option<String>,
    /// Unix time it was added
    pub added_at: i64,
    /// Unix time it reached a terminal status
    pub finished_at: Option<i64>,
}

/// Shared list of the session's transactions.
///
/// Cloning gives another handle to the same list. A status never moves backwards
/// and a terminal one is final.
#[derive(Debug, Clone, Default)]
pub struct TxTracker {
    /// Transactions by local id
    inner: Arc<Mutex<Inner>>,
}

/// Tracker state behind the lock
#[derive(Debug, Default)]
struct Inner {
    /// Next local id
    next: u64,
    /// Everything tracked this session
    txs: BTreeMap<TxId, TrackedTx>,
}

impl TxTracker {
    /// Creates an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a transaction that is about to be estimated and sent
    pub fn begin(&self, summary: impl Into<String>) -> TxId {
        let mut inner = self.lock();
        let id = TxId(inner.next);
        inner.next += 1;
        let summary = summary.into();
        log::info!("tx::tracker: {id} attempting {summary}");
        inner.txs.insert(
            id,
            TrackedTx {
                summary,
                status: TxStatus::Attempting,
                hash: None,
                block_number: None,
                error: None,
                added_at: chrono::Utc::now().timestamp(),
                finished_at: None,
            },
        );
        id
    }

    /// The node accepted the transaction
    pub fn accepted(&self, id: TxId, hash: TxHash) {
        self.update(id, |tx| {
            tx.status = TxStatus::Pending;
            tx.hash = Some(hash);
        });
    }

    /// The transaction was mined in `block_number`
    pub fn confirmed(&self, id: TxId, block_number: u64) {
        self.update(id, |tx| {
            tx.status = TxStatus::Confirmed;
            tx.block_number = Some(block_number);
        });
    }

    /// The transaction failed before or after being sent
    pub fn failed(&self, id: TxId, reason: impl Into<String>) {
        let reason = reason.into();
        self.update(id, |tx| {
            tx.status = TxStatus::Failed;
            tx.error = Some(reason);
        });
    }

    /// A copy of the tracked transaction
    #[must_use]
    pub fn get(&self, id: TxId) -> Option<TrackedTx> {
        self.lock().txs.get(&id).cloned()
    }

    /// Every tracked transaction, oldest first
    #[must_use]
    pub fn all(&self) -> Vec<(TxId, TrackedTx)> {
        self.lock().txs.iter().map(|(id, tx)| (*id, tx.clone())).collect()
    }

    /// Transactions still waiting on the chain
    #[must_use]
    pub fn pending(&self) -> Vec<(TxId, TrackedTx)> {
        self.lock()
            .txs
            .iter()
            .filter(|(_, tx)| !tx.status.is_terminal())
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }

    /// Apply `change` unless the transaction already finished
    fn update(&self, id: TxId, change: impl FnOnce(&mut TrackedTx)) {
        let mut inner = self.lock();
        let Some(tx) = inner.txs.get_mut(&id) else {
            log::warn!("tx::tracker: update for unknown transaction {id}");
            return;
        };
        if tx.status.is_terminal() {
            log::debug!("tx::tracker: {id} already {}, update ignored", tx.status);
            return;
        }
        change(tx);
        if tx.status.is_terminal() {
            tx.finished_at = Some(chrono::Utc::now().timestamp());
        }
        log::info!("tx::tracker: {id} {} ({})", tx.status, tx.summary);
    }

    /// Lock the list; every update is a single step so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
