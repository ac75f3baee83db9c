use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{DexError, DexResult};

/// Identifies one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Last-request-wins bookkeeping for a keyed query.
///
/// Every time the key changes (token pair, account) a new request is issued and
/// the previous one becomes stale. A result is only applied if its ticket is still
/// the latest; anything older is dropped on arrival.
#[derive(Debug)]
pub struct LatestRequest<K, V> {
    /// Next ticket number
    next: u64,
    /// The ticket and key whose result is still wanted
    pending: Option<(Ticket, K)>,
    /// Last applied result
    value: Option<(K, V)>,
}

impl<K, V> Default for LatestRequest<K, V> {
    fn default() -> Self {
        Self {
            next: 0,
            pending: None,
            value: None,
        }
    }
}

impl<K: Clone + PartialEq, V> LatestRequest<K, V> {
    /// Issue a request for `key`, superseding whatever is in flight
    pub fn issue(&mut self, key: K) -> Ticket {
        let ticket = Ticket(self.next);
        self.next += 1;
        self.pending = Some((ticket, key));
        ticket
    }

    /// Apply a result if `ticket` is still the latest request.
    ///
    /// # Errors
    ///
    /// `StaleRequest` if a newer request was issued or the query was cancelled
    pub fn resolve(&mut self, ticket: Ticket, value: V) -> DexResult<()> {
        match self.pending.take() {
            Some((latest, key)) if latest == ticket => {
                self.value = Some((key, value));
                Ok(())
            }
            other => {
                self.pending = other;
                Err(DexError::StaleRequest)
            }
        }
    }

    /// Drop interest in whatever is in flight
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether a request is still awaiting its result
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The last applied value, if it was fetched for `key`
    #[must_use]
    pub fn value_for(&self, key: &K) -> Option<&V> {
        self.value
            .as_ref()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Shared handle running fetches through a [`LatestRequest`].
///
/// The lock is only taken to issue and to resolve, never across the fetch itself.
#[derive(Debug)]
pub struct LiveQuery<K, V> {
    /// Request bookkeeping
    state: Arc<Mutex<LatestRequest<K, V>>>,
}

impl<K, V> Clone for LiveQuery<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, V> Default for LiveQuery<K, V> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(LatestRequest::default())),
        }
    }
}

impl<K: Clone + PartialEq + std::fmt::Debug, V: Clone> LiveQuery<K, V> {
    /// Creates an empty query
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fetch` for `key` and apply its result unless superseded meanwhile.
    ///
    /// # Returns
    ///
    /// `Ok(Some(value))` when applied, `Ok(None)` when the result arrived stale and
    /// was dropped
    ///
    /// # Errors
    ///
    /// Whatever `fetch` fails with, if this request is still the latest one
    pub async fn refresh<F>(&self, key: K, fetch: F) -> eyre::Result<Option<V>>
    where
        F: Future<Output = eyre::Result<V>>,
    {
        let ticket = self.lock().issue(key.clone());
        let result = fetch.await;

        let mut state = self.lock();
        match result {
            Ok(value) => match state.resolve(ticket, value.clone()) {
                Ok(()) => Ok(Some(value)),
                Err(_) => {
                    log::debug!("feed::latest: dropped stale result for {key:?}");
                    Ok(None)
                }
            },
            Err(e) => {
                if state.pending.as_ref().is_some_and(|(t, _)| *t == ticket) {
                    state.pending = None;
                    Err(e)
                } else {
                    log::debug!("feed::latest: dropped stale error for {key:?}: {e}");
                    Ok(None)
                }
            }
        }
    }

    /// Discard whatever is in flight; its result will not be applied
    pub fn cancel(&self) {
        self.lock().cancel();
    }

    /// The current value for `key`, if one was applied
    #[must_use]
    pub fn current(&self, key: &K) -> Option<V> {
        self.lock().value_for(key).cloned()
    }

    /// Lock the state; a poisoned lock still holds consistent data since every
    /// mutation is a single assignment
    fn lock(&self) -> std::sync::MutexGuard<'_, LatestRequest<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;

    #[test]
    fn test_superseded_ticket_is_rejected() {
        let mut requests: LatestRequest<&str, u32> = LatestRequest::default();
        let first = requests.issue("WMATIC/USDC");
        let second = requests.issue("QUICK/USDC");

        assert_eq!(requests.resolve(first, 1), Err(DexError::StaleRequest));
        assert!(requests.is_pending());
        assert_eq!(requests.resolve(second, 2), Ok(()));
        assert_eq!(requests.value_for(&"QUICK/USDC"), Some(&2));
        assert_eq!(requests.value_for(&"WMATIC/USDC"), None);
    }

    #[test]
    fn test_cancelled_request_is_rejected() {
        let mut requests: LatestRequest<u8, u8> = LatestRequest::default();
        let ticket = requests.issue(1);
        requests.cancel();
        assert_eq!(requests.resolve(ticket, 9), Err(DexError::StaleRequest));
        assert_eq!(requests.value_for(&1), None);
    }

    #[tokio::test]
    async fn test_slow_stale_fetch_does_not_overwrite_fresh_one() {
        let query: LiveQuery<&str, u32> = LiveQuery::new();
        let (release_slow, slow_gate) = oneshot::channel::<()>();

        let slow = {
            let query = query.clone();
            tokio::spawn(async move {
                query
                    .refresh("old-pair", async move {
                        slow_gate.await.ok();
                        Ok(1)
                    })
                    .await
            })
        };
        // let the slow request get issued first
        tokio::time::sleep(Duration::from_millis(20)).await;

        let fresh = query.refresh("new-pair", async { Ok(2) }).await.unwrap();
        assert_eq!(fresh, Some(2));

        release_slow.send(()).unwrap();
        assert_eq!(slow.await.unwrap().unwrap(), None);
        assert_eq!(query.current(&"new-pair"), Some(2));
        assert_eq!(query.current(&"old-pair"), None);
    }

    #[tokio::test]
    async fn test_latest_error_surfaces() {
        let query: LiveQuery<u8, u8> = LiveQuery::new();
        let result = query.refresh(1, async { Err(eyre::eyre!("node down")) }).await;
        assert_eq!(result.unwrap_err().to_string(), "node down");
    }
}
