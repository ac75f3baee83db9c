use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{time_remaining, time_remaining_for, TimeRemaining};
use crate::models::StakingInfo;

/// Source of the current Unix time
pub trait Clock: Send + Sync + 'static {
    /// Seconds since the epoch
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A background task re-evaluating a program's remaining time every period.
///
/// The latest value is published on a watch channel. The task stops by itself
/// once the program ended (or has no end), and [`Countdown::cancel`] stops it at
/// any tick. Dropping the handle cancels it too.
#[derive(Debug)]
pub struct Countdown {
    /// Latest remaining time
    rx: watch::Receiver<TimeRemaining>,
    /// The ticking task
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Start counting down to `end`, re-evaluating every `period`
    #[must_use]
    pub fn spawn<C: Clock>(end: Option<i64>, clock: C, period: Duration) -> Self {
        Self::start(move |now| time_remaining(end, now), clock, period)
    }

    /// Count down to the end of a staking program; a closed program starts as ended
    #[must_use]
    pub fn for_program<C: Clock>(staking: &StakingInfo, clock: C, period: Duration) -> Self {
        let staking = staking.clone();
        Self::start(move |now| time_remaining_for(&staking, now), clock, period)
    }

    /// Spawn the ticking task around `evaluate`
    fn start<C, F>(evaluate: F, clock: C, period: Duration) -> Self
    where
        C: Clock,
        F: Fn(i64) -> TimeRemaining + Send + 'static,
    {
        let (tx, rx) = watch::channel(evaluate(clock.now()));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                if tx.borrow().is_final() {
                    log::debug!("apy::countdown: {} reached, stopping", *tx.borrow());
                    break;
                }
                ticker.tick().await;
                let remaining = evaluate(clock.now());
                if tx.send(remaining).is_err() {
                    log::debug!("apy::countdown: no subscribers left, stopping");
                    break;
                }
            }
        });

        Self { rx, handle }
    }

    /// Latest remaining time
    #[must_use]
    pub fn current(&self) -> TimeRemaining {
        *self.rx.borrow()
    }

    /// A receiver notified on every re-evaluation
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimeRemaining> {
        self.rx.clone()
    }

    /// Whether the task has stopped
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop re-evaluating; the last published value stays readable
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Wait for the task to stop on its own or through [`Countdown::cancel`]
    pub async fn stopped(&mut self) {
        // a cancelled task reports `JoinError::Cancelled`, which is the expected outcome
        let _ = (&mut self.handle).await;
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
