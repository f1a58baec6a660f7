//! Polling cadence shared by the per-item wait and the completion wait.
//!
//! Loops are unbounded unless a deadline is configured; every suspension
//! also watches a cancellation token so an interrupt ends the wait promptly.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, CoreResult};

/// Growth of the delay between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Same delay every time.
    #[default]
    Fixed,
    /// Delay doubles after each poll, capped at `max`.
    Exponential {
        /// Largest delay between two polls.
        max: Duration,
    },
}

/// Interval, backoff, and optional deadline for one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before the second poll.
    pub interval: Duration,
    /// Total time allowed; `None` polls forever.
    pub deadline: Option<Duration>,
    /// Delay growth between polls.
    pub backoff: Backoff,
}

impl PollPolicy {
    /// Unbounded fixed-interval policy.
    #[must_use]
    pub const fn every(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            backoff: Backoff::Fixed,
        }
    }

    /// Give up after `deadline` of total waiting.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Use `backoff` between polls.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Start a loop governed by this policy.
    #[must_use]
    pub fn start(&self, operation: &'static str, cancel: &CancellationToken) -> Poller {
        self.start_until(operation, cancel, None)
    }

    /// Start a loop that also gives up at `expires_at`, whichever of that and
    /// the policy's own deadline comes first.
    #[must_use]
    pub fn start_until(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        expires_at: Option<Instant>,
    ) -> Poller {
        let started = Instant::now();
        let own = self.deadline.map(|deadline| started + deadline);
        let expires_at = match (own, expires_at) {
            (Some(own), Some(overall)) => Some(own.min(overall)),
            (own, overall) => own.or(overall),
        };
        Poller {
            operation,
            policy: *self,
            started,
            expires_at,
            next_delay: self.interval,
            cancel: cancel.clone(),
        }
    }
}

/// State of one polling loop.
#[derive(Debug)]
pub struct Poller {
    operation: &'static str,
    policy: PollPolicy,
    started: Instant,
    expires_at: Option<Instant>,
    next_delay: Duration,
    cancel: CancellationToken,
}

impl Poller {
    /// Wait until the next poll is due.
    ///
    /// The wait is cut short at the deadline so the caller gets one last poll
    /// exactly when it falls.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Cancelled`] when the token fires first.
    /// - [`CoreError::PollTimeout`] when the deadline has already been reached.
    pub async fn tick(&mut self) -> CoreResult<()> {
        let mut delay = self.next_delay;
        if let Some(expires_at) = self.expires_at {
            let now = Instant::now();
            if now >= expires_at {
                return Err(CoreError::PollTimeout {
                    operation: self.operation,
                    waited: self.started.elapsed(),
                });
            }
            delay = delay.min(expires_at - now);
        }

        tokio::select! {
            () = self.cancel.cancelled() => {
                return Err(CoreError::Cancelled { operation: self.operation });
            }
            () = sleep(delay) => {}
        }

        if let Backoff::Exponential { max } = self.policy.backoff {
            self.next_delay = self.next_delay.saturating_mul(2).min(max);
        }
        Ok(())
    }

    /// Fail fast if cancellation has already been requested.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cancelled`] when the token has fired.
    pub fn ensure_active(&self) -> CoreResult<()> {
        if self.cancel.is_cancelled() {
            Err(CoreError::Cancelled {
                operation: self.operation,
            })
        } else {
            Ok(())
        }
    }

    /// Time since the loop started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled_at(elapsed: Duration, secs: u64) -> bool {
        elapsed >= Duration::from_secs(secs) && elapsed < Duration::from_secs(secs + 1)
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_policy_waits_one_interval_per_tick() -> CoreResult<()> {
        let cancel = CancellationToken::new();
        let mut poller = PollPolicy::every(Duration::from_secs(10)).start("test", &cancel);
        poller.tick().await?;
        poller.tick().await?;
        assert!(settled_at(poller.elapsed(), 20));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_backoff_doubles_until_cap() -> CoreResult<()> {
        let cancel = CancellationToken::new();
        let policy = PollPolicy::every(Duration::from_secs(1)).with_backoff(Backoff::Exponential {
            max: Duration::from_secs(4),
        });
        let mut poller = policy.start("test", &cancel);
        for _ in 0..5 {
            poller.tick().await?;
        }
        // 1 + 2 + 4 + 4 + 4
        assert!(settled_at(poller.elapsed(), 15));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_stops_the_loop() {
        let cancel = CancellationToken::new();
        let policy = PollPolicy::every(Duration::from_secs(10))
            .with_deadline(Some(Duration::from_secs(25)));
        let mut poller = policy.start("wait", &cancel);
        assert!(poller.tick().await.is_ok());
        assert!(poller.tick().await.is_ok());
        // Shortened to land on the deadline.
        assert!(poller.tick().await.is_ok());
        assert!(settled_at(poller.elapsed(), 25));
        let err = poller.tick().await.expect_err("deadline should trip");
        assert!(matches!(
            err,
            CoreError::PollTimeout {
                operation: "wait",
                ..
            }
        ));
        assert!(settled_at(poller.elapsed(), 25));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_shorter_than_interval_still_allows_a_wait() -> CoreResult<()> {
        let cancel = CancellationToken::new();
        let policy = PollPolicy::every(Duration::from_secs(30))
            .with_deadline(Some(Duration::from_secs(20)));
        let mut poller = policy.start("wait", &cancel);
        poller.tick().await?;
        assert!(settled_at(poller.elapsed(), 20));
        assert!(poller.tick().await.is_err());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn overall_expiry_caps_a_later_loop() -> CoreResult<()> {
        let cancel = CancellationToken::new();
        let expires_at = Instant::now() + Duration::from_secs(15);
        sleep(Duration::from_secs(10)).await;

        let policy = PollPolicy::every(Duration::from_secs(30))
            .with_deadline(Some(Duration::from_secs(60)));
        let mut poller = policy.start_until("wait", &cancel, Some(expires_at));
        poller.tick().await?;
        assert!(settled_at(poller.elapsed(), 5));
        let err = poller.tick().await.expect_err("overall expiry should trip");
        assert!(matches!(err, CoreError::PollTimeout { .. }));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_keeps_growing_after_a_clamped_wait() -> CoreResult<()> {
        let cancel = CancellationToken::new();
        let policy = PollPolicy::every(Duration::from_secs(4))
            .with_backoff(Backoff::Exponential {
                max: Duration::from_secs(64),
            })
            .with_deadline(Some(Duration::from_secs(100)));
        let mut poller = policy.start("wait", &cancel);
        // 4 + 8 + 16 + 32 = 60, then 64 is clamped to the remaining 40.
        for _ in 0..5 {
            poller.tick().await?;
        }
        assert!(settled_at(poller.elapsed(), 100));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_a_pending_tick() {
        let cancel = CancellationToken::new();
        let mut poller = PollPolicy::every(Duration::from_secs(3600)).start("wait", &cancel);
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let err = poller.tick().await.expect_err("cancel should win");
        assert!(matches!(err, CoreError::Cancelled { operation: "wait" }));
        assert!(poller.ensure_active().is_err());
    }
}
