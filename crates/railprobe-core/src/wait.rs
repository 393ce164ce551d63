//! Condition-based waiting.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, thiserror::Error)]
#[error("condition not met within {0:?}")]
pub struct WaitTimeout(pub Duration);

/// Deadline-bound polling rounds.
///
/// For checks that need `&mut` access to something between rounds, where a
/// closure handed to [`poll_until`] cannot hold the borrow.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    timeout: Duration,
    interval: Duration,
    deadline: Instant,
}

impl Poller {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            deadline: Instant::now() + timeout,
        }
    }

    /// Await one check, cut off at the deadline.
    pub async fn check<F: Future>(&self, fut: F) -> Result<F::Output, WaitTimeout> {
        tokio::time::timeout_at(self.deadline, fut)
            .await
            .map_err(|_| WaitTimeout(self.timeout))
    }

    /// Sleep until the next round, or fail once the deadline has passed.
    pub async fn next_round(&self) -> Result<(), WaitTimeout> {
        let now = Instant::now();
        if now >= self.deadline {
            return Err(WaitTimeout(self.timeout));
        }
        tokio::time::sleep_until((now + self.interval).min(self.deadline)).await;
        Ok(())
    }
}

/// Poll `check` until it yields `Some`, or fail once `timeout` has elapsed.
///
/// The check runs at least once, even with a zero timeout.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<T, WaitTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let poller = Poller::new(timeout, interval);
    loop {
        if let Some(value) = poller.check(check()).await? {
            return Ok(value);
        }
        poller.next_round().await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn returns_first_some() {
        let calls = AtomicU32::new(0);
        let value = poll_until(Duration::from_secs(1), Duration::from_millis(100), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { (n == 3).then_some(n) }
        })
        .await
        .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_on_deadline() {
        let start = Instant::now();
        let result: Result<(), _> =
            poll_until(Duration::from_millis(350), Duration::from_millis(100), || async {
                None
            })
            .await;
        assert!(result.is_err());
        assert_eq!(start.elapsed(), Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_check_is_cut_at_deadline() {
        let poller = Poller::new(Duration::from_millis(500), Duration::from_millis(100));
        let start = Instant::now();
        let result = poller
            .check(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert!(result.is_err());
        assert_eq!(start.elapsed(), Duration::from_millis(500));
        assert!(poller.next_round().await.is_err());
    }
}
