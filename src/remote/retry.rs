use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use super::error::RemoteError;

/// Bounded retry for calls to the jobs service.
///
/// `max_attempts = 1` means single-shot: the first failure is returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff: Duration,
}

pub trait BackoffPolicy {
    fn delay_for_attempt(&self, attempt: usize) -> Duration;
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::from_millis(200),
        }
    }
}

impl BackoffPolicy for RetryPolicy {
    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        self.base_backoff.saturating_mul(attempt as u32)
    }
}

impl RetryPolicy {
    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Non-idempotent calls are always single-shot.
    pub async fn run<T, F, Fut>(&self, operation: &str, idempotent: bool, mut call: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let max_attempts = if idempotent { self.max_attempts.max(1) } else { 1 };
        let mut attempt = 1;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts && err.is_transient() => {
                    let delay = self.delay_for_attempt(attempt) + jitter(self.base_backoff);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        operation, attempt, max_attempts, err, delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Up to a quarter of the base backoff
fn jitter(base: Duration) -> Duration {
    let cap = (base.as_millis() / 4) as u64;
    if cap == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=cap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_backoff: Duration::from_millis(120),
        };
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(120));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(360));
    }

    #[tokio::test]
    async fn default_policy_is_single_shot() {
        let calls = &AtomicUsize::new(0);
        let result: Result<(), _> = RetryPolicy::default()
            .run("list", true, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RemoteError::Timeout)
            })
            .await;

        assert!(matches!(result, Err(RemoteError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_up_to_the_cap() {
        let calls = &AtomicUsize::new(0);
        let result = policy(3)
            .run("list", true, move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(RemoteError::Network("connection reset".into()))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let calls = &AtomicUsize::new(0);
        let result: Result<(), _> = policy(5)
            .run("update", true, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RemoteError::Status {
                    status: 422,
                    body: "bad".into(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn never_retries_non_idempotent_calls() {
        let calls = &AtomicUsize::new(0);
        let result: Result<(), _> = policy(5)
            .run("create", false, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RemoteError::Timeout)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
