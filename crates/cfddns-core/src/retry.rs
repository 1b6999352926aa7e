//! Retry policy for provider calls
//!
//! Both provider operations (fetch and update) share the same policy: a fixed
//! attempt bound with exponential backoff, applied only to transient transport
//! failures. Provider-level rejections propagate immediately — the provider
//! already gave a definitive answer.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::Result;

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Delay before the first re-attempt; doubles each time (1s, 2s, ...)
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy with no sleeps, for tests
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// Run `op`, retrying transient failures up to the attempt bound
    ///
    /// `op` is a factory producing a fresh future per attempt. The last
    /// transient error is re-raised when all attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        debug_assert!(self.attempts > 0);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    let delay = self.base_delay * 2u32.pow(attempt - 1);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        what, attempt, self.attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn transient_failures_are_retried_to_success() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::immediate(3);

        let result: Result<&str> = policy
            .run("fetch", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Error::transport("connection reset"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_attempts_reraise_last_error() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::immediate(3);

        let result: Result<()> = policy
            .run("fetch", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::transport("timed out")) }
            })
            .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn provider_rejection_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::immediate(3);

        let result: Result<()> = policy
            .run("update", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::provider("update rejected")) }
            })
            .await;

        assert!(matches!(result.unwrap_err(), Error::Provider(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
